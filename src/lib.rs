//! VelocyPack Builder
//!
//! VelocyPack is a compact, typed, position-indexed binary encoding for
//! JSON-like trees (nulls, booleans, integers, doubles, strings, binary
//! blobs, dates, arrays, objects, and a few sentinels). This crate
//! implements an append-only [`Builder`]: a client opens arrays and
//! objects, adds values to them, and closes them, and the builder chooses
//! the smallest on-wire layout for each container as it is closed.
//!
//! ```
//! use velocypack::{Builder, Value};
//!
//! let mut builder = Builder::new(64);
//! builder.open_object(false)?;
//! builder.add_key_value("name", Value::String("velocypack"))?;
//! builder.add_key_value("stable", Value::Bool(true))?;
//! builder.close()?;
//!
//! let bytes = builder.bytes()?;
//! assert_eq!(bytes[0], 0x0b);
//! # Ok::<(), velocypack::Error>(())
//! ```
//!
//! This crate decodes nothing: it does not parse third-party VelocyPack
//! data, and the narrow slice-reading it performs internally (to measure
//! already-written bytes and resolve object keys) is private. `External`,
//! `BCD`, and custom-type values have no representation in [`Value`] and so
//! cannot be constructed at all.

mod builder;
mod buffer;
mod container;
mod error;
mod frame;
mod options;
mod primitive;
mod slice;
mod value;
mod varint;
mod width;

pub use builder::Builder;
pub use error::{Error, Result};
pub use options::BuilderOptions;
pub use value::Value;
