//! Error types for VelocyPack building

use thiserror::Error;

/// Result type for VelocyPack builder operations
pub type Result<T> = std::result::Result<T, Error>;

/// VelocyPack builder error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `bytes()` was called while one or more containers are still open
    #[error("builder is not closed: {open_frames} frame(s) still open")]
    NotClosed {
        /// Number of frames still open at the time of the call
        open_frames: usize,
    },

    /// `close`/`remove_last` called with no open frame
    #[error("no open array or object to operate on")]
    NeedOpenCompound,

    /// An array-only operation was attempted while the top frame is not an array
    #[error("expected an open array")]
    NeedOpenArray,

    /// An object-only operation was attempted while the top frame is not an object
    #[error("expected an open object")]
    NeedOpenObject,

    /// `remove_last` called on a frame with no children
    #[error("open compound has no values to remove")]
    NeedSubValue,

    /// A key was added to an object while a previous key is still pending a value
    #[error("key already written, expected a value")]
    KeyAlreadyWritten,

    /// A non-string value was added where an object key was expected
    #[error("object key must be a string")]
    KeyMustBeString,

    /// Attempted to encode a value this builder cannot represent
    #[error("unexpected or unsupported value type: {reason}")]
    UnexpectedType {
        /// Human-readable description of what was rejected
        reason: String,
    },

    /// An object was closed with `check_attribute_uniqueness` enabled and
    /// contained a repeated key
    #[error("duplicate attribute name: {key}")]
    DuplicateAttributeName {
        /// The attribute name that appeared more than once
        key: String,
    },
}
