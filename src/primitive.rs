//! Scalar tag and payload encoding

use crate::error::{Error, Result};
use crate::value::Value;
use crate::width::{int_length, uint_length};

/// Appends the encoding of a scalar (non-container) `Value` to `out`.
///
/// `Value::Raw` is the only variant not handled here: its bytes are already
/// encoded and are copied in by the caller directly.
pub(crate) fn encode(out: &mut Vec<u8>, value: &Value<'_>) -> Result<()> {
    match *value {
        Value::Null => out.push(0x18),
        Value::Bool(false) => out.push(0x19),
        Value::Bool(true) => out.push(0x1a),
        Value::Illegal => out.push(0x17),
        Value::MinKey => out.push(0x1e),
        Value::MaxKey => out.push(0x1f),
        Value::SmallInt(v) => {
            if (0..=9).contains(&v) {
                out.push(0x30 + v as u8);
            } else if (-6..=-1).contains(&v) {
                out.push((0x40i16 + v as i16) as u8);
            } else {
                return Err(Error::UnexpectedType {
                    reason: format!("small int {v} out of range -6..=9"),
                });
            }
        }
        Value::Int(v) => {
            let len = int_length(v);
            out.push(0x1f + len as u8);
            let magnitude = v as u64;
            out.extend_from_slice(&magnitude.to_le_bytes()[..len]);
        }
        Value::UInt(v) => {
            let len = uint_length(v);
            out.push(0x27 + len as u8);
            out.extend_from_slice(&v.to_le_bytes()[..len]);
        }
        Value::Double(v) => {
            out.push(0x1b);
            out.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        Value::UtcDate(v) => {
            out.push(0x1c);
            out.extend_from_slice(&(v as u64).to_le_bytes());
        }
        Value::String(s) => {
            let bytes = s.as_bytes();
            if bytes.len() <= 126 {
                out.push(0x40 + bytes.len() as u8);
                out.extend_from_slice(bytes);
            } else {
                out.push(0xbf);
                out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
                out.extend_from_slice(bytes);
            }
        }
        Value::Binary(bytes) => {
            let len = uint_length(bytes.len() as u64);
            out.push(0xbf + len as u8);
            out.extend_from_slice(&(bytes.len() as u64).to_le_bytes()[..len]);
            out.extend_from_slice(bytes);
        }
        Value::Raw(_) => {
            return Err(Error::UnexpectedType {
                reason: "Value::Raw is copied in verbatim by the caller, not encoded here"
                    .to_string(),
            });
        }
    }
    Ok(())
}
