//! Private subset of VelocyPack slice-reading
//!
//! The builder is append-only and never decodes arbitrary third-party data,
//! but closing a container does need to read back bytes it has already
//! written: to measure a `Value::Raw` payload, to step over a value, and to
//! recover an object key's string for sorting and uniqueness checking. This
//! module is exactly that narrow subset, `pub(crate)` only. It is not a
//! general `Slice` decoder.

use crate::error::{Error, Result};
use crate::varint::decode_forward;

/// Reads a `width`-byte little-endian integer starting at `buf[at]`.
fn read_le(buf: &[u8], at: usize, width: usize) -> u64 {
    let mut v = 0u64;
    for i in 0..width {
        v |= u64::from(buf[at + i]) << (8 * i);
    }
    v
}

/// Returns the total number of bytes the value tagged at `buf[at]` occupies,
/// tag byte included. Container tags carry their own total size in the
/// header (general layouts as a fixed-width trailing-relative field,
/// compact layouts as a forward varint), so this never needs to recurse
/// into a container's children.
pub(crate) fn byte_size(buf: &[u8], at: usize) -> Result<usize> {
    let tag = buf[at];
    let size = match tag {
        0x01 | 0x0a => 1,
        0x02..=0x05 => read_le(buf, at + 1, 1usize << (tag - 0x02)) as usize,
        0x06..=0x09 => read_le(buf, at + 1, 1usize << (tag - 0x06)) as usize,
        0x0b..=0x0e => read_le(buf, at + 1, 1usize << (tag - 0x0b)) as usize,
        0x13 | 0x14 => decode_forward(buf, at + 1).0 as usize,
        0x17..=0x1a | 0x1e | 0x1f => 1,
        0x1b | 0x1c => 9,
        0x20..=0x27 => 1 + (tag - 0x1f) as usize,
        0x28..=0x2f => 1 + (tag - 0x27) as usize,
        0x30..=0x3f => 1,
        0x40..=0xbe => 1 + (tag - 0x40) as usize,
        0xbf => {
            let len = u64::from_le_bytes(buf[at + 1..at + 9].try_into().unwrap());
            9 + len as usize
        }
        0xc0..=0xc7 => {
            let ll = (tag - 0xbf) as usize;
            let mut len: u64 = 0;
            for i in 0..ll {
                len |= u64::from(buf[at + 1 + i]) << (8 * i);
            }
            1 + ll + len as usize
        }
        _ => {
            return Err(Error::UnexpectedType {
                reason: format!("unrecognized tag byte 0x{tag:02x}"),
            });
        }
    };
    Ok(size)
}

pub(crate) fn is_short_string(tag: u8) -> bool {
    (0x40..=0xbe).contains(&tag)
}

pub(crate) fn is_long_string(tag: u8) -> bool {
    tag == 0xbf
}

/// Resolves the attribute name for the key encoded at `at`.
///
/// This crate never emits translated (integer-aliased) keys, so any tag
/// other than a short or long string is rejected. A future caller that
/// injects such a key via `Value::Raw` will see `Error::UnexpectedType`
/// rather than a silently wrong sort order.
pub(crate) fn make_key(buf: &[u8], at: usize) -> Result<&str> {
    let tag = buf[at];
    if is_short_string(tag) {
        let len = (tag - 0x40) as usize;
        return std::str::from_utf8(&buf[at + 1..at + 1 + len]).map_err(|_| {
            Error::UnexpectedType {
                reason: "key is not valid UTF-8".to_string(),
            }
        });
    }
    if is_long_string(tag) {
        let len = u64::from_le_bytes(buf[at + 1..at + 9].try_into().unwrap()) as usize;
        return std::str::from_utf8(&buf[at + 9..at + 9 + len]).map_err(|_| {
            Error::UnexpectedType {
                reason: "key is not valid UTF-8".to_string(),
            }
        });
    }
    Err(Error::UnexpectedType {
        reason: format!(
            "tag 0x{tag:02x} is not a string key and this builder has no attribute translator"
        ),
    })
}

/// Alias of [`make_key`], kept distinct because callers reading §4.5/§4.6
/// reach for either name depending on whether they are resolving a key for
/// sorting or looking one up by name.
pub(crate) fn key_at(buf: &[u8], at: usize) -> Result<&str> {
    make_key(buf, at)
}

/// Offset immediately following the value at `at`.
pub(crate) fn next(buf: &[u8], at: usize) -> Result<usize> {
    Ok(at + byte_size(buf, at)?)
}

/// Whether `idx` (offsets relative to `tos`) lists object keys in
/// non-decreasing byte order. `close_general_object` always sorts `idx`
/// before calling this, so it is expected to return `true`; a `false`
/// result sends [`check_attribute_uniqueness`] down the `HashSet` path
/// instead of a single pairwise walk.
pub(crate) fn is_sorted(buf: &[u8], tos: usize, idx: &[u64]) -> bool {
    idx.windows(2).all(|w| {
        let ka = key_at(buf, tos + w[0] as usize).unwrap_or_default();
        let kb = key_at(buf, tos + w[1] as usize).unwrap_or_default();
        ka <= kb
    })
}

/// Checks that no two entries in `idx` (offsets relative to `tos`) resolve
/// to the same attribute name (§4.6). When the index is sorted, a single
/// pairwise neighbor walk suffices; otherwise every key is resolved into a
/// `HashSet` to catch duplicates that sorting would have made adjacent.
pub(crate) fn check_attribute_uniqueness(buf: &[u8], tos: usize, idx: &[u64]) -> Result<()> {
    if idx.len() < 2 {
        return Ok(());
    }

    if is_sorted(buf, tos, idx) {
        for pair in idx.windows(2) {
            let ka = key_at(buf, tos + pair[0] as usize)?;
            let kb = key_at(buf, tos + pair[1] as usize)?;
            if ka == kb {
                return Err(Error::DuplicateAttributeName { key: ka.to_string() });
            }
        }
        return Ok(());
    }

    let mut seen = std::collections::HashSet::with_capacity(idx.len());
    for &off in idx {
        let k = key_at(buf, tos + off as usize)?;
        if !seen.insert(k) {
            return Err(Error::DuplicateAttributeName { key: k.to_string() });
        }
    }
    Ok(())
}
