//! Container open/close: layout selection, width selection, key sort,
//! uniqueness checking.

use tracing::{debug, trace, warn};

use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::frame::{Frame, FrameStack, Kind};
use crate::options::BuilderOptions;
use crate::slice::{check_attribute_uniqueness, make_key};
use crate::varint::{push_forward, push_reverse, variable_value_length};
use crate::width::Width;

/// Emits a container's tag byte, reserves its 8-byte header, and pushes a
/// frame onto the stack. The final tag (and header contents) are decided
/// later, in [`close`].
pub(crate) fn open(buf: &mut Buffer, frames: &mut FrameStack, kind: Kind, unindexed: bool) {
    let tag: u8 = match (kind, unindexed) {
        (Kind::Array, false) => 0x06,
        (Kind::Array, true) => 0x13,
        (Kind::Object, false) => 0x0b,
        (Kind::Object, true) => 0x14,
    };
    let start = buf.len();
    buf.grow(9);
    buf.write_at(start, &[tag]);
    frames.push(kind, start);
}

/// Closes the popped top frame: picks a layout, rewrites the reserved
/// header, sorts object keys, and optionally checks attribute uniqueness.
pub(crate) fn close(buf: &mut Buffer, mut frame: Frame, options: &BuilderOptions) -> Result<()> {
    let tos = frame.start;
    let end = buf.len();
    let n = frame.child_offsets.len();
    let head = buf.as_slice()[tos];

    if n == 0 {
        let empty_tag = match frame.kind {
            Kind::Array => 0x01,
            Kind::Object => 0x0a,
        };
        buf.write_at(tos, &[empty_tag]);
        buf.shrink(8);
        trace!(tag = format_args!("{empty_tag:#04x}"), "closed empty container");
        return Ok(());
    }

    let compact_candidate = head == 0x13
        || head == 0x14
        || (head == 0x06 && options.build_unindexed_arrays)
        || (head == 0x0b && (options.build_unindexed_objects || n == 1));

    if compact_candidate {
        if try_close_compact(buf, frame.kind, tos, end, n)?.is_some() {
            debug!(n, "closed container as compact");
            return Ok(());
        }
        // Falls through to the general layout; restore the non-compact tag.
        let fallback_tag = match frame.kind {
            Kind::Array => 0x06,
            Kind::Object => 0x0b,
        };
        buf.write_at(tos, &[fallback_tag]);
    }

    match frame.kind {
        Kind::Array => close_general_array(buf, tos, end, &mut frame.child_offsets),
        Kind::Object => close_general_object(buf, tos, end, &mut frame.child_offsets, options),
    }
}

/// Attempts the compact (variable-length header) layout. Returns `Ok(Some(()))`
/// if committed, `Ok(None)` if the compact header would need 9 or more bytes
/// and the caller should fall back to the general layout.
fn try_close_compact(
    buf: &mut Buffer,
    kind: Kind,
    tos: usize,
    end: usize,
    n: usize,
) -> Result<Option<()>> {
    let nr_items_len = variable_value_length(n as u64);
    let payload_len = end - tos - 9;
    let tag_and_payload = 1 + payload_len;

    let mut byte_size_len = 1usize;
    let byte_size = loop {
        let candidate = (tag_and_payload + byte_size_len + nr_items_len) as u64;
        let needed = variable_value_length(candidate);
        if needed == byte_size_len {
            break candidate;
        }
        byte_size_len = needed;
    };

    if byte_size_len >= 9 {
        return Ok(None);
    }

    let compact_tag: u8 = match kind {
        Kind::Array => 0x13,
        Kind::Object => 0x14,
    };
    buf.write_at(tos, &[compact_tag]);

    let new_header_len = 1 + byte_size_len;
    buf.relocate_down(tos + 9, tos + new_header_len, payload_len);
    buf.truncate(tos + new_header_len + payload_len);

    let mut size_bytes = Vec::with_capacity(byte_size_len);
    push_forward(&mut size_bytes, byte_size);
    buf.write_at(tos + 1, &size_bytes);

    push_reverse(buf.raw_mut(), n as u64);

    Ok(Some(()))
}

/// Whether every child in `idx` (plus the implicit tail) spans the same
/// number of bytes, in which case an array needs no index table.
fn has_equal_length_children(idx: &[u64], container_len: u64) -> bool {
    if idx.len() <= 1 {
        return true;
    }
    let elem_len = idx[1] - idx[0];
    if container_len - idx[idx.len() - 1] != elem_len {
        return false;
    }
    idx.windows(2).all(|w| w[1] - w[0] == elem_len)
}

/// Smallest width in `{1,2,4,8}` such that the finished container (including
/// its own index table and trailing count, if any) fits its own offsets.
fn select_width(payload_len: u64, n: u64, shortcut: bool) -> Width {
    for w in [1u64, 2, 4, 8] {
        let header_extra = if shortcut {
            w
        } else if w == 8 {
            8
        } else {
            2 * w
        };
        let index_len = if shortcut { 0 } else { n * w };
        let tail = if !shortcut && w == 8 { 8 } else { 0 };
        let total = 1 + header_extra + payload_len + index_len + tail;
        let max = if w == 8 {
            u64::MAX
        } else {
            (1u64 << (8 * w)) - 1
        };
        if total <= max {
            return match w {
                1 => Width::W1,
                2 => Width::W2,
                4 => Width::W4,
                _ => Width::W8,
            };
        }
    }
    Width::W8
}

fn close_general_array(
    buf: &mut Buffer,
    tos: usize,
    end: usize,
    idx: &mut Vec<u64>,
) -> Result<()> {
    let n = idx.len() as u64;
    let payload_len = (end - tos - 9) as u64;
    let shortcut = has_equal_length_children(idx, (end - tos) as u64);
    let width = select_width(payload_len, n, shortcut);
    let w = width.len() as u64;

    let header_extra = if shortcut {
        w
    } else if w == 8 {
        8
    } else {
        2 * w
    };
    let shrink = 8 - header_extra.min(8);
    if shrink > 0 {
        buf.relocate_down(tos + 9, tos + 1 + header_extra as usize, payload_len as usize);
        for off in idx.iter_mut() {
            *off -= shrink;
        }
    }
    buf.truncate(tos + 1 + header_extra as usize + payload_len as usize);

    if !shortcut {
        for &child in idx.iter() {
            let bytes = child.to_le_bytes();
            buf.extend(&bytes[..w as usize]);
        }
        if w == 8 {
            buf.extend(&n.to_le_bytes());
        }
    }

    let final_len = (buf.len() - tos) as u64;
    let size_bytes = final_len.to_le_bytes();
    buf.write_at(tos + 1, &size_bytes[..w as usize]);
    if !shortcut && w < 8 {
        let n_bytes = n.to_le_bytes();
        buf.write_at(tos + 1 + w as usize, &n_bytes[..w as usize]);
    }

    let tag = if shortcut {
        0x02 + width.tag_offset()
    } else {
        0x06 + width.tag_offset()
    };
    buf.write_at(tos, &[tag]);
    debug!(tag = format_args!("{tag:#04x}"), width = w, n, "closed general array");
    Ok(())
}

fn close_general_object(
    buf: &mut Buffer,
    tos: usize,
    end: usize,
    idx: &mut Vec<u64>,
    options: &BuilderOptions,
) -> Result<()> {
    let n = idx.len() as u64;
    let payload_len = (end - tos - 9) as u64;
    let width = select_width(payload_len, n, false);
    let w = width.len() as u64;

    let header_extra: u64 = if w == 8 { 8 } else { 2 * w };
    let shrink = 8 - header_extra.min(8);
    if shrink > 0 {
        buf.relocate_down(tos + 9, tos + 1 + header_extra as usize, payload_len as usize);
        for off in idx.iter_mut() {
            *off -= shrink;
        }
    }
    buf.truncate(tos + 1 + header_extra as usize + payload_len as usize);

    idx.sort_by(|&a, &b| {
        let ka = make_key(buf.as_slice(), tos + a as usize).unwrap_or("");
        let kb = make_key(buf.as_slice(), tos + b as usize).unwrap_or("");
        ka.as_bytes().cmp(kb.as_bytes())
    });

    if options.check_attribute_uniqueness {
        if let Err(e) = check_attribute_uniqueness(buf.as_slice(), tos, idx.as_slice()) {
            if let Error::DuplicateAttributeName { key } = &e {
                warn!(key = key.as_str(), "duplicate attribute name at object close");
            }
            return Err(e);
        }
    }

    for &child in idx.iter() {
        let bytes = child.to_le_bytes();
        buf.extend(&bytes[..w as usize]);
    }
    if w == 8 {
        buf.extend(&n.to_le_bytes());
    }

    let final_len = (buf.len() - tos) as u64;
    let size_bytes = final_len.to_le_bytes();
    buf.write_at(tos + 1, &size_bytes[..w as usize]);
    if w < 8 {
        let n_bytes = n.to_le_bytes();
        buf.write_at(tos + 1 + w as usize, &n_bytes[..w as usize]);
    }

    let tag = 0x0b + width.tag_offset();
    buf.write_at(tos, &[tag]);
    debug!(tag = format_args!("{tag:#04x}"), width = w, n, "closed general object");
    Ok(())
}
