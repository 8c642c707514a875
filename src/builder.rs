//! Append-only VelocyPack builder
//!
//! This module provides the public builder API for constructing a single
//! VelocyPack value incrementally: open a container, add values or key-value
//! pairs, close it, repeat for nested containers, and finally read out the
//! finished bytes.

use crate::buffer::Buffer;
use crate::container;
use crate::error::{Error, Result};
use crate::frame::{FrameStack, Kind};
use crate::options::BuilderOptions;
use crate::primitive;
use crate::slice;
use crate::value::Value;

/// Builds a single VelocyPack-encoded value by appending to an internal
/// byte buffer.
///
/// A `Builder` is a single-threaded, mutable object: every method takes
/// `&mut self` (except `bytes()`, which borrows immutably once closed), so
/// the borrow checker rejects any attempt to read `bytes()` while a mutation
/// is still in flight. It is `Send` but not intended to be shared across
/// threads without external synchronization.
#[derive(Debug)]
pub struct Builder {
    buf: Buffer,
    frames: FrameStack,
    options: BuilderOptions,
}

impl Builder {
    /// Creates an empty builder with the given initial byte capacity.
    pub fn new(capacity: usize) -> Self {
        Builder {
            buf: Buffer::with_capacity(capacity),
            frames: FrameStack::new(),
            options: BuilderOptions::default(),
        }
    }

    /// Creates an empty builder with the given initial byte capacity and options.
    pub fn with_options(capacity: usize, options: BuilderOptions) -> Self {
        Builder {
            buf: Buffer::with_capacity(capacity),
            frames: FrameStack::new(),
            options,
        }
    }

    /// Returns a copy of this builder's current options.
    pub fn options(&self) -> BuilderOptions {
        self.options
    }

    /// Replaces this builder's options. Only affects containers closed after
    /// this call; there is no requirement that options stay fixed for the
    /// life of the builder.
    pub fn set_options(&mut self, options: BuilderOptions) {
        self.options = options;
    }

    /// Resets the builder to empty, discarding all buffered bytes and open
    /// frames, while keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.frames = FrameStack::new();
    }

    /// Whether the top of the frame stack is an open array.
    pub fn is_open_array(&self) -> bool {
        matches!(self.frames.top(), Some(f) if f.kind == Kind::Array)
    }

    /// Whether the top of the frame stack is an open object.
    pub fn is_open_object(&self) -> bool {
        matches!(self.frames.top(), Some(f) if f.kind == Kind::Object)
    }

    /// Whether every opened container has been closed.
    pub fn is_closed(&self) -> bool {
        self.frames.is_empty()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.len() == 0
    }

    /// Number of bytes written so far (including any still-open, not yet
    /// finalized, container headers).
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    /// Returns the finished bytes. Fails with [`Error::NotClosed`] if any
    /// container is still open.
    pub fn bytes(&self) -> Result<&[u8]> {
        if !self.frames.is_empty() {
            return Err(Error::NotClosed {
                open_frames: self.frames.depth(),
            });
        }
        Ok(self.buf.as_slice())
    }

    /// Opens a new array. If `unindexed` is set, the array is written using
    /// the compact variable-length layout regardless of `BuilderOptions`.
    pub fn open_array(&mut self, unindexed: bool) -> Result<()> {
        self.before_open(Kind::Array)?;
        container::open(&mut self.buf, &mut self.frames, Kind::Array, unindexed);
        Ok(())
    }

    /// Opens a new object. If `unindexed` is set, the object is written
    /// using the compact variable-length layout regardless of `BuilderOptions`.
    pub fn open_object(&mut self, unindexed: bool) -> Result<()> {
        self.before_open(Kind::Object)?;
        container::open(&mut self.buf, &mut self.frames, Kind::Object, unindexed);
        Ok(())
    }

    /// Validates the parent-side bookkeeping for opening a new container as
    /// either an array element or a pending object value. Only an array
    /// parent records the child's offset: an object only ever indexes its
    /// keys, and a container can never itself serve as a key (keys must be
    /// strings).
    fn before_open(&mut self, _new_kind: Kind) -> Result<()> {
        match self.frames.top() {
            None => {}
            Some(frame) if frame.kind == Kind::Array => self.record_child_offset(),
            Some(frame) if frame.kind == Kind::Object && frame.key_written => {
                self.frames.top_mut().unwrap().key_written = false;
            }
            Some(_) => return Err(Error::NeedOpenArray),
        }
        Ok(())
    }

    /// Records the start offset of a to-be-written child in the current top
    /// frame. For an object parent, only call this when writing a key (the
    /// offset the index table will later sort on); object values are never
    /// recorded.
    fn record_child_offset(&mut self) {
        let offset = self.buf.len();
        let frame = self.frames.top_mut().expect("checked by caller");
        let relative = (offset - frame.start) as u64;
        frame.child_offsets.push(relative);
    }

    /// Closes the innermost open container.
    pub fn close(&mut self) -> Result<()> {
        let frame = self.frames.pop().ok_or(Error::NeedOpenCompound)?;
        container::close(&mut self.buf, frame, &self.options)
    }

    /// Appends a scalar or pre-encoded value.
    ///
    /// If the top frame is an open object and no key is currently pending,
    /// `value` must be a string (it becomes the next key); otherwise it is
    /// appended as the value completing the most recently written key.
    pub fn add_value(&mut self, value: Value<'_>) -> Result<()> {
        let writing_object_key = matches!(
            self.frames.top(),
            Some(f) if f.kind == Kind::Object && !f.key_written
        );
        if writing_object_key && !value.is_string() {
            return Err(Error::KeyMustBeString);
        }
        let should_record = writing_object_key
            || matches!(self.frames.top(), Some(f) if f.kind == Kind::Array);

        self.append_recording(should_record, |buf| match value {
            Value::Raw(bytes) => {
                if bytes.is_empty() {
                    return Err(Error::UnexpectedType {
                        reason: "Value::Raw must be a non-empty, already-encoded slice"
                            .to_string(),
                    });
                }
                let expected = slice::byte_size(bytes, 0)?;
                if expected != bytes.len() {
                    return Err(Error::UnexpectedType {
                        reason: format!(
                            "Value::Raw slice reports byte_size {expected} but was {} bytes long",
                            bytes.len()
                        ),
                    });
                }
                buf.extend(bytes);
                Ok(())
            }
            other => primitive::encode(buf.raw_mut(), &other),
        })?;
        if let Some(frame) = self.frames.top_mut() {
            if frame.kind == Kind::Object {
                frame.key_written = !frame.key_written;
            }
        }
        Ok(())
    }

    /// Appends a key and its value to the top object in one call.
    ///
    /// If `value` fails to encode, the key is rolled back along with it (its
    /// recorded offset is dropped and `key_written` is reset), so the object
    /// is left exactly as it was before this call, not stuck mid-pair.
    pub fn add_key_value(&mut self, key: &str, value: Value<'_>) -> Result<()> {
        match self.frames.top() {
            Some(f) if f.kind == Kind::Object => {}
            Some(_) => return Err(Error::NeedOpenObject),
            None => return Err(Error::NeedOpenCompound),
        }
        if self.frames.top().unwrap().key_written {
            return Err(Error::KeyAlreadyWritten);
        }
        self.add_value(Value::String(key))?;
        if let Err(e) = self.add_value(value) {
            if let Some(frame) = self.frames.top_mut() {
                frame.child_offsets.pop();
                frame.key_written = false;
            }
            return Err(e);
        }
        Ok(())
    }

    /// Appends every item of `iter` as a value of the currently open array.
    /// Leaves the array open; the caller still calls [`Builder::close`].
    pub fn add_values_from_array_iterator<'a, I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = Value<'a>>,
    {
        if !self.is_open_array() {
            return Err(Error::NeedOpenArray);
        }
        for value in iter {
            self.add_value(value)?;
        }
        Ok(())
    }

    /// Appends every `(key, value)` pair of `iter` to the currently open
    /// object. Leaves the object open; the caller still calls [`Builder::close`].
    pub fn add_key_values_from_object_iterator<'a, K, I>(&mut self, iter: I) -> Result<()>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value<'a>)>,
    {
        match self.frames.top() {
            Some(f) if f.kind == Kind::Object => {}
            Some(_) => return Err(Error::NeedOpenObject),
            None => return Err(Error::NeedOpenCompound),
        }
        if self.frames.top().unwrap().key_written {
            return Err(Error::KeyAlreadyWritten);
        }
        for (key, value) in iter {
            self.add_key_value(key.as_ref(), value)?;
        }
        Ok(())
    }

    /// Removes the last value (or key-value pair) added to the top
    /// container, truncating the buffer back to before it was written.
    ///
    /// For an object, a recorded child offset is always a key: if no value
    /// has followed it yet (`key_written`), this removes the dangling key
    /// and clears `key_written`; otherwise it removes the entire last
    /// key-value pair.
    pub fn remove_last(&mut self) -> Result<()> {
        let frame = self.frames.top_mut().ok_or(Error::NeedOpenCompound)?;
        let last = frame.child_offsets.pop().ok_or(Error::NeedSubValue)?;
        let truncate_to = frame.start + last as usize;
        frame.key_written = false;
        self.buf.truncate(truncate_to);
        Ok(())
    }

    /// Whether the top open object has an entry named `key`.
    pub fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.find_key_offset(key)?.is_some())
    }

    /// Returns the encoded bytes of the value stored under `key` in the top
    /// open object, if present.
    pub fn get_key(&self, key: &str) -> Result<Option<&[u8]>> {
        let Some(key_offset) = self.find_key_offset(key)? else {
            return Ok(None);
        };
        let value_offset = slice::next(self.buf.as_slice(), key_offset)?;
        let value_end = slice::next(self.buf.as_slice(), value_offset)?;
        Ok(Some(&self.buf.as_slice()[value_offset..value_end]))
    }

    fn find_key_offset(&self, key: &str) -> Result<Option<usize>> {
        let frame = self.frames.top().ok_or(Error::NeedOpenObject)?;
        if frame.kind != Kind::Object {
            return Err(Error::NeedOpenObject);
        }
        for &rel in &frame.child_offsets {
            let at = frame.start + rel as usize;
            let name = slice::make_key(self.buf.as_slice(), at)?;
            if name == key {
                return Ok(Some(at));
            }
        }
        Ok(None)
    }

    /// Runs `encode` (which appends exactly one value to the buffer). When
    /// `should_record` is set, the child's start offset is recorded in the
    /// parent frame first and rolled back if `encode` fails.
    fn append_recording(
        &mut self,
        should_record: bool,
        encode: impl FnOnce(&mut Buffer) -> Result<()>,
    ) -> Result<()> {
        if should_record {
            self.record_child_offset();
        }
        match encode(&mut self.buf) {
            Ok(()) => Ok(()),
            Err(e) => {
                if should_record {
                    if let Some(frame) = self.frames.top_mut() {
                        frame.child_offsets.pop();
                    }
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_array_closes_to_single_byte() {
        let mut b = Builder::new(16);
        b.open_array(false).unwrap();
        b.close().unwrap();
        assert_eq!(b.bytes().unwrap(), &[0x01]);
    }

    #[test]
    fn empty_object_closes_to_single_byte() {
        let mut b = Builder::new(16);
        b.open_object(false).unwrap();
        b.close().unwrap();
        assert_eq!(b.bytes().unwrap(), &[0x0a]);
    }

    #[test]
    fn get_key_returns_nested_general_object_bytes() {
        let mut b = Builder::new(64);
        b.open_object(false).unwrap();
        b.add_value(Value::String("k")).unwrap();
        b.open_object(false).unwrap();
        b.add_key_value("a", Value::SmallInt(1)).unwrap();
        b.add_key_value("b", Value::SmallInt(2)).unwrap();
        b.close().unwrap();
        let bytes = b.get_key("k").unwrap().unwrap();
        assert_eq!(bytes[0], 0x0b);
        b.close().unwrap();
    }

    #[test]
    fn bytes_fails_while_open() {
        let mut b = Builder::new(16);
        b.open_array(false).unwrap();
        assert_eq!(
            b.bytes().unwrap_err(),
            Error::NotClosed { open_frames: 1 }
        );
    }

    #[test]
    fn array_of_equal_length_small_ints() {
        let mut b = Builder::new(16);
        b.open_array(false).unwrap();
        b.add_value(Value::SmallInt(1)).unwrap();
        b.add_value(Value::SmallInt(2)).unwrap();
        b.add_value(Value::SmallInt(3)).unwrap();
        b.close().unwrap();
        assert_eq!(b.bytes().unwrap(), &[0x02, 0x05, 0x31, 0x32, 0x33]);
    }

    #[test]
    fn object_sorts_index_table_but_not_payload() {
        let mut b = Builder::new(32);
        b.open_object(false).unwrap();
        b.add_key_value("b", Value::UInt(12)).unwrap();
        b.add_key_value("a", Value::Bool(true)).unwrap();
        b.close().unwrap();
        assert_eq!(
            b.bytes().unwrap(),
            &[0x0b, 0x0c, 0x02, 0x41, 0x62, 0x28, 0x0c, 0x41, 0x61, 0x1a, 0x07, 0x03]
        );
    }

    #[test]
    fn object_key_must_be_string() {
        let mut b = Builder::new(16);
        b.open_object(false).unwrap();
        assert_eq!(
            b.add_value(Value::SmallInt(1)).unwrap_err(),
            Error::KeyMustBeString
        );
    }

    #[test]
    fn add_key_value_rolls_back_key_when_value_fails() {
        let mut b = Builder::new(16);
        b.open_object(false).unwrap();
        b.add_key_value("ok", Value::SmallInt(1)).unwrap();
        let err = b.add_key_value("bad", Value::SmallInt(42)).unwrap_err();
        assert_eq!(
            err,
            Error::UnexpectedType {
                reason: "small int 42 out of range -6..=9".to_string()
            }
        );
        // The object is usable again: another key/value pair may follow.
        b.add_key_value("after", Value::Bool(true)).unwrap();
        b.close().unwrap();
        assert!(b.bytes().is_ok());
    }

    #[test]
    fn duplicate_attribute_name_detected() {
        let mut b = Builder::with_options(
            32,
            BuilderOptions::default().with_check_attribute_uniqueness(true),
        );
        b.open_object(false).unwrap();
        b.add_key_value("x", Value::SmallInt(1)).unwrap();
        b.add_key_value("x", Value::SmallInt(2)).unwrap();
        assert_eq!(
            b.close().unwrap_err(),
            Error::DuplicateAttributeName { key: "x".to_string() }
        );
    }

    #[test]
    fn remove_last_drops_final_child() {
        let mut b = Builder::new(16);
        b.open_array(false).unwrap();
        b.add_value(Value::SmallInt(1)).unwrap();
        b.add_value(Value::SmallInt(2)).unwrap();
        b.remove_last().unwrap();
        b.close().unwrap();
        assert_eq!(b.bytes().unwrap(), &[0x02, 0x03, 0x31]);
    }

    #[test]
    fn remove_last_clears_dangling_key_written_flag() {
        let mut b = Builder::new(16);
        b.open_object(false).unwrap();
        b.add_key_value("kept", Value::SmallInt(1)).unwrap();
        // Write a key with no value yet.
        b.add_value(Value::String("dangling")).unwrap();
        b.remove_last().unwrap();
        // If key_written weren't cleared, this would fail with KeyMustBeString.
        b.add_key_value("after", Value::Bool(true)).unwrap();
        b.close().unwrap();
        assert!(b.has_key("kept").is_err()); // closed: no longer an open object
    }

    #[test]
    fn has_key_and_get_key_scan_open_object() {
        let mut b = Builder::new(16);
        b.open_object(false).unwrap();
        b.add_key_value("name", Value::SmallInt(5)).unwrap();
        assert!(b.has_key("name").unwrap());
        assert!(!b.has_key("missing").unwrap());
        assert_eq!(b.get_key("name").unwrap(), Some(&[0x35][..]));
        b.close().unwrap();
    }

    #[test]
    fn nested_array_of_object() {
        let mut b = Builder::new(32);
        b.open_array(false).unwrap();
        b.open_object(false).unwrap();
        b.add_key_value("k", Value::String("v")).unwrap();
        b.close().unwrap();
        b.close().unwrap();
        let bytes = b.bytes().unwrap();
        assert_eq!(bytes[0], 0x02); // equal-length shortcut, one child
    }

    #[test]
    fn long_string_roundtrips_length() {
        let s = "a".repeat(200);
        let mut b = Builder::new(256);
        b.add_value(Value::String(&s)).unwrap();
        let bytes = b.bytes().unwrap();
        assert_eq!(bytes[0], 0xbf);
        assert_eq!(bytes.len(), 9 + 200);
    }

    #[test]
    fn bulk_add_array_from_iterator() {
        let mut b = Builder::new(16);
        b.open_array(false).unwrap();
        b.add_values_from_array_iterator([Value::SmallInt(1), Value::SmallInt(2)])
            .unwrap();
        b.close().unwrap();
        assert_eq!(b.bytes().unwrap(), &[0x02, 0x04, 0x31, 0x32]);
    }

    #[test]
    fn bulk_add_object_from_iterator() {
        let mut b = Builder::new(32);
        b.open_object(false).unwrap();
        b.add_key_values_from_object_iterator([
            ("b", Value::SmallInt(2)),
            ("a", Value::SmallInt(1)),
        ])
        .unwrap();
        b.close().unwrap();
        let bytes = b.bytes().unwrap();
        assert_eq!(bytes[0], 0x0b);
    }
}
