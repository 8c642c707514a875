//! The scalar input type accepted by the builder

/// A VelocyPack scalar value to be appended to the builder.
///
/// Arrays and objects are not variants here: they are opened and closed
/// explicitly through [`crate::Builder::open_array`]/[`crate::Builder::open_object`],
/// not constructed as a tree and handed over in one call. `External`, `BCD`,
/// and custom-type values have no variant either; this builder never emits
/// them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// The VelocyPack `null` value
    Null,
    /// `true` or `false`
    Bool(bool),
    /// A small signed integer packed directly into the tag byte (`-6..=9`)
    SmallInt(i8),
    /// A signed integer, encoded in the minimal number of bytes that can
    /// represent it
    Int(i64),
    /// An unsigned integer, encoded in the minimal number of bytes that can
    /// represent it
    UInt(u64),
    /// An IEEE-754 double
    Double(f64),
    /// Milliseconds since the Unix epoch
    UtcDate(i64),
    /// A UTF-8 string. Encoded as a short string (length in the tag byte) when
    /// `s.len() <= 126`, otherwise a long string with an explicit length prefix.
    String(&'a str),
    /// Raw binary data, length-prefixed
    Binary(&'a [u8]),
    /// The VelocyPack `min-key` sentinel, sorts below every other value
    MinKey,
    /// The VelocyPack `max-key` sentinel, sorts above every other value
    MaxKey,
    /// The VelocyPack `illegal` marker
    Illegal,
    /// An already-encoded VelocyPack value, copied in verbatim rather than
    /// built from a typed variant. The slice must be exactly one complete
    /// value (tag byte through its last payload byte); `add_value` checks
    /// this against the tag's own reported length before copying it in.
    Raw(&'a [u8]),
}

impl<'a> Value<'a> {
    pub(crate) fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }
}
