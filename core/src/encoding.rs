//! Canonical binary encoding shared by conditions and fulfillments.
//!
//! Every variable-size field is length-prefixed. A length below `0x80` is a
//! single byte; longer lengths are written as `0x80 | n` followed by `n`
//! big-endian length bytes. Unsigned integers (`VarUInt`) are length-prefixed
//! minimal big-endian byte strings. Decoders reject non-minimal forms so
//! that every value has exactly one encoding.
//!
//! ```
//! use cryptoconditions_core::encoding::{Reader, Writer};
//!
//! let mut w = Writer::new();
//! w.write_var_uint(300);
//! w.write_var_bytes(b"abc");
//! let bytes = w.into_bytes();
//! assert_eq!(bytes, [0x02, 0x01, 0x2c, 0x03, b'a', b'b', b'c']);
//!
//! let mut r = Reader::new(&bytes);
//! assert_eq!(r.read_var_uint().unwrap(), 300);
//! assert_eq!(r.read_var_bytes().unwrap(), b"abc");
//! assert!(r.finish().is_ok());
//! ```

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::error::Error;
use crate::Result;

/// Number of bytes needed to hold `value` in minimal big-endian form (at least one).
fn be_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

/// Encoded size of a length prefix announcing `len` bytes.
pub fn length_prefix_len(len: u64) -> usize {
    if len < 0x80 {
        1
    } else {
        1 + be_len(len)
    }
}

/// Encoded size of a `VarUInt`.
pub fn var_uint_len(value: u64) -> usize {
    let n = be_len(value);
    length_prefix_len(n as u64) + n
}

/// Encoded size of a `VarBytes` field carrying `len` bytes.
pub fn var_bytes_len(len: u64) -> Result<u64> {
    len.checked_add(length_prefix_len(len) as u64)
        .ok_or(Error::NumericOverflow("encoded length"))
}

/// Append-only buffer producing the canonical binary form.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one raw byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Appends a big-endian `u16`, as used for type ids.
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends bytes with no length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Appends the shortest length prefix announcing `len` bytes.
    pub fn write_length_prefix(&mut self, len: usize) {
        let len = len as u64;
        if len < 0x80 {
            self.buf.push(len as u8);
        } else {
            let n = be_len(len);
            self.buf.push(0x80 | n as u8);
            self.buf.extend_from_slice(&len.to_be_bytes()[8 - n..]);
        }
    }

    /// Appends a `VarUInt`.
    pub fn write_var_uint(&mut self, value: u64) {
        let n = be_len(value);
        self.write_length_prefix(n);
        self.buf.extend_from_slice(&value.to_be_bytes()[8 - n..]);
    }

    /// Appends a `VarBytes` field.
    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_length_prefix(bytes.len());
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the writer, returning the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over an encoded buffer.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// A cursor at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Takes the next `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::TruncatedInput);
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Takes one raw byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Takes a big-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a minimal big-endian integer of exactly `len` bytes.
    fn read_be(&mut self, len: usize, what: &'static str) -> Result<u64> {
        if len == 0 {
            return Err(Error::MalformedBinary("empty integer"));
        }
        if len > 8 {
            return Err(Error::NumericOverflow(what));
        }
        let bytes = self.read_bytes(len)?;
        if len > 1 && bytes[0] == 0 {
            return Err(Error::MalformedBinary("non-minimal integer"));
        }
        Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    /// Reads a minimal length prefix no longer than the remaining input.
    pub fn read_length_prefix(&mut self) -> Result<usize> {
        let first = self.read_u8()?;
        if first & 0x80 == 0 {
            return Ok(first as usize);
        }
        let len = self.read_be((first & 0x7f) as usize, "length prefix")?;
        if len < 0x80 {
            return Err(Error::MalformedBinary("non-minimal length prefix"));
        }
        let len = usize::try_from(len).map_err(|_| Error::NumericOverflow("length prefix"))?;
        // A length can never exceed what is left to read.
        if len > self.remaining() {
            return Err(Error::TruncatedInput);
        }
        Ok(len)
    }

    /// Reads a minimal `VarUInt` of at most eight bytes.
    pub fn read_var_uint(&mut self) -> Result<u64> {
        let len = self.read_length_prefix()?;
        self.read_be(len, "integer")
    }

    /// Reads a `VarBytes` field, borrowing from the input.
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_length_prefix()?;
        self.read_bytes(len)
    }

    /// Fails unless the whole buffer has been consumed.
    pub fn finish(self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(Error::TrailingData(n)),
        }
    }
}

/// Unpadded base64url, as used in URIs.
pub fn base64url_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodes unpadded base64url; padding is rejected.
pub fn base64url_decode(text: &str) -> Result<Vec<u8>> {
    Ok(URL_SAFE_NO_PAD.decode(text)?)
}

/// Upper bound on the decoded size of an unpadded base64 string of `chars` characters.
pub fn base64url_decoded_len(chars: usize) -> usize {
    chars / 4 * 3 + (chars % 4 * 3) / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var_uint(value: u64) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_var_uint(value);
        w.into_bytes()
    }

    #[test]
    fn var_uint_encoding() {
        assert_eq!(var_uint(0), vec![0x01, 0x00]);
        assert_eq!(var_uint(0x2f), vec![0x01, 0x2f]);
        assert_eq!(var_uint(65535), vec![0x02, 0xff, 0xff]);
        assert_eq!(var_uint(65536), vec![0x03, 0x01, 0x00, 0x00]);
        for v in [0u64, 1, 0x7f, 0x80, 0xffff, u64::MAX] {
            let bytes = var_uint(v);
            assert_eq!(bytes.len(), var_uint_len(v));
            let mut r = Reader::new(&bytes);
            assert_eq!(r.read_var_uint().unwrap(), v);
            r.finish().unwrap();
        }
    }

    #[test]
    fn long_length_prefix() {
        let data = vec![0xab; 300];
        let mut w = Writer::new();
        w.write_var_bytes(&data);
        let bytes = w.into_bytes();
        assert_eq!(&bytes[..3], &[0x82, 0x01, 0x2c]);
        assert_eq!(bytes.len() as u64, var_bytes_len(300).unwrap());

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_var_bytes().unwrap(), data.as_slice());
    }

    #[test]
    fn rejects_non_minimal_forms() {
        let mut r = Reader::new(&[0x02, 0x00, 0x05]);
        assert_eq!(
            r.read_var_uint(),
            Err(Error::MalformedBinary("non-minimal integer"))
        );

        let mut r = Reader::new(&[0x81, 0x05, 0, 0, 0, 0, 0]);
        assert_eq!(
            r.read_length_prefix(),
            Err(Error::MalformedBinary("non-minimal length prefix"))
        );

        let mut r = Reader::new(&[0x00]);
        assert_eq!(r.read_var_uint(), Err(Error::MalformedBinary("empty integer")));
    }

    #[test]
    fn truncation_and_trailing_data() {
        let mut r = Reader::new(&[0x05, 1, 2]);
        assert_eq!(r.read_var_bytes(), Err(Error::TruncatedInput));

        let mut r = Reader::new(&[0x82, 0x01]);
        assert_eq!(r.read_length_prefix(), Err(Error::TruncatedInput));

        let mut r = Reader::new(&[0x01, 0x07, 0xff]);
        assert_eq!(r.read_var_uint().unwrap(), 7);
        assert_eq!(r.finish(), Err(Error::TrailingData(1)));
    }

    #[test]
    fn oversized_integer() {
        let mut bytes = vec![0x09];
        bytes.extend([0x01; 9]);
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_var_uint(), Err(Error::NumericOverflow("integer")));
    }

    #[test]
    fn base64url() {
        assert_eq!(base64url_encode(b"\xfb\xff"), "-_8");
        assert_eq!(base64url_decode("-_8").unwrap(), b"\xfb\xff");
        assert!(base64url_decode("abc=").is_err());
        assert!(base64url_decode("a").is_err());
        assert_eq!(base64url_decoded_len(0), 0);
        assert_eq!(base64url_decoded_len(3), 2);
        assert_eq!(base64url_decoded_len(86), 64);
    }
}
