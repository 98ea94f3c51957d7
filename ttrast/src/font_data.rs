//! raw font bytes

use std::ops::{Bound, RangeBounds};

use ttrast_types::Scalar;

use crate::error::ParseError;

/// A reference to raw binary font data.
///
/// This is a wrapper around a byte slice, that provides convenience methods
/// for parsing and validating that data.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FontData<'a> {
    bytes: &'a [u8],
}

/// A cursor for reading a sequence of values from font data.
///
/// Reads past the end of the data fail with [`ParseError::OutOfBounds`].
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    pos: usize,
    data: FontData<'a>,
}

impl<'a> FontData<'a> {
    /// Create a new `FontData` with these bytes.
    pub const fn new(bytes: &'a [u8]) -> Self {
        FontData { bytes }
    }

    /// The length of the data, in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` if the data has a length of zero bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn split_off(&self, pos: usize) -> Option<FontData<'a>> {
        self.bytes.get(pos..).map(FontData::new)
    }

    pub fn slice(&self, range: impl RangeBounds<usize>) -> Option<FontData<'a>> {
        let bounds = (range.start_bound().cloned(), range.end_bound().cloned());
        self.bytes.get(bounds).map(FontData::new)
    }

    /// Returns the data for `len` bytes starting at `offset`, checking for
    /// overflow as well as bounds.
    pub fn slice_len(&self, offset: usize, len: usize) -> Option<FontData<'a>> {
        self.slice(offset..offset.checked_add(len)?)
    }

    pub fn read_at<T: Scalar>(&self, offset: usize) -> Result<T, ParseError> {
        self.bytes
            .get(offset..)
            .and_then(T::read)
            .ok_or(ParseError::OutOfBounds)
    }

    pub fn cursor(&self) -> Cursor<'a> {
        Cursor {
            pos: 0,
            data: *self,
        }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl<'a> Cursor<'a> {
    pub fn advance<T: Scalar>(&mut self) {
        self.pos += T::RAW_BYTE_LEN
    }

    pub fn advance_by(&mut self, n_bytes: usize) {
        self.pos += n_bytes;
    }

    pub fn read<T: Scalar>(&mut self) -> Result<T, ParseError> {
        let temp = self.data.read_at(self.pos);
        self.pos += T::RAW_BYTE_LEN;
        temp
    }

    /// Reads the next `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ParseError> {
        let bytes = self
            .data
            .slice_len(self.pos, len)
            .ok_or(ParseError::OutOfBounds)?;
        self.pos += len;
        Ok(bytes.as_bytes())
    }

    /// Returns the current position.
    pub fn position(&self) -> usize {
        self.pos
    }

    // used when handling fields with an implicit length, which must be at the
    // end of a table.
    pub fn remaining_bytes(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }
}

impl AsRef<[u8]> for FontData<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

impl<'a> From<&'a [u8]> for FontData<'a> {
    fn from(src: &'a [u8]) -> FontData<'a> {
        FontData::new(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_checks() {
        let data = FontData::new(&[0, 1, 2, 3, 4]);
        assert_eq!(data.read_at::<u16>(3), Ok(0x0304));
        assert_eq!(data.read_at::<u16>(4), Err(ParseError::OutOfBounds));
        assert_eq!(data.read_at::<u8>(usize::MAX), Err(ParseError::OutOfBounds));
        assert!(data.slice_len(2, 3).is_some());
        assert!(data.slice_len(2, 4).is_none());
        assert!(data.slice_len(usize::MAX, 2).is_none());
        assert_eq!(data.split_off(5).map(|d| d.len()), Some(0));
    }

    #[test]
    fn cursor() {
        let data = FontData::new(&[0xFF, 0xFE, 0, 0, 0, 7, 9]);
        let mut cursor = data.cursor();
        assert_eq!(cursor.read::<i16>(), Ok(-2));
        cursor.advance::<u16>();
        assert_eq!(cursor.read::<u16>(), Ok(7));
        assert_eq!(cursor.remaining_bytes(), 1);
        assert_eq!(cursor.read_bytes(2), Err(ParseError::OutOfBounds));
        assert_eq!(cursor.read_bytes(1), Ok(&[9u8][..]));
        assert!(cursor.read::<u8>().is_err());
    }
}
