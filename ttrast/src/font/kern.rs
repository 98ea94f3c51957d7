//! The [kern](https://learn.microsoft.com/en-us/typography/opentype/spec/kern) table

use ttrast_types::GlyphId;

use super::tags;
use crate::{error::ParseError, font_data::FontData};

const HEADER_LEN: usize = 4;
const SUBTABLE_HEADER_LEN: usize = 14;
const PAIR_LEN: usize = 6;

/// Horizontal kerning pairs from a version 0 `kern` table with a single
/// format 0 subtable.
#[derive(Copy, Clone, Default, Debug)]
pub struct Kern<'a> {
    pairs: FontData<'a>,
    num_pairs: usize,
}

impl<'a> Kern<'a> {
    /// Validates the table. An empty table has no pairs.
    pub fn new(data: FontData<'a>) -> Result<Self, ParseError> {
        if data.is_empty() {
            return Ok(Self::default());
        }
        let version: u16 = data.read_at(0)?;
        let num_tables: u16 = data.read_at(2)?;
        if version != 0 || num_tables != 1 {
            return Err(ParseError::UnsupportedKern);
        }
        let length = data.read_at::<u16>(HEADER_LEN + 2)? as usize;
        let coverage: u16 = data.read_at(HEADER_LEN + 4)?;
        // format 0, horizontal kerning values only
        if coverage != 0x0001 {
            return Err(ParseError::UnsupportedKern);
        }
        let num_pairs = data.read_at::<u16>(HEADER_LEN + 6)? as usize;
        if Some(num_pairs * PAIR_LEN) != length.checked_sub(SUBTABLE_HEADER_LEN) {
            return Err(ParseError::InconsistentLength(tags::KERN));
        }
        let pairs = data
            .slice_len(HEADER_LEN + SUBTABLE_HEADER_LEN, num_pairs * PAIR_LEN)
            .ok_or(ParseError::OutOfBounds)?;
        Ok(Self { pairs, num_pairs })
    }

    /// Number of kerning pairs.
    pub fn len(&self) -> usize {
        self.num_pairs
    }

    pub fn is_empty(&self) -> bool {
        self.num_pairs == 0
    }

    /// Returns the unscaled kerning value for a pair of glyphs.
    pub fn get(&self, left: GlyphId, right: GlyphId) -> Option<i16> {
        let key = ((left.to_u16() as u32) << 16) | right.to_u16() as u32;
        let (mut lo, mut hi) = (0, self.num_pairs);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let pair_key: u32 = self.pairs.read_at(mid * PAIR_LEN).ok()?;
            match pair_key.cmp(&key) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => return self.pairs.read_at(mid * PAIR_LEN + 4).ok(),
            }
        }
        None
    }
}
