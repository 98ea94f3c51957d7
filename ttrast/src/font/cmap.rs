//! The [cmap](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap) table

use ttrast_types::GlyphId;

use crate::{error::ParseError, font_data::FontData};

/// A range of character codes mapped to glyphs.
///
/// Characters in `start_code..=end_code` map to `code + id_delta` when
/// `id_range_offset` is zero. Otherwise the glyph is read from the glyph
/// index array of a format 4 subtable.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct CmapEntry {
    pub start_code: u32,
    pub end_code: u32,
    pub id_delta: u32,
    pub id_range_offset: u32,
}

/// Character to glyph mapping from a format 4 or format 12 subtable.
#[derive(Clone, Default, Debug)]
pub struct Cmap<'a> {
    entries: Vec<CmapEntry>,
    glyph_id_array: FontData<'a>,
}

impl<'a> Cmap<'a> {
    /// Selects and parses the subtable to use from a `cmap` table.
    ///
    /// A Unicode platform subtable wins outright; Windows Unicode BMP (3, 1)
    /// and full repertoire (3, 10) subtables are used if there is no
    /// Unicode platform subtable, preferring (3, 10).
    pub fn new(data: FontData<'a>) -> Result<Self, ParseError> {
        let num_tables = data.read_at::<u16>(2)? as usize;
        let mut cursor = data
            .slice_len(4, num_tables * 8)
            .ok_or(ParseError::OutOfBounds)?
            .cursor();
        let mut selected = None;
        let mut fallback = None;
        for _ in 0..num_tables {
            let platform_id: u16 = cursor.read()?;
            let encoding_id: u16 = cursor.read()?;
            let offset = cursor.read::<u32>()? as usize;
            match (platform_id, encoding_id) {
                (0, _) => {
                    selected = Some(offset);
                    break;
                }
                (3, 10) => fallback = Some(offset),
                (3, 1) => fallback = fallback.or(Some(offset)),
                _ => {}
            }
        }
        let offset = selected
            .or(fallback)
            .ok_or(ParseError::UnsupportedCmap)?;
        let subtable = data.split_off(offset).ok_or(ParseError::OutOfBounds)?;
        match subtable.read_at::<u16>(0)? {
            4 => Self::read_format4(subtable),
            12 => Self::read_format12(subtable),
            format => Err(ParseError::InvalidFormat(format as i64)),
        }
    }

    fn read_format4(data: FontData<'a>) -> Result<Self, ParseError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>(); // format
        cursor.advance::<u16>(); // length
        let language: u16 = cursor.read()?;
        if language != 0 {
            return Err(ParseError::UnsupportedCmap);
        }
        let seg_count = cursor.read::<u16>()? as usize / 2;
        // searchRange, entrySelector, rangeShift
        cursor.advance_by(6);
        let end_codes = FontData::new(cursor.read_bytes(seg_count * 2)?);
        cursor.advance::<u16>(); // reservedPad
        let start_codes = FontData::new(cursor.read_bytes(seg_count * 2)?);
        let deltas = FontData::new(cursor.read_bytes(seg_count * 2)?);
        let range_offsets = FontData::new(cursor.read_bytes(seg_count * 2)?);
        let glyph_id_array = data
            .split_off(cursor.position())
            .ok_or(ParseError::OutOfBounds)?;
        let entries = (0..seg_count)
            .map(|i| {
                Ok(CmapEntry {
                    start_code: start_codes.read_at::<u16>(i * 2)? as u32,
                    end_code: end_codes.read_at::<u16>(i * 2)? as u32,
                    id_delta: deltas.read_at::<u16>(i * 2)? as u32,
                    id_range_offset: range_offsets.read_at::<u16>(i * 2)? as u32,
                })
            })
            .collect::<Result<Vec<_>, ParseError>>()?;
        Ok(Self {
            entries,
            glyph_id_array,
        })
    }

    fn read_format12(data: FontData<'a>) -> Result<Self, ParseError> {
        let mut cursor = data.cursor();
        cursor.advance::<u16>(); // format
        let reserved: u16 = cursor.read()?;
        if reserved != 0 {
            return Err(ParseError::InvalidFormat(reserved as i64));
        }
        cursor.advance::<u32>(); // length
        cursor.advance::<u32>(); // language
        let num_groups = cursor.read::<u32>()? as usize;
        let groups = FontData::new(cursor.read_bytes(num_groups.saturating_mul(12))?);
        let mut cursor = groups.cursor();
        let mut entries = Vec::with_capacity(num_groups);
        for _ in 0..num_groups {
            let start_code: u32 = cursor.read()?;
            let end_code: u32 = cursor.read()?;
            let start_glyph: u32 = cursor.read()?;
            entries.push(CmapEntry {
                start_code,
                end_code,
                id_delta: start_glyph.wrapping_sub(start_code),
                id_range_offset: 0,
            });
        }
        Ok(Self {
            entries,
            glyph_id_array: FontData::default(),
        })
    }

    pub fn entries(&self) -> &[CmapEntry] {
        &self.entries
    }

    /// Returns the glyph for the given character code, or
    /// [`GlyphId::NOTDEF`] if it is not mapped.
    pub fn map_codepoint(&self, codepoint: u32) -> GlyphId {
        let len = self.entries.len();
        let (mut lo, mut hi) = (0, len);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let entry = &self.entries[mid];
            if codepoint < entry.start_code {
                hi = mid;
            } else if codepoint > entry.end_code {
                lo = mid + 1;
            } else if entry.id_range_offset == 0 {
                return GlyphId::new(codepoint.wrapping_add(entry.id_delta) as u16);
            } else {
                // The range offset is relative to the entry's own slot in
                // the idRangeOffset array, which directly precedes the
                // glyph id array.
                let offset = entry.id_range_offset as i64
                    + 2 * (mid as i64 - len as i64 + (codepoint - entry.start_code) as i64);
                let glyph = usize::try_from(offset)
                    .ok()
                    .and_then(|offset| self.glyph_id_array.read_at::<u16>(offset).ok())
                    .unwrap_or(0);
                if glyph == 0 {
                    return GlyphId::NOTDEF;
                }
                return GlyphId::new(glyph.wrapping_add(entry.id_delta as u16));
            }
        }
        GlyphId::NOTDEF
    }
}
