//! Parsing of TrueType font files.
//!
//! [`Font`] borrows the file data and keeps the tables needed to map
//! characters, measure and load glyphs. Everything is validated up front,
//! so a font that parses successfully never reports structural errors for
//! the `head`, `maxp`, `hhea`, `hmtx`, `cmap` and `kern` tables later on.

mod cmap;
mod kern;
mod metrics;

use ttrast_types::{
    BoundingBox, GlyphId, Tag, TRUE_SFNT_VERSION, TTC_HEADER_TAG, TT_SFNT_VERSION,
};

use crate::{error::ParseError, font_data::FontData};

pub use cmap::{Cmap, CmapEntry};
pub use kern::Kern;
pub use metrics::HMetric;

/// Tags of the tables read by [`Font`].
pub mod tags {
    use ttrast_types::Tag;

    pub const CMAP: Tag = Tag::new(b"cmap");
    pub const CVT: Tag = Tag::new(b"cvt ");
    pub const FPGM: Tag = Tag::new(b"fpgm");
    pub const GLYF: Tag = Tag::new(b"glyf");
    pub const HEAD: Tag = Tag::new(b"head");
    pub const HHEA: Tag = Tag::new(b"hhea");
    pub const HMTX: Tag = Tag::new(b"hmtx");
    pub const KERN: Tag = Tag::new(b"kern");
    pub const LOCA: Tag = Tag::new(b"loca");
    pub const MAXP: Tag = Tag::new(b"maxp");
    pub const PREP: Tag = Tag::new(b"prep");
}

const HEAD_LEN: usize = 54;
const MAXP_LEN: usize = 32;
const HHEA_LEN: usize = 36;
const TABLE_RECORD_LEN: usize = 16;
const TABLE_DIRECTORY_HEADER_LEN: usize = 12;

/// Parses a font from a complete font or font collection file.
///
/// For collections, the first font is used.
pub fn parse(data: &[u8]) -> Result<Font<'_>, ParseError> {
    Font::new(data)
}

/// Scales `value` in font units by `scale / units_per_em`, rounding half
/// away from zero.
pub(crate) fn scale_value(scale: i32, value: i32, units_per_em: i32) -> i32 {
    let x = scale as i64 * value as i64;
    let upem = units_per_em as i64;
    let x = if x >= 0 { x + upem / 2 } else { x - upem / 2 };
    (x / upem) as i32
}

/// Size of the offsets in the `loca` table.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum LocaFormat {
    #[default]
    Short,
    Long,
}

/// Limits from the `maxp` table that size the hinting interpreter.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct MaxProfile {
    pub num_glyphs: u16,
    pub max_twilight_points: u16,
    pub max_storage: u16,
    pub max_function_defs: u16,
    pub max_instruction_defs: u16,
    pub max_stack: u16,
}

impl MaxProfile {
    fn read(data: FontData) -> Result<Self, ParseError> {
        if data.len() != MAXP_LEN {
            return Err(ParseError::InvalidTableLength {
                tag: tags::MAXP,
                len: data.len(),
            });
        }
        let version: u32 = data.read_at(0)?;
        if version != 0x00010000 {
            return Err(ParseError::InvalidVersion {
                tag: tags::MAXP,
                version,
            });
        }
        Ok(Self {
            num_glyphs: data.read_at(4)?,
            max_twilight_points: data.read_at(16)?,
            max_storage: data.read_at(18)?,
            max_function_defs: data.read_at(20)?,
            max_instruction_defs: data.read_at(22)?,
            max_stack: data.read_at(24)?,
        })
    }
}

/// Byte ranges of the recognized tables. Absent tables are empty.
#[derive(Copy, Clone, Default, Debug)]
struct Tables<'a> {
    cmap: FontData<'a>,
    cvt: FontData<'a>,
    fpgm: FontData<'a>,
    glyf: FontData<'a>,
    head: FontData<'a>,
    hhea: FontData<'a>,
    hmtx: FontData<'a>,
    kern: FontData<'a>,
    loca: FontData<'a>,
    maxp: FontData<'a>,
    prep: FontData<'a>,
}

impl<'a> Tables<'a> {
    /// Reads the table directory at `offset`. Table offsets are relative to
    /// the start of the file, even inside a collection.
    fn read(data: FontData<'a>, offset: usize) -> Result<Self, ParseError> {
        let num_tables = data.read_at::<u16>(offset + 4)? as usize;
        let records = data
            .slice_len(
                offset + TABLE_DIRECTORY_HEADER_LEN,
                num_tables * TABLE_RECORD_LEN,
            )
            .ok_or(ParseError::OutOfBounds)?;
        let mut tables = Tables::default();
        let mut cursor = records.cursor();
        for _ in 0..num_tables {
            let tag: Tag = cursor.read()?;
            cursor.advance::<u32>(); // checksum
            let table_offset = cursor.read::<u32>()? as usize;
            let len = cursor.read::<u32>()? as usize;
            let slot = match tag {
                tags::CMAP => &mut tables.cmap,
                tags::CVT => &mut tables.cvt,
                tags::FPGM => &mut tables.fpgm,
                tags::GLYF => &mut tables.glyf,
                tags::HEAD => &mut tables.head,
                tags::HHEA => &mut tables.hhea,
                tags::HMTX => &mut tables.hmtx,
                tags::KERN => &mut tables.kern,
                tags::LOCA => &mut tables.loca,
                tags::MAXP => &mut tables.maxp,
                tags::PREP => &mut tables.prep,
                _ => continue,
            };
            *slot = data
                .slice_len(table_offset, len)
                .ok_or(ParseError::OutOfBounds)?;
        }
        for (tag, table) in [
            (tags::HEAD, tables.head),
            (tags::MAXP, tables.maxp),
            (tags::HHEA, tables.hhea),
            (tags::CMAP, tables.cmap),
        ] {
            if table.is_empty() {
                return Err(ParseError::TableIsMissing(tag));
            }
        }
        Ok(tables)
    }
}

/// Returns the offset of the table directory of the first font in the file.
fn table_directory_offset(data: FontData) -> Result<usize, ParseError> {
    if data.len() < TABLE_DIRECTORY_HEADER_LEN {
        return Err(ParseError::OutOfBounds);
    }
    let version: u32 = data.read_at(0)?;
    if version == TT_SFNT_VERSION || version == TRUE_SFNT_VERSION {
        return Ok(0);
    }
    if Tag::from_u32(version) != TTC_HEADER_TAG {
        return Err(ParseError::InvalidSfnt(version));
    }
    let ttc_version: u32 = data.read_at(4)?;
    if ttc_version != 0x00010000 {
        return Err(ParseError::InvalidVersion {
            tag: TTC_HEADER_TAG,
            version: ttc_version,
        });
    }
    let num_fonts: u32 = data.read_at(8)?;
    if num_fonts == 0 {
        return Err(ParseError::InvalidCollectionIndex(0));
    }
    if data.len().saturating_sub(12) / 4 < num_fonts as usize {
        return Err(ParseError::OutOfBounds);
    }
    let offset = data.read_at::<u32>(12)? as usize;
    if offset == 0 || offset + TABLE_DIRECTORY_HEADER_LEN > data.len() {
        return Err(ParseError::OutOfBounds);
    }
    let version: u32 = data.read_at(offset)?;
    if Tag::from_u32(version) == TTC_HEADER_TAG {
        return Err(ParseError::NestedCollection);
    }
    if version != TT_SFNT_VERSION && version != TRUE_SFNT_VERSION {
        return Err(ParseError::InvalidSfnt(version));
    }
    Ok(offset)
}

/// A parsed TrueType font.
///
/// Scaled quantities take a `scale` argument: the number of pixels per em,
/// in 26.6 fixed point. Passing the units per em as the scale returns
/// values in font units.
#[derive(Clone, Debug)]
pub struct Font<'a> {
    tables: Tables<'a>,
    units_per_em: i32,
    loca_format: LocaFormat,
    bounds: BoundingBox<i32>,
    maxp: MaxProfile,
    num_h_metrics: usize,
    cmap: Cmap<'a>,
    kern: Kern<'a>,
}

impl<'a> Font<'a> {
    /// Parses the font at the start of `data`.
    pub fn new(data: &'a [u8]) -> Result<Self, ParseError> {
        let data = FontData::new(data);
        let tables = Tables::read(data, table_directory_offset(data)?)?;
        let (units_per_em, bounds, loca_format) = read_head(tables.head)?;
        let cmap = Cmap::new(tables.cmap)?;
        let maxp = MaxProfile::read(tables.maxp)?;
        let num_h_metrics = read_hhea(tables.hhea, tables.hmtx, maxp.num_glyphs as usize)?;
        let kern = Kern::new(tables.kern)?;
        log::debug!(
            "parsed font: {} glyphs, {} units per em, {} cmap entries, {} kerning pairs",
            maxp.num_glyphs,
            units_per_em,
            cmap.entries().len(),
            kern.len()
        );
        Ok(Self {
            tables,
            units_per_em,
            loca_format,
            bounds,
            maxp,
            num_h_metrics,
            cmap,
            kern,
        })
    }

    pub fn units_per_em(&self) -> i32 {
        self.units_per_em
    }

    pub fn num_glyphs(&self) -> usize {
        self.maxp.num_glyphs as usize
    }

    pub fn num_h_metrics(&self) -> usize {
        self.num_h_metrics
    }

    pub fn loca_format(&self) -> LocaFormat {
        self.loca_format
    }

    /// Interpreter limits from the `maxp` table.
    pub fn max_profile(&self) -> &MaxProfile {
        &self.maxp
    }

    pub fn max_twilight_points(&self) -> u16 {
        self.maxp.max_twilight_points
    }

    pub fn max_storage(&self) -> u16 {
        self.maxp.max_storage
    }

    pub fn max_function_defs(&self) -> u16 {
        self.maxp.max_function_defs
    }

    pub fn max_instruction_defs(&self) -> u16 {
        self.maxp.max_instruction_defs
    }

    pub fn max_stack(&self) -> u16 {
        self.maxp.max_stack
    }

    /// Raw contents of the `cvt ` table.
    pub fn cvt(&self) -> &'a [u8] {
        self.tables.cvt.as_bytes()
    }

    /// The font program.
    pub fn fpgm(&self) -> &'a [u8] {
        self.tables.fpgm.as_bytes()
    }

    /// The control value program.
    pub fn prep(&self) -> &'a [u8] {
        self.tables.prep.as_bytes()
    }

    pub fn cmap(&self) -> &Cmap<'a> {
        &self.cmap
    }

    pub fn kern(&self) -> &Kern<'a> {
        &self.kern
    }

    /// Returns the glyph for `ch`, or [`GlyphId::NOTDEF`] if it is not
    /// mapped.
    pub fn index(&self, ch: char) -> GlyphId {
        self.cmap.map_codepoint(ch as u32)
    }

    /// Scales a value in font units by `scale`, rounding half away from
    /// zero.
    pub fn scale(&self, scale: i32, value: i32) -> i32 {
        scale_value(scale, value, self.units_per_em())
    }

    /// Returns the union of the bounds of all glyphs.
    pub fn bounds(&self, scale: i32) -> BoundingBox<i32> {
        self.bounds.map(|v| self.scale(scale, v))
    }

    /// Returns the horizontal metrics of a glyph.
    pub fn h_metric(&self, scale: i32, glyph_id: GlyphId) -> HMetric {
        let metric = self.unscaled_h_metric(glyph_id);
        HMetric {
            advance_width: self.scale(scale, metric.advance_width),
            left_side_bearing: self.scale(scale, metric.left_side_bearing),
        }
    }

    /// Returns the kerning adjustment between two glyphs, or zero.
    pub fn kerning(&self, scale: i32, left: GlyphId, right: GlyphId) -> i32 {
        match self.kern.get(left, right) {
            Some(value) => self.scale(scale, value as i32),
            None => 0,
        }
    }

    /// Returns the outline data for a glyph, or `None` for glyphs without
    /// an outline.
    pub(crate) fn glyph_data(&self, glyph_id: GlyphId) -> Result<Option<FontData<'a>>, ParseError> {
        let ix = glyph_id.to_usize();
        let loca = self.tables.loca;
        let (start, end) = match self.loca_format {
            LocaFormat::Short => (
                loca.read_at::<u16>(ix * 2)? as usize * 2,
                loca.read_at::<u16>(ix * 2 + 2)? as usize * 2,
            ),
            LocaFormat::Long => (
                loca.read_at::<u32>(ix * 4)? as usize,
                loca.read_at::<u32>(ix * 4 + 4)? as usize,
            ),
        };
        if start == end {
            return Ok(None);
        }
        self.tables
            .glyf
            .slice(start..end)
            .map(Some)
            .ok_or(ParseError::OutOfBounds)
    }
}

fn read_head(head: FontData) -> Result<(i32, BoundingBox<i32>, LocaFormat), ParseError> {
    if head.len() != HEAD_LEN {
        return Err(ParseError::InvalidTableLength {
            tag: tags::HEAD,
            len: head.len(),
        });
    }
    let units_per_em: u16 = head.read_at(18)?;
    if units_per_em == 0 {
        return Err(ParseError::InvalidUnitsPerEm(units_per_em));
    }
    let bounds = BoundingBox {
        x_min: head.read_at::<i16>(36)? as i32,
        y_min: head.read_at::<i16>(38)? as i32,
        x_max: head.read_at::<i16>(40)? as i32,
        y_max: head.read_at::<i16>(42)? as i32,
    };
    let loca_format = match head.read_at::<i16>(50)? {
        0 => LocaFormat::Short,
        1 => LocaFormat::Long,
        other => return Err(ParseError::InvalidFormat(other as i64)),
    };
    Ok((units_per_em as i32, bounds, loca_format))
}

/// Returns the number of long horizontal metrics after checking that the
/// `hmtx` table has exactly the expected size.
fn read_hhea(hhea: FontData, hmtx: FontData, num_glyphs: usize) -> Result<usize, ParseError> {
    if hhea.len() != HHEA_LEN {
        return Err(ParseError::InvalidTableLength {
            tag: tags::HHEA,
            len: hhea.len(),
        });
    }
    let num_h_metrics = hhea.read_at::<u16>(34)? as usize;
    let expected_len = num_glyphs
        .checked_sub(num_h_metrics)
        .map(|tail| num_h_metrics * 4 + tail * 2);
    if expected_len != Some(hmtx.len()) {
        return Err(ParseError::InconsistentLength(tags::HMTX));
    }
    Ok(num_h_metrics)
}
