//! Assembles complete SFNT files from table descriptions.

use std::collections::BTreeMap;

use ttrast_types::{Tag, TTC_HEADER_TAG, TT_SFNT_VERSION};

use crate::{bebuffer::BeBuffer, glyf::GlyphData};

/// Which `cmap` subtable format to emit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CmapFormat {
    /// Segments with an `idDelta`.
    #[default]
    Format4,
    /// Segments that look glyphs up in the trailing glyph id array.
    Format4IndexArray,
    /// 32-bit sequential groups.
    Format12,
}

#[derive(Clone, Debug)]
struct GlyphEntry {
    data: GlyphData,
    advance: u16,
    lsb: i16,
}

/// Builds a TrueType font in memory.
///
/// Glyph bounding boxes and the font bounds are derived from the outlines,
/// so tests only describe what they care about.
#[derive(Clone, Debug)]
pub struct FontBuilder {
    units_per_em: u16,
    long_loca: bool,
    glyphs: Vec<GlyphEntry>,
    num_h_metrics: Option<u16>,
    mappings: Vec<(u32, u16)>,
    cmap_format: CmapFormat,
    cmap_encoding: Option<(u16, u16)>,
    kerning: Vec<(u16, u16, i16)>,
    cvt: Vec<i16>,
    fpgm: Vec<u8>,
    prep: Vec<u8>,
    max_twilight_points: u16,
    max_storage: u16,
    max_function_defs: u16,
    max_instruction_defs: u16,
    max_stack: u16,
    overrides: BTreeMap<Tag, Option<Vec<u8>>>,
}

impl FontBuilder {
    pub fn new(units_per_em: u16) -> Self {
        Self {
            units_per_em,
            long_loca: false,
            glyphs: Vec::new(),
            num_h_metrics: None,
            mappings: Vec::new(),
            cmap_format: CmapFormat::Format4,
            cmap_encoding: None,
            kerning: Vec::new(),
            cvt: Vec::new(),
            fpgm: Vec::new(),
            prep: Vec::new(),
            max_twilight_points: 16,
            max_storage: 64,
            max_function_defs: 64,
            max_instruction_defs: 0,
            max_stack: 256,
            overrides: BTreeMap::new(),
        }
    }

    /// Append a glyph; its id is the number of glyphs added before it.
    pub fn glyph(mut self, data: impl Into<GlyphData>, advance: u16, lsb: i16) -> Self {
        self.glyphs.push(GlyphEntry {
            data: data.into(),
            advance,
            lsb,
        });
        self
    }

    pub fn long_loca(mut self) -> Self {
        self.long_loca = true;
        self
    }

    /// Only write explicit advances for the first `count` glyphs.
    pub fn num_h_metrics(mut self, count: u16) -> Self {
        self.num_h_metrics = Some(count);
        self
    }

    pub fn map(mut self, ch: char, glyph: u16) -> Self {
        self.mappings.push((ch as u32, glyph));
        self
    }

    pub fn map_codepoint(mut self, codepoint: u32, glyph: u16) -> Self {
        self.mappings.push((codepoint, glyph));
        self
    }

    pub fn cmap_format(mut self, format: CmapFormat) -> Self {
        self.cmap_format = format;
        self
    }

    /// Override the platform and encoding ids of the single cmap record.
    pub fn cmap_encoding(mut self, platform: u16, encoding: u16) -> Self {
        self.cmap_encoding = Some((platform, encoding));
        self
    }

    pub fn kern(mut self, left: u16, right: u16, value: i16) -> Self {
        self.kerning.push((left, right, value));
        self
    }

    pub fn cvt(mut self, values: &[i16]) -> Self {
        self.cvt = values.to_vec();
        self
    }

    pub fn fpgm(mut self, code: &[u8]) -> Self {
        self.fpgm = code.to_vec();
        self
    }

    pub fn prep(mut self, code: &[u8]) -> Self {
        self.prep = code.to_vec();
        self
    }

    pub fn max_twilight_points(mut self, count: u16) -> Self {
        self.max_twilight_points = count;
        self
    }

    pub fn max_storage(mut self, count: u16) -> Self {
        self.max_storage = count;
        self
    }

    pub fn max_function_defs(mut self, count: u16) -> Self {
        self.max_function_defs = count;
        self
    }

    pub fn max_instruction_defs(mut self, count: u16) -> Self {
        self.max_instruction_defs = count;
        self
    }

    pub fn max_stack(mut self, count: u16) -> Self {
        self.max_stack = count;
        self
    }

    /// Replace a generated table with the given bytes.
    pub fn table(mut self, tag: &[u8; 4], data: impl Into<Vec<u8>>) -> Self {
        self.overrides.insert(Tag::new(tag), Some(data.into()));
        self
    }

    /// Leave a table out of the font.
    pub fn remove_table(mut self, tag: &[u8; 4]) -> Self {
        self.overrides.insert(Tag::new(tag), None);
        self
    }

    /// Union of all glyph bounding boxes.
    pub fn bounds(&self) -> [i16; 4] {
        self.glyphs
            .iter()
            .filter_map(|glyph| glyph.data.bbox())
            .reduce(|a, b| [a[0].min(b[0]), a[1].min(b[1]), a[2].max(b[2]), a[3].max(b[3])])
            .unwrap_or_default()
    }

    /// All tables in tag order.
    pub fn tables(&self) -> BTreeMap<Tag, Vec<u8>> {
        let mut tables = BTreeMap::new();
        let (glyf, loca) = self.glyf_and_loca();
        tables.insert(Tag::new(b"head"), self.head());
        tables.insert(Tag::new(b"maxp"), self.maxp());
        tables.insert(Tag::new(b"hhea"), self.hhea());
        tables.insert(Tag::new(b"hmtx"), self.hmtx());
        tables.insert(Tag::new(b"cmap"), self.cmap());
        tables.insert(Tag::new(b"glyf"), glyf);
        tables.insert(Tag::new(b"loca"), loca);
        if !self.kerning.is_empty() {
            tables.insert(Tag::new(b"kern"), self.kern_table());
        }
        if !self.cvt.is_empty() {
            let cvt = BeBuffer::new().extend(self.cvt.iter().copied());
            tables.insert(Tag::new(b"cvt "), cvt.into_vec());
        }
        if !self.fpgm.is_empty() {
            tables.insert(Tag::new(b"fpgm"), self.fpgm.clone());
        }
        if !self.prep.is_empty() {
            tables.insert(Tag::new(b"prep"), self.prep.clone());
        }
        for (tag, data) in &self.overrides {
            match data {
                Some(data) => {
                    tables.insert(*tag, data.clone());
                }
                None => {
                    tables.remove(tag);
                }
            }
        }
        tables
    }

    /// Build a standalone font file.
    pub fn build(&self) -> Vec<u8> {
        write_sfnt(&self.tables(), 0)
    }

    /// Build a collection file holding just this font.
    pub fn build_collection(&self) -> Vec<u8> {
        let header = BeBuffer::new()
            .push(TTC_HEADER_TAG)
            .push(0x00010000u32)
            .push(1u32)
            .push(16u32);
        let mut data = header.into_vec();
        data.extend(write_sfnt(&self.tables(), 16));
        data
    }

    fn num_glyphs(&self) -> u16 {
        self.glyphs.len() as u16
    }

    fn head(&self) -> Vec<u8> {
        let bounds = self.bounds();
        BeBuffer::new()
            .push(0x00010000u32) // version
            .push(0x00010000u32) // fontRevision
            .push(0u32) // checksumAdjustment
            .push(0x5F0F3CF5u32) // magicNumber
            .push(0x000Bu16) // flags
            .push(self.units_per_em)
            .push(0i64) // created
            .push(0i64) // modified
            .extend(bounds)
            .push(0u16) // macStyle
            .push(8u16) // lowestRecPPEM
            .push(2i16) // fontDirectionHint
            .push(self.long_loca as i16)
            .push(0i16) // glyphDataFormat
            .into_vec()
    }

    fn maxp(&self) -> Vec<u8> {
        let max_points = self
            .glyphs
            .iter()
            .map(|glyph| match &glyph.data {
                GlyphData::Simple(simple) => simple.points().count(),
                _ => 0,
            })
            .max()
            .unwrap_or_default() as u16;
        BeBuffer::new()
            .push(0x00010000u32)
            .push(self.num_glyphs())
            .push(max_points)
            .push(0u16) // maxContours
            .push(0u16) // maxCompositePoints
            .push(0u16) // maxCompositeContours
            .push(2u16) // maxZones
            .push(self.max_twilight_points)
            .push(self.max_storage)
            .push(self.max_function_defs)
            .push(self.max_instruction_defs)
            .push(self.max_stack)
            .push(0u16) // maxSizeOfInstructions
            .push(0u16) // maxComponentElements
            .push(0u16) // maxComponentDepth
            .into_vec()
    }

    fn h_metric_count(&self) -> u16 {
        self.num_h_metrics
            .unwrap_or(self.num_glyphs())
            .min(self.num_glyphs())
    }

    fn hhea(&self) -> Vec<u8> {
        let bounds = self.bounds();
        let max_advance = self.glyphs.iter().map(|g| g.advance).max().unwrap_or(0);
        BeBuffer::new()
            .push(0x00010000u32)
            .push(bounds[3]) // ascender
            .push(bounds[1]) // descender
            .push(0i16) // lineGap
            .push(max_advance)
            .push(0i16) // minLeftSideBearing
            .push(0i16) // minRightSideBearing
            .push(bounds[2]) // xMaxExtent
            .push(1i16) // caretSlopeRise
            .push(0i16) // caretSlopeRun
            .push(0i16) // caretOffset
            .extend([0i16; 4])
            .push(0i16) // metricDataFormat
            .push(self.h_metric_count())
            .into_vec()
    }

    fn hmtx(&self) -> Vec<u8> {
        let count = self.h_metric_count() as usize;
        let mut buf = BeBuffer::new();
        for glyph in &self.glyphs[..count] {
            buf = buf.push(glyph.advance).push(glyph.lsb);
        }
        buf.extend(self.glyphs[count..].iter().map(|glyph| glyph.lsb))
            .into_vec()
    }

    fn glyf_and_loca(&self) -> (Vec<u8>, Vec<u8>) {
        let mut glyf = Vec::new();
        let mut offsets = vec![0u32];
        for glyph in &self.glyphs {
            glyf.extend(glyph.data.encode());
            let align = if self.long_loca { 4 } else { 2 };
            while glyf.len() % align != 0 {
                glyf.push(0);
            }
            offsets.push(glyf.len() as u32);
        }
        let loca = if self.long_loca {
            BeBuffer::new().extend(offsets)
        } else {
            BeBuffer::new().extend(offsets.into_iter().map(|offset| (offset / 2) as u16))
        };
        (glyf, loca.into_vec())
    }

    fn sorted_mappings(&self) -> Vec<(u32, u16)> {
        let mut mappings = self.mappings.clone();
        mappings.sort_unstable();
        mappings.dedup_by_key(|(codepoint, _)| *codepoint);
        mappings
    }

    fn cmap(&self) -> Vec<u8> {
        let (subtable, default_encoding) = match self.cmap_format {
            CmapFormat::Format4 => (self.cmap4(false), (0, 3)),
            CmapFormat::Format4IndexArray => (self.cmap4(true), (0, 3)),
            CmapFormat::Format12 => (self.cmap12(), (3, 10)),
        };
        let (platform, encoding) = self.cmap_encoding.unwrap_or(default_encoding);
        BeBuffer::new()
            .push(0u16) // version
            .push(1u16) // numTables
            .push(platform)
            .push(encoding)
            .push(12u32)
            .extend_bytes(&subtable)
            .into_vec()
    }

    fn cmap4(&self, use_index_array: bool) -> Vec<u8> {
        struct Segment {
            start: u16,
            end: u16,
            glyphs: Vec<u16>,
        }
        let mut segments: Vec<Segment> = Vec::new();
        for (codepoint, glyph) in self.sorted_mappings() {
            let Ok(codepoint) = u16::try_from(codepoint) else {
                continue;
            };
            if codepoint == 0xFFFF {
                continue;
            }
            if let Some(last) = segments.last_mut() {
                let contiguous = last.end + 1 == codepoint;
                let sequential = last.glyphs.last().map(|g| g.wrapping_add(1)) == Some(glyph);
                if contiguous && (use_index_array || sequential) {
                    last.end = codepoint;
                    last.glyphs.push(glyph);
                    continue;
                }
            }
            segments.push(Segment {
                start: codepoint,
                end: codepoint,
                glyphs: vec![glyph],
            });
        }
        segments.push(Segment {
            start: 0xFFFF,
            end: 0xFFFF,
            glyphs: vec![0],
        });

        let seg_count = segments.len() as u16;
        let entry_selector = 15 - seg_count.leading_zeros() as u16;
        let search_range = 2 * (1u16 << entry_selector);
        let mut deltas = Vec::new();
        let mut range_offsets = Vec::new();
        let mut index_array = Vec::new();
        for (i, segment) in segments.iter().enumerate() {
            let is_last = i + 1 == segments.len();
            if use_index_array && !is_last {
                deltas.push(0u16);
                let offset = 2 * (seg_count as usize - i) + 2 * index_array.len();
                range_offsets.push(offset as u16);
                index_array.extend(segment.glyphs.iter().copied());
            } else if is_last {
                deltas.push(1u16);
                range_offsets.push(0u16);
            } else {
                deltas.push(segment.glyphs[0].wrapping_sub(segment.start));
                range_offsets.push(0u16);
            }
        }
        let mut buf = BeBuffer::new()
            .push(4u16)
            .push_with_tag(0u16, "length")
            .push(0u16) // language
            .push(seg_count * 2)
            .push(search_range)
            .push(entry_selector)
            .push(seg_count * 2 - search_range)
            .extend(segments.iter().map(|s| s.end))
            .push(0u16)
            .extend(segments.iter().map(|s| s.start))
            .extend(deltas)
            .extend(range_offsets)
            .extend(index_array);
        let len = buf.len() as u16;
        buf.write_at("length", len);
        buf.into_vec()
    }

    fn cmap12(&self) -> Vec<u8> {
        let mut groups: Vec<(u32, u32, u32)> = Vec::new();
        for (codepoint, glyph) in self.sorted_mappings() {
            if let Some(last) = groups.last_mut() {
                if last.1 + 1 == codepoint && last.2 + (codepoint - last.0) == glyph as u32 {
                    last.1 = codepoint;
                    continue;
                }
            }
            groups.push((codepoint, codepoint, glyph as u32));
        }
        BeBuffer::new()
            .push(12u16)
            .push(0u16)
            .push(16 + 12 * groups.len() as u32)
            .push(0u32) // language
            .push(groups.len() as u32)
            .extend(groups.into_iter().flat_map(|(a, b, c)| [a, b, c]))
            .into_vec()
    }

    fn kern_table(&self) -> Vec<u8> {
        let mut pairs = self.kerning.clone();
        pairs.sort_unstable_by_key(|(left, right, _)| (*left, *right));
        let n = pairs.len() as u16;
        let entry_selector = 15 - n.max(1).leading_zeros() as u16;
        let search_range = 6 * (1u16 << entry_selector);
        let mut buf = BeBuffer::new()
            .push(0u16) // version
            .push(1u16) // nTables
            .push(0u16) // subtable version
            .push(14 + 6 * n) // length
            .push(0x0001u16) // format 0, horizontal
            .push(n)
            .push(search_range)
            .push(entry_selector)
            .push((6 * n).saturating_sub(search_range));
        for (left, right, value) in pairs {
            buf = buf.push(left).push(right).push(value);
        }
        buf.into_vec()
    }
}

/// Write the offset table, table records and table data.
///
/// `base` is the position of the offset table in the final file; table
/// offsets are always relative to the start of the file.
pub fn write_sfnt(tables: &BTreeMap<Tag, Vec<u8>>, base: u32) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let entry_selector = 15 - num_tables.max(1).leading_zeros() as u16;
    let search_range = 16 * (1u16 << entry_selector);
    let mut directory = BeBuffer::new()
        .push(TT_SFNT_VERSION)
        .push(num_tables)
        .push(search_range)
        .push(entry_selector)
        .push((num_tables * 16).saturating_sub(search_range));
    let mut offset = base + 12 + 16 * num_tables as u32;
    let mut body = BeBuffer::new();
    for (tag, data) in tables {
        directory = directory
            .push(*tag)
            .push(checksum(data))
            .push(offset)
            .push(data.len() as u32);
        body = body.extend_bytes(data).align_to(4);
        offset = base + 12 + 16 * num_tables as u32 + body.len() as u32;
    }
    let mut data = directory.into_vec();
    data.extend(body.into_vec());
    data
}

fn checksum(data: &[u8]) -> u32 {
    data.chunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_be_bytes(word)
        })
        .fold(0u32, u32::wrapping_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyf::{on, SimpleGlyph};

    fn square() -> SimpleGlyph {
        SimpleGlyph::new().contour(&[on(0, 0), on(0, 100), on(100, 100), on(100, 0)])
    }

    #[test]
    fn table_sizes() {
        let builder = FontBuilder::new(1000)
            .glyph(square(), 120, 0)
            .glyph(GlyphData::Empty, 50, 0)
            .num_h_metrics(1);
        let tables = builder.tables();
        assert_eq!(tables[&Tag::new(b"head")].len(), 54);
        assert_eq!(tables[&Tag::new(b"maxp")].len(), 32);
        assert_eq!(tables[&Tag::new(b"hhea")].len(), 36);
        assert_eq!(tables[&Tag::new(b"hmtx")].len(), 6);
        assert_eq!(tables[&Tag::new(b"loca")].len(), 6);
        assert!(!tables.contains_key(&Tag::new(b"kern")));
    }

    #[test]
    fn directory_offsets() {
        let font = FontBuilder::new(1000).glyph(square(), 120, 0).build();
        assert_eq!(&font[..4], &[0, 1, 0, 0]);
        let num_tables = u16::from_be_bytes([font[4], font[5]]) as usize;
        for i in 0..num_tables {
            let record = &font[12 + i * 16..];
            let offset = u32::from_be_bytes(record[8..12].try_into().unwrap()) as usize;
            let len = u32::from_be_bytes(record[12..16].try_into().unwrap()) as usize;
            assert_eq!(offset % 4, 0);
            assert!(offset + len <= font.len());
        }
    }

    #[test]
    fn cmap4_segments() {
        let builder = FontBuilder::new(1000)
            .map('a', 1)
            .map('b', 2)
            .map('d', 7);
        let cmap = builder.cmap();
        // three segments: a-b, d, and the 0xFFFF sentinel
        assert_eq!(&cmap[12..14], &[0, 4]);
        assert_eq!(&cmap[18..20], &[0, 6]);
    }

    #[test]
    fn collection_offsets_are_absolute() {
        let builder = FontBuilder::new(1000).glyph(square(), 120, 0);
        let ttc = builder.build_collection();
        assert_eq!(&ttc[..4], b"ttcf");
        let first_record = &ttc[16 + 12..];
        let offset = u32::from_be_bytes(first_record[8..12].try_into().unwrap()) as usize;
        let plain = builder.build();
        let plain_offset = u32::from_be_bytes(plain[20..24].try_into().unwrap()) as usize;
        assert_eq!(offset, plain_offset + 16);
    }
}
