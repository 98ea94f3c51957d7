//! Text rendering state.
//!
//! A [`FontContext`] ties a font to a size, a rasterizer and a glyph cache
//! and draws strings into an [`RgbaImage`]. Each rendering thread should own
//! its own context; nothing here is shared.

use ttrast_types::{BoundingBox, Fix32, GlyphId, Point};

use crate::{
    draw::{AlphaMask, AlphaSrcDrawer, Color, Rect, RgbaImage},
    error::{DecodeError, RasterError},
    font::Font,
    glyph::Glyph,
    hint::Hinter,
    path::draw_glyph,
    raster::Rasterizer,
};

/// Number of glyph id slots in a [`DirectMappedCache`].
pub const CACHE_GLYPHS: usize = 256;

/// Number of horizontal sub-pixel positions a glyph is rendered at.
pub const SUBPIXEL_BUCKETS: usize = 4;

const DEFAULT_FONT_SIZE: f64 = 12.0;
const DEFAULT_DPI: f64 = 72.0;
const NO_CLIP: Rect = Rect::new(i32::MIN / 2, i32::MIN / 2, i32::MAX / 2, i32::MAX / 2);

/// A rendered glyph mask.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct CachedGlyph {
    pub mask: AlphaMask,
    /// Position of the top left corner of the mask relative to the pixel
    /// containing the glyph origin.
    pub offset: Point<i32>,
}

/// Storage for rendered glyph masks, keyed by glyph and horizontal
/// sub-pixel bucket.
pub trait GlyphCache {
    fn lookup(&self, glyph_id: GlyphId, bucket: usize) -> Option<&CachedGlyph>;
    fn insert(&mut self, glyph_id: GlyphId, bucket: usize, glyph: CachedGlyph);
    fn clear(&mut self);
}

/// Fixed-size cache with one slot per `(glyph_id % 256, bucket)` pair.
///
/// Inserting a glyph evicts whichever glyph occupied its slot.
#[derive(Clone, Debug)]
pub struct DirectMappedCache {
    entries: Vec<Option<(GlyphId, CachedGlyph)>>,
}

impl Default for DirectMappedCache {
    fn default() -> Self {
        Self {
            entries: vec![None; CACHE_GLYPHS * SUBPIXEL_BUCKETS],
        }
    }
}

impl DirectMappedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(glyph_id: GlyphId, bucket: usize) -> usize {
        glyph_id.to_usize() % CACHE_GLYPHS * SUBPIXEL_BUCKETS + bucket % SUBPIXEL_BUCKETS
    }
}

impl GlyphCache for DirectMappedCache {
    fn lookup(&self, glyph_id: GlyphId, bucket: usize) -> Option<&CachedGlyph> {
        match self.entries.get(Self::slot(glyph_id, bucket))? {
            Some((id, glyph)) if *id == glyph_id => Some(glyph),
            _ => None,
        }
    }

    fn insert(&mut self, glyph_id: GlyphId, bucket: usize, glyph: CachedGlyph) {
        if let Some(entry) = self.entries.get_mut(Self::slot(glyph_id, bucket)) {
            *entry = Some((glyph_id, glyph));
        }
    }

    fn clear(&mut self) {
        self.entries.fill(None);
    }
}

/// Renders text with one font at one size.
pub struct FontContext<'a, C = DirectMappedCache> {
    font: Font<'a>,
    hinter: Option<Hinter<'a>>,
    hinting: bool,
    rasterizer: Rasterizer,
    glyph: Glyph,
    font_size: f64,
    dpi: f64,
    /// Pixels per em in 26.6.
    scale: i32,
    clip: Rect,
    cache: C,
}

impl<'a> FontContext<'a, DirectMappedCache> {
    /// Creates an unhinted context for `font` at 12 points and 72 dpi.
    pub fn new(font: Font<'a>) -> Self {
        Self::with_cache(font, DirectMappedCache::new())
    }
}

impl<'a, C: GlyphCache> FontContext<'a, C> {
    pub fn with_cache(font: Font<'a>, cache: C) -> Self {
        let mut cx = Self {
            font,
            hinter: None,
            hinting: false,
            rasterizer: Rasterizer::new(0, 0),
            glyph: Glyph::new(),
            font_size: DEFAULT_FONT_SIZE,
            dpi: DEFAULT_DPI,
            scale: 0,
            clip: NO_CLIP,
            cache,
        };
        cx.recalc();
        cx
    }

    pub fn font(&self) -> &Font<'a> {
        &self.font
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    /// Pixels per em in 26.6.
    pub fn scale(&self) -> i32 {
        self.scale
    }

    pub fn clip(&self) -> Rect {
        self.clip
    }

    pub fn hinting(&self) -> bool {
        self.hinting
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn set_font(&mut self, font: Font<'a>) {
        self.font = font;
        self.hinter = None;
        if self.hinting {
            self.hinter = self.make_hinter();
        }
        self.recalc();
    }

    /// Sets the font size in points.
    pub fn set_font_size(&mut self, size: f64) {
        if size != self.font_size {
            self.font_size = size;
            self.recalc();
        }
    }

    pub fn set_dpi(&mut self, dpi: f64) {
        if dpi != self.dpi {
            self.dpi = dpi;
            self.recalc();
        }
    }

    /// Restricts drawing to `clip`, in destination pixels.
    pub fn set_clip(&mut self, clip: Rect) {
        self.clip = clip;
    }

    /// Turns execution of the font's hinting programs on or off.
    ///
    /// If the font program fails, the context keeps rendering unhinted
    /// outlines.
    pub fn set_hinting(&mut self, hinting: bool) {
        if hinting == self.hinting {
            return;
        }
        self.hinting = hinting;
        self.hinter = if hinting { self.make_hinter() } else { None };
        self.cache.clear();
    }

    fn make_hinter(&self) -> Option<Hinter<'a>> {
        match Hinter::new(&self.font) {
            Ok(hinter) => Some(hinter),
            Err(e) => {
                log::warn!("font program failed, hinting disabled: {e}");
                None
            }
        }
    }

    /// Recomputes the scale and sizes the rasterizer to fit any glyph of
    /// the font.
    fn recalc(&mut self) {
        self.scale = (0.5 + self.font_size * self.dpi * 64.0 / 72.0) as i32;
        if self.scale == 0 {
            self.rasterizer.set_bounds(0, 0);
        } else {
            let b = self.font.bounds(self.scale);
            let x_min = b.x_min >> 6;
            let y_min = -b.y_max >> 6;
            let x_max = (b.x_max + 63) >> 6;
            let y_max = -(b.y_min - 63) >> 6;
            self.rasterizer.set_bounds(x_max - x_min, y_max - y_min);
        }
        log::debug!(
            "font context: {}pt at {} dpi, scale {}, rasterizer {}x{}",
            self.font_size,
            self.dpi,
            self.scale,
            self.rasterizer.width(),
            self.rasterizer.height()
        );
        self.cache.clear();
    }

    /// Advance of a glyph in 26.6, snapped to whole pixels when hinting.
    fn advance(&self, glyph_id: GlyphId) -> i32 {
        let advance = self.font.h_metric(self.scale, glyph_id).advance_width;
        if self.hinter.is_some() {
            (advance + 32) & !63
        } else {
            advance
        }
    }

    /// Renders a glyph with its origin at the sub-pixel position `frac`
    /// within a pixel.
    ///
    /// Glyph programs that fail are logged and the unhinted outline is
    /// rendered instead. A glyph with inverted bounds renders as an empty
    /// mask.
    pub fn rasterize_glyph(
        &mut self,
        glyph_id: GlyphId,
        frac: Point<Fix32>,
    ) -> Result<CachedGlyph, DecodeError> {
        self.load(glyph_id)?;
        let bounds = match mask_bounds(&self.glyph, frac) {
            Ok(bounds) => bounds,
            Err(e) => {
                log::debug!("glyph {}: {e}", glyph_id.to_u16());
                return Ok(CachedGlyph::default());
            }
        };
        let (width, height) = (bounds.width(), bounds.height());
        if width > self.rasterizer.width() || height > self.rasterizer.height() {
            self.rasterizer.set_bounds(
                width.max(self.rasterizer.width()),
                height.max(self.rasterizer.height()),
            );
        } else {
            self.rasterizer.clear();
        }
        self.rasterizer.offset = Point::default();
        let origin = Point::new(
            frac.x - Fix32::from_i32(bounds.x0),
            frac.y - Fix32::from_i32(bounds.y0),
        );
        draw_glyph(&self.glyph, origin, &mut self.rasterizer);
        let mut mask = AlphaMask::new(width as usize, height as usize);
        self.rasterizer
            .rasterize(&mut AlphaSrcDrawer::new(&mut mask));
        Ok(CachedGlyph {
            mask,
            offset: Point::new(bounds.x0, bounds.y0),
        })
    }

    fn load(&mut self, glyph_id: GlyphId) -> Result<(), DecodeError> {
        match self
            .glyph
            .load(&self.font, self.scale, glyph_id, self.hinter.as_mut())
        {
            Err(DecodeError::Hint(e)) => {
                log::warn!("hinting failed, using unhinted outline: {e}");
                self.glyph.load(&self.font, self.scale, glyph_id, None)
            }
            result => result,
        }
    }

    /// Draws `text` with its baseline starting at `origin`, in 24.8 pixels,
    /// and returns the pen position after the last glyph.
    ///
    /// Horizontal positions are quantized to quarter pixels and vertical
    /// positions to whole pixels so that rendered glyphs can be cached.
    pub fn draw_string(
        &mut self,
        dst: &mut RgbaImage,
        color: Color,
        text: &str,
        origin: Point<Fix32>,
    ) -> Result<Point<Fix32>, DecodeError> {
        let mut pen = origin;
        let mut prev = None;
        for ch in text.chars() {
            let glyph_id = self.font.index(ch);
            if let Some(prev) = prev {
                let mut kern = self.font.kerning(self.scale, prev, glyph_id);
                if self.hinter.is_some() {
                    kern = (kern + 32) & !63;
                }
                pen.x += Fix32::from_bits(kern << 2);
            }
            let x = pen.x.to_bits();
            let ix = x >> 8;
            let iy = (pen.y.to_bits() + 0x80) >> 8;
            let bucket = ((x & 0xFF) >> 6) as usize;
            let dest = (ix, iy);
            if let Some(cached) = self.cache.lookup(glyph_id, bucket) {
                composite(dst, self.clip, cached, dest, color);
            } else {
                let frac = Point::new(Fix32::from_bits(bucket as i32 * 64), Fix32::ZERO);
                let rendered = self.rasterize_glyph(glyph_id, frac)?;
                composite(dst, self.clip, &rendered, dest, color);
                self.cache.insert(glyph_id, bucket, rendered);
            }
            pen.x += Fix32::from_bits(self.advance(glyph_id) << 2);
            prev = Some(glyph_id);
        }
        Ok(pen)
    }
}

fn composite(dst: &mut RgbaImage, clip: Rect, glyph: &CachedGlyph, dest: (i32, i32), color: Color) {
    let origin = (dest.0 + glyph.offset.x, dest.1 + glyph.offset.y);
    dst.draw_mask(clip, &glyph.mask, origin, color);
}

/// Pixel rectangle covered by the glyph outline when its origin sits at
/// `frac`, with y pointing down.
fn mask_bounds(glyph: &Glyph, frac: Point<Fix32>) -> Result<Rect, RasterError> {
    // Hinting may move points outside of the declared bounds.
    let b = glyph.points.iter().fold(glyph.bounds, |b, p| BoundingBox {
        x_min: b.x_min.min(p.x),
        y_min: b.y_min.min(p.y),
        x_max: b.x_max.max(p.x),
        y_max: b.y_max.max(p.y),
    });
    let (fx, fy) = (frac.x.to_bits(), frac.y.to_bits());
    let x0 = (fx + (b.x_min << 2)) >> 8;
    let y0 = (fy - (b.y_max << 2)) >> 8;
    let x1 = (fx + (b.x_max << 2) + 0xFF) >> 8;
    let y1 = (fy - (b.y_min << 2) + 0xFF) >> 8;
    if x0 > x1 || y0 > y1 {
        return Err(RasterError::NegativeSizedGlyph);
    }
    Ok(Rect::new(x0, y0, x1, y1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ttrast_test_data::{gid, hinting, on, simple_font, FontBuilder, GlyphData, SimpleGlyph};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Returns a context where one font unit of `simple_font` is 1/64 of a
    /// pixel.
    fn unit_context(data: &[u8]) -> FontContext<'_> {
        let mut cx = FontContext::new(Font::new(data).unwrap());
        cx.set_font_size(32.0);
        cx
    }

    fn coverage(mask: &AlphaMask) -> f64 {
        mask.pixels.iter().map(|&a| a as f64 / 255.0).sum()
    }

    #[test]
    fn size_and_dpi_set_scale() {
        let data = simple_font();
        let mut cx = FontContext::new(Font::new(&data).unwrap());
        assert_eq!(cx.scale(), 768);
        cx.set_font_size(16.0);
        assert_eq!(cx.scale(), 1024);
        cx.set_dpi(144.0);
        assert_eq!(cx.scale(), 2048);
    }

    #[test]
    fn rasterizer_fits_font_bounds() {
        let data = simple_font();
        let cx = unit_context(&data);
        // (-1200, 0, 1300, 1800) units at 1/64 pixel each
        assert_eq!(cx.rasterizer.width(), 19 + 21);
        assert_eq!(cx.rasterizer.height(), 29);
    }

    #[test]
    fn notdef_mask() {
        let data = simple_font();
        let mut cx = unit_context(&data);
        let glyph = cx
            .rasterize_glyph(GlyphId::new(gid::NOTDEF), Point::default())
            .unwrap();
        assert_eq!(glyph.offset, Point::new(1, -22));
        assert_eq!((glyph.mask.width, glyph.mask.height), (14, 22));
        // an 800x1400 box with a 600x1200 hole
        let expected = (800.0 * 1400.0 - 600.0 * 1200.0) / 4096.0;
        assert!((coverage(&glyph.mask) - expected).abs() < 1.0);
        // inside the left side of the box, then inside the hole
        assert_eq!(glyph.mask.get(1, 10), 255);
        assert_eq!(glyph.mask.get(3, 10), 0);
    }

    #[test]
    fn empty_glyph_has_empty_mask() {
        let data = simple_font();
        let mut cx = unit_context(&data);
        let glyph = cx
            .rasterize_glyph(GlyphId::new(gid::SPACE), Point::default())
            .unwrap();
        assert!(glyph.mask.pixels.is_empty());
    }

    #[test]
    fn subpixel_origin_shifts_coverage() {
        let data = simple_font();
        let mut cx = unit_context(&data);
        let a = cx
            .rasterize_glyph(GlyphId::new(gid::NOTDEF), Point::default())
            .unwrap();
        let b = cx
            .rasterize_glyph(
                GlyphId::new(gid::NOTDEF),
                Point::new(Fix32::from_bits(128), Fix32::ZERO),
            )
            .unwrap();
        assert_ne!(a.mask, b.mask);
        assert!((coverage(&a.mask) - coverage(&b.mask)).abs() < 1.0);
    }

    #[test]
    fn draw_string_applies_kerning() {
        let data = simple_font();
        let mut cx = unit_context(&data);
        let mut image = RgbaImage::new(64, 48);
        let origin = Point::from_pixels(2, 40);
        let end = cx
            .draw_string(&mut image, Color::BLACK, "AV", origin)
            .unwrap();
        let advance = 1300 - 150 + 1300;
        assert_eq!(end, Point::new(origin.x + Fix32::from_bits(advance << 2), origin.y));
        // near the base of the 'A'
        assert_eq!(image.pixel(2 + 9, 40 - 2), Color::BLACK);
        assert_eq!(image.pixel(0, 0), Color::TRANSPARENT);
    }

    #[test]
    fn draw_string_respects_clip() {
        let data = simple_font();
        let mut cx = unit_context(&data);
        cx.set_clip(Rect::new(0, 0, 8, 48));
        let mut image = RgbaImage::new(64, 48);
        cx.draw_string(&mut image, Color::BLACK, "oo", Point::from_pixels(0, 40))
            .unwrap();
        assert_eq!(image.pixel(4, 30), Color::BLACK);
        for y in 0..48 {
            for x in 8..64 {
                assert_eq!(image.pixel(x, y), Color::TRANSPARENT);
            }
        }
    }

    #[test]
    fn glyphs_are_cached_per_bucket() {
        let data = simple_font();
        let mut cx = unit_context(&data);
        let mut image = RgbaImage::new(64, 48);
        let o = GlyphId::new(gid::O);
        cx.draw_string(&mut image, Color::BLACK, "o", Point::from_pixels(0, 40))
            .unwrap();
        assert_eq!(cx.cache().len(), 1);
        assert!(cx.cache().lookup(o, 0).is_some());
        let half = Point::new(Fix32::from_bits(128), Fix32::from_i32(40));
        cx.draw_string(&mut image, Color::BLACK, "oo", half).unwrap();
        // 0.5 and 0.5 + 1300/64 = 20.8125 land in buckets 2 and 3
        assert_eq!(cx.cache().len(), 3);
        assert!(cx.cache().lookup(o, 2).is_some());
        assert!(cx.cache().lookup(o, 3).is_some());
        cx.set_font_size(16.0);
        assert!(cx.cache().is_empty());
    }

    #[test]
    fn cached_rendering_matches_fresh_rendering() {
        let data = simple_font();
        let mut cx = unit_context(&data);
        let mut first = RgbaImage::new(64, 48);
        let mut second = RgbaImage::new(64, 48);
        cx.draw_string(&mut first, Color::BLACK, "AoA", Point::from_pixels(1, 40))
            .unwrap();
        cx.draw_string(&mut second, Color::BLACK, "AoA", Point::from_pixels(1, 40))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn direct_mapped_slots_collide() {
        let mut cache = DirectMappedCache::new();
        let glyph = CachedGlyph {
            mask: AlphaMask::new(2, 2),
            offset: Point::new(1, -2),
        };
        cache.insert(GlyphId::new(2), 1, glyph.clone());
        assert_eq!(cache.lookup(GlyphId::new(2), 1), Some(&glyph));
        assert_eq!(cache.lookup(GlyphId::new(2), 0), None);
        assert_eq!(cache.lookup(GlyphId::new(258), 1), None);
        cache.insert(GlyphId::new(258), 1, CachedGlyph::default());
        assert_eq!(cache.lookup(GlyphId::new(2), 1), None);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn hinted_glyph_renders() {
        init_logging();
        let data = hinting::hinted_font();
        let mut cx = FontContext::new(Font::new(&data).unwrap());
        cx.set_hinting(true);
        assert!(cx.hinter.is_some());
        let glyph = cx
            .rasterize_glyph(GlyphId::new(1), Point::default())
            .unwrap();
        assert!(glyph.mask.pixels.contains(&255));
    }

    #[test]
    fn failing_glyph_program_falls_back_to_unhinted() {
        init_logging();
        const PUSHB_1: u8 = 0xB0;
        const CALL: u8 = 0x2B;
        let square = SimpleGlyph::new()
            .contour(&[on(0, 0), on(0, 500), on(500, 500), on(500, 0)])
            .instructions(&[PUSHB_1, 7, CALL]);
        let data = FontBuilder::new(1000)
            .glyph(GlyphData::Empty, 500, 0)
            .glyph(square, 600, 0)
            .map('x', 1)
            .build();
        let mut hinted = FontContext::new(Font::new(&data).unwrap());
        hinted.set_hinting(true);
        let mut unhinted = FontContext::new(Font::new(&data).unwrap());
        let x = GlyphId::new(1);
        assert_eq!(
            hinted.rasterize_glyph(x, Point::default()).unwrap(),
            unhinted.rasterize_glyph(x, Point::default()).unwrap()
        );
    }

    #[test]
    fn decode_errors_are_reported() {
        let data = ttrast_test_data::recursive_composite_font();
        let mut cx = FontContext::new(Font::new(&data).unwrap());
        let mut image = RgbaImage::new(16, 16);
        assert!(matches!(
            cx.draw_string(&mut image, Color::BLACK, "x", Point::default()),
            Err(DecodeError::ExcessiveRecursion)
        ));
    }
}
