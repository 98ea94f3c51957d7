//! Pixel buffers and the drawers that composite rasterizer spans into them.
//!
//! A [`Drawer`] receives spans in batches, in increasing `(y, x)` order.
//! Drawers that transform spans (gamma correction, monochrome collapsing)
//! wrap another drawer and forward the result, so they can be chained.

/// A horizontal run of pixels with constant coverage.
///
/// `x0` is inclusive and `x1` exclusive. The alpha is a 16-bit coverage
/// value replicated into both halves of the word, so a fully covered span
/// has an alpha of [`Span::OPAQUE`] and `alpha >> 24` is the 8-bit coverage.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Span {
    pub y: i32,
    pub x0: i32,
    pub x1: i32,
    pub alpha: u32,
}

impl Span {
    pub const OPAQUE: u32 = u32::MAX;

    pub const fn new(y: i32, x0: i32, x1: i32, alpha: u32) -> Self {
        Self { y, x0, x1, alpha }
    }

    /// Returns true for the all zero span that terminates a rasterization.
    pub fn is_terminator(&self) -> bool {
        *self == Self::default()
    }
}

/// Consumer of rasterizer output.
///
/// `done` is true for the final batch of a rasterization. Implementations
/// may use `spans` as scratch space for the duration of the call.
pub trait Drawer {
    fn draw(&mut self, spans: &mut [Span], done: bool);
}

impl<F> Drawer for F
where
    F: FnMut(&mut [Span], bool),
{
    fn draw(&mut self, spans: &mut [Span], done: bool) {
        self(spans, done)
    }
}

/// Integer rectangle with exclusive maximum coordinates.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug, Hash)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Rect {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Creates a rectangle at the origin with the given size.
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn width(&self) -> i32 {
        (self.x1 - self.x0).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y1 - self.y0).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Returns the overlap of two rectangles, which may be empty.
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x0 + dx, self.y0 + dy, self.x1 + dx, self.y1 + dy)
    }
}

/// An RGBA color with premultiplied 8-bit components.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Components widened to 16 bits.
    fn to_rgba16(self) -> [u32; 4] {
        [self.r, self.g, self.b, self.a].map(|c| c as u32 * 0x101)
    }
}

/// Single channel 8-bit coverage buffer.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct AlphaMask {
    pub width: usize,
    pub height: usize,
    /// Bytes per row.
    pub stride: usize,
    pub pixels: Vec<u8>,
}

impl AlphaMask {
    /// Creates a fully transparent mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            stride: width,
            pixels: vec![0; width * height],
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width as i32, self.height as i32)
    }

    /// Returns the coverage at the given position, or zero outside the
    /// mask.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.pixels
            .get(y * self.stride + x)
            .copied()
            .unwrap_or_default()
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        self.pixels
            .get(start..start + self.width)
            .unwrap_or_default()
    }

    /// Returns the pixels covered by `span` after clipping it to the mask,
    /// or `None` when nothing remains.
    fn span_pixels(&mut self, span: &Span) -> Option<&mut [u8]> {
        let (y, x0, x1) = clip_span(span, self.width, self.height)?;
        let base = y * self.stride;
        self.pixels.get_mut(base + x0..base + x1)
    }
}

/// Premultiplied RGBA8 image.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct RgbaImage {
    pub width: usize,
    pub height: usize,
    /// Bytes per row.
    pub stride: usize,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    /// Creates a fully transparent image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            stride: width * 4,
            pixels: vec![0; width * height * 4],
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width as i32, self.height as i32)
    }

    pub fn fill(&mut self, color: Color) {
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    /// Returns the pixel at the given position, or transparent black
    /// outside the image.
    pub fn pixel(&self, x: usize, y: usize) -> Color {
        if x >= self.width || y >= self.height {
            return Color::TRANSPARENT;
        }
        let ix = y * self.stride + x * 4;
        match self.pixels.get(ix..ix + 4) {
            Some(&[r, g, b, a]) => Color::new(r, g, b, a),
            _ => Color::TRANSPARENT,
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let ix = y * self.stride + x * 4;
        if let Some(pixel) = self.pixels.get_mut(ix..ix + 4) {
            pixel.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    /// Composites `color` through `mask` onto this image with the Porter-Duff
    /// over operator.
    ///
    /// The mask's top left corner is placed at `origin` and only pixels
    /// inside `clip` are touched.
    pub fn draw_mask(&mut self, clip: Rect, mask: &AlphaMask, origin: (i32, i32), color: Color) {
        let (ox, oy) = origin;
        let target = mask
            .bounds()
            .translate(ox, oy)
            .intersect(&clip)
            .intersect(&self.bounds());
        if target.is_empty() {
            return;
        }
        let src = color.to_rgba16();
        for y in target.y0..target.y1 {
            let mask_row = mask.row((y - oy) as usize);
            let row_start = y as usize * self.stride;
            for x in target.x0..target.x1 {
                let m = mask_row
                    .get((x - ox) as usize)
                    .copied()
                    .unwrap_or_default() as u32
                    * 0x101;
                if m == 0 {
                    continue;
                }
                let ix = row_start + x as usize * 4;
                if let Some(pixel) = self.pixels.get_mut(ix..ix + 4) {
                    blend_over(pixel, src, m);
                }
            }
        }
    }

    fn span_pixels(&mut self, span: &Span) -> Option<&mut [u8]> {
        let (y, x0, x1) = clip_span(span, self.width, self.height)?;
        let base = y * self.stride;
        self.pixels.get_mut(base + x0 * 4..base + x1 * 4)
    }
}

const M16: u32 = 0xFFFF;

/// Blends a premultiplied 16-bit source, scaled by a 16-bit mask, over an
/// 8-bit destination pixel.
fn blend_over(dst: &mut [u8], src: [u32; 4], mask: u32) {
    let inv = (M16 - src[3] * mask / M16) * 0x101;
    for (d, s) in dst.iter_mut().zip(src) {
        *d = ((*d as u32 * inv + s * mask) / M16 >> 8) as u8;
    }
}

/// Clips a span to a buffer, returning the row and column range.
fn clip_span(span: &Span, width: usize, height: usize) -> Option<(usize, usize, usize)> {
    if span.y < 0 || span.y as usize >= height {
        return None;
    }
    let x0 = span.x0.max(0) as usize;
    let x1 = span.x1.max(0) as usize;
    let x1 = x1.min(width);
    (x0 < x1).then_some((span.y as usize, x0, x1))
}

/// Composites spans onto an alpha mask with the over operator.
pub struct AlphaOverDrawer<'a> {
    pub mask: &'a mut AlphaMask,
}

impl<'a> AlphaOverDrawer<'a> {
    pub fn new(mask: &'a mut AlphaMask) -> Self {
        Self { mask }
    }
}

impl Drawer for AlphaOverDrawer<'_> {
    fn draw(&mut self, spans: &mut [Span], _done: bool) {
        for span in spans.iter() {
            let a = (span.alpha >> 24) as i32;
            if let Some(pixels) = self.mask.span_pixels(span) {
                for p in pixels {
                    let v = *p as i32;
                    *p = ((v * 255 + (255 - v) * a) / 255) as u8;
                }
            }
        }
    }
}

/// Writes span coverage directly into an alpha mask.
pub struct AlphaSrcDrawer<'a> {
    pub mask: &'a mut AlphaMask,
}

impl<'a> AlphaSrcDrawer<'a> {
    pub fn new(mask: &'a mut AlphaMask) -> Self {
        Self { mask }
    }
}

impl Drawer for AlphaSrcDrawer<'_> {
    fn draw(&mut self, spans: &mut [Span], _done: bool) {
        for span in spans.iter() {
            let a = (span.alpha >> 24) as u8;
            if let Some(pixels) = self.mask.span_pixels(span) {
                pixels.fill(a);
            }
        }
    }
}

/// Porter-Duff composition operator.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum CompositeOp {
    /// Source over destination.
    #[default]
    Over,
    /// Source replaces destination.
    Src,
}

/// Paints spans in a solid color onto an RGBA image.
pub struct RgbaDrawer<'a> {
    pub image: &'a mut RgbaImage,
    pub op: CompositeOp,
    color: [u32; 4],
}

impl<'a> RgbaDrawer<'a> {
    pub fn new(image: &'a mut RgbaImage, color: Color, op: CompositeOp) -> Self {
        Self {
            image,
            op,
            color: color.to_rgba16(),
        }
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color.to_rgba16();
    }
}

impl Drawer for RgbaDrawer<'_> {
    fn draw(&mut self, spans: &mut [Span], _done: bool) {
        let color = self.color;
        let op = self.op;
        for span in spans.iter() {
            let ma = span.alpha >> 16;
            let Some(pixels) = self.image.span_pixels(span) else {
                continue;
            };
            for pixel in pixels.chunks_exact_mut(4) {
                match op {
                    CompositeOp::Over => blend_over(pixel, color, ma),
                    CompositeOp::Src => {
                        for (d, s) in pixel.iter_mut().zip(color) {
                            *d = (s * ma / M16 >> 8) as u8;
                        }
                    }
                }
            }
        }
    }
}

/// Collapses anti-aliased spans to fully opaque or fully transparent ones.
///
/// Spans with at least half coverage become opaque and adjacent opaque spans
/// on a row are merged before being passed on.
pub struct MonochromeDrawer<D> {
    pub inner: D,
    y: i32,
    x0: i32,
    x1: i32,
}

impl<D: Drawer> MonochromeDrawer<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            y: 0,
            x0: 0,
            x1: 0,
        }
    }

    pub fn into_inner(self) -> D {
        self.inner
    }

    fn pending(&self) -> Span {
        Span::new(self.y, self.x0, self.x1, Span::OPAQUE)
    }
}

impl<D: Drawer> Drawer for MonochromeDrawer<D> {
    fn draw(&mut self, spans: &mut [Span], done: bool) {
        // Merged spans are written back to the front of the batch; there is
        // never more output than input.
        let mut len = 0;
        for i in 0..spans.len() {
            let span = spans[i];
            if span.alpha < 1 << 31 {
                continue;
            }
            if self.y == span.y && self.x1 == span.x0 {
                self.x1 = span.x1;
            } else {
                if self.x0 < self.x1 {
                    spans[len] = self.pending();
                    len += 1;
                }
                self.y = span.y;
                self.x0 = span.x0;
                self.x1 = span.x1;
            }
        }
        if !done {
            self.inner.draw(&mut spans[..len], false);
            return;
        }
        let last = self.pending();
        let has_last = last.x0 < last.x1;
        if len < spans.len() {
            if has_last {
                spans[len] = last;
                len += 1;
            }
            self.inner.draw(&mut spans[..len], true);
        } else {
            self.inner.draw(&mut spans[..len], false);
            let mut tail = [last];
            let tail_len = has_last as usize;
            self.inner.draw(&mut tail[..tail_len], true);
        }
        self.y = 0;
        self.x0 = 0;
        self.x1 = 0;
    }
}

/// Applies a gamma curve to span coverage before passing it on.
pub struct GammaDrawer<D> {
    pub inner: D,
    table: [u16; 256],
    is_identity: bool,
}

impl<D: Drawer> GammaDrawer<D> {
    pub fn new(inner: D, gamma: f64) -> Self {
        let mut drawer = Self {
            inner,
            table: [0; 256],
            is_identity: true,
        };
        drawer.set_gamma(gamma);
        drawer
    }

    pub fn set_gamma(&mut self, gamma: f64) {
        self.is_identity = gamma == 1.0;
        if self.is_identity {
            return;
        }
        for (i, entry) in self.table.iter_mut().enumerate() {
            let a = (i as f64 / 255.0).powf(gamma);
            *entry = (65535.0 * a) as u16;
        }
    }

    pub fn into_inner(self) -> D {
        self.inner
    }

    /// Maps a packed span alpha through the table, interpolating linearly
    /// between entries.
    fn correct(&self, alpha: u32) -> u32 {
        // 255 * M == u32::MAX
        const M: u32 = 0x0101_0101;
        const N: u64 = 0x8080;
        let p = (alpha / M) as usize;
        let q = ((alpha % M) >> 9) as u64;
        let lo = self.table[p] as u64;
        let hi = self.table[(p + 1).min(255)] as u64;
        let a = ((lo * (N - q) + hi * q + N / 2) / N) as u32;
        a | a << 16
    }
}

impl<D: Drawer> Drawer for GammaDrawer<D> {
    fn draw(&mut self, spans: &mut [Span], done: bool) {
        if !self.is_identity {
            for span in spans.iter_mut() {
                if span.alpha != 0 && span.alpha != Span::OPAQUE {
                    span.alpha = self.correct(span.alpha);
                }
            }
        }
        self.inner.draw(spans, done);
    }
}
