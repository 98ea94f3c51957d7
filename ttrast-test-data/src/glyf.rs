//! Encoders for `glyf` table entries.

use ttrast_types::{F2Dot14, GlyphId};

use crate::bebuffer::BeBuffer;

const ON_CURVE: u8 = 0x01;
const X_SHORT: u8 = 0x02;
const Y_SHORT: u8 = 0x04;
const REPEAT: u8 = 0x08;
const X_SAME_OR_POSITIVE: u8 = 0x10;
const Y_SAME_OR_POSITIVE: u8 = 0x20;

const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const ROUND_XY_TO_GRID: u16 = 0x0004;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;
const WE_HAVE_INSTRUCTIONS: u16 = 0x0100;
const USE_MY_METRICS: u16 = 0x0200;

/// A point in font units, with its on-curve flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutlinePoint {
    pub x: i16,
    pub y: i16,
    pub on_curve: bool,
}

/// Shorthand for an on-curve point.
pub const fn on(x: i16, y: i16) -> OutlinePoint {
    OutlinePoint {
        x,
        y,
        on_curve: true,
    }
}

/// Shorthand for an off-curve (quadratic control) point.
pub const fn off(x: i16, y: i16) -> OutlinePoint {
    OutlinePoint {
        x,
        y,
        on_curve: false,
    }
}

/// Any entry in the `glyf` table.
#[derive(Clone, Debug, Default)]
pub enum GlyphData {
    /// A glyph with no outline; `loca` records a zero length.
    #[default]
    Empty,
    Simple(SimpleGlyph),
    Composite(CompositeGlyph),
    /// Pre-encoded bytes, for malformed data.
    Raw(Vec<u8>),
}

impl GlyphData {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            GlyphData::Empty => Vec::new(),
            GlyphData::Simple(glyph) => glyph.encode(),
            GlyphData::Composite(glyph) => glyph.encode(),
            GlyphData::Raw(bytes) => bytes.clone(),
        }
    }

    /// The header bounding box, if this glyph has one.
    pub fn bbox(&self) -> Option<[i16; 4]> {
        match self {
            GlyphData::Simple(glyph) => Some(glyph.bbox()),
            GlyphData::Composite(glyph) => Some(glyph.bbox),
            _ => None,
        }
    }
}

impl From<SimpleGlyph> for GlyphData {
    fn from(value: SimpleGlyph) -> Self {
        GlyphData::Simple(value)
    }
}

impl From<CompositeGlyph> for GlyphData {
    fn from(value: CompositeGlyph) -> Self {
        GlyphData::Composite(value)
    }
}

/// A glyph made of contours.
#[derive(Clone, Debug, Default)]
pub struct SimpleGlyph {
    contours: Vec<Vec<OutlinePoint>>,
    instructions: Vec<u8>,
}

impl SimpleGlyph {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn contour(mut self, points: &[OutlinePoint]) -> Self {
        self.contours.push(points.to_vec());
        self
    }

    pub fn instructions(mut self, code: &[u8]) -> Self {
        self.instructions = code.to_vec();
        self
    }

    pub fn points(&self) -> impl Iterator<Item = &OutlinePoint> + '_ {
        self.contours.iter().flatten()
    }

    /// `[x_min, y_min, x_max, y_max]` over all points.
    pub fn bbox(&self) -> [i16; 4] {
        let mut points = self.points();
        let Some(first) = points.next() else {
            return [0; 4];
        };
        points.fold([first.x, first.y, first.x, first.y], |b, p| {
            [b[0].min(p.x), b[1].min(p.y), b[2].max(p.x), b[3].max(p.y)]
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let bbox = self.bbox();
        let mut buf = BeBuffer::new()
            .push(self.contours.len() as i16)
            .extend(bbox);
        let mut end = 0u16;
        for contour in &self.contours {
            end += contour.len() as u16;
            buf = buf.push(end.wrapping_sub(1));
        }
        buf = buf
            .push(self.instructions.len() as u16)
            .extend_bytes(&self.instructions);

        let mut flags = Vec::new();
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        let (mut last_x, mut last_y) = (0i16, 0i16);
        for point in self.points() {
            let mut flag = if point.on_curve { ON_CURVE } else { 0 };
            flag |= encode_delta(
                point.x.wrapping_sub(last_x),
                X_SHORT,
                X_SAME_OR_POSITIVE,
                &mut xs,
            );
            flag |= encode_delta(
                point.y.wrapping_sub(last_y),
                Y_SHORT,
                Y_SAME_OR_POSITIVE,
                &mut ys,
            );
            flags.push(flag);
            last_x = point.x;
            last_y = point.y;
        }
        buf.extend_bytes(&compress_flags(&flags))
            .extend_bytes(&xs)
            .extend_bytes(&ys)
            .into_vec()
    }
}

fn encode_delta(delta: i16, short: u8, same_or_positive: u8, out: &mut Vec<u8>) -> u8 {
    if delta == 0 {
        same_or_positive
    } else if delta.unsigned_abs() <= 255 {
        out.push(delta.unsigned_abs() as u8);
        if delta > 0 {
            short | same_or_positive
        } else {
            short
        }
    } else {
        out.extend(delta.to_be_bytes());
        0
    }
}

fn compress_flags(flags: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < flags.len() {
        let flag = flags[i];
        let mut run = 1;
        while i + run < flags.len() && flags[i + run] == flag && run < 256 {
            run += 1;
        }
        if run > 1 {
            out.push(flag | REPEAT);
            out.push((run - 1) as u8);
        } else {
            out.push(flag);
        }
        i += run;
    }
    out
}

/// A component transform, in 2.14.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Transform {
    #[default]
    None,
    Scale(f64),
    XyScale(f64, f64),
    /// `[xx, xy, yx, yy]` as stored in the font.
    TwoByTwo([f64; 4]),
}

/// One reference inside a composite glyph.
#[derive(Clone, Debug)]
pub struct Component {
    pub glyph: GlyphId,
    pub dx: i16,
    pub dy: i16,
    pub transform: Transform,
    pub round_xy_to_grid: bool,
    pub use_my_metrics: bool,
    /// When false, the arguments are encoded as point numbers.
    pub args_are_xy_values: bool,
}

impl Component {
    pub fn new(glyph: u16, dx: i16, dy: i16) -> Self {
        Self {
            glyph: GlyphId::new(glyph),
            dx,
            dy,
            transform: Transform::None,
            round_xy_to_grid: false,
            use_my_metrics: false,
            args_are_xy_values: true,
        }
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn round_xy_to_grid(mut self) -> Self {
        self.round_xy_to_grid = true;
        self
    }

    pub fn use_my_metrics(mut self) -> Self {
        self.use_my_metrics = true;
        self
    }

    pub fn point_args(mut self) -> Self {
        self.args_are_xy_values = false;
        self
    }
}

/// A glyph made of references to other glyphs.
#[derive(Clone, Debug)]
pub struct CompositeGlyph {
    pub bbox: [i16; 4],
    components: Vec<Component>,
    instructions: Vec<u8>,
}

impl CompositeGlyph {
    pub fn new(bbox: [i16; 4]) -> Self {
        Self {
            bbox,
            components: Vec::new(),
            instructions: Vec::new(),
        }
    }

    pub fn component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn instructions(mut self, code: &[u8]) -> Self {
        self.instructions = code.to_vec();
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BeBuffer::new().push(-1i16).extend(self.bbox);
        for (i, component) in self.components.iter().enumerate() {
            let last = i + 1 == self.components.len();
            let mut flags = 0u16;
            if component.args_are_xy_values {
                flags |= ARGS_ARE_XY_VALUES;
            }
            let fits_in_bytes =
                i8::try_from(component.dx).is_ok() && i8::try_from(component.dy).is_ok();
            if !fits_in_bytes {
                flags |= ARG_1_AND_2_ARE_WORDS;
            }
            if component.round_xy_to_grid {
                flags |= ROUND_XY_TO_GRID;
            }
            if component.use_my_metrics {
                flags |= USE_MY_METRICS;
            }
            flags |= match component.transform {
                Transform::None => 0,
                Transform::Scale(_) => WE_HAVE_A_SCALE,
                Transform::XyScale(..) => WE_HAVE_AN_X_AND_Y_SCALE,
                Transform::TwoByTwo(_) => WE_HAVE_A_TWO_BY_TWO,
            };
            if !last {
                flags |= MORE_COMPONENTS;
            } else if !self.instructions.is_empty() {
                flags |= WE_HAVE_INSTRUCTIONS;
            }
            buf = buf.push(flags).push(component.glyph);
            buf = if fits_in_bytes {
                buf.push(component.dx as i8).push(component.dy as i8)
            } else {
                buf.push(component.dx).push(component.dy)
            };
            buf = match component.transform {
                Transform::None => buf,
                Transform::Scale(s) => buf.push(F2Dot14::from_f64(s)),
                Transform::XyScale(x, y) => buf
                    .push(F2Dot14::from_f64(x))
                    .push(F2Dot14::from_f64(y)),
                Transform::TwoByTwo(m) => buf.extend(m.map(F2Dot14::from_f64)),
            };
        }
        if !self.instructions.is_empty() {
            buf = buf
                .push(self.instructions.len() as u16)
                .extend_bytes(&self.instructions);
        }
        buf.into_vec()
    }
}
