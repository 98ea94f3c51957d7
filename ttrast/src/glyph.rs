//! Loading of scaled (and optionally hinted) glyph outlines from the
//! [glyf](https://learn.microsoft.com/en-us/typography/opentype/spec/glyf)
//! table.

use ttrast_types::{BoundingBox, GlyphId, Point};

use crate::{
    error::DecodeError,
    font::{Font, HMetric},
    font_data::FontData,
    hint::{HintOutline, Hinter},
};

/// Composite glyphs nested deeper than this are rejected.
pub const RECURSION_LIMIT: usize = 32;

/// Number of phantom points appended to each simple glyph while it is
/// scaled and hinted.
pub const PHANTOM_POINT_COUNT: usize = 4;

// simple glyph flags
const ON_CURVE: u8 = 0x01;
const X_SHORT: u8 = 0x02;
const Y_SHORT: u8 = 0x04;
const REPEAT: u8 = 0x08;
const X_SAME_OR_POSITIVE: u8 = 0x10;
const Y_SAME_OR_POSITIVE: u8 = 0x20;

// composite glyph flags
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const ROUND_XY_TO_GRID: u16 = 0x0004;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;
const USE_MY_METRICS: u16 = 0x0200;

/// Marker bits that are set on points while hinting.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PointMarker(u8);

impl PointMarker {
    /// Marker that signifies that the x coordinate of a point has been
    /// touched by a hinting instruction.
    pub const TOUCHED_X: Self = Self(0x10);

    /// Marker that signifies that the y coordinate of a point has been
    /// touched by a hinting instruction.
    pub const TOUCHED_Y: Self = Self(0x20);

    /// Both touched markers.
    pub const TOUCHED: Self = Self(Self::TOUCHED_X.0 | Self::TOUCHED_Y.0);
}

/// Flags describing the properties of a point.
///
/// The on curve flag is intrinsic to the point. Markers are set and cleared
/// while an outline is being hinted.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
#[repr(transparent)]
pub struct PointFlags(u8);

impl PointFlags {
    /// Creates a new on curve point flag.
    pub const fn on_curve() -> Self {
        Self(ON_CURVE)
    }

    /// Creates a new off curve (quadratic control point) flag.
    pub const fn off_curve() -> Self {
        Self(0)
    }

    /// Creates a point flag from the given bits. These are truncated
    /// to ignore markers.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & ON_CURVE)
    }

    /// Returns true if this is an on curve point.
    #[inline]
    pub const fn is_on_curve(self) -> bool {
        self.0 & ON_CURVE != 0
    }

    /// Flips the state of the on curve flag.
    ///
    /// This is used for the TrueType `FLIPPT` instruction.
    pub fn flip_on_curve(&mut self) {
        self.0 ^= ON_CURVE;
    }

    /// Enables the on curve flag.
    ///
    /// This is used for the TrueType `FLIPRGON` instruction.
    pub fn set_on_curve(&mut self) {
        self.0 |= ON_CURVE;
    }

    /// Disables the on curve flag.
    ///
    /// This is used for the TrueType `FLIPRGOFF` instruction.
    pub fn clear_on_curve(&mut self) {
        self.0 &= !ON_CURVE;
    }

    /// Returns true if the given marker is set for this point.
    pub fn has_marker(self, marker: PointMarker) -> bool {
        self.0 & marker.0 != 0
    }

    /// Applies the given marker to this point.
    pub fn set_marker(&mut self, marker: PointMarker) {
        self.0 |= marker.0;
    }

    /// Clears the given marker for this point.
    pub fn clear_marker(&mut self, marker: PointMarker) {
        self.0 &= !marker.0
    }

    /// Returns a copy with all markers cleared.
    pub const fn without_markers(self) -> Self {
        Self(self.0 & ON_CURVE)
    }

    /// Returns the underlying bits.
    pub const fn to_bits(self) -> u8 {
        self.0
    }
}

/// A point of a glyph outline.
///
/// Coordinates are in font units for raw points and in 26.6 fixed point
/// pixels otherwise.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct FontPoint {
    pub x: i32,
    pub y: i32,
    pub flags: PointFlags,
}

impl FontPoint {
    pub const fn new(x: i32, y: i32, flags: PointFlags) -> Self {
        Self { x, y, flags }
    }

    pub const fn on(x: i32, y: i32) -> Self {
        Self::new(x, y, PointFlags::on_curve())
    }

    pub const fn off(x: i32, y: i32) -> Self {
        Self::new(x, y, PointFlags::off_curve())
    }

    /// Returns the coordinates without the flags.
    pub const fn coords(&self) -> Point<i32> {
        Point {
            x: self.x,
            y: self.y,
        }
    }
}

/// A decoded glyph outline.
///
/// The same `Glyph` can be used to load a series of glyphs; each call to
/// [`Glyph::load`] reuses the allocations of the previous one.
///
/// Contour `i` consists of `points[ends[i - 1]..ends[i]]`, where `ends[-1]`
/// is taken to be zero.
#[derive(Clone, Default, Debug)]
pub struct Glyph {
    /// Scaled bounding box, taken from the font rather than computed from
    /// the points.
    pub bounds: BoundingBox<i32>,
    /// Final outline points in 26.6.
    pub points: Vec<FontPoint>,
    /// Scaled points before hinting. Only filled in when a hinter is used.
    pub unhinted_points: Vec<FontPoint>,
    /// Points in font units. Only filled in when a hinter is used.
    pub raw_points: Vec<FontPoint>,
    /// Exclusive end index of each contour.
    pub ends: Vec<usize>,
    /// Scaled x coordinate of the first phantom point.
    pp1x: i32,
    metrics_set: bool,
}

impl Glyph {
    pub fn new() -> Self {
        Self {
            points: Vec::with_capacity(256),
            ends: Vec::with_capacity(32),
            ..Default::default()
        }
    }

    /// Loads the outline of `glyph_id` at the given scale (pixels per em in
    /// 26.6), replacing the current contents.
    ///
    /// With a hinter, the font's hinting programs are run against the
    /// scaled outline. Errors leave the glyph in an unspecified but valid
    /// state.
    pub fn load(
        &mut self,
        font: &Font,
        scale: i32,
        glyph_id: GlyphId,
        mut hinter: Option<&mut Hinter>,
    ) -> Result<(), DecodeError> {
        self.clear();
        if let Some(hinter) = hinter.as_deref_mut() {
            hinter.set_scale(scale)?;
        }
        Loader {
            font,
            scale,
            hinter,
            glyph: self,
        }
        .load(0, glyph_id, true)?;
        if self.pp1x != 0 {
            for point in &mut self.points {
                point.x -= self.pp1x;
            }
        }
        Ok(())
    }

    /// Removes all points and contours.
    pub fn clear(&mut self) {
        self.bounds = BoundingBox::default();
        self.points.clear();
        self.unhinted_points.clear();
        self.raw_points.clear();
        self.ends.clear();
        self.pp1x = 0;
        self.metrics_set = false;
    }

    /// Returns an iterator over the points of each contour.
    pub fn contours(&self) -> impl Iterator<Item = &[FontPoint]> + '_ {
        let mut start = 0;
        self.ends.iter().map(move |&end| {
            let contour = self.points.get(start..end).unwrap_or_default();
            start = end;
            contour
        })
    }
}

/// Convenience function that loads a glyph into a new [`Glyph`].
pub fn load_glyph(
    font: &Font,
    scale: i32,
    glyph_id: GlyphId,
    hinter: Option<&mut Hinter>,
) -> Result<Glyph, DecodeError> {
    let mut glyph = Glyph::new();
    glyph.load(font, scale, glyph_id, hinter)?;
    Ok(glyph)
}

struct Loader<'a, 'b, 'h> {
    font: &'b Font<'a>,
    scale: i32,
    hinter: Option<&'b mut Hinter<'h>>,
    glyph: &'b mut Glyph,
}

impl Loader<'_, '_, '_> {
    fn scale(&self, value: i32) -> i32 {
        self.font.scale(self.scale, value)
    }

    fn load(
        &mut self,
        depth: usize,
        glyph_id: GlyphId,
        use_my_metrics: bool,
    ) -> Result<(), DecodeError> {
        if depth >= RECURSION_LIMIT {
            return Err(DecodeError::ExcessiveRecursion);
        }
        if glyph_id.to_usize() >= self.font.num_glyphs() {
            return Err(DecodeError::GlyphOutOfRange(glyph_id));
        }
        let Some(data) = self.font.glyph_data(glyph_id)? else {
            return Ok(());
        };
        let num_contours: i16 = data.read_at(0)?;
        let bounds = BoundingBox {
            x_min: data.read_at::<i16>(2)? as i32,
            y_min: data.read_at::<i16>(4)? as i32,
            x_max: data.read_at::<i16>(6)? as i32,
            y_max: data.read_at::<i16>(8)? as i32,
        };
        let metric = self.font.unscaled_h_metric(glyph_id);
        let pp1x = match num_contours {
            -1 => {
                let pp1x = self.scale(bounds.x_min - metric.left_side_bearing);
                self.load_composite(depth, data, use_my_metrics)?;
                pp1x
            }
            n if n < 0 => return Err(DecodeError::InvalidContourCount(n)),
            n => self.load_simple(glyph_id, data, n as usize, bounds, metric)?,
        };
        if use_my_metrics && !self.glyph.metrics_set {
            self.glyph.metrics_set = true;
            self.glyph.bounds = bounds.map(|v| self.font.scale(self.scale, v));
            self.glyph.pp1x = pp1x;
        }
        Ok(())
    }

    /// Appends the points of a simple glyph and returns the scaled (and
    /// possibly hinted) x coordinate of its first phantom point.
    fn load_simple(
        &mut self,
        glyph_id: GlyphId,
        data: FontData,
        num_contours: usize,
        bounds: BoundingBox<i32>,
        metric: HMetric,
    ) -> Result<i32, DecodeError> {
        let glyph = &mut *self.glyph;
        let point_base = glyph.points.len();
        let contour_base = glyph.ends.len();
        let mut cursor = data.cursor();
        cursor.advance_by(10);
        let mut num_points = 0;
        for _ in 0..num_contours {
            let end = cursor.read::<u16>()? as usize + 1;
            if end < num_points {
                return Err(DecodeError::MalformedGlyph(
                    "contour end points are not increasing",
                ));
            }
            num_points = end;
            glyph.ends.push(end);
        }
        let instructions_len = cursor.read::<u16>()? as usize;
        let instructions = cursor.read_bytes(instructions_len)?;
        let point_end = point_base + num_points;
        glyph.points.reserve(num_points + PHANTOM_POINT_COUNT);
        // The raw flag byte is kept in the point until the coordinates are
        // decoded.
        while glyph.points.len() < point_end {
            let flags: u8 = cursor.read()?;
            let repeat = if flags & REPEAT != 0 {
                cursor.read::<u8>()? as usize
            } else {
                0
            };
            for _ in 0..=repeat {
                glyph.points.push(FontPoint::new(0, 0, PointFlags(flags)));
            }
        }
        glyph.points.truncate(point_end);
        let points = &mut glyph.points[point_base..];
        let mut x = 0i16;
        for point in points.iter_mut() {
            let flags = point.flags.0;
            if flags & X_SHORT != 0 {
                let dx = cursor.read::<u8>()? as i16;
                x = if flags & X_SAME_OR_POSITIVE != 0 {
                    x.wrapping_add(dx)
                } else {
                    x.wrapping_sub(dx)
                };
            } else if flags & X_SAME_OR_POSITIVE == 0 {
                x = x.wrapping_add(cursor.read::<i16>()?);
            }
            point.x = x as i32;
        }
        let mut y = 0i16;
        for point in points.iter_mut() {
            let flags = point.flags.0;
            if flags & Y_SHORT != 0 {
                let dy = cursor.read::<u8>()? as i16;
                y = if flags & Y_SAME_OR_POSITIVE != 0 {
                    y.wrapping_add(dy)
                } else {
                    y.wrapping_sub(dy)
                };
            } else if flags & Y_SAME_OR_POSITIVE == 0 {
                y = y.wrapping_add(cursor.read::<i16>()?);
            }
            point.y = y as i32;
            point.flags = PointFlags::from_bits(flags);
        }
        let pp1x = bounds.x_min - metric.left_side_bearing;
        glyph.points.extend([
            FontPoint::new(pp1x, 0, PointFlags::default()),
            FontPoint::new(pp1x + metric.advance_width, 0, PointFlags::default()),
            FontPoint::default(),
            FontPoint::default(),
        ]);
        let is_hinted = self.hinter.is_some();
        if is_hinted {
            glyph.raw_points.extend_from_slice(&glyph.points[point_base..]);
        }
        for point in &mut glyph.points[point_base..] {
            point.x = self.font.scale(self.scale, point.x);
            point.y = self.font.scale(self.scale, point.y);
        }
        if let Some(hinter) = self.hinter.as_deref_mut() {
            glyph
                .unhinted_points
                .extend_from_slice(&glyph.points[point_base..]);
            if !instructions.is_empty() {
                hinter.hint_glyph(
                    glyph_id,
                    instructions,
                    HintOutline {
                        points: &mut glyph.points[point_base..],
                        unhinted: &mut glyph.unhinted_points[point_base..],
                        raw: &mut glyph.raw_points[point_base..],
                        ends: &glyph.ends[contour_base..],
                    },
                )?;
            }
        }
        // Drop the phantom points.
        let len = glyph.points.len() - PHANTOM_POINT_COUNT;
        let mut pp1x = glyph.points[len].x;
        glyph.points.truncate(len);
        if is_hinted {
            glyph.raw_points.truncate(len);
            glyph.unhinted_points.truncate(len);
            // Move the outline so that the hinted first phantom point lies
            // on the pixel grid.
            let rounded = (pp1x + 32) & !63;
            let dx = rounded - pp1x;
            if dx != 0 {
                for point in &mut glyph.points[point_base..] {
                    point.x += dx;
                }
            }
            pp1x = rounded;
        }
        // Hinting programs see contour ends relative to their own glyph.
        if point_base != 0 {
            for end in &mut glyph.ends[contour_base..] {
                *end += point_base;
            }
        }
        Ok(pp1x)
    }

    fn load_composite(
        &mut self,
        depth: usize,
        data: FontData,
        use_my_metrics: bool,
    ) -> Result<(), DecodeError> {
        let mut cursor = data.cursor();
        cursor.advance_by(10);
        loop {
            let flags: u16 = cursor.read()?;
            let component = GlyphId::new(cursor.read()?);
            let (dx, dy) = if flags & ARG_1_AND_2_ARE_WORDS != 0 {
                (cursor.read::<i16>()? as i32, cursor.read::<i16>()? as i32)
            } else {
                (cursor.read::<i8>()? as i32, cursor.read::<i8>()? as i32)
            };
            if flags & ARGS_ARE_XY_VALUES == 0 {
                return Err(DecodeError::UnsupportedCompound);
            }
            // [xx, xy, yx, yy] in 2.14
            let transform = if flags & WE_HAVE_A_SCALE != 0 {
                let scale = cursor.read::<i16>()? as i64;
                Some([scale, 0, 0, scale])
            } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
                let x_scale = cursor.read::<i16>()? as i64;
                let y_scale = cursor.read::<i16>()? as i64;
                Some([x_scale, 0, 0, y_scale])
            } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
                let mut values = [0; 4];
                for value in &mut values {
                    *value = cursor.read::<i16>()? as i64;
                }
                Some(values)
            } else {
                None
            };
            let start = self.glyph.points.len();
            self.load(
                depth + 1,
                component,
                use_my_metrics && flags & USE_MY_METRICS != 0,
            )?;
            let mut offset = (self.scale(dx), self.scale(dy));
            if flags & ROUND_XY_TO_GRID != 0 {
                offset = ((offset.0 + 32) & !63, (offset.1 + 32) & !63);
            }
            let glyph = &mut *self.glyph;
            place_component(&mut glyph.points[start..], transform, offset);
            if self.hinter.is_some() {
                place_component(&mut glyph.unhinted_points[start..], transform, offset);
                place_component(&mut glyph.raw_points[start..], transform, (dx, dy));
            }
            if flags & MORE_COMPONENTS == 0 {
                break;
            }
        }
        // Composite instructions are not executed.
        Ok(())
    }
}

/// Applies a component transform followed by its offset.
fn place_component(points: &mut [FontPoint], transform: Option<[i64; 4]>, offset: (i32, i32)) {
    fn mul(a: i32, b: i64) -> i32 {
        ((a as i64 * b + 0x2000) >> 14) as i32
    }
    for point in points {
        if let Some([xx, xy, yx, yy]) = transform {
            let x = mul(point.x, xx) + mul(point.y, yx);
            let y = mul(point.x, xy) + mul(point.y, yy);
            point.x = x;
            point.y = y;
        }
        point.x += offset.0;
        point.y += offset.1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::parse;
    use pretty_assertions::assert_eq;
    use ttrast_test_data::{
        a_glyph, gid, glyf::OutlinePoint, hinting, recursive_composite_font, simple_font,
        simple_font_builder, Component, CompositeGlyph, FontBuilder, GlyphData, SimpleGlyph,
        Transform, SIMPLE_UNITS_PER_EM,
    };

    /// Scale at which coordinates equal font units.
    const UNIT_SCALE: i32 = SIMPLE_UNITS_PER_EM as i32;

    fn load(data: &[u8], scale: i32, glyph_id: u16) -> Result<Glyph, DecodeError> {
        let font = parse(data).unwrap();
        load_glyph(&font, scale, GlyphId::new(glyph_id), None)
    }

    fn coords(points: &[FontPoint]) -> Vec<(i32, i32)> {
        points.iter().map(|p| (p.x, p.y)).collect()
    }

    fn outline_coords<'a>(points: impl IntoIterator<Item = &'a OutlinePoint>) -> Vec<(i32, i32)> {
        points
            .into_iter()
            .map(|p| (p.x as i32, p.y as i32))
            .collect()
    }

    #[test]
    fn simple_glyph_in_font_units() {
        let glyph = load(&simple_font(), UNIT_SCALE, gid::A).unwrap();
        assert_eq!(coords(&glyph.points), outline_coords(a_glyph().points()));
        assert_eq!(glyph.ends, [3, 6]);
        assert_eq!(
            glyph.bounds,
            BoundingBox {
                x_min: 0,
                y_min: 0,
                x_max: 1200,
                y_max: 1400
            }
        );
        assert!(glyph.points.iter().all(|p| p.flags.is_on_curve()));
        assert!(glyph.unhinted_points.is_empty());
        assert_eq!(glyph.contours().count(), 2);
    }

    #[test]
    fn off_curve_flags() {
        let glyph = load(&simple_font(), UNIT_SCALE, gid::O).unwrap();
        let on_curve = glyph
            .points
            .iter()
            .map(|p| p.flags.is_on_curve())
            .collect::<Vec<_>>();
        assert_eq!(
            on_curve,
            [true, false, true, false, true, false, true, false]
        );
    }

    #[test]
    fn bounds_match_point_extrema() {
        let data = simple_font();
        for scale in [8 * 64, 12 * 64 + 17, 33 * 64, 100 * 64] {
            for glyph_id in [gid::NOTDEF, gid::A, gid::V, gid::O] {
                let glyph = load(&data, scale, glyph_id).unwrap();
                let x_min = glyph.points.iter().map(|p| p.x).min().unwrap();
                let x_max = glyph.points.iter().map(|p| p.x).max().unwrap();
                let y_min = glyph.points.iter().map(|p| p.y).min().unwrap();
                let y_max = glyph.points.iter().map(|p| p.y).max().unwrap();
                let bounds = glyph.bounds;
                // pp1x is zero for these glyphs, so the outline is not shifted
                assert!((bounds.x_min - x_min).abs() <= 1, "{glyph_id} at {scale}");
                assert!((bounds.x_max - x_max).abs() <= 1, "{glyph_id} at {scale}");
                assert!((bounds.y_min - y_min).abs() <= 1, "{glyph_id} at {scale}");
                assert!((bounds.y_max - y_max).abs() <= 1, "{glyph_id} at {scale}");
            }
        }
    }

    #[test]
    fn empty_glyph() {
        let glyph = load(&simple_font(), UNIT_SCALE, gid::SPACE).unwrap();
        assert!(glyph.points.is_empty());
        assert!(glyph.ends.is_empty());
        assert_eq!(glyph.bounds, BoundingBox::default());
    }

    #[test]
    fn composite_with_scaled_component() {
        let glyph = load(&simple_font(), UNIT_SCALE, gid::A_DIAERESIS).unwrap();
        let mut expected = outline_coords(a_glyph().points());
        // quarter scale 'o' moved to (450, 1500)
        expected.extend([
            (600, 1500),
            (750, 1500),
            (750, 1650),
            (750, 1800),
            (600, 1800),
            (450, 1800),
            (450, 1650),
            (450, 1500),
        ]);
        assert_eq!(coords(&glyph.points), expected);
        assert_eq!(glyph.ends, [3, 6, 14]);
        // metrics come from 'A' via USE_MY_METRICS
        assert_eq!(glyph.bounds.y_max, 1400);
    }

    #[test]
    fn nested_composite() {
        let data = simple_font();
        let inner = load(&data, UNIT_SCALE, gid::A_DIAERESIS).unwrap();
        let outer = load(&data, UNIT_SCALE, gid::A_RING).unwrap();
        let shifted = inner
            .points
            .iter()
            .map(|p| (p.x + 100, p.y))
            .collect::<Vec<_>>();
        assert_eq!(coords(&outer.points), shifted);
        assert_eq!(outer.ends, inner.ends);
        assert_eq!(
            outer.bounds,
            BoundingBox {
                x_min: 100,
                y_min: 0,
                x_max: 1300,
                y_max: 1800
            }
        );
    }

    #[test]
    fn two_by_two_mirror() {
        let glyph = load(&simple_font(), UNIT_SCALE, gid::MIRROR_A).unwrap();
        let mirrored = a_glyph()
            .points()
            .map(|p| (-(p.x as i32), p.y as i32))
            .collect::<Vec<_>>();
        assert_eq!(coords(&glyph.points), mirrored);
    }

    #[test]
    fn component_after_two_by_two() {
        let composite = CompositeGlyph::new([-1200, 0, 1200, 1400])
            .component(
                Component::new(gid::A, 0, 0)
                    .transform(Transform::TwoByTwo([-1.0, 0.0, 0.0, 1.0])),
            )
            .component(Component::new(gid::V, 10, 0));
        let data = simple_font_builder().glyph(composite, 2400, -1200).build();
        let glyph = load(&data, UNIT_SCALE, 8).unwrap();
        assert_eq!(glyph.points.len(), 9);
        assert_eq!(
            coords(&glyph.points[6..]),
            [(10, 1400), (1210, 1400), (610, 0)]
        );
    }

    #[test]
    fn round_component_offset() {
        let composite = CompositeGlyph::new([100, 0, 1300, 1400])
            .component(Component::new(gid::A, 100, 0).round_xy_to_grid());
        let data = simple_font_builder().glyph(composite, 1300, 100).build();
        let glyph = load(&data, UNIT_SCALE, 8).unwrap();
        // 100 rounds up to 2 pixels in 26.6
        assert_eq!(coords(&glyph.points[..1]), [(128, 0)]);
    }

    #[test]
    fn side_bearing_shift() {
        let data = FontBuilder::new(SIMPLE_UNITS_PER_EM)
            .glyph(GlyphData::Empty, 500, 0)
            .glyph(a_glyph(), 1300, 50)
            .map('A', 1)
            .build();
        let glyph = load(&data, UNIT_SCALE, 1).unwrap();
        // pp1x = x_min - lsb = -50
        assert_eq!(coords(&glyph.points[..2]), [(50, 0), (650, 1400)]);
    }

    #[test]
    fn excessive_recursion() {
        let err = load(&recursive_composite_font(), 64 * 12, 1).unwrap_err();
        assert!(matches!(err, DecodeError::ExcessiveRecursion));
    }

    #[test]
    fn component_out_of_range() {
        let composite =
            CompositeGlyph::new([0, 0, 100, 100]).component(Component::new(200, 0, 0));
        let data = simple_font_builder().glyph(composite, 100, 0).build();
        let err = load(&data, UNIT_SCALE, 8).unwrap_err();
        assert!(matches!(err, DecodeError::GlyphOutOfRange(g) if g == GlyphId::new(200)));
    }

    #[test]
    fn point_anchored_component() {
        let composite = CompositeGlyph::new([0, 0, 100, 100])
            .component(Component::new(gid::A, 1, 2).point_args());
        let data = simple_font_builder().glyph(composite, 100, 0).build();
        let err = load(&data, UNIT_SCALE, 8).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedCompound));
    }

    #[test]
    fn reserved_contour_count() {
        let raw = [0xFF, 0xFE, 0, 0, 0, 0, 0, 0, 0, 0];
        let data = simple_font_builder()
            .glyph(GlyphData::Raw(raw.to_vec()), 100, 0)
            .build();
        let err = load(&data, UNIT_SCALE, 8).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidContourCount(-2)));
    }

    #[test]
    fn truncated_coordinates() {
        let mut encoded = SimpleGlyph::new()
            .contour(&[
                ttrast_test_data::on(0, 0),
                ttrast_test_data::on(1000, 1000),
            ])
            .encode();
        encoded.truncate(encoded.len() - 2);
        let data = simple_font_builder()
            .glyph(GlyphData::Raw(encoded), 100, 0)
            .build();
        let err = load(&data, UNIT_SCALE, 8).unwrap_err();
        assert!(matches!(err, DecodeError::Read(_)));
    }

    #[test]
    fn glyph_out_of_range() {
        let err = load(&simple_font(), UNIT_SCALE, 100).unwrap_err();
        assert!(matches!(err, DecodeError::GlyphOutOfRange(_)));
    }

    #[test]
    fn reuse_glyph() {
        let data = simple_font();
        let font = parse(&data).unwrap();
        let mut glyph = Glyph::new();
        glyph
            .load(&font, UNIT_SCALE, GlyphId::new(gid::A_DIAERESIS), None)
            .unwrap();
        glyph
            .load(&font, UNIT_SCALE, GlyphId::new(gid::V), None)
            .unwrap();
        assert_eq!(glyph.ends, [3]);
        assert_eq!(coords(&glyph.points), [(0, 1400), (1200, 1400), (600, 0)]);
    }

    #[test]
    fn hinted_glyph() {
        let data = hinting::hinted_font();
        let font = parse(&data).unwrap();
        let mut hinter = Hinter::new(&font).unwrap();
        let glyph = load_glyph(&font, 1024, GlyphId::new(1), Some(&mut hinter)).unwrap();
        assert_eq!(
            coords(&glyph.unhinted_points),
            [(113, 0), (113, 1096), (604, 1096), (604, 0)]
        );
        assert_eq!(
            coords(&glyph.raw_points),
            [(110, 0), (110, 1070), (590, 1070), (590, 0)]
        );
        assert_eq!(
            coords(&glyph.points),
            [(128, 56), (128, 1152), (619, 1152), (619, 56)]
        );
        // markers don't leak out of the hinter
        assert!(glyph
            .points
            .iter()
            .all(|p| p.flags == PointFlags::on_curve()));
    }

    #[test]
    fn hinted_composite_keeps_point_arrays_in_sync() {
        let composite = CompositeGlyph::new([0, 0, 700, 1070])
            .component(Component::new(1, 100, 0).round_xy_to_grid());
        let data = FontBuilder::new(1000)
            .glyph(GlyphData::Empty, 500, 0)
            .glyph(
                SimpleGlyph::new()
                    .contour(&[
                        ttrast_test_data::on(110, 0),
                        ttrast_test_data::on(110, 1070),
                        ttrast_test_data::on(590, 1070),
                        ttrast_test_data::on(590, 0),
                    ])
                    .instructions(hinting::GLYPH_PROGRAM),
                700,
                110,
            )
            .glyph(composite, 800, 0)
            .cvt(hinting::CVT)
            .fpgm(hinting::FPGM)
            .prep(hinting::PREP)
            .build();
        let font = parse(&data).unwrap();
        let mut hinter = Hinter::new(&font).unwrap();
        let glyph = load_glyph(&font, 1024, GlyphId::new(2), Some(&mut hinter)).unwrap();
        // 100 units is 102.4 in 26.6, rounded to the grid
        assert_eq!(
            coords(&glyph.points),
            [(256, 56), (256, 1152), (747, 1152), (747, 56)]
        );
        assert_eq!(glyph.unhinted_points[0].x, 113 + 128);
        assert_eq!(glyph.raw_points[0].x, 210);
    }
}
