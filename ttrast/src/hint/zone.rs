//! Point zones.

use core::ops::Range;

use ttrast_types::Point;

use super::{error::HintErrorKind, graphics::CoordAxis, math::mul_div};
use crate::glyph::{FontPoint, PointMarker};

use HintErrorKind::{InvalidContourIndex, InvalidPointIndex};

/// Reference to either the twilight or glyph zone.
///
/// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructing_glyphs#zones>
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
#[repr(u8)]
pub enum ZonePointer {
    Twilight = 0,
    #[default]
    Glyph = 1,
}

impl ZonePointer {
    pub fn is_twilight(self) -> bool {
        self == Self::Twilight
    }
}

impl TryFrom<i32> for ZonePointer {
    type Error = HintErrorKind;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Twilight),
            1 => Ok(Self::Glyph),
            _ => Err(HintErrorKind::InvalidZoneIndex(value)),
        }
    }
}

/// A set of points that instructions operate on.
///
/// Each point exists in three versions: the current (hinted) position, the
/// scaled position before any instructions ran and the position in font
/// units. The twilight zone has no font unit positions; those are all zero.
///
/// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructing_glyphs#zones>
#[derive(Default, Debug)]
pub struct Zone<'a> {
    pub points: &'a mut [FontPoint],
    pub original: &'a mut [FontPoint],
    pub unscaled: &'a mut [FontPoint],
    /// Exclusive end point of each contour.
    pub ends: &'a [usize],
    /// Number of trailing phantom points. These belong to no contour.
    pub phantom_count: usize,
}

impl<'a> Zone<'a> {
    pub fn new(
        points: &'a mut [FontPoint],
        original: &'a mut [FontPoint],
        unscaled: &'a mut [FontPoint],
        ends: &'a [usize],
        phantom_count: usize,
    ) -> Self {
        Self {
            points,
            original,
            unscaled,
            ends,
            phantom_count,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Result<Point<i32>, HintErrorKind> {
        self.points
            .get(index)
            .map(FontPoint::coords)
            .ok_or(InvalidPointIndex(index))
    }

    pub fn point_mut(&mut self, index: usize) -> Result<&mut FontPoint, HintErrorKind> {
        self.points.get_mut(index).ok_or(InvalidPointIndex(index))
    }

    pub fn original(&self, index: usize) -> Result<Point<i32>, HintErrorKind> {
        self.original
            .get(index)
            .map(FontPoint::coords)
            .ok_or(InvalidPointIndex(index))
    }

    pub fn original_mut(&mut self, index: usize) -> Result<&mut FontPoint, HintErrorKind> {
        self.original.get_mut(index).ok_or(InvalidPointIndex(index))
    }

    pub fn unscaled(&self, index: usize) -> Result<Point<i32>, HintErrorKind> {
        self.unscaled
            .get(index)
            .map(FontPoint::coords)
            .ok_or(InvalidPointIndex(index))
    }

    /// Returns the range of points in the given contour.
    pub fn contour(&self, index: usize) -> Result<Range<usize>, HintErrorKind> {
        let end = *self.ends.get(index).ok_or(InvalidContourIndex(index))?;
        let start = match index {
            0 => 0,
            _ => self.ends[index - 1],
        };
        Ok(start..end)
    }

    pub fn touch(&mut self, index: usize, axis: CoordAxis) -> Result<(), HintErrorKind> {
        self.point_mut(index)?
            .flags
            .set_marker(axis.touched_marker());
        Ok(())
    }

    pub fn is_touched(&self, index: usize, axis: CoordAxis) -> Result<bool, HintErrorKind> {
        let point = self.points.get(index).ok_or(InvalidPointIndex(index))?;
        Ok(point.flags.has_marker(axis.touched_marker()))
    }

    pub fn flip_on_curve(&mut self, index: usize) -> Result<(), HintErrorKind> {
        self.point_mut(index)?.flags.flip_on_curve();
        Ok(())
    }

    /// Sets or clears the on curve flag for the inclusive range of points.
    pub fn set_on_curve(&mut self, low: usize, high: usize, on: bool) -> Result<(), HintErrorKind> {
        if low > high {
            return Ok(());
        }
        let points = self
            .points
            .get_mut(low..=high)
            .ok_or(InvalidPointIndex(high))?;
        for point in points {
            if on {
                point.flags.set_on_curve();
            } else {
                point.flags.clear_on_curve();
            }
        }
        Ok(())
    }

    /// Interpolates the points of each contour that were not touched along
    /// the given axis.
    ///
    /// Based on <https://gitlab.freedesktop.org/freetype/freetype/-/blob/57617782464411201ce7bbc93b086c1b4d7d84a5/src/truetype/ttinterp.c#L6391>
    pub fn iup(&mut self, axis: CoordAxis) -> Result<(), HintErrorKind> {
        let mut start = 0;
        for &end in self.ends {
            let end = end.min(self.points.len());
            let contour = start.min(end)..end;
            start = end;
            let Some(first_touched) = contour
                .clone()
                .find(|&ix| self.points[ix].flags.has_marker(axis.touched_marker()))
            else {
                continue;
            };
            let mut cur_touched = first_touched;
            for point in first_touched + 1..contour.end {
                if self.points[point].flags.has_marker(axis.touched_marker()) {
                    self.iup_interpolate(axis, cur_touched + 1..point, cur_touched, point);
                    cur_touched = point;
                }
            }
            if cur_touched == first_touched {
                self.iup_shift(axis, contour, cur_touched);
            } else {
                self.iup_interpolate(axis, cur_touched + 1..contour.end, cur_touched, first_touched);
                self.iup_interpolate(axis, contour.start..first_touched, cur_touched, first_touched);
            }
        }
        Ok(())
    }

    /// Shifts every point in `range` except `reference` by the distance the
    /// reference point has moved.
    fn iup_shift(&mut self, axis: CoordAxis, range: Range<usize>, reference: usize) {
        let (Some(cur), Some(org)) = (
            axis.coord_at(self.points, reference),
            axis.coord_at(self.original, reference),
        ) else {
            return;
        };
        let delta = cur - org;
        if delta == 0 {
            return;
        }
        for ix in range.filter(|&ix| ix != reference) {
            *axis.coord_mut(&mut self.points[ix]) += delta;
        }
    }

    /// Interpolates the points in `range` between two touched reference
    /// points.
    ///
    /// Points outside the original span of the references move with the
    /// nearer reference; points inside are placed proportionally to their
    /// font unit position.
    fn iup_interpolate(
        &mut self,
        axis: CoordAxis,
        range: Range<usize>,
        mut ref1: usize,
        mut ref2: usize,
    ) {
        if range.is_empty() {
            return;
        }
        let (Some(mut orus1), Some(mut orus2)) =
            (axis.coord_at(self.unscaled, ref1), axis.coord_at(self.unscaled, ref2))
        else {
            return;
        };
        if orus1 > orus2 {
            core::mem::swap(&mut orus1, &mut orus2);
            core::mem::swap(&mut ref1, &mut ref2);
        }
        let (Some(org1), Some(org2)) =
            (axis.coord_at(self.original, ref1), axis.coord_at(self.original, ref2))
        else {
            return;
        };
        let delta1 = axis.coord(self.points[ref1].coords()) - org1;
        let delta2 = axis.coord(self.points[ref2].coords()) - org2;
        let mut scale = None;
        for ix in range {
            let (Some(a), Some(orus)) = (
                axis.coord_at(self.original, ix),
                axis.coord_at(self.unscaled, ix),
            ) else {
                return;
            };
            let value = if a <= org1 {
                a + delta1
            } else if a >= org2 || orus1 == orus2 {
                a + delta2
            } else {
                let scale = *scale.get_or_insert_with(|| {
                    mul_div(org2 + delta2 - org1 - delta1, 0x10000, orus2 - orus1) as i64
                });
                let mut num = (orus - orus1) as i64 * scale;
                num += if num >= 0 { 0x8000 } else { -0x8000 };
                org1 + delta1 + (num / 0x10000) as i32
            };
            *axis.coord_mut(&mut self.points[ix]) = value;
        }
    }
}

impl CoordAxis {
    fn touched_marker(self) -> PointMarker {
        match self {
            CoordAxis::Both => PointMarker::TOUCHED,
            CoordAxis::X => PointMarker::TOUCHED_X,
            CoordAxis::Y => PointMarker::TOUCHED_Y,
        }
    }

    fn coord(self, point: Point<i32>) -> i32 {
        match self {
            CoordAxis::Y => point.y,
            _ => point.x,
        }
    }

    fn coord_at(self, points: &[FontPoint], index: usize) -> Option<i32> {
        points.get(index).map(|point| self.coord(point.coords()))
    }

    fn coord_mut(self, point: &mut FontPoint) -> &mut i32 {
        match self {
            CoordAxis::Y => &mut point.y,
            _ => &mut point.x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::PointFlags;

    fn points<const N: usize>(coords: [(i32, i32); N]) -> Vec<FontPoint> {
        coords.iter().map(|&(x, y)| FontPoint::on(x, y)).collect()
    }

    fn coords(points: &[FontPoint]) -> Vec<(i32, i32)> {
        points.iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn flip_on_curve_point() {
        let mut pts = vec![
            FontPoint::on(0, 0),
            FontPoint::off(0, 0),
            FontPoint::off(0, 0),
            FontPoint::on(0, 0),
        ];
        let mut zone = Zone {
            points: &mut pts,
            ..Default::default()
        };
        for i in 0..4 {
            zone.flip_on_curve(i).unwrap();
        }
        let flags: Vec<_> = pts.iter().map(|p| p.flags.is_on_curve()).collect();
        assert_eq!(flags, [false, true, true, false]);
    }

    #[test]
    fn set_on_curve_regions() {
        let mut pts = vec![
            FontPoint::on(0, 0),
            FontPoint::off(0, 0),
            FontPoint::off(0, 0),
            FontPoint::on(0, 0),
        ];
        let mut zone = Zone {
            points: &mut pts,
            ..Default::default()
        };
        zone.set_on_curve(0, 1, true).unwrap();
        zone.set_on_curve(2, 3, false).unwrap();
        assert_eq!(
            zone.set_on_curve(2, 4, false),
            Err(HintErrorKind::InvalidPointIndex(4))
        );
        let flags: Vec<_> = pts.iter().map(|p| p.flags.is_on_curve()).collect();
        assert_eq!(flags, [true, true, false, false]);
    }

    #[test]
    fn contour_ranges() {
        let zone = Zone {
            ends: &[3, 7],
            ..Default::default()
        };
        assert_eq!(zone.contour(0), Ok(0..3));
        assert_eq!(zone.contour(1), Ok(3..7));
        assert_eq!(zone.contour(2), Err(HintErrorKind::InvalidContourIndex(2)));
    }

    #[test]
    fn iup_shift() {
        // A single touched point shifts the whole contour
        let mut original = points([(0, 0), (10, 10), (20, 20)]);
        let mut pts = points([(-5, -20), (10, 10), (20, 20)]);
        pts[0].flags.set_marker(PointMarker::TOUCHED);
        let mut zone = Zone {
            original: &mut original,
            points: &mut pts,
            ends: &[3],
            ..Default::default()
        };
        zone.iup(CoordAxis::X).unwrap();
        assert_eq!(coords(zone.points), [(-5, -20), (5, 10), (15, 20)]);
        zone.iup(CoordAxis::Y).unwrap();
        assert_eq!(coords(zone.points), [(-5, -20), (5, -10), (15, 0)]);
    }

    #[test]
    fn iup_interpolate() {
        // Two touched points interpolates the intermediate point(s)
        let mut original = points([(0, 0), (10, 10), (20, 20)]);
        let mut unscaled = points([(0, 0), (500, 500), (1000, 1000)]);
        let mut pts = points([(-5, -20), (10, 10), (27, 56)]);
        pts[0].flags.set_marker(PointMarker::TOUCHED);
        pts[2].flags.set_marker(PointMarker::TOUCHED);
        let mut zone = Zone {
            original: &mut original,
            unscaled: &mut unscaled,
            points: &mut pts,
            ends: &[3],
            ..Default::default()
        };
        zone.iup(CoordAxis::X).unwrap();
        assert_eq!(coords(zone.points), [(-5, -20), (11, 10), (27, 56)]);
        zone.iup(CoordAxis::Y).unwrap();
        assert_eq!(coords(zone.points), [(-5, -20), (11, 18), (27, 56)]);
    }

    #[test]
    fn iup_ignores_points_outside_contours() {
        let mut original = points([(0, 0), (10, 0), (100, 0)]);
        let mut pts = points([(4, 0), (10, 0), (100, 0)]);
        pts[0].flags = PointFlags::on_curve();
        pts[0].flags.set_marker(PointMarker::TOUCHED_X);
        let mut zone = Zone {
            original: &mut original,
            points: &mut pts,
            // the last point is a phantom
            ends: &[2],
            phantom_count: 1,
            ..Default::default()
        };
        zone.iup(CoordAxis::X).unwrap();
        assert_eq!(coords(zone.points), [(4, 0), (14, 0), (100, 0)]);
        // y markers are unaffected by x interpolation
        assert!(!zone.is_touched(1, CoordAxis::Y).unwrap());
    }
}
