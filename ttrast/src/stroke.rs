//! Stroking of paths into fillable outlines.
//!
//! Each subpath is offset to both sides of the direction of travel by half
//! the stroke width. The left offset is sent straight to the output pen
//! while the right offset is collected and appended in reverse after the end
//! cap, so a single closed outline comes out per subpath.

use ttrast_types::{Fix32, Point};

use crate::{
    error::{PathError, StrokeError},
    path::{Path, PathSegment, Pen},
};

/// Squared offset lengths below this are treated as zero.
const ARC_EPSILON: i64 = 16384;

/// Maximum bisection depth for flattening a curve before offsetting it.
const MAX_DEPTH: usize = 5;

/// `(√2 - 1) * 4/3`, the control distance for a cubic quarter circle.
const K: Fix32 = Fix32::from_bits(141);

/// `tan(π/8)`, the control distance for a quadratic eighth circle.
const TAN_PI_8: Fix32 = Fix32::from_bits(106);

/// Shape of the ends of an open stroke.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum Cap {
    /// Ends flush with the end point.
    Butt,
    /// Ends with a semicircle.
    #[default]
    Round,
    /// Extends past the end point by half the width.
    Square,
}

/// Shape of the outer corner where two segments meet.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum Join {
    Bevel,
    #[default]
    Round,
}

/// Stroke parameters.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Stroke {
    /// Full width of the stroke in 24.8 pixels.
    pub width: Fix32,
    pub cap: Cap,
    pub join: Join,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            width: Fix32::ONE,
            cap: Cap::default(),
            join: Join::default(),
        }
    }
}

impl Stroke {
    pub fn new(width: Fix32, cap: Cap, join: Join) -> Self {
        Self { width, cap, join }
    }
}

impl Path {
    /// Appends the outline of `path` stroked with the given parameters.
    pub fn add_stroke(&mut self, path: &Path, params: &Stroke) -> Result<(), StrokeError> {
        stroke(self, path, params)
    }
}

/// Sends the outline of `path`, stroked with `params`, to `pen`.
///
/// Every subpath is treated as open and capped at both ends. Paths with
/// cubic segments are rejected before anything is emitted.
pub fn stroke(pen: &mut impl Pen, path: &Path, params: &Stroke) -> Result<(), StrokeError> {
    for segment in path.segments() {
        if let PathSegment::Cubic(..) = segment? {
            return Err(StrokeError::UnsupportedCubic);
        }
    }
    let mut stroker = Stroker {
        lhs: pen,
        rhs: Path::new(),
        half_width: Fix32::from_bits(params.width.to_bits() / 2),
        cap: params.cap,
        join: params.join,
        first: Point::default(),
        recent: Point::default(),
        normal: Point::default(),
    };
    for (i, segment) in path.segments().enumerate() {
        match segment? {
            PathSegment::Start(p) => {
                stroker.finish()?;
                stroker.first = p;
                stroker.recent = p;
            }
            _ if i == 0 => return Err(PathError::Malformed(0).into()),
            PathSegment::Line(p) => stroker.line_to(p),
            PathSegment::Quad(c, p) => stroker.quad_to(c, p),
            PathSegment::Cubic(..) => return Err(StrokeError::UnsupportedCubic),
        }
    }
    Ok(stroker.finish()?)
}

struct Stroker<'a, P> {
    lhs: &'a mut P,
    // Right hand offsets of the current subpath, in travel order.
    rhs: Path,
    half_width: Fix32,
    cap: Cap,
    join: Join,
    first: Point<Fix32>,
    recent: Point<Fix32>,
    normal: Point<Fix32>,
}

impl<P: Pen> Stroker<'_, P> {
    /// Left pointing offset vector for travel along `v`.
    fn normal_of(&self, v: Point<Fix32>) -> Point<Fix32> {
        v.normalize(self.half_width).rotate_neg_90()
    }

    /// Starts both offset paths or joins onto them with the new normal.
    fn begin_or_join(&mut self, normal: Point<Fix32>) {
        if self.rhs.is_empty() {
            self.lhs.start(self.recent + normal);
            self.rhs.start(self.recent - normal);
            return;
        }
        let pivot = self.recent;
        let n0 = self.normal;
        match self.join {
            Join::Bevel => {
                self.lhs.line_to(pivot + normal);
                self.rhs.line_to(pivot - normal);
            }
            Join::Round => {
                if n0.rotate_90().dot(normal).to_bits() >= 0 {
                    add_arc(&mut *self.lhs, pivot, n0, normal);
                    self.rhs.line_to(pivot - normal);
                } else {
                    self.lhs.line_to(pivot + normal);
                    add_arc(&mut self.rhs, pivot, -n0, -normal);
                }
            }
        }
    }

    fn line_to(&mut self, p: Point<Fix32>) {
        if p == self.recent {
            return;
        }
        let normal = self.normal_of(p - self.recent);
        self.begin_or_join(normal);
        self.lhs.line_to(p + normal);
        self.rhs.line_to(p - normal);
        self.recent = p;
        self.normal = normal;
    }

    fn quad_to(&mut self, c: Point<Fix32>, p: Point<Fix32>) {
        let start = self.recent;
        if start == c && c == p {
            return;
        }
        let v01 = c - start;
        let v12 = p - c;
        let n01 = self.normal_of(v01);
        let is_01_small = v01.dot(v01).to_bits() < ARC_EPSILON;
        let is_12_small = v12.dot(v12).to_bits() < ARC_EPSILON;
        if is_01_small || is_12_small {
            // Too short to be curvy.
            self.line_to(p);
            return;
        }
        self.begin_or_join(n01);
        self.normal = n01;
        let t = curviest(start, c, p);
        if t <= 0 || t >= 65536 {
            self.add_non_curvy(c, p);
            return;
        }
        let m01 = interpolate(start, c, t);
        let m12 = interpolate(c, p, t);
        let m012 = interpolate(m01, m12, t);
        let n12 = self.normal_of(v12);
        let hw = self.half_width.to_bits() as i64;
        if n01.dot(n12).to_bits() < -hw * hw * 2047 / 2048 {
            // The curve turns back on itself at a cusp. One side goes round
            // the tip with an arc; the other folds back on itself.
            let z = n01.rotate_90();
            let lhs_arc = n01.dot(v12).to_bits() < 0;
            self.lhs.line_to(m012 + n01);
            if lhs_arc {
                add_arc(&mut *self.lhs, m012, n01, z);
                add_arc(&mut *self.lhs, m012, z, n12);
            }
            self.lhs.line_to(m012 + n12);
            self.lhs.line_to(p + n12);
            self.rhs.line_to(m012 - n01);
            if !lhs_arc {
                add_arc(&mut self.rhs, m012, -n01, z);
                add_arc(&mut self.rhs, m012, z, -n12);
            }
            self.rhs.line_to(m012 - n12);
            self.rhs.line_to(p - n12);
            self.recent = p;
            self.normal = n12;
            return;
        }
        self.add_non_curvy(m01, m012);
        self.add_non_curvy(m12, p);
    }

    /// Offsets a quadratic with no point of maximum curvature in its
    /// interior, bisecting it while it turns by more than 45 degrees.
    fn add_non_curvy(&mut self, c: Point<Fix32>, p: Point<Fix32>) {
        // Pieces are stored end first; each bisection pushes the half nearer
        // the start on top.
        let mut depths = [0usize; MAX_DEPTH + 1];
        let mut points = [Point::<Fix32>::default(); 2 * MAX_DEPTH + 3];
        points[2] = self.recent;
        points[1] = c;
        points[0] = p;
        let mut n0 = self.normal;
        let mut top = 0;
        loop {
            let depth = depths[top];
            let p0 = points[2 * top + 2];
            let p1 = points[2 * top + 1];
            let p2 = points[2 * top];
            let v01 = p1 - p0;
            let v12 = p2 - p1;
            let is_01_small = v01.dot(v01).to_bits() < 1 << 16;
            let is_12_small = v12.dot(v12).to_bits() < 1 << 16;
            let n2;
            if is_01_small && is_12_small {
                n2 = self.normal_of(v12);
                let mid = p0.midpoint(p2);
                add_arc(&mut *self.lhs, mid, n0, n2);
                add_arc(&mut self.rhs, mid, -n0, -n2);
            } else if depth < MAX_DEPTH && angle_greater_than_45(v01, v12) {
                let m01 = p0.midpoint(p1);
                let m12 = p1.midpoint(p2);
                top += 1;
                depths[top] = depth + 1;
                depths[top - 1] = depth + 1;
                points[2 * top + 2] = p0;
                points[2 * top + 1] = m01;
                points[2 * top] = m01.midpoint(m12);
                points[2 * top - 1] = m12;
                continue;
            } else {
                let n1 = self.normal_of(p2 - p0);
                n2 = self.normal_of(v12);
                self.lhs.quad_to(p1 + n1, p2 + n2);
                self.rhs.quad_to(p1 - n1, p2 - n2);
            }
            if top == 0 {
                self.recent = p2;
                self.normal = n2;
                return;
            }
            top -= 1;
            n0 = n2;
        }
    }

    /// Caps the end, walks back along the right hand side and caps the
    /// start, closing the outline of the current subpath.
    fn finish(&mut self) -> Result<(), PathError> {
        let Some(rhs_start) = self.rhs.first_point() else {
            return Ok(());
        };
        add_cap(&mut *self.lhs, self.cap, self.recent, -self.normal);
        self.rhs.replay_reversed(&mut *self.lhs)?;
        add_cap(&mut *self.lhs, self.cap, self.first, self.first - rhs_start);
        self.rhs.clear();
        Ok(())
    }
}

/// Adds a cap around `pivot`, from `pivot - n` to `pivot + n`.
fn add_cap(pen: &mut impl Pen, cap: Cap, pivot: Point<Fix32>, n: Point<Fix32>) {
    match cap {
        Cap::Butt => pen.line_to(pivot + n),
        Cap::Square => {
            let side = pivot + n.rotate_neg_90();
            pen.line_to(side - n);
            pen.line_to(side + n);
            pen.line_to(pivot + n);
        }
        Cap::Round => {
            let e = n.rotate_neg_90();
            let side = pivot + e;
            let start = pivot - n;
            let end = pivot + n;
            let d = n * K;
            let e = e * K;
            pen.cubic_to(start + e, side - d, side);
            pen.cubic_to(side + d, end + e, end);
        }
    }
}

/// Adds the shorter circular arc around `pivot` from `pivot + n0` to
/// `pivot + n1`. The two vectors must have equal length.
///
/// The arc is built from up to three 45 degree quadratic pieces followed by
/// a final piece of at most 45 degrees.
fn add_arc(pen: &mut impl Pen, pivot: Point<Fix32>, n0: Point<Fix32>, n1: Point<Fix32>) {
    let r2 = n0.dot(n0).to_bits();
    if r2 < ARC_EPSILON {
        pen.line_to(pivot + n1);
        return;
    }
    // n0 rotated by 45, 90 and 135 degrees
    let m0 = n0.rotate_45();
    let m1 = n0.rotate_90();
    let m2 = m0.rotate_90();
    let dot = |a: Point<Fix32>| a.dot(n1).to_bits();
    let s = if dot(m1) >= 0 {
        if dot(n0) >= 0 {
            if dot(m2) <= 0 {
                n0
            } else {
                pen.quad_to(pivot + n0 + m1 * TAN_PI_8, pivot + m0);
                m0
            }
        } else {
            let pm1 = pivot + m1;
            let n0t = n0 * TAN_PI_8;
            pen.quad_to(pivot + n0 + m1 * TAN_PI_8, pivot + m0);
            pen.quad_to(pm1 + n0t, pm1);
            if dot(m0) >= 0 {
                m1
            } else {
                pen.quad_to(pm1 - n0t, pivot + m2);
                m2
            }
        }
    } else if dot(n0) >= 0 {
        if dot(m0) >= 0 {
            n0
        } else {
            pen.quad_to(pivot + n0 - m1 * TAN_PI_8, pivot - m2);
            -m2
        }
    } else {
        let pm1 = pivot - m1;
        let n0t = n0 * TAN_PI_8;
        pen.quad_to(pivot + n0 - m1 * TAN_PI_8, pivot - m2);
        pen.quad_to(pm1 + n0t, pm1);
        if dot(m2) <= 0 {
            -m1
        } else {
            pen.quad_to(pm1 - n0t, pivot - m0);
            -m0
        }
    };
    // The control point of the final piece lies on the bisector of s and
    // n1. Its distance ranges from 128/256 of |s + n1| when the angle is
    // zero to 150/256 at 45 degrees, where d falls from 256 to 181.
    let d = 256 * s.dot(n1).to_bits() / r2;
    let multiple = Fix32::from_bits((150 - 22 * (d - 181) / (256 - 181)) as i32);
    pen.quad_to(pivot + (s + n1) * multiple, pivot + n1);
}

/// Returns true when the angle between the two vectors exceeds 45 degrees.
fn angle_greater_than_45(v0: Point<Fix32>, v1: Point<Fix32>) -> bool {
    let v = v0.rotate_neg_45();
    v.dot(v1).to_bits() < 0 || v.rotate_90().dot(v1).to_bits() < 0
}

/// Returns `(1 - t) * a + t * b` for `t` in 16.16.
fn interpolate(a: Point<Fix32>, b: Point<Fix32>, t: i64) -> Point<Fix32> {
    let s = 65536 - t;
    let lerp = |a: Fix32, b: Fix32| {
        Fix32::from_bits(((s * a.to_bits() as i64 + t * b.to_bits() as i64) >> 16) as i32)
    };
    Point::new(lerp(a.x, b.x), lerp(a.y, b.y))
}

/// Returns the parameter, in 16.16, at which a quadratic curve turns most
/// sharply.
fn curviest(p0: Point<Fix32>, p1: Point<Fix32>, p2: Point<Fix32>) -> i64 {
    let d = (p1 - p0).map(|v| v.to_bits() as i64);
    let e = Point::new(
        p2.x.to_bits() as i64 - 2 * p1.x.to_bits() as i64 + p0.x.to_bits() as i64,
        p2.y.to_bits() as i64 - 2 * p1.y.to_bits() as i64 + p0.y.to_bits() as i64,
    );
    if e.x == 0 && e.y == 0 {
        return 32768;
    }
    -65536 * (d.x * e.x + d.y * e.y) / (e.x * e.x + e.y * e.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        draw::{AlphaMask, AlphaSrcDrawer, Span},
        raster::Rasterizer,
    };
    use pretty_assertions::assert_eq;

    fn pt(x: f64, y: f64) -> Point<Fix32> {
        Point::new(Fix32::from_f64(x), Fix32::from_f64(y))
    }

    fn polyline(points: &[(f64, f64)]) -> Path {
        let mut path = Path::new();
        path.start(pt(points[0].0, points[0].1));
        for &(x, y) in &points[1..] {
            path.line_to(pt(x, y));
        }
        path
    }

    fn stroke_mask(path: &Path, params: Stroke, size: i32) -> AlphaMask {
        let mut raster = Rasterizer::new(size, size);
        raster.add_stroke(path, &params).unwrap();
        let mut mask = AlphaMask::new(size as usize, size as usize);
        raster.rasterize(&mut AlphaSrcDrawer::new(&mut mask));
        mask
    }

    fn coverage(mask: &AlphaMask) -> f64 {
        mask.pixels.iter().map(|&a| a as f64 / 255.0).sum()
    }

    fn width(px: i32, cap: Cap, join: Join) -> Stroke {
        Stroke::new(Fix32::from_i32(px), cap, join)
    }

    #[test]
    fn butt_capped_line_is_a_rectangle() {
        let path = polyline(&[(2.0, 4.0), (8.0, 4.0)]);
        let mask = stroke_mask(&path, width(2, Cap::Butt, Join::Round), 10);
        for y in 0..10 {
            for x in 0..10 {
                let inside = (2..8).contains(&x) && (3..5).contains(&y);
                assert_eq!(mask.get(x, y), if inside { 255 } else { 0 }, "({x}, {y})");
            }
        }
    }

    #[test]
    fn square_caps_extend_by_half_width() {
        let path = polyline(&[(2.0, 4.0), (8.0, 4.0)]);
        let mask = stroke_mask(&path, width(2, Cap::Square, Join::Round), 10);
        assert_eq!(mask.row(3), [0, 255, 255, 255, 255, 255, 255, 255, 255, 0]);
        assert_eq!(mask.row(4), mask.row(3));
        assert_eq!(mask.row(5), [0; 10]);
    }

    #[test]
    fn round_caps_add_half_discs() {
        let path = polyline(&[(6.0, 8.0), (14.0, 8.0)]);
        let mask = stroke_mask(&path, width(4, Cap::Round, Join::Round), 20);
        // 8x4 rectangle plus a disc of radius 2
        let expected = 32.0 + std::f64::consts::PI * 4.0;
        let actual = coverage(&mask);
        assert!((actual - expected).abs() < 0.3, "{actual} vs {expected}");
    }

    #[test]
    fn joins() {
        let path = polyline(&[(2.0, 2.0), (10.0, 2.0), (10.0, 10.0)]);
        let bevel = stroke_mask(&path, width(2, Cap::Butt, Join::Bevel), 12);
        let round = stroke_mask(&path, width(2, Cap::Butt, Join::Round), 12);
        // Outer corner pixel: half covered by a bevel, a quarter disc when
        // rounded.
        assert!(bevel.get(10, 1).abs_diff(128) <= 2, "{}", bevel.get(10, 1));
        assert!(round.get(10, 1).abs_diff(200) <= 8, "{}", round.get(10, 1));
        // Inner corner is filled either way.
        assert_eq!(bevel.get(9, 3), 255);
        assert_eq!(round.get(9, 3), 255);
        assert_eq!(round.get(9, 8), 255);
        assert_eq!(round.get(11, 1), 0);
    }

    #[test]
    fn turning_the_other_way_rounds_the_right_side() {
        let path = polyline(&[(2.0, 10.0), (10.0, 10.0), (10.0, 2.0)]);
        let round = stroke_mask(&path, width(2, Cap::Butt, Join::Round), 12);
        // Outer corner at the bottom right
        assert!(round.get(10, 10).abs_diff(200) <= 8, "{}", round.get(10, 10));
        assert_eq!(round.get(9, 9), 255);
    }

    #[test]
    fn quadratic_stroke_area() {
        let (p0, c, p1) = ((4.0, 24.0), (16.0, 4.0), (28.0, 24.0));
        let mut path = Path::new();
        path.start(pt(p0.0, p0.1));
        path.quad_to(pt(c.0, c.1), pt(p1.0, p1.1));
        let mask = stroke_mask(&path, width(2, Cap::Butt, Join::Round), 32);
        let eval = |t: f64| {
            let s = 1.0 - t;
            (
                s * s * p0.0 + 2.0 * s * t * c.0 + t * t * p1.0,
                s * s * p0.1 + 2.0 * s * t * c.1 + t * t * p1.1,
            )
        };
        let length: f64 = (0..1000)
            .map(|i| {
                let (a, b) = (eval(i as f64 / 1000.0), eval((i + 1) as f64 / 1000.0));
                (b.0 - a.0).hypot(b.1 - a.1)
            })
            .sum();
        let expected = length * 2.0;
        let actual = coverage(&mask);
        assert!((actual - expected).abs() / expected < 0.04, "{actual} vs {expected}");
    }

    #[test]
    fn path_and_rasterizer_strokes_agree() {
        let path = polyline(&[(3.0, 3.0), (12.0, 5.5), (6.0, 13.0)]);
        let params = width(3, Cap::Round, Join::Round);
        let mut outline = Path::new();
        outline.add_stroke(&path, &params).unwrap();
        assert!(outline.segments().all(|s| s.is_ok()));
        let mut spans = [Vec::new(), Vec::new()];
        let mut raster = Rasterizer::new(16, 16);
        raster.add_path(&outline).unwrap();
        raster.rasterize(&mut |s: &mut [Span], _: bool| spans[0].extend_from_slice(s));
        raster.clear();
        raster.add_stroke(&path, &params).unwrap();
        raster.rasterize(&mut |s: &mut [Span], _: bool| spans[1].extend_from_slice(s));
        assert_eq!(spans[0], spans[1]);
    }

    #[test]
    fn each_subpath_is_stroked() {
        let mut path = polyline(&[(2.0, 2.0), (8.0, 2.0)]);
        path.start(pt(2.0, 8.0));
        path.line_to(pt(8.0, 8.0));
        let mask = stroke_mask(&path, width(2, Cap::Butt, Join::Round), 10);
        assert_eq!(mask.get(4, 1), 255);
        assert_eq!(mask.get(4, 7), 255);
        assert_eq!(mask.get(4, 4), 0);
    }

    #[test]
    fn cubics_are_rejected() {
        let mut path = polyline(&[(0.0, 0.0), (4.0, 0.0)]);
        path.cubic_to(pt(5.0, 1.0), pt(5.0, 2.0), pt(4.0, 3.0));
        let mut out = Path::new();
        assert_eq!(
            out.add_stroke(&path, &Stroke::default()),
            Err(StrokeError::UnsupportedCubic)
        );
        assert!(out.is_empty());
    }

    #[test]
    fn malformed_paths_are_rejected() {
        let mut path = Path::new();
        path.line_to(pt(1.0, 1.0));
        assert_eq!(
            stroke(&mut Path::new(), &path, &Stroke::default()),
            Err(StrokeError::Path(PathError::Malformed(0)))
        );
    }

    #[test]
    fn arc_segments_stay_on_circle() {
        let r = 4.0;
        let n0 = pt(r, 0.0);
        for n1 in [pt(0.0, r), pt(-r, 0.0), pt(0.0, -r), pt(-2.828, -2.828), pt(2.828, 2.828)] {
            let mut arc = Path::new();
            arc.start(n0);
            add_arc(&mut arc, Point::default(), n0, n1);
            assert_eq!(arc.last_point(), Some(n1));
            for segment in arc.segments().skip(1) {
                let p = segment.unwrap().end_point();
                let len = p.x.to_f64().hypot(p.y.to_f64());
                assert!((len - r).abs() < 0.05, "{p} off circle for {n1}");
            }
        }
    }
}
