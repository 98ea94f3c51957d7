//! Encoded paths and the pen interface shared by the rasterizer and the
//! stroker.

use std::fmt;

use ttrast_types::{Fix32, Point};

use crate::{error::PathError, glyph::FontPoint, glyph::Glyph};

/// Interface for accepting a sequence of path commands in 24.8 pixel space.
///
/// Subpaths are implicitly closed by the consumer; there is no explicit
/// close command.
pub trait Pen {
    /// Begins a new subpath at `p`.
    fn start(&mut self, p: Point<Fix32>);

    /// Adds a line segment from the current point to `p`.
    fn line_to(&mut self, p: Point<Fix32>);

    /// Adds a quadratic bezier from the current point to `p` with control
    /// point `c`.
    fn quad_to(&mut self, c: Point<Fix32>, p: Point<Fix32>);

    /// Adds a cubic bezier from the current point to `p` with control points
    /// `c0` and `c1`.
    fn cubic_to(&mut self, c0: Point<Fix32>, c1: Point<Fix32>, p: Point<Fix32>);
}

impl<P: Pen + ?Sized> Pen for &mut P {
    fn start(&mut self, p: Point<Fix32>) {
        (**self).start(p)
    }

    fn line_to(&mut self, p: Point<Fix32>) {
        (**self).line_to(p)
    }

    fn quad_to(&mut self, c: Point<Fix32>, p: Point<Fix32>) {
        (**self).quad_to(c, p)
    }

    fn cubic_to(&mut self, c0: Point<Fix32>, c1: Point<Fix32>, p: Point<Fix32>) {
        (**self).cubic_to(c0, c1, p)
    }
}

/// Single element of a path.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PathSegment {
    Start(Point<Fix32>),
    Line(Point<Fix32>),
    Quad(Point<Fix32>, Point<Fix32>),
    Cubic(Point<Fix32>, Point<Fix32>, Point<Fix32>),
}

impl PathSegment {
    /// The point at which the segment ends.
    pub fn end_point(&self) -> Point<Fix32> {
        match *self {
            Self::Start(p) | Self::Line(p) | Self::Quad(_, p) | Self::Cubic(_, _, p) => p,
        }
    }

    fn apply(&self, pen: &mut impl Pen) {
        match *self {
            Self::Start(p) => pen.start(p),
            Self::Line(p) => pen.line_to(p),
            Self::Quad(c, p) => pen.quad_to(c, p),
            Self::Cubic(c0, c1, p) => pen.cubic_to(c0, c1, p),
        }
    }
}

const START: i32 = 0;
const LINE: i32 = 1;
const QUAD: i32 = 2;
const CUBIC: i32 = 3;

/// Number of words in an encoded segment, including both tags.
fn encoded_len(tag: i32) -> Option<usize> {
    match tag {
        START | LINE => Some(4),
        QUAD => Some(6),
        CUBIC => Some(8),
        _ => None,
    }
}

/// An append-only sequence of path segments.
///
/// Each segment is stored as its tag, its coordinates and then the tag
/// again, so the stream can be walked in either direction.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Path {
    data: Vec<Fix32>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The encoded words of the path.
    pub fn data(&self) -> &[Fix32] {
        &self.data
    }

    /// Returns an iterator over the decoded segments.
    pub fn segments(&self) -> Segments<'_> {
        Segments {
            data: &self.data,
            pos: 0,
        }
    }

    /// The first point of the path, if any.
    pub fn first_point(&self) -> Option<Point<Fix32>> {
        Some(Point::new(*self.data.get(1)?, *self.data.get(2)?))
    }

    /// The end point of the final segment, if any.
    pub fn last_point(&self) -> Option<Point<Fix32>> {
        let len = self.data.len();
        if len < 3 {
            return None;
        }
        Some(Point::new(self.data[len - 3], self.data[len - 2]))
    }

    /// Replays every segment of this path into `pen`.
    pub fn replay(&self, pen: &mut impl Pen) -> Result<(), PathError> {
        for segment in self.segments() {
            segment?.apply(pen);
        }
        Ok(())
    }

    /// Appends the segments of `other` to this path.
    pub fn add_path(&mut self, other: &Path) -> Result<(), PathError> {
        other.replay(self)
    }

    /// Replays this path backwards into `pen`, tracing each segment from its
    /// end point to its start point.
    ///
    /// The path must consist of a single subpath. The initial start
    /// command is not emitted, so the reversed segments extend the pen's
    /// current subpath, which is expected to end at this path's last point.
    pub fn replay_reversed(&self, pen: &mut impl Pen) -> Result<(), PathError> {
        let data = &self.data;
        let mut end = data.len();
        while end > 0 {
            let tag_ix = end - 1;
            let tag = data[tag_ix].to_bits();
            let len = encoded_len(tag).ok_or(PathError::Malformed(tag_ix))?;
            if tag == START {
                return Ok(());
            }
            let start = end.checked_sub(len).ok_or(PathError::Malformed(tag_ix))?;
            if data[start].to_bits() != tag {
                return Err(PathError::Malformed(start));
            }
            // The previous segment's end point precedes our leading tag.
            if start < 3 {
                return Err(PathError::Malformed(start));
            }
            let prev = Point::new(data[start - 3], data[start - 2]);
            let at = |ix: usize| Point::new(data[start + ix], data[start + ix + 1]);
            match tag {
                LINE => pen.line_to(prev),
                QUAD => pen.quad_to(at(1), prev),
                _ => pen.cubic_to(at(3), at(1), prev),
            }
            end = start;
        }
        Ok(())
    }

    fn push(&mut self, tag: i32, points: &[Point<Fix32>]) {
        self.data.push(Fix32::from_bits(tag));
        for p in points {
            self.data.extend([p.x, p.y]);
        }
        self.data.push(Fix32::from_bits(tag));
    }
}

impl Pen for Path {
    fn start(&mut self, p: Point<Fix32>) {
        self.push(START, &[p]);
    }

    fn line_to(&mut self, p: Point<Fix32>) {
        self.push(LINE, &[p]);
    }

    fn quad_to(&mut self, c: Point<Fix32>, p: Point<Fix32>) {
        self.push(QUAD, &[c, p]);
    }

    fn cubic_to(&mut self, c0: Point<Fix32>, c1: Point<Fix32>, p: Point<Fix32>) {
        self.push(CUBIC, &[c0, c1, p]);
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

/// Formats the path as SVG-like commands.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match segment {
                Err(e) => return write!(f, "<{e}>"),
                Ok(PathSegment::Start(p)) => write!(f, "M{p}")?,
                Ok(PathSegment::Line(p)) => write!(f, "L{p}")?,
                Ok(PathSegment::Quad(c, p)) => write!(f, "Q{c}{p}")?,
                Ok(PathSegment::Cubic(c0, c1, p)) => write!(f, "C{c0}{c1}{p}")?,
            }
        }
        Ok(())
    }
}

/// Iterator over the segments of a [`Path`].
#[derive(Clone)]
pub struct Segments<'a> {
    data: &'a [Fix32],
    pos: usize,
}

impl Iterator for Segments<'_> {
    type Item = Result<PathSegment, PathError>;

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.pos;
        let tag = self.data.get(pos)?.to_bits();
        let Some(words) = encoded_len(tag)
            .and_then(|len| self.data.get(pos..pos + len))
            .filter(|words| words[words.len() - 1].to_bits() == tag)
        else {
            // Stop after reporting the error.
            self.pos = self.data.len();
            return Some(Err(PathError::Malformed(pos)));
        };
        self.pos += words.len();
        let at = |ix: usize| Point::new(words[ix], words[ix + 1]);
        Some(Ok(match tag {
            START => PathSegment::Start(at(1)),
            LINE => PathSegment::Line(at(1)),
            QUAD => PathSegment::Quad(at(1), at(3)),
            _ => PathSegment::Cubic(at(1), at(3), at(5)),
        }))
    }
}

/// Sends the contours of a glyph to `pen`.
///
/// Points are converted from 26.6 y-up glyph space to 24.8 y-down pixel
/// space, with the glyph origin placed at `origin`.
pub fn draw_glyph(glyph: &Glyph, origin: Point<Fix32>, pen: &mut impl Pen) {
    for contour in glyph.contours() {
        draw_contour(contour, origin, pen);
    }
}

/// Sends a single closed contour of quadratic glyph points to `pen`.
///
/// If the first point is off-curve, the contour starts at the last point
/// when that is on-curve and at the implied midpoint of the two otherwise.
pub fn draw_contour(points: &[FontPoint], origin: Point<Fix32>, pen: &mut impl Pen) {
    let to_pixels = |p: &FontPoint| {
        Point::new(
            origin.x + Fix32::from_bits(p.x << 2),
            origin.y - Fix32::from_bits(p.y << 2),
        )
    };
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    let p0 = to_pixels(first);
    let (start, others) = if first.flags.is_on_curve() {
        (p0, rest)
    } else {
        match rest.split_last() {
            // The first point becomes the control of the first segment.
            Some((last, init)) if last.flags.is_on_curve() => (to_pixels(last), init),
            Some((last, _)) => (p0.midpoint(to_pixels(last)), rest),
            None => (p0, rest),
        }
    };
    pen.start(start);
    let mut prev = (p0, first.flags.is_on_curve());
    emit_points(others, &mut prev, &to_pixels, pen);
    close(prev, start, pen);
}

/// Emits segments for a run of points, tracking the previous point and
/// whether it was on-curve.
fn emit_points(
    points: &[FontPoint],
    prev: &mut (Point<Fix32>, bool),
    to_pixels: &impl Fn(&FontPoint) -> Point<Fix32>,
    pen: &mut impl Pen,
) {
    for point in points {
        let p = to_pixels(point);
        let (q, q_on) = *prev;
        if point.flags.is_on_curve() {
            if q_on {
                pen.line_to(p);
            } else {
                pen.quad_to(q, p);
            }
        } else if !q_on {
            pen.quad_to(q, q.midpoint(p));
        }
        *prev = (p, point.flags.is_on_curve());
    }
}

fn close((q, q_on): (Point<Fix32>, bool), start: Point<Fix32>, pen: &mut impl Pen) {
    if q_on {
        pen.line_to(start);
    } else {
        pen.quad_to(q, start);
    }
}
