//! Anti-aliased scanline rasterizer.
//!
//! Each line segment adds signed area and vertical coverage to the pixel
//! cells it crosses, computed exactly from the sub-pixel geometry. Cells
//! live in an arena and are chained per scanline in increasing x order, so
//! emitting spans is a single left to right walk of each row.
//!
//! Coordinates are 24.8 fixed point pixels with y increasing downwards.
//! Curves are flattened by recursive subdivision before accumulation.
//!
//! See <http://projects.tuxee.net/cl-vectors/section-the-cl-aa-algorithm>

use ttrast_types::{Fix32, Point};

use crate::{
    draw::{Drawer, Span},
    error::{PathError, StrokeError},
    path::{Path, Pen},
    stroke::{self, Stroke},
};

/// Number of spans handed to a drawer at once.
const SPAN_BATCH: usize = 64;

/// Maximum depth of curve subdivision.
const MAX_SPLITS: usize = 16;

/// Rule for deciding which regions of a self-overlapping path are inside.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

#[derive(Copy, Clone, Debug)]
struct Cell {
    xi: i32,
    area: i32,
    cover: i32,
    next: Option<usize>,
}

/// Converts paths into horizontal alpha spans.
///
/// Paths are added through the [`Pen`] interface and accumulate until
/// [`clear`](Self::clear) is called, so several shapes may be combined into
/// one rasterization. Subpaths are closed automatically.
#[derive(Clone, Debug)]
pub struct Rasterizer {
    pub fill_rule: FillRule,
    /// Translation applied to emitted spans.
    pub offset: Point<i32>,
    width: i32,
    split_scale_2: i64,
    split_scale_3: i64,
    pen: Point<Fix32>,
    subpath_start: Point<Fix32>,
    // Current cell and its pending accumulation.
    xi: i32,
    yi: i32,
    area: i32,
    cover: i32,
    cells: Vec<Cell>,
    // Index of the first cell in each row.
    rows: Vec<Option<usize>>,
    spans: Vec<Span>,
}

impl Rasterizer {
    /// Creates a rasterizer that clips output to `width` by `height` pixels.
    pub fn new(width: i32, height: i32) -> Self {
        let mut raster = Self {
            fill_rule: FillRule::default(),
            offset: Point::default(),
            width: 0,
            split_scale_2: 0,
            split_scale_3: 0,
            pen: Point::default(),
            subpath_start: Point::default(),
            xi: 0,
            yi: 0,
            area: 0,
            cover: 0,
            cells: Vec::with_capacity(256),
            rows: Vec::new(),
            spans: Vec::with_capacity(SPAN_BATCH),
        };
        raster.set_bounds(width, height);
        raster
    }

    /// Resizes the clip area and clears any accumulated paths.
    ///
    /// Larger areas flatten curves more coarsely.
    pub fn set_bounds(&mut self, width: i32, height: i32) {
        let width = width.max(0);
        let height = height.max(0);
        let (mut ss2, mut ss3) = (128, 64);
        if width > 24 || height > 24 {
            ss2 *= 2;
            ss3 *= 2;
            if width > 120 || height > 120 {
                ss2 *= 2;
                ss3 *= 2;
            }
        }
        self.width = width;
        self.split_scale_2 = ss2;
        self.split_scale_3 = ss3;
        self.rows.clear();
        self.rows.resize(height as usize, None);
        self.clear();
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.rows.len() as i32
    }

    /// Discards all accumulated paths.
    pub fn clear(&mut self) {
        self.pen = Point::default();
        self.subpath_start = Point::default();
        self.xi = 0;
        self.yi = 0;
        self.area = 0;
        self.cover = 0;
        self.cells.clear();
        self.rows.fill(None);
    }

    /// Adds every segment of `path`.
    pub fn add_path(&mut self, path: &Path) -> Result<(), PathError> {
        path.replay(self)
    }

    /// Adds the outline of `path` stroked with the given parameters.
    pub fn add_stroke(&mut self, path: &Path, params: &Stroke) -> Result<(), StrokeError> {
        stroke::stroke(self, path, params)
    }

    /// Sends the accumulated coverage to `drawer` as spans.
    ///
    /// Spans are non-overlapping, sorted by y and then x, and clipped to the
    /// bounds before the offset is applied. The final batch ends with an all
    /// zero span.
    pub fn rasterize<D: Drawer + ?Sized>(&mut self, drawer: &mut D) {
        self.close_subpath();
        self.save_cell();
        let mut spans = std::mem::take(&mut self.spans);
        spans.clear();
        for (yi, head) in self.rows.iter().enumerate() {
            let y = yi as i32 + self.offset.y;
            let mut xi = 0;
            let mut cover = 0;
            let mut next = *head;
            while let Some(ix) = next {
                let cell = self.cells[ix];
                if cover != 0 && cell.xi > xi {
                    let alpha = self.area_to_alpha(cover * 512);
                    self.push_span(&mut spans, y, xi, cell.xi, alpha);
                }
                cover += cell.cover;
                let alpha = self.area_to_alpha(cover * 512 - cell.area);
                xi = cell.xi + 1;
                self.push_span(&mut spans, y, cell.xi, xi, alpha);
                if spans.len() > SPAN_BATCH - 2 {
                    drawer.draw(&mut spans, false);
                    spans.clear();
                }
                next = cell.next;
            }
        }
        spans.push(Span::default());
        drawer.draw(&mut spans, true);
        self.spans = spans;
    }

    fn push_span(&self, spans: &mut Vec<Span>, y: i32, x0: i32, x1: i32, alpha: u32) {
        if alpha == 0 {
            return;
        }
        let x0 = x0.max(0);
        let x1 = x1.min(self.width);
        if x0 < x1 {
            spans.push(Span::new(y, x0 + self.offset.x, x1 + self.offset.x, alpha));
        }
    }

    /// Converts twice the covered area to a packed alpha value.
    fn area_to_alpha(&self, area: i32) -> u32 {
        let alpha = ((area + 1) >> 1).unsigned_abs();
        let alpha = match self.fill_rule {
            FillRule::NonZero => alpha.min(0xFFFF),
            FillRule::EvenOdd => match alpha & 0x1FFFF {
                a if a > 0x10000 => 0x20000 - a,
                0x10000 => 0xFFFF,
                a => a,
            },
        };
        alpha | alpha << 16
    }

    /// Returns the arena index for the current cell, creating it if needed.
    ///
    /// Cells outside the vertical bounds are dropped. Horizontally they are
    /// clamped to `-1..=width` so coverage left of the clip is still
    /// counted.
    fn find_cell(&mut self) -> Option<usize> {
        let yi = usize::try_from(self.yi).ok()?;
        let mut next = *self.rows.get(yi)?;
        let xi = self.xi.clamp(-1, self.width);
        let mut prev = None;
        while let Some(ix) = next {
            let cell = &self.cells[ix];
            if cell.xi == xi {
                return Some(ix);
            }
            if cell.xi > xi {
                break;
            }
            prev = Some(ix);
            next = cell.next;
        }
        let ix = self.cells.len();
        self.cells.push(Cell {
            xi,
            area: 0,
            cover: 0,
            next,
        });
        match prev {
            Some(prev) => self.cells[prev].next = Some(ix),
            None => self.rows[yi] = Some(ix),
        }
        Some(ix)
    }

    fn save_cell(&mut self) {
        if self.area != 0 || self.cover != 0 {
            if let Some(ix) = self.find_cell() {
                let cell = &mut self.cells[ix];
                cell.area += self.area;
                cell.cover += self.cover;
            }
            self.area = 0;
            self.cover = 0;
        }
    }

    fn set_cell(&mut self, xi: i32, yi: i32) {
        if self.xi != xi || self.yi != yi {
            self.save_cell();
            self.xi = xi;
            self.yi = yi;
        }
    }

    /// Accumulates a segment within scanline `yi`, from `x0` to `x1` in
    /// 24.8 and from `y0f` to `y1f` in fractional units of the row.
    fn scan(&mut self, yi: i32, x0: i32, y0f: i32, x1: i32, y1f: i32) {
        let x0i = x0 >> 8;
        let x0f = x0 & 0xFF;
        let x1i = x1 >> 8;
        let x1f = x1 & 0xFF;
        if y0f == y1f {
            self.set_cell(x1i, yi);
            return;
        }
        let dy = y1f - y0f;
        if x0i == x1i {
            self.area += (x0f + x1f) * dy;
            self.cover += dy;
            return;
        }
        // The first and last cells are partially crossed; every cell between
        // them is crossed over its full width.
        let dx = x1 as i64 - x0 as i64;
        let (p, q, edge0, edge1, xi_delta) = if dx > 0 {
            ((256 - x0f) as i64 * dy as i64, dx, 0, 256, 1)
        } else {
            (x0f as i64 * dy as i64, -dx, 256, 0, -1)
        };
        let mut y_delta = p.div_euclid(q) as i32;
        let mut y_rem = p.rem_euclid(q);
        let mut xi = x0i;
        let mut y = y0f;
        self.area += (x0f + edge1) * y_delta;
        self.cover += y_delta;
        xi += xi_delta;
        y += y_delta;
        self.set_cell(xi, yi);
        if xi != x1i {
            let p = 256 * (y1f - y + y_delta) as i64;
            let full_delta = p.div_euclid(q) as i32;
            let full_rem = p.rem_euclid(q);
            y_rem -= q;
            while xi != x1i {
                y_delta = full_delta;
                y_rem += full_rem;
                if y_rem >= 0 {
                    y_delta += 1;
                    y_rem -= q;
                }
                self.area += 256 * y_delta;
                self.cover += y_delta;
                xi += xi_delta;
                y += y_delta;
                self.set_cell(xi, yi);
            }
        }
        let y_delta = y1f - y;
        self.area += (edge0 + x1f) * y_delta;
        self.cover += y_delta;
    }

    fn add_line(&mut self, to: Point<Fix32>) {
        let (x0, y0) = (self.pen.x.to_bits(), self.pen.y.to_bits());
        let (x1, y1) = (to.x.to_bits(), to.y.to_bits());
        let y0i = y0 >> 8;
        let y0f = y0 & 0xFF;
        let y1i = y1 >> 8;
        let y1f = y1 & 0xFF;
        let dx = x1 as i64 - x0 as i64;
        let dy = y1 as i64 - y0 as i64;
        if y0i == y1i {
            self.scan(y0i, x0, y0f, x1, y1f);
        } else if dx == 0 {
            // Vertical lines touch a single column.
            let (edge0, edge1, yi_delta) = if dy > 0 { (0, 256, 1) } else { (256, 0, -1) };
            let x0i = x0 >> 8;
            let x0f_2 = (x0 & 0xFF) * 2;
            let mut yi = y0i;
            let dcover = edge1 - y0f;
            self.area += x0f_2 * dcover;
            self.cover += dcover;
            yi += yi_delta;
            self.set_cell(x0i, yi);
            let dcover = edge1 - edge0;
            while yi != y1i {
                self.area += x0f_2 * dcover;
                self.cover += dcover;
                yi += yi_delta;
                self.set_cell(x0i, yi);
            }
            let dcover = y1f - edge0;
            self.area += x0f_2 * dcover;
            self.cover += dcover;
        } else {
            // The first and last scanlines are partially crossed; every row
            // between them is crossed over its full height.
            let (p, q, edge0, edge1, yi_delta) = if dy > 0 {
                ((256 - y0f) as i64 * dx, dy, 0, 256, 1)
            } else {
                (y0f as i64 * dx, -dy, 256, 0, -1)
            };
            let mut x_delta = p.div_euclid(q);
            let mut x_rem = p.rem_euclid(q);
            let mut x = x0 as i64;
            let mut yi = y0i;
            self.scan(yi, x as i32, y0f, (x + x_delta) as i32, edge1);
            x += x_delta;
            yi += yi_delta;
            self.set_cell((x >> 8) as i32, yi);
            if yi != y1i {
                let p = 256 * dx;
                let full_delta = p.div_euclid(q);
                let full_rem = p.rem_euclid(q);
                x_rem -= q;
                while yi != y1i {
                    x_delta = full_delta;
                    x_rem += full_rem;
                    if x_rem >= 0 {
                        x_delta += 1;
                        x_rem -= q;
                    }
                    self.scan(yi, x as i32, edge0, (x + x_delta) as i32, edge1);
                    x += x_delta;
                    yi += yi_delta;
                    self.set_cell((x >> 8) as i32, yi);
                }
            }
            self.scan(yi, x as i32, edge0, x1, y1f);
        }
        self.pen = to;
    }

    fn close_subpath(&mut self) {
        if self.pen != self.subpath_start {
            self.add_line(self.subpath_start);
        }
    }
}

impl Pen for Rasterizer {
    fn start(&mut self, p: Point<Fix32>) {
        self.close_subpath();
        self.set_cell(p.x.to_bits() >> 8, p.y.to_bits() >> 8);
        self.pen = p;
        self.subpath_start = p;
    }

    fn line_to(&mut self, p: Point<Fix32>) {
        self.add_line(p);
    }

    /// Flattens the curve into pairs of lines, splitting more often the
    /// further the control point lies from the chord midpoint.
    fn quad_to(&mut self, c: Point<Fix32>, p: Point<Fix32>) {
        let dev = max_abs(second_difference(self.pen, c, p)) / self.split_scale_2;
        let splits = split_count(dev, 0, 4, 0);
        // Pieces are stored end first so each split pushes the half nearer
        // the start on top.
        let mut points = [Point::<Fix32>::default(); 2 * MAX_SPLITS + 3];
        let mut levels = [0usize; MAX_SPLITS + 1];
        points[0] = p;
        points[1] = c;
        points[2] = self.pen;
        levels[0] = splits;
        let mut top = 0;
        loop {
            let level = levels[top];
            let pt = &mut points[2 * top..];
            if level > 0 {
                let ctrl = pt[1];
                pt[4] = pt[2];
                pt[3] = pt[4].midpoint(ctrl);
                pt[1] = pt[0].midpoint(ctrl);
                pt[2] = pt[1].midpoint(pt[3]);
                levels[top] = level - 1;
                top += 1;
                levels[top] = level - 1;
            } else {
                let mid = Point::new(
                    quarter_sum(pt[0].x, pt[1].x, pt[2].x),
                    quarter_sum(pt[0].y, pt[1].y, pt[2].y),
                );
                let end = pt[0];
                self.add_line(mid);
                self.add_line(end);
                if top == 0 {
                    break;
                }
                top -= 1;
            }
        }
    }

    /// Flattens the curve with the same subdivision scheme as quadratics,
    /// driven by both the second and third differences of the control
    /// polygon.
    fn cubic_to(&mut self, c0: Point<Fix32>, c1: Point<Fix32>, p: Point<Fix32>) {
        let start = self.pen;
        let dev_2 = max_abs(second_difference(start, c0, c1))
            .max(max_abs(second_difference(c0, c1, p)))
            / self.split_scale_2;
        let third = Point::new(
            start.x.to_bits() as i64 - 3 * c0.x.to_bits() as i64 + 3 * c1.x.to_bits() as i64
                - p.x.to_bits() as i64,
            start.y.to_bits() as i64 - 3 * c0.y.to_bits() as i64 + 3 * c1.y.to_bits() as i64
                - p.y.to_bits() as i64,
        );
        let dev_3 = max_abs(third) / self.split_scale_3;
        let splits = split_count(dev_2, dev_3, 4, 8);
        let mut points = [Point::<Fix32>::default(); 3 * MAX_SPLITS + 4];
        let mut levels = [0usize; MAX_SPLITS + 1];
        points[0] = p;
        points[1] = c1;
        points[2] = c0;
        points[3] = start;
        levels[0] = splits;
        let mut top = 0;
        loop {
            let level = levels[top];
            let pt = &mut points[3 * top..];
            if level > 0 {
                let p01 = pt[0].midpoint(pt[1]);
                let p12 = pt[1].midpoint(pt[2]);
                let p23 = pt[2].midpoint(pt[3]);
                pt[6] = pt[3];
                pt[5] = p23;
                pt[1] = p01;
                pt[2] = p01.midpoint(p12);
                pt[4] = p12.midpoint(p23);
                pt[3] = pt[2].midpoint(pt[4]);
                levels[top] = level - 1;
                top += 1;
                levels[top] = level - 1;
            } else {
                let mid = Point::new(
                    eighth_sum(pt[0].x, pt[1].x, pt[2].x, pt[3].x),
                    eighth_sum(pt[0].y, pt[1].y, pt[2].y, pt[3].y),
                );
                let end = pt[0];
                self.add_line(mid);
                self.add_line(end);
                if top == 0 {
                    break;
                }
                top -= 1;
            }
        }
    }
}

fn second_difference(a: Point<Fix32>, b: Point<Fix32>, c: Point<Fix32>) -> Point<i64> {
    let d = |a: Fix32, b: Fix32, c: Fix32| {
        a.to_bits() as i64 - 2 * b.to_bits() as i64 + c.to_bits() as i64
    };
    Point::new(d(a.x, b.x, c.x), d(a.y, b.y, c.y))
}

fn max_abs(p: Point<i64>) -> i64 {
    p.x.abs().max(p.y.abs())
}

/// `(a + 2b + c) / 4`, the midpoint of a quadratic curve.
fn quarter_sum(a: Fix32, b: Fix32, c: Fix32) -> Fix32 {
    let sum = a.to_bits() as i64 + 2 * b.to_bits() as i64 + c.to_bits() as i64;
    Fix32::from_bits((sum / 4) as i32)
}

/// `(a + 3b + 3c + d) / 8`, the midpoint of a cubic curve.
fn eighth_sum(a: Fix32, b: Fix32, c: Fix32, d: Fix32) -> Fix32 {
    let sum = a.to_bits() as i64
        + 3 * (b.to_bits() as i64 + c.to_bits() as i64)
        + d.to_bits() as i64;
    Fix32::from_bits((sum / 8) as i32)
}

/// Counts the halvings needed to bring both deviations to zero, where each
/// halving divides them by the given factors.
fn split_count(mut dev_a: i64, mut dev_b: i64, factor_a: i64, factor_b: i64) -> usize {
    let mut splits = 0;
    while (dev_a > 0 || dev_b > 0) && splits < MAX_SPLITS {
        dev_a /= factor_a;
        if factor_b != 0 {
            dev_b /= factor_b;
        }
        splits += 1;
    }
    splits
}
