//! Fixed point math helpers that are specific to TrueType hinting.

use ttrast_types::Point;

pub fn floor(x: i32) -> i32 {
    x & !63
}

pub fn round(x: i32) -> i32 {
    floor(x.wrapping_add(32))
}

pub fn ceil(x: i32) -> i32 {
    floor(x.wrapping_add(63))
}

fn floor_pad(x: i32, n: i32) -> i32 {
    x & !(n - 1)
}

pub fn round_pad(x: i32, n: i32) -> i32 {
    floor_pad(x + n / 2, n)
}

/// Fixed point multiply and divide with rounding: a * b / c
pub fn mul_div(a: i32, b: i32, c: i32) -> i32 {
    let (a, b, c) = (a as i64, b as i64, c as i64);
    let negative = (a < 0) ^ (b < 0) ^ (c < 0);
    let (a, b, c) = (a.abs(), b.abs(), c.abs());
    let d = if c > 0 {
        (a * b + (c >> 1)) / c
    } else {
        0x7FFFFFFF
    };
    let d = d.min(0x7FFFFFFF) as i32;
    if negative {
        -d
    } else {
        d
    }
}

/// Fixed point multiply and divide without rounding: a * b / c
pub fn mul_div_no_round(a: i32, b: i32, c: i32) -> i32 {
    let (a, b, c) = (a as i64, b as i64, c as i64);
    let negative = (a < 0) ^ (b < 0) ^ (c < 0);
    let (a, b, c) = (a.abs(), b.abs(), c.abs());
    let d = if c > 0 { a * b / c } else { 0x7FFFFFFF };
    let d = d.min(0x7FFFFFFF) as i32;
    if negative {
        -d
    } else {
        d
    }
}

/// Multiplication for 2.14 fixed point.
pub fn mul14(a: i32, b: i32) -> i32 {
    let mut v = a as i64 * b as i64;
    v += 0x2000 + (v >> 63);
    (v >> 14) as i32
}

/// Projects a vector onto a 2.14 unit vector.
pub fn dot14(v: Point<i32>, unit: Point<i32>) -> i32 {
    ((v.x as i64 * unit.x as i64 + v.y as i64 * unit.y as i64 + 0x2000) >> 14) as i32
}

/// Returns the 2.14 unit vector in the direction of (x, y), or the x axis
/// for a zero vector.
pub fn normalize14(x: i32, y: i32) -> Point<i32> {
    if x == 0 && y == 0 {
        return Point::new(0x4000, 0);
    }
    let len = (x as f64).hypot(y as f64);
    Point::new(
        (x as f64 * 16384.0 / len).round() as i32,
        (y as f64 * 16384.0 / len).round() as i32,
    )
}
