use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use crate::{Fix32, Fix64};

/// Two dimensional point with a generic coordinate type.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Point<T> {
    /// X coordinate.
    pub x: T,
    /// Y coordinate.
    pub y: T,
}

impl<T> Point<T> {
    /// Creates a new point with the given x and y coordinates.
    #[inline(always)]
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    /// Creates a new point from a single value assigned to both coordinates.
    pub const fn broadcast(xy: T) -> Self
    where
        T: Copy,
    {
        Self { x: xy, y: xy }
    }

    /// Maps `Point<T>` to `Point<U>` by applying a function to each coordinate.
    #[inline(always)]
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Point<U> {
        Point {
            x: f(self.x),
            y: f(self.y),
        }
    }
}

impl<T> Add for Point<T>
where
    T: Add<Output = T>,
{
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl<T> AddAssign for Point<T>
where
    T: AddAssign,
{
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl<T> Sub for Point<T>
where
    T: Sub<Output = T>,
{
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl<T> SubAssign for Point<T>
where
    T: SubAssign,
{
    #[inline(always)]
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl<T> Mul<T> for Point<T>
where
    T: Mul<Output = T> + Copy,
{
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: T) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl<T> Neg for Point<T>
where
    T: Neg<Output = T>,
{
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// 1/sqrt(2) in 24.8.
const FRAC_1_SQRT_2: i64 = 181;

/// Vector operations on rasterizer coordinates.
///
/// Rotations are in the rasterizer's y-down space: rotating `(1, 0)` by 90
/// degrees yields `(0, 1)`.
impl Point<Fix32> {
    /// Creates a point from integer pixel coordinates.
    pub const fn from_pixels(x: i32, y: i32) -> Self {
        Self::new(Fix32::from_i32(x), Fix32::from_i32(y))
    }

    /// Returns the dot product as a 48.16 value.
    pub fn dot(self, other: Self) -> Fix64 {
        let x0 = self.x.to_bits() as i64;
        let y0 = self.y.to_bits() as i64;
        let x1 = other.x.to_bits() as i64;
        let y1 = other.y.to_bits() as i64;
        Fix64::from_bits(x0 * x1 + y0 * y1)
    }

    /// Returns the Euclidean length of the vector.
    pub fn len(self) -> Fix32 {
        let x = self.x.to_bits() as f64;
        let y = self.y.to_bits() as f64;
        Fix32::from_bits((x * x + y * y).sqrt() as i32)
    }

    /// Returns a vector in the same direction with the given length.
    ///
    /// The zero vector normalizes to the zero vector.
    pub fn normalize(self, length: Fix32) -> Self {
        let len = self.len().to_bits() as i64;
        if len == 0 {
            return Self::default();
        }
        let s = length.to_bits() as i64;
        Self::new(
            Fix32::from_bits((self.x.to_bits() as i64 * s / len) as i32),
            Fix32::from_bits((self.y.to_bits() as i64 * s / len) as i32),
        )
    }

    /// Returns the larger of the absolute x and y components.
    pub fn max_abs(self) -> Fix32 {
        self.x.abs().max(self.y.abs())
    }

    pub fn rotate_45(self) -> Self {
        let (x, y) = self.wide();
        Self::narrow((x - y) * FRAC_1_SQRT_2 / 256, (x + y) * FRAC_1_SQRT_2 / 256)
    }

    pub fn rotate_90(self) -> Self {
        Self::new(-self.y, self.x)
    }

    pub fn rotate_135(self) -> Self {
        let (x, y) = self.wide();
        Self::narrow((-x - y) * FRAC_1_SQRT_2 / 256, (x - y) * FRAC_1_SQRT_2 / 256)
    }

    pub fn rotate_neg_45(self) -> Self {
        let (x, y) = self.wide();
        Self::narrow((x + y) * FRAC_1_SQRT_2 / 256, (y - x) * FRAC_1_SQRT_2 / 256)
    }

    pub fn rotate_neg_90(self) -> Self {
        Self::new(self.y, -self.x)
    }

    pub fn rotate_neg_135(self) -> Self {
        let (x, y) = self.wide();
        Self::narrow((y - x) * FRAC_1_SQRT_2 / 256, (-x - y) * FRAC_1_SQRT_2 / 256)
    }

    /// Returns the midpoint of the segment between two points.
    pub fn midpoint(self, other: Self) -> Self {
        Self::new(
            Fix32::from_bits((self.x.to_bits() + other.x.to_bits()) / 2),
            Fix32::from_bits((self.y.to_bits() + other.y.to_bits()) / 2),
        )
    }

    fn wide(self) -> (i64, i64) {
        (self.x.to_bits() as i64, self.y.to_bits() as i64)
    }

    fn narrow(x: i64, y: i64) -> Self {
        Self::new(Fix32::from_bits(x as i32), Fix32::from_bits(y as i32))
    }
}

impl std::fmt::Display for Point<Fix32> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::Point;
    use crate::{F26Dot6, Fix32, Fix64};

    fn fix(x: i32, y: i32) -> Point<Fix32> {
        Point::new(Fix32::from_bits(x), Fix32::from_bits(y))
    }

    #[test]
    fn map() {
        assert_eq!(
            Point::new(42.5, 20.1).map(F26Dot6::from_f64),
            Point::new(F26Dot6::from_f64(42.5), F26Dot6::from_f64(20.1))
        );
    }

    #[test]
    fn add_sub_neg() {
        assert_eq!(Point::new(1, 2) + Point::new(3, 4), Point::new(4, 6));
        let mut point = Point::new(1, 2);
        point -= Point::new(3, 4);
        assert_eq!(point, Point::new(-2, -2));
        assert_eq!(-Point::new(1, -2), Point::new(-1, 2));
    }

    #[test]
    fn dot_and_len() {
        let a = fix(3 * 256, 4 * 256);
        assert_eq!(a.len(), Fix32::from_i32(5));
        assert_eq!(a.dot(a), Fix64::from_bits(25 * 65536));
        assert_eq!(fix(256, 0).dot(fix(0, 256)), Fix64::ZERO);
    }

    #[test]
    fn normalize() {
        let a = fix(3 * 256, 4 * 256);
        assert_eq!(a.normalize(Fix32::from_i32(10)), fix(6 * 256, 8 * 256));
        assert_eq!(fix(0, 0).normalize(Fix32::ONE), fix(0, 0));
    }

    #[test]
    fn rotations() {
        let x = fix(256, 0);
        assert_eq!(x.rotate_90(), fix(0, 256));
        assert_eq!(x.rotate_neg_90(), fix(0, -256));
        assert_eq!(x.rotate_45(), fix(181, 181));
        assert_eq!(x.rotate_neg_45(), fix(181, -181));
        assert_eq!(x.rotate_135(), fix(-181, 181));
        assert_eq!(x.rotate_neg_135(), fix(-181, -181));
        assert_eq!(x.rotate_90().rotate_neg_90(), x);
    }

    #[test]
    fn scale_by_fix32() {
        assert_eq!(fix(512, -512) * Fix32::from_bits(128), fix(256, -256));
    }

    #[test]
    fn display() {
        assert_eq!(fix(256 + 1, -2).to_string(), "(1:001, -0:002)");
    }
}
