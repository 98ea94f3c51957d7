//! fixed-point numerical types

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

// shared between all fixed point types
macro_rules! fixed_impl {
    ($name:ident, $bits:literal, $fract_bits:literal, $ty:ty, $wide:ty) => {
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "bytemuck", derive(bytemuck_derive::Zeroable, bytemuck_derive::Pod))]
        #[repr(transparent)]
        #[doc = concat!(stringify!($bits), "-bit signed fixed point number with ", stringify!($fract_bits), " bits of fraction." )]
        pub struct $name($ty);

        impl $name {
            /// Minimum value.
            pub const MIN: Self = Self(<$ty>::MIN);

            /// Maximum value.
            pub const MAX: Self = Self(<$ty>::MAX);

            /// This type's smallest representable value
            pub const EPSILON: Self = Self(1);

            /// Representation of 0.0.
            pub const ZERO: Self = Self(0);

            /// Representation of 1.0.
            pub const ONE: Self = Self(1 << $fract_bits);

            const INT_MASK: $ty = !0 << $fract_bits;
            const ROUND: $ty = 1 << ($fract_bits - 1);
            const FRACT_BITS: u32 = $fract_bits;

            /// Creates a new fixed point value from the underlying bit representation.
            #[inline(always)]
            pub const fn from_bits(bits: $ty) -> Self {
                Self(bits)
            }

            /// Returns the underlying bit representation of the value.
            #[inline(always)]
            pub const fn to_bits(self) -> $ty {
                self.0
            }

            /// Creates a fixed point value from an integer.
            #[inline(always)]
            pub const fn from_i32(int: i32) -> Self {
                Self((int as $ty) << $fract_bits)
            }

            /// Returns the integer part of the value, rounding towards negative infinity.
            #[inline(always)]
            pub const fn to_i32(self) -> i32 {
                (self.0 >> $fract_bits) as i32
            }

            /// Returns the nearest integer value.
            pub fn round(self) -> Self {
                Self(self.0.wrapping_add(Self::ROUND) & Self::INT_MASK)
            }

            /// Returns the absolute value of the number.
            pub fn abs(self) -> Self {
                Self(self.0.wrapping_abs())
            }

            /// Returns the largest integer less than or equal to the number.
            pub fn floor(self) -> Self {
                Self(self.0 & Self::INT_MASK)
            }

            /// Returns the smallest integer greater than or equal to the number.
            pub fn ceil(self) -> Self {
                Self(self.0.wrapping_add(Self::ONE.0 - 1) & Self::INT_MASK)
            }

            /// Returns the fractional part of the number.
            pub fn fract(self) -> Self {
                Self(self.0 - self.floor().0)
            }

            /// Wrapping addition.
            pub fn wrapping_add(self, other: Self) -> Self {
                Self(self.0.wrapping_add(other.0))
            }

            /// Saturating addition.
            pub fn saturating_add(self, other: Self) -> Self {
                Self(self.0.saturating_add(other.0))
            }

            /// Wrapping substitution.
            pub fn wrapping_sub(self, other: Self) -> Self {
                Self(self.0.wrapping_sub(other.0))
            }

            /// Saturating substitution.
            pub fn saturating_sub(self, other: Self) -> Self {
                Self(self.0.saturating_sub(other.0))
            }

            /// Creates a fixed point value from a 64-bit float, rounding to
            /// the nearest representable value.
            pub fn from_f64(x: f64) -> Self {
                Self((x * (1u64 << $fract_bits) as f64).round() as $ty)
            }

            /// Returns the value as a 64-bit float.
            pub fn to_f64(self) -> f64 {
                self.0 as f64 / (1u64 << Self::FRACT_BITS) as f64
            }

            #[allow(dead_code)]
            #[inline(always)]
            fn widen(self) -> $wide {
                self.0 as $wide
            }
        }

        impl Add for $name {
            type Output = Self;
            #[inline(always)]
            fn add(self, other: Self) -> Self {
                // same overflow semantics as std: panic in debug, wrap in release
                Self(self.0 + other.0)
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, other: Self) {
                *self = *self + other;
            }
        }

        impl Sub for $name {
            type Output = Self;
            #[inline(always)]
            fn sub(self, other: Self) -> Self {
                Self(self.0 - other.0)
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, other: Self) {
                *self = *self - other;
            }
        }

        impl Neg for $name {
            type Output = Self;
            #[inline(always)]
            fn neg(self) -> Self {
                Self(-self.0)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                std::fmt::Debug::fmt(&self.to_f64(), f)
            }
        }
    };
}

fixed_impl!(F2Dot14, 16, 14, i16, i32);
fixed_impl!(Fixed, 32, 16, i32, i64);
fixed_impl!(F26Dot6, 32, 6, i32, i64);
fixed_impl!(Fix32, 32, 8, i32, i64);
fixed_impl!(Fix64, 64, 16, i64, i128);

// Fix32 and Fix64 print as `int:fract` with the raw fractional units, which
// is the easiest form to read when comparing rasterizer coordinates.
impl std::fmt::Display for Fix32 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}:{:03}", abs / 256, abs % 256)
    }
}

impl std::fmt::Display for Fix64 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}:{:05}", abs / 65536, abs % 65536)
    }
}

impl std::fmt::Display for F26Dot6 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.to_f64(), f)
    }
}

impl std::fmt::Display for F2Dot14 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.to_f64(), f)
    }
}

impl std::fmt::Display for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.to_f64(), f)
    }
}

/// Truncating multiplication, matching the `x * k / 256` scaling used when
/// offsetting rasterizer points.
impl Mul for Fix32 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, other: Self) -> Self {
        Self((self.widen() * other.widen() / 256) as i32)
    }
}

impl Div for Fix32 {
    type Output = Self;
    #[inline(always)]
    fn div(self, other: Self) -> Self {
        Self((self.widen() * 256 / other.widen()) as i32)
    }
}

impl Fix32 {
    /// Widens to 48.16.
    pub fn to_fix64(self) -> Fix64 {
        Fix64(self.widen() << 8)
    }
}

impl Fix64 {
    /// Narrows to 24.8, truncating the extra fractional bits.
    pub fn to_fix32(self) -> Fix32 {
        Fix32((self.0 >> 8) as i32)
    }
}

impl Mul for F26Dot6 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, other: Self) -> Self {
        Self((self.widen() * other.widen() >> 6) as i32)
    }
}

impl Div for F26Dot6 {
    type Output = Self;
    #[inline(always)]
    fn div(self, other: Self) -> Self {
        Self(((self.widen() << 6) / other.widen()) as i32)
    }
}

impl F26Dot6 {
    /// Converts to 24.8.
    pub fn to_fix32(self) -> Fix32 {
        Fix32(self.0 << 2)
    }
}

impl Mul for Fixed {
    type Output = Self;
    #[inline(always)]
    fn mul(self, other: Self) -> Self {
        let ab = self.widen() * other.widen();
        Self(((ab + 0x8000 - i64::from(ab < 0)) >> 16) as i32)
    }
}

impl Div for Fixed {
    type Output = Self;
    #[inline(always)]
    fn div(self, other: Self) -> Self {
        let mut sign = 1;
        let mut a = self.widen();
        let mut b = other.widen();
        if a < 0 {
            a = -a;
            sign = -sign;
        }
        if b < 0 {
            b = -b;
            sign = -sign;
        }
        let q = if b == 0 {
            0x7FFF_FFFF
        } else {
            ((a << 16) + (b >> 1)) / b
        };
        Self(if sign < 0 { -(q as i32) } else { q as i32 })
    }
}

impl F2Dot14 {
    /// Widens to 16.16.
    pub fn to_fixed(self) -> Fixed {
        Fixed(self.widen() << 2)
    }
}

#[cfg(test)]
mod tests {
    #![allow(overflowing_literals)] // we want to specify byte values directly
    use super::*;

    #[test]
    fn f2dot14_floats() {
        // Examples from https://docs.microsoft.com/en-us/typography/opentype/spec/otff#data-types
        assert_eq!(F2Dot14(0x7fff), F2Dot14::from_f64(1.999939));
        assert_eq!(F2Dot14(0x7000), F2Dot14::from_f64(1.75));
        assert_eq!(F2Dot14(0x0001), F2Dot14::from_f64(0.0000610356));
        assert_eq!(F2Dot14(0x0000), F2Dot14::from_f64(0.0));
        assert_eq!(F2Dot14(0xffff), F2Dot14::from_f64(-0.000061));
        assert_eq!(F2Dot14(0x8000), F2Dot14::from_f64(-2.0));
    }

    #[test]
    fn round_f26dot6() {
        assert_eq!(F26Dot6::from_bits(90).round(), F26Dot6::from_bits(64));
        assert_eq!(F26Dot6::from_bits(96).round(), F26Dot6::from_bits(128));
        assert_eq!(F26Dot6::from_bits(-90).round(), F26Dot6::from_bits(-64));
        assert_eq!(F26Dot6::from_bits(96).floor(), F26Dot6::from_bits(64));
        assert_eq!(F26Dot6::from_bits(65).ceil(), F26Dot6::from_bits(128));
    }

    #[test]
    fn f26dot6_arith() {
        // 1 * 3 == 3, 5 / 2 == 2.5
        assert_eq!(
            F26Dot6::from_i32(1) * F26Dot6::from_i32(3),
            F26Dot6::from_i32(3)
        );
        assert_eq!(
            F26Dot6::from_i32(5) / F26Dot6::from_i32(2),
            F26Dot6::from_bits(160)
        );
    }

    #[test]
    fn fix32_mul_truncates() {
        // 181/256 is the 1/sqrt(2) approximation used by point rotation
        assert_eq!(Fix32(256) * Fix32(181), Fix32(181));
        assert_eq!(Fix32(-3) * Fix32(181), Fix32(-2));
        assert_eq!(Fix32(512) / Fix32(512), Fix32(256));
    }

    #[test]
    fn fixed_mul_div() {
        let a = Fixed::from_f64(1.5);
        let b = Fixed::from_f64(-2.25);
        assert_eq!(a * b, Fixed::from_f64(-3.375));
        assert_eq!(b / a, Fixed::from_f64(-1.5));
    }

    #[test]
    fn display_fix32() {
        assert_eq!(Fix32(256 * 3 + 5).to_string(), "3:005");
        assert_eq!(Fix32(-(256 * 3 + 5)).to_string(), "-3:005");
        assert_eq!(Fix64(65536 + 1).to_string(), "1:00001");
    }

    #[test]
    fn conversions() {
        assert_eq!(F26Dot6::from_bits(64).to_fix32(), Fix32::ONE);
        assert_eq!(Fix32::ONE.to_fix64(), Fix64::ONE);
        assert_eq!(Fix64::from_bits(0x18000).to_fix32(), Fix32::from_bits(0x180));
        assert_eq!(F2Dot14::ONE.to_fixed(), Fixed::ONE);
        assert_eq!(F26Dot6::from_i32(-2).to_i32(), -2);
    }
}
