//! types for working with raw big-endian bytes

/// A trait for font scalars.
///
/// Scalars are fixed size values stored big-endian in font data. Parsing
/// reads them with [`Scalar::read`]; the test font builder writes them with
/// [`Scalar::to_raw`].
pub trait Scalar: Sized {
    /// The raw byte representation of this type.
    type Raw: Copy + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// The size of the raw type.
    const RAW_BYTE_LEN: usize = std::mem::size_of::<Self::Raw>();

    /// Create an instance of this type from raw big-endian bytes
    fn from_raw(raw: Self::Raw) -> Self;

    /// Encode this type as raw big-endian bytes
    fn to_raw(self) -> Self::Raw;

    /// Reads a value from the start of `bytes`, if there are enough of them.
    fn read(bytes: &[u8]) -> Option<Self> {
        let raw = bytes.get(..Self::RAW_BYTE_LEN)?;
        <Self::Raw>::try_from(raw).ok().map(Self::from_raw)
    }
}

/// An internal macro for implementing the `Scalar` trait for newtypes.
#[macro_export]
macro_rules! newtype_scalar {
    ($name:ident, $raw:ty) => {
        impl $crate::raw::Scalar for $name {
            type Raw = $raw;
            fn to_raw(self) -> $raw {
                self.to_bits().to_be_bytes()
            }

            fn from_raw(raw: $raw) -> Self {
                Self::from_bits($crate::raw::Scalar::from_raw(raw))
            }
        }
    };
}

macro_rules! int_scalar {
    ($ty:ty, $raw:ty) => {
        impl crate::raw::Scalar for $ty {
            type Raw = $raw;
            fn to_raw(self) -> $raw {
                self.to_be_bytes()
            }

            fn from_raw(raw: $raw) -> $ty {
                Self::from_be_bytes(raw)
            }
        }
    };
}

int_scalar!(u8, [u8; 1]);
int_scalar!(i8, [u8; 1]);
int_scalar!(u16, [u8; 2]);
int_scalar!(i16, [u8; 2]);
int_scalar!(u32, [u8; 4]);
int_scalar!(i32, [u8; 4]);
int_scalar!(i64, [u8; 8]);

newtype_scalar!(F2Dot14, [u8; 2]);
newtype_scalar!(Fixed, [u8; 4]);

use crate::{F2Dot14, Fixed};
