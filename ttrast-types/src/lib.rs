//! Scalar and geometric types shared by the ttrast crates.
//!
//! Fonts store their data as big-endian scalars ([`Scalar`]), glyph outlines
//! are hinted in 26.6 fixed point ([`F26Dot6`]) and rasterized in 24.8
//! fixed point ([`Fix32`]), with 48.16 ([`Fix64`]) used for intermediate
//! products.

#![deny(rustdoc::broken_intra_doc_links)]

mod bbox;
mod fixed;
mod glyph_id;
mod point;
pub mod raw;
mod tag;

#[cfg(all(test, feature = "serde"))]
mod serde_test;

pub use bbox::BoundingBox;
pub use fixed::{F26Dot6, F2Dot14, Fix32, Fix64, Fixed};
pub use glyph_id::GlyphId;
pub use point::Point;
pub use raw::Scalar;
pub use tag::Tag;

/// The header tag for a font collection file.
pub const TTC_HEADER_TAG: Tag = Tag::new(b"ttcf");

/// The SFNT version for fonts containing TrueType outlines.
pub const TT_SFNT_VERSION: u32 = 0x00010000;

/// The legacy Apple SFNT version tag, also accepted for TrueType outlines.
pub const TRUE_SFNT_VERSION: u32 = 0x74727565;
