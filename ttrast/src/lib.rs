//! A small TrueType engine.
//!
//! The pipeline runs from raw font bytes to pixels:
//!
//! * [`Font`] parses the tables of an SFNT file and answers metric and
//!   character mapping queries.
//! * [`Glyph::load`] decodes and scales an outline, optionally running the
//!   font's hinting programs through a [`Hinter`].
//! * [`Rasterizer`] accumulates exact pixel coverage for lines and curves,
//!   fed directly or through a [`Path`] (possibly [stroked](Stroke)).
//! * [`Drawer`]s composite the resulting [`Span`]s into pixel buffers.
//!
//! [`FontContext`] strings these together with a glyph cache to draw text.
//!
//! All coordinates handed to the rasterizer are 24.8 fixed point pixels
//! with y pointing down. Font quantities are scaled to 26.6 with y up.

#![forbid(unsafe_code)]

pub mod context;
pub mod draw;
pub mod error;
pub mod font;
pub mod font_data;
pub mod glyph;
pub mod hint;
pub mod path;
pub mod raster;
pub mod stroke;

pub use context::{CachedGlyph, DirectMappedCache, FontContext, GlyphCache};
pub use draw::{
    AlphaMask, AlphaOverDrawer, AlphaSrcDrawer, Color, CompositeOp, Drawer, GammaDrawer,
    MonochromeDrawer, Rect, RgbaDrawer, RgbaImage, Span,
};
pub use error::{DecodeError, ParseError, PathError, RasterError, StrokeError};
pub use font::{parse, Font, HMetric};
pub use font_data::FontData;
pub use glyph::{load_glyph, FontPoint, Glyph};
pub use hint::{HintError, HintErrorKind, Hinter};
pub use path::{Path, PathSegment, Pen};
pub use raster::{FillRule, Rasterizer};
pub use stroke::{Cap, Join, Stroke};

/// Re-export of the scalar types.
pub extern crate ttrast_types as types;
