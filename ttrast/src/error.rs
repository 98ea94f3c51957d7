//! Error types.

use ttrast_types::{GlyphId, Tag};

use crate::hint::HintError;

/// An error that occurs when parsing font data.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ParseError {
    OutOfBounds,
    InvalidSfnt(u32),
    InvalidCollectionIndex(u32),
    NestedCollection,
    TableIsMissing(Tag),
    InvalidTableLength { tag: Tag, len: usize },
    InvalidVersion { tag: Tag, version: u32 },
    InconsistentLength(Tag),
    InvalidUnitsPerEm(u16),
    // i64 is flexible enough to store any format value we might encounter
    InvalidFormat(i64),
    UnsupportedKern,
    UnsupportedCmap,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::OutOfBounds => write!(f, "An offset was out of bounds"),
            ParseError::InvalidSfnt(ver) => write!(f, "Invalid sfnt version 0x{ver:08X}"),
            ParseError::InvalidCollectionIndex(ix) => {
                write!(f, "Invalid index {ix} for font collection")
            }
            ParseError::NestedCollection => write!(f, "nested font collections are not allowed"),
            ParseError::TableIsMissing(tag) => write!(f, "the {tag} table is missing"),
            ParseError::InvalidTableLength { tag, len } => {
                write!(f, "the {tag} table has an invalid length of {len} bytes")
            }
            ParseError::InvalidVersion { tag, version } => {
                write!(f, "the {tag} table has unsupported version 0x{version:08X}")
            }
            ParseError::InconsistentLength(tag) => {
                write!(f, "the {tag} table length disagrees with other tables")
            }
            ParseError::InvalidUnitsPerEm(upem) => write!(f, "invalid units per em {upem}"),
            ParseError::InvalidFormat(x) => write!(f, "Invalid format '{x}'"),
            ParseError::UnsupportedKern => write!(f, "unsupported kern table"),
            ParseError::UnsupportedCmap => write!(f, "no supported cmap subtable"),
        }
    }
}

impl std::error::Error for ParseError {}

/// An error that occurs when loading a glyph outline.
#[derive(Clone, Debug)]
pub enum DecodeError {
    Read(ParseError),
    ExcessiveRecursion,
    UnsupportedCompound,
    InvalidContourCount(i16),
    MalformedGlyph(&'static str),
    GlyphOutOfRange(GlyphId),
    Hint(HintError),
}

impl From<ParseError> for DecodeError {
    fn from(e: ParseError) -> Self {
        Self::Read(e)
    }
}

impl From<HintError> for DecodeError {
    fn from(e: HintError) -> Self {
        Self::Hint(e)
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(e) => write!(f, "{e}"),
            Self::ExcessiveRecursion => {
                write!(f, "recursion limit exceeded while loading composite glyph")
            }
            Self::UnsupportedCompound => {
                write!(f, "composite glyphs anchored by point numbers are not supported")
            }
            Self::InvalidContourCount(n) => write!(f, "invalid contour count {n}"),
            Self::MalformedGlyph(msg) => write!(f, "malformed glyph: {msg}"),
            Self::GlyphOutOfRange(gid) => write!(f, "glyph {gid} is out of range"),
            Self::Hint(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// An error that occurs when rendering a glyph.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RasterError {
    /// The glyph bounds have a negative width or height.
    NegativeSizedGlyph,
}

impl std::fmt::Display for RasterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeSizedGlyph => write!(f, "glyph bounds have a negative size"),
        }
    }
}

impl std::error::Error for RasterError {}

/// An error that occurs when stroking a path.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum StrokeError {
    UnsupportedCubic,
    Path(PathError),
}

impl From<PathError> for StrokeError {
    fn from(e: PathError) -> Self {
        Self::Path(e)
    }
}

impl std::fmt::Display for StrokeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedCubic => write!(f, "stroking cubic segments is not supported"),
            Self::Path(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for StrokeError {}

/// An error that occurs when decoding an encoded path.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PathError {
    /// The opcode stream was truncated or contained an unknown opcode at
    /// the given index.
    Malformed(usize),
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(ix) => write!(f, "malformed path data at index {ix}"),
        }
    }
}

impl std::error::Error for PathError {}
