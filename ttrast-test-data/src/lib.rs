//! Synthetic fonts shared between the ttrast crates.
//!
//! Nothing here is a checked-in binary: every font is assembled in memory
//! by [`FontBuilder`], so the expected values in tests can be read directly
//! off the descriptions below.

pub mod bebuffer;
pub mod font;
pub mod glyf;

pub use bebuffer::BeBuffer;
pub use font::{CmapFormat, FontBuilder};
pub use glyf::{off, on, Component, CompositeGlyph, GlyphData, SimpleGlyph, Transform};

/// Units per em of [`simple_font`].
pub const SIMPLE_UNITS_PER_EM: u16 = 2048;

/// Glyph ids in [`simple_font`].
pub mod gid {
    pub const NOTDEF: u16 = 0;
    pub const SPACE: u16 = 1;
    pub const A: u16 = 2;
    pub const V: u16 = 3;
    pub const O: u16 = 4;
    /// 'Ä': 'A' plus a quarter-scale 'o' above it.
    pub const A_DIAERESIS: u16 = 5;
    /// 'Å': a composite of the composite 'Ä', shifted right.
    pub const A_RING: u16 = 6;
    pub const MIRROR_A: u16 = 7;
}

/// The outline of the 'o' glyph: quadratic arcs around a 1200 unit square.
pub fn o_glyph() -> SimpleGlyph {
    SimpleGlyph::new().contour(&[
        on(600, 0),
        off(1200, 0),
        on(1200, 600),
        off(1200, 1200),
        on(600, 1200),
        off(0, 1200),
        on(0, 600),
        off(0, 0),
    ])
}

/// The outline of the 'A' glyph: a triangle with a triangular counter.
pub fn a_glyph() -> SimpleGlyph {
    SimpleGlyph::new()
        .contour(&[on(0, 0), on(600, 1400), on(1200, 0)])
        .contour(&[on(400, 300), on(800, 300), on(600, 800)])
}

/// The builder behind [`simple_font`], for tests that want to tweak it.
pub fn simple_font_builder() -> FontBuilder {
    let notdef = SimpleGlyph::new()
        .contour(&[on(100, 0), on(100, 1400), on(900, 1400), on(900, 0)])
        .contour(&[on(200, 100), on(800, 100), on(800, 1300), on(200, 1300)]);
    let v = SimpleGlyph::new().contour(&[on(0, 1400), on(1200, 1400), on(600, 0)]);
    let a_diaeresis = CompositeGlyph::new([0, 0, 1200, 1800])
        .component(Component::new(gid::A, 0, 0).use_my_metrics())
        .component(Component::new(gid::O, 450, 1500).transform(Transform::Scale(0.25)));
    let a_ring = CompositeGlyph::new([100, 0, 1300, 1800])
        .component(Component::new(gid::A_DIAERESIS, 100, 0));
    let mirror_a = CompositeGlyph::new([-1200, 0, 0, 1400]).component(
        Component::new(gid::A, 0, 0).transform(Transform::TwoByTwo([-1.0, 0.0, 0.0, 1.0])),
    );
    FontBuilder::new(SIMPLE_UNITS_PER_EM)
        .glyph(notdef, 1000, 100)
        .glyph(GlyphData::Empty, 512, 0)
        .glyph(a_glyph(), 1300, 0)
        .glyph(v, 1300, 0)
        .glyph(o_glyph(), 1300, 0)
        .glyph(a_diaeresis, 1300, 0)
        .glyph(a_ring, 1300, 100)
        .glyph(mirror_a, 1300, -1200)
        // the last three glyphs share the advance of 'o'
        .num_h_metrics(5)
        .map(' ', gid::SPACE)
        .map('A', gid::A)
        .map('V', gid::V)
        .map('o', gid::O)
        .map('\u{C4}', gid::A_DIAERESIS)
        .map('\u{C5}', gid::A_RING)
        .map_codepoint(0x1F170, gid::MIRROR_A)
        .kern(gid::A, gid::V, -150)
        .kern(gid::V, gid::A, -150)
        .kern(gid::A, gid::O, -40)
}

/// A small font with simple, composite and nested composite glyphs.
///
/// | char | gid | advance | lsb |
/// |------|-----|---------|-----|
/// | -    | 0   | 1000    | 100 |
/// | ' '  | 1   | 512     | 0   |
/// | 'A'  | 2   | 1300    | 0   |
/// | 'V'  | 3   | 1300    | 0   |
/// | 'o'  | 4   | 1300    | 0   |
/// | 'Ä'  | 5   | 1300    | 0   |
/// | 'Å'  | 6   | 1300    | 100 |
/// | U+1F170 | 7 | 1300   | -1200 |
///
/// Kerning: A/V = -150, V/A = -150, A/o = -40. Font bounds are
/// `(-1200, 0, 1300, 1800)`. U+1F170 is only reachable with a format 12
/// cmap.
pub fn simple_font() -> Vec<u8> {
    simple_font_builder().build()
}

/// A font whose glyph 1 is a composite that references itself.
pub fn recursive_composite_font() -> Vec<u8> {
    let looping = CompositeGlyph::new([0, 0, 100, 100]).component(Component::new(1, 10, 0));
    FontBuilder::new(1000)
        .glyph(GlyphData::Empty, 500, 0)
        .glyph(looping, 500, 0)
        .map('x', 1)
        .build()
}

/// Bytecode and fonts that exercise the hinting interpreter.
pub mod hinting {
    use super::*;

    // opcodes used below
    const PUSHB_1: u8 = 0xB0;
    const PUSHB_2: u8 = 0xB1;
    const PUSHB_3: u8 = 0xB2;
    const FDEF: u8 = 0x2C;
    const ENDF: u8 = 0x2D;
    const CALL: u8 = 0x2B;
    const SVTCA_Y: u8 = 0x00;
    const SVTCA_X: u8 = 0x01;
    const MDAP_ROUND: u8 = 0x2F;
    const MIAP_ROUND: u8 = 0x3F;
    const IUP_X: u8 = 0x31;
    const IUP_Y: u8 = 0x30;
    const WCVTP: u8 = 0x44;
    const RCVT: u8 = 0x45;
    const ADD: u8 = 0x60;

    /// Function 0 rounds the point on the stack to the grid along x.
    #[rustfmt::skip]
    pub const FPGM: &[u8] = &[
        PUSHB_1, 0,
        FDEF,
            SVTCA_X,
            MDAP_ROUND,
        ENDF,
    ];

    /// cvt[1] = cvt[0] + cvt[1], evaluated at each size.
    #[rustfmt::skip]
    pub const PREP: &[u8] = &[
        PUSHB_3, 1, 0, 1,
        RCVT,
        // stack: 1, 0, cvt[1]
        0x23, // SWAP -> 1, cvt[1], 0
        RCVT,
        ADD,
        WCVTP,
    ];

    /// Rounds point 0 along x via function 0, anchors point 2 vertically
    /// to cvt[0] and interpolates the rest.
    #[rustfmt::skip]
    pub const GLYPH_PROGRAM: &[u8] = &[
        PUSHB_2, 0, 0,
        CALL,
        SVTCA_Y,
        PUSHB_2, 2, 0,
        MIAP_ROUND,
        IUP_X,
        IUP_Y,
    ];

    /// Control values in font units.
    pub const CVT: &[i16] = &[1100, 30];

    /// A font with `fpgm`, `prep`, `cvt ` and one instructed glyph.
    pub fn hinted_font() -> Vec<u8> {
        let bar = SimpleGlyph::new()
            .contour(&[on(110, 0), on(110, 1070), on(590, 1070), on(590, 0)])
            .instructions(GLYPH_PROGRAM);
        FontBuilder::new(1000)
            .glyph(GlyphData::Empty, 500, 0)
            .glyph(bar, 700, 110)
            .map('l', 1)
            .cvt(CVT)
            .fpgm(FPGM)
            .prep(PREP)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_font_bounds() {
        assert_eq!(simple_font_builder().bounds(), [-1200, 0, 1300, 1800]);
    }

    #[test]
    fn fonts_build() {
        assert!(!simple_font().is_empty());
        assert!(!recursive_composite_font().is_empty());
        assert!(!hinting::hinted_font().is_empty());
    }
}
