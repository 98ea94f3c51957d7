//! TrueType hinting.
//!
//! A [`Hinter`] holds everything the font's programs leave behind: function
//! and instruction definitions from `fpgm`, the scaled control value table
//! and graphics state from `prep`, and the storage area and twilight zone.
//! Glyph programs run against scratch copies of that state so that one
//! glyph never affects the next.

mod code;
mod definition;
mod engine;
mod error;
mod graphics;
mod math;
mod program;
mod value_stack;
mod zone;

use ttrast_types::GlyphId;

use crate::{
    font::{scale_value, Font},
    glyph::{FontPoint, PointMarker, PHANTOM_POINT_COUNT},
};

use self::{
    definition::{Definition, DefinitionMap},
    engine::{Definitions, Engine, EngineState},
    graphics::{GraphicsState, RetainedGraphicsState},
    value_stack::ValueStack,
    zone::Zone,
};

pub use code::{opcode_name, Program};
pub use engine::MAX_RUN_INSTRUCTIONS;
pub use error::{HintError, HintErrorKind};

/// Programs longer than this are rejected without being run.
pub const MAX_PROGRAM_LEN: usize = 50_000;

/// Extra twilight points beyond the count requested by the font.
const TWILIGHT_PADDING: usize = 4;

/// Outline data that is passed to the hinter.
///
/// All three point arrays have the same length and end with the phantom
/// points. Contour ends are exclusive and relative to the start of
/// `points`.
pub struct HintOutline<'a> {
    /// Scaled points that are modified by the glyph program.
    pub points: &'a mut [FontPoint],
    /// Scaled points before hinting.
    pub unhinted: &'a mut [FontPoint],
    /// Points in font units.
    pub raw: &'a mut [FontPoint],
    pub ends: &'a [usize],
}

/// Points of the twilight zone in each of their three versions.
#[derive(Clone, Default)]
struct Twilight {
    points: Vec<FontPoint>,
    original: Vec<FontPoint>,
    unscaled: Vec<FontPoint>,
}

impl Twilight {
    fn reset(&mut self, len: usize) {
        for points in [&mut self.points, &mut self.original, &mut self.unscaled] {
            points.clear();
            points.resize(len, FontPoint::default());
        }
    }

    fn copy_from(&mut self, other: &Self) {
        self.points.clone_from(&other.points);
        self.original.clone_from(&other.original);
        self.unscaled.clone_from(&other.unscaled);
    }

    fn zone(&mut self) -> Zone<'_> {
        Zone::new(
            &mut self.points,
            &mut self.original,
            &mut self.unscaled,
            &[],
            0,
        )
    }
}

/// Interpreter state for one font.
///
/// Creating a hinter runs the font program. Each change of scale reruns the
/// control value program, after which any number of glyphs can be hinted.
pub struct Hinter<'a> {
    fpgm: &'a [u8],
    prep: &'a [u8],
    units_per_em: i32,
    unscaled_cvt: Vec<i32>,
    functions: Vec<Definition>,
    instructions: Vec<Definition>,
    stack: Vec<i32>,
    storage: Vec<i32>,
    cvt: Vec<i32>,
    twilight: Twilight,
    graphics: RetainedGraphicsState,
    /// Scale of the last successful control value program run.
    scale: Option<i32>,
    glyph_storage: Vec<i32>,
    glyph_cvt: Vec<i32>,
    glyph_twilight: Twilight,
}

impl<'a> Hinter<'a> {
    /// Sizes the interpreter from the `maxp` limits and runs the font
    /// program.
    pub fn new(font: &Font<'a>) -> Result<Self, HintError> {
        let fpgm = font.fpgm();
        let prep = font.prep();
        check_program_len(Program::Font, fpgm)?;
        check_program_len(Program::ControlValue, prep)?;
        let unscaled_cvt = font
            .cvt()
            .chunks_exact(2)
            .map(|bytes| i16::from_be_bytes([bytes[0], bytes[1]]) as i32)
            .collect::<Vec<_>>();
        let stack_len = (font.max_stack() as usize + 255) & !255;
        let storage_len = (font.max_storage() as usize + 15) & !15;
        let mut hinter = Self {
            fpgm,
            prep,
            units_per_em: font.units_per_em(),
            cvt: unscaled_cvt.clone(),
            unscaled_cvt,
            functions: vec![Definition::default(); font.max_function_defs() as usize],
            instructions: vec![Definition::default(); font.max_instruction_defs() as usize],
            stack: vec![0; stack_len.max(256)],
            storage: vec![0; storage_len],
            twilight: Twilight::default(),
            graphics: RetainedGraphicsState::default(),
            scale: None,
            glyph_storage: Vec::new(),
            glyph_cvt: Vec::new(),
            glyph_twilight: Twilight::default(),
        };
        hinter
            .twilight
            .reset(font.max_twilight_points() as usize + TWILIGHT_PADDING);
        log::debug!(
            "hinter: fpgm {} bytes, prep {} bytes, {} cvt entries",
            fpgm.len(),
            prep.len(),
            hinter.cvt.len()
        );
        if !fpgm.is_empty() {
            hinter.run(Program::Font, 0)?;
        }
        Ok(hinter)
    }

    /// Returns false if the control value program turned off glyph
    /// instructions.
    pub fn is_enabled(&self) -> bool {
        self.graphics.instruct_control & 1 == 0
    }

    /// Returns the scale (pixels per em in 26.6) of the last successful
    /// control value program run.
    pub fn scale(&self) -> Option<i32> {
        self.scale
    }

    /// Scales the control value table and runs the control value program
    /// unless the scale is unchanged.
    pub fn set_scale(&mut self, scale: i32) -> Result<(), HintError> {
        if self.scale == Some(scale) {
            return Ok(());
        }
        self.scale = None;
        let upem = self.units_per_em;
        self.cvt.clear();
        self.cvt.extend(
            self.unscaled_cvt
                .iter()
                .map(|&value| scale_value(scale, value, upem)),
        );
        let twilight_len = self.twilight.points.len();
        self.twilight.reset(twilight_len);
        self.graphics = RetainedGraphicsState::default();
        if !self.prep.is_empty() {
            self.run(Program::ControlValue, scale)?;
        }
        self.scale = Some(scale);
        Ok(())
    }

    /// Runs a glyph program over `outline`.
    ///
    /// Touch markers are cleared from the points afterwards, whether or not
    /// the program succeeded.
    pub fn hint_glyph(
        &mut self,
        glyph_id: GlyphId,
        instructions: &[u8],
        outline: HintOutline,
    ) -> Result<(), HintError> {
        if !self.is_enabled() {
            return Ok(());
        }
        check_program_len(Program::Glyph, instructions).map_err(|mut e| {
            e.glyph_id = Some(glyph_id);
            e
        })?;
        // Bit 1 of the instruction control flag asks glyph programs to
        // ignore the graphics state set by the control value program.
        let retained = if self.graphics.instruct_control & 2 != 0 {
            RetainedGraphicsState::default()
        } else {
            self.graphics
        };
        let mut graphics = GraphicsState::new(retained);
        graphics.update_projection_state();
        self.glyph_storage.clone_from(&self.storage);
        self.glyph_cvt.clone_from(&self.cvt);
        self.glyph_twilight.copy_from(&self.twilight);
        log::trace!(
            "glyph {} program: {} bytes, {} points",
            glyph_id.to_u16(),
            instructions.len(),
            outline.points.len()
        );
        let HintOutline {
            points,
            unhinted,
            raw,
            ends,
        } = outline;
        let result = {
            let state = EngineState {
                value_stack: ValueStack::new(&mut self.stack),
                storage: &mut self.glyph_storage,
                cvt: &mut self.glyph_cvt,
                twilight: self.glyph_twilight.zone(),
                glyph: Zone::new(&mut *points, unhinted, raw, ends, PHANTOM_POINT_COUNT),
            };
            let definitions = Definitions {
                functions: DefinitionMap::Ref(&self.functions),
                instructions: DefinitionMap::Ref(&self.instructions),
            };
            let mut engine = Engine::new(
                [self.fpgm, self.prep, instructions],
                Program::Glyph,
                graphics,
                state,
                definitions,
                self.scale.unwrap_or_default(),
                self.units_per_em,
            );
            engine.run()
        };
        for point in points.iter_mut() {
            point.flags.clear_marker(PointMarker::TOUCHED);
        }
        result.map_err(|mut e| {
            e.glyph_id = Some(glyph_id);
            e
        })
    }

    /// Runs the font or control value program with definitions open for
    /// writing, keeping the retained graphics state it leaves behind.
    fn run(&mut self, program: Program, scale: i32) -> Result<(), HintError> {
        let state = EngineState {
            value_stack: ValueStack::new(&mut self.stack),
            storage: &mut self.storage,
            cvt: &mut self.cvt,
            twilight: self.twilight.zone(),
            glyph: Zone::default(),
        };
        let definitions = Definitions {
            functions: DefinitionMap::Mut(&mut self.functions),
            instructions: DefinitionMap::Mut(&mut self.instructions),
        };
        let mut engine = Engine::new(
            [self.fpgm, self.prep, &[]],
            program,
            GraphicsState::default(),
            state,
            definitions,
            scale,
            self.units_per_em,
        );
        engine.run()?;
        // Only the retained fields reach glyph programs, so changes to the
        // vectors, reference points, zone pointers and loop counter made by
        // the control value program are dropped here.
        if program == Program::ControlValue {
            self.graphics = engine.graphics().retained;
        }
        Ok(())
    }
}

fn check_program_len(program: Program, bytecode: &[u8]) -> Result<(), HintError> {
    if bytecode.len() > MAX_PROGRAM_LEN {
        return Err(HintError {
            program,
            glyph_id: None,
            pc: 0,
            opcode: None,
            kind: HintErrorKind::ProgramTooLarge(bytecode.len()),
        });
    }
    Ok(())
}
