//! TrueType bytecode interpreter.

mod arith;
mod control_flow;
mod cvt;
mod definition;
mod delta;
mod dispatch;
mod graphics;
mod logical;
mod misc;
mod outline;
mod round;
mod stack;
mod storage;

use ttrast_types::Point;

use super::{
    code::Program,
    definition::DefinitionMap,
    error::{HintError, HintErrorKind},
    graphics::GraphicsState,
    math,
    program::ProgramState,
    value_stack::ValueStack,
    zone::{Zone, ZonePointer},
};
use crate::glyph::PointMarker;

pub use dispatch::MAX_RUN_INSTRUCTIONS;

pub type OpResult = Result<(), HintErrorKind>;

/// Function and instruction definitions visible to a program.
pub struct Definitions<'a> {
    pub functions: DefinitionMap<'a>,
    pub instructions: DefinitionMap<'a>,
}

/// Mutable state that an executing program may read and write.
pub struct EngineState<'a> {
    pub value_stack: ValueStack<'a>,
    pub storage: &'a mut [i32],
    pub cvt: &'a mut [i32],
    pub twilight: Zone<'a>,
    pub glyph: Zone<'a>,
}

/// TrueType hinting engine.
///
/// An engine is created for a single run of the font, control value or
/// glyph program. Everything that outlives the run is borrowed from the
/// [`Hinter`](super::Hinter).
pub struct Engine<'a> {
    program: ProgramState<'a>,
    graphics: GraphicsState,
    value_stack: ValueStack<'a>,
    storage: &'a mut [i32],
    cvt: &'a mut [i32],
    definitions: Definitions<'a>,
    zones: [Zone<'a>; 2],
    /// Pixels per em in 26.6.
    scale: i32,
    units_per_em: i32,
}

impl<'a> Engine<'a> {
    /// Creates an engine that will start executing `initial` with the given
    /// graphics state.
    pub fn new(
        programs: [&'a [u8]; 3],
        initial: Program,
        graphics: GraphicsState,
        state: EngineState<'a>,
        definitions: Definitions<'a>,
        scale: i32,
        units_per_em: i32,
    ) -> Self {
        let [font_code, cv_code, glyph_code] = programs;
        Self {
            program: ProgramState::new(font_code, cv_code, glyph_code, initial),
            graphics,
            value_stack: state.value_stack,
            storage: state.storage,
            cvt: state.cvt,
            definitions,
            zones: [state.twilight, state.glyph],
            scale,
            units_per_em,
        }
    }

    /// Returns the graphics state as left by the program.
    pub fn graphics(&self) -> &GraphicsState {
        &self.graphics
    }

    /// Returns the current number of pixels per em, rounded.
    fn ppem(&self) -> i32 {
        (self.scale + 32) >> 6
    }

    fn zone(&self, pointer: ZonePointer) -> &Zone<'a> {
        &self.zones[pointer as usize]
    }

    fn zone_mut(&mut self, pointer: ZonePointer) -> &mut Zone<'a> {
        &mut self.zones[pointer as usize]
    }

    /// Distance from `b` to `a` measured along the projection vector.
    fn project(&self, a: Point<i32>, b: Point<i32>) -> i32 {
        self.graphics
            .project(Point::new(a.x.wrapping_sub(b.x), a.y.wrapping_sub(b.y)))
    }

    /// Distance from `b` to `a` measured along the dual projection vector.
    fn dual_project(&self, a: Point<i32>, b: Point<i32>) -> i32 {
        self.graphics
            .dual_project(Point::new(a.x.wrapping_sub(b.x), a.y.wrapping_sub(b.y)))
    }

    /// Moves a point along the freedom vector so that its projection changes
    /// by `distance`, marking it as touched on each axis that moved.
    ///
    /// See <https://gitlab.freedesktop.org/freetype/freetype/-/blob/57617782464411201ce7bbc93b086c1b4d7d84a5/src/truetype/ttinterp.c#L1669>
    fn move_point(&mut self, zone: ZonePointer, point_ix: usize, distance: i32) -> OpResult {
        let fv = self.graphics.freedom_vector;
        let fdotp = self.graphics.fdotp;
        let point = self.zone_mut(zone).point_mut(point_ix)?;
        if fv.x != 0 {
            point.x = point.x.wrapping_add(math::mul_div(distance, fv.x, fdotp));
            point.flags.set_marker(PointMarker::TOUCHED_X);
        }
        if fv.y != 0 {
            point.y = point.y.wrapping_add(math::mul_div(distance, fv.y, fdotp));
            point.flags.set_marker(PointMarker::TOUCHED_Y);
        }
        Ok(())
    }

    /// Moves the unhinted position of a point along the freedom vector.
    fn move_original(&mut self, zone: ZonePointer, point_ix: usize, distance: i32) -> OpResult {
        let fv = self.graphics.freedom_vector;
        let fdotp = self.graphics.fdotp;
        let point = self.zone_mut(zone).original_mut(point_ix)?;
        if fv.x != 0 {
            point.x = point.x.wrapping_add(math::mul_div(distance, fv.x, fdotp));
        }
        if fv.y != 0 {
            point.y = point.y.wrapping_add(math::mul_div(distance, fv.y, fdotp));
        }
        Ok(())
    }

    /// Moves a point in the zone referenced by zp2 by the given delta.
    ///
    /// Helper for the SHP, SHC, SHZ and SHPIX instructions.
    fn move_zp2_point(&mut self, point_ix: usize, dx: i32, dy: i32, touch: bool) -> OpResult {
        let fv = self.graphics.freedom_vector;
        let zp2 = self.graphics.zp2;
        let point = self.zone_mut(zp2).point_mut(point_ix)?;
        if fv.x != 0 {
            point.x = point.x.wrapping_add(dx);
            if touch {
                point.flags.set_marker(PointMarker::TOUCHED_X);
            }
        }
        if fv.y != 0 {
            point.y = point.y.wrapping_add(dy);
            if touch {
                point.flags.set_marker(PointMarker::TOUCHED_Y);
            }
        }
        Ok(())
    }

    /// Computes how far a reference point has moved from its unhinted
    /// position, expressed as a displacement along the freedom vector.
    ///
    /// The low bit of `opcode` selects rp1 in zp0 (set) or rp2 in zp1
    /// (clear).
    fn point_displacement(&self, opcode: u8) -> Result<PointDisplacement, HintErrorKind> {
        let gs = &self.graphics;
        let (zone, point_ix) = if opcode & 1 != 0 {
            (gs.zp0, gs.rp1)
        } else {
            (gs.zp1, gs.rp2)
        };
        let zone_data = self.zone(zone);
        let distance = self.project(zone_data.point(point_ix)?, zone_data.original(point_ix)?);
        let fv = gs.freedom_vector;
        Ok(PointDisplacement {
            zone,
            point_ix,
            dx: math::mul_div(distance, fv.x, gs.fdotp),
            dy: math::mul_div(distance, fv.y, gs.fdotp),
        })
    }

    /// Pops the loop counter worth of values, resetting the counter to 1.
    fn take_loop_counter(&mut self) -> u32 {
        core::mem::replace(&mut self.graphics.loop_counter, 1)
    }
}

#[derive(PartialEq, Debug)]
struct PointDisplacement {
    zone: ZonePointer,
    point_ix: usize,
    dx: i32,
    dy: i32,
}

#[cfg(test)]
mod mock {
    use super::*;
    use crate::{glyph::FontPoint, hint::definition::Definition};

    /// Owns all of the storage needed to build an [`Engine`] for tests.
    pub(super) struct MockEngine {
        stack: Vec<i32>,
        storage: Vec<i32>,
        cvt: Vec<i32>,
        functions: Vec<Definition>,
        instructions: Vec<Definition>,
        twilight: [Vec<FontPoint>; 3],
        glyph: [Vec<FontPoint>; 3],
        ends: Vec<usize>,
    }

    impl MockEngine {
        pub fn new() -> Self {
            // A ten point glyph with two contours; the last four points
            // are phantoms. At 16ppem and 1024 upem a font unit is exactly
            // 1/64 of a pixel so unscaled and scaled coordinates match.
            let glyph: Vec<FontPoint> = (0..14)
                .map(|i| FontPoint::on(i * 64, i * 32))
                .collect();
            Self {
                stack: vec![0; 256],
                storage: vec![0; 32],
                cvt: (0..8).map(|i| i * 64).collect(),
                functions: vec![Definition::default(); 8],
                instructions: vec![Definition::default(); 8],
                twilight: core::array::from_fn(|_| vec![FontPoint::default(); 4]),
                glyph: [glyph.clone(), glyph.clone(), glyph],
                ends: vec![4, 10],
            }
        }

        /// Creates an engine that runs `code` as the font program at 16
        /// pixels per em with 1024 units per em.
        pub fn engine<'a>(&'a mut self, code: &'a [u8]) -> Engine<'a> {
            let [tw_points, tw_original, tw_unscaled] = &mut self.twilight;
            let [points, original, unscaled] = &mut self.glyph;
            let mut graphics = GraphicsState::default();
            graphics.update_projection_state();
            Engine::new(
                [code, &[], &[]],
                Program::Font,
                graphics,
                EngineState {
                    value_stack: ValueStack::new(&mut self.stack),
                    storage: &mut self.storage,
                    cvt: &mut self.cvt,
                    twilight: Zone::new(tw_points, tw_original, tw_unscaled, &[], 0),
                    glyph: Zone::new(points, original, unscaled, &self.ends, 4),
                },
                Definitions {
                    functions: DefinitionMap::Mut(&mut self.functions),
                    instructions: DefinitionMap::Mut(&mut self.instructions),
                },
                16 << 6,
                1024,
            )
        }
    }

    impl Engine<'_> {
        /// Runs the font program and returns the final stack.
        pub(super) fn run_to_stack(&mut self) -> Result<Vec<i32>, HintError> {
            self.run()?;
            Ok(self.value_stack.values().to_vec())
        }

        pub(super) fn point_at(&self, zone: ZonePointer, ix: usize) -> (i32, i32) {
            let p = self.zone(zone).points[ix];
            (p.x, p.y)
        }

        pub(super) fn set_vectors(&mut self, pv: (i32, i32), fv: (i32, i32)) {
            self.graphics.proj_vector = Point::new(pv.0, pv.1);
            self.graphics.dual_proj_vector = Point::new(pv.0, pv.1);
            self.graphics.freedom_vector = Point::new(fv.0, fv.1);
            self.graphics.update_projection_state();
        }
    }

    /// Runs `code` as a font program and returns the resulting stack.
    pub(super) fn run(code: &[u8]) -> Result<Vec<i32>, HintErrorKind> {
        let mut mock = MockEngine::new();
        let mut engine = mock.engine(code);
        engine.run_to_stack().map_err(|e| e.kind)
    }
}
