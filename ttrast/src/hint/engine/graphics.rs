//! Managing the graphics state.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#managing-the-graphics-state>

use ttrast_types::Point;

use super::{
    super::{
        code::Program,
        graphics::{RoundMode, RoundState},
        math,
        zone::ZonePointer,
    },
    Engine, HintErrorKind, OpResult,
};
use crate::font::scale_value;

const X_AXIS: Point<i32> = Point::new(0x4000, 0);
const Y_AXIS: Point<i32> = Point::new(0, 0x4000);

impl Engine<'_> {
    /// Set vectors to coordinate axis.
    ///
    /// SVTCA\[a\] (0x00 - 0x01)
    /// SPVTCA\[a\] (0x02 - 0x03)
    /// SFVTCA\[a\] (0x04 - 0x05)
    ///
    /// The low bit selects the x axis when set and the y axis otherwise.
    /// SVTCA sets both the projection and freedom vectors.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#set-freedom-and-projection-vectors-to-coordinate-axis>
    pub(super) fn op_svtca(&mut self, opcode: u8) -> OpResult {
        let axis = if opcode & 1 != 0 { X_AXIS } else { Y_AXIS };
        let (set_pv, set_fv) = match opcode >> 1 {
            0 => (true, true),
            1 => (true, false),
            _ => (false, true),
        };
        let gs = &mut self.graphics;
        if set_pv {
            gs.proj_vector = axis;
            gs.dual_proj_vector = axis;
        }
        if set_fv {
            gs.freedom_vector = axis;
        }
        gs.update_projection_state();
        Ok(())
    }

    /// Set vector to line.
    ///
    /// SPVTL\[a\] (0x06 - 0x07)
    /// SFVTL\[a\] (0x08 - 0x09)
    ///
    /// Pops: p1: point in zp2
    ///       p2: point in zp1
    ///
    /// Sets the projection (0x06, 0x07) or freedom (0x08, 0x09) vector to
    /// the line from p1 to p2. Odd opcodes rotate the line by 90 degrees
    /// counter clockwise.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#set-projection-vector-to-line>
    pub(super) fn op_svtl(&mut self, opcode: u8) -> OpResult {
        let p1 = self.value_stack.pop_usize()?;
        let p2 = self.value_stack.pop_usize()?;
        let a = self.zone(self.graphics.zp2).point(p1)?;
        let b = self.zone(self.graphics.zp1).point(p2)?;
        let vector = line_vector(b, a, opcode & 1 != 0);
        let gs = &mut self.graphics;
        if opcode < 0x08 {
            gs.proj_vector = vector;
            gs.dual_proj_vector = vector;
        } else {
            gs.freedom_vector = vector;
        }
        gs.update_projection_state();
        Ok(())
    }

    /// Set dual projection vector to line.
    ///
    /// SDPVTL\[a\] (0x86 - 0x87)
    ///
    /// Pops: p1: point in zp2
    ///       p2: point in zp1
    ///
    /// The dual projection vector is computed from the original positions
    /// and the projection vector from the current positions.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#set-dual-projection-vector-to-line>
    pub(super) fn op_sdpvtl(&mut self, opcode: u8) -> OpResult {
        let p1 = self.value_stack.pop_usize()?;
        let p2 = self.value_stack.pop_usize()?;
        let rotate = opcode & 1 != 0;
        let (zp1, zp2) = (self.zone(self.graphics.zp1), self.zone(self.graphics.zp2));
        let dual = line_vector(zp1.original(p2)?, zp2.original(p1)?, rotate);
        let proj = line_vector(zp1.point(p2)?, zp2.point(p1)?, rotate);
        let gs = &mut self.graphics;
        gs.dual_proj_vector = dual;
        gs.proj_vector = proj;
        gs.update_projection_state();
        Ok(())
    }

    /// Set projection vector from stack.
    ///
    /// SPVFS[] (0x0A)
    ///
    /// Pops: y, x: components of the vector (F2Dot14)
    ///
    /// The vector is used as given and is expected to be normalized.
    pub(super) fn op_spvfs(&mut self) -> OpResult {
        let y = self.value_stack.pop()?;
        let x = self.value_stack.pop()?;
        let vector = Point::new(x, y);
        let gs = &mut self.graphics;
        gs.proj_vector = vector;
        gs.dual_proj_vector = vector;
        gs.update_projection_state();
        Ok(())
    }

    /// Set freedom vector from stack.
    ///
    /// SFVFS[] (0x0B)
    ///
    /// Pops: y, x: components of the vector (F2Dot14)
    pub(super) fn op_sfvfs(&mut self) -> OpResult {
        let y = self.value_stack.pop()?;
        let x = self.value_stack.pop()?;
        self.graphics.freedom_vector = Point::new(x, y);
        self.graphics.update_projection_state();
        Ok(())
    }

    /// Get projection vector.
    ///
    /// GPV[] (0x0C)
    ///
    /// Pushes: x, y: components of the projection vector (F2Dot14)
    pub(super) fn op_gpv(&mut self) -> OpResult {
        let v = self.graphics.proj_vector;
        self.value_stack.push(v.x)?;
        self.value_stack.push(v.y)
    }

    /// Get freedom vector.
    ///
    /// GFV[] (0x0D)
    ///
    /// Pushes: x, y: components of the freedom vector (F2Dot14)
    pub(super) fn op_gfv(&mut self) -> OpResult {
        let v = self.graphics.freedom_vector;
        self.value_stack.push(v.x)?;
        self.value_stack.push(v.y)
    }

    /// Set freedom vector to projection vector.
    ///
    /// SFVTPV[] (0x0E)
    pub(super) fn op_sfvtpv(&mut self) -> OpResult {
        self.graphics.freedom_vector = self.graphics.proj_vector;
        self.graphics.update_projection_state();
        Ok(())
    }

    /// SRP0[] (0x10)
    pub(super) fn op_srp0(&mut self) -> OpResult {
        self.graphics.rp0 = self.value_stack.pop_usize()?;
        Ok(())
    }

    /// SRP1[] (0x11)
    pub(super) fn op_srp1(&mut self) -> OpResult {
        self.graphics.rp1 = self.value_stack.pop_usize()?;
        Ok(())
    }

    /// SRP2[] (0x12)
    pub(super) fn op_srp2(&mut self) -> OpResult {
        self.graphics.rp2 = self.value_stack.pop_usize()?;
        Ok(())
    }

    /// SZP0[] (0x13)
    pub(super) fn op_szp0(&mut self) -> OpResult {
        self.graphics.zp0 = self.pop_zone()?;
        Ok(())
    }

    /// SZP1[] (0x14)
    pub(super) fn op_szp1(&mut self) -> OpResult {
        self.graphics.zp1 = self.pop_zone()?;
        Ok(())
    }

    /// SZP2[] (0x15)
    pub(super) fn op_szp2(&mut self) -> OpResult {
        self.graphics.zp2 = self.pop_zone()?;
        Ok(())
    }

    /// Set all three zone pointers.
    ///
    /// SZPS[] (0x16)
    pub(super) fn op_szps(&mut self) -> OpResult {
        let zone = self.pop_zone()?;
        let gs = &mut self.graphics;
        gs.zp0 = zone;
        gs.zp1 = zone;
        gs.zp2 = zone;
        Ok(())
    }

    /// Set loop variable.
    ///
    /// SLOOP[] (0x17)
    ///
    /// Pops: n: value for the loop counter
    pub(super) fn op_sloop(&mut self) -> OpResult {
        let n = self.value_stack.pop()?;
        if n < 0 {
            return Err(HintErrorKind::NegativeLoopCounter);
        }
        // Large counts are only useful to burn cycles.
        self.graphics.loop_counter = n.min(0xFFFF) as u32;
        Ok(())
    }

    /// Round to grid.
    ///
    /// RTG[] (0x18)
    pub(super) fn op_rtg(&mut self) -> OpResult {
        self.set_round_mode(RoundMode::Grid)
    }

    /// Round to half grid.
    ///
    /// RTHG[] (0x19)
    pub(super) fn op_rthg(&mut self) -> OpResult {
        self.set_round_mode(RoundMode::HalfGrid)
    }

    /// Round to double grid.
    ///
    /// RTDG[] (0x3D)
    pub(super) fn op_rtdg(&mut self) -> OpResult {
        self.set_round_mode(RoundMode::DoubleGrid)
    }

    /// Round down to grid.
    ///
    /// RDTG[] (0x7D)
    pub(super) fn op_rdtg(&mut self) -> OpResult {
        self.set_round_mode(RoundMode::DownToGrid)
    }

    /// Round up to grid.
    ///
    /// RUTG[] (0x7C)
    pub(super) fn op_rutg(&mut self) -> OpResult {
        self.set_round_mode(RoundMode::UpToGrid)
    }

    /// Round off.
    ///
    /// ROFF[] (0x7A)
    pub(super) fn op_roff(&mut self) -> OpResult {
        self.set_round_mode(RoundMode::Off)
    }

    /// Super round.
    ///
    /// SROUND[] (0x76)
    ///
    /// Pops: n: packed period, phase and threshold
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#super-round>
    pub(super) fn op_sround(&mut self) -> OpResult {
        let selector = self.value_stack.pop()?;
        self.graphics.round_state = RoundState::super_round(selector, false);
        Ok(())
    }

    /// Super round 45 degrees.
    ///
    /// S45ROUND[] (0x77)
    ///
    /// Same as SROUND[] with the period scaled by sqrt(2)/2.
    pub(super) fn op_s45round(&mut self) -> OpResult {
        let selector = self.value_stack.pop()?;
        self.graphics.round_state = RoundState::super_round(selector, true);
        Ok(())
    }

    /// Set minimum distance.
    ///
    /// SMD[] (0x1A)
    ///
    /// Pops: distance (F26Dot6)
    pub(super) fn op_smd(&mut self) -> OpResult {
        self.graphics.min_distance = self.value_stack.pop()?;
        Ok(())
    }

    /// Set control value table cut in.
    ///
    /// SCVTCI[] (0x1D)
    ///
    /// Pops: n: value for cut in (F26Dot6)
    pub(super) fn op_scvtci(&mut self) -> OpResult {
        self.graphics.control_value_cutin = self.value_stack.pop()?;
        Ok(())
    }

    /// Set single width cut in.
    ///
    /// SSWCI[] (0x1E)
    ///
    /// Pops: n: value for cut in (F26Dot6)
    pub(super) fn op_sswci(&mut self) -> OpResult {
        self.graphics.single_width_cutin = self.value_stack.pop()?;
        Ok(())
    }

    /// Set single width.
    ///
    /// SSW[] (0x1F)
    ///
    /// Pops: n: value for single width in font units
    pub(super) fn op_ssw(&mut self) -> OpResult {
        let n = self.value_stack.pop()?;
        self.graphics.single_width = scale_value(self.scale, n, self.units_per_em);
        Ok(())
    }

    /// Set the auto flip boolean to on.
    ///
    /// FLIPON[] (0x4D)
    pub(super) fn op_flipon(&mut self) -> OpResult {
        self.graphics.auto_flip = true;
        Ok(())
    }

    /// Set the auto flip boolean to off.
    ///
    /// FLIPOFF[] (0x4E)
    pub(super) fn op_flipoff(&mut self) -> OpResult {
        self.graphics.auto_flip = false;
        Ok(())
    }

    /// Set delta base.
    ///
    /// SDB[] (0x5E)
    pub(super) fn op_sdb(&mut self) -> OpResult {
        self.graphics.delta_base = self.value_stack.pop()? as u16;
        Ok(())
    }

    /// Set delta shift.
    ///
    /// SDS[] (0x5F)
    ///
    /// Shifts above 6 would make every delta step zero and are rejected.
    pub(super) fn op_sds(&mut self) -> OpResult {
        let shift = self.value_stack.pop()?;
        if !(0..=6).contains(&shift) {
            return Err(HintErrorKind::InvalidStackValue(shift));
        }
        self.graphics.delta_shift = shift as u16;
        Ok(())
    }

    /// Scan conversion control.
    ///
    /// SCANCTRL[] (0x85)
    ///
    /// Pops: n: flags indicating when to turn on dropout control
    ///
    /// The resulting flag is tracked in the graphics state but the
    /// rasterizer always renders with antialiasing and has no dropout
    /// control. Glyphs are never rotated or stretched.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#scan-conversion-control>
    pub(super) fn op_scanctrl(&mut self) -> OpResult {
        let n = self.value_stack.pop()?;
        let threshold = n & 0xFF;
        let ppem = self.ppem();
        let gs = &mut self.graphics;
        match threshold {
            0xFF => gs.scan_control = true,
            0 => gs.scan_control = false,
            _ => {
                if n & 0x100 != 0 && ppem <= threshold {
                    gs.scan_control = true;
                }
                if n & 0x800 != 0 && ppem > threshold {
                    gs.scan_control = false;
                }
            }
        }
        Ok(())
    }

    /// SCANTYPE[] (0x8D)
    ///
    /// Pops and ignores the scan type.
    pub(super) fn op_scantype(&mut self) -> OpResult {
        self.value_stack.pop()?;
        Ok(())
    }

    /// Instruction execution control.
    ///
    /// INSTCTRL[] (0x8E)
    ///
    /// Pops: s: selector flag
    ///       value: used to set the value of instruction control
    ///
    /// Only takes effect in the control value program. Selector 1 disables
    /// glyph programs and selector 2 makes glyph programs start with the
    /// default graphics state.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#instruction-execution-control>
    pub(super) fn op_instctrl(&mut self) -> OpResult {
        let selector = self.value_stack.pop()?;
        let value = self.value_stack.pop()?;
        if !(1..=3).contains(&selector) || self.program.initial != Program::ControlValue {
            return Ok(());
        }
        let bit = 1u8 << (selector - 1);
        if value != 0 {
            self.graphics.instruct_control |= bit;
        } else {
            self.graphics.instruct_control &= !bit;
        }
        Ok(())
    }

    /// SANGW[] (0x7E)
    ///
    /// Obsolete. Pops and ignores the angle weight.
    pub(super) fn op_sangw(&mut self) -> OpResult {
        self.value_stack.pop()?;
        Ok(())
    }

    /// AA[] (0x7F)
    ///
    /// Obsolete. Pops and ignores its argument.
    pub(super) fn op_aa(&mut self) -> OpResult {
        self.value_stack.pop()?;
        Ok(())
    }

    fn pop_zone(&mut self) -> Result<ZonePointer, HintErrorKind> {
        ZonePointer::try_from(self.value_stack.pop()?)
    }

    fn set_round_mode(&mut self, mode: RoundMode) -> OpResult {
        self.graphics.round_state = RoundState {
            mode,
            ..Default::default()
        };
        Ok(())
    }
}

/// Returns the unit vector along the line from `to` toward `from`,
/// optionally rotated 90 degrees counter clockwise.
fn line_vector(from: Point<i32>, to: Point<i32>, rotate: bool) -> Point<i32> {
    let dx = from.x.wrapping_sub(to.x);
    let dy = from.y.wrapping_sub(to.y);
    if dx == 0 && dy == 0 {
        return X_AXIS;
    }
    let (dx, dy) = if rotate { (-dy, dx) } else { (dx, dy) };
    math::normalize14(dx, dy)
}

#[cfg(test)]
mod tests {
    use super::super::{mock, HintErrorKind};
    use crate::hint::{
        code::opcodes as op,
        graphics::{CoordAxis, RoundMode},
    };

    #[test]
    fn vectors() {
        #[rustfmt::skip]
        let code = [
            op::SVTCA1,
            op::GPV,
            op::SVTCA0,
            op::GFV,
            op::NEG,
            // projection vector becomes (0, -1)
            op::SPVFS,
            op::SFVTPV,
            op::PUSHB000, 1,
            op::GFV,
            op::PUSHB000, 2,
        ];
        assert_eq!(
            mock::run(&code).unwrap(),
            [0x4000, 0, 1, 0, -0x4000, 2]
        );
    }

    #[test]
    fn vector_to_line() {
        // Glyph points are at (i * 64, i * 32) so every pair of points
        // is on the same line with slope 1/2.
        let code = [op::PUSHB001, 1, 3, op::SPVTL0];
        let mut mock = mock::MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.graphics.zp1 = super::ZonePointer::Glyph;
        engine.graphics.zp2 = super::ZonePointer::Glyph;
        engine.run().unwrap();
        // Line from point 3 toward point 1 points down and to the left.
        assert_eq!(engine.graphics.proj_vector.x, -14654);
        assert_eq!(engine.graphics.proj_vector.y, -7327);
        assert_eq!(engine.graphics.proj_axis, CoordAxis::Both);
        // Rotated variant is perpendicular
        let code = [op::PUSHB001, 1, 3, op::SFVTL1];
        let mut mock = mock::MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.graphics.zp1 = super::ZonePointer::Glyph;
        engine.graphics.zp2 = super::ZonePointer::Glyph;
        engine.run().unwrap();
        assert_eq!(engine.graphics.freedom_vector.x, 7327);
        assert_eq!(engine.graphics.freedom_vector.y, -14654);
    }

    #[test]
    fn round_mode_setters() {
        for (opcode, mode) in [
            (op::RTG, RoundMode::Grid),
            (op::RTHG, RoundMode::HalfGrid),
            (op::RTDG, RoundMode::DoubleGrid),
            (op::RDTG, RoundMode::DownToGrid),
            (op::RUTG, RoundMode::UpToGrid),
            (op::ROFF, RoundMode::Off),
        ] {
            let code = [opcode];
            let mut mock = mock::MockEngine::new();
            let mut engine = mock.engine(&code);
            engine.run().unwrap();
            assert_eq!(engine.graphics.round_state.mode, mode);
        }
    }

    #[test]
    fn zone_pointers() {
        let code = [op::PUSHB001, 1, 0, op::SZPS, op::SZP1];
        let mut mock = mock::MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        let gs = engine.graphics;
        assert!(gs.zp0.is_twilight() && gs.zp2.is_twilight());
        assert!(!gs.zp1.is_twilight());
        let code = [op::PUSHB000, 2, op::SZP0];
        assert_eq!(mock::run(&code), Err(HintErrorKind::InvalidZoneIndex(2)));
    }

    #[test]
    fn loop_counter() {
        let code = [op::PUSHB000, 5, op::SLOOP];
        let mut mock = mock::MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        assert_eq!(engine.graphics.loop_counter, 5);
        let code = [op::PUSHW000, 0xFF, 0xFF, op::SLOOP];
        assert_eq!(mock::run(&code), Err(HintErrorKind::NegativeLoopCounter));
    }

    #[test]
    fn state_setters() {
        #[rustfmt::skip]
        let code = [
            op::PUSHB010, 10, 20, 30,
            op::SMD,
            op::SCVTCI,
            op::SSWCI,
            op::PUSHB001, 7, 2,
            op::SDS,
            op::SDB,
            op::FLIPOFF,
            // 64 font units at 16ppem, 1024 upem
            op::PUSHB000, 64,
            op::SSW,
        ];
        let mut mock = mock::MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        let gs = engine.graphics;
        assert_eq!(gs.min_distance, 30);
        assert_eq!(gs.control_value_cutin, 20);
        assert_eq!(gs.single_width_cutin, 10);
        assert_eq!((gs.delta_base, gs.delta_shift), (7, 2));
        assert!(!gs.auto_flip);
        assert_eq!(gs.single_width, 64);
    }

    #[test]
    fn instctrl_only_in_prep() {
        let code = [op::PUSHB001, 1, 1, op::INSTCTRL];
        let mut mock = mock::MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        assert_eq!(engine.graphics.instruct_control, 0);
        let mut mock = mock::MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.program.initial = super::Program::ControlValue;
        engine.run().unwrap();
        assert_eq!(engine.graphics.instruct_control, 1);
    }

    #[test]
    fn scan_control() {
        // Dropout control when ppem <= 20
        let code = [op::PUSHW000, 0x01, 20, op::SCANCTRL, op::PUSHB000, 0, op::SCANTYPE];
        let mut mock = mock::MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.run().unwrap();
        assert!(engine.graphics.scan_control);
    }
}
