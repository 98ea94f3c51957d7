//! Exceptions.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#managing-exceptions>

use super::{super::code::opcodes as op, Engine, OpResult};

impl Engine<'_> {
    /// Delta exception P1, P2 and P3.
    ///
    /// DELTAP1[] (0x5D)
    /// DELTAP2[] (0x71)
    /// DELTAP3[] (0x72)
    ///
    /// Pops: n: number of pairs of exception specifications and points
    ///       p1, arg1, p2, arg2, ..., pn, argn
    ///
    /// Each `arg` packs a ppem relative to the delta base in the high
    /// nibble and a signed step count in the low nibble. Points in zp0
    /// are moved only when the ppem matches.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#delta-exception-p1>
    pub(super) fn op_deltap(&mut self, opcode: u8) -> OpResult {
        let count = self.value_stack.pop_usize()?;
        let ppem = self.ppem();
        let zp0 = self.graphics.zp0;
        for _ in 0..count {
            let point_ix = self.value_stack.pop_usize()?;
            let arg = self.value_stack.pop()?;
            // Validate even when the ppem doesn't match.
            self.zone(zp0).point(point_ix)?;
            if let Some(distance) = self.delta_distance(opcode, ppem, arg) {
                self.move_point(zp0, point_ix, distance)?;
            }
        }
        Ok(())
    }

    /// Delta exception C1, C2 and C3.
    ///
    /// DELTAC1[] (0x73)
    /// DELTAC2[] (0x74)
    /// DELTAC3[] (0x75)
    ///
    /// Pops: n: number of pairs of exception specifications and CVT entry
    ///       numbers
    ///       c1, arg1, c2, arg2, ..., cn, argn
    ///
    /// Same as DELTAP but adjusts CVT entries instead of points.
    pub(super) fn op_deltac(&mut self, opcode: u8) -> OpResult {
        let count = self.value_stack.pop_usize()?;
        let ppem = self.ppem();
        for _ in 0..count {
            let cvt_ix = self.value_stack.pop_usize()?;
            let arg = self.value_stack.pop()?;
            let value = self.cvt_value(cvt_ix)?;
            if let Some(distance) = self.delta_distance(opcode, ppem, arg) {
                self.cvt[cvt_ix] = value.wrapping_add(distance);
            }
        }
        Ok(())
    }

    /// Decodes a delta argument, returning the distance in 26.6 when it
    /// applies to the given ppem.
    fn delta_distance(&self, opcode: u8, ppem: i32, arg: i32) -> Option<i32> {
        let range_base = match opcode {
            op::DELTAP2 | op::DELTAC2 => 16,
            op::DELTAP3 | op::DELTAC3 => 32,
            _ => 0,
        };
        let target_ppem = ((arg & 0xF0) >> 4) + range_base + self.graphics.delta_base as i32;
        if target_ppem != ppem {
            return None;
        }
        let mut steps = (arg & 0xF) - 8;
        if steps >= 0 {
            steps += 1;
        }
        Some(steps * 64 / (1 << self.graphics.delta_shift))
    }
}

#[cfg(test)]
mod tests {
    use super::super::{mock, HintErrorKind, ZonePointer};
    use crate::hint::code::opcodes as op;

    // Mock engine runs at 16ppem and the default delta base is 9, so the
    // high nibble must be 7 for DELTAP1.

    #[test]
    fn deltap_moves_matching_ppem() {
        #[rustfmt::skip]
        let code = [
            // +3 steps at 16ppem for point 2, -8 steps at 17ppem for point 3
            op::NPUSHB, 5, 0x7A, 2, 0x8F, 3, 2,
            op::DELTAP1,
        ];
        let mut mock = mock::MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.graphics.zp0 = ZonePointer::Glyph;
        engine.run().unwrap();
        // delta shift of 3 makes each step 8 units
        assert_eq!(engine.point_at(ZonePointer::Glyph, 2), (128 + 24, 64));
        assert_eq!(engine.point_at(ZonePointer::Glyph, 3), (192, 96));
    }

    #[test]
    fn deltap_ranges() {
        // DELTAP2 adds 16 to the ppem so with a delta base of 0 a high
        // nibble of 0 matches 16ppem.
        #[rustfmt::skip]
        let code = [
            op::PUSHB000, 0,
            op::SDB,
            op::PUSHB010, 0x00, 1, 1,
            op::DELTAP2,
        ];
        let mut mock = mock::MockEngine::new();
        let mut engine = mock.engine(&code);
        engine.graphics.zp0 = ZonePointer::Glyph;
        engine.run().unwrap();
        // lowest step is -8
        assert_eq!(engine.point_at(ZonePointer::Glyph, 1), (64 - 64, 32));
    }

    #[test]
    fn deltac_adjusts_cvt() {
        #[rustfmt::skip]
        let code = [
            op::PUSHB010, 0x77, 4, 1,
            op::DELTAC1,
            op::PUSHB000, 4,
            op::RCVT,
        ];
        // 0x7 - 8 = -1 step of 8 units
        assert_eq!(mock::run(&code).unwrap(), [256 - 8]);
    }

    #[test]
    fn deltap_invalid_point() {
        let code = [op::PUSHB010, 0x7A, 99, 1, op::DELTAP1];
        assert_eq!(mock::run(&code), Err(HintErrorKind::InvalidPointIndex(99)));
    }
}
