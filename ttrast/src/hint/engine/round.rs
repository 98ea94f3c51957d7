//! Compensating for the engine characteristics.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#compensating-for-the-engine-characteristics>

use super::{Engine, OpResult};

impl Engine<'_> {
    /// Round value.
    ///
    /// ROUND\[ab\] (0x68 - 0x6B)
    ///
    /// Pops: n1
    /// Pushes: n1 rounded with the current round state
    ///
    /// The engine compensation bits are ignored.
    pub(super) fn op_round(&mut self) -> OpResult {
        let round_state = self.graphics.round_state;
        self.value_stack.apply_unary(|n| Ok(round_state.round(n)))
    }

    /// No rounding of value.
    ///
    /// NROUND\[ab\] (0x6C - 0x6F)
    ///
    /// Leaves the value unchanged since engine compensation is zero.
    pub(super) fn op_nround(&mut self) -> OpResult {
        self.value_stack.apply_unary(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock;
    use crate::hint::code::opcodes as op;

    #[test]
    fn round_modes() {
        #[rustfmt::skip]
        let code = [
            op::ROFF, op::PUSHB000, 90, op::ROUND00,
            op::RTG, op::PUSHB000, 90, op::ROUND00,
            op::RTHG, op::PUSHB000, 90, op::ROUND00,
            op::RDTG, op::PUSHB000, 90, op::ROUND00,
            op::RUTG, op::PUSHB000, 90, op::ROUND00,
            op::RTDG, op::PUSHB000, 90, op::ROUND00,
            op::PUSHB000, 90, op::NROUND00,
        ];
        assert_eq!(mock::run(&code).unwrap(), [90, 64, 96, 64, 128, 96, 90]);
    }

    #[test]
    fn super_round() {
        // period 64, phase 16, threshold 32
        #[rustfmt::skip]
        let code = [
            op::PUSHB000, 0x58, op::SROUND,
            op::PUSHW000, 0xFF, 0xAF, op::ROUND00,
            op::PUSHW000, 0xFF, 0xB0, op::ROUND00,
            op::PUSHW000, 0xFF, 0xEF, op::ROUND00,
            op::PUSHW000, 0xFF, 0xF0, op::ROUND00,
            op::PUSHB000, 0, op::ROUND00,
            op::PUSHB000, 16, op::ROUND00,
            op::PUSHB000, 47, op::ROUND00,
            op::PUSHB000, 48, op::ROUND00,
        ];
        assert_eq!(
            mock::run(&code).unwrap(),
            [-80, -80, -16, -16, 16, 16, 16, 80]
        );
    }
}
