//! Miscellaneous instructions.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#miscellaneous-instructions>

use super::{Engine, OpResult};

/// Interpreter version reported by GETINFO. Matches the Windows 98 era
/// rasterizer.
const ENGINE_VERSION: i32 = 35;

/// GETINFO result bit for grayscale rendering.
const GRAYSCALE: i32 = 1 << 12;

impl Engine<'_> {
    /// Get information.
    ///
    /// GETINFO[] (0x88)
    ///
    /// Pops: selector: integer
    /// Pushes: result: integer
    ///
    /// Only the engine version (selector bit 0) and grayscale (selector
    /// bit 5) queries are answered. Rotation and stretching are never
    /// reported.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#get-information>
    pub(super) fn op_getinfo(&mut self) -> OpResult {
        self.value_stack.apply_unary(|selector| {
            let mut result = 0;
            if selector & 1 != 0 {
                result |= ENGINE_VERSION;
            }
            if selector & (1 << 5) != 0 {
                result |= GRAYSCALE;
            }
            Ok(result)
        })
    }

    /// Measure pixels per em.
    ///
    /// MPPEM[] (0x4B)
    pub(super) fn op_mppem(&mut self) -> OpResult {
        let ppem = self.ppem();
        self.value_stack.push(ppem)
    }

    /// Measure point size.
    ///
    /// MPS[] (0x4C)
    ///
    /// Assumes 72 dpi so the point size is the same as the ppem.
    pub(super) fn op_mps(&mut self) -> OpResult {
        let ppem = self.ppem();
        self.value_stack.push(ppem)
    }

    /// DEBUG[] (0x4F)
    ///
    /// Pops and discards a value.
    pub(super) fn op_debug(&mut self) -> OpResult {
        self.value_stack.pop()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock;
    use crate::hint::code::opcodes as op;

    #[test]
    fn getinfo() {
        #[rustfmt::skip]
        let code = [
            op::PUSHB000, 1, op::GETINFO,
            op::PUSHB000, 32, op::GETINFO,
            op::PUSHB000, 33, op::GETINFO,
            op::PUSHB000, 2, op::GETINFO,
        ];
        assert_eq!(mock::run(&code).unwrap(), [35, 4096, 4096 | 35, 0]);
    }

    #[test]
    fn measure_size() {
        let code = [op::MPPEM, op::MPS];
        assert_eq!(mock::run(&code).unwrap(), [16, 16]);
    }
}
