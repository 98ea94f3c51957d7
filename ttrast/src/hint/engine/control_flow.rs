//! Managing the flow of control.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#managing-the-flow-of-control>

use super::{super::code::opcodes as op, Engine, HintErrorKind, OpResult};

impl Engine<'_> {
    /// If test.
    ///
    /// IF[] (0x58)
    ///
    /// Pops: e: stack element
    ///
    /// When `e` is zero, skips forward to the matching ELSE or EIF.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#if-test>
    pub(super) fn op_if(&mut self) -> OpResult {
        if self.value_stack.pop()? != 0 {
            return Ok(());
        }
        let mut depth = 1;
        loop {
            let ins = self
                .program
                .decoder
                .next()
                .map_err(|_| HintErrorKind::UnbalancedIf)?;
            match ins.opcode {
                op::IF => depth += 1,
                op::ELSE if depth == 1 => break,
                op::EIF => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Else.
    ///
    /// ELSE[] (0x1B)
    ///
    /// Only reached at the end of a taken IF branch, so skips forward to
    /// the matching EIF.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#else>
    pub(super) fn op_else(&mut self) -> OpResult {
        let mut depth = 1;
        while depth != 0 {
            let ins = self
                .program
                .decoder
                .next()
                .map_err(|_| HintErrorKind::UnbalancedIf)?;
            match ins.opcode {
                op::IF => depth += 1,
                op::EIF => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    /// EIF[] (0x59)
    pub(super) fn op_eif(&mut self) -> OpResult {
        Ok(())
    }

    /// Jump relative on true.
    ///
    /// JROT[] (0x78)
    ///
    /// Pops: e: stack element
    ///       offset: number of bytes to move the instruction pointer
    pub(super) fn op_jrot(&mut self, pc: usize) -> OpResult {
        let e = self.value_stack.pop()?;
        let offset = self.value_stack.pop()?;
        if e != 0 {
            self.jump(pc, offset)?;
        }
        Ok(())
    }

    /// Jump.
    ///
    /// JMPR[] (0x1C)
    ///
    /// Pops: offset: number of bytes to move the instruction pointer
    pub(super) fn op_jmpr(&mut self, pc: usize) -> OpResult {
        let offset = self.value_stack.pop()?;
        self.jump(pc, offset)
    }

    /// Jump relative on false.
    ///
    /// JROF[] (0x79)
    ///
    /// Pops: e: stack element
    ///       offset: number of bytes to move the instruction pointer
    pub(super) fn op_jrof(&mut self, pc: usize) -> OpResult {
        let e = self.value_stack.pop()?;
        let offset = self.value_stack.pop()?;
        if e == 0 {
            self.jump(pc, offset)?;
        }
        Ok(())
    }

    /// Moves the instruction pointer by `offset` bytes relative to the
    /// jump instruction at `pc`.
    ///
    /// The target must stay inside the active function or program. A zero
    /// offset would loop on the jump forever and is rejected.
    fn jump(&mut self, pc: usize, offset: i32) -> OpResult {
        if offset == 0 {
            return Err(HintErrorKind::InvalidJump);
        }
        let target = (pc as i64) + offset as i64;
        let bounds = self.program.jump_bounds();
        if target < bounds.start as i64 || target >= bounds.end as i64 {
            return Err(HintErrorKind::InvalidJump);
        }
        self.program.decoder.pc = target as usize;
        Ok(())
    }
}
