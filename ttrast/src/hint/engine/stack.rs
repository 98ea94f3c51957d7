//! Managing the stack.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#managing-the-stack>

use super::{super::code::Arguments, Engine, OpResult};

impl Engine<'_> {
    /// DUP[] (0x20)
    pub(super) fn op_dup(&mut self) -> OpResult {
        self.value_stack.dup()
    }

    /// POP[] (0x21)
    pub(super) fn op_pop(&mut self) -> OpResult {
        self.value_stack.pop()?;
        Ok(())
    }

    /// CLEAR[] (0x22)
    pub(super) fn op_clear(&mut self) -> OpResult {
        self.value_stack.clear();
        Ok(())
    }

    /// SWAP[] (0x23)
    pub(super) fn op_swap(&mut self) -> OpResult {
        self.value_stack.swap()
    }

    /// Returns the depth of the stack.
    ///
    /// DEPTH[] (0x24)
    ///
    /// Pushes: n, the number of elements on the stack before the push
    pub(super) fn op_depth(&mut self) -> OpResult {
        let depth = self.value_stack.len() as i32;
        self.value_stack.push(depth)
    }

    /// CINDEX[] (0x25)
    pub(super) fn op_cindex(&mut self) -> OpResult {
        self.value_stack.copy_index()
    }

    /// MINDEX[] (0x26)
    pub(super) fn op_mindex(&mut self) -> OpResult {
        self.value_stack.move_index()
    }

    /// ROLL[] (0x8A)
    pub(super) fn op_roll(&mut self) -> OpResult {
        self.value_stack.roll()
    }

    /// Pushes the inline data of any of the NPUSHB, NPUSHW, PUSHB or PUSHW
    /// instructions.
    pub(super) fn op_push(&mut self, args: &Arguments) -> OpResult {
        self.value_stack.push_args(args)
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock;
    use crate::hint::code::opcodes as op;

    #[test]
    fn push_families() {
        #[rustfmt::skip]
        let code = [
            op::PUSHB000, 255,
            op::PUSHW000, 0xFF, 0xFE,
            op::NPUSHB, 3, 253, 1, 2,
            op::NPUSHW, 3, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09,
        ];
        assert_eq!(
            mock::run(&code).unwrap(),
            [255, -2, 253, 1, 2, 0x0405, 0x0607, 0x0809]
        );
    }

    #[test]
    fn stack_manipulation() {
        #[rustfmt::skip]
        let code = [
            op::PUSHB010, 10, 20, 30,
            op::CLEAR,
            op::PUSHB010, 40, 50, 60,
            // [40, 60, 50]
            op::SWAP,
            // [40, 60, 50, 50, 50]
            op::DUP,
            op::DUP,
            // [40, 60, 50, 50]
            op::POP,
            // [40, 60, 50, 50, 4]
            op::DEPTH,
            // copies the 4th element: [40, 60, 50, 50, 40]
            op::CINDEX,
            op::PUSHB000, 4,
            // moves the 4th element to the top
            op::MINDEX,
        ];
        assert_eq!(mock::run(&code).unwrap(), [40, 50, 50, 40, 60]);
    }

    #[test]
    fn roll() {
        #[rustfmt::skip]
        let code = [
            op::PUSHB010, 1, 2, 3,
            op::ROLL,
        ];
        assert_eq!(mock::run(&code).unwrap(), [2, 3, 1]);
    }
}
