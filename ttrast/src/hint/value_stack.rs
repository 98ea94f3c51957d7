//! Interpreter operand stack.

use super::{code::Arguments, error::HintErrorKind};

use HintErrorKind::{InvalidStackValue, ValueStackOverflow, ValueStackUnderflow};

/// Operand stack of 32-bit values.
///
/// The backing store is borrowed from the [`Hinter`](super::Hinter) so that
/// it is allocated once per font.
pub struct ValueStack<'a> {
    values: &'a mut [i32],
    top: usize,
}

impl<'a> ValueStack<'a> {
    pub fn new(values: &'a mut [i32]) -> Self {
        Self { values, top: 0 }
    }

    /// Number of values on the stack, as pushed by DEPTH.
    pub fn len(&self) -> usize {
        self.top
    }

    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    pub fn values(&self) -> &[i32] {
        &self.values[..self.top]
    }

    pub fn push(&mut self, value: i32) -> Result<(), HintErrorKind> {
        let ptr = self.values.get_mut(self.top).ok_or(ValueStackOverflow)?;
        *ptr = value;
        self.top += 1;
        Ok(())
    }

    /// Pushes the inline operands of a push instruction, failing without
    /// pushing anything if they do not all fit.
    pub fn push_args(&mut self, args: &Arguments) -> Result<(), HintErrorKind> {
        let end = self.top + args.len();
        let slots = self
            .values
            .get_mut(self.top..end)
            .ok_or(ValueStackOverflow)?;
        for (slot, value) in slots.iter_mut().zip(args.values()) {
            *slot = value;
        }
        self.top = end;
        Ok(())
    }

    pub fn peek(&self) -> Option<i32> {
        self.values.get(self.top.checked_sub(1)?).copied()
    }

    pub fn pop(&mut self) -> Result<i32, HintErrorKind> {
        let top = self.top.checked_sub(1).ok_or(ValueStackUnderflow)?;
        self.top = top;
        Ok(self.values[top])
    }

    /// Pops an index. Negative values wrap to huge indices and fail the
    /// caller's bounds check.
    pub fn pop_usize(&mut self) -> Result<usize, HintErrorKind> {
        Ok(self.pop()? as usize)
    }

    /// Pops `count` values, returning them in the order they were pushed.
    pub fn pop_slice(&mut self, count: usize) -> Result<&[i32], HintErrorKind> {
        let base = self.top.checked_sub(count).ok_or(ValueStackUnderflow)?;
        self.top = base;
        Ok(&self.values[base..base + count])
    }

    /// Replaces the top value `a` with `op(a)`.
    pub fn apply_unary(
        &mut self,
        mut op: impl FnMut(i32) -> Result<i32, HintErrorKind>,
    ) -> Result<(), HintErrorKind> {
        let a = self.pop()?;
        self.push(op(a)?)
    }

    /// Replaces the top two values, `b` above `a`, with `op(a, b)`.
    pub fn apply_binary(
        &mut self,
        mut op: impl FnMut(i32, i32) -> Result<i32, HintErrorKind>,
    ) -> Result<(), HintErrorKind> {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(op(a, b)?)
    }

    pub fn clear(&mut self) {
        self.top = 0;
    }

    pub fn dup(&mut self) -> Result<(), HintErrorKind> {
        let top = self.peek().ok_or(ValueStackUnderflow)?;
        self.push(top)
    }

    pub fn swap(&mut self) -> Result<(), HintErrorKind> {
        let a = self.pop()?;
        let b = self.pop()?;
        self.push(a)?;
        self.push(b)
    }

    /// CINDEX: pushes a copy of the element at the popped depth.
    pub fn copy_index(&mut self) -> Result<(), HintErrorKind> {
        let ix = self.element_index()?;
        self.push(self.values[ix])
    }

    /// MINDEX: moves the element at the popped depth to the top.
    pub fn move_index(&mut self) -> Result<(), HintErrorKind> {
        let ix = self.element_index()?;
        self.values[ix..self.top].rotate_left(1);
        Ok(())
    }

    /// ROLL: `a b c` becomes `b c a`.
    pub fn roll(&mut self) -> Result<(), HintErrorKind> {
        let base = self.top.checked_sub(3).ok_or(ValueStackUnderflow)?;
        self.values[base..self.top].rotate_left(1);
        Ok(())
    }

    /// Pops a one based depth from the top of the stack and returns the
    /// absolute index of the element at that depth.
    fn element_index(&mut self) -> Result<usize, HintErrorKind> {
        let depth = self.pop()?;
        if depth <= 0 || depth as usize > self.top {
            return Err(InvalidStackValue(depth));
        }
        Ok(self.top - depth as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::{HintErrorKind, ValueStack};
    use crate::hint::code::{opcodes as op, Decoder};

    fn stack_with(values: &[i32], storage: &mut [i32]) -> usize {
        storage[..values.len()].copy_from_slice(values);
        values.len()
    }

    macro_rules! make_stack {
        ($values:expr, $storage:ident) => {{
            let len = stack_with($values, &mut $storage);
            let mut stack = ValueStack::new(&mut $storage);
            stack.top = len;
            stack
        }};
    }

    #[test]
    fn push_args() {
        let mut storage = [0; 32];
        let mut stack = ValueStack::new(&mut storage);
        let code = [op::PUSHW001, 0xFF, 0xFE, 0x01, 0x00, op::NPUSHB, 2, 254, 7];
        let mut decoder = Decoder::new(&code, 0);
        while let Some(ins) = decoder.decode() {
            stack.push_args(&ins.unwrap().arguments).unwrap();
        }
        assert_eq!(stack.values(), &[-2, 256, 254, 7]);
    }

    #[test]
    fn overflow() {
        let mut storage = [0; 2];
        let mut stack = ValueStack::new(&mut storage);
        stack.push(1).unwrap();
        stack.push(2).unwrap();
        assert_eq!(stack.push(3), Err(HintErrorKind::ValueStackOverflow));
        let code = [op::PUSHB000, 1];
        let ins = Decoder::new(&code, 0).next().unwrap();
        assert_eq!(
            stack.push_args(&ins.arguments),
            Err(HintErrorKind::ValueStackOverflow)
        );
    }

    #[test]
    fn pop() {
        let mut storage = [0; 4];
        let mut stack = make_stack!(&[0, 1, 2, 3], storage);
        for i in (0..4).rev() {
            assert_eq!(stack.pop().ok(), Some(i));
        }
        assert_eq!(stack.pop(), Err(HintErrorKind::ValueStackUnderflow));
    }

    #[test]
    fn pop_slice() {
        let mut storage = [0; 4];
        let mut stack = make_stack!(&[5, 6, 7], storage);
        assert_eq!(stack.pop_slice(2).unwrap(), &[6, 7]);
        assert_eq!(stack.values(), &[5]);
        assert_eq!(stack.pop_slice(2), Err(HintErrorKind::ValueStackUnderflow));
    }

    #[test]
    fn dup() {
        let mut storage = [0; 4];
        let mut stack = make_stack!(&[-4, 64], storage);
        stack.dup().unwrap();
        assert_eq!(stack.values(), &[-4, 64, 64]);
    }

    #[test]
    fn swap() {
        let mut storage = [0; 3];
        let mut stack = make_stack!(&[7, 40, 90], storage);
        stack.swap().unwrap();
        assert_eq!(stack.values(), &[7, 90, 40]);
    }

    #[test]
    fn copy_index() {
        let mut storage = [0; 5];
        // depth 1 is the element just below the popped depth
        let mut stack = make_stack!(&[11, 22, 33, 44, 4], storage);
        stack.copy_index().unwrap();
        assert_eq!(stack.values(), &[11, 22, 33, 44, 11]);
    }

    #[test]
    fn move_index() {
        let mut storage = [0; 5];
        let mut stack = make_stack!(&[11, 22, 33, 44, 3], storage);
        stack.move_index().unwrap();
        assert_eq!(stack.values(), &[11, 33, 44, 22]);
    }

    #[test]
    fn bad_index() {
        let mut storage = [0; 5];
        let mut stack = make_stack!(&[4, 10, 0], storage);
        assert_eq!(stack.copy_index(), Err(HintErrorKind::InvalidStackValue(0)));
        stack.push(3).unwrap();
        assert_eq!(stack.move_index(), Err(HintErrorKind::InvalidStackValue(3)));
    }

    #[test]
    fn roll() {
        let mut storage = [0; 3];
        let mut stack = make_stack!(&[5, 6, 7], storage);
        stack.roll().unwrap();
        assert_eq!(stack.values(), &[6, 7, 5]);
    }

    #[test]
    fn binop() {
        let mut storage = [0; 32];
        let mut stack = ValueStack::new(&mut storage);
        for value in 2..=6 {
            stack.push(value).unwrap();
        }
        stack.apply_binary(|a, b| Ok(a + b)).unwrap();
        assert_eq!(stack.values(), &[2, 3, 4, 11]);
        stack.apply_binary(|a, b| Ok(a * b)).unwrap();
        stack.apply_binary(|a, b| Ok(a - b)).unwrap();
        assert_eq!(stack.peek(), Some(-41));
        stack.apply_unary(|a| Ok(-a)).unwrap();
        assert_eq!(stack.values(), &[2, 41]);
    }
}
