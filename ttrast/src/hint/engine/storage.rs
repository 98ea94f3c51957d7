//! Managing the storage area.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#managing-the-storage-area>

use super::{Engine, HintErrorKind, OpResult};

impl Engine<'_> {
    /// Read store.
    ///
    /// RS[] (0x43)
    ///
    /// Pops: location: storage area index
    /// Pushes: storage area value
    pub(super) fn op_rs(&mut self) -> OpResult {
        let location = self.value_stack.pop_usize()?;
        let value = *self
            .storage
            .get(location)
            .ok_or(HintErrorKind::InvalidStorageIndex(location))?;
        self.value_stack.push(value)
    }

    /// Write store.
    ///
    /// WS[] (0x42)
    ///
    /// Pops: value: storage area value
    ///       location: storage area index
    pub(super) fn op_ws(&mut self) -> OpResult {
        let value = self.value_stack.pop()?;
        let location = self.value_stack.pop_usize()?;
        *self
            .storage
            .get_mut(location)
            .ok_or(HintErrorKind::InvalidStorageIndex(location))? = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{mock, HintErrorKind};
    use crate::hint::code::opcodes as op;

    #[test]
    fn write_then_read() {
        #[rustfmt::skip]
        let code = [
            op::PUSHB001, 22, 44,
            op::WS,
            op::PUSHB000, 22,
            op::RS,
        ];
        assert_eq!(mock::run(&code).unwrap(), [44]);
    }

    #[test]
    fn out_of_bounds() {
        let code = [op::PUSHB000, 200, op::RS];
        assert_eq!(
            mock::run(&code),
            Err(HintErrorKind::InvalidStorageIndex(200))
        );
    }
}
