//! Managing the control value table.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#managing-the-control-value-table>

use super::{Engine, HintErrorKind, OpResult};
use crate::font::scale_value;

impl Engine<'_> {
    /// Write control value table in pixel units.
    ///
    /// WCVTP[] (0x44)
    ///
    /// Pops: value: number in pixels (F26Dot6)
    ///       location: control value table location
    pub(super) fn op_wcvtp(&mut self) -> OpResult {
        let value = self.value_stack.pop()?;
        let location = self.value_stack.pop_usize()?;
        *self.cvt_mut(location)? = value;
        Ok(())
    }

    /// Write control value table in font units.
    ///
    /// WCVTF[] (0x70)
    ///
    /// Pops: value: number in font units
    ///       location: control value table location
    ///
    /// The value is scaled to the current size before it is stored.
    pub(super) fn op_wcvtf(&mut self) -> OpResult {
        let value = self.value_stack.pop()?;
        let location = self.value_stack.pop_usize()?;
        let scaled = scale_value(self.scale, value, self.units_per_em);
        *self.cvt_mut(location)? = scaled;
        Ok(())
    }

    /// Read control value table.
    ///
    /// RCVT[] (0x45)
    ///
    /// Pops: location: CVT entry number
    /// Pushes: value: CVT value (F26Dot6)
    pub(super) fn op_rcvt(&mut self) -> OpResult {
        let location = self.value_stack.pop_usize()?;
        let value = self.cvt_value(location)?;
        self.value_stack.push(value)
    }

    pub(super) fn cvt_value(&self, location: usize) -> Result<i32, HintErrorKind> {
        self.cvt
            .get(location)
            .copied()
            .ok_or(HintErrorKind::InvalidCvtIndex(location))
    }

    fn cvt_mut(&mut self, location: usize) -> Result<&mut i32, HintErrorKind> {
        self.cvt
            .get_mut(location)
            .ok_or(HintErrorKind::InvalidCvtIndex(location))
    }
}
