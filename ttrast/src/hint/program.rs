//! Active program selection and the function call stack.

use core::ops::Range;

use super::{
    code::{Decoder, Program},
    definition::Definition,
    error::HintErrorKind,
};

/// Calls may nest this deep.
const MAX_CALL_DEPTH: usize = 32;

/// One active CALL, LOOPCALL or user instruction.
#[derive(Copy, Clone, Default, Debug)]
struct Frame {
    definition: Definition,
    /// Where execution resumes once the body has run `remaining` more times.
    caller: Program,
    return_pc: usize,
    remaining: u32,
}

#[derive(Default)]
struct Frames {
    slots: [Frame; MAX_CALL_DEPTH],
    depth: usize,
}

impl Frames {
    fn push(&mut self, frame: Frame) -> Result<(), HintErrorKind> {
        let slot = self
            .slots
            .get_mut(self.depth)
            .ok_or(HintErrorKind::CallStackOverflow)?;
        *slot = frame;
        self.depth += 1;
        Ok(())
    }

    fn top(&self) -> Option<&Frame> {
        self.depth.checked_sub(1).map(|ix| &self.slots[ix])
    }

    fn top_mut(&mut self) -> Option<&mut Frame> {
        self.depth.checked_sub(1).map(|ix| &mut self.slots[ix])
    }
}

/// The three bytecode streams of a font and the decoder for whichever one
/// is currently executing.
pub struct ProgramState<'a> {
    pub bytecode: [&'a [u8]; 3],
    /// Program the interpreter was started on.
    pub initial: Program,
    pub current: Program,
    pub decoder: Decoder<'a>,
    frames: Frames,
}

impl<'a> ProgramState<'a> {
    pub fn new(
        font_code: &'a [u8],
        cv_code: &'a [u8],
        glyph_code: &'a [u8],
        initial: Program,
    ) -> Self {
        let bytecode = [font_code, cv_code, glyph_code];
        Self {
            bytecode,
            initial,
            current: initial,
            decoder: Decoder::new(bytecode[initial as usize], 0),
            frames: Frames::default(),
        }
    }

    /// Number of calls currently active.
    pub fn call_depth(&self) -> usize {
        self.frames.depth
    }

    /// Transfers control to the body of `definition`, which will run
    /// `count` times before returning to the current position.
    pub fn enter(&mut self, definition: Definition, count: u32) -> Result<(), HintErrorKind> {
        self.frames.push(Frame {
            definition,
            caller: self.current,
            return_pc: self.decoder.pc,
            remaining: count,
        })?;
        self.switch_to(definition.program(), definition.code_range().start);
        Ok(())
    }

    /// Handles ENDF: either restarts the body of the innermost call or
    /// returns to its caller.
    pub fn leave(&mut self) -> Result<(), HintErrorKind> {
        let frame = self
            .frames
            .top_mut()
            .ok_or(HintErrorKind::CallStackUnderflow)?;
        if frame.remaining > 1 {
            frame.remaining -= 1;
            self.decoder.pc = frame.definition.code_range().start;
            return Ok(());
        }
        let (caller, return_pc) = (frame.caller, frame.return_pc);
        self.frames.depth -= 1;
        self.switch_to(caller, return_pc);
        Ok(())
    }

    /// Byte range a jump may land in: the body of the innermost call, or
    /// the whole program outside of any call.
    pub fn jump_bounds(&self) -> Range<usize> {
        self.frames
            .top()
            .map(|frame| frame.definition.code_range())
            .unwrap_or(0..self.decoder.bytecode.len())
    }

    fn switch_to(&mut self, program: Program, pc: usize) {
        self.current = program;
        self.decoder = Decoder::new(self.bytecode[program as usize], pc);
    }
}
