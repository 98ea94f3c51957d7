//! Defining and using functions and instructions.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#defining-and-using-functions-and-instructions>

use super::{
    super::{
        code::{opcodes as op, Program},
        definition::Definition,
    },
    Engine, HintErrorKind, OpResult,
};

#[derive(Copy, Clone)]
enum DefKind {
    Function,
    Instruction,
}

impl Engine<'_> {
    /// Function definition.
    ///
    /// FDEF[] (0x2C)
    ///
    /// Pops: f: function identifier number
    ///
    /// Records the code up to the matching ENDF as function `f` and skips
    /// past it. Only allowed in the font and control value programs.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#function-definition>
    pub(super) fn op_fdef(&mut self) -> OpResult {
        let f = self.value_stack.pop()?;
        self.define(DefKind::Function, f)
    }

    /// End function definition.
    ///
    /// ENDF[] (0x2D)
    ///
    /// Returns to the caller, or restarts the function if a LOOPCALL has
    /// iterations left.
    pub(super) fn op_endf(&mut self) -> OpResult {
        self.program.leave()
    }

    /// Call function.
    ///
    /// CALL[] (0x2B)
    ///
    /// Pops: f: function identifier number
    pub(super) fn op_call(&mut self) -> OpResult {
        let f = self.value_stack.pop()?;
        self.call(DefKind::Function, 1, f)
    }

    /// Loop and call function.
    ///
    /// LOOPCALL[] (0x2A)
    ///
    /// Pops: f: function identifier number
    ///       count: number of times to call the function
    ///
    /// A count of zero or less does nothing.
    pub(super) fn op_loopcall(&mut self) -> OpResult {
        let f = self.value_stack.pop()?;
        let count = self.value_stack.pop()?;
        if count > 0 {
            self.call(DefKind::Function, count as u32, f)
        } else {
            Ok(())
        }
    }

    /// Instruction definition.
    ///
    /// IDEF[] (0x89)
    ///
    /// Pops: opcode
    ///
    /// Like FDEF[] but the definition is invoked whenever the otherwise
    /// unassigned `opcode` is executed.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#instruction-definition>
    pub(super) fn op_idef(&mut self) -> OpResult {
        let opcode = self.value_stack.pop()?;
        self.define(DefKind::Instruction, opcode)
    }

    /// Executes an opcode with no built in meaning, using the matching
    /// instruction definition if one exists.
    pub(super) fn op_unknown(&mut self, opcode: u8) -> OpResult {
        match self.definitions.instructions.get(opcode as i32) {
            Some(def) => {
                let def = *def;
                self.program.enter(def, 1)
            }
            None => Err(HintErrorKind::Unimplemented(opcode)),
        }
    }

    fn define(&mut self, kind: DefKind, key: i32) -> OpResult {
        if self.program.initial == Program::Glyph {
            return Err(HintErrorKind::DefinitionInGlyphProgram);
        }
        let start = self.program.decoder.pc;
        let end = loop {
            let ins = match self.program.decoder.decode() {
                Some(ins) => ins?,
                None => return Err(HintErrorKind::UnbalancedDefinition),
            };
            match ins.opcode {
                op::FDEF | op::IDEF => return Err(HintErrorKind::NestedDefinition),
                op::ENDF => break ins.pc + 1,
                _ => {}
            }
        };
        let defs = match kind {
            DefKind::Function => &mut self.definitions.functions,
            DefKind::Instruction => &mut self.definitions.instructions,
        };
        *defs.allocate(key)? = Definition::new(self.program.current, start..end, key);
        Ok(())
    }

    fn call(&mut self, kind: DefKind, count: u32, key: i32) -> OpResult {
        let defs = match kind {
            DefKind::Function => &self.definitions.functions,
            DefKind::Instruction => &self.definitions.instructions,
        };
        let def = *defs.get(key).ok_or(HintErrorKind::UndefinedFunction(key))?;
        self.program.enter(def, count)
    }
}
