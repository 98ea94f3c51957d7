//! Interpreter errors.

use ttrast_types::GlyphId;

use super::code::{opcode_name, Program};

/// Reasons a hinting program can fail.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum HintErrorKind {
    UnexpectedEndOfBytecode,
    UnbalancedIf,
    UnbalancedDefinition,
    NestedDefinition,
    DefinitionInGlyphProgram,
    TooManyDefinitions,
    UndefinedFunction(i32),
    ValueStackOverflow,
    ValueStackUnderflow,
    CallStackOverflow,
    CallStackUnderflow,
    InvalidStackValue(i32),
    InvalidPointIndex(usize),
    InvalidContourIndex(usize),
    InvalidZoneIndex(i32),
    InvalidStorageIndex(usize),
    InvalidCvtIndex(usize),
    DivideByZero,
    NegativeLoopCounter,
    InvalidJump,
    StepLimitExceeded,
    ProgramTooLarge(usize),
    Unimplemented(u8),
}

impl core::fmt::Display for HintErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use HintErrorKind::*;
        match self {
            UnexpectedEndOfBytecode => f.write_str("bytecode ended inside an instruction"),
            UnbalancedIf => f.write_str("unbalanced IF/ELSE/EIF"),
            UnbalancedDefinition => f.write_str("FDEF or IDEF without a matching ENDF"),
            NestedDefinition => f.write_str("FDEF or IDEF inside another definition"),
            DefinitionInGlyphProgram => f.write_str("FDEF or IDEF in a glyph program"),
            TooManyDefinitions => f.write_str("no free slot for a new definition"),
            UndefinedFunction(key) => write!(f, "call to undefined function {key}"),
            ValueStackOverflow => f.write_str("value stack overflow"),
            ValueStackUnderflow => f.write_str("value stack underflow"),
            CallStackOverflow => f.write_str("calls nested too deeply"),
            CallStackUnderflow => f.write_str("ENDF outside of a call"),
            InvalidStackValue(value) => write!(f, "unusable stack operand {value}"),
            InvalidPointIndex(index) => write!(f, "no point {index} in the zone"),
            InvalidContourIndex(index) => write!(f, "no contour {index} in the glyph"),
            InvalidZoneIndex(index) => write!(f, "zone {index} is neither 0 nor 1"),
            InvalidStorageIndex(index) => write!(f, "storage slot {index} out of range"),
            InvalidCvtIndex(index) => write!(f, "cvt entry {index} out of range"),
            DivideByZero => f.write_str("division by zero"),
            NegativeLoopCounter => f.write_str("negative SLOOP count"),
            InvalidJump => f.write_str("jump target outside the program"),
            StepLimitExceeded => f.write_str("instruction limit reached"),
            ProgramTooLarge(len) => write!(f, "{len} byte program exceeds the size limit"),
            Unimplemented(opcode) => write!(f, "unsupported opcode 0x{opcode:02X}"),
        }
    }
}

/// A [`HintErrorKind`] with the location it was raised at.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct HintError {
    pub program: Program,
    /// Set for failures in glyph programs.
    pub glyph_id: Option<GlyphId>,
    pub pc: usize,
    pub opcode: Option<u8>,
    pub kind: HintErrorKind,
}

impl core::fmt::Display for HintError {
    /// Formats as `table[glyph]@pc:OPCODE: message`.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let table = match self.program {
            Program::Font => "fpgm",
            Program::ControlValue => "prep",
            Program::Glyph => "glyf",
        };
        f.write_str(table)?;
        if let Some(glyph_id) = self.glyph_id {
            write!(f, "[{}]", glyph_id.to_u16())?;
        }
        write!(f, "@{}:", self.pc)?;
        if let Some(opcode) = self.opcode {
            write!(f, "{}:", opcode_name(opcode))?;
        }
        write!(f, " {}", self.kind)
    }
}

impl std::error::Error for HintError {}
