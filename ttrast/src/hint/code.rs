//! Bytecode decoding and opcode names.

use super::error::HintErrorKind;

/// Which of the three bytecode streams a piece of code lives in.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
#[repr(u8)]
pub enum Program {
    /// `fpgm`, run once per font.
    #[default]
    Font = 0,
    /// `prep`, run whenever the scale changes.
    ControlValue = 1,
    /// Instructions attached to a glyph in `glyf`.
    Glyph = 2,
}

#[derive(Copy, Clone, Debug)]
pub struct Instruction<'a> {
    pub opcode: u8,
    /// Inline operands; empty unless this is a push.
    pub arguments: Arguments<'a>,
    /// Offset of the opcode byte.
    pub pc: usize,
}

impl Instruction<'_> {
    pub fn name(&self) -> &'static str {
        opcode_name(self.opcode)
    }
}

/// Operand bytes following NPUSHB, NPUSHW, PUSHB or PUSHW.
#[derive(Copy, Clone, Default, Debug)]
pub struct Arguments<'a> {
    raw: &'a [u8],
    is_words: bool,
}

impl<'a> Arguments<'a> {
    /// Number of values, not bytes.
    pub fn len(&self) -> usize {
        if self.is_words {
            self.raw.len() / 2
        } else {
            self.raw.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Byte operands are unsigned, word operands are signed big endian.
    pub fn values(&self) -> impl Iterator<Item = i32> + 'a {
        let width = if self.is_words { 2 } else { 1 };
        self.raw.chunks_exact(width).map(|chunk| match *chunk {
            [hi, lo] => i16::from_be_bytes([hi, lo]) as i32,
            [byte] => byte as i32,
            _ => 0,
        })
    }
}

/// Cursor over one program's bytecode.
#[derive(Copy, Clone, Default, Debug)]
pub struct Decoder<'a> {
    pub bytecode: &'a [u8],
    /// Offset of the next opcode.
    pub pc: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(bytecode: &'a [u8], pc: usize) -> Self {
        Self { bytecode, pc }
    }

    /// Returns `None` once the end of the program is reached.
    pub fn decode(&mut self) -> Option<Result<Instruction<'a>, HintErrorKind>> {
        let opcode = *self.bytecode.get(self.pc)?;
        Some(self.decode_inner(opcode))
    }

    /// Like [`decode`](Self::decode), for callers that need another
    /// instruction to exist.
    pub fn next(&mut self) -> Result<Instruction<'a>, HintErrorKind> {
        let opcode = *self
            .bytecode
            .get(self.pc)
            .ok_or(HintErrorKind::UnexpectedEndOfBytecode)?;
        self.decode_inner(opcode)
    }

    fn decode_inner(&mut self, opcode: u8) -> Result<Instruction<'a>, HintErrorKind> {
        let pc = self.pc;
        let (arg_start, count, is_words) = match opcode {
            opcodes::NPUSHB | opcodes::NPUSHW => {
                let count = *self
                    .bytecode
                    .get(pc + 1)
                    .ok_or(HintErrorKind::UnexpectedEndOfBytecode)?
                    as usize;
                (pc + 2, count, opcode == opcodes::NPUSHW)
            }
            opcodes::PUSHB000..=opcodes::PUSHB111 => {
                (pc + 1, (opcode - opcodes::PUSHB000) as usize + 1, false)
            }
            opcodes::PUSHW000..=opcodes::PUSHW111 => {
                (pc + 1, (opcode - opcodes::PUSHW000) as usize + 1, true)
            }
            _ => (pc + 1, 0, false),
        };
        let arg_len = if is_words { count * 2 } else { count };
        let raw = self
            .bytecode
            .get(arg_start..arg_start + arg_len)
            .ok_or(HintErrorKind::UnexpectedEndOfBytecode)?;
        self.pc = arg_start + arg_len;
        Ok(Instruction {
            opcode,
            arguments: Arguments { raw, is_words },
            pc,
        })
    }
}

/// Opcode values. Instructions with flag bits are named with the flag bits
/// in binary, giving the first and last opcode of each family.
pub mod opcodes {
    pub const SVTCA0: u8 = 0x00;
    pub const SVTCA1: u8 = 0x01;
    pub const SPVTCA0: u8 = 0x02;
    pub const SPVTCA1: u8 = 0x03;
    pub const SFVTCA0: u8 = 0x04;
    pub const SFVTCA1: u8 = 0x05;
    pub const SPVTL0: u8 = 0x06;
    pub const SPVTL1: u8 = 0x07;
    pub const SFVTL0: u8 = 0x08;
    pub const SFVTL1: u8 = 0x09;
    pub const SPVFS: u8 = 0x0A;
    pub const SFVFS: u8 = 0x0B;
    pub const GPV: u8 = 0x0C;
    pub const GFV: u8 = 0x0D;
    pub const SFVTPV: u8 = 0x0E;
    pub const ISECT: u8 = 0x0F;
    pub const SRP0: u8 = 0x10;
    pub const SRP1: u8 = 0x11;
    pub const SRP2: u8 = 0x12;
    pub const SZP0: u8 = 0x13;
    pub const SZP1: u8 = 0x14;
    pub const SZP2: u8 = 0x15;
    pub const SZPS: u8 = 0x16;
    pub const SLOOP: u8 = 0x17;
    pub const RTG: u8 = 0x18;
    pub const RTHG: u8 = 0x19;
    pub const SMD: u8 = 0x1A;
    pub const ELSE: u8 = 0x1B;
    pub const JMPR: u8 = 0x1C;
    pub const SCVTCI: u8 = 0x1D;
    pub const SSWCI: u8 = 0x1E;
    pub const SSW: u8 = 0x1F;
    pub const DUP: u8 = 0x20;
    pub const POP: u8 = 0x21;
    pub const CLEAR: u8 = 0x22;
    pub const SWAP: u8 = 0x23;
    pub const DEPTH: u8 = 0x24;
    pub const CINDEX: u8 = 0x25;
    pub const MINDEX: u8 = 0x26;
    pub const ALIGNPTS: u8 = 0x27;
    pub const UTP: u8 = 0x29;
    pub const LOOPCALL: u8 = 0x2A;
    pub const CALL: u8 = 0x2B;
    pub const FDEF: u8 = 0x2C;
    pub const ENDF: u8 = 0x2D;
    pub const MDAP0: u8 = 0x2E;
    pub const MDAP1: u8 = 0x2F;
    pub const IUP0: u8 = 0x30;
    pub const IUP1: u8 = 0x31;
    pub const SHP0: u8 = 0x32;
    pub const SHP1: u8 = 0x33;
    pub const SHC0: u8 = 0x34;
    pub const SHC1: u8 = 0x35;
    pub const SHZ0: u8 = 0x36;
    pub const SHZ1: u8 = 0x37;
    pub const SHPIX: u8 = 0x38;
    pub const IP: u8 = 0x39;
    pub const MSIRP0: u8 = 0x3A;
    pub const MSIRP1: u8 = 0x3B;
    pub const ALIGNRP: u8 = 0x3C;
    pub const RTDG: u8 = 0x3D;
    pub const MIAP0: u8 = 0x3E;
    pub const MIAP1: u8 = 0x3F;
    pub const NPUSHB: u8 = 0x40;
    pub const NPUSHW: u8 = 0x41;
    pub const WS: u8 = 0x42;
    pub const RS: u8 = 0x43;
    pub const WCVTP: u8 = 0x44;
    pub const RCVT: u8 = 0x45;
    pub const GC0: u8 = 0x46;
    pub const GC1: u8 = 0x47;
    pub const SCFS: u8 = 0x48;
    pub const MD0: u8 = 0x49;
    pub const MD1: u8 = 0x4A;
    pub const MPPEM: u8 = 0x4B;
    pub const MPS: u8 = 0x4C;
    pub const FLIPON: u8 = 0x4D;
    pub const FLIPOFF: u8 = 0x4E;
    pub const DEBUG: u8 = 0x4F;
    pub const LT: u8 = 0x50;
    pub const LTEQ: u8 = 0x51;
    pub const GT: u8 = 0x52;
    pub const GTEQ: u8 = 0x53;
    pub const EQ: u8 = 0x54;
    pub const NEQ: u8 = 0x55;
    pub const ODD: u8 = 0x56;
    pub const EVEN: u8 = 0x57;
    pub const IF: u8 = 0x58;
    pub const EIF: u8 = 0x59;
    pub const AND: u8 = 0x5A;
    pub const OR: u8 = 0x5B;
    pub const NOT: u8 = 0x5C;
    pub const DELTAP1: u8 = 0x5D;
    pub const SDB: u8 = 0x5E;
    pub const SDS: u8 = 0x5F;
    pub const ADD: u8 = 0x60;
    pub const SUB: u8 = 0x61;
    pub const DIV: u8 = 0x62;
    pub const MUL: u8 = 0x63;
    pub const ABS: u8 = 0x64;
    pub const NEG: u8 = 0x65;
    pub const FLOOR: u8 = 0x66;
    pub const CEILING: u8 = 0x67;
    pub const ROUND00: u8 = 0x68;
    pub const ROUND11: u8 = 0x6B;
    pub const NROUND00: u8 = 0x6C;
    pub const NROUND11: u8 = 0x6F;
    pub const WCVTF: u8 = 0x70;
    pub const DELTAP2: u8 = 0x71;
    pub const DELTAP3: u8 = 0x72;
    pub const DELTAC1: u8 = 0x73;
    pub const DELTAC2: u8 = 0x74;
    pub const DELTAC3: u8 = 0x75;
    pub const SROUND: u8 = 0x76;
    pub const S45ROUND: u8 = 0x77;
    pub const JROT: u8 = 0x78;
    pub const JROF: u8 = 0x79;
    pub const ROFF: u8 = 0x7A;
    pub const RUTG: u8 = 0x7C;
    pub const RDTG: u8 = 0x7D;
    pub const SANGW: u8 = 0x7E;
    pub const AA: u8 = 0x7F;
    pub const FLIPPT: u8 = 0x80;
    pub const FLIPRGON: u8 = 0x81;
    pub const FLIPRGOFF: u8 = 0x82;
    pub const SCANCTRL: u8 = 0x85;
    pub const SDPVTL0: u8 = 0x86;
    pub const SDPVTL1: u8 = 0x87;
    pub const GETINFO: u8 = 0x88;
    pub const IDEF: u8 = 0x89;
    pub const ROLL: u8 = 0x8A;
    pub const MAX: u8 = 0x8B;
    pub const MIN: u8 = 0x8C;
    pub const SCANTYPE: u8 = 0x8D;
    pub const INSTCTRL: u8 = 0x8E;
    pub const PUSHB000: u8 = 0xB0;
    pub const PUSHB001: u8 = 0xB1;
    pub const PUSHB010: u8 = 0xB2;
    pub const PUSHB011: u8 = 0xB3;
    pub const PUSHB111: u8 = 0xB7;
    pub const PUSHW000: u8 = 0xB8;
    pub const PUSHW001: u8 = 0xB9;
    pub const PUSHW111: u8 = 0xBF;
    pub const MDRP00000: u8 = 0xC0;
    pub const MDRP11111: u8 = 0xDF;
    pub const MIRP00000: u8 = 0xE0;
    pub const MIRP11111: u8 = 0xFF;
}

/// Returns the mnemonic for an opcode, or `"??"` for opcodes that are not
/// assigned.
pub fn opcode_name(opcode: u8) -> &'static str {
    use opcodes::*;
    match opcode {
        SVTCA0..=SVTCA1 => "SVTCA",
        SPVTCA0..=SPVTCA1 => "SPVTCA",
        SFVTCA0..=SFVTCA1 => "SFVTCA",
        SPVTL0..=SPVTL1 => "SPVTL",
        SFVTL0..=SFVTL1 => "SFVTL",
        SPVFS => "SPVFS",
        SFVFS => "SFVFS",
        GPV => "GPV",
        GFV => "GFV",
        SFVTPV => "SFVTPV",
        ISECT => "ISECT",
        SRP0 => "SRP0",
        SRP1 => "SRP1",
        SRP2 => "SRP2",
        SZP0 => "SZP0",
        SZP1 => "SZP1",
        SZP2 => "SZP2",
        SZPS => "SZPS",
        SLOOP => "SLOOP",
        RTG => "RTG",
        RTHG => "RTHG",
        SMD => "SMD",
        ELSE => "ELSE",
        JMPR => "JMPR",
        SCVTCI => "SCVTCI",
        SSWCI => "SSWCI",
        SSW => "SSW",
        DUP => "DUP",
        POP => "POP",
        CLEAR => "CLEAR",
        SWAP => "SWAP",
        DEPTH => "DEPTH",
        CINDEX => "CINDEX",
        MINDEX => "MINDEX",
        ALIGNPTS => "ALIGNPTS",
        UTP => "UTP",
        LOOPCALL => "LOOPCALL",
        CALL => "CALL",
        FDEF => "FDEF",
        ENDF => "ENDF",
        MDAP0..=MDAP1 => "MDAP",
        IUP0..=IUP1 => "IUP",
        SHP0..=SHP1 => "SHP",
        SHC0..=SHC1 => "SHC",
        SHZ0..=SHZ1 => "SHZ",
        SHPIX => "SHPIX",
        IP => "IP",
        MSIRP0..=MSIRP1 => "MSIRP",
        ALIGNRP => "ALIGNRP",
        RTDG => "RTDG",
        MIAP0..=MIAP1 => "MIAP",
        NPUSHB => "NPUSHB",
        NPUSHW => "NPUSHW",
        WS => "WS",
        RS => "RS",
        WCVTP => "WCVTP",
        RCVT => "RCVT",
        GC0..=GC1 => "GC",
        SCFS => "SCFS",
        MD0..=MD1 => "MD",
        MPPEM => "MPPEM",
        MPS => "MPS",
        FLIPON => "FLIPON",
        FLIPOFF => "FLIPOFF",
        DEBUG => "DEBUG",
        LT => "LT",
        LTEQ => "LTEQ",
        GT => "GT",
        GTEQ => "GTEQ",
        EQ => "EQ",
        NEQ => "NEQ",
        ODD => "ODD",
        EVEN => "EVEN",
        IF => "IF",
        EIF => "EIF",
        AND => "AND",
        OR => "OR",
        NOT => "NOT",
        DELTAP1 => "DELTAP1",
        SDB => "SDB",
        SDS => "SDS",
        ADD => "ADD",
        SUB => "SUB",
        DIV => "DIV",
        MUL => "MUL",
        ABS => "ABS",
        NEG => "NEG",
        FLOOR => "FLOOR",
        CEILING => "CEILING",
        ROUND00..=ROUND11 => "ROUND",
        NROUND00..=NROUND11 => "NROUND",
        WCVTF => "WCVTF",
        DELTAP2 => "DELTAP2",
        DELTAP3 => "DELTAP3",
        DELTAC1 => "DELTAC1",
        DELTAC2 => "DELTAC2",
        DELTAC3 => "DELTAC3",
        SROUND => "SROUND",
        S45ROUND => "S45ROUND",
        JROT => "JROT",
        JROF => "JROF",
        ROFF => "ROFF",
        RUTG => "RUTG",
        RDTG => "RDTG",
        SANGW => "SANGW",
        AA => "AA",
        FLIPPT => "FLIPPT",
        FLIPRGON => "FLIPRGON",
        FLIPRGOFF => "FLIPRGOFF",
        SCANCTRL => "SCANCTRL",
        SDPVTL0..=SDPVTL1 => "SDPVTL",
        GETINFO => "GETINFO",
        IDEF => "IDEF",
        ROLL => "ROLL",
        MAX => "MAX",
        MIN => "MIN",
        SCANTYPE => "SCANTYPE",
        INSTCTRL => "INSTCTRL",
        PUSHB000..=PUSHB111 => "PUSHB",
        PUSHW000..=PUSHW111 => "PUSHW",
        MDRP00000..=MDRP11111 => "MDRP",
        MIRP00000..=MIRP11111 => "MIRP",
        _ => "??",
    }
}

#[cfg(test)]
mod tests {
    use super::{opcodes as op, *};

    #[test]
    fn decode_pushes() {
        #[rustfmt::skip]
        let code = [
            op::PUSHB001, 1, 255,
            op::PUSHW000, 0xFF, 0xFE,
            op::NPUSHB, 2, 3, 4,
            op::NPUSHW, 1, 0x01, 0x02,
            op::DUP,
        ];
        let mut decoder = Decoder::new(&code, 0);
        let mut decoded = vec![];
        while let Some(ins) = decoder.decode() {
            let ins = ins.unwrap();
            decoded.push((ins.pc, ins.name(), ins.arguments.values().collect::<Vec<_>>()));
        }
        assert_eq!(
            decoded,
            [
                (0, "PUSHB", vec![1, 255]),
                (3, "PUSHW", vec![-2]),
                (6, "NPUSHB", vec![3, 4]),
                (10, "NPUSHW", vec![0x0102]),
                (14, "DUP", vec![]),
            ]
        );
    }

    #[test]
    fn truncated_push() {
        let mut decoder = Decoder::new(&[op::PUSHW001, 0, 1, 2], 0);
        assert!(matches!(
            decoder.decode(),
            Some(Err(HintErrorKind::UnexpectedEndOfBytecode))
        ));
        let mut decoder = Decoder::new(&[op::NPUSHB], 0);
        assert!(matches!(
            decoder.next(),
            Err(HintErrorKind::UnexpectedEndOfBytecode)
        ));
        let mut decoder = Decoder::new(&[], 0);
        assert!(decoder.decode().is_none());
    }

    #[test]
    fn names() {
        assert_eq!(opcode_name(op::MIRP00000 + 7), "MIRP");
        assert_eq!(opcode_name(op::ROUND00 + 2), "ROUND");
        assert_eq!(opcode_name(0x28), "??");
        assert_eq!(opcode_name(op::GETINFO), "GETINFO");
    }
}
