//! Instruction decoding and dispatch.

use super::{
    super::code::{opcodes as op, Instruction},
    Engine, HintError, HintErrorKind,
};

/// Maximum number of instructions executed by a single call to
/// [`Engine::run`]. Guarantees termination of hostile programs.
///
/// See <https://gitlab.freedesktop.org/freetype/freetype/-/blob/57617782464411201ce7bbc93b086c1b4d7d84a5/include/freetype/config/ftoption.h#L744>
pub const MAX_RUN_INSTRUCTIONS: usize = 1_000_000;

impl<'a> Engine<'a> {
    /// Decodes and dispatches all instructions until completion or error.
    pub fn run(&mut self) -> Result<(), HintError> {
        let mut count = 0;
        while let Some(ins) = self.decode() {
            let ins = ins?;
            self.dispatch(&ins)?;
            count += 1;
            if count > MAX_RUN_INSTRUCTIONS {
                return Err(HintError {
                    program: self.program.current,
                    glyph_id: None,
                    pc: ins.pc,
                    opcode: Some(ins.opcode),
                    kind: HintErrorKind::StepLimitExceeded,
                });
            }
        }
        Ok(())
    }

    /// Decodes the next instruction from the current program.
    fn decode(&mut self) -> Option<Result<Instruction<'a>, HintError>> {
        let pc = self.program.decoder.pc;
        let ins = self.program.decoder.decode()?;
        Some(ins.map_err(|kind| HintError {
            program: self.program.current,
            glyph_id: None,
            pc,
            opcode: None,
            kind,
        }))
    }

    /// Executes the appropriate code for the given instruction.
    fn dispatch(&mut self, ins: &Instruction) -> Result<(), HintError> {
        let program = self.program.current;
        let result = match ins.opcode {
            op::SVTCA0..=op::SFVTCA1 => self.op_svtca(ins.opcode),
            op::SPVTL0..=op::SFVTL1 => self.op_svtl(ins.opcode),
            op::SPVFS => self.op_spvfs(),
            op::SFVFS => self.op_sfvfs(),
            op::GPV => self.op_gpv(),
            op::GFV => self.op_gfv(),
            op::SFVTPV => self.op_sfvtpv(),
            op::ISECT => self.op_isect(),
            op::SRP0 => self.op_srp0(),
            op::SRP1 => self.op_srp1(),
            op::SRP2 => self.op_srp2(),
            op::SZP0 => self.op_szp0(),
            op::SZP1 => self.op_szp1(),
            op::SZP2 => self.op_szp2(),
            op::SZPS => self.op_szps(),
            op::SLOOP => self.op_sloop(),
            op::RTG => self.op_rtg(),
            op::RTHG => self.op_rthg(),
            op::SMD => self.op_smd(),
            op::ELSE => self.op_else(),
            op::JMPR => self.op_jmpr(ins.pc),
            op::SCVTCI => self.op_scvtci(),
            op::SSWCI => self.op_sswci(),
            op::SSW => self.op_ssw(),
            op::DUP => self.op_dup(),
            op::POP => self.op_pop(),
            op::CLEAR => self.op_clear(),
            op::SWAP => self.op_swap(),
            op::DEPTH => self.op_depth(),
            op::CINDEX => self.op_cindex(),
            op::MINDEX => self.op_mindex(),
            op::ALIGNPTS => self.op_alignpts(),
            op::UTP => self.op_utp(),
            op::LOOPCALL => self.op_loopcall(),
            op::CALL => self.op_call(),
            op::FDEF => self.op_fdef(),
            op::ENDF => self.op_endf(),
            op::MDAP0 | op::MDAP1 => self.op_mdap(ins.opcode),
            op::IUP0 | op::IUP1 => self.op_iup(ins.opcode),
            op::SHP0 | op::SHP1 => self.op_shp(ins.opcode),
            op::SHC0 | op::SHC1 => self.op_shc(ins.opcode),
            op::SHZ0 | op::SHZ1 => self.op_shz(ins.opcode),
            op::SHPIX => self.op_shpix(),
            op::IP => self.op_ip(),
            op::MSIRP0 | op::MSIRP1 => self.op_msirp(ins.opcode),
            op::ALIGNRP => self.op_alignrp(),
            op::RTDG => self.op_rtdg(),
            op::MIAP0 | op::MIAP1 => self.op_miap(ins.opcode),
            op::NPUSHB | op::NPUSHW | op::PUSHB000..=op::PUSHW111 => self.op_push(&ins.arguments),
            op::WS => self.op_ws(),
            op::RS => self.op_rs(),
            op::WCVTP => self.op_wcvtp(),
            op::RCVT => self.op_rcvt(),
            op::GC0 | op::GC1 => self.op_gc(ins.opcode),
            op::SCFS => self.op_scfs(),
            op::MD0 | op::MD1 => self.op_md(ins.opcode),
            op::MPPEM => self.op_mppem(),
            op::MPS => self.op_mps(),
            op::FLIPON => self.op_flipon(),
            op::FLIPOFF => self.op_flipoff(),
            op::DEBUG => self.op_debug(),
            op::LT => self.op_lt(),
            op::LTEQ => self.op_lteq(),
            op::GT => self.op_gt(),
            op::GTEQ => self.op_gteq(),
            op::EQ => self.op_eq(),
            op::NEQ => self.op_neq(),
            op::ODD => self.op_odd(),
            op::EVEN => self.op_even(),
            op::IF => self.op_if(),
            op::EIF => self.op_eif(),
            op::AND => self.op_and(),
            op::OR => self.op_or(),
            op::NOT => self.op_not(),
            op::DELTAP1 | op::DELTAP2 | op::DELTAP3 => self.op_deltap(ins.opcode),
            op::SDB => self.op_sdb(),
            op::SDS => self.op_sds(),
            op::ADD => self.op_add(),
            op::SUB => self.op_sub(),
            op::DIV => self.op_div(),
            op::MUL => self.op_mul(),
            op::ABS => self.op_abs(),
            op::NEG => self.op_neg(),
            op::FLOOR => self.op_floor(),
            op::CEILING => self.op_ceiling(),
            op::ROUND00..=op::ROUND11 => self.op_round(),
            op::NROUND00..=op::NROUND11 => self.op_nround(),
            op::WCVTF => self.op_wcvtf(),
            op::DELTAC1 | op::DELTAC2 | op::DELTAC3 => self.op_deltac(ins.opcode),
            op::SROUND => self.op_sround(),
            op::S45ROUND => self.op_s45round(),
            op::JROT => self.op_jrot(ins.pc),
            op::JROF => self.op_jrof(ins.pc),
            op::ROFF => self.op_roff(),
            op::RUTG => self.op_rutg(),
            op::RDTG => self.op_rdtg(),
            op::SANGW => self.op_sangw(),
            op::AA => self.op_aa(),
            op::FLIPPT => self.op_flippt(),
            op::FLIPRGON => self.op_fliprgon(),
            op::FLIPRGOFF => self.op_fliprgoff(),
            op::SCANCTRL => self.op_scanctrl(),
            op::SDPVTL0 | op::SDPVTL1 => self.op_sdpvtl(ins.opcode),
            op::GETINFO => self.op_getinfo(),
            op::IDEF => self.op_idef(),
            op::ROLL => self.op_roll(),
            op::MAX => self.op_max(),
            op::MIN => self.op_min(),
            op::SCANTYPE => self.op_scantype(),
            op::INSTCTRL => self.op_instctrl(),
            op::MDRP00000..=op::MDRP11111 => self.op_mdrp(ins.opcode),
            op::MIRP00000..=op::MIRP11111 => self.op_mirp(ins.opcode),
            _ => self.op_unknown(ins.opcode),
        };
        result.map_err(|kind| HintError {
            program,
            glyph_id: None,
            pc: ins.pc,
            opcode: Some(ins.opcode),
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::{mock, HintErrorKind};
    use crate::hint::code::opcodes as op;

    #[test]
    fn step_limit_stops_infinite_loop() {
        // Pushes -1 and keeps jumping back to the DUP.
        #[rustfmt::skip]
        let code = [
            op::PUSHW000, 0xFF, 0xFF,
            op::DUP,
            op::JMPR,
        ];
        assert_eq!(mock::run(&code), Err(HintErrorKind::StepLimitExceeded));
    }

    #[test]
    fn stack_underflow() {
        assert_eq!(mock::run(&[op::DUP]), Err(HintErrorKind::ValueStackUnderflow));
    }

    #[test]
    fn unknown_opcode() {
        assert_eq!(mock::run(&[0x28]), Err(HintErrorKind::Unimplemented(0x28)));
    }

    #[test]
    fn truncated_push() {
        assert_eq!(
            mock::run(&[op::PUSHB011, 1, 2]),
            Err(HintErrorKind::UnexpectedEndOfBytecode)
        );
    }

    #[test]
    fn error_reports_location() {
        let code = [op::PUSHB000, 1, op::POP, op::POP];
        let mut mock = mock::MockEngine::new();
        let err = mock.engine(&code).run().unwrap_err();
        assert_eq!(err.pc, 3);
        assert_eq!(err.opcode, Some(op::POP));
        assert_eq!(err.to_string(), "fpgm@3:POP: value stack underflow");
    }
}
