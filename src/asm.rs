//! Conjunto de instrucciones 6502.
//!
//! Las funciones de ensamblador en línea se componen de instrucciones
//! crudas del procesador objetivo. Este módulo valida que cada par
//! mnemónico/modo de direccionamiento exista y determina su opcode.
//! Los mnemónicos no distinguen mayúsculas de minúsculas.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

pub use unicase::Ascii as NoCase;

/// Mnemónico de una instrucción oficial.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bmi,
    Bne,
    Bpl,
    Bvc,
    Bvs,
    Bit,
    Brk,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
}

impl Mnemonic {
    /// Nombre canónico en mayúsculas.
    pub fn name(self) -> &'static str {
        use Mnemonic::*;

        match self {
            Adc => "ADC",
            And => "AND",
            Asl => "ASL",
            Bcc => "BCC",
            Bcs => "BCS",
            Beq => "BEQ",
            Bmi => "BMI",
            Bne => "BNE",
            Bpl => "BPL",
            Bvc => "BVC",
            Bvs => "BVS",
            Bit => "BIT",
            Brk => "BRK",
            Clc => "CLC",
            Cld => "CLD",
            Cli => "CLI",
            Clv => "CLV",
            Cmp => "CMP",
            Cpx => "CPX",
            Cpy => "CPY",
            Dec => "DEC",
            Dex => "DEX",
            Dey => "DEY",
            Eor => "EOR",
            Inc => "INC",
            Inx => "INX",
            Iny => "INY",
            Jmp => "JMP",
            Jsr => "JSR",
            Lda => "LDA",
            Ldx => "LDX",
            Ldy => "LDY",
            Lsr => "LSR",
            Nop => "NOP",
            Ora => "ORA",
            Pha => "PHA",
            Php => "PHP",
            Pla => "PLA",
            Plp => "PLP",
            Rol => "ROL",
            Ror => "ROR",
            Rti => "RTI",
            Rts => "RTS",
            Sbc => "SBC",
            Sec => "SEC",
            Sed => "SED",
            Sei => "SEI",
            Sta => "STA",
            Stx => "STX",
            Sty => "STY",
            Tax => "TAX",
            Tay => "TAY",
            Tsx => "TSX",
            Txa => "TXA",
            Txs => "TXS",
            Tya => "TYA",
        }
    }
}

impl Display for Mnemonic {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.name())
    }
}

impl FromStr for Mnemonic {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        MNEMONICS
            .iter()
            .find(|&&(name, _)| name == NoCase::new(string))
            .map(|&(_, mnemonic)| mnemonic)
            .ok_or(())
    }
}

/// Modo de direccionamiento.
///
/// Las formas de acumulador (`ASL A`) se tratan como implícitas.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AddrMode {
    Implied,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

impl AddrMode {
    /// Modo de página cero que corresponde a un modo absoluto.
    ///
    /// Algunas instrucciones solo existen en su variante de página cero,
    /// como `STX zp,Y`; un operando absoluto puede usarla si su dirección
    /// cabe en un byte.
    pub fn zp_equivalent(self) -> AddrMode {
        match self {
            AddrMode::Absolute => AddrMode::ZeroPage,
            AddrMode::AbsoluteX => AddrMode::ZeroPageX,
            AddrMode::AbsoluteY => AddrMode::ZeroPageY,
            other => other,
        }
    }
}

impl Display for AddrMode {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AddrMode::*;

        let string = match self {
            Implied => "implied",
            Immediate => "immediate",
            ZeroPage => "zero page",
            ZeroPageX => "zero page,X",
            ZeroPageY => "zero page,Y",
            Absolute => "absolute",
            AbsoluteX => "absolute,X",
            AbsoluteY => "absolute,Y",
            Indirect => "indirect",
            IndirectX => "(indirect,X)",
            IndirectY => "(indirect),Y",
            Relative => "relative",
        };

        fmt.write_str(string)
    }
}

/// Opcode de un par mnemónico/modo, si existe.
pub fn opcode(mnemonic: Mnemonic, mode: AddrMode) -> Option<u8> {
    OPCODES
        .iter()
        .find(|&&(m, a, _)| m == mnemonic && a == mode)
        .map(|&(_, _, code)| code)
}

/// Como [`opcode`], pero recurre a la variante de página cero.
pub fn opcode_or_zp(mnemonic: Mnemonic, mode: AddrMode) -> Option<u8> {
    opcode(mnemonic, mode).or_else(|| opcode(mnemonic, mode.zp_equivalent()))
}

use {AddrMode::*, Mnemonic::*};

const MNEMONICS: &[(NoCase<&str>, Mnemonic)] = &[
    (NoCase::new("adc"), Mnemonic::Adc),
    (NoCase::new("and"), Mnemonic::And),
    (NoCase::new("asl"), Mnemonic::Asl),
    (NoCase::new("bcc"), Mnemonic::Bcc),
    (NoCase::new("bcs"), Mnemonic::Bcs),
    (NoCase::new("beq"), Mnemonic::Beq),
    (NoCase::new("bmi"), Mnemonic::Bmi),
    (NoCase::new("bne"), Mnemonic::Bne),
    (NoCase::new("bpl"), Mnemonic::Bpl),
    (NoCase::new("bvc"), Mnemonic::Bvc),
    (NoCase::new("bvs"), Mnemonic::Bvs),
    (NoCase::new("bit"), Mnemonic::Bit),
    (NoCase::new("brk"), Mnemonic::Brk),
    (NoCase::new("clc"), Mnemonic::Clc),
    (NoCase::new("cld"), Mnemonic::Cld),
    (NoCase::new("cli"), Mnemonic::Cli),
    (NoCase::new("clv"), Mnemonic::Clv),
    (NoCase::new("cmp"), Mnemonic::Cmp),
    (NoCase::new("cpx"), Mnemonic::Cpx),
    (NoCase::new("cpy"), Mnemonic::Cpy),
    (NoCase::new("dec"), Mnemonic::Dec),
    (NoCase::new("dex"), Mnemonic::Dex),
    (NoCase::new("dey"), Mnemonic::Dey),
    (NoCase::new("eor"), Mnemonic::Eor),
    (NoCase::new("inc"), Mnemonic::Inc),
    (NoCase::new("inx"), Mnemonic::Inx),
    (NoCase::new("iny"), Mnemonic::Iny),
    (NoCase::new("jmp"), Mnemonic::Jmp),
    (NoCase::new("jsr"), Mnemonic::Jsr),
    (NoCase::new("lda"), Mnemonic::Lda),
    (NoCase::new("ldx"), Mnemonic::Ldx),
    (NoCase::new("ldy"), Mnemonic::Ldy),
    (NoCase::new("lsr"), Mnemonic::Lsr),
    (NoCase::new("nop"), Mnemonic::Nop),
    (NoCase::new("ora"), Mnemonic::Ora),
    (NoCase::new("pha"), Mnemonic::Pha),
    (NoCase::new("php"), Mnemonic::Php),
    (NoCase::new("pla"), Mnemonic::Pla),
    (NoCase::new("plp"), Mnemonic::Plp),
    (NoCase::new("rol"), Mnemonic::Rol),
    (NoCase::new("ror"), Mnemonic::Ror),
    (NoCase::new("rti"), Mnemonic::Rti),
    (NoCase::new("rts"), Mnemonic::Rts),
    (NoCase::new("sbc"), Mnemonic::Sbc),
    (NoCase::new("sec"), Mnemonic::Sec),
    (NoCase::new("sed"), Mnemonic::Sed),
    (NoCase::new("sei"), Mnemonic::Sei),
    (NoCase::new("sta"), Mnemonic::Sta),
    (NoCase::new("stx"), Mnemonic::Stx),
    (NoCase::new("sty"), Mnemonic::Sty),
    (NoCase::new("tax"), Mnemonic::Tax),
    (NoCase::new("tay"), Mnemonic::Tay),
    (NoCase::new("tsx"), Mnemonic::Tsx),
    (NoCase::new("txa"), Mnemonic::Txa),
    (NoCase::new("txs"), Mnemonic::Txs),
    (NoCase::new("tya"), Mnemonic::Tya),
];

#[rustfmt::skip]
const OPCODES: &[(Mnemonic, AddrMode, u8)] = &[
    (Adc, Immediate, 0x69),
    (Adc, ZeroPage, 0x65),
    (Adc, ZeroPageX, 0x75),
    (Adc, Absolute, 0x6D),
    (Adc, AbsoluteX, 0x7D),
    (Adc, AbsoluteY, 0x79),
    (Adc, IndirectX, 0x61),
    (Adc, IndirectY, 0x71),
    (And, Immediate, 0x29),
    (And, ZeroPage, 0x25),
    (And, ZeroPageX, 0x35),
    (And, Absolute, 0x2D),
    (And, AbsoluteX, 0x3D),
    (And, AbsoluteY, 0x39),
    (And, IndirectX, 0x21),
    (And, IndirectY, 0x31),
    (Asl, Implied, 0x0A),
    (Asl, ZeroPage, 0x06),
    (Asl, ZeroPageX, 0x16),
    (Asl, Absolute, 0x0E),
    (Asl, AbsoluteX, 0x1E),
    (Bcc, Relative, 0x90),
    (Bcs, Relative, 0xB0),
    (Beq, Relative, 0xF0),
    (Bmi, Relative, 0x30),
    (Bne, Relative, 0xD0),
    (Bpl, Relative, 0x10),
    (Bvc, Relative, 0x50),
    (Bvs, Relative, 0x70),
    (Bit, ZeroPage, 0x24),
    (Bit, Absolute, 0x2C),
    (Brk, Implied, 0x00),
    (Clc, Implied, 0x18),
    (Cld, Implied, 0xD8),
    (Cli, Implied, 0x58),
    (Clv, Implied, 0xB8),
    (Cmp, Immediate, 0xC9),
    (Cmp, ZeroPage, 0xC5),
    (Cmp, ZeroPageX, 0xD5),
    (Cmp, Absolute, 0xCD),
    (Cmp, AbsoluteX, 0xDD),
    (Cmp, AbsoluteY, 0xD9),
    (Cmp, IndirectX, 0xC1),
    (Cmp, IndirectY, 0xD1),
    (Cpx, Immediate, 0xE0),
    (Cpx, ZeroPage, 0xE4),
    (Cpx, Absolute, 0xEC),
    (Cpy, Immediate, 0xC0),
    (Cpy, ZeroPage, 0xC4),
    (Cpy, Absolute, 0xCC),
    (Dec, ZeroPage, 0xC6),
    (Dec, ZeroPageX, 0xD6),
    (Dec, Absolute, 0xCE),
    (Dec, AbsoluteX, 0xDE),
    (Dex, Implied, 0xCA),
    (Dey, Implied, 0x88),
    (Eor, Immediate, 0x49),
    (Eor, ZeroPage, 0x45),
    (Eor, ZeroPageX, 0x55),
    (Eor, Absolute, 0x4D),
    (Eor, AbsoluteX, 0x5D),
    (Eor, AbsoluteY, 0x59),
    (Eor, IndirectX, 0x41),
    (Eor, IndirectY, 0x51),
    (Inc, ZeroPage, 0xE6),
    (Inc, ZeroPageX, 0xF6),
    (Inc, Absolute, 0xEE),
    (Inc, AbsoluteX, 0xFE),
    (Inx, Implied, 0xE8),
    (Iny, Implied, 0xC8),
    (Jmp, Absolute, 0x4C),
    (Jmp, Indirect, 0x6C),
    (Jsr, Absolute, 0x20),
    (Lda, Immediate, 0xA9),
    (Lda, ZeroPage, 0xA5),
    (Lda, ZeroPageX, 0xB5),
    (Lda, Absolute, 0xAD),
    (Lda, AbsoluteX, 0xBD),
    (Lda, AbsoluteY, 0xB9),
    (Lda, IndirectX, 0xA1),
    (Lda, IndirectY, 0xB1),
    (Ldx, Immediate, 0xA2),
    (Ldx, ZeroPage, 0xA6),
    (Ldx, ZeroPageY, 0xB6),
    (Ldx, Absolute, 0xAE),
    (Ldx, AbsoluteY, 0xBE),
    (Ldy, Immediate, 0xA0),
    (Ldy, ZeroPage, 0xA4),
    (Ldy, ZeroPageX, 0xB4),
    (Ldy, Absolute, 0xAC),
    (Ldy, AbsoluteX, 0xBC),
    (Lsr, Implied, 0x4A),
    (Lsr, ZeroPage, 0x46),
    (Lsr, ZeroPageX, 0x56),
    (Lsr, Absolute, 0x4E),
    (Lsr, AbsoluteX, 0x5E),
    (Nop, Implied, 0xEA),
    (Ora, Immediate, 0x09),
    (Ora, ZeroPage, 0x05),
    (Ora, ZeroPageX, 0x15),
    (Ora, Absolute, 0x0D),
    (Ora, AbsoluteX, 0x1D),
    (Ora, AbsoluteY, 0x19),
    (Ora, IndirectX, 0x01),
    (Ora, IndirectY, 0x11),
    (Pha, Implied, 0x48),
    (Php, Implied, 0x08),
    (Pla, Implied, 0x68),
    (Plp, Implied, 0x28),
    (Rol, Implied, 0x2A),
    (Rol, ZeroPage, 0x26),
    (Rol, ZeroPageX, 0x36),
    (Rol, Absolute, 0x2E),
    (Rol, AbsoluteX, 0x3E),
    (Ror, Implied, 0x6A),
    (Ror, ZeroPage, 0x66),
    (Ror, ZeroPageX, 0x76),
    (Ror, Absolute, 0x6E),
    (Ror, AbsoluteX, 0x7E),
    (Rti, Implied, 0x40),
    (Rts, Implied, 0x60),
    (Sbc, Immediate, 0xE9),
    (Sbc, ZeroPage, 0xE5),
    (Sbc, ZeroPageX, 0xF5),
    (Sbc, Absolute, 0xED),
    (Sbc, AbsoluteX, 0xFD),
    (Sbc, AbsoluteY, 0xF9),
    (Sbc, IndirectX, 0xE1),
    (Sbc, IndirectY, 0xF1),
    (Sec, Implied, 0x38),
    (Sed, Implied, 0xF8),
    (Sei, Implied, 0x78),
    (Sta, ZeroPage, 0x85),
    (Sta, ZeroPageX, 0x95),
    (Sta, Absolute, 0x8D),
    (Sta, AbsoluteX, 0x9D),
    (Sta, AbsoluteY, 0x99),
    (Sta, IndirectX, 0x81),
    (Sta, IndirectY, 0x91),
    (Stx, ZeroPage, 0x86),
    (Stx, ZeroPageY, 0x96),
    (Stx, Absolute, 0x8E),
    (Sty, ZeroPage, 0x84),
    (Sty, ZeroPageX, 0x94),
    (Sty, Absolute, 0x8C),
    (Tax, Implied, 0xAA),
    (Tay, Implied, 0xA8),
    (Tsx, Implied, 0xBA),
    (Txa, Implied, 0x8A),
    (Txs, Implied, 0x9A),
    (Tya, Implied, 0x98),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonics_ignore_case() {
        assert_eq!("lda".parse(), Ok(Mnemonic::Lda));
        assert_eq!("LdA".parse(), Ok(Mnemonic::Lda));
        assert_eq!("TXS".parse(), Ok(Mnemonic::Txs));
        assert_eq!("ldz".parse::<Mnemonic>(), Err(()));
    }

    #[test]
    fn known_opcodes() {
        assert_eq!(opcode(Mnemonic::Lda, AddrMode::Immediate), Some(0xA9));
        assert_eq!(opcode(Mnemonic::Jmp, AddrMode::Indirect), Some(0x6C));
        assert_eq!(opcode(Mnemonic::Rts, AddrMode::Implied), Some(0x60));
        assert_eq!(opcode(Mnemonic::Sta, AddrMode::Immediate), None);
    }

    #[test]
    fn zero_page_fallback() {
        assert_eq!(opcode(Mnemonic::Stx, AddrMode::AbsoluteY), None);
        assert_eq!(opcode_or_zp(Mnemonic::Stx, AddrMode::AbsoluteY), Some(0x96));
        assert_eq!(opcode_or_zp(Mnemonic::Lda, AddrMode::Absolute), Some(0xAD));
        assert_eq!(opcode_or_zp(Mnemonic::Bit, AddrMode::AbsoluteX), None);
    }

    #[test]
    fn every_mnemonic_has_a_name() {
        for &(name, mnemonic) in MNEMONICS {
            assert_eq!(NoCase::new(mnemonic.name()), name);
            assert!(OPCODES.iter().any(|&(m, _, _)| m == mnemonic));
        }
    }
}
