//! Instruction set of the machine: the opcode table, operand shapes, the four-slot instruction
//! record and its decoded form.

use std::{error::Error, fmt, str::FromStr};

use crate::symbol::Register;

/// Operand layout of an instruction.
///
/// Register shapes always encode `C` in slot 3, immediate shapes keep the immediate in slot 1 and
/// `C` in slot 2. Slots not named by a shape are zero.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Shape {
    /// Source `C, A, B`, encoded `[op, A, B, C]`.
    Cab,
    /// Source `C, A`, encoded `[op, A, 0, C]`.
    Ca,
    /// Source `A, B`, encoded `[op, A, B, 0]`.
    Ab,
    /// Source `C, imm`, encoded `[op, imm, C, 0]`.
    CImm,
    /// Source `imm, C`, encoded `[op, imm, C, 0]`.
    ImmC,
}

impl Shape {
    /// Amount of operands written in source.
    pub fn operand_count(self) -> usize {
        match self {
            Shape::Cab => 3,
            Shape::Ca | Shape::Ab | Shape::CImm | Shape::ImmC => 2,
        }
    }

    pub fn has_immediate(self) -> bool {
        matches!(self, Shape::CImm | Shape::ImmC)
    }
}

/// The 16 machine operations.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum Opcode {
    Add = 0,
    Addc,
    Sub,
    Swb,
    Nand,
    Rsft,
    Imm,
    Ld,
    Ldim,
    St,
    Stim,
    Beq,
    Bgt,
    Jmpl,
    In,
    Out,
}

impl Opcode {
    /// Every opcode, indexed by its numeric value.
    pub const ALL: [Opcode; 16] = [
        Opcode::Add,
        Opcode::Addc,
        Opcode::Sub,
        Opcode::Swb,
        Opcode::Nand,
        Opcode::Rsft,
        Opcode::Imm,
        Opcode::Ld,
        Opcode::Ldim,
        Opcode::St,
        Opcode::Stim,
        Opcode::Beq,
        Opcode::Bgt,
        Opcode::Jmpl,
        Opcode::In,
        Opcode::Out,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Addc => "ADDC",
            Opcode::Sub => "SUB",
            Opcode::Swb => "SWB",
            Opcode::Nand => "NAND",
            Opcode::Rsft => "RSFT",
            Opcode::Imm => "IMM",
            Opcode::Ld => "LD",
            Opcode::Ldim => "LDIM",
            Opcode::St => "ST",
            Opcode::Stim => "STIM",
            Opcode::Beq => "BEQ",
            Opcode::Bgt => "BGT",
            Opcode::Jmpl => "JMPL",
            Opcode::In => "IN",
            Opcode::Out => "OUT",
        }
    }

    pub fn shape(self) -> Shape {
        match self {
            Opcode::Add | Opcode::Addc | Opcode::Sub | Opcode::Swb | Opcode::Nand => Shape::Cab,
            Opcode::Rsft | Opcode::Ld | Opcode::Jmpl | Opcode::In => Shape::Ca,
            Opcode::St | Opcode::Out => Shape::Ab,
            Opcode::Imm | Opcode::Ldim => Shape::CImm,
            Opcode::Stim | Opcode::Beq | Opcode::Bgt => Shape::ImmC,
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Opcode::ALL
            .get(value as usize)
            .copied()
            .ok_or(DecodeError::Opcode(value))
    }
}

impl FromStr for Opcode {
    type Err = ();

    /// Mnemonics are case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let opcode = match s.to_ascii_uppercase().as_str() {
            "ADD" => Opcode::Add,
            "ADDC" => Opcode::Addc,
            "SUB" => Opcode::Sub,
            "SWB" => Opcode::Swb,
            "NAND" => Opcode::Nand,
            "RSFT" => Opcode::Rsft,
            "IMM" => Opcode::Imm,
            "LD" => Opcode::Ld,
            "LDIM" => Opcode::Ldim,
            "ST" => Opcode::St,
            "STIM" => Opcode::Stim,
            "BEQ" => Opcode::Beq,
            "BGT" => Opcode::Bgt,
            "JMPL" => Opcode::Jmpl,
            "IN" => Opcode::In,
            "OUT" => Opcode::Out,
            _ => return Err(()),
        };
        Ok(opcode)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Assembler shorthands which expand to a single real instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pseudo {
    /// `ADD r0 r0 r0`
    Nop,
    /// `MOV dst src` adds `src` and `r0` into `dst`.
    Mov,
    /// `JMP target` is `BEQ target r15`, which always holds.
    Jmp,
    /// The halt sentinel, `JMPL` with every operand zero.
    Exit,
}

impl Pseudo {
    pub fn operand_count(self) -> usize {
        match self {
            Pseudo::Nop | Pseudo::Exit => 0,
            Pseudo::Jmp => 1,
            Pseudo::Mov => 2,
        }
    }
}

impl FromStr for Pseudo {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NOP" => Ok(Pseudo::Nop),
            "MOV" => Ok(Pseudo::Mov),
            "JMP" => Ok(Pseudo::Jmp),
            "EXIT" => Ok(Pseudo::Exit),
            _ => Err(()),
        }
    }
}

/// Anything that may start an instruction line.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mnemonic {
    Pseudo(Pseudo),
    Op(Opcode),
}

impl Mnemonic {
    pub fn operand_count(self) -> usize {
        match self {
            Mnemonic::Pseudo(pseudo) => pseudo.operand_count(),
            Mnemonic::Op(opcode) => opcode.shape().operand_count(),
        }
    }
}

impl FromStr for Mnemonic {
    type Err = ();

    // Pseudo-instructions shadow the table
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .map(Mnemonic::Pseudo)
            .or_else(|()| s.parse().map(Mnemonic::Op))
    }
}

/// A single machine instruction: the opcode followed by three operand slots.
///
/// This is both what the assembler emits and what the emulator executes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct Record([u8; 4]);

impl Record {
    pub const NOP: Record = Record([0, 0, 0, 0]);
    pub const HALT: Record = Record([Opcode::Jmpl as u8, 0, 0, 0]);

    pub const fn new(slots: [u8; 4]) -> Self {
        Record(slots)
    }

    /// Register shaped record, operands given in encoded order.
    pub fn registers(opcode: Opcode, a: Register, b: Register, c: Register) -> Self {
        Record([opcode.code(), a.get(), b.get(), c.get()])
    }

    /// Immediate shaped record.
    pub fn immediate(opcode: Opcode, imm: u8, c: Register) -> Self {
        Record([opcode.code(), imm, c.get(), 0])
    }

    pub fn slots(&self) -> [u8; 4] {
        self.0
    }

    pub fn opcode(&self) -> Result<Opcode, DecodeError> {
        Opcode::try_from(self.0[0])
    }

    /// Pack into the 16-bit word `op | A | B | C`, or `op | imm | C` for immediate shapes.
    ///
    /// Returns `None` if any slot does not fit its field.
    pub fn word(&self) -> Option<u16> {
        let [op, a, b, c] = self.0.map(u16::from);
        if op > 0xF {
            return None;
        }
        if self.opcode().ok()?.shape().has_immediate() {
            (b <= 0xF && c == 0).then_some(op << 12 | a << 4 | b)
        } else {
            (a <= 0xF && b <= 0xF && c <= 0xF).then_some(op << 12 | a << 8 | b << 4 | c)
        }
    }

    /// Interpret the slots according to the opcode's shape.
    pub fn decode(&self) -> Result<Instr, DecodeError> {
        let [_, a, b, c] = self.0;
        let reg = |slot: usize, value: u8| {
            Register::new(value).ok_or(DecodeError::Register { slot, value })
        };
        let opcode = self.opcode()?;

        let instr = match opcode.shape() {
            Shape::Cab => {
                let (a, b, c) = (reg(1, a)?, reg(2, b)?, reg(3, c)?);
                match opcode {
                    Opcode::Add => Instr::Add { a, b, c },
                    Opcode::Addc => Instr::Addc { a, b, c },
                    Opcode::Sub => Instr::Sub { a, b, c },
                    Opcode::Swb => Instr::Swb { a, b, c },
                    Opcode::Nand => Instr::Nand { a, b, c },
                    _ => unreachable!("opcode {opcode} is not CAB shaped"),
                }
            }
            Shape::Ca => {
                if opcode == Opcode::Jmpl && a == 0 && b == 0 && c == 0 {
                    return Ok(Instr::Halt);
                }
                let (a, c) = (reg(1, a)?, reg(3, c)?);
                match opcode {
                    Opcode::Rsft => Instr::Rsft { a, c },
                    Opcode::Ld => Instr::Ld { a, c },
                    Opcode::Jmpl => Instr::Jmpl {
                        target: a.get(),
                        link: c,
                    },
                    Opcode::In => Instr::In { device: a, c },
                    _ => unreachable!("opcode {opcode} is not CA shaped"),
                }
            }
            Shape::Ab => {
                let (a, b) = (reg(1, a)?, reg(2, b)?);
                match opcode {
                    Opcode::St => Instr::St { a, b },
                    Opcode::Out => Instr::Out { port: a, b },
                    _ => unreachable!("opcode {opcode} is not AB shaped"),
                }
            }
            Shape::CImm | Shape::ImmC => {
                let (imm, c) = (a, reg(2, b)?);
                match opcode {
                    Opcode::Imm => Instr::Imm { imm, c },
                    Opcode::Ldim => Instr::Ldim { addr: imm, c },
                    Opcode::Stim => Instr::Stim { addr: imm, c },
                    Opcode::Beq => Instr::Beq { target: imm, c },
                    Opcode::Bgt => Instr::Bgt { target: imm, c },
                    _ => unreachable!("opcode {opcode} is not immediate shaped"),
                }
            }
        };
        Ok(instr)
    }
}

/// Record with its operands resolved, one variant per operation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Instr {
    Add {
        a: Register,
        b: Register,
        c: Register,
    },
    Addc {
        a: Register,
        b: Register,
        c: Register,
    },
    Sub {
        a: Register,
        b: Register,
        c: Register,
    },
    Swb {
        a: Register,
        b: Register,
        c: Register,
    },
    Nand {
        a: Register,
        b: Register,
        c: Register,
    },
    Rsft { a: Register, c: Register },
    Imm { imm: u8, c: Register },
    Ld { a: Register, c: Register },
    Ldim { addr: u8, c: Register },
    St { a: Register, b: Register },
    Stim { addr: u8, c: Register },
    Beq { target: u8, c: Register },
    Bgt { target: u8, c: Register },
    /// Link `pc + 1` into `link`, continue at the literal `target`.
    Jmpl { target: u8, link: Register },
    /// `JMPL` with all operands zero.
    Halt,
    In { device: Register, c: Register },
    Out { port: Register, b: Register },
}

impl Instr {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instr::Add { .. } => Opcode::Add,
            Instr::Addc { .. } => Opcode::Addc,
            Instr::Sub { .. } => Opcode::Sub,
            Instr::Swb { .. } => Opcode::Swb,
            Instr::Nand { .. } => Opcode::Nand,
            Instr::Rsft { .. } => Opcode::Rsft,
            Instr::Imm { .. } => Opcode::Imm,
            Instr::Ld { .. } => Opcode::Ld,
            Instr::Ldim { .. } => Opcode::Ldim,
            Instr::St { .. } => Opcode::St,
            Instr::Stim { .. } => Opcode::Stim,
            Instr::Beq { .. } => Opcode::Beq,
            Instr::Bgt { .. } => Opcode::Bgt,
            Instr::Jmpl { .. } | Instr::Halt => Opcode::Jmpl,
            Instr::In { .. } => Opcode::In,
            Instr::Out { .. } => Opcode::Out,
        }
    }
}

/// Disassembles to source operand order.
impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.opcode().name();
        match *self {
            Instr::Add { a, b, c }
            | Instr::Addc { a, b, c }
            | Instr::Sub { a, b, c }
            | Instr::Swb { a, b, c }
            | Instr::Nand { a, b, c } => write!(f, "{name} {c} {a} {b}"),
            Instr::Rsft { a, c } | Instr::Ld { a, c } => write!(f, "{name} {c} {a}"),
            Instr::In { device, c } => write!(f, "{name} {c} {device}"),
            Instr::Jmpl { target, link } => write!(f, "{name} {link} r{target}"),
            Instr::Halt => write!(f, "EXIT"),
            Instr::St { a, b } => write!(f, "{name} {a} {b}"),
            Instr::Out { port, b } => write!(f, "{name} {port} {b}"),
            Instr::Imm { imm, c } | Instr::Ldim { addr: imm, c } => write!(f, "{name} {c} {imm}"),
            Instr::Stim { addr: imm, c }
            | Instr::Beq { target: imm, c }
            | Instr::Bgt { target: imm, c } => write!(f, "{name} {imm} {c}"),
        }
    }
}

/// A record which does not describe an instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DecodeError {
    Opcode(u8),
    Register { slot: usize, value: u8 },
}

impl Error for DecodeError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Opcode(value) => write!(f, "invalid opcode {}", value),
            DecodeError::Register { slot, value } => {
                write!(f, "invalid register {} in slot {}", value, slot)
            }
        }
    }
}

/// Packed 16-bit instruction word, shown as four binary nibbles.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Word(pub u16);

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nibble = |shift: u16| (self.0 >> shift) & 0xF;
        write!(
            f,
            "{:04b}-{:04b}-{:04b}-{:04b}",
            nibble(12),
            nibble(8),
            nibble(4),
            nibble(0)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(index: u8) -> Register {
        Register::new(index).unwrap()
    }

    #[test]
    fn table_is_indexed_by_code() {
        for (code, opcode) in Opcode::ALL.iter().enumerate() {
            assert_eq!(opcode.code() as usize, code);
            assert_eq!(Opcode::try_from(code as u8), Ok(*opcode));
            assert_eq!(opcode.name().parse(), Ok(*opcode));
        }
        assert_eq!(Opcode::try_from(16), Err(DecodeError::Opcode(16)));
    }

    #[test]
    fn mnemonics_ignore_case() {
        assert_eq!("addc".parse(), Ok(Opcode::Addc));
        assert_eq!("Jmpl".parse(), Ok(Opcode::Jmpl));
        assert_eq!("mov".parse(), Ok(Mnemonic::Pseudo(Pseudo::Mov)));
        assert_eq!("STIM".parse(), Ok(Mnemonic::Op(Opcode::Stim)));
        assert_eq!("JUMP".parse::<Mnemonic>(), Err(()));
    }

    #[test]
    fn shapes() {
        assert_eq!(Opcode::Nand.shape(), Shape::Cab);
        assert_eq!(Opcode::In.shape(), Shape::Ca);
        assert_eq!(Opcode::Out.shape(), Shape::Ab);
        assert_eq!(Opcode::Ldim.shape(), Shape::CImm);
        assert_eq!(Opcode::Bgt.shape(), Shape::ImmC);
        assert_eq!(Shape::Cab.operand_count(), 3);
        assert_eq!(Shape::ImmC.operand_count(), 2);
    }

    #[test]
    fn decode_uses_shape() {
        assert_eq!(
            Record::new([0, 1, 2, 3]).decode(),
            Ok(Instr::Add {
                a: r(1),
                b: r(2),
                c: r(3)
            })
        );
        assert_eq!(
            Record::new([5, 4, 0, 9]).decode(),
            Ok(Instr::Rsft { a: r(4), c: r(9) })
        );
        assert_eq!(
            Record::new([6, 200, 7, 0]).decode(),
            Ok(Instr::Imm { imm: 200, c: r(7) })
        );
        assert_eq!(
            Record::new([13, 4, 0, 14]).decode(),
            Ok(Instr::Jmpl {
                target: 4,
                link: r(14)
            })
        );
        assert_eq!(Record::HALT.decode(), Ok(Instr::Halt));
        assert_eq!(
            Record::new([16, 0, 0, 0]).decode(),
            Err(DecodeError::Opcode(16))
        );
        assert_eq!(
            Record::new([9, 1, 22, 0]).decode(),
            Err(DecodeError::Register { slot: 2, value: 22 })
        );
    }

    #[test]
    fn word_packing() {
        let add = Record::registers(Opcode::Add, r(1), r(2), r(3));
        assert_eq!(add.word(), Some(0x0123));

        let beq = Record::immediate(Opcode::Beq, 0xA7, r(15));
        assert_eq!(beq.word(), Some(0xBA7F));

        assert_eq!(Record::HALT.word(), Some(0xD000));
        assert_eq!(Record::new([0, 16, 0, 0]).word(), None);
        assert_eq!(Word(0xD00F).to_string(), "1101-0000-0000-1111");
    }

    #[test]
    fn disassembly_uses_source_order() {
        let text = |slots| Record::new(slots).decode().unwrap().to_string();
        assert_eq!(text([2, 1, 2, 3]), "SUB r3 r1 r2");
        assert_eq!(text([7, 4, 0, 5]), "LD r5 r4");
        assert_eq!(text([8, 30, 2, 0]), "LDIM r2 30");
        assert_eq!(text([10, 30, 2, 0]), "STIM 30 r2");
        assert_eq!(text([15, 3, 4, 0]), "OUT r3 r4");
        assert_eq!(text([13, 0, 0, 0]), "EXIT");
    }
}
