use std::{error::Error, fmt, io};

use miette::{miette, LabeledSpan, Report, Severity};

use crate::{isa::DecodeError, span::Span};

/// Assembly failed on a particular line. No program is produced.
#[derive(Debug, PartialEq, Eq)]
pub struct AsmError {
    pub kind: AsmErrorKind,
    /// 0-based raw line index.
    pub line: usize,
    /// Offending token, or the whole line when no single token is to blame.
    pub span: Span,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AsmErrorKind {
    UnknownMnemonic(String),
    MalformedRegister(String),
    RegisterOutOfRange(String),
    MalformedImmediate(String),
    ImmediateOutOfRange(String),
    MissingOperand {
        mnemonic: String,
        expected_count: usize,
        actual_count: usize,
    },
    UnexpectedOperand(String),
    UndefinedLabel(String),
    DuplicateLabel {
        label: String,
        /// 0-based raw line of the first definition.
        first_line: usize,
    },
    LabelOutOfRange {
        label: String,
        target: usize,
    },
    ProgramTooLong {
        max: usize,
    },
}

impl AsmError {
    pub fn new(kind: AsmErrorKind, line: usize, span: Span) -> Self {
        AsmError { kind, line, span }
    }

    /// 1-based line number, as shown to users.
    pub fn line_number(&self) -> usize {
        self.line + 1
    }

    fn code(&self) -> &'static str {
        match self.kind {
            AsmErrorKind::UnknownMnemonic(_) => "asm::mnemonic",
            AsmErrorKind::MalformedRegister(_) => "asm::bad_register",
            AsmErrorKind::RegisterOutOfRange(_) => "asm::register_range",
            AsmErrorKind::MalformedImmediate(_) => "asm::bad_immediate",
            AsmErrorKind::ImmediateOutOfRange(_) => "asm::immediate_range",
            AsmErrorKind::MissingOperand { .. } => "asm::missing_operand",
            AsmErrorKind::UnexpectedOperand(_) => "asm::unexpected_operand",
            AsmErrorKind::UndefinedLabel(_) => "asm::undefined_label",
            AsmErrorKind::DuplicateLabel { .. } => "asm::duplicate_label",
            AsmErrorKind::LabelOutOfRange { .. } => "asm::label_range",
            AsmErrorKind::ProgramTooLong { .. } => "asm::too_long",
        }
    }

    fn help(&self) -> &'static str {
        match self.kind {
            AsmErrorKind::UnknownMnemonic(_) => {
                "check the list of instructions; NOP, MOV, JMP and EXIT are also accepted"
            }
            AsmErrorKind::MalformedRegister(_) => "registers are written like r0 through r15",
            AsmErrorKind::RegisterOutOfRange(_) => "only registers r0 through r15 exist",
            AsmErrorKind::MalformedImmediate(_) => {
                "immediates are unsigned decimal numbers or label references like loop:"
            }
            AsmErrorKind::ImmediateOutOfRange(_) => "immediates range from 0 to 255",
            AsmErrorKind::MissingOperand { .. } => "check the operands for this instruction",
            AsmErrorKind::UnexpectedOperand(_) => {
                "remove the extra operand, or start a comment with #"
            }
            AsmErrorKind::UndefinedLabel(_) => {
                "define the label by starting a line with it, like `loop: NOP`"
            }
            AsmErrorKind::DuplicateLabel { .. } => "labels may only be defined once per file",
            AsmErrorKind::LabelOutOfRange { .. } => {
                "branch targets must fit in 8 bits; move the label closer to the start"
            }
            AsmErrorKind::ProgramTooLong { .. } => {
                "the program counter can only address 256 instructions"
            }
        }
    }

    fn label(&self) -> &'static str {
        match self.kind {
            AsmErrorKind::UnknownMnemonic(_) => "unknown mnemonic",
            AsmErrorKind::MalformedRegister(_) | AsmErrorKind::RegisterOutOfRange(_) => {
                "invalid register"
            }
            AsmErrorKind::MalformedImmediate(_) | AsmErrorKind::ImmediateOutOfRange(_) => {
                "invalid immediate"
            }
            AsmErrorKind::MissingOperand { .. } => "incomplete instruction",
            AsmErrorKind::UnexpectedOperand(_) => "unexpected operand",
            AsmErrorKind::UndefinedLabel(_) => "undefined label",
            AsmErrorKind::DuplicateLabel { .. } => "duplicate label",
            AsmErrorKind::LabelOutOfRange { .. } => "label too far",
            AsmErrorKind::ProgramTooLong { .. } => "first instruction past the limit",
        }
    }

    /// Convert to a diagnostic pointing into `src`.
    pub fn into_report(self, src: &str) -> Report {
        miette!(
            severity = Severity::Error,
            code = self.code(),
            help = self.help(),
            labels = vec![LabeledSpan::at(self.span, self.label())],
            "{}",
            self,
        )
        .with_source_code(src.to_owned())
    }
}

impl Error for AsmError {}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line_number(), self.kind)
    }
}

impl fmt::Display for AsmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMnemonic(name) => {
                write!(
                    f,
                    "Unrecognized mnemonic `{}`, something went wrong here.",
                    name
                )
            }
            Self::MalformedRegister(token) => write!(f, "Malformed register `{}`.", token),
            Self::RegisterOutOfRange(token) => write!(f, "Register out of range: `{}`.", token),
            Self::MalformedImmediate(token) => write!(f, "Malformed immediate `{}`.", token),
            Self::ImmediateOutOfRange(token) => write!(f, "Immediate out of range: `{}`.", token),
            Self::MissingOperand {
                mnemonic,
                expected_count,
                actual_count,
            } => write!(
                f,
                "Missing operand for `{}`. Expected {} operand{}, found {}.",
                mnemonic,
                expected_count,
                if *expected_count == 1 { "" } else { "s" },
                actual_count,
            ),
            Self::UnexpectedOperand(token) => write!(f, "Unexpected operand `{}`.", token),
            Self::UndefinedLabel(label) => write!(f, "Undefined label `{}`.", label),
            Self::DuplicateLabel { label, first_line } => write!(
                f,
                "Duplicate label `{}`, first defined on line {}.",
                label,
                first_line + 1
            ),
            Self::LabelOutOfRange { label, target } => write!(
                f,
                "Label `{}` resolves to {}, which does not fit in an immediate.",
                label, target
            ),
            Self::ProgramTooLong { max } => write!(
                f,
                "Program is too long. Max length is {} instructions.",
                max
            ),
        }
    }
}

/// Execution stopped on a fatal condition.
#[derive(Debug)]
pub enum RunError {
    /// Record at `pc` is not a valid instruction.
    Decode {
        pc: u8,
        line: Option<usize>,
        error: DecodeError,
    },
    /// Program counter left the program.
    PcOutOfRange { pc: u8, len: usize },
    /// `IN` received something other than a number from 0 to 255.
    BadInput { device: u8, input: String },
    /// Console could not provide input.
    Console(io::Error),
}

impl RunError {
    fn code(&self) -> &'static str {
        match self {
            RunError::Decode {
                error: DecodeError::Opcode(_),
                ..
            } => "run::bad_opcode",
            RunError::Decode { .. } => "run::bad_register",
            RunError::PcOutOfRange { .. } => "run::pc_range",
            RunError::BadInput { .. } => "run::bad_input",
            RunError::Console(_) => "run::console",
        }
    }

    fn help(&self) -> &'static str {
        match self {
            RunError::Decode { .. } => "only opcodes 0 to 15 and registers r0 to r15 exist",
            RunError::PcOutOfRange { .. } => "end the program with EXIT",
            RunError::BadInput { .. } => "enter a whole number from 0 to 255",
            RunError::Console(_) => "input values can also be given with --input",
        }
    }

    pub fn into_report(self) -> Report {
        miette!(
            severity = Severity::Error,
            code = self.code(),
            help = self.help(),
            "{}",
            self,
        )
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RunError::Decode { error, .. } => Some(error),
            RunError::Console(error) => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Decode { pc, line, error } => {
                write!(f, "Invalid instruction at {}: {}", pc, error)?;
                if let Some(line) = line {
                    write!(f, " (line {})", line + 1)?;
                }
                Ok(())
            }
            RunError::PcOutOfRange { pc, len } => write!(
                f,
                "Program counter {} is outside the program of {} instruction{}.",
                pc,
                len,
                if *len == 1 { "" } else { "s" },
            ),
            RunError::BadInput { device, input } => write!(
                f,
                "Invalid input `{}` for io register {}, expected a value from 0 to 255.",
                input.trim(),
                device
            ),
            RunError::Console(error) => write!(f, "Failed to read input: {}", error),
        }
    }
}

impl From<io::Error> for RunError {
    fn from(error: io::Error) -> Self {
        RunError::Console(error)
    }
}
