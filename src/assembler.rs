use crate::{
    error::{AsmError, AsmErrorKind},
    isa::{Mnemonic, Opcode, Pseudo, Record, Shape},
    lexer::{self, Line, Token},
    program::{Program, PROGRAM_MAX},
    symbol::{is_label, Register, TagIndexing, TagTable},
};

/// Assemble source text, resolving labels to raw line indices.
pub fn assemble(src: &str) -> Result<Program, AsmError> {
    Assembler::new(src).assemble()
}

/// Two-pass assembler over a single source. Consumed by [`Assembler::assemble`], so no state
/// outlives one run.
#[derive(Debug)]
pub struct Assembler<'a> {
    lines: Vec<Line<'a>>,
    tags: TagTable,
    indexing: TagIndexing,
}

impl<'a> Assembler<'a> {
    pub fn new(src: &'a str) -> Self {
        Assembler {
            lines: lexer::tokenize(src),
            tags: TagTable::new(),
            indexing: TagIndexing::default(),
        }
    }

    pub fn with_indexing(mut self, indexing: TagIndexing) -> Self {
        self.indexing = indexing;
        self
    }

    pub fn assemble(mut self) -> Result<Program, AsmError> {
        self.collect_tags()?;
        self.emit()
    }

    /// First pass: record every label and strip it from its line.
    fn collect_tags(&mut self) -> Result<(), AsmError> {
        let mut emitted = 0;
        for line in &mut self.lines {
            let first = line.tokens.first();
            if !first.is_some_and(|token| is_label(token.text)) {
                if !line.is_empty() {
                    emitted += 1;
                }
                continue;
            }
            let label = line.tokens.remove(0);

            let target = match self.indexing {
                TagIndexing::RawLine => line.index,
                TagIndexing::Emitted => emitted,
            };
            if let Err(first_line) = self.tags.define(label.text, target, line.index) {
                return Err(AsmError::new(
                    AsmErrorKind::DuplicateLabel {
                        label: label.text.to_owned(),
                        first_line,
                    },
                    line.index,
                    label.span,
                ));
            }
            if !line.is_empty() {
                emitted += 1;
            }
        }
        Ok(())
    }

    /// Second pass: encode every line which still has tokens.
    fn emit(&self) -> Result<Program, AsmError> {
        let mut program = Program::new();
        for line in &self.lines {
            let Some((mnemonic, operands)) = line.tokens.split_first() else {
                continue;
            };
            if program.len() == PROGRAM_MAX {
                return Err(AsmError::new(
                    AsmErrorKind::ProgramTooLong { max: PROGRAM_MAX },
                    line.index,
                    line.span,
                ));
            }
            let record = self.encode(line, mnemonic, operands)?;
            program.push(record, line.index);
        }
        Ok(program)
    }

    fn encode(
        &self,
        line: &Line<'a>,
        mnemonic: &Token<'a>,
        operands: &[Token<'a>],
    ) -> Result<Record, AsmError> {
        let kind: Mnemonic = mnemonic.text.parse().map_err(|()| {
            AsmError::new(
                AsmErrorKind::UnknownMnemonic(mnemonic.text.to_owned()),
                line.index,
                mnemonic.span,
            )
        })?;
        let mut ops = Operands {
            line,
            mnemonic,
            expected_count: kind.operand_count(),
            tokens: operands.iter(),
            tags: &self.tags,
        };

        let record = match kind {
            Mnemonic::Pseudo(Pseudo::Nop) => Record::NOP,
            Mnemonic::Pseudo(Pseudo::Mov) => {
                let dest = ops.register()?;
                let src = ops.register()?;
                Record::registers(Opcode::Add, src, Register::R0, dest)
            }
            Mnemonic::Pseudo(Pseudo::Jmp) => {
                let target = ops.immediate()?;
                Record::immediate(Opcode::Beq, target, Register::R15)
            }
            Mnemonic::Pseudo(Pseudo::Exit) => Record::HALT,

            Mnemonic::Op(opcode) => match opcode.shape() {
                Shape::Cab => {
                    let c = ops.register()?;
                    let a = ops.register()?;
                    let b = ops.register()?;
                    Record::registers(opcode, a, b, c)
                }
                Shape::Ca => {
                    let c = ops.register()?;
                    let a = ops.register()?;
                    Record::registers(opcode, a, Register::R0, c)
                }
                Shape::Ab => {
                    let a = ops.register()?;
                    let b = ops.register()?;
                    Record::registers(opcode, a, b, Register::R0)
                }
                Shape::CImm => {
                    let c = ops.register()?;
                    let imm = ops.immediate()?;
                    Record::immediate(opcode, imm, c)
                }
                Shape::ImmC => {
                    let imm = ops.immediate()?;
                    let c = ops.register()?;
                    Record::immediate(opcode, imm, c)
                }
            },
        };
        ops.finish()?;
        Ok(record)
    }
}

/// Operand tokens of one line, consumed in source order.
struct Operands<'l, 'a> {
    line: &'l Line<'a>,
    mnemonic: &'l Token<'a>,
    expected_count: usize,
    tokens: std::slice::Iter<'l, Token<'a>>,
    tags: &'l TagTable,
}

impl<'l, 'a> Operands<'l, 'a> {
    fn error(&self, kind: AsmErrorKind, token: &Token) -> AsmError {
        AsmError::new(kind, self.line.index, token.span)
    }

    fn next(&mut self) -> Result<&'l Token<'a>, AsmError> {
        let actual_count = self.line.tokens.len() - 1 - self.tokens.len();
        self.tokens.next().ok_or_else(|| {
            AsmError::new(
                AsmErrorKind::MissingOperand {
                    mnemonic: self.mnemonic.text.to_owned(),
                    expected_count: self.expected_count,
                    actual_count,
                },
                self.line.index,
                self.line.span,
            )
        })
    }

    fn register(&mut self) -> Result<Register, AsmError> {
        let token = self.next()?;
        parse_register(token.text).map_err(|kind| self.error(kind, token))
    }

    /// Plain number, or label reference resolved through the tag table.
    fn immediate(&mut self) -> Result<u8, AsmError> {
        let token = self.next()?;
        if !is_label(token.text) {
            return parse_immediate(token.text).map_err(|kind| self.error(kind, token));
        }

        let label = token.text.to_owned();
        let Some(target) = self.tags.get(token.text) else {
            return Err(self.error(AsmErrorKind::UndefinedLabel(label), token));
        };
        u8::try_from(target)
            .map_err(|_| self.error(AsmErrorKind::LabelOutOfRange { label, target }, token))
    }

    fn finish(mut self) -> Result<(), AsmError> {
        match self.tokens.next() {
            Some(extra) => Err(self.error(
                AsmErrorKind::UnexpectedOperand(extra.text.to_owned()),
                extra,
            )),
            None => Ok(()),
        }
    }
}

/// Parse a run of decimal digits. Values too large for `u64` saturate.
fn parse_unsigned(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Only digits remain, so parsing can only fail by overflowing
    Some(text.parse().unwrap_or(u64::MAX))
}

/// Register token: optional `r` marker followed by 0 to 15.
pub(crate) fn parse_register(text: &str) -> Result<Register, AsmErrorKind> {
    let digits = text.strip_prefix(['r', 'R']).unwrap_or(text);
    let value =
        parse_unsigned(digits).ok_or_else(|| AsmErrorKind::MalformedRegister(text.to_owned()))?;
    u8::try_from(value)
        .ok()
        .and_then(Register::new)
        .ok_or_else(|| AsmErrorKind::RegisterOutOfRange(text.to_owned()))
}

/// Immediate token: 0 to 255.
pub(crate) fn parse_immediate(text: &str) -> Result<u8, AsmErrorKind> {
    let value =
        parse_unsigned(text).ok_or_else(|| AsmErrorKind::MalformedImmediate(text.to_owned()))?;
    u8::try_from(value).map_err(|_| AsmErrorKind::ImmediateOutOfRange(text.to_owned()))
}
