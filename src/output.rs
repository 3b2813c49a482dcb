use std::fmt;

use colored::Colorize;

use crate::{isa::Word, program::Program, runtime::Machine};

/// Printable width of a register cell: name then value.
const CELL_WIDTH: usize = 8;
const CELLS_PER_ROW: usize = 4;
/// Inner width of the frame.
const WIDTH: usize = CELLS_PER_ROW * CELL_WIDTH + (CELLS_PER_ROW - 1) * 2;

/// Snapshot of machine state, shown whenever the program waits for input and once on halt.
///
/// The minimal form prints one `NAME value` pair per line, with no color.
pub struct Dump<'a> {
    machine: &'a Machine,
    minimal: bool,
}

impl<'a> Dump<'a> {
    pub fn new(machine: &'a Machine, minimal: bool) -> Self {
        Dump { machine, minimal }
    }

    fn fmt_minimal(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let machine = self.machine;
        writeln!(f, "PC {}", machine.pc())?;
        writeln!(f, "C {}", u8::from(machine.carry()))?;
        for (i, value) in machine.registers().iter().enumerate() {
            writeln!(f, "R{} {}", i, value)?;
        }
        for (i, value) in machine.io().iter().enumerate() {
            writeln!(f, "IO{} {}", i, value)?;
        }
        Ok(())
    }

    fn fmt_rows(f: &mut fmt::Formatter<'_>, prefix: &str, values: &[u8]) -> fmt::Result {
        for (row, chunk) in values.chunks(CELLS_PER_ROW).enumerate() {
            let cells: Vec<_> = chunk
                .iter()
                .enumerate()
                .map(|(i, value)| cell(&format!("{prefix}{}", row * CELLS_PER_ROW + i), *value))
                .collect();
            framed(f, &cells)?;
        }
        Ok(())
    }
}

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minimal {
            return self.fmt_minimal(f);
        }
        let machine = self.machine;
        let rule = "─".repeat(WIDTH + 2);

        writeln!(f, "{}", format!("┌{rule}┐").dimmed())?;
        framed(
            f,
            &[
                cell("PC", machine.pc()),
                cell("C", u8::from(machine.carry())),
            ],
        )?;
        writeln!(f, "{}", format!("├{rule}┤").dimmed())?;
        Self::fmt_rows(f, "R", machine.registers())?;
        writeln!(f, "{}", format!("├{rule}┤").dimmed())?;
        Self::fmt_rows(f, "IO", machine.io())?;
        write!(f, "{}", format!("└{rule}┘").dimmed())
    }
}

/// One `NAME value` cell, `CELL_WIDTH` printable characters wide.
fn cell(name: &str, value: u8) -> String {
    format!("{}{:>4}", format!("{name:<4}").bold(), value)
}

/// Write cells side by side inside the frame, padding the row to full width.
fn framed(f: &mut fmt::Formatter<'_>, cells: &[String]) -> fmt::Result {
    let used = cells.len() * CELL_WIDTH + cells.len().saturating_sub(1) * 2;
    writeln!(
        f,
        "{} {}{} {}",
        "│".dimmed(),
        cells.join("  "),
        " ".repeat(WIDTH.saturating_sub(used)),
        "│".dimmed()
    )
}

/// Assembled program laid out next to its source: index, packed word, disassembly and the
/// original line.
pub struct Listing<'a> {
    program: &'a Program,
    src: &'a str,
}

impl<'a> Listing<'a> {
    pub fn new(program: &'a Program, src: &'a str) -> Self {
        Listing { program, src }
    }
}

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<&str> = self.src.lines().collect();
        for (index, (record, line)) in self.program.iter().enumerate() {
            let word = match record.word() {
                Some(word) => Word(word).to_string(),
                None => format!("{:?}", record.slots()),
            };
            let text = match record.decode() {
                Ok(instr) => instr.to_string(),
                Err(error) => error.to_string(),
            };
            write!(
                f,
                "{}  {}  {:<16}",
                format!("{index:>3}").dimmed(),
                word,
                text
            )?;
            match line.and_then(|line| lines.get(line).map(|src| (line, src))) {
                Some((line, src)) => writeln!(
                    f,
                    "{} {}",
                    format!("{:>4} |", line + 1).dimmed(),
                    src.trim()
                )?,
                None => writeln!(f)?,
            }
        }
        Ok(())
    }
}
