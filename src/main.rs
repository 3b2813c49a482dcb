use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, miette, IntoDiagnostic, Result};

use rails::{Assembler, Listing, Program, RunError, TagIndexing, Terminal};

/// Rails is an assembler and emulator for a tiny 8-bit teaching computer.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.asm` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble a `.asm` file and run it in the emulator
    Run {
        /// `.asm` file to run
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Values to answer `IN` prompts with, separated by commas or spaces
        #[arg(short, long)]
        input: Option<String>,
        /// What labels resolve to: `raw` source lines or `emitted` instructions
        #[arg(short, long)]
        tags: Option<TagIndexing>,
    },
    /// Check a `.asm` file without running it
    Check {
        /// File to check
        name: PathBuf,
        /// What labels resolve to: `raw` source lines or `emitted` instructions
        #[arg(short, long)]
        tags: Option<TagIndexing>,
    },
    /// Print each assembled instruction word next to its source line
    List {
        /// `.asm` file to list
        name: PathBuf,
        /// What labels resolve to: `raw` source lines or `emitted` instructions
        #[arg(short, long)]
        tags: Option<TagIndexing>,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    rails::env::init().map_err(|err| miette!("{}", err))?;

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(rails::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    if let Some(command) = args.command {
        match command {
            Command::Run {
                name,
                minimal,
                input,
                tags,
            } => run(&name, minimal, input.as_deref(), tags),
            Command::Check { name, tags } => {
                file_message(Green, "Checking", &name);
                let src = read_source(&name)?;
                let _ = assemble(&src, tags)?;
                message(Green, "Success", "no errors found!");
                Ok(())
            }
            Command::List { name, tags } => {
                file_message(Green, "Assembling", &name);
                let src = read_source(&name)?;
                let program = assemble(&src, tags)?;
                print!("{}", Listing::new(&program, &src));
                message(
                    Green,
                    "Finished",
                    &format!("{} instruction words", program.len()),
                );
                Ok(())
            }
        }
    } else if let Some(path) = args.path {
        run(&path, false, None, None)
    } else {
        println!("\n~ rails v{VERSION} ~");
        println!("{}", LOGO.truecolor(183, 65, 14).bold());
        println!("{SHORT_INFO}");
        bail!("No file given. Exiting...")
    }
}

enum MsgColor {
    Green,
    Cyan,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message<S>(color: MsgColor, left: S, right: S)
where
    S: Colorize + std::fmt::Display,
{
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
    };
    println!("{left:>12} {right}");
}

fn run(name: &Path, minimal: bool, input: Option<&str>, tags: Option<TagIndexing>) -> Result<()> {
    if minimal {
        colored::control::set_override(false);
    }
    file_message(MsgColor::Green, "Assembling", name);
    let src = read_source(name)?;
    let program = assemble(&src, tags)?;

    let mut terminal = Terminal::new(minimal);
    if let Some(values) = input {
        terminal = terminal.with_script(values);
    }

    message(
        MsgColor::Green,
        "Running",
        &format!("{} instruction words", program.len()),
    );
    let machine = rails::run(&program, &mut terminal).map_err(RunError::into_report)?;

    message(MsgColor::Cyan, "Halted", &format!("at {}", machine.pc()));
    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    if !path.exists() {
        bail!("File `{}` does not exist. Exiting...", path.display());
    }
    if path.is_dir() {
        bail!(
            "`{}` is a directory, not a source file. Exiting...",
            path.display()
        );
    }
    fs::read_to_string(path).into_diagnostic()
}

/// Assemble with labels resolved per the command line, then `RAILS_TAGS`, then the default.
fn assemble(src: &str, tags: Option<TagIndexing>) -> Result<Program> {
    let indexing = tags.or_else(rails::env::tag_indexing).unwrap_or_default();
    Assembler::new(src)
        .with_indexing(indexing)
        .assemble()
        .map_err(|err| err.into_report(src))
}

const LOGO: &str = r#"
           _ _
 _ __ __ _(_) |___
| '__/ _` | | / __|
| | | (_| | | \__ \
|_|  \__,_|_|_|___/"#;

const SHORT_INFO: &str = r"
Welcome to rails, a two-pass assembler and emulator for a toy 8-bit computer
with 16 registers, 16 io registers and 256 bytes of memory.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
