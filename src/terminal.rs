use std::{
    collections::VecDeque,
    io::{self, stdin, stdout, Write},
};

use ::console::Term;

/// Everything the emulator needs from the outside world.
pub trait Console {
    /// Clear the visible screen, if there is one.
    fn clear(&mut self);

    /// Show a block of text to the user.
    fn log(&mut self, text: &str);

    /// Show `prompt` and block until a line of input is available.
    fn get_input(&mut self, prompt: &str) -> io::Result<String>;

    /// Plain line-per-field output without color or frames.
    fn is_minimal(&self) -> bool {
        false
    }
}

/// Console backed by the process terminal.
///
/// Input comes from an interactive terminal, piped stdin, or a fixed script of values given
/// up front.
pub struct Terminal {
    term: Term,
    minimal: bool,
    script: Option<VecDeque<String>>,
}

impl Terminal {
    pub fn new(minimal: bool) -> Self {
        Terminal {
            term: Term::stdout(),
            minimal,
            script: None,
        }
    }

    /// Answer prompts from a comma or whitespace separated list instead of reading input.
    pub fn with_script(mut self, values: &str) -> Self {
        self.script = Some(split_values(values));
        self
    }

    fn read_line(&self) -> io::Result<String> {
        if self.term.is_term() {
            return self.term.read_line();
        }
        let mut line = String::new();
        if stdin().read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before a value was entered",
            ));
        }
        // Piped input is not echoed
        println!();
        Ok(line)
    }
}

impl Console for Terminal {
    fn clear(&mut self) {
        if self.minimal || !self.term.is_term() {
            return;
        }
        // Nothing useful to do if the terminal refuses
        let _ = self.term.clear_screen();
    }

    fn log(&mut self, text: &str) {
        println!("{text}");
    }

    fn get_input(&mut self, prompt: &str) -> io::Result<String> {
        if let Some(script) = &mut self.script {
            let value = script.pop_front().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "ran out of values given with --input",
                )
            })?;
            println!("{prompt}{value}");
            return Ok(value);
        }

        print!("{prompt}");
        stdout().flush()?;
        self.read_line()
    }

    fn is_minimal(&self) -> bool {
        self.minimal
    }
}

fn split_values(values: &str) -> VecDeque<String> {
    values
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_values() {
        assert_eq!(split_values("1, 2,3  40"), vec!["1", "2", "3", "40"]);
        assert!(split_values(" , ").is_empty());
    }

    #[test]
    fn script_answers_prompts_in_order() {
        let mut terminal = Terminal::new(true).with_script("7,8");
        assert_eq!(terminal.get_input("? ").unwrap(), "7");
        assert_eq!(terminal.get_input("? ").unwrap(), "8");
        let err = terminal.get_input("? ").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert!(terminal.is_minimal());
    }
}
