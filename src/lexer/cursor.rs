// Heavily inspired and referenced from `rustc_lexer` and adapted to suit the project.
// See https://doc.rust-lang.org/beta/nightly-rustc/src/rustc_lexer/cursor.rs.html

use std::str::Chars;

/// Peekable iterator over a char sequence.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    /// Whole source, used to slice out tokens
    src: &'a str,
    chars: Chars<'a>,
    /// Byte offset of the start of the current token
    token_start: usize,
}

pub(crate) const EOF_CHAR: char = '\0';

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Cursor<'a> {
        Cursor {
            src,
            chars: src.chars(),
            token_start: 0,
        }
    }

    /// Peek at the next char without consuming it. Returns [`EOF_CHAR`] at the end of input.
    pub fn first(&self) -> char {
        self.chars.clone().next().unwrap_or(EOF_CHAR)
    }

    pub fn is_eof(&self) -> bool {
        self.chars.as_str().is_empty()
    }

    /// Move to the next char.
    pub fn bump(&mut self) -> Option<char> {
        self.chars.next()
    }

    /// Eat chars while predicate returns true or until the end of input.
    pub fn take_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
        while predicate(self.first()) && !self.is_eof() {
            self.bump();
        }
    }

    /// Byte offset of the cursor within the source.
    pub fn pos(&self) -> usize {
        self.src.len() - self.chars.as_str().len()
    }

    /// Start of the token currently being read.
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Text consumed since the last [`Cursor::reset_pos`].
    pub fn token_text(&self) -> &'a str {
        &self.src[self.token_start..self.pos()]
    }

    /// Mark the current position as the start of the next token.
    pub fn reset_pos(&mut self) {
        self.token_start = self.pos();
    }

    /// Consume the remainder of the current line, leaving the newline itself unconsumed.
    pub fn skip_line(&mut self) {
        self.take_while(|c| c != '\n');
    }
}
