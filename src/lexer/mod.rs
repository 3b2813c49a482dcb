use crate::lexer::cursor::Cursor;
use crate::span::Span;

pub mod cursor;

/// A single whitespace-delimited word of source text.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token<'a> {
    pub text: &'a str,
    pub span: Span,
}

/// One raw line of source, split into tokens with comments removed.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Line<'a> {
    /// 0-based position among all lines of the source, blank and comment lines included.
    pub index: usize,
    /// The whole line, excluding the line terminator.
    pub span: Span,
    pub tokens: Vec<Token<'a>>,
}

impl<'a> Line<'a> {
    /// Line has nothing to assemble: blank, comment only, or a bare label once that is removed.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Test if a character separates tokens.
pub(crate) fn is_whitespace(c: char) -> bool {
    // Commas are purely cosmetic between operands
    matches!(c, ' ' | '\t' | '\r' | ',')
}

/// Test if a token starts a comment which runs to the end of the line.
pub(crate) fn is_comment(token: &str) -> bool {
    token.starts_with('#') || token.starts_with("//")
}

/// Split source into lines of tokens.
///
/// Every newline-terminated line produces a [`Line`], so `index` always matches the raw line
/// position. A trailing line without a newline is included unless it is empty.
pub fn tokenize(src: &str) -> Vec<Line<'_>> {
    let mut cursor = Cursor::new(src);
    let mut lines = Vec::new();
    let mut tokens = Vec::new();
    let mut line_start = 0;

    loop {
        cursor.reset_pos();
        match cursor.bump() {
            None => {
                let end = cursor.pos();
                if end > line_start {
                    lines.push(finish_line(src, lines.len(), &mut tokens, line_start, end));
                }
                break;
            }
            Some('\n') => {
                let end = cursor.pos() - 1;
                lines.push(finish_line(src, lines.len(), &mut tokens, line_start, end));
                line_start = cursor.pos();
            }
            Some(c) if is_whitespace(c) => cursor.take_while(is_whitespace),
            Some(_) => {
                cursor.take_while(|c| !is_whitespace(c) && c != '\n');
                let text = cursor.token_text();
                if is_comment(text) {
                    cursor.skip_line();
                } else {
                    tokens.push(Token {
                        text,
                        span: Span::between(cursor.token_start(), cursor.pos()),
                    });
                }
            }
        }
    }
    lines
}

fn finish_line<'a>(
    src: &str,
    index: usize,
    tokens: &mut Vec<Token<'a>>,
    start: usize,
    mut end: usize,
) -> Line<'a> {
    if src[start..end].ends_with('\r') {
        end -= 1;
    }
    Line {
        index,
        span: Span::between(start, end),
        tokens: std::mem::take(tokens),
    }
}
