//! Trivia scanning helpers handed to [`Tokenizer::parse_trivia`].
//!
//! [`Tokenizer::parse_trivia`]: super::Tokenizer::parse_trivia

use crate::core::trivia::Trivia;

/// Accumulates trivia from a position of the input.
///
/// In trailing mode (trivia after a token) whitespace stops right after the
/// first newline and nothing more is accepted: the rest of the trivia belongs
/// to the next token.
pub struct TriviaCollector<'a> {
    text: &'a str,
    pos: usize,
    trailing: bool,
    line_ended: bool,
    trivia: Vec<Trivia>,
}

impl<'a> TriviaCollector<'a> {
    pub(crate) fn new(text: &'a str, pos: usize, trailing: bool) -> Self {
        Self {
            text,
            pos,
            trailing,
            line_ended: false,
            trivia: Vec::new(),
        }
    }

    /// Unconsumed input.
    pub fn remaining(&self) -> &'a str {
        &self.text[self.pos..]
    }

    pub fn is_trailing(&self) -> bool {
        self.trailing
    }

    fn can_accept(&self) -> bool {
        !self.line_ended && self.pos < self.text.len()
    }

    pub fn accept_whitespace(&mut self) -> bool {
        if !self.can_accept() {
            return false;
        }
        let mut len = 0;
        for c in self.remaining().chars() {
            if !c.is_whitespace() {
                break;
            }
            len += c.len_utf8();
            if c == '\n' && self.trailing {
                self.line_ended = true;
                break;
            }
        }
        if len == 0 {
            return false;
        }
        let text = &self.text[self.pos..self.pos + len];
        self.push(Trivia::whitespace(text));
        true
    }

    /// `prefix` up to (not including) the end of the line. A prefix followed by
    /// exactly one repetition of its last character (`///`) is a doc comment.
    pub fn accept_line_comment(&mut self, prefix: &str) -> bool {
        if !self.can_accept() || !self.remaining().starts_with(prefix) {
            return false;
        }
        let len = self.remaining().find('\n').unwrap_or(self.remaining().len());
        let text = &self.text[self.pos..self.pos + len];
        let trivia = match prefix.chars().last() {
            Some(marker) if is_doc_marker(&text[prefix.len()..], marker, false) => {
                Trivia::doc_comment(text, prefix.len() + marker.len_utf8(), 0)
            }
            _ => Trivia::line_comment(text, prefix.len()),
        };
        self.push(trivia);
        true
    }

    /// `open ... close`. When `nested` is true, inner `open` markers increase a
    /// depth counter that inner `close` markers decrease.
    pub fn accept_block_comment(&mut self, open: &str, close: &str, nested: bool) -> bool {
        if !self.can_accept() || !self.remaining().starts_with(open) {
            return false;
        }
        let rest = self.remaining();
        let mut depth = 1usize;
        let mut i = open.len();
        while i < rest.len() {
            let tail = &rest[i..];
            if tail.starts_with(close) {
                depth -= 1;
                i += close.len();
                if depth == 0 {
                    let text = &rest[..i];
                    let body = &text[open.len()..text.len() - close.len()];
                    let trivia = match open.chars().last() {
                        Some(marker) if is_doc_marker(body, marker, true) => {
                            Trivia::doc_comment(text, open.len() + marker.len_utf8(), close.len())
                        }
                        _ => Trivia::block_comment(text, open.len(), close.len()),
                    };
                    self.push(trivia);
                    return true;
                }
            } else if nested && tail.starts_with(open) {
                depth += 1;
                i += open.len();
            } else {
                i += tail.chars().next().map_or(1, char::len_utf8);
            }
        }
        self.push(Trivia::unterminated_comment(rest, open.len()));
        true
    }

    fn push(&mut self, trivia: Trivia) {
        self.pos += trivia.len();
        self.trivia.push(trivia);
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn finish(self) -> (Vec<Trivia>, usize) {
        (self.trivia, self.pos)
    }
}

/// `body` starts with a single `marker` that is not doubled (`////`, `/***`)
/// and is not the whole body (`/**/`).
fn is_doc_marker(body: &str, marker: char, block: bool) -> bool {
    let Some(rest) = body.strip_prefix(marker) else {
        return false;
    };
    if rest.starts_with(marker) {
        return false;
    }
    !block || !rest.is_empty()
}
