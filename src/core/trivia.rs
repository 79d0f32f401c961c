//! Trivia: whitespace and comments attached to tokens.

use smol_str::SmolStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriviaKind {
    Whitespace,
    LineComment,
    BlockComment,
    /// `///` line or `/** */` block documentation comment.
    DocComment,
    /// A block comment that runs to the end of the input.
    UnterminatedComment,
}

/// A classified span of non-significant text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trivia {
    kind: TriviaKind,
    text: SmolStr,
    open_len: u8,
    close_len: u8,
}

impl Trivia {
    pub fn whitespace(text: impl Into<SmolStr>) -> Self {
        Self {
            kind: TriviaKind::Whitespace,
            text: text.into(),
            open_len: 0,
            close_len: 0,
        }
    }

    pub fn line_comment(text: impl Into<SmolStr>, prefix_len: usize) -> Self {
        Self {
            kind: TriviaKind::LineComment,
            text: text.into(),
            open_len: prefix_len as u8,
            close_len: 0,
        }
    }

    pub fn block_comment(text: impl Into<SmolStr>, open_len: usize, close_len: usize) -> Self {
        Self {
            kind: TriviaKind::BlockComment,
            text: text.into(),
            open_len: open_len as u8,
            close_len: close_len as u8,
        }
    }

    /// A documentation comment. `close_len` is zero for the line form.
    pub fn doc_comment(text: impl Into<SmolStr>, open_len: usize, close_len: usize) -> Self {
        Self {
            kind: TriviaKind::DocComment,
            text: text.into(),
            open_len: open_len as u8,
            close_len: close_len as u8,
        }
    }

    pub fn unterminated_comment(text: impl Into<SmolStr>, open_len: usize) -> Self {
        Self {
            kind: TriviaKind::UnterminatedComment,
            text: text.into(),
            open_len: open_len as u8,
            close_len: 0,
        }
    }

    pub fn kind(&self) -> TriviaKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == TriviaKind::Whitespace
    }

    pub fn is_comment(&self) -> bool {
        !self.is_whitespace()
    }

    /// True for comments that end at the end of the line.
    pub fn is_line_comment(&self) -> bool {
        match self.kind {
            TriviaKind::LineComment => true,
            TriviaKind::DocComment => self.close_len == 0,
            _ => false,
        }
    }

    /// Text between the comment delimiters (empty for whitespace).
    pub fn comment_content(&self) -> &str {
        if self.is_whitespace() {
            return "";
        }
        let start = self.open_len as usize;
        let end = self.text.len() - self.close_len as usize;
        self.text.get(start..end.max(start)).unwrap_or("")
    }

    /// Opening delimiter of a comment (`//`, `/*`...).
    pub fn comment_open(&self) -> &str {
        &self.text[..self.open_len as usize]
    }

    /// Closing delimiter of a block comment.
    pub fn comment_close(&self) -> &str {
        &self.text[self.text.len() - self.close_len as usize..]
    }

    pub fn contains_newline(&self) -> bool {
        self.text.contains('\n')
    }
}
