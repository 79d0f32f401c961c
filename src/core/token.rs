//! Tokens: the atomic lexical unit of every language.

use std::fmt;

use smol_str::SmolStr;

use super::trivia::Trivia;

/// All token types shared by the supported languages.
///
/// Keywords are not token types: they are identifiers matched by text, so a
/// keyword of one language stays a plain identifier for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// Unrecognized character(s). Never part of a well-formed node.
    None,
    /// End of input sentinel. Always the last token of a source.
    EndOfInput,

    // =========================================================================
    // LITERALS
    // =========================================================================
    Identifier,
    /// `@name` (Less at-rules, decorators)
    AtKeyword,
    Number,
    /// `"..."` or `'...'`
    String,
    /// `"""..."""` (transformer language only)
    RawString,
    /// `/.../flags` (context-sensitive)
    RegularExpression,

    // =========================================================================
    // STRUCTURAL PUNCTUATION
    // =========================================================================
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    SemiColon,
    Colon,
    Comma,
    Dot,

    // =========================================================================
    // OPERATORS
    // =========================================================================
    Plus,
    PlusPlus,
    Minus,
    MinusMinus,
    Asterisk,
    Slash,
    Percent,
    Equal,
    EqualEqual,
    StrictEqual,
    NotEqual,
    StrictNotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    FatArrow,
    Bang,
    Ampersand,
    AndAnd,
    Pipe,
    OrOr,
    Question,
    Tilde,
    Caret,
    Hash,
}

impl TokenType {
    pub fn is_error(self) -> bool {
        matches!(self, Self::None)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            Self::Number | Self::String | Self::RawString | Self::RegularExpression
        )
    }

    pub fn is_closing(self) -> bool {
        matches!(
            self,
            Self::CloseBrace | Self::CloseParen | Self::CloseBracket
        )
    }

    /// Short description used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            Self::None => "unrecognized input",
            Self::EndOfInput => "end of input",
            Self::Identifier => "identifier",
            Self::AtKeyword => "at-keyword",
            Self::Number => "number",
            Self::String => "string",
            Self::RawString => "raw string",
            Self::RegularExpression => "regular expression",
            Self::OpenBrace => "'{'",
            Self::CloseBrace => "'}'",
            Self::OpenParen => "'('",
            Self::CloseParen => "')'",
            Self::OpenBracket => "'['",
            Self::CloseBracket => "']'",
            Self::SemiColon => "';'",
            Self::Colon => "':'",
            Self::Comma => "','",
            Self::Dot => "'.'",
            Self::Plus => "'+'",
            Self::PlusPlus => "'++'",
            Self::Minus => "'-'",
            Self::MinusMinus => "'--'",
            Self::Asterisk => "'*'",
            Self::Slash => "'/'",
            Self::Percent => "'%'",
            Self::Equal => "'='",
            Self::EqualEqual => "'=='",
            Self::StrictEqual => "'==='",
            Self::NotEqual => "'!='",
            Self::StrictNotEqual => "'!=='",
            Self::Less => "'<'",
            Self::LessEqual => "'<='",
            Self::Greater => "'>'",
            Self::GreaterEqual => "'>='",
            Self::FatArrow => "'=>'",
            Self::Bang => "'!'",
            Self::Ampersand => "'&'",
            Self::AndAnd => "'&&'",
            Self::Pipe => "'|'",
            Self::OrOr => "'||'",
            Self::Question => "'?'",
            Self::Tilde => "'~'",
            Self::Caret => "'^'",
            Self::Hash => "'#'",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A token with its type, exact text and attached trivia.
///
/// Tokens are values: editing a token means building a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    token_type: TokenType,
    text: SmolStr,
    leading: Vec<Trivia>,
    trailing: Vec<Trivia>,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        text: impl Into<SmolStr>,
        leading: Vec<Trivia>,
        trailing: Vec<Trivia>,
    ) -> Self {
        Self {
            token_type,
            text: text.into(),
            leading,
            trailing,
        }
    }

    /// A token without trivia.
    pub fn bare(token_type: TokenType, text: impl Into<SmolStr>) -> Self {
        Self::new(token_type, text, Vec::new(), Vec::new())
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn leading_trivia(&self) -> &[Trivia] {
        &self.leading
    }

    pub fn trailing_trivia(&self) -> &[Trivia] {
        &self.trailing
    }

    pub fn leading_len(&self) -> usize {
        self.leading.iter().map(|t| t.len()).sum()
    }

    pub fn trailing_len(&self) -> usize {
        self.trailing.iter().map(|t| t.len()).sum()
    }

    /// Length of leading trivia + text + trailing trivia.
    pub fn full_len(&self) -> usize {
        self.leading_len() + self.text.len() + self.trailing_len()
    }

    pub fn is_end_of_input(&self) -> bool {
        self.token_type == TokenType::EndOfInput
    }

    pub fn with_leading(&self, leading: Vec<Trivia>) -> Self {
        Self {
            leading,
            ..self.clone()
        }
    }

    pub fn with_trailing(&self, trailing: Vec<Trivia>) -> Self {
        Self {
            trailing,
            ..self.clone()
        }
    }

    /// Append the full text (trivia included) to `out`.
    pub fn write_to(&self, out: &mut String) {
        for t in &self.leading {
            out.push_str(t.text());
        }
        out.push_str(&self.text);
        for t in &self.trailing {
            out.push_str(t.text());
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
