//! Logos-based lexeme set shared by the C-family languages.
//!
//! Only the head of the input is lexed: the logos lexer is created on the
//! remaining slice and asked for one lexeme, which does not allocate.

use logos::Logos;

use super::LowLevelToken;
use crate::core::token::TokenType;

/// Logos lexeme enum - maps to TokenType
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum Lexeme {
    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Identifier,

    #[regex(r"@[a-zA-Z_][a-zA-Z0-9_\-]*")]
    AtKeyword,

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r#"'([^'\\\n]|\\.)*'"#)]
    String,

    // =========================================================================
    // MULTI-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("===")]
    StrictEqual,
    #[token("!==")]
    StrictNotEqual,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    NotEqual,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("=>")]
    FatArrow,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,

    // =========================================================================
    // SINGLE-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token(";")]
    SemiColon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Equal,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("!")]
    Bang,
    #[token("&")]
    Ampersand,
    #[token("|")]
    Pipe,
    #[token("?")]
    Question,
    #[token("~")]
    Tilde,
    #[token("^")]
    Caret,
    #[token("#")]
    Hash,
}

impl From<Lexeme> for TokenType {
    fn from(lexeme: Lexeme) -> Self {
        match lexeme {
            Lexeme::Identifier => TokenType::Identifier,
            Lexeme::AtKeyword => TokenType::AtKeyword,
            Lexeme::Number => TokenType::Number,
            Lexeme::String => TokenType::String,
            Lexeme::StrictEqual => TokenType::StrictEqual,
            Lexeme::StrictNotEqual => TokenType::StrictNotEqual,
            Lexeme::EqualEqual => TokenType::EqualEqual,
            Lexeme::NotEqual => TokenType::NotEqual,
            Lexeme::LessEqual => TokenType::LessEqual,
            Lexeme::GreaterEqual => TokenType::GreaterEqual,
            Lexeme::FatArrow => TokenType::FatArrow,
            Lexeme::AndAnd => TokenType::AndAnd,
            Lexeme::OrOr => TokenType::OrOr,
            Lexeme::PlusPlus => TokenType::PlusPlus,
            Lexeme::MinusMinus => TokenType::MinusMinus,
            Lexeme::OpenBrace => TokenType::OpenBrace,
            Lexeme::CloseBrace => TokenType::CloseBrace,
            Lexeme::OpenParen => TokenType::OpenParen,
            Lexeme::CloseParen => TokenType::CloseParen,
            Lexeme::OpenBracket => TokenType::OpenBracket,
            Lexeme::CloseBracket => TokenType::CloseBracket,
            Lexeme::SemiColon => TokenType::SemiColon,
            Lexeme::Colon => TokenType::Colon,
            Lexeme::Comma => TokenType::Comma,
            Lexeme::Dot => TokenType::Dot,
            Lexeme::Plus => TokenType::Plus,
            Lexeme::Minus => TokenType::Minus,
            Lexeme::Asterisk => TokenType::Asterisk,
            Lexeme::Slash => TokenType::Slash,
            Lexeme::Percent => TokenType::Percent,
            Lexeme::Equal => TokenType::Equal,
            Lexeme::Less => TokenType::Less,
            Lexeme::Greater => TokenType::Greater,
            Lexeme::Bang => TokenType::Bang,
            Lexeme::Ampersand => TokenType::Ampersand,
            Lexeme::Pipe => TokenType::Pipe,
            Lexeme::Question => TokenType::Question,
            Lexeme::Tilde => TokenType::Tilde,
            Lexeme::Caret => TokenType::Caret,
            Lexeme::Hash => TokenType::Hash,
        }
    }
}

/// Classify the head of `text` with the shared C-family lexemes.
///
/// ASCII identifiers found by logos are extended with any following unicode
/// identifier characters; identifiers starting with a non-ASCII character are
/// recognized by hand.
pub fn c_family_token(text: &str) -> LowLevelToken {
    let mut lexer = Lexeme::lexer(text);
    match lexer.next() {
        Some(Ok(Lexeme::Identifier)) => {
            let len = lexer.span().end;
            LowLevelToken::new(TokenType::Identifier, len + identifier_tail(&text[len..]))
        }
        Some(Ok(lexeme)) => LowLevelToken::new(lexeme.into(), lexer.span().end),
        Some(Err(())) => match identifier_length(text) {
            0 => LowLevelToken::none(text.chars().next().map_or(1, char::len_utf8)),
            len => LowLevelToken::new(TokenType::Identifier, len),
        },
        None => LowLevelToken::END,
    }
}

/// Length of the unicode identifier that starts `text` (0 if none).
pub fn identifier_length(text: &str) -> usize {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c == '_' || c == '$' || unicode_ident::is_xid_start(c) => {
            c.len_utf8() + identifier_tail(chars.as_str())
        }
        _ => 0,
    }
}

fn identifier_tail(text: &str) -> usize {
    text.chars()
        .take_while(|&c| c == '$' || unicode_ident::is_xid_continue(c))
        .map(char::len_utf8)
        .sum()
}
