//! Tokenizer for the Cypher subset, built on `logos`.
//!
//! Keywords are not separate tokens: every bare word lexes as
//! [`Token::Ident`] and the parser matches keywords case-insensitively.

use logos::Logos;
use thiserror::Error;

/// Lexing failure with the byte offset of the offending input.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unrecognized input at byte {position}: {fragment:?}")]
pub struct LexError {
    /// Byte offset into the query text
    pub position: usize,
    /// The text that could not be tokenized
    pub fragment: String,
}

/// A lexical token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token<'a> {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("|")]
    Pipe,
    #[token("->")]
    ArrowRight,
    #[token("<-")]
    ArrowLeft,
    #[token("-")]
    Dash,
    #[token("=")]
    Eq,
    #[token("<>")]
    #[token("!=")]
    Neq,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,

    /// `$name`
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*", |lex| &lex.slice()[1..])]
    Parameter(&'a str),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    /// Quoted string, quotes stripped, escapes still raw
    #[regex(r#""([^"\\]|\\.)*""#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    #[regex(r"'([^'\\]|\\.)*'", |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    String(&'a str),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident(&'a str),

    /// Backtick-quoted identifier
    #[regex(r"`[^`]+`", |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    QuotedIdent(&'a str),
}

impl Token<'_> {
    /// Returns true if this token is the given keyword (case-insensitive).
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Ident(word) if word.eq_ignore_ascii_case(keyword))
    }
}

/// Splits query text into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut lexer = Token::lexer(input);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next() {
        match token {
            Ok(token) => tokens.push(token),
            Err(()) => {
                return Err(LexError {
                    position: lexer.span().start,
                    fragment: lexer.slice().to_string(),
                });
            }
        }
    }
    Ok(tokens)
}

/// Resolves backslash escapes inside a string literal.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_match() {
        let tokens = tokenize("MATCH (n:Person) RETURN n.name").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("MATCH"),
                Token::LParen,
                Token::Ident("n"),
                Token::Colon,
                Token::Ident("Person"),
                Token::RParen,
                Token::Ident("RETURN"),
                Token::Ident("n"),
                Token::Dot,
                Token::Ident("name"),
            ]
        );
        assert!(tokens[0].is_keyword("match"));
    }

    #[test]
    fn test_tokenize_arrows_and_operators() {
        let tokens = tokenize("(a)-[r:KNOWS]->(b)<--(c) <= <> >=").unwrap();
        assert!(tokens.contains(&Token::ArrowRight));
        assert!(tokens.contains(&Token::ArrowLeft));
        assert!(tokens.contains(&Token::Le));
        assert!(tokens.contains(&Token::Neq));
        assert!(tokens.contains(&Token::Ge));
    }

    #[test]
    fn test_tokenize_literals() {
        let tokens = tokenize(r#"42 2.5 'it\'s' "x" $who"#).unwrap();
        assert_eq!(tokens[0], Token::Integer(42));
        assert_eq!(tokens[1], Token::Float(2.5));
        assert_eq!(tokens[2], Token::String(r"it\'s"));
        assert_eq!(tokens[3], Token::String("x"));
        assert_eq!(tokens[4], Token::Parameter("who"));
        assert_eq!(unescape(r"it\'s"), "it's");
    }

    #[test]
    fn test_tokenize_error_position() {
        let err = tokenize("MATCH (n) RETURN n ;").unwrap_err();
        assert_eq!(err.position, 19);
    }
}
