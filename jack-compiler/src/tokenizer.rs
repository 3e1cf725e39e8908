//! Tokenizer for the Jack language
//!
//! One-pass character scanner. At each step, whitespace and comments
//! (`//`, `/* */`, `/** */`) are skipped, then the next token is decided by
//! its first significant character: a quote starts a string constant, a
//! digit starts an integer constant, a letter or underscore starts an
//! identifier or keyword, and the fixed set of 19 symbol characters are
//! single-character tokens.

use phf::{phf_map, phf_set};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "class" => Keyword::Class,
    "constructor" => Keyword::Constructor,
    "function" => Keyword::Function,
    "method" => Keyword::Method,
    "field" => Keyword::Field,
    "static" => Keyword::Static,
    "var" => Keyword::Var,
    "int" => Keyword::Int,
    "char" => Keyword::Char,
    "boolean" => Keyword::Boolean,
    "void" => Keyword::Void,
    "true" => Keyword::True,
    "false" => Keyword::False,
    "null" => Keyword::Null,
    "this" => Keyword::This,
    "let" => Keyword::Let,
    "do" => Keyword::Do,
    "if" => Keyword::If,
    "else" => Keyword::Else,
    "while" => Keyword::While,
    "return" => Keyword::Return,
};

static SYMBOLS: phf::Set<char> = phf_set! {
    '{', '}', '(', ')', '[', ']', '.', ',', ';',
    '+', '-', '*', '/', '&', '|', '<', '>', '=', '~',
};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    Symbol(char),
    Identifier(String),
    IntConst(u16),
    StringConst(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    UnterminatedString,
    UnterminatedComment,
    InvalidCharacter(char),
    IntegerOutOfRange(String),
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnterminatedString => write!(f, "unterminated string constant"),
            Self::UnterminatedComment => write!(f, "unterminated block comment"),
            Self::InvalidCharacter(c) => write!(f, "invalid character: {c:?}"),
            Self::IntegerOutOfRange(text) => {
                write!(f, "integer constant out of range (0..32767): {text}")
            }
        }
    }
}

impl std::error::Error for LexError {}

/// Tokenizes a complete Jack source file.
///
/// # Errors
/// Returns the first [`LexError`] encountered.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let bytes = source.as_bytes();
    let mut i = 0;
    let mut tokens = Vec::new();

    loop {
        skip_whitespace_and_comments(bytes, &mut i)?;
        if i >= bytes.len() {
            break;
        }

        let c = bytes[i] as char;
        if c == '"' {
            tokens.push(scan_string(bytes, &mut i)?);
        } else if c.is_ascii_digit() {
            tokens.push(scan_integer(bytes, &mut i)?);
        } else if c.is_ascii_alphabetic() || c == '_' {
            tokens.push(scan_identifier_or_keyword(bytes, &mut i));
        } else if SYMBOLS.contains(&c) {
            tokens.push(Token::Symbol(c));
            i += 1;
        } else {
            return Err(LexError::InvalidCharacter(c));
        }
    }

    Ok(tokens)
}

fn skip_whitespace_and_comments(bytes: &[u8], i: &mut usize) -> Result<(), LexError> {
    loop {
        while *i < bytes.len() && (bytes[*i] as char).is_whitespace() {
            *i += 1;
        }

        if *i + 1 < bytes.len() && bytes[*i] == b'/' && bytes[*i + 1] == b'/' {
            while *i < bytes.len() && bytes[*i] != b'\n' {
                *i += 1;
            }
            continue;
        }

        // Handles both `/* */` and `/** */`: the doc-comment marker is just
        // a block comment whose body happens to start with an extra `*`.
        if *i + 1 < bytes.len() && bytes[*i] == b'/' && bytes[*i + 1] == b'*' {
            *i += 2;
            loop {
                if *i + 1 > bytes.len() {
                    return Err(LexError::UnterminatedComment);
                }
                if *i + 1 == bytes.len() || (bytes[*i] == b'*' && bytes[*i + 1] == b'/') {
                    if bytes.get(*i) == Some(&b'*') && bytes.get(*i + 1) == Some(&b'/') {
                        *i += 2;
                        break;
                    }
                    return Err(LexError::UnterminatedComment);
                }
                *i += 1;
            }
            continue;
        }

        break;
    }
    Ok(())
}

fn scan_string(bytes: &[u8], i: &mut usize) -> Result<Token, LexError> {
    *i += 1; // opening quote
    let start = *i;
    while *i < bytes.len() && bytes[*i] != b'"' {
        if bytes[*i] == b'\n' {
            return Err(LexError::UnterminatedString);
        }
        *i += 1;
    }
    if *i >= bytes.len() {
        return Err(LexError::UnterminatedString);
    }
    let text = std::str::from_utf8(&bytes[start..*i])
        .expect("Jack source is validated ASCII within string bounds")
        .to_string();
    *i += 1; // closing quote
    Ok(Token::StringConst(text))
}

fn scan_integer(bytes: &[u8], i: &mut usize) -> Result<Token, LexError> {
    let start = *i;
    while *i < bytes.len() && (bytes[*i] as char).is_ascii_digit() {
        *i += 1;
    }
    let text = std::str::from_utf8(&bytes[start..*i]).expect("digits are ASCII");
    let value: u32 = text
        .parse()
        .map_err(|_| LexError::IntegerOutOfRange(text.to_string()))?;
    if value > 32767 {
        return Err(LexError::IntegerOutOfRange(text.to_string()));
    }
    Ok(Token::IntConst(value as u16))
}

fn scan_identifier_or_keyword(bytes: &[u8], i: &mut usize) -> Token {
    let start = *i;
    while *i < bytes.len() && ((bytes[*i] as char).is_ascii_alphanumeric() || bytes[*i] == b'_') {
        *i += 1;
    }
    let text = std::str::from_utf8(&bytes[start..*i]).expect("identifiers are ASCII");
    KEYWORDS
        .get(text)
        .map_or_else(|| Token::Identifier(text.to_string()), |kw| Token::Keyword(*kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_a_minimal_class() {
        let tokens = tokenize("class Main { }").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Keyword(Keyword::Class),
                Token::Identifier("Main".to_string()),
                Token::Symbol('{'),
                Token::Symbol('}'),
            ]
        );
    }

    #[test]
    fn recognizes_all_literal_kinds() {
        let tokens = tokenize(r#"42 "hello world" foo_bar"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::IntConst(42),
                Token::StringConst("hello world".to_string()),
                Token::Identifier("foo_bar".to_string()),
            ]
        );
    }

    #[test]
    fn skips_line_and_block_and_doc_comments() {
        let tokens = tokenize(
            "// leading comment\n\
             /* block comment */\n\
             /** doc comment\n spanning lines */\n\
             let x = 1; // trailing",
        )
        .unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Keyword(Keyword::Let),
                Token::Identifier("x".to_string()),
                Token::Symbol('='),
                Token::IntConst(1),
                Token::Symbol(';'),
            ]
        );
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = tokenize("\"oops").unwrap_err();
        assert_eq!(err, LexError::UnterminatedString);
    }

    #[test]
    fn string_cannot_span_lines() {
        let err = tokenize("\"line one\nline two\"").unwrap_err();
        assert_eq!(err, LexError::UnterminatedString);
    }

    #[test]
    fn rejects_unterminated_block_comment() {
        let err = tokenize("/* never closes").unwrap_err();
        assert_eq!(err, LexError::UnterminatedComment);
    }

    #[test]
    fn rejects_invalid_character() {
        let err = tokenize("let x = 1 @ 2;").unwrap_err();
        assert_eq!(err, LexError::InvalidCharacter('@'));
    }

    #[test]
    fn rejects_out_of_range_integer() {
        let err = tokenize("40000").unwrap_err();
        assert!(matches!(err, LexError::IntegerOutOfRange(_)));
    }

    #[test]
    fn all_nineteen_symbols_are_recognized() {
        let source = "{}()[].,;+-*/&|<>=~";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens.len(), 19);
    }
}
