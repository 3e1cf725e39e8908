//! Parser module for the VM intermediate language
//!
//! Parses cleaned VM source lines into a sequence of [`Command`]s in one
//! pass. Unlike a `has_more_commands`/`advance` cursor, callers get a plain
//! `Vec` they can iterate, re-iterate, or index without re-parsing.

use std::fmt;

/// A VM memory segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Argument,
    Local,
    Static,
    Constant,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    fn from_str(segment: &str) -> Option<Self> {
        match segment {
            "argument" => Some(Self::Argument),
            "local" => Some(Self::Local),
            "static" => Some(Self::Static),
            "constant" => Some(Self::Constant),
            "this" => Some(Self::This),
            "that" => Some(Self::That),
            "pointer" => Some(Self::Pointer),
            "temp" => Some(Self::Temp),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Argument => "argument",
            Self::Local => "local",
            Self::Static => "static",
            Self::Constant => "constant",
            Self::This => "this",
            Self::That => "that",
            Self::Pointer => "pointer",
            Self::Temp => "temp",
        }
    }
}

/// A single parsed VM command, borrowing symbol names from the source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Arithmetic(&'a str),
    Push(Segment, u16),
    Pop(Segment, u16),
    Label(&'a str),
    Goto(&'a str),
    IfGoto(&'a str),
    Function(&'a str, u16),
    Call(&'a str, u16),
    Return,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnknownCommand(String),
    UnknownSegment(String),
    MissingArgument {
        command: String,
        position: &'static str,
    },
    InvalidArgument {
        command: String,
        value: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnknownCommand(cmd) => write!(f, "unknown VM command: {cmd:?}"),
            Self::UnknownSegment(seg) => write!(f, "unknown memory segment: {seg:?}"),
            Self::MissingArgument { command, position } => {
                write!(f, "{command} is missing its {position} argument")
            }
            Self::InvalidArgument { command, value } => {
                write!(f, "{command} has an invalid argument: {value:?}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

const ARITHMETIC_COMMANDS: &[&str] = &["add", "sub", "neg", "eq", "gt", "lt", "and", "or", "not"];

/// Strips a trailing `//` comment and surrounding whitespace from a raw
/// source line.
#[must_use]
pub fn strip_comment_and_trim(line: &str) -> &str {
    let code = line.find("//").map_or(line, |pos| &line[..pos]);
    code.trim()
}

/// Parses already-cleaned lines (no blank lines, no comments) into commands.
///
/// # Errors
/// Returns the first [`ParseError`] encountered.
pub fn parse_lines(lines: &[String]) -> Result<Vec<Command<'_>>, ParseError> {
    lines.iter().map(|line| parse_line(line)).collect()
}

fn parse_line(line: &str) -> Result<Command<'_>, ParseError> {
    let mut parts = line.split_whitespace();
    let keyword = parts
        .next()
        .expect("cleaned lines are never empty or whitespace-only");

    match keyword {
        "push" | "pop" => {
            let segment = expect_token(keyword, "segment", parts.next())?;
            let segment =
                Segment::from_str(segment).ok_or_else(|| ParseError::UnknownSegment(segment.to_string()))?;
            let index = parse_u16(keyword, parts.next())?;
            if keyword == "push" {
                Ok(Command::Push(segment, index))
            } else {
                Ok(Command::Pop(segment, index))
            }
        }
        "label" => Ok(Command::Label(expect_token(keyword, "symbol", parts.next())?)),
        "goto" => Ok(Command::Goto(expect_token(keyword, "symbol", parts.next())?)),
        "if-goto" => Ok(Command::IfGoto(expect_token(keyword, "symbol", parts.next())?)),
        "function" => {
            let name = expect_token(keyword, "name", parts.next())?;
            let n_locals = parse_u16(keyword, parts.next())?;
            Ok(Command::Function(name, n_locals))
        }
        "call" => {
            let name = expect_token(keyword, "name", parts.next())?;
            let n_args = parse_u16(keyword, parts.next())?;
            Ok(Command::Call(name, n_args))
        }
        "return" => Ok(Command::Return),
        _ if ARITHMETIC_COMMANDS.contains(&keyword) => Ok(Command::Arithmetic(keyword)),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

fn expect_token<'a>(
    command: &str,
    position: &'static str,
    token: Option<&'a str>,
) -> Result<&'a str, ParseError> {
    token.ok_or_else(|| ParseError::MissingArgument {
        command: command.to_string(),
        position,
    })
}

fn parse_u16(command: &str, token: Option<&str>) -> Result<u16, ParseError> {
    let token = expect_token(command, "index", token)?;
    token.parse().map_err(|_| ParseError::InvalidArgument {
        command: command.to_string(),
        value: token.to_string(),
    })
}
