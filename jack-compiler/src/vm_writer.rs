//! Thin textual sink for VM commands
//!
//! Mirrors the VM command set the sibling `vm-translator` crate consumes:
//! nine arithmetic mnemonics, `push`/`pop` against the eight named segments,
//! branch commands, and the three calling-convention commands.

use std::fmt;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    fn as_str(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Argument => "argument",
            Self::Local => "local",
            Self::Static => "static",
            Self::This => "this",
            Self::That => "that",
            Self::Pointer => "pointer",
            Self::Temp => "temp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticCommand {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl ArithmeticCommand {
    fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Neg => "neg",
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
        }
    }
}

#[derive(Debug)]
pub struct Error(io::Error);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "I/O error: {}", self.0)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self(error)
    }
}

/// Writes `.vm` textual commands to any [`Write`] sink.
pub struct VMWriter<W: Write> {
    out: W,
}

impl<W: Write> VMWriter<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_push(&mut self, segment: Segment, index: u16) -> Result<(), Error> {
        writeln!(self.out, "push {} {index}", segment.as_str())?;
        Ok(())
    }

    pub fn write_pop(&mut self, segment: Segment, index: u16) -> Result<(), Error> {
        writeln!(self.out, "pop {} {index}", segment.as_str())?;
        Ok(())
    }

    pub fn write_arithmetic(&mut self, command: ArithmeticCommand) -> Result<(), Error> {
        writeln!(self.out, "{}", command.as_str())?;
        Ok(())
    }

    pub fn write_label(&mut self, label: &str) -> Result<(), Error> {
        writeln!(self.out, "label {label}")?;
        Ok(())
    }

    pub fn write_goto(&mut self, label: &str) -> Result<(), Error> {
        writeln!(self.out, "goto {label}")?;
        Ok(())
    }

    pub fn write_if(&mut self, label: &str) -> Result<(), Error> {
        writeln!(self.out, "if-goto {label}")?;
        Ok(())
    }

    pub fn write_call(&mut self, name: &str, n_args: u16) -> Result<(), Error> {
        writeln!(self.out, "call {name} {n_args}")?;
        Ok(())
    }

    pub fn write_function(&mut self, name: &str, n_locals: u16) -> Result<(), Error> {
        writeln!(self.out, "function {name} {n_locals}")?;
        Ok(())
    }

    pub fn write_return(&mut self) -> Result<(), Error> {
        writeln!(self.out, "return")?;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
