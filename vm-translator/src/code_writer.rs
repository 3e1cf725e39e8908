//! Code generation module for the VM-to-Hack translator
//!
//! Lowers parsed VM [`Command`](crate::parser::Command)s to Hack assembly
//! text, implementing the standard `Nand2Tetris` stack machine and calling
//! convention: `SP`/`LCL`/`ARG`/`THIS`/`THAT` segment bases, `R13`/`R14` as
//! scratch registers for pop-to-segment and return-frame bookkeeping, and
//! `R5..R12` as the fixed `temp` segment.

use crate::parser::Segment;
use phf::phf_map;
use std::fmt;
use std::io::{self, Write};

/// Maps the four relocatable segments to their base-address register.
static BASE_SYMBOL: phf::Map<&'static str, &'static str> = phf_map! {
    "local" => "LCL",
    "argument" => "ARG",
    "this" => "THIS",
    "that" => "THAT",
};

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    /// A segment/operation pairing that has no meaning on the Hack platform,
    /// e.g. popping into `constant`.
    InvalidSegment {
        operation: &'static str,
        segment: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidSegment { operation, segment } => {
                write!(f, "cannot {operation} segment {segment:?}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

/// Emits Hack assembly for a sequence of VM commands to any [`Write`] sink.
pub struct CodeWriter<W: Write> {
    out: W,
    filename: String,
    compare_counter: u32,
    call_counter: u32,
    current_function: String,
}

impl<W: Write> CodeWriter<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            filename: String::new(),
            compare_counter: 0,
            call_counter: 0,
            current_function: String::new(),
        }
    }

    /// Sets the class name used for `static` variable naming.
    pub fn set_filename(&mut self, filename: &str) {
        let stem = std::path::Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename);
        self.filename.clear();
        self.filename.push_str(stem);
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Emits the bootstrap sequence: `SP=256` followed by `call Sys.init 0`.
    pub fn write_init(&mut self) -> Result<(), Error> {
        writeln!(self.out, "@256\nD=A\n@SP\nM=D")?;
        self.write_call("Sys.init", 0)
    }

    pub fn write_arithmetic(&mut self, command: &str) -> Result<(), Error> {
        writeln!(self.out, "// {command}")?;
        match command {
            "add" => self.binary("M=M+D"),
            "sub" => self.binary("M=M-D"),
            "and" => self.binary("M=M&D"),
            "or" => self.binary("M=M|D"),
            "neg" => writeln!(self.out, "@SP\nA=M-1\nM=-M").map_err(Error::from),
            "not" => writeln!(self.out, "@SP\nA=M-1\nM=!M").map_err(Error::from),
            "eq" => self.compare("JEQ"),
            "gt" => self.compare("JGT"),
            "lt" => self.compare("JLT"),
            _ => unreachable!("the parser rejects unknown arithmetic mnemonics"),
        }
    }

    fn binary(&mut self, op: &str) -> Result<(), Error> {
        writeln!(self.out, "@SP\nAM=M-1\nD=M\nA=A-1\n{op}").map_err(Error::from)
    }

    fn compare(&mut self, jump: &str) -> Result<(), Error> {
        let n = self.compare_counter;
        self.compare_counter += 1;
        writeln!(
            self.out,
            "@SP\nAM=M-1\nD=M\nA=A-1\nD=M-D\n\
             @TRUE.{n}\nD;{jump}\n\
             @SP\nA=M-1\nM=0\n\
             @CONTINUE.{n}\n0;JMP\n\
             (TRUE.{n})\n@SP\nA=M-1\nM=-1\n\
             (CONTINUE.{n})"
        )
        .map_err(Error::from)
    }

    pub fn write_push_pop(&mut self, is_push: bool, segment: Segment, index: u16) -> Result<(), Error> {
        writeln!(
            self.out,
            "// {} {} {index}",
            if is_push { "push" } else { "pop" },
            segment.as_str()
        )?;
        if is_push {
            self.write_push(segment, index)
        } else {
            self.write_pop(segment, index)
        }
    }

    fn write_push(&mut self, segment: Segment, index: u16) -> Result<(), Error> {
        match segment {
            Segment::Constant => {
                writeln!(self.out, "@{index}\nD=A")?;
            }
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                let base = BASE_SYMBOL[segment.as_str()];
                writeln!(self.out, "@{base}\nD=M\n@{index}\nA=D+A\nD=M")?;
            }
            Segment::Temp => {
                writeln!(self.out, "@{}\nD=M", 5 + index)?;
            }
            Segment::Pointer => {
                let symbol = pointer_symbol(index);
                writeln!(self.out, "@{symbol}\nD=M")?;
            }
            Segment::Static => {
                writeln!(self.out, "@{}.{index}\nD=M", self.filename)?;
            }
        }
        writeln!(self.out, "@SP\nA=M\nM=D\n@SP\nM=M+1").map_err(Error::from)
    }

    fn write_pop(&mut self, segment: Segment, index: u16) -> Result<(), Error> {
        match segment {
            Segment::Constant => {
                return Err(Error::InvalidSegment {
                    operation: "pop",
                    segment: "constant",
                });
            }
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                let base = BASE_SYMBOL[segment.as_str()];
                writeln!(self.out, "@{base}\nD=M\n@{index}\nD=D+A\n@R13\nM=D")?;
                self.pop_to_d()?;
                writeln!(self.out, "@R13\nA=M\nM=D")?;
            }
            Segment::Temp => {
                writeln!(self.out, "@{}\nD=A\n@R13\nM=D", 5 + index)?;
                self.pop_to_d()?;
                writeln!(self.out, "@R13\nA=M\nM=D")?;
            }
            Segment::Pointer => {
                let symbol = pointer_symbol(index);
                self.pop_to_d()?;
                writeln!(self.out, "@{symbol}\nM=D")?;
            }
            Segment::Static => {
                self.pop_to_d()?;
                writeln!(self.out, "@{}.{index}\nM=D", self.filename)?;
            }
        }
        Ok(())
    }

    fn pop_to_d(&mut self) -> Result<(), Error> {
        writeln!(self.out, "@SP\nAM=M-1\nD=M").map_err(Error::from)
    }

    fn scoped(&self, label: &str) -> String {
        if self.current_function.is_empty() {
            label.to_string()
        } else {
            format!("{}${}", self.current_function, label)
        }
    }

    pub fn write_label(&mut self, label: &str) -> Result<(), Error> {
        writeln!(self.out, "({})", self.scoped(label)).map_err(Error::from)
    }

    pub fn write_goto(&mut self, label: &str) -> Result<(), Error> {
        writeln!(self.out, "@{}\n0;JMP", self.scoped(label)).map_err(Error::from)
    }

    pub fn write_if(&mut self, label: &str) -> Result<(), Error> {
        writeln!(self.out, "@SP\nAM=M-1\nD=M\n@{}\nD;JNE", self.scoped(label)).map_err(Error::from)
    }

    pub fn write_function(&mut self, name: &str, n_locals: u16) -> Result<(), Error> {
        self.current_function.clear();
        self.current_function.push_str(name);
        writeln!(self.out, "({name})")?;
        for _ in 0..n_locals {
            writeln!(self.out, "@SP\nA=M\nM=0\n@SP\nM=M+1")?;
        }
        Ok(())
    }

    pub fn write_call(&mut self, name: &str, n_args: u16) -> Result<(), Error> {
        let return_label = format!("{name}$ret.{}", self.call_counter);
        self.call_counter += 1;

        writeln!(self.out, "@{return_label}\nD=A\n@SP\nA=M\nM=D\n@SP\nM=M+1")?;
        for segment in ["LCL", "ARG", "THIS", "THAT"] {
            writeln!(self.out, "@{segment}\nD=M\n@SP\nA=M\nM=D\n@SP\nM=M+1")?;
        }
        writeln!(
            self.out,
            "@SP\nD=M\n@{}\nD=D-A\n@ARG\nM=D\n@SP\nD=M\n@LCL\nM=D\n@{name}\n0;JMP\n({return_label})",
            5 + n_args
        )
        .map_err(Error::from)
    }

    pub fn write_return(&mut self) -> Result<(), Error> {
        writeln!(
            self.out,
            "@LCL\nD=M\n@R13\nM=D\n\
             @5\nA=D-A\nD=M\n@R14\nM=D\n\
             @SP\nAM=M-1\nD=M\n@ARG\nA=M\nM=D\n\
             @ARG\nD=M+1\n@SP\nM=D\n\
             @R13\nAM=M-1\nD=M\n@THAT\nM=D\n\
             @R13\nAM=M-1\nD=M\n@THIS\nM=D\n\
             @R13\nAM=M-1\nD=M\n@ARG\nM=D\n\
             @R13\nAM=M-1\nD=M\n@LCL\nM=D\n\
             @R14\nA=M\n0;JMP"
        )
        .map_err(Error::from)
    }
}

fn pointer_symbol(index: u16) -> &'static str {
    if index == 0 { "THIS" } else { "THAT" }
}
