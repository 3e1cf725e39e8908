//! Hack Assembler for the `Nand2Tetris` course
//!
//! This crate provides a two-pass Hack assembly language assembler that translates
//! symbolic assembly into 16-bit Hack machine code.
//!
//! # Architecture
//!
//! The assembler consists of four main modules:
//! - [`parser`]: Zero-copy parsing of assembly instructions
//! - [`code`]: Binary encoding using perfect hash functions (PHF)
//! - [`symbol_table`]: Symbol management with predefined symbols
//! - [`macros`]: Compile-time optimizations and utilities
//!
//! # Performance Optimizations
//!
//! - **PHF (Perfect Hash Functions)**: O(1) compile-time hash maps for instruction encoding
//! - **Zero-copy parsing**: Uses string slices to avoid allocations
//! - **Aggressive inlining**: Hot path functions are force-inlined
//! - **Pre-allocated capacity**: Reduces rehashing overhead
//! - **Link-time optimization (LTO)**: Enabled in release profile
//!
//! # Example
//!
//! ```rust
//! use assembler::{ParserLines, CommandType, SymbolTable, code};
//!
//! // Parse assembly code
//! let lines = vec!["@100".to_string(), "D=M".to_string()];
//! let mut parser = ParserLines::from_lines(&lines);
//!
//! // Process first instruction
//! parser.advance();
//! assert_eq!(parser.command_type().unwrap(), CommandType::ACommand);
//! assert_eq!(parser.symbol().unwrap(), "100");
//!
//! // Process second instruction
//! parser.advance();
//! assert_eq!(parser.command_type().unwrap(), CommandType::CCommand);
//! let instruction = code::encode_c_instruction("D", "M", "").unwrap();
//! assert_eq!(instruction, "1111110000010000");
//!
//! // Use symbol table
//! let mut symbols = SymbolTable::new();
//! symbols.add_entry("LOOP", 10);
//! assert_eq!(symbols.get_address("LOOP"), 10);
//! assert_eq!(symbols.get_address("SP"), 0); // Predefined symbol
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::inline_always,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

#[macro_use]
pub mod macros;

pub mod code;
pub mod parser;
pub mod symbol_table;

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// Re-export commonly used types for convenience
pub use code::UnknownMnemonic;
pub use parser::{CommandType, ParserError, ParserLines};
pub use symbol_table::SymbolTable;

/// Errors that can occur while assembling a program.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Parser(ParserError),
    Mnemonic(UnknownMnemonic),
    /// An `L`-command reached the emission pass; pass 1 should have
    /// already resolved every label to a ROM address.
    UnresolvedLabel(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Parser(e) => write!(f, "{e}"),
            Self::Mnemonic(e) => write!(f, "{e}"),
            Self::UnresolvedLabel(label) => {
                write!(f, "label command ({label}) survived into code generation")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<ParserError> for Error {
    fn from(error: ParserError) -> Self {
        Self::Parser(error)
    }
}

impl From<UnknownMnemonic> for Error {
    fn from(error: UnknownMnemonic) -> Self {
        Self::Mnemonic(error)
    }
}

/// Runs the two-pass assembler over in-memory source lines, returning one
/// binary string per emitted instruction.
///
/// Pass 1 builds the symbol table from label declarations; pass 2 resolves
/// every `A`/`C` command to a 16-bit binary string. This is the pure core
/// the CLI and the integration tests both drive.
pub fn assemble(lines: &[String]) -> Result<Vec<String>, Error> {
    let mut symbol_table = SymbolTable::new();
    first_pass(lines, &mut symbol_table)?;
    second_pass(lines, &mut symbol_table)
}

/// First pass: records the ROM address of every label without emitting code.
fn first_pass(lines: &[String], symbol_table: &mut SymbolTable) -> Result<(), Error> {
    let mut rom_address = 0u16;
    let mut parser = ParserLines::from_lines(lines);

    while parser.advance() {
        match parser.command_type()? {
            CommandType::LCommand => {
                let symbol = parser.symbol()?;
                symbol_table.add_entry(symbol, rom_address);
            }
            CommandType::ACommand | CommandType::CCommand => {
                rom_address += 1;
            }
        }
    }

    Ok(())
}

/// Second pass: resolves symbols and emits one binary string per instruction.
fn second_pass(lines: &[String], symbol_table: &mut SymbolTable) -> Result<Vec<String>, Error> {
    let mut ram_address = 16u16;
    let mut parser = ParserLines::from_lines(lines);
    let mut instructions = Vec::with_capacity(lines.len());

    while parser.advance() {
        match parser.command_type()? {
            CommandType::ACommand => {
                let symbol = parser.symbol()?;
                let address = symbol
                    .parse::<u16>()
                    .unwrap_or_else(|_| symbol_table.get_or_insert(symbol, &mut ram_address));
                instructions.push(code::encode_a_instruction(address));
            }
            CommandType::CCommand => {
                let dest = parser.dest()?.unwrap_or("");
                let comp = parser.comp()?.unwrap_or("");
                let jump = parser.jump()?.unwrap_or("");
                instructions.push(code::encode_c_instruction(dest, comp, jump)?);
            }
            CommandType::LCommand => {
                return Err(Error::UnresolvedLabel(parser.symbol()?.to_string()));
            }
        }
    }

    Ok(instructions)
}

/// Assembles `input` (an `.asm` file) and writes one 16-bit binary line per
/// instruction to `output` (a `.hack` file).
pub fn run_file(input: &Path, output: &Path) -> Result<(), Error> {
    let lines = read_lines(input)?;
    let instructions = assemble(&lines)?;

    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    for instruction in &instructions {
        writeln!(writer, "{instruction}")?;
    }
    writer.flush()?;
    Ok(())
}

fn read_lines(path: &Path) -> std::io::Result<Vec<String>> {
    use std::io::{BufRead, BufReader};
    let file = File::open(path)?;
    BufReader::new(file).lines().collect()
}
