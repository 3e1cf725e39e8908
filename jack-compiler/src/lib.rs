//! Jack-to-VM compiler for the `Nand2Tetris` course
//!
//! Compiles Jack source (one class per file) into Hack VM code, through a
//! hand-written tokenizer, a two-scope symbol table, and a recursive-descent
//! compilation engine that emits VM code directly — no intermediate AST.
//!
//! # Architecture
//! - [`tokenizer`]: one-pass character scanner producing a token stream
//! - [`symbol_table`]: class/subroutine two-scope variable table
//! - [`vm_writer`]: thin textual sink for VM commands
//! - [`compilation_engine`]: syntax-directed parser/code-generator
//!
//! A single `.jack` file compiles to one `.vm` file of the same stem.
//! Directory mode compiles every `.jack` file in a directory independently
//! (Jack has no cross-class linking at compile time — calls are late-bound
//! by name), producing one `.vm` file per input.

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod compilation_engine;
pub mod symbol_table;
pub mod tokenizer;
pub mod vm_writer;

use compilation_engine::CompilationEngine;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tokenizer::LexError;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Lex(LexError),
    Compile(compilation_engine::Error),
    /// A directory was given as input but contains no `.jack` files.
    NoJackFiles(PathBuf),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Lex(e) => write!(f, "{e}"),
            Self::Compile(e) => write!(f, "{e}"),
            Self::NoJackFiles(dir) => write!(f, "no .jack files found in {}", dir.display()),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<LexError> for Error {
    fn from(error: LexError) -> Self {
        Self::Lex(error)
    }
}

impl From<compilation_engine::Error> for Error {
    fn from(error: compilation_engine::Error) -> Self {
        Self::Compile(error)
    }
}

/// Compiles one class's Jack source text to VM text, in memory.
///
/// This is the pure core the CLI and the integration tests both drive.
///
/// # Errors
/// Returns the first [`LexError`] or [`compilation_engine::Error`]
/// encountered.
pub fn compile_source(source: &str) -> Result<String, Error> {
    let tokens = tokenizer::tokenize(source)?;
    let mut out = Vec::new();
    {
        let engine = CompilationEngine::new(&tokens, &mut out);
        engine.compile_class()?;
    }
    Ok(String::from_utf8(out).expect("VM writer only emits ASCII text"))
}

/// Compiles `input`, which may be a single `.jack` file or a directory of
/// them, writing one `<Stem>.vm` per source file.
pub fn run(input: &Path) -> Result<(), Error> {
    if input.is_dir() {
        run_directory(input)
    } else {
        run_file(input)
    }
}

fn run_file(input: &Path) -> Result<(), Error> {
    let source = std::fs::read_to_string(input)?;
    let vm_text = compile_source(&source)?;

    let output_path = input.with_extension("vm");
    let file = File::create(&output_path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(vm_text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

fn run_directory(dir: &Path) -> Result<(), Error> {
    let mut jack_files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "jack"))
        .collect();
    jack_files.sort();

    if jack_files.is_empty() {
        return Err(Error::NoJackFiles(dir.to_path_buf()));
    }

    for jack_file in &jack_files {
        run_file(jack_file)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_minimal_class_to_vm_text() {
        let vm = compile_source(
            r"
            class Main {
                function void main() {
                    do Sys.halt();
                    return;
                }
            }
            ",
        )
        .unwrap();
        assert!(vm.starts_with("function Main.main 0\n"));
        assert!(vm.contains("call Sys.halt 0\n"));
        assert!(vm.ends_with("return\n"));
    }

    #[test]
    fn propagates_lex_errors() {
        let err = compile_source("class Main { @ }").unwrap_err();
        assert!(matches!(err, Error::Lex(_)));
    }

    #[test]
    fn propagates_compile_errors() {
        let err = compile_source("class Main { let x = 1; }").unwrap_err();
        assert!(matches!(err, Error::Compile(_)));
    }
}
