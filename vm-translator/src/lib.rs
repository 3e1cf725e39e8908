//! VM-to-Hack translator for the `Nand2Tetris` course
//!
//! Lowers stack-machine VM code (Project 7's arithmetic/memory-access
//! commands plus Project 8's program-control commands) into Hack assembly.
//!
//! # Architecture
//! - [`parser`]: parses cleaned VM source lines into [`parser::Command`]s
//! - [`code_writer`]: emits Hack assembly implementing the stack machine
//!   and the standard calling convention
//!
//! A single `.vm` file is translated on its own, with no bootstrap code.
//! A directory of `.vm` files is concatenated into one `.asm` program,
//! preceded by the `SP=256; call Sys.init 0` bootstrap sequence, with
//! function/label scoping and call-site return labels shared across the
//! whole program so cross-file calls resolve correctly.

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod code_writer;
pub mod parser;

use code_writer::CodeWriter;
use parser::{Command, ParseError};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Parse(ParseError),
    CodeGen(code_writer::Error),
    /// A directory was given as input but contains no `.vm` files.
    NoVmFiles(PathBuf),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Parse(e) => write!(f, "{e}"),
            Self::CodeGen(e) => write!(f, "{e}"),
            Self::NoVmFiles(dir) => write!(f, "no .vm files found in {}", dir.display()),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<ParseError> for Error {
    fn from(error: ParseError) -> Self {
        Self::Parse(error)
    }
}

impl From<code_writer::Error> for Error {
    fn from(error: code_writer::Error) -> Self {
        Self::CodeGen(error)
    }
}

/// Translates one class's cleaned VM lines, writing Hack assembly to `writer`.
///
/// `class_name` is used for `static` variable naming. Function and label
/// scoping naturally spans calls to `translate_unit` against the same
/// `writer`, so directory-mode translation can call this once per file.
pub fn translate_unit<W: Write>(
    writer: &mut CodeWriter<W>,
    class_name: &str,
    lines: &[String],
) -> Result<(), Error> {
    writer.set_filename(class_name);
    for command in parser::parse_lines(lines)? {
        match command {
            Command::Arithmetic(op) => writer.write_arithmetic(op)?,
            Command::Push(segment, index) => writer.write_push_pop(true, segment, index)?,
            Command::Pop(segment, index) => writer.write_push_pop(false, segment, index)?,
            Command::Label(label) => writer.write_label(label)?,
            Command::Goto(label) => writer.write_goto(label)?,
            Command::IfGoto(label) => writer.write_if(label)?,
            Command::Function(name, n_locals) => writer.write_function(name, n_locals)?,
            Command::Call(name, n_args) => writer.write_call(name, n_args)?,
            Command::Return => writer.write_return()?,
        }
    }
    Ok(())
}

/// Reads a `.vm` file, stripping comments, blank lines, and surrounding
/// whitespace from every line.
fn read_clean_lines(path: &Path) -> Result<Vec<String>, Error> {
    let file = File::open(path)?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let cleaned = parser::strip_comment_and_trim(&line);
        if !cleaned.is_empty() {
            lines.push(cleaned.to_string());
        }
    }
    Ok(lines)
}

/// Translates `input`, which may be a single `.vm` file or a directory of
/// them. Directory mode concatenates every `.vm` file (sorted by name) into
/// one `.asm` program prefixed with the bootstrap sequence; single-file
/// mode emits no bootstrap, matching the reference translator's behavior.
pub fn run(input: &Path) -> Result<(), Error> {
    if input.is_dir() {
        run_directory(input)
    } else {
        run_single_file(input)
    }
}

fn run_single_file(input: &Path) -> Result<(), Error> {
    let lines = read_clean_lines(input)?;
    let class_name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown");

    let output_path = input.with_extension("asm");
    let mut writer = CodeWriter::new(BufWriter::new(File::create(&output_path)?));
    translate_unit(&mut writer, class_name, &lines)?;
    writer.flush()?;
    Ok(())
}

fn run_directory(dir: &Path) -> Result<(), Error> {
    let mut vm_files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "vm"))
        .collect();
    vm_files.sort();

    if vm_files.is_empty() {
        return Err(Error::NoVmFiles(dir.to_path_buf()));
    }

    let dir_name = dir
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("Output");
    let output_path = dir.join(format!("{dir_name}.asm"));
    let mut writer = CodeWriter::new(BufWriter::new(File::create(&output_path)?));

    writer.write_init()?;

    for vm_file in &vm_files {
        let lines = read_clean_lines(vm_file)?;
        let class_name = vm_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown");
        translate_unit(&mut writer, class_name, &lines)?;
    }

    writer.flush()?;
    Ok(())
}
