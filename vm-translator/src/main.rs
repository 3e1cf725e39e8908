//! VM Translator - Main Entry Point
//!
//! Translates Hack VM code (`Nand2Tetris` Projects 7 and 8) into Hack
//! assembly. Accepts either a single `.vm` file or a directory containing
//! one or more `.vm` files.
//!
//! # Usage
//! ```bash
//! cargo run <file.vm | directory>
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use std::env;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <file.vm | directory>", args[0]);
        process::exit(1);
    }

    let input = Path::new(&args[1]);

    if let Err(err) = vm_translator::run(input) {
        eprintln!("error: {err}");
        process::exit(1);
    }

    println!("Translation complete: {}", input.display());
}
