//! Jack Compiler - Main Entry Point
//!
//! Compiles Jack source (`Nand2Tetris` Projects 10 and 11) into Hack VM
//! code. Accepts either a single `.jack` file or a directory containing one
//! or more `.jack` files; each input file produces one `.vm` file of the
//! same stem.
//!
//! # Usage
//! ```bash
//! cargo run <file.jack | directory>
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use std::env;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <file.jack | directory>", args[0]);
        process::exit(1);
    }

    let input = Path::new(&args[1]);

    if let Err(err) = jack_compiler::run(input) {
        eprintln!("error: {err}");
        process::exit(1);
    }

    println!("Compilation complete: {}", input.display());
}
