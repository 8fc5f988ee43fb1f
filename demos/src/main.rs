// SPDX-License-Identifier: Apache-2.0

use std::fs::File;
use std::io::Read;
use std::process;

use luxem::reader::{Reader, ReaderSink};

/// A small built-in document, used when no file path is given.
const BUILTIN_LITERAL: &[u8] = b"{a:1,b:[2,(T)3,{}],}\n";

#[cfg(feature = "clap")]
#[derive(clap::Parser)]
#[command(about = "Parse a luxem document and print its structure")]
struct Args {
    /// Path to a luxem document. With no path, parses a built-in
    /// example document instead.
    path: Option<String>,
}

#[cfg(feature = "clap")]
fn path_arg() -> Option<String> {
    <Args as clap::Parser>::parse().path
}

#[cfg(not(feature = "clap"))]
fn path_arg() -> Option<String> {
    let args: Vec<_> = std::env::args().collect();
    match args.len() {
        1 => None,
        2 => Some(args[1].clone()),
        _ => {
            eprintln!("Usage: {} [file.luxem]", args[0]);
            process::exit(1);
        }
    }
}

/// Prints every event it receives, indented by current container depth.
struct PrintSink {
    depth: usize,
}

impl PrintSink {
    fn new() -> Self {
        Self { depth: 0 }
    }

    fn pad(&self) {
        print!("{}", "  ".repeat(self.depth));
    }
}

impl ReaderSink for PrintSink {
    fn object_begin(&mut self) -> bool {
        self.pad();
        println!("{{");
        self.depth += 1;
        true
    }

    fn object_end(&mut self) -> bool {
        self.depth = self.depth.saturating_sub(1);
        self.pad();
        println!("}}");
        true
    }

    fn array_begin(&mut self) -> bool {
        self.pad();
        println!("[");
        self.depth += 1;
        true
    }

    fn array_end(&mut self) -> bool {
        self.depth = self.depth.saturating_sub(1);
        self.pad();
        println!("]");
        true
    }

    fn key(&mut self, bytes: &[u8]) -> bool {
        self.pad();
        println!("key: {}", String::from_utf8_lossy(bytes));
        true
    }

    fn type_(&mut self, bytes: &[u8]) -> bool {
        self.pad();
        println!("type: {}", String::from_utf8_lossy(bytes));
        true
    }

    fn primitive(&mut self, bytes: &[u8]) -> bool {
        self.pad();
        println!("value: {}", String::from_utf8_lossy(bytes));
        true
    }
}

fn main() {
    let bytes = match path_arg() {
        Some(path) => {
            let mut file = match File::open(&path) {
                Ok(file) => file,
                Err(e) => {
                    eprintln!("Error: unable to open file '{path}': {e}");
                    process::exit(1);
                }
            };
            let mut bytes = Vec::new();
            if let Err(e) = file.read_to_end(&mut bytes) {
                eprintln!("Error: unable to read file '{path}': {e}");
                process::exit(1);
            }
            bytes
        }
        None => BUILTIN_LITERAL.to_vec(),
    };

    let mut reader = Reader::new(PrintSink::new());
    let feed_result = reader.feed(&bytes);
    // A short or hungry return at depth zero just means the document's
    // last root element had no trailing comma, or ended in whitespace
    // the reader is holding onto in case more arrives — not a truncated
    // document. Only a latched error or being stuck mid-container is a
    // real failure.
    match feed_result {
        Ok(_) if reader.error().is_none() && reader.depth() == 0 => process::exit(0),
        Ok(consumed) => {
            eprintln!(
                "Error: document ended mid-container at depth {} (consumed {consumed} of {} bytes)",
                reader.depth(),
                bytes.len()
            );
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: luxem parsing failed: {e}");
            process::exit(1);
        }
    }
}
