//! Parsing: raw bytes to decoded lines to a validated tree.

use std::path::Path;

use tracing::debug;

use crate::structure::FileError;

pub mod parser;
pub mod source;
pub mod tokenizer;

pub use parser::{parse_lines, ParseResult};
pub use source::{NewlineStyle, TextEncoding};
pub use tokenizer::CommentExtraction;

/// A file read off disk: its detected encoding and newline style, and its
/// decoded lines.
#[derive(Debug, Clone)]
pub struct SourceText {
    pub encoding: TextEncoding,
    pub newline: NewlineStyle,
    pub lines: Vec<String>,
}

/// Read and decode a whole file. Decoding replaces malformed sequences;
/// only I/O problems fail.
pub fn read_source(filename: &Path) -> Result<SourceText, FileError> {
    let bytes = match std::fs::read(filename) {
        Ok(bytes) => bytes,
        Err(error) => {
            debug!(?error);
            return Err(FileError::reading(filename, error));
        }
    };
    let (encoding, text) = source::decode(&bytes);
    let newline = source::detect_newline(&text);
    debug!(
        "read {} as {} with {:?} line endings",
        filename.display(),
        encoding.name(),
        newline
    );
    Ok(SourceText {
        encoding,
        newline,
        lines: source::split_lines(&text),
    })
}
