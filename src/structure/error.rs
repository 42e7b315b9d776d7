//! Validation and I/O error types.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::structure::NodeId;

/// The closed set of things that can be wrong with a file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    KeyNullOrEmpty,

    BlockIdNotUnique,
    BlockInheritorMissing,
    BlockOpenerWithoutCloser,
    BlockCloserWithoutOpener,
    BlockPreMarkMissing,
    BlockPreMarkUnknown,
    BlockDataTypeMissing,
    BlockDataTypeUnknown,
    BlockPostMarkMissing,
    BlockPostMarkUnknown,

    ParameterUnknown,
    ParameterWithoutParent,
    ParameterMissing,
    ParameterDoubled,

    AttributeUnknown,
    AttributeMissing,
    AttributeDoubled,

    ValueGroupEmpty,
    ValueGroupIndexInvalid,

    ValueNull,
    ValueEmpty,
    ValueIndexInvalid,
    ValueContainsProhibitedPhrase,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::KeyNullOrEmpty => "key-missing-or-empty",
            ErrorKind::BlockIdNotUnique => "block-id-not-unique",
            ErrorKind::BlockInheritorMissing => "block-inheritor-missing",
            ErrorKind::BlockOpenerWithoutCloser => "block-opener-without-closer",
            ErrorKind::BlockCloserWithoutOpener => "block-closer-without-opener",
            ErrorKind::BlockPreMarkMissing => "block-premark-missing",
            ErrorKind::BlockPreMarkUnknown => "block-premark-unknown",
            ErrorKind::BlockDataTypeMissing => "block-datatype-missing",
            ErrorKind::BlockDataTypeUnknown => "block-datatype-unknown",
            ErrorKind::BlockPostMarkMissing => "block-postmark-missing",
            ErrorKind::BlockPostMarkUnknown => "block-postmark-unknown",
            ErrorKind::ParameterUnknown => "parameter-unknown",
            ErrorKind::ParameterWithoutParent => "parameter-without-parent",
            ErrorKind::ParameterMissing => "parameter-missing",
            ErrorKind::ParameterDoubled => "parameter-doubled",
            ErrorKind::AttributeUnknown => "attribute-unknown",
            ErrorKind::AttributeMissing => "attribute-missing",
            ErrorKind::AttributeDoubled => "attribute-doubled",
            ErrorKind::ValueGroupEmpty => "value-group-empty",
            ErrorKind::ValueGroupIndexInvalid => "value-group-index-invalid",
            ErrorKind::ValueNull => "value-null",
            ErrorKind::ValueEmpty => "value-empty",
            ErrorKind::ValueIndexInvalid => "value-index-invalid",
            ErrorKind::ValueContainsProhibitedPhrase => "value-contains-prohibited-phrase",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One recoverable problem, attached to the item it concerns. Errors found
/// while parsing carry the one-based source line; errors found during live
/// revalidation carry none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BcfError {
    kind: ErrorKind,
    info: String,
    line: Option<usize>,
    item: Option<NodeId>,
}

impl BcfError {
    pub fn new(kind: ErrorKind, info: impl Into<String>) -> BcfError {
        BcfError {
            kind,
            info: info.into(),
            line: None,
            item: None,
        }
    }

    pub fn located(kind: ErrorKind, info: impl Into<String>, line: usize) -> BcfError {
        BcfError::new(kind, info).with_line(line)
    }

    pub fn with_line(mut self, line: usize) -> BcfError {
        self.line = Some(line);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn is_from_parsing(&self) -> bool {
        self.line
            .is_some()
    }

    /// The item this error is attached to, once attached.
    pub fn item(&self) -> Option<NodeId> {
        self.item
    }

    pub(crate) fn set_item(&mut self, item: NodeId) {
        self.item = Some(item);
    }
}

impl fmt::Display for BcfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "in line {}: {}: '{}'", line, self.kind, self.info),
            None => write!(f, "{}: '{}'", self.kind, self.info),
        }
    }
}

/// A file could not be read or written. Unlike [`BcfError`]s these are not
/// recoverable: the operation is aborted and the cause surfaced whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileError {
    pub problem: String,
    pub details: String,
    pub filename: PathBuf,
}

impl FileError {
    pub(crate) fn reading(filename: &Path, error: std::io::Error) -> FileError {
        FileError {
            problem: match error.kind() {
                std::io::ErrorKind::NotFound => "File not found".to_string(),
                _ => "Failed reading".to_string(),
            },
            details: error
                .kind()
                .to_string(),
            filename: filename.to_path_buf(),
        }
    }

    pub(crate) fn writing(filename: &Path, error: std::io::Error) -> FileError {
        FileError {
            problem: "Failed writing".to_string(),
            details: error
                .kind()
                .to_string(),
            filename: filename.to_path_buf(),
        }
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}",
            self.filename
                .display(),
            self.problem,
            self.details
        )
    }
}

impl std::error::Error for FileError {}
