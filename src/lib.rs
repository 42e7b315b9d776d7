//! The BCF blocks configuration format engine.
//!
//! A BCF file is a sequence of nested blocks carrying typed attributes;
//! blocks own parameters (which themselves carry attributes) and free-text
//! comments. The concrete syntax (comment markers, delimiter pairs,
//! separators, which keys are legal) is itself data, supplied per file
//! type as a [`format::FormatDefinition`]. This crate turns raw text into a
//! validated, cross-referenced in-memory tree, lets a host mutate that tree,
//! and serializes it back to text in the configured conventions.

pub mod format;
pub mod formatting;
pub mod parsing;
pub mod problem;
pub mod rules;
pub mod structure;
