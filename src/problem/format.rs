//! Rendering of a file's error list for the terminal and for machines.

use owo_colors::OwoColorize;
use serde::Serialize;

use crate::problem::describe;
use crate::structure::{BcfError, BcfFile};

/// Format one error as a single line:
/// `error: <file>:<line> <kind> at '<item>': <info>`.
pub fn concise_error(file: &BcfFile, error: &BcfError) -> String {
    let location = match error.line() {
        Some(line) => format!("{}:{}", file.file_name(), line),
        None => file.file_name(),
    };
    let place = match error.item() {
        Some(item) => file
            .tree()
            .full_name(item),
        None => "file".to_string(),
    };
    format!(
        "{}: {} {} at '{}': {}",
        "error".bright_red(),
        location,
        error
            .kind()
            .bold(),
        place,
        error.info()
    )
}

/// Format one error with the explanation underneath.
pub fn full_error(file: &BcfFile, error: &BcfError) -> String {
    format!(
        "{}\n    {}",
        concise_error(file, error),
        describe(error.kind())
    )
}

/// The whole error list, one concise line per error.
pub fn report(file: &BcfFile) -> String {
    file.error_list()
        .into_iter()
        .map(|error| concise_error(file, error))
        .collect::<Vec<String>>()
        .join("\n")
}

#[derive(Serialize)]
struct JsonError<'e> {
    kind: crate::structure::ErrorKind,
    message: &'static str,
    info: &'e str,
    line: Option<usize>,
    item: Option<String>,
}

#[derive(Serialize)]
struct JsonReport<'e> {
    filename: String,
    errors: Vec<JsonError<'e>>,
}

/// The whole error list as a JSON document.
pub fn report_json(file: &BcfFile) -> String {
    let errors = file
        .error_list()
        .into_iter()
        .map(|error| JsonError {
            kind: error.kind(),
            message: describe(error.kind()),
            info: error.info(),
            line: error.line(),
            item: error
                .item()
                .map(|item| {
                    file.tree()
                        .full_name(item)
                }),
        })
        .collect();
    let report = JsonReport {
        filename: file.file_name(),
        errors,
    };
    serde_json::to_string_pretty(&report).expect("the error report serializes cleanly")
}
