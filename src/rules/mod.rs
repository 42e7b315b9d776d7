//! The rule engine: pure checks over observed values, item sets, and block
//! type marks against a [`FormatDefinition`].
//!
//! Every function here is side-effect free and returns the errors it found;
//! callers decide where to attach them and whether to stamp a source line
//! on them. The structural parser and the live revalidation paths both call
//! these, which is what keeps their results identical.

use crate::format::{FormatDefinition, ItemDefinition, MarkDefinition};
use crate::structure::{BcfError, ErrorKind, ValueGroup};

/// Whether an observed key names an attribute or a parameter, which decides
/// the error kind an unknown key is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext {
    Attribute,
    Parameter,
}

/// Check one observed pre-mark, data-type, or post-mark value against its
/// defined set. A set with at least one non-optional entry requires the
/// observed value to equal one of those entries; any present value outside
/// the full set is unknown.
pub fn check_block_mark(
    observed: Option<&str>,
    defined: &[MarkDefinition],
    missing: ErrorKind,
    unknown: ErrorKind,
) -> Vec<BcfError> {
    let mut errors = Vec::new();
    let mandatory: Vec<&MarkDefinition> = defined
        .iter()
        .filter(|mark| !mark.is_optional())
        .collect();
    if !mandatory.is_empty()
        && !mandatory
            .iter()
            .any(|mark| Some(mark.value()) == observed)
    {
        let expected = mandatory
            .iter()
            .map(|mark| mark.value())
            .collect::<Vec<&str>>()
            .join(", ");
        errors.push(BcfError::new(
            missing,
            format!(
                "found '{}', expected: '{}'",
                observed.unwrap_or("null"),
                expected
            ),
        ));
    } else if let Some(value) = observed {
        if !defined
            .iter()
            .any(|mark| mark.value() == value)
        {
            errors.push(BcfError::new(unknown, value));
        }
    }
    errors
}

/// Definitions not flagged optional that are absent from the observed keys.
pub fn check_items_missing<'d>(
    observed_keys: &[&str],
    defined: &'d [ItemDefinition],
) -> Vec<&'d ItemDefinition> {
    defined
        .iter()
        .filter(|definition| {
            !definition.is_optional()
                && !observed_keys
                    .iter()
                    .any(|key| *key == definition.name())
        })
        .collect()
}

/// Keys occurring more than once. Every occurrence of a doubled key is
/// reported, the first included.
pub fn check_items_doubled(observed_keys: &[&str]) -> Vec<String> {
    observed_keys
        .iter()
        .filter(|key| {
            observed_keys
                .iter()
                .filter(|other| other == key)
                .count()
                > 1
        })
        .map(|key| key.to_string())
        .collect()
}

/// Look an observed key up in its definition set. Returns the matching
/// definition, or the unknown-key error for the given context.
pub fn check_item_unknown<'d>(
    defined: &'d [ItemDefinition],
    key: &str,
    context: KeyContext,
) -> (Option<&'d ItemDefinition>, Option<BcfError>) {
    let definition = defined
        .iter()
        .find(|definition| definition.name() == key);
    if definition.is_some() {
        return (definition, None);
    }
    let kind = match context {
        KeyContext::Parameter => ErrorKind::ParameterUnknown,
        KeyContext::Attribute => ErrorKind::AttributeUnknown,
    };
    (None, Some(BcfError::new(kind, key)))
}

/// Missing and doubled checks over a block's or parameter's attribute set.
pub fn check_attributes_valid(
    observed_keys: &[&str],
    defined: &[ItemDefinition],
) -> Vec<BcfError> {
    let mut errors = Vec::new();
    for missing in check_items_missing(observed_keys, defined) {
        errors.push(BcfError::new(ErrorKind::AttributeMissing, missing.name()));
    }
    for doubled in check_items_doubled(observed_keys) {
        errors.push(BcfError::new(ErrorKind::AttributeDoubled, doubled));
    }
    errors
}

/// Missing and doubled checks over a block's parameter set.
pub fn check_parameters_valid(
    observed_keys: &[&str],
    defined: &[ItemDefinition],
) -> Vec<BcfError> {
    let mut errors = Vec::new();
    for missing in check_items_missing(observed_keys, defined) {
        errors.push(BcfError::new(ErrorKind::ParameterMissing, missing.name()));
    }
    for doubled in check_items_doubled(observed_keys) {
        errors.push(BcfError::new(ErrorKind::ParameterDoubled, doubled));
    }
    errors
}

/// Check an item's value groups: emptiness against the definition's
/// `has_value`, blanks against `allow_blank`, and every value against the
/// format's prohibited phrases.
pub fn check_values(
    groups: &[ValueGroup],
    definition: Option<&ItemDefinition>,
    format: &FormatDefinition,
) -> Vec<BcfError> {
    let mut errors = Vec::new();
    if !groups
        .iter()
        .any(|group| !group.is_empty())
    {
        if definition
            .map(|definition| definition.has_value())
            .unwrap_or(true)
        {
            errors.push(BcfError::new(
                ErrorKind::ValueGroupEmpty,
                "Not at least one value present",
            ));
        }
        return errors;
    }
    for (group_index, group) in groups
        .iter()
        .enumerate()
    {
        for (value_index, value) in group
            .values()
            .iter()
            .enumerate()
        {
            let position = format!("group: {}, value: {}", group_index + 1, value_index + 1);
            errors.extend(check_value(value, definition, format, &position));
        }
    }
    errors
}

/// Check one value. `position` names the value's place for the error info.
pub fn check_value(
    value: &str,
    definition: Option<&ItemDefinition>,
    format: &FormatDefinition,
    position: &str,
) -> Vec<BcfError> {
    let mut errors = Vec::new();
    let allow_blank = definition
        .map(|definition| definition.allow_blank())
        .unwrap_or(false);
    if value.is_empty() {
        if !allow_blank {
            errors.push(BcfError::new(ErrorKind::ValueEmpty, position));
        }
        return errors;
    }
    for phrase in format.prohibited_value_phrases() {
        if value.contains(phrase.as_str()) {
            errors.push(BcfError::new(
                ErrorKind::ValueContainsProhibitedPhrase,
                phrase,
            ));
        }
    }
    errors
}
