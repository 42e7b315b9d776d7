//! Types describing the concrete syntax and schema of one file type.
//!
//! A [`FormatDefinition`] is immutable once constructed and is shared by
//! reference across every item of every file of its type. It owns the
//! delimiter and separator strings, the legal attribute/parameter key sets,
//! and the legal block type markers, plus a handful of predicate helpers the
//! tokenizer and parser lean on.

use std::fmt;

/// Keys, separators, and marker values must carry at least one character.
pub fn is_key_valid(key: &str) -> bool {
    !key.is_empty()
}

/// True when `text` consists of exactly the single character `c`.
pub(crate) fn matches_char(text: &str, c: char) -> bool {
    let mut chars = text.chars();
    chars.next() == Some(c) && chars.next().is_none()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionError {
    pub message: String,
}

impl DefinitionError {
    fn new(message: impl Into<String>) -> DefinitionError {
        DefinitionError {
            message: message.into(),
        }
    }
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid format definition: {}", self.message)
    }
}

impl std::error::Error for DefinitionError {}

/// An opener/closer pair: block delimiters, escape delimiters, or the
/// delimiters of a multi-line comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterPair {
    opener: String,
    closer: String,
}

impl DelimiterPair {
    pub fn new(
        opener: impl Into<String>,
        closer: impl Into<String>,
    ) -> Result<DelimiterPair, DefinitionError> {
        let opener = opener.into();
        let closer = closer.into();
        if !is_key_valid(&opener) {
            return Err(DefinitionError::new("delimiter pair opener is empty"));
        }
        if !is_key_valid(&closer) {
            return Err(DefinitionError::new("delimiter pair closer is empty"));
        }
        Ok(DelimiterPair { opener, closer })
    }

    pub fn opener(&self) -> &str {
        &self.opener
    }

    pub fn closer(&self) -> &str {
        &self.closer
    }
}

/// One legal pre-mark, post-mark, or block-type token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkDefinition {
    value: String,
    is_optional: bool,
}

impl MarkDefinition {
    /// A pre- or post-mark. Marks may be blank (a blank post-mark is how a
    /// space-terminated block type is described) but are never absent.
    pub fn mark(value: impl Into<String>, is_optional: bool) -> MarkDefinition {
        MarkDefinition {
            value: value.into(),
            is_optional,
        }
    }

    /// A block data type, which must be a real token.
    pub fn block_type(
        value: impl Into<String>,
        is_optional: bool,
    ) -> Result<MarkDefinition, DefinitionError> {
        let value = value.into();
        if !is_key_valid(&value) {
            return Err(DefinitionError::new("block type value is empty"));
        }
        Ok(MarkDefinition { value, is_optional })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_optional(&self) -> bool {
        self.is_optional
    }
}

/// Describes one legal attribute or parameter key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDefinition {
    name: String,
    is_optional: bool,
    has_value: bool,
    allow_blank: bool,
    force_escape: bool,
    info: String,
}

impl ItemDefinition {
    pub fn new(
        name: impl Into<String>,
        is_optional: bool,
        has_value: bool,
        allow_blank: bool,
        force_escape: bool,
        info: impl Into<String>,
    ) -> Result<ItemDefinition, DefinitionError> {
        let name = name.into();
        if !is_key_valid(&name) {
            return Err(DefinitionError::new("item definition name is empty"));
        }
        Ok(ItemDefinition {
            name,
            is_optional,
            has_value,
            allow_blank,
            force_escape,
            info: info.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_optional(&self) -> bool {
        self.is_optional
    }

    pub fn has_value(&self) -> bool {
        self.has_value
    }

    pub fn allow_blank(&self) -> bool {
        self.allow_blank
    }

    pub fn force_escape(&self) -> bool {
        self.force_escape
    }

    pub fn info(&self) -> &str {
        &self.info
    }
}

/// The raw material for a [`FormatDefinition`]. Collected into a struct so
/// that construction sites read as a table rather than a positional
/// twenty-argument call.
#[derive(Debug, Clone, Default)]
pub struct FormatSettings {
    pub file_type: String,
    pub single_line_comment_starts: Vec<String>,
    pub multi_line_comment_pairs: Vec<DelimiterPair>,
    pub block_pairs: Vec<DelimiterPair>,
    pub escape_pairs: Vec<DelimiterPair>,
    pub outer_trimming_phrases: Vec<String>,
    pub item_separator: String,
    pub item_value_separator: String,
    pub value_separator: String,
    pub value_group_separator: String,
    pub value_fractional_separator: String,
    pub magic_spacer: String,
    pub block_id_attribute: Option<String>,
    pub block_ref_source_attribute: Option<String>,
    pub block_ref_target_attribute: Option<String>,
    pub block_type_pre_marks: Vec<MarkDefinition>,
    pub block_type_post_marks: Vec<MarkDefinition>,
    pub root_block_types: Vec<MarkDefinition>,
    pub root_block_attributes: Vec<ItemDefinition>,
    pub child_block_types: Vec<MarkDefinition>,
    pub child_block_attributes: Vec<ItemDefinition>,
    pub block_parameters: Vec<ItemDefinition>,
    pub parameter_attributes: Vec<ItemDefinition>,
}

/// The externally supplied, immutable syntax-and-schema contract for one
/// file type. The first-declared comment start, block pair, and escape pair
/// are the canonical ones used when writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDefinition {
    file_type: String,
    single_line_comment_starts: Vec<String>,
    multi_line_comment_pairs: Vec<DelimiterPair>,
    block_pairs: Vec<DelimiterPair>,
    escape_pairs: Vec<DelimiterPair>,
    outer_trimming_phrases: Vec<String>,
    item_separator: String,
    item_value_separator: String,
    value_separator: String,
    value_group_separator: String,
    value_fractional_separator: String,
    magic_spacer: String,
    block_id_attribute: Option<String>,
    block_ref_source_attribute: Option<String>,
    block_ref_target_attribute: Option<String>,
    prohibited_value_phrases: Vec<String>,
    block_type_pre_marks: Vec<MarkDefinition>,
    block_type_post_marks: Vec<MarkDefinition>,
    root_block_types: Vec<MarkDefinition>,
    root_block_attributes: Vec<ItemDefinition>,
    child_block_types: Vec<MarkDefinition>,
    child_block_attributes: Vec<ItemDefinition>,
    block_parameters: Vec<ItemDefinition>,
    parameter_attributes: Vec<ItemDefinition>,
}

impl FormatDefinition {
    pub fn new(settings: FormatSettings) -> Result<FormatDefinition, DefinitionError> {
        if !is_key_valid(&settings.file_type) {
            return Err(DefinitionError::new("file type is empty"));
        }
        if settings
            .single_line_comment_starts
            .iter()
            .any(|start| !is_key_valid(start))
        {
            return Err(DefinitionError::new("blank single line comment start"));
        }
        if settings
            .single_line_comment_starts
            .is_empty()
        {
            return Err(DefinitionError::new("no single line comment start given"));
        }
        if settings
            .block_pairs
            .is_empty()
        {
            return Err(DefinitionError::new("no block delimiter pair given"));
        }
        if settings
            .escape_pairs
            .is_empty()
        {
            return Err(DefinitionError::new("no escape delimiter pair given"));
        }
        for (name, value) in [
            ("item separator", &settings.item_separator),
            ("item/value separator", &settings.item_value_separator),
            ("value separator", &settings.value_separator),
            ("value group separator", &settings.value_group_separator),
            (
                "value fractional separator",
                &settings.value_fractional_separator,
            ),
            ("magic spacer", &settings.magic_spacer),
        ] {
            if !is_key_valid(value) {
                return Err(DefinitionError::new(format!("{} is empty", name)));
            }
        }

        // Any token with structural meaning is prohibited inside a value.
        let mut prohibited: Vec<String> = Vec::new();
        let mut forbid = |phrase: &str| {
            if !prohibited
                .iter()
                .any(|known| known == phrase)
            {
                prohibited.push(phrase.to_string());
            }
        };
        for start in &settings.single_line_comment_starts {
            forbid(start);
        }
        for pair in settings
            .multi_line_comment_pairs
            .iter()
            .chain(&settings.block_pairs)
            .chain(&settings.escape_pairs)
        {
            forbid(pair.opener());
            forbid(pair.closer());
        }
        forbid(&settings.item_separator);
        forbid(&settings.item_value_separator);
        forbid(&settings.value_separator);
        forbid(&settings.value_group_separator);

        Ok(FormatDefinition {
            file_type: settings.file_type,
            single_line_comment_starts: settings.single_line_comment_starts,
            multi_line_comment_pairs: settings.multi_line_comment_pairs,
            block_pairs: settings.block_pairs,
            escape_pairs: settings.escape_pairs,
            outer_trimming_phrases: settings.outer_trimming_phrases,
            item_separator: settings.item_separator,
            item_value_separator: settings.item_value_separator,
            value_separator: settings.value_separator,
            value_group_separator: settings.value_group_separator,
            value_fractional_separator: settings.value_fractional_separator,
            magic_spacer: settings.magic_spacer,
            block_id_attribute: settings.block_id_attribute,
            block_ref_source_attribute: settings.block_ref_source_attribute,
            block_ref_target_attribute: settings.block_ref_target_attribute,
            prohibited_value_phrases: prohibited,
            block_type_pre_marks: settings.block_type_pre_marks,
            block_type_post_marks: settings.block_type_post_marks,
            root_block_types: settings.root_block_types,
            root_block_attributes: settings.root_block_attributes,
            child_block_types: settings.child_block_types,
            child_block_attributes: settings.child_block_attributes,
            block_parameters: settings.block_parameters,
            parameter_attributes: settings.parameter_attributes,
        })
    }

    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    pub fn single_line_comment_starts(&self) -> &[String] {
        &self.single_line_comment_starts
    }

    pub fn multi_line_comment_pairs(&self) -> &[DelimiterPair] {
        &self.multi_line_comment_pairs
    }

    pub fn block_pairs(&self) -> &[DelimiterPair] {
        &self.block_pairs
    }

    pub fn escape_pairs(&self) -> &[DelimiterPair] {
        &self.escape_pairs
    }

    pub fn outer_trimming_phrases(&self) -> &[String] {
        &self.outer_trimming_phrases
    }

    pub fn item_separator(&self) -> &str {
        &self.item_separator
    }

    pub fn item_value_separator(&self) -> &str {
        &self.item_value_separator
    }

    pub fn value_separator(&self) -> &str {
        &self.value_separator
    }

    pub fn value_group_separator(&self) -> &str {
        &self.value_group_separator
    }

    pub fn value_fractional_separator(&self) -> &str {
        &self.value_fractional_separator
    }

    pub fn magic_spacer(&self) -> &str {
        &self.magic_spacer
    }

    pub fn block_id_attribute(&self) -> Option<&str> {
        self.block_id_attribute
            .as_deref()
    }

    pub fn block_ref_source_attribute(&self) -> Option<&str> {
        self.block_ref_source_attribute
            .as_deref()
    }

    pub fn block_ref_target_attribute(&self) -> Option<&str> {
        self.block_ref_target_attribute
            .as_deref()
    }

    pub fn prohibited_value_phrases(&self) -> &[String] {
        &self.prohibited_value_phrases
    }

    pub fn block_type_pre_marks(&self) -> &[MarkDefinition] {
        &self.block_type_pre_marks
    }

    pub fn block_type_post_marks(&self) -> &[MarkDefinition] {
        &self.block_type_post_marks
    }

    pub fn root_block_types(&self) -> &[MarkDefinition] {
        &self.root_block_types
    }

    pub fn root_block_attributes(&self) -> &[ItemDefinition] {
        &self.root_block_attributes
    }

    pub fn child_block_types(&self) -> &[MarkDefinition] {
        &self.child_block_types
    }

    pub fn child_block_attributes(&self) -> &[ItemDefinition] {
        &self.child_block_attributes
    }

    pub fn block_parameters(&self) -> &[ItemDefinition] {
        &self.block_parameters
    }

    pub fn parameter_attributes(&self) -> &[ItemDefinition] {
        &self.parameter_attributes
    }

    pub fn writing_single_line_comment_start(&self) -> &str {
        &self.single_line_comment_starts[0]
    }

    pub fn writing_block_pair(&self) -> &DelimiterPair {
        &self.block_pairs[0]
    }

    pub fn writing_escape_pair(&self) -> &DelimiterPair {
        &self.escape_pairs[0]
    }

    /// The block pair whose opener starts this line, if any.
    pub fn find_block_opener(&self, data: &str) -> Option<&DelimiterPair> {
        self.block_pairs
            .iter()
            .find(|pair| data.starts_with(pair.opener()))
    }

    /// Whether this line starts or ends with any configured block closer.
    pub fn looks_like_block_closer(&self, data: &str) -> bool {
        self.block_pairs
            .iter()
            .any(|pair| data.starts_with(pair.closer()) || data.ends_with(pair.closer()))
    }

    /// The escape pair opened by this character, if any.
    pub fn escape_pair_opened_by(&self, c: char) -> Option<&DelimiterPair> {
        self.escape_pairs
            .iter()
            .find(|pair| matches_char(pair.opener(), c))
    }

    /// The pre-mark this line starts with, if any. Blank pre-mark values
    /// never match.
    pub fn match_pre_mark(&self, data: &str) -> Option<&str> {
        self.block_type_pre_marks
            .iter()
            .filter(|mark| {
                !mark
                    .value()
                    .is_empty()
            })
            .find(|mark| data.starts_with(mark.value()))
            .map(|mark| mark.value())
    }

    /// Whether this character is a configured (non-blank) post-mark.
    pub fn is_post_mark_char(&self, c: char) -> bool {
        self.block_type_post_marks
            .iter()
            .any(|mark| matches_char(mark.value(), c))
    }

    pub fn is_item_separator_char(&self, c: char) -> bool {
        matches_char(&self.item_separator, c)
    }

    pub fn is_item_value_separator_char(&self, c: char) -> bool {
        matches_char(&self.item_value_separator, c)
    }
}
