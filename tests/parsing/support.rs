//! Synthetic format definitions for exercising the engine without the
//! built-in file type.

use bcf::format::{
    DelimiterPair, FormatDefinition, FormatSettings, ItemDefinition, MarkDefinition,
};

fn item(name: &str, is_optional: bool, has_value: bool) -> ItemDefinition {
    ItemDefinition::new(name, is_optional, has_value, false, false, "").unwrap()
}

fn base_settings() -> FormatSettings {
    FormatSettings {
        file_type: "Plain".to_string(),
        single_line_comment_starts: vec!["#".to_string()],
        multi_line_comment_pairs: vec![DelimiterPair::new("/*", "*/").unwrap()],
        block_pairs: vec![DelimiterPair::new("{", "}").unwrap()],
        escape_pairs: vec![DelimiterPair::new("\"", "\"").unwrap()],
        outer_trimming_phrases: vec![" ".to_string(), "\t".to_string()],
        item_separator: ",".to_string(),
        item_value_separator: ":".to_string(),
        value_separator: ",".to_string(),
        value_group_separator: ";".to_string(),
        value_fractional_separator: ".".to_string(),
        magic_spacer: " ".to_string(),
        block_id_attribute: Some("Id".to_string()),
        block_ref_source_attribute: Some("Ref".to_string()),
        block_ref_target_attribute: Some("Name".to_string()),
        block_type_pre_marks: Vec::new(),
        block_type_post_marks: Vec::new(),
        root_block_types: vec![MarkDefinition::block_type("Block", false).unwrap()],
        root_block_attributes: vec![
            item("Id", true, true),
            item("Name", true, true),
            item("Ref", true, true),
        ],
        child_block_types: vec![MarkDefinition::block_type("Child", false).unwrap()],
        child_block_attributes: vec![item("Id", true, true), item("Name", true, true)],
        block_parameters: vec![item("Material", true, true), item("Shape", true, true)],
        parameter_attributes: vec![item("type", true, true)],
    }
}

/// Comma-terminated block types, no pre- or post-marks, `Id`/`Name`/`Ref`
/// identification.
pub fn plain() -> FormatDefinition {
    FormatDefinition::new(base_settings()).unwrap()
}

/// Like [`plain`] but with no identification or reference attributes
/// designated at all.
pub fn plain_without_refs() -> FormatDefinition {
    let mut settings = base_settings();
    settings.block_id_attribute = Some("Id".to_string());
    settings.block_ref_source_attribute = None;
    settings.block_ref_target_attribute = None;
    FormatDefinition::new(settings).unwrap()
}

/// Like [`plain`] but `Material` is a required block parameter.
pub fn demanding() -> FormatDefinition {
    let mut settings = base_settings();
    settings.block_parameters = vec![item("Material", false, true), item("Shape", true, true)];
    FormatDefinition::new(settings).unwrap()
}

pub fn lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.to_string())
        .collect()
}
