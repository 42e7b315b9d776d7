//! The registry of supported file types.
//!
//! Built once at startup and passed by reference wherever a definition is
//! needed; there is no hidden global. Hosts register their own definitions
//! (usually loaded from a declarative source by a separate collaborator) or
//! fall back to the built-in "BlocksConfig" definition.

use std::path::Path;

use crate::format::{
    DefinitionError, DelimiterPair, FormatDefinition, FormatSettings, ItemDefinition,
    MarkDefinition,
};

#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    definitions: Vec<FormatDefinition>,
}

impl DefinitionRegistry {
    pub fn new() -> DefinitionRegistry {
        DefinitionRegistry {
            definitions: Vec::new(),
        }
    }

    /// A registry holding only the built-in "BlocksConfig" definition.
    pub fn with_builtin() -> DefinitionRegistry {
        let mut registry = DefinitionRegistry::new();
        registry
            .register(blocks_config_definition())
            .expect("the built-in definition registers cleanly");
        registry
    }

    /// Register a definition. File types are unique within a registry.
    pub fn register(&mut self, definition: FormatDefinition) -> Result<(), DefinitionError> {
        if self
            .definitions
            .iter()
            .any(|known| known.file_type() == definition.file_type())
        {
            return Err(DefinitionError {
                message: format!("file type '{}' already registered", definition.file_type()),
            });
        }
        self.definitions
            .push(definition);
        Ok(())
    }

    pub fn supported_file_types(&self) -> Vec<&str> {
        self.definitions
            .iter()
            .map(|definition| definition.file_type())
            .collect()
    }

    pub fn get(&self, file_type: &str) -> Option<&FormatDefinition> {
        self.definitions
            .iter()
            .find(|definition| definition.file_type() == file_type)
    }

    /// Pick the definition for a file by name: the first whose file type
    /// occurs within the file stem.
    pub fn find_for_file(&self, path: &Path) -> Option<&FormatDefinition> {
        let stem = path
            .file_stem()?
            .to_string_lossy()
            .into_owned();
        self.definitions
            .iter()
            .find(|definition| stem.contains(definition.file_type()))
    }
}

/// The built-in file type: `{ }` blocks, `"` escapes, `#` comments, comma
/// separated items, `Id`/`Name`/`Ref` identification attributes.
pub fn blocks_config_definition() -> FormatDefinition {
    let pair = |opener: &str, closer: &str| {
        DelimiterPair::new(opener, closer).expect("builtin delimiter pairs are non-blank")
    };
    let block_type =
        |value: &str| MarkDefinition::block_type(value, false).expect("builtin types are non-blank");
    let item = |name: &str, is_optional: bool, has_value: bool| {
        ItemDefinition::new(name, is_optional, has_value, false, false, "")
            .expect("builtin item names are non-blank")
    };

    FormatDefinition::new(FormatSettings {
        file_type: "BlocksConfig".to_string(),
        single_line_comment_starts: vec!["#".to_string()],
        multi_line_comment_pairs: vec![pair("/*", "*/")],
        block_pairs: vec![pair("{", "}")],
        escape_pairs: vec![pair("\"", "\"")],
        outer_trimming_phrases: vec![
            " ".to_string(),
            "\t".to_string(),
            "\u{b}".to_string(),
            "\r".to_string(),
            "\n".to_string(),
        ],
        item_separator: ",".to_string(),
        item_value_separator: ":".to_string(),
        value_separator: ",".to_string(),
        value_group_separator: ";".to_string(),
        value_fractional_separator: ".".to_string(),
        magic_spacer: " ".to_string(),
        block_id_attribute: Some("Id".to_string()),
        block_ref_source_attribute: Some("Ref".to_string()),
        block_ref_target_attribute: Some("Name".to_string()),
        block_type_pre_marks: vec![MarkDefinition::mark("+", true)],
        block_type_post_marks: vec![MarkDefinition::mark(" ", false)],
        root_block_types: vec![block_type("Block")],
        root_block_attributes: vec![
            item("Id", true, true),
            item("Name", false, true),
            item("Ref", true, true),
        ],
        child_block_types: vec![block_type("Child")],
        child_block_attributes: vec![item("DropOnDestroy", true, false)],
        block_parameters: vec![
            item("Material", true, true),
            item("Shape", true, true),
            item("Mesh", true, true),
        ],
        parameter_attributes: vec![
            item("type", true, true),
            item("display", true, true),
            item("formatter", true, true),
        ],
    })
    .expect("the builtin definition is well formed")
}
