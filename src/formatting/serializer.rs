//! The serializer: walks a tree and emits lines in the canonical
//! conventions of its format definition.
//!
//! Writing always uses the first-declared comment marker, block pair, and
//! escape pair. A key/value item's value text is wrapped in the escape pair
//! when its definition forces escaping, when more than one non-empty value
//! group is in play, or when any group carries more than one value;
//! otherwise it is written bare. Indentation is two magic spacers per
//! nesting level.

use crate::format::FormatDefinition;
use crate::structure::{BcfFile, KeyValueItem, Node, NodeId, Tree};

/// Serialize a whole file's tree.
pub fn serialize_file(file: &BcfFile) -> Vec<String> {
    serialize_tree(file.definition(), file.tree())
}

/// Serialize a tree against a definition, root items in order.
pub fn serialize_tree(definition: &FormatDefinition, tree: &Tree) -> Vec<String> {
    let mut serializer = Serializer {
        definition,
        tree,
        lines: Vec::new(),
    };
    for root in tree.roots() {
        match tree.node(*root) {
            Node::Comment(_) => serializer.comment_line(0, *root),
            Node::Block(_) => serializer.block(0, *root),
            // neither belongs at root level; nothing sensible to emit
            Node::Attribute(_) | Node::Parameter(_) => {}
        }
    }
    serializer.lines
}

struct Serializer<'a> {
    definition: &'a FormatDefinition,
    tree: &'a Tree,
    lines: Vec<String>,
}

impl<'a> Serializer<'a> {
    fn indent(&self, level: usize) -> String {
        let spacer = self
            .definition
            .magic_spacer();
        let mut text = String::new();
        for _ in 0..level {
            text.push_str(spacer);
            text.push_str(spacer);
        }
        text
    }

    fn comment_line(&mut self, level: usize, id: NodeId) {
        let mut line = self.indent(level);
        line.push_str(
            self.definition
                .writing_single_line_comment_start(),
        );
        line.push_str(
            self.definition
                .magic_spacer(),
        );
        line.push_str(
            &self
                .tree
                .node(id)
                .core()
                .comments()
                .join(" / "),
        );
        self.lines
            .push(line);
    }

    /// Trailing comment text shared by block openers and parameter lines.
    fn append_comments(&self, line: &mut String, id: NodeId) {
        let comments = self
            .tree
            .node(id)
            .core()
            .comments();
        if !comments.is_empty() {
            line.push_str(
                self.definition
                    .magic_spacer(),
            );
            line.push_str(
                self.definition
                    .writing_single_line_comment_start(),
            );
            line.push_str(
                self.definition
                    .magic_spacer(),
            );
            line.push_str(&comments.join(" / "));
        }
    }

    fn block(&mut self, level: usize, id: NodeId) {
        self.block_open_line(level, id);
        let children: Vec<NodeId> = self
            .tree
            .node(id)
            .as_block()
            .map(|block| {
                block
                    .children()
                    .to_vec()
            })
            .unwrap_or_default();
        for child in children {
            match self
                .tree
                .node(child)
            {
                Node::Comment(_) => self.comment_line(level + 1, child),
                Node::Block(_) => self.block(level + 1, child),
                Node::Parameter(_) => self.parameter_line(level + 1, child),
                Node::Attribute(_) => {}
            }
        }
        self.block_close_line(level);
    }

    fn block_open_line(&mut self, level: usize, id: NodeId) {
        let block = self
            .tree
            .node(id)
            .as_block()
            .expect("only blocks reach here");
        let mut line = self.indent(level);
        line.push_str(
            self.definition
                .writing_block_pair()
                .opener(),
        );
        line.push_str(
            self.definition
                .magic_spacer(),
        );
        line.push_str(
            block
                .pre_mark()
                .unwrap_or(""),
        );
        line.push_str(
            block
                .data_type()
                .unwrap_or(""),
        );
        line.push_str(
            block
                .post_mark()
                .unwrap_or(""),
        );

        let attribute_texts: Vec<String> = block
            .attributes()
            .iter()
            .filter_map(|attr| {
                self.tree
                    .node(*attr)
                    .as_key_value()
            })
            .map(|attribute| self.item_text(attribute))
            .collect();
        if !attribute_texts.is_empty() {
            // with no post-mark terminating the type, the item separator
            // keeps the first attribute apart from it
            if block
                .post_mark()
                .is_none()
            {
                line.push_str(
                    self.definition
                        .item_separator(),
                );
                line.push_str(
                    self.definition
                        .magic_spacer(),
                );
            }
            let joiner = format!(
                "{}{}",
                self.definition
                    .item_separator(),
                self.definition
                    .magic_spacer()
            );
            line.push_str(&attribute_texts.join(&joiner));
        }

        self.append_comments(&mut line, id);
        self.lines
            .push(line);
    }

    fn block_close_line(&mut self, level: usize) {
        let mut line = self.indent(level);
        line.push_str(
            self.definition
                .writing_block_pair()
                .closer(),
        );
        self.lines
            .push(line);
    }

    fn parameter_line(&mut self, level: usize, id: NodeId) {
        let parameter = self
            .tree
            .node(id)
            .as_parameter()
            .expect("only parameters reach here");
        let mut line = self.indent(level);
        line.push_str(&self.item_text(parameter));

        let attribute_texts: Vec<String> = parameter
            .attributes()
            .iter()
            .filter_map(|attr| {
                self.tree
                    .node(*attr)
                    .as_key_value()
            })
            .map(|attribute| self.item_text(attribute))
            .collect();
        if !attribute_texts.is_empty() {
            line.push_str(
                self.definition
                    .item_separator(),
            );
            line.push_str(
                self.definition
                    .magic_spacer(),
            );
            let joiner = format!(
                "{}{}",
                self.definition
                    .item_separator(),
                self.definition
                    .magic_spacer()
            );
            line.push_str(&attribute_texts.join(&joiner));
        }

        self.append_comments(&mut line, id);
        self.lines
            .push(line);
    }

    /// One key/value item as text, re-deriving the required escaping.
    fn item_text(&self, item: &dyn KeyValueItem) -> String {
        let mut text = item
            .key()
            .to_string();
        if !item.has_any_value() {
            return text;
        }
        text.push_str(
            self.definition
                .item_value_separator(),
        );
        text.push_str(
            self.definition
                .magic_spacer(),
        );

        let escaped = item
            .definition()
            .map(|definition| definition.force_escape())
            .unwrap_or(false)
            || item.is_using_groups()
            || item.has_multi_value();
        if escaped {
            text.push_str(
                self.definition
                    .writing_escape_pair()
                    .opener(),
            );
        }

        let groups: Vec<String> = item
            .value_groups()
            .iter()
            .filter(|group| !group.is_empty())
            .map(|group| {
                group
                    .values()
                    .join(
                        self.definition
                            .value_separator(),
                    )
            })
            .collect();
        text.push_str(
            &groups.join(
                self.definition
                    .value_group_separator(),
            ),
        );

        if escaped {
            text.push_str(
                self.definition
                    .writing_escape_pair()
                    .closer(),
            );
        }
        text
    }
}
