//! The file container: owns the tree, the file's private copy of its
//! format definition, and the encoding/newline metadata preserved across a
//! load/save round trip. All tree mutation runs through here so the dirty
//! flag stays honest and derived block identification stays current.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::format::FormatDefinition;
use crate::formatting::serialize_tree;
use crate::parsing::{self, parse_lines, NewlineStyle, TextEncoding};
use crate::rules::{
    check_attributes_valid, check_block_mark, check_item_unknown, check_parameters_valid,
    check_values, KeyContext,
};
use crate::structure::{
    Attribute, BcfError, ErrorKind, FileError, KeyValueItem, Node, NodeId, Tree, ValueGroup,
};

/// How a load ended: with a tree, or discarded on the host's request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Completed,
    Cancelled,
}

pub struct BcfFile {
    path: PathBuf,
    encoding: TextEncoding,
    newline: NewlineStyle,
    line_count: usize,
    definition: FormatDefinition,
    tree: Tree,
    fatal_errors: Vec<BcfError>,
    dirty: bool,
}

impl BcfFile {
    /// Probe the file for its encoding, newline style, and length. Content
    /// is not kept; call [`BcfFile::load`] for that.
    pub fn new(
        path: impl Into<PathBuf>,
        definition: FormatDefinition,
    ) -> Result<BcfFile, FileError> {
        let path = path.into();
        let source = parsing::read_source(&path)?;
        Ok(BcfFile {
            path,
            encoding: source.encoding,
            newline: source.newline,
            line_count: source
                .lines
                .len(),
            definition,
            tree: Tree::new(),
            fatal_errors: Vec::new(),
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| {
                name.to_string_lossy()
                    .into_owned()
            })
            .unwrap_or_default()
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn newline(&self) -> NewlineStyle {
        self.newline
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn definition(&self) -> &FormatDefinition {
        &self.definition
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.tree
            .node(id)
    }

    pub fn roots(&self) -> &[NodeId] {
        self.tree
            .roots()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// For hosts editing nodes directly through [`BcfFile::node_mut`].
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.dirty = true;
        self.tree
            .node_mut(id)
    }

    // loading and saving

    pub fn load(&mut self) -> Result<LoadStatus, FileError> {
        self.load_with_progress(|_| true)
    }

    /// Load, replacing any prior content. The callback sees each one-based
    /// line number; returning `false` cancels the load and leaves the prior
    /// tree untouched.
    pub fn load_with_progress(
        &mut self,
        mut progress: impl FnMut(usize) -> bool,
    ) -> Result<LoadStatus, FileError> {
        let source = parsing::read_source(&self.path)?;
        let result = parse_lines(&self.definition, source.lines, &mut progress);
        if result.cancelled {
            debug!("load of {} cancelled", self.path.display());
            return Ok(LoadStatus::Cancelled);
        }

        self.encoding = source.encoding;
        self.newline = source.newline;
        self.line_count = result.line_count;
        self.tree = result.tree;
        self.fatal_errors = result.fatal_errors;
        self.revalidate_uniqueness();
        self.resolve_references();
        self.dirty = false;
        Ok(LoadStatus::Completed)
    }

    /// Write the tree back to the file it was loaded from. Only writes when
    /// there is unsaved data. Root items carrying errors anywhere beneath
    /// them are dropped first, as is the fatal error list.
    pub fn save(&mut self) -> Result<(), FileError> {
        if self.dirty {
            self.write_out(self.path.clone())?;
        }
        Ok(())
    }

    /// Write to a new path and retarget the file there.
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<(), FileError> {
        let path = path.into();
        self.path = path.clone();
        self.write_out(path)
    }

    fn write_out(&mut self, path: PathBuf) -> Result<(), FileError> {
        let invalid: Vec<NodeId> = self
            .tree
            .roots()
            .iter()
            .copied()
            .filter(|root| {
                !self
                    .tree
                    .deep_errors(*root)
                    .is_empty()
            })
            .collect();
        for root in invalid {
            self.tree
                .detach_root(root);
        }
        self.fatal_errors
            .clear();

        let lines = serialize_tree(&self.definition, &self.tree);
        let mut text = String::new();
        for line in &lines {
            text.push_str(line);
            text.push_str(
                self.newline
                    .as_str(),
            );
        }
        let bytes = crate::parsing::source::encode(&text, self.encoding);
        std::fs::write(&path, bytes).map_err(|error| FileError::writing(&path, error))?;
        debug!("wrote {} lines to {}", lines.len(), path.display());

        self.line_count = lines.len();
        self.dirty = false;
        Ok(())
    }

    // mutation

    /// Append a new root item.
    pub fn add_item(&mut self, node: Node) -> NodeId {
        let id = self
            .tree
            .alloc(node);
        self.attach_item(id);
        id
    }

    /// Attach an already-allocated node (for example a deep clone) as a
    /// root item.
    pub fn attach_item(&mut self, id: NodeId) {
        self.tree
            .push_root(id);
        self.refresh_if_block(id);
        self.dirty = true;
    }

    pub fn add_item_after(&mut self, node: Node, preceding: NodeId) -> NodeId {
        let id = self
            .tree
            .alloc(node);
        self.tree
            .insert_root_after(id, preceding);
        self.refresh_if_block(id);
        self.dirty = true;
        id
    }

    pub fn remove_item(&mut self, id: NodeId) -> bool {
        let removed = self
            .tree
            .detach_root(id);
        if removed {
            self.dirty = true;
        }
        removed
    }

    /// Append a new child to a block.
    pub fn add_child(&mut self, block: NodeId, node: Node) -> NodeId {
        let id = self
            .tree
            .alloc(node);
        self.attach_child(block, id);
        id
    }

    pub fn attach_child(&mut self, block: NodeId, id: NodeId) {
        self.tree
            .attach_child(block, id);
        self.resolve_definitions(id);
        self.refresh_if_block(id);
        self.dirty = true;
    }

    pub fn add_child_after(&mut self, block: NodeId, node: Node, preceding: NodeId) -> NodeId {
        let id = self
            .tree
            .alloc(node);
        self.tree
            .attach_child_after(block, id, preceding);
        self.resolve_definitions(id);
        self.refresh_if_block(id);
        self.dirty = true;
        id
    }

    pub fn remove_child(&mut self, block: NodeId, id: NodeId) -> bool {
        let removed = self
            .tree
            .detach_child(block, id);
        if removed {
            self.dirty = true;
        }
        removed
    }

    /// Attach an attribute to a block or parameter; the owning block's
    /// derived identification values follow the attribute set.
    pub fn add_attribute(&mut self, owner: NodeId, attribute: Attribute) -> NodeId {
        let id = self
            .tree
            .alloc(Node::Attribute(attribute));
        self.tree
            .attach_attribute(owner, id);
        self.resolve_definitions(id);
        if self
            .node(owner)
            .as_block()
            .is_some()
        {
            self.tree
                .refresh_block_identification(&self.definition, owner);
        }
        self.dirty = true;
        id
    }

    /// Replace a key/value item's key. The caller revalidates when it wants
    /// the item rechecked against its definition set.
    pub fn set_key(&mut self, item: NodeId, key: impl Into<String>) -> Result<(), BcfError> {
        let result = match self
            .tree
            .node_mut(item)
            .as_key_value_mut()
        {
            Some(key_value) => key_value.set_key(key.into()),
            None => Ok(()),
        };
        if result.is_ok() {
            self.after_value_change(item);
        }
        result
    }

    /// Append a value to a key/value item's first group.
    pub fn add_value(&mut self, item: NodeId, value: impl Into<String>) {
        if let Some(key_value) = self
            .tree
            .node_mut(item)
            .as_key_value_mut()
        {
            key_value.add_value(value.into());
        }
        self.after_value_change(item);
    }

    pub fn add_value_to(
        &mut self,
        item: NodeId,
        group_index: usize,
        value: impl Into<String>,
    ) -> Result<(), BcfError> {
        let result = match self
            .tree
            .node_mut(item)
            .as_key_value_mut()
        {
            Some(key_value) => key_value.add_value_to(group_index, value.into()),
            None => Ok(()),
        };
        if result.is_ok() {
            self.after_value_change(item);
        }
        result
    }

    pub fn add_value_group(&mut self, item: NodeId, group: ValueGroup) {
        if let Some(key_value) = self
            .tree
            .node_mut(item)
            .as_key_value_mut()
        {
            key_value.add_group(group);
        }
        self.after_value_change(item);
    }

    fn after_value_change(&mut self, item: NodeId) {
        self.dirty = true;
        let owner = self
            .node(item)
            .core()
            .parent();
        if let Some(owner) = owner {
            if self
                .node(owner)
                .as_block()
                .is_some()
            {
                self.tree
                    .refresh_block_identification(&self.definition, owner);
            }
        }
    }

    /// Clone a subtree, detached, for host-side paste.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        self.tree
            .deep_clone(id)
    }

    // error aggregation

    pub fn fatal_errors(&self) -> &[BcfError] {
        &self.fatal_errors
    }

    /// Every error in the file: fatal parse errors first, then each item's
    /// errors in document order, deeply.
    pub fn error_list(&self) -> Vec<&BcfError> {
        let mut errors: Vec<&BcfError> = self
            .fatal_errors
            .iter()
            .collect();
        for root in self
            .tree
            .roots()
        {
            errors.extend(
                self.tree
                    .deep_errors(*root),
            );
        }
        errors
    }

    // revalidation

    /// Revalidate one item (and, per kind, what it owns) against the file's
    /// definition. Existing errors of the rechecked kinds are replaced,
    /// never accumulated. Returns the number of errors now present from
    /// these checks.
    pub fn revalidate(&mut self, id: NodeId) -> usize {
        match self.node(id) {
            Node::Comment(_) => 0,
            Node::Attribute(_) => self.revalidate_key_value(id),
            Node::Parameter(_) => {
                let mut count = self.revalidate_key_value(id);
                count += self.revalidate_owned_attributes(id);
                let attributes: Vec<NodeId> = self
                    .node(id)
                    .as_parameter()
                    .map(|parameter| {
                        parameter
                            .attributes()
                            .to_vec()
                    })
                    .unwrap_or_default();
                for attribute in attributes {
                    count += self.revalidate(attribute);
                }
                count
            }
            Node::Block(_) => {
                let mut count = self.revalidate_block_marks(id);
                count += self.revalidate_parameters(id);
                count += self.revalidate_owned_attributes(id);
                let block = self
                    .node(id)
                    .as_block()
                    .expect("matched as a block");
                let attributes: Vec<NodeId> = block
                    .attributes()
                    .to_vec();
                let children: Vec<NodeId> = block
                    .children()
                    .to_vec();
                for attribute in attributes {
                    count += self.revalidate(attribute);
                }
                for child in children {
                    count += self.revalidate(child);
                }
                count
            }
        }
    }

    /// Revalidate every root item, then the file-wide uniqueness and
    /// reference checks.
    pub fn revalidate_all(&mut self) -> usize {
        let roots: Vec<NodeId> = self
            .tree
            .roots()
            .to_vec();
        let mut count = 0;
        for root in roots {
            count += self.revalidate(root);
        }
        count += self.revalidate_uniqueness();
        count += self.resolve_references();
        count
    }

    fn revalidate_key_value(&mut self, id: NodeId) -> usize {
        let key = match self
            .node(id)
            .as_key_value()
        {
            Some(key_value) => key_value
                .key()
                .to_string(),
            None => return 0,
        };
        let context = match self.node(id) {
            Node::Parameter(_) => KeyContext::Parameter,
            _ => KeyContext::Attribute,
        };
        let defined = match self.definition_group_for(id) {
            Some(defined) => defined,
            None => return 0,
        };

        let (item_definition, unknown) = check_item_unknown(&defined, &key, context);
        let item_definition = item_definition.cloned();

        self.tree
            .remove_errors_of(
                id,
                &[ErrorKind::ParameterUnknown, ErrorKind::AttributeUnknown],
            );
        let mut count = 0;
        if let Some(error) = unknown {
            self.tree
                .add_error(id, error);
            count += 1;
        }

        if item_definition.is_some() {
            self.tree
                .remove_errors_of(
                    id,
                    &[
                        ErrorKind::ValueGroupEmpty,
                        ErrorKind::ValueNull,
                        ErrorKind::ValueEmpty,
                        ErrorKind::ValueContainsProhibitedPhrase,
                    ],
                );
            let errors = {
                let key_value = self
                    .node(id)
                    .as_key_value()
                    .expect("checked to be a key/value item above");
                check_values(
                    key_value.value_groups(),
                    item_definition.as_ref(),
                    &self.definition,
                )
            };
            count += self
                .tree
                .add_errors(id, errors);
        }

        if let Some(key_value) = self
            .tree
            .node_mut(id)
            .as_key_value_mut()
        {
            key_value.set_definition(item_definition);
        }
        count
    }

    fn revalidate_owned_attributes(&mut self, owner: NodeId) -> usize {
        let keys: Vec<String> = match self.node(owner) {
            Node::Block(block) => block
                .attributes()
                .to_vec(),
            Node::Parameter(parameter) => parameter
                .attributes()
                .to_vec(),
            _ => return 0,
        }
        .iter()
        .filter_map(|attr| {
            self.node(*attr)
                .as_attribute()
        })
        .map(|attribute| {
            attribute
                .key()
                .to_string()
        })
        .collect();

        let defined = match self.node(owner) {
            Node::Parameter(_) => self
                .definition
                .parameter_attributes()
                .to_vec(),
            Node::Block(_) => {
                if self
                    .node(owner)
                    .core()
                    .parent()
                    .is_none()
                {
                    self.definition
                        .root_block_attributes()
                        .to_vec()
                } else {
                    self.definition
                        .child_block_attributes()
                        .to_vec()
                }
            }
            _ => return 0,
        };

        self.tree
            .remove_errors_of(
                owner,
                &[ErrorKind::AttributeMissing, ErrorKind::AttributeDoubled],
            );
        let key_refs: Vec<&str> = keys
            .iter()
            .map(|key| key.as_str())
            .collect();
        let errors = check_attributes_valid(&key_refs, &defined);
        self.tree
            .add_errors(owner, errors)
    }

    fn revalidate_block_marks(&mut self, id: NodeId) -> usize {
        let (pre_mark, data_type, post_mark, is_root) = match self.node(id) {
            Node::Block(block) => (
                block
                    .pre_mark()
                    .map(str::to_string),
                block
                    .data_type()
                    .map(str::to_string),
                block
                    .post_mark()
                    .map(str::to_string),
                block
                    .core()
                    .parent()
                    .is_none(),
            ),
            _ => return 0,
        };
        let type_definitions = if is_root {
            self.definition
                .root_block_types()
                .to_vec()
        } else {
            self.definition
                .child_block_types()
                .to_vec()
        };

        self.tree
            .remove_errors_of(
                id,
                &[
                    ErrorKind::BlockPreMarkMissing,
                    ErrorKind::BlockPreMarkUnknown,
                    ErrorKind::BlockDataTypeMissing,
                    ErrorKind::BlockDataTypeUnknown,
                    ErrorKind::BlockPostMarkMissing,
                    ErrorKind::BlockPostMarkUnknown,
                ],
            );
        let mut errors = check_block_mark(
            pre_mark.as_deref(),
            self.definition
                .block_type_pre_marks(),
            ErrorKind::BlockPreMarkMissing,
            ErrorKind::BlockPreMarkUnknown,
        );
        errors.extend(check_block_mark(
            data_type.as_deref(),
            &type_definitions,
            ErrorKind::BlockDataTypeMissing,
            ErrorKind::BlockDataTypeUnknown,
        ));
        errors.extend(check_block_mark(
            post_mark.as_deref(),
            self.definition
                .block_type_post_marks(),
            ErrorKind::BlockPostMarkMissing,
            ErrorKind::BlockPostMarkUnknown,
        ));
        self.tree
            .add_errors(id, errors)
    }

    fn revalidate_parameters(&mut self, id: NodeId) -> usize {
        let keys: Vec<String> = match self.node(id) {
            Node::Block(block) => block
                .children()
                .iter()
                .filter_map(|child| {
                    self.node(*child)
                        .as_parameter()
                })
                .map(|parameter| {
                    parameter
                        .key()
                        .to_string()
                })
                .collect(),
            _ => return 0,
        };

        self.tree
            .remove_errors_of(
                id,
                &[ErrorKind::ParameterMissing, ErrorKind::ParameterDoubled],
            );
        let key_refs: Vec<&str> = keys
            .iter()
            .map(|key| key.as_str())
            .collect();
        let errors = check_parameters_valid(
            &key_refs,
            self.definition
                .block_parameters(),
        );
        self.tree
            .add_errors(id, errors)
    }

    /// Check that every block's identification and reference-target values
    /// are unique across the file. Both parties of a collision are
    /// reported, each referencing the other.
    pub fn revalidate_uniqueness(&mut self) -> usize {
        let blocks = self
            .tree
            .deep_blocks();
        let mut count = 0;
        for block in &blocks {
            self.tree
                .remove_errors_of(*block, &[ErrorKind::BlockIdNotUnique]);
            self.tree
                .refresh_block_identification(&self.definition, *block);
        }
        for block in &blocks {
            let (id_value, target_value) = match self
                .node(*block)
                .as_block()
            {
                Some(owner) => (
                    owner
                        .id()
                        .map(str::to_string),
                    owner
                        .ref_target()
                        .map(str::to_string),
                ),
                None => continue,
            };
            let doubled: Vec<NodeId> = blocks
                .iter()
                .copied()
                .filter(|other| other != block)
                .filter(|other| {
                    let other_block = self
                        .node(*other)
                        .as_block();
                    match other_block {
                        Some(other_block) => {
                            (id_value.is_some()
                                && other_block.id() == id_value.as_deref())
                                || (target_value.is_some()
                                    && other_block.ref_target() == target_value.as_deref())
                        }
                        None => false,
                    }
                })
                .collect();
            for other in doubled {
                let info = self
                    .tree
                    .identification(other);
                self.tree
                    .add_error(*block, BcfError::new(ErrorKind::BlockIdNotUnique, info));
                count += 1;
            }
        }
        count
    }

    /// The reference resolver: match each block's reference-source value
    /// against the other blocks' reference-target values and assign the
    /// inheritor link. A source with no matching target is an error; the
    /// first of several matches wins.
    pub fn resolve_references(&mut self) -> usize {
        let blocks = self
            .tree
            .deep_blocks();
        let mut count = 0;
        for block in &blocks {
            self.tree
                .remove_errors_of(*block, &[ErrorKind::BlockInheritorMissing]);
            let source = self
                .node(*block)
                .as_block()
                .and_then(|owner| owner.ref_source())
                .map(str::to_string);
            let inheritor = match &source {
                Some(source) => {
                    let found = blocks
                        .iter()
                        .copied()
                        .find(|candidate| {
                            self.node(*candidate)
                                .as_block()
                                .and_then(|other| other.ref_target())
                                == Some(source.as_str())
                        });
                    if found.is_none() {
                        self.tree
                            .add_error(
                                *block,
                                BcfError::new(ErrorKind::BlockInheritorMissing, source),
                            );
                        count += 1;
                    }
                    found
                }
                None => None,
            };
            if let Some(owner) = self
                .tree
                .node_mut(*block)
                .as_block_mut()
            {
                owner.inheritor = inheritor;
            }
        }
        count
    }

    // definition resolution

    /// The definition set an item's key is judged against, decided by where
    /// the item sits: attributes of root blocks, of child blocks, and of
    /// parameters each have their own set, as do parameters themselves.
    fn definition_group_for(&self, id: NodeId) -> Option<Vec<crate::format::ItemDefinition>> {
        let parent = self
            .node(id)
            .core()
            .parent();
        match self.node(id) {
            Node::Parameter(_) => Some(
                self.definition
                    .block_parameters()
                    .to_vec(),
            ),
            Node::Attribute(_) => {
                let parent = parent?;
                match self.node(parent) {
                    Node::Parameter(_) => Some(
                        self.definition
                            .parameter_attributes()
                            .to_vec(),
                    ),
                    Node::Block(block) => {
                        if block
                            .core()
                            .parent()
                            .is_none()
                        {
                            Some(
                                self.definition
                                    .root_block_attributes()
                                    .to_vec(),
                            )
                        } else {
                            Some(
                                self.definition
                                    .child_block_attributes()
                                    .to_vec(),
                            )
                        }
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Resolve the lazily bound item definitions of a newly attached
    /// subtree.
    fn resolve_definitions(&mut self, id: NodeId) {
        if let Some(defined) = self.definition_group_for(id) {
            let key = self
                .node(id)
                .as_key_value()
                .map(|key_value| {
                    key_value
                        .key()
                        .to_string()
                });
            if let Some(key) = key {
                let context = match self.node(id) {
                    Node::Parameter(_) => KeyContext::Parameter,
                    _ => KeyContext::Attribute,
                };
                let (item_definition, _) = check_item_unknown(&defined, &key, context);
                let item_definition = item_definition.cloned();
                if let Some(key_value) = self
                    .tree
                    .node_mut(id)
                    .as_key_value_mut()
                {
                    key_value.set_definition(item_definition);
                }
            }
        }
        let below: Vec<NodeId> = match self.node(id) {
            Node::Comment(_) | Node::Attribute(_) => Vec::new(),
            Node::Parameter(parameter) => parameter
                .attributes()
                .to_vec(),
            Node::Block(block) => block
                .attributes()
                .iter()
                .chain(
                    block
                        .children()
                        .iter(),
                )
                .copied()
                .collect(),
        };
        for child in below {
            self.resolve_definitions(child);
        }
    }

    fn refresh_if_block(&mut self, id: NodeId) {
        if self
            .node(id)
            .as_block()
            .is_some()
        {
            self.tree
                .refresh_block_identification(&self.definition, id);
        }
    }
}
