//! The item kinds making up a parsed tree.
//!
//! Items live in a [`crate::structure::Tree`] arena and refer to each other
//! by [`NodeId`] handles; `parent` and a block's `inheritor` are lookups,
//! never shared ownership. The four kinds form a closed sum ([`Node`]) so
//! that revalidation, copying, serialization, and error collection each
//! match exhaustively and the compiler flags any future fifth kind.

use crate::format::{is_key_valid, ItemDefinition};
use crate::structure::{BcfError, ErrorKind};

/// Stable handle to a node in a tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// State common to every structure item: linkage, comments, and the
/// accumulated validation errors.
#[derive(Debug, Clone, Default)]
pub struct ItemCore {
    pub(crate) parent: Option<NodeId>,
    pub(crate) depth: u32,
    pub(crate) comments: Vec<String>,
    pub(crate) errors: Vec<BcfError>,
}

impl ItemCore {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn errors(&self) -> &[BcfError] {
        &self.errors
    }

    /// Blank comment text is dropped rather than stored.
    pub fn add_comment(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if is_key_valid(&text) {
            self.comments
                .push(text);
            true
        } else {
            false
        }
    }

    pub fn add_comments<I>(&mut self, comments: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        comments
            .into_iter()
            .filter(|text| self.add_comment(text.clone()))
            .count()
    }

    pub fn clear_comments(&mut self) {
        self.comments
            .clear();
    }

    /// Drop every error of the given kinds. Revalidation replaces a kind's
    /// errors wholesale, never accumulates them.
    pub(crate) fn remove_errors_of(&mut self, kinds: &[ErrorKind]) -> usize {
        let before = self
            .errors
            .len();
        self.errors
            .retain(|error| !kinds.contains(&error.kind()));
        before
            - self
                .errors
                .len()
    }
}

/// One row of values for a key/value item. Not a structure item itself: it
/// carries no comments and no errors, only text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueGroup {
    values: Vec<String>,
}

impl ValueGroup {
    pub fn new() -> ValueGroup {
        ValueGroup { values: Vec::new() }
    }

    pub fn from_values<I, S>(values: I) -> ValueGroup
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValueGroup {
            values: values
                .into_iter()
                .map(|value| value.into())
                .collect(),
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.values
            .is_empty()
    }

    pub fn add_value(&mut self, value: impl Into<String>) {
        self.values
            .push(value.into());
    }
}

/// Shared behavior of the two key/value kinds, [`Attribute`] and
/// [`Parameter`].
pub trait KeyValueItem {
    fn key(&self) -> &str;
    /// Replace the key. An empty replacement is rejected, as at
    /// construction.
    fn set_key(&mut self, key: String) -> Result<(), BcfError>;
    fn definition(&self) -> Option<&ItemDefinition>;
    fn set_definition(&mut self, definition: Option<ItemDefinition>);
    fn value_groups(&self) -> &[ValueGroup];
    fn value_groups_mut(&mut self) -> &mut Vec<ValueGroup>;

    /// Whether any group holds at least one value.
    fn has_any_value(&self) -> bool {
        self.value_groups()
            .iter()
            .any(|group| !group.is_empty())
    }

    /// More than one non-empty group in play.
    fn is_using_groups(&self) -> bool {
        self.value_groups()
            .iter()
            .filter(|group| !group.is_empty())
            .count()
            > 1
    }

    /// Any single group holding more than one value.
    fn has_multi_value(&self) -> bool {
        self.value_groups()
            .iter()
            .any(|group| group.len() > 1)
    }

    fn first_value(&self) -> Option<&str> {
        self.value_groups()
            .first()?
            .values()
            .first()
            .map(|value| value.as_str())
    }

    fn all_values(&self) -> Vec<&str> {
        self.value_groups()
            .iter()
            .flat_map(|group| {
                group
                    .values()
                    .iter()
            })
            .map(|value| value.as_str())
            .collect()
    }

    fn value_at(&self, group_index: usize, value_index: usize) -> Result<&str, BcfError> {
        let group = self
            .value_groups()
            .get(group_index)
            .ok_or_else(|| {
                BcfError::new(ErrorKind::ValueGroupIndexInvalid, group_index.to_string())
            })?;
        group
            .values()
            .get(value_index)
            .map(|value| value.as_str())
            .ok_or_else(|| BcfError::new(ErrorKind::ValueIndexInvalid, value_index.to_string()))
    }

    /// Append to the first group, creating it if none exists yet.
    fn add_value(&mut self, value: String) {
        let groups = self.value_groups_mut();
        if groups.is_empty() {
            groups.push(ValueGroup::new());
        }
        groups[0].add_value(value);
    }

    fn add_value_to(&mut self, group_index: usize, value: String) -> Result<(), BcfError> {
        let groups = self.value_groups_mut();
        let group = groups
            .get_mut(group_index)
            .ok_or_else(|| {
                BcfError::new(ErrorKind::ValueGroupIndexInvalid, group_index.to_string())
            })?;
        group.add_value(value);
        Ok(())
    }

    fn add_group(&mut self, group: ValueGroup) {
        self.value_groups_mut()
            .push(group);
    }

    fn clear_values(&mut self) {
        self.value_groups_mut()
            .clear();
    }
}

/// Free-text comment lines standing on their own in the tree.
#[derive(Debug, Clone, Default)]
pub struct Comment {
    pub(crate) core: ItemCore,
}

impl Comment {
    pub fn new<I>(comments: I) -> Comment
    where
        I: IntoIterator<Item = String>,
    {
        let mut comment = Comment {
            core: ItemCore::default(),
        };
        comment
            .core
            .add_comments(comments);
        comment
    }

    pub fn core(&self) -> &ItemCore {
        &self.core
    }
}

/// A key/value item with no children, owned by a block or a parameter.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub(crate) core: ItemCore,
    pub(crate) key: String,
    pub(crate) groups: Vec<ValueGroup>,
    pub(crate) definition: Option<ItemDefinition>,
}

impl Attribute {
    /// An empty key is a construction failure, not a validation finding.
    pub fn new(key: impl Into<String>) -> Result<Attribute, BcfError> {
        let key = key.into();
        if !is_key_valid(&key) {
            return Err(BcfError::new(ErrorKind::KeyNullOrEmpty, "Attribute"));
        }
        Ok(Attribute {
            core: ItemCore::default(),
            key,
            groups: Vec::new(),
            definition: None,
        })
    }

    pub fn with_value(
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Attribute, BcfError> {
        let mut attribute = Attribute::new(key)?;
        attribute.add_value(value.into());
        Ok(attribute)
    }

    pub fn core(&self) -> &ItemCore {
        &self.core
    }
}

impl KeyValueItem for Attribute {
    fn key(&self) -> &str {
        &self.key
    }

    fn set_key(&mut self, key: String) -> Result<(), BcfError> {
        if !is_key_valid(&key) {
            return Err(BcfError::new(ErrorKind::KeyNullOrEmpty, "Attribute"));
        }
        self.key = key;
        Ok(())
    }

    fn definition(&self) -> Option<&ItemDefinition> {
        self.definition
            .as_ref()
    }

    fn set_definition(&mut self, definition: Option<ItemDefinition>) {
        self.definition = definition;
    }

    fn value_groups(&self) -> &[ValueGroup] {
        &self.groups
    }

    fn value_groups_mut(&mut self) -> &mut Vec<ValueGroup> {
        &mut self.groups
    }
}

/// A key/value item owned by a block, itself carrying attributes.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub(crate) core: ItemCore,
    pub(crate) key: String,
    pub(crate) groups: Vec<ValueGroup>,
    pub(crate) definition: Option<ItemDefinition>,
    pub(crate) attributes: Vec<NodeId>,
}

impl Parameter {
    pub fn new(key: impl Into<String>) -> Result<Parameter, BcfError> {
        let key = key.into();
        if !is_key_valid(&key) {
            return Err(BcfError::new(ErrorKind::KeyNullOrEmpty, "Parameter"));
        }
        Ok(Parameter {
            core: ItemCore::default(),
            key,
            groups: Vec::new(),
            definition: None,
            attributes: Vec::new(),
        })
    }

    pub fn core(&self) -> &ItemCore {
        &self.core
    }

    pub fn attributes(&self) -> &[NodeId] {
        &self.attributes
    }
}

impl KeyValueItem for Parameter {
    fn key(&self) -> &str {
        &self.key
    }

    fn set_key(&mut self, key: String) -> Result<(), BcfError> {
        if !is_key_valid(&key) {
            return Err(BcfError::new(ErrorKind::KeyNullOrEmpty, "Parameter"));
        }
        self.key = key;
        Ok(())
    }

    fn definition(&self) -> Option<&ItemDefinition> {
        self.definition
            .as_ref()
    }

    fn set_definition(&mut self, definition: Option<ItemDefinition>) {
        self.definition = definition;
    }

    fn value_groups(&self) -> &[ValueGroup] {
        &self.groups
    }

    fn value_groups_mut(&mut self) -> &mut Vec<ValueGroup> {
        &mut self.groups
    }
}

/// A structural node with a type marker and attributes, owning parameters,
/// comments, and nested blocks in document order.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub(crate) core: ItemCore,
    pub(crate) pre_mark: Option<String>,
    pub(crate) data_type: Option<String>,
    pub(crate) post_mark: Option<String>,
    pub(crate) attributes: Vec<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) id: Option<String>,
    pub(crate) ref_target: Option<String>,
    pub(crate) ref_source: Option<String>,
    pub(crate) inheritor: Option<NodeId>,
}

impl Block {
    pub fn new(
        pre_mark: Option<String>,
        data_type: Option<String>,
        post_mark: Option<String>,
    ) -> Block {
        Block {
            pre_mark,
            data_type,
            post_mark,
            ..Block::default()
        }
    }

    pub fn core(&self) -> &ItemCore {
        &self.core
    }

    pub fn pre_mark(&self) -> Option<&str> {
        self.pre_mark
            .as_deref()
    }

    pub fn data_type(&self) -> Option<&str> {
        self.data_type
            .as_deref()
    }

    pub fn post_mark(&self) -> Option<&str> {
        self.post_mark
            .as_deref()
    }

    pub fn set_type_marks(
        &mut self,
        pre_mark: Option<String>,
        data_type: Option<String>,
        post_mark: Option<String>,
    ) {
        self.pre_mark = pre_mark;
        self.data_type = data_type;
        self.post_mark = post_mark;
    }

    pub fn attributes(&self) -> &[NodeId] {
        &self.attributes
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// First value of the attribute designated as identification, if any.
    pub fn id(&self) -> Option<&str> {
        self.id
            .as_deref()
    }

    /// First value of the designated reference-target attribute.
    pub fn ref_target(&self) -> Option<&str> {
        self.ref_target
            .as_deref()
    }

    /// First value of the designated reference-source attribute.
    pub fn ref_source(&self) -> Option<&str> {
        self.ref_source
            .as_deref()
    }

    /// The same-file block this one inherits from, assigned by reference
    /// resolution.
    pub fn inheritor(&self) -> Option<NodeId> {
        self.inheritor
    }
}

/// The closed sum over the four item kinds.
#[derive(Debug, Clone)]
pub enum Node {
    Comment(Comment),
    Attribute(Attribute),
    Parameter(Parameter),
    Block(Block),
}

impl Node {
    pub fn core(&self) -> &ItemCore {
        match self {
            Node::Comment(comment) => &comment.core,
            Node::Attribute(attribute) => &attribute.core,
            Node::Parameter(parameter) => &parameter.core,
            Node::Block(block) => &block.core,
        }
    }

    pub(crate) fn core_mut(&mut self) -> &mut ItemCore {
        match self {
            Node::Comment(comment) => &mut comment.core,
            Node::Attribute(attribute) => &mut attribute.core,
            Node::Parameter(parameter) => &mut parameter.core,
            Node::Block(block) => &mut block.core,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Comment(_) => "Comment",
            Node::Attribute(_) => "Attribute",
            Node::Parameter(_) => "Parameter",
            Node::Block(_) => "Block",
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Node::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_block_mut(&mut self) -> Option<&mut Block> {
        match self {
            Node::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&Parameter> {
        match self {
            Node::Parameter(parameter) => Some(parameter),
            _ => None,
        }
    }

    pub fn as_attribute(&self) -> Option<&Attribute> {
        match self {
            Node::Attribute(attribute) => Some(attribute),
            _ => None,
        }
    }

    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Node::Comment(comment) => Some(comment),
            _ => None,
        }
    }

    pub fn as_key_value(&self) -> Option<&dyn KeyValueItem> {
        match self {
            Node::Attribute(attribute) => Some(attribute),
            Node::Parameter(parameter) => Some(parameter),
            Node::Comment(_) | Node::Block(_) => None,
        }
    }

    pub fn as_key_value_mut(&mut self) -> Option<&mut dyn KeyValueItem> {
        match self {
            Node::Attribute(attribute) => Some(attribute),
            Node::Parameter(parameter) => Some(parameter),
            Node::Comment(_) | Node::Block(_) => None,
        }
    }
}
