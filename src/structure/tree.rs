//! The arena holding a file's items.
//!
//! Nodes are owned by the arena and addressed by [`NodeId`]; detaching an
//! item from its parent leaves it in the arena so a host can re-attach it
//! elsewhere (cut/paste). Handles stay valid for the lifetime of the tree.

use crate::format::FormatDefinition;
use crate::structure::{
    Attribute, BcfError, Block, Comment, ErrorKind, KeyValueItem, Node, NodeId, Parameter,
};

#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Tree {
    pub fn new() -> Tree {
        Tree {
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(
            self.nodes
                .len() as u32,
        );
        self.nodes
            .push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.index())
    }

    /// Panics on a handle from another tree; use [`Tree::get`] when in doubt.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots
            .is_empty()
    }

    // linkage

    pub fn push_root(&mut self, id: NodeId) {
        self.roots
            .push(id);
        self.refresh_structure(id, None, 0);
    }

    /// Insert directly after `preceding`; an unknown sibling appends at the
    /// end instead.
    pub fn insert_root_after(&mut self, id: NodeId, preceding: NodeId) {
        let index = self
            .roots
            .iter()
            .position(|root| *root == preceding);
        match index {
            Some(index) => self
                .roots
                .insert(index + 1, id),
            None => self
                .roots
                .push(id),
        }
        self.refresh_structure(id, None, 0);
    }

    pub fn detach_root(&mut self, id: NodeId) -> bool {
        let index = self
            .roots
            .iter()
            .position(|root| *root == id);
        match index {
            Some(index) => {
                self.roots
                    .remove(index);
                self.node_mut(id)
                    .core_mut()
                    .parent = None;
                true
            }
            None => false,
        }
    }

    pub fn attach_child(&mut self, block: NodeId, child: NodeId) {
        let depth = self
            .node(block)
            .core()
            .depth;
        match self.node_mut(block) {
            Node::Block(owner) => owner
                .children
                .push(child),
            _ => panic!("children can only be attached to a block"),
        }
        self.refresh_structure(child, Some(block), depth + 1);
    }

    pub fn attach_child_after(&mut self, block: NodeId, child: NodeId, preceding: NodeId) {
        let depth = self
            .node(block)
            .core()
            .depth;
        match self.node_mut(block) {
            Node::Block(owner) => {
                let index = owner
                    .children
                    .iter()
                    .position(|known| *known == preceding);
                match index {
                    Some(index) => owner
                        .children
                        .insert(index + 1, child),
                    None => owner
                        .children
                        .push(child),
                }
            }
            _ => panic!("children can only be attached to a block"),
        }
        self.refresh_structure(child, Some(block), depth + 1);
    }

    pub fn detach_child(&mut self, block: NodeId, child: NodeId) -> bool {
        let removed = match self.node_mut(block) {
            Node::Block(owner) => {
                let index = owner
                    .children
                    .iter()
                    .position(|known| *known == child);
                match index {
                    Some(index) => {
                        owner
                            .children
                            .remove(index);
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        };
        if removed {
            self.node_mut(child)
                .core_mut()
                .parent = None;
        }
        removed
    }

    /// Attach an attribute to a block or a parameter.
    pub fn attach_attribute(&mut self, owner: NodeId, attribute: NodeId) {
        let depth = self
            .node(owner)
            .core()
            .depth;
        match self.node_mut(owner) {
            Node::Block(block) => block
                .attributes
                .push(attribute),
            Node::Parameter(parameter) => parameter
                .attributes
                .push(attribute),
            _ => panic!("attributes can only be attached to a block or a parameter"),
        }
        self.refresh_structure(attribute, Some(owner), depth + 1);
    }

    /// Re-anchor an item and renumber its whole subtree. Depth always equals
    /// the parent's depth plus one; roots sit at zero.
    pub(crate) fn refresh_structure(&mut self, id: NodeId, parent: Option<NodeId>, depth: u32) {
        {
            let core = self
                .node_mut(id)
                .core_mut();
            core.parent = parent;
            core.depth = depth;
        }
        let below: Vec<NodeId> = match self.node(id) {
            Node::Comment(_) | Node::Attribute(_) => Vec::new(),
            Node::Parameter(parameter) => parameter
                .attributes
                .clone(),
            Node::Block(block) => block
                .attributes
                .iter()
                .chain(
                    block
                        .children
                        .iter(),
                )
                .copied()
                .collect(),
        };
        for child in below {
            self.refresh_structure(child, Some(id), depth + 1);
        }
    }

    // errors

    pub fn add_error(&mut self, id: NodeId, mut error: BcfError) {
        error.set_item(id);
        self.node_mut(id)
            .core_mut()
            .errors
            .push(error);
    }

    pub fn add_errors<I>(&mut self, id: NodeId, errors: I) -> usize
    where
        I: IntoIterator<Item = BcfError>,
    {
        let mut count = 0;
        for error in errors {
            self.add_error(id, error);
            count += 1;
        }
        count
    }

    pub fn remove_errors_of(&mut self, id: NodeId, kinds: &[ErrorKind]) -> usize {
        self.node_mut(id)
            .core_mut()
            .remove_errors_of(kinds)
    }

    pub fn add_comments(&mut self, id: NodeId, comments: Vec<String>) -> usize {
        self.node_mut(id)
            .core_mut()
            .add_comments(comments)
    }

    // deep queries

    /// Every block at any depth, in document order.
    pub fn deep_blocks(&self) -> Vec<NodeId> {
        let mut blocks = Vec::new();
        for root in &self.roots {
            self.collect_blocks(*root, &mut blocks);
        }
        blocks
    }

    /// Every item at any depth in document order, attributes excluded:
    /// the root items, then recursively the children of every block.
    pub fn deep_items(&self) -> Vec<NodeId> {
        let mut items = Vec::new();
        for root in &self.roots {
            self.collect_items(*root, &mut items);
        }
        items
    }

    fn collect_items(&self, id: NodeId, into: &mut Vec<NodeId>) {
        into.push(id);
        if let Node::Block(block) = self.node(id) {
            for child in &block.children {
                self.collect_items(*child, into);
            }
        }
    }

    fn collect_blocks(&self, id: NodeId, into: &mut Vec<NodeId>) {
        if let Node::Block(block) = self.node(id) {
            into.push(id);
            for child in &block.children {
                self.collect_blocks(*child, into);
            }
        }
    }

    /// The item's own errors plus those of everything it owns, in document
    /// order.
    pub fn deep_errors(&self, id: NodeId) -> Vec<&BcfError> {
        let mut errors = Vec::new();
        self.collect_errors(id, &mut errors);
        errors
    }

    fn collect_errors<'t>(&'t self, id: NodeId, into: &mut Vec<&'t BcfError>) {
        match self.node(id) {
            Node::Comment(comment) => into.extend(
                comment
                    .core
                    .errors
                    .iter(),
            ),
            Node::Attribute(attribute) => into.extend(
                attribute
                    .core
                    .errors
                    .iter(),
            ),
            Node::Parameter(parameter) => {
                into.extend(
                    parameter
                        .core
                        .errors
                        .iter(),
                );
                for attribute in &parameter.attributes {
                    self.collect_errors(*attribute, into);
                }
            }
            Node::Block(block) => {
                into.extend(
                    block
                        .core
                        .errors
                        .iter(),
                );
                for attribute in &block.attributes {
                    self.collect_errors(*attribute, into);
                }
                for child in &block.children {
                    self.collect_errors(*child, into);
                }
            }
        }
    }

    // naming, for error display

    /// Index of this block among its sibling blocks, if it is a child block.
    pub fn block_sibling_index(&self, id: NodeId) -> Option<usize> {
        let parent = self
            .node(id)
            .core()
            .parent?;
        let siblings = &self
            .node(parent)
            .as_block()?
            .children;
        siblings
            .iter()
            .filter(|child| {
                self.node(**child)
                    .as_block()
                    .is_some()
            })
            .position(|child| *child == id)
    }

    /// A short description of one item: block type with its identification
    /// values, or kind plus key.
    pub fn identification(&self, id: NodeId) -> String {
        match self.node(id) {
            Node::Comment(_) => "Comment".to_string(),
            Node::Attribute(attribute) => format!("Attribute {}", attribute.key),
            Node::Parameter(parameter) => format!("Parameter {}", parameter.key),
            Node::Block(block) => {
                let mut text = block
                    .data_type
                    .clone()
                    .unwrap_or_default();
                if let Some(block_id) = &block.id {
                    text.push_str(", Id: ");
                    text.push_str(block_id);
                }
                if let Some(target) = &block.ref_target {
                    text.push_str(", Name: ");
                    text.push_str(target);
                }
                if let Some(index) = self.block_sibling_index(id) {
                    text.push_str(", Index: ");
                    text.push_str(&index.to_string());
                }
                text
            }
        }
    }

    /// The full path of an item, outermost block first.
    pub fn full_name(&self, id: NodeId) -> String {
        let mut parts = vec![self.identification(id)];
        let mut current = self
            .node(id)
            .core()
            .parent;
        while let Some(parent) = current {
            parts.push(self.identification(parent));
            current = self
                .node(parent)
                .core()
                .parent;
        }
        parts.reverse();
        parts.join(" / ")
    }

    // identification attributes

    /// Recompute a block's derived `id`, `ref_target`, and `ref_source` from
    /// its attributes. Called whenever the attributes change.
    pub fn refresh_block_identification(&mut self, definition: &FormatDefinition, id: NodeId) {
        let find = |attribute_name: Option<&str>| -> Option<String> {
            let name = attribute_name?;
            let block = self
                .node(id)
                .as_block()?;
            block
                .attributes
                .iter()
                .filter_map(|attr| {
                    self.node(*attr)
                        .as_attribute()
                })
                .find(|attr| attr.key == name)?
                .first_value()
                .map(|value| value.to_string())
        };

        let block_id = find(definition.block_id_attribute());
        let ref_target = find(definition.block_ref_target_attribute());
        let ref_source = find(definition.block_ref_source_attribute());

        if let Some(block) = self
            .node_mut(id)
            .as_block_mut()
        {
            block.id = block_id;
            block.ref_target = ref_target;
            block.ref_source = ref_source;
        }
    }

    // copying

    /// Clone a subtree into the arena, detached: the copy has no parent and
    /// sits at depth zero until attached somewhere.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let copy = self.clone_node(id);
        self.refresh_structure(copy, None, 0);
        copy
    }

    fn clone_node(&mut self, id: NodeId) -> NodeId {
        let copy = match self
            .node(id)
            .clone()
        {
            Node::Comment(comment) => self.alloc(Node::Comment(Comment { core: comment.core })),
            Node::Attribute(attribute) => self.alloc(Node::Attribute(Attribute {
                core: attribute.core,
                key: attribute.key,
                groups: attribute.groups,
                definition: attribute.definition,
            })),
            Node::Parameter(parameter) => {
                let attributes = parameter
                    .attributes
                    .iter()
                    .map(|attr| self.clone_node(*attr))
                    .collect();
                self.alloc(Node::Parameter(Parameter {
                    core: parameter.core,
                    key: parameter.key,
                    groups: parameter.groups,
                    definition: parameter.definition,
                    attributes,
                }))
            }
            Node::Block(block) => {
                let attributes = block
                    .attributes
                    .iter()
                    .map(|attr| self.clone_node(*attr))
                    .collect();
                let children = block
                    .children
                    .iter()
                    .map(|child| self.clone_node(*child))
                    .collect();
                self.alloc(Node::Block(Block {
                    core: block.core,
                    pre_mark: block.pre_mark,
                    data_type: block.data_type,
                    post_mark: block.post_mark,
                    attributes,
                    children,
                    id: block.id,
                    ref_target: block.ref_target,
                    ref_source: block.ref_source,
                    inheritor: block.inheritor,
                }))
            }
        };
        for error in &mut self
            .node_mut(copy)
            .core_mut()
            .errors
        {
            error.set_item(copy);
        }
        copy
    }
}
