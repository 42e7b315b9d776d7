use bcf::format::{blocks_config_definition, ItemDefinition};
use bcf::formatting::serialize_tree;
use bcf::structure::{
    Attribute, Block, Comment, KeyValueItem, Node, Parameter, Tree, ValueGroup,
};

use crate::support::plain;

fn block(tree: &mut Tree, data_type: &str) -> bcf::structure::NodeId {
    tree.alloc(Node::Block(Block::new(
        None,
        Some(data_type.to_string()),
        None,
    )))
}

#[test]
fn single_value_stays_unescaped() {
    let definition = plain();
    let mut tree = Tree::new();
    let root = block(&mut tree, "Block");
    let parameter = tree.alloc(Node::Parameter(Parameter::new("Material").unwrap()));
    if let Some(item) = tree
        .node_mut(parameter)
        .as_key_value_mut()
    {
        item.add_value("a".to_string());
    }
    tree.attach_child(root, parameter);
    tree.push_root(root);

    let lines = serialize_tree(&definition, &tree);
    assert_eq!(lines, vec!["{ Block", "  Material: a", "}"]);
}

#[test]
fn two_groups_force_the_escape_pair() {
    let definition = plain();
    let mut tree = Tree::new();
    let root = block(&mut tree, "Block");
    let parameter = tree.alloc(Node::Parameter(Parameter::new("Material").unwrap()));
    if let Some(item) = tree
        .node_mut(parameter)
        .as_key_value_mut()
    {
        item.add_group(ValueGroup::from_values(["a"]));
        item.add_group(ValueGroup::from_values(["b"]));
    }
    tree.attach_child(root, parameter);
    tree.push_root(root);

    let lines = serialize_tree(&definition, &tree);
    assert_eq!(lines[1], "  Material: \"a;b\"");
}

#[test]
fn multi_value_group_forces_the_escape_pair() {
    let definition = plain();
    let mut tree = Tree::new();
    let root = block(&mut tree, "Block");
    let parameter = tree.alloc(Node::Parameter(Parameter::new("Material").unwrap()));
    if let Some(item) = tree
        .node_mut(parameter)
        .as_key_value_mut()
    {
        item.add_group(ValueGroup::from_values(["a", "b"]));
    }
    tree.attach_child(root, parameter);
    tree.push_root(root);

    let lines = serialize_tree(&definition, &tree);
    assert_eq!(lines[1], "  Material: \"a,b\"");
}

#[test]
fn forced_escaping_comes_from_the_definition() {
    let definition = plain();
    let mut tree = Tree::new();
    let root = block(&mut tree, "Block");
    let mut parameter = Parameter::new("Material").unwrap();
    parameter.add_value("a".to_string());
    parameter.set_definition(Some(
        ItemDefinition::new("Material", true, true, false, true, "").unwrap(),
    ));
    let parameter = tree.alloc(Node::Parameter(parameter));
    tree.attach_child(root, parameter);
    tree.push_root(root);

    let lines = serialize_tree(&definition, &tree);
    assert_eq!(lines[1], "  Material: \"a\"");
}

#[test]
fn indentation_doubles_the_spacer_per_level() {
    let definition = plain();
    let mut tree = Tree::new();
    let root = block(&mut tree, "Block");
    let inner = block(&mut tree, "Child");
    let parameter = tree.alloc(Node::Parameter(Parameter::new("Shape").unwrap()));
    if let Some(item) = tree
        .node_mut(parameter)
        .as_key_value_mut()
    {
        item.add_value("round".to_string());
    }
    tree.attach_child(inner, parameter);
    tree.attach_child(root, inner);
    tree.push_root(root);

    let lines = serialize_tree(&definition, &tree);
    assert_eq!(
        lines,
        vec![
            "{ Block",
            "  { Child",
            "    Shape: round",
            "  }",
            "}"
        ]
    );
}

#[test]
fn comment_items_and_trailing_comments() {
    let definition = plain();
    let mut tree = Tree::new();
    let note = tree.alloc(Node::Comment(Comment::new(vec![
        "first".to_string(),
        "second".to_string(),
    ])));
    tree.push_root(note);

    let root = block(&mut tree, "Block");
    tree.add_comments(root, vec!["opener note".to_string()]);
    let attribute = tree.alloc(Node::Attribute(Attribute::with_value("Id", "1").unwrap()));
    tree.attach_attribute(root, attribute);
    tree.push_root(root);

    let lines = serialize_tree(&definition, &tree);
    assert_eq!(lines[0], "# first / second");
    assert_eq!(lines[1], "{ Block, Id: 1 # opener note");
}

#[test]
fn post_marks_separate_type_from_attributes() {
    let definition = blocks_config_definition();
    let mut tree = Tree::new();
    let root = tree.alloc(Node::Block(Block::new(
        None,
        Some("Block".to_string()),
        Some(" ".to_string()),
    )));
    let id = tree.alloc(Node::Attribute(Attribute::with_value("Id", "1").unwrap()));
    let name = tree.alloc(Node::Attribute(
        Attribute::with_value("Name", "Alpha").unwrap(),
    ));
    tree.attach_attribute(root, id);
    tree.attach_attribute(root, name);
    tree.push_root(root);

    let lines = serialize_tree(&definition, &tree);
    assert_eq!(lines[0], "{ Block Id: 1, Name: Alpha");
}

#[test]
fn keys_without_values_stand_alone() {
    let definition = plain();
    let mut tree = Tree::new();
    let root = block(&mut tree, "Block");
    let parameter = tree.alloc(Node::Parameter(Parameter::new("Material").unwrap()));
    let flag = tree.alloc(Node::Attribute(Attribute::new("type").unwrap()));
    tree.attach_attribute(parameter, flag);
    tree.attach_child(root, parameter);
    tree.push_root(root);

    let lines = serialize_tree(&definition, &tree);
    assert_eq!(lines[1], "  Material, type");
}

#[test]
fn empty_groups_are_skipped_on_write() {
    let definition = plain();
    let mut tree = Tree::new();
    let root = block(&mut tree, "Block");
    let parameter = tree.alloc(Node::Parameter(Parameter::new("Material").unwrap()));
    if let Some(item) = tree
        .node_mut(parameter)
        .as_key_value_mut()
    {
        item.add_group(ValueGroup::new());
        item.add_group(ValueGroup::from_values(["kept"]));
    }
    tree.attach_child(root, parameter);
    tree.push_root(root);

    let lines = serialize_tree(&definition, &tree);
    assert_eq!(lines[1], "  Material: kept");
}
