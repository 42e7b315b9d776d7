//! For a tree with no validation errors, serializing and re-parsing yields
//! a structurally equal tree: same blocks, parameters, attributes, values,
//! comments, and order.

use bcf::format::{blocks_config_definition, FormatDefinition};
use bcf::formatting::serialize_tree;
use bcf::parsing::parse_lines;
use bcf::structure::{KeyValueItem, Node, NodeId, Tree};

use crate::support::{lines, plain};

fn parse(definition: &FormatDefinition, text: &str) -> Tree {
    let result = parse_lines(definition, lines(text), &mut |_| true);
    assert!(result
        .fatal_errors
        .is_empty());
    for root in result
        .tree
        .roots()
    {
        assert!(
            result
                .tree
                .deep_errors(*root)
                .is_empty(),
            "round-trip inputs must be error free"
        );
    }
    result.tree
}

fn assert_equal(a: &Tree, b: &Tree) {
    assert_eq!(
        a.roots()
            .len(),
        b.roots()
            .len()
    );
    for (left, right) in a
        .roots()
        .iter()
        .zip(b.roots())
    {
        assert_node_equal(a, *left, b, *right);
    }
}

fn assert_node_equal(a: &Tree, left: NodeId, b: &Tree, right: NodeId) {
    match (a.node(left), b.node(right)) {
        (Node::Comment(x), Node::Comment(y)) => {
            assert_eq!(
                x.core()
                    .comments(),
                y.core()
                    .comments()
            );
        }
        (Node::Attribute(x), Node::Attribute(y)) => {
            assert_eq!(x.key(), y.key());
            assert_eq!(x.value_groups(), y.value_groups());
        }
        (Node::Parameter(x), Node::Parameter(y)) => {
            assert_eq!(x.key(), y.key());
            assert_eq!(x.value_groups(), y.value_groups());
            assert_eq!(
                x.core()
                    .comments(),
                y.core()
                    .comments()
            );
            assert_eq!(
                x.attributes()
                    .len(),
                y.attributes()
                    .len()
            );
            for (attr_left, attr_right) in x
                .attributes()
                .iter()
                .zip(y.attributes())
            {
                assert_node_equal(a, *attr_left, b, *attr_right);
            }
        }
        (Node::Block(x), Node::Block(y)) => {
            assert_eq!(x.data_type(), y.data_type());
            assert_eq!(x.pre_mark(), y.pre_mark());
            assert_eq!(x.post_mark(), y.post_mark());
            assert_eq!(
                x.core()
                    .comments(),
                y.core()
                    .comments()
            );
            assert_eq!(
                x.attributes()
                    .len(),
                y.attributes()
                    .len()
            );
            for (attr_left, attr_right) in x
                .attributes()
                .iter()
                .zip(y.attributes())
            {
                assert_node_equal(a, *attr_left, b, *attr_right);
            }
            assert_eq!(
                x.children()
                    .len(),
                y.children()
                    .len()
            );
            for (child_left, child_right) in x
                .children()
                .iter()
                .zip(y.children())
            {
                assert_node_equal(a, *child_left, b, *child_right);
            }
        }
        (left_node, right_node) => panic!(
            "node kinds differ: {} vs {}",
            left_node.kind_name(),
            right_node.kind_name()
        ),
    }
}

fn round_trip(definition: &FormatDefinition, text: &str) {
    let first = parse(definition, text);
    let written = serialize_tree(definition, &first);
    let second = parse(definition, &written.join("\n"));
    let rewritten = serialize_tree(definition, &second);

    assert_equal(&first, &second);
    // and the text itself settles after one pass
    assert_eq!(written, rewritten);
}

#[test]
fn flat_block() {
    round_trip(&plain(), "{ Block, Id:1, Name:Alpha }");
}

#[test]
fn nested_blocks_with_comments() {
    round_trip(
        &plain(),
        "# heading\n{ Block, Id:1 # opener\n  Material: iron\n  { Child, Id:2\n    Shape: round # inner\n  }\n}",
    );
}

#[test]
fn grouped_and_multi_values() {
    round_trip(
        &plain(),
        "{ Block, Id:1\n  Material: \"a, b; c\"\n  Shape: single\n}",
    );
}

#[test]
fn builtin_definition_with_post_marks() {
    round_trip(
        &blocks_config_definition(),
        "{ Block Id: 1, Name: Alpha\n  Material: iron\n  { Child DropOnDestroy\n    Shape: round\n  }\n}",
    );
}

#[test]
fn parameter_attributes_survive() {
    round_trip(
        &plain(),
        "{ Block, Id:1\n  Material: iron, type: heavy\n}",
    );
}
