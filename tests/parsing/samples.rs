//! A fuller file against the built-in definition, with space-terminated
//! block types, nested blocks, and comments spanning lines.

use bcf::format::blocks_config_definition;
use bcf::parsing::parse_lines;
use bcf::structure::{KeyValueItem, Node};

use crate::support::lines;

const SAMPLE: &str = r#"# Root comment
{ Block Id: 1, Name: Alpha
  Material: iron
  /* spans
     lines */
  { Child DropOnDestroy
    Shape: round
  }
}"#;

#[test]
fn sample_parses_cleanly() {
    let definition = blocks_config_definition();
    let result = parse_lines(&definition, lines(SAMPLE), &mut |_| true);

    assert!(result
        .fatal_errors
        .is_empty());
    assert_eq!(result.line_count, 9);
    assert_eq!(
        result
            .tree
            .roots()
            .len(),
        2
    );

    let comment = result
        .tree
        .node(result.tree.roots()[0]);
    assert!(matches!(comment, Node::Comment(_)));
    assert_eq!(
        comment
            .core()
            .comments(),
        &["Root comment".to_string()]
    );

    let root = result.tree.roots()[1];
    let block = result
        .tree
        .node(root)
        .as_block()
        .unwrap();
    assert_eq!(block.data_type(), Some("Block"));
    assert_eq!(block.post_mark(), Some(" "));
    assert_eq!(block.id(), Some("1"));
    assert_eq!(block.ref_target(), Some("Alpha"));

    // material, two comment lines, the child block
    assert_eq!(
        block
            .children()
            .len(),
        4
    );

    let material = result
        .tree
        .node(block.children()[0])
        .as_parameter()
        .unwrap();
    assert_eq!(material.key(), "Material");
    assert_eq!(material.first_value(), Some("iron"));

    for comment_child in &block.children()[1..3] {
        assert!(matches!(
            result
                .tree
                .node(*comment_child),
            Node::Comment(_)
        ));
    }

    let child = result
        .tree
        .node(block.children()[3])
        .as_block()
        .unwrap();
    assert_eq!(child.data_type(), Some("Child"));
    let flag = result
        .tree
        .node(child.attributes()[0])
        .as_attribute()
        .unwrap();
    assert_eq!(flag.key(), "DropOnDestroy");
    assert!(!flag.has_any_value());

    // nothing in the whole file is in error
    assert!(result
        .tree
        .deep_errors(root)
        .is_empty());
}

#[test]
fn pre_marks_are_recognized() {
    let definition = blocks_config_definition();
    let result = parse_lines(
        &definition,
        lines("{ +Block Id: 2, Name: Beta\n}"),
        &mut |_| true,
    );

    let root = result.tree.roots()[0];
    let block = result
        .tree
        .node(root)
        .as_block()
        .unwrap();
    assert_eq!(block.pre_mark(), Some("+"));
    assert_eq!(block.data_type(), Some("Block"));
    assert!(result
        .tree
        .deep_errors(root)
        .is_empty());
}
