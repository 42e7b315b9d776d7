use bcf::parsing::parse_lines;
use bcf::structure::{ErrorKind, KeyValueItem, Node, NodeId, Tree};

use crate::support::{demanding, lines, plain, plain_without_refs};

fn parse(definition: &bcf::format::FormatDefinition, text: &str) -> bcf::parsing::ParseResult {
    parse_lines(definition, lines(text), &mut |_| true)
}

fn only_block(tree: &Tree) -> NodeId {
    assert_eq!(
        tree.roots()
            .len(),
        1
    );
    let root = tree.roots()[0];
    assert!(tree
        .node(root)
        .as_block()
        .is_some());
    root
}

#[test]
fn single_line_block() {
    let definition = plain_without_refs();
    let result = parse(&definition, r#"{ Block, Id:1, Name:"Foo" }"#);

    assert!(result
        .fatal_errors
        .is_empty());
    let root = only_block(&result.tree);
    let block = result
        .tree
        .node(root)
        .as_block()
        .unwrap();
    assert_eq!(block.data_type(), Some("Block"));
    assert_eq!(block.pre_mark(), None);
    assert_eq!(block.post_mark(), None);
    assert_eq!(block.id(), Some("1"));
    assert_eq!(block.ref_target(), None);
    assert_eq!(block.ref_source(), None);
    assert_eq!(
        block
            .attributes()
            .len(),
        2
    );
    assert!(result
        .tree
        .deep_errors(root)
        .is_empty());
}

#[test]
fn unknown_parameter() {
    let definition = plain();
    let result = parse(&definition, "{ Block, Id:1\n  Unknown: 5\n}");

    let root = only_block(&result.tree);
    let block = result
        .tree
        .node(root)
        .as_block()
        .unwrap();

    // the block itself carries no structural error
    assert!(block
        .core()
        .errors()
        .is_empty());

    let parameter = block
        .children()
        .iter()
        .copied()
        .find(|child| {
            result
                .tree
                .node(*child)
                .as_parameter()
                .is_some()
        })
        .expect("the unknown line still parses to a parameter");
    let errors = result
        .tree
        .node(parameter)
        .core()
        .errors();
    assert!(errors
        .iter()
        .any(|error| error.kind() == ErrorKind::ParameterUnknown));
    assert_eq!(errors[0].line(), Some(2));
}

#[test]
fn unterminated_block() {
    let definition = plain();
    let result = parse(&definition, "{ Block, Id:1");

    assert_eq!(
        result
            .fatal_errors
            .len(),
        1
    );
    assert_eq!(
        result.fatal_errors[0].kind(),
        ErrorKind::BlockOpenerWithoutCloser
    );
    assert_eq!(result.fatal_errors[0].line(), Some(1));

    // the unfinished block still reaches the tree
    only_block(&result.tree);
}

#[test]
fn closer_without_opener() {
    let definition = plain();
    let result = parse(&definition, "}");

    assert_eq!(
        result
            .fatal_errors
            .len(),
        1
    );
    assert_eq!(
        result.fatal_errors[0].kind(),
        ErrorKind::BlockCloserWithoutOpener
    );
}

#[test]
fn parameter_without_parent() {
    let definition = plain();
    let result = parse(&definition, "Material: iron");

    assert_eq!(
        result
            .fatal_errors
            .len(),
        1
    );
    assert_eq!(
        result.fatal_errors[0].kind(),
        ErrorKind::ParameterWithoutParent
    );
}

#[test]
fn nested_blocks_and_depth() {
    let definition = plain();
    let result = parse(
        &definition,
        "{ Block, Id:1\n  Material: iron\n  { Child, Id:2\n    Shape: round\n  }\n}",
    );

    assert!(result
        .fatal_errors
        .is_empty());
    let root = only_block(&result.tree);
    let block = result
        .tree
        .node(root)
        .as_block()
        .unwrap();
    assert_eq!(
        block
            .children()
            .len(),
        2
    );

    let inner = block.children()[1];
    let child = result
        .tree
        .node(inner)
        .as_block()
        .expect("the nested block closes before its parent");
    assert_eq!(child.data_type(), Some("Child"));
    assert_eq!(
        result
            .tree
            .node(inner)
            .core()
            .depth(),
        1
    );
    assert_eq!(
        result
            .tree
            .node(inner)
            .core()
            .parent(),
        Some(root)
    );

    let grandchild = child.children()[0];
    assert_eq!(
        result
            .tree
            .node(grandchild)
            .core()
            .depth(),
        2
    );
    assert!(result
        .tree
        .deep_errors(root)
        .is_empty());
}

#[test]
fn comments_attach_to_their_line() {
    let definition = plain();
    let result = parse(
        &definition,
        "{ Block, Id:1 # on the block\n  Material: iron # on the parameter\n}",
    );

    let root = only_block(&result.tree);
    assert_eq!(
        result
            .tree
            .node(root)
            .core()
            .comments(),
        &["on the block".to_string()]
    );

    let parameter = result
        .tree
        .node(root)
        .as_block()
        .unwrap()
        .children()[0];
    assert_eq!(
        result
            .tree
            .node(parameter)
            .core()
            .comments(),
        &["on the parameter".to_string()]
    );
}

#[test]
fn closing_line_comment_goes_to_the_parameter() {
    let definition = plain();
    let result = parse(&definition, "{ Block, Id:1\n  Material: iron } # tail");

    let root = only_block(&result.tree);
    let parameter = result
        .tree
        .node(root)
        .as_block()
        .unwrap()
        .children()[0];
    assert_eq!(
        result
            .tree
            .node(parameter)
            .core()
            .comments(),
        &["tail".to_string()]
    );
    assert!(result
        .tree
        .node(root)
        .core()
        .comments()
        .is_empty());
}

#[test]
fn comment_only_lines_become_comment_items() {
    let definition = plain();
    let result = parse(
        &definition,
        "# leading\n{ Block, Id:1\n  # inside\n  Material: iron\n}",
    );

    assert_eq!(
        result
            .tree
            .roots()
            .len(),
        2
    );
    let leading = result
        .tree
        .node(result.tree.roots()[0]);
    assert!(matches!(leading, Node::Comment(_)));
    assert_eq!(
        leading
            .core()
            .comments(),
        &["leading".to_string()]
    );

    let block = result
        .tree
        .node(result.tree.roots()[1])
        .as_block()
        .unwrap();
    assert!(matches!(
        result
            .tree
            .node(block.children()[0]),
        Node::Comment(_)
    ));
}

#[test]
fn doubled_attributes_are_both_reported() {
    let definition = plain();
    let result = parse(&definition, "{ Block, Id:1, Id:2 }");

    let root = only_block(&result.tree);
    let doubled: Vec<_> = result
        .tree
        .node(root)
        .core()
        .errors()
        .iter()
        .filter(|error| error.kind() == ErrorKind::AttributeDoubled)
        .collect();
    assert_eq!(doubled.len(), 2);
}

#[test]
fn missing_required_parameter() {
    let definition = demanding();
    let result = parse(&definition, "{ Block, Id:1\n  Shape: round\n}");

    let root = only_block(&result.tree);
    let errors = result
        .tree
        .node(root)
        .core()
        .errors();
    let missing: Vec<_> = errors
        .iter()
        .filter(|error| error.kind() == ErrorKind::ParameterMissing)
        .collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].info(), "Material");
    // completeness errors point at the block's header line
    assert_eq!(missing[0].line(), Some(1));
}

#[test]
fn unknown_data_type() {
    let definition = plain();
    let result = parse(&definition, "{ Chunk, Id:1 }");

    let root = only_block(&result.tree);
    let errors = result
        .tree
        .node(root)
        .core()
        .errors();
    assert!(errors
        .iter()
        .any(|error| error.kind() == ErrorKind::BlockDataTypeMissing));
}

#[test]
fn empty_parameter_key_is_attached_to_the_block() {
    let definition = plain();
    let result = parse(&definition, "{ Block, Id:1\n  : 5\n}");

    let root = only_block(&result.tree);
    let errors = result
        .tree
        .node(root)
        .core()
        .errors();
    assert!(errors
        .iter()
        .any(|error| error.kind() == ErrorKind::KeyNullOrEmpty));
    // the bad line did not abort the rest of the file
    assert!(result
        .fatal_errors
        .is_empty());
}

#[test]
fn escaped_values_keep_separators() {
    let definition = plain();
    let result = parse(&definition, "{ Block, Id:1, Name:\"a, b\" }");

    let root = only_block(&result.tree);
    let name = result
        .tree
        .node(root)
        .as_block()
        .unwrap()
        .attributes()[1];
    let attribute = result
        .tree
        .node(name)
        .as_attribute()
        .unwrap();
    assert_eq!(
        attribute.all_values(),
        vec!["a", "b"]
    );
    assert!(attribute.has_multi_value());
}

#[test]
fn cancellation_discards_the_tree() {
    let definition = plain();
    let mut seen = 0;
    let result = parse_lines(
        &definition,
        lines("{ Block, Id:1\n  Material: iron\n}"),
        &mut |line| {
            seen = line;
            line < 2
        },
    );

    assert!(result.cancelled);
    assert_eq!(seen, 2);
    assert!(result
        .tree
        .roots()
        .is_empty());
}
