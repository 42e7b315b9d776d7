//! Live revalidation after edits: identical results to parse-time checks,
//! replaced kind-wise rather than accumulated.

use std::io::Write;
use std::path::PathBuf;

use bcf::structure::{Attribute, BcfFile, ErrorKind, KeyValueItem};

use crate::support::plain;

fn write_file(directory: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = directory
        .path()
        .join(name);
    let mut file = std::fs::File::create(&path).expect("failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("failed to write temp file");
    path
}

fn loaded(directory: &tempfile::TempDir, content: &str) -> BcfFile {
    let path = write_file(directory, "Plain_Test.bcf", content);
    let mut file = BcfFile::new(path, plain()).expect("metadata probe failed");
    file.load()
        .expect("load failed");
    file
}

#[test]
fn revalidation_is_idempotent() {
    let directory = tempfile::tempdir().expect("failed to create temp dir");
    let mut file = loaded(
        &directory,
        "{ Block, Id:1, Id:2\n  Unknown: 5\n  Material:\n}\n",
    );

    let before: Vec<ErrorKind> = file
        .error_list()
        .iter()
        .map(|error| error.kind())
        .collect();
    assert!(!before.is_empty());

    let root = file.roots()[0];
    file.revalidate(root);
    let first: Vec<ErrorKind> = file
        .error_list()
        .iter()
        .map(|error| error.kind())
        .collect();
    file.revalidate(root);
    let second: Vec<ErrorKind> = file
        .error_list()
        .iter()
        .map(|error| error.kind())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn parse_time_and_revalidation_find_the_same_problems() {
    let directory = tempfile::tempdir().expect("failed to create temp dir");
    let mut file = loaded(&directory, "{ Chunk, Id:1, Bogus:x\n  Unknown: 5\n}\n");

    let parse_kinds: Vec<ErrorKind> = file
        .error_list()
        .iter()
        .map(|error| error.kind())
        .collect();
    assert!(file
        .error_list()
        .iter()
        .all(|error| error.is_from_parsing()));

    let root = file.roots()[0];
    file.revalidate(root);
    let live_kinds: Vec<ErrorKind> = file
        .error_list()
        .iter()
        .map(|error| error.kind())
        .collect();

    assert_eq!(parse_kinds, live_kinds);
    // errors found after the fact no longer claim a source line
    assert!(file
        .error_list()
        .iter()
        .all(|error| !error.is_from_parsing()));
}

#[test]
fn edits_surface_new_errors_on_revalidation() {
    let directory = tempfile::tempdir().expect("failed to create temp dir");
    let mut file = loaded(&directory, "{ Block, Id:1\n  Material: iron\n}\n");
    assert!(file
        .error_list()
        .is_empty());

    let root = file.roots()[0];
    let parameter = file
        .node(root)
        .as_block()
        .unwrap()
        .children()[0];
    file.set_key(parameter, "Bogus")
        .expect("a non-empty key is accepted");

    let count = file.revalidate(parameter);
    assert_eq!(count, 1);
    let errors = file.error_list();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::ParameterUnknown);

    // renaming it back heals the item on the next pass
    file.set_key(parameter, "Material")
        .expect("a non-empty key is accepted");
    file.revalidate(parameter);
    assert!(file
        .error_list()
        .is_empty());
}

#[test]
fn blank_values_are_caught_live() {
    let directory = tempfile::tempdir().expect("failed to create temp dir");
    let mut file = loaded(&directory, "{ Block, Id:1\n  Material: iron\n}\n");

    let root = file.roots()[0];
    let parameter = file
        .node(root)
        .as_block()
        .unwrap()
        .children()[0];
    file.add_value(parameter, "");
    file.revalidate(parameter);

    let errors = file.error_list();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::ValueEmpty);
}

#[test]
fn uniqueness_reports_both_parties() {
    let directory = tempfile::tempdir().expect("failed to create temp dir");
    let file = loaded(&directory, "{ Block, Id:1 }\n{ Block, Id:1 }\n");

    let first = file.roots()[0];
    let second = file.roots()[1];
    for block in [first, second] {
        let errors = file
            .node(block)
            .core()
            .errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::BlockIdNotUnique);
    }

    // each one's error names the other
    assert!(file
        .node(first)
        .core()
        .errors()[0]
        .info()
        .contains("Id: 1"));
}

#[test]
fn uniqueness_clears_when_resolved() {
    let directory = tempfile::tempdir().expect("failed to create temp dir");
    let mut file = loaded(&directory, "{ Block, Id:1 }\n{ Block, Id:1 }\n");

    let second = file.roots()[1];
    let id_attribute = file
        .node(second)
        .as_block()
        .unwrap()
        .attributes()[0];
    if let Some(attribute) = file
        .node_mut(id_attribute)
        .as_key_value_mut()
    {
        attribute.clear_values();
        attribute.add_value("2".to_string());
    }
    file.revalidate_uniqueness();

    assert!(file
        .error_list()
        .is_empty());
}

#[test]
fn references_resolve_to_an_inheritor() {
    let directory = tempfile::tempdir().expect("failed to create temp dir");
    let file = loaded(
        &directory,
        "{ Block, Id:1, Name:X }\n{ Block, Id:2, Ref:X }\n",
    );

    let target = file.roots()[0];
    let source = file.roots()[1];
    assert_eq!(
        file.node(source)
            .as_block()
            .unwrap()
            .inheritor(),
        Some(target)
    );
    assert!(file
        .error_list()
        .is_empty());
}

#[test]
fn removing_the_target_breaks_the_reference() {
    let directory = tempfile::tempdir().expect("failed to create temp dir");
    let mut file = loaded(
        &directory,
        "{ Block, Id:1, Name:X }\n{ Block, Id:2, Ref:X }\n",
    );

    let target = file.roots()[0];
    file.remove_item(target);
    file.resolve_references();

    let source = file.roots()[0];
    assert_eq!(
        file.node(source)
            .as_block()
            .unwrap()
            .inheritor(),
        None
    );
    let errors = file
        .node(source)
        .core()
        .errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::BlockInheritorMissing);
    assert_eq!(errors[0].info(), "X");
}

#[test]
fn attribute_edits_update_derived_identification() {
    let directory = tempfile::tempdir().expect("failed to create temp dir");
    let mut file = loaded(&directory, "{ Block, Id:1 }\n");

    let root = file.roots()[0];
    assert_eq!(
        file.node(root)
            .as_block()
            .unwrap()
            .id(),
        Some("1")
    );

    file.add_attribute(root, Attribute::with_value("Ref", "Other").unwrap());
    assert_eq!(
        file.node(root)
            .as_block()
            .unwrap()
            .ref_source(),
        Some("Other")
    );

    file.resolve_references();
    let errors: Vec<ErrorKind> = file
        .node(root)
        .core()
        .errors()
        .iter()
        .map(|error| error.kind())
        .collect();
    assert!(errors.contains(&ErrorKind::BlockInheritorMissing));
}
