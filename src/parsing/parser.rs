//! The structural parser: a stack-based, line-by-line driver turning a
//! line stream into a forest of root items.
//!
//! Each non-blank, comment-stripped line is classified as a block opener, a
//! parameter of the innermost open block, or a block closer; closers pop
//! the stack. Validation runs as items are built, so every produced error
//! carries its source line. Structural mismatches (closers without openers,
//! openers left unclosed) are collected as file-level fatal errors next to
//! a best-effort tree, never instead of one.

use std::collections::VecDeque;

use tracing::debug;

use crate::format::{DelimiterPair, FormatDefinition, ItemDefinition};
use crate::parsing::tokenizer::{
    extract_comments, parse_values, split_items, trim_outer_phrases, trim_pairs,
};
use crate::rules::{
    check_attributes_valid, check_block_mark, check_item_unknown, check_parameters_valid,
    check_values, KeyContext,
};
use crate::structure::{
    Attribute, BcfError, Block, Comment, ErrorKind, KeyValueItem, Node, NodeId, Parameter, Tree,
};

/// Outcome of parsing one line stream.
#[derive(Debug)]
pub struct ParseResult {
    pub tree: Tree,
    pub fatal_errors: Vec<BcfError>,
    pub cancelled: bool,
    pub line_count: usize,
}

struct OpenBlock {
    block: NodeId,
    line_number: usize,
    line_text: String,
    pair: DelimiterPair,
}

/// Parse lines into a tree. `progress` is polled once per line with the
/// one-based line number; returning `false` cancels the parse and discards
/// the partial tree.
pub fn parse_lines<I>(
    definition: &FormatDefinition,
    lines: I,
    progress: &mut dyn FnMut(usize) -> bool,
) -> ParseResult
where
    I: IntoIterator<Item = String>,
{
    let mut tree = Tree::new();
    let mut fatal_errors: Vec<BcfError> = Vec::new();
    let mut stack: Vec<OpenBlock> = Vec::new();
    let mut open_comment: Option<DelimiterPair> = None;
    let mut line_number = 0;

    for raw_line in lines {
        line_number += 1;
        if !progress(line_number) {
            debug!("parse cancelled at line {}", line_number);
            return ParseResult {
                tree: Tree::new(),
                fatal_errors: Vec::new(),
                cancelled: true,
                line_count: line_number,
            };
        }

        let line = trim_outer_phrases(definition, &raw_line);
        if line.is_empty() {
            continue;
        }

        let extraction = extract_comments(definition, &line, open_comment.as_ref());
        open_comment = extraction.open_pair;
        let comments = extraction.comments;
        let data = extraction.data;

        // a line that was all comment becomes a comment item of its own
        if data.is_empty() {
            let comment = tree.alloc(Node::Comment(Comment::new(comments)));
            match stack.last() {
                Some(top) => tree.attach_child(top.block, comment),
                None => tree.push_root(comment),
            }
            continue;
        }

        if let Some(pair) = definition
            .find_block_opener(&data)
            .cloned()
        {
            let block =
                parse_block_header(definition, &mut tree, stack.is_empty(), &data, line_number);
            tree.add_comments(block, comments);

            // an opener line ending with its own closer opens and closes
            // the block in one go
            if data != pair.opener() && data.ends_with(pair.closer()) {
                close_block(definition, &mut tree, block, line_number, stack.last());
            } else {
                stack.push(OpenBlock {
                    block,
                    line_number,
                    line_text: data,
                    pair,
                });
            }
        } else if let Some(top) = stack.last() {
            let owner = top.block;
            let closer = top
                .pair
                .closer()
                .to_string();
            let mut parameter_line = false;

            if data != closer {
                parameter_line = true;
                match parse_parameter(definition, &mut tree, &data, line_number) {
                    Ok(parameter) => {
                        tree.add_comments(parameter, comments.clone());
                        tree.attach_child(owner, parameter);
                    }
                    Err(error) => {
                        let info = format!("{} / {}", tree.full_name(owner), data);
                        tree.add_error(owner, BcfError::located(error.kind(), info, line_number));
                    }
                }
            }

            if data.ends_with(&closer) {
                let open = stack
                    .pop()
                    .expect("the stack was non-empty on this branch");
                if !parameter_line {
                    tree.add_comments(open.block, comments);
                }
                close_block(
                    definition,
                    &mut tree,
                    open.block,
                    open.line_number,
                    stack.last(),
                );
            }
        } else if definition.looks_like_block_closer(&data) {
            fatal_errors.push(BcfError::located(
                ErrorKind::BlockCloserWithoutOpener,
                data,
                line_number,
            ));
        } else {
            fatal_errors.push(BcfError::located(
                ErrorKind::ParameterWithoutParent,
                data,
                line_number,
            ));
        }
    }

    // blocks still open at end of input, innermost first
    while let Some(open) = stack.pop() {
        fatal_errors.push(BcfError::located(
            ErrorKind::BlockOpenerWithoutCloser,
            format!("{} / {}", tree.full_name(open.block), open.line_text),
            open.line_number,
        ));
        close_block(
            definition,
            &mut tree,
            open.block,
            open.line_number,
            stack.last(),
        );
    }

    debug!(
        "parsed {} lines into {} root items, {} fatal errors",
        line_number,
        tree.roots()
            .len(),
        fatal_errors.len()
    );

    ParseResult {
        tree,
        fatal_errors,
        cancelled: false,
        line_count: line_number,
    }
}

/// Check a completed block's parameter set and hand the block to its
/// parent, or to the root forest when none is open. Completeness errors
/// point at the block's header line.
fn close_block(
    definition: &FormatDefinition,
    tree: &mut Tree,
    block: NodeId,
    header_line: usize,
    parent: Option<&OpenBlock>,
) {
    let parameter_keys: Vec<String> = tree
        .node(block)
        .as_block()
        .map(|owner| {
            owner
                .children()
                .iter()
                .filter_map(|child| {
                    tree.node(*child)
                        .as_parameter()
                })
                .map(|parameter| {
                    parameter
                        .key()
                        .to_string()
                })
                .collect()
        })
        .unwrap_or_default();
    let keys: Vec<&str> = parameter_keys
        .iter()
        .map(|key| key.as_str())
        .collect();
    let errors: Vec<BcfError> = check_parameters_valid(&keys, definition.block_parameters())
        .into_iter()
        .map(|error| error.with_line(header_line))
        .collect();
    tree.add_errors(block, errors);

    match parent {
        Some(open) => tree.attach_child(open.block, block),
        None => tree.push_root(block),
    }
}

/// Parse a block header line: marks, data type, and attributes.
fn parse_block_header(
    definition: &FormatDefinition,
    tree: &mut Tree,
    is_root: bool,
    data: &str,
    line_number: usize,
) -> NodeId {
    let attribute_definitions = if is_root {
        definition.root_block_attributes()
    } else {
        definition.child_block_attributes()
    };
    let type_definitions = if is_root {
        definition.root_block_types()
    } else {
        definition.child_block_types()
    };

    let trimmed = trim_pairs(data, definition.block_pairs());
    let pre_mark = definition
        .match_pre_mark(&trimmed)
        .map(|mark| mark.to_string());
    let pre_len = pre_mark
        .as_deref()
        .map(str::len)
        .unwrap_or(0);
    let (data_type, post_mark) = scan_block_type(definition, &trimmed[pre_len..]);

    let consumed = pre_len
        + data_type
            .as_deref()
            .map(str::len)
            .unwrap_or(0)
        + post_mark
            .as_deref()
            .map(str::len)
            .unwrap_or(0);
    let mut rest = trimmed[consumed..].trim_start();
    // the data type may have been ended by an item separator instead of a
    // post-mark; that separator does not begin an empty first attribute
    if let Some(stripped) = rest.strip_prefix(definition.item_separator()) {
        rest = stripped.trim_start();
    }

    let block = tree.alloc(Node::Block(Block::new(pre_mark, data_type, post_mark)));

    let mut queue = split_items(definition, rest);
    let mut errors: Vec<BcfError> = Vec::new();
    let attributes = parse_attributes(
        definition,
        tree,
        &mut queue,
        attribute_definitions,
        line_number,
        &mut errors,
    );
    let attribute_keys: Vec<String> = attributes
        .iter()
        .filter_map(|id| {
            tree.node(*id)
                .as_attribute()
        })
        .map(|attribute| {
            attribute
                .key()
                .to_string()
        })
        .collect();
    for attribute in attributes {
        tree.attach_attribute(block, attribute);
    }

    let owner = tree
        .node(block)
        .as_block()
        .expect("just allocated as a block");
    errors.extend(check_block_mark(
        owner.pre_mark(),
        definition.block_type_pre_marks(),
        ErrorKind::BlockPreMarkMissing,
        ErrorKind::BlockPreMarkUnknown,
    ));
    errors.extend(check_block_mark(
        owner.data_type(),
        type_definitions,
        ErrorKind::BlockDataTypeMissing,
        ErrorKind::BlockDataTypeUnknown,
    ));
    errors.extend(check_block_mark(
        owner.post_mark(),
        definition.block_type_post_marks(),
        ErrorKind::BlockPostMarkMissing,
        ErrorKind::BlockPostMarkUnknown,
    ));
    let keys: Vec<&str> = attribute_keys
        .iter()
        .map(|key| key.as_str())
        .collect();
    errors.extend(check_attributes_valid(&keys, attribute_definitions));

    let errors: Vec<BcfError> = errors
        .into_iter()
        .map(|error| error.with_line(line_number))
        .collect();
    tree.add_errors(block, errors);
    tree.refresh_block_identification(definition, block);
    block
}

/// Walk off the data type. The walk honors escape pairs and stops at the
/// first unescaped post-mark or item-separator character.
fn scan_block_type(
    definition: &FormatDefinition,
    data: &str,
) -> (Option<String>, Option<String>) {
    let mut data_type = String::new();
    let mut post_mark = None;
    let mut open_escape: Option<&DelimiterPair> = None;

    for c in data.chars() {
        match open_escape {
            None => {
                open_escape = definition.escape_pair_opened_by(c);
                if open_escape.is_none() {
                    if definition.is_post_mark_char(c) {
                        post_mark = Some(c.to_string());
                        break;
                    }
                    if definition.is_item_separator_char(c) {
                        break;
                    }
                }
            }
            Some(pair) => {
                if crate::format::matches_char(pair.closer(), c) {
                    open_escape = None;
                }
            }
        }
        data_type.push(c);
    }

    let data_type = if data_type.is_empty() {
        None
    } else {
        Some(data_type)
    };
    (data_type, post_mark)
}

/// Drain the token queue into attributes. Keys precede their value token;
/// a key whose definition carries no value is followed directly by the
/// next key. Empty key tokens are skipped and reported through `errors`.
fn parse_attributes(
    definition: &FormatDefinition,
    tree: &mut Tree,
    queue: &mut VecDeque<String>,
    defined: &[ItemDefinition],
    line_number: usize,
    errors: &mut Vec<BcfError>,
) -> Vec<NodeId> {
    let mut attributes = Vec::new();
    while let Some(key) = queue.pop_front() {
        let mut attribute = match Attribute::new(key) {
            Ok(attribute) => attribute,
            Err(error) => {
                errors.push(error);
                continue;
            }
        };

        let mut own_errors: Vec<BcfError> = Vec::new();
        let (item_definition, unknown) =
            check_item_unknown(defined, attribute.key(), KeyContext::Attribute);
        if let Some(error) = unknown {
            own_errors.push(error);
        }
        if item_definition
            .map(ItemDefinition::has_value)
            .unwrap_or(false)
        {
            let groups = match queue.pop_front() {
                Some(raw) => parse_values(definition, &raw),
                None => Vec::new(),
            };
            own_errors.extend(check_values(&groups, item_definition, definition));
            *attribute.value_groups_mut() = groups;
        }
        attribute.set_definition(item_definition.cloned());

        let id = tree.alloc(Node::Attribute(attribute));
        let own_errors: Vec<BcfError> = own_errors
            .into_iter()
            .map(|error| error.with_line(line_number))
            .collect();
        tree.add_errors(id, own_errors);
        attributes.push(id);
    }
    attributes
}

/// Parse one parameter line. An empty key is returned as the error for the
/// caller to attach to the owning block; the line is otherwise consumed.
fn parse_parameter(
    definition: &FormatDefinition,
    tree: &mut Tree,
    data: &str,
    line_number: usize,
) -> Result<NodeId, BcfError> {
    let trimmed = trim_pairs(data, definition.block_pairs());
    let mut queue = split_items(definition, &trimmed);

    let key = queue
        .pop_front()
        .unwrap_or_default();
    let mut parameter = Parameter::new(key)?;

    let mut errors: Vec<BcfError> = Vec::new();
    let (item_definition, unknown) = check_item_unknown(
        definition.block_parameters(),
        parameter.key(),
        KeyContext::Parameter,
    );
    if let Some(error) = unknown {
        errors.push(error);
    }
    if item_definition
        .map(ItemDefinition::has_value)
        .unwrap_or(false)
    {
        let groups = match queue.pop_front() {
            Some(raw) => parse_values(definition, &raw),
            None => Vec::new(),
        };
        errors.extend(check_values(&groups, item_definition, definition));
        *parameter.value_groups_mut() = groups;
    }
    parameter.set_definition(item_definition.cloned());

    let id = tree.alloc(Node::Parameter(parameter));
    let errors: Vec<BcfError> = errors
        .into_iter()
        .map(|error| error.with_line(line_number))
        .collect();
    tree.add_errors(id, errors);

    let mut key_errors: Vec<BcfError> = Vec::new();
    let attributes = parse_attributes(
        definition,
        tree,
        &mut queue,
        definition.parameter_attributes(),
        line_number,
        &mut key_errors,
    );
    let attribute_keys: Vec<String> = attributes
        .iter()
        .filter_map(|attr| {
            tree.node(*attr)
                .as_attribute()
        })
        .map(|attribute| {
            attribute
                .key()
                .to_string()
        })
        .collect();
    for attribute in attributes {
        tree.attach_attribute(id, attribute);
    }

    let keys: Vec<&str> = attribute_keys
        .iter()
        .map(|key| key.as_str())
        .collect();
    key_errors.extend(check_attributes_valid(
        &keys,
        definition.parameter_attributes(),
    ));
    let key_errors: Vec<BcfError> = key_errors
        .into_iter()
        .map(|error| error.with_line(line_number))
        .collect();
    tree.add_errors(id, key_errors);

    Ok(id)
}
