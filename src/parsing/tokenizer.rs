//! Line-level tokenizing: comment extraction, item splitting, and value
//! parsing, all driven by the delimiters of a [`FormatDefinition`].
//!
//! Comments are peeled off a raw line in four ordered passes, from the
//! still-open-from-the-previous-line multi-line comment inward to the most
//! local: (1) the open block comment, (2) a single-line comment marker,
//! (3) complete open/close pairs contained in the line, (4) an unterminated
//! opener at the end of the line, which leaves comment state open for the
//! next one. What remains is the structural data of the line.

use std::collections::VecDeque;

use crate::format::{DelimiterPair, FormatDefinition};
use crate::structure::ValueGroup;

/// Result of stripping the comments off one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentExtraction {
    /// The structural remainder of the line.
    pub data: String,
    /// Comment bodies in the order encountered, each trimmed of marker
    /// phrases.
    pub comments: Vec<String>,
    /// The multi-line comment pair left open at the end of this line.
    pub open_pair: Option<DelimiterPair>,
}

/// Strip configured outer phrases (usually whitespace) from both ends,
/// repeatedly.
pub fn trim_outer_phrases(definition: &FormatDefinition, line: &str) -> String {
    let mut data = line
        .trim()
        .to_string();
    loop {
        let phrase = definition
            .outer_trimming_phrases()
            .iter()
            .find(|phrase| data.starts_with(phrase.as_str()));
        match phrase {
            Some(phrase) => {
                data = data[phrase.len()..]
                    .trim_start()
                    .to_string()
            }
            None => break,
        }
    }
    loop {
        let phrase = definition
            .outer_trimming_phrases()
            .iter()
            .find(|phrase| data.ends_with(phrase.as_str()));
        match phrase {
            Some(phrase) => {
                data = data[..data.len() - phrase.len()]
                    .trim_end()
                    .to_string()
            }
            None => break,
        }
    }
    data
}

/// Strip any number of leading openers and trailing closers of the given
/// pairs.
pub(crate) fn trim_pairs(data: &str, pairs: &[DelimiterPair]) -> String {
    let mut data = data
        .trim()
        .to_string();
    loop {
        let pair = pairs
            .iter()
            .find(|pair| data.starts_with(pair.opener()));
        match pair {
            Some(pair) => {
                data = data[pair
                    .opener()
                    .len()..]
                    .trim()
                    .to_string()
            }
            None => break,
        }
    }
    loop {
        let pair = pairs
            .iter()
            .find(|pair| data.ends_with(pair.closer()));
        match pair {
            Some(pair) => {
                data = data[..data.len()
                    - pair
                        .closer()
                        .len()]
                    .trim()
                    .to_string()
            }
            None => break,
        }
    }
    data
}

fn trim_starts(data: &str, starts: &[String]) -> String {
    let mut data = data
        .trim()
        .to_string();
    loop {
        let start = starts
            .iter()
            .find(|start| data.starts_with(start.as_str()));
        match start {
            Some(start) => {
                data = data[start.len()..]
                    .trim()
                    .to_string()
            }
            None => break,
        }
    }
    data
}

/// A comment body is stored without its marker phrases.
fn trim_comment(definition: &FormatDefinition, comment: &str) -> String {
    let text = trim_starts(comment, definition.single_line_comment_starts());
    trim_pairs(&text, definition.multi_line_comment_pairs())
}

pub fn extract_comments(
    definition: &FormatDefinition,
    line: &str,
    open_pair: Option<&DelimiterPair>,
) -> CommentExtraction {
    let mut data = line.to_string();
    let mut comments = Vec::new();
    let mut open = open_pair.cloned();

    // a block comment still open from a previous line consumes up to its
    // closer, or the whole line when no closer shows up
    if let Some(pair) = open.clone() {
        match data.find(pair.closer()) {
            Some(end) => {
                comments.push(trim_comment(definition, &data[..end]));
                data = data[end
                    + pair
                        .closer()
                        .len()..]
                    .trim()
                    .to_string();
                open = None;
            }
            None => {
                comments.push(trim_comment(definition, &data));
                return CommentExtraction {
                    data: String::new(),
                    comments,
                    open_pair: open,
                };
            }
        }
    }

    // the last-occurring single-line marker consumes to end of line
    let single = definition
        .single_line_comment_starts()
        .iter()
        .filter_map(|mark| {
            data.find(mark.as_str())
                .map(|index| (index, mark.clone()))
        })
        .max_by_key(|(index, _)| *index);
    if let Some((start, mark)) = single {
        comments.push(trim_comment(definition, &data[start + mark.len()..]));
        data = data[..start]
            .trim()
            .to_string();
    }

    // complete multi-line pairs inside the line, repeated until none remain
    loop {
        let found = definition
            .multi_line_comment_pairs()
            .iter()
            .find_map(|pair| {
                let start = data.find(pair.opener())?;
                let after_opener = start
                    + pair
                        .opener()
                        .len();
                let end = data[after_opener..]
                    .find(pair.closer())?
                    + after_opener;
                Some((start, after_opener, end, pair.clone()))
            });
        match found {
            Some((start, after_opener, end, pair)) => {
                comments.push(trim_comment(definition, &data[after_opener..end]));
                let rest = data[end
                    + pair
                        .closer()
                        .len()..]
                    .to_string();
                data.truncate(start);
                data.push_str(&rest);
                data = data
                    .trim()
                    .to_string();
            }
            None => break,
        }
    }

    // a closer with no opener on this line ends a comment begun elsewhere
    let stray_closer = definition
        .multi_line_comment_pairs()
        .iter()
        .filter_map(|pair| {
            data.find(pair.closer())
                .map(|index| (index, pair.clone()))
        })
        .min_by_key(|(index, _)| *index);
    if let Some((end, pair)) = stray_closer {
        comments.push(trim_comment(definition, &data[..end]));
        data = data[end
            + pair
                .closer()
                .len()..]
            .trim()
            .to_string();
    }

    // an unterminated opener puts the next lines inside a comment
    let trailing_opener = definition
        .multi_line_comment_pairs()
        .iter()
        .filter_map(|pair| {
            data.find(pair.opener())
                .map(|index| (index, pair.clone()))
        })
        .max_by_key(|(index, _)| *index);
    if let Some((start, pair)) = trailing_opener {
        comments.push(trim_comment(
            definition,
            &data[start
                + pair
                    .opener()
                    .len()..],
        ));
        data = data[..start]
            .trim()
            .to_string();
        open = Some(pair);
    }

    CommentExtraction {
        data,
        comments,
        open_pair: open,
    }
}

/// Split structural line data into an ordered queue of key and value
/// tokens. Separators split only while no escape pair is open; the opener
/// of a configured escape pair suppresses splitting until its closer.
pub fn split_items(definition: &FormatDefinition, data: &str) -> VecDeque<String> {
    let mut tokens = VecDeque::new();
    let mut accumulator = String::new();
    let mut open_escape: Option<&DelimiterPair> = None;
    let mut split = false;

    for c in data.chars() {
        split = false;
        match open_escape {
            None => {
                open_escape = definition.escape_pair_opened_by(c);
                if open_escape.is_none() {
                    split = definition.is_item_separator_char(c)
                        || definition.is_item_value_separator_char(c);
                }
            }
            Some(pair) => {
                if crate::format::matches_char(pair.closer(), c) {
                    open_escape = None;
                }
            }
        }
        if split {
            tokens.push_back(
                accumulator
                    .trim()
                    .to_string(),
            );
            accumulator.clear();
        } else {
            accumulator.push(c);
        }
    }
    if !accumulator.is_empty() || split {
        tokens.push_back(
            accumulator
                .trim()
                .to_string(),
        );
    }
    tokens
}

/// Parse the raw text of one value token into value groups: strip one layer
/// of escape wrapping, split into groups, split each group into values,
/// trim everything.
pub fn parse_values(definition: &FormatDefinition, raw: &str) -> Vec<ValueGroup> {
    let unescaped = trim_pairs(raw, definition.escape_pairs());
    let group_separators: Vec<char> = definition
        .value_group_separator()
        .chars()
        .collect();
    let value_separators: Vec<char> = definition
        .value_separator()
        .chars()
        .collect();

    unescaped
        .split(|c: char| group_separators.contains(&c))
        .map(|group| {
            ValueGroup::from_values(
                group
                    .trim()
                    .split(|c: char| value_separators.contains(&c))
                    .map(|value| value.trim()),
            )
        })
        .collect()
}
