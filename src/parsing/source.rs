//! Byte-level concerns of reading and writing files: byte-order-mark
//! detection, decoding, newline-style detection, and re-encoding. The
//! detected encoding and newline style are preserved across a load/save
//! round trip.

use encoding_rs::{UTF_16BE, UTF_16LE, UTF_8};

/// The encodings recognized by their byte order mark. Everything else is
/// read as UTF-8 without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8 { bom: bool },
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 { .. } => "UTF-8",
            TextEncoding::Utf16Le => "UTF-16LE",
            TextEncoding::Utf16Be => "UTF-16BE",
        }
    }
}

/// The newline convention of a file. Mixed files follow whichever symbol
/// appears first; an empty file defaults to CRLF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewlineStyle {
    Lf,
    Cr,
    CrLf,
}

impl NewlineStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewlineStyle::Lf => "\n",
            NewlineStyle::Cr => "\r",
            NewlineStyle::CrLf => "\r\n",
        }
    }
}

pub fn detect_encoding(bytes: &[u8]) -> TextEncoding {
    if bytes.starts_with(&[0xef, 0xbb, 0xbf]) {
        TextEncoding::Utf8 { bom: true }
    } else if bytes.starts_with(&[0xff, 0xfe]) {
        TextEncoding::Utf16Le
    } else if bytes.starts_with(&[0xfe, 0xff]) {
        TextEncoding::Utf16Be
    } else {
        TextEncoding::Utf8 { bom: false }
    }
}

/// Decode file content, replacing malformed sequences rather than failing;
/// only real I/O problems abort a load. The byte order mark is consumed,
/// not part of the text.
pub fn decode(bytes: &[u8]) -> (TextEncoding, String) {
    let encoding = detect_encoding(bytes);
    let text = match encoding {
        TextEncoding::Utf8 { bom } => {
            let body = if bom { &bytes[3..] } else { bytes };
            UTF_8
                .decode_without_bom_handling(body)
                .0
                .into_owned()
        }
        TextEncoding::Utf16Le => UTF_16LE
            .decode_without_bom_handling(&bytes[2..])
            .0
            .into_owned(),
        TextEncoding::Utf16Be => UTF_16BE
            .decode_without_bom_handling(&bytes[2..])
            .0
            .into_owned(),
    };
    (encoding, text)
}

pub fn detect_newline(text: &str) -> NewlineStyle {
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\n' => return NewlineStyle::Lf,
            '\r' => {
                return if chars.next() == Some('\n') {
                    NewlineStyle::CrLf
                } else {
                    NewlineStyle::Cr
                };
            }
            _ => {}
        }
    }
    NewlineStyle::CrLf
}

/// Split text into lines on any of the three newline conventions. A
/// trailing newline does not produce a final empty line.
pub fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text
        .chars()
        .peekable();
    while let Some(c) = chars.next() {
        match c {
            '\n' => lines.push(std::mem::take(&mut current)),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            other => current.push(other),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Encode text back to bytes, re-emitting the byte order mark the file was
/// read with.
pub fn encode(text: &str, encoding: TextEncoding) -> Vec<u8> {
    match encoding {
        TextEncoding::Utf8 { bom } => {
            let mut bytes = Vec::with_capacity(text.len() + 3);
            if bom {
                bytes.extend_from_slice(&[0xef, 0xbb, 0xbf]);
            }
            bytes.extend_from_slice(text.as_bytes());
            bytes
        }
        TextEncoding::Utf16Le => {
            let mut bytes = vec![0xff, 0xfe];
            for unit in text.encode_utf16() {
                bytes.extend_from_slice(&unit.to_le_bytes());
            }
            bytes
        }
        TextEncoding::Utf16Be => {
            let mut bytes = vec![0xfe, 0xff];
            for unit in text.encode_utf16() {
                bytes.extend_from_slice(&unit.to_be_bytes());
            }
            bytes
        }
    }
}
