//! Byte-level decoding of uploads.
//!
//! Resolution order:
//! 1. byte-order mark
//! 2. `encoding` pseudo-attribute of the XML declaration
//! 3. windows-1252, the authoritative wire encoding of the feed
//!
//! A declared encoding the bytes do not actually follow (usually "UTF-8" on a
//! windows-1252 feed) is dropped in favour of windows-1252. A BOM is trusted.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};
use regex::bytes::Regex;

static DECLARED_ENCODING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*<\?xml[^>]*?\sencoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#)
        .expect("Invalid XML declaration regex")
});

/// Decoded upload text.
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
    /// True when malformed byte sequences were replaced with U+FFFD.
    pub had_errors: bool,
}

/// Decode raw upload bytes to text.
pub fn decode_document(bytes: &[u8]) -> DecodedText {
    let (encoding, body, from_bom) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..], true),
        None => (sniff_declared_encoding(bytes), bytes, false),
    };
    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors && !from_bom && encoding != WINDOWS_1252 {
        tracing::warn!(
            declared = encoding.name(),
            "upload bytes do not match the declared encoding; decoding as windows-1252"
        );
        let (text, had_errors) = WINDOWS_1252.decode_without_bom_handling(body);
        return DecodedText {
            text: text.into_owned(),
            encoding: WINDOWS_1252,
            had_errors,
        };
    }
    if had_errors {
        tracing::warn!(
            encoding = encoding.name(),
            "upload contains byte sequences invalid for its encoding; replaced with U+FFFD"
        );
    }
    DecodedText {
        text: text.into_owned(),
        encoding,
        had_errors,
    }
}

fn sniff_declared_encoding(bytes: &[u8]) -> &'static Encoding {
    let head = &bytes[..bytes.len().min(256)];
    let Some(label) = DECLARED_ENCODING
        .captures(head)
        .and_then(|captures| captures.get(1))
    else {
        return WINDOWS_1252;
    };
    match Encoding::for_label(label.as_bytes()) {
        // A declaration we could read as ASCII cannot be UTF-16 without a BOM.
        Some(encoding) if encoding == UTF_16LE || encoding == UTF_16BE => UTF_8,
        Some(encoding) => encoding,
        None => {
            tracing::warn!(
                label = %String::from_utf8_lossy(label.as_bytes()),
                "unknown declared encoding; decoding as windows-1252"
            );
            WINDOWS_1252
        }
    }
}
