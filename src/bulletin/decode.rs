// src/bulletin/decode.rs
//! Bytes → text → bulletin body.
//!
//! KOERI serves the listing as an HTML page in ISO-8859-9 with the table
//! inside a `<pre>` block. Turkish letters (İ, Ş, Ğ, ı, ş, ğ) sit in the
//! high half of that code page, so decoding has to happen before any
//! label handling or the location names come out mangled.

use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::error::BulletinError;

pub const DEFAULT_ENCODING_LABEL: &str = "iso-8859-9";

static PRE: Lazy<Selector> = Lazy::new(|| Selector::parse("pre").expect("static selector"));

/// Resolve a WHATWG encoding label (`iso-8859-9` resolves to windows-1254).
pub fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}

/// Decode the raw body.
///
/// A body that is already valid UTF-8 is taken as is; the Turkish high
/// bytes of ISO-8859-9 essentially never form valid UTF-8 sequences.
pub fn decode_body(raw: &[u8], encoding: &'static Encoding) -> Result<String, BulletinError> {
    if let Ok(s) = std::str::from_utf8(raw) {
        return Ok(s.to_string());
    }
    encoding
        .decode_without_bom_handling_and_without_replacement(raw)
        .map(|s| s.into_owned())
        .ok_or(BulletinError::Decode {
            encoding: encoding.name(),
        })
}

/// Pull the text of every `<pre>` block. Plain-text bodies pass through.
pub fn extract_listing(body: &str) -> String {
    if !body.to_ascii_lowercase().contains("<pre") {
        return body.to_string();
    }
    let doc = Html::parse_document(body);
    let blocks: Vec<String> = doc
        .select(&PRE)
        .map(|el| el.text().collect::<String>())
        .collect();
    if blocks.is_empty() {
        // Unclosed or odd markup: fall back to entity-decoded raw text.
        return html_escape::decode_html_entities(body).to_string();
    }
    // Newline keeps the last row of one block off the first row of the next.
    blocks.join("\n")
}
