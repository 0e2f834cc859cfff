//! Plain-text bulk edit format for quotes and backgrounds
//!
//! Entries are separated by a blank line. Within an entry the first line is
//! the primary field (quote text / image URL) and the second line the
//! secondary field (author / display name):
//!
//! ```text
//! The only way to do great work is to love what you do.
//! Steve Jobs
//!
//! Life is what happens when you're busy making other plans.
//! John Lennon
//! ```
//!
//! Entries with fewer than two lines or an empty trimmed field are dropped.
//! Decoding never fails; an unusable block simply contributes nothing.

use crate::types::{Background, Quote};

const ENTRY_SEPARATOR: &str = "\n\n";

/// Split text into trimmed `(first, second)` pairs, skipping invalid blocks
fn decode_pairs(text: &str) -> impl Iterator<Item = (String, String)> + '_ {
    text.split(ENTRY_SEPARATOR).filter_map(|block| {
        let mut lines = block.lines();
        let first = lines.next()?.trim();
        let second = lines.next()?.trim();
        if first.is_empty() || second.is_empty() {
            return None;
        }
        Some((first.to_string(), second.to_string()))
    })
}

/// `\r\n` pasted from other editors would otherwise break the blank-line split
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

pub fn decode_quotes(text: &str) -> Vec<Quote> {
    let text = normalize_newlines(text);
    decode_pairs(&text)
        .map(|(text, author)| Quote { text, author })
        .collect()
}

/// Decode backgrounds; every entry gets a fresh id and default tunables
pub fn decode_backgrounds(text: &str) -> Vec<Background> {
    let text = normalize_newlines(text);
    decode_pairs(&text)
        .map(|(url, name)| Background::new(url, name))
        .collect()
}

pub fn encode_quotes(quotes: &[Quote]) -> String {
    quotes
        .iter()
        .map(|q| format!("{}\n{}", q.text, q.author))
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}

pub fn encode_backgrounds(backgrounds: &[Background]) -> String {
    backgrounds
        .iter()
        .map(|b| format!("{}\n{}", b.url, b.name))
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}
