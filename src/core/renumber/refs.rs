//! Reference rewriting
//!
//! A reference is an inline-math span whose whole content is a
//! parenthesized label, e.g. `$(old)$`. References to labels renumbered by
//! the tags pass are rewritten to the new number.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::core::markdown::math_inlines;

use super::splice::{apply_splices, Splice};

lazy_static! {
    static ref REFERENCE_RE: Regex = Regex::new(r"^\((.+)\)$").unwrap();
}

/// The label referenced by inline math `content`, if it is a reference
pub fn reference_label(content: &str) -> Option<&str> {
    let caps = REFERENCE_RE.captures(content.trim())?;
    let label = caps.get(1)?.as_str().trim();
    (!label.is_empty()).then_some(label)
}

/// Splices rewriting every reference in `text` found in `label_map`
pub fn find_reference_splices(text: &str, label_map: &IndexMap<String, String>) -> Vec<Splice> {
    if label_map.is_empty() {
        return Vec::new();
    }

    let mut splices = Vec::new();
    for item in math_inlines(text) {
        let inline = match item {
            Ok(inline) => inline,
            Err(skipped) => {
                tracing::debug!("skipping inline math: {}", skipped);
                continue;
            }
        };
        let Some(label) = reference_label(inline.content()) else {
            continue;
        };
        if let Some(number) = label_map.get(label) {
            tracing::debug!(label, number = number.as_str(), "rewriting reference");
            let range = inline.range();
            splices.push(Splice::new(range.start, range.end, format!("$({})$", number)));
        }
    }
    splices
}

/// Rewrite the references of `text` through `label_map`
pub fn rewrite_references(text: &str, label_map: &IndexMap<String, String>) -> String {
    let splices = find_reference_splices(text, label_map);
    apply_splices(text, &splices)
}
