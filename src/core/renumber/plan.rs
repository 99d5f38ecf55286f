//! Edit planning: number assignment and label mapping
//!
//! Turns a region's classified edits into document-level splices. Every
//! edit consumes exactly one tag number, in edit order.

use crate::utils::error::RenumberResult;

use super::classify::Edit;
use super::context::RenumberState;
use super::splice::Splice;
use super::RenumberWarning;

/// The macro text for tag `number`
pub fn tag_macro(number: u32) -> String {
    format!("\\tag{{{}}}", number)
}

/// The old label of a replaced tag, with whitespace and one pair of braces
/// stripped. `None` when nothing is left.
pub fn extract_label(region: &str, label_start: usize, label_length: usize) -> Option<&str> {
    let raw = region.get(label_start..label_start + label_length)?.trim();
    let raw = raw.strip_prefix('{').unwrap_or(raw);
    let raw = raw.strip_suffix('}').unwrap_or(raw);
    let label = raw.trim();
    (!label.is_empty()).then_some(label)
}

/// Assign numbers to `edits` of the region at `offset` and return the
/// splices in absolute document coordinates.
pub fn plan_edits(
    state: &mut RenumberState,
    region: &str,
    offset: usize,
    edits: &[Edit],
) -> RenumberResult<Vec<Splice>> {
    let mut splices = Vec::with_capacity(edits.len());
    for edit in edits {
        let number = state.take_tag()?;
        if let Edit::Replacement {
            label_start,
            label_length,
            ..
        } = *edit
        {
            if let Some(old) = extract_label(region, label_start, label_length) {
                let new = number.to_string();
                if let Some(previous) = state.record_label(old, &new) {
                    state.warn(RenumberWarning::duplicate_label(old, &previous, &new));
                }
            }
        }
        splices.push(Splice::new(edit.start(), edit.end(), tag_macro(number)).shifted(offset));
    }
    Ok(splices)
}
