//! Tag-state classification of math regions
//!
//! Decides, per logical equation line, whether a tag already exists, is
//! suppressed, or is missing, and turns that into [`Edit`]s expressed in
//! offsets of the region text.

use crate::core::latex::{ItemKind, MathItem};
use crate::utils::error::{RenumberError, RenumberResult};

/// A planned change to a region's text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// Insert a fresh tag at `start`
    Insertion { start: usize },
    /// Replace the tag macro occupying `start..start + length`
    Replacement {
        start: usize,
        length: usize,
        label_start: usize,
        label_length: usize,
    },
}

impl Edit {
    pub fn start(&self) -> usize {
        match *self {
            Edit::Insertion { start } | Edit::Replacement { start, .. } => start,
        }
    }

    /// Number of bytes the edit removes
    pub fn length(&self) -> usize {
        match *self {
            Edit::Insertion { .. } => 0,
            Edit::Replacement { length, .. } => length,
        }
    }

    pub fn end(&self) -> usize {
        self.start() + self.length()
    }
}

/// Build the replacement edit for an existing `\tag` item
fn replacement_for(item: &MathItem) -> RenumberResult<Edit> {
    match item.kind {
        ItemKind::Tag {
            label: Some(label), ..
        } => Ok(Edit::Replacement {
            start: item.span.start,
            length: item.span.len(),
            label_start: label.start,
            label_length: label.len(),
        }),
        _ => Err(RenumberError::internal(format!(
            "tag macro at byte {} has no label argument",
            item.span.start
        ))),
    }
}

fn is_aligned_environment(item: &MathItem, aligned: &[String]) -> bool {
    item.environment_name()
        .is_some_and(|env| aligned.iter().any(|name| name == env))
}

/// Classify one region's top-level items.
///
/// The first top-level environment named in `aligned` is analysed line by
/// line; any other region is treated as a single equation.
pub fn classify_region(mut items: Vec<MathItem>, aligned: &[String]) -> RenumberResult<Vec<Edit>> {
    if let Some(i) = items.iter().position(|it| is_aligned_environment(it, aligned)) {
        if let ItemKind::Environment { body, .. } = items.swap_remove(i).kind {
            let mut lines = body;
            ensure_sentinel_line_break(&mut lines);
            return find_edits_in_aligned(&lines);
        }
    }
    find_edit_in_single_line(&items)
}

/// Append a synthetic line break when the last line is not terminated.
///
/// Scans backward over trailing tag markers, comments and whitespace. If
/// the first other item is not a line break, a zero-length `\\` is pushed
/// right after that item's content. Returns whether one was added.
pub fn ensure_sentinel_line_break(items: &mut Vec<MathItem>) -> bool {
    let mut sentinel_at = None;
    for item in items.iter().rev() {
        if item.is_line_break() {
            break;
        }
        if item.is_tag_marker() || item.is_trivia() {
            continue;
        }
        sentinel_at = Some(item.span.end);
        break;
    }

    match sentinel_at {
        Some(pos) => {
            items.push(MathItem::synthetic_line_break(pos));
            true
        }
        None => false,
    }
}

#[derive(Default)]
struct LineState<'n> {
    saw_tag: bool,
    saw_no_tag: bool,
    pending_tag: Option<&'n MathItem>,
}

/// Edits for the lines of an aligned environment.
///
/// Every line must end with a line break; see [`ensure_sentinel_line_break`].
/// The first tag marker on a line wins.
pub fn find_edits_in_aligned(items: &[MathItem]) -> RenumberResult<Vec<Edit>> {
    let mut edits = Vec::new();
    let mut line = LineState::default();

    for item in items {
        match item.kind {
            ItemKind::LineBreak => {
                if let Some(tag) = line.pending_tag {
                    edits.push(replacement_for(tag)?);
                } else if !(line.saw_tag || line.saw_no_tag) {
                    edits.push(Edit::Insertion {
                        start: item.span.start,
                    });
                }
                line = LineState::default();
            }
            _ if line.saw_tag || line.saw_no_tag => continue,
            ItemKind::Tag { starred, .. } => {
                line.saw_tag = true;
                if !starred {
                    line.pending_tag = Some(item);
                }
            }
            ItemKind::NoTag => line.saw_no_tag = true,
            _ => {}
        }
    }

    Ok(edits)
}

/// Edit for a single-line equation: at most one.
///
/// Scanning from the end, the first marker found decides: `\notag` or
/// `\tag*` suppress numbering, `\tag` is replaced. Without any marker a tag
/// is inserted after the last item, right before the closing delimiter.
pub fn find_edit_in_single_line(items: &[MathItem]) -> RenumberResult<Vec<Edit>> {
    for item in items.iter().rev() {
        match item.kind {
            ItemKind::NoTag | ItemKind::Tag { starred: true, .. } => return Ok(Vec::new()),
            ItemKind::Tag { .. } => return Ok(vec![replacement_for(item)?]),
            _ => {}
        }
    }

    Ok(items
        .last()
        .map(|last| Edit::Insertion {
            start: last.span.end,
        })
        .into_iter()
        .collect())
}
