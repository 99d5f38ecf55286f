//! Equation tag renumbering
//!
//! The tags pass walks display-math regions in document order, gives every
//! numbered line a sequential `\tag{N}` and remembers which old label became
//! which number. The reference pass then rewrites `$(label)$` references
//! through that map.

pub mod classify;
pub mod context;
pub mod plan;
pub mod refs;
pub mod splice;

use serde::Serialize;

use crate::core::markdown::SkippedRegion;
use crate::utils::error::RenumberResult;

pub use classify::{classify_region, Edit};
pub use context::{RenumberOptions, RenumberState, TagRenumberer};
pub use refs::rewrite_references;
pub use splice::{apply_splices, Splice};

// =============================================================================
// Warning System
// =============================================================================

/// Kind of warning generated during renumbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// A display-math region could not be parsed and was left untouched
    MalformedRegion,
    /// The same old label was tagged more than once
    DuplicateLabel,
    /// A math span did not line up with its delimiters
    UnlocatedSpan,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningKind::MalformedRegion => write!(f, "malformed region"),
            WarningKind::DuplicateLabel => write!(f, "duplicate label"),
            WarningKind::UnlocatedSpan => write!(f, "unlocated span"),
        }
    }
}

/// A non-fatal issue found while renumbering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenumberWarning {
    pub kind: WarningKind,
    pub message: String,
    /// Location context (e.g. "line 42" or "cell 3, line 2")
    pub location: Option<String>,
}

impl RenumberWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        RenumberWarning {
            kind,
            message: message.into(),
            location: None,
        }
    }

    /// Add location context to the warning
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Prefix the location with an outer context such as a cell index
    pub fn within(mut self, outer: &str) -> Self {
        self.location = Some(match self.location.take() {
            Some(inner) => format!("{}, {}", outer, inner),
            None => outer.to_string(),
        });
        self
    }

    pub fn malformed_region(skipped: &SkippedRegion) -> Self {
        RenumberWarning::new(
            WarningKind::MalformedRegion,
            format!("display math left unchanged: {}", skipped),
        )
    }

    pub fn unlocated_span(skipped: &SkippedRegion) -> Self {
        RenumberWarning::new(WarningKind::UnlocatedSpan, skipped.to_string())
    }

    pub fn duplicate_label(label: &str, previous: &str, current: &str) -> Self {
        RenumberWarning::new(
            WarningKind::DuplicateLabel,
            format!(
                "label '{}' was renumbered to {} and again to {}; references use {}",
                label, previous, current, current
            ),
        )
        .with_location(label.to_string())
    }
}

impl std::fmt::Display for RenumberWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref loc) = self.location {
            write!(f, "[{}] {}: {}", self.kind, loc, self.message)
        } else {
            write!(f, "[{}] {}", self.kind, self.message)
        }
    }
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Renumber the tags of a single Markdown text and rewrite its references
pub fn renumber_document(text: &str) -> RenumberResult<String> {
    renumber_document_with_options(text, RenumberOptions::default())
}

/// [`renumber_document`] with custom options
pub fn renumber_document_with_options(
    text: &str,
    options: RenumberOptions,
) -> RenumberResult<String> {
    TagRenumberer::with_options(options).renumber_document(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::markdown::SkipReason;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_warning_display() {
        let warning = RenumberWarning::duplicate_label("a", "1", "3");
        assert_eq!(
            warning.to_string(),
            "[duplicate label] a: label 'a' was renumbered to 1 and again to 3; references use 3"
        );
    }

    #[test]
    fn test_warning_within_cell() {
        let skipped = SkippedRegion {
            range: 0..4,
            reason: SkipReason::Unlocated,
        };
        let warning = RenumberWarning::unlocated_span(&skipped)
            .with_location("line 2")
            .within("cell 5");
        assert_eq!(warning.location.as_deref(), Some("cell 5, line 2"));
        assert_eq!(
            RenumberWarning::new(WarningKind::MalformedRegion, "x")
                .within("cell 1")
                .location
                .as_deref(),
            Some("cell 1")
        );
    }

    #[test]
    fn test_renumber_document() {
        let text = "$$ a \\tag{x} $$\n\nSee $(x)$.\n";
        assert_eq!(
            renumber_document(text).unwrap(),
            "$$ a \\tag{1} $$\n\nSee $(1)$.\n"
        );
    }

    #[test]
    fn test_renumber_document_without_refs() {
        let options = RenumberOptions {
            rewrite_refs: false,
            ..RenumberOptions::default()
        };
        let text = "$$ a \\tag{x} $$\n\nSee $(x)$.\n";
        assert_eq!(
            renumber_document_with_options(text, options).unwrap(),
            "$$ a \\tag{1} $$\n\nSee $(x)$.\n"
        );
    }
}
