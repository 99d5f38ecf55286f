//! Renumbering reports for the notebook layer and the CLI.

use indexmap::IndexMap;
use serde::Serialize;

use crate::core::renumber::{RenumberWarning, TagRenumberer};

#[derive(Debug, Clone, Serialize)]
pub struct RenumberReport {
    /// Markdown cells visited by the tags pass
    pub cells: usize,
    pub tags_assigned: u32,
    /// Old label to new number, in first-seen order
    pub label_map: IndexMap<String, String>,
    pub warnings: Vec<RenumberWarning>,
}

impl RenumberReport {
    pub fn new(
        cells: usize,
        tags_assigned: u32,
        label_map: IndexMap<String, String>,
        warnings: Vec<RenumberWarning>,
    ) -> Self {
        Self {
            cells,
            tags_assigned,
            label_map,
            warnings,
        }
    }

    /// Snapshot of a finished session
    pub fn from_session(cells: usize, renumberer: &TagRenumberer) -> Self {
        Self::new(
            cells,
            renumberer.tags_assigned(),
            renumberer.label_map().clone(),
            renumberer.warnings().to_vec(),
        )
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
