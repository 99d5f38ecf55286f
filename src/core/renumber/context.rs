//! Core state and structures for tag renumbering
//!
//! This module contains the renumbering options, the per-document session
//! state and the [`TagRenumberer`] that drives both passes.

use indexmap::IndexMap;
use serde::Deserialize;

use mitex_parser::CommandSpec;

use crate::core::latex::spec::{DEFAULT_ALIGNED_ENVIRONMENTS, TAG_SPEC};
use crate::core::markdown::{math_blocks, MathRegion, SkipReason};
use crate::utils::error::{RenumberError, RenumberResult};

use super::classify::classify_region;
use super::plan::plan_edits;
use super::refs::find_reference_splices;
use super::splice::{apply_splices, Splice};
use super::RenumberWarning;

// =============================================================================
// Renumbering Options
// =============================================================================

/// Options for tag renumbering
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenumberOptions {
    /// Number given to the first tag of a document
    /// Default: 1
    pub first_tag: u32,

    /// Environments whose lines are numbered one by one
    /// Default: align, alignat, gather
    pub aligned_environments: Vec<String>,

    /// Run the reference pass after the tags pass
    /// Default: true
    pub rewrite_refs: bool,
}

impl Default for RenumberOptions {
    fn default() -> Self {
        Self {
            first_tag: 1,
            aligned_environments: DEFAULT_ALIGNED_ENVIRONMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rewrite_refs: true,
        }
    }
}

impl RenumberOptions {
    /// Options starting the numbering at `first_tag`
    pub fn starting_at(first_tag: u32) -> Self {
        Self {
            first_tag: first_tag.max(1),
            ..Self::default()
        }
    }
}

// =============================================================================
// Session State
// =============================================================================

/// Document-scoped renumbering state.
///
/// Mutated only by the tags pass; the reference pass reads it.
#[derive(Debug, Clone)]
pub struct RenumberState {
    /// The number the next tag will receive
    pub next_tag: u32,
    /// Old label to new tag number
    pub label_map: IndexMap<String, String>,
    /// Non-fatal issues found so far
    pub warnings: Vec<RenumberWarning>,
    /// Outer location (e.g. "cell 3") given to new warnings
    pub unit: Option<String>,
}

impl RenumberState {
    pub fn new(options: &RenumberOptions) -> Self {
        Self {
            next_tag: options.first_tag.max(1),
            label_map: IndexMap::new(),
            warnings: Vec::new(),
            unit: None,
        }
    }

    /// Hand out the next tag number
    pub fn take_tag(&mut self) -> RenumberResult<u32> {
        let number = self.next_tag;
        self.next_tag = number.checked_add(1).ok_or_else(|| {
            RenumberError::invalid_input(format!("tag numbers exhausted at {}", number))
        })?;
        Ok(number)
    }

    /// Map `old` to `new`, returning the number it was mapped to before
    pub fn record_label(&mut self, old: &str, new: &str) -> Option<String> {
        self.label_map.insert(old.to_string(), new.to_string())
    }

    pub fn warn(&mut self, warning: RenumberWarning) {
        let warning = match self.unit {
            Some(ref unit) => warning.within(unit),
            None => warning,
        };
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Renumbers `\tag`s of one document and rewrites references to them.
///
/// A renumberer is a session: create one per document, call
/// [`renumber_tags`](Self::renumber_tags) on every text unit in order, then
/// [`renumber_refs`](Self::renumber_refs) on every unit.
pub struct TagRenumberer {
    pub(crate) state: RenumberState,
    pub(crate) options: RenumberOptions,
    pub(crate) spec: CommandSpec,
}

impl Default for TagRenumberer {
    fn default() -> Self {
        Self::new()
    }
}

impl TagRenumberer {
    /// Create a new renumberer with default options
    pub fn new() -> Self {
        Self::with_options(RenumberOptions::default())
    }

    /// Create a new renumberer with custom options
    pub fn with_options(options: RenumberOptions) -> Self {
        Self {
            state: RenumberState::new(&options),
            options,
            spec: TAG_SPEC.clone(),
        }
    }

    /// Get a reference to the current options
    pub fn options(&self) -> &RenumberOptions {
        &self.options
    }

    /// The number the next tag will receive
    pub fn next_tag(&self) -> u32 {
        self.state.next_tag
    }

    /// How many tag numbers have been handed out
    pub fn tags_assigned(&self) -> u32 {
        self.state.next_tag - self.options.first_tag.max(1)
    }

    /// Old label to new number mappings recorded so far
    pub fn label_map(&self) -> &IndexMap<String, String> {
        &self.state.label_map
    }

    pub fn warnings(&self) -> &[RenumberWarning] {
        &self.state.warnings
    }

    /// Prefix the location of warnings raised from now on with `unit`
    pub fn set_unit(&mut self, unit: Option<String>) {
        self.state.unit = unit;
    }

    /// Renumber the tags of every display-math region in `text`.
    ///
    /// Regions are numbered in document order, continuing from the tags
    /// already assigned by this session.
    pub fn renumber_tags(&mut self, text: &str) -> RenumberResult<String> {
        let mut splices: Vec<Splice> = Vec::new();

        for item in math_blocks(text, &self.spec) {
            let region = match item {
                Ok(region) => region,
                Err(skipped) => {
                    let line = line_of(text, skipped.range.start);
                    let warning = match skipped.reason {
                        SkipReason::Unlocated => RenumberWarning::unlocated_span(&skipped),
                        _ => RenumberWarning::malformed_region(&skipped),
                    };
                    self.state.warn(warning.with_location(format!("line {}", line)));
                    continue;
                }
            };

            let MathRegion {
                text: region_text,
                offset,
                items,
            } = region;
            let edits = classify_region(items, &self.options.aligned_environments)?;
            tracing::debug!(offset, edits = edits.len(), "classified math region");
            splices.extend(plan_edits(&mut self.state, region_text, offset, &edits)?);
        }

        Ok(apply_splices(text, &splices))
    }

    /// Rewrite `$(label)$` references to tags renumbered by this session.
    pub fn renumber_refs(&self, text: &str) -> String {
        let splices = find_reference_splices(text, &self.state.label_map);
        apply_splices(text, &splices)
    }

    /// Run the tags pass, then the reference pass, on a single text
    pub fn renumber_document(&mut self, text: &str) -> RenumberResult<String> {
        let tagged = self.renumber_tags(text)?;
        if self.options.rewrite_refs {
            Ok(self.renumber_refs(&tagged))
        } else {
            Ok(tagged)
        }
    }
}

/// 1-based line number of byte `pos` in `text`
fn line_of(text: &str, pos: usize) -> usize {
    text.get(..pos)
        .map(|head| head.matches('\n').count() + 1)
        .unwrap_or(1)
}
