//! # tagrefsort
//!
//! Renumbers LaTeX `\tag` equations in Markdown text and Jupyter notebook
//! cells so that tags run 1, 2, 3, ... in document order, then rewrites
//! `$(label)$` references so they follow their equations.
//!
//! ## Example
//!
//! ```rust
//! use tagrefsort::renumber_document;
//!
//! let text = "$$ a \\tag{7} $$\n\n$$ b $$\n\nSee $(7)$.\n";
//! let out = renumber_document(text).unwrap();
//! assert_eq!(out, "$$ a \\tag{1} $$\n\n$$ b \\tag{2}$$\n\nSee $(1)$.\n");
//! ```
//!
//! A [`TagRenumberer`] keeps its counter and label map across calls, so a
//! document split into several units is renumbered by running
//! [`TagRenumberer::renumber_tags`] over every unit and then
//! [`TagRenumberer::renumber_refs`] over every unit. The [`notebook`] module
//! does exactly that for the Markdown cells of a notebook.

pub mod core;
pub mod notebook;
pub mod utils;

pub use crate::core::renumber::{
    renumber_document, renumber_document_with_options, RenumberOptions, RenumberWarning,
    TagRenumberer, WarningKind,
};
pub use notebook::{update_notebook, Notebook};
pub use utils::error::{RenumberError, RenumberResult};
pub use utils::report::RenumberReport;
