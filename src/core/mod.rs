//! Core renumbering modules
//!
//! - `latex`: mitex-based parsing of math regions into spanned items
//! - `markdown`: block-level display math and inline math with absolute offsets
//! - `renumber`: the tags pass, the reference pass and their session state

pub mod latex;
pub mod markdown;
pub mod renumber;
