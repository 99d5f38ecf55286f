//! LaTeX layer for math regions
//!
//! Parsing is delegated to `mitex-parser`; this module flattens its syntax
//! tree into the few item kinds the tag analysis needs, with byte spans:
//! - `spec`: the command table handed to mitex
//! - `walk`: the syntax-tree adapter
//! - `item`: the flattened view

pub mod item;
pub mod spec;
pub mod walk;

pub use item::{ItemKind, MathItem, Span};
pub use spec::TAG_SPEC;
pub use walk::{parse_math, ParseError};
