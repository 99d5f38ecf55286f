//! Flat view of a parsed math region
//!
//! Only the shapes the tag analysis cares about get their own kind; every
//! other syntax element is [`ItemKind::Content`].

/// A half-open byte range `[start, end)` into the region text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {} past end {}", start, end);
        Span { start, end }
    }

    /// Zero-length span at `pos`
    pub fn empty(pos: usize) -> Self {
        Span {
            start: pos,
            end: pos,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// Anything without a role in numbering
    Content,
    /// Whitespace and line endings
    Space,
    Comment,
    /// `\\` or `\newline`
    LineBreak,
    /// `\notag` or `\nonumber`
    NoTag,
    /// `\tag{..}`; `label` is the span of the argument, braces included
    Tag { starred: bool, label: Option<Span> },
    Environment { name: String, body: Vec<MathItem> },
}

/// One top-level element of a math region, or of an environment body.
///
/// Spans of content-bearing items exclude surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathItem {
    pub kind: ItemKind,
    pub span: Span,
}

impl MathItem {
    pub fn new(kind: ItemKind, span: Span) -> Self {
        MathItem { kind, span }
    }

    /// A zero-length `\\` at `pos`, used to close an unterminated line
    pub fn synthetic_line_break(pos: usize) -> Self {
        MathItem::new(ItemKind::LineBreak, Span::empty(pos))
    }

    pub fn is_line_break(&self) -> bool {
        self.kind == ItemKind::LineBreak
    }

    /// Whitespace or comment
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, ItemKind::Space | ItemKind::Comment)
    }

    /// `\tag`, `\tag*`, `\notag` or `\nonumber`
    pub fn is_tag_marker(&self) -> bool {
        matches!(self.kind, ItemKind::Tag { .. } | ItemKind::NoTag)
    }

    pub fn environment_name(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Environment { name, .. } => Some(name),
            _ => None,
        }
    }
}
