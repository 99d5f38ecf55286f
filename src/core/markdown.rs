//! Math-region extraction from Markdown
//!
//! Display math is found at the block level: a line whose content, after
//! any blockquote or list-item prefix, starts with `$$` opens a region that
//! runs to the next `$$`, across line breaks and blank lines. Lines inside
//! the region are never read as Markdown, so a `+ `, `- ` or `# ` line in
//! an `align` body stays part of the equation. Fence openers inside code
//! blocks are ignored.
//!
//! Everything else is delegated to `pulldown-cmark` with math enabled: code
//! block ranges, `$$..$$` that does not start a line, and inline math. Its
//! offset iterator reports absolute byte ranges, so every region found here
//! knows where it sits in the host text and edits never need to search for
//! it again.

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use mitex_parser::CommandSpec;
use pulldown_cmark::{Event, Options, Parser, Tag};

use super::latex::{parse_math, MathItem, ParseError};

const DISPLAY_DELIMITER: &str = "$$";
const INLINE_DELIMITER: &str = "$";

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_MATH);
    options.insert(Options::ENABLE_TABLES);
    options
}

/// A display-math region and its parsed content
#[derive(Debug, Clone)]
pub struct MathRegion<'a> {
    /// Exact source text, `$$` delimiters included
    pub text: &'a str,
    /// Byte offset of `text` in the host document
    pub offset: usize,
    /// Top-level items inside the math delimiters; spans are relative to `text`
    pub items: Vec<MathItem>,
}

/// An inline-math span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineMath<'a> {
    /// Exact source text, `$` delimiters included
    pub text: &'a str,
    /// Byte offset of `text` in the host document
    pub offset: usize,
}

impl<'a> InlineMath<'a> {
    /// The math content without its delimiters
    pub fn content(&self) -> &'a str {
        self.text
            .strip_prefix(INLINE_DELIMITER)
            .and_then(|s| s.strip_suffix(INLINE_DELIMITER))
            .unwrap_or(self.text)
    }

    /// Absolute byte range of the span, delimiters included
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.text.len()
    }
}

/// Why a math span was not yielded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The reported range could not be aligned with its delimiters
    Unlocated,
    /// The region content is not valid LaTeX
    Parse(ParseError),
}

/// A math span that the extractor had to skip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRegion {
    pub range: Range<usize>,
    pub reason: SkipReason,
}

impl fmt::Display for SkippedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            SkipReason::Unlocated => write!(
                f,
                "math span at {}..{} does not line up with its delimiters",
                self.range.start, self.range.end
            ),
            SkipReason::Parse(err) => write!(f, "{}", err),
        }
    }
}

/// Widen `range` if needed so that it starts and ends with `delimiter`.
///
/// The tokenizer reports ranges that already include the delimiters; the
/// fallback covers ranges that only span the content.
fn locate(text: &str, range: Range<usize>, delimiter: &str) -> Option<Range<usize>> {
    let d = delimiter.len();
    if let Some(slice) = text.get(range.clone()) {
        if slice.len() >= 2 * d && slice.starts_with(delimiter) && slice.ends_with(delimiter) {
            return Some(range);
        }
    }
    let start = range.start.checked_sub(d)?;
    let end = range.end + d;
    let widened = text.get(start..end)?;
    if widened.starts_with(delimiter) && widened.ends_with(delimiter) {
        Some(start..end)
    } else {
        None
    }
}

// =============================================================================
// Block-level fences
// =============================================================================

/// A `$$` region opened at the start of a line
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fence {
    range: Range<usize>,
    /// Blockquote nesting of the opening line
    quote_depth: usize,
}

/// Length of the container prefix of `line` (indentation, `>` markers and
/// one list marker) and the number of `>` markers in it
fn container_prefix(line: &str) -> (usize, usize) {
    let bytes = line.as_bytes();
    let skip_blank = |mut i: usize| {
        while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
            i += 1;
        }
        i
    };

    let mut i = skip_blank(0);
    let mut depth = 0;
    while i < bytes.len() && bytes[i] == b'>' {
        depth += 1;
        i = skip_blank(i + 1);
    }

    let digits = bytes[i..].iter().take_while(|b| b.is_ascii_digit()).count();
    let marker = match bytes.get(i + digits) {
        Some(b'-' | b'+' | b'*') if digits == 0 => Some(i + 1),
        Some(b'.' | b')') if (1..=9).contains(&digits) => Some(i + digits + 1),
        _ => None,
    };
    if let Some(after) = marker {
        if matches!(bytes.get(after), Some(b' ' | b'\t')) {
            i = skip_blank(after);
        }
    }
    (i, depth)
}

/// Byte ranges of fenced and indented code blocks
fn code_block_ranges(text: &str) -> Vec<Range<usize>> {
    Parser::new_ext(text, markdown_options())
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::CodeBlock(_)) => Some(range),
            _ => None,
        })
        .collect()
}

/// `$$` regions that open at the start of a line, in document order
fn fences(text: &str) -> Vec<Fence> {
    let code = code_block_ranges(text);
    let mut found = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let line_end = text[pos..].find('\n').map_or(text.len(), |i| pos + i + 1);
        let (prefix, quote_depth) = container_prefix(&text[pos..line_end]);
        let start = pos + prefix;

        if text[start..line_end].starts_with(DISPLAY_DELIMITER)
            && !code.iter().any(|r| r.contains(&start))
        {
            let body = start + DISPLAY_DELIMITER.len();
            if let Some(close) = text[body..].find(DISPLAY_DELIMITER) {
                let end = body + close + DISPLAY_DELIMITER.len();
                found.push(Fence {
                    range: start..end,
                    quote_depth,
                });
                pos = text[end..].find('\n').map_or(text.len(), |i| end + i + 1);
                continue;
            }
        }
        pos = line_end;
    }
    found
}

/// Blank out the `>` markers that continuation lines of a quoted region
/// carry, keeping every byte offset in place
fn mask_quote_markers(region: &str, depth: usize) -> Cow<'_, str> {
    if depth == 0 || !region.contains('\n') {
        return Cow::Borrowed(region);
    }
    let is_blank = |c: char| c == ' ' || c == '\t';

    let mut out = String::with_capacity(region.len());
    for (i, line) in region.split_inclusive('\n').enumerate() {
        if i == 0 {
            out.push_str(line);
            continue;
        }
        let mut rest = line;
        let mut left = depth;
        loop {
            let trimmed = rest.trim_start_matches(is_blank);
            out.push_str(&rest[..rest.len() - trimmed.len()]);
            rest = trimmed;
            if left == 0 || !rest.starts_with('>') {
                break;
            }
            out.push(' ');
            rest = &rest[1..];
            left -= 1;
        }
        out.push_str(rest);
    }
    Cow::Owned(out)
}

fn build_region<'a>(
    text: &'a str,
    range: Range<usize>,
    quote_depth: usize,
    spec: &CommandSpec,
) -> Result<MathRegion<'a>, SkippedRegion> {
    let region = &text[range.clone()];
    let source = mask_quote_markers(region, quote_depth);
    let d = DISPLAY_DELIMITER.len();
    let content = &source[d..source.len() - d];

    let items = parse_math(content, d, spec).map_err(|err| SkippedRegion {
        range: range.clone(),
        reason: SkipReason::Parse(err),
    })?;

    Ok(MathRegion {
        text: region,
        offset: range.start,
        items,
    })
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Display-math regions of `text` in document order.
///
/// Regions that cannot be located or parsed are yielded as errors so the
/// caller can report them and move on.
pub fn math_blocks<'a>(
    text: &'a str,
    spec: &CommandSpec,
) -> Vec<Result<MathRegion<'a>, SkippedRegion>> {
    let fences = fences(text);

    let mut found: Vec<(Range<usize>, usize)> = fences
        .iter()
        .map(|f| (f.range.clone(), f.quote_depth))
        .collect();
    let mut unlocated = Vec::new();

    for (event, range) in Parser::new_ext(text, markdown_options()).into_offset_iter() {
        let Event::DisplayMath(_) = event else {
            continue;
        };
        if fences.iter().any(|f| overlaps(&f.range, &range)) {
            continue;
        }
        match locate(text, range.clone(), DISPLAY_DELIMITER) {
            Some(located) => found.push((located, 0)),
            None => unlocated.push(range),
        }
    }

    let mut regions: Vec<_> = found
        .into_iter()
        .map(|(range, depth)| build_region(text, range, depth, spec))
        .chain(unlocated.into_iter().map(|range| {
            Err(SkippedRegion {
                range,
                reason: SkipReason::Unlocated,
            })
        }))
        .collect();
    regions.sort_by_key(|r| match r {
        Ok(region) => region.offset,
        Err(skipped) => skipped.range.start,
    });
    regions
}

/// Inline-math spans of `text` in document order.
///
/// Spans that fall inside a display region are not inline math.
pub fn math_inlines(text: &str) -> Vec<Result<InlineMath<'_>, SkippedRegion>> {
    let fences = fences(text);
    Parser::new_ext(text, markdown_options())
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::InlineMath(_) if !fences.iter().any(|f| overlaps(&f.range, &range)) => Some(
                locate(text, range.clone(), INLINE_DELIMITER)
                    .map(|r| InlineMath {
                        text: &text[r.clone()],
                        offset: r.start,
                    })
                    .ok_or(SkippedRegion {
                        range,
                        reason: SkipReason::Unlocated,
                    }),
            ),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::latex::{ItemKind, TAG_SPEC};
    use pretty_assertions::assert_eq;

    fn blocks(text: &str) -> Vec<MathRegion<'_>> {
        math_blocks(text, &TAG_SPEC)
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    fn texts(text: &str) -> Vec<&str> {
        blocks(text).iter().map(|r| r.text).collect()
    }

    #[test]
    fn test_no_math() {
        assert!(blocks("# Title\n\nJust text.\n").is_empty());
        assert!(math_inlines("plain *text*").is_empty());
    }

    #[test]
    fn test_display_region_offset() {
        let text = "Before\n\n$$x\\tag 1$$\n";
        let regions = blocks(text);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].text, "$$x\\tag 1$$");
        assert_eq!(regions[0].offset, 8);
        assert_eq!(&text[regions[0].offset..][..regions[0].text.len()], regions[0].text);
        assert!(regions[0]
            .items
            .iter()
            .any(|i| matches!(i.kind, ItemKind::Tag { .. })));
    }

    #[test]
    fn test_regions_in_document_order() {
        let text = "$$a$$\n\n- item with $$b$$\n\n> quoted $$c$$\n";
        assert_eq!(texts(text), vec!["$$a$$", "$$b$$", "$$c$$"]);
    }

    #[test]
    fn test_two_regions_on_one_line() {
        assert_eq!(texts("$$a$$ and $$b$$\n"), vec!["$$a$$", "$$b$$"]);
    }

    #[test]
    fn test_markdown_significant_lines_stay_in_region() {
        for text in [
            "$$\na = b\n+ c\n$$\n",
            "$$\n\\begin{align}\na &= b \\\\\n- c &= d\n\\end{align}\n$$\n",
            "$$\na\n# b\n$$\n",
            "$$\na\n\nb\n$$\n",
            "$$\na\n> b\n$$\n",
        ] {
            assert_eq!(texts(text), vec![text.trim_end()], "{:?}", text);
        }
    }

    #[test]
    fn test_fence_inside_code_block_is_ignored() {
        let text = "```\n$$\nx\n$$\n```\n\n    $$ y $$\n\n$$ z $$\n";
        assert_eq!(texts(text), vec!["$$ z $$"]);
    }

    #[test]
    fn test_unclosed_fence_is_not_a_region() {
        assert!(blocks("$$\na = b\n").is_empty());
    }

    #[test]
    fn test_region_in_blockquote() {
        let text = "> $$\n> a \\\\\n> b\n> $$\n";
        let regions = blocks(text);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].offset, 2);
        assert_eq!(regions[0].text, "$$\n> a \\\\\n> b\n> $$");
        let content: Vec<_> = regions[0]
            .items
            .iter()
            .filter(|i| i.kind == ItemKind::Content)
            .map(|i| &regions[0].text[i.span.start..i.span.end])
            .collect();
        assert_eq!(content, vec!["a", "b"]);
    }

    #[test]
    fn test_region_in_list_item() {
        let text = "- first\n\n- $$\n  a \\\\\n  - b\n  $$\n";
        assert_eq!(texts(text), vec!["$$\n  a \\\\\n  - b\n  $$"]);
    }

    #[test]
    fn test_container_prefix() {
        assert_eq!(container_prefix("$$"), (0, 0));
        assert_eq!(container_prefix("  $$"), (2, 0));
        assert_eq!(container_prefix("> > $$"), (4, 2));
        assert_eq!(container_prefix("- $$"), (2, 0));
        assert_eq!(container_prefix("12. $$"), (4, 0));
        assert_eq!(container_prefix("-$$"), (0, 0));
    }

    #[test]
    fn test_mask_quote_markers() {
        assert_eq!(
            mask_quote_markers("$$\n> a\n>> b\n> $$", 1),
            "$$\n  a\n > b\n  $$"
        );
        assert_eq!(mask_quote_markers("$$\n> > a\n$$", 2), "$$\n    a\n$$");
        assert!(matches!(mask_quote_markers("$$\n> a$$", 0), Cow::Borrowed(_)));
    }

    #[test]
    fn test_inline_spans() {
        let text = "We have $x=y$ and see $(1)$.";
        let inlines: Vec<_> = math_inlines(text).into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(inlines.len(), 2);
        assert_eq!(inlines[0].text, "$x=y$");
        assert_eq!(inlines[0].content(), "x=y");
        assert_eq!(inlines[1].text, "$(1)$");
        assert_eq!(&text[inlines[1].range()], "$(1)$");
    }

    #[test]
    fn test_inline_spans_inside_display_region_are_ignored() {
        let text = "$$\na\n\n$(b)$\n$$\n\nSee $(c)$.";
        let inlines: Vec<_> = math_inlines(text).into_iter().map(|r| r.unwrap().text).collect();
        assert_eq!(inlines, vec!["$(c)$"]);
    }

    #[test]
    fn test_inline_math_is_not_a_block() {
        assert!(blocks("only $x$ here").is_empty());
    }

    #[test]
    fn test_locate_widens_content_range() {
        let text = "a $$x$$ b";
        assert_eq!(locate(text, 2..7, "$$"), Some(2..7));
        assert_eq!(locate(text, 4..5, "$$"), Some(2..7));
        assert_eq!(locate(text, 0..1, "$$"), None);
    }

    #[test]
    fn test_build_region_rejects_malformed() {
        let text = "$$ x } $$";
        let err = build_region(text, 0..text.len(), 0, &TAG_SPEC).unwrap_err();
        assert!(matches!(err.reason, SkipReason::Parse(_)));
        assert_eq!(err.range, 0..text.len());
    }
}
