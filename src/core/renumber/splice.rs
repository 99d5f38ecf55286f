//! Offset-based text splicing
//!
//! All rewriting goes through [`apply_splices`]: positions come from the
//! parse layers and are never rediscovered by searching the output.

/// Replace `start..end` of the original text with `replacement`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl Splice {
    pub fn new(start: usize, end: usize, replacement: impl Into<String>) -> Self {
        debug_assert!(start <= end);
        Splice {
            start,
            end,
            replacement: replacement.into(),
        }
    }

    /// Zero-length splice inserting `text` at `pos`
    pub fn insert(pos: usize, text: impl Into<String>) -> Self {
        Splice::new(pos, pos, text)
    }

    /// Same splice moved by `offset` bytes
    pub fn shifted(self, offset: usize) -> Self {
        Splice {
            start: self.start + offset,
            end: self.end + offset,
            ..self
        }
    }
}

/// Apply ascending, non-overlapping splices to `text` in one pass.
///
/// Every splice refers to offsets in the original `text`.
pub fn apply_splices(text: &str, splices: &[Splice]) -> String {
    let grown: usize = splices.iter().map(|s| s.replacement.len()).sum();
    let mut out = String::with_capacity(text.len() + grown);
    let mut cursor = 0;
    for splice in splices {
        debug_assert!(
            splice.start >= cursor,
            "splice at {} overlaps previous end {}",
            splice.start,
            cursor
        );
        out.push_str(&text[cursor..splice.start]);
        out.push_str(&splice.replacement);
        cursor = splice.end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_splices() {
        assert_eq!(apply_splices("abc", &[]), "abc");
    }

    #[test]
    fn test_insert_and_replace() {
        let text = "$$ a \\tag 7 $$ and $$ b $$";
        let replace_at = text.find("\\tag 7").unwrap();
        let insert_at = text.rfind(" $$").unwrap() + 1;
        let splices = vec![
            Splice::new(replace_at, replace_at + 6, "\\tag{1}"),
            Splice::insert(insert_at, "\\tag{2}"),
        ];
        assert_eq!(
            apply_splices(text, &splices),
            "$$ a \\tag{1} $$ and $$ b \\tag{2}$$"
        );
    }

    #[test]
    fn test_adjacent_splices() {
        let splices = vec![Splice::new(0, 1, "X"), Splice::new(1, 2, "Y"), Splice::insert(2, "Z")];
        assert_eq!(apply_splices("abc", &splices), "XYZc");
    }

    #[test]
    fn test_shifted() {
        let splice = Splice::insert(3, "t").shifted(10);
        assert_eq!((splice.start, splice.end), (13, 13));
    }
}
