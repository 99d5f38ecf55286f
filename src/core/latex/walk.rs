//! Adapter from the mitex syntax tree to [`MathItem`]s
//!
//! mitex is error tolerant: it never fails and marks bad input with error
//! tokens instead. Regions carrying such marks, unbalanced braces, a
//! mismatched `\end` or a `\tag` without its argument are reported as a
//! [`ParseError`] so the caller can leave them untouched.

use std::fmt;

use mitex_parser::syntax::{CmdItem, EnvItem, SyntaxElement, SyntaxKind, SyntaxNode};
use mitex_parser::CommandSpec;
use rowan::ast::AstNode;
use rowan::TextRange;

use super::item::{ItemKind, MathItem, Span};
use super::spec::{is_line_break, is_no_tag, is_tag};

/// A structural error in a math region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    /// Byte offset in the region text
    pub pos: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, pos: usize) -> Self {
        ParseError {
            message: message.into(),
            pos,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.message, self.pos)
    }
}

impl std::error::Error for ParseError {}

/// Parse the math `content` of a region and flatten its top level.
///
/// `base` is the offset of `content` in the region text; every span in
/// the result is shifted by it.
pub fn parse_math(content: &str, base: usize, spec: &CommandSpec) -> Result<Vec<MathItem>, ParseError> {
    let root = mitex_parser::parse(content, spec.clone());
    let walker = Walker { base };
    walker.check(&root)?;

    let mut items = Vec::new();
    for child in root.children_with_tokens() {
        walker.push(child, &mut items)?;
    }
    Ok(items)
}

struct Walker {
    base: usize,
}

fn is_blank(kind: SyntaxKind) -> bool {
    matches!(kind, SyntaxKind::TokenWhiteSpace | SyntaxKind::TokenLineBreak)
}

fn element_text(elem: &SyntaxElement) -> String {
    match elem {
        SyntaxElement::Node(n) => n.text().to_string(),
        SyntaxElement::Token(t) => t.text().to_string(),
    }
}

/// Name between the braces of `\begin{..}` / `\end{..}`
fn braced_name(text: &str) -> Option<&str> {
    let open = text.find('{')?;
    let close = text[open..].find('}')? + open;
    Some(text[open + 1..close].trim())
}

impl Walker {
    fn span(&self, range: TextRange) -> Span {
        Span::new(
            self.base + usize::from(range.start()),
            self.base + usize::from(range.end()),
        )
    }

    /// Span from the first to the last non-blank token of `node`
    fn trimmed(&self, node: &SyntaxNode) -> Option<Span> {
        let mut tokens = node
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| !is_blank(t.kind()));
        let first = tokens.next()?;
        let last = tokens.last().unwrap_or_else(|| first.clone());
        Some(Span::new(
            self.base + usize::from(first.text_range().start()),
            self.base + usize::from(last.text_range().end()),
        ))
    }

    /// Reject trees mitex had to recover from
    fn check(&self, root: &SyntaxNode) -> Result<(), ParseError> {
        for elem in root.descendants_with_tokens() {
            let pos = self.span(elem.text_range()).start;
            match elem.kind() {
                SyntaxKind::TokenError => {
                    return Err(ParseError::new(
                        format!("unexpected `{}`", element_text(&elem).trim()),
                        pos,
                    ));
                }
                SyntaxKind::TokenLBrace | SyntaxKind::TokenRBrace => {
                    let enclosed = elem.parent().is_some_and(|p| {
                        matches!(
                            p.kind(),
                            SyntaxKind::ItemCurly
                                | SyntaxKind::ClauseArgument
                                | SyntaxKind::ItemBegin
                                | SyntaxKind::ItemEnd
                        )
                    });
                    if !enclosed {
                        return Err(ParseError::new(
                            format!("unbalanced `{}`", element_text(&elem)),
                            pos,
                        ));
                    }
                }
                SyntaxKind::ItemCurly => {
                    let closed = elem.as_node().is_some_and(|n| {
                        n.children_with_tokens()
                            .any(|c| c.kind() == SyntaxKind::TokenRBrace)
                    });
                    if !closed {
                        return Err(ParseError::new("unclosed `{`", pos));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn push(&self, elem: SyntaxElement, items: &mut Vec<MathItem>) -> Result<(), ParseError> {
        let kind = elem.kind();
        let span = self.span(elem.text_range());
        match elem {
            SyntaxElement::Node(node) => match kind {
                // grouping that TeX does not see
                SyntaxKind::ScopeRoot | SyntaxKind::ItemText | SyntaxKind::ItemParen => {
                    for child in node.children_with_tokens() {
                        self.push(child, items)?;
                    }
                }
                SyntaxKind::ItemNewLine => items.push(MathItem::new(ItemKind::LineBreak, span)),
                SyntaxKind::ItemBlockComment => items.push(MathItem::new(ItemKind::Comment, span)),
                SyntaxKind::ItemCmd => items.push(self.command(&node)?),
                SyntaxKind::ItemEnv => items.push(self.environment(&node)?),
                _ => {
                    let item = match self.trimmed(&node) {
                        Some(trimmed) => MathItem::new(ItemKind::Content, trimmed),
                        None => MathItem::new(ItemKind::Space, span),
                    };
                    items.push(item);
                }
            },
            SyntaxElement::Token(token) => {
                let kind = match kind {
                    k if is_blank(k) => ItemKind::Space,
                    SyntaxKind::TokenComment => ItemKind::Comment,
                    SyntaxKind::ItemNewLine => ItemKind::LineBreak,
                    SyntaxKind::TokenCommandSym if token.text() == "\\\\" => ItemKind::LineBreak,
                    _ => ItemKind::Content,
                };
                items.push(MathItem::new(kind, span));
            }
        }
        Ok(())
    }

    fn command(&self, node: &SyntaxNode) -> Result<MathItem, ParseError> {
        let span = self
            .trimmed(node)
            .unwrap_or_else(|| self.span(node.text_range()));
        let name = CmdItem::cast(node.clone())
            .and_then(|cmd| cmd.name_tok())
            .map(|t| {
                let text = t.text();
                text.strip_prefix('\\').unwrap_or(text).to_string()
            })
            .unwrap_or_default();

        if is_line_break(&name) {
            return Ok(MathItem::new(ItemKind::LineBreak, span));
        }
        if is_no_tag(&name) {
            return Ok(MathItem::new(ItemKind::NoTag, span));
        }
        if !is_tag(&name) {
            return Ok(MathItem::new(ItemKind::Content, span));
        }

        // `\tag*{..}` may arrive as the name `tag*`, or as `tag` whose first
        // argument is the star
        let args: Vec<SyntaxNode> = node
            .children()
            .filter(|c| c.kind() == SyntaxKind::ClauseArgument)
            .filter(|c| !c.children().any(|g| g.kind() == SyntaxKind::ItemBracket))
            .collect();
        let star_arg = args
            .first()
            .is_some_and(|a| a.text().to_string().trim() == "*");
        if name.ends_with('*') || star_arg {
            return Ok(MathItem::new(
                ItemKind::Tag {
                    starred: true,
                    label: None,
                },
                span,
            ));
        }

        match args.first() {
            Some(arg) => {
                let label = self
                    .trimmed(arg)
                    .unwrap_or_else(|| self.span(arg.text_range()));
                Ok(MathItem::new(
                    ItemKind::Tag {
                        starred: false,
                        label: Some(label),
                    },
                    Span::new(span.start, span.end.max(label.end)),
                ))
            }
            None => Err(ParseError::new("`\\tag` without an argument", span.start)),
        }
    }

    fn environment(&self, node: &SyntaxNode) -> Result<MathItem, ParseError> {
        let span = self
            .trimmed(node)
            .unwrap_or_else(|| self.span(node.text_range()));
        let name = EnvItem::cast(node.clone())
            .and_then(|env| env.name_tok())
            .map(|t| t.text().trim().to_string())
            .unwrap_or_default();

        let end = node
            .children()
            .find(|c| c.kind() == SyntaxKind::ItemEnd)
            .ok_or_else(|| ParseError::new(format!("`\\begin{{{}}}` is never closed", name), span.start))?;
        let end_text = end.text().to_string();
        if braced_name(&end_text) != Some(name.as_str()) {
            return Err(ParseError::new(
                format!("`\\begin{{{}}}` closed by `{}`", name, end_text.trim()),
                self.span(end.text_range()).start,
            ));
        }

        let mut body = Vec::new();
        for child in node.children_with_tokens() {
            match child.kind() {
                SyntaxKind::ItemBegin | SyntaxKind::ItemEnd | SyntaxKind::ClauseArgument => continue,
                _ => self.push(child, &mut body)?,
            }
        }
        Ok(MathItem::new(ItemKind::Environment { name, body }, span))
    }
}
