//! Jupyter notebook layer
//!
//! Notebooks are kept as untyped JSON so that every field this crate does
//! not touch survives a read/write cycle. Only the `source` of Markdown
//! cells is rewritten.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::core::renumber::{RenumberOptions, TagRenumberer};
use crate::utils::error::{RenumberError, RenumberResult};
use crate::utils::report::RenumberReport;

const MARKDOWN_CELL: &str = "markdown";

/// A cell `source` in either of its on-disk shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellSource {
    Text(String),
    /// Lines that keep their trailing `\n`
    Lines(Vec<String>),
}

impl CellSource {
    fn from_value(value: &Value) -> RenumberResult<Self> {
        match value {
            Value::String(text) => Ok(CellSource::Text(text.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        RenumberError::invalid_input("cell source lines must be strings")
                    })
                })
                .collect::<RenumberResult<Vec<_>>>()
                .map(CellSource::Lines),
            _ => Err(RenumberError::invalid_input(
                "cell source must be a string or a list of strings",
            )),
        }
    }

    /// The full text of the cell
    pub fn text(&self) -> String {
        match self {
            CellSource::Text(text) => text.clone(),
            CellSource::Lines(lines) => lines.concat(),
        }
    }

    /// New source holding `text`, in the same shape as `self`
    pub fn with_text(&self, text: String) -> Self {
        match self {
            CellSource::Text(_) => CellSource::Text(text),
            CellSource::Lines(_) => {
                CellSource::Lines(text.split_inclusive('\n').map(str::to_string).collect())
            }
        }
    }

    fn into_value(self) -> Value {
        match self {
            CellSource::Text(text) => Value::String(text),
            CellSource::Lines(lines) => Value::Array(lines.into_iter().map(Value::String).collect()),
        }
    }
}

/// An in-memory notebook document
#[derive(Debug, Clone, PartialEq)]
pub struct Notebook {
    root: Map<String, Value>,
}

impl Notebook {
    pub fn from_json_str(json: &str) -> RenumberResult<Self> {
        match serde_json::from_str(json)? {
            Value::Object(root) => {
                if !root.get("cells").is_some_and(Value::is_array) {
                    return Err(RenumberError::invalid_input(
                        "notebook has no 'cells' array",
                    ));
                }
                Ok(Notebook { root })
            }
            _ => Err(RenumberError::invalid_input(
                "notebook JSON must be an object",
            )),
        }
    }

    pub fn read(path: impl AsRef<Path>) -> RenumberResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize with one-space indentation, sorted keys and a trailing
    /// newline
    pub fn to_json_string(&self) -> RenumberResult<String> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
        self.root.serialize(&mut ser)?;
        buf.push(b'\n');
        String::from_utf8(buf).map_err(|e| RenumberError::internal(e.to_string()))
    }

    pub fn write(&self, path: impl AsRef<Path>) -> RenumberResult<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    fn cells(&self) -> &[Value] {
        self.root
            .get("cells")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn cells_mut(&mut self) -> RenumberResult<&mut Vec<Value>> {
        self.root
            .get_mut("cells")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| RenumberError::invalid_input("notebook has no 'cells' array"))
    }

    pub fn cell_count(&self) -> usize {
        self.cells().len()
    }

    /// Indices of the Markdown cells, in notebook order
    pub fn markdown_cells(&self) -> Vec<usize> {
        self.cells()
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.get("cell_type").and_then(Value::as_str) == Some(MARKDOWN_CELL))
            .map(|(i, _)| i)
            .collect()
    }

    /// The source of cell `index`
    pub fn source(&self, index: usize) -> RenumberResult<CellSource> {
        let cell = self
            .cells()
            .get(index)
            .ok_or_else(|| RenumberError::invalid_input(format!("no cell {}", index)))?;
        match cell.get("source") {
            Some(value) => CellSource::from_value(value),
            None => Ok(CellSource::Text(String::new())),
        }
    }

    /// Replace the source of cell `index`
    pub fn set_source(&mut self, index: usize, source: CellSource) -> RenumberResult<()> {
        let cell = self
            .cells_mut()?
            .get_mut(index)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| RenumberError::invalid_input(format!("cell {} is not an object", index)))?;
        cell.insert("source".to_string(), source.into_value());
        Ok(())
    }
}

/// Renumber the Markdown cells of `notebook` as one document.
///
/// The tags pass runs over every Markdown cell in order, then the
/// reference pass over every Markdown cell, so references may point to
/// equations in earlier or later cells.
pub fn update_notebook(
    notebook: &mut Notebook,
    options: RenumberOptions,
) -> RenumberResult<RenumberReport> {
    let rewrite_refs = options.rewrite_refs;
    let mut renumberer = TagRenumberer::with_options(options);
    let cells = notebook.markdown_cells();

    for &index in &cells {
        let source = notebook.source(index)?;
        renumberer.set_unit(Some(format!("cell {}", index)));
        let text = renumberer.renumber_tags(&source.text())?;
        notebook.set_source(index, source.with_text(text))?;
    }
    renumberer.set_unit(None);

    if rewrite_refs {
        for &index in &cells {
            let source = notebook.source(index)?;
            let text = renumberer.renumber_refs(&source.text());
            notebook.set_source(index, source.with_text(text))?;
        }
    }

    tracing::debug!(
        cells = cells.len(),
        tags = renumberer.tags_assigned(),
        "notebook renumbered"
    );
    Ok(RenumberReport::from_session(cells.len(), &renumberer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NOTEBOOK: &str = r#"{
 "cells": [
  {"cell_type": "markdown", "metadata": {}, "source": "$$a \\tag{x}$$"},
  {"cell_type": "code", "metadata": {}, "outputs": [], "execution_count": null, "source": "print('$$b$$')"},
  {"cell_type": "markdown", "metadata": {}, "source": ["$$c$$\n", "\n", "See $(x)$."]}
 ],
 "metadata": {},
 "nbformat": 4,
 "nbformat_minor": 5
}"#;

    #[test]
    fn test_markdown_cells() {
        let notebook = Notebook::from_json_str(NOTEBOOK).unwrap();
        assert_eq!(notebook.cell_count(), 3);
        assert_eq!(notebook.markdown_cells(), vec![0, 2]);
    }

    #[test]
    fn test_missing_cells_rejected() {
        let err = Notebook::from_json_str(r#"{"metadata": {}}"#).unwrap_err();
        assert!(matches!(err, RenumberError::InvalidInput { .. }));
        let err = Notebook::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, RenumberError::InvalidInput { .. }));
        let err = Notebook::from_json_str("{").unwrap_err();
        assert!(matches!(err, RenumberError::InvalidInput { .. }));
    }

    #[test]
    fn test_source_shapes_preserved() {
        let source = CellSource::Lines(vec!["a\n".into(), "b".into()]);
        assert_eq!(source.text(), "a\nb");
        assert_eq!(
            source.with_text("x\ny\n".into()),
            CellSource::Lines(vec!["x\n".into(), "y\n".into()])
        );
        let source = CellSource::Text("a".into());
        assert_eq!(source.with_text("b\n".into()), CellSource::Text("b\n".into()));
    }

    #[test]
    fn test_update_notebook() {
        let mut notebook = Notebook::from_json_str(NOTEBOOK).unwrap();
        let report = update_notebook(&mut notebook, RenumberOptions::default()).unwrap();

        assert_eq!(report.cells, 2);
        assert_eq!(report.tags_assigned, 2);
        assert_eq!(
            notebook.source(0).unwrap(),
            CellSource::Text("$$a \\tag{1}$$".into())
        );
        assert_eq!(
            notebook.source(1).unwrap(),
            CellSource::Text("print('$$b$$')".into())
        );
        assert_eq!(
            notebook.source(2).unwrap(),
            CellSource::Lines(vec!["$$c\\tag{2}$$\n".into(), "\n".into(), "See $(1)$.".into()])
        );
    }

    #[test]
    fn test_update_notebook_without_refs() {
        let mut notebook = Notebook::from_json_str(NOTEBOOK).unwrap();
        let options = RenumberOptions {
            rewrite_refs: false,
            ..RenumberOptions::default()
        };
        update_notebook(&mut notebook, options).unwrap();
        assert_eq!(notebook.source(2).unwrap().text(), "$$c\\tag{2}$$\n\nSee $(x)$.");
    }

    #[test]
    fn test_warnings_carry_cell_index() {
        let json = r#"{"cells": [
            {"cell_type": "code", "source": ""},
            {"cell_type": "markdown", "source": "text\n\n$$ x } $$"}
        ]}"#;
        let mut notebook = Notebook::from_json_str(json).unwrap();
        let report = update_notebook(&mut notebook, RenumberOptions::default()).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].location.as_deref(), Some("cell 1, line 3"));
        assert_eq!(notebook.source(1).unwrap().text(), "text\n\n$$ x } $$");
    }

    #[test]
    fn test_output_format() {
        let notebook = Notebook::from_json_str(r#"{"nbformat": 4, "cells": [], "metadata": {"b": 1, "a": "é"}}"#).unwrap();
        assert_eq!(
            notebook.to_json_string().unwrap(),
            "{\n \"cells\": [],\n \"metadata\": {\n  \"a\": \"é\",\n  \"b\": 1\n },\n \"nbformat\": 4\n}\n"
        );
    }
}
