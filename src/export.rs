//! Export of a frozen notebook: JSON documents and per-kind summaries.

use std::fmt;

use serde::Serialize;

use crate::notebook::Notebook;
use crate::sketch::SketchKind;

/// Serialize a notebook as JSON, sketches in insertion order.
pub fn to_json(notebook: &Notebook, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(notebook)
    } else {
        serde_json::to_string(notebook)
    }
}

/// Number of sketches of each kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotebookSummary {
    pub counts: Vec<(SketchKind, usize)>,
    pub total: usize,
}

impl NotebookSummary {
    pub fn count(&self, kind: SketchKind) -> usize {
        self.counts
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, n)| *n)
    }
}

impl fmt::Display for NotebookSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, count) in &self.counts {
            writeln!(f, "{kind:<18} {count:>5}")?;
        }
        write!(f, "{:<18} {:>5}", "total", self.total)
    }
}

/// Count the sketches of a notebook by kind. Every kind is listed, zeros included.
pub fn summary(notebook: &Notebook) -> NotebookSummary {
    let counts = SketchKind::ALL
        .iter()
        .map(|&kind| (kind, notebook.get_all(kind).count()))
        .collect();
    NotebookSummary {
        counts,
        total: notebook.len(),
    }
}
