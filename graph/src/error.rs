use std::ops::Range;
use std::path::PathBuf;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use serde_json::error::Category;
use thiserror::Error;

/// Failures while decoding a serialized graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The input is not well-formed JSON.
    #[error("invalid JSON at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
        span: Range<usize>,
        file_id: usize,
    },
    /// Well-formed JSON that does not describe a block graph, e.g. a block
    /// without a `type` or a slot without a `name`.
    #[error("malformed graph at line {line}, column {column}: {message}")]
    Shape {
        message: String,
        line: usize,
        column: usize,
        span: Range<usize>,
        file_id: usize,
    },
    #[error("cannot read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GraphError {
    pub(crate) fn from_json(error: serde_json::Error, source: &str, file_id: usize) -> Self {
        let line = error.line();
        let column = error.column();
        let offset = byte_offset(source, line, column);
        let span = offset..(offset + 1).min(source.len()).max(offset);
        // serde_json appends " at line L column C" to its Display output.
        let message = error.to_string();
        let message = match message.rfind(" at line ") {
            Some(idx) => message[..idx].to_string(),
            None => message,
        };
        match error.classify() {
            Category::Data => GraphError::Shape {
                message,
                line,
                column,
                span,
                file_id,
            },
            Category::Syntax | Category::Eof | Category::Io => GraphError::Syntax {
                message,
                line,
                column,
                span,
                file_id,
            },
        }
    }

    /// Convert to a codespan-reporting Diagnostic when the error has a position.
    pub fn to_diagnostic(&self) -> Option<Diagnostic<usize>> {
        match self {
            GraphError::Syntax {
                message,
                span,
                file_id,
                ..
            }
            | GraphError::Shape {
                message,
                span,
                file_id,
                ..
            } => Some(
                Diagnostic::error()
                    .with_message(message)
                    .with_labels(vec![Label::primary(*file_id, span.clone())]),
            ),
            GraphError::Io { .. } => None,
        }
    }
}

/// Convert a 1-based line/column pair into a byte offset into `source`.
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len())
}
