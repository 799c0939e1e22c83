pub mod entry;
pub mod error;

use std::path::Path;

use serde::Deserialize;

pub use entry::{BlockEntry, SerializedGraph, SlotEntry, VariableDeclaration};
pub use error::GraphError;

/// Loader entry point for serialized block graphs.
pub struct GraphParser {
    source: String,
    file_id: usize,
}

impl GraphParser {
    pub fn new(source: String, file_id: usize) -> Self {
        GraphParser { source, file_id }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Decode the JSON source into its raw graph form.
    ///
    /// Every `next` link nests one object deeper, so the default nesting
    /// limit would cap statement sequences at about a hundred blocks. The
    /// limit is lifted and the stack grows on the heap instead.
    pub fn parse(&self) -> Result<SerializedGraph, GraphError> {
        let to_error = |e: serde_json::Error| GraphError::from_json(e, &self.source, self.file_id);
        let mut deserializer = serde_json::Deserializer::from_str(&self.source);
        deserializer.disable_recursion_limit();
        let graph = SerializedGraph::deserialize(serde_stacker::Deserializer::new(
            &mut deserializer,
        ))
        .map_err(to_error)?;
        deserializer.end().map_err(to_error)?;
        Ok(graph)
    }
}

/// Decode a JSON string into a `SerializedGraph`.
pub fn load_from_json(json: &str) -> Result<SerializedGraph, GraphError> {
    GraphParser::new(json.to_string(), 0).parse()
}

/// Read and decode a program file.
pub fn load_from_path(path: &Path) -> Result<SerializedGraph, GraphError> {
    let source = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_json(&source)
}
