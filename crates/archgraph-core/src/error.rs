use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchGraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Two elements resolved to the same qualified path. Aborts a build.
    #[error("Duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// More than one element carries this short ID; the caller should qualify it further.
    #[error("Ambiguous short ID '{short_id}' matches {}", candidates.join(", "))]
    AmbiguousShortId {
        short_id: String,
        candidates: Vec<String>,
    },

    #[error("Short ID not found: {0}")]
    ShortIdNotFound(String),

    #[error("Diagram parse error at line {line}: {message}")]
    DiagramParse { line: usize, message: String },
}

impl ArchGraphError {
    /// Resolution failures that a caller can recover from by qualifying the reference.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ArchGraphError::AmbiguousShortId { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ArchGraphError::ShortIdNotFound(_) | ArchGraphError::UnknownNode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ArchGraphError>;
