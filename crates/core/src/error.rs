//! Error types for the Lexigrade domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Grading itself is
//! total and never fails; errors here cover malformed requests and
//! serialization at the crate boundary.

use thiserror::Error;

/// The top-level error type for core operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Request errors ---
    #[error("Duplicate question id {id} in answer key (positions {first} and {second})")]
    DuplicateQuestionId { id: i64, first: usize, second: usize },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_id_displays_positions() {
        let err = Error::DuplicateQuestionId {
            id: 7,
            first: 0,
            second: 3,
        };
        let text = err.to_string();
        assert!(text.contains("7"));
        assert!(text.contains("positions 0 and 3"));
    }

    #[test]
    fn serde_errors_convert() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(err.to_string().starts_with("Serialization error"));
    }
}
