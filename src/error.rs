use crate::types::Relationship;
use thiserror::Error;

/// Errors raised by write paths of the lineage store.
///
/// Read paths never fail on a miss; they return `None` or an empty list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineageError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl LineageError {
    pub fn invalid_node_type(name: &str) -> Self {
        Self::InvalidArgument(format!("Invalid node type: {}", name))
    }

    pub fn invalid_relationship_type(name: &str) -> Self {
        Self::InvalidArgument(format!("Invalid relationship type: {}", name))
    }

    pub fn node_not_found(id: &str) -> Self {
        Self::NotFound(format!("node {}", id))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// A lineage chain that stopped part way through.
///
/// Edges are created one at a time; `created` holds the ones that made it
/// into the store before `source` was hit. They are not rolled back.
#[derive(Debug, Clone, Error)]
#[error("lineage chain interrupted after {} relationship(s): {source}", .created.len())]
pub struct ChainError {
    pub created: Vec<Relationship>,
    #[source]
    pub source: LineageError,
}

pub type Result<T> = std::result::Result<T, LineageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert!(LineageError::invalid_node_type("Ghost").is_invalid_argument());
        assert!(LineageError::node_not_found("Scroll-1").is_not_found());
        assert!(!LineageError::node_not_found("Scroll-1").is_invalid_argument());
    }

    #[test]
    fn test_error_messages() {
        let err = LineageError::invalid_relationship_type("NOT_A_TYPE");
        assert_eq!(err.to_string(), "invalid argument: Invalid relationship type: NOT_A_TYPE");

        let chain = ChainError {
            created: Vec::new(),
            source: LineageError::node_not_found("missing"),
        };
        assert_eq!(
            chain.to_string(),
            "lineage chain interrupted after 0 relationship(s): not found: node missing"
        );
    }
}
