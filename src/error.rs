//! Error types for grid editing, playback, and planning.
//!
//! Every variant is recoverable: the editor shows the message and leaves the
//! grid and the sequencer exactly as they were.

use crate::types::{Cell, DirectedEdge};

/// Result type alias
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors produced by grid edits, route selection, planning, and import.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// A store or destination limit would be exceeded
    #[error("Cannot add more than {limit} {what}")]
    CapacityExceeded {
        /// Entity kind that hit its limit ("stores" or "destinations")
        what: &'static str,
        /// Configured maximum
        limit: usize,
    },

    /// A cost or cost tuple is outside the accepted range
    #[error("Invalid value: {0}")]
    InvalidRange(String),

    /// The edge carries a roadblock and its cost cannot be changed
    #[error("Cannot change cost for blocked road {0}. Remove the roadblock first.")]
    EdgeBlocked(DirectedEdge),

    /// A route index does not exist in the current route list
    #[error("Invalid route index: {index} (have {len} routes)")]
    InvalidIndex {
        /// Requested index
        index: usize,
        /// Number of routes available
        len: usize,
    },

    /// The planning service reported a failure or could not be reached
    #[error("{0}")]
    PlanningFailed(String),

    /// A grid or route file could not be understood
    #[error("Invalid grid file format: {0}")]
    ImportFormatError(String),

    /// A cell lies outside the current grid
    #[error("Cell {cell} is outside the grid")]
    OutOfBounds {
        /// Offending cell
        cell: Cell,
    },

    /// The cell already holds an entity that excludes the requested one
    #[error("Cell {cell} is already occupied")]
    CellOccupied {
        /// Offending cell
        cell: Cell,
    },
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::ImportFormatError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    #[test]
    fn test_messages_are_user_readable() {
        let err = GridError::CapacityExceeded {
            what: "stores",
            limit: 3,
        };
        assert_eq!(err.to_string(), "Cannot add more than 3 stores");

        let edge = DirectedEdge::new(Cell::new(2, 4), Direction::Right);
        let err = GridError::EdgeBlocked(edge);
        assert!(err.to_string().contains("(2,4) right"));
    }

    #[test]
    fn test_serde_errors_become_import_errors() {
        let err: GridError = serde_json::from_str::<u8>("not json").unwrap_err().into();
        assert!(matches!(err, GridError::ImportFormatError(_)));
    }
}
