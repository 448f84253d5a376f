//! Error types for the CO2 network planning pipeline.
//!
//! [`PlannerError`] enumerates exactly the fatal error kinds the pipeline
//! can raise (Section 7 of the design). Propagation policy: the pipeline
//! aborts on the first fatal error; validation/clamping issues are
//! recorded as [`crate::diagnostics::Diagnostics`] warnings instead and
//! never appear here.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the planning pipeline.
#[derive(Error, Debug)]
pub enum PlannerError {
    /// A lat/lon falls outside the loaded raster's bounding box.
    #[error("({lat}, {lon}) is outside the loaded grid extent")]
    OutOfExtent { lat: f64, lon: f64 },

    /// Dijkstra found no finite-cost path between two required cells.
    #[error("no finite-cost path from cell {from} to cell {to}")]
    Unreachable { from: u64, to: u64 },

    /// A malformed header or data row was encountered at load time.
    #[error("malformed input: {0}")]
    BadInput(String),

    /// The MILP has no feasible solution for the given target. The
    /// irreducible inconsistent subsystem, if the solver could produce
    /// one, is persisted at `artifact_path`.
    #[error("MILP is infeasible for the requested capture target (artifact: {artifact_path:?})")]
    Infeasible { artifact_path: Option<PathBuf> },

    /// The MILP is infeasible or unbounded and the solver could not
    /// disambiguate which (typically after a `DualReductions=0` retry).
    #[error("MILP is infeasible or unbounded (artifact: {artifact_path:?})")]
    InfOrUnbd { artifact_path: Option<PathBuf> },

    /// Every configured MILP backend failed to run (not installed,
    /// crashed, or timed out).
    #[error("no MILP solver backend available; tried: {tried:?}")]
    SolverUnavailable { tried: Vec<String> },

    /// I/O errors (file access).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors outside the structured `BadInput`
    /// cases (e.g. malformed JSON export requests).
    #[error("parse error: {0}")]
    Parse(String),
}

/// Convenience type alias for Results using [`PlannerError`].
pub type PlannerResult<T> = Result<T, PlannerError>;

impl From<serde_json::Error> for PlannerError {
    fn from(err: serde_json::Error) -> Self {
        PlannerError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlannerError::Unreachable { from: 1, to: 99 };
        assert!(err.to_string().contains("no finite-cost path"));
    }

    #[test]
    fn test_out_of_extent_display() {
        let err = PlannerError::OutOfExtent {
            lat: 91.0,
            lon: 0.0,
        };
        assert!(err.to_string().contains("91"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let planner_err: PlannerError = io_err.into();
        assert!(matches!(planner_err, PlannerError::Io(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn example_fn() -> PlannerResult<i32> {
            Ok(42)
        }
        assert_eq!(example_fn().unwrap(), 42);
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> PlannerResult<()> {
            Err(PlannerError::BadInput("missing ncols".into()))
        }

        fn outer() -> PlannerResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
