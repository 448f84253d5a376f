//! Common types for invoking external MILP solvers.
//!
//! The network planner treats its solver as an external collaborator:
//! problems are written to a standard MPS file, a solver binary is
//! spawned against that file, and its solution file is parsed back.
//! This crate owns that boundary so `co2net-algo` never has to know
//! whether the solver in question is a subprocess, a vendored binary,
//! or (eventually) a native in-process backend.
//!
//! ```text
//! co2net-algo ──writes──> problem.mps
//!             ──spawns──> highs problem.mps --solution solution.sol
//!             <─reads──── solution.sol
//! ```
//!
//! # Supported Solvers
//!
//! | Solver | Problem Type | Reference |
//! |--------|--------------|-----------|
//! | HiGHS  | LP/MIP | Huangfu & Hall (2018) doi:[10.1007/s12532-017-0130-5] |
//! | CBC    | MIP | COIN-OR Branch & Cut |
//! | SYMPHONY | MIP | Ralphs & Güzelsoy (2005) |
//!
//! [10.1007/s12532-017-0130-5]: https://doi.org/10.1007/s12532-017-0130-5

pub mod error;
pub mod subprocess;

pub use error::{ExitCode, SolverError, SolverResult};
pub use subprocess::SolverProcess;

/// An external MILP solver binary that speaks MPS in, solution-file out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverId {
    /// HiGHS - high-performance LP/MIP solver.
    ///
    /// **Algorithm:** Dual revised simplex (LP); branch-and-cut (MIP)
    /// **Reference:** Huangfu, Q., & Hall, J. A. J. (2018). Parallelizing the dual
    /// revised simplex method. *Mathematical Programming Computation*, 10(1), 119-142.
    Highs,

    /// CBC - COIN-OR Branch and Cut for MIP.
    Cbc,

    /// SYMPHONY - COIN-OR parallel MIP solver, used as a last-resort fallback.
    Symphony,
}

impl SolverId {
    /// Binary name to search for on PATH.
    pub fn binary_name(&self) -> &'static str {
        match self {
            SolverId::Highs => "highs",
            SolverId::Cbc => "cbc",
            SolverId::Symphony => "symphony",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SolverId::Highs => "HiGHS",
            SolverId::Cbc => "CBC",
            SolverId::Symphony => "SYMPHONY",
        }
    }

    /// All solvers, in the order they should be tried as fallbacks.
    pub fn fallback_order() -> &'static [SolverId] {
        &[SolverId::Highs, SolverId::Cbc, SolverId::Symphony]
    }
}

impl std::fmt::Display for SolverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for SolverId {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "highs" => Ok(SolverId::Highs),
            "cbc" => Ok(SolverId::Cbc),
            "symphony" => Ok(SolverId::Symphony),
            _ => Err(SolverError::UnknownSolver(s.to_string())),
        }
    }
}

/// Status of a completed solve, mirroring the MILP status codes the
/// planner cares about (see `co2net-algo::milp::SolveStatus`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionStatus {
    Optimal,
    Infeasible,
    InfOrUnbd,
    Timeout,
    Error,
}

impl SolutionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, SolutionStatus::Optimal)
    }
}

/// Parsed variable values from a solver's solution file, keyed by
/// the MPS column name used when the problem was written.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SolutionBatch {
    pub status: Option<SolutionStatus>,
    pub objective: f64,
    pub values: std::collections::HashMap<String, f64>,
    pub solve_time_ms: i64,
}
