//! Error types and exit codes for solver subprocess communication.

use thiserror::Error;

/// Exit codes for solver subprocess communication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success (check status in solution for optimality).
    Success = 0,
    /// Invalid input (malformed MPS, missing sections).
    InvalidInput = 1,
    /// Solver error (license, numerical issues).
    SolverError = 2,
    /// Timeout.
    Timeout = 3,
    /// Segfault (SIGSEGV) - native crash.
    Segfault = 139,
}

impl ExitCode {
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => ExitCode::Success,
            1 => ExitCode::InvalidInput,
            2 => ExitCode::SolverError,
            3 => ExitCode::Timeout,
            139 => ExitCode::Segfault,
            _ => ExitCode::SolverError,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }
}

/// Errors that can occur while invoking an external solver.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Unknown solver: {0}")]
    UnknownSolver(String),

    #[error("Solver {solver} is not installed; expected binary `{hint}` on PATH")]
    NotInstalled {
        solver: crate::SolverId,
        hint: String,
    },

    /// No solver available after exhausting every fallback in
    /// [`crate::SolverId::fallback_order`].
    #[error("No MILP solver available: {hint}")]
    NoSolverAvailable { hint: String },

    #[error("Failed to start solver process: {0}")]
    ProcessStart(#[source] std::io::Error),

    #[error("Solver process failed with exit code {exit_code:?}: {message}")]
    ProcessFailed {
        exit_code: ExitCode,
        message: String,
    },

    #[error("Solver timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Malformed solution file: {0}")]
    SolutionParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;
