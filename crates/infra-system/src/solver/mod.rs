// Built-in worker: DIMACS parsing, DPLL search, and the worker report protocol
//
// A worker process prints one JSON report line on stdout and signals the
// verdict through its exit code (10 SAT, 20 UNSAT, 0 inconclusive).

pub mod dimacs;
pub mod dpll;

use cnfsweep_core::application::worker::constants::{
    EXIT_SATISFIABLE, EXIT_UNKNOWN, EXIT_UNSATISFIABLE,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

pub use dimacs::{DimacsError, Formula};

/// Verdict of one solve, carried by the worker's exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerVerdict {
    Satisfiable,
    Unsatisfiable,
    Unknown,
}

impl WorkerVerdict {
    pub fn exit_code(self) -> i32 {
        match self {
            WorkerVerdict::Satisfiable => EXIT_SATISFIABLE,
            WorkerVerdict::Unsatisfiable => EXIT_UNSATISFIABLE,
            WorkerVerdict::Unknown => EXIT_UNKNOWN,
        }
    }

    pub fn from_exit_code(code: i32) -> Option<Self> {
        match code {
            EXIT_SATISFIABLE => Some(WorkerVerdict::Satisfiable),
            EXIT_UNSATISFIABLE => Some(WorkerVerdict::Unsatisfiable),
            EXIT_UNKNOWN => Some(WorkerVerdict::Unknown),
            _ => None,
        }
    }

    pub fn as_sat(self) -> Option<bool> {
        match self {
            WorkerVerdict::Satisfiable => Some(true),
            WorkerVerdict::Unsatisfiable => Some(false),
            WorkerVerdict::Unknown => None,
        }
    }
}

impl From<Option<bool>> for WorkerVerdict {
    fn from(sat: Option<bool>) -> Self {
        match sat {
            Some(true) => WorkerVerdict::Satisfiable,
            Some(false) => WorkerVerdict::Unsatisfiable,
            None => WorkerVerdict::Unknown,
        }
    }
}

/// JSON line a worker prints on stdout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerReport {
    /// Solve time, excluding parsing
    pub seconds: f64,
    pub nof_vars: u64,
    pub nof_clauses: u64,
}

impl WorkerReport {
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"seconds":{},"nof_vars":{},"nof_clauses":{}}}"#,
                self.seconds, self.nof_vars, self.nof_clauses
            )
        })
    }

    /// Report from the last non-empty stdout line, if it is one
    pub fn from_stdout(stdout: &str) -> Option<Self> {
        let line = stdout.lines().rev().find(|l| !l.trim().is_empty())?;
        serde_json::from_str::<WorkerReport>(line.trim())
            .ok()
            .filter(|r| r.seconds.is_finite() && r.seconds >= 0.0)
    }
}

/// Parse and solve one formula file in-process
///
/// This is what `cnfsweep solve <file>` runs inside the worker process.
pub fn solve_file(
    path: &Path,
    max_decisions: Option<u64>,
) -> Result<(WorkerVerdict, WorkerReport), DimacsError> {
    let formula = dimacs::parse_file(path)?;

    let started = Instant::now();
    let sat = dpll::solve(&formula, max_decisions);
    let seconds = started.elapsed().as_secs_f64();

    Ok((
        WorkerVerdict::from(sat),
        WorkerReport {
            seconds,
            nof_vars: formula.nof_vars,
            nof_clauses: formula.nof_clauses(),
        },
    ))
}
