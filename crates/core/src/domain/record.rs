// Result Record Domain Model

use serde::{Deserialize, Serialize};

/// Unique key for one unit of work (a formula path, compared verbatim)
pub type InputIdentifier = String;

/// Ordered set of identifiers selected for one run
pub type WorkSet = Vec<InputIdentifier>;

/// One row of the result table
///
/// `sat` is the ternary verdict: `Some(true)` satisfiable, `Some(false)`
/// unsatisfiable, `None` unknown (timeout, failure, or inconclusive solve).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub seconds: f64,
    pub sat: Option<bool>,
    pub nof_vars: Option<u64>,
    pub nof_clauses: Option<u64>,
}

impl ResultRecord {
    pub fn new(seconds: f64, sat: Option<bool>, nof_vars: u64, nof_clauses: u64) -> Self {
        Self {
            seconds,
            sat,
            nof_vars: Some(nof_vars),
            nof_clauses: Some(nof_clauses),
        }
    }

    /// Conservative record written when an item is dispatched.
    ///
    /// Claims the full budget was spent without a verdict; overwritten only
    /// when the solver completes.
    pub fn placeholder(timeout_seconds: f64) -> Self {
        Self {
            seconds: timeout_seconds,
            sat: None,
            nof_vars: None,
            nof_clauses: None,
        }
    }

    /// Record for an execution abandoned by shutdown after `elapsed_seconds`
    pub fn interrupted(elapsed_seconds: f64) -> Self {
        Self::placeholder(elapsed_seconds)
    }

    /// True if the record carries a definitive verdict
    pub fn is_resolved(&self) -> bool {
        self.sat.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_unresolved() {
        let record = ResultRecord::placeholder(60.0);
        assert_eq!(record.seconds, 60.0);
        assert!(!record.is_resolved());
        assert!(record.nof_vars.is_none());
        assert!(record.nof_clauses.is_none());
    }

    #[test]
    fn test_negative_verdict_is_resolved() {
        let record = ResultRecord::new(0.5, Some(false), 20, 91);
        assert!(record.is_resolved());
        assert_eq!(record.nof_vars, Some(20));
    }

    #[test]
    fn test_inconclusive_solve_is_unresolved() {
        let record = ResultRecord::new(3.0, None, 250, 1065);
        assert!(!record.is_resolved());
    }
}
