// DIMACS CNF parser

use std::path::Path;
use thiserror::Error;

/// Literal: a non-zero variable index, negative when negated
pub type Literal = i32;

#[derive(Error, Debug)]
pub enum DimacsError {
    #[error("cannot read formula: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: invalid problem line '{content}'")]
    InvalidHeader { line: usize, content: String },

    #[error("line {line}: invalid literal '{token}'")]
    InvalidLiteral { line: usize, token: String },
}

/// Parsed CNF formula
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formula {
    /// Larger of the declared variable count and the largest variable used
    pub nof_vars: u64,
    pub clauses: Vec<Vec<Literal>>,
}

impl Formula {
    pub fn nof_clauses(&self) -> u64 {
        self.clauses.len() as u64
    }
}

/// Parse DIMACS text
///
/// Accepts `c` comment lines, an optional `p cnf <vars> <clauses>` header,
/// clauses spanning several lines, and a `%` line ending the formula (as in
/// the SATLIB benchmark files). A final clause missing its `0` is kept.
pub fn parse(input: &str) -> Result<Formula, DimacsError> {
    let mut declared_vars: u64 = 0;
    let mut max_var: u64 = 0;
    let mut clauses = Vec::new();
    let mut current: Vec<Literal> = Vec::new();

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('c') {
            continue;
        }
        if line.starts_with('%') {
            break;
        }
        if line.starts_with('p') {
            declared_vars = parse_header(line).ok_or_else(|| DimacsError::InvalidHeader {
                line: line_no,
                content: line.to_string(),
            })?;
            continue;
        }

        for token in line.split_whitespace() {
            // i32::MIN has no negation
            let lit: Literal = token
                .parse()
                .ok()
                .filter(|lit| *lit != Literal::MIN)
                .ok_or_else(|| DimacsError::InvalidLiteral {
                    line: line_no,
                    token: token.to_string(),
                })?;
            if lit == 0 {
                clauses.push(std::mem::take(&mut current));
            } else {
                max_var = max_var.max(u64::from(lit.unsigned_abs()));
                current.push(lit);
            }
        }
    }

    if !current.is_empty() {
        clauses.push(current);
    }

    Ok(Formula {
        nof_vars: declared_vars.max(max_var),
        clauses,
    })
}

/// Read and parse a DIMACS file
pub fn parse_file(path: &Path) -> Result<Formula, DimacsError> {
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}

// `p cnf <vars> <clauses>`; returns the declared variable count
fn parse_header(line: &str) -> Option<u64> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "p" || parts.next()? != "cnf" {
        return None;
    }
    let vars = parts.next()?.parse::<u64>().ok()?;
    parts.next()?.parse::<u64>().ok()?;
    Some(vars)
}
