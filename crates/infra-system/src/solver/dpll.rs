// DPLL solver with two-watched-literal unit propagation
//
// Chronological backtracking, no clause learning. Good enough to solve small
// benchmark formulas and to exercise timeouts on hard ones.

use super::dimacs::{Formula, Literal};

const UNASSIGNED: i8 = 0;
const TRUE: i8 = 1;
const FALSE: i8 = -1;

fn var_of(lit: Literal) -> usize {
    lit.unsigned_abs() as usize
}

// Watch-list slot of a literal
fn slot(lit: Literal) -> usize {
    2 * var_of(lit) + usize::from(lit < 0)
}

fn value_of(values: &[i8], lit: Literal) -> i8 {
    let v = values[var_of(lit)];
    if lit < 0 {
        -v
    } else {
        v
    }
}

/// One decision level: trail length before the decision, the decision
/// literal, and whether it is already the flipped branch
struct Level {
    trail_len: usize,
    lit: Literal,
    flipped: bool,
}

pub struct Dpll {
    clauses: Vec<Vec<Literal>>,
    units: Vec<Literal>,
    watches: Vec<Vec<usize>>,
    values: Vec<i8>,
    /// Preferred first polarity per variable; `None` if the variable occurs nowhere
    polarity: Vec<Option<bool>>,
    trail: Vec<Literal>,
    qhead: usize,
    levels: Vec<Level>,
    decisions: u64,
    has_empty_clause: bool,
}

impl Dpll {
    pub fn new(formula: &Formula) -> Self {
        let nof_vars = formula.nof_vars as usize;
        let mut counts = vec![(0u32, 0u32); nof_vars + 1];
        let mut clauses = Vec::with_capacity(formula.clauses.len());
        let mut units = Vec::new();
        let mut has_empty_clause = false;

        for raw in &formula.clauses {
            let mut clause = raw.clone();
            clause.sort_unstable();
            clause.dedup();
            if clause.iter().any(|&l| clause.binary_search(&-l).is_ok()) {
                continue; // tautology
            }
            for &lit in &clause {
                let entry = &mut counts[var_of(lit)];
                if lit > 0 {
                    entry.0 += 1;
                } else {
                    entry.1 += 1;
                }
            }
            match clause.len() {
                0 => has_empty_clause = true,
                1 => units.push(clause[0]),
                _ => clauses.push(clause),
            }
        }

        let mut watches = vec![Vec::new(); 2 * (nof_vars + 1)];
        for (ci, clause) in clauses.iter().enumerate() {
            watches[slot(clause[0])].push(ci);
            watches[slot(clause[1])].push(ci);
        }

        let polarity = counts
            .iter()
            .map(|&(pos, neg)| (pos + neg > 0).then_some(pos >= neg))
            .collect();

        Self {
            clauses,
            units,
            watches,
            values: vec![UNASSIGNED; nof_vars + 1],
            polarity,
            trail: Vec::new(),
            qhead: 0,
            levels: Vec::new(),
            decisions: 0,
            has_empty_clause,
        }
    }

    /// Number of branching decisions made so far
    pub fn decisions(&self) -> u64 {
        self.decisions
    }

    /// Decide satisfiability
    ///
    /// Returns `None` when `max_decisions` is reached before a verdict.
    pub fn solve(&mut self, max_decisions: Option<u64>) -> Option<bool> {
        if self.has_empty_clause {
            return Some(false);
        }
        for lit in std::mem::take(&mut self.units) {
            match value_of(&self.values, lit) {
                FALSE => return Some(false),
                UNASSIGNED => self.assign(lit),
                _ => {}
            }
        }

        loop {
            while !self.propagate() {
                if !self.backtrack() {
                    return Some(false);
                }
            }

            let Some(lit) = self.pick_branch() else {
                return Some(true);
            };
            if max_decisions.is_some_and(|max| self.decisions >= max) {
                return None;
            }
            self.decisions += 1;
            self.levels.push(Level {
                trail_len: self.trail.len(),
                lit,
                flipped: false,
            });
            self.assign(lit);
        }
    }

    /// Current assignment, indexed by variable (index 0 unused)
    pub fn model(&self) -> Vec<bool> {
        self.values.iter().map(|&v| v == TRUE).collect()
    }

    fn assign(&mut self, lit: Literal) {
        self.values[var_of(lit)] = if lit > 0 { TRUE } else { FALSE };
        self.trail.push(lit);
    }

    /// Propagate queued assignments; false on conflict
    fn propagate(&mut self) -> bool {
        while self.qhead < self.trail.len() {
            let false_lit = -self.trail[self.qhead];
            self.qhead += 1;

            let mut watching = std::mem::take(&mut self.watches[slot(false_lit)]);
            let mut conflict = false;
            let mut i = 0;

            while i < watching.len() {
                let ci = watching[i];
                let clause = &mut self.clauses[ci];
                if clause[0] == false_lit {
                    clause.swap(0, 1);
                }

                if value_of(&self.values, clause[0]) == TRUE {
                    i += 1;
                    continue;
                }

                let replacement =
                    (2..clause.len()).find(|&k| value_of(&self.values, clause[k]) != FALSE);
                if let Some(k) = replacement {
                    clause.swap(1, k);
                    self.watches[slot(clause[1])].push(ci);
                    watching.swap_remove(i);
                    continue;
                }

                let other = clause[0];
                if value_of(&self.values, other) == FALSE {
                    conflict = true;
                    break;
                }
                self.values[var_of(other)] = if other > 0 { TRUE } else { FALSE };
                self.trail.push(other);
                i += 1;
            }

            self.watches[slot(false_lit)] = watching;
            if conflict {
                return false;
            }
        }
        true
    }

    /// Undo to the most recent untried branch and take it; false if none is left
    fn backtrack(&mut self) -> bool {
        while let Some(level) = self.levels.pop() {
            for lit in self.trail.drain(level.trail_len..) {
                self.values[var_of(lit)] = UNASSIGNED;
            }
            self.qhead = level.trail_len;

            if !level.flipped {
                self.levels.push(Level {
                    trail_len: level.trail_len,
                    lit: -level.lit,
                    flipped: true,
                });
                self.assign(-level.lit);
                return true;
            }
        }
        false
    }

    fn pick_branch(&self) -> Option<Literal> {
        self.polarity
            .iter()
            .enumerate()
            .skip(1)
            .find_map(|(var, polarity)| match polarity {
                Some(positive) if self.values[var] == UNASSIGNED => {
                    let lit = var as Literal;
                    Some(if *positive { lit } else { -lit })
                }
                _ => None,
            })
    }
}

/// Solve `formula`, giving up after `max_decisions` branching decisions
pub fn solve(formula: &Formula, max_decisions: Option<u64>) -> Option<bool> {
    Dpll::new(formula).solve(max_decisions)
}
