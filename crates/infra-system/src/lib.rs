// cnfsweep Infrastructure - System Adapters
// Implements: CorpusScanner, SolveAdapter

pub mod corpus_scanner;
pub mod solver;
pub mod subprocess_solver;

pub use corpus_scanner::FsCorpusScanner;
pub use solver::{WorkerReport, WorkerVerdict};
pub use subprocess_solver::{SubprocessSolver, WorkerCommand};
