// Worker constants (no magic values)

/// Default number of concurrent worker processes
pub const DEFAULT_NUM_WORKERS: usize = 4;

/// Default per-item wall-clock budget (seconds)
pub const DEFAULT_TIMEOUT_SECONDS: f64 = 60.0;

/// Default checkpoint file, relative to the working directory
pub const DEFAULT_CHECKPOINT_FILE: &str = "cnf.csv";

/// Filename suffix matched by the corpus scanner
pub const DEFAULT_FORMULA_SUFFIX: &str = ".cnf";

/// Exit code convention for SAT solvers: formula is satisfiable
pub const EXIT_SATISFIABLE: i32 = 10;

/// Exit code convention for SAT solvers: formula is unsatisfiable
pub const EXIT_UNSATISFIABLE: i32 = 20;

/// Exit code for an inconclusive solve (limit reached, no verdict)
pub const EXIT_UNKNOWN: i32 = 0;

/// Environment variables passed through to worker processes
pub const WORKER_ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "USER", "LD_LIBRARY_PATH"];
