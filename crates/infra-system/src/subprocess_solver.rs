// Subprocess SolveAdapter implementation
// One isolated worker process per formula; the whole process group is
// SIGKILLed if the solve is abandoned (timeout or interruption)

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::process::Command;
use tracing::debug;

use crate::solver::{dimacs, WorkerReport, WorkerVerdict};
use cnfsweep_core::application::worker::constants::WORKER_ENV_ALLOWLIST;
use cnfsweep_core::domain::InputIdentifier;
use cnfsweep_core::port::{SolveAdapter, SolveError, SolveReport, TimeProvider};

/// Worker program and leading arguments; the formula path is appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// Kills the worker's process group when dropped while still armed
struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        let Some(pgid) = self.pgid else {
            return;
        };

        #[cfg(unix)]
        {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            // ESRCH just means the group is already gone
            match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
                Ok(()) => debug!(pgid, "Worker process group killed"),
                Err(e) => debug!(pgid, error = %e, "Worker process group not killed"),
            }
        }

        #[cfg(not(unix))]
        debug!(pgid, "Worker abandoned; relying on kill_on_drop");
    }
}

/// Subprocess solver
/// Spawns `<program> <args...> <identifier>` with an allowlisted environment
pub struct SubprocessSolver {
    command: WorkerCommand,
    time_provider: Arc<dyn TimeProvider>,
    env_allowlist: Vec<String>,
}

impl SubprocessSolver {
    /// Create a new subprocess solver
    ///
    /// # Arguments
    /// * `command` - Worker program; the identifier is passed as its last argument
    /// * `time_provider` - Clock for wall-clock fallback timing
    /// * `env_allowlist` - Environment variables passed through to the worker
    pub fn new(
        command: WorkerCommand,
        time_provider: Arc<dyn TimeProvider>,
        env_allowlist: Vec<String>,
    ) -> Self {
        Self {
            command,
            time_provider,
            env_allowlist,
        }
    }

    /// Solver with the default environment allowlist
    pub fn with_default_env(command: WorkerCommand, time_provider: Arc<dyn TimeProvider>) -> Self {
        let allowlist = WORKER_ENV_ALLOWLIST.iter().map(|v| v.to_string()).collect();
        Self::new(command, time_provider, allowlist)
    }

    pub fn command(&self) -> &WorkerCommand {
        &self.command
    }

    /// Keep only allowlisted variables
    fn filter_env<I>(&self, vars: I) -> Vec<(OsString, OsString)>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        vars.into_iter()
            .filter(|(k, _)| {
                k.to_str()
                    .is_some_and(|k| self.env_allowlist.iter().any(|allowed| allowed == k))
            })
            .collect()
    }

    fn build_command(&self, id: &InputIdentifier) -> Command {
        let mut std_cmd = std::process::Command::new(&self.command.program);
        std_cmd
            .args(&self.command.args)
            .arg(id)
            .env_clear()
            .envs(self.filter_env(std::env::vars_os()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so a kill reaches the worker's children too
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }

        let mut cmd = Command::from(std_cmd);
        cmd.kill_on_drop(true);
        cmd
    }

    /// Spawn the worker and wait for it; dropping this future kills it
    async fn spawn_and_wait(
        &self,
        id: &InputIdentifier,
    ) -> Result<std::process::Output, SolveError> {
        let child = self.build_command(id).spawn().map_err(|e| {
            SolveError::SpawnFailed(format!("{}: {}", self.command.program.display(), e))
        })?;

        let mut guard = ProcessGroupGuard { pgid: child.id() };
        debug!(identifier = %id, pid = ?child.id(), "Worker spawned");

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SolveError::Io(e.to_string()))?;

        guard.disarm();
        Ok(output)
    }

    /// Turn worker output into a report
    async fn interpret(
        &self,
        id: &InputIdentifier,
        output: std::process::Output,
        wall_seconds: f64,
    ) -> Result<SolveReport, SolveError> {
        let verdict = verdict_of(output.status).ok_or_else(|| {
            SolveError::Crashed(format!(
                "{}{}",
                describe_status(output.status),
                stderr_tail(&output.stderr)
            ))
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(report) = WorkerReport::from_stdout(&stdout) {
            return Ok(SolveReport {
                seconds: report.seconds,
                sat: verdict.as_sat(),
                nof_vars: report.nof_vars,
                nof_clauses: report.nof_clauses,
            });
        }

        // No report line: measure the formula ourselves
        let path = PathBuf::from(id);
        let formula = tokio::task::spawn_blocking(move || dimacs::parse_file(&path))
            .await
            .map_err(|e| SolveError::Io(e.to_string()))?
            .map_err(|e| {
                SolveError::InvalidOutput(format!("no report line and formula unreadable: {}", e))
            })?;

        Ok(SolveReport {
            seconds: wall_seconds,
            sat: verdict.as_sat(),
            nof_vars: formula.nof_vars,
            nof_clauses: formula.nof_clauses(),
        })
    }
}

fn verdict_of(status: ExitStatus) -> Option<WorkerVerdict> {
    status.code().and_then(WorkerVerdict::from_exit_code)
}

fn describe_status(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("unexpected exit code {}", code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("terminated by signal {}", signal);
        }
    }

    status.to_string()
}

// Last non-empty stderr line, prefixed for appending to a message
fn stderr_tail(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(|l| format!(": {}", l.trim()))
        .unwrap_or_default()
}

#[async_trait]
impl SolveAdapter for SubprocessSolver {
    async fn solve(&self, id: &InputIdentifier) -> Result<SolveReport, SolveError> {
        let start = self.time_provider.now_millis();

        let output = self.spawn_and_wait(id).await?;
        let wall_seconds = self.time_provider.seconds_since(start);
        let report = self.interpret(id, output, wall_seconds).await?;

        debug!(
            identifier = %id,
            seconds = report.seconds,
            sat = ?report.sat,
            nof_vars = report.nof_vars,
            nof_clauses = report.nof_clauses,
            "Formula solved"
        );

        Ok(report)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use cnfsweep_core::port::time_provider::SystemTimeProvider;
    use std::path::Path;
    use std::time::Duration;

    // `sh -c <script> sh <identifier>`: the identifier is $1
    fn shell(script: &str) -> SubprocessSolver {
        SubprocessSolver::with_default_env(
            WorkerCommand::new("sh", vec!["-c".to_string(), script.to_string(), "sh".to_string()]),
            Arc::new(SystemTimeProvider),
        )
    }

    fn formula_file(dir: &Path, name: &str, text: &str) -> InputIdentifier {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_report_line_and_sat_exit_code() {
        let solver = shell(r#"echo '{"seconds":0.25,"nof_vars":3,"nof_clauses":2}'; exit 10"#);

        let report = solver.solve(&"whatever.cnf".to_string()).await.unwrap();

        assert_eq!(
            report,
            SolveReport {
                seconds: 0.25,
                sat: Some(true),
                nof_vars: 3,
                nof_clauses: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_unsat_without_report_parses_formula() {
        let dir = tempfile::tempdir().unwrap();
        let id = formula_file(dir.path(), "u.cnf", "p cnf 5 3\n1 0\n-1 2 0\n-2 0\n");
        let solver = shell("exit 20");

        let report = solver.solve(&id).await.unwrap();

        assert_eq!(report.sat, Some(false));
        assert_eq!(report.nof_vars, 5);
        assert_eq!(report.nof_clauses, 3);
        assert!(report.seconds >= 0.0);
    }

    #[tokio::test]
    async fn test_inconclusive_exit_code() {
        let solver = shell(r#"echo '{"seconds":1.0,"nof_vars":1,"nof_clauses":1}'; exit 0"#);

        let report = solver.solve(&"x.cnf".to_string()).await.unwrap();
        assert_eq!(report.sat, None);
    }

    #[tokio::test]
    async fn test_unexpected_exit_code_is_crash() {
        let solver = shell("echo 'out of memory' >&2; exit 3");

        let err = solver.solve(&"x.cnf".to_string()).await.unwrap_err();
        match err {
            SolveError::Crashed(msg) => {
                assert!(msg.contains("exit code 3"));
                assert!(msg.contains("out of memory"));
            }
            other => panic!("expected crash, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_killed_by_signal_is_crash() {
        let solver = shell("kill -9 $$");

        let err = solver.solve(&"x.cnf".to_string()).await.unwrap_err();
        assert!(matches!(err, SolveError::Crashed(msg) if msg.contains("signal 9")));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_failure() {
        let solver = SubprocessSolver::with_default_env(
            WorkerCommand::new("/nonexistent/cnfsweep-worker", vec![]),
            Arc::new(SystemTimeProvider),
        );

        let err = solver.solve(&"x.cnf".to_string()).await.unwrap_err();
        assert!(matches!(err, SolveError::SpawnFailed(_)));
    }

    #[tokio::test]
    async fn test_no_report_and_missing_formula_is_invalid_output() {
        let solver = shell("exit 10");

        let err = solver
            .solve(&"/nonexistent/formula.cnf".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, SolveError::InvalidOutput(_)));
    }

    #[tokio::test]
    async fn test_identifier_passed_as_last_argument() {
        let dir = tempfile::tempdir().unwrap();
        let id = formula_file(dir.path(), "arg.cnf", "p cnf 1 1\n1 0\n");
        let solver = shell(r#"[ -f "$1" ] && exit 10 || exit 3"#);

        let report = solver.solve(&id).await.unwrap();
        assert_eq!(report.sat, Some(true));
    }

    #[test]
    fn test_env_filtering() {
        let solver = SubprocessSolver::new(
            WorkerCommand::new("true", vec![]),
            Arc::new(SystemTimeProvider),
            vec!["ALLOWED_VAR".to_string()],
        );

        let filtered = solver.filter_env(vec![
            (OsString::from("ALLOWED_VAR"), OsString::from("value1")),
            (OsString::from("BLOCKED_VAR"), OsString::from("value2")),
        ]);

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].0, "ALLOWED_VAR");
    }

    #[cfg(target_os = "linux")]
    fn is_running(pid: i32) -> bool {
        // Zombies count as dead
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => stat
                .rsplit_once(") ")
                .and_then(|(_, rest)| rest.chars().next())
                .is_some_and(|state| state != 'Z' && state != 'X'),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_abandoned_solve_kills_process_group() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("grandchild.pid");
        let id = pid_file.to_string_lossy().into_owned();
        // The grandchild outlives a plain kill of the worker
        let solver = shell(r#"sleep 30 & echo $! > "$1"; wait"#);

        let result = tokio::time::timeout(Duration::from_millis(500), solver.solve(&id)).await;
        assert!(result.is_err(), "solve should still be running");

        let pid: i32 = std::fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();

        let mut alive = true;
        for _ in 0..50 {
            if !is_running(pid) {
                alive = false;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!alive, "grandchild {} survived", pid);
    }
}
