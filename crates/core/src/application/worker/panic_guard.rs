// Panic isolation for solver tasks
use std::any::Any;
use tokio::task::JoinError;
use tracing::error;

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Describe why a spawned solver task did not return a value
///
/// A panicking adapter must not take the coordinator down; the panic is
/// turned into a failure message for the item.
pub fn describe_join_error(join_err: JoinError) -> String {
    if join_err.is_panic() {
        let payload = join_err.into_panic();
        let msg = panic_message(payload.as_ref());
        error!(panic_msg = %msg, "Solver task panicked");
        format!("solver panicked: {}", msg)
    } else {
        format!("solver task cancelled: {}", join_err)
    }
}
