// ABOUTME: Approval-gated callbacks: wait for a change decision, then notify the orchestrator.
// ABOUTME: One background waiter per execution, serialized through a keyed lock table.

pub mod callback;
pub mod lock;
pub mod waiter;

pub use callback::{CallbackError, CallbackNotifier, CallbackStatus, CallbackTarget, HttpCallback};
pub use lock::{ExecutionLocks, ExecutionSlot, Settlement};
pub use waiter::{ApprovalOutcome, ApprovalWaiter, ExecutionContext, WaiterHandle};

#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    #[error("approval waiter task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
