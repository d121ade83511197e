// ABOUTME: Background task that waits for a change to be approved or rejected.
// ABOUTME: Polls the ITSM record and reports the decision once through the callback.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::itsm::{ChangeKind, ChangeLookup};
use crate::types::ExecutionId;

use super::ApprovalError;
use super::callback::{CallbackNotifier, CallbackStatus, CallbackTarget};
use super::lock::{ExecutionLocks, ExecutionSlot};

/// Approval field values that end the wait.
pub const APPROVED: &str = "Approved";
pub const REJECTED: &str = "Rejected";

/// Everything one waiter needs to know about the execution it reports on.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Orchestrator execution id; also the sys_id of the change record.
    pub execution_id: ExecutionId,
    pub kind: ChangeKind,
    pub poll_interval: Duration,
    pub max_polls: u32,
    pub callback: CallbackTarget,
}

/// How a waiter finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// Reported COMPLETED.
    Approved,
    /// Reported FAILED.
    Rejected,
    /// Poll budget spent without a decision; reported FAILED.
    Exhausted,
    /// Another waiter already reported this execution; nothing sent.
    AlreadySettled,
}

impl ApprovalOutcome {
    pub fn callback_status(&self) -> Option<CallbackStatus> {
        match self {
            ApprovalOutcome::Approved => Some(CallbackStatus::Completed),
            ApprovalOutcome::Rejected | ApprovalOutcome::Exhausted => Some(CallbackStatus::Failed),
            ApprovalOutcome::AlreadySettled => None,
        }
    }
}

pub struct ApprovalWaiter {
    context: ExecutionContext,
    lookup: Arc<dyn ChangeLookup>,
    notifier: Arc<dyn CallbackNotifier>,
    locks: ExecutionLocks,
    interrupt: Arc<Notify>,
}

/// Handle to a spawned waiter.
#[derive(Debug)]
pub struct WaiterHandle {
    execution_id: ExecutionId,
    interrupt: Arc<Notify>,
    task: JoinHandle<ApprovalOutcome>,
}

impl WaiterHandle {
    pub fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    /// Cut the current sleep short. The cycle is skipped and still counted; the
    /// waiter keeps running.
    pub fn interrupt(&self) {
        self.interrupt.notify_one();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> Result<ApprovalOutcome, ApprovalError> {
        Ok(self.task.await?)
    }
}

impl ApprovalWaiter {
    pub fn new(
        context: ExecutionContext,
        lookup: Arc<dyn ChangeLookup>,
        notifier: Arc<dyn CallbackNotifier>,
        locks: ExecutionLocks,
    ) -> Self {
        Self {
            context,
            lookup,
            notifier,
            locks,
            interrupt: Arc::new(Notify::new()),
        }
    }

    /// Run on the tokio runtime, independently of the caller.
    pub fn spawn(self) -> WaiterHandle {
        let execution_id = self.context.execution_id.clone();
        let interrupt = Arc::clone(&self.interrupt);
        let task = tokio::spawn(self.run());
        WaiterHandle {
            execution_id,
            interrupt,
            task,
        }
    }

    /// Poll until a decision or until `max_polls` cycles have passed.
    pub async fn run(self) -> ApprovalOutcome {
        let id = self.context.execution_id.clone();
        let slot = self.locks.slot(&id);

        let outcome = self.poll(&slot).await;

        self.locks.release(&id, slot);
        outcome
    }

    async fn poll(&self, slot: &AsyncMutex<ExecutionSlot>) -> ApprovalOutcome {
        let id = &self.context.execution_id;
        let mut polls: u32 = 0;

        info!(
            execution = %id,
            kind = %self.context.kind,
            max_polls = self.context.max_polls,
            "waiting for approval"
        );

        while polls < self.context.max_polls {
            debug!(execution = %id, interval = ?self.context.poll_interval, "sleeping");

            tokio::select! {
                _ = tokio::time::sleep(self.context.poll_interval) => {
                    if let Some(outcome) = self.check(slot).await {
                        return outcome;
                    }
                }
                _ = self.interrupt.notified() => {
                    warn!(execution = %id, "approval waiter interrupted; continuing");
                }
            }

            polls += 1;
        }

        debug!(execution = %id, polls, "approval waiter exceeded max polls");
        let mut guard = slot.lock().await;
        if guard.is_settled() {
            return ApprovalOutcome::AlreadySettled;
        }
        self.report(&mut guard, CallbackStatus::Failed).await;
        ApprovalOutcome::Exhausted
    }

    /// One locked read-decide-notify cycle. `None` means keep waiting.
    async fn check(&self, slot: &AsyncMutex<ExecutionSlot>) -> Option<ApprovalOutcome> {
        let id = &self.context.execution_id;
        let mut guard = slot.lock().await;

        if guard.is_settled() {
            info!(execution = %id, "execution already reported; stopping");
            return Some(ApprovalOutcome::AlreadySettled);
        }

        let record = match self.lookup.fetch_change(self.context.kind, id.as_str()).await {
            Ok(record) => record,
            Err(e) => {
                error!(execution = %id, error = %e, "error checking approval status");
                return None;
            }
        };
        debug!(execution = %id, approval = %record.approval, "approval status");

        match record.approval.as_str() {
            APPROVED => {
                self.report(&mut guard, CallbackStatus::Completed).await;
                Some(ApprovalOutcome::Approved)
            }
            REJECTED => {
                self.report(&mut guard, CallbackStatus::Failed).await;
                Some(ApprovalOutcome::Rejected)
            }
            _ => None,
        }
    }

    async fn report(&self, slot: &mut ExecutionSlot, status: CallbackStatus) {
        let id = &self.context.execution_id;
        if !slot.settle(status) {
            return;
        }
        info!(execution = %id, status = %status, "reporting approval outcome");
        if let Err(e) = self
            .notifier
            .notify(&self.context.callback, id, status)
            .await
        {
            error!(execution = %id, status = %status, error = %e, "callback delivery failed");
        }
    }
}
