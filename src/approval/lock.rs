// ABOUTME: Keyed lock table serializing approval decisions per execution.
// ABOUTME: Each slot records whether its execution has already been reported.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;

use crate::types::ExecutionId;

use super::callback::CallbackStatus;

/// Record of the one callback sent for an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub status: CallbackStatus,
    pub settled_at: DateTime<Utc>,
}

/// Per-execution state guarded by the slot's mutex.
#[derive(Debug, Default)]
pub struct ExecutionSlot {
    settlement: Option<Settlement>,
}

impl ExecutionSlot {
    pub fn is_settled(&self) -> bool {
        self.settlement.is_some()
    }

    pub fn settlement(&self) -> Option<&Settlement> {
        self.settlement.as_ref()
    }

    /// Mark the execution reported. Returns `false` if it already was.
    pub fn settle(&mut self, status: CallbackStatus) -> bool {
        if self.settlement.is_some() {
            return false;
        }
        self.settlement = Some(Settlement {
            status,
            settled_at: Utc::now(),
        });
        true
    }
}

/// Map from execution id to its slot.
///
/// Slots are created on first use and dropped by [`ExecutionLocks::release`] once
/// the last waiter holding them lets go. Waiters running at the same time for one
/// execution therefore always share a slot.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLocks {
    slots: Arc<Mutex<HashMap<ExecutionId, Arc<AsyncMutex<ExecutionSlot>>>>>,
}

impl ExecutionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `id`; every caller with the same id gets the same mutex.
    pub fn slot(&self, id: &ExecutionId) -> Arc<AsyncMutex<ExecutionSlot>> {
        self.slots.lock().entry(id.clone()).or_default().clone()
    }

    /// Give back a slot obtained from [`ExecutionLocks::slot`]. The entry is removed
    /// when no other holder remains.
    pub fn release(&self, id: &ExecutionId, slot: Arc<AsyncMutex<ExecutionSlot>>) {
        drop(slot);
        let mut slots = self.slots.lock();
        let unused = slots
            .get(id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1);
        if unused {
            slots.remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_id_shares_a_slot() {
        let locks = ExecutionLocks::new();
        let a = locks.slot(&ExecutionId::new("exec-1"));
        let b = locks.clone().slot(&ExecutionId::new("exec-1"));
        let c = locks.slot(&ExecutionId::new("exec-2"));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn release_drops_unheld_entries_only() {
        let locks = ExecutionLocks::new();
        let id = ExecutionId::new("exec-1");
        let first = locks.slot(&id);
        let second = locks.slot(&id);

        locks.release(&id, first);
        assert_eq!(locks.len(), 1);

        locks.release(&id, second);
        assert!(locks.is_empty());
    }

    #[test]
    fn release_of_unknown_id_is_harmless() {
        let locks = ExecutionLocks::new();
        let other = locks.slot(&ExecutionId::new("exec-2"));

        locks.release(&ExecutionId::new("exec-1"), Arc::clone(&other));
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn settle_only_once() {
        let locks = ExecutionLocks::new();
        let slot = locks.slot(&ExecutionId::new("exec-1"));

        let mut guard = slot.lock().await;
        assert!(guard.settle(CallbackStatus::Completed));
        assert!(!guard.settle(CallbackStatus::Failed));
        assert_eq!(
            guard.settlement().map(|s| s.status),
            Some(CallbackStatus::Completed)
        );
    }
}
