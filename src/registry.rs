// src/registry.rs
//! Ownership of in-flight fetch tasks for one report.
//!
//! Tasks are registered right after spawn, marked done when their completion
//! is handled, and destroyed by `reap()`. A running task is never destroyed by
//! `reap()`; only `teardown()` (report discard, or drop) closes running tasks.
//! `TaskResource::destroy` takes `self`, so a resource can only be released once.

use metrics::counter;
use std::collections::HashMap;
use tokio::task::JoinHandle;

use crate::tasks::types::{TaskId, TaskKind, TaskStatus};

/// Something that must be released exactly once.
pub trait TaskResource: Send {
    fn destroy(self);
}

impl TaskResource for JoinHandle<()> {
    fn destroy(self) {
        self.abort();
    }
}

struct Entry<R> {
    kind: TaskKind,
    status: TaskStatus,
    resource: R,
}

pub struct TaskRegistry<R: TaskResource = JoinHandle<()>> {
    next_id: u64,
    entries: HashMap<TaskId, Entry<R>>,
}

impl<R: TaskResource> Default for TaskRegistry<R> {
    fn default() -> Self {
        Self {
            next_id: 1,
            entries: HashMap::new(),
        }
    }
}

impl<R: TaskResource> TaskRegistry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fresh id. Ids are never reused within a registry.
    pub fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Take ownership of a freshly spawned task. A duplicate id is refused and
    /// the incoming resource released on the spot.
    pub fn register(&mut self, id: TaskId, kind: TaskKind, resource: R) -> bool {
        if self.entries.contains_key(&id) {
            tracing::warn!(target: "report", %id, %kind, "duplicate task id; destroying new resource");
            resource.destroy();
            return false;
        }
        tracing::debug!(target: "report", %id, %kind, "task registered");
        self.entries.insert(
            id,
            Entry {
                kind,
                status: TaskStatus::Running,
                resource,
            },
        );
        true
    }

    /// Record the final status of a running task. Returns false for unknown
    /// (already reaped) or already-finished tasks, or when `status` is `Running`.
    pub fn mark_done(&mut self, id: TaskId, status: TaskStatus) -> bool {
        if status.is_running() {
            return false;
        }
        match self.entries.get_mut(&id) {
            Some(e) if e.status.is_running() => {
                e.status = status;
                true
            }
            _ => false,
        }
    }

    /// Destroy and deregister every finished task in one pass.
    pub fn reap(&mut self) -> Vec<(TaskId, TaskKind)> {
        let mut done: Vec<TaskId> = self
            .entries
            .iter()
            .filter(|(_, e)| !e.status.is_running())
            .map(|(id, _)| *id)
            .collect();
        done.sort();

        let mut reaped = Vec::with_capacity(done.len());
        for id in done {
            if let Some(e) = self.entries.remove(&id) {
                e.resource.destroy();
                tracing::debug!(target: "report", %id, kind = %e.kind, "task reaped");
                reaped.push((id, e.kind));
            }
        }
        counter!("report_tasks_reaped_total").increment(reaped.len() as u64);
        reaped
    }

    /// Close every task, running or not. Returns how many were destroyed.
    pub fn teardown(&mut self) -> usize {
        let n = self.entries.len();
        for (id, e) in self.entries.drain() {
            tracing::debug!(target: "report", %id, kind = %e.kind, "task closed on teardown");
            e.resource.destroy();
        }
        n
    }

    pub fn status(&self, id: TaskId) -> Option<&TaskStatus> {
        self.entries.get(&id).map(|e| &e.status)
    }

    pub fn running(&self) -> usize {
        self.entries.values().filter(|e| e.status.is_running()).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<R: TaskResource> Drop for TaskRegistry<R> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Records every destroy call per task id.
    #[derive(Clone, Default)]
    struct Ledger(Arc<Mutex<HashMap<u64, usize>>>);

    impl Ledger {
        fn count(&self, id: u64) -> usize {
            *self.0.lock().unwrap().get(&id).unwrap_or(&0)
        }
    }

    struct Probe {
        id: u64,
        ledger: Ledger,
    }

    impl TaskResource for Probe {
        fn destroy(self) {
            *self.ledger.0.lock().unwrap().entry(self.id).or_insert(0) += 1;
        }
    }

    fn add(reg: &mut TaskRegistry<Probe>, ledger: &Ledger) -> TaskId {
        let id = reg.next_id();
        assert!(reg.register(
            id,
            TaskKind::TalkPage,
            Probe {
                id: id.0,
                ledger: ledger.clone()
            }
        ));
        id
    }

    #[test]
    fn reap_only_touches_finished_tasks() {
        let ledger = Ledger::default();
        let mut reg = TaskRegistry::new();
        let a = add(&mut reg, &ledger);
        let b = add(&mut reg, &ledger);

        assert!(reg.mark_done(a, TaskStatus::Succeeded));
        let reaped = reg.reap();
        assert_eq!(reaped, vec![(a, TaskKind::TalkPage)]);
        assert_eq!(ledger.count(a.0), 1);
        assert_eq!(ledger.count(b.0), 0);
        assert_eq!(reg.running(), 1);

        // second reap is a no-op for `a`
        assert!(reg.reap().is_empty());
        assert_eq!(ledger.count(a.0), 1);
    }

    #[test]
    fn reaped_task_cannot_be_marked_again() {
        let ledger = Ledger::default();
        let mut reg = TaskRegistry::new();
        let a = add(&mut reg, &ledger);
        assert!(reg.mark_done(a, TaskStatus::Failed("404".into())));
        assert!(!reg.mark_done(a, TaskStatus::Succeeded));
        reg.reap();
        assert!(!reg.mark_done(a, TaskStatus::Succeeded));
        assert!(reg.status(a).is_none());
    }

    #[test]
    fn running_is_not_a_final_status() {
        let ledger = Ledger::default();
        let mut reg = TaskRegistry::new();
        let a = add(&mut reg, &ledger);
        assert!(!reg.mark_done(a, TaskStatus::Running));
        assert!(reg.reap().is_empty());
        assert_eq!(ledger.count(a.0), 0);
    }

    #[test]
    fn drop_closes_outstanding_tasks_once() {
        let ledger = Ledger::default();
        let a;
        let b;
        {
            let mut reg = TaskRegistry::new();
            a = add(&mut reg, &ledger);
            b = add(&mut reg, &ledger);
            reg.mark_done(a, TaskStatus::Succeeded);
            reg.reap();
        }
        assert_eq!(ledger.count(a.0), 1);
        assert_eq!(ledger.count(b.0), 1);
    }

    #[test]
    fn duplicate_id_is_refused() {
        let ledger = Ledger::default();
        let mut reg = TaskRegistry::new();
        let a = add(&mut reg, &ledger);
        let dup = Probe {
            id: 999,
            ledger: ledger.clone(),
        };
        assert!(!reg.register(a, TaskKind::EditSummaries, dup));
        assert_eq!(ledger.count(999), 1);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn random_sequences_never_double_destroy() {
        // Deterministic pseudo-random walk over register/mark/reap.
        let ledger = Ledger::default();
        let mut reg = TaskRegistry::new();
        let mut ids = Vec::new();
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            match seed % 3 {
                0 => ids.push(add(&mut reg, &ledger)),
                1 if !ids.is_empty() => {
                    let id = ids[(seed as usize / 3) % ids.len()];
                    let running_before = reg.status(id).map(|s| s.is_running());
                    reg.mark_done(id, TaskStatus::Succeeded);
                    if running_before == Some(true) {
                        assert_eq!(ledger.count(id.0), 0);
                    }
                }
                _ => {
                    reg.reap();
                }
            }
            for id in &ids {
                assert!(ledger.count(id.0) <= 1);
                if reg.status(*id).is_some_and(|s| s.is_running()) {
                    assert_eq!(ledger.count(id.0), 0);
                }
            }
        }
    }
}
