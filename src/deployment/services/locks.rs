//! Per-name serialisation of record-writing workflows.

use crate::deployment::domain::DeploymentName;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = Arc<Mutex<HashMap<DeploymentName, Arc<AsyncMutex<()>>>>>;

/// Guard held while a workflow mutates the records it names.
///
/// Dropping the last guard for a name removes that name from the table.
#[derive(Debug)]
pub struct NameGuard {
    guards: Vec<OwnedMutexGuard<()>>,
    names: Vec<DeploymentName>,
    table: LockTable,
}

impl Drop for NameGuard {
    fn drop(&mut self) {
        self.guards.clear();
        let mut locks = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        for name in &self.names {
            if locks.get(name).is_some_and(|slot| Arc::strong_count(slot) == 1) {
                locks.remove(name);
            }
        }
    }
}

/// Async locks keyed by deployment name.
///
/// Workflows that write a record hold its lock from the first read to the
/// final save, so two deploys of one name run one after the other. Only
/// names with a live or pending guard occupy the table.
#[derive(Debug, Clone, Default)]
pub struct NameLocks {
    locks: LockTable,
}

impl NameLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, name: &DeploymentName) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(name.clone()).or_default())
    }

    fn guard(&self, guards: Vec<OwnedMutexGuard<()>>, names: Vec<DeploymentName>) -> NameGuard {
        NameGuard {
            guards,
            names,
            table: Arc::clone(&self.locks),
        }
    }

    /// Number of names currently held or awaited.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Waits for exclusive access to one name.
    pub async fn lock(&self, name: &DeploymentName) -> NameGuard {
        let held = self.slot(name).lock_owned().await;
        self.guard(vec![held], vec![name.clone()])
    }

    /// Waits for exclusive access to two names.
    ///
    /// Locks are taken in lexical order so concurrent callers naming the
    /// same pair in either order cannot deadlock. A repeated name is locked
    /// once.
    pub async fn lock_pair(&self, first: &DeploymentName, second: &DeploymentName) -> NameGuard {
        let (low, high) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        let mut guards = vec![self.slot(low).lock_owned().await];
        let mut names = vec![low.clone()];
        if low != high {
            guards.push(self.slot(high).lock_owned().await);
            names.push(high.clone());
        }
        self.guard(guards, names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn name(value: &str) -> DeploymentName {
        DeploymentName::new(value).expect("valid name")
    }

    #[tokio::test]
    async fn same_name_is_exclusive() {
        let locks = NameLocks::new();
        let held = locks.lock(&name("api")).await;

        let blocked = timeout(Duration::from_millis(20), locks.lock(&name("api"))).await;
        assert!(blocked.is_err());

        drop(held);
        let acquired = timeout(Duration::from_millis(20), locks.lock(&name("api"))).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn different_names_do_not_contend() {
        let locks = NameLocks::new();
        let _api = locks.lock(&name("api")).await;
        let other = timeout(Duration::from_millis(20), locks.lock(&name("web"))).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn pair_with_repeated_name_does_not_self_deadlock() {
        let locks = NameLocks::new();
        let pair = timeout(
            Duration::from_millis(20),
            locks.lock_pair(&name("api"), &name("api")),
        )
        .await;
        assert!(pair.is_ok());
    }

    #[tokio::test]
    async fn released_names_leave_the_table() {
        let locks = NameLocks::new();
        let single = locks.lock(&name("api")).await;
        let pair = locks.lock_pair(&name("web"), &name("worker")).await;
        assert_eq!(locks.tracked(), 3);

        drop(single);
        assert_eq!(locks.tracked(), 2);
        drop(pair);
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn waiter_keeps_the_slot_alive() {
        let locks = NameLocks::new();
        let held = locks.lock(&name("api")).await;
        let contender = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = contender.lock(&name("api")).await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        drop(held);
        assert!(locks.tracked() <= 1);
        timeout(Duration::from_millis(200), waiter)
            .await
            .expect("waiter acquires the lock")
            .expect("waiter task completes");
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn pair_blocks_either_member() {
        let locks = NameLocks::new();
        let _pair = locks.lock_pair(&name("web"), &name("api")).await;
        let blocked = timeout(Duration::from_millis(20), locks.lock(&name("web"))).await;
        assert!(blocked.is_err());
    }
}
