//! Push-based reactive reads.
//!
//! Writes publish the set of tables they touched to a [`ChangeBus`]; every
//! live subscription that read one of those tables is re-run and its new
//! value pushed to subscribers over a watch channel. A subscription takes a
//! version snapshot before each run, so however many writes land while the
//! query executes, they collapse into a single recompute.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::warn;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;

pub const TABLE_COUNT: usize = 10;

/// Every table in the store, used as the granularity of change tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Profile = 0,
    Exercises = 1,
    Routines = 2,
    RoutineExercises = 3,
    Workouts = 4,
    WorkoutExercises = 5,
    Sets = 6,
    WeightEntries = 7,
    WidgetPrefs = 8,
    Settings = 9,
}

/// Bitmask over [`Table`]. Subscriptions report one of these after every
/// execution; writes publish one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableSet(u16);

impl TableSet {
    pub const EMPTY: TableSet = TableSet(0);
    pub const ALL: TableSet = TableSet((1 << TABLE_COUNT) - 1);

    pub const fn of(tables: &[Table]) -> Self {
        let mut bits = 0u16;
        let mut i = 0;
        while i < tables.len() {
            bits |= 1 << (tables[i] as u16);
            i += 1;
        }
        TableSet(bits)
    }

    pub const fn contains(&self, table: Table) -> bool {
        self.0 & (1 << (table as u16)) != 0
    }

    pub const fn union(&self, other: TableSet) -> TableSet {
        TableSet(self.0 | other.0)
    }
}

/// Per-table version counters plus a wakeup for waiting subscriptions.
pub struct ChangeBus {
    versions: [AtomicU64; TABLE_COUNT],
    notify: Notify,
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeBus {
    pub fn new() -> Self {
        Self {
            versions: std::array::from_fn(|_| AtomicU64::new(0)),
            notify: Notify::new(),
        }
    }

    /// Record a write to `tables` and wake every waiting subscription.
    pub fn publish(&self, tables: TableSet) {
        for (i, version) in self.versions.iter().enumerate() {
            if tables.0 & (1 << i) != 0 {
                version.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.notify.notify_waiters();
    }

    pub fn snapshot(&self) -> [u64; TABLE_COUNT] {
        std::array::from_fn(|i| self.versions[i].load(Ordering::SeqCst))
    }

    fn changed_since(&self, tables: TableSet, snapshot: &[u64; TABLE_COUNT]) -> bool {
        self.versions.iter().enumerate().any(|(i, version)| {
            tables.0 & (1 << i) != 0 && version.load(Ordering::SeqCst) > snapshot[i]
        })
    }

    /// Resolve once any table in `tables` has advanced past `snapshot`.
    /// Returns immediately if a write already landed.
    pub async fn wait_change(&self, tables: TableSet, snapshot: &[u64; TABLE_COUNT]) {
        loop {
            let notified = self.notify.notified();
            if self.changed_since(tables, snapshot) {
                return;
            }
            notified.await;
        }
    }
}

/// Handle to a live subscription. Dropping it tears the query down.
pub struct LiveQuery<T> {
    rx: watch::Receiver<Option<T>>,
    task: JoinHandle<()>,
}

impl<T: Clone> LiveQuery<T> {
    /// Wait for the next (re)computation and return its value.
    pub async fn next(&mut self) -> Option<T> {
        if self.rx.changed().await.is_err() {
            return None;
        }
        self.rx.borrow_and_update().clone()
    }

    /// The most recently computed value, if any run has finished.
    pub fn latest(&self) -> Option<T> {
        self.rx.borrow().clone()
    }

    pub fn receiver(&self) -> watch::Receiver<Option<T>> {
        self.rx.clone()
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start a live subscription. The query runs once immediately; each run
/// returns its value together with the tables it read, and the subscription
/// re-registers that footprint for the next wait.
pub fn subscribe<T, F, Fut>(bus: Arc<ChangeBus>, query: F) -> LiveQuery<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<(T, TableSet)>> + Send,
{
    let (tx, rx) = watch::channel(None);
    let task = tokio::spawn(async move {
        loop {
            let snapshot = bus.snapshot();
            match query().await {
                Ok((value, tables)) => {
                    if tx.send(Some(value)).is_err() {
                        break;
                    }
                    bus.wait_change(tables, &snapshot).await;
                }
                Err(e) => {
                    // Keep the last good value; retry on the next write.
                    warn!("live query failed: {e:#}");
                    bus.wait_change(TableSet::ALL, &snapshot).await;
                }
            }
        }
    });
    LiveQuery { rx, task }
}
