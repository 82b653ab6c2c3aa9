use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Weekday};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::db::{CheckInDao, Database};
use crate::error::Result;
use crate::models::{CheckInHistory, CheckInRecord, HistoryChange};
use crate::utils::time::compute_week_completion;

/// Authoritative date -> check-in times mapping.
///
/// Mutations are serialized: each one plans a change against the current
/// history, persists it, then publishes a new snapshot. A failed write leaves
/// the published state untouched. Readers only ever see whole snapshots.
#[derive(Clone)]
pub struct CheckInHistoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    dao: CheckInDao,
    state: Mutex<CheckInHistory>,
    snapshots: watch::Sender<Arc<CheckInHistory>>,
}

impl CheckInHistoryStore {
    /// Load persisted check-ins and start publishing snapshots
    pub fn open(db: Arc<Database>) -> Result<Self> {
        let dao = CheckInDao::new(db);
        let history = dao.get_all_entries()?;

        tracing::info!(dates = history.len(), "Loaded check-in history");

        let (snapshots, _) = watch::channel(Arc::new(history.clone()));

        Ok(Self {
            inner: Arc::new(Inner {
                dao,
                state: Mutex::new(history),
                snapshots,
            }),
        })
    }

    /// Record a check-in. Returns `false` if the time was already recorded.
    pub fn add_check_in(&self, date: NaiveDate, time: NaiveTime) -> Result<bool> {
        self.commit(|history| history.plan_add(date, time))
    }

    /// Drop a check-in, deleting the date once its last time is gone.
    /// Returns `false` if there was nothing to remove.
    pub fn remove_check_in(&self, date: NaiveDate, time: NaiveTime) -> Result<bool> {
        self.commit(|history| history.plan_remove(date, time))
    }

    /// Delete every record. Returns `false` if the store was already empty.
    pub fn clear_all(&self) -> Result<bool> {
        self.commit(CheckInHistory::plan_clear)
    }

    pub fn get_record(&self, date: NaiveDate) -> Option<CheckInRecord> {
        self.inner.snapshots.borrow().get(date).cloned()
    }

    /// Current full history
    pub fn snapshot(&self) -> Arc<CheckInHistory> {
        self.inner.snapshots.borrow().clone()
    }

    /// Subscribe to the full history.
    ///
    /// The receiver holds the current state immediately and is notified after
    /// every mutation that changed something.
    pub fn stream_all(&self) -> watch::Receiver<Arc<CheckInHistory>> {
        self.inner.snapshots.subscribe()
    }

    pub fn week_completion(&self, today: NaiveDate, first_day: Weekday) -> [bool; 7] {
        compute_week_completion(&self.snapshot(), today, first_day)
    }

    fn commit<F>(&self, plan: F) -> Result<bool>
    where
        F: FnOnce(&CheckInHistory) -> HistoryChange,
    {
        let mut state = self.inner.state.lock();
        let change = plan(&*state);

        match &change {
            HistoryChange::Unchanged => return Ok(false),
            HistoryChange::Inserted(record) => self.inner.dao.insert(record)?,
            HistoryChange::Updated(record) => self.inner.dao.update(record)?,
            HistoryChange::Deleted(date) => self.inner.dao.delete_date(*date)?,
            HistoryChange::Cleared => {
                self.inner.dao.delete_all()?;
            }
        }

        state.apply(change);
        self.inner.snapshots.send_replace(Arc::new(state.clone()));

        Ok(true)
    }
}

impl std::fmt::Debug for CheckInHistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckInHistoryStore")
            .field("dates", &self.snapshot().len())
            .finish()
    }
}
