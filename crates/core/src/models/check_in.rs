use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveTime};

use crate::utils::time::truncate_to_minute;

/// All check-in times recorded on one calendar date.
///
/// Times are kept at minute granularity, unique and ascending. A record is
/// never empty: it is created with its first time and removed with its last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInRecord {
    date: NaiveDate,
    times: BTreeSet<NaiveTime>,
}

impl CheckInRecord {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date,
            times: BTreeSet::from([truncate_to_minute(time)]),
        }
    }

    /// Build a record from arbitrary times. Returns `None` when `times` is empty.
    pub fn from_times<I>(date: NaiveDate, times: I) -> Option<Self>
    where
        I: IntoIterator<Item = NaiveTime>,
    {
        let times: BTreeSet<_> = times.into_iter().map(truncate_to_minute).collect();

        if times.is_empty() {
            return None;
        }

        Some(Self { date, times })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Times in ascending order
    pub fn times(&self) -> impl Iterator<Item = NaiveTime> + '_ {
        self.times.iter().copied()
    }

    pub fn time_list(&self) -> Vec<NaiveTime> {
        self.times().collect()
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.times.contains(&truncate_to_minute(time))
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    fn with_time(&self, time: NaiveTime) -> Self {
        let mut record = self.clone();
        record.times.insert(time);
        record
    }

    fn without_time(&self, time: NaiveTime) -> Self {
        let mut record = self.clone();
        record.times.remove(&time);
        record
    }
}

/// A single persisted change computed from the current history
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryChange {
    /// First check-in for a previously unseen date
    Inserted(CheckInRecord),
    /// New time set for an existing date
    Updated(CheckInRecord),
    /// Last time of a date was removed
    Deleted(NaiveDate),
    /// Every record was removed
    Cleared,
    Unchanged,
}

impl HistoryChange {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, HistoryChange::Unchanged)
    }
}

/// Snapshot of every check-in, keyed by date
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckInHistory {
    records: BTreeMap<NaiveDate, CheckInRecord>,
}

impl CheckInHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&CheckInRecord> {
        self.records.get(&date)
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.records.contains_key(&date)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending date order
    pub fn records(&self) -> impl Iterator<Item = &CheckInRecord> {
        self.records.values()
    }

    /// Date to sorted time list, the shape a calendar view consumes
    pub fn times_by_date(&self) -> BTreeMap<NaiveDate, Vec<NaiveTime>> {
        self.records
            .iter()
            .map(|(date, record)| (*date, record.time_list()))
            .collect()
    }

    /// Change needed to record a check-in at `time` on `date`
    pub fn plan_add(&self, date: NaiveDate, time: NaiveTime) -> HistoryChange {
        let time = truncate_to_minute(time);

        match self.records.get(&date) {
            None => HistoryChange::Inserted(CheckInRecord::new(date, time)),
            Some(record) if record.contains(time) => HistoryChange::Unchanged,
            Some(record) => HistoryChange::Updated(record.with_time(time)),
        }
    }

    /// Change needed to drop the check-in at `time` on `date`
    pub fn plan_remove(&self, date: NaiveDate, time: NaiveTime) -> HistoryChange {
        let time = truncate_to_minute(time);

        match self.records.get(&date) {
            Some(record) if record.contains(time) => {
                if record.len() > 1 {
                    HistoryChange::Updated(record.without_time(time))
                } else {
                    HistoryChange::Deleted(date)
                }
            }
            _ => HistoryChange::Unchanged,
        }
    }

    pub fn plan_clear(&self) -> HistoryChange {
        if self.records.is_empty() {
            HistoryChange::Unchanged
        } else {
            HistoryChange::Cleared
        }
    }

    pub fn apply(&mut self, change: HistoryChange) {
        match change {
            HistoryChange::Inserted(record) | HistoryChange::Updated(record) => {
                self.records.insert(record.date, record);
            }
            HistoryChange::Deleted(date) => {
                self.records.remove(&date);
            }
            HistoryChange::Cleared => self.records.clear(),
            HistoryChange::Unchanged => {}
        }
    }
}

impl FromIterator<CheckInRecord> for CheckInHistory {
    /// Records sharing a date are merged into one
    fn from_iter<I: IntoIterator<Item = CheckInRecord>>(iter: I) -> Self {
        let mut records: BTreeMap<NaiveDate, CheckInRecord> = BTreeMap::new();

        for record in iter {
            match records.get_mut(&record.date) {
                Some(existing) => existing.times.extend(record.times),
                None => {
                    records.insert(record.date, record);
                }
            }
        }

        Self { records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_record_truncates_and_sorts() {
        let record = CheckInRecord::from_times(
            date(),
            [
                NaiveTime::from_hms_opt(8, 15, 30).unwrap(),
                time(7, 0),
                NaiveTime::from_hms_opt(8, 15, 2).unwrap(),
            ],
        )
        .unwrap();

        assert_eq!(record.time_list(), vec![time(7, 0), time(8, 15)]);
    }

    #[test]
    fn test_record_from_no_times() {
        assert!(CheckInRecord::from_times(date(), []).is_none());
    }

    #[test]
    fn test_plan_add_unseen_date_inserts() {
        let history = CheckInHistory::new();
        let change = history.plan_add(date(), time(8, 15));

        assert_eq!(
            change,
            HistoryChange::Inserted(CheckInRecord::new(date(), time(8, 15)))
        );
    }

    #[test]
    fn test_plan_add_is_idempotent() {
        let mut history = CheckInHistory::new();
        history.apply(history.plan_add(date(), time(8, 15)));

        let raw = NaiveTime::from_hms_opt(8, 15, 45).unwrap();
        assert!(history.plan_add(date(), raw).is_unchanged());
    }

    #[test]
    fn test_plan_add_keeps_sorted() {
        let mut history = CheckInHistory::new();
        for t in [time(18, 0), time(6, 30), time(12, 0), time(6, 30)] {
            let change = history.plan_add(date(), t);
            history.apply(change);
        }

        let times = history.get(date()).unwrap().time_list();
        assert_eq!(times, vec![time(6, 30), time(12, 0), time(18, 0)]);
        assert!(times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_plan_remove_last_time_deletes() {
        let mut history = CheckInHistory::new();
        history.apply(history.plan_add(date(), time(7, 0)));

        let change = history.plan_remove(date(), time(7, 0));
        assert_eq!(change, HistoryChange::Deleted(date()));

        history.apply(change);
        assert!(history.get(date()).is_none());
    }

    #[test]
    fn test_plan_remove_missing_is_noop() {
        let mut history = CheckInHistory::new();
        assert!(history.plan_remove(date(), time(7, 0)).is_unchanged());

        history.apply(history.plan_add(date(), time(7, 0)));
        assert!(history.plan_remove(date(), time(9, 0)).is_unchanged());
    }

    #[test]
    fn test_plan_clear() {
        let mut history = CheckInHistory::new();
        assert!(history.plan_clear().is_unchanged());

        history.apply(history.plan_add(date(), time(7, 0)));
        assert_eq!(history.plan_clear(), HistoryChange::Cleared);

        history.apply(HistoryChange::Cleared);
        assert!(history.is_empty());
    }

    #[test]
    fn test_from_iter_merges_same_date() {
        let history: CheckInHistory = [
            CheckInRecord::new(date(), time(9, 0)),
            CheckInRecord::new(date(), time(8, 0)),
        ]
        .into_iter()
        .collect();

        assert_eq!(history.len(), 1);
        assert_eq!(
            history.times_by_date()[&date()],
            vec![time(8, 0), time(9, 0)]
        );
    }
}
