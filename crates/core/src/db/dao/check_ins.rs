use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::params;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{CheckInHistory, CheckInRecord};
use crate::utils::time::{format_time, parse_time};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct CheckInDao {
    db: Arc<Database>,
}

impl CheckInDao {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store the record for a date, replacing any row already under that key
    pub fn insert(&self, record: &CheckInRecord) -> Result<()> {
        let (key, value) = encode_record(record)?;

        tracing::debug!(date = %key, times = %value, "Inserting check-in entry");

        self.db.with_connection(|conn| {
            conn.execute(
                r#"
                INSERT INTO check_ins (date, time_list) VALUES (?1, ?2)
                ON CONFLICT(date) DO UPDATE SET time_list = ?2
                "#,
                params![key, value],
            )?;
            Ok(())
        })
    }

    pub fn update(&self, record: &CheckInRecord) -> Result<()> {
        let (key, value) = encode_record(record)?;

        tracing::debug!(date = %key, times = %value, "Updating check-in entry");

        let changed = self.db.with_connection(|conn| {
            Ok(conn.execute(
                "UPDATE check_ins SET time_list = ?2 WHERE date = ?1",
                params![key, value],
            )?)
        })?;

        if changed == 0 {
            return Err(Error::NotFound(format!("No check-ins stored for {}", key)));
        }

        Ok(())
    }

    pub fn delete_date(&self, date: NaiveDate) -> Result<()> {
        let key = encode_date(date);

        tracing::debug!(date = %key, "Deleting check-in entry");

        let deleted = self.db.with_connection(|conn| {
            Ok(conn.execute("DELETE FROM check_ins WHERE date = ?1", params![key])?)
        })?;

        if deleted == 0 {
            return Err(Error::NotFound(format!("No check-ins stored for {}", key)));
        }

        Ok(())
    }

    /// Returns the number of deleted rows
    pub fn delete_all(&self) -> Result<usize> {
        let deleted = self
            .db
            .with_connection(|conn| Ok(conn.execute("DELETE FROM check_ins", [])?))?;

        tracing::debug!(deleted, "Deleted all check-in entries");

        Ok(deleted)
    }

    /// Every stored record. Rows that cannot be parsed are skipped.
    pub fn get_all_entries(&self) -> Result<CheckInHistory> {
        let rows = self.db.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT date, time_list FROM check_ins ORDER BY date")?;

            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })?;

        Ok(rows
            .iter()
            .filter_map(|(key, value)| decode_record(key, value))
            .collect())
    }
}

fn encode_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Serialize a time list as a JSON array of "HH:MM" strings, ascending
pub fn encode_time_list<I>(times: I) -> Result<String>
where
    I: IntoIterator<Item = NaiveTime>,
{
    let strings: Vec<String> = times.into_iter().map(format_time).collect();
    Ok(serde_json::to_string(&strings)?)
}

/// Parse a JSON time list. Entries that are not valid times are dropped.
pub fn decode_time_list(value: &str) -> Result<Vec<NaiveTime>> {
    let strings: Vec<String> = serde_json::from_str(value)?;

    Ok(strings
        .iter()
        .filter_map(|s| {
            let time = parse_time(s);
            if time.is_none() {
                tracing::warn!(value = %s, "Dropping malformed check-in time");
            }
            time
        })
        .collect())
}

fn encode_record(record: &CheckInRecord) -> Result<(String, String)> {
    Ok((encode_date(record.date()), encode_time_list(record.times())?))
}

fn decode_record(key: &str, value: &str) -> Option<CheckInRecord> {
    let date = match NaiveDate::parse_from_str(key, DATE_FORMAT) {
        Ok(date) => date,
        Err(e) => {
            tracing::warn!(date = %key, error = %e, "Skipping check-in row with malformed date");
            return None;
        }
    };

    // Writes always use the zero-padded key, so a row like "2025-9-1" could
    // never be updated or deleted
    if encode_date(date) != key {
        tracing::warn!(date = %key, "Skipping check-in row with non-canonical date");
        return None;
    }

    let times = match decode_time_list(value) {
        Ok(times) => times,
        Err(e) => {
            tracing::warn!(date = %key, error = %e, "Skipping check-in row with malformed time list");
            return None;
        }
    };

    let record = CheckInRecord::from_times(date, times);
    if record.is_none() {
        tracing::warn!(date = %key, "Skipping check-in row without times");
    }

    record
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    fn setup_test_db() -> Arc<Database> {
        let temp_dir = env::temp_dir();
        let db_path = temp_dir.join(format!("test_check_ins_{}.db", uuid::Uuid::new_v4()));
        Database::open(&db_path).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn insert_raw(db: &Database, key: &str, value: &str) {
        db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO check_ins (date, time_list) VALUES (?1, ?2)",
                params![key, value],
            )?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_time_list_round_trip() {
        let times = vec![time(7, 0), time(8, 15), time(23, 59)];
        let encoded = encode_time_list(times.clone()).unwrap();

        assert_eq!(encoded, r#"["07:00","08:15","23:59"]"#);
        assert_eq!(decode_time_list(&encoded).unwrap(), times);
    }

    #[test]
    fn test_encode_truncates_seconds() {
        let raw = NaiveTime::from_hms_opt(14, 32, 51).unwrap();
        assert_eq!(encode_time_list([raw]).unwrap(), r#"["14:32"]"#);
    }

    #[test]
    fn test_insert_and_get_all() {
        let dao = CheckInDao::new(setup_test_db());
        let record = CheckInRecord::from_times(date(1), [time(8, 15), time(7, 0)]).unwrap();

        dao.insert(&record).unwrap();

        let history = dao.get_all_entries().unwrap();
        assert_eq!(history.get(date(1)), Some(&record));
        assert_eq!(history.get(date(2)), None);
    }

    #[test]
    fn test_stored_format() {
        let db = setup_test_db();
        let dao = CheckInDao::new(Arc::clone(&db));
        let record = CheckInRecord::from_times(date(1), [time(8, 15), time(7, 0)]).unwrap();
        dao.insert(&record).unwrap();

        let (key, value): (String, String) = db
            .with_connection(|conn| {
                Ok(conn.query_row("SELECT date, time_list FROM check_ins", [], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?)
            })
            .unwrap();

        assert_eq!(key, "2025-09-01");
        assert_eq!(value, r#"["07:00","08:15"]"#);
    }

    #[test]
    fn test_update_missing_entry() {
        let dao = CheckInDao::new(Database::open_in_memory().unwrap());
        let record = CheckInRecord::new(date(1), time(7, 0));

        let err = dao.update(&record).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_date_and_all() {
        let dao = CheckInDao::new(Database::open_in_memory().unwrap());
        for d in 1..=3 {
            dao.insert(&CheckInRecord::new(date(d), time(7, 0))).unwrap();
        }

        dao.delete_date(date(2)).unwrap();
        assert_eq!(dao.get_all_entries().unwrap().len(), 2);

        let err = dao.delete_date(date(2)).unwrap_err();
        assert!(err.is_not_found());

        assert_eq!(dao.delete_all().unwrap(), 2);
        assert!(dao.get_all_entries().unwrap().is_empty());
    }

    #[test]
    fn test_get_all_skips_malformed_rows() {
        let db = Database::open_in_memory().unwrap();
        insert_raw(&db, "2025-09-01", r#"["07:00"]"#);
        insert_raw(&db, "not-a-date", r#"["07:00"]"#);
        insert_raw(&db, "2025-09-02", "not json");
        insert_raw(&db, "2025-09-03", "[]");
        insert_raw(&db, "2025-09-04", r#"["9am", "10:30:15"]"#);

        let history = CheckInDao::new(db).get_all_entries().unwrap();

        assert_eq!(history.len(), 2);
        assert!(history.contains_date(date(1)));
        assert_eq!(history.get(date(4)).unwrap().time_list(), vec![time(10, 30)]);
    }

    #[test]
    fn test_get_all_skips_unpadded_dates() {
        let db = Database::open_in_memory().unwrap();
        insert_raw(&db, "2025-9-1", r#"["07:00"]"#);
        insert_raw(&db, "2025-09-02", r#"["07:00"]"#);

        let dao = CheckInDao::new(db);
        let history = dao.get_all_entries().unwrap();

        assert_eq!(history.len(), 1);
        assert!(!history.contains_date(date(1)));
        assert!(dao.delete_date(date(1)).unwrap_err().is_not_found());
        assert!(dao.update(&CheckInRecord::new(date(1), time(9, 0))).unwrap_err().is_not_found());
    }

    #[test]
    fn test_insert_replaces_malformed_row() {
        let db = Database::open_in_memory().unwrap();
        insert_raw(&db, "2025-09-01", "not json");

        let dao = CheckInDao::new(db);
        let record = CheckInRecord::new(date(1), time(7, 0));
        dao.insert(&record).unwrap();

        assert_eq!(dao.get_all_entries().unwrap().get(date(1)), Some(&record));
    }
}
