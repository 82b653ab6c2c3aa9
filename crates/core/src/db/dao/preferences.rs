use std::collections::HashMap;
use std::sync::Arc;

use rusqlite::params;

use crate::db::Database;
use crate::error::Result;

/// Plain string key-value access to the `preferences` table
#[derive(Clone)]
pub struct PreferencesDao {
    db: Arc<Database>,
}

impl PreferencesDao {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn get_all(&self) -> Result<HashMap<String, String>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT key, value FROM preferences")?;

            let values = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<HashMap<_, _>, _>>()?;

            Ok(values)
        })
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db.with_connection(|conn| {
            conn.execute(
                r#"
                INSERT INTO preferences (key, value) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET value = ?2
                "#,
                params![key, value],
            )?;
            Ok(())
        })
    }

    /// Write several keys atomically
    pub fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        self.db.transaction(|tx| {
            for (key, value) in entries {
                tx.execute(
                    r#"
                    INSERT INTO preferences (key, value) VALUES (?1, ?2)
                    ON CONFLICT(key) DO UPDATE SET value = ?2
                    "#,
                    params![key, value],
                )?;
            }

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites() {
        let dao = PreferencesDao::new(Database::open_in_memory().unwrap());

        assert!(dao.get_all().unwrap().is_empty());

        dao.set("theme", "dark").unwrap();
        dao.set("theme", "light").unwrap();

        let all = dao.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["theme"], "light");
    }

    #[test]
    fn test_set_many() {
        let dao = PreferencesDao::new(Database::open_in_memory().unwrap());

        dao.set_many(&[
            ("mbr_id", "MBR123".to_string()),
            ("first_name", "Sam".to_string()),
        ])
        .unwrap();

        let all = dao.get_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["mbr_id"], "MBR123");
    }
}
