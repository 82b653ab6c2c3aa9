use rusqlite::Connection;

use crate::{Error, Result};

const SCHEMA_VERSION: i32 = 2;

pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    ensure_migration_table(conn)?;

    let current_version = get_schema_version(conn)?;

    if current_version > SCHEMA_VERSION {
        return Err(Error::Internal(format!(
            "Database schema version ({}) is newer than supported version ({}). Please update the \
             app.",
            current_version, SCHEMA_VERSION
        )));
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        apply_migration(conn, version).map_err(|e| {
            Error::Internal(format!("Failed to apply migration {}: {}", version, e))
        })?;
        tracing::info!(version, "Applied schema migration");
    }

    Ok(())
}

fn ensure_migration_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migration (
            id INTEGER PRIMARY KEY
        )",
        [],
    )?;
    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32> {
    let version = conn.query_row("SELECT COALESCE(MAX(id), 0) FROM migration", [], |row| {
        row.get(0)
    })?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("INSERT INTO migration (id) VALUES (?1)", [version])?;
    Ok(())
}

fn apply_migration(conn: &mut Connection, version: i32) -> Result<()> {
    let tx = conn.transaction()?;

    match version {
        1 => migration_v1(&tx)?,
        2 => migration_v2(&tx)?,
        _ => {
            return Err(Error::Internal(format!(
                "Unknown migration version: {}",
                version
            )));
        }
    }

    set_schema_version(&tx, version)?;
    tx.commit()?;

    Ok(())
}

/// One row per date; `time_list` is a JSON array of "HH:MM" strings
fn migration_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE check_ins(
            date TEXT PRIMARY KEY NOT NULL,
            time_list TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn migration_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE preferences(
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::*;

    const EXPECTED_TABLES: &[&str] = &["check_ins", "preferences", "migration"];

    #[test]
    fn test_full_migration_sequence() {
        let mut conn = Connection::open_in_memory().unwrap();

        run_migrations(&mut conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(
            version, SCHEMA_VERSION,
            "Schema version should match expected"
        );

        for &table_name in EXPECTED_TABLES {
            assert!(
                table_exists(&conn, table_name),
                "Table '{}' should exist after migrations",
                table_name
            );
        }

        assert!(
            column_exists(&conn, "check_ins", "time_list"),
            "check_ins should have time_list column"
        );
    }

    #[test]
    fn test_incremental_migrations() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_migration_table(&conn).unwrap();

        for expected_version in 1..=SCHEMA_VERSION {
            apply_migration(&mut conn, expected_version).unwrap();

            let actual_version = get_schema_version(&conn).unwrap();

            assert_eq!(
                actual_version, expected_version,
                "Schema version should be {} after migration {}",
                expected_version, expected_version
            );
        }
    }

    #[test]
    fn test_migration_idempotency() {
        let mut conn = Connection::open_in_memory().unwrap();

        // Run migrations twice
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION, "Version should remain stable");
    }

    #[test]
    fn test_future_schema_version_error() {
        let mut conn = Connection::open_in_memory().unwrap();

        conn.execute("CREATE TABLE migration (id INTEGER PRIMARY KEY)", [])
            .unwrap();
        conn.execute(
            "INSERT INTO migration (id) VALUES (?1)",
            [SCHEMA_VERSION + 100],
        )
        .unwrap();

        let result = run_migrations(&mut conn);

        assert!(result.is_err(), "Should error on future schema version");

        let error_msg = result.unwrap_err().to_string();

        assert!(
            error_msg.contains("newer than supported"),
            "Error should mention version incompatibility, got: {}",
            error_msg
        );
    }

    #[test]
    fn test_unknown_migration_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_migration_table(&conn).unwrap();

        assert!(apply_migration(&mut conn, SCHEMA_VERSION + 1).is_err());
        assert_eq!(get_schema_version(&conn).unwrap(), 0);
    }

    fn table_exists(conn: &Connection, table_name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master
             WHERE type = 'table' AND name = ?1",
            [table_name],
            |row| row.get(0),
        )
        .unwrap_or(false)
    }

    fn column_exists(conn: &Connection, table_name: &str, column_name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info(?1)
             WHERE name = ?2",
            [table_name, column_name],
            |row| row.get(0),
        )
        .unwrap_or(false)
    }
}
