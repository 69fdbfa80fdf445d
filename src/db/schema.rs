use rusqlite::Connection;

use crate::error::{StoreError, StoreResult};

struct Migration {
    version: &'static str,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001",
        name: "initial",
        sql: include_str!("migrations/001_initial.sql"),
    },
    Migration {
        version: "002",
        name: "window_type_index",
        sql: include_str!("migrations/002_window_type_index.sql"),
    },
];

pub fn run_migrations(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .map_err(StoreError::execution)?;

    // Tables created before version tracking existed count as 001
    if check_needs_baseline(conn)? {
        mark_migration_applied(conn, "001", "initial")?;
        tracing::info!("Detected existing database, marked migration 001 as applied");
    }

    let applied = get_applied_migrations(conn)?;

    for migration in MIGRATIONS {
        if !applied.iter().any(|v| v == migration.version) {
            apply_migration(conn, migration)?;
        }
    }

    Ok(())
}

fn check_needs_baseline(conn: &Connection) -> StoreResult<bool> {
    let migration_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
        .map_err(StoreError::step)?;

    if migration_count > 0 {
        return Ok(false);
    }

    let tables_exist: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='fasting_windows'",
            [],
            |row| row.get(0),
        )
        .map_err(StoreError::step)?;

    Ok(tables_exist > 0)
}

fn get_applied_migrations(conn: &Connection) -> StoreResult<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT version FROM schema_migrations ORDER BY version")
        .map_err(StoreError::prepare)?;
    let versions = stmt
        .query_map([], |row| row.get(0))
        .map_err(StoreError::step)?
        .collect::<Result<Vec<String>, _>>()
        .map_err(StoreError::step)?;
    Ok(versions)
}

fn mark_migration_applied(conn: &Connection, version: &str, name: &str) -> StoreResult<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)",
        (version, name, &now),
    )
    .map_err(StoreError::step)?;
    Ok(())
}

fn apply_migration(conn: &Connection, migration: &Migration) -> StoreResult<()> {
    tracing::info!(
        "Applying migration {}: {}",
        migration.version,
        migration.name
    );

    conn.execute_batch(&format!("BEGIN TRANSACTION; {} COMMIT;", migration.sql))
        .map_err(|e| {
            StoreError::Execution(format!(
                "migration {} ({}): {}",
                migration.version, migration.name, e
            ))
        })?;

    mark_migration_applied(conn, migration.version, migration.name)?;

    tracing::info!("Migration {} applied successfully", migration.version);
    Ok(())
}
