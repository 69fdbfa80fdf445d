mod memory;
mod schema;

pub use memory::MemoryStore;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, Row};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::*;

/// Durable storage for windows and regimens.
///
/// Every method is atomic with respect to every other method on the same
/// store. Sequences of calls are not; callers that need several calls to act
/// as one must serialize them themselves.
///
/// The store does not enforce that windows never overlap. That is the
/// reconciler's job. It does guarantee that exactly one regimen is active
/// whenever any regimen exists, and that a store is never observed without a
/// regimen.
pub trait IntervalStore: Send + Sync {
    /// Windows intersecting `[from, to)`, ascending by start.
    fn fetch_windows(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Window>>;

    fn fetch_window(&self, id: Uuid) -> StoreResult<Option<Window>>;

    /// The latest-starting window with `start <= at < end`.
    fn fetch_active_window(&self, at: DateTime<Utc>) -> StoreResult<Option<Window>>;

    /// The latest-starting window with `start <= before`.
    fn fetch_most_recent_window(
        &self,
        before: DateTime<Utc>,
        kind: Option<WindowKind>,
    ) -> StoreResult<Option<Window>>;

    /// The earliest-starting window with `start >= after`.
    fn fetch_next_window(
        &self,
        after: DateTime<Utc>,
        kind: Option<WindowKind>,
    ) -> StoreResult<Option<Window>>;

    /// Insert or overwrite a window by id and return the stored row.
    ///
    /// `updated_at` is refreshed to now. On first insert `created_at` is the
    /// window's own start so backfilled rows sort with the timeline.
    fn save_window(&self, window: &Window) -> StoreResult<Window>;

    /// Returns whether a row was removed. Deleting a missing id is not an error.
    fn delete_window(&self, id: Uuid) -> StoreResult<bool>;

    /// All regimens by creation order, seeding the default one if empty.
    fn fetch_regimens(&self) -> StoreResult<Vec<Regimen>>;

    fn fetch_regimen(&self, id: Uuid) -> StoreResult<Option<Regimen>>;

    /// The single active regimen, seeding the default one if empty.
    fn fetch_active_regimen(&self) -> StoreResult<Regimen>;

    /// Insert or overwrite a regimen. Saving it with `is_active` set
    /// deactivates every other regimen in the same transaction.
    fn save_regimen(&self, regimen: &Regimen) -> StoreResult<Regimen>;

    /// Delete a regimen. If it was active, the earliest remaining one (or a
    /// freshly seeded default) becomes active in the same transaction.
    fn delete_regimen(&self, id: Uuid) -> StoreResult<bool>;

    /// Make `id` the only active regimen, or with `None` the earliest one.
    ///
    /// Returns `None` and changes nothing when `id` does not exist.
    fn set_active_regimen(&self, id: Option<Uuid>) -> StoreResult<Option<Regimen>>;

    fn snapshot(&self) -> StoreResult<Snapshot>;

    /// Replace the whole store with `snapshot` atomically.
    fn restore(&self, snapshot: &Snapshot) -> StoreResult<()>;

    /// Write the whole store to a single file at `dest`.
    fn export_snapshot(&self, dest: &Path) -> StoreResult<()>;

    /// Replace the whole store with the snapshot file at `source`.
    fn import_snapshot(&self, source: &Path) -> StoreResult<()>;

    /// Remove every window and regimen, then seed the default regimen.
    fn reset(&self) -> StoreResult<()>;
}

const WINDOW_COLUMNS: &str =
    "id, type, start_time, end_time, note, source, created_at, updated_at";
const REGIMEN_COLUMNS: &str =
    "id, name, fast_duration, feed_duration, is_active, created_at, updated_at";

/// SQLite-backed [`IntervalStore`].
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl Database {
    pub fn open(path: PathBuf) -> StoreResult<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::Open("Database path has no parent directory".into()))?;
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Open(e.to_string()))?;
        }
        let conn = Connection::open(&path).map_err(StoreError::open)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(StoreError::open)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    pub fn open_default() -> StoreResult<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::open)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    pub fn migrate(&self) -> StoreResult<()> {
        let conn = self.lock();
        schema::run_migrations(&conn)
    }

    /// Location of the database file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database lock poisoned")
    }

    fn is_live_location(&self, other: &Path) -> bool {
        match &self.path {
            Some(path) => resolve_path(path) == resolve_path(other),
            None => false,
        }
    }
}

/// `<data dir>/fastline.db` for the current user.
pub fn default_path() -> StoreResult<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "fastline")
        .ok_or_else(|| StoreError::Open("Could not determine data directory".into()))?;
    Ok(dirs.data_dir().join("fastline.db"))
}

impl IntervalStore for Database {
    fn fetch_windows(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Window>> {
        let conn = self.lock();
        query_windows(
            &conn,
            &format!(
                "SELECT {WINDOW_COLUMNS} FROM fasting_windows
                 WHERE start_time < ?1 AND end_time > ?2
                 ORDER BY start_time, created_at"
            ),
            (to_epoch(to), to_epoch(from)),
        )
    }

    fn fetch_window(&self, id: Uuid) -> StoreResult<Option<Window>> {
        let conn = self.lock();
        query_window_by_id(&conn, id)
    }

    fn fetch_active_window(&self, at: DateTime<Utc>) -> StoreResult<Option<Window>> {
        let conn = self.lock();
        let windows = query_windows(
            &conn,
            &format!(
                "SELECT {WINDOW_COLUMNS} FROM fasting_windows
                 WHERE start_time <= ?1 AND end_time > ?1
                 ORDER BY start_time DESC, updated_at DESC LIMIT 1"
            ),
            [to_epoch(at)],
        )?;
        Ok(windows.into_iter().next())
    }

    fn fetch_most_recent_window(
        &self,
        before: DateTime<Utc>,
        kind: Option<WindowKind>,
    ) -> StoreResult<Option<Window>> {
        let conn = self.lock();
        let windows = query_windows(
            &conn,
            &format!(
                "SELECT {WINDOW_COLUMNS} FROM fasting_windows
                 WHERE start_time <= ?1 AND (?2 IS NULL OR type = ?2)
                 ORDER BY start_time DESC, updated_at DESC LIMIT 1"
            ),
            (to_epoch(before), kind.map(|k| k.as_str())),
        )?;
        Ok(windows.into_iter().next())
    }

    fn fetch_next_window(
        &self,
        after: DateTime<Utc>,
        kind: Option<WindowKind>,
    ) -> StoreResult<Option<Window>> {
        let conn = self.lock();
        let windows = query_windows(
            &conn,
            &format!(
                "SELECT {WINDOW_COLUMNS} FROM fasting_windows
                 WHERE start_time >= ?1 AND (?2 IS NULL OR type = ?2)
                 ORDER BY start_time ASC, created_at ASC LIMIT 1"
            ),
            (to_epoch(after), kind.map(|k| k.as_str())),
        )?;
        Ok(windows.into_iter().next())
    }

    fn save_window(&self, window: &Window) -> StoreResult<Window> {
        let conn = self.lock();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO fasting_windows (id, type, start_time, end_time, note, source, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                type = excluded.type,
                start_time = excluded.start_time,
                end_time = excluded.end_time,
                note = excluded.note,
                source = excluded.source,
                updated_at = excluded.updated_at",
            (
                window.id.to_string(),
                window.kind.as_str(),
                to_epoch(window.start),
                to_epoch(window.end),
                &window.note,
                window.source.as_str(),
                to_epoch(window.start),
                to_epoch(now),
            ),
        )
        .map_err(StoreError::step)?;

        query_window_by_id(&conn, window.id)?
            .ok_or_else(|| StoreError::Step(format!("window {} vanished after save", window.id)))
    }

    fn delete_window(&self, id: Uuid) -> StoreResult<bool> {
        let conn = self.lock();
        let rows = conn
            .execute("DELETE FROM fasting_windows WHERE id = ?", [id.to_string()])
            .map_err(StoreError::step)?;
        Ok(rows > 0)
    }

    fn fetch_regimens(&self) -> StoreResult<Vec<Regimen>> {
        let mut conn = self.lock();
        ensure_regimens(&mut conn)?;
        query_regimens(
            &conn,
            &format!("SELECT {REGIMEN_COLUMNS} FROM fasting_regimens ORDER BY created_at, rowid"),
            [],
        )
    }

    fn fetch_regimen(&self, id: Uuid) -> StoreResult<Option<Regimen>> {
        let conn = self.lock();
        query_regimen_by_id(&conn, id)
    }

    fn fetch_active_regimen(&self) -> StoreResult<Regimen> {
        let mut conn = self.lock();
        ensure_regimens(&mut conn)?;
        query_regimens(
            &conn,
            &format!("SELECT {REGIMEN_COLUMNS} FROM fasting_regimens WHERE is_active = 1 LIMIT 1"),
            [],
        )?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::Step("no active regimen after seeding".into()))
    }

    fn save_regimen(&self, regimen: &Regimen) -> StoreResult<Regimen> {
        let mut conn = self.lock();
        let now = Utc::now();
        let tx = conn.transaction().map_err(StoreError::execution)?;

        if regimen.is_active {
            tx.execute(
                "UPDATE fasting_regimens SET is_active = 0 WHERE id != ?",
                [regimen.id.to_string()],
            )
            .map_err(StoreError::step)?;
        }

        tx.execute(
            "INSERT INTO fasting_regimens (id, name, fast_duration, feed_duration, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                fast_duration = excluded.fast_duration,
                feed_duration = excluded.feed_duration,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at",
            (
                regimen.id.to_string(),
                &regimen.name,
                regimen.fast_secs,
                regimen.feed_secs,
                regimen.is_active,
                to_epoch(regimen.created_at),
                to_epoch(now),
            ),
        )
        .map_err(StoreError::step)?;

        repair_active(&tx)?;
        tx.commit().map_err(StoreError::step)?;

        query_regimen_by_id(&conn, regimen.id)?
            .ok_or_else(|| StoreError::Step(format!("regimen {} vanished after save", regimen.id)))
    }

    fn delete_regimen(&self, id: Uuid) -> StoreResult<bool> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(StoreError::execution)?;
        let rows = tx
            .execute("DELETE FROM fasting_regimens WHERE id = ?", [id.to_string()])
            .map_err(StoreError::step)?;
        repair_active(&tx)?;
        tx.commit().map_err(StoreError::step)?;
        Ok(rows > 0)
    }

    fn set_active_regimen(&self, id: Option<Uuid>) -> StoreResult<Option<Regimen>> {
        let mut conn = self.lock();
        let now = Utc::now();
        let tx = conn.transaction().map_err(StoreError::execution)?;

        match id {
            Some(id) => {
                tx.execute("UPDATE fasting_regimens SET is_active = 0", [])
                    .map_err(StoreError::step)?;
                let rows = tx
                    .execute(
                        "UPDATE fasting_regimens SET is_active = 1, updated_at = ? WHERE id = ?",
                        (to_epoch(now), id.to_string()),
                    )
                    .map_err(StoreError::step)?;
                if rows == 0 {
                    // Dropping the transaction rolls back the cleared flags
                    return Ok(None);
                }
            }
            None => activate_earliest(&tx)?,
        }

        repair_active(&tx)?;
        tx.commit().map_err(StoreError::step)?;

        let active = query_regimens(
            &conn,
            &format!("SELECT {REGIMEN_COLUMNS} FROM fasting_regimens WHERE is_active = 1 LIMIT 1"),
            [],
        )?;
        Ok(active.into_iter().next())
    }

    fn snapshot(&self) -> StoreResult<Snapshot> {
        let conn = self.lock();
        let windows = query_windows(
            &conn,
            &format!("SELECT {WINDOW_COLUMNS} FROM fasting_windows ORDER BY start_time, created_at"),
            [],
        )?;
        let regimens = query_regimens(
            &conn,
            &format!("SELECT {REGIMEN_COLUMNS} FROM fasting_regimens ORDER BY created_at, rowid"),
            [],
        )?;
        Ok(Snapshot { windows, regimens })
    }

    fn restore(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(StoreError::execution)?;

        tx.execute_batch("DELETE FROM fasting_windows; DELETE FROM fasting_regimens;")
            .map_err(StoreError::execution)?;
        for window in &snapshot.windows {
            insert_window_row(&tx, window)?;
        }
        for regimen in &snapshot.regimens {
            insert_regimen_row(&tx, regimen)?;
        }
        repair_active(&tx)?;

        tx.commit().map_err(StoreError::step)?;
        tracing::info!(
            "Restored snapshot with {} windows and {} regimens",
            snapshot.windows.len(),
            snapshot.regimens.len()
        );
        Ok(())
    }

    fn export_snapshot(&self, dest: &Path) -> StoreResult<()> {
        if self.is_live_location(dest) {
            return Err(StoreError::Snapshot(
                "Refusing to export over the live database".into(),
            ));
        }
        let dest_str = dest
            .to_str()
            .ok_or_else(|| StoreError::Snapshot("Snapshot path is not valid UTF-8".into()))?;

        let conn = self.lock();
        if dest.exists() {
            std::fs::remove_file(dest).map_err(StoreError::snapshot)?;
        }
        conn.execute("VACUUM INTO ?1", [dest_str])
            .map_err(StoreError::execution)?;

        tracing::info!("Exported snapshot to {}", dest.display());
        Ok(())
    }

    fn import_snapshot(&self, source: &Path) -> StoreResult<()> {
        if !source.is_file() {
            return Err(StoreError::Snapshot(format!(
                "Snapshot {} does not exist",
                source.display()
            )));
        }
        if self.is_live_location(source) {
            return Err(StoreError::Snapshot(
                "Refusing to import the live database onto itself".into(),
            ));
        }
        let source_str = source
            .to_str()
            .ok_or_else(|| StoreError::Snapshot("Snapshot path is not valid UTF-8".into()))?;

        let mut conn = self.lock();
        conn.execute("ATTACH DATABASE ?1 AS snapshot", [source_str])
            .map_err(StoreError::open)?;

        let result = copy_from_attached(&mut conn);

        // Detach even when the copy failed so the connection stays usable
        let detached = conn
            .execute("DETACH DATABASE snapshot", [])
            .map_err(StoreError::execution);

        result?;
        detached?;

        tracing::info!("Imported snapshot from {}", source.display());
        Ok(())
    }

    fn reset(&self) -> StoreResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(StoreError::execution)?;
        tx.execute_batch("DELETE FROM fasting_windows; DELETE FROM fasting_regimens;")
            .map_err(StoreError::execution)?;
        insert_regimen_row(&tx, &Regimen::default_regimen())?;
        tx.commit().map_err(StoreError::step)?;

        tracing::info!("Store reset to the default regimen");
        Ok(())
    }
}

// ============================================================
// Row helpers
// ============================================================

fn query_windows<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> StoreResult<Vec<Window>> {
    let mut stmt = conn.prepare(sql).map_err(StoreError::prepare)?;
    let windows = stmt
        .query_map(params, window_from_row)
        .map_err(StoreError::step)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::step)?;
    Ok(windows)
}

fn query_window_by_id(conn: &Connection, id: Uuid) -> StoreResult<Option<Window>> {
    let windows = query_windows(
        conn,
        &format!("SELECT {WINDOW_COLUMNS} FROM fasting_windows WHERE id = ?"),
        [id.to_string()],
    )?;
    Ok(windows.into_iter().next())
}

fn window_from_row(row: &Row<'_>) -> rusqlite::Result<Window> {
    Ok(Window {
        id: parse_uuid(row.get::<_, String>(0)?),
        kind: WindowKind::from_str(&row.get::<_, String>(1)?).unwrap_or(WindowKind::Fast),
        start: from_epoch(row.get(2)?),
        end: from_epoch(row.get(3)?),
        note: row.get(4)?,
        source: WindowSource::from_str(&row.get::<_, String>(5)?).unwrap_or(WindowSource::User),
        created_at: from_epoch(row.get(6)?),
        updated_at: from_epoch(row.get(7)?),
    })
}

fn query_regimens<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> StoreResult<Vec<Regimen>> {
    let mut stmt = conn.prepare(sql).map_err(StoreError::prepare)?;
    let regimens = stmt
        .query_map(params, regimen_from_row)
        .map_err(StoreError::step)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::step)?;
    Ok(regimens)
}

fn query_regimen_by_id(conn: &Connection, id: Uuid) -> StoreResult<Option<Regimen>> {
    let regimens = query_regimens(
        conn,
        &format!("SELECT {REGIMEN_COLUMNS} FROM fasting_regimens WHERE id = ?"),
        [id.to_string()],
    )?;
    Ok(regimens.into_iter().next())
}

fn regimen_from_row(row: &Row<'_>) -> rusqlite::Result<Regimen> {
    Ok(Regimen {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        fast_secs: row.get(2)?,
        feed_secs: row.get(3)?,
        is_active: row.get(4)?,
        created_at: from_epoch(row.get(5)?),
        updated_at: from_epoch(row.get(6)?),
    })
}

fn insert_window_row(conn: &Connection, window: &Window) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO fasting_windows (id, type, start_time, end_time, note, source, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            window.id.to_string(),
            window.kind.as_str(),
            to_epoch(window.start),
            to_epoch(window.end),
            &window.note,
            window.source.as_str(),
            to_epoch(window.created_at),
            to_epoch(window.updated_at),
        ),
    )
    .map_err(StoreError::step)?;
    Ok(())
}

fn insert_regimen_row(conn: &Connection, regimen: &Regimen) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO fasting_regimens (id, name, fast_duration, feed_duration, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            regimen.id.to_string(),
            &regimen.name,
            regimen.fast_secs,
            regimen.feed_secs,
            regimen.is_active,
            to_epoch(regimen.created_at),
            to_epoch(regimen.updated_at),
        ),
    )
    .map_err(StoreError::step)?;
    Ok(())
}

// ============================================================
// Active regimen bookkeeping
// ============================================================

/// Seed or repair the regimen table inside its own transaction.
fn ensure_regimens(conn: &mut Connection) -> StoreResult<()> {
    let tx = conn.transaction().map_err(StoreError::execution)?;
    repair_active(&tx)?;
    tx.commit().map_err(StoreError::step)
}

/// Restore "exactly one active regimen, at least one regimen".
fn repair_active(conn: &Connection) -> StoreResult<()> {
    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM fasting_regimens", [], |row| row.get(0))
        .map_err(StoreError::step)?;

    if total == 0 {
        insert_regimen_row(conn, &Regimen::default_regimen())?;
        tracing::info!("Seeded default regimen");
        return Ok(());
    }

    let active: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM fasting_regimens WHERE is_active = 1",
            [],
            |row| row.get(0),
        )
        .map_err(StoreError::step)?;

    if active != 1 {
        activate_earliest(conn)?;
    }
    Ok(())
}

fn activate_earliest(conn: &Connection) -> StoreResult<()> {
    conn.execute("UPDATE fasting_regimens SET is_active = 0", [])
        .map_err(StoreError::step)?;
    let rows = conn
        .execute(
            "UPDATE fasting_regimens SET is_active = 1, updated_at = ?
             WHERE id = (SELECT id FROM fasting_regimens ORDER BY created_at, rowid LIMIT 1)",
            [to_epoch(Utc::now())],
        )
        .map_err(StoreError::step)?;

    if rows == 0 {
        insert_regimen_row(conn, &Regimen::default_regimen())?;
        tracing::info!("Seeded default regimen");
    } else {
        tracing::debug!("Promoted earliest regimen to active");
    }
    Ok(())
}

fn copy_from_attached(conn: &mut Connection) -> StoreResult<()> {
    let tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM snapshot.sqlite_master
             WHERE type = 'table' AND name IN ('fasting_windows', 'fasting_regimens')",
            [],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::Snapshot(format!("Unreadable snapshot: {e}")))?;
    if tables != 2 {
        return Err(StoreError::Snapshot(
            "Snapshot is missing the fasting tables".into(),
        ));
    }

    let tx = conn.transaction().map_err(StoreError::execution)?;
    tx.execute_batch(&format!(
        "DELETE FROM main.fasting_windows;
         DELETE FROM main.fasting_regimens;
         INSERT INTO main.fasting_windows ({WINDOW_COLUMNS})
             SELECT {WINDOW_COLUMNS} FROM snapshot.fasting_windows;
         INSERT INTO main.fasting_regimens ({REGIMEN_COLUMNS})
             SELECT {REGIMEN_COLUMNS} FROM snapshot.fasting_regimens;"
    ))
    .map_err(StoreError::execution)?;
    repair_active(&tx)?;
    tx.commit().map_err(StoreError::step)
}

// ============================================================
// Conversions
// ============================================================

/// Seconds since the Unix epoch, with microsecond precision.
pub(crate) fn to_epoch(at: DateTime<Utc>) -> f64 {
    at.timestamp() as f64 + f64::from(at.timestamp_subsec_micros()) / 1_000_000.0
}

pub(crate) fn from_epoch(secs: f64) -> DateTime<Utc> {
    let whole = secs.floor();
    let micros = ((secs - whole) * 1_000_000.0).round() as i64;
    DateTime::from_timestamp(whole as i64, 0)
        .map(|at| at + Duration::microseconds(micros))
        .unwrap_or_default()
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_default()
}

/// Best-effort absolute form of `path`, usable for files that do not exist yet.
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            parent
                .canonicalize()
                .map(|p| p.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_epoch_conversion_keeps_whole_seconds_exact() {
        let at = Utc.with_ymd_and_hms(2026, 2, 14, 7, 30, 15).unwrap();
        assert_eq!(from_epoch(to_epoch(at)), at);
    }

    #[test]
    fn test_epoch_conversion_keeps_microseconds() {
        let at = Utc.with_ymd_and_hms(2026, 2, 14, 7, 30, 15).unwrap()
            + Duration::microseconds(250_125);
        assert_eq!(from_epoch(to_epoch(at)), at);
    }

    #[test]
    fn test_fetch_windows_rejects_bad_sql_as_prepare_error() {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        let conn = db.lock();
        let err = query_windows(&conn, "SELECT nope FROM missing_table", []).unwrap_err();
        assert!(matches!(err, StoreError::Prepare(_)));
    }
}
