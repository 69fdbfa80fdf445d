//! In-memory [`IntervalStore`] for tests and previews.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::IntervalStore;
use crate::error::{StoreError, StoreResult};
use crate::models::*;

#[derive(Debug, Default, Clone)]
struct MemoryState {
    windows: HashMap<Uuid, Window>,
    /// Kept in creation order.
    regimens: Vec<Regimen>,
}

impl MemoryState {
    fn repair_active(&mut self) {
        if self.regimens.is_empty() {
            self.regimens.push(Regimen::default_regimen());
            return;
        }
        if self.regimens.iter().filter(|r| r.is_active).count() != 1 {
            self.activate_earliest();
        }
    }

    fn activate_earliest(&mut self) {
        for regimen in &mut self.regimens {
            regimen.is_active = false;
        }
        match self.regimens.first_mut() {
            Some(first) => {
                first.is_active = true;
                first.updated_at = Utc::now();
            }
            None => self.regimens.push(Regimen::default_regimen()),
        }
    }

    fn sorted_windows(&self) -> Vec<Window> {
        let mut windows: Vec<Window> = self.windows.values().cloned().collect();
        windows.sort_by(|a, b| a.start.cmp(&b.start).then(a.created_at.cmp(&b.created_at)));
        windows
    }
}

/// Mapping-backed store with the same guarantees as the SQLite one.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory store lock poisoned")
    }
}

fn kind_matches(window: &Window, kind: Option<WindowKind>) -> bool {
    kind.map_or(true, |k| window.kind == k)
}

impl IntervalStore for MemoryStore {
    fn fetch_windows(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Window>> {
        let state = self.lock();
        Ok(state
            .sorted_windows()
            .into_iter()
            .filter(|w| w.intersects(from, to))
            .collect())
    }

    fn fetch_window(&self, id: Uuid) -> StoreResult<Option<Window>> {
        Ok(self.lock().windows.get(&id).cloned())
    }

    fn fetch_active_window(&self, at: DateTime<Utc>) -> StoreResult<Option<Window>> {
        let state = self.lock();
        Ok(state
            .windows
            .values()
            .filter(|w| w.covers(at))
            .max_by(|a, b| a.start.cmp(&b.start).then(a.updated_at.cmp(&b.updated_at)))
            .cloned())
    }

    fn fetch_most_recent_window(
        &self,
        before: DateTime<Utc>,
        kind: Option<WindowKind>,
    ) -> StoreResult<Option<Window>> {
        let state = self.lock();
        Ok(state
            .windows
            .values()
            .filter(|w| w.start <= before && kind_matches(w, kind))
            .max_by(|a, b| a.start.cmp(&b.start).then(a.updated_at.cmp(&b.updated_at)))
            .cloned())
    }

    fn fetch_next_window(
        &self,
        after: DateTime<Utc>,
        kind: Option<WindowKind>,
    ) -> StoreResult<Option<Window>> {
        let state = self.lock();
        Ok(state
            .sorted_windows()
            .into_iter()
            .find(|w| w.start >= after && kind_matches(w, kind)))
    }

    fn save_window(&self, window: &Window) -> StoreResult<Window> {
        let mut state = self.lock();
        let mut stored = window.clone();
        stored.created_at = state
            .windows
            .get(&window.id)
            .map(|existing| existing.created_at)
            .unwrap_or(window.start);
        stored.updated_at = Utc::now();
        state.windows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn delete_window(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.lock().windows.remove(&id).is_some())
    }

    fn fetch_regimens(&self) -> StoreResult<Vec<Regimen>> {
        let mut state = self.lock();
        state.repair_active();
        Ok(state.regimens.clone())
    }

    fn fetch_regimen(&self, id: Uuid) -> StoreResult<Option<Regimen>> {
        Ok(self.lock().regimens.iter().find(|r| r.id == id).cloned())
    }

    fn fetch_active_regimen(&self) -> StoreResult<Regimen> {
        let mut state = self.lock();
        state.repair_active();
        state
            .regimens
            .iter()
            .find(|r| r.is_active)
            .cloned()
            .ok_or_else(|| StoreError::Step("no active regimen after seeding".into()))
    }

    fn save_regimen(&self, regimen: &Regimen) -> StoreResult<Regimen> {
        let mut state = self.lock();
        let mut stored = regimen.clone();
        stored.updated_at = Utc::now();

        if stored.is_active {
            for other in &mut state.regimens {
                other.is_active = false;
            }
        }

        match state.regimens.iter().position(|r| r.id == regimen.id) {
            Some(idx) => {
                stored.created_at = state.regimens[idx].created_at;
                state.regimens[idx] = stored.clone();
            }
            None => state.regimens.push(stored.clone()),
        }
        state.repair_active();

        state
            .regimens
            .iter()
            .find(|r| r.id == regimen.id)
            .cloned()
            .ok_or_else(|| StoreError::Step(format!("regimen {} vanished after save", regimen.id)))
    }

    fn delete_regimen(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.lock();
        let before = state.regimens.len();
        state.regimens.retain(|r| r.id != id);
        let removed = state.regimens.len() != before;
        state.repair_active();
        Ok(removed)
    }

    fn set_active_regimen(&self, id: Option<Uuid>) -> StoreResult<Option<Regimen>> {
        let mut state = self.lock();

        // Work on a copy so an unknown id leaves the store untouched
        let mut next = state.clone();
        match id {
            Some(id) => {
                if !next.regimens.iter().any(|r| r.id == id) {
                    return Ok(None);
                }
                for regimen in &mut next.regimens {
                    regimen.is_active = regimen.id == id;
                    if regimen.is_active {
                        regimen.updated_at = Utc::now();
                    }
                }
            }
            None => next.activate_earliest(),
        }
        next.repair_active();
        *state = next;

        Ok(state.regimens.iter().find(|r| r.is_active).cloned())
    }

    fn snapshot(&self) -> StoreResult<Snapshot> {
        let state = self.lock();
        Ok(Snapshot {
            windows: state.sorted_windows(),
            regimens: state.regimens.clone(),
        })
    }

    fn restore(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let mut next = MemoryState {
            windows: snapshot
                .windows
                .iter()
                .map(|w| (w.id, w.clone()))
                .collect(),
            regimens: snapshot.regimens.clone(),
        };
        next.regimens.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        next.repair_active();

        *self.lock() = next;
        Ok(())
    }

    fn export_snapshot(&self, dest: &Path) -> StoreResult<()> {
        let snapshot = self.snapshot()?;
        let json = serde_json::to_string_pretty(&snapshot).map_err(StoreError::snapshot)?;
        std::fs::write(dest, json).map_err(StoreError::snapshot)?;
        tracing::info!("Exported snapshot to {}", dest.display());
        Ok(())
    }

    fn import_snapshot(&self, source: &Path) -> StoreResult<()> {
        let json = std::fs::read_to_string(source).map_err(StoreError::snapshot)?;
        let snapshot: Snapshot = serde_json::from_str(&json).map_err(StoreError::snapshot)?;
        self.restore(&snapshot)?;
        tracing::info!("Imported snapshot from {}", source.display());
        Ok(())
    }

    fn reset(&self) -> StoreResult<()> {
        let mut state = self.lock();
        state.windows.clear();
        state.regimens = vec![Regimen::default_regimen()];
        Ok(())
    }
}
