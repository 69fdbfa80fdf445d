//! The timeline reconciler.
//!
//! [`Timeline`] owns the cached view of the fasting schedule and implements
//! every mutation of it. Start and stop run multi-step read-modify-write
//! sequences against the [`IntervalStore`] that trim overlaps, reuse nearby
//! placeholders instead of duplicating them, and keep one planned window
//! ahead of the current one. Each store call commits on its own, so a failed
//! operation may leave an intermediate state; re-running it converges.
//!
//! Operations take `&mut self`, which serializes them per timeline.

use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::IntervalStore;
use crate::durations::{effective_durations, Durations, Tolerances};
use crate::error::{Result, TimelineError};
use crate::models::*;
use crate::reminders::{self, NotificationScheduler, DEFAULT_UPCOMING_FASTS};
use crate::summary::{self, DaySummary, HistoryGroup};

/// Default lead time for early reminders.
pub const DEFAULT_LEAD_TIME_MINUTES: i64 = 30;

/// State reloaded by [`Timeline::refresh`].
#[derive(Debug, Clone, Default)]
struct Cached {
    active_window: Option<Window>,
    is_fasting: bool,
    durations: Durations,
    today: Vec<Window>,
    weekly: Vec<DaySummary>,
    history: Vec<HistoryGroup>,
    reminders: Vec<ReminderEvent>,
    last_error: Option<String>,
}

pub struct Timeline<S: IntervalStore> {
    store: S,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn NotificationScheduler>,
    tolerances: Tolerances,
    lead_time: Duration,
    upcoming_fasts: usize,
    cached: Cached,
}

impl<S: IntervalStore> Timeline<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, scheduler: Arc<dyn NotificationScheduler>) -> Self {
        Self {
            store,
            clock,
            scheduler,
            tolerances: Tolerances::default(),
            lead_time: Duration::minutes(DEFAULT_LEAD_TIME_MINUTES),
            upcoming_fasts: DEFAULT_UPCOMING_FASTS,
            cached: Cached::default(),
        }
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    pub fn with_lead_time(mut self, lead_time: Duration) -> Self {
        self.lead_time = lead_time.max(Duration::zero());
        self
    }

    pub fn with_upcoming_fasts(mut self, upcoming_fasts: usize) -> Self {
        self.upcoming_fasts = upcoming_fasts;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn active_window(&self) -> Option<&Window> {
        self.cached.active_window.as_ref()
    }

    pub fn is_fasting(&self) -> bool {
        self.cached.is_fasting
    }

    pub fn configured_durations(&self) -> Durations {
        self.cached.durations
    }

    /// Windows intersecting the current local day, as of the last refresh.
    pub fn today_windows(&self) -> &[Window] {
        &self.cached.today
    }

    pub fn weekly_summary(&self) -> &[DaySummary] {
        &self.cached.weekly
    }

    pub fn history(&self) -> &[HistoryGroup] {
        &self.cached.history
    }

    pub fn reminder_events(&self) -> &[ReminderEvent] {
        &self.cached.reminders
    }

    pub fn lead_time(&self) -> Duration {
        self.lead_time
    }

    /// Message of the most recent failed operation, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.cached.last_error.as_deref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// `[start, end)` of the current local day.
    pub fn today_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        summary::day_bounds(self.clock.now(), &self.clock.local_offset())
    }

    // ============================================================
    // Refresh
    // ============================================================

    /// Reload every cached projection and resync reminders.
    pub fn refresh(&mut self) -> Result<()> {
        let result = self.reload();
        self.record(result)
    }

    fn reload(&mut self) -> Result<()> {
        let now = self.clock.now();
        let tz = self.clock.local_offset();

        let regimen = self.store.fetch_active_regimen()?;
        self.cached.durations = effective_durations(Some(&regimen));

        let (day_start, day_end) = summary::day_bounds(now, &tz);
        self.cached.today = self.store.fetch_windows(day_start, day_end)?;

        let active = self.store.fetch_active_window(now)?;
        self.cached.is_fasting = active.as_ref().is_some_and(Window::is_fast);
        self.cached.active_window = active;

        let week = self
            .store
            .fetch_windows(summary::rolling_start(now, &tz), day_end)?;
        self.cached.weekly =
            summary::weekly_summary(&week, self.cached.durations.fast(), now, &tz);
        self.cached.history = summary::group_history(&week, now, &tz);

        self.resync_reminders(now)
    }

    fn resync_reminders(&mut self, now: DateTime<Utc>) -> Result<()> {
        let candidates = reminders::collect_candidates(
            &self.store,
            self.cached.active_window.as_ref(),
            &self.cached.today,
            now,
            self.upcoming_fasts,
        )?;
        let events = reminders::derive_events(&candidates, self.lead_time, now);

        if events.is_empty() {
            reminders::sync_reminders(self.scheduler.as_ref(), &[]);
        } else if self.scheduler.request_authorization_if_needed() {
            reminders::sync_reminders(self.scheduler.as_ref(), &events);
        } else {
            tracing::warn!("Notifications not authorized; {} reminders not scheduled", events.len());
        }

        self.cached.reminders = events;
        Ok(())
    }

    /// Change the reminder lead time and resync against the current time.
    pub fn set_lead_time(&mut self, lead_time: Duration) -> Result<()> {
        self.lead_time = lead_time.max(Duration::zero());
        tracing::info!("Reminder lead time set to {} minutes", self.lead_time.num_minutes());
        self.refresh()
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.cached.last_error = None,
            Err(e) => {
                if e.is_validation() || e.is_not_found() {
                    tracing::warn!("Timeline operation rejected: {}", e);
                } else {
                    tracing::error!("Timeline operation failed: {}", e);
                }
                self.cached.last_error = Some(e.to_string());
            }
        }
        result
    }

    // ============================================================
    // Start / stop
    // ============================================================

    /// Begin a fast at `at` and return the fast window.
    pub fn start_fast(&mut self, at: DateTime<Utc>) -> Result<Window> {
        let result = self.apply_start(at.trunc_subsecs(0));
        let result = self.record(result)?;
        self.refresh()?;
        Ok(result)
    }

    fn apply_start(&mut self, at: DateTime<Utc>) -> Result<Window> {
        let durations = self.load_durations()?;
        let fast_len = durations.fast();
        let mut fast: Option<Window> = None;

        if let Some(mut current) = self.store.fetch_active_window(at)? {
            match current.kind {
                WindowKind::Fast if current.is_placeholder() => {
                    current.start = at;
                    current.end = current.end.max(at + fast_len);
                    current.source = WindowSource::User;
                    tracing::debug!("Repurposing covering placeholder fast {}", current.id);
                    fast = Some(self.store.save_window(&current)?);
                }
                WindowKind::Fast => {
                    tracing::debug!("Fast {} already covers {}", current.id, at);
                    fast = Some(current);
                }
                WindowKind::Eat => self.cut_eat_at(current, at)?,
            }
        }

        // An eat window can still reach past `at` when it overlaps the covering window
        if let Some(eat) = self.store.fetch_most_recent_window(at, Some(WindowKind::Eat))? {
            if eat.end > at {
                self.cut_eat_at(eat, at)?;
            }
        }

        let fast = match fast {
            Some(fast) => fast,
            None => self.place_fast(at, fast_len)?,
        };

        let expected_end = fast.end;
        let planned_eat = if durations.feed_secs > 0 {
            Some(self.ensure_eat(expected_end, durations.feed(), WindowSource::System, false)?)
        } else {
            self.remove_planned_eat_near(expected_end)?;
            None
        };

        // Fasts that start inside the new one are leftovers of earlier runs
        for other in self.store.fetch_windows(at, fast.end)? {
            if other.id == fast.id || planned_eat.as_ref().is_some_and(|e| e.id == other.id) {
                continue;
            }
            match other.kind {
                WindowKind::Fast if other.start < at => {
                    let mut trimmed = other;
                    trimmed.end = at;
                    tracing::debug!("Trimming overlapping fast {}", trimmed.id);
                    self.store.save_window(&trimmed)?;
                }
                WindowKind::Fast => {
                    tracing::debug!("Deleting duplicate fast {}", other.id);
                    self.store.delete_window(other.id)?;
                }
                WindowKind::Eat if other.is_placeholder() && other.start > at => {
                    tracing::debug!("Deleting planned eat {} inside the new fast", other.id);
                    self.store.delete_window(other.id)?;
                }
                WindowKind::Eat => {}
            }
        }

        self.cached.active_window = Some(fast.clone());
        self.cached.is_fasting = true;
        tracing::info!("Fast started at {} (planned end {})", fast.start, fast.end);
        Ok(fast)
    }

    /// Insert the fast beginning at `at`, reusing a fast that starts shortly after.
    fn place_fast(&mut self, at: DateTime<Utc>, fast_len: Duration) -> Result<Window> {
        if let Some(mut nearby) = self.store.fetch_next_window(at, Some(WindowKind::Fast))? {
            if self.tolerances.within_reuse(nearby.start - at) {
                nearby.end = if nearby.is_placeholder() {
                    at + fast_len
                } else {
                    nearby.end.max(at + fast_len)
                };
                nearby.start = at;
                nearby.source = WindowSource::User;
                tracing::debug!("Reusing fast {} starting near {}", nearby.id, at);
                return Ok(self.store.save_window(&nearby)?);
            }
        }

        let window = Window::new(WindowKind::Fast, at, at + fast_len, WindowSource::User);
        Ok(self.store.save_window(&window)?)
    }

    /// End the current (or most recent) fast at `at` and plan what follows.
    pub fn stop_fast(&mut self, at: DateTime<Utc>) -> Result<Window> {
        let result = self.apply_stop(at.trunc_subsecs(0));
        let result = self.record(result)?;
        self.refresh()?;
        Ok(result)
    }

    fn apply_stop(&mut self, at: DateTime<Utc>) -> Result<Window> {
        let durations = self.load_durations()?;
        let mut fast = self
            .resolve_fast_to_stop(at)?
            .ok_or(TimelineError::NothingToStop)?;

        fast.end = at.max(fast.start);
        let fast = self.store.save_window(&fast)?;
        let fast_end = fast.end;
        let next_slot = fast_end + durations.feed();

        // Other fasts still running past `at`
        let lookback = durations.fast() + self.tolerances.lookback_margin;
        let scan_end = (next_slot - self.tolerances.placeholder_reuse).max(at + Duration::seconds(1));
        for other in self.store.fetch_windows(at - lookback, scan_end)? {
            if other.id == fast.id {
                continue;
            }
            match other.kind {
                WindowKind::Fast if other.end > at => {
                    if other.start < at {
                        let mut trimmed = other;
                        trimmed.end = at;
                        tracing::debug!("Trimming overlapping fast {}", trimmed.id);
                        self.store.save_window(&trimmed)?;
                    } else {
                        tracing::debug!("Deleting stray fast {}", other.id);
                        self.store.delete_window(other.id)?;
                    }
                }
                // Planned eating that the extended fast swallowed
                WindowKind::Eat
                    if other.is_placeholder() && other.start >= fast.start && other.start < fast_end =>
                {
                    tracing::debug!("Deleting planned eat {} inside the stopped fast", other.id);
                    self.store.delete_window(other.id)?;
                }
                _ => {}
            }
        }

        let mut keep = vec![fast.id];
        let next_fast = if durations.feed_secs > 0 {
            let eat = self.ensure_eat(fast_end, durations.feed(), WindowSource::System, true)?;
            keep.push(eat.id);

            // Eat windows that sneak in before the finalized one ends
            for other in self.store.fetch_windows(fast_end, eat.end)? {
                if other.kind == WindowKind::Eat && other.id != eat.id && other.start >= fast_end {
                    tracing::debug!("Deleting duplicate eat {}", other.id);
                    self.store.delete_window(other.id)?;
                }
            }

            self.ensure_placeholder_fast(eat.end, durations.fast(), &keep)?
        } else {
            self.remove_eat_following(fast_end, durations.fast())?;
            self.ensure_placeholder_fast(fast_end, durations.fast(), &keep)?
        };
        keep.push(next_fast.id);

        // Placeholders left over from the previous plan
        for other in self.store.fetch_windows(fast_end, next_fast.end)? {
            if other.is_placeholder() && other.start >= fast_end && !keep.contains(&other.id) {
                tracing::debug!("Deleting superseded placeholder {}", other.id);
                self.store.delete_window(other.id)?;
            }
        }

        self.cached.active_window = None;
        self.cached.is_fasting = false;
        tracing::info!("Fast {} stopped at {}", fast.id, fast_end);
        Ok(fast)
    }

    fn resolve_fast_to_stop(&self, at: DateTime<Utc>) -> Result<Option<Window>> {
        if let Some(cached) = self.cached.active_window.as_ref().filter(|w| w.is_fast()) {
            // The cache reflects the clock, not `at`; only trust a stored row covering `at`
            if let Some(current) = self.store.fetch_window(cached.id)? {
                if current.is_fast() && current.start <= at && at < current.end {
                    return Ok(Some(current));
                }
            }
        }

        if let Some(active) = self.store.fetch_active_window(at)? {
            if active.is_fast() {
                return Ok(Some(active));
            }
        }

        Ok(self
            .store
            .fetch_most_recent_window(at, Some(WindowKind::Fast))?)
    }

    // ============================================================
    // Window helpers
    // ============================================================

    fn cut_eat_at(&mut self, mut eat: Window, at: DateTime<Utc>) -> Result<()> {
        if eat.start >= at && eat.is_placeholder() {
            tracing::debug!("Deleting planned eat {} cut to nothing", eat.id);
            self.store.delete_window(eat.id)?;
        } else {
            eat.end = at.max(eat.start);
            tracing::debug!("Cutting eat {} short at {}", eat.id, at);
            self.store.save_window(&eat)?;
        }
        Ok(())
    }

    /// Find an eat window starting near `at` to reuse, or plan a new one.
    ///
    /// Placeholders are always moved to `[at, at + feed)`. User windows are
    /// only moved when `reposition_user` is set.
    fn ensure_eat(
        &mut self,
        at: DateTime<Utc>,
        feed: Duration,
        source: WindowSource,
        reposition_user: bool,
    ) -> Result<Window> {
        if let Some(mut nearby) = self.find_near(at, WindowKind::Eat, &[])? {
            if nearby.is_placeholder() || reposition_user {
                nearby.start = at;
                nearby.end = at + feed;
                tracing::debug!("Reusing eat {} at {}", nearby.id, at);
                return Ok(self.store.save_window(&nearby)?);
            }
            return Ok(nearby);
        }

        let window = Window::new(WindowKind::Eat, at, at + feed, source);
        tracing::debug!("Planning eat window at {}", at);
        Ok(self.store.save_window(&window)?)
    }

    fn ensure_placeholder_fast(
        &mut self,
        at: DateTime<Utc>,
        fast_len: Duration,
        exclude: &[Uuid],
    ) -> Result<Window> {
        if let Some(mut nearby) = self.find_near(at, WindowKind::Fast, exclude)? {
            if nearby.is_placeholder() {
                nearby.start = at;
                nearby.end = at + fast_len;
                tracing::debug!("Reusing placeholder fast {} at {}", nearby.id, at);
                return Ok(self.store.save_window(&nearby)?);
            }
            return Ok(nearby);
        }

        let window = Window::new(WindowKind::Fast, at, at + fast_len, WindowSource::System);
        tracing::debug!("Planning next fast at {}", at);
        Ok(self.store.save_window(&window)?)
    }

    /// First window of `kind` starting within the reuse tolerance of `at`.
    fn find_near(
        &self,
        at: DateTime<Utc>,
        kind: WindowKind,
        exclude: &[Uuid],
    ) -> Result<Option<Window>> {
        let mut cursor = at - self.tolerances.placeholder_reuse;
        while let Some(candidate) = self.store.fetch_next_window(cursor, Some(kind))? {
            if !self.tolerances.within_reuse(candidate.start - at) {
                return Ok(None);
            }
            if !exclude.contains(&candidate.id) {
                return Ok(Some(candidate));
            }
            cursor = candidate.start + Duration::seconds(1);
        }
        Ok(None)
    }

    fn remove_planned_eat_near(&mut self, at: DateTime<Utc>) -> Result<()> {
        while let Some(eat) = self.find_near(at, WindowKind::Eat, &[])? {
            if !eat.is_placeholder() {
                break;
            }
            tracing::debug!("Deleting planned eat {} for a no-feed regimen", eat.id);
            self.store.delete_window(eat.id)?;
        }
        Ok(())
    }

    /// Delete eat windows starting from `at` (within tolerance) through the
    /// span the next fast will occupy.
    fn remove_eat_following(&mut self, at: DateTime<Utc>, fast_len: Duration) -> Result<()> {
        let from = at - self.tolerances.placeholder_reuse;
        for eat in self.store.fetch_windows(from, at + fast_len)? {
            if eat.kind == WindowKind::Eat && eat.start >= from {
                tracing::debug!("Deleting eat {} after a no-feed fast", eat.id);
                self.store.delete_window(eat.id)?;
            }
        }
        Ok(())
    }

    fn load_durations(&mut self) -> Result<Durations> {
        let regimen = self.store.fetch_active_regimen()?;
        self.cached.durations = effective_durations(Some(&regimen));
        Ok(self.cached.durations)
    }

    // ============================================================
    // Manual edits
    // ============================================================

    pub fn list_windows(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Window>> {
        Ok(self.store.fetch_windows(from, to)?)
    }

    pub fn create_window(&mut self, input: CreateWindowInput) -> Result<Window> {
        let result = self.apply_create(input);
        let window = self.record(result)?;
        self.refresh()?;
        Ok(window)
    }

    fn apply_create(&mut self, input: CreateWindowInput) -> Result<Window> {
        validate_interval(input.start, input.end)?;
        let mut window = Window::new(input.kind, input.start, input.end, WindowSource::User);
        window.note = input.note;
        let window = self.store.save_window(&window)?;
        tracing::info!("Created {} window {}", window.kind.as_str(), window.id);
        Ok(window)
    }

    /// Apply `input` to window `id`. Edited windows count as user windows.
    pub fn update_window(&mut self, id: Uuid, input: UpdateWindowInput) -> Result<Window> {
        let result = self.apply_update(id, input);
        let window = self.record(result)?;
        self.refresh()?;
        Ok(window)
    }

    fn apply_update(&mut self, id: Uuid, input: UpdateWindowInput) -> Result<Window> {
        let mut window = self
            .store
            .fetch_window(id)?
            .ok_or(TimelineError::WindowNotFound(id))?;

        if let Some(kind) = input.kind {
            window.kind = kind;
        }
        if let Some(start) = input.start {
            window.start = start;
        }
        if let Some(end) = input.end {
            window.end = end;
        }
        if input.note.is_some() {
            window.note = input.note;
        }
        validate_interval(window.start, window.end)?;
        window.source = WindowSource::User;

        let window = self.store.save_window(&window)?;
        tracing::info!("Updated window {}", window.id);
        Ok(window)
    }

    /// Delete window `id`. Returns whether it existed.
    pub fn delete_window(&mut self, id: Uuid) -> Result<bool> {
        let result = self.store.delete_window(id).map_err(TimelineError::from);
        let removed = self.record(result)?;
        if removed {
            tracing::info!("Deleted window {}", id);
            if self.cached.active_window.as_ref().is_some_and(|w| w.id == id) {
                self.cached.active_window = None;
                self.cached.is_fasting = false;
            }
        }
        self.refresh()?;
        Ok(removed)
    }

    // ============================================================
    // Regimens
    // ============================================================

    pub fn regimens(&self) -> Result<Vec<Regimen>> {
        Ok(self.store.fetch_regimens()?)
    }

    pub fn active_regimen(&self) -> Result<Regimen> {
        Ok(self.store.fetch_active_regimen()?)
    }

    /// Create or update a regimen.
    pub fn save_regimen(&mut self, input: SaveRegimenInput) -> Result<Regimen> {
        let result = self.apply_save_regimen(input);
        let regimen = self.record(result)?;
        self.refresh()?;
        Ok(regimen)
    }

    fn apply_save_regimen(&mut self, input: SaveRegimenInput) -> Result<Regimen> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(TimelineError::InvalidRegimen("name must not be empty".into()));
        }
        if input.fast_secs <= 0 {
            return Err(TimelineError::InvalidRegimen(
                "fast duration must be positive".into(),
            ));
        }
        if input.feed_secs < 0 {
            return Err(TimelineError::InvalidRegimen(
                "feed duration must not be negative".into(),
            ));
        }

        let mut regimen = match input.id {
            Some(id) => self
                .store
                .fetch_regimen(id)?
                .ok_or(TimelineError::RegimenNotFound(id))?,
            None => Regimen::new(name, Duration::zero(), Duration::zero()),
        };
        regimen.name = name.to_string();
        regimen.fast_secs = input.fast_secs;
        regimen.feed_secs = input.feed_secs;
        if input.activate {
            regimen.is_active = true;
        }

        let regimen = self.store.save_regimen(&regimen)?;
        tracing::info!(
            "Saved regimen {} ({}s fast / {}s feed, active: {})",
            regimen.name,
            regimen.fast_secs,
            regimen.feed_secs,
            regimen.is_active
        );
        Ok(regimen)
    }

    /// Make regimen `id` the only active one.
    pub fn activate_regimen(&mut self, id: Uuid) -> Result<Regimen> {
        let result = self
            .store
            .set_active_regimen(Some(id))
            .map_err(TimelineError::from)
            .and_then(|active| active.ok_or(TimelineError::RegimenNotFound(id)));
        let regimen = self.record(result)?;
        tracing::info!("Activated regimen {}", regimen.name);
        self.refresh()?;
        Ok(regimen)
    }

    /// Delete regimen `id`, promoting another if it was active.
    pub fn delete_regimen(&mut self, id: Uuid) -> Result<bool> {
        let result = self.store.delete_regimen(id).map_err(TimelineError::from);
        let removed = self.record(result)?;
        if removed {
            tracing::info!("Deleted regimen {}", id);
        }
        self.refresh()?;
        Ok(removed)
    }

    // ============================================================
    // Whole-store operations
    // ============================================================

    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(self.store.snapshot()?)
    }

    pub fn export_snapshot(&mut self, dest: &std::path::Path) -> Result<()> {
        let result = self.store.export_snapshot(dest).map_err(TimelineError::from);
        self.record(result)
    }

    pub fn import_snapshot(&mut self, source: &std::path::Path) -> Result<()> {
        let result = self.store.import_snapshot(source).map_err(TimelineError::from);
        self.record(result)?;
        self.cached.active_window = None;
        self.refresh()
    }

    pub fn reset(&mut self) -> Result<()> {
        let result = self.store.reset().map_err(TimelineError::from);
        self.record(result)?;
        self.scheduler.clear_all();
        self.cached.active_window = None;
        self.refresh()
    }
}

fn validate_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if end < start {
        return Err(TimelineError::InvalidInterval { start, end });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::db::MemoryStore;
    use crate::reminders::InMemoryScheduler;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 20, 0, 0).unwrap()
    }

    fn timeline() -> Timeline<MemoryStore> {
        Timeline::new(
            MemoryStore::new(),
            Arc::new(FixedClock::new(t0())),
            Arc::new(InMemoryScheduler::new()),
        )
    }

    #[test]
    fn test_validate_interval_allows_zero_length() {
        assert!(validate_interval(t0(), t0()).is_ok());
        assert!(validate_interval(t0(), t0() - Duration::seconds(1)).is_err());
    }

    #[test]
    fn test_find_near_skips_excluded_windows() {
        let mut timeline = timeline();
        let first = Window::new(WindowKind::Fast, t0(), t0() + Duration::hours(1), WindowSource::System);
        let second = Window::new(
            WindowKind::Fast,
            t0() + Duration::minutes(5),
            t0() + Duration::hours(2),
            WindowSource::System,
        );
        timeline.store.save_window(&first).unwrap();
        timeline.store.save_window(&second).unwrap();

        let found = timeline.find_near(t0(), WindowKind::Fast, &[first.id]).unwrap();
        assert_eq!(found.map(|w| w.id), Some(second.id));

        let none = timeline
            .find_near(t0(), WindowKind::Fast, &[first.id, second.id])
            .unwrap();
        assert!(none.is_none());

        timeline.refresh().unwrap();
    }

    #[test]
    fn test_subsecond_start_is_truncated() {
        let mut timeline = timeline();
        let fast = timeline
            .start_fast(t0() + Duration::milliseconds(750))
            .unwrap();
        assert_eq!(fast.start, t0());
    }
}
