//! Reminder derivation and synchronization.
//!
//! Reminders are never stored. They are recomputed from the timeline after
//! every change and diffed against whatever the [`NotificationScheduler`]
//! already has queued, so the scheduler converges on the latest desired set.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::db::IntervalStore;
use crate::error::StoreResult;
use crate::models::*;

/// How many upcoming fasts to look ahead for by default.
pub const DEFAULT_UPCOMING_FASTS: usize = 6;

/// The notification delivery service, consumed only through this interface.
pub trait NotificationScheduler: Send + Sync {
    /// Ask for permission to post notifications. Returns whether it is granted.
    fn request_authorization_if_needed(&self) -> bool;

    /// Everything currently queued, including entries from other namespaces.
    fn pending_reminders(&self) -> Vec<PendingReminder>;

    /// Queue `event`, replacing any pending entry with the same identifier.
    fn schedule(&self, event: &ReminderEvent);

    fn cancel(&self, ids: &[String]);

    /// Drop every pending reminder in this crate's namespace.
    fn clear_all(&self);
}

/// Fast windows that reminders should be derived from.
///
/// Collects the active window (when it is a fast), every fast in `schedule`,
/// and up to `limit` further fasts found by walking forward from `reference`.
/// The walk gives up after `limit * 2` lookups that only turn up windows it
/// has already seen.
pub fn collect_candidates<S: IntervalStore + ?Sized>(
    store: &S,
    active: Option<&Window>,
    schedule: &[Window],
    reference: DateTime<Utc>,
    limit: usize,
) -> StoreResult<Vec<Window>> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    let loaded = active.into_iter().chain(schedule.iter());
    for window in loaded.filter(|w| w.is_fast()) {
        if seen.insert(window.id) {
            candidates.push(window.clone());
        }
    }

    let mut cursor = reference;
    let mut found = 0;
    let mut misses = 0;
    while found < limit && misses < limit * 2 {
        let Some(next) = store.fetch_next_window(cursor, Some(WindowKind::Fast))? else {
            break;
        };
        cursor = if next.end > cursor {
            next.end
        } else {
            cursor + Duration::seconds(1)
        };
        if seen.insert(next.id) {
            candidates.push(next);
            found += 1;
        } else {
            misses += 1;
        }
    }

    Ok(candidates)
}

/// Future reminder events for the fast windows in `windows`, by fire time.
pub fn derive_events(
    windows: &[Window],
    lead_time: Duration,
    reference: DateTime<Utc>,
) -> Vec<ReminderEvent> {
    let mut seen = HashSet::new();
    let mut events = Vec::new();
    let lead_minutes = lead_time.num_minutes();

    for window in windows.iter().filter(|w| w.is_fast()) {
        if !seen.insert(window.id) {
            continue;
        }

        if window.start > reference {
            events.push(event(window.id, ReminderKind::Start, window.start, lead_minutes));
            let early = window.start - lead_time;
            if lead_time > Duration::zero() && early > reference {
                events.push(event(window.id, ReminderKind::StartReminder, early, lead_minutes));
            }
        }

        if window.end > reference {
            events.push(event(window.id, ReminderKind::End, window.end, lead_minutes));
            let early = window.end - lead_time;
            if lead_time > Duration::zero() && early > reference {
                events.push(event(window.id, ReminderKind::EndReminder, early, lead_minutes));
            }
        }
    }

    events.sort_by(|a, b| a.fire_at.cmp(&b.fire_at).then_with(|| a.id.cmp(&b.id)));
    events
}

fn event(window_id: Uuid, kind: ReminderKind, fire_at: DateTime<Utc>, lead_minutes: i64) -> ReminderEvent {
    let (title, body) = match kind {
        ReminderKind::Start => ("Fast starting".to_string(), "Your fast begins now.".to_string()),
        ReminderKind::StartReminder => (
            "Fast starts soon".to_string(),
            format!("Your fast begins in {lead_minutes} minutes."),
        ),
        ReminderKind::End => (
            "Fast complete".to_string(),
            "Your fast is over. Time to eat.".to_string(),
        ),
        ReminderKind::EndReminder => (
            "Fast ending soon".to_string(),
            format!("Your fast ends in {lead_minutes} minutes."),
        ),
    };

    ReminderEvent {
        id: reminder_id(window_id, kind),
        window_id,
        kind,
        fire_at,
        title,
        body,
    }
}

/// What a sync changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncOutcome {
    pub scheduled: Vec<String>,
    pub cancelled: Vec<String>,
}

/// Make the scheduler's pending reminders match `events`.
///
/// Pending identifiers outside [`REMINDER_PREFIX`] are left alone. An event
/// already pending with the same fire time is not scheduled again; one whose
/// window moved is rescheduled in place.
pub fn sync_reminders(scheduler: &dyn NotificationScheduler, events: &[ReminderEvent]) -> SyncOutcome {
    let pending: HashMap<String, DateTime<Utc>> = scheduler
        .pending_reminders()
        .into_iter()
        .filter(|p| p.id.starts_with(REMINDER_PREFIX))
        .map(|p| (p.id, p.fire_at))
        .collect();

    if events.is_empty() {
        let cancelled: Vec<String> = pending.into_keys().collect();
        if !cancelled.is_empty() {
            scheduler.cancel(&cancelled);
            tracing::debug!("Cancelled all {} pending reminders", cancelled.len());
        }
        return SyncOutcome {
            scheduled: Vec::new(),
            cancelled,
        };
    }

    let desired: HashSet<&str> = events.iter().map(|e| e.id.as_str()).collect();
    let mut cancelled: Vec<String> = pending
        .keys()
        .filter(|id| !desired.contains(id.as_str()))
        .cloned()
        .collect();
    cancelled.sort();
    if !cancelled.is_empty() {
        scheduler.cancel(&cancelled);
    }

    let mut scheduled = Vec::new();
    for event in events {
        if pending.get(&event.id) != Some(&event.fire_at) {
            scheduler.schedule(event);
            scheduled.push(event.id.clone());
        }
    }

    tracing::debug!(
        "Reminder sync: {} scheduled, {} cancelled",
        scheduled.len(),
        cancelled.len()
    );
    SyncOutcome {
        scheduled,
        cancelled,
    }
}

// ============================================================
// Schedulers
// ============================================================

/// Scheduler that only remembers what it was asked to do.
///
/// Used by one-shot CLI commands and tests.
#[derive(Debug, Default)]
pub struct InMemoryScheduler {
    denied: bool,
    inner: Mutex<InMemoryState>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    pending: Vec<ReminderEvent>,
    foreign: Vec<PendingReminder>,
    scheduled_log: Vec<String>,
    cancelled_log: Vec<String>,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scheduler whose authorization request is always refused.
    pub fn denied() -> Self {
        Self {
            denied: true,
            ..Self::default()
        }
    }

    /// Pretend another app has `id` queued.
    pub fn add_foreign(&self, id: impl Into<String>, fire_at: DateTime<Utc>) {
        let mut inner = self.inner.lock().expect("scheduler lock poisoned");
        inner.foreign.push(PendingReminder {
            id: id.into(),
            fire_at,
        });
    }

    pub fn pending(&self) -> Vec<ReminderEvent> {
        let inner = self.inner.lock().expect("scheduler lock poisoned");
        let mut pending = inner.pending.clone();
        pending.sort_by(|a, b| a.fire_at.cmp(&b.fire_at));
        pending
    }

    /// Every identifier passed to `schedule`, in call order.
    pub fn scheduled_log(&self) -> Vec<String> {
        self.inner
            .lock()
            .expect("scheduler lock poisoned")
            .scheduled_log
            .clone()
    }

    /// Every identifier passed to `cancel`, in call order.
    pub fn cancelled_log(&self) -> Vec<String> {
        self.inner
            .lock()
            .expect("scheduler lock poisoned")
            .cancelled_log
            .clone()
    }
}

impl NotificationScheduler for InMemoryScheduler {
    fn request_authorization_if_needed(&self) -> bool {
        !self.denied
    }

    fn pending_reminders(&self) -> Vec<PendingReminder> {
        let inner = self.inner.lock().expect("scheduler lock poisoned");
        inner
            .pending
            .iter()
            .map(|e| PendingReminder {
                id: e.id.clone(),
                fire_at: e.fire_at,
            })
            .chain(inner.foreign.iter().cloned())
            .collect()
    }

    fn schedule(&self, event: &ReminderEvent) {
        let mut inner = self.inner.lock().expect("scheduler lock poisoned");
        inner.pending.retain(|e| e.id != event.id);
        inner.pending.push(event.clone());
        inner.scheduled_log.push(event.id.clone());
    }

    fn cancel(&self, ids: &[String]) {
        let mut inner = self.inner.lock().expect("scheduler lock poisoned");
        inner.pending.retain(|e| !ids.contains(&e.id));
        inner.foreign.retain(|p| !ids.contains(&p.id));
        inner.cancelled_log.extend(ids.iter().cloned());
    }

    fn clear_all(&self) {
        let mut inner = self.inner.lock().expect("scheduler lock poisoned");
        let ids: Vec<String> = inner.pending.drain(..).map(|e| e.id).collect();
        inner.cancelled_log.extend(ids);
    }
}

/// Scheduler that fires reminders from tokio tasks.
///
/// Each pending reminder is a task sleeping until its fire time; delivery is
/// a log line. Must be used from inside a tokio runtime.
#[derive(Clone, Default)]
pub struct TokioScheduler {
    tasks: Arc<Mutex<HashMap<String, (DateTime<Utc>, JoinHandle<()>)>>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationScheduler for TokioScheduler {
    fn request_authorization_if_needed(&self) -> bool {
        true
    }

    fn pending_reminders(&self) -> Vec<PendingReminder> {
        let mut tasks = self.tasks.lock().expect("scheduler lock poisoned");
        tasks.retain(|_, (_, handle)| !handle.is_finished());
        tasks
            .iter()
            .map(|(id, (fire_at, _))| PendingReminder {
                id: id.clone(),
                fire_at: *fire_at,
            })
            .collect()
    }

    fn schedule(&self, event: &ReminderEvent) {
        let delay = (event.fire_at - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        let fired = event.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::info!(reminder = %fired.id, "{}: {}", fired.title, fired.body);
        });

        let mut tasks = self.tasks.lock().expect("scheduler lock poisoned");
        if let Some((_, previous)) = tasks.insert(event.id.clone(), (event.fire_at, handle)) {
            previous.abort();
        }
    }

    fn cancel(&self, ids: &[String]) {
        let mut tasks = self.tasks.lock().expect("scheduler lock poisoned");
        for id in ids {
            if let Some((_, handle)) = tasks.remove(id) {
                handle.abort();
            }
        }
    }

    fn clear_all(&self) {
        let mut tasks = self.tasks.lock().expect("scheduler lock poisoned");
        for (_, (_, handle)) in tasks.drain() {
            handle.abort();
        }
    }
}
