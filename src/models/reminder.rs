use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace every reminder identifier starts with. Pending notifications
/// outside it belong to someone else and are never touched.
pub const REMINDER_PREFIX: &str = "fastline.";

/// A notification derived from a fast window boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReminderEvent {
    /// Deterministic identifier, see [`reminder_id`].
    pub id: String,
    pub window_id: Uuid,
    pub kind: ReminderKind,
    pub fire_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
}

/// Which boundary of a fast a reminder refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    /// Fires when the fast begins.
    Start,
    /// Fires one lead time before the fast begins.
    StartReminder,
    /// Fires when the fast ends.
    End,
    /// Fires one lead time before the fast ends.
    EndReminder,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::StartReminder => "start-reminder",
            Self::End => "end",
            Self::EndReminder => "end-reminder",
        }
    }
}

/// Identifier for the reminder of `kind` on window `window_id`.
pub fn reminder_id(window_id: Uuid, kind: ReminderKind) -> String {
    format!("{}{}.{}", REMINDER_PREFIX, window_id, kind.as_str())
}

/// A notification currently queued in the external scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingReminder {
    pub id: String,
    pub fire_at: DateTime<Utc>,
}
