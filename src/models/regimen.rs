use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name given to the regimen synthesized when the store has none.
pub const DEFAULT_REGIMEN_NAME: &str = "16:8";

/// A named target cycle of fasting and feeding.
///
/// Feed duration may be zero for extended fasts with no defined refeed. The
/// store keeps exactly one regimen active whenever any exist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Regimen {
    pub id: Uuid,
    pub name: String,
    /// Target fast duration in seconds.
    pub fast_secs: i64,
    /// Target feed duration in seconds.
    pub feed_secs: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Regimen {
    pub fn new(name: impl Into<String>, fast: Duration, feed: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            fast_secs: fast.num_seconds(),
            feed_secs: feed.num_seconds(),
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// The 16h fast / 8h feed regimen seeded into empty stores.
    pub fn default_regimen() -> Self {
        let mut regimen = Self::new(DEFAULT_REGIMEN_NAME, Duration::hours(16), Duration::hours(8));
        regimen.is_active = true;
        regimen
    }

    pub fn fast_duration(&self) -> Duration {
        Duration::seconds(self.fast_secs)
    }

    pub fn feed_duration(&self) -> Duration {
        Duration::seconds(self.feed_secs)
    }
}

/// Input for creating or updating a regimen.
///
/// When `id` is set the existing regimen is updated in place. A regimen only
/// becomes active through `activate` (or by being the only one left).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRegimenInput {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub fast_secs: i64,
    pub feed_secs: i64,
    #[serde(default)]
    pub activate: bool,
}
