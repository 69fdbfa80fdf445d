//! Resolution of target durations and the reconciler's tolerances.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::models::Regimen;

/// Fast duration used when no regimen is available.
pub const DEFAULT_FAST_SECS: i64 = 16 * 60 * 60;
/// Feed duration used when no regimen is available.
pub const DEFAULT_FEED_SECS: i64 = 8 * 60 * 60;

/// Target fast and feed durations in effect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Durations {
    pub fast_secs: i64,
    pub feed_secs: i64,
}

impl Durations {
    pub fn fast(&self) -> Duration {
        Duration::seconds(self.fast_secs)
    }

    pub fn feed(&self) -> Duration {
        Duration::seconds(self.feed_secs)
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            fast_secs: DEFAULT_FAST_SECS,
            feed_secs: DEFAULT_FEED_SECS,
        }
    }
}

/// Durations for `regimen`, falling back to 16h fast / 8h feed.
///
/// A regimen with a non-positive fast gets the default fast; a negative feed
/// is treated as no feed at all.
pub fn effective_durations(regimen: Option<&Regimen>) -> Durations {
    match regimen {
        Some(regimen) => Durations {
            fast_secs: if regimen.fast_secs > 0 {
                regimen.fast_secs
            } else {
                DEFAULT_FAST_SECS
            },
            feed_secs: regimen.feed_secs.max(0),
        },
        None => Durations::default(),
    }
}

/// Heuristic limits the reconciler works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tolerances {
    /// How far (inclusive) a placeholder may sit from the expected boundary
    /// and still be repositioned instead of duplicated.
    pub placeholder_reuse: Duration,
    /// Added to the fast duration to size the overlap scan when stopping.
    pub lookback_margin: Duration,
}

impl Tolerances {
    /// Whether `offset` is close enough to reuse a placeholder.
    pub fn within_reuse(&self, offset: Duration) -> bool {
        offset.abs() <= self.placeholder_reuse
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            placeholder_reuse: Duration::minutes(10),
            lookback_margin: Duration::hours(1),
        }
    }
}
