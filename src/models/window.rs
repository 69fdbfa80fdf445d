use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A half-open `[start, end)` time interval on the fasting timeline.
///
/// Zero-length windows are valid; they show up when a fast is stopped the
/// instant it starts or when a multi-day fast has no refeed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Window {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: WindowKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub note: Option<String>,
    pub source: WindowSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Window {
    /// Build a new, not yet stored window.
    pub fn new(
        kind: WindowKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        source: WindowSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            start,
            end,
            note: None,
            source,
            created_at: start,
            updated_at: start,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether `at` falls inside `[start, end)`.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// True interval intersection with `[from, to)`.
    pub fn intersects(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start < to && self.end > from
    }

    pub fn is_fast(&self) -> bool {
        self.kind == WindowKind::Fast
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == WindowSource::System
    }
}

/// Whether a window is a fasting or an eating period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Fast,
    Eat,
}

impl WindowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Eat => "eat",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "fast" => Some(Self::Fast),
            "eat" => Some(Self::Eat),
            _ => None,
        }
    }
}

/// Provenance of a window.
///
/// - `User`: Created or edited through an explicit action
/// - `System`: Generated by the reconciler as a continuation placeholder and
///   eligible for silent repositioning
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WindowSource {
    User,
    System,
}

impl WindowSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::System => "system",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// Input for manually creating a window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWindowInput {
    #[serde(rename = "type")]
    pub kind: WindowKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Input for editing a window. Omitted fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateWindowInput {
    #[serde(rename = "type", default)]
    pub kind: Option<WindowKind>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_window_is_half_open() {
        let window = Window::new(WindowKind::Fast, at(8), at(12), WindowSource::User);
        assert!(window.covers(at(8)));
        assert!(window.covers(at(11)));
        assert!(!window.covers(at(12)));
    }

    #[test]
    fn test_intersects_includes_windows_straddling_the_range_start() {
        let window = Window::new(WindowKind::Eat, at(6), at(10), WindowSource::System);
        assert!(window.intersects(at(8), at(20)));
        assert!(!window.intersects(at(10), at(20)));
        assert!(!window.intersects(at(1), at(6)));
    }

    #[test]
    fn test_new_window_uses_start_as_created_at() {
        let window = Window::new(WindowKind::Fast, at(3), at(4), WindowSource::User);
        assert_eq!(window.created_at, at(3));
        assert_eq!(window.duration(), Duration::hours(1));
    }
}
