//! Read-only projections over stored windows: the rolling weekly summary and
//! the grouped fasting history.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Window;

/// Number of days both projections cover, today included.
pub const ROLLING_DAYS: i64 = 7;

/// Fasting achieved on one local day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// Short weekday name, e.g. `Mon`.
    pub label: String,
    pub achieved_secs: i64,
    pub target_secs: i64,
    /// Achieved share of the target, capped at 100.
    pub percent: f64,
}

/// Fasts that started on one local day, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryGroup {
    pub date: NaiveDate,
    pub windows: Vec<Window>,
}

/// UTC instant at which local `date` begins in `tz`.
pub fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// `[start, end)` of the local day containing `at`.
pub fn day_bounds<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let date = at.with_timezone(tz).date_naive();
    let next = date.succ_opt().unwrap_or(date);
    (start_of_day(date, tz), start_of_day(next, tz))
}

/// Start of the oldest day covered by the rolling projections.
pub fn rolling_start<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let today = now.with_timezone(tz).date_naive();
    start_of_day(today - Duration::days(ROLLING_DAYS - 1), tz)
}

/// One entry per day for the last seven local days, oldest first.
///
/// Only fast windows count, and only the part of each that lies inside the
/// day and before `now`.
pub fn weekly_summary<Tz: TimeZone>(
    windows: &[Window],
    target: Duration,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Vec<DaySummary> {
    let today = now.with_timezone(tz).date_naive();
    let target_secs = target.num_seconds().max(0);

    (0..ROLLING_DAYS)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let day_start = start_of_day(date, tz);
            let day_end = start_of_day(date + Duration::days(1), tz);

            let achieved_secs: i64 = windows
                .iter()
                .filter(|w| w.is_fast())
                .map(|w| {
                    let from = w.start.max(day_start);
                    let to = w.end.min(day_end).min(now);
                    (to - from).num_seconds().max(0)
                })
                .sum();

            let percent = if target_secs == 0 {
                0.0
            } else {
                (achieved_secs as f64 / target_secs as f64 * 100.0).min(100.0)
            };

            DaySummary {
                date,
                label: date.format("%a").to_string(),
                achieved_secs,
                target_secs,
                percent,
            }
        })
        .collect()
}

/// Fasts that started in the last seven local days and not after `now`,
/// grouped by local start date. Newest day first.
pub fn group_history<Tz: TimeZone>(
    windows: &[Window],
    now: DateTime<Utc>,
    tz: &Tz,
) -> Vec<HistoryGroup> {
    let cutoff = rolling_start(now, tz);
    let mut days: BTreeMap<NaiveDate, Vec<Window>> = BTreeMap::new();

    for window in windows
        .iter()
        .filter(|w| w.is_fast() && w.start >= cutoff && w.start <= now)
    {
        let date = window.start.with_timezone(tz).date_naive();
        days.entry(date).or_default().push(window.clone());
    }

    days.into_iter()
        .rev()
        .map(|(date, mut windows)| {
            windows.sort_by(|a, b| b.start.cmp(&a.start));
            HistoryGroup { date, windows }
        })
        .collect()
}
