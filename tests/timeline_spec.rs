use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use fastline::clock::FixedClock;
use fastline::db::{Database, IntervalStore};
use fastline::durations::Tolerances;
use fastline::error::TimelineError;
use fastline::models::*;
use fastline::reminders::{InMemoryScheduler, NotificationScheduler};
use fastline::timeline::Timeline;
use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;
use speculate2::speculate;
use uuid::Uuid;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 20, 0, 0).unwrap()
}

fn h(hours: i64) -> Duration {
    Duration::hours(hours)
}

fn all_windows(timeline: &Timeline<Database>) -> Vec<Window> {
    timeline.snapshot().expect("Snapshot failed").windows
}

fn assert_no_overlap(windows: &[Window]) {
    for pair in windows.windows(2) {
        assert!(
            pair[0].end <= pair[1].start,
            "{} [{}, {}) overlaps {} [{}, {})",
            pair[0].kind.as_str(),
            pair[0].start,
            pair[0].end,
            pair[1].kind.as_str(),
            pair[1].start,
            pair[1].end
        );
    }
}

fn assert_no_fast_overlap(windows: &[Window], step: &str) {
    let fasts: Vec<&Window> = windows
        .iter()
        .filter(|w| w.is_fast() && w.end > w.start)
        .collect();
    for (i, a) in fasts.iter().enumerate() {
        for b in &fasts[i + 1..] {
            assert!(
                a.end <= b.start || b.end <= a.start,
                "after {}: fast [{}, {}) overlaps fast [{}, {})",
                step,
                a.start,
                a.end,
                b.start,
                b.end
            );
        }
    }
}

fn fresh_timeline(clock: Arc<FixedClock>) -> Timeline<Database> {
    let db = Database::open_memory().expect("Failed to create in-memory database");
    db.migrate().expect("Failed to run migrations");
    Timeline::new(db, clock, Arc::new(InMemoryScheduler::new()))
}

fn assert_one_active_regimen(timeline: &Timeline<Database>) {
    let regimens = timeline.regimens().expect("Query failed");
    assert!(!regimens.is_empty());
    assert_eq!(regimens.iter().filter(|r| r.is_active).count(), 1);
}

fn regimen_input(name: &str, fast: i64, feed: i64, activate: bool) -> SaveRegimenInput {
    SaveRegimenInput {
        id: None,
        name: name.to_string(),
        fast_secs: fast * 3600,
        feed_secs: feed * 3600,
        activate,
    }
}

speculate! {
    before {
        let clock = Arc::new(FixedClock::new(t0()));
        let scheduler = Arc::new(InMemoryScheduler::new());
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
        let mut timeline = Timeline::new(db, clock.clone(), scheduler.clone());
        timeline.refresh().expect("Refresh failed");
    }

    describe "start_fast" {
        it "creates a fast and plans the eating window after it" {
            let fast = timeline.start_fast(t0()).expect("Start failed");

            assert_eq!(fast.kind, WindowKind::Fast);
            assert_eq!(fast.source, WindowSource::User);
            assert_eq!(fast.start, t0());
            assert_eq!(fast.end, t0() + h(16));

            let windows = all_windows(&timeline);
            assert_eq!(windows.len(), 2);
            assert_eq!(windows[1].kind, WindowKind::Eat);
            assert_eq!(windows[1].source, WindowSource::System);
            assert_eq!(windows[1].start, t0() + h(16));
            assert_eq!(windows[1].end, t0() + h(24));

            assert!(timeline.is_fasting());
            assert_eq!(timeline.active_window().map(|w| w.id), Some(fast.id));
        }

        it "is idempotent at the same instant" {
            let first = timeline.start_fast(t0()).expect("Start failed");
            let before = all_windows(&timeline);

            let second = timeline.start_fast(t0()).expect("Start failed");
            let after = all_windows(&timeline);

            assert_eq!(first.id, second.id);
            assert_eq!(before.len(), after.len());
            assert_eq!(
                before.iter().map(|w| (w.id, w.start, w.end)).collect::<Vec<_>>(),
                after.iter().map(|w| (w.id, w.start, w.end)).collect::<Vec<_>>()
            );
        }

        it "drops sub-second precision" {
            let fast = timeline
                .start_fast(t0() + Duration::milliseconds(750))
                .expect("Start failed");
            assert_eq!(fast.start, t0());
        }

        it "cuts a covering eat window short" {
            let eat = timeline
                .create_window(CreateWindowInput {
                    kind: WindowKind::Eat,
                    start: t0() - h(2),
                    end: t0() + h(2),
                    note: Some("dinner".to_string()),
                })
                .expect("Create failed");

            timeline.start_fast(t0()).expect("Start failed");

            let cut = timeline
                .store()
                .fetch_window(eat.id)
                .expect("Query failed")
                .expect("Eat window was deleted");
            assert_eq!(cut.end, t0());
            assert_no_overlap(&all_windows(&timeline));
        }

        it "reuses the planned fast when started shortly before it" {
            timeline.start_fast(t0()).expect("Start failed");
            clock.set(t0() + h(10));
            timeline.stop_fast(t0() + h(10)).expect("Stop failed");

            let planned = all_windows(&timeline)
                .into_iter()
                .find(|w| w.is_fast() && w.is_placeholder())
                .expect("No planned fast");
            assert_eq!(planned.start, t0() + h(18));

            let early = planned.start - Duration::minutes(10);
            clock.set(early);
            let fast = timeline.start_fast(early).expect("Start failed");

            assert_eq!(fast.id, planned.id);
            assert_eq!(fast.start, early);
            assert_eq!(fast.end, early + h(16));
            assert_eq!(fast.source, WindowSource::User);

            let windows = all_windows(&timeline);
            assert_eq!(windows.iter().filter(|w| w.is_fast()).count(), 2);
            assert_no_overlap(&windows);
        }

        it "replaces the planned fast when started outside the reuse tolerance" {
            timeline.start_fast(t0()).expect("Start failed");
            timeline.stop_fast(t0() + h(10)).expect("Stop failed");

            let planned = all_windows(&timeline)
                .into_iter()
                .find(|w| w.is_fast() && w.is_placeholder())
                .expect("No planned fast");

            let early = planned.start - Duration::minutes(11);
            let fast = timeline.start_fast(early).expect("Start failed");

            assert_ne!(fast.id, planned.id);
            assert!(timeline.store().fetch_window(planned.id).expect("Query failed").is_none());
            assert_no_overlap(&all_windows(&timeline));
        }

        it "honors a wider reuse tolerance" {
            let db = Database::open_memory().expect("Failed to create in-memory database");
            db.migrate().expect("Failed to run migrations");
            let mut wide = Timeline::new(db, clock.clone(), scheduler.clone()).with_tolerances(Tolerances {
                placeholder_reuse: Duration::minutes(30),
                ..Tolerances::default()
            });

            wide.start_fast(t0()).expect("Start failed");
            wide.stop_fast(t0() + h(10)).expect("Stop failed");
            let planned = all_windows(&wide)
                .into_iter()
                .find(|w| w.is_fast() && w.is_placeholder())
                .expect("No planned fast");

            let early = planned.start - Duration::minutes(25);
            let fast = wide.start_fast(early).expect("Start failed");

            assert_eq!(fast.id, planned.id);
            assert_eq!(fast.start, early);
            assert_no_overlap(&all_windows(&wide));
        }

        it "extends the planned fast when started after it began" {
            timeline.start_fast(t0()).expect("Start failed");
            timeline.stop_fast(t0() + h(10)).expect("Stop failed");

            let late = t0() + h(19);
            let fast = timeline.start_fast(late).expect("Start failed");

            assert_eq!(fast.source, WindowSource::User);
            assert_eq!(fast.start, late);
            assert_eq!(fast.end, late + h(16));
            assert_no_overlap(&all_windows(&timeline));
        }
    }

    describe "stop_fast" {
        it "ends the fast, plans eating and the next fast" {
            let started = timeline.start_fast(t0()).expect("Start failed");
            let t1 = t0() + h(10);
            clock.set(t1);

            let stopped = timeline.stop_fast(t1).expect("Stop failed");
            assert_eq!(stopped.id, started.id);
            assert_eq!(stopped.end, t1);

            let windows = all_windows(&timeline);
            assert_eq!(windows.len(), 3);

            assert_eq!(windows[0].id, started.id);
            assert_eq!((windows[1].kind, windows[1].start, windows[1].end), (WindowKind::Eat, t1, t1 + h(8)));
            assert_eq!((windows[2].kind, windows[2].start, windows[2].end), (WindowKind::Fast, t1 + h(8), t1 + h(24)));
            assert!(windows[2].is_placeholder());

            assert!(!timeline.is_fasting());
            assert_eq!(timeline.active_window().map(|w| w.kind), Some(WindowKind::Eat));
        }

        it "extends a stopped fast when stopped again later" {
            let started = timeline.start_fast(t0()).expect("Start failed");
            let t1 = t0() + h(10);
            timeline.stop_fast(t1).expect("Stop failed");

            let stopped = timeline.stop_fast(t1 + h(2)).expect("Stop failed");
            assert_eq!(stopped.id, started.id);
            assert_eq!(stopped.end, t1 + h(2));

            let windows = all_windows(&timeline);
            assert_eq!(windows.len(), 3);
            assert_eq!(windows[1].start, t1 + h(2));
            assert_eq!(windows[2].start, t1 + h(10));
            assert_no_overlap(&windows);
        }

        it "stops the fast covering the instant while the clock lags behind" {
            let first = timeline.start_fast(t0()).expect("Start failed");
            let second = timeline.start_fast(t0() + h(20)).expect("Start failed");
            assert_eq!(timeline.active_window().map(|w| w.id), Some(first.id));

            let stopped = timeline.stop_fast(t0() + h(30)).expect("Stop failed");
            assert_eq!(stopped.id, second.id);
            assert_eq!(stopped.end, t0() + h(30));

            let first = timeline.store().fetch_window(first.id).expect("Query failed").expect("Missing");
            assert_eq!(first.end, t0() + h(16));
            assert_no_overlap(&all_windows(&timeline));
        }

        it "never ends a fast before it starts" {
            timeline.start_fast(t0()).expect("Start failed");
            let stopped = timeline.stop_fast(t0() - h(1));

            // The only fast starts after the stop instant
            assert!(matches!(stopped, Err(TimelineError::NothingToStop)));
        }

        it "fails without changes when there is nothing to stop" {
            let result = timeline.stop_fast(t0());

            assert!(matches!(result, Err(TimelineError::NothingToStop)));
            assert!(all_windows(&timeline).is_empty());
            assert!(timeline.last_error().is_some());
        }

        it "clears the last error after a successful operation" {
            let _ = timeline.stop_fast(t0());
            assert!(timeline.last_error().is_some());

            timeline.start_fast(t0()).expect("Start failed");
            assert!(timeline.last_error().is_none());
        }
    }

    describe "sequences" {
        it "never leaves overlapping fasts over generated start and stop sequences" {
            let regimens = [(16, 8), (18, 6), (20, 4), (24, 0), (36, 0)];

            for seed in 0..40u64 {
                let mut rng = Mcg128Xsl64::seed_from_u64(seed);
                let clock = Arc::new(FixedClock::new(t0()));
                let mut timeline = fresh_timeline(clock.clone());

                let (fast, feed) = regimens[seed as usize % regimens.len()];
                timeline
                    .save_regimen(regimen_input("generated", fast, feed, true))
                    .expect("Save failed");

                let mut at = t0();
                for step in 0..30 {
                    at += Duration::minutes(rng.gen_range(15..=30 * 60));
                    // Half the calls run with the clock still at an earlier instant
                    if rng.gen_bool(0.5) {
                        clock.set(at);
                    }

                    let start = step == 0 || rng.gen_bool(0.5);
                    if start {
                        timeline.start_fast(at).expect("Start failed");
                    } else {
                        timeline.stop_fast(at).expect("Stop failed");
                    }

                    let label = format!(
                        "seed {} step {} ({} at {})",
                        seed,
                        step,
                        if start { "start" } else { "stop" },
                        at
                    );
                    assert_no_fast_overlap(&all_windows(&timeline), &label);
                }
            }
        }

        it "keeps one active regimen through every regimen operation" {
            let a = timeline.save_regimen(regimen_input("18:6", 18, 6, false)).expect("Save failed");
            assert_one_active_regimen(&timeline);

            let b = timeline.save_regimen(regimen_input("20:4", 20, 4, true)).expect("Save failed");
            assert_one_active_regimen(&timeline);
            assert_eq!(timeline.active_regimen().expect("Query failed").id, b.id);

            timeline.activate_regimen(a.id).expect("Activate failed");
            assert_one_active_regimen(&timeline);

            timeline.delete_regimen(a.id).expect("Delete failed");
            assert_one_active_regimen(&timeline);

            for regimen in timeline.regimens().expect("Query failed") {
                timeline.delete_regimen(regimen.id).expect("Delete failed");
                assert_one_active_regimen(&timeline);
            }
        }
    }

    describe "regimens" {
        it "uses the active regimen's durations" {
            timeline.save_regimen(regimen_input("18:6", 18, 6, true)).expect("Save failed");
            assert_eq!(timeline.configured_durations().fast_secs, 18 * 3600);

            let fast = timeline.start_fast(t0()).expect("Start failed");
            assert_eq!(fast.end, t0() + h(18));

            let eat = all_windows(&timeline).into_iter().find(|w| !w.is_fast()).expect("No eat window");
            assert_eq!(eat.start, t0() + h(18));
            assert_eq!(eat.end, t0() + h(24));
        }

        it "plans back-to-back fasts when there is no feeding time" {
            timeline.save_regimen(regimen_input("24:0", 24, 0, true)).expect("Save failed");

            timeline.start_fast(t0()).expect("Start failed");
            assert_eq!(all_windows(&timeline).len(), 1);

            timeline.stop_fast(t0() + h(20)).expect("Stop failed");
            let windows = all_windows(&timeline);
            assert_eq!(windows.len(), 2);
            assert!(windows.iter().all(Window::is_fast));
            assert_eq!(windows[1].start, t0() + h(20));
            assert_eq!(windows[1].end, t0() + h(44));
        }

        it "removes eating planned inside the next fast when there is no feeding time" {
            timeline.save_regimen(regimen_input("24:0", 24, 0, true)).expect("Save failed");
            timeline.start_fast(t0()).expect("Start failed");
            let snack = timeline
                .create_window(CreateWindowInput {
                    kind: WindowKind::Eat,
                    start: t0() + h(26),
                    end: t0() + h(27),
                    note: Some("snack".to_string()),
                })
                .expect("Create failed");

            timeline.stop_fast(t0() + h(20)).expect("Stop failed");

            assert!(timeline.store().fetch_window(snack.id).expect("Query failed").is_none());
            let windows = all_windows(&timeline);
            assert_eq!(windows.len(), 2);
            assert!(windows.iter().all(Window::is_fast));
            assert_no_overlap(&windows);
        }

        it "updates a regimen without changing which one is active" {
            let default = timeline.active_regimen().expect("Query failed");
            let extra = timeline.save_regimen(regimen_input("18:6", 18, 6, false)).expect("Save failed");

            let mut update = regimen_input("19:5", 19, 5, false);
            update.id = Some(extra.id);
            let updated = timeline.save_regimen(update).expect("Save failed");

            assert_eq!(updated.id, extra.id);
            assert_eq!(updated.name, "19:5");
            assert_eq!(timeline.active_regimen().expect("Query failed").id, default.id);
        }

        it "rejects invalid regimens" {
            let blank = timeline.save_regimen(regimen_input("  ", 16, 8, false));
            assert!(matches!(blank, Err(TimelineError::InvalidRegimen(_))));

            let no_fast = timeline.save_regimen(regimen_input("0:8", 0, 8, false));
            assert!(matches!(no_fast, Err(TimelineError::InvalidRegimen(_))));

            let negative_feed = timeline.save_regimen(regimen_input("16:-1", 16, -1, false));
            assert!(matches!(negative_feed, Err(TimelineError::InvalidRegimen(_))));

            assert_eq!(timeline.regimens().expect("Query failed").len(), 1);
        }

        it "reports unknown regimens" {
            let id = Uuid::new_v4();
            assert!(matches!(timeline.activate_regimen(id), Err(TimelineError::RegimenNotFound(_))));

            let mut update = regimen_input("x", 16, 8, false);
            update.id = Some(id);
            assert!(matches!(timeline.save_regimen(update), Err(TimelineError::RegimenNotFound(_))));
        }
    }

    describe "manual edits" {
        it "marks edited windows as user windows" {
            timeline.start_fast(t0()).expect("Start failed");
            let eat = all_windows(&timeline).into_iter().find(|w| !w.is_fast()).expect("No eat window");
            assert_eq!(eat.source, WindowSource::System);

            let edited = timeline
                .update_window(eat.id, UpdateWindowInput {
                    note: Some("brunch".to_string()),
                    ..Default::default()
                })
                .expect("Update failed");

            assert_eq!(edited.source, WindowSource::User);
            assert_eq!(edited.note, Some("brunch".to_string()));
            assert_eq!(edited.start, eat.start);
        }

        it "rejects windows that end before they start" {
            let created = timeline.create_window(CreateWindowInput {
                kind: WindowKind::Fast,
                start: t0(),
                end: t0() - h(1),
                note: None,
            });
            assert!(matches!(created, Err(TimelineError::InvalidInterval { .. })));
            assert!(all_windows(&timeline).is_empty());

            let fast = timeline.start_fast(t0()).expect("Start failed");
            let updated = timeline.update_window(fast.id, UpdateWindowInput {
                end: Some(t0() - h(1)),
                ..Default::default()
            });
            assert!(matches!(updated, Err(TimelineError::InvalidInterval { .. })));

            let unchanged = timeline.store().fetch_window(fast.id).expect("Query failed").expect("Missing");
            assert_eq!(unchanged.end, t0() + h(16));
        }

        it "accepts zero-length windows" {
            let window = timeline
                .create_window(CreateWindowInput {
                    kind: WindowKind::Eat,
                    start: t0(),
                    end: t0(),
                    note: None,
                })
                .expect("Create failed");
            assert_eq!(window.duration(), Duration::zero());
        }

        it "reports unknown windows" {
            let result = timeline.update_window(Uuid::new_v4(), UpdateWindowInput::default());
            assert!(matches!(result, Err(TimelineError::WindowNotFound(_))));

            assert!(!timeline.delete_window(Uuid::new_v4()).expect("Delete failed"));
        }

        it "clears the active window when it is deleted" {
            let fast = timeline.start_fast(t0()).expect("Start failed");
            assert!(timeline.delete_window(fast.id).expect("Delete failed"));

            assert!(!timeline.is_fasting());
            assert!(timeline.active_window().is_none());
        }
    }

    describe "reminders" {
        it "schedules end reminders for a running fast" {
            let fast = timeline.start_fast(t0()).expect("Start failed");

            let pending = scheduler.pending();
            let ids: Vec<String> = pending.iter().map(|e| e.id.clone()).collect();
            assert_eq!(
                ids,
                vec![
                    reminder_id(fast.id, ReminderKind::EndReminder),
                    reminder_id(fast.id, ReminderKind::End),
                ]
            );
            assert_eq!(pending[0].fire_at, t0() + h(16) - Duration::minutes(30));
            assert_eq!(pending[1].fire_at, t0() + h(16));
        }

        it "moves reminders to the next fast after stopping" {
            let fast = timeline.start_fast(t0()).expect("Start failed");
            let t1 = t0() + h(10);
            clock.set(t1);
            timeline.stop_fast(t1).expect("Stop failed");

            let planned = all_windows(&timeline)
                .into_iter()
                .find(|w| w.is_fast() && w.is_placeholder())
                .expect("No planned fast");

            let pending = scheduler.pending();
            assert_eq!(pending.len(), 4);
            assert!(pending.iter().all(|e| e.window_id == planned.id));
            assert_eq!(pending[0].kind, ReminderKind::StartReminder);
            assert_eq!(pending[1].kind, ReminderKind::Start);
            assert_eq!(pending[1].fire_at, t1 + h(8));

            let cancelled = scheduler.cancelled_log();
            assert!(cancelled.contains(&reminder_id(fast.id, ReminderKind::End)));
        }

        it "does not reschedule unchanged reminders" {
            timeline.start_fast(t0()).expect("Start failed");
            let scheduled = scheduler.scheduled_log().len();

            timeline.refresh().expect("Refresh failed");
            timeline.refresh().expect("Refresh failed");

            assert_eq!(scheduler.scheduled_log().len(), scheduled);
        }

        it "follows the configured lead time" {
            let fast = timeline.start_fast(t0()).expect("Start failed");
            timeline.set_lead_time(Duration::minutes(45)).expect("Update failed");

            let early = scheduler
                .pending()
                .into_iter()
                .find(|e| e.kind == ReminderKind::EndReminder)
                .expect("No early reminder");
            assert_eq!(early.fire_at, fast.end - Duration::minutes(45));
            assert!(early.body.contains("45 minutes"));
        }

        it "skips early reminders with no lead time" {
            timeline.set_lead_time(Duration::zero()).expect("Update failed");
            timeline.start_fast(t0()).expect("Start failed");

            let pending = scheduler.pending();
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].kind, ReminderKind::End);
        }

        it "leaves other apps' reminders alone" {
            scheduler.add_foreign("other.app.alarm", t0() + h(1));
            timeline.start_fast(t0()).expect("Start failed");
            timeline.reset().expect("Reset failed");

            let pending: Vec<String> =
                scheduler.pending_reminders().into_iter().map(|p| p.id).collect();
            assert_eq!(pending, vec!["other.app.alarm".to_string()]);
        }

        it "derives reminders even when notifications are denied" {
            let denied = Arc::new(InMemoryScheduler::denied());
            let db = Database::open_memory().expect("Failed to create in-memory database");
            db.migrate().expect("Failed to run migrations");
            let mut denied_timeline = Timeline::new(db, clock.clone(), denied.clone());

            denied_timeline.start_fast(t0()).expect("Start failed");

            assert_eq!(denied_timeline.reminder_events().len(), 2);
            assert!(denied.pending().is_empty());
        }
    }

    describe "projections" {
        it "summarizes fasting per day" {
            timeline.start_fast(t0()).expect("Start failed");
            clock.set(t0() + h(10));
            timeline.refresh().expect("Refresh failed");

            let week = timeline.weekly_summary();
            assert_eq!(week.len(), 7);
            assert_eq!(week[5].achieved_secs, 4 * 3600);
            assert_eq!(week[6].achieved_secs, 6 * 3600);
            assert_eq!(week[6].target_secs, 16 * 3600);
        }

        it "splits days at the clock's local offset" {
            let tokyo = FixedOffset::east_opt(9 * 3600).expect("Invalid offset");
            let local_clock = Arc::new(FixedClock::with_offset(t0(), tokyo));
            let mut local = fresh_timeline(local_clock);
            local.start_fast(t0()).expect("Start failed");

            // 20:00 UTC is 05:00 the next morning in UTC+9
            let (day_start, day_end) = local.today_bounds();
            assert_eq!(day_start, Utc.with_ymd_and_hms(2026, 5, 4, 15, 0, 0).unwrap());
            assert_eq!(day_end, Utc.with_ymd_and_hms(2026, 5, 5, 15, 0, 0).unwrap());

            let kinds: Vec<WindowKind> = local.today_windows().iter().map(|w| w.kind).collect();
            assert_eq!(kinds, vec![WindowKind::Fast, WindowKind::Eat]);

            // The same fast seen from UTC has no eating today
            timeline.start_fast(t0()).expect("Start failed");
            assert_eq!(timeline.today_windows().len(), 1);
        }

        it "groups started fasts by day" {
            let fast = timeline.start_fast(t0()).expect("Start failed");
            timeline.stop_fast(t0() + h(10)).expect("Stop failed");
            clock.set(t0() + h(10));
            timeline.refresh().expect("Refresh failed");

            let history = timeline.history();
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].windows.len(), 1);
            assert_eq!(history[0].windows[0].id, fast.id);
        }
    }

    describe "whole store" {
        it "resets to a fresh default regimen" {
            timeline.save_regimen(regimen_input("18:6", 18, 6, true)).expect("Save failed");
            timeline.start_fast(t0()).expect("Start failed");

            timeline.reset().expect("Reset failed");

            assert!(all_windows(&timeline).is_empty());
            assert!(!timeline.is_fasting());
            assert_eq!(timeline.active_regimen().expect("Query failed").name, DEFAULT_REGIMEN_NAME);
        }

        it "imports an exported store" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("backup.db");

            let fast = timeline.start_fast(t0()).expect("Start failed");
            timeline.export_snapshot(&path).expect("Export failed");
            timeline.reset().expect("Reset failed");

            timeline.import_snapshot(&path).expect("Import failed");

            assert_eq!(all_windows(&timeline).len(), 2);
            assert_eq!(timeline.active_window().map(|w| w.id), Some(fast.id));
        }
    }
}
