//! Fastline keeps an intermittent-fasting timeline consistent.
//!
//! The crate is organised around three pieces:
//!
//! - [`db`]: the interval store. Windows and regimens live in SQLite (or in
//!   memory for tests and previews) behind the [`db::IntervalStore`] trait.
//! - [`timeline`]: the reconciler. Start, stop, edit and regimen changes each
//!   turn the stored window set into a new consistent state.
//! - [`reminders`]: derives notification events from the timeline and keeps
//!   an external scheduler in sync with them.
//!
//! [`summary`] holds the read-only weekly and history projections, and [`api`]
//! exposes everything over HTTP.

pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod durations;
pub mod error;
pub mod models;
pub mod reminders;
pub mod summary;
pub mod timeline;
