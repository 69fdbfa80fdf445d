//! Domain models for Fastline.
//!
//! # Core Concepts
//!
//! ## Persisted Entities
//!
//! - [`Window`]: A half-open `[start, end)` interval tagged fast or eat. Windows
//!   either come from an explicit user action or are generated by the
//!   reconciler as placeholders for the expected continuation of the schedule.
//! - [`Regimen`]: A named target cycle of fast and feed durations. Exactly one
//!   regimen is active once any exist.
//!
//! ## Derived Entities
//!
//! These are computed from the timeline and never stored:
//!
//! - [`ReminderEvent`]: A notification tied to a fast window boundary.
//! - [`Snapshot`]: A full copy of the stored windows and regimens.

mod regimen;
mod reminder;
mod snapshot;
mod window;

pub use regimen::*;
pub use reminder::*;
pub use snapshot::*;
pub use window::*;
