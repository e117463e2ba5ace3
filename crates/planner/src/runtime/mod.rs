//! Runtime services around the pure scheduling core.
//!
//! - [`schedules`] — Validation, occurrence calculation, event generation
//! - [`store`] — Repository traits and the JSON-file store
//! - [`show_lock`] — Per-show serialization of sync runs
//! - [`sync`] — Create/update/cancel/maintain entry points
//! - [`maintenance`] — Periodic horizon extension over all active shows

pub mod maintenance;
pub mod schedules;
pub mod show_lock;
pub mod store;
pub mod sync;

pub use maintenance::{MaintenanceRunner, MaintenanceSummary};
pub use store::{EventRepository, JsonStore, ShowRepository};
pub use sync::{EventSynchronizer, SyncReport};
