//! # Analytics Feature
//!
//! Two views that answer different questions and are never merged:
//! persisted per-session counters ([`UsageTracker`]) and window-scoped usage
//! derived from the message log and the module windows ([`windows`]).
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Window-scoped session analytics
//! - 1.0.0: Initial release with persisted counters

pub mod formatter;
pub mod usage_tracker;
pub mod windows;

pub use formatter::{format_session_analytics, format_usage, friendly_export_label};
pub use usage_tracker::{ExportKind, ExportedFile, SessionAnalytics, UsageEvent, UsageTracker};
pub use windows::{aggregate, messages_in_any_window, messages_in_window, WindowStats, WindowTotals};
