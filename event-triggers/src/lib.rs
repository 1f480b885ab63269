//! Scheduled jobs that act on stored events.

pub mod notifier;
pub mod scan;

pub use notifier::SnsNotifier;
pub use scan::{run_scan, candidate_window};
