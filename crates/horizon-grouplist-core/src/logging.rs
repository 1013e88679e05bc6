//! Logging facilities for Horizon Grouplist.
//!
//! Horizon Grouplist uses the `tracing` crate for instrumentation. Nothing is
//! printed unless the host application installs a subscriber:
//!
//! ```ignore
//! use tracing_subscriber::EnvFilter;
//!
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter(EnvFilter::new("horizon_grouplist::grouping=debug"))
//!         .init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! Every event is emitted under one of the [`targets`], so a subsystem can be
//! enabled on its own.

/// Span names used throughout Horizon Grouplist for tracing.
pub mod span_names {
    /// Group rebuild span.
    pub const REBUILD: &str = "horizon_grouplist::rebuild";
    /// In-group sort span.
    pub const RESORT: &str = "horizon_grouplist::resort";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_grouplist_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_grouplist_core::signal";
    /// Generic model target (providers, table models).
    pub const MODEL: &str = "horizon_grouplist::model";
    /// Group construction and group configuration.
    pub const GROUPING: &str = "horizon_grouplist::grouping";
    /// In-group ordering.
    pub const SORTING: &str = "horizon_grouplist::sorting";
    /// Notifications received from the data provider.
    pub const PROVIDER: &str = "horizon_grouplist::provider";
    /// Performance spans.
    pub const PERF: &str = "horizon_grouplist::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of operations such as a full
/// regroup.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}
