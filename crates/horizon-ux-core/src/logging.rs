//! Logging facilities for Horizon UX.
//!
//! Horizon UX uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in the host application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_ux::combo_box=debug,horizon_ux::query=trace")
//!     .init();
//! ```
//!
//! Every subsystem logs under its own target (see [`targets`]) so that the
//! noisy parts (query dispatch, timers) can be filtered independently.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "horizon_ux_core";
    /// Timer queue target.
    pub const TIMER: &str = "horizon_ux_core::timer";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_ux_core::signal";
    /// Combo-box engine target.
    pub const COMBO_BOX: &str = "horizon_ux::combo_box";
    /// Dropdown panel target.
    pub const DROPDOWN: &str = "horizon_ux::dropdown";
    /// Query dispatch and query sources.
    pub const QUERY: &str = "horizon_ux::query";
    /// Floating panel positioning.
    pub const POSITIONING: &str = "horizon_ux::positioning";
    /// Component registry.
    pub const REGISTRY: &str = "horizon_ux::registry";
}

/// A guard that keeps a tracing span entered until it is dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_ux::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_share_prefixes() {
        assert!(targets::TIMER.starts_with(targets::CORE));
        assert!(targets::SIGNAL.starts_with(targets::CORE));
        for target in [
            targets::COMBO_BOX,
            targets::DROPDOWN,
            targets::QUERY,
            targets::POSITIONING,
            targets::REGISTRY,
        ] {
            assert!(target.starts_with("horizon_ux::"));
        }
    }

    #[test]
    fn test_perf_span() {
        // Just ensure it doesn't panic without a subscriber.
        let _span = PerfSpan::new("test_operation");
        tracing::trace!(target: targets::CORE, "inside span");
    }
}
