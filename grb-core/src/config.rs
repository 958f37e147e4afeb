//! Process-wide configuration: global getters/setters for default
//! orientation, hyper/bitmap thresholds, thread counts and the burble
//! (verbose diagnostics) flag.
//!
//! Immutable after first use except through the explicit setters below,
//! each of which takes the global write lock.

use std::sync::OnceLock;

use parking_lot::RwLock;

/// Orientation a newly created matrix defaults to when the caller doesn't
/// specify one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultOrientation {
    /// Column-then-row (CSC).
    ByCol,
    /// Row-then-column (CSR).
    ByRow,
}

/// The mutable, process-wide configuration block.
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    /// Default orientation for new matrices.
    pub default_orientation: DefaultOrientation,
    /// Default `hyper_switch` assigned to new matrices.
    pub hyper_switch: f64,
    /// Default `bitmap_switch` assigned to new matrices.
    pub bitmap_switch: f64,
    /// Default worker-thread count used when a `Context` doesn't override
    /// it; `0` lets `rayon` pick based on available parallelism.
    pub default_nthreads: usize,
    /// Default chunk size (in entries) used when a `Context` doesn't
    /// override it.
    pub default_chunk: usize,
    /// Verbose-diagnostics toggle. When set, kernel dispatch decisions
    /// (format conversions taken, `axb` algorithm chosen) are emitted as
    /// `tracing::debug!` events and, if one is installed, routed through
    /// `print_callback`.
    pub burble: bool,
    /// Sink for burble diagnostics, in addition to the `tracing::debug!`
    /// events every burble call site also emits. `None` means burble text
    /// only goes to `tracing`.
    pub print_callback: Option<fn(&str)>,
}

impl Default for GlobalConfig {
    fn default() -> GlobalConfig {
        GlobalConfig {
            default_orientation: DefaultOrientation::ByCol,
            hyper_switch: 1.0 / 16.0,
            bitmap_switch: 0.25,
            default_nthreads: 0,
            default_chunk: 64 * 1024,
            burble: false,
            print_callback: None,
        }
    }
}

static GLOBAL: OnceLock<RwLock<GlobalConfig>> = OnceLock::new();

fn cell() -> &'static RwLock<GlobalConfig> {
    GLOBAL.get_or_init(|| RwLock::new(GlobalConfig::default()))
}

/// Snapshot of the current global configuration.
pub fn global() -> GlobalConfig {
    cell().read().clone()
}

/// Set the default matrix orientation.
pub fn set_default_orientation(value: DefaultOrientation) {
    cell().write().default_orientation = value;
}

/// Set the default `hyper_switch` threshold.
pub fn set_hyper_switch(value: f64) {
    cell().write().hyper_switch = value;
}

/// Set the default `bitmap_switch` threshold.
pub fn set_bitmap_switch(value: f64) {
    cell().write().bitmap_switch = value;
}

/// Set the default worker-thread count.
pub fn set_global_nthreads(n: usize) {
    cell().write().default_nthreads = n;
}

/// Set the default chunk size used to split parallel work.
pub fn set_default_chunk(chunk: usize) {
    cell().write().default_chunk = chunk;
}

/// Toggle verbose kernel-dispatch diagnostics.
pub fn set_burble(on: bool) {
    cell().write().burble = on;
}

/// Install (or clear, with `None`) a callback that receives burble
/// diagnostic text, mirroring `GxB_Global_Option_set(GxB_PRINTF, ...)`
/// in the original C API. Has no effect unless [`set_burble`] is also on.
pub fn set_print_callback(callback: Option<fn(&str)>) {
    cell().write().print_callback = callback;
}

/// Emit a burble diagnostic line if burble is enabled: always as a
/// `tracing::debug!` event, and additionally through the installed
/// print callback, if any.
pub(crate) fn burble_print(msg: &str) {
    let cfg = global();
    if !cfg.burble {
        return;
    }
    tracing::debug!(target: "grb_core::burble", "{msg}");
    if let Some(cb) = cfg.print_callback {
        cb(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_round_trip_through_global() {
        set_global_nthreads(7);
        assert_eq!(global().default_nthreads, 7);
        set_global_nthreads(0);
    }

    #[test]
    fn print_callback_round_trips_through_global() {
        fn sink(_msg: &str) {}
        set_print_callback(Some(sink));
        assert!(global().print_callback.is_some());
        set_print_callback(None);
        assert!(global().print_callback.is_none());
    }
}
