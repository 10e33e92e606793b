//! Shared crate-wide constants.

/// Percentage that a set of percent-sized siblings is expected to fill.
pub const FULL_PERCENT: f64 = 100.0;

/// Tolerance used when comparing percentage totals.
///
/// Sizes are redistributed with floating point arithmetic, so a row whose
/// columns add up to `99.999999` is treated as full. Anything further away
/// than this is normalized by the size resolver.
pub const PERCENT_EPSILON: f64 = 1e-6;

/// Name given to the single tab of the fallback layout built when a saved
/// layout cannot be restored.
pub const DEFAULT_TAB_NAME: &str = "Untitled";

/// Upper bound of retained diagnostics lines.
pub const DEFAULT_MAX_LOG_LINES: usize = 2000;

/// Upper bound on upward cleanup steps.
///
/// The parent chain of a well-formed tree is acyclic, but a corrupted
/// snapshot can contain a parent loop; the walk stops after this many steps.
pub const MAX_CLEANUP_DEPTH: usize = 4096;
