//! Per-instance engine counters.
//!
//! Each engine instance owns one [`EngineMetrics`]; nothing is shared across
//! instances. The counters are the bookkeeping an external prefetcher or
//! dashboard reads alongside the priming hint.

mod registry;

pub use registry::{EngineMetrics, MetricsSnapshot};
