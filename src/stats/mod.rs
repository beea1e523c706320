//! Statistics and metrics

pub mod metrics;

pub use metrics::{ConnectionCounters, RelayKind, RelaySnapshot, RelayStats, ServerStats};
