//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher, proxy, engine, admin:
//!     → logging.rs (tracing events, pretty or JSON)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape (when enabled)
//! ```
//!
//! # Design Decisions
//! - Every request log line carries the request id from the trace span
//! - Metrics are in-memory only; nothing is persisted

pub mod logging;
pub mod metrics;
