//! Proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Unmatched or inactive request
//!     → forward.rs (target taken from the engine snapshot of that request)
//!     → target.rs + rewrite.rs (outbound URI: rewrite rules, then base path)
//!     → headers.rs (hop-by-hop, Host, X-Forwarded-For)
//!     → upstream
//!     → headers.rs (strip upstream CORS)
//!     → client   (or upgrade.rs tunnel on 101)
//! ```
//!
//! # Design Decisions
//! - One upstream; the target is replaced whole, never edited in place
//! - The mediator owns only the HTTP client, never the target
//! - Bodies are streamed in both directions
//! - Connect failures, timeouts and upstream errors all answer 502

pub mod forward;
pub mod headers;
pub mod rewrite;
pub mod target;
pub mod upgrade;

pub use forward::{ForwardError, ProxyMediator};
pub use rewrite::PathRewrite;
pub use target::{TargetError, UpstreamTarget};
