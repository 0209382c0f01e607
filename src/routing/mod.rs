//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → table.rs (scan features and endpoints in order)
//!     → matcher.rs (segment-wise pattern comparison)
//!     → Return: matched Endpoint + feature name, or NoMatch
//!
//! Table publication:
//!     ConfigSnapshot.features
//!     → RouteTable (immutable)
//!     → shared via ArcSwap, replaced whole on every mutation
//! ```
//!
//! # Design Decisions
//! - Deterministic: same table and input always select the same endpoint
//! - First match wins (declaration order, not specificity)
//! - No match is a normal outcome, not an error

pub mod matcher;
pub mod table;

pub use matcher::{extract_params, path_matches, ParameterMap};
pub use table::{RouteMatch, RouteTable};
