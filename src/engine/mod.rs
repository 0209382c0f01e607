//! Mediation engine.
//!
//! # Data Flow
//! ```text
//! Request (method, path)
//!     → mediation.rs (snapshot Route Table, find endpoint)
//!         ├─ active match → render → Mediation::Mock
//!         └─ no match / inactive → Mediation::Proxy (same snapshot's target) → ProxyMediator::forward
//!
//! Mutation (toggle, set default, target, reload, ...)
//!     → state.rs (writer lock → clone → edit → validate → ConfigStore → one swap)
//! ```
//!
//! # Design Decisions
//! - The only component holding shared mutable state
//! - Persistence failures surface to the caller and publish nothing

pub mod error;
pub mod mediation;
pub mod state;

pub use error::EngineError;
pub use mediation::{Mediation, ProxyReason};
pub use state::{Engine, EngineState};
