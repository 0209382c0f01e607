//! Public HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum, connect info)
//!     → request.rs (assign x-request-id, request span)
//!     → cors.rs (OPTIONS → 204; CORS headers on everything else)
//!     → dispatch.rs (engine.mediate → mock response | engine.forward)
//!     → Send to client
//! ```

pub mod cors;
pub mod dispatch;
pub mod request;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
