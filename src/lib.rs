//! mockgate: an HTTP mock server that forwards whatever it does not mock.
//!
//! Requests are matched against feature groups of mock endpoints. An active
//! match is answered locally from a templated response; everything else is
//! reverse-proxied to a single configurable upstream.

pub mod admin;
pub mod config;
pub mod engine;
pub mod http;
pub mod lifecycle;
pub mod mock;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use engine::{Engine, EngineError, Mediation};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
