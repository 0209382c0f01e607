//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Engine loaded → bind listeners → start watcher, reload loop, signals → serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → servers stop accepting and drain → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown
//!     SIGHUP → configuration reload
//! ```
//!
//! # Design Decisions
//! - Reloads are serialized through one loop and the engine's writer lock
//! - A failed reload is logged; the running configuration stays in effect

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, StartupOptions};
