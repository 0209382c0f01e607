//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config directory (config.toml + <feature>.json)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ConfigSnapshot (validated)
//!     → Engine publishes it as RouteTable + UpstreamTarget
//!
//! On mutation (toggle, set response, update target, ...):
//!     Engine validates the changed copy
//!     → store.rs persists it (temp file + rename)
//!     → atomic swap of the live Arc
//!
//! On external edit:
//!     watcher.rs detects change
//!     → store.rs loads and validates
//!     → Engine installs the snapshot
//! ```
//!
//! # Design Decisions
//! - A failed load or save never touches the live configuration
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;
pub mod watcher;

pub use loader::ConfigError;
pub use schema::{
    AdminConfig, ConfigSnapshot, Endpoint, FeatureGroup, GlobalConfig, ObservabilityConfig,
    ProxySettings, ResponseSpec, RewriteRule, ServerConfig,
};
pub use store::{ConfigStore, DirStore};
pub use validation::ValidationError;
