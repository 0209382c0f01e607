//! Mock response subsystem.
//!
//! # Data Flow
//! ```text
//! Matched Endpoint + ParameterMap
//!     → renderer.rs (pick default response, render body template)
//!     → [dispatcher sleeps for the response delay]
//!     → response.rs (status, headers, encoded body)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Rendering is synchronous and side-effect free; the delay is applied by the caller
//! - A missing response name or a template failure is a 500 for that request only
//! - Substitution happens on the encoded JSON text, then the result is re-parsed

pub mod renderer;
pub mod response;

pub use renderer::{RenderError, Renderer};
pub use response::{encode_body, into_http_response, render_error_response};
