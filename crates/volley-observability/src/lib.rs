//! # volley-observability
//!
//! Structured logging for Volley binaries.
//!
//! Text or JSON lines via `tracing-subscriber`, with a global level and
//! per-crate overrides. `RUST_LOG` takes precedence when set.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, LogConfig};
