//! volley-http: HTTP transport and inbound surface for Volley.
//!
//! - [`HttpRequestExecutor`]: reqwest-backed [`volley_core::RequestExecutor`]
//! - [`router`] / [`serve`]: axum `GET /dispatch` endpoint in front of a
//!   [`volley_core::BatchCoordinator`]

pub mod client;
pub mod error;
pub mod server;

pub use client::{HttpExecutorConfig, HttpRequestExecutor};
pub use error::HttpError;
pub use server::{router, serve};
