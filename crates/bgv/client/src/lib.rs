//! HTTP client for the BGV verification service
//!
//! [`HttpVerificationService`] implements the engine's
//! [`VerificationService`](bgv_engine::VerificationService) contract over
//! the service's REST API. Failures keep the server's own detail text so
//! operators see exactly what the service said.

#![deny(unsafe_code)]

mod config;
mod error;
mod http;

pub use config::*;
pub use error::{ClientError, ClientResult};
pub use http::HttpVerificationService;
