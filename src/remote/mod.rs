//! Boundary to the remote control plane that owns parameter sets.
//!
//! This module provides:
//! - The [`ControlPlane`] trait consumed by the apply and reconcile layers
//! - The normalized [`RemoteError`] taxonomy
//! - A JSON-over-HTTP implementation ([`HttpControlPlane`]) on top of the
//!   [`HttpClient`] abstraction, with [`ReqwestClient`] for production
//! - An in-memory implementation ([`InMemoryControlPlane`]) for tests and
//!   offline runs

mod client;
mod control_plane;
mod error;
mod http;
mod http_plane;
mod memory;


pub use client::ReqwestClient;
pub use control_plane::ControlPlane;
pub use error::{HttpError, IsRetryable, RemoteError};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use http_plane::HttpControlPlane;
pub use memory::{Call, InMemoryControlPlane, Operation};
