//! Blocking client core for the ONLYOFFICE portal REST API.
//!
//! # Overview
//! Covers authentication, people, files, projects and project tasks. Every
//! call builds a URL under `<portal>/api/2.0/`, attaches the session's bearer
//! token, and relays the JSON body or an [`ApiError`].
//!
//! # Design
//! - [`Session`] is a caller-owned value holding the portal URL, TLS policy
//!   and token. No global state.
//! - Operations are split into `build_*` (produces an [`HttpRequest`]) and
//!   `parse_*`/`apply_*` (consumes an [`HttpResponse`]), so the I/O boundary
//!   is explicit and testable without a network.
//! - [`PortalClient`] glues the two halves together through a [`Transport`];
//!   [`UreqTransport`] is the default.
//! - Response bodies are passed through as `serde_json::Value`.

pub mod client;
pub mod error;
pub mod http;
pub mod resources;
pub mod session;
pub mod transport;
pub mod types;

pub use client::PortalClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::Session;
pub use transport::{Transport, TransportError, UreqTransport, DEFAULT_BODY_LIMIT};
pub use types::{
    Authentication, Credentials, ProjectTasks, StatusFailure, StatusSet, TaskStatus,
    DEFAULT_PROJECT_FILTER,
};
