//! Gateway API: the authenticated client and the typed facades built on it.

pub mod client;
mod credential;
pub mod envelope;
pub mod repository;
pub mod variables;

pub use client::{
    build_url, headers, ApiClient, BuildRequest, Headers, HttpRequest, HttpResponse, Method,
    ReqwestTransport, Transport, TransportError, REQUEST_TIMEOUT,
};
pub use envelope::{ApiEnvelope, Endpoint, Payload};
pub use repository::{CommitGroup, CommitRecord, RepositorySelector};
pub use variables::BuildScope;
