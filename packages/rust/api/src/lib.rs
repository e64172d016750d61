//! Ingress adapters for the registry service.
//!
//! Two thin surfaces over [`scriptwatch_registry::Registry`]:
//! - [`routes`] — the synchronous HTTP API (axum)
//! - [`ingest`] — the queue-payload handler with at-most-once semantics
//!
//! Both translate transport shapes into service calls and back; neither owns
//! any registry logic of its own.

pub mod ingest;
pub mod routes;

pub use ingest::{IngestOutcome, ingest_payload};
pub use routes::{AppState, router};
