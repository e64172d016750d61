//! Registry service: the single chokepoint every ingress channel funnels
//! through.
//!
//! Validates incoming file descriptors, creates records via the store, and
//! drives on-demand content refresh by combining fetcher results with store
//! updates. Holds no mutable state of its own — all state lives in the store,
//! so one [`service::Registry`] instance is shared by reference across all
//! adapters.

pub mod service;
pub mod validate;

pub use service::{Registry, RefreshOutcome};
pub use validate::{NormalizedFile, validate};
