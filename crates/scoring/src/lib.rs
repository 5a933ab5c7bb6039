//! # Scoring
//!
//! Scoring collaborator boundary: the HTTP client with its two submission
//! modes, normalization of the heterogeneous upstream response shapes into
//! the canonical four-KPI result, the KPI/variation reconciliation engine,
//! and the rep insight aggregator.

pub mod client;
pub mod insight;
pub mod mock;
pub mod normalize;
pub mod reconcile;

pub use client::ScoringClient;
pub use insight::aggregate_insights;
pub use mock::MockScoringApi;
pub use normalize::{normalize, RawScoringResponse};
pub use reconcile::ReconciliationState;
