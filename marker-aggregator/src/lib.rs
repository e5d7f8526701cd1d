//! PathGuard marker aggregation client
//!
//! Turns the signing service's URL list into a single unified marker
//! collection: one signing call, a full fan-out of presigned-URL fetches, a
//! deterministic join, and an ordered flatten. Consumers observe the cycle
//! through a loading / data / error feed.

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]

pub mod aggregator;

pub use aggregator::{
    AggregateError, AggregateResult, Aggregation, Aggregator, AggregatorConfig, FetchFailure,
    FetchFailureReason, FetchPolicy, FetchState, MarkerFeed,
};
