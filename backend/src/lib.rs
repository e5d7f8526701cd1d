//! PathGuard signing service
//!
//! Lists marker documents in the configured S3 bucket and hands out
//! short-lived presigned GET URLs so the map client never sees storage
//! credentials.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// S3 marker storage operations
pub mod marker_storage;

/// Route handlers
pub mod routes;

/// HTTP server setup
pub mod server;

/// Application state
pub mod state;

/// Environment configuration and error handling
pub mod types;
