//! # Retouch Server
//!
//! HTTP surface for the retouch manipulation analyzer. A client uploads
//! an image to `/{name}` and receives a JSON report describing whether
//! the image carries signs of post-processing in its embedded metadata.
//!
//! The analyze endpoint always answers with HTTP 200 and one of three
//! report shapes, carrying only as much detail as the request earned:
//!
//! - `{"is_valid": false}` when the request itself is malformed
//! - `{"is_valid": false, "name": ...}` when the body is not an
//!   analyzable image
//! - `{"is_valid": true, "name": ..., "tests": {...}}` with one verdict
//!   per heuristic otherwise
//!
//! Infrastructure endpoints (`/health`, `/ready`, `/metrics`) follow the
//! usual conventions and are exempt from the report contract.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::{build_router, start_server};
pub use state::ServerState;
