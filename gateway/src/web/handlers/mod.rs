//! HTTP request handlers for the gateway API.
//!
//! Organized by domain:
//! - `commands` - enqueue, drain, and cancellation endpoints
//! - `common` - shared acknowledgment types
//! - `responses` - response polling and worker status reports
//! - `status` - health check
//! - `workers` - push-variant worker listing and request/reply

pub mod commands;
pub mod common;
pub mod responses;
pub mod status;
pub mod workers;

pub use commands::*;
pub use responses::*;
pub use status::*;
pub use workers::*;
