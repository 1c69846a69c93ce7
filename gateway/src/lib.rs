pub mod config;
pub mod correlator;
pub mod errors;
pub mod queue;
pub mod registry;
pub mod types;
pub mod web;

// Re-export commonly used types
pub use config::GatewayConfig;
pub use correlator::{ReadOutcome, ResponseCorrelator};
pub use errors::GatewayError;
pub use queue::CommandQueue;
pub use registry::{PendingReplies, WorkerRegistry};
pub use web::AppState;
