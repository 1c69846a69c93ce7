//! HTTP surface of the gateway.

pub mod handlers;
pub mod middleware;
pub mod server;
pub mod ws;

pub use server::{create_router, start_web_server};

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::correlator::ResponseCorrelator;
use crate::queue::CommandQueue;
use crate::registry::{PendingReplies, WorkerRegistry};

/// Application state shared across all handlers. Constructed once at
/// startup and passed by reference everywhere; there are no process-wide
/// globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub queue: Arc<CommandQueue>,
    pub correlator: Arc<ResponseCorrelator>,
    pub workers: Arc<WorkerRegistry>,
    pub pending: Arc<PendingReplies>,
}

impl AppState {
    pub fn new(config: Arc<GatewayConfig>) -> Self {
        Self {
            config,
            queue: Arc::new(CommandQueue::new()),
            correlator: Arc::new(ResponseCorrelator::new()),
            workers: Arc::new(WorkerRegistry::new()),
            pending: Arc::new(PendingReplies::new()),
        }
    }
}
