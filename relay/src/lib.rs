pub mod config;
pub mod executor;
pub mod poller;
pub mod push;
pub mod session;
pub mod types;

pub use config::{RelayConfig, Transport};
pub use executor::{ExecutionOutcome, Executor};
pub use poller::Poller;
pub use session::Session;
