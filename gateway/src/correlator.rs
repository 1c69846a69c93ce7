//! Response correlation between enqueued commands and worker reports.
//!
//! The correlator owns the response table. A registered id with no response
//! yet is kept distinct from an id that was never registered, so a polling
//! client can tell "keep polling" apart from "this id is wrong".
//!
//! There is no expiry by default: registered-but-never-answered entries
//! stay until the configured retention window (if any) evicts them.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::NotFoundError;
use crate::types::CommandResponse;

/// Outcome of a response lookup.
#[derive(Debug, Clone)]
pub enum ReadOutcome {
    /// The id was never registered (typo, or already evicted).
    NotRegistered,
    /// Registered, no response yet. The caller should retry later.
    Pending,
    /// The stored response.
    Ready(CommandResponse),
}

struct Entry {
    registered_at: DateTime<Utc>,
    response: Option<CommandResponse>,
}

pub struct ResponseCorrelator {
    responses: RwLock<HashMap<Uuid, Entry>>,
}

impl ResponseCorrelator {
    pub fn new() -> Self {
        Self {
            responses: RwLock::new(HashMap::new()),
        }
    }

    /// Mark `id` as outstanding with no response yet.
    pub async fn register(&self, id: Uuid) {
        let mut responses = self.responses.write().await;
        responses.insert(
            id,
            Entry {
                registered_at: Utc::now(),
                response: None,
            },
        );
        debug!("Registered command {} awaiting response", id);
    }

    /// Store the response for a registered id. A second update for the same
    /// id overwrites the first; this is a benign duplicate, not an error.
    pub async fn update(&self, response: CommandResponse) -> Result<(), NotFoundError> {
        let id = response.command_id;
        let mut responses = self.responses.write().await;
        match responses.get_mut(&id) {
            Some(entry) => {
                if entry.response.is_some() {
                    debug!("Overwriting existing response for command {}", id);
                }
                entry.response = Some(response);
                info!("Received status update for command {}", id);
                Ok(())
            }
            None => {
                warn!("Status update for unknown command {}", id);
                Err(NotFoundError::UnknownCommand { id })
            }
        }
    }

    pub async fn read(&self, id: Uuid) -> ReadOutcome {
        let responses = self.responses.read().await;
        match responses.get(&id) {
            None => ReadOutcome::NotRegistered,
            Some(Entry { response: None, .. }) => ReadOutcome::Pending,
            Some(Entry {
                response: Some(response),
                ..
            }) => ReadOutcome::Ready(response.clone()),
        }
    }

    /// Drop entries older than `max_hours`: answered entries by the time the
    /// response arrived, unanswered ones by registration time. Returns the
    /// number of evicted entries.
    pub async fn evict_older_than(&self, max_hours: u64) -> u32 {
        let cutoff = Utc::now() - chrono::Duration::hours(max_hours as i64);
        let mut responses = self.responses.write().await;
        let initial_count = responses.len();

        responses.retain(|id, entry| {
            let reference = entry
                .response
                .as_ref()
                .map(|r| r.received_at)
                .unwrap_or(entry.registered_at);
            let keep = reference > cutoff;
            if !keep {
                warn!(
                    "Evicting correlator entry for command {} (answered: {})",
                    id,
                    entry.response.is_some()
                );
            }
            keep
        });

        (initial_count - responses.len()) as u32
    }

    pub async fn len(&self) -> usize {
        self.responses.read().await.len()
    }
}

impl Default for ResponseCorrelator {
    fn default() -> Self {
        Self::new()
    }
}
