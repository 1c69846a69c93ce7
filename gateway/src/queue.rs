//! Thread-safe command queue.
//!
//! The queue owns the list of pending commands. Every operation takes the
//! same single mutex and runs a short critical section with no I/O, so a
//! concurrent enqueue during a drain either lands in the returned snapshot
//! or is excluded entirely.
//!
//! `drain` is the delivery point: a command handed out is considered
//! delivered even if the consumer crashes before executing it. The queue
//! provides at-most-once delivery, not at-least-once.

use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::NotFoundError;
use crate::types::{Command, NewCommand};

pub struct CommandQueue {
    commands: Mutex<Vec<Command>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Assign a unique id to a validated command and append it to the tail.
    /// Returns the assigned id.
    pub async fn enqueue(&self, command: NewCommand) -> Uuid {
        let id = Uuid::new_v4();
        let command = command.into_command(id);

        let mut commands = self.commands.lock().await;
        commands.push(command);
        drop(commands);

        info!("Command queued: {}", id);
        id
    }

    /// Atomically copy and clear the entire pending list, preserving
    /// insertion order.
    pub async fn drain(&self) -> Vec<Command> {
        let mut commands = self.commands.lock().await;
        let drained = std::mem::take(&mut *commands);
        drop(commands);

        if !drained.is_empty() {
            info!("Fetched and cleared {} queued commands", drained.len());
        } else {
            debug!("Drain requested on an empty queue");
        }
        drained
    }

    /// Remove a single entry matching `id`.
    pub async fn remove_by_id(&self, id: Uuid) -> Result<(), NotFoundError> {
        let mut commands = self.commands.lock().await;
        let initial_len = commands.len();
        commands.retain(|command| command.id != id);
        let removed = commands.len() < initial_len;
        drop(commands);

        if removed {
            info!("Removed queued command {}", id);
            Ok(())
        } else {
            Err(NotFoundError::CommandNotQueued { id })
        }
    }

    /// Empty the queue unconditionally. Clearing an already-empty queue
    /// succeeds.
    pub async fn clear_all(&self) {
        let mut commands = self.commands.lock().await;
        let cleared = commands.len();
        commands.clear();
        drop(commands);

        info!("Command queue cleared ({} entries)", cleared);
    }

    pub async fn len(&self) -> usize {
        self.commands.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.commands.lock().await.is_empty()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
