//! Background task set for work that outlives the command that started it.

use std::{
    future::Future,
    mem,
    sync::{Arc, Mutex},
};

use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Tracks spawned background work so it can be awaited before exit.
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    set: Arc<Mutex<JoinSet<()>>>,
}

impl BackgroundTasks {
    /// Spawn `task` on the runtime, first dropping tasks that have finished.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self.set.lock() {
            Ok(mut set) => {
                reap(&mut set);
                set.spawn(task);
            }
            Err(_poisoned) => {
                warn!("background task set poisoned, spawning detached");
                tokio::spawn(task);
            }
        }
    }

    /// Number of tasks still running.
    pub fn running(&self) -> usize {
        self.set.lock().map_or(0, |mut set| {
            reap(&mut set);
            set.len()
        })
    }

    /// Wait for every task spawned so far.
    pub async fn wait(&self) {
        let mut set = match self.set.lock() {
            Ok(mut set) => mem::take(&mut *set),
            Err(_poisoned) => return,
        };

        debug!(tasks = set.len(), "waiting for background tasks");

        while let Some(result) = set.join_next().await {
            if let Err(error) = result {
                warn!(%error, "background task failed");
            }
        }
    }
}

fn reap(set: &mut JoinSet<()>) {
    while let Some(result) = set.try_join_next() {
        if let Err(error) = result {
            warn!(%error, "background task failed");
        }
    }
}
