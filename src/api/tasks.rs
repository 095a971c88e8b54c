// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Running inference tasks, by id, for `/stop`

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

struct TaskEntry {
    serial: u64,
    token: CancellationToken,
}

/// Handle returned to the task that owns a registration
#[derive(Debug, Clone)]
pub struct TaskHandle {
    pub id: String,
    serial: u64,
    pub token: CancellationToken,
}

/// Task id → cancellation token
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<String, TaskEntry>>>,
    next_serial: Arc<AtomicU64>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh token under `id`
    ///
    /// A still-running task with the same id keeps running but can no longer
    /// be stopped by id.
    pub async fn register(&self, id: &str) -> TaskHandle {
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let previous = self.tasks.write().await.insert(
            id.to_string(),
            TaskEntry {
                serial,
                token: token.clone(),
            },
        );
        if previous.is_some() {
            warn!("Task id {} reused while still running", id);
        }

        TaskHandle {
            id: id.to_string(),
            serial,
            token,
        }
    }

    /// Signal the task; false when no such task is running
    pub async fn cancel(&self, id: &str) -> bool {
        match self.tasks.read().await.get(id) {
            Some(entry) => {
                entry.token.cancel();
                debug!("Cancellation requested for task {}", id);
                true
            }
            None => false,
        }
    }

    /// Drop the registration owned by `handle`
    pub async fn finish(&self, handle: &TaskHandle) {
        let mut tasks = self.tasks.write().await;
        if tasks.get(&handle.id).map(|e| e.serial) == Some(handle.serial) {
            tasks.remove(&handle.id);
        }
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.tasks.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }
}
