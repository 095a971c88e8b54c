// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caller-facing stream events

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::WorkflowError;

/// Why a stream ended normally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The model answered without requesting another search
    Complete,
    /// The round budget ran out
    RoundLimit,
    /// Stopped by the caller
    Cancelled,
}

/// One event in a workflow's output stream
///
/// Serialized with a `type` tag, e.g. `{"type":"token","content":"Paris"}`.
/// `done` or `error` is always the last event of a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Token { content: String },
    Status { stage: String, message: String },
    Done { reason: FinishReason },
    Error { message: String },
}

impl StreamEvent {
    pub fn token(content: impl Into<String>) -> Self {
        Self::Token {
            content: content.into(),
        }
    }

    pub fn status(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Status {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

/// Sending half of a workflow's event channel
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<StreamEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self { tx }
    }

    /// Bounded channel pair
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }

    /// Deliver an event, failing once the receiver is gone
    pub async fn send(&self, event: StreamEvent) -> Result<(), WorkflowError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| WorkflowError::Disconnected)
    }

    /// Resolves once the receiver is gone
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}
