// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Conversation and generation types shared by all model backends

use std::path::PathBuf;
use thiserror::Error;

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One part of a message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    /// Local image file, inlined as a data URL when sent to the model
    ImagePath(PathBuf),
}

/// A role-tagged message made of ordered content parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl ChatMessage {
    /// User message with text followed by the given images
    pub fn user(text: impl Into<String>, images: &[PathBuf]) -> Self {
        let mut content = vec![ContentPart::Text(text.into())];
        content.extend(images.iter().cloned().map(ContentPart::ImagePath));
        Self {
            role: Role::User,
            content,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentPart::Text(text.into())],
        }
    }

    /// Concatenated text parts
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text(t) => Some(t.as_str()),
                ContentPart::ImagePath(_) => None,
            })
            .collect()
    }
}

/// Sampling parameters forwarded to the backend
///
/// `None` fields are omitted from the request so the backend default applies.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub repetition_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    pub stop: Vec<String>,
    /// Keep the matched stop sequence at the end of the output
    pub include_stop_str_in_output: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: Some(0.0),
            top_p: Some(0.8),
            top_k: Some(20),
            repetition_penalty: Some(1.0),
            presence_penalty: Some(1.0),
            stop: Vec::new(),
            include_stop_str_in_output: false,
        }
    }
}

impl GenerationParams {
    /// Leave every sampling setting to the backend
    pub fn backend_defaults() -> Self {
        Self {
            temperature: None,
            top_p: None,
            top_k: None,
            repetition_penalty: None,
            presence_penalty: None,
            stop: Vec::new(),
            include_stop_str_in_output: false,
        }
    }

    /// Stop at `stop`, keeping it in the output
    pub fn stop_after(mut self, stop: impl Into<String>) -> Self {
        self.stop = vec![stop.into()];
        self.include_stop_str_in_output = true;
        self
    }
}

/// Model call errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model request failed: {0}")]
    Request(String),

    #[error("Model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model stream interrupted: {0}")]
    Stream(String),

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    #[error("Cannot read image {path}: {message}")]
    Image { path: String, message: String },
}
