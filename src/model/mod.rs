// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Language model access
//!
//! - [`ChatModel`]: streaming and one-shot chat completion
//! - [`OpenAiCompatClient`]: vLLM / OpenAI-compatible HTTP backend
//! - [`ModelRegistry`]: configured backends by id

pub mod client;
pub mod registry;
pub mod sse;
pub mod types;

pub use client::{ChatModel, OpenAiCompatClient, TokenStream};
pub use registry::{ModelInfo, ModelRegistry};
pub use types::{ChatMessage, ContentPart, GenerationParams, ModelError, Role};
