// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod model;
pub mod search;
pub mod workflow;

pub use api::{create_app, AppState};
pub use config::{AppConfig, ConfigError};
pub use model::{ChatModel, ModelRegistry, OpenAiCompatClient};
pub use search::{SearchService, Summarizer};
pub use workflow::{run_workflow, Mode, StreamEvent};
