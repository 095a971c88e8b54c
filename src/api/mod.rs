// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod streaming;
pub mod tasks;
pub mod uploads;

pub use errors::{ApiError, ErrorResponse};
pub use handlers::{HealthResponse, ModelsResponse, StopRequest, StopResponse, StopStatus};
pub use http_server::{create_app, serve, AppState, TASK_ID_HEADER};
pub use streaming::sse_response;
pub use tasks::{TaskHandle, TaskRegistry};
