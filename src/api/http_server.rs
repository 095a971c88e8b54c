// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{Form, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::Multipart;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::errors::ApiError;
use super::handlers::{HealthResponse, ModelsResponse, StopRequest, StopResponse, StopStatus};
use super::streaming::sse_response;
use super::tasks::TaskRegistry;
use super::uploads::{InferForm, SavedUploads};
use crate::model::ModelRegistry;
use crate::search::{SearchService, Summarizer};
use crate::workflow::{
    run_workflow, EventSink, InferRequest, Mode, StreamEvent, WorkflowConfig, WorkflowContext,
};

pub const TASK_ID_HEADER: &str = "x-task-id";

/// Buffered events per request before the workflow waits on the client
const EVENT_BUFFER: usize = 256;

/// Shared by every request
pub struct AppState {
    pub models: Arc<ModelRegistry>,
    pub search: Arc<SearchService>,
    pub summarizer: Arc<Summarizer>,
    pub workflow: WorkflowConfig,
    pub tasks: TaskRegistry,
}

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/models", get(models_handler))
        .route("/infer", post(infer_handler))
        .route("/stop", post(stop_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers([HeaderName::from_static(TASK_ID_HEADER)]),
        )
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on {}", addr);
    axum::serve(listener, create_app(state)).await
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

async fn models_handler(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.models.list(),
    })
}

async fn infer_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = InferForm::read(&mut multipart).await?;

    let query = form.query.ok_or_else(|| ApiError::missing_field("query"))?;
    let model_id = form.model.ok_or_else(|| ApiError::missing_field("model"))?;
    let mode_name = form.mode.ok_or_else(|| ApiError::missing_field("mode"))?;

    let model = state
        .models
        .get(&model_id)
        .ok_or_else(|| ApiError::ModelNotFound {
            model: model_id.clone(),
            available_models: state.models.list().into_iter().map(|m| m.model).collect(),
        })?;
    let mode: Mode = mode_name.parse().map_err(|e: crate::workflow::UnknownMode| {
        ApiError::ValidationError {
            field: "mode".to_string(),
            message: e.to_string(),
        }
    })?;

    let task_id = form
        .task_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let header_value = HeaderValue::from_str(&task_id).map_err(|_| ApiError::ValidationError {
        field: "task_id".to_string(),
        message: "task_id must be a printable ASCII string".to_string(),
    })?;

    let uploads = SavedUploads::save(&form.files).await?;
    let request = InferRequest::new(query).with_images(uploads.paths().to_vec());
    let ctx = WorkflowContext {
        model,
        search: state.search.clone(),
        summarizer: state.summarizer.clone(),
        config: state.workflow.clone(),
    };

    let handle = state.tasks.register(&task_id).await;
    let (sink, receiver) = EventSink::channel(EVENT_BUFFER);
    info!(
        "Task {} started: mode={}, model={}, images={}",
        task_id,
        mode.as_str(),
        model_id,
        request.images.len()
    );

    let tasks = state.tasks.clone();
    tokio::spawn(async move {
        // Images live until the workflow is done with them
        let _uploads = uploads;
        let worker = tokio::spawn(run_workflow(
            mode,
            ctx,
            request,
            sink.clone(),
            handle.token.clone(),
        ));

        if let Err(e) = worker.await {
            error!("Task {} aborted: {}", handle.id, e);
            let _ = sink
                .send(StreamEvent::Error {
                    message: "Internal error while generating the answer".to_string(),
                })
                .await;
        }
        tasks.finish(&handle).await;
        info!("Task {} finished", handle.id);
    });

    Ok((
        [(HeaderName::from_static(TASK_ID_HEADER), header_value)],
        sse_response(receiver),
    )
        .into_response())
}

async fn stop_handler(
    State(state): State<Arc<AppState>>,
    Form(request): Form<StopRequest>,
) -> Json<StopResponse> {
    let status = if state.tasks.cancel(&request.task_id).await {
        info!("Stop requested for task {}", request.task_id);
        StopStatus::Stopping
    } else {
        StopStatus::NotFound
    };

    Json(StopResponse {
        status,
        task_id: request.task_id,
    })
}
