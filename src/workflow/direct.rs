// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plain single-shot generation

use tokio_util::sync::CancellationToken;

use super::{
    stream_tokens, EventSink, FinishReason, InferRequest, RoundOutcome, WorkflowContext,
    WorkflowError,
};
use crate::model::{ChatMessage, GenerationParams};

pub async fn run(
    ctx: &WorkflowContext,
    request: &InferRequest,
    sink: &EventSink,
    cancel: &CancellationToken,
) -> Result<FinishReason, WorkflowError> {
    let messages = [ChatMessage::user(request.query.as_str(), &request.images)];

    match stream_tokens(
        ctx.model.as_ref(),
        &messages,
        &GenerationParams::default(),
        sink,
        cancel,
    )
    .await?
    {
        RoundOutcome::Finished(_) => Ok(FinishReason::Complete),
        RoundOutcome::Cancelled => Ok(FinishReason::Cancelled),
    }
}
