// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Search once with the user query, then answer from the summary

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::directive::{result_token, CLOSE_TAG, OPEN_TAG};
use super::prompts::{grounded_answer, SEARCH_STATUS_MESSAGE};
use super::{
    search_and_summarize, stream_tokens, EventSink, FinishReason, InferRequest, RoundOutcome,
    StreamEvent, WorkflowContext, WorkflowError,
};
use crate::model::{ChatMessage, GenerationParams};

pub async fn run(
    ctx: &WorkflowContext,
    request: &InferRequest,
    sink: &EventSink,
    cancel: &CancellationToken,
) -> Result<FinishReason, WorkflowError> {
    sink.send(StreamEvent::status("search", SEARCH_STATUS_MESSAGE))
        .await?;
    sink.send(StreamEvent::token(format!(
        "\n{}{}{}\n",
        OPEN_TAG, request.query, CLOSE_TAG
    )))
    .await?;

    let summary = match search_and_summarize(ctx, &request.query, sink, cancel).await? {
        Some(summary) => summary,
        None => return Ok(FinishReason::Cancelled),
    };
    debug!("Naive RAG summary is {} chars", summary.len());
    sink.send(StreamEvent::token(result_token(&summary))).await?;

    let messages = [ChatMessage::user(
        grounded_answer(&summary, &request.query),
        &request.images,
    )];

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
