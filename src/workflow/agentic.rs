// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Agentic search loop
//!
//! Each round streams the model until it either stops on its own or closes a
//! `<search>` directive. A directive pauses generation: the query is searched,
//! the pages are summarized, and the summary is streamed to the caller and
//! appended to the conversation before the model is resumed.
//!
//! ```text
//! GENERATING ──no directive──▶ DONE(complete)
//!     │ directive
//!     ▼
//! SEARCHING ──summary──▶ GENERATING   (at most max_rounds model rounds)
//! ```

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::directive::{extract_search_query, result_message, result_token, CLOSE_TAG};
use super::prompts::agentic_instruction;
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
    let mut history = vec![ChatMessage::user(
        agentic_instruction(&request.query),
        &request.images,
    )];
    let params = GenerationParams::default().stop_after(CLOSE_TAG);
    let max_rounds = ctx.config.max_rounds;

    for round in 1..=max_rounds {
        if cancel.is_cancelled() {
            return Ok(FinishReason::Cancelled);
        }
        debug!("Agentic round {}/{}", round, max_rounds);

        let output =
            match stream_tokens(ctx.model.as_ref(), &history, &params, sink, cancel).await? {
                RoundOutcome::Finished(output) => output,
                RoundOutcome::Cancelled => return Ok(FinishReason::Cancelled),
            };

        let query = match extract_search_query(&output) {
            Some(query) => query,
            None => {
                info!("Agentic search answered after {} rounds", round);
                return Ok(FinishReason::Complete);
            }
        };

        history.push(ChatMessage::assistant(output));
        info!("Round {} requested search: '{}'", round, query);
        sink.send(StreamEvent::status("search", format!("Searching: {}", query)))
            .await?;

        let summary = match search_and_summarize(ctx, &query, sink, cancel).await? {
            Some(summary) => summary,
            None => return Ok(FinishReason::Cancelled),
        };

        sink.send(StreamEvent::token(result_token(&summary))).await?;
        history.push(ChatMessage::assistant(result_message(&summary)));
    }

    warn!(
        "Agentic search stopped at the {}-round limit",
        max_rounds
    );
    Ok(FinishReason::RoundLimit)
}
