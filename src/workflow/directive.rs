// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Search directive detection in model output

pub const OPEN_TAG: &str = "<search>";
pub const CLOSE_TAG: &str = "</search>";
pub const RESULT_OPEN_TAG: &str = "<search_result>";
pub const RESULT_CLOSE_TAG: &str = "</search_result>";

/// Query of the last complete `<search>…</search>` span in `text`
///
/// Scans right to left: the last closing tag first, then the nearest opening
/// tag before it. Earlier or malformed attempts are ignored. Returns `None`
/// when there is no complete span or its trimmed body is empty.
pub fn extract_search_query(text: &str) -> Option<String> {
    let close = text.rfind(CLOSE_TAG)?;
    let open = text[..close].rfind(OPEN_TAG)?;
    let query = text[open + OPEN_TAG.len()..close].trim();

    if query.is_empty() {
        None
    } else {
        Some(query.to_string())
    }
}

/// Wrap a summary the way it is streamed to the caller
pub fn result_token(summary: &str) -> String {
    format!("\n{}{}{}\n", RESULT_OPEN_TAG, summary, RESULT_CLOSE_TAG)
}

/// Wrap a summary the way it is added to the conversation
pub fn result_message(summary: &str) -> String {
    format!("{}{}{}", RESULT_OPEN_TAG, summary, RESULT_CLOSE_TAG)
}
