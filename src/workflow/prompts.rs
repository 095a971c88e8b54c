// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fixed prompt texts

use super::directive::{CLOSE_TAG, OPEN_TAG};

/// First user message of an agentic run
pub fn agentic_instruction(query: &str) -> String {
    format!(
        "You are an assistant that can search the web on its own.\n\
         When you need external information, request a search in this format:\n\
         {open}your search query{close}\n\n\
         Once you have enough information, give the final answer and do not output {open}{close} again.\n\n\
         User question: {query}",
        open = OPEN_TAG,
        close = CLOSE_TAG,
        query = query
    )
}

/// Answer prompt for the single-search mode
pub fn grounded_answer(summary: &str, query: &str) -> String {
    format!(
        "Answer the question based on the reference material below:\n\
         1. Rely only on the given material and do not make anything up;\n\
         2. If the material does not contain the answer, say so clearly;\n\
         3. Keep the answer concise, accurate and well structured.\n\n\
         [Reference material]\n{summary}\n\n\
         [User question]\n{query}",
        summary = summary,
        query = query
    )
}

pub const SEARCH_STATUS_MESSAGE: &str = "Searching for relevant material...";
