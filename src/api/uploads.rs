// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart `/infer` form and per-request image storage

use axum_extra::extract::Multipart;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

use super::errors::ApiError;

#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub data: Bytes,
}

/// Raw `/infer` form fields
#[derive(Debug, Default)]
pub struct InferForm {
    pub query: Option<String>,
    pub model: Option<String>,
    pub mode: Option<String>,
    pub task_id: Option<String>,
    pub files: Vec<Upload>,
}

impl InferForm {
    pub async fn read(multipart: &mut Multipart) -> Result<Self, ApiError> {
        let mut form = InferForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "files" => {
                    let file_name = field.file_name().map(str::to_string);
                    let data = field.bytes().await.map_err(|e| {
                        ApiError::InvalidRequest(format!("Failed to read upload: {}", e))
                    })?;
                    // Browsers send an empty part when no file was picked
                    if let Some(file_name) = file_name.and_then(|n| sanitize_file_name(&n)) {
                        if !data.is_empty() {
                            form.files.push(Upload { file_name, data });
                        }
                    }
                }
                "query" | "model" | "mode" | "task_id" => {
                    let value = field.text().await.map_err(|e| {
                        ApiError::InvalidRequest(format!("Failed to read field {}: {}", name, e))
                    })?;
                    let value = Some(value).filter(|v| !v.trim().is_empty());
                    match name.as_str() {
                        "query" => form.query = value,
                        "model" => form.model = value,
                        "mode" => form.mode = value,
                        _ => form.task_id = value,
                    }
                }
                other => debug!("Ignoring unknown form field '{}'", other),
            }
        }

        Ok(form)
    }
}

/// Last path component of a client-supplied name
pub fn sanitize_file_name(name: &str) -> Option<String> {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Uploaded images on disk; removed when dropped
#[derive(Debug)]
pub struct SavedUploads {
    dir: TempDir,
    paths: Vec<PathBuf>,
}

impl SavedUploads {
    pub async fn save(files: &[Upload]) -> Result<Self, ApiError> {
        let dir = TempDir::new()
            .map_err(|e| ApiError::InternalError(format!("Failed to create upload dir: {}", e)))?;

        let mut paths = Vec::with_capacity(files.len());
        for (i, upload) in files.iter().enumerate() {
            // Index prefix keeps duplicate names apart
            let path = dir.path().join(format!("{:02}_{}", i, upload.file_name));
            tokio::fs::write(&path, &upload.data).await.map_err(|e| {
                ApiError::InternalError(format!("Failed to save {}: {}", upload.file_name, e))
            })?;
            paths.push(path);
        }

        Ok(Self { dir, paths })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}
