// src/types/response.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ApiError;
use crate::types::session::User;
use crate::utils;

// ===== Request Types =====

/// A resume picked by the user, held in memory until submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ResumeFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a resume from disk, deriving the MIME type from its extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid resume path: {}", path.display()))?
            .to_string();

        let mime_type = utils::content_type_for(&file_name)?;

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Ok(Self::new(file_name, mime_type, bytes))
    }
}

/// Both halves of a scoring submission, validated.
#[derive(Debug, Clone)]
pub struct ScoreRequest {
    pub resume: ResumeFile,
    pub job_description: String,
}

impl ScoreRequest {
    /// Only succeeds when a resume is present and the text is non-blank after trimming.
    pub fn new(resume: Option<&ResumeFile>, job_description: &str) -> Result<Self, ApiError> {
        match resume {
            Some(resume) if !job_description.trim().is_empty() => Ok(Self {
                resume: resume.clone(),
                job_description: job_description.to_string(),
            }),
            _ => Err(ApiError::Validation(
                "Please upload a resume and provide a job description".to_string(),
            )),
        }
    }
}

// ===== Service Response Types =====

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: String,
    pub user: User,
}

/// Error body shared by the auth and scoring endpoints; each reads its own fields.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub msg: Option<String>,
    pub error: Option<String>,
    pub details: Option<String>,
}

impl ErrorBody {
    /// Auth endpoints report `msg`, falling back to `error`.
    pub fn auth_message(&self) -> Option<String> {
        non_empty(&self.msg).or_else(|| non_empty(&self.error))
    }

    /// The scoring endpoint reports `error`, falling back to `details`.
    pub fn score_message(&self) -> Option<String> {
        non_empty(&self.error).or_else(|| non_empty(&self.details))
    }
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field.as_ref().filter(|s| !s.is_empty()).cloned()
}

#[derive(Debug, Deserialize)]
pub struct ScoreResponse {
    pub score: f64,
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub support: Option<Vec<String>>,
    #[serde(default)]
    pub raw: Option<serde_json::Value>,
}

/// Normalized scoring outcome shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub value: u8,
    pub suggestions: Vec<String>,
    pub support: Vec<String>,
    pub raw: serde_json::Value,
}

impl From<ScoreResponse> for ScoreResult {
    fn from(response: ScoreResponse) -> Self {
        let value = if response.score.is_finite() {
            response.score.round().clamp(0.0, 100.0) as u8
        } else {
            0
        };

        Self {
            value,
            suggestions: response.suggestions,
            support: response.support.unwrap_or_default(),
            raw: response.raw.unwrap_or(serde_json::Value::Null),
        }
    }
}
