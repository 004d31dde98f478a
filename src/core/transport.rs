// src/core/transport.rs
//! Request/response shapes exchanged with the scoring API, and the seam
//! every component sends them through.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// One part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
}

impl FormField {
    pub fn name(&self) -> &str {
        match self {
            FormField::Text { name, .. } | FormField::File { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart(Vec<FormField>),
}

/// A POST to one API endpoint.
#[derive(Clone, PartialEq)]
pub struct ApiRequest {
    pub endpoint: String,
    pub bearer_token: Option<String>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn json(endpoint: &str, payload: serde_json::Value) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            bearer_token: None,
            body: RequestBody::Json(payload),
        }
    }

    pub fn multipart(endpoint: &str, fields: Vec<FormField>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            bearer_token: None,
            body: RequestBody::Multipart(fields),
        }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Look up a multipart field by name.
    pub fn field(&self, name: &str) -> Option<&FormField> {
        match &self.body {
            RequestBody::Multipart(fields) => fields.iter().find(|f| f.name() == name),
            RequestBody::Json(_) => None,
        }
    }
}

// Bodies carry passwords and tokens; only the endpoint is printed.
impl std::fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRequest")
            .field("endpoint", &self.endpoint)
            .field("authorized", &self.bearer_token.is_some())
            .finish_non_exhaustive()
    }
}

/// A fully received HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: status_text_for(status),
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: serde_json::Value) -> Self {
        Self::new(status, Some("application/json; charset=utf-8"), value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn parse_json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

/// Canonical reason phrase for a status code, empty when unknown.
pub fn status_text_for(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or_default()
        .to_string()
}

/// Sends one request and waits for the whole response.
///
/// Returns [`ApiError::Transport`] only when no response was received; any
/// HTTP status, success or not, comes back as `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}
