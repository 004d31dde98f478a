// src/core/service_client.rs
//! HTTP transport to the scoring API over reqwest - JSON bodies for auth, multipart for scoring

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};

use crate::app_log;
use crate::core::transport::{ApiRequest, ApiResponse, FormField, RequestBody, Transport};
use crate::error::ApiError;
use crate::utils;

pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl ServiceClient {
    /// Create new service client. Without a timeout the reqwest default applies.
    pub fn new(base_url: String, timeout_seconds: Option<u64>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_seconds {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_form(fields: Vec<FormField>) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for field in fields {
            form = match field {
                FormField::Text { name, value } => form.text(name, value),
                FormField::File {
                    name,
                    file_name,
                    mime_type,
                    bytes,
                } => {
                    let part = Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str(&mime_type)
                        .map_err(|e| {
                            ApiError::Validation(format!("Invalid MIME type {}: {}", mime_type, e))
                        })?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

#[async_trait]
impl Transport for ServiceClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = utils::join_url(&self.base_url, &request.endpoint);
        let mut builder = self.client.post(&url);

        if let Some(token) = &request.bearer_token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        builder = match request.body {
            RequestBody::Json(payload) => builder.json(&payload),
            RequestBody::Multipart(fields) => builder.multipart(Self::build_form(fields)?),
        };

        app_log!(info, "POST {}", url);

        let response = builder.send().await.map_err(|e| {
            app_log!(error, "HTTP request to {} failed: {}", url, e);
            ApiError::Transport(format!("Failed to reach {}: {}", url, e))
        })?;

        let status = response.status();
        app_log!(trace, "Response status: {}", status);

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await.map_err(|e| {
            app_log!(error, "Failed to read response body from {}: {}", url, e);
            ApiError::Transport(format!("Failed to read response from {}: {}", url, e))
        })?;

        Ok(ApiResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            content_type,
            body: body.to_vec(),
        })
    }
}
