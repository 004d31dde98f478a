// src/core/mock_transport.rs
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::core::transport::{ApiRequest, ApiResponse, Transport};
use crate::error::ApiError;

/// In-memory transport that replays queued responses and records every request.
///
/// A gated mock holds each call until [`MockTransport::release`] is called,
/// which lets tests observe a component while its request is pending.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
    gate: Option<Arc<Notify>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::default()
        }
    }

    pub fn with_response(self, response: ApiResponse) -> Self {
        self.push_response(response);
        self
    }

    pub fn push_response(&self, response: ApiResponse) {
        self.lock_responses().push_back(Ok(response));
    }

    pub fn push_transport_error(&self, message: &str) {
        self.lock_responses()
            .push_back(Err(ApiError::Transport(message.to_string())));
    }

    /// Let one pending call complete. A release issued before the call arrives is kept.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<ApiResponse, ApiError>>> {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.lock_responses()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("No mocked response queued".to_string())))
    }
}
