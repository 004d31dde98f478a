// src/workflow.rs
//! Resume submission state machine.
//!
//! The workflow owns the two form fields (resume file and job description)
//! and derives its state from them. `submit` is the only operation that
//! suspends; the `Submitting` state and an in-flight flag keep it single-flight.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::app_log;
use crate::core::transport::{ApiRequest, ApiResponse, FormField, Transport};
use crate::error::ApiError;
use crate::session::SessionStore;
use crate::types::{ErrorBody, ResumeFile, ScoreRequest, ScoreResponse, ScoreResult};
use crate::utils;

pub const SCORE_ENDPOINT: &str = "/api/score/score-jd";

const RESUME_FIELD: &str = "resume";
const JOB_DESCRIPTION_FIELD: &str = "jobDescription";
const SCORE_FAILED: &str = "Failed to score resume";
const DIAGNOSTIC_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Empty,
    ResumeSelected,
    TextEntered,
    BothReady,
    Submitting,
    Scored(ScoreResult),
    Error(String),
}

/// Read-only view of the form for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSnapshot {
    pub state: WorkflowState,
    pub resume_name: Option<String>,
    pub job_description: String,
    pub can_submit: bool,
    /// Steps completed out of three: resume or text, both, scored.
    pub progress: u8,
}

struct Inner {
    resume: Option<ResumeFile>,
    job_description: String,
    state: WorkflowState,
    in_flight: bool,
    // Bumped by reset so a pending submission cannot write into a cleared form.
    generation: u64,
}

impl Inner {
    fn has_text(&self) -> bool {
        !self.job_description.trim().is_empty()
    }

    fn fields_state(&self) -> WorkflowState {
        match (self.resume.is_some(), self.has_text()) {
            (false, false) => WorkflowState::Empty,
            (true, false) => WorkflowState::ResumeSelected,
            (false, true) => WorkflowState::TextEntered,
            (true, true) => WorkflowState::BothReady,
        }
    }

    fn can_submit(&self) -> bool {
        !self.in_flight
            && self.resume.is_some()
            && self.has_text()
            && matches!(
                self.state,
                WorkflowState::BothReady | WorkflowState::Error(_)
            )
    }

    fn progress(&self) -> u8 {
        match (&self.state, self.resume.is_some(), self.has_text()) {
            (WorkflowState::Scored(_), _, _) => 3,
            (_, true, true) => 2,
            (_, true, false) | (_, false, true) => 1,
            _ => 0,
        }
    }
}

pub struct SubmissionWorkflow {
    transport: Arc<dyn Transport>,
    sessions: SessionStore,
    inner: Mutex<Inner>,
}

impl SubmissionWorkflow {
    pub fn new(transport: Arc<dyn Transport>, sessions: SessionStore) -> Self {
        Self {
            transport,
            sessions,
            inner: Mutex::new(Inner {
                resume: None,
                job_description: String::new(),
                state: WorkflowState::Empty,
                in_flight: false,
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> WorkflowState {
        self.lock().state.clone()
    }

    pub fn can_submit(&self) -> bool {
        self.lock().can_submit()
    }

    pub fn is_submitting(&self) -> bool {
        self.lock().in_flight
    }

    pub fn resume(&self) -> Option<ResumeFile> {
        self.lock().resume.clone()
    }

    pub fn job_description(&self) -> String {
        self.lock().job_description.clone()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let inner = self.lock();
        WorkflowSnapshot {
            state: inner.state.clone(),
            resume_name: inner.resume.as_ref().map(|r| r.file_name.clone()),
            job_description: inner.job_description.clone(),
            can_submit: inner.can_submit(),
            progress: inner.progress(),
        }
    }

    /// Select (or replace) the resume. Ignored while a submission is pending.
    pub fn select_resume(&self, file: ResumeFile) -> WorkflowState {
        let mut inner = self.lock();
        if inner.state == WorkflowState::Submitting {
            app_log!(warn, "Ignoring resume selection while submitting");
            return inner.state.clone();
        }

        app_log!(info, "Resume selected: {} ({})", file.file_name, file.mime_type);
        inner.resume = Some(file);
        inner.state = inner.fields_state();
        inner.state.clone()
    }

    /// Replace the job description. Blank text undoes the "text entered" step.
    pub fn edit_job_description(&self, text: impl Into<String>) -> WorkflowState {
        let mut inner = self.lock();
        if inner.state == WorkflowState::Submitting {
            app_log!(warn, "Ignoring job description edit while submitting");
            return inner.state.clone();
        }

        inner.job_description = text.into();
        inner.state = inner.fields_state();
        inner.state.clone()
    }

    /// Clear both fields and any result or error. Callable from any state.
    pub fn reset(&self) -> WorkflowState {
        let mut inner = self.lock();
        inner.resume = None;
        inner.job_description.clear();
        inner.state = WorkflowState::Empty;
        inner.generation += 1;

        app_log!(info, "Workflow reset");
        WorkflowState::Empty
    }

    /// Submit the resume and job description for scoring.
    ///
    /// Returns [`ApiError::Validation`] without a request when either field is
    /// missing, and [`ApiError::Busy`] while a previous submission is pending.
    /// On failure the workflow moves to `Error` but keeps both fields so the
    /// user can retry.
    pub async fn submit(&self) -> Result<ScoreResult, ApiError> {
        let (request, generation) = {
            let mut inner = self.lock();
            if inner.in_flight {
                return Err(ApiError::Busy);
            }

            let request = ScoreRequest::new(inner.resume.as_ref(), &inner.job_description)?;

            if !inner.can_submit() {
                return Err(ApiError::Validation(
                    "Edit the resume or job description, or reset, to score again".to_string(),
                ));
            }

            inner.state = WorkflowState::Submitting;
            inner.in_flight = true;
            (request, inner.generation)
        };

        let outcome = self.score(request).await;

        let mut inner = self.lock();
        inner.in_flight = false;

        if inner.generation != generation {
            app_log!(info, "Workflow was reset while submitting; discarding outcome");
            return outcome;
        }

        inner.state = match &outcome {
            Ok(result) => {
                app_log!(info, "Resume scored: {}", result.value);
                WorkflowState::Scored(result.clone())
            }
            Err(e) => {
                app_log!(error, "Error scoring resume: {}", e);
                WorkflowState::Error(e.user_message())
            }
        };

        outcome
    }

    async fn score(&self, request: ScoreRequest) -> Result<ScoreResult, ApiError> {
        let token = self.sessions.token().unwrap_or_else(|| {
            app_log!(warn, "Submitting without a stored session token");
            String::new()
        });

        let ScoreRequest {
            resume,
            job_description,
        } = request;

        let api_request = ApiRequest::multipart(
            SCORE_ENDPOINT,
            vec![
                FormField::File {
                    name: RESUME_FIELD.to_string(),
                    file_name: resume.file_name,
                    mime_type: resume.mime_type,
                    bytes: resume.bytes,
                },
                FormField::Text {
                    name: JOB_DESCRIPTION_FIELD.to_string(),
                    value: job_description,
                },
            ],
        )
        .with_bearer(token);

        let response = self.transport.send(api_request).await.map_err(|e| match e {
            ApiError::Transport(detail) => {
                app_log!(error, "Scoring request failed: {}", detail);
                ApiError::Transport(format!("{}: could not reach the server", SCORE_FAILED))
            }
            other => other,
        })?;

        if !response.is_success() {
            return Err(score_error(&response));
        }

        let parsed: ScoreResponse = response.parse_json().map_err(|e| {
            app_log!(error, "Failed to parse score response: {}", e);
            ApiError::MalformedResponse(format!("{}: invalid response from server", SCORE_FAILED))
        })?;

        Ok(parsed.into())
    }
}

fn score_error(response: &ApiResponse) -> ApiError {
    if response.is_json() {
        let message = response
            .parse_json::<ErrorBody>()
            .ok()
            .and_then(|body| body.score_message())
            .unwrap_or_else(|| SCORE_FAILED.to_string());

        return ApiError::HttpJson {
            status: response.status,
            message,
        };
    }

    let diagnostic = response.text();
    app_log!(
        error,
        "Non-JSON response received: {}",
        utils::truncate_for_log(&diagnostic, DIAGNOSTIC_PREVIEW_CHARS)
    );

    ApiError::HttpOpaque {
        status: response.status,
        status_text: response.status_text.clone(),
        diagnostic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mock_transport::MockTransport;
    use crate::core::storage::MemoryStorage;
    use crate::core::transport::RequestBody;
    use crate::types::{Session, User};

    fn pdf() -> ResumeFile {
        ResumeFile::new("cv.pdf", "application/pdf", b"%PDF-1.4".to_vec())
    }

    fn logged_in_store() -> SessionStore {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        store
            .save(&Session::new(
                "jwt-123",
                User {
                    id: "u1".to_string(),
                    name: "Ada".to_string(),
                    email: "ada@example.com".to_string(),
                },
            ))
            .unwrap();
        store
    }

    fn workflow(mock: MockTransport) -> (Arc<MockTransport>, SubmissionWorkflow) {
        let mock = Arc::new(mock);
        let wf = SubmissionWorkflow::new(mock.clone(), logged_in_store());
        (mock, wf)
    }

    fn scored_82() -> ApiResponse {
        ApiResponse::json(
            200,
            serde_json::json!({
                "score": 82,
                "suggestions": ["Add metrics"],
                "support": ["https://x"]
            }),
        )
    }

    #[test]
    fn field_transitions() {
        let (_, wf) = workflow(MockTransport::new());
        assert_eq!(wf.state(), WorkflowState::Empty);

        assert_eq!(wf.edit_job_description("Rust dev"), WorkflowState::TextEntered);
        assert_eq!(wf.edit_job_description("   "), WorkflowState::Empty);

        assert_eq!(wf.select_resume(pdf()), WorkflowState::ResumeSelected);
        assert_eq!(wf.edit_job_description("Rust dev"), WorkflowState::BothReady);
        assert_eq!(wf.edit_job_description("\t"), WorkflowState::ResumeSelected);

        wf.reset();
        wf.edit_job_description("Rust dev");
        assert_eq!(wf.select_resume(pdf()), WorkflowState::BothReady);
    }

    #[test]
    fn selecting_again_overwrites_resume() {
        let (_, wf) = workflow(MockTransport::new());
        wf.select_resume(pdf());
        wf.select_resume(ResumeFile::new("new.pdf", "application/pdf", vec![1]));

        assert_eq!(wf.resume().unwrap().file_name, "new.pdf");
        assert_eq!(wf.state(), WorkflowState::ResumeSelected);
    }

    #[test]
    fn submit_disabled_until_both_fields_present() {
        let (_, wf) = workflow(MockTransport::new());
        assert!(!wf.can_submit());

        wf.select_resume(pdf());
        assert!(!wf.can_submit());

        wf.edit_job_description("  ");
        assert!(!wf.can_submit());

        wf.edit_job_description("Rust dev");
        assert!(wf.can_submit());
    }

    #[tokio::test]
    async fn submit_without_fields_makes_no_request() {
        let (mock, wf) = workflow(MockTransport::new().with_response(scored_82()));
        wf.edit_job_description("Rust dev");

        let err = wf.submit().await.unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(mock.request_count(), 0);
        assert_eq!(wf.state(), WorkflowState::TextEntered);
    }

    #[tokio::test]
    async fn scored_response_is_normalized() {
        let (mock, wf) = workflow(MockTransport::new().with_response(scored_82()));
        wf.select_resume(pdf());
        wf.edit_job_description("Rust dev");

        let result = wf.submit().await.unwrap();

        assert_eq!(result.value, 82);
        assert_eq!(result.suggestions, vec!["Add metrics".to_string()]);
        assert_eq!(result.support, vec!["https://x".to_string()]);
        assert_eq!(wf.state(), WorkflowState::Scored(result));
        assert_eq!(wf.snapshot().progress, 3);
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn request_carries_multipart_fields_and_bearer() {
        let (mock, wf) = workflow(MockTransport::new().with_response(scored_82()));
        wf.select_resume(pdf());
        wf.edit_job_description("Senior Rust engineer");
        wf.submit().await.unwrap();

        let request = &mock.requests()[0];
        assert_eq!(request.endpoint, SCORE_ENDPOINT);
        assert_eq!(request.bearer_token.as_deref(), Some("jwt-123"));
        assert!(matches!(request.body, RequestBody::Multipart(_)));
        assert_eq!(
            request.field("resume"),
            Some(&FormField::File {
                name: "resume".to_string(),
                file_name: "cv.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                bytes: b"%PDF-1.4".to_vec(),
            })
        );
        assert_eq!(
            request.field("jobDescription"),
            Some(&FormField::Text {
                name: "jobDescription".to_string(),
                value: "Senior Rust engineer".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn opaque_error_keeps_fields() {
        let (_, wf) = workflow(MockTransport::new().with_response(ApiResponse::new(
            502,
            Some("text/html"),
            "<html><body>Bad Gateway</body></html>",
        )));
        wf.select_resume(pdf());
        wf.edit_job_description("Rust dev");

        let err = wf.submit().await.unwrap_err();

        assert_eq!(err.user_message(), "Server returned 502: Bad Gateway");
        assert_eq!(
            wf.state(),
            WorkflowState::Error("Server returned 502: Bad Gateway".to_string())
        );
        assert_eq!(wf.resume(), Some(pdf()));
        assert_eq!(wf.job_description(), "Rust dev");
    }

    #[tokio::test]
    async fn json_error_prefers_error_then_details() {
        let (mock, wf) = workflow(MockTransport::new());
        mock.push_response(ApiResponse::json(
            400,
            serde_json::json!({ "error": "Resume must be a PDF", "details": "ignored" }),
        ));
        mock.push_response(ApiResponse::json(
            500,
            serde_json::json!({ "details": "Model timeout" }),
        ));
        mock.push_response(ApiResponse::json(500, serde_json::json!({})));

        wf.select_resume(pdf());
        wf.edit_job_description("Rust dev");

        assert_eq!(
            wf.submit().await.unwrap_err().user_message(),
            "Resume must be a PDF"
        );
        assert_eq!(wf.submit().await.unwrap_err().user_message(), "Model timeout");
        assert_eq!(
            wf.submit().await.unwrap_err().user_message(),
            "Failed to score resume"
        );
        assert_eq!(mock.request_count(), 3);
    }

    #[tokio::test]
    async fn retry_after_error_succeeds_without_reselecting() {
        let (mock, wf) = workflow(MockTransport::new());
        mock.push_transport_error("connection reset");
        mock.push_response(scored_82());

        wf.select_resume(pdf());
        wf.edit_job_description("Rust dev");

        let err = wf.submit().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(wf.can_submit());

        let result = wf.submit().await.unwrap();
        assert_eq!(result.value, 82);
    }

    #[tokio::test]
    async fn malformed_success_body_is_an_error() {
        let (_, wf) = workflow(
            MockTransport::new().with_response(ApiResponse::new(200, Some("text/html"), "ok")),
        );
        wf.select_resume(pdf());
        wf.edit_job_description("Rust dev");

        let err = wf.submit().await.unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
        assert!(matches!(wf.state(), WorkflowState::Error(_)));
    }

    #[tokio::test]
    async fn repeated_submits_while_pending_issue_one_request() {
        let (mock, wf) = workflow(MockTransport::gated().with_response(scored_82()));
        wf.select_resume(pdf());
        wf.edit_job_description("Rust dev");

        let (first, others) = tokio::join!(wf.submit(), async {
            assert_eq!(wf.state(), WorkflowState::Submitting);
            assert!(!wf.can_submit());
            let second = wf.submit().await;
            let third = wf.submit().await;
            mock.release();
            (second, third)
        });

        assert_eq!(first.unwrap().value, 82);
        assert_eq!(others.0.unwrap_err(), ApiError::Busy);
        assert_eq!(others.1.unwrap_err(), ApiError::Busy);
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn edits_are_ignored_while_submitting() {
        let (mock, wf) = workflow(MockTransport::gated().with_response(scored_82()));
        wf.select_resume(pdf());
        wf.edit_job_description("Rust dev");

        let (result, _) = tokio::join!(wf.submit(), async {
            assert_eq!(wf.edit_job_description(""), WorkflowState::Submitting);
            mock.release();
        });

        assert!(result.is_ok());
        assert_eq!(wf.job_description(), "Rust dev");
    }

    #[tokio::test]
    async fn reset_while_pending_discards_outcome() {
        let (mock, wf) = workflow(MockTransport::gated().with_response(scored_82()));
        wf.select_resume(pdf());
        wf.edit_job_description("Rust dev");

        let (result, _) = tokio::join!(wf.submit(), async {
            wf.reset();
            mock.release();
        });

        assert!(result.is_ok());
        assert_eq!(wf.state(), WorkflowState::Empty);
        assert_eq!(wf.resume(), None);
        assert!(!wf.is_submitting());
    }

    #[tokio::test]
    async fn reset_from_every_state_is_empty() {
        let (mock, wf) = workflow(MockTransport::new());

        let assert_empty = |wf: &SubmissionWorkflow| {
            wf.reset();
            let snap = wf.snapshot();
            assert_eq!(snap.state, WorkflowState::Empty);
            assert_eq!(snap.resume_name, None);
            assert_eq!(snap.job_description, "");
            assert_eq!(snap.progress, 0);
        };

        assert_empty(&wf);

        wf.select_resume(pdf());
        assert_empty(&wf);

        wf.edit_job_description("Rust dev");
        assert_empty(&wf);

        wf.select_resume(pdf());
        wf.edit_job_description("Rust dev");
        assert_empty(&wf);

        mock.push_response(scored_82());
        wf.select_resume(pdf());
        wf.edit_job_description("Rust dev");
        wf.submit().await.unwrap();
        assert_empty(&wf);

        mock.push_response(ApiResponse::new(503, None, ""));
        wf.select_resume(pdf());
        wf.edit_job_description("Rust dev");
        wf.submit().await.unwrap_err();
        assert!(matches!(wf.state(), WorkflowState::Error(_)));
        assert_empty(&wf);
    }

    #[tokio::test]
    async fn scored_state_requires_an_edit_before_rescoring() {
        let (mock, wf) = workflow(MockTransport::new().with_response(scored_82()));
        wf.select_resume(pdf());
        wf.edit_job_description("Rust dev");
        wf.submit().await.unwrap();

        assert!(!wf.can_submit());
        assert!(matches!(wf.submit().await, Err(ApiError::Validation(_))));
        assert_eq!(mock.request_count(), 1);

        assert_eq!(wf.edit_job_description("Rust dev, remote"), WorkflowState::BothReady);
        assert!(wf.can_submit());
    }

    #[test]
    fn progress_counts_steps() {
        let (_, wf) = workflow(MockTransport::new());
        assert_eq!(wf.snapshot().progress, 0);
        wf.select_resume(pdf());
        assert_eq!(wf.snapshot().progress, 1);
        wf.edit_job_description("Rust dev");
        assert_eq!(wf.snapshot().progress, 2);
    }
}
