// src/auth.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::app_log;
use crate::core::transport::{ApiRequest, ApiResponse, Transport};
use crate::error::{ApiError, AuthError};
use crate::guard::{Navigator, Route};
use crate::session::SessionStore;
use crate::types::{Credentials, ErrorBody, LoginResponse, Session, SignupProfile};

pub const SIGNUP_ENDPOINT: &str = "/api/auth/signup";
pub const LOGIN_ENDPOINT: &str = "/api/auth/login";

const LOGIN_FAILED: &str = "Login failed";
const SIGNUP_FAILED: &str = "Signup failed";

/// Signup and login against the auth endpoints.
///
/// One gateway backs one form. While a call is pending [`AuthGateway::is_pending`]
/// is true and any further call returns [`ApiError::Busy`] without touching
/// the network.
pub struct AuthGateway {
    transport: Arc<dyn Transport>,
    sessions: SessionStore,
    navigator: Arc<dyn Navigator>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the call finishes, however it finishes.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn begin(flag: &'a AtomicBool) -> Result<Self, ApiError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(flag))
            .map_err(|_| ApiError::Busy)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AuthGateway {
    pub fn new(
        transport: Arc<dyn Transport>,
        sessions: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            sessions,
            navigator,
            in_flight: AtomicBool::new(false),
        }
    }

    /// True while a signup or login is awaiting its response.
    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Log in, persist the session and navigate to the dashboard.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(ApiError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let _in_flight = InFlight::begin(&self.in_flight)?;

        let request = ApiRequest::json(
            LOGIN_ENDPOINT,
            serde_json::json!({
                "email": credentials.email,
                "password": credentials.password,
            }),
        );

        app_log!(info, "Logging in {}", credentials.email);
        let response = self.send(request, LOGIN_FAILED).await?;

        if !response.is_success() {
            return Err(auth_error(&response, LOGIN_FAILED));
        }

        let login: LoginResponse = response.parse_json().map_err(|e| {
            app_log!(error, "Failed to parse login response: {}", e);
            ApiError::MalformedResponse(LOGIN_FAILED.to_string())
        })?;

        if login.token.is_empty() {
            app_log!(error, "Login response carried no token");
            return Err(ApiError::MalformedResponse(LOGIN_FAILED.to_string()));
        }

        let session = Session::new(login.token, login.user);
        self.sessions.save(&session)?;

        app_log!(info, "User {} logged in", session.user.email);
        self.navigator.navigate(Route::Dashboard);

        Ok(session)
    }

    /// Create an account. No session is established; navigates to the login page.
    pub async fn signup(&self, profile: &SignupProfile) -> Result<(), AuthError> {
        if profile.name.trim().is_empty()
            || profile.email.trim().is_empty()
            || profile.password.is_empty()
        {
            return Err(ApiError::Validation(
                "Name, email and password are required".to_string(),
            ));
        }

        let _in_flight = InFlight::begin(&self.in_flight)?;

        let request = ApiRequest::json(
            SIGNUP_ENDPOINT,
            serde_json::json!({
                "name": profile.name,
                "email": profile.email,
                "password": profile.password,
            }),
        );

        app_log!(info, "Signing up {}", profile.email);
        let response = self.send(request, SIGNUP_FAILED).await?;

        if !response.is_success() {
            return Err(auth_error(&response, SIGNUP_FAILED));
        }

        app_log!(info, "Signup successful for {}", profile.email);
        self.navigator.navigate(Route::Login);

        Ok(())
    }

    async fn send(&self, request: ApiRequest, fallback: &str) -> Result<ApiResponse, AuthError> {
        self.transport.send(request).await.map_err(|e| match e {
            ApiError::Transport(detail) => {
                app_log!(error, "{}: {}", fallback, detail);
                ApiError::Transport(fallback.to_string())
            }
            other => other,
        })
    }
}

/// Message from the JSON `msg`/`error` field when there is one, `fallback` otherwise.
fn auth_error(response: &ApiResponse, fallback: &str) -> AuthError {
    let message = response
        .parse_json::<ErrorBody>()
        .ok()
        .and_then(|body| body.auth_message())
        .unwrap_or_else(|| fallback.to_string());

    app_log!(
        warn,
        "Auth endpoint returned {}: {}",
        response.status,
        message
    );

    ApiError::Auth {
        status: response.status,
        message,
    }
}
