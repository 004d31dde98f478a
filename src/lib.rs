//! Resume scoring client: session handling, auth, route guarding and the
//! resume submission workflow against a remote scoring API.

/// Log through `tracing` with the level given as the first argument.
#[macro_export]
macro_rules! app_log {
    ($level:ident, $($arg:tt)+) => {
        ::tracing::$level!($($arg)+)
    };
}

pub mod auth;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod guard;
pub mod session;
pub mod types;
pub mod utils;
pub mod workflow;

pub use auth::AuthGateway;
pub use config::ClientConfig;
pub use error::{ApiError, AuthError};
pub use guard::{GuardDecision, Navigator, ProtectedRouteGuard, RecordingNavigator, Route};
pub use session::SessionStore;
pub use workflow::{SubmissionWorkflow, WorkflowState};
