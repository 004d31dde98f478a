// src/guard.rs
use std::sync::Mutex;

use crate::app_log;
use crate::session::SessionStore;

/// Views of the application and the paths they are mounted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Signup,
    Login,
    Dashboard,
}

impl Route {
    /// Unknown paths fall through to the login page.
    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/signup" => Route::Signup,
            "/dashboard" => Route::Dashboard,
            _ => Route::Login,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Signup => "/signup",
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Receives navigation signals from components. The presentation layer decides what to do.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that remembers every signal, in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<Route> {
        self.routes().last().copied()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        app_log!(info, "Navigate to {}", route);
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(route);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(Route),
}

/// Decides from local state alone whether the protected area may render.
///
/// The token is never validated against the server and never checked for
/// expiry: a stored, non-empty token is enough.
#[derive(Clone)]
pub struct ProtectedRouteGuard {
    sessions: SessionStore,
}

impl ProtectedRouteGuard {
    pub fn new(sessions: SessionStore) -> Self {
        Self { sessions }
    }

    pub fn evaluate(&self) -> GuardDecision {
        match self.sessions.load() {
            Some(session) if session.is_authenticated() => GuardDecision::Render,
            _ => GuardDecision::Redirect(Route::Login),
        }
    }

    /// Resolve a path through the route table, guarding protected routes.
    pub fn resolve(&self, path: &str) -> (Route, GuardDecision) {
        let route = Route::from_path(path);
        if !route.is_protected() {
            return (route, GuardDecision::Render);
        }

        match self.evaluate() {
            GuardDecision::Render => (route, GuardDecision::Render),
            GuardDecision::Redirect(target) => {
                app_log!(info, "No session, redirecting {} to {}", route, target);
                (target, GuardDecision::Redirect(target))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::MemoryStorage;
    use crate::types::{Session, User};
    use std::sync::Arc;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryStorage::new()))
    }

    fn session() -> Session {
        Session::new(
            "tok",
            User {
                id: "1".to_string(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            },
        )
    }

    #[test]
    fn route_table_matches_app() {
        assert_eq!(Route::from_path("/signup"), Route::Signup);
        assert_eq!(Route::from_path("/login"), Route::Login);
        assert_eq!(Route::from_path("/dashboard/"), Route::Dashboard);
        assert_eq!(Route::from_path("/anything-else"), Route::Login);
        assert_eq!(Route::from_path("/"), Route::Login);
        assert!(Route::Dashboard.is_protected());
        assert!(!Route::Login.is_protected());
    }

    #[test]
    fn redirects_without_session() {
        let guard = ProtectedRouteGuard::new(store());
        assert_eq!(guard.evaluate(), GuardDecision::Redirect(Route::Login));
        assert_eq!(
            guard.resolve("/dashboard"),
            (Route::Login, GuardDecision::Redirect(Route::Login))
        );
    }

    #[test]
    fn renders_with_session_and_redirects_after_clear() {
        let sessions = store();
        let guard = ProtectedRouteGuard::new(sessions.clone());

        sessions.save(&session()).unwrap();
        assert_eq!(guard.evaluate(), GuardDecision::Render);
        assert_eq!(
            guard.resolve("/dashboard"),
            (Route::Dashboard, GuardDecision::Render)
        );

        sessions.clear().unwrap();
        assert_eq!(guard.evaluate(), GuardDecision::Redirect(Route::Login));
    }

    #[test]
    fn public_routes_always_render() {
        let guard = ProtectedRouteGuard::new(store());
        assert_eq!(guard.resolve("/signup"), (Route::Signup, GuardDecision::Render));
        assert_eq!(guard.resolve("/login"), (Route::Login, GuardDecision::Render));
    }

    #[test]
    fn recording_navigator_keeps_order() {
        let nav = RecordingNavigator::new();
        nav.navigate(Route::Login);
        nav.navigate(Route::Dashboard);
        assert_eq!(nav.routes(), vec![Route::Login, Route::Dashboard]);
        assert_eq!(nav.last(), Some(Route::Dashboard));
    }
}
