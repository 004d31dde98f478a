// src/types/session.rs
use serde::{Deserialize, Deserializer, Serialize};

/// Authenticated user record as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Persisted proof of authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    /// A present, non-empty token is the only thing checked.
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

// Passwords stay out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Serialize)]
pub struct SignupProfile {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignupProfile {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for SignupProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupProfile")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_accepts_numbers_and_strings() {
        let numeric: User =
            serde_json::from_str(r#"{"id": 7, "name": "Ada", "email": "ada@example.com"}"#)
                .unwrap();
        assert_eq!(numeric.id, "7");

        let text: User = serde_json::from_str(
            r#"{"id": "64f1c0", "name": "Ada", "email": "ada@example.com"}"#,
        )
        .unwrap();
        assert_eq!(text.id, "64f1c0");
    }

    #[test]
    fn debug_output_hides_password() {
        let creds = Credentials::new("ada@example.com", "hunter2");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("ada@example.com"));
        assert!(!printed.contains("hunter2"));
    }
}
