// src/types/mod.rs
pub mod response;
pub mod session;

pub use response::{ErrorBody, LoginResponse, ResumeFile, ScoreRequest, ScoreResponse, ScoreResult};
pub use session::{Credentials, Session, SignupProfile, User};
