// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::app_log;
use crate::auth::AuthGateway;
use crate::config::ClientConfig;
use crate::guard::{GuardDecision, Navigator, ProtectedRouteGuard, Route};
use crate::types::{Credentials, ResumeFile, ScoreResult, SignupProfile};
use crate::workflow::SubmissionWorkflow;

#[derive(Parser, Debug)]
#[command(name = "resume-scorer")]
#[command(about = "Score a resume against a job description")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Base URL of the scoring API
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Remove the stored session
    Logout,
    /// Show whether a session is stored
    Status,
    /// Score a resume against a job description
    Score {
        /// Resume file (PDF or DOCX)
        #[arg(long)]
        resume: PathBuf,
        /// Job description text
        #[arg(long, conflicts_with = "job_description_file")]
        job_description: Option<String>,
        /// Read the job description from a file
        #[arg(long)]
        job_description_file: Option<PathBuf>,
    },
}

/// Prints where the app would go next.
struct CliNavigator;

impl Navigator for CliNavigator {
    fn navigate(&self, route: Route) {
        app_log!(info, "Navigate to {}", route);
        match route {
            Route::Dashboard => println!("  Next: resume-scorer score --resume <file> --job-description <text>"),
            Route::Login => println!("  Next: resume-scorer login --email <email> --password <password>"),
            Route::Signup => println!("  Next: resume-scorer signup"),
        }
    }
}

pub async fn handle_command(cli: Cli, mut config: ClientConfig) -> Result<()> {
    if let Some(url) = cli.api_url {
        config.with_api_url(url);
    }

    let sessions = config.session_store();
    let transport = Arc::new(config.service_client()?);
    let guard = ProtectedRouteGuard::new(sessions.clone());

    match cli.command {
        Command::Signup {
            name,
            email,
            password,
        } => {
            let gateway = AuthGateway::new(transport, sessions, Arc::new(CliNavigator));
            gateway
                .signup(&SignupProfile::new(name, email, password))
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("✓ Signup successful - please login");
        }

        Command::Login { email, password } => {
            let gateway = AuthGateway::new(transport, sessions, Arc::new(CliNavigator));
            let session = gateway
                .login(&Credentials::new(email, password))
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("✓ Logged in as {} <{}>", session.user.name, session.user.email);
        }

        Command::Logout => {
            sessions.clear().context("Failed to clear session")?;
            println!("✓ Logged out");
        }

        Command::Status => match guard.evaluate() {
            GuardDecision::Render => {
                if let Some(session) = sessions.load() {
                    println!("✓ Logged in as {} <{}>", session.user.name, session.user.email);
                }
                println!("  API: {}", config.api_url);
            }
            GuardDecision::Redirect(route) => {
                println!("Not logged in (would redirect to {})", route);
            }
        },

        Command::Score {
            resume,
            job_description,
            job_description_file,
        } => {
            if let GuardDecision::Redirect(_) = guard.evaluate() {
                anyhow::bail!("Not logged in. Run `resume-scorer login` first.");
            }

            let text = match (job_description, job_description_file) {
                (Some(text), _) => text,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read file: {}", path.display()))?,
                (None, None) => anyhow::bail!(
                    "Provide --job-description or --job-description-file"
                ),
            };

            let workflow = SubmissionWorkflow::new(transport, sessions);
            workflow.select_resume(ResumeFile::from_path(&resume).await?);
            workflow.edit_job_description(text);

            println!("Scoring {}...", resume.display());
            let result = workflow
                .submit()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;

            print!("{}", render_score(&result));
        }
    }

    Ok(())
}

/// Plain-text rendering of a score, suggestions numbered from one.
pub fn render_score(result: &ScoreResult) -> String {
    let mut out = format!("Score: {}/100\n", result.value);

    if !result.suggestions.is_empty() {
        out.push_str("\nImprovement Suggestions\n");
        for (idx, suggestion) in result.suggestions.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", idx + 1, suggestion));
        }
    }

    if !result.support.is_empty() {
        out.push_str("\nHelpful Resources\n");
        for link in &result.support {
            out.push_str(&format!("  - {}\n", link));
        }
    }

    out
}
