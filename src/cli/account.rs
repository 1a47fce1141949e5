//! Sign-up, sign-in and session commands.

use std::error::Error;
use std::io::Write;

use clap::Args;
use tracing::debug;

use crate::api::{LoginRequest, RegisterRequest};
use crate::core::auth::AuthOutcome;
use crate::core::client::ResiliaClient;
use crate::core::constants::PASSWORD_ENV;
use crate::core::session::{SessionError, SessionRecord};
use crate::utils::input::prompt_stdin;

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub surname: Option<String>,
    #[arg(long)]
    pub age: Option<i32>,
    #[arg(long)]
    pub gender: Option<String>,
    /// Falls back to RESILIA_PASSWORD, then a prompt
    #[arg(long)]
    pub password: Option<String>,
}

impl RegisterArgs {
    pub fn into_request(self, password: String) -> RegisterRequest {
        RegisterRequest {
            email: self.email,
            password,
            name: self.name,
            surname: self.surname,
            username: Some(self.username),
            age: self.age,
            gender: self.gender,
        }
    }
}

/// Password from the flag, then `RESILIA_PASSWORD`, then an interactive prompt.
pub fn resolve_password(flag: Option<String>) -> Result<String, Box<dyn Error>> {
    let env_value = std::env::var(PASSWORD_ENV).ok();
    if let Some(password) = pick_password(flag, env_value) {
        return Ok(password);
    }

    debug!("No password given; prompting");
    match prompt_stdin("Password: ")? {
        Some(password) if !password.is_empty() => Ok(password),
        _ => Err("A password is required".into()),
    }
}

pub(crate) fn pick_password(flag: Option<String>, env_value: Option<String>) -> Option<String> {
    flag.into_iter()
        .chain(env_value)
        .find(|value| !value.is_empty())
}

/// The signed-in user, or the "not logged in" error every command reports.
pub fn require_user(client: &ResiliaClient) -> Result<SessionRecord, Box<dyn Error>> {
    match client.auth.current_user() {
        Some(record) if record.is_authenticated() => Ok(record),
        _ => Err(SessionError::NotAuthenticated.into()),
    }
}

fn report<W: Write>(outcome: AuthOutcome, success: &str, out: &mut W) -> Result<(), Box<dyn Error>> {
    match outcome {
        AuthOutcome::Success { message } => {
            writeln!(out, "✅ {}", message.as_deref().unwrap_or(success))?;
            Ok(())
        }
        AuthOutcome::Failure { message } => Err(message.into()),
    }
}

pub async fn register<W: Write>(
    client: &ResiliaClient,
    args: RegisterArgs,
    password: String,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let outcome = client.auth.register(&args.into_request(password)).await;
    report(outcome, "Registration successful!", out)
}

pub async fn login<W: Write>(
    client: &ResiliaClient,
    email: String,
    password: String,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let outcome = client.auth.login(&LoginRequest { email, password }).await;
    if !outcome.is_success() {
        return report(outcome, "", out);
    }

    let user = require_user(client)?;
    writeln!(out, "✅ Welcome back, {}!", user.profile.display_name())?;
    Ok(())
}

pub fn logout<W: Write>(client: &ResiliaClient, out: &mut W) -> Result<(), Box<dyn Error>> {
    client.auth.logout()?;
    writeln!(out, "👋 Logged out")?;
    Ok(())
}

pub fn whoami<W: Write>(client: &ResiliaClient, out: &mut W) -> Result<(), Box<dyn Error>> {
    let user = require_user(client)?;
    write!(out, "{}", user.profile.display_name())?;
    if let Some(email) = &user.profile.email {
        write!(out, " <{email}>")?;
    }
    writeln!(out)?;
    writeln!(out, "Backend: {}", client.base_url())?;
    Ok(())
}
