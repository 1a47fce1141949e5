//! Account operations: registration, login, profile updates, logout.
//!
//! These are the only writers of the session. Every network or storage
//! failure is turned into an [`AuthOutcome`] carrying a message fit for the
//! user; nothing here returns an error to the caller.

use crate::api::{AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest};
use crate::core::gateway::{ApiError, RequestGateway};
use crate::core::session::{ProfilePatch, SessionError, SessionRecord, SessionStore};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

const REGISTER_SUCCESS: &str = "Registration successful!";
const REGISTER_FAILED: &str = "Registration failed";
const LOGIN_FAILED: &str = "Invalid email or password";
const NOT_LOGGED_IN: &str = "You are not logged in.";
const PROFILE_UPDATED: &str = "Profile updated successfully!";
const PROFILE_UPDATE_FAILED: &str = "Failed to update profile.";
const SESSION_NOT_SAVED: &str = "Signed in, but the session could not be saved on this device.";
const PROFILE_NOT_SAVED: &str =
    "Profile updated, but the copy on this device could not be saved.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success { message: Option<String> },
    Failure { message: String },
}

impl AuthOutcome {
    fn success(message: Option<&str>) -> Self {
        AuthOutcome::Success {
            message: message.map(str::to_string),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        AuthOutcome::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            AuthOutcome::Success { message } => message.as_deref(),
            AuthOutcome::Failure { message } => Some(message),
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    gateway: RequestGateway,
    session: Arc<dyn SessionStore>,
}

impl AuthService {
    pub fn new(gateway: RequestGateway, session: Arc<dyn SessionStore>) -> Self {
        Self { gateway, session }
    }

    pub async fn register(&self, user: &RegisterRequest) -> AuthOutcome {
        let response = self
            .gateway
            .post::<_, AuthResponse>("/auth/register", user)
            .await;

        match response.map_err(AuthFailure::Api).and_then(|r| self.store(r)) {
            Ok(()) => AuthOutcome::success(Some(REGISTER_SUCCESS)),
            Err(AuthFailure::Session(err)) => {
                error!(error = %err, "Registered, but saving the session failed");
                AuthOutcome::failure(SESSION_NOT_SAVED)
            }
            Err(failure) => {
                warn!(error = %failure, "Registration failed");
                let message = failure.backend_message().unwrap_or(REGISTER_FAILED);
                AuthOutcome::failure(message)
            }
        }
    }

    /// The backend's reason for a failed login is never shown; it would tell
    /// the caller which of the two fields was wrong.
    pub async fn login(&self, credentials: &LoginRequest) -> AuthOutcome {
        let response = self
            .gateway
            .post::<_, AuthResponse>("/auth/login", credentials)
            .await;

        match response.map_err(AuthFailure::Api).and_then(|r| self.store(r)) {
            Ok(()) => AuthOutcome::success(None),
            Err(AuthFailure::Session(err)) => {
                error!(error = %err, "Logged in, but saving the session failed");
                AuthOutcome::failure(SESSION_NOT_SAVED)
            }
            Err(failure) => {
                debug!(error = %failure, "Login failed");
                AuthOutcome::failure(LOGIN_FAILED)
            }
        }
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> AuthOutcome {
        if !self
            .session
            .read()
            .is_some_and(|record| record.is_authenticated())
        {
            return AuthOutcome::failure(NOT_LOGGED_IN);
        }

        let response = self
            .gateway
            .put::<_, ProfilePatch>("/user/profile", update)
            .await;

        let merged = response
            .map_err(AuthFailure::Api)
            .and_then(|patch| self.session.merge(patch).map_err(AuthFailure::Session));
        match merged {
            Ok(_) => AuthOutcome::success(Some(PROFILE_UPDATED)),
            Err(AuthFailure::Session(err)) => {
                error!(error = %err, "Profile saved remotely, but merging it locally failed");
                AuthOutcome::failure(PROFILE_NOT_SAVED)
            }
            Err(failure) => {
                error!(error = %failure, "Profile update failed");
                AuthOutcome::failure(PROFILE_UPDATE_FAILED)
            }
        }
    }

    /// Local only; the backend keeps no session to end.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.session.clear()
    }

    pub fn current_user(&self) -> Option<SessionRecord> {
        self.session.read()
    }

    fn store(&self, response: AuthResponse) -> Result<(), AuthFailure> {
        let record = SessionRecord::new(response.jwt, response.profile);
        self.session.save(&record).map_err(AuthFailure::Session)
    }
}

#[derive(Debug)]
enum AuthFailure {
    Api(ApiError),
    Session(SessionError),
}

impl AuthFailure {
    fn backend_message(&self) -> Option<&str> {
        match self {
            AuthFailure::Api(err) => err.backend_message(),
            AuthFailure::Session(_) => None,
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailure::Api(err) => write!(f, "{err}"),
            AuthFailure::Session(err) => write!(f, "{err}"),
        }
    }
}
