//! Password auth forms — structural validation, then the backend decides.
//!
//! Only emptiness and the sign-up password length are checked here. Every
//! other rule (email format, password strength, confirmation) is the
//! backend's, and its error text is shown as-is.

use serde::Deserialize;
use tracing::{info, warn};

use crate::backend::{AuthSession, Backend, BackendError, SignUpOutcome};

pub const MIN_PASSWORD_LEN: usize = 6;

pub const SIGN_UP_CONFIRM_EMAIL: &str = "Success! Please check your email to confirm your account.";
pub const SIGN_UP_ALREADY_REGISTERED: &str = "This user already exists. Please try logging in.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFormError {
    #[error("Please fill in all fields.")]
    MissingFields,
    #[error("Password must be at least 6 characters.")]
    PasswordTooShort,
    #[error("{0}")]
    Backend(String),
}

impl From<BackendError> for AuthFormError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err.user_message())
    }
}

/// Outcome shown on a rendered form. The in-flight state lives in the
/// browser, which disables the submit button until the response arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormState {
    #[default]
    Idle,
    Error(String),
    Success(String),
}

impl FormState {
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(msg) => Some(msg),
            _ => None,
        }
    }

    #[must_use]
    pub fn success(&self) -> Option<&str> {
        match self {
            Self::Success(msg) => Some(msg),
            _ => None,
        }
    }
}

// =============================================================================
// FORMS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    /// # Errors
    ///
    /// Blank email or password.
    pub fn validate(&self) -> Result<(), AuthFormError> {
        if self.email.trim().is_empty() || self.password.trim().is_empty() {
            return Err(AuthFormError::MissingFields);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SignUpForm {
    /// # Errors
    ///
    /// Blank fields, or a password shorter than [`MIN_PASSWORD_LEN`].
    pub fn validate(&self) -> Result<(), AuthFormError> {
        if [&self.username, &self.email, &self.password]
            .iter()
            .any(|f| f.trim().is_empty())
        {
            return Err(AuthFormError::MissingFields);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthFormError::PasswordTooShort);
        }
        Ok(())
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Validate and sign in.
///
/// # Errors
///
/// Validation errors before any backend call; otherwise the backend's text.
pub async fn sign_in(backend: &dyn Backend, form: &LoginForm) -> Result<AuthSession, AuthFormError> {
    form.validate()?;
    let email = form.email.trim();
    let session = backend
        .sign_in(email, &form.password)
        .await
        .inspect_err(|e| warn!(error = %e, "auth: sign-in failed"))?;
    info!(user_id = %session.user.id, "auth: signed in");
    Ok(session)
}

/// Result of a sign-up that the backend accepted or politely refused.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpResult {
    /// Account confirmed immediately; set cookies and go home.
    SignedIn(AuthSession),
    /// Show this on the form.
    Message(FormState),
}

/// Validate and register.
///
/// # Errors
///
/// Validation errors before any backend call; otherwise the backend's text.
pub async fn sign_up(backend: &dyn Backend, form: &SignUpForm) -> Result<SignUpResult, AuthFormError> {
    form.validate()?;
    let outcome = backend
        .sign_up(form.email.trim(), &form.password, form.username.trim())
        .await
        .inspect_err(|e| warn!(error = %e, "auth: sign-up failed"))?;

    Ok(match outcome {
        SignUpOutcome::SignedIn(session) => {
            info!(user_id = %session.user.id, "auth: signed up");
            SignUpResult::SignedIn(session)
        }
        SignUpOutcome::ConfirmationRequired => SignUpResult::Message(FormState::Success(SIGN_UP_CONFIRM_EMAIL.into())),
        SignUpOutcome::AlreadyRegistered => SignUpResult::Message(FormState::Error(SIGN_UP_ALREADY_REGISTERED.into())),
    })
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
