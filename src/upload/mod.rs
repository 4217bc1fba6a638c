//! Export-and-upload pipeline: credentials, outcomes, response classification.

pub mod client;
pub mod coordinator;
pub mod notify;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::client::{HttpUploadClient, UploadClient, UploadRequest};
pub use self::coordinator::{Stage, UploadCoordinator};
pub use self::notify::{CompletionHandle, Notifier};

/// Multipart field carrying the archive.
pub const STUMBLE_FILE_FIELD: &str = "stumblefile";
/// Form field carrying the identity username.
pub const OBSERVER_PARAM: &str = "observer";
/// Form field carrying the identity password.
pub const PASSWORD_PARAM: &str = "password";

/// Username that may upload without a password.
pub const ANONYMOUS_USER: &str = "anonymous";

const SUCCESS_MARKER: &str = "uploaded successfully";
const BAD_LOGIN_MARKER: &str = "does not match login";

/// Terminal result of one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadOutcome {
    #[default]
    Unknown,
    Fail,
    Success,
    BadUsername,
    BadPassword,
    Exception,
    BadLogin,
}

impl UploadOutcome {
    pub fn title(&self) -> &'static str {
        match self {
            UploadOutcome::Unknown => "Unknown",
            UploadOutcome::Success => "Success",
            UploadOutcome::Fail
            | UploadOutcome::BadUsername
            | UploadOutcome::BadPassword
            | UploadOutcome::Exception
            | UploadOutcome::BadLogin => "Fail",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            UploadOutcome::Unknown => "Unknown error",
            UploadOutcome::Fail => "Fail",
            UploadOutcome::Success => "Upload Successful",
            UploadOutcome::BadUsername => "Username not set",
            UploadOutcome::BadPassword => "Password not set and username not 'anonymous'",
            UploadOutcome::Exception => "Exception",
            UploadOutcome::BadLogin => "Login failed, check password?",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success)
    }
}

impl std::fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title(), self.message())
    }
}

/// Classify the service's free-text reply.
///
/// The service only answers in prose, so this matches on fixed phrases. Any
/// change in its wording lands here.
pub fn classify_response(body: &str) -> UploadOutcome {
    if body.contains(SUCCESS_MARKER) {
        UploadOutcome::Success
    } else if body.contains(BAD_LOGIN_MARKER) {
        UploadOutcome::BadLogin
    } else {
        UploadOutcome::Fail
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("username not defined")]
    MissingUsername,

    #[error("password not defined and username isn't 'anonymous'")]
    MissingPassword,
}

impl From<CredentialError> for UploadOutcome {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::MissingUsername => UploadOutcome::BadUsername,
            CredentialError::MissingPassword => UploadOutcome::BadPassword,
        }
    }
}

/// Failures that abort a run after validation. All map to
/// [`UploadOutcome::Exception`].
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file problem: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport problem: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("export worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Upload identity as stored in settings.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.to_lowercase() == ANONYMOUS_USER
    }

    /// A username is required; a password is required unless anonymous.
    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.username.is_empty() {
            return Err(CredentialError::MissingUsername);
        }
        if self.password.is_empty() && !self.is_anonymous() {
            return Err(CredentialError::MissingPassword);
        }
        Ok(())
    }

    /// Form parameters sent alongside the archive.
    pub fn form_params(&self) -> Vec<(String, String)> {
        vec![
            (OBSERVER_PARAM.to_string(), self.username.clone()),
            (PASSWORD_PARAM.to_string(), self.password.clone()),
        ]
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
