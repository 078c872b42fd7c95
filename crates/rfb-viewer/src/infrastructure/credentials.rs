//! Credential providers.
//!
//! The desktop UI normally supplies a password dialog.  For headless use the
//! binary can take the password from an environment variable instead.

use tracing::{debug, warn};

use crate::application::session::CredentialProvider;

/// Always answers with the same credential.  `None` simulates a user who
/// cancels the prompt.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    password: Option<String>,
}

impl StaticCredentialProvider {
    pub fn new(password: Option<String>) -> Self {
        Self { password }
    }

    pub fn cancelling() -> Self {
        Self { password: None }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn request_credential(&self, host: &str) -> Option<String> {
        debug!(host, supplied = self.password.is_some(), "credential requested");
        self.password.clone()
    }
}

/// Reads the password from an environment variable at prompt time.
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    var: String,
}

impl EnvCredentialProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn request_credential(&self, host: &str) -> Option<String> {
        match std::env::var(&self.var) {
            Ok(pw) if !pw.is_empty() => Some(pw),
            _ => {
                warn!(host, var = %self.var, "no password in environment; cancelling");
                None
            }
        }
    }
}
