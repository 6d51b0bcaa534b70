//! Credential guard
//!
//! Holds the single upstream token handed over at construction.

use crate::error::InvocationError;

/// Upstream access token. Debug output never shows the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Gate every invocation and discovery open must pass first
#[derive(Debug, Clone, Default)]
pub struct CredentialGuard {
    token: Option<Credential>,
}

impl CredentialGuard {
    /// Guard around an optional token; blank tokens count as missing
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token
                .filter(|t| !t.trim().is_empty())
                .map(Credential::new),
        }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self::new(Some(token.into()))
    }

    /// Guard with no credential; every request it sees is rejected
    pub fn empty() -> Self {
        Self { token: None }
    }

    pub fn require(&self) -> Result<&Credential, InvocationError> {
        self.token.as_ref().ok_or(InvocationError::MissingCredential)
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }
}
