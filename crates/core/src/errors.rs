use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

#[derive(Error, Debug)]
pub enum BountyWardenError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to update issue. Issue was: '{0}'.")]
    FailedToUpdateIssue(String),

    #[error("Git provider error: {0}")]
    GitProviderError(String),

    #[error("Permit generation failed: {0}")]
    PermitError(#[from] PermitError),
}

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported schema version: {0}")]
    UnsupportedSchemaVersion(u32),

    #[error("Unknown contribution style '{0}'")]
    UnknownContributionStyle(String),

    #[error("Wallet table key '{0}' is not a GitHub user id")]
    InvalidWalletUserId(String),
}

/// Errors raised by a relevance judge.
///
/// The quality scorer never surfaces these; it substitutes a zero score.
#[derive(Error, Debug)]
pub enum QualityError {
    #[error("Relevance request failed: {0}")]
    Request(String),

    #[error("Relevance response was invalid: {0}")]
    InvalidResponse(String),

    #[error("Expected {expected} relevance scores, received {received}")]
    LengthMismatch { expected: usize, received: usize },
}

/// Errors raised while generating payment permits.
///
/// `Configuration` and `MissingSignerKey` abort the whole generation step.
/// The other variants only affect the user they were raised for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermitError {
    #[error("Permit configuration error: {0}")]
    Configuration(String),

    #[error("No signer key is configured")]
    MissingSignerKey,

    #[error("Invalid signer key: {0}")]
    InvalidSignerKey(String),

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("@{0} has no wallet registered")]
    WalletNotRegistered(String),

    #[error("Wallet lookup failed for @{login}: {reason}")]
    WalletLookupFailed { login: String, reason: String },

    #[error("Failed to sign permit: {0}")]
    Signing(String),
}

impl PermitError {
    /// Returns `true` for errors that stop permit generation for every user.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PermitError::Configuration(_)
                | PermitError::MissingSignerKey
                | PermitError::InvalidSignerKey(_)
        )
    }
}
