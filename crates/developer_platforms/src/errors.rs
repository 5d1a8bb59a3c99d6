#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Error types for developer platform operations.
///
/// This enum represents the errors that can occur when reading issue
/// conversations from, or publishing results to, a developer platform or a
/// wallet registry.
///
/// # Examples
///
/// ```rust
/// use bounty_warden_developer_platforms::errors::Error;
///
/// let auth_error = Error::AuthError("Invalid token".to_string());
/// println!("{}", auth_error);
///
/// let rate_limit = Error::RateLimitExceeded;
/// assert_eq!(rate_limit.to_string(), "Rate limit exceeded");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Generic API request failure.
    ///
    /// Used as a fallback when more specific error information is not
    /// available.
    #[error("API request failed")]
    ApiError(),

    /// Authentication failed with the platform.
    ///
    /// The provided credentials are invalid, expired, or insufficient for the
    /// requested operation.
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Failed to update an issue, e.g. when posting a comment.
    #[error("Failed to update the issue: {0}")]
    FailedToUpdateIssue(String),

    /// Invalid response format from platform API.
    ///
    /// The response did not have the expected shape, or the requested entity
    /// could not be found.
    #[error("Invalid response format")]
    InvalidResponse,

    /// Platform rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// The wallet registry could not be queried.
    ///
    /// This is distinct from a user having no wallet registered, which is
    /// reported as `Ok(None)` by the registry.
    #[error("Wallet registry lookup failed: {0}")]
    WalletRegistryError(String),
}
