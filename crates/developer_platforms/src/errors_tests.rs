use super::*;
use std::error::Error as StdError;

#[test]
fn test_api_error() {
    let error = Error::ApiError();

    assert_eq!(error.to_string(), "API request failed");
    assert!(error.source().is_none());
}

#[test]
fn test_auth_error() {
    let error = Error::AuthError("Invalid credentials".to_string());

    assert_eq!(
        error.to_string(),
        "Authentication failed: Invalid credentials"
    );
    assert!(error.source().is_none());
}

#[test]
fn test_failed_to_update_issue_error() {
    let error = Error::FailedToUpdateIssue("Network error".to_string());

    assert_eq!(error.to_string(), "Failed to update the issue: Network error");
    assert!(error.source().is_none());
}

#[test]
fn test_invalid_response_error() {
    let error = Error::InvalidResponse;

    assert_eq!(error.to_string(), "Invalid response format");
    assert!(error.source().is_none());
}

#[test]
fn test_rate_limit_exceeded_error() {
    let error = Error::RateLimitExceeded;

    assert_eq!(error.to_string(), "Rate limit exceeded");
    assert!(error.source().is_none());
}

#[test]
fn test_wallet_registry_error() {
    let error = Error::WalletRegistryError("connection refused".to_string());

    assert_eq!(
        error.to_string(),
        "Wallet registry lookup failed: connection refused"
    );
}

#[test]
fn test_error_debug_formatting() {
    let error = Error::AuthError("Test".to_string());
    let debug_str = format!("{:?}", error);

    assert!(debug_str.contains("AuthError"));
    assert!(debug_str.contains("Test"));
}
