//! Error types
//!
//! Setup-phase variants (validation, credential material, authentication) abort provider
//! configuration. Per-call variants (region resolution, usage) are returned to the caller
//! and leave the shared provider untouched.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// `max_retries` was negative.
    #[error("max_retries should be a positive value, got {0}")]
    InvalidMaxRetries(i64),

    /// A required provider argument is empty.
    #[error("\"{0}\": required field is not set")]
    MissingField(&'static str),

    /// Two provider arguments must be given together.
    #[error("\"{field}\": all of `{field}, {with}` must be specified")]
    RequiredWith {
        field: &'static str,
        with: &'static str,
    },

    /// None of token, AK/SK or password credentials were configured.
    #[error("must configure token or aksk or username/password to be authorized")]
    NoAuthMethod,

    /// Password auth without a user name or user ID.
    #[error("\"password\": one of `user_name, user_id` must be specified")]
    MissingUser,

    /// A certificate or key path could not be read.
    #[error("error reading {what} from {path:?}: {source}")]
    CredentialRead {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Certificate or key material was rejected by the TLS stack.
    #[error("invalid {what}: {source}")]
    InvalidCredential {
        what: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The identity service rejected the credentials or returned an unusable token.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Non-success status from an API.
    #[error("API request failed: {status} {message}")]
    Api { status: u16, message: String },

    #[error("stopped after {0} redirects")]
    TooManyRedirects(usize),

    /// Request signing could not be performed.
    #[error("request signing failed: {0}")]
    Signing(String),

    /// The identity service knows no project named after the region.
    #[error("wrong name or no access to the region: {0}")]
    RegionNotFound(String),

    /// Resource-level region override without AK/SK credentials.
    #[error(
        "resource-level region {requested} must be the same as provider-level region {configured} \
         when using non AK/SK authentication"
    )]
    RegionMismatch { requested: String, configured: String },

    /// Service name missing from the catalog.
    #[error("must specify the service name and api version (no catalog entry for `{0}`)")]
    UnknownService(String),

    /// Admin-scoped service requested but the domain-scoped client failed to authenticate.
    #[error("service `{0}` needs a domain-scoped client, which is not available")]
    DomainClientUnavailable(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to read configuration file {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Whether the error was raised before any network activity.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidMaxRetries(_)
                | Error::MissingField(_)
                | Error::RequiredWith { .. }
                | Error::NoAuthMethod
                | Error::MissingUser
        )
    }

    /// HTTP status for API failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
