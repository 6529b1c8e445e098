//! Error kinds shared by every step of the diary workflow.
//!
//! Each step fails closed: the first error aborts the run and is surfaced to
//! the caller unchanged. The only exception is persisting a freshly generated
//! post, which the workflow reports alongside the text instead of failing.

use thiserror::Error;

// ---

/// Failures talking to an external HTTP service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection refused, DNS failure, TLS error and the like.
    #[error("service unreachable: {0}")]
    Unreachable(String),

    /// The service answered with a non-success status.
    #[error("status {status}: {message}")]
    Status { status: u16, message: String },

    /// The body did not contain what we expected.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum DiaryError {
    /// A required credential or key is absent.
    #[error("{0} is not configured")]
    ConfigurationMissing(&'static str),

    /// The store is reachable but holds no matching document.
    #[error("{0}")]
    NotFound(&'static str),

    /// The store could not be reached or the query failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("{service} request failed: {source}")]
    Upstream {
        service: &'static str,
        #[source]
        source: UpstreamError,
    },

    #[error("Text is too long ({length} characters). Maximum allowed: {max} characters.")]
    LengthExceeded { length: usize, max: usize },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl DiaryError {
    // ---
    pub fn upstream(service: &'static str, source: UpstreamError) -> Self {
        DiaryError::Upstream { service, source }
    }
}

impl From<sqlx::Error> for DiaryError {
    fn from(e: sqlx::Error) -> Self {
        // ---
        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => DiaryError::StoreUnavailable(e.to_string()),
            // Bad rows and rejected statements are not an outage
            other => DiaryError::Unknown(anyhow::anyhow!("store query failed: {}", other)),
        }
    }
}
