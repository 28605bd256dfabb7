//! Error taxonomy for the dashboard engine.
//!
//! Three failure classes, distinguished because each has a different
//! consumer obligation:
//! - transport failures are retried (push channel) or surfaced as a
//!   visible message (snapshot, assistant),
//! - shape failures are always surfaced, never coerced into an
//!   empty/zero display,
//! - parse failures on push frames are logged and dropped at the
//!   connection boundary.

use thiserror::Error;

/// Failure of a request/response fetch (snapshot or alert list).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Connection refused, timeout, or a non-2xx response.
    /// `status` is `None` when no response was received at all.
    #[error("transport failure (status {status:?}): {detail}")]
    Transport { status: Option<u16>, detail: String },

    /// Body was not JSON.
    #[error("response body is not JSON: {detail}")]
    Parse { detail: String },

    /// Body parsed as JSON but is not the expected structure.
    #[error("unexpected response shape: {detail}")]
    Shape { detail: String },
}

/// Failure of an assistant query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssistantError {
    #[error("question is empty")]
    EmptyQuestion,

    /// A previous `ask` is still in flight on this relay.
    #[error("a request is already in flight")]
    Busy,

    #[error("transport failure (status {status:?}): {detail}")]
    Transport { status: Option<u16>, detail: String },

    #[error("unexpected response shape: {detail}")]
    Shape { detail: String },
}
