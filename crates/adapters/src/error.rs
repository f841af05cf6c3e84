// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Failure reported by a remote capability.
///
/// Display strings match the taxonomy the backends use in their own logs
/// (`rate_limited`, `timeout`, `http_error:<code>`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("rate_limited")]
    RateLimited,
    #[error("timeout")]
    Timeout,
    #[error("http_error:{0}")]
    Http(u16),
    #[error("{0}")]
    Other(String),
}

impl RemoteError {
    /// Rate limiting is retried after a fixed delay and never counts as a failure.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RemoteError::RateLimited)
    }

    /// Short tag for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteError::RateLimited => "rate_limited",
            RemoteError::Timeout => "timeout",
            RemoteError::Http(_) => "http_error",
            RemoteError::Other(_) => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[yare::parameterized(
        rate_limited = { RemoteError::RateLimited,          "rate_limited", "rate_limited", true },
        timeout      = { RemoteError::Timeout,              "timeout",      "timeout",      false },
        http         = { RemoteError::Http(503),            "http_error:503", "http_error", false },
        other        = { RemoteError::Other("boom".into()), "boom",         "other",        false },
    )]
    fn taxonomy(err: RemoteError, display: &str, kind: &str, rate_limited: bool) {
        assert_eq!(err.to_string(), display);
        assert_eq!(err.kind(), kind);
        assert_eq!(err.is_rate_limited(), rate_limited);
    }
}
