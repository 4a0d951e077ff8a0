//! Error taxonomy for the relay pipeline and the Slack Web API client.

use thiserror::Error;

/// Failure talking to the Slack Web API.
///
/// Transport failure and an application-level rejection are distinct
/// variants because callers respond differently: a rejection carries a
/// Slack-reported reason (`ok:false` or a non-2xx status) and retrying the
/// same request is pointless, while a transport failure says nothing about
/// the request itself.
#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("slack {operation} rejected: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },
}

impl SlackApiError {
    pub(crate) fn rejected(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Rejected {
            operation,
            reason: reason.into(),
        }
    }

    pub(crate) fn rejected_opt(operation: &'static str, error: Option<String>) -> Self {
        Self::Rejected {
            operation,
            reason: error.unwrap_or_else(|| "unknown error".to_string()),
        }
    }
}

/// Pipeline-level failures, one variant per stage of the relay.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("identity resolution failed for {email}: {source}")]
    Resolution {
        email: String,
        #[source]
        source: SlackApiError,
    },
    #[error("message delivery failed: {0}")]
    Delivery(#[source] SlackApiError),
    #[error("acknowledgment publish to {destination} failed: {reason}")]
    Publish {
        destination: String,
        reason: String,
    },
    #[error("malformed interaction action: {0}")]
    MalformedAction(String),
    #[error("decision payload codec failure: {0}")]
    PayloadDecode(#[from] serde_json::Error),
    #[error("unsupported interaction kind: {0}")]
    UnsupportedInteraction(String),
    #[error("credential unavailable: {0}")]
    Credential(String),
}

/// Caps noisy upstream bodies before they land in an error message.
pub(crate) fn truncate_reason(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let mut truncated: String = body.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
