//! Immutable relay configuration assembled once at process start.

use std::path::PathBuf;

/// Runtime configuration for the triage relay.
///
/// Populated from flags/environment by the CLI and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Public domain the gateway is served from; used to build the OAuth
    /// redirect URI handed to Slack.
    pub domain_name: String,
    pub slack_client_id: String,
    pub slack_client_secret: String,
    /// Downstream queue location. The file-backed default queue treats this
    /// as a filesystem path.
    pub queue_url: String,
    /// Slack Web API base, overridable so tests can point at a mock server.
    pub slack_api_base: String,
    pub state_dir: PathBuf,
    /// Open an IM channel via `conversations.open` before posting instead of
    /// posting straight to the user id.
    pub open_im_channel: bool,
    pub request_timeout_ms: u64,
    /// Budget for posting the acknowledgment back to the interaction's
    /// callback URL. Slack expects the round trip inside a few seconds.
    pub publish_timeout_ms: u64,
    /// Prefix for credential-store parameter names.
    pub token_parameter_prefix: String,
}

impl RelayConfig {
    pub fn oauth_redirect_uri(&self) -> String {
        format!("https://{}/redirect_uri", self.domain_name)
    }
}
