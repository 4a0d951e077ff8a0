//! Command-line and environment configuration for the relay binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use vigil_core::{ConfidenceLevel, RelayConfig};

#[derive(Debug, Parser)]
#[command(
    name = "vigil",
    about = "Interactive security-alert triage relay for Slack",
    version
)]
pub struct Cli {
    /// Public domain the gateway is reachable on; used for the OAuth
    /// redirect URI.
    #[arg(long, env = "DOMAIN_NAME", default_value = "localhost")]
    pub domain_name: String,

    #[arg(long, env = "SLACK_CLIENT_ID", default_value = "")]
    pub slack_client_id: String,

    #[arg(long, env = "SLACK_CLIENT_SECRET", default_value = "", hide_env_values = true)]
    pub slack_client_secret: String,

    /// Downstream queue location; the file-backed default queue treats this
    /// as a path.
    #[arg(long, env = "QUEUE_URL", default_value = ".vigil/outcome-queue.jsonl")]
    pub queue_url: String,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "VIGIL_STATE_DIR", default_value = ".vigil")]
    pub state_dir: PathBuf,

    /// Slack Web API base; override to point at a mock in tests.
    #[arg(long, env = "SLACK_API_BASE", default_value = "https://slack.com/api")]
    pub slack_api_base: String,

    /// Open an IM channel before posting instead of posting to the user id.
    #[arg(long, env = "VIGIL_OPEN_IM_CHANNEL")]
    pub open_im_channel: bool,

    #[arg(long, env = "VIGIL_REQUEST_TIMEOUT_MS", default_value_t = 10_000)]
    pub request_timeout_ms: u64,

    /// Budget for the acknowledgment publish; Slack expects the round trip
    /// inside a few seconds.
    #[arg(long, env = "VIGIL_PUBLISH_TIMEOUT_MS", default_value_t = 3_000)]
    pub publish_timeout_ms: u64,

    #[arg(
        long,
        env = "VIGIL_TOKEN_PARAMETER_PREFIX",
        default_value = "vigil/SlackOAuthToken"
    )]
    pub token_parameter_prefix: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP gateway.
    Serve {
        #[arg(long, env = "VIGIL_BIND", default_value = "127.0.0.1:8080")]
        bind: String,
    },
    /// Deliver one alert to its recipient (direct invocation).
    SendAlert {
        #[arg(long)]
        identifier: String,
        /// Name of the originating alert.
        #[arg(long)]
        alert: String,
        #[arg(long)]
        summary: String,
        /// Recipient email address.
        #[arg(long)]
        user: String,
        #[arg(long, default_value = "unknown")]
        identity_confidence: String,
    },
    /// Print the configured downstream queue location.
    DiscoverQueueUrl,
}

impl Cli {
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            domain_name: self.domain_name.clone(),
            slack_client_id: self.slack_client_id.clone(),
            slack_client_secret: self.slack_client_secret.clone(),
            queue_url: self.queue_url.clone(),
            slack_api_base: self.slack_api_base.clone(),
            state_dir: self.state_dir.clone(),
            open_im_channel: self.open_im_channel,
            request_timeout_ms: self.request_timeout_ms,
            publish_timeout_ms: self.publish_timeout_ms,
            token_parameter_prefix: self.token_parameter_prefix.clone(),
        }
    }

    pub fn parse_confidence(value: &str) -> ConfidenceLevel {
        ConfidenceLevel::parse(value)
    }
}
