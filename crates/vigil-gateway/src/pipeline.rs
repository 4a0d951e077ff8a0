//! The two relay flows: outbound alert delivery and inbound interaction
//! handling. Shared by the HTTP surface and the direct-invocation CLI.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use serde_json::{json, Value};

use vigil_core::RelayConfig;
use vigil_slack::{
    apply_acknowledgment, compose_alert_message, decode_interaction, AlertRequest, DecisionPayload,
    PostedMessage, RelayError, SlackApiClient,
};
use vigil_store::{
    CredentialStore, EventQueue, FileCredentialStore, JsonlEventQueue, TokenCache,
};

/// Shared per-process state handed to every invocation.
pub struct RelayState {
    pub config: RelayConfig,
    pub slack: SlackApiClient,
    pub tokens: TokenCache,
    pub credentials: Arc<dyn CredentialStore>,
    pub queue: Arc<dyn EventQueue>,
}

impl RelayState {
    /// Builds the default store-backed state from configuration.
    pub fn from_config(config: RelayConfig) -> anyhow::Result<Arc<Self>> {
        let credentials: Arc<dyn CredentialStore> = Arc::new(
            FileCredentialStore::open(
                config.state_dir.join("credentials.json"),
                config.token_parameter_prefix.clone(),
            )
            .context("failed to open credential store")?,
        );
        let queue: Arc<dyn EventQueue> = Arc::new(
            JsonlEventQueue::open(PathBuf::from(&config.queue_url))
                .context("failed to open downstream queue")?,
        );
        Self::with_stores(config, credentials, queue)
    }

    /// Builds state around explicit store implementations.
    pub fn with_stores(
        config: RelayConfig,
        credentials: Arc<dyn CredentialStore>,
        queue: Arc<dyn EventQueue>,
    ) -> anyhow::Result<Arc<Self>> {
        let slack = SlackApiClient::new(&config.slack_api_base, config.request_timeout_ms)
            .context("failed to build slack api client")?;
        Ok(Arc::new(Self {
            tokens: TokenCache::new(Arc::clone(&credentials)),
            config,
            slack,
            credentials,
            queue,
        }))
    }
}

/// Normalized downstream record for one triage outcome.
///
/// Field names are the downstream consumer's contract; do not rename.
pub fn outcome_record(decision: &DecisionPayload, responding_user_id: &str) -> Value {
    json!({
        "identifier": decision.identifier,
        "user": {
            "email": decision.email,
            "slack": responding_user_id,
            "name": decision.slack_name,
        },
        "identityConfidence": decision.identity_confidence,
        "response": decision.response,
    })
}

/// Outbound flow: resolve the recipient, compose the interactive message,
/// and deliver it to a direct conversation.
pub async fn send_alert(
    state: &RelayState,
    request: &AlertRequest,
) -> Result<PostedMessage, RelayError> {
    let token = state
        .tokens
        .access_token(&state.config.slack_client_id)
        .await
        .map_err(|error| RelayError::Credential(error.to_string()))?;

    let identity = state
        .slack
        .lookup_user_by_email(&token, &request.email)
        .await
        .map_err(|source| RelayError::Resolution {
            email: request.email.clone(),
            source,
        })?;
    tracing::debug!(
        identifier = %request.identifier,
        user_id = %identity.platform_user_id,
        "resolved alert recipient"
    );

    let message = compose_alert_message(request, &identity)?;
    let channel = if state.config.open_im_channel {
        state
            .slack
            .open_direct_channel(&token, &identity.platform_user_id)
            .await
            .map_err(RelayError::Delivery)?
    } else {
        identity.platform_user_id.clone()
    };
    state
        .slack
        .post_message(&token, &channel, &message)
        .await
        .map_err(RelayError::Delivery)
}

/// Inbound flow: decode the click, forward the outcome downstream
/// (best-effort), and publish the acknowledgment to the callback URL.
pub async fn handle_interaction_payload(state: &RelayState, raw: &str) -> Result<(), RelayError> {
    let interaction = decode_interaction(raw)?;

    // Telemetry is best-effort; the user-visible acknowledgment is not.
    let record = outcome_record(&interaction.decision, &interaction.responding_user_id);
    match state.queue.publish(&record).await {
        Ok(message_id) => {
            tracing::debug!(%message_id, identifier = %interaction.decision.identifier, "forwarded triage outcome")
        }
        Err(error) => {
            tracing::error!(%error, identifier = %interaction.decision.identifier, "failed to forward triage outcome")
        }
    }

    let mut updated = interaction.original_message;
    apply_acknowledgment(&mut updated, &interaction.decision.response);
    state
        .slack
        .post_callback(
            &interaction.callback_url,
            &updated,
            state.config.publish_timeout_ms,
        )
        .await
        .map_err(|error| {
            tracing::error!(
                destination = %interaction.callback_url,
                payload = %updated,
                %error,
                "failed to publish acknowledgment"
            );
            RelayError::Publish {
                destination: interaction.callback_url.clone(),
                reason: error.to_string(),
            }
        })
}
