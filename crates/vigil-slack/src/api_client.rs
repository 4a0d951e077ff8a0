//! Slack Web API client used by the outbound and acknowledgment paths.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{truncate_reason, SlackApiError};
use crate::message::InteractiveMessage;

const SLACK_AUTHORIZE_URL: &str = "https://slack.com/oauth/v2/authorize";

/// Bot scopes requested during the OAuth authorize redirect. `users:read`
/// must accompany `users:read.email` or Slack rejects the grant.
pub const OAUTH_SCOPES: [&str; 4] = ["chat:write", "users:read", "users:read.email", "im:write"];

/// Messaging-platform identity resolved from a recipient email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientIdentity {
    pub platform_user_id: String,
    pub display_name: String,
}

/// Channel and timestamp Slack assigned to a delivered message.
#[derive(Debug, Clone, Serialize)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
}

#[derive(Debug, Deserialize)]
struct UserLookupResponse {
    ok: bool,
    user: Option<UserRecord>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ConversationOpenResponse {
    ok: bool,
    channel: Option<ChannelRecord>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelRecord {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    channel: Option<String>,
    ts: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OauthAccessResponse {
    ok: bool,
    access_token: Option<String>,
    error: Option<String>,
}

/// Builds the OAuth authorize URL a browser is redirected to from
/// `/authorize`. Scopes are space-joined in their fixed order.
pub fn oauth_authorize_url(client_id: &str, redirect_uri: &str) -> String {
    format!(
        "{}?redirect_uri={}&client_id={}&scope={}",
        SLACK_AUTHORIZE_URL,
        redirect_uri,
        client_id,
        OAUTH_SCOPES.join(" ")
    )
}

/// Thin client over the Slack Web API endpoints the relay needs.
///
/// Every call is a single attempt; the interaction round trip has to finish
/// inside Slack's response window, so there is no retry loop here.
#[derive(Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
}

impl SlackApiClient {
    pub fn new(api_base: &str, request_timeout_ms: u64) -> Result<Self, SlackApiError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("vigil-triage-relay"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    /// Resolves a Slack user from an email address via `users.lookupByEmail`.
    pub async fn lookup_user_by_email(
        &self,
        token: &str,
        email: &str,
    ) -> Result<RecipientIdentity, SlackApiError> {
        let request = self
            .http
            .post(self.endpoint("users.lookupByEmail"))
            .bearer_auth(token)
            .form(&[("email", email)]);
        let response: UserLookupResponse = self.execute("users.lookupByEmail", request).await?;
        if !response.ok {
            return Err(SlackApiError::rejected_opt(
                "users.lookupByEmail",
                response.error,
            ));
        }
        let user = response.user.ok_or_else(|| {
            SlackApiError::rejected("users.lookupByEmail", "response missing user")
        })?;
        Ok(RecipientIdentity {
            platform_user_id: user.id,
            display_name: user.name,
        })
    }

    /// Opens an IM conversation with a user and returns the channel id.
    pub async fn open_direct_channel(
        &self,
        token: &str,
        user_id: &str,
    ) -> Result<String, SlackApiError> {
        let request = self
            .http
            .post(self.endpoint("conversations.open"))
            .bearer_auth(token)
            .json(&json!({ "users": user_id }));
        let response: ConversationOpenResponse =
            self.execute("conversations.open", request).await?;
        if !response.ok {
            return Err(SlackApiError::rejected_opt(
                "conversations.open",
                response.error,
            ));
        }
        response
            .channel
            .map(|channel| channel.id)
            .ok_or_else(|| SlackApiError::rejected("conversations.open", "response missing channel"))
    }

    /// Posts an interactive message to a channel (or raw user id).
    pub async fn post_message(
        &self,
        token: &str,
        channel: &str,
        message: &InteractiveMessage,
    ) -> Result<PostedMessage, SlackApiError> {
        let request = self
            .http
            .post(self.endpoint("chat.postMessage"))
            .bearer_auth(token)
            .json(&json!({
                "channel": channel,
                "text": message.text,
                "blocks": message.blocks,
            }));
        let response: PostMessageResponse = self.execute("chat.postMessage", request).await?;
        if !response.ok {
            return Err(SlackApiError::rejected_opt(
                "chat.postMessage",
                response.error,
            ));
        }
        Ok(PostedMessage {
            channel: response.channel.unwrap_or_else(|| channel.to_string()),
            ts: response
                .ts
                .ok_or_else(|| SlackApiError::rejected("chat.postMessage", "response missing ts"))?,
        })
    }

    /// Exchanges an OAuth code for an access token via `oauth.v2.access`.
    pub async fn exchange_oauth_code(
        &self,
        code: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String, SlackApiError> {
        let request = self.http.post(self.endpoint("oauth.v2.access")).form(&[
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ]);
        let response: OauthAccessResponse = self.execute("oauth.v2.access", request).await?;
        if !response.ok {
            return Err(SlackApiError::rejected_opt("oauth.v2.access", response.error));
        }
        response
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| SlackApiError::rejected("oauth.v2.access", "response missing access_token"))
    }

    /// Posts the replacement message to an interaction's callback URL.
    ///
    /// The per-request timeout overrides the client default so an overrun
    /// surfaces inside Slack's response window instead of after it.
    pub async fn post_callback(
        &self,
        callback_url: &str,
        payload: &Value,
        timeout_ms: u64,
    ) -> Result<(), SlackApiError> {
        let response = self
            .http
            .post(callback_url)
            .timeout(Duration::from_millis(timeout_ms.max(1)))
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackApiError::rejected(
                "response_url publish",
                format!("status {}: {}", status.as_u16(), truncate_reason(&body, 320)),
            ));
        }
        Ok(())
    }

    async fn execute<T>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SlackApiError>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackApiError::rejected(
                operation,
                format!("status {}: {}", status.as_u16(), truncate_reason(&body, 320)),
            ));
        }
        Ok(response.json::<T>().await?)
    }
}
