//! Inbound interaction decoding: a button click back into decision state.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{truncate_reason, RelayError};
use crate::message::DecisionPayload;

/// Fields of the echoed original message that may be forwarded back in the
/// update request. Everything else is platform-internal and gets dropped.
pub const ALLOWED_MESSAGE_FIELDS: [&str; 5] = ["text", "blocks", "attachments", "thread_ts", "mrkdwn"];

/// Wire envelope for an interaction callback, dispatched on its `type` tag.
/// Kinds the relay does not handle land on the catch-all variant instead of
/// failing to deserialize.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InteractionEnvelope {
    BlockActions(BlockActionsPayload),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct BlockActionsPayload {
    #[serde(default)]
    actions: Vec<ActionEntry>,
    user: Option<InteractionUser>,
    response_url: Option<String>,
    #[serde(default)]
    message: Value,
}

#[derive(Debug, Deserialize)]
struct ActionEntry {
    action_id: Option<String>,
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InteractionUser {
    id: String,
}

/// A decoded button click: the embedded decision state, who clicked, where
/// to post the follow-up, and the filtered echo of the original message.
#[derive(Debug, Clone)]
pub struct InboundInteraction {
    pub decision: DecisionPayload,
    pub responding_user_id: String,
    pub callback_url: String,
    pub original_message: Value,
}

/// Decodes one raw interaction payload.
///
/// A missing or empty action value is `MalformedAction`; a value that is not
/// valid decision JSON is `PayloadDecode` and means the composer and decoder
/// have drifted apart — it must never be swallowed silently.
pub fn decode_interaction(raw: &str) -> Result<InboundInteraction, RelayError> {
    let envelope: InteractionEnvelope = serde_json::from_str(raw)?;
    let payload = match envelope {
        InteractionEnvelope::BlockActions(payload) => payload,
        InteractionEnvelope::Unsupported => {
            return Err(RelayError::UnsupportedInteraction(truncate_reason(raw, 320)));
        }
    };

    let action = payload
        .actions
        .into_iter()
        .next()
        .ok_or_else(|| RelayError::MalformedAction("payload carried no actions".to_string()))?;
    let action_id = action.action_id.unwrap_or_default();
    let value = action
        .value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            RelayError::MalformedAction(format!("action '{action_id}' carried no value"))
        })?;

    let decision: DecisionPayload = serde_json::from_str(&value).map_err(|error| {
        tracing::error!(value = %value, %error, "failed to parse button value");
        RelayError::PayloadDecode(error)
    })?;

    let responding_user_id = payload
        .user
        .map(|user| user.id)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            RelayError::MalformedAction("payload missing responding user id".to_string())
        })?;
    let callback_url = payload
        .response_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| RelayError::MalformedAction("payload missing response_url".to_string()))?;

    Ok(InboundInteraction {
        decision,
        responding_user_id,
        callback_url,
        original_message: filter_original_message(payload.message),
    })
}

fn filter_original_message(message: Value) -> Value {
    match message {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .filter(|(name, _)| ALLOWED_MESSAGE_FIELDS.contains(&name.as_str()))
                .collect(),
        ),
        _ => Value::Object(Map::new()),
    }
}
