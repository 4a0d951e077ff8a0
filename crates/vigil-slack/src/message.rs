//! Interactive message model and the alert composer.

use serde::{Deserialize, Serialize};

use vigil_core::{ConfidenceLevel, UserChoice};

use crate::api_client::RecipientIdentity;
use crate::error::RelayError;

pub const QUESTION_BLOCK_ID: &str = "vigil-triage-question";
pub const ANSWER_BLOCK_ID: &str = "vigil-triage-answer";
/// Reserved id of the acknowledgment block; at most one may exist.
pub const RESPONSE_BLOCK_ID: &str = "vigil-triage-response";
pub const ACTION_ID_PREFIX: &str = "vigil-triage-";

const YES_LABEL: &str = "Yes, I did that";
const NO_LABEL: &str = "No, I didn't do that!";
const WRONG_USER_LABEL: &str = "You've got the wrong person";
const NOT_SURE_LABEL: &str = "Hmm... I'm not sure";
const CONFIRM_TITLE: &str = "Are you sure?";
const NO_CONFIRM_TEXT: &str = "Are you sure that you didn't take that action? If you're \
                               sure then someone in the security team will contact you to \
                               follow up.";

/// One inbound security alert, the immutable input to the outbound pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRequest {
    pub identifier: String,
    pub alert: String,
    pub summary: String,
    pub email: String,
    pub identity_confidence: ConfidenceLevel,
}

/// Decision state serialized into every button value.
///
/// This is the only state carried across the round trip through the user's
/// client; the relay holds nothing between send and receive. All buttons of
/// one message carry identical payloads apart from `response`.
///
/// `response` stays a raw string on the wire so an out-of-vocabulary value
/// decodes cleanly and falls through to the internal-error acknowledgment
/// instead of failing the interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPayload {
    pub identifier: String,
    pub email: String,
    pub slack_name: String,
    pub alert: String,
    pub identity_confidence: ConfidenceLevel,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<bool>,
}

impl TextObject {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            kind: "mrkdwn".to_string(),
            text: text.into(),
            emoji: None,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: "plain_text".to_string(),
            text: text.into(),
            emoji: None,
        }
    }

    fn button_label(text: &str) -> Self {
        Self {
            kind: "plain_text".to_string(),
            text: text.to_string(),
            emoji: Some(false),
        }
    }
}

/// Confirm/deny sub-dialog attached to destructive or surprising actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmDialog {
    pub title: TextObject,
    pub text: TextObject,
    pub confirm: TextObject,
    pub deny: TextObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonElement {
    #[serde(rename = "type")]
    pub kind: String,
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm: Option<ConfirmDialog>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        block_id: String,
        text: TextObject,
    },
    Actions {
        block_id: String,
        elements: Vec<ButtonElement>,
    },
}

/// Composed outbound message: ordered blocks plus the plain-text fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractiveMessage {
    pub text: String,
    pub blocks: Vec<Block>,
}

fn decision_button(
    base: &DecisionPayload,
    choice: UserChoice,
    label: &str,
    style: Option<&str>,
    confirm: Option<ConfirmDialog>,
) -> Result<ButtonElement, RelayError> {
    let mut payload = base.clone();
    payload.response = choice.as_str().to_string();
    Ok(ButtonElement {
        kind: "button".to_string(),
        action_id: format!("{}{}", ACTION_ID_PREFIX, choice.as_str()),
        text: TextObject::button_label(label),
        style: style.map(str::to_string),
        confirm,
        value: serde_json::to_string(&payload)?,
    })
}

/// Builds the interactive "was this you?" message for one alert.
///
/// Action order is fixed for UI consistency: yes, no, then the
/// confidence-gated wrong-person action, then not-sure.
pub fn compose_alert_message(
    request: &AlertRequest,
    identity: &RecipientIdentity,
) -> Result<InteractiveMessage, RelayError> {
    let base = DecisionPayload {
        identifier: request.identifier.clone(),
        email: request.email.clone(),
        slack_name: identity.display_name.clone(),
        alert: request.alert.clone(),
        identity_confidence: request.identity_confidence,
        response: String::new(),
    };

    let mut elements = vec![
        decision_button(&base, UserChoice::Yes, YES_LABEL, Some("primary"), None)?,
        decision_button(
            &base,
            UserChoice::No,
            NO_LABEL,
            Some("danger"),
            Some(ConfirmDialog {
                title: TextObject::plain(CONFIRM_TITLE),
                text: TextObject::mrkdwn(NO_CONFIRM_TEXT),
                confirm: TextObject::plain("Ya, I didn't take that action"),
                deny: TextObject::plain("Oh, nevermind, I did do that"),
            }),
        )?,
    ];
    if request.identity_confidence.offers_wrong_user() {
        elements.push(decision_button(
            &base,
            UserChoice::WrongUser,
            WRONG_USER_LABEL,
            None,
            Some(ConfirmDialog {
                title: TextObject::plain(CONFIRM_TITLE),
                text: TextObject::mrkdwn(format!(
                    "Are you sure that {} isn't you and we've sent this alert to the wrong user?",
                    request.email
                )),
                confirm: TextObject::plain("Ya, that's not me"),
                deny: TextObject::plain("Oh, actually that is me"),
            }),
        )?);
    }
    elements.push(decision_button(
        &base,
        UserChoice::NotSure,
        NOT_SURE_LABEL,
        None,
        None,
    )?);

    let blocks = vec![
        Block::Section {
            block_id: QUESTION_BLOCK_ID.to_string(),
            text: TextObject::mrkdwn(format!(
                "{}\nWas this action taken by you ({})?",
                request.summary, request.email
            )),
        },
        Block::Actions {
            block_id: ANSWER_BLOCK_ID.to_string(),
            elements,
        },
    ];

    Ok(InteractiveMessage {
        text: request.summary.clone(),
        blocks,
    })
}
