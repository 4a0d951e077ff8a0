//! Slack-facing half of the triage relay.
//!
//! Covers the interactive message protocol end to end: composing the
//! "was this you?" message with decision state embedded in every button,
//! decoding a button click back into that state, producing the follow-up
//! acknowledgment, and the thin Web API client the pipeline posts through.

pub mod api_client;
pub mod error;
pub mod interaction;
pub mod message;
pub mod response;

pub use api_client::{oauth_authorize_url, PostedMessage, RecipientIdentity, SlackApiClient, OAUTH_SCOPES};
pub use error::{RelayError, SlackApiError};
pub use interaction::{decode_interaction, InboundInteraction};
pub use message::{
    compose_alert_message, AlertRequest, Block, DecisionPayload, InteractiveMessage,
    ANSWER_BLOCK_ID, QUESTION_BLOCK_ID, RESPONSE_BLOCK_ID,
};
pub use response::{acknowledgment_text, apply_acknowledgment, CHANGED_MIND_PREFIX};
