//! Acknowledgment composition: choice to canonical text, merged into the
//! original message's block list without ever duplicating the response block.

use serde_json::{json, Value};

use vigil_core::UserChoice;

use crate::message::RESPONSE_BLOCK_ID;

pub const CHANGED_MIND_PREFIX: &str = "You've changed your mind, no problem. ";

const YES_ACK: &str = ":heavy_check_mark: Understood, thanks for letting us know.";
const NO_ACK: &str = ":open_mouth: Got it, thank you. Someone from the security team will \
                     contact you to follow up on this.";
const WRONG_USER_ACK: &str = ":flushed: Oh, sorry about that. Someone from the security team \
                             will look into this and contact the right user. Sorry to bother \
                             you.";
const NOT_SURE_ACK: &str = ":ok_hand: No problem. Someone from the security team will contact \
                           you to follow up on this.";
const INTERNAL_ERROR_ACK: &str = ":heavy_multiplication_x: Hmm, I had some kind of internal \
                                 error. Would you contact the security team to let them know \
                                 that I'm unwell?";

/// Canonical acknowledgment for a choice; anything outside the vocabulary
/// maps to the internal-error text rather than failing.
pub fn acknowledgment_text(choice: &str) -> &'static str {
    match UserChoice::parse(choice) {
        Some(UserChoice::Yes) => YES_ACK,
        Some(UserChoice::No) => NO_ACK,
        Some(UserChoice::WrongUser) => WRONG_USER_ACK,
        Some(UserChoice::NotSure) => NOT_SURE_ACK,
        None => INTERNAL_ERROR_ACK,
    }
}

/// Merges the acknowledgment into `message` and marks it as a full
/// replacement of the original.
///
/// If a response block already exists (the user changed their mind) the new
/// text is prefixed accordingly and the block is replaced at the same
/// ordinal position; otherwise one is appended.
pub fn apply_acknowledgment(message: &mut Value, choice: &str) {
    if !message.is_object() {
        *message = json!({});
    }

    let mut text = acknowledgment_text(choice).to_string();
    if has_response_block(message) {
        text = format!("{CHANGED_MIND_PREFIX}{text}");
    }
    let response_block = json!({
        "block_id": RESPONSE_BLOCK_ID,
        "type": "section",
        "text": { "type": "mrkdwn", "text": text },
    });

    if let Some(fields) = message.as_object_mut() {
        let blocks = fields
            .entry("blocks")
            .or_insert_with(|| Value::Array(Vec::new()));
        if !blocks.is_array() {
            *blocks = Value::Array(Vec::new());
        }
        if let Some(items) = blocks.as_array_mut() {
            if let Some(slot) = items.iter_mut().find(|block| is_response_block(block)) {
                *slot = response_block;
            } else {
                items.push(response_block);
            }
        }
        fields.insert("replace_original".to_string(), Value::Bool(true));
    }
}

fn has_response_block(message: &Value) -> bool {
    message
        .get("blocks")
        .and_then(Value::as_array)
        .map(|blocks| blocks.iter().any(is_response_block))
        .unwrap_or(false)
}

fn is_response_block(block: &Value) -> bool {
    block.get("block_id").and_then(Value::as_str) == Some(RESPONSE_BLOCK_ID)
}
