//! End-to-end relay flows: alert delivery and the interaction round trip,
//! driven over a real gateway with a mocked Slack API.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use httpmock::prelude::*;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use vigil_core::{ConfidenceLevel, RelayConfig};
use vigil_gateway::{build_router, send_alert, RelayState};
use vigil_slack::{compose_alert_message, AlertRequest, Block, RecipientIdentity};
use vigil_store::{
    CredentialStore, EventQueue, FileCredentialStore, JsonlEventQueue, QueueError,
};

fn relay_config(root: &Path, api_base: &str) -> RelayConfig {
    RelayConfig {
        domain_name: "example.com".to_string(),
        slack_client_id: "CID".to_string(),
        slack_client_secret: "shhh".to_string(),
        queue_url: root.join("outcomes.jsonl").display().to_string(),
        slack_api_base: api_base.to_string(),
        state_dir: root.to_path_buf(),
        open_im_channel: false,
        request_timeout_ms: 2_000,
        publish_timeout_ms: 1_000,
        token_parameter_prefix: "vigil/SlackOAuthToken".to_string(),
    }
}

fn seeded_credentials(root: &Path) -> Arc<FileCredentialStore> {
    let store = FileCredentialStore::with_key(
        root.join("credentials.json"),
        "vigil/SlackOAuthToken",
        [3_u8; 32],
    )
    .expect("credential store");
    store.put("CID", "xoxb-seeded").expect("seed token");
    Arc::new(store)
}

fn relay_state(root: &Path, api_base: &str) -> Arc<RelayState> {
    let queue = Arc::new(JsonlEventQueue::open(root.join("outcomes.jsonl")).expect("queue"));
    RelayState::with_stores(relay_config(root, api_base), seeded_credentials(root), queue)
        .expect("relay state")
}

async fn spawn_gateway(state: Arc<RelayState>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("listener addr");
    let app = build_router(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    addr
}

fn sample_alert(confidence: ConfidenceLevel) -> AlertRequest {
    AlertRequest {
        identifier: "alert-7731".to_string(),
        alert: "duo_bypass_generated".to_string(),
        summary: "A Duo bypass code was generated for your account".to_string(),
        email: "jdoe@example.com".to_string(),
        identity_confidence: confidence,
    }
}

/// Pulls a real composed button value out of the composer so the inbound
/// payload in these tests is exactly what an outbound message carried.
fn composed_button_value(confidence: ConfidenceLevel, action_suffix: &str) -> String {
    let identity = RecipientIdentity {
        platform_user_id: "U024BE7LH".to_string(),
        display_name: "jdoe".to_string(),
    };
    let message = compose_alert_message(&sample_alert(confidence), &identity).expect("compose");
    let Block::Actions { elements, .. } = &message.blocks[1] else {
        panic!("second block should hold the actions");
    };
    elements
        .iter()
        .find(|element| element.action_id.ends_with(action_suffix))
        .unwrap_or_else(|| panic!("no {action_suffix} action"))
        .value
        .clone()
}

fn interaction_payload(value: &str, response_url: &str, message: Value) -> String {
    json!({
        "type": "block_actions",
        "user": { "id": "U024BE7LH", "name": "jdoe" },
        "response_url": response_url,
        "actions": [{ "action_id": "vigil-triage-click", "value": value }],
        "message": message,
    })
    .to_string()
}

#[tokio::test]
async fn integration_alert_delivery_posts_interactive_message() {
    let temp = tempfile::tempdir().expect("tempdir");
    let slack = MockServer::start();
    let lookup = slack.mock(|when, then| {
        when.method(POST)
            .path("/users.lookupByEmail")
            .header("authorization", "Bearer xoxb-seeded")
            .body_includes("email=jdoe%40example.com");
        then.status(200).json_body(json!({
            "ok": true,
            "user": { "id": "U024BE7LH", "name": "jdoe" }
        }));
    });
    let post = slack.mock(|when, then| {
        when.method(POST)
            .path("/chat.postMessage")
            .header("authorization", "Bearer xoxb-seeded")
            .body_includes("\"channel\":\"U024BE7LH\"")
            .body_includes("vigil-triage-wronguser")
            .body_includes("Was this action taken by you (jdoe@example.com)?");
        then.status(200)
            .json_body(json!({ "ok": true, "channel": "D0AB1CD", "ts": "167.002" }));
    });

    let state = relay_state(temp.path(), &slack.base_url());
    let posted = send_alert(&state, &sample_alert(ConfidenceLevel::Moderate))
        .await
        .expect("send alert");
    assert_eq!(posted.channel, "D0AB1CD");
    assert_eq!(posted.ts, "167.002");
    assert_eq!(lookup.calls(), 1);
    assert_eq!(post.calls(), 1);
}

#[tokio::test]
async fn integration_button_click_round_trip_updates_message_and_queues_outcome() {
    let temp = tempfile::tempdir().expect("tempdir");
    let slack = MockServer::start();
    let callback = slack.mock(|when, then| {
        when.method(POST)
            .path("/response/T1/abc")
            .body_includes("\"replace_original\":true")
            .body_includes("vigil-triage-response")
            .body_includes("Got it, thank you.");
        then.status(200).body("ok");
    });

    let state = relay_state(temp.path(), &slack.base_url());
    let addr = spawn_gateway(Arc::clone(&state)).await;

    let value = composed_button_value(ConfidenceLevel::Moderate, "-no");
    let echoed_message = json!({
        "text": "A Duo bypass code was generated for your account",
        "blocks": [
            { "block_id": "vigil-triage-question", "type": "section" },
            { "block_id": "vigil-triage-answer", "type": "actions" }
        ],
        "bot_id": "B01"
    });
    let payload = interaction_payload(&value, &slack.url("/response/T1/abc"), echoed_message);

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/slack/interactive-endpoint"))
        .form(&[("payload", payload.as_str())])
        .send()
        .await
        .expect("post interaction");
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.expect("body"), "Acknowledged");
    assert_eq!(callback.calls(), 1);

    let queue_contents =
        std::fs::read_to_string(temp.path().join("outcomes.jsonl")).expect("queue file");
    let record: Value = serde_json::from_str(queue_contents.lines().last().expect("one record"))
        .expect("record json");
    assert_eq!(
        record,
        json!({
            "identifier": "alert-7731",
            "user": {
                "email": "jdoe@example.com",
                "slack": "U024BE7LH",
                "name": "jdoe",
            },
            "identityConfidence": "moderate",
            "response": "no",
        })
    );
}

#[tokio::test]
async fn integration_changed_mind_replaces_response_block_with_prefix() {
    let temp = tempfile::tempdir().expect("tempdir");
    let slack = MockServer::start();
    let callback = slack.mock(|when, then| {
        when.method(POST)
            .path("/response/T1/second")
            .body_includes("You've changed your mind, no problem. ")
            .body_includes("Understood, thanks for letting us know.");
        then.status(200).body("ok");
    });

    let state = relay_state(temp.path(), &slack.base_url());
    let addr = spawn_gateway(Arc::clone(&state)).await;

    // The echoed message already carries a response block from the first
    // answer, as Slack would echo it on a second click.
    let value = composed_button_value(ConfidenceLevel::High, "-yes");
    let echoed_message = json!({
        "text": "A Duo bypass code was generated for your account",
        "blocks": [
            { "block_id": "vigil-triage-question", "type": "section" },
            { "block_id": "vigil-triage-response", "type": "section",
              "text": { "type": "mrkdwn", "text": "first answer" } },
            { "block_id": "vigil-triage-answer", "type": "actions" }
        ]
    });
    let payload = interaction_payload(&value, &slack.url("/response/T1/second"), echoed_message);

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/slack/interactive-endpoint"))
        .form(&[("payload", payload.as_str())])
        .send()
        .await
        .expect("post interaction");
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(callback.calls(), 1);
}

#[tokio::test]
async fn integration_queue_failure_does_not_block_acknowledgment() {
    struct BrokenQueue;

    #[async_trait]
    impl EventQueue for BrokenQueue {
        async fn publish(&self, _record: &Value) -> Result<String, QueueError> {
            Err(QueueError::Publish("downstream unavailable".to_string()))
        }
    }

    let temp = tempfile::tempdir().expect("tempdir");
    let slack = MockServer::start();
    let callback = slack.mock(|when, then| {
        when.method(POST)
            .path("/response/T1/abc")
            .body_includes("\"replace_original\":true");
        then.status(200).body("ok");
    });

    let state = RelayState::with_stores(
        relay_config(temp.path(), &slack.base_url()),
        seeded_credentials(temp.path()),
        Arc::new(BrokenQueue),
    )
    .expect("relay state");
    let addr = spawn_gateway(Arc::clone(&state)).await;

    let value = composed_button_value(ConfidenceLevel::High, "-yes");
    let payload = interaction_payload(
        &value,
        &slack.url("/response/T1/abc"),
        json!({ "text": "summary", "blocks": [] }),
    );
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/slack/interactive-endpoint"))
        .form(&[("payload", payload.as_str())])
        .send()
        .await
        .expect("post interaction");
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        callback.calls(),
        1,
        "acknowledgment must publish even when forwarding fails"
    );
}

#[tokio::test]
async fn integration_multiple_payload_fields_are_each_processed() {
    let temp = tempfile::tempdir().expect("tempdir");
    let slack = MockServer::start();
    let callback = slack.mock(|when, then| {
        when.method(POST).path("/response/T1/abc");
        then.status(200).body("ok");
    });

    let state = relay_state(temp.path(), &slack.base_url());
    let addr = spawn_gateway(Arc::clone(&state)).await;

    let first = interaction_payload(
        &composed_button_value(ConfidenceLevel::High, "-yes"),
        &slack.url("/response/T1/abc"),
        json!({ "text": "summary", "blocks": [] }),
    );
    let second = interaction_payload(
        &composed_button_value(ConfidenceLevel::High, "-notsure"),
        &slack.url("/response/T1/abc"),
        json!({ "text": "summary", "blocks": [] }),
    );
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/slack/interactive-endpoint"))
        .form(&[("payload", first.as_str()), ("payload", second.as_str())])
        .send()
        .await
        .expect("post interactions");
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(callback.calls(), 2);

    let queue_contents =
        std::fs::read_to_string(temp.path().join("outcomes.jsonl")).expect("queue file");
    assert_eq!(queue_contents.lines().count(), 2);
}
