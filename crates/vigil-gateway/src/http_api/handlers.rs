//! Request handlers for the gateway surface.
//!
//! Internal failure detail never crosses the HTTP boundary: handlers log
//! the root cause server-side and answer with the surface's fixed bodies.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, Form, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use vigil_slack::{oauth_authorize_url, RelayError};

use super::endpoints::{
    ACKNOWLEDGED_BODY, ERROR_DEMO_BODY, INTERNAL_ERROR_BODY, NOT_FOUND_BODY,
    PAYLOAD_FIELD, PROVISION_FAILURE_BODY, PROVISION_SUCCESS_BODY, REDIRECTING_BODY, TEST_BODY,
};
use crate::pipeline::{handle_interaction_payload, RelayState};

fn respond_html(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CONTENT_TYPE, "text/html")], body).into_response()
}

pub(super) async fn handle_test() -> Response {
    respond_html(StatusCode::OK, TEST_BODY)
}

pub(super) async fn handle_error_demo() -> Response {
    respond_html(StatusCode::BAD_REQUEST, ERROR_DEMO_BODY)
}

pub(super) async fn handle_not_found() -> Response {
    respond_html(StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

pub(super) async fn handle_options_load() -> Response {
    respond_html(StatusCode::OK, ACKNOWLEDGED_BODY)
}

pub(super) async fn handle_authorize(State(state): State<Arc<RelayState>>) -> Response {
    let location = oauth_authorize_url(
        &state.config.slack_client_id,
        &state.config.oauth_redirect_uri(),
    );
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, location),
            (header::CACHE_CONTROL, "max-age=0".to_string()),
            (header::CONTENT_TYPE, "text/html".to_string()),
        ],
        REDIRECTING_BODY,
    )
        .into_response()
}

pub(super) async fn handle_redirect_uri(
    State(state): State<Arc<RelayState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(error) = params.get("error").filter(|value| !value.is_empty()) {
        tracing::error!(%error, "redirect_uri carried an authorization error");
        return respond_html(StatusCode::BAD_REQUEST, PROVISION_FAILURE_BODY);
    }
    let Some(code) = params.get("code").filter(|value| !value.is_empty()) else {
        tracing::error!("redirect_uri called without a code parameter");
        return respond_html(StatusCode::BAD_REQUEST, PROVISION_FAILURE_BODY);
    };

    match provision_token(&state, code).await {
        Ok(()) => respond_html(StatusCode::OK, PROVISION_SUCCESS_BODY),
        Err(error) => {
            tracing::error!(error = %format!("{error:#}"), "failed to provision oauth token");
            respond_html(StatusCode::BAD_REQUEST, PROVISION_FAILURE_BODY)
        }
    }
}

async fn provision_token(state: &RelayState, code: &str) -> anyhow::Result<()> {
    let token = state
        .slack
        .exchange_oauth_code(
            code,
            &state.config.slack_client_id,
            &state.config.slack_client_secret,
        )
        .await?;
    state
        .credentials
        .put(&state.config.slack_client_id, &token)?;
    state.tokens.invalidate(&state.config.slack_client_id).await;
    tracing::info!("oauth access token provisioned and stored");
    Ok(())
}

/// Interactive callback: every `payload` field is processed independently
/// and the platform always gets a prompt 200 back, whatever the per-payload
/// outcome.
pub(super) async fn handle_interactive(
    State(state): State<Arc<RelayState>>,
    body: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Response {
    let Form(fields) = match body {
        Ok(form) => form,
        Err(rejection) => {
            tracing::error!(error = %rejection, "failed to read interactive endpoint body");
            return respond_html(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY);
        }
    };

    for (name, raw) in fields {
        if name != PAYLOAD_FIELD {
            continue;
        }
        if let Err(error) = handle_interaction_payload(&state, &raw).await {
            match &error {
                RelayError::UnsupportedInteraction(payload) => {
                    tracing::error!(%payload, "interaction kind is not handled yet");
                }
                RelayError::PayloadDecode(_) => {
                    tracing::error!(%error, "decision payload drifted out of sync with the composer");
                }
                _ => {
                    tracing::error!(%error, "interaction processing failed");
                }
            }
        }
    }
    respond_html(StatusCode::OK, ACKNOWLEDGED_BODY)
}
