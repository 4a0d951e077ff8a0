//! Gateway for the triage relay: the axum HTTP surface and the pipeline
//! wiring that connects the Slack client, credential store, and queue.

pub mod http_api;
pub mod pipeline;

pub use http_api::{build_router, run_http_server};
pub use pipeline::{handle_interaction_payload, outcome_record, send_alert, RelayState};
