//! Entry point for the vigil triage relay binary.

mod cli_args;

use anyhow::Result;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli_args::{Cli, Command};
use vigil_gateway::{run_http_server, send_alert, RelayState};
use vigil_slack::AlertRequest;

fn init_tracing(log_level: &str) {
    let default_level = log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    let config = cli.relay_config();

    match cli.command {
        Command::Serve { ref bind } => {
            let state = RelayState::from_config(config)?;
            run_http_server(bind, state).await
        }
        Command::SendAlert {
            ref identifier,
            ref alert,
            ref summary,
            ref user,
            ref identity_confidence,
        } => {
            let state = RelayState::from_config(config)?;
            let request = AlertRequest {
                identifier: identifier.clone(),
                alert: alert.clone(),
                summary: summary.clone(),
                email: user.clone(),
                identity_confidence: Cli::parse_confidence(identity_confidence),
            };
            match send_alert(&state, &request).await {
                Ok(posted) => {
                    println!("{}", serde_json::to_string_pretty(&posted)?);
                    Ok(())
                }
                Err(error) => {
                    // Domain failures surface as the error's string form,
                    // not a stack trace.
                    println!("{error}");
                    std::process::exit(1);
                }
            }
        }
        Command::DiscoverQueueUrl => {
            println!("{}", config.queue_url);
            Ok(())
        }
    }
}
