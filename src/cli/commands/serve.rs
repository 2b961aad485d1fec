//! HTTP API server.

use super::open_store;
use crate::agent::Agent;
use crate::api::{router, AppState};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let store = open_store(&settings)?;
    let agent = Agent::from_settings(&settings, store, None)?;

    let state = Arc::new(AppState {
        agent,
        max_query_chars: settings.server.max_query_chars,
    });
    let app = router(state);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("Campus Concierge API");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Chat", "POST /chat");
    Output::kv("Health", "GET  /health");
    Output::kv("Info", "GET  /");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
