use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::handler::{CommandHandler, StatusBody};

#[derive(Debug, Serialize)]
struct HealthBody {
    healthy: bool,
}

pub fn router(handler: Arc<CommandHandler>, webhook_path: &str) -> Router {
    Router::new()
        .route(webhook_path, post(receive_update))
        .route("/health", get(health))
        .with_state(handler)
}

/// Read the body as raw bytes so that malformed JSON still gets a 200
/// acknowledgment instead of an extractor rejection.
async fn receive_update(
    State(handler): State<Arc<CommandHandler>>,
    body: Bytes,
) -> Json<StatusBody> {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Webhook body is not valid JSON: {}", e);
            Value::Null
        }
    };

    Json(handler.handle(&payload).await.into())
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { healthy: true })
}

pub async fn serve(handler: Arc<CommandHandler>, listen: &str, webhook_path: &str) -> Result<()> {
    let app = router(handler, webhook_path);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind to {listen}"))?;

    info!("Listening for webhook updates on http://{}{}", listen, webhook_path);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}
