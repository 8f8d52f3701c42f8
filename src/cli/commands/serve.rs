use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use serde_json::json;
use tracing::{info, warn};

use crate::config;
use crate::database::{MemoryRecordStore, Table};
use crate::state::AppState;

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, help = "Keep all rows in process memory instead of Postgres")]
    pub memory: bool,

    #[arg(long, help = "Port to listen on (overrides FULCRUM_API_PORT)")]
    pub port: Option<u16>,
}

/// Role rows the migration seeds, mirrored for the memory store.
fn seeded_groups() -> Vec<serde_json::Value> {
    vec![
        json!({"id": 1, "role": "channelAdmin", "description": "Channel administrator"}),
        json!({"id": 2, "role": "channelUser", "description": "Channel user"}),
        json!({"id": 3, "role": "officeAdmin", "description": "Office administrator"}),
        json!({"id": 4, "role": "admin", "description": "System administrator"}),
    ]
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = config::config().clone();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let state = if args.memory {
        warn!("Serving from the in-memory store, nothing will be persisted");
        let store = MemoryRecordStore::new();
        store.seed(Table::AuthGroup, seeded_groups()).await;
        AppState::with_store(config, Arc::new(store))?
    } else {
        AppState::connect(config).await?
    };

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Fulcrum API listening on http://{}", bind_addr);

    axum::serve(listener, crate::routes::app(state)).await.context("server")?;
    Ok(())
}
