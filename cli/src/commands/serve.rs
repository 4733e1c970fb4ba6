// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use arena_core::infrastructure::{bootstrap, config::ArenaConfig};
use arena_core::presentation::api;

/// Run the arena HTTP service until interrupted.
pub async fn run(config_path: Option<&Path>, listen: Option<String>) -> Result<()> {
    let config = ArenaConfig::load(config_path)?;
    let listen = listen.unwrap_or_else(|| config.listen.clone());

    let service = Arc::new(bootstrap(&config).context("failed to wire arena services")?);
    let router = api::app(service);

    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    info!(address = %listen, "arena service listening");

    // ConnectInfo feeds the per-round client address recorded by the store.
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("arena service terminated")
}
