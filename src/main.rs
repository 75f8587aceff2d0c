// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reschedule_hook::config::Config;
use reschedule_hook::server;
use reschedule_hook::tracking::TrackingRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting reschedule hook");

    let registry = TrackingRegistry::builtin();
    let config = Config::from_env(&registry)?;
    config.log_summary();

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    server::serve(config, client).await
}
