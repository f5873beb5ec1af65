// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Long-running sync engine.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio_util::sync::CancellationToken;

use super::{Context, Engine};
use crate::error::Result;
use crate::sync::spawn_probe;

pub async fn run(ctx: &Context) -> Result<()> {
    let engine = Engine::build(ctx, true)?;
    let shutdown = install_signal_handler();
    serve(ctx, &engine, shutdown).await
}

/// Runs the probe, coordinator and processor until `shutdown` fires.
pub async fn serve(ctx: &Context, engine: &Engine, shutdown: CancellationToken) -> Result<()> {
    let config = &ctx.config;
    tracing::info!(
        "fieldsync starting (server {}, data dir {})",
        config.server.base_url,
        ctx.data_dir.display()
    );

    let probe_cancel = shutdown.child_token();
    let probe = spawn_probe(
        engine.client.clone(),
        engine.network.clone(),
        config.server.health_path.clone(),
        config.network.connection_type,
        config.probe_interval(),
        probe_cancel.clone(),
    );

    // Items left over from a previous run are drained after the first
    // connected pass.
    if let Some(outcome) = engine.coordinator.start().await {
        tracing::debug!("initial pass: {:?}", outcome);
    }

    shutdown.cancelled().await;

    tracing::info!("shutting down");
    engine.coordinator.stop();
    engine.processor.pause();
    engine.processor.shutdown();
    probe_cancel.cancel();
    if let Err(e) = probe.await {
        tracing::warn!("connectivity probe ended abnormally: {}", e);
    }
    Ok(())
}

/// Cancels the returned token on the first Ctrl-C or SIGTERM; a second
/// signal exits.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let count = Arc::new(AtomicU32::new(0));

    let handler_token = token.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!("failed to register SIGTERM handler: {}", e);
                None
            }
        };

        loop {
            #[cfg(unix)]
            let received = tokio::select! {
                r = tokio::signal::ctrl_c() => r,
                _ = terminated(&mut sigterm) => Ok(()),
            };
            #[cfg(not(unix))]
            let received = tokio::signal::ctrl_c().await;

            if let Err(e) = received {
                tracing::error!("failed to listen for Ctrl-C: {}", e);
                return;
            }
            if count.fetch_add(1, Ordering::SeqCst) == 0 {
                tracing::info!("received shutdown signal, finishing in-flight uploads");
                handler_token.cancel();
            } else {
                tracing::warn!("forced exit");
                std::process::exit(130);
            }
        }
    });

    token
}

#[cfg(unix)]
async fn terminated(sigterm: &mut Option<Signal>) {
    if let Some(s) = sigterm {
        if s.recv().await.is_some() {
            return;
        }
        *sigterm = None;
    }
    std::future::pending::<()>().await
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
