use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use outagewatch_db::store::PgIncidentStore;
use outagewatch_events::{AuditLogger, AuditPersistence, EventBus};
use outagewatch_lifecycle::LifecycleEngine;
use outagewatch_worker::config::WorkerConfig;
use outagewatch_worker::{init_tracing, sweep_loop};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = WorkerConfig::from_env()?;

    // --- Tracing ---
    init_tracing(config.log_format);
    tracing::info!(
        sweep_interval_secs = config.sweep_interval.as_secs(),
        archive_grace_minutes = config.lifecycle.archive_grace.num_minutes(),
        "Loaded worker configuration"
    );

    // --- Database ---
    let pool = outagewatch_db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    outagewatch_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    outagewatch_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Event bus ---
    let audit_cancel = CancellationToken::new();
    let event_bus = Arc::new(EventBus::default());
    let logger_handle = tokio::spawn(AuditLogger::run(event_bus.subscribe(), audit_cancel.clone()));
    let persistence_handle = tokio::spawn(AuditPersistence::run(
        pool.clone(),
        event_bus.subscribe(),
        audit_cancel.clone(),
    ));
    tracing::info!("Audit services started (logger, persistence)");

    // --- Sweep loop ---
    let engine = LifecycleEngine::new(
        Arc::new(PgIncidentStore::new(pool)),
        Arc::clone(&event_bus),
        config.lifecycle,
    );
    let sweep_cancel = CancellationToken::new();
    let mut sweep_handle = tokio::spawn(sweep_loop::run(
        engine,
        config.sweep_interval,
        sweep_cancel.clone(),
    ));

    let sweep_died = tokio::select! {
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, stopping worker");
            false
        }
        joined = &mut sweep_handle => {
            match joined {
                Ok(sweeps) => tracing::error!(sweeps, "Sweep loop exited unexpectedly"),
                Err(e) => tracing::error!(error = %e, "Sweep loop task failed"),
            }
            true
        }
    };

    if !sweep_died {
        // Stop sweeping first so its last events still reach the audit tasks.
        sweep_cancel.cancel();
        let _ = tokio::time::timeout(Duration::from_secs(10), sweep_handle).await;
        tracing::info!("Sweep loop stopped");
    }

    // Dropping the last sender closes the bus; the audit tasks drain and exit.
    drop(event_bus);
    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = persistence_handle.await;
        let _ = logger_handle.await;
    })
    .await;
    if drained.is_err() {
        tracing::warn!("Audit services did not drain in time, cancelling");
        audit_cancel.cancel();
    }

    if sweep_died {
        anyhow::bail!("sweep loop stopped before shutdown");
    }
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
