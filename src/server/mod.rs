// src/server/mod.rs

//! Worker process wiring: the host bridge, the worker loop, and signal handling.

use crate::config::Config;
use crate::core::{Application, Dispatcher};
use anyhow::{Result, anyhow};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

pub mod stdio;
pub mod worker;

/// Runs `app` against the host on stdin/stdout until the host closes its end,
/// a signal arrives, or a task fails.
pub async fn run<A: Application>(config: Config, app: A) -> Result<()> {
    let dispatcher = Dispatcher::new(app, &config.app);

    let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity);
    let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_capacity);
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let mut tasks: JoinSet<Result<()>> = JoinSet::new();
    tasks.spawn(stdio::read_envelopes(tokio::io::stdin(), inbound_tx));
    tasks.spawn(stdio::write_outbound(tokio::io::stdout(), outbound_rx));

    let worker_shutdown_rx = shutdown_tx.subscribe();
    tasks.spawn(async move {
        worker::run(dispatcher, inbound_rx, outbound_tx, worker_shutdown_rx)
            .await
            .map(|_| ())
            .map_err(anyhow::Error::from)
    });

    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow!("Failed to register SIGINT handler: {}", e))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow!("Failed to register SIGTERM handler: {}", e))?;

    info!("Switchyard worker ready.");
    let mut failure = None;
    loop {
        tokio::select! {
            biased;

            _ = sigint.recv() => {
                info!("SIGINT received, initiating graceful shutdown.");
                break;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, initiating graceful shutdown.");
                break;
            }

            res = tasks.join_next() => {
                match res {
                    // Every task has finished: the host closed its end and the
                    // worker drained.
                    None => break,
                    Some(Ok(Ok(()))) => {}
                    Some(Ok(Err(e))) => {
                        error!("CRITICAL: Worker task failed: {}. Shutting down.", e);
                        failure = Some(e);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("CRITICAL: Worker task panicked: {e:?}. Shutting down.");
                        failure = Some(anyhow!("worker task panicked: {e}"));
                        break;
                    }
                }
            }
        }
    }

    if shutdown_tx.send(()).is_err() {
        debug!("Worker loop had already stopped before shutdown was signalled.");
    }
    tasks.shutdown().await;
    info!("Switchyard worker stopped.");

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
