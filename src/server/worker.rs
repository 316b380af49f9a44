// src/server/worker.rs

//! The worker loop: feeds inbound envelopes to the dispatcher one at a time.

use crate::core::protocol::{InboundEnvelope, Outbound};
use crate::core::{Application, Dispatcher, RuntimeError};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info};

/// Consumes `inbound` until it closes, a shutdown signal arrives, or the
/// dispatcher reports a fatal error.
///
/// Each envelope is fully processed, and its outbound messages queued, before
/// the next one is read. The dispatcher is returned so callers can inspect
/// whatever is still pending.
pub async fn run<A: Application>(
    mut dispatcher: Dispatcher<A>,
    mut inbound: mpsc::Receiver<InboundEnvelope>,
    outbound: mpsc::Sender<Outbound<A::Effect>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<Dispatcher<A>, RuntimeError> {
    info!("Worker loop started.");
    loop {
        tokio::select! {
            // Prioritize shutdown signals over new envelopes.
            biased;
            _ = shutdown_rx.recv() => {
                info!("Worker received shutdown signal.");
                break;
            }
            envelope = inbound.recv() => {
                let Some(envelope) = envelope else {
                    debug!("Inbound channel closed.");
                    break;
                };
                let messages = match dispatcher.step(envelope) {
                    Ok(messages) => messages,
                    Err(e) => {
                        error!("Worker stopping after fatal error: {}", e);
                        return Err(e);
                    }
                };
                for message in messages {
                    outbound
                        .send(message)
                        .await
                        .map_err(|_| RuntimeError::ChannelClosed)?;
                }
            }
        }
    }

    let pending = dispatcher.pool().len();
    if pending > 0 {
        info!("Worker stopped with {} connection(s) still pending.", pending);
    } else {
        info!("Worker stopped.");
    }
    Ok(dispatcher)
}
