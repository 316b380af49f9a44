// src/server/stdio.rs

//! The host bridge: newline-delimited JSON envelopes over a pair of byte
//! streams (stdin/stdout in production, in-memory pipes in tests).

use crate::core::protocol::{InboundEnvelope, Outbound};
use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, warn};

/// Reads envelopes from `reader` and queues them for the worker.
///
/// Lines that are not valid envelopes are logged and skipped. Returns when the
/// reader hits EOF or the worker is gone.
pub async fn read_envelopes<R>(reader: R, tx: mpsc::Sender<InboundEnvelope>) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut lines = FramedRead::new(reader, LinesCodec::new());
    while let Some(line) = lines.next().await {
        let line = line.context("Failed to read an envelope line from the host")?;
        if line.trim().is_empty() {
            continue;
        }
        let envelope: InboundEnvelope = match serde_json::from_str(&line) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Skipping malformed envelope from host: {}", e);
                continue;
            }
        };
        if tx.send(envelope).await.is_err() {
            debug!("Worker is gone; stopping host reader.");
            break;
        }
    }
    debug!("Host reader finished.");
    Ok(())
}

/// Writes every outbound message to `writer` as one JSON line.
pub async fn write_outbound<W, E>(writer: W, mut rx: mpsc::Receiver<Outbound<E>>) -> Result<()>
where
    W: AsyncWrite + Unpin,
    E: Serialize,
{
    let mut sink = FramedWrite::new(writer, LinesCodec::new());
    while let Some(message) = rx.recv().await {
        let line =
            serde_json::to_string(&message).context("Failed to serialize an outbound message")?;
        sink.send(line)
            .await
            .context("Failed to write an outbound message to the host")?;
    }
    debug!("Host writer finished.");
    Ok(())
}
