//! Line-delimited JSON front end for the coordinator.
//!
//! Each input line is one request; each output line is the matching
//! result, written in the order requests were read.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use waygrid_core::{PathResult, WorldPoint};

use crate::coordinator::{PathCoordinator, PathTicket, RequestId};

#[derive(Debug, Clone, Deserialize)]
pub struct WireRequest {
    /// Caller's own correlation id, echoed back untouched
    #[serde(default)]
    pub id: Option<String>,
    pub start: WorldPoint,
    pub goal: WorldPoint,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub request_id: RequestId,
    #[serde(flatten)]
    pub result: PathResult,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeSummary {
    pub accepted: usize,
    pub skipped: usize,
    pub written: usize,
}

/// Pump requests from `input` through `coordinator` until EOF.
///
/// Malformed lines are logged and skipped; they produce no output.
pub async fn serve<R, W>(coordinator: &PathCoordinator, input: R, mut output: W) -> Result<ServeSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (pending_tx, mut pending_rx) = mpsc::unbounded_channel::<(Option<String>, PathTicket)>();

    let reader = async move {
        let mut lines = input.lines();
        let (mut accepted, mut skipped) = (0usize, 0usize);
        let mut line_number = 0usize;

        while let Some(line) = lines.next_line().await.context("failed to read request stream")? {
            line_number += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<WireRequest>(line) {
                Ok(request) => {
                    let ticket = coordinator.request(request.start, request.goal)?;
                    pending_tx
                        .send((request.id, ticket))
                        .map_err(|_| anyhow!("response writer stopped"))?;
                    accepted += 1;
                }
                Err(err) => {
                    tracing::warn!(line = line_number, error = %err, "Skipping malformed request");
                    skipped += 1;
                }
            }
        }
        Ok::<_, anyhow::Error>((accepted, skipped))
    };

    let writer = async {
        let mut written = 0usize;
        while let Some((id, ticket)) = pending_rx.recv().await {
            let request_id = ticket.id();
            let result = ticket.await?;
            let response = WireResponse { id, request_id, result };
            let mut line = serde_json::to_vec(&response)?;
            line.push(b'\n');
            output
                .write_all(&line)
                .await
                .context("failed to write response")?;
            output.flush().await?;
            written += 1;
        }
        Ok::<_, anyhow::Error>(written)
    };

    let ((accepted, skipped), written) = tokio::try_join!(reader, writer)?;
    Ok(ServeSummary {
        accepted,
        skipped,
        written,
    })
}
