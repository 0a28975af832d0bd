// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol for the message bus: a length-prefixed JSON envelope
//! exchanged over the Unix socket at `<root>/bus.sock`.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

use std::time::Duration;

use loom_core::{AgentId, Message, MessageId, WorkflowId, WorkflowRuntimeState};
use loom_engine::{DispatchOutcome, Outcome};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum accepted message size: generous headroom over the largest
/// plausible workflow-status payload.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Default timeout for one request/response round trip, distinct from
/// the longer [`crate::bus::DEFAULT_INBOX_TIMEOUT`] used for `Inbox`
/// long-polling.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message of {size} bytes exceeds the {max} byte limit")]
    MessageTooLarge { size: usize, max: usize },
    #[error("connection closed")]
    ConnectionClosed,
    #[error("timed out waiting for a response")]
    Timeout,
}

/// Request from a client (CLI, agent tool shim) to the daemon. Covers the
/// message bus endpoints plus the `loom` CLI's lifecycle verbs — `start`,
/// `pause`, `resume`, `override`, and `dispatch` all need a running
/// daemon's locks and pane supervisor, so they ride the same socket
/// rather than touching the store directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// `GET /status`
    Status,
    /// `GET /workflow/<id>`
    GetWorkflow { workflow_id: WorkflowId },
    /// `POST /evidence/<id>`
    SubmitEvidence {
        workflow_id: WorkflowId,
        submission: loom_engine::Submission,
    },
    /// `POST /heartbeat/<agent>`
    Heartbeat { agent_id: AgentId },
    /// `POST /messages`
    SendMessage {
        from: String,
        to: String,
        #[serde(rename = "type")]
        message_type: String,
        payload: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workflow_id: Option<String>,
    },
    /// `GET /inbox/<agent>`, long-polling up to `timeout_ms` (default
    /// ~10s, see [`crate::bus::DEFAULT_INBOX_TIMEOUT`]).
    Inbox {
        agent_id: AgentId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    /// `POST /ack`
    Ack { message_id: MessageId },
    /// `loom start <type> [--param k=v]...`
    Start {
        workflow_type: String,
        #[serde(default)]
        params: serde_json::Value,
    },
    /// `loom pause <id>`
    Pause { workflow_id: WorkflowId },
    /// `loom resume <id>`
    Resume { workflow_id: WorkflowId },
    /// `loom override <id> <next-state> [--reason ...]`
    Override {
        workflow_id: WorkflowId,
        next_state: String,
        reason: String,
    },
    /// `loom dispatch <id>`
    Dispatch { workflow_id: WorkflowId },
}

/// Response from the daemon. Tagged by `type`; the `SubmitEvidence` and
/// `unknownWorkflow` shapes flatten their inner fields so a client that
/// only cares about the documented response body can ignore the envelope
/// tag entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Status {
        workflows: Vec<WorkflowRuntimeState>,
    },
    Workflow {
        #[serde(flatten)]
        state: WorkflowRuntimeState,
    },
    UnknownWorkflow {
        error: String,
    },
    Evidence {
        #[serde(flatten)]
        outcome: Outcome,
    },
    HeartbeatAck {
        ok: bool,
        #[serde(rename = "agentId")]
        agent_id: AgentId,
        at: chrono::DateTime<chrono::Utc>,
    },
    MessageAccepted {
        id: MessageId,
    },
    Messages {
        messages: Vec<Message>,
    },
    Ack {
        ok: bool,
    },
    /// Response to `Start`: the freshly created instance, not yet
    /// dispatched (`loom start` leaves dispatching to autopilot or a
    /// follow-up `loom dispatch`).
    Started {
        state: WorkflowRuntimeState,
    },
    /// Response to `Pause`, `Resume`, and `Override`.
    Lifecycle {
        #[serde(flatten)]
        outcome: Outcome,
    },
    /// Response to `Dispatch`.
    Dispatched {
        #[serde(flatten)]
        outcome: DispatchOutcome,
    },
    Error {
        error: String,
    },
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read one length-prefixed message: a 4-byte big-endian length followed
/// by that many bytes of JSON. An EOF on the length prefix itself means
/// the peer closed the connection cleanly between messages.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }
    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => ProtocolError::ConnectionClosed,
            _ => ProtocolError::Io(e),
        })?;
    Ok(buf)
}

pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), ProtocolError> {
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    let len = (payload.len() as u32).to_be_bytes();
    writer.write_all(&len).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_request<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Request, ProtocolError> {
    let bytes = tokio::time::timeout(DEFAULT_TIMEOUT, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
) -> Result<(), ProtocolError> {
    let bytes = encode(response)?;
    tokio::time::timeout(DEFAULT_TIMEOUT, write_message(writer, &bytes))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
