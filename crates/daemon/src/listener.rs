// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accept loop and request dispatch for the bus's Unix socket.

use std::sync::Arc;

use loom_core::WorkflowId;
use loom_engine::WorkflowEngine;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

use crate::bus::{MessageBus, DEFAULT_INBOX_TIMEOUT};
use crate::protocol::{self, ProtocolError, Request, Response};

/// Shared context every connection's request handler reads from. Cheap
/// to clone (everything behind an `Arc`); one instance lives for the
/// daemon's lifetime.
pub struct ListenCtx {
    pub engine: Arc<WorkflowEngine>,
    pub bus: Arc<MessageBus>,
}

pub struct Listener {
    socket: UnixListener,
    ctx: Arc<ListenCtx>,
}

impl Listener {
    pub fn new(socket: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { socket, ctx }
    }

    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _addr)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, ctx).await {
                            warn!(error = %e, "connection handler exited with an error");
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                }
            }
        }
    }
}

async fn handle_connection(
    stream: UnixStream,
    ctx: Arc<ListenCtx>,
) -> Result<(), ProtocolError> {
    let (mut reader, mut writer) = stream.into_split();

    loop {
        let request = match protocol::read_request(&mut reader).await {
            Ok(request) => request,
            Err(ProtocolError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };

        match &request {
            Request::Status | Request::Inbox { .. } => debug!(?request, "handling request"),
            _ => info!(?request, "handling request"),
        }

        let response = handle_request(request, &ctx).await;
        protocol::write_response(&mut writer, &response).await?;
    }
}

async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Status => match ctx.engine.store().list() {
            Ok(workflows) => Response::Status { workflows },
            Err(e) => Response::Error {
                error: e.to_string(),
            },
        },

        Request::GetWorkflow { workflow_id } => match ctx.engine.store().load(&workflow_id) {
            Ok(Some(state)) => Response::Workflow { state },
            Ok(None) => Response::UnknownWorkflow {
                error: "unknown_workflow".to_string(),
            },
            Err(e) => Response::Error {
                error: e.to_string(),
            },
        },

        Request::SubmitEvidence {
            workflow_id,
            submission,
        } => match ctx.engine.submit_evidence(&workflow_id, submission).await {
            Ok(outcome) => Response::Evidence { outcome },
            Err(e) => Response::Error {
                error: e.to_string(),
            },
        },

        Request::Heartbeat { agent_id } => {
            let at = ctx.bus.heartbeat(agent_id.clone());
            Response::HeartbeatAck {
                ok: true,
                agent_id,
                at,
            }
        }

        Request::SendMessage {
            from,
            to,
            message_type,
            payload,
            workflow_id,
        } => match ctx
            .bus
            .send_message(from, to, message_type, payload, workflow_id)
        {
            Ok(id) => Response::MessageAccepted { id },
            Err(e) => Response::Error {
                error: e.to_string(),
            },
        },

        Request::Inbox {
            agent_id,
            timeout_ms,
        } => {
            let timeout = timeout_ms
                .map(std::time::Duration::from_millis)
                .unwrap_or(DEFAULT_INBOX_TIMEOUT);
            let messages = ctx.bus.inbox(agent_id.as_str(), timeout).await;
            Response::Messages { messages }
        }

        Request::Ack { message_id } => match ctx.bus.ack(&message_id) {
            Ok(ok) => Response::Ack { ok },
            Err(e) => Response::Error {
                error: e.to_string(),
            },
        },

        Request::Start {
            workflow_type,
            params,
        } => match ctx.engine.start(&workflow_type, params).await {
            Ok(state) => Response::Started { state },
            Err(e) => Response::Error {
                error: e.to_string(),
            },
        },

        Request::Pause { workflow_id } => match ctx.engine.pause(&workflow_id).await {
            Ok(outcome) => Response::Lifecycle { outcome },
            Err(e) => Response::Error {
                error: e.to_string(),
            },
        },

        Request::Resume { workflow_id } => match ctx.engine.resume(&workflow_id).await {
            Ok(outcome) => Response::Lifecycle { outcome },
            Err(e) => Response::Error {
                error: e.to_string(),
            },
        },

        Request::Override {
            workflow_id,
            next_state,
            reason,
        } => match ctx
            .engine
            .override_state(&workflow_id, &next_state, &reason)
            .await
        {
            Ok(outcome) => Response::Lifecycle { outcome },
            Err(e) => Response::Error {
                error: e.to_string(),
            },
        },

        Request::Dispatch { workflow_id } => {
            match ctx.engine.dispatch_current_state(&workflow_id).await {
                Ok(outcome) => Response::Dispatched { outcome },
                Err(e) => Response::Error {
                    error: e.to_string(),
                },
            }
        }
    }
}

/// Re-dispatch a workflow instance after some external change (used by
/// the autopilot loop, and available for a future `loom dispatch`
/// passthrough). Not part of the wire protocol.
pub async fn dispatch(ctx: &ListenCtx, workflow_id: &WorkflowId) -> Result<(), String> {
    ctx.engine
        .dispatch_current_state(workflow_id)
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
