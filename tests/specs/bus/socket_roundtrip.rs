//! Drives a real `loomd` over its Unix socket directly (bypassing the
//! `loom` CLI) to exercise the message bus endpoints: `send_message`/
//! `inbox`/`ack` FIFO delivery and `heartbeat`.

use crate::prelude::*;
use loom_daemon::protocol::{self, Request, Response};
use tokio::net::UnixStream;

const VERDICT_DEF: &str = r#"
{
  "name": "verdict-demo",
  "initialState": "REVIEW",
  "roles": { "reviewer": { "agent": "claude" } },
  "states": {
    "REVIEW": {
      "assign": "reviewer",
      "gate": { "kind": "verdict", "options": ["approved", "flagged"] },
      "transitions": { "approved": "DONE", "flagged": "ESC" }
    },
    "DONE": { "type": "terminal", "result": "success" },
    "ESC": { "type": "terminal", "result": "failure" }
  }
}
"#;

async fn roundtrip(socket: &std::path::Path, request: &Request) -> Response {
    let stream = UnixStream::connect(socket).await.expect("connect");
    let (mut reader, mut writer) = stream.into_split();
    let bytes = protocol::encode(request).expect("encode");
    protocol::write_message(&mut writer, &bytes)
        .await
        .expect("write");
    let reply = protocol::read_message(&mut reader).await.expect("read");
    protocol::decode(&reply).expect("decode")
}

#[tokio::test]
async fn send_message_is_delivered_and_removed_on_ack() {
    let daemon = Daemon::spawn_with_definition("verdict-demo", VERDICT_DEF);
    let socket = daemon.root.join("bus.sock");

    let sent = match roundtrip(
        &socket,
        &Request::SendMessage {
            from: "orchestrator".to_string(),
            to: "red-agent".to_string(),
            message_type: "nudge".to_string(),
            payload: serde_json::json!({"text": "go"}),
            workflow_id: None,
        },
    )
    .await
    {
        Response::MessageAccepted { id } => id,
        other => panic!("expected MessageAccepted, got {other:?}"),
    };

    let messages = match roundtrip(
        &socket,
        &Request::Inbox {
            agent_id: loom_core::AgentId::new("red-agent"),
            timeout_ms: Some(200),
        },
    )
    .await
    {
        Response::Messages { messages } => messages,
        other => panic!("expected Messages, got {other:?}"),
    };
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, sent);
    assert_eq!(messages[0].payload["text"], "go");

    match roundtrip(&socket, &Request::Ack { message_id: sent.clone() }).await {
        Response::Ack { ok } => assert!(ok),
        other => panic!("expected Ack, got {other:?}"),
    }

    // Acked messages stay gone even if the recipient polls again.
    let after_ack = match roundtrip(
        &socket,
        &Request::Inbox {
            agent_id: loom_core::AgentId::new("red-agent"),
            timeout_ms: Some(50),
        },
    )
    .await
    {
        Response::Messages { messages } => messages,
        other => panic!("expected Messages, got {other:?}"),
    };
    assert!(after_ack.is_empty());
}

#[tokio::test]
async fn inbox_long_poll_times_out_empty_with_nothing_queued() {
    let daemon = Daemon::spawn_with_definition("verdict-demo", VERDICT_DEF);
    let socket = daemon.root.join("bus.sock");

    let messages = match roundtrip(
        &socket,
        &Request::Inbox {
            agent_id: loom_core::AgentId::new("nobody"),
            timeout_ms: Some(100),
        },
    )
    .await
    {
        Response::Messages { messages } => messages,
        other => panic!("expected Messages, got {other:?}"),
    };
    assert!(messages.is_empty());
}

#[tokio::test]
async fn heartbeat_acknowledges_with_agent_id() {
    let daemon = Daemon::spawn_with_definition("verdict-demo", VERDICT_DEF);
    let socket = daemon.root.join("bus.sock");

    match roundtrip(
        &socket,
        &Request::Heartbeat {
            agent_id: loom_core::AgentId::new("red-agent"),
        },
    )
    .await
    {
        Response::HeartbeatAck { ok, agent_id, .. } => {
            assert!(ok);
            assert_eq!(agent_id.as_str(), "red-agent");
        }
        other => panic!("expected HeartbeatAck, got {other:?}"),
    }
}

#[tokio::test]
async fn status_lists_a_started_workflow() {
    let daemon = Daemon::spawn_with_definition("verdict-demo", VERDICT_DEF);
    let socket = daemon.root.join("bus.sock");

    match roundtrip(
        &socket,
        &Request::Start {
            workflow_type: "verdict-demo".to_string(),
            params: serde_json::json!({}),
        },
    )
    .await
    {
        Response::Started { .. } => {}
        other => panic!("expected Started, got {other:?}"),
    }

    match roundtrip(&socket, &Request::Status).await {
        Response::Status { workflows } => {
            assert_eq!(workflows.len(), 1);
            assert_eq!(workflows[0].workflow_type, "verdict-demo");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}
