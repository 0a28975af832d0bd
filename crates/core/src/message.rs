// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The message bus payload: the unit that flows through agent inboxes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::MessageId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
    #[serde(default = "default_requires_ack")]
    pub requires_ack: bool,
}

fn default_requires_ack() -> bool {
    true
}

impl Message {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        message_type: impl Into<String>,
        payload: Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            from: from.into(),
            to: to.into(),
            message_type: message_type.into(),
            workflow_id: None,
            phase: None,
            timestamp: now,
            payload,
            requires_ack: true,
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
