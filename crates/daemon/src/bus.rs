// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The message bus: per-recipient FIFO inboxes, agent heartbeats, and
//! the WAL-backed durability that survives a daemon restart.
//!
//! Delivery is at-least-once for messages with `requires_ack = true`:
//! `inbox` peeks without removing, and the message stays queued until an
//! explicit `ack`. Messages with `requires_ack = false` are removed the
//! first time `inbox` returns them.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use loom_core::{AgentId, Clock, Message, MessageId};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::wal::{Wal, WalError};

/// Default long-poll timeout for `GET /inbox/<agent>` when the caller
/// does not specify one.
pub const DEFAULT_INBOX_TIMEOUT: Duration = Duration::from_secs(10);

/// WAL byte size past which idle compaction becomes worthwhile.
const COMPACTION_THRESHOLD_BYTES: u64 = 1024 * 1024;

struct BusState {
    queues: HashMap<String, VecDeque<Message>>,
    heartbeats: HashMap<AgentId, DateTime<Utc>>,
}

pub struct MessageBus {
    state: Mutex<BusState>,
    wal: Mutex<Wal>,
    wal_path: std::path::PathBuf,
    notify: Arc<Notify>,
    clock: Arc<dyn Clock>,
    active_long_polls: AtomicUsize,
}

impl MessageBus {
    pub fn open(wal_path: &Path, clock: Arc<dyn Clock>) -> Result<Self, WalError> {
        let (wal, replayed) = Wal::open(wal_path)?;
        Ok(Self {
            state: Mutex::new(BusState {
                queues: replayed.queues,
                heartbeats: HashMap::new(),
            }),
            wal: Mutex::new(wal),
            wal_path: wal_path.to_path_buf(),
            notify: Arc::new(Notify::new()),
            clock,
            active_long_polls: AtomicUsize::new(0),
        })
    }

    /// Enqueue a message for `to`, durably. Returns the assigned id.
    pub fn send_message(
        &self,
        from: impl Into<String>,
        to: impl Into<String>,
        message_type: impl Into<String>,
        payload: serde_json::Value,
        workflow_id: Option<String>,
    ) -> Result<MessageId, WalError> {
        let to = to.into();
        let mut message = Message::new(from, to.clone(), message_type, payload, self.clock.now());
        message.workflow_id = workflow_id;
        let id = message.id.clone();

        self.wal.lock().record_enqueue(&message)?;
        self.state
            .lock()
            .queues
            .entry(to)
            .or_default()
            .push_back(message);
        self.notify.notify_waiters();
        Ok(id)
    }

    pub fn heartbeat(&self, agent_id: AgentId) -> DateTime<Utc> {
        let now = self.clock.now();
        self.state.lock().heartbeats.insert(agent_id, now);
        now
    }

    pub fn last_heartbeat(&self, agent_id: &AgentId) -> Option<DateTime<Utc>> {
        self.state.lock().heartbeats.get(agent_id).copied()
    }

    /// Drain `requires_ack = false` messages for `agent_id` and return a
    /// snapshot of everything currently queued (including messages left
    /// in place pending an `ack`).
    ///
    /// Dropped messages are tombstoned in the WAL with the same `Ack`
    /// record `ack` uses, so a restart's replay doesn't resurrect a
    /// fire-and-forget message that was already delivered.
    fn drain_pending(&self, agent_id: &str) -> Vec<Message> {
        let (snapshot, dropped_ids) = {
            let mut state = self.state.lock();
            let Some(queue) = state.queues.get_mut(agent_id) else {
                return Vec::new();
            };
            let snapshot: Vec<Message> = queue.iter().cloned().collect();
            let dropped_ids: Vec<MessageId> = queue
                .iter()
                .filter(|m| !m.requires_ack)
                .map(|m| m.id.clone())
                .collect();
            queue.retain(|m| m.requires_ack);
            (snapshot, dropped_ids)
        };

        if !dropped_ids.is_empty() {
            let mut wal = self.wal.lock();
            for id in &dropped_ids {
                if let Err(e) = wal.record_ack(id) {
                    tracing::warn!(message_id = %id, error = %e, "failed to tombstone non-ack message in WAL");
                }
            }
        }

        snapshot
    }

    /// Long-poll for messages addressed to `agent_id`. Returns
    /// immediately if any are already queued; otherwise waits up to
    /// `timeout` for one to arrive, returning an empty vec on timeout.
    pub async fn inbox(&self, agent_id: &str, timeout: Duration) -> Vec<Message> {
        self.active_long_polls.fetch_add(1, Ordering::SeqCst);
        let result = self.inbox_inner(agent_id, timeout).await;
        self.active_long_polls.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn inbox_inner(&self, agent_id: &str, timeout: Duration) -> Vec<Message> {
        // Register intent to wait before re-checking the queue: Notify's
        // documented pattern for avoiding the missed-wakeup race between
        // the check and the await.
        let notified = self.notify.notified();
        tokio::pin!(notified);

        let pending = self.drain_pending(agent_id);
        if !pending.is_empty() {
            return pending;
        }

        if tokio::time::timeout(timeout, notified).await.is_err() {
            return Vec::new();
        }
        self.drain_pending(agent_id)
    }

    /// Acknowledge a message, removing it from whichever recipient's
    /// queue still holds it.
    pub fn ack(&self, message_id: &MessageId) -> Result<bool, WalError> {
        let removed = {
            let mut state = self.state.lock();
            let mut removed = false;
            for queue in state.queues.values_mut() {
                let before = queue.len();
                queue.retain(|m| &m.id != message_id);
                removed |= queue.len() != before;
            }
            removed
        };
        if removed {
            self.wal.lock().record_ack(message_id)?;
        }
        Ok(removed)
    }

    /// Compact the WAL if it has grown past [`COMPACTION_THRESHOLD_BYTES`]
    /// and no `inbox` long-poll is currently in flight. Safe to call
    /// from a periodic background tick; a no-op most of the time.
    pub fn compact_if_idle(&self) -> Result<(), WalError> {
        if self.active_long_polls.load(Ordering::SeqCst) > 0 {
            return Ok(());
        }
        let size = std::fs::metadata(&self.wal_path).map(|m| m.len()).unwrap_or(0);
        if size < COMPACTION_THRESHOLD_BYTES {
            return Ok(());
        }
        let queues = self.state.lock().queues.clone();
        self.wal.lock().compact(&queues)
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
