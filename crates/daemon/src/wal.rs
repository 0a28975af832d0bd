// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL write-ahead log for the message bus, at `<root>/bus.wal`.
//! Each line is
//! `{"seq":N,"record":{...}}`; `record` is either `Enqueue{message}` or
//! `Ack{message_id}`. Replaying the log from scratch reconstructs every
//! recipient's FIFO inbox queue, honoring tombstones from `Ack` entries
//! that arrived after their matching `Enqueue`.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use loom_core::{Message, MessageId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt WAL entry in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
enum WalRecord {
    Enqueue { message: Message },
    Ack { message_id: MessageId },
}

#[derive(Serialize)]
struct WalLine<'a> {
    seq: u64,
    record: &'a WalRecord,
}

#[derive(Deserialize)]
struct WalLineOwned {
    seq: u64,
    record: WalRecord,
}

/// The result of replaying the WAL from scratch: one FIFO queue per
/// recipient, with acknowledged messages already removed.
#[derive(Debug, Default)]
pub struct ReplayedInboxes {
    pub queues: std::collections::HashMap<String, VecDeque<Message>>,
}

/// Append-only durability layer for the bus. Every enqueue and ack is
/// appended before the in-memory inbox map is mutated, so a crash
/// between the two loses nothing: the next startup replays the WAL and
/// rebuilds the same queues.
pub struct Wal {
    file: File,
    path: PathBuf,
    next_seq: u64,
}

impl Wal {
    /// Open (creating if absent) the WAL at `path` and replay it into
    /// per-recipient inbox queues.
    pub fn open(path: &Path) -> Result<(Self, ReplayedInboxes), WalError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| WalError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let read_file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|source| WalError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let mut replayed = ReplayedInboxes::default();
        let mut max_seq = 0u64;
        let reader = BufReader::new(&read_file);
        for line in reader.lines() {
            let line = line.map_err(|source| WalError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed: WalLineOwned =
                serde_json::from_str(&line).map_err(|source| WalError::Json {
                    path: path.to_path_buf(),
                    source,
                })?;
            max_seq = max_seq.max(parsed.seq);
            match parsed.record {
                WalRecord::Enqueue { message } => {
                    replayed
                        .queues
                        .entry(message.to.clone())
                        .or_default()
                        .push_back(message);
                }
                WalRecord::Ack { message_id } => {
                    for queue in replayed.queues.values_mut() {
                        queue.retain(|m| m.id != message_id);
                    }
                }
            }
        }

        let file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|source| WalError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        Ok((
            Self {
                file,
                path: path.to_path_buf(),
                next_seq: max_seq + 1,
            },
            replayed,
        ))
    }

    fn append(&mut self, record: &WalRecord) -> Result<(), WalError> {
        let seq = self.next_seq;
        self.next_seq += 1;
        let line = WalLine { seq, record };
        let mut bytes = serde_json::to_vec(&line).map_err(|source| WalError::Json {
            path: self.path.clone(),
            source,
        })?;
        bytes.push(b'\n');
        self.file.write_all(&bytes).map_err(|source| WalError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.file.sync_all().map_err(|source| WalError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }

    pub fn record_enqueue(&mut self, message: &Message) -> Result<(), WalError> {
        self.append(&WalRecord::Enqueue {
            message: message.clone(),
        })
    }

    pub fn record_ack(&mut self, message_id: &MessageId) -> Result<(), WalError> {
        self.append(&WalRecord::Ack {
            message_id: message_id.clone(),
        })
    }

    /// Rewrite the WAL keeping only the messages still live in `queues`
    /// (an `Enqueue` per message, no `Ack` entries — they are implied by
    /// absence). Run opportunistically when idle.
    pub fn compact(
        &mut self,
        queues: &std::collections::HashMap<String, VecDeque<Message>>,
    ) -> Result<(), WalError> {
        let tmp_path = self.path.with_extension("wal.tmp");
        {
            let mut tmp = File::create(&tmp_path).map_err(|source| WalError::Io {
                path: tmp_path.clone(),
                source,
            })?;
            let mut seq = 0u64;
            for queue in queues.values() {
                for message in queue {
                    seq += 1;
                    let record = WalRecord::Enqueue {
                        message: message.clone(),
                    };
                    let line = WalLine { seq, record: &record };
                    let mut bytes =
                        serde_json::to_vec(&line).map_err(|source| WalError::Json {
                            path: tmp_path.clone(),
                            source,
                        })?;
                    bytes.push(b'\n');
                    tmp.write_all(&bytes).map_err(|source| WalError::Io {
                        path: tmp_path.clone(),
                        source,
                    })?;
                }
            }
            tmp.sync_all().map_err(|source| WalError::Io {
                path: tmp_path.clone(),
                source,
            })?;
            self.next_seq = seq + 1;
        }
        std::fs::rename(&tmp_path, &self.path).map_err(|source| WalError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|source| WalError::Io {
                path: self.path.clone(),
                source,
            })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
