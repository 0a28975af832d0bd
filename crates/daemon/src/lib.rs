// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The local IPC bus: a Unix-socket server wrapping the engine, a
//! length-prefixed JSON wire protocol, per-recipient inbox queues with
//! WAL-backed durability, and the optional autopilot polling loop that
//! keeps a workflow moving without an external caller driving it state
//! by state.

pub mod autopilot;
pub mod bus;
pub mod listener;
pub mod protocol;
pub mod wal;

pub use bus::{MessageBus, DEFAULT_INBOX_TIMEOUT};
pub use listener::{dispatch, ListenCtx, Listener};
pub use protocol::{ProtocolError, Request, Response, DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE};
pub use wal::{Wal, WalError};
