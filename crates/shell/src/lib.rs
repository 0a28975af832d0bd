// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Shell-command syntax validation and timeout-bounded subprocess
//! execution, shared by gate verification commands and action-state
//! commands.
//!
//! This crate does not parse or interpret shell syntax beyond a
//! structural sanity check (§[`validate`]) — commands are handed to the
//! platform shell (`sh -c`) for actual interpretation. Everything about
//! *what* a command does once executed is opaque to the engine.

mod exec;
mod validate;

pub use exec::{run_with_timeout, CommandOutcome, ExecError};
pub use validate::{validate, ValidationError};
