// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the one external collaborator the engine talks to
//! directly: the terminal pane supervisor. The engine never inspects
//! pane output — it only triggers lifecycle (spawn/list/focus/close/
//! reconcile) through [`pane::PaneSupervisor`].

pub mod pane;

pub use pane::{NoOpPaneSupervisor, PaneError, PaneHandle, PaneInfo, PaneSpec, PaneSupervisor};

#[cfg(any(test, feature = "test-support"))]
pub use pane::{FakePaneSupervisor, PaneCall};

pub use pane::TmuxPaneSupervisor;
