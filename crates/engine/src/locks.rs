// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-`workflow_id` serialization. `submitEvidence`, `dispatchCurrentState`,
//! and `override` on the same workflow must be atomic with respect to
//! each other; distinct workflows proceed independently. Entries are
//! created lazily and never evicted during process lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use loom_core::WorkflowId;
use parking_lot::Mutex as SyncMutex;
use tokio::sync::Mutex as AsyncMutex;

#[derive(Default)]
pub struct WorkflowLocks {
    inner: SyncMutex<HashMap<WorkflowId, Arc<AsyncMutex<()>>>>,
}

impl WorkflowLocks {
    pub fn lock_for(&self, id: &WorkflowId) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock();
        map.entry(id.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}
