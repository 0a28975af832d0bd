// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State-store root resolution: `--root` flag, then `$LOOM_STATE_DIR`,
//! then `~/.local/state/loom`.

use std::path::PathBuf;

pub fn resolve(flag: Option<PathBuf>) -> PathBuf {
    if let Some(root) = flag {
        return root;
    }
    if let Ok(dir) = std::env::var("LOOM_STATE_DIR") {
        return PathBuf::from(dir);
    }
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|d| d.join("loom"))
        .unwrap_or_else(|| PathBuf::from(".loom"))
}

pub fn socket_path(root: &std::path::Path) -> PathBuf {
    root.join("bus.sock")
}
