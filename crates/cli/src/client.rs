// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin client that sends one length-prefixed request to `loomd` and
//! decodes its response.

use std::path::PathBuf;

use loom_daemon::protocol::{self, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not reachable at {path}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("daemon returned an error: {0}")]
    Rejected(String),
}

pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    pub fn connect(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let stream =
            UnixStream::connect(&self.socket_path)
                .await
                .map_err(|e| ClientError::Connect {
                    path: self.socket_path.clone(),
                    source: e,
                })?;
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(request)?;
        tokio::time::timeout(
            protocol::DEFAULT_TIMEOUT,
            protocol::write_message(&mut writer, &data),
        )
        .await
        .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes = tokio::time::timeout(
            protocol::DEFAULT_TIMEOUT,
            protocol::read_message(&mut reader),
        )
        .await
        .map_err(|_| ProtocolError::Timeout)??;

        protocol::decode(&response_bytes).map_err(ClientError::from)
    }
}
