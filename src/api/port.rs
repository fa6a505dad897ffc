// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Deterministic per-project port allocation.
//!
//! Each project directory hashes to a stable port in 9100..=9999, so editors
//! and agents reconnect to the same address across restarts without any
//! registry. The chosen port is recorded in the storage directory's `.port`
//! file for out-of-process collaborators.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

pub const PORT_RANGE_START: u16 = 9100;
pub const PORT_RANGE_END: u16 = 9999;
pub const PORT_ENV_VAR: &str = "FLOWPLAN_PORT";

/// How many candidate ports to try before giving up when the preferred one
/// is taken.
const PROBE_ATTEMPTS: u16 = 50;

/// Contents of the `.port` coordination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortFile {
    pub port: u16,
    pub pid: u32,
}

/// Maps the project directory to its stable port in 9100..=9999.
///
/// The path is canonicalized first so `.` and an absolute spelling of the
/// same directory agree; a path that cannot be canonicalized (not created
/// yet) hashes as spelled.
pub fn derived_port(project_dir: &Path) -> u16 {
    let canonical = project_dir
        .canonicalize()
        .unwrap_or_else(|_| project_dir.to_path_buf());
    let hash = blake3::hash(canonical.to_string_lossy().as_bytes());
    let mut word = [0u8; 8];
    word.copy_from_slice(&hash.as_bytes()[..8]);
    let span = u64::from(PORT_RANGE_END - PORT_RANGE_START) + 1;
    PORT_RANGE_START + (u64::from_le_bytes(word) % span) as u16
}

/// The port to try first: the `FLOWPLAN_PORT` override when set and
/// parsable, otherwise the derived project port.
pub fn preferred_port(project_dir: &Path) -> u16 {
    std::env::var(PORT_ENV_VAR)
        .ok()
        .as_deref()
        .and_then(parse_port_override)
        .unwrap_or_else(|| derived_port(project_dir))
}

fn parse_port_override(raw: &str) -> Option<u16> {
    raw.trim().parse::<u16>().ok().filter(|&port| port != 0)
}

/// Binds the project's port, probing upward (wrapping at the top of the
/// range back to 9100) when the preferred port is taken. Ports outside the
/// managed range do not wrap; they fail like any other bind error.
pub async fn bind_project_port(project_dir: &Path) -> io::Result<TcpListener> {
    let preferred = preferred_port(project_dir);

    let mut last_err = None;
    let mut candidate = preferred;
    for _ in 0..PROBE_ATTEMPTS {
        match TcpListener::bind(("127.0.0.1", candidate)).await {
            Ok(listener) => return Ok(listener),
            Err(err) => last_err = Some(err),
        }
        candidate = if (PORT_RANGE_START..PORT_RANGE_END).contains(&candidate) {
            candidate + 1
        } else if candidate == PORT_RANGE_END {
            PORT_RANGE_START
        } else {
            break;
        };
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrInUse, "no free port in project range")
    }))
}
