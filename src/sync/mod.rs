// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Change propagation.
//!
//! Two halves: the watcher turns on-disk edits made by other processes into
//! store change events, and the broadcaster fans all change events out to
//! WebSocket subscribers as `flowchart_update` frames.

pub mod broadcaster;
pub mod watcher;

pub use broadcaster::{spawn_relay, update_frame, ChangeBroadcaster};
pub use watcher::spawn_watcher;
