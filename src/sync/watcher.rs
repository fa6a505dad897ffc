// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::model::FlowchartId;
use crate::store::{FlowchartDir, FlowchartStore};

/// Shorter than the store's self-write suppression window, so a change caused
/// by our own atomic rename is always examined while its marker is still
/// pending.
const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

/// Polls the storage directory and emits a change event for every document
/// modified by something other than this store (an editor, another process,
/// a git checkout). Runs until [`FlowchartStore::close`] is called.
///
/// Only modifications to already-known files notify. A file appearing or
/// disappearing updates the baseline silently; undecodable content is
/// swallowed. There is no notification coalescing beyond the poll interval.
pub fn spawn_watcher(store: Arc<FlowchartStore>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(WATCH_POLL_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut baseline = scan(store.dir());

        loop {
            interval.tick().await;
            if store.is_closed() {
                break;
            }
            poll_once(&store, &mut baseline);
        }
    })
}

/// Snapshot of every document file's (mtime, length). An absent storage
/// directory reads as empty; it may not exist until the first create.
fn scan(dir: &FlowchartDir) -> BTreeMap<String, FileStamp> {
    let Ok(entries) = fs::read_dir(dir.root()) else {
        return BTreeMap::new();
    };

    let mut stamps = BTreeMap::new();
    for entry in entries.filter_map(|entry| entry.ok()) {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !FlowchartDir::is_document_file_name(name) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        stamps.insert(
            name.to_string(),
            FileStamp {
                modified: metadata.modified().ok(),
                len: metadata.len(),
            },
        );
    }
    stamps
}

/// One comparison pass against the baseline. Factored out of the task loop so
/// detection semantics can be exercised without timing.
fn poll_once(store: &FlowchartStore, baseline: &mut BTreeMap<String, FileStamp>) {
    let current = scan(store.dir());

    baseline.retain(|name, _| current.contains_key(name));

    for (name, stamp) in current {
        let known = baseline.insert(name.clone(), stamp);
        match known {
            None => {}
            Some(previous) if previous == stamp => {}
            Some(_) => {
                if store.take_self_write(&name) {
                    continue;
                }
                notify_external_change(store, &name);
            }
        }
    }
}

fn notify_external_change(store: &FlowchartStore, file_name: &str) {
    let Some(stem) = file_name.strip_suffix(".json") else {
        return;
    };
    let Ok(id) = FlowchartId::new(stem) else {
        return;
    };
    // A decode failure here is an edit in progress or a corrupt file; the
    // next successful write will notify.
    let Ok(Some(document)) = store.read(&id) else {
        return;
    };
    store.emit_external(id, document);
}
