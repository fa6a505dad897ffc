// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence for flowcharts on disk.
//!
//! `FlowchartDir` owns the file format and atomic-write discipline for the
//! `.claude/flowplans/` directory; `FlowchartStore` layers per-document
//! locking, version bookkeeping, and change events on top. Both the HTTP
//! surface and the MCP tools go through the store.

pub mod flowchart_dir;
pub mod store;

pub use flowchart_dir::{FlowchartDir, StoreError, WriteDurability};
pub use store::{EdgeSpec, FlowchartStore, NodeSpec, NodeUpdate, StoreEvent};
