// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Flowplan — a versioned flowchart store with auto-layout and live sync.
//!
//! One process per project serves the same documents to three kinds of
//! editors: agents over MCP tools, REST clients doing whole-document
//! upserts, and visual editors listening on a WebSocket push channel. Every
//! mutation goes through the versioned store (`store`), which persists
//! atomically and notifies the broadcaster (`sync`); node positions are
//! re-derived on demand by the layered layout engine (`layout`).

pub mod api;
pub mod layout;
pub mod mcp;
pub mod model;
pub mod replica;
pub mod store;
pub mod sync;
