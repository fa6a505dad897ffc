// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Model Context Protocol (MCP) server surface.
//!
//! The MCP layer is how agents create and edit flowcharts; humans see the
//! same documents through the web editor, so every tool call here lands as a
//! broadcast update there.

mod server;
mod types;

pub use server::FlowplanMcp;
