// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Automatic graph layout.
//!
//! This module re-derives node positions from a document's edge topology with
//! a layered algorithm aware of group containment and edge-type exclusion.

pub mod flowchart;

pub use flowchart::{
    auto_layout, FlowchartLayoutError, LayoutDirection, ParseLayoutDirectionError,
};
