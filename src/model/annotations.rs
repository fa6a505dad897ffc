// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Freehand annotation overlay data.
//!
//! These are drawn by the visual editor and carried by the document as opaque
//! pass-through payloads; the core persists and broadcasts them but never
//! interprets them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::node::Position;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnnotationLayer {
    #[serde(default)]
    strokes: Vec<AnnotationStroke>,
    #[serde(default)]
    arrows: Vec<AnnotationArrow>,
}

impl AnnotationLayer {
    pub fn new(strokes: Vec<AnnotationStroke>, arrows: Vec<AnnotationArrow>) -> Self {
        Self { strokes, arrows }
    }

    pub fn strokes(&self) -> &[AnnotationStroke] {
        &self.strokes
    }

    pub fn strokes_mut(&mut self) -> &mut Vec<AnnotationStroke> {
        &mut self.strokes
    }

    pub fn arrows(&self) -> &[AnnotationArrow] {
        &self.arrows
    }

    pub fn arrows_mut(&mut self) -> &mut Vec<AnnotationArrow> {
        &mut self.arrows
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.arrows.is_empty()
    }
}

/// One freehand pen path. Points carry pressure as a third component and
/// serialize as `[x, y, pressure]` triples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnnotationStroke {
    id: String,
    points: Vec<StrokePoint>,
    color: String,
    width: f64,
}

impl AnnotationStroke {
    pub fn new(id: impl Into<String>, points: Vec<StrokePoint>, color: impl Into<String>, width: f64) -> Self {
        Self {
            id: id.into(),
            points,
            color: color.into(),
            width,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn width(&self) -> f64 {
        self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StrokePoint(pub f64, pub f64, pub f64);

impl StrokePoint {
    pub fn x(&self) -> f64 {
        self.0
    }

    pub fn y(&self) -> f64 {
        self.1
    }

    pub fn pressure(&self) -> f64 {
        self.2
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnnotationArrow {
    id: String,
    start: Position,
    end: Position,
    color: String,
}

impl AnnotationArrow {
    pub fn new(id: impl Into<String>, start: Position, end: Position, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            color: color.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn end(&self) -> Position {
        self.end
    }

    pub fn color(&self) -> &str {
        &self.color
    }
}
