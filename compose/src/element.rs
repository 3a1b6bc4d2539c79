// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Measured, immutable content boxes.
//!
//! These are created during measurement and never mutated afterwards, so
//! they can be shared freely between solver iterations.

use compose_metrics::FontId;
use peniko::Color;

use crate::document::{ImageSource, MathBox};

/// Decorations drawn by the adapter relative to a run's baseline.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Decorations {
    pub underline: bool,
    pub strikethrough: bool,
}

impl Decorations {
    pub fn none() -> Self {
        Self::default()
    }
}

/// A maximal stretch of text sharing font, size, color, and decoration,
/// measured against the font's metric table.
#[derive(Clone, PartialEq, Debug)]
pub struct TextRun {
    pub text: String,
    pub font: FontId,
    pub size: f64,
    pub color: Color,
    pub decorations: Decorations,
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
}

impl TextRun {
    /// Height of the run's box. Always `ascent + descent`.
    pub fn height(&self) -> f64 {
        self.ascent + self.descent
    }
}

/// A horizontal rule or filled rectangle.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct RuleBox {
    pub width: f64,
    pub height: f64,
    pub color: Color,
}

/// Content that can appear inside a line: a run, an inline formula, or an
/// inline image. Formulas and images sit on the baseline.
#[derive(Clone, PartialEq, Debug)]
pub enum InlineItem {
    Run(TextRun),
    Math(MathBox),
    Image(ImageSource),
}

impl InlineItem {
    pub fn width(&self) -> f64 {
        match self {
            Self::Run(run) => run.width,
            Self::Math(math) => math.width,
            Self::Image(image) => image.width,
        }
    }

    pub fn ascent(&self) -> f64 {
        match self {
            Self::Run(run) => run.ascent,
            Self::Math(math) => math.ascent,
            Self::Image(image) => image.height,
        }
    }

    pub fn descent(&self) -> f64 {
        match self {
            Self::Run(run) => run.descent,
            Self::Math(math) => math.descent,
            Self::Image(_) => 0.0,
        }
    }
}
