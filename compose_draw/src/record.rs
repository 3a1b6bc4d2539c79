// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A surface that records its calls as comparable values.

use compose::document::MathBox;
use compose::element::{Decorations, TextRun};
use compose_metrics::FontId;
use peniko::Color;

use crate::Surface;

/// One recorded drawing call.
#[derive(Clone, PartialEq, Debug)]
pub enum DrawCommand {
    BeginPage {
        width: f64,
        height: f64,
    },
    TextRun {
        x: f64,
        baseline: f64,
        text: String,
        font: FontId,
        size: f64,
        color: Color,
        decorations: Decorations,
    },
    Rule {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Color,
    },
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        handle: u64,
    },
    Math {
        x: f64,
        baseline: f64,
        handle: u64,
    },
    EndPage,
}

/// Captures the sequence of drawing calls for assertions and golden
/// comparisons.
#[derive(Clone, Default, Debug)]
pub struct Recorder {
    pub commands: Vec<DrawCommand>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages begun.
    pub fn page_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::BeginPage { .. }))
            .count()
    }

    /// All recorded text, in draw order.
    pub fn text(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::TextRun { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for Recorder {
    fn begin_page(&mut self, width: f64, height: f64) {
        self.commands.push(DrawCommand::BeginPage { width, height });
    }

    fn draw_text_run(&mut self, x: f64, baseline: f64, run: &TextRun) {
        self.commands.push(DrawCommand::TextRun {
            x,
            baseline,
            text: run.text.clone(),
            font: run.font,
            size: run.size,
            color: run.color,
            decorations: run.decorations,
        });
    }

    fn draw_rule(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        self.commands.push(DrawCommand::Rule {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn draw_image(&mut self, x: f64, y: f64, width: f64, height: f64, handle: u64) {
        self.commands.push(DrawCommand::Image {
            x,
            y,
            width,
            height,
            handle,
        });
    }

    fn draw_math(&mut self, x: f64, baseline: f64, math: &MathBox) {
        self.commands.push(DrawCommand::Math {
            x,
            baseline,
            handle: math.handle,
        });
    }

    fn end_page(&mut self) {
        self.commands.push(DrawCommand::EndPage);
    }
}
