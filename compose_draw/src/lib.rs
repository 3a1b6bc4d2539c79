// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Output adapter for the compose layout engine.
//!
//! The adapter walks a solved [`LayoutState`] and emits typed drawing calls
//! against a [`Surface`]. It never measures, never wraps, and never decides
//! a break; the only arithmetic here is converting the engine's top-origin
//! positions into the target's coordinate system. A [`Recorder`] surface
//! captures the call sequence as comparable values, which is how the
//! determinism guarantees of the engine are tested.

#![warn(clippy::print_stdout, clippy::print_stderr)]

mod record;

pub use record::{DrawCommand, Recorder};

use compose::document::MathBox;
use compose::element::TextRun;
use compose::layout::{BlockContent, BlockLayout, LayoutState, LineLayout};
use peniko::Color;

/// Where the target puts its coordinate origin.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum Origin {
    /// Top-left origin with `y` growing downward (HTML, raster).
    #[default]
    TopLeft,
    /// Bottom-left origin with `y` growing upward (PDF).
    BottomLeft,
}

impl Origin {
    /// Converts a baseline or point `y` from the engine's design space.
    fn point_y(self, y: f64, page_height: f64) -> f64 {
        match self {
            Self::TopLeft => y,
            Self::BottomLeft => page_height - y,
        }
    }

    /// Converts a rectangle's reference `y` (its top edge in design space).
    fn rect_y(self, top: f64, height: f64, page_height: f64) -> f64 {
        match self {
            Self::TopLeft => top,
            Self::BottomLeft => page_height - top - height,
        }
    }
}

/// Drawing calls a render target implements.
///
/// `y` arguments arrive already converted for the declared [`Origin`]:
/// baselines for text and math, the rectangle's origin-corner for rules
/// and images.
pub trait Surface {
    fn begin_page(&mut self, width: f64, height: f64);
    fn draw_text_run(&mut self, x: f64, baseline: f64, run: &TextRun);
    fn draw_rule(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color);
    fn draw_image(&mut self, x: f64, y: f64, width: f64, height: f64, handle: u64);
    fn draw_math(&mut self, x: f64, baseline: f64, math: &MathBox);
    fn end_page(&mut self);
}

/// Renders a solved layout state onto a surface.
pub fn render(state: &LayoutState, surface: &mut impl Surface, origin: Origin) {
    log::debug!(
        "rendering {} page(s), {} residual violation(s)",
        state.pages.len(),
        state.violations.len()
    );
    for page in &state.pages {
        let page_height = page.size.height;
        surface.begin_page(page.size.width, page_height);
        for block in &page.blocks {
            render_block(block, surface, origin, page_height);
        }
        surface.end_page();
    }
}

fn render_block(
    block: &BlockLayout,
    surface: &mut impl Surface,
    origin: Origin,
    page_height: f64,
) {
    let left = block.bounds.left();
    let top = block.bounds.top();
    match &block.content {
        BlockContent::Lines { lines, background } => {
            if let Some(color) = background {
                surface.draw_rule(
                    left,
                    origin.rect_y(top, block.bounds.size.height, page_height),
                    block.bounds.size.width,
                    block.bounds.size.height,
                    *color,
                );
            }
            for line in lines {
                render_line(line, left, top, surface, origin, page_height);
            }
        }
        BlockContent::Table(table) => {
            for border in &table.borders {
                let rect = border.rect;
                surface.draw_rule(
                    left + rect.left(),
                    origin.rect_y(top + rect.top(), rect.size.height, page_height),
                    rect.size.width,
                    rect.size.height,
                    border.color,
                );
            }
            for row in &table.rows {
                for cell in &row.cells {
                    for line in &cell.lines {
                        render_line(
                            line,
                            left + cell.x,
                            top + row.y,
                            surface,
                            origin,
                            page_height,
                        );
                    }
                }
            }
        }
        BlockContent::Rule(rule) => {
            surface.draw_rule(
                left,
                origin.rect_y(top, rule.height, page_height),
                rule.width,
                rule.height,
                rule.color,
            );
        }
        BlockContent::Math { math, x } => {
            let baseline = top + math.ascent;
            surface.draw_math(left + x, origin.point_y(baseline, page_height), math);
        }
        BlockContent::Figure {
            image,
            image_x,
            caption_top,
            caption,
        } => {
            surface.draw_image(
                left + image_x,
                origin.rect_y(top, image.height, page_height),
                image.width,
                image.height,
                image.handle,
            );
            for line in caption {
                render_line(line, left, top + caption_top, surface, origin, page_height);
            }
        }
    }
}

fn render_line(
    line: &LineLayout,
    left: f64,
    top: f64,
    surface: &mut impl Surface,
    origin: Origin,
    page_height: f64,
) {
    use compose::element::InlineItem;

    let baseline = top + line.baseline;
    for item in &line.items {
        let x = left + line.x + item.x;
        match &item.item {
            InlineItem::Run(run) => {
                surface.draw_text_run(x, origin.point_y(baseline, page_height), run);
                render_decorations(run, x, baseline, surface, origin, page_height);
            }
            InlineItem::Math(math) => {
                surface.draw_math(x, origin.point_y(baseline, page_height), math);
            }
            InlineItem::Image(image) => {
                surface.draw_image(
                    x,
                    origin.rect_y(baseline - image.height, image.height, page_height),
                    image.width,
                    image.height,
                    image.handle,
                );
            }
        }
    }
}

/// Underline and strikethrough are drawn as rules derived from the run's
/// metrics.
fn render_decorations(
    run: &TextRun,
    x: f64,
    baseline: f64,
    surface: &mut impl Surface,
    origin: Origin,
    page_height: f64,
) {
    let thickness = (run.size / 16.0).max(0.5);
    if run.decorations.underline {
        let top = baseline + run.descent * 0.4;
        surface.draw_rule(
            x,
            origin.rect_y(top, thickness, page_height),
            run.width,
            thickness,
            run.color,
        );
    }
    if run.decorations.strikethrough {
        let top = baseline - run.ascent * 0.4;
        surface.draw_rule(
            x,
            origin.rect_y(top, thickness, page_height),
            run.width,
            thickness,
            run.color,
        );
    }
}
