// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Table layout.
//!
//! Two passes: first the minimum (widest unbreakable chunk) and maximum
//! (unwrapped) width of every column, then a proportional distribution of
//! the available measure and an independent paragraph layout of every cell
//! at its column width. Row height is the tallest cell; borders are emitted
//! as rules.

use core::hash::{Hash, Hasher};
use std::hash::DefaultHasher;

use compose_metrics::FontAttributes;
use peniko::Color;

use crate::config::LayoutOptions;
use crate::document::{ColumnAlignment, InlineNode, MathEngine, TableRow};
use crate::error::LayoutError;
use crate::flow::{build_lines, Itemizer, TextStyle};
use crate::geometry::Rect;
use crate::layout::{CellLayout, LineLayout, PlacedRule, TableRowLayout};
use crate::linebreak::{break_paragraph, totals, Item, LineWidths};
use crate::measure::{CompositeKind, Measurer};

/// Thickness of cell border rules.
const BORDER: f64 = 0.5;

fn cell_style(options: &LayoutOptions, header: bool) -> TextStyle {
    let mut style = TextStyle::body(options);
    if header {
        style.attributes = FontAttributes::bold();
    }
    style
}

/// Content digest for the composite measurement cache: structure and text
/// of the cell plus whether it is set in the header style.
fn cell_digest(nodes: &[InlineNode], header: bool) -> u64 {
    let mut hasher = DefaultHasher::new();
    header.hash(&mut hasher);
    hash_inline(nodes, &mut hasher);
    hasher.finish()
}

fn hash_inline(nodes: &[InlineNode], hasher: &mut DefaultHasher) {
    for node in nodes {
        core::mem::discriminant(node).hash(hasher);
        match node {
            InlineNode::Text(text) => text.hash(hasher),
            InlineNode::Emphasis(inner)
            | InlineNode::Strong(inner)
            | InlineNode::Strikethrough(inner)
            | InlineNode::Code(inner) => hash_inline(inner, hasher),
            InlineNode::Link { url, children } => {
                url.hash(hasher);
                hash_inline(children, hasher);
            }
            InlineNode::Image(image) => image.handle.hash(hasher),
            InlineNode::MathInline { source } => source.hash(hasher),
            InlineNode::HardBreak | InlineNode::SoftBreak => {}
        }
    }
}

/// Minimum and maximum content width of one cell.
fn cell_widths(
    measurer: &mut Measurer<'_>,
    math: &dyn MathEngine,
    options: &LayoutOptions,
    nodes: &[InlineNode],
    header: bool,
) -> Result<(f64, f64), LayoutError> {
    let digest = cell_digest(nodes, header);
    if let Some(widths) = measurer.composite_widths(CompositeKind::TableCell, digest) {
        return Ok(widths);
    }
    let style = cell_style(options, header);
    let items = Itemizer::new(measurer, math, options).itemize(nodes, &style)?;
    let mut min = 0.0_f64;
    for item in &items {
        if let Item::Box { width, .. } = item {
            min = min.max(*width);
        }
    }
    let (max, _, _) = totals(&items, 0..items.len());
    measurer.store_composite_widths(CompositeKind::TableCell, digest, (min, max));
    Ok((min, max))
}

/// Distributes column widths within `available`.
///
/// Natural widths are kept when they fit; otherwise the slack between each
/// column's minimum and natural width is scaled uniformly, and as a last
/// resort the minima themselves shrink proportionally.
fn distribute(min: &[f64], max: &[f64], available: f64) -> Vec<f64> {
    let sum_min: f64 = min.iter().sum();
    let sum_max: f64 = max.iter().sum();
    if sum_max <= available {
        return max.to_vec();
    }
    if sum_min < available {
        let factor = (available - sum_min) / (sum_max - sum_min);
        return min
            .iter()
            .zip(max)
            .map(|(lo, hi)| lo + factor * (hi - lo))
            .collect();
    }
    let factor = available / sum_min;
    min.iter().map(|lo| lo * factor).collect()
}

/// Lays out a table at the given measure. Returns the rows (y-contiguous,
/// relative to the table top) and the column edge offsets.
pub(crate) fn layout_table(
    measurer: &mut Measurer<'_>,
    math: &dyn MathEngine,
    options: &LayoutOptions,
    rows: &[TableRow],
    alignments: &[ColumnAlignment],
    width: f64,
) -> Result<(Vec<TableRowLayout>, Vec<f64>), LayoutError> {
    let columns = rows.iter().map(|row| row.cells.len()).max().unwrap_or(0);
    if columns == 0 {
        return Ok((Vec::new(), Vec::new()));
    }
    let padding = options.typography.table_cell_padding;

    let mut min = vec![0.0_f64; columns];
    let mut max = vec![0.0_f64; columns];
    for row in rows {
        for (col, cell) in row.cells.iter().enumerate() {
            let (cell_min, cell_max) = cell_widths(measurer, math, options, cell, row.header)?;
            min[col] = min[col].max(cell_min + 2.0 * padding);
            max[col] = max[col].max(cell_max + 2.0 * padding);
        }
    }

    let widths = distribute(&min, &max, width);
    let mut col_edges = Vec::with_capacity(columns + 1);
    let mut edge = 0.0;
    col_edges.push(0.0);
    for w in &widths {
        edge += w;
        col_edges.push(edge);
    }

    let mut layouts = Vec::with_capacity(rows.len());
    let mut y = 0.0;
    for row in rows {
        let mut cells = Vec::with_capacity(columns);
        let mut row_height = 0.0_f64;
        for col in 0..columns {
            let nodes = row.cells.get(col).map(Vec::as_slice).unwrap_or(&[]);
            let column_width = widths[col];
            let text_width = (column_width - 2.0 * padding).max(1.0);
            let lines = layout_cell(
                measurer,
                math,
                options,
                nodes,
                row.header,
                text_width,
                padding,
                alignments.get(col).copied().unwrap_or_default(),
            )?;
            let cell_height: f64 =
                lines.iter().map(LineLayout::height).sum::<f64>() + 2.0 * padding;
            row_height = row_height.max(cell_height);
            cells.push(CellLayout {
                x: col_edges[col],
                width: column_width,
                lines,
            });
        }
        layouts.push(TableRowLayout {
            y,
            height: row_height,
            cells,
        });
        y += row_height;
    }
    Ok((layouts, col_edges))
}

fn layout_cell(
    measurer: &mut Measurer<'_>,
    math: &dyn MathEngine,
    options: &LayoutOptions,
    nodes: &[InlineNode],
    header: bool,
    text_width: f64,
    padding: f64,
    alignment: ColumnAlignment,
) -> Result<Vec<LineLayout>, LayoutError> {
    if nodes.is_empty() {
        return Ok(Vec::new());
    }
    let style = cell_style(options, header);
    let items = Itemizer::new(measurer, math, options).itemize(nodes, &style)?;
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let breaks = break_paragraph(
        &items,
        LineWidths::constant(text_width),
        &options.line_breaking,
        measurer,
    );
    let font = style.resolve(measurer)?;
    let metrics = measurer.fonts().metrics(font, style.size);
    let mut lines = build_lines(
        &breaks,
        style.size * options.typography.line_height_factor,
        metrics.ascent,
        metrics.descent,
        padding,
        None,
    );
    for line in &mut lines {
        line.baseline += padding;
        line.x = match alignment {
            ColumnAlignment::Left => padding,
            ColumnAlignment::Center => padding + ((text_width - line.width) / 2.0).max(0.0),
            ColumnAlignment::Right => padding + (text_width - line.width).max(0.0),
        };
    }
    Ok(lines)
}

/// Cell borders for a fragment of rows, relative to the fragment's top-left.
pub(crate) fn borders_for(
    rows: &[TableRowLayout],
    col_edges: &[f64],
    color: Color,
) -> Vec<PlacedRule> {
    let Some(last) = rows.last() else {
        return Vec::new();
    };
    let table_width = col_edges.last().copied().unwrap_or_default();
    let table_height = last.y + last.height;
    let mut borders = Vec::new();
    for row in rows {
        borders.push(PlacedRule {
            rect: Rect::new(0.0, row.y, table_width, BORDER),
            color,
        });
    }
    borders.push(PlacedRule {
        rect: Rect::new(0.0, table_height - BORDER, table_width, BORDER),
        color,
    });
    for edge in col_edges {
        let x = (edge - BORDER).max(0.0).min(table_width - BORDER);
        borders.push(PlacedRule {
            rect: Rect::new(x, 0.0, BORDER, table_height),
            color,
        });
    }
    borders
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_widths_kept_when_they_fit() {
        let widths = distribute(&[20.0, 20.0], &[50.0, 30.0], 100.0);
        assert_eq!(widths, vec![50.0, 30.0]);
    }

    #[test]
    fn overwide_table_shrinks_proportionally() {
        // Natural 160 on an 100pt measure with minima summing to 40: slack
        // scales by (100-40)/(160-40) = 0.5.
        let widths = distribute(&[20.0, 20.0], &[100.0, 60.0], 100.0);
        assert!((widths[0] - 60.0).abs() < 1e-9);
        assert!((widths[1] - 40.0).abs() < 1e-9);
        assert!((widths.iter().sum::<f64>() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn impossible_minima_scale_down() {
        let widths = distribute(&[80.0, 80.0], &[90.0, 90.0], 80.0);
        assert!((widths.iter().sum::<f64>() - 80.0).abs() < 1e-9);
        assert!((widths[0] - widths[1]).abs() < 1e-9);
    }
}
