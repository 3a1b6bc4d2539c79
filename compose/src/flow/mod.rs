// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The block layout generator.
//!
//! Layout runs in two stages. `collect` walks the document tree in order
//! and measures every block at the content width, producing a page-independent
//! [`Plan`]. `place` then pours the plan onto pages top to bottom,
//! splitting breakable blocks at line or row boundaries, collapsing
//! vertical margins, and honoring the placement constraints accumulated by
//! solver adjustments. Re-placing the same plan with the same constraints
//! is deterministic, which is what lets adjustments be pure functions from
//! state to state.

mod itemize;
mod table;

use core::ops::Range;

use hashbrown::HashMap;
use peniko::Color;

use crate::config::LayoutOptions;
use crate::document::{BlockNode, Document, ListItem, MathEngine, MathMode};
use crate::element::{InlineItem, RuleBox};
use crate::error::LayoutError;
use crate::geometry::{Rect, Size, EPSILON};
use crate::layout::{
    BlockConstraints, BlockContent, BlockId, BlockKind, BlockLayout, BlockMeta, Cursor,
    LayoutState, LineLayout, PageLayout, PositionedItem, TableRowLayout,
};
use crate::linebreak::{break_paragraph, Item, LineWidths, ParagraphBreaks};
use crate::measure::Measurer;

pub(crate) use itemize::{Itemizer, TextStyle};

/// Vertical padding inside a code block's background.
const CODE_PADDING: f64 = 6.0;

/// Gap between a figure's image and its caption.
const CAPTION_GAP: f64 = 4.0;

/// A measured block, not yet assigned to a page.
#[derive(Clone, Debug)]
pub struct MeasuredBlock {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Offset from the content rectangle's left edge.
    pub x: f64,
    pub width: f64,
    pub spacing_before: f64,
    pub spacing_after: f64,
    pub keep_with_next: bool,
    pub keep_together: bool,
    pub breakable: bool,
    pub content: MeasuredContent,
}

/// Page-independent content of a measured block.
#[derive(Clone, Debug)]
pub enum MeasuredContent {
    Lines {
        lines: Vec<LineLayout>,
        background: Option<Color>,
    },
    Table {
        rows: Vec<TableRowLayout>,
        col_edges: Vec<f64>,
    },
    Rule(RuleBox),
    Math {
        math: crate::document::MathBox,
        x: f64,
    },
    Figure {
        image: crate::document::ImageSource,
        image_x: f64,
        caption_top: f64,
        caption: Vec<LineLayout>,
    },
}

impl MeasuredContent {
    /// Total height of the content.
    pub fn height(&self) -> f64 {
        match self {
            Self::Lines { lines, background } => {
                let text: f64 = lines.iter().map(LineLayout::height).sum();
                if background.is_some() {
                    text + 2.0 * CODE_PADDING
                } else {
                    text
                }
            }
            Self::Table { rows, .. } => rows
                .last()
                .map(|row| row.y + row.height)
                .unwrap_or_default(),
            Self::Rule(rule) => rule.height,
            Self::Math { math, .. } => math.height,
            Self::Figure {
                image,
                caption_top,
                caption,
                ..
            } => {
                let caption_height: f64 = caption.iter().map(LineLayout::height).sum();
                if caption.is_empty() {
                    image.height
                } else {
                    caption_top + caption_height
                }
            }
        }
    }

    /// Number of positions the content can split at (lines or rows);
    /// zero for atomic content.
    fn units(&self) -> usize {
        match self {
            Self::Lines { lines, .. } => lines.len(),
            Self::Table { rows, .. } => rows.len(),
            _ => 0,
        }
    }

    fn unit_height(&self, index: usize) -> f64 {
        match self {
            Self::Lines { lines, .. } => lines[index].height(),
            Self::Table { rows, .. } => rows[index].height,
            _ => self.height(),
        }
    }

    /// Height a fragment carries beyond its units (background padding).
    fn fragment_overhead(&self) -> f64 {
        match self {
            Self::Lines {
                background: Some(_),
                ..
            } => 2.0 * CODE_PADDING,
            _ => 0.0,
        }
    }

    /// Extracts the placed content for a unit range, rebased to the
    /// fragment's top. For atomic content the range is ignored.
    fn fragment(&self, range: Range<usize>, options: &LayoutOptions) -> (BlockContent, f64) {
        match self {
            Self::Lines { lines, background } => {
                let offset: f64 = lines[..range.start].iter().map(LineLayout::height).sum();
                let pad = if background.is_some() { CODE_PADDING } else { 0.0 };
                let slice: Vec<LineLayout> = lines[range.clone()]
                    .iter()
                    .map(|line| LineLayout {
                        baseline: line.baseline - offset + pad,
                        ..line.clone()
                    })
                    .collect();
                let height: f64 =
                    slice.iter().map(LineLayout::height).sum::<f64>() + 2.0 * pad;
                (
                    BlockContent::Lines {
                        lines: slice,
                        background: *background,
                    },
                    height,
                )
            }
            Self::Table { rows, col_edges } => {
                let offset = rows[range.start].y;
                let slice: Vec<TableRowLayout> = rows[range.clone()]
                    .iter()
                    .map(|row| TableRowLayout {
                        y: row.y - offset,
                        ..row.clone()
                    })
                    .collect();
                let height = slice
                    .last()
                    .map(|row| row.y + row.height)
                    .unwrap_or_default();
                let borders =
                    table::borders_for(&slice, col_edges, options.typography.rule_color);
                (
                    BlockContent::Table(crate::layout::TableLayout {
                        rows: slice,
                        borders,
                    }),
                    height,
                )
            }
            Self::Rule(rule) => (BlockContent::Rule(*rule), rule.height),
            Self::Math { math, x } => (BlockContent::Math { math: *math, x: *x }, math.height),
            Self::Figure {
                image,
                image_x,
                caption_top,
                caption,
            } => (
                BlockContent::Figure {
                    image: *image,
                    image_x: *image_x,
                    caption_top: *caption_top,
                    caption: caption.clone(),
                },
                self.height(),
            ),
        }
    }
}

/// The measured document: every block at its content width, in document
/// order.
#[derive(Clone, Default, Debug)]
pub struct Plan {
    pub blocks: Vec<MeasuredBlock>,
}

/// Positions the items of broken lines and stacks the lines vertically.
///
/// `indent` offsets every line from the block's left edge; `center_width`
/// instead centers each line within the given measure.
pub(crate) fn build_lines(
    breaks: &ParagraphBreaks,
    line_height: f64,
    base_ascent: f64,
    base_descent: f64,
    indent: f64,
    center_width: Option<f64>,
) -> Vec<LineLayout> {
    let mut lines = Vec::with_capacity(breaks.lines.len());
    let mut y = 0.0;
    for broken in &breaks.lines {
        let mut items = Vec::new();
        let mut x = 0.0;
        let mut ascent: f64 = 0.0;
        let mut descent: f64 = 0.0;
        for index in broken.range.clone() {
            match &breaks.items[index] {
                Item::Box { width, content } => {
                    ascent = ascent.max(content.ascent());
                    descent = descent.max(content.descent());
                    items.push(PositionedItem {
                        x,
                        item: content.clone(),
                    });
                    x += width;
                }
                Item::Glue {
                    width,
                    stretch,
                    shrink,
                } => {
                    let adjust = if broken.ratio >= 0.0 {
                        broken.ratio * stretch
                    } else {
                        broken.ratio * shrink
                    };
                    x += width + adjust;
                }
                Item::Penalty { .. } => {}
            }
        }
        if items.is_empty() {
            ascent = base_ascent;
            descent = base_descent;
        }
        let leading = (line_height - ascent - descent).max(0.0);
        let line_x = match center_width {
            Some(measure) => indent + ((measure - x) / 2.0).max(0.0),
            None => indent,
        };
        lines.push(LineLayout {
            x: line_x,
            baseline: y + leading / 2.0 + ascent,
            width: x,
            ascent,
            descent,
            leading,
            ratio: broken.ratio,
            items,
        });
        y += line_height.max(ascent + descent);
    }
    lines
}

struct Collector<'m, 'f> {
    measurer: &'m mut Measurer<'f>,
    math: &'m dyn MathEngine,
    options: &'m LayoutOptions,
    blocks: Vec<MeasuredBlock>,
    next_id: u32,
}

impl<'m, 'f> Collector<'m, 'f> {
    fn next_id(&mut self) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        id
    }

    fn content_width(&self) -> f64 {
        let page = &self.options.page;
        page.width - page.margins.left - page.margins.right
    }

    fn line_height(&self, size: f64) -> f64 {
        size * self.options.typography.line_height_factor
    }

    fn paragraph_lines(
        &mut self,
        children: &[crate::document::InlineNode],
        style: &TextStyle,
        width: f64,
        center: bool,
    ) -> Result<Vec<LineLayout>, LayoutError> {
        let items =
            Itemizer::new(self.measurer, self.math, self.options).itemize(children, style)?;
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let breaks = break_paragraph(
            &items,
            LineWidths::constant(width),
            &self.options.line_breaking,
            self.measurer,
        );
        let font = style.resolve(self.measurer)?;
        let metrics = self.measurer.fonts().metrics(font, style.size);
        Ok(build_lines(
            &breaks,
            self.line_height(style.size),
            metrics.ascent,
            metrics.descent,
            0.0,
            center.then_some(width),
        ))
    }

    fn push(&mut self, block: MeasuredBlock) {
        self.blocks.push(block);
    }

    fn collect_block(&mut self, node: &BlockNode, indent: f64) -> Result<(), LayoutError> {
        let width = self.content_width() - indent;
        let typography = self.options.typography.clone();
        match node {
            BlockNode::Paragraph { children } => {
                let style = TextStyle::body(self.options);
                let lines = self.paragraph_lines(children, &style, width, false)?;
                if lines.is_empty() {
                    return Ok(());
                }
                let id = self.next_id();
                self.push(MeasuredBlock {
                    id,
                    kind: BlockKind::Paragraph,
                    x: indent,
                    width,
                    spacing_before: typography.paragraph_spacing,
                    spacing_after: typography.paragraph_spacing,
                    keep_with_next: false,
                    keep_together: false,
                    breakable: true,
                    content: MeasuredContent::Lines {
                        lines,
                        background: None,
                    },
                });
            }
            BlockNode::Heading { level, children } => {
                let style = TextStyle::heading(self.options, level.get());
                let lines = self.paragraph_lines(children, &style, width, false)?;
                if lines.is_empty() {
                    return Ok(());
                }
                let id = self.next_id();
                self.push(MeasuredBlock {
                    id,
                    kind: BlockKind::Heading(level.get()),
                    x: indent,
                    width,
                    spacing_before: typography.heading_spacing_before,
                    spacing_after: typography.heading_spacing_after,
                    keep_with_next: true,
                    keep_together: true,
                    breakable: false,
                    content: MeasuredContent::Lines {
                        lines,
                        background: None,
                    },
                });
            }
            BlockNode::List {
                ordered,
                start,
                items,
            } => {
                for (index, item) in items.iter().enumerate() {
                    let marker = if *ordered {
                        format!("{}.", start + index as u64)
                    } else {
                        "\u{2022}".to_owned()
                    };
                    self.collect_list_item(item, &marker, indent)?;
                }
            }
            BlockNode::Table { rows, alignments } => {
                if rows.is_empty() {
                    return Ok(());
                }
                let id = self.next_id();
                let (table_rows, col_edges) = table::layout_table(
                    self.measurer,
                    self.math,
                    self.options,
                    rows,
                    alignments,
                    width,
                )?;
                self.push(MeasuredBlock {
                    id,
                    kind: BlockKind::Table,
                    x: indent,
                    width,
                    spacing_before: typography.paragraph_spacing,
                    spacing_after: typography.paragraph_spacing,
                    keep_with_next: false,
                    keep_together: false,
                    breakable: true,
                    content: MeasuredContent::Table {
                        rows: table_rows,
                        col_edges,
                    },
                });
            }
            BlockNode::CodeBlock { text, .. } => {
                let style = TextStyle::mono(self.options);
                let font = style.resolve(self.measurer)?;
                let metrics = self.measurer.fonts().metrics(font, style.size);
                let line_height = self.line_height(style.size);
                let mut lines = Vec::new();
                let mut y = 0.0;
                for source_line in text.lines() {
                    let mut items = Vec::new();
                    let mut line_width = 0.0;
                    if !source_line.is_empty() {
                        let run = self.measurer.run(
                            source_line,
                            font,
                            style.size,
                            style.color,
                            style.decorations,
                        );
                        line_width = run.width;
                        items.push(PositionedItem {
                            x: 0.0,
                            item: InlineItem::Run(run),
                        });
                    }
                    let leading = (line_height - metrics.ascent - metrics.descent).max(0.0);
                    lines.push(LineLayout {
                        x: CODE_PADDING,
                        baseline: y + leading / 2.0 + metrics.ascent,
                        width: line_width,
                        ascent: metrics.ascent,
                        descent: metrics.descent,
                        leading,
                        ratio: 0.0,
                        items,
                    });
                    y += line_height;
                }
                if lines.is_empty() {
                    return Ok(());
                }
                let id = self.next_id();
                self.push(MeasuredBlock {
                    id,
                    kind: BlockKind::CodeBlock,
                    x: indent,
                    width,
                    spacing_before: typography.paragraph_spacing,
                    spacing_after: typography.paragraph_spacing,
                    keep_with_next: false,
                    keep_together: false,
                    breakable: true,
                    content: MeasuredContent::Lines {
                        lines,
                        background: Some(typography.code_background),
                    },
                });
            }
            BlockNode::MathBlock { source } => {
                let math = self.math.measure(source, MathMode::Display)?;
                let id = self.next_id();
                self.push(MeasuredBlock {
                    id,
                    kind: BlockKind::MathDisplay,
                    x: indent,
                    width,
                    spacing_before: typography.paragraph_spacing,
                    spacing_after: typography.paragraph_spacing,
                    keep_with_next: false,
                    keep_together: true,
                    breakable: false,
                    content: MeasuredContent::Math {
                        math,
                        x: ((width - math.width) / 2.0).max(0.0),
                    },
                });
            }
            BlockNode::ThematicBreak => {
                let id = self.next_id();
                self.push(MeasuredBlock {
                    id,
                    kind: BlockKind::Rule,
                    x: indent,
                    width,
                    spacing_before: 2.0 * typography.paragraph_spacing,
                    spacing_after: 2.0 * typography.paragraph_spacing,
                    keep_with_next: false,
                    keep_together: false,
                    breakable: false,
                    content: MeasuredContent::Rule(RuleBox {
                        width,
                        height: 0.75,
                        color: typography.rule_color,
                    }),
                });
            }
            BlockNode::Figure { image, caption } => {
                if image.width <= 0.0 || image.height <= 0.0 {
                    return Err(LayoutError::MissingImage {
                        handle: image.handle,
                    });
                }
                let style = TextStyle::body(self.options);
                let caption_lines = self.paragraph_lines(caption, &style, width, true)?;
                let caption_top = if caption_lines.is_empty() {
                    image.height
                } else {
                    image.height + CAPTION_GAP
                };
                let id = self.next_id();
                self.push(MeasuredBlock {
                    id,
                    kind: BlockKind::Figure,
                    x: indent,
                    width,
                    spacing_before: typography.paragraph_spacing,
                    spacing_after: typography.paragraph_spacing,
                    keep_with_next: false,
                    keep_together: true,
                    breakable: false,
                    content: MeasuredContent::Figure {
                        image: *image,
                        image_x: ((width - image.width) / 2.0).max(0.0),
                        caption_top,
                        caption: caption_lines,
                    },
                });
            }
        }
        Ok(())
    }

    fn collect_list_item(
        &mut self,
        item: &ListItem,
        marker: &str,
        indent: f64,
    ) -> Result<(), LayoutError> {
        let typography = self.options.typography.clone();
        let gutter = typography.list_gutter;
        let item_indent = indent + typography.list_indent;
        let width = self.content_width() - item_indent - gutter;
        let mut first = true;
        for node in &item.blocks {
            match node {
                BlockNode::Paragraph { children } if first => {
                    first = false;
                    let style = TextStyle::body(self.options);
                    let mut lines = self.paragraph_lines(children, &style, width, false)?;
                    // The marker shares the first baseline, hanging in the
                    // gutter to the left of the item's text.
                    let font = style.resolve(self.measurer)?;
                    let marker_run = self.measurer.run(
                        marker,
                        font,
                        style.size,
                        typography.text_color,
                        crate::element::Decorations::none(),
                    );
                    if lines.is_empty() {
                        let metrics = self.measurer.fonts().metrics(font, style.size);
                        let line_height = self.line_height(style.size);
                        let leading =
                            (line_height - metrics.ascent - metrics.descent).max(0.0);
                        lines.push(LineLayout {
                            x: gutter,
                            baseline: leading / 2.0 + metrics.ascent,
                            width: 0.0,
                            ascent: metrics.ascent,
                            descent: metrics.descent,
                            leading,
                            ratio: 0.0,
                            items: Vec::new(),
                        });
                    }
                    for line in &mut lines {
                        line.x = gutter;
                    }
                    lines[0].items.insert(
                        0,
                        PositionedItem {
                            x: -gutter,
                            item: InlineItem::Run(marker_run),
                        },
                    );
                    let id = self.next_id();
                    self.push(MeasuredBlock {
                        id,
                        kind: BlockKind::ListItem,
                        x: item_indent,
                        width: width + gutter,
                        spacing_before: typography.paragraph_spacing / 2.0,
                        spacing_after: typography.paragraph_spacing / 2.0,
                        keep_with_next: false,
                        keep_together: false,
                        breakable: true,
                        content: MeasuredContent::Lines {
                            lines,
                            background: None,
                        },
                    });
                }
                other => {
                    first = false;
                    self.collect_block(other, item_indent + gutter)?;
                }
            }
        }
        Ok(())
    }
}

/// Walks the document and measures every block at the content width.
pub fn collect(
    document: &Document,
    measurer: &mut Measurer<'_>,
    math: &dyn MathEngine,
    options: &LayoutOptions,
) -> Result<Plan, LayoutError> {
    let mut collector = Collector {
        measurer,
        math,
        options,
        blocks: Vec::new(),
        next_id: 0,
    };
    for node in &document.blocks {
        collector.collect_block(node, 0.0)?;
    }
    Ok(Plan {
        blocks: collector.blocks,
    })
}

/// Pours a plan onto pages with no placement constraints.
pub fn place(plan: &Plan, options: &LayoutOptions) -> LayoutState {
    place_with_meta(plan, HashMap::new(), options)
}

/// Pours a plan onto pages, honoring per-block constraints.
pub(crate) fn place_with_meta(
    plan: &Plan,
    meta: HashMap<BlockId, BlockMeta>,
    options: &LayoutOptions,
) -> LayoutState {
    let page_size = Size::new(options.page.width, options.page.height);
    let margins = options.page.margins;
    let mut pages = vec![PageLayout::new(0, page_size, margins)];
    let content = pages[0].content_rect();
    let mut cursor = Cursor {
        page: 0,
        y: content.top(),
    };
    let mut prev_after = 0.0;

    for block in &plan.blocks {
        let constraints = meta
            .get(&block.id)
            .map(|m| m.constraints.clone())
            .unwrap_or_default();
        place_block(
            block,
            &constraints,
            options,
            &mut pages,
            &mut cursor,
            &mut prev_after,
        );
    }

    LayoutState {
        pages,
        cursor,
        iteration: 0,
        violations: Vec::new(),
        meta,
    }
}

fn new_page(pages: &mut Vec<PageLayout>, cursor: &mut Cursor, prev_after: &mut f64) {
    let template = &pages[0];
    let page = PageLayout::new(pages.len(), template.size, template.margins);
    cursor.page = page.index;
    cursor.y = page.content_rect().top();
    pages.push(page);
    *prev_after = 0.0;
}

fn place_block(
    block: &MeasuredBlock,
    constraints: &BlockConstraints,
    options: &LayoutOptions,
    pages: &mut Vec<PageLayout>,
    cursor: &mut Cursor,
    prev_after: &mut f64,
) {
    let content = pages[0].content_rect();

    if constraints.break_before && !pages[cursor.page].blocks.is_empty() {
        new_page(pages, cursor, prev_after);
    }

    let units = block.content.units();
    let mut next_unit = 0;
    let mut first_fragment = true;

    loop {
        let at_top = pages[cursor.page].blocks.is_empty();
        let gap = if at_top {
            0.0
        } else {
            prev_after.max(block.spacing_before) + constraints.extra_spacing_before
        };
        let top = cursor.y + gap;
        let avail = content.bottom() - top;

        // Height of everything still to place.
        let remaining_height = if units == 0 {
            block.content.height()
        } else {
            (next_unit..units)
                .map(|i| block.content.unit_height(i))
                .sum::<f64>()
                + block.content.fragment_overhead()
        };

        if remaining_height <= avail + EPSILON {
            // The rest fits on this page.
            let range = next_unit..units;
            emit_fragment(
                block, range, top, options, pages, cursor, first_fragment, false,
            );
            *prev_after = block.spacing_after;
            return;
        }

        if block.breakable && units > 0 {
            let mut take = 0;
            let mut used = block.content.fragment_overhead();
            while next_unit + take < units {
                let h = block.content.unit_height(next_unit + take);
                if used + h > avail + EPSILON {
                    break;
                }
                used += h;
                take += 1;
            }
            if first_fragment {
                if let Some(cap) = constraints.first_take {
                    take = take.min(cap.max(1));
                }
            }
            if take == 0 {
                if at_top {
                    // Even a single unit overflows an empty page; place it
                    // anyway so placement always progresses.
                    take = 1;
                } else {
                    new_page(pages, cursor, prev_after);
                    continue;
                }
            }
            let range = next_unit..next_unit + take;
            emit_fragment(block, range, top, options, pages, cursor, first_fragment, true);
            next_unit += take;
            first_fragment = false;
            new_page(pages, cursor, prev_after);
            if next_unit >= units {
                // Possible when the cap forced a final short fragment.
                *prev_after = block.spacing_after;
                return;
            }
            continue;
        }

        // Unbreakable and does not fit.
        if at_top {
            // Taller than a page: place it anyway; the overflow rule will
            // report it.
            emit_fragment(
                block,
                0..units,
                top,
                options,
                pages,
                cursor,
                first_fragment,
                false,
            );
            *prev_after = block.spacing_after;
            return;
        }
        new_page(pages, cursor, prev_after);
    }
}

fn emit_fragment(
    block: &MeasuredBlock,
    range: Range<usize>,
    top: f64,
    options: &LayoutOptions,
    pages: &mut [PageLayout],
    cursor: &mut Cursor,
    first_fragment: bool,
    continues: bool,
) {
    let content_rect = pages[0].content_rect();
    let (content, height) = block.content.fragment(range, options);
    let bounds = Rect::new(content_rect.left() + block.x, top, block.width, height);
    let page = &mut pages[cursor.page];
    page.blocks.push(BlockLayout {
        id: block.id,
        kind: block.kind,
        bounds,
        content,
        keep_with_next: block.keep_with_next,
        keep_together: block.keep_together,
        breakable: block.breakable,
        spacing_before: block.spacing_before,
        spacing_after: block.spacing_after,
        continued: !first_fragment,
        continues,
    });
    cursor.y = bounds.bottom();
}
