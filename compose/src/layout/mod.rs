// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The paginated layout model.
//!
//! The layout graph is a tree: pages own blocks, blocks own lines, lines own
//! positioned items. Back-references are expressed as [`BlockId`]s, never as
//! owning references. A [`LayoutState`] is an immutable snapshot of the
//! whole document; the solver clones it once per iteration and the output
//! adapter consumes the final clone.

use hashbrown::HashMap;
use peniko::Color;

use crate::document::{ImageSource, MathBox};
use crate::element::{InlineItem, RuleBox, TextRun};
use crate::geometry::{Insets, Rect, Size};
use crate::solve::{Adjustment, Violation};

/// Identity of a source block, stable across solver iterations and page
/// moves. Fragments of a split block share the id.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BlockId(pub u32);

/// An item positioned within a line, `x` relative to the line's start.
#[derive(Clone, PartialEq, Debug)]
pub struct PositionedItem {
    pub x: f64,
    pub item: InlineItem,
}

/// One laid-out line.
///
/// `x` is the line's offset from the block's left edge; `baseline` is
/// measured from the block fragment's top edge.
#[derive(Clone, PartialEq, Debug)]
pub struct LineLayout {
    pub x: f64,
    pub baseline: f64,
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
    /// Extra vertical space distributed around this line by the line-height
    /// factor.
    pub leading: f64,
    /// Adjustment ratio its glue was set with.
    pub ratio: f64,
    pub items: Vec<PositionedItem>,
}

impl LineLayout {
    /// Height of the line box.
    pub fn height(&self) -> f64 {
        self.ascent + self.descent + self.leading
    }

    /// Iterates the text runs on the line.
    pub fn runs(&self) -> impl Iterator<Item = (&PositionedItem, &TextRun)> {
        self.items.iter().filter_map(|item| match &item.item {
            InlineItem::Run(run) => Some((item, run)),
            _ => None,
        })
    }
}

/// Structural kind of a block layout.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    ListItem,
    Table,
    CodeBlock,
    MathDisplay,
    Rule,
    /// A figure is the container case: image plus caption kept together.
    Figure,
}

/// A filled or stroked rectangle positioned relative to its block.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct PlacedRule {
    pub rect: Rect,
    pub color: Color,
}

/// One table cell: lines positioned relative to the cell's top-left.
#[derive(Clone, PartialEq, Debug)]
pub struct CellLayout {
    pub x: f64,
    pub width: f64,
    pub lines: Vec<LineLayout>,
}

/// One table row, `y` relative to the block fragment's top.
#[derive(Clone, PartialEq, Debug)]
pub struct TableRowLayout {
    pub y: f64,
    pub height: f64,
    pub cells: Vec<CellLayout>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct TableLayout {
    pub rows: Vec<TableRowLayout>,
    /// Cell borders, relative to the block fragment.
    pub borders: Vec<PlacedRule>,
}

/// Content of one block fragment.
#[derive(Clone, PartialEq, Debug)]
pub enum BlockContent {
    /// Paragraph-like content: headings, paragraphs, list items, code.
    Lines {
        lines: Vec<LineLayout>,
        /// Filled behind the fragment (code blocks).
        background: Option<Color>,
    },
    Table(TableLayout),
    Rule(RuleBox),
    /// A display formula, horizontally offset within the block.
    Math { math: MathBox, x: f64 },
    Figure {
        image: ImageSource,
        image_x: f64,
        caption_top: f64,
        caption: Vec<LineLayout>,
    },
}

/// A placed fragment of a source block.
#[derive(Clone, PartialEq, Debug)]
pub struct BlockLayout {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Absolute bounds on the page, in the top-origin design space.
    pub bounds: Rect,
    pub content: BlockContent,
    pub keep_with_next: bool,
    pub keep_together: bool,
    pub breakable: bool,
    pub spacing_before: f64,
    pub spacing_after: f64,
    /// True if an earlier fragment of the same block sits on a previous
    /// page.
    pub continued: bool,
    /// True if a later fragment follows on the next page.
    pub continues: bool,
}

impl BlockLayout {
    /// Number of lines in this fragment, zero for non-text content.
    pub fn line_count(&self) -> usize {
        match &self.content {
            BlockContent::Lines { lines, .. } => lines.len(),
            BlockContent::Figure { caption, .. } => caption.len(),
            BlockContent::Table(table) => {
                table
                    .rows
                    .iter()
                    .map(|row| row.cells.iter().map(|c| c.lines.len()).max().unwrap_or(0))
                    .sum()
            }
            _ => 0,
        }
    }
}

/// One page: geometry plus the blocks placed on it, in document order.
#[derive(Clone, PartialEq, Debug)]
pub struct PageLayout {
    pub index: usize,
    pub size: Size,
    pub margins: Insets,
    pub blocks: Vec<BlockLayout>,
}

impl PageLayout {
    pub fn new(index: usize, size: Size, margins: Insets) -> Self {
        Self {
            index,
            size,
            margins,
            blocks: Vec::new(),
        }
    }

    /// The page area inside the margins.
    pub fn content_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.size.width, self.size.height).inset(self.margins)
    }

    /// Vertical extent consumed by the placed blocks.
    pub fn used_height(&self) -> f64 {
        let content = self.content_rect();
        self.blocks
            .iter()
            .map(|block| block.bounds.bottom() - content.top())
            .fold(0.0, f64::max)
    }
}

/// Layout cursor: index of the page being filled and the `y` the next block
/// would be placed at.
#[derive(Copy, Clone, PartialEq, Default, Debug)]
pub struct Cursor {
    pub page: usize,
    pub y: f64,
}

/// Placement constraints accumulated on a block by solver adjustments.
#[derive(Clone, PartialEq, Default, Debug)]
pub(crate) struct BlockConstraints {
    /// Start the block on a fresh page.
    pub(crate) break_before: bool,
    /// Additional spacing inserted before the block.
    pub(crate) extra_spacing_before: f64,
    /// For breakable blocks: cap on the number of lines the first fragment
    /// keeps before deferring to the next page.
    pub(crate) first_take: Option<usize>,
}

/// Per-block record of constraints and the adjustments that produced them.
#[derive(Clone, PartialEq, Default, Debug)]
pub(crate) struct BlockMeta {
    pub(crate) constraints: BlockConstraints,
    /// Anti-thrash record: adjustments already applied to this block.
    pub(crate) applied: Vec<Adjustment>,
}

/// Immutable snapshot of the paginated document.
///
/// Produced by the block layout generator, refined by the constraint
/// solver, consumed once by the output adapter.
#[derive(Clone, Default, Debug)]
pub struct LayoutState {
    pub pages: Vec<PageLayout>,
    pub cursor: Cursor,
    /// Solver iterations already spent on this state.
    pub iteration: u32,
    /// Residual violations after solving; empty until the solver runs.
    pub violations: Vec<Violation>,
    pub(crate) meta: HashMap<BlockId, BlockMeta>,
}

impl LayoutState {
    /// Iterates all block fragments with their page index, in order.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, &BlockLayout)> {
        self.pages
            .iter()
            .flat_map(|page| page.blocks.iter().map(move |block| (page.index, block)))
    }

    /// All fragments of one block, in page order.
    pub fn fragments_of(&self, id: BlockId) -> impl Iterator<Item = (usize, &BlockLayout)> {
        self.blocks().filter(move |(_, block)| block.id == id)
    }

    /// Total line count of a block across fragments.
    pub fn total_lines(&self, id: BlockId) -> usize {
        self.fragments_of(id)
            .map(|(_, block)| block.line_count())
            .sum()
    }

    pub(crate) fn meta_mut(&mut self, id: BlockId) -> &mut BlockMeta {
        self.meta.entry(id).or_default()
    }

    /// Whether the exact adjustment was already applied to its block.
    pub(crate) fn already_applied(&self, id: BlockId, adjustment: &Adjustment) -> bool {
        self.meta
            .get(&id)
            .is_some_and(|meta| meta.applied.contains(adjustment))
    }
}
