// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Universal invariants and boundary behavior on real documents.

use compose::config::LayoutOptions;
use compose::document::{
    BlockNode, ColumnAlignment, Document, HeadingLevel, ImageSource, InlineNode, ListItem,
    MathBox, MathEngine, MathMode, TableRow,
};
use compose::error::LayoutError;
use compose::flow::{collect, place, MeasuredBlock, MeasuredContent, Plan};
use compose::geometry::EPSILON;
use compose::layout::{BlockContent, BlockId, BlockKind, LineLayout};
use compose::solve::{solve, RuleId};
use compose::{layout_document, Measurer};
use compose_metrics::synthetic;

/// A stub math engine: every formula measures as a fixed box.
struct FixedMath;

impl MathEngine for FixedMath {
    fn measure(&self, _source: &str, mode: MathMode) -> Result<MathBox, LayoutError> {
        let (width, height) = match mode {
            MathMode::Inline => (30.0, 12.0),
            MathMode::Display => (120.0, 40.0),
        };
        Ok(MathBox {
            width,
            height,
            ascent: height * 0.7,
            descent: height * 0.3,
            handle: 7,
        })
    }
}

fn text(words: &str) -> Vec<InlineNode> {
    vec![InlineNode::Text(words.to_owned())]
}

fn long_paragraph(sentences: usize) -> BlockNode {
    let mut body = String::new();
    for _ in 0..sentences {
        body.push_str("the quick brown fox jumps over the lazy dog near the river bank ");
    }
    BlockNode::Paragraph {
        children: text(body.trim_end()),
    }
}

fn sample_document() -> Document {
    Document::new(vec![
        BlockNode::Heading {
            level: HeadingLevel::new(1),
            children: text("A Study of Page Breaking"),
        },
        long_paragraph(8),
        BlockNode::List {
            ordered: true,
            start: 1,
            items: vec![
                ListItem {
                    blocks: vec![BlockNode::Paragraph {
                        children: text("first item with enough words to wrap onto another line"),
                    }],
                },
                ListItem {
                    blocks: vec![BlockNode::Paragraph {
                        children: text("second item"),
                    }],
                },
            ],
        },
        BlockNode::CodeBlock {
            language: Some("rust".to_owned()),
            text: "fn main() {\n    println!(\"hi\");\n}".to_owned(),
        },
        BlockNode::Table {
            rows: vec![
                TableRow {
                    cells: vec![text("name"), text("value")],
                    header: true,
                },
                TableRow {
                    cells: vec![text("alpha"), text("one")],
                    header: false,
                },
            ],
            alignments: vec![ColumnAlignment::Left, ColumnAlignment::Right],
        },
        BlockNode::MathBlock {
            source: "e = mc^2".to_owned(),
        },
        BlockNode::ThematicBreak,
        BlockNode::Figure {
            image: ImageSource {
                handle: 3,
                width: 200.0,
                height: 120.0,
            },
            caption: text("a figure caption"),
        },
        long_paragraph(20),
    ])
}

#[test]
fn empty_document_is_one_empty_page() {
    let fonts = synthetic::library();
    let state =
        layout_document(&Document::default(), &fonts, &FixedMath, LayoutOptions::default())
            .unwrap();
    assert_eq!(state.pages.len(), 1);
    assert!(state.pages[0].blocks.is_empty());
    assert!(state.violations.is_empty());
}

#[test]
fn every_block_stays_inside_the_content_rect() {
    let fonts = synthetic::library();
    let state =
        layout_document(&sample_document(), &fonts, &FixedMath, LayoutOptions::default())
            .unwrap();
    for page in &state.pages {
        let content = page.content_rect();
        for block in &page.blocks {
            let excused = state
                .violations
                .iter()
                .any(|v| v.rule == RuleId::NoOverflow && v.block == block.id);
            assert!(
                content.contains_rect(&block.bounds) || excused,
                "block {:?} on page {} escapes the content rectangle",
                block.id,
                page.index
            );
        }
    }
}

#[test]
fn paragraph_height_equals_sum_of_line_heights() {
    let fonts = synthetic::library();
    let state =
        layout_document(&sample_document(), &fonts, &FixedMath, LayoutOptions::default())
            .unwrap();
    let mut checked = 0;
    for (_, block) in state.blocks() {
        if let BlockContent::Lines {
            lines,
            background: None,
        } = &block.content
        {
            let sum: f64 = lines.iter().map(LineLayout::height).sum();
            assert!(
                (block.bounds.size.height - sum).abs() < 1e-6,
                "fragment height {} != line heights {}",
                block.bounds.size.height,
                sum
            );
            checked += 1;
        }
    }
    assert!(checked > 0);
}

#[test]
fn blocks_are_emitted_in_document_order() {
    let fonts = synthetic::library();
    let state =
        layout_document(&sample_document(), &fonts, &FixedMath, LayoutOptions::default())
            .unwrap();
    let ids: Vec<u32> = state.blocks().map(|(_, block)| block.id.0).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
}

#[test]
fn margin_collapsing_takes_the_larger_spacing() {
    fn short_block(id: u32, after: f64, before: f64) -> MeasuredBlock {
        MeasuredBlock {
            id: BlockId(id),
            kind: BlockKind::Paragraph,
            x: 0.0,
            width: 468.0,
            spacing_before: before,
            spacing_after: after,
            keep_with_next: false,
            keep_together: false,
            breakable: true,
            content: MeasuredContent::Lines {
                lines: vec![LineLayout {
                    x: 0.0,
                    baseline: 10.0,
                    width: 100.0,
                    ascent: 10.0,
                    descent: 2.0,
                    leading: 2.4,
                    ratio: 0.0,
                    items: Vec::new(),
                }],
                background: None,
            },
        }
    }

    let plan = Plan {
        blocks: vec![short_block(0, 10.0, 0.0), short_block(1, 0.0, 4.0)],
    };
    let state = place(&plan, &LayoutOptions::default());
    let blocks = &state.pages[0].blocks;
    let gap = blocks[1].bounds.top() - blocks[0].bounds.bottom();
    assert!(
        (gap - 10.0).abs() < EPSILON,
        "gap must be max(10, 4) = 10, found {gap}"
    );
}

#[test]
fn exactly_full_page_has_no_violations() {
    // 45 lines at 14.4pt fill the 648pt content box to the last point.
    let fonts = synthetic::library();
    let mut measurer = Measurer::new(&fonts, 256);
    let options = LayoutOptions::default();
    let document = Document::new(vec![long_paragraph(80)]);
    let plan = collect(&document, &mut measurer, &FixedMath, &options).unwrap();

    let mut plan = plan;
    if let MeasuredContent::Lines { lines, .. } = &mut plan.blocks[0].content {
        lines.truncate(45);
    }
    let state = solve(&plan, place(&plan, &options), &options).unwrap();
    assert_eq!(state.pages.len(), 1);
    assert!(state.violations.is_empty());
    let block = &state.pages[0].blocks[0];
    let content = state.pages[0].content_rect();
    assert!((block.bounds.bottom() - content.bottom()).abs() < 1e-6);
}

#[test]
fn overwide_table_shrinks_to_the_measure() {
    let fonts = synthetic::library();
    let long_cell = "a very long header cell with many words that would naturally be wide";
    let document = Document::new(vec![BlockNode::Table {
        rows: vec![
            TableRow {
                cells: vec![text(long_cell), text(long_cell), text(long_cell)],
                header: true,
            },
            TableRow {
                cells: vec![text("a"), text("b"), text("c")],
                header: false,
            },
        ],
        alignments: vec![ColumnAlignment::Left; 3],
    }]);
    let state =
        layout_document(&document, &fonts, &FixedMath, LayoutOptions::default()).unwrap();
    assert!(!state
        .violations
        .iter()
        .any(|v| v.rule == RuleId::NoOverflow));
    for (_, block) in state.blocks() {
        if let BlockContent::Table(table) = &block.content {
            for row in &table.rows {
                for cell in &row.cells {
                    assert!(cell.x + cell.width <= block.bounds.size.width + EPSILON);
                }
            }
        }
    }
}

#[test]
fn solving_a_solved_state_changes_nothing() {
    let fonts = synthetic::library();
    let mut measurer = Measurer::new(&fonts, 256);
    let options = LayoutOptions::default();
    let document = sample_document();
    let plan = collect(&document, &mut measurer, &FixedMath, &options).unwrap();
    let first = solve(&plan, place(&plan, &options), &options).unwrap();
    let second = solve(&plan, first.clone(), &options).unwrap();
    assert_eq!(first.pages, second.pages);
    assert_eq!(first.violations, second.violations);
}

#[test]
fn identical_inputs_produce_identical_states() {
    let fonts = synthetic::library();
    let document = sample_document();
    let a = layout_document(&document, &fonts, &FixedMath, LayoutOptions::default()).unwrap();
    let b = layout_document(&document, &fonts, &FixedMath, LayoutOptions::default()).unwrap();
    assert_eq!(a.pages, b.pages);
    assert_eq!(a.violations, b.violations);
}

#[test]
fn unknown_font_family_aborts_the_build() {
    let fonts = synthetic::library();
    let mut options = LayoutOptions::default();
    options.typography.body_family = "No Such Family".to_owned();
    let err = layout_document(&Document::default(), &fonts, &FixedMath, options).unwrap_err();
    assert!(matches!(err, LayoutError::UnknownFont { .. }));
}

#[test]
fn markers_share_the_first_baseline() {
    let fonts = synthetic::library();
    let document = Document::new(vec![BlockNode::List {
        ordered: false,
        start: 1,
        items: vec![ListItem {
            blocks: vec![BlockNode::Paragraph {
                children: text("bullet item text"),
            }],
        }],
    }]);
    let state =
        layout_document(&document, &fonts, &FixedMath, LayoutOptions::default()).unwrap();
    let (_, block) = state
        .blocks()
        .find(|(_, b)| b.kind == BlockKind::ListItem)
        .expect("list item block");
    let BlockContent::Lines { lines, .. } = &block.content else {
        panic!("list item should be line content");
    };
    let first = &lines[0];
    // Marker hangs left of the text: first item starts left of the second.
    assert!(first.items.len() >= 2);
    assert!(first.items[0].x < first.items[1].x);
    assert!(first.items[0].x < 0.0);
}
