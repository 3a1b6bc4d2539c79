// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapter behavior: coordinate conversion and call-sequence determinism.

use compose::config::LayoutOptions;
use compose::document::{
    BlockNode, Document, HeadingLevel, ImageSource, InlineNode, ListItem,
};
use compose::layout_document;
use compose_draw::{render, DrawCommand, Origin, Recorder};
use compose_metrics::synthetic;
use compose::document::NoMath;

fn text(words: &str) -> Vec<InlineNode> {
    vec![InlineNode::Text(words.to_owned())]
}

fn document() -> Document {
    let mut body = String::new();
    for _ in 0..30 {
        body.push_str("pack my box with five dozen liquor jugs and watch it balance ");
    }
    Document::new(vec![
        BlockNode::Heading {
            level: HeadingLevel::new(2),
            children: text("Rendering"),
        },
        BlockNode::Paragraph {
            children: text(body.trim_end()),
        },
        BlockNode::List {
            ordered: false,
            start: 1,
            items: vec![ListItem {
                blocks: vec![BlockNode::Paragraph {
                    children: text("an item"),
                }],
            }],
        },
        BlockNode::Figure {
            image: ImageSource {
                handle: 9,
                width: 100.0,
                height: 80.0,
            },
            caption: text("caption"),
        },
    ])
}

#[test]
fn rendering_twice_is_element_wise_identical() {
    let fonts = synthetic::library();
    let state_a =
        layout_document(&document(), &fonts, &NoMath, LayoutOptions::default()).unwrap();
    let state_b =
        layout_document(&document(), &fonts, &NoMath, LayoutOptions::default()).unwrap();

    let mut first = Recorder::new();
    let mut second = Recorder::new();
    render(&state_a, &mut first, Origin::BottomLeft);
    render(&state_b, &mut second, Origin::BottomLeft);

    assert_eq!(first.commands.len(), second.commands.len());
    for (a, b) in first.commands.iter().zip(&second.commands) {
        assert_eq!(a, b);
    }
}

#[test]
fn page_structure_brackets_every_page() {
    let fonts = synthetic::library();
    let state =
        layout_document(&document(), &fonts, &NoMath, LayoutOptions::default()).unwrap();
    let mut recorder = Recorder::new();
    render(&state, &mut recorder, Origin::TopLeft);

    assert_eq!(recorder.page_count(), state.pages.len());
    assert!(matches!(
        recorder.commands.first(),
        Some(DrawCommand::BeginPage { .. })
    ));
    assert!(matches!(recorder.commands.last(), Some(DrawCommand::EndPage)));
}

#[test]
fn bottom_origin_flips_baselines() {
    let fonts = synthetic::library();
    let doc = Document::new(vec![BlockNode::Paragraph {
        children: text("hello"),
    }]);
    let state = layout_document(&doc, &fonts, &NoMath, LayoutOptions::default()).unwrap();

    let mut top = Recorder::new();
    let mut bottom = Recorder::new();
    render(&state, &mut top, Origin::TopLeft);
    render(&state, &mut bottom, Origin::BottomLeft);

    let page_height = state.pages[0].size.height;
    let baseline_top = top
        .commands
        .iter()
        .find_map(|c| match c {
            DrawCommand::TextRun { baseline, .. } => Some(*baseline),
            _ => None,
        })
        .unwrap();
    let baseline_bottom = bottom
        .commands
        .iter()
        .find_map(|c| match c {
            DrawCommand::TextRun { baseline, .. } => Some(*baseline),
            _ => None,
        })
        .unwrap();
    assert!((baseline_top + baseline_bottom - page_height).abs() < 1e-9);

    // x positions are unaffected by the origin flip.
    let x_top = top.commands.iter().find_map(|c| match c {
        DrawCommand::TextRun { x, .. } => Some(*x),
        _ => None,
    });
    let x_bottom = bottom.commands.iter().find_map(|c| match c {
        DrawCommand::TextRun { x, .. } => Some(*x),
        _ => None,
    });
    assert_eq!(x_top, x_bottom);
}

#[test]
fn text_arrives_in_reading_order() {
    let fonts = synthetic::library();
    let doc = Document::new(vec![BlockNode::Paragraph {
        children: text("alpha beta gamma"),
    }]);
    let state = layout_document(&doc, &fonts, &NoMath, LayoutOptions::default()).unwrap();
    let mut recorder = Recorder::new();
    render(&state, &mut recorder, Origin::TopLeft);
    assert_eq!(recorder.text(), vec!["alpha", "beta", "gamma"]);
}
