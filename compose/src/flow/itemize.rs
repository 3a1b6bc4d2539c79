// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flattening inline content into a paragraph stream.
//!
//! Words become boxes, whitespace becomes glue with the standard 1/3
//! stretch and 1/6 shrink, soft breaks become break candidates, and hard
//! breaks become forced penalties. A word straddling a style change becomes
//! adjacent boxes with no glue between them, which keeps it unbreakable.

use compose_metrics::{FontAttributes, FontId, FontStyle, FontWeight};
use peniko::Color;

use crate::config::LayoutOptions;
use crate::document::{InlineNode, MathEngine, MathMode};
use crate::element::{Decorations, InlineItem};
use crate::error::LayoutError;
use crate::linebreak::Item;
use crate::measure::Measurer;

/// Resolved style for a stretch of inline content.
#[derive(Clone, Debug)]
pub(crate) struct TextStyle {
    pub(crate) family: String,
    pub(crate) attributes: FontAttributes,
    pub(crate) size: f64,
    pub(crate) color: Color,
    pub(crate) decorations: Decorations,
}

impl TextStyle {
    pub(crate) fn body(options: &LayoutOptions) -> Self {
        Self {
            family: options.typography.body_family.clone(),
            attributes: FontAttributes::normal(),
            size: options.typography.body_size,
            color: options.typography.text_color,
            decorations: Decorations::none(),
        }
    }

    pub(crate) fn heading(options: &LayoutOptions, level: u8) -> Self {
        let index = usize::from(level.clamp(1, 6)) - 1;
        Self {
            size: options.typography.heading_sizes[index],
            attributes: FontAttributes::bold(),
            ..Self::body(options)
        }
    }

    pub(crate) fn mono(options: &LayoutOptions) -> Self {
        Self {
            family: options.typography.mono_family.clone(),
            ..Self::body(options)
        }
    }

    pub(crate) fn resolve(&self, measurer: &Measurer<'_>) -> Result<FontId, LayoutError> {
        measurer
            .fonts()
            .font(&self.family, self.attributes)
            .ok_or_else(|| LayoutError::UnknownFont {
                family: self.family.clone(),
            })
    }
}

pub(crate) struct Itemizer<'m, 'f> {
    measurer: &'m mut Measurer<'f>,
    math: &'m dyn MathEngine,
    options: &'m LayoutOptions,
    items: Vec<Item>,
}

impl<'m, 'f> Itemizer<'m, 'f> {
    pub(crate) fn new(
        measurer: &'m mut Measurer<'f>,
        math: &'m dyn MathEngine,
        options: &'m LayoutOptions,
    ) -> Self {
        Self {
            measurer,
            math,
            options,
            items: Vec::new(),
        }
    }

    /// Flattens `children` under `style` and returns the paragraph stream.
    pub(crate) fn itemize(
        mut self,
        children: &[InlineNode],
        style: &TextStyle,
    ) -> Result<Vec<Item>, LayoutError> {
        self.walk(children, style)?;
        Ok(self.items)
    }

    fn walk(&mut self, children: &[InlineNode], style: &TextStyle) -> Result<(), LayoutError> {
        for child in children {
            match child {
                InlineNode::Text(text) => self.push_text(text, style)?,
                InlineNode::Emphasis(inner) => {
                    let style = TextStyle {
                        attributes: FontAttributes::new(style.attributes.weight, FontStyle::Italic),
                        ..style.clone()
                    };
                    self.walk(inner, &style)?;
                }
                InlineNode::Strong(inner) => {
                    let style = TextStyle {
                        attributes: FontAttributes::new(FontWeight::BOLD, style.attributes.style),
                        ..style.clone()
                    };
                    self.walk(inner, &style)?;
                }
                InlineNode::Strikethrough(inner) => {
                    let style = TextStyle {
                        decorations: Decorations {
                            strikethrough: true,
                            ..style.decorations
                        },
                        ..style.clone()
                    };
                    self.walk(inner, &style)?;
                }
                InlineNode::Code(inner) => {
                    let style = TextStyle {
                        family: self.options.typography.mono_family.clone(),
                        attributes: FontAttributes::normal(),
                        ..style.clone()
                    };
                    self.walk(inner, &style)?;
                }
                InlineNode::Link { children, .. } => {
                    let style = TextStyle {
                        decorations: Decorations {
                            underline: true,
                            ..style.decorations
                        },
                        ..style.clone()
                    };
                    self.walk(children, &style)?;
                }
                InlineNode::Image(image) => {
                    if image.width <= 0.0 || image.height <= 0.0 {
                        return Err(LayoutError::MissingImage {
                            handle: image.handle,
                        });
                    }
                    self.items.push(Item::Box {
                        width: image.width,
                        content: InlineItem::Image(*image),
                    });
                }
                InlineNode::MathInline { source } => {
                    let math = self.math.measure(source, MathMode::Inline)?;
                    self.items.push(Item::Box {
                        width: math.width,
                        content: InlineItem::Math(math),
                    });
                }
                InlineNode::HardBreak => {
                    self.items.push(Item::forced_break());
                }
                InlineNode::SoftBreak => {
                    // A soft break marks an explicit break candidate and
                    // still renders as an inter-word space.
                    if matches!(self.items.last(), Some(Item::Box { .. })) {
                        self.items.push(Item::Penalty {
                            width: 0.0,
                            cost: 0.0,
                            flagged: false,
                        });
                    }
                    self.push_space(style)?;
                }
            }
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str, style: &TextStyle) -> Result<(), LayoutError> {
        let font = style.resolve(self.measurer)?;
        let mut rest = text;
        while !rest.is_empty() {
            if rest.starts_with(char::is_whitespace) {
                rest = rest.trim_start();
                self.push_space(style)?;
                continue;
            }
            let end = rest
                .find(char::is_whitespace)
                .unwrap_or(rest.len());
            let (word, tail) = rest.split_at(end);
            let run = self
                .measurer
                .run(word, font, style.size, style.color, style.decorations);
            self.items.push(Item::Box {
                width: run.width,
                content: InlineItem::Run(run),
            });
            rest = tail;
        }
        Ok(())
    }

    fn push_space(&mut self, style: &TextStyle) -> Result<(), LayoutError> {
        // Coalesce runs of whitespace into one glue.
        if matches!(self.items.last(), Some(Item::Glue { .. })) {
            return Ok(());
        }
        let font = style.resolve(self.measurer)?;
        let width = self.measurer.space_width(font, style.size);
        self.items.push(Item::space(width));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NoMath;
    use compose_metrics::synthetic;

    fn itemize(children: &[InlineNode]) -> Vec<Item> {
        let fonts = synthetic::library();
        let mut measurer = Measurer::new(&fonts, 64);
        let options = LayoutOptions::default();
        let style = TextStyle::body(&options);
        Itemizer::new(&mut measurer, &NoMath, &options)
            .itemize(children, &style)
            .unwrap()
    }

    #[test]
    fn words_and_spaces_alternate() {
        let items = itemize(&[InlineNode::Text("one two three".to_owned())]);
        assert_eq!(items.len(), 5);
        assert!(matches!(items[0], Item::Box { .. }));
        assert!(matches!(items[1], Item::Glue { .. }));
        assert!(matches!(items[2], Item::Box { .. }));
    }

    #[test]
    fn glue_has_standard_flexibility() {
        let items = itemize(&[InlineNode::Text("a b".to_owned())]);
        let Item::Glue {
            width,
            stretch,
            shrink,
        } = items[1]
        else {
            panic!("expected glue between words");
        };
        assert!((stretch - width / 3.0).abs() < 1e-9);
        assert!((shrink - width / 6.0).abs() < 1e-9);
    }

    #[test]
    fn styled_span_does_not_split_a_word() {
        // "foo" + emphasized "bar" with no space stays unbreakable: two
        // adjacent boxes, no glue.
        let items = itemize(&[
            InlineNode::Text("foo".to_owned()),
            InlineNode::Emphasis(vec![InlineNode::Text("bar".to_owned())]),
        ]);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| matches!(item, Item::Box { .. })));
    }

    #[test]
    fn hard_break_forces_a_break() {
        let items = itemize(&[
            InlineNode::Text("a".to_owned()),
            InlineNode::HardBreak,
            InlineNode::Text("b".to_owned()),
        ]);
        assert!(matches!(
            items[1],
            Item::Penalty { cost, .. } if cost == f64::NEG_INFINITY
        ));
    }

    #[test]
    fn soft_break_marks_a_candidate_and_a_space() {
        let items = itemize(&[
            InlineNode::Text("a".to_owned()),
            InlineNode::SoftBreak,
            InlineNode::Text("b".to_owned()),
        ]);
        assert_eq!(items.len(), 4);
        assert!(matches!(
            items[1],
            Item::Penalty { cost, flagged: false, .. } if cost == 0.0
        ));
        assert!(matches!(items[2], Item::Glue { .. }));
    }

    #[test]
    fn link_text_is_underlined() {
        let items = itemize(&[InlineNode::Link {
            url: "https://example.com".to_owned(),
            children: vec![InlineNode::Text("here".to_owned())],
        }]);
        let Item::Box {
            content: InlineItem::Run(run),
            ..
        } = &items[0]
        else {
            panic!("expected a run");
        };
        assert!(run.decorations.underline);
    }
}
