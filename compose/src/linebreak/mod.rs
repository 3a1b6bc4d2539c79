// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Optimal paragraph line breaking.
//!
//! A paragraph reaches the breaker as a flat sequence of [`Item`]s: boxes
//! (unbreakable content), glue (flexible space), and penalties (marked break
//! candidates). The breaker chooses the set of breakpoints that minimizes
//! total demerits over the whole paragraph, not line by line.
//!
//! Breaking runs up to three passes: an optimal pass at the configured
//! tolerance, an emergency pass with unbounded stretch, and a final pass
//! that splits boxes wider than the line measure at character boundaries.

mod knuth;

use core::ops::Range;

use crate::config::LineBreakOptions;
use crate::element::InlineItem;
use crate::geometry::EPSILON;
use crate::measure::Measurer;

/// Forces a break when used as a penalty cost.
pub const PENALTY_FORCED: f64 = f64::NEG_INFINITY;

/// Forbids a break when used as a penalty cost.
pub const PENALTY_FORBIDDEN: f64 = f64::INFINITY;

/// One element of a paragraph stream.
#[derive(Clone, PartialEq, Debug)]
pub enum Item {
    /// Unbreakable content of fixed width.
    Box { width: f64, content: InlineItem },
    /// Flexible space: natural width, stretchability, shrinkability.
    Glue { width: f64, stretch: f64, shrink: f64 },
    /// A potential break point. `flagged` marks breaks that should not
    /// repeat on consecutive lines.
    Penalty { width: f64, cost: f64, flagged: bool },
}

impl Item {
    pub fn space(width: f64) -> Self {
        Self::Glue {
            width,
            stretch: width / 3.0,
            shrink: width / 6.0,
        }
    }

    pub fn forced_break() -> Self {
        Self::Penalty {
            width: 0.0,
            cost: PENALTY_FORCED,
            flagged: false,
        }
    }

    fn is_box(&self) -> bool {
        matches!(self, Self::Box { .. })
    }
}

/// Line measure, possibly differing between the first and later lines
/// (running indents).
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct LineWidths {
    pub first: f64,
    pub rest: f64,
}

impl LineWidths {
    pub fn constant(width: f64) -> Self {
        Self {
            first: width,
            rest: width,
        }
    }

    pub fn get(&self, line: usize) -> f64 {
        if line == 0 {
            self.first
        } else {
            self.rest
        }
    }
}

/// One chosen line: the item range it covers and the glue setting for it.
#[derive(Clone, PartialEq, Debug)]
pub struct BrokenLine {
    /// Items on the line. Glue discarded at the break is excluded.
    pub range: Range<usize>,
    /// Adjustment ratio used to set interior glue.
    pub ratio: f64,
    /// Width before glue adjustment.
    pub natural_width: f64,
    /// The measure this line was broken against.
    pub target_width: f64,
}

impl BrokenLine {
    /// Width after glue adjustment: equals the target for justified,
    /// non-terminal lines.
    pub fn set_width(&self, items: &[Item]) -> f64 {
        let (_, stretch, shrink) = totals(items, self.range.clone());
        if self.ratio >= 0.0 {
            self.natural_width + self.ratio * stretch
        } else {
            self.natural_width + self.ratio * shrink
        }
    }
}

/// Result of breaking one paragraph stream.
#[derive(Clone, Debug)]
pub struct ParagraphBreaks {
    /// The effective stream. Differs from the input only if overlong boxes
    /// had to be split.
    pub items: Vec<Item>,
    pub lines: Vec<BrokenLine>,
    /// True if the emergency or splitting pass was needed.
    pub emergency: bool,
}

/// Breaks a paragraph stream into lines against the given measure.
///
/// A final forced break is appended if the stream does not end in one.
/// Single-box paragraphs produce one line whose width may fall short of the
/// measure; that is expected and left to downstream rules.
pub fn break_paragraph(
    items: &[Item],
    widths: LineWidths,
    options: &LineBreakOptions,
    measurer: &mut Measurer<'_>,
) -> ParagraphBreaks {
    let mut stream: Vec<Item> = items.to_vec();
    if !matches!(
        stream.last(),
        Some(Item::Penalty { cost, .. }) if *cost == PENALTY_FORCED
    ) {
        stream.push(Item::forced_break());
    }

    if let Some(lines) = knuth::solve(&stream, widths, options, options.tolerance_first_pass) {
        return ParagraphBreaks {
            items: stream,
            lines,
            emergency: false,
        };
    }

    if let Some(lines) = knuth::solve(&stream, widths, options, options.tolerance_second_pass) {
        log::warn!("paragraph needed emergency stretch to break");
        return ParagraphBreaks {
            items: stream,
            lines,
            emergency: true,
        };
    }

    let max_width = widths.first.min(widths.rest);
    let split = has_overlong_boxes(&stream, max_width);
    if split {
        log::warn!("paragraph contains content wider than the measure; splitting at character boundaries");
    }
    let stream = if split {
        let mut rebuilt = Vec::with_capacity(stream.len());
        rebuild_split(&stream, max_width, measurer, &mut rebuilt);
        rebuilt
    } else {
        stream
    };

    if let Some(lines) = knuth::solve(&stream, widths, options, options.tolerance_second_pass) {
        return ParagraphBreaks {
            items: stream,
            lines,
            emergency: true,
        };
    }

    // Nothing feasible even after splitting: fit greedily and accept
    // overfull lines rather than failing the build.
    let lines = greedy_fallback(&stream, widths);
    ParagraphBreaks {
        items: stream,
        lines,
        emergency: true,
    }
}

fn has_overlong_boxes(items: &[Item], max_width: f64) -> bool {
    items.iter().any(|item| match item {
        Item::Box {
            width,
            content: InlineItem::Run(run),
        } => *width > max_width + EPSILON && run.text.chars().count() > 1,
        _ => false,
    })
}

fn rebuild_split(
    items: &[Item],
    max_width: f64,
    measurer: &mut Measurer<'_>,
    out: &mut Vec<Item>,
) {
    for item in items {
        match item {
            Item::Box {
                width,
                content: InlineItem::Run(run),
            } if *width > max_width + EPSILON && run.text.chars().count() > 1 => {
                let chars: Vec<char> = run.text.chars().collect();
                for (i, ch) in chars.iter().enumerate() {
                    let text = ch.to_string();
                    let piece = measurer.run(&text, run.font, run.size, run.color, run.decorations);
                    if i > 0 {
                        out.push(Item::Penalty {
                            width: 0.0,
                            cost: 0.0,
                            flagged: true,
                        });
                    }
                    out.push(Item::Box {
                        width: piece.width,
                        content: InlineItem::Run(piece),
                    });
                }
            }
            other => out.push(other.clone()),
        }
    }
}

/// First-fit fallback for streams the optimizer cannot break at all.
fn greedy_fallback(items: &[Item], widths: LineWidths) -> Vec<BrokenLine> {
    let mut lines = Vec::new();
    let mut start = next_content(items, 0);
    let mut x = 0.0;
    let mut i = start;
    while i < items.len() {
        let target = widths.get(lines.len());
        match &items[i] {
            Item::Box { width, .. } => {
                if x > 0.0 && x + width > target + EPSILON {
                    lines.push(fallback_line(items, start..i, target));
                    start = next_content(items, i);
                    x = 0.0;
                    continue;
                }
                x += width;
            }
            Item::Glue { width, .. } => {
                x += width;
            }
            Item::Penalty { cost, .. } => {
                if *cost == PENALTY_FORCED {
                    lines.push(fallback_line(items, start..i, target));
                    start = next_content(items, i + 1);
                    x = 0.0;
                }
            }
        }
        i += 1;
    }
    if lines.is_empty() {
        let target = widths.get(0);
        lines.push(fallback_line(items, start..items.len(), target));
    }
    lines
}

fn fallback_line(items: &[Item], range: Range<usize>, target: f64) -> BrokenLine {
    let (natural, _, _) = totals(items, range.clone());
    BrokenLine {
        range,
        ratio: 0.0,
        natural_width: natural,
        target_width: target,
    }
}

/// Index of the first box at or after `from`; leading glue and penalties are
/// discarded at a line start.
pub(crate) fn next_content(items: &[Item], from: usize) -> usize {
    let mut i = from;
    while i < items.len() && !items[i].is_box() {
        i += 1;
    }
    i
}

/// Natural width, stretch, and shrink over an item range. A penalty at the
/// range end contributes its width (a hyphen about to be rendered).
pub(crate) fn totals(items: &[Item], range: Range<usize>) -> (f64, f64, f64) {
    let mut width = 0.0;
    let mut stretch = 0.0;
    let mut shrink = 0.0;
    for item in &items[range] {
        match item {
            Item::Box { width: w, .. } => width += w,
            Item::Glue {
                width: w,
                stretch: y,
                shrink: z,
            } => {
                width += w;
                stretch += y;
                shrink += z;
            }
            Item::Penalty { .. } => {}
        }
    }
    (width, stretch, shrink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use compose_metrics::synthetic;
    use peniko::Color;

    use crate::element::Decorations;

    fn words(measurer: &mut Measurer<'_>, family: &str, text: &str, size: f64) -> Vec<Item> {
        let fonts = measurer.fonts();
        let font = fonts.font(family, Default::default()).unwrap();
        let space = measurer.space_width(font, size);
        let mut items = Vec::new();
        for (i, word) in text.split_whitespace().enumerate() {
            if i > 0 {
                items.push(Item::space(space));
            }
            let run = measurer.run(word, font, size, Color::BLACK, Decorations::none());
            items.push(Item::Box {
                width: run.width,
                content: InlineItem::Run(run),
            });
        }
        items
    }

    #[test]
    fn single_word_is_one_short_line() {
        let fonts = synthetic::library();
        let mut measurer = Measurer::new(&fonts, 64);
        let items = words(&mut measurer, synthetic::SERIF, "hello", 12.0);
        let breaks = break_paragraph(
            &items,
            LineWidths::constant(200.0),
            &LineBreakOptions::default(),
            &mut measurer,
        );
        assert_eq!(breaks.lines.len(), 1);
        assert!(!breaks.emergency);
        assert!(breaks.lines[0].natural_width < 200.0);
    }

    #[test]
    fn justified_lines_hit_the_measure() {
        let fonts = synthetic::library();
        let mut measurer = Measurer::new(&fonts, 256);
        // Fixed-pitch text makes the arithmetic exact: each four-char word
        // is 28.8pt at 12pt, each space 7.2pt, so five words per line is
        // the only feasible assignment at a 180pt measure.
        let text = "aaaa bbbb cccc dddd eeee ffff gggg hhhh iiii jjjj kkkk llll mmmm nnnn oooo";
        let items = words(&mut measurer, synthetic::MONO, text, 12.0);
        let breaks = break_paragraph(
            &items,
            LineWidths::constant(180.0),
            &LineBreakOptions::default(),
            &mut measurer,
        );
        assert_eq!(breaks.lines.len(), 3);
        assert!(!breaks.emergency);
        for line in &breaks.lines[..breaks.lines.len() - 1] {
            let set = line.set_width(&breaks.items);
            assert!(
                (set - line.target_width).abs() < 1e-6,
                "expected {} to equal {}",
                set,
                line.target_width
            );
        }
    }

    #[test]
    fn forced_break_partitions_the_stream() {
        let fonts = synthetic::library();
        let mut measurer = Measurer::new(&fonts, 64);
        let mut items = words(&mut measurer, synthetic::SERIF, "one two", 12.0);
        items.push(Item::forced_break());
        items.extend(words(&mut measurer, synthetic::SERIF, "three four", 12.0));
        let breaks = break_paragraph(
            &items,
            LineWidths::constant(400.0),
            &LineBreakOptions::default(),
            &mut measurer,
        );
        assert_eq!(breaks.lines.len(), 2);
    }

    #[test]
    fn overlong_word_is_split_with_a_warning_path() {
        let fonts = synthetic::library();
        let mut measurer = Measurer::new(&fonts, 64);
        let items = words(&mut measurer, synthetic::SERIF, "incomprehensibilities", 12.0);
        let breaks = break_paragraph(
            &items,
            LineWidths::constant(30.0),
            &LineBreakOptions::default(),
            &mut measurer,
        );
        assert!(breaks.emergency);
        assert!(breaks.lines.len() > 1);
        for line in &breaks.lines {
            assert!(line.natural_width <= 30.0 + EPSILON);
        }
    }

    #[test]
    fn ragged_first_line_uses_the_first_measure() {
        let fonts = synthetic::library();
        let mut measurer = Measurer::new(&fonts, 64);
        let items = words(
            &mut measurer,
            synthetic::SERIF,
            "alpha beta gamma delta epsilon zeta",
            12.0,
        );
        let widths = LineWidths {
            first: 90.0,
            rest: 140.0,
        };
        let breaks = break_paragraph(&items, widths, &LineBreakOptions::default(), &mut measurer);
        assert!(breaks.lines.len() > 1);
        assert_eq!(breaks.lines[0].target_width, 90.0);
        assert_eq!(breaks.lines[1].target_width, 140.0);
    }
}
