// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The Knuth-Plass dynamic program.
//!
//! For each feasible breakpoint the optimal predecessor is chosen; the
//! table entry stores the accumulated demerits of the best paragraph layout
//! ending at that breakpoint. Overfull predecessors fall out of the active
//! window, and a mandatory break deactivates everything before it, since no
//! line may span one.

use crate::config::LineBreakOptions;
use crate::linebreak::{next_content, totals, BrokenLine, Item, LineWidths, PENALTY_FORCED};

/// Ratios below this leave the feasible window entirely.
const MIN_RATIO: f64 = -1.0;

/// An entry in the dynamic programming table.
struct Entry {
    pred: usize,
    /// Item index of the break.
    pos: usize,
    /// First content index of the following line.
    resume: usize,
    /// Number of lines up to and including this break.
    line: usize,
    total: f64,
    fitness: u8,
    flagged: bool,
    /// Glue setting for the line ending here.
    ratio: f64,
    natural: f64,
    target: f64,
}

fn fitness_class(ratio: f64) -> u8 {
    if ratio < -0.5 {
        0
    } else if ratio <= 0.5 {
        1
    } else if ratio <= 1.0 {
        2
    } else {
        3
    }
}

/// Stretch ratio of a candidate line, clamped so overfull lines stay below
/// [`MIN_RATIO`] and absurdly loose lines compare equal.
fn raw_ratio(target: f64, natural: f64, stretch: f64, shrink: f64) -> f64 {
    let delta = target - natural;
    if delta.abs() < 1e-12 {
        return 0.0;
    }
    let adjustability = if delta >= 0.0 { stretch } else { shrink };
    let ratio = if adjustability > 0.0 {
        delta / adjustability
    } else if delta > 0.0 {
        f64::INFINITY
    } else {
        f64::NEG_INFINITY
    };
    ratio.clamp(MIN_RATIO - 1.0, 10.0)
}

struct Candidate {
    pred: usize,
    total: f64,
    line: usize,
    ratio: f64,
    natural: f64,
    target: f64,
    fitness: u8,
}

/// Runs the dynamic program at the given tolerance. Returns `None` if no
/// feasible breakpoint chain reaches the end of the stream.
pub(super) fn solve(
    items: &[Item],
    widths: LineWidths,
    options: &LineBreakOptions,
    tolerance: f64,
) -> Option<Vec<BrokenLine>> {
    let len = items.len();

    // Prefix sums of width, stretch, and shrink.
    let mut wsum = vec![0.0; len + 1];
    let mut ysum = vec![0.0; len + 1];
    let mut zsum = vec![0.0; len + 1];
    for (i, item) in items.iter().enumerate() {
        let (w, y, z) = match item {
            Item::Box { width, .. } => (*width, 0.0, 0.0),
            Item::Glue {
                width,
                stretch,
                shrink,
            } => (*width, *stretch, *shrink),
            Item::Penalty { .. } => (0.0, 0.0, 0.0),
        };
        wsum[i + 1] = wsum[i] + w;
        ysum[i + 1] = ysum[i] + y;
        zsum[i + 1] = zsum[i] + z;
    }

    let mut entries = vec![Entry {
        pred: 0,
        pos: 0,
        resume: next_content(items, 0),
        line: 0,
        total: 0.0,
        fitness: 1,
        flagged: false,
        ratio: 0.0,
        natural: 0.0,
        target: 0.0,
    }];
    let mut active = 0;
    let mut last = None;

    for b in 0..len {
        let (legal, cost, flagged, break_width) = match &items[b] {
            Item::Glue { .. } => (b > 0 && items[b - 1].is_box(), 0.0, false, 0.0),
            Item::Penalty {
                cost,
                flagged,
                width,
            } => (cost.is_finite() || *cost == PENALTY_FORCED, *cost, *flagged, *width),
            Item::Box { .. } => (false, 0.0, false, 0.0),
        };
        if !legal {
            continue;
        }
        let mandatory = cost == PENALTY_FORCED;

        let mut best: Option<Candidate> = None;
        for (index, entry) in entries.iter().enumerate().skip(active) {
            let start = entry.resume.min(b);
            let natural = wsum[b] - wsum[start] + break_width;
            let stretch = ysum[b] - ysum[start];
            let shrink = zsum[b] - zsum[start];
            let target = widths.get(entry.line);
            let ratio = raw_ratio(target, natural, stretch, shrink);

            // An overfull line from the earliest active start can only get
            // worse; retire that start.
            if ratio < MIN_RATIO && active == index {
                active += 1;
            }

            let upper = if mandatory { f64::INFINITY } else { tolerance };
            if ratio < MIN_RATIO || ratio > upper {
                continue;
            }

            let badness = if mandatory && ratio > 0.0 {
                // A short final or pre-break line costs nothing.
                0.0
            } else {
                100.0 * ratio.abs().powi(3)
            };
            let p = if mandatory { 0.0 } else { cost };
            let mut demerits = (1.0 + badness + p).powi(2);
            if flagged && entry.flagged {
                demerits += options.flagged_demerits;
            }
            let fitness = fitness_class(ratio);
            if fitness.abs_diff(entry.fitness) > 1 {
                demerits += options.fitness_demerits;
            }

            let total = entry.total + demerits;
            let line = entry.line + 1;
            let better = match &best {
                None => true,
                Some(candidate) => {
                    total < candidate.total
                        || (total == candidate.total
                            && (line < candidate.line
                                || (line == candidate.line && index < candidate.pred)))
                }
            };
            if better {
                best = Some(Candidate {
                    pred: index,
                    total,
                    line,
                    ratio,
                    natural,
                    target,
                    fitness,
                });
            }
        }

        if mandatory {
            active = entries.len();
        }
        if let Some(candidate) = best {
            // The rendered ratio of a line before a mandatory break never
            // stretches; trailing space is left ragged.
            let render_ratio = if mandatory && candidate.ratio > 0.0 {
                0.0
            } else {
                candidate.ratio
            };
            entries.push(Entry {
                pred: candidate.pred,
                pos: b,
                resume: next_content(items, b + 1),
                line: candidate.line,
                total: candidate.total,
                fitness: candidate.fitness,
                flagged,
                ratio: render_ratio,
                natural: candidate.natural,
                target: candidate.target,
            });
            if b == len - 1 {
                last = Some(entries.len() - 1);
            }
        }
    }

    let mut index = last?;
    let mut lines = Vec::new();
    while index != 0 {
        let entry = &entries[index];
        let pred = &entries[entry.pred];
        let start = pred.resume.min(entry.pos);
        lines.push(BrokenLine {
            range: start..entry.pos,
            ratio: entry.ratio,
            natural_width: entry.natural,
            target_width: entry.target,
        });
        index = entry.pred;
    }
    lines.reverse();
    Some(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MathBox;
    use crate::element::InlineItem;

    fn word(width: f64) -> Item {
        // Tests at this level only need widths; an opaque math atom stands
        // in for measured text.
        Item::Box {
            width,
            content: InlineItem::Math(MathBox {
                width,
                height: 10.0,
                ascent: 8.0,
                descent: 2.0,
                handle: 0,
            }),
        }
    }

    fn stream(words: &[f64], space: f64) -> Vec<Item> {
        let mut items = Vec::new();
        for (i, w) in words.iter().enumerate() {
            if i > 0 {
                items.push(Item::space(space));
            }
            items.push(word(*w));
        }
        items.push(Item::forced_break());
        items
    }

    #[test]
    fn even_words_break_evenly() {
        // Six 40pt words, 10pt spaces, measure 95: expect three lines of
        // two words each (natural 90, ratio 1.5, inside tolerance 2).
        let items = stream(&[40.0; 6], 10.0);
        let lines = solve(
            &items,
            LineWidths::constant(95.0),
            &LineBreakOptions::default(),
            2.0,
        )
        .unwrap();
        assert_eq!(lines.len(), 3);
        for line in &lines[..2] {
            assert!((line.natural_width - 90.0).abs() < 1e-9);
            assert!((line.ratio - 1.5).abs() < 1e-9);
        }
    }

    #[test]
    fn short_last_line_is_accepted() {
        // A lone short line before the mandatory final break is fine and
        // never stretched.
        let items = stream(&[10.0, 10.0], 1.0);
        let lines = solve(
            &items,
            LineWidths::constant(100.0),
            &LineBreakOptions::default(),
            2.0,
        )
        .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].ratio, 0.0);
    }

    #[test]
    fn overfull_stream_is_rejected() {
        // One unbreakable 200pt word on a 100pt measure cannot shrink.
        let items = stream(&[200.0], 10.0);
        assert!(solve(
            &items,
            LineWidths::constant(100.0),
            &LineBreakOptions::default(),
            2.0,
        )
        .is_none());
    }

    #[test]
    fn avoids_overfull_first_line() {
        // Three words never fit; two words per line is the only feasible
        // assignment and both lines stay inside the tolerance window.
        let items = stream(&[45.0, 45.0, 45.0, 45.0], 10.0);
        let lines = solve(
            &items,
            LineWidths::constant(105.0),
            &LineBreakOptions::default(),
            2.0,
        )
        .unwrap();
        assert_eq!(lines.len(), 2);
        assert!((lines[0].natural_width - 100.0).abs() < 1e-9);
        assert!((lines[1].natural_width - 100.0).abs() < 1e-9);
    }
}
