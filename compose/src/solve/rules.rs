// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The built-in typographic rules.
//!
//! A rule is a record carrying function pointers: `check` reports
//! violations against a state, `suggest` proposes adjustments for one
//! violation. Rules never mutate state.

use core::fmt;

use crate::config::LayoutOptions;
use crate::error::Severity;
use crate::flow::Plan;
use crate::geometry::EPSILON;
use crate::layout::{BlockKind, BlockLayout, LayoutState};
use crate::solve::{Adjustment, Violation};

/// Identity of a built-in rule.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum RuleId {
    NoOverflow,
    MinSpacing,
    NoOrphan,
    NoWidow,
    HeadingOrphan,
    KeepTogether,
    MaxLinesPerPage,
    MinPageFullness,
    BalancedSpacing,
}

impl RuleId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoOverflow => "no-overflow",
            Self::MinSpacing => "min-spacing",
            Self::NoOrphan => "no-orphan",
            Self::NoWidow => "no-widow",
            Self::HeadingOrphan => "heading-orphan",
            Self::KeepTogether => "keep-together",
            Self::MaxLinesPerPage => "max-lines-per-page",
            Self::MinPageFullness => "min-page-fullness",
            Self::BalancedSpacing => "balanced-spacing",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a rule may consult besides the state itself.
pub struct RuleContext<'a> {
    pub options: &'a LayoutOptions,
    pub plan: &'a Plan,
}

/// A typographic rule.
pub struct Rule {
    pub id: RuleId,
    pub severity: Severity,
    pub check: fn(&LayoutState, &RuleContext<'_>) -> Vec<Violation>,
    pub suggest: fn(&Violation, &LayoutState, &RuleContext<'_>) -> Vec<Adjustment>,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("severity", &self.severity)
            .finish()
    }
}

/// The full built-in rule set, before configuration filtering.
pub fn builtin_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: RuleId::NoOverflow,
            severity: Severity::Error,
            check: check_no_overflow,
            suggest: suggest_no_overflow,
        },
        Rule {
            id: RuleId::MinSpacing,
            severity: Severity::Info,
            check: check_min_spacing,
            suggest: suggest_min_spacing,
        },
        Rule {
            id: RuleId::NoOrphan,
            severity: Severity::Warning,
            check: check_no_orphan,
            suggest: suggest_move_to_next_page,
        },
        Rule {
            id: RuleId::NoWidow,
            severity: Severity::Warning,
            check: check_no_widow,
            suggest: suggest_no_widow,
        },
        Rule {
            id: RuleId::HeadingOrphan,
            severity: Severity::Warning,
            check: check_heading_orphan,
            suggest: suggest_move_to_next_page,
        },
        Rule {
            id: RuleId::KeepTogether,
            severity: Severity::Warning,
            check: check_keep_together,
            suggest: suggest_keep_together,
        },
        Rule {
            id: RuleId::MaxLinesPerPage,
            severity: Severity::Info,
            check: check_max_lines,
            suggest: suggest_max_lines,
        },
        Rule {
            id: RuleId::MinPageFullness,
            severity: Severity::Info,
            check: check_fullness,
            suggest: suggest_fullness,
        },
        Rule {
            id: RuleId::BalancedSpacing,
            severity: Severity::Info,
            check: check_balanced_spacing,
            suggest: suggest_balanced_spacing,
        },
    ]
}

fn is_text_block(block: &BlockLayout) -> bool {
    matches!(block.kind, BlockKind::Paragraph | BlockKind::ListItem)
}

fn violation(
    rule: RuleId,
    severity: Severity,
    block: &BlockLayout,
    page: usize,
    detail: String,
) -> Violation {
    Violation {
        rule,
        severity,
        block: block.id,
        page,
        detail,
        suggestions: Vec::new(),
    }
}

fn check_no_overflow(state: &LayoutState, _ctx: &RuleContext<'_>) -> Vec<Violation> {
    let mut violations = Vec::new();
    for page in &state.pages {
        let content = page.content_rect();
        for block in &page.blocks {
            if !content.contains_rect(&block.bounds) {
                violations.push(violation(
                    RuleId::NoOverflow,
                    Severity::Error,
                    block,
                    page.index,
                    format!(
                        "block extends outside the content rectangle by {:.1}pt",
                        (block.bounds.bottom() - content.bottom())
                            .max(block.bounds.right() - content.right())
                            .max(0.0)
                    ),
                ));
            }
        }
    }
    violations
}

fn suggest_no_overflow(
    violation: &Violation,
    state: &LayoutState,
    _ctx: &RuleContext<'_>,
) -> Vec<Adjustment> {
    let page = &state.pages[violation.page];
    let content = page.content_rect();
    let Some(block) = page.blocks.iter().find(|b| b.id == violation.block) else {
        return Vec::new();
    };
    // Content wider than the measure, or a block already alone at the top
    // of its page, cannot be fixed by moving.
    if block.bounds.right() > content.right() + EPSILON {
        return Vec::new();
    }
    let first_on_page = page.blocks.first().is_some_and(|b| b.id == block.id);
    if first_on_page {
        return Vec::new();
    }
    vec![Adjustment::MoveToNextPage(violation.block)]
}

fn check_min_spacing(state: &LayoutState, ctx: &RuleContext<'_>) -> Vec<Violation> {
    let minimum = ctx.options.rules.min_spacing;
    let mut violations = Vec::new();
    for page in &state.pages {
        for pair in page.blocks.windows(2) {
            let gap = pair[1].bounds.top() - pair[0].bounds.bottom();
            if gap < minimum - EPSILON {
                violations.push(violation(
                    RuleId::MinSpacing,
                    Severity::Info,
                    &pair[1],
                    page.index,
                    format!("inter-block gap {gap:.1}pt below minimum {minimum:.1}pt"),
                ));
            }
        }
    }
    violations
}

fn suggest_min_spacing(
    violation: &Violation,
    state: &LayoutState,
    ctx: &RuleContext<'_>,
) -> Vec<Adjustment> {
    let page = &state.pages[violation.page];
    let index = page.blocks.iter().position(|b| b.id == violation.block);
    let Some(index) = index.filter(|i| *i > 0) else {
        return Vec::new();
    };
    let gap = page.blocks[index].bounds.top() - page.blocks[index - 1].bounds.bottom();
    vec![Adjustment::AddSpacingBefore {
        block: violation.block,
        delta: ctx.options.rules.min_spacing - gap,
    }]
}

fn check_no_orphan(state: &LayoutState, _ctx: &RuleContext<'_>) -> Vec<Violation> {
    let mut violations = Vec::new();
    for page in &state.pages {
        for block in &page.blocks {
            if is_text_block(block)
                && block.continues
                && !block.continued
                && block.line_count() == 1
                && state.total_lines(block.id) > 1
            {
                violations.push(violation(
                    RuleId::NoOrphan,
                    Severity::Warning,
                    block,
                    page.index,
                    "first line of a paragraph sits alone at the page bottom".to_owned(),
                ));
            }
        }
    }
    violations
}

fn suggest_move_to_next_page(
    violation: &Violation,
    _state: &LayoutState,
    _ctx: &RuleContext<'_>,
) -> Vec<Adjustment> {
    vec![Adjustment::MoveToNextPage(violation.block)]
}

fn check_no_widow(state: &LayoutState, _ctx: &RuleContext<'_>) -> Vec<Violation> {
    let mut violations = Vec::new();
    for page in &state.pages {
        for block in &page.blocks {
            if is_text_block(block)
                && block.continued
                && !block.continues
                && block.line_count() == 1
                && state.total_lines(block.id) > 1
            {
                violations.push(violation(
                    RuleId::NoWidow,
                    Severity::Warning,
                    block,
                    page.index,
                    "last line of a paragraph is stranded at the page top".to_owned(),
                ));
            }
        }
    }
    violations
}

fn suggest_no_widow(
    violation: &Violation,
    state: &LayoutState,
    _ctx: &RuleContext<'_>,
) -> Vec<Adjustment> {
    // Move the split one line earlier so the widow gains company.
    let mut fragments = state.fragments_of(violation.block);
    let Some((_, first)) = fragments.next() else {
        return Vec::new();
    };
    if first.continued || first.line_count() < 2 {
        return Vec::new();
    }
    vec![Adjustment::PullLineFromPrevious {
        block: violation.block,
        first_take: first.line_count() - 1,
    }]
}

fn check_heading_orphan(state: &LayoutState, _ctx: &RuleContext<'_>) -> Vec<Violation> {
    let mut violations = Vec::new();
    let last_page = state.pages.len().saturating_sub(1);
    for page in &state.pages {
        let Some(block) = page.blocks.last() else {
            continue;
        };
        let follows = page.index < last_page
            && state
                .pages[page.index + 1..]
                .iter()
                .any(|later| !later.blocks.is_empty());
        if block.keep_with_next && follows {
            violations.push(violation(
                RuleId::HeadingOrphan,
                Severity::Warning,
                block,
                page.index,
                "heading is the last block on the page".to_owned(),
            ));
        }
    }
    violations
}

fn check_keep_together(state: &LayoutState, _ctx: &RuleContext<'_>) -> Vec<Violation> {
    let mut violations = Vec::new();
    for page in &state.pages {
        let content = page.content_rect();
        for block in &page.blocks {
            if !block.keep_together {
                continue;
            }
            if block.continues || block.continued {
                violations.push(violation(
                    RuleId::KeepTogether,
                    Severity::Warning,
                    block,
                    page.index,
                    "keep-together block is split across pages".to_owned(),
                ));
            } else if block.bounds.bottom() > content.bottom() + EPSILON {
                violations.push(violation(
                    RuleId::KeepTogether,
                    Severity::Warning,
                    block,
                    page.index,
                    "keep-together block is taller than the page".to_owned(),
                ));
            }
        }
    }
    violations
}

fn suggest_keep_together(
    violation: &Violation,
    state: &LayoutState,
    _ctx: &RuleContext<'_>,
) -> Vec<Adjustment> {
    let page = &state.pages[violation.page];
    let first_on_page = page.blocks.first().is_some_and(|b| b.id == violation.block);
    let continued = page
        .blocks
        .iter()
        .find(|b| b.id == violation.block)
        .is_some_and(|b| b.continued);
    if first_on_page || continued {
        // Already at a page top (or a trailing fragment); moving cannot
        // reunite it.
        return Vec::new();
    }
    vec![Adjustment::MoveToNextPage(violation.block)]
}

fn check_max_lines(state: &LayoutState, ctx: &RuleContext<'_>) -> Vec<Violation> {
    let max = ctx.options.rules.max_lines_per_page;
    let mut violations = Vec::new();
    for page in &state.pages {
        let mut count = 0;
        for block in &page.blocks {
            let lines = block.line_count();
            if count + lines > max && lines > 0 {
                violations.push(violation(
                    RuleId::MaxLinesPerPage,
                    Severity::Info,
                    block,
                    page.index,
                    format!(
                        "page holds more than {max} lines; the budget runs out inside this block"
                    ),
                ));
                break;
            }
            count += lines;
        }
    }
    violations
}

fn suggest_max_lines(
    violation: &Violation,
    state: &LayoutState,
    ctx: &RuleContext<'_>,
) -> Vec<Adjustment> {
    let max = ctx.options.rules.max_lines_per_page;
    let page = &state.pages[violation.page];
    let mut count = 0;
    for block in &page.blocks {
        if block.id == violation.block {
            let allowed = max.saturating_sub(count);
            if block.breakable && !block.continued && allowed >= 1 {
                return vec![Adjustment::RebreakParagraph {
                    block: block.id,
                    first_take: allowed,
                }];
            }
            let first_on_page = page.blocks.first().is_some_and(|b| b.id == block.id);
            if first_on_page {
                return Vec::new();
            }
            return vec![Adjustment::ForceBreakBefore(block.id)];
        }
        count += block.line_count();
    }
    Vec::new()
}

fn check_fullness(state: &LayoutState, ctx: &RuleContext<'_>) -> Vec<Violation> {
    let threshold = ctx.options.rules.min_page_fullness;
    let mut violations = Vec::new();
    // The terminal page is allowed to run short.
    for page in state.pages.iter().rev().skip(1) {
        let content = page.content_rect();
        if content.size.height <= 0.0 {
            continue;
        }
        let ratio = page.used_height() / content.size.height;
        if ratio < threshold - EPSILON {
            let Some(block) = page.blocks.last() else {
                continue;
            };
            violations.push(violation(
                RuleId::MinPageFullness,
                Severity::Info,
                block,
                page.index,
                format!(
                    "page is {:.0}% full, below the {:.0}% threshold",
                    ratio * 100.0,
                    threshold * 100.0
                ),
            ));
        }
    }
    violations
}

fn suggest_fullness(
    violation: &Violation,
    state: &LayoutState,
    _ctx: &RuleContext<'_>,
) -> Vec<Adjustment> {
    // The only pull the adjustment set can express is moving a split point
    // one line later, when the underfull page ends in the leading fragment
    // of a straddling block.
    let page = &state.pages[violation.page];
    let Some(block) = page.blocks.last() else {
        return Vec::new();
    };
    if block.breakable && block.continues && !block.continued {
        return vec![Adjustment::RebreakParagraph {
            block: block.id,
            first_take: block.line_count() + 1,
        }];
    }
    Vec::new()
}

fn check_balanced_spacing(state: &LayoutState, ctx: &RuleContext<'_>) -> Vec<Violation> {
    let tolerance = ctx.options.rules.balanced_spacing_tolerance;
    let mut violations = Vec::new();
    for page in &state.pages {
        if page.blocks.len() < 3 {
            continue;
        }
        let gaps: Vec<f64> = page
            .blocks
            .windows(2)
            .map(|pair| pair[1].bounds.top() - pair[0].bounds.bottom())
            .collect();
        let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
        if mean <= 0.0 {
            continue;
        }
        let uneven = gaps
            .iter()
            .any(|gap| (gap - mean).abs() > tolerance * mean + EPSILON);
        if uneven {
            violations.push(violation(
                RuleId::BalancedSpacing,
                Severity::Info,
                &page.blocks[0],
                page.index,
                format!(
                    "inter-block gaps deviate from their mean of {mean:.1}pt by more than {:.0}%",
                    tolerance * 100.0
                ),
            ));
        }
    }
    violations
}

fn suggest_balanced_spacing(
    violation: &Violation,
    state: &LayoutState,
    _ctx: &RuleContext<'_>,
) -> Vec<Adjustment> {
    let page = &state.pages[violation.page];
    let gaps: Vec<f64> = page
        .blocks
        .windows(2)
        .map(|pair| pair[1].bounds.top() - pair[0].bounds.bottom())
        .collect();
    if gaps.is_empty() {
        return Vec::new();
    }
    let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
    let mut adjustments = Vec::new();
    for (gap, pair) in gaps.iter().zip(page.blocks.windows(2)) {
        if (gap - mean).abs() > EPSILON {
            adjustments.push(Adjustment::AddSpacingBefore {
                block: pair[1].id,
                delta: mean - gap,
            });
        }
    }
    adjustments
}
