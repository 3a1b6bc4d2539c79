// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The constraint solver.
//!
//! Each iteration checks every enabled rule against the current state,
//! ranks the violations (errors first, then page order), takes the top few,
//! and applies their suggested adjustments to a fresh clone of the state.
//! The loop ends when no violations remain, when an iteration makes no
//! progress (a fixed point with residual violations), or at the iteration
//! cap. Residual violations stay on the returned state and are logged with
//! their severity preserved.

mod adjust;
mod rules;

pub use adjust::Adjustment;
pub use rules::{builtin_rules, Rule, RuleContext, RuleId};

use crate::config::LayoutOptions;
use crate::error::{LayoutError, Severity};
use crate::flow::Plan;
use crate::layout::{BlockId, LayoutState};

/// A concrete instance of a rule not being satisfied.
#[derive(Clone, PartialEq, Debug)]
pub struct Violation {
    pub rule: RuleId,
    pub severity: Severity,
    /// The offending block.
    pub block: BlockId,
    /// Page the violation was observed on.
    pub page: usize,
    /// Human-readable description.
    pub detail: String,
    pub suggestions: Vec<Adjustment>,
}

impl Violation {
    pub(crate) fn is_overflow_error(&self) -> bool {
        self.rule == RuleId::NoOverflow && self.severity == Severity::Error
    }

    fn key(&self) -> (Severity, RuleId, BlockId, usize, String) {
        (
            self.severity,
            self.rule,
            self.block,
            self.page,
            self.detail.clone(),
        )
    }
}

/// Runs every enabled rule and returns the ranked violations with their
/// suggestions attached.
pub fn check(state: &LayoutState, rules: &[Rule], ctx: &RuleContext<'_>) -> Vec<Violation> {
    let mut violations = Vec::new();
    for rule in rules {
        let setting = ctx.options.rules.setting(rule.id);
        if !setting.enabled {
            continue;
        }
        let severity = setting.severity_override.unwrap_or(rule.severity);
        for mut violation in (rule.check)(state, ctx) {
            violation.severity = severity;
            violation.suggestions = (rule.suggest)(&violation, state, ctx);
            violations.push(violation);
        }
    }
    // Errors first, then page order; stable within a page.
    violations.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.page.cmp(&b.page))
    });
    violations
}

fn validate(state: &LayoutState) -> Result<(), LayoutError> {
    for (_, block) in state.blocks() {
        if block.bounds.size.width <= 0.0 || block.bounds.size.height < 0.0 {
            return Err(LayoutError::invariant(
                state.iteration,
                Some(block.id),
                format!(
                    "block has a degenerate size {}x{}",
                    block.bounds.size.width, block.bounds.size.height
                ),
            ));
        }
    }
    Ok(())
}

fn finalize(mut state: LayoutState, violations: Vec<Violation>) -> LayoutState {
    for violation in &violations {
        log::warn!(
            "residual {} violation of {} on page {}, block {:?}: {}",
            violation.severity.as_str(),
            violation.rule,
            violation.page + 1,
            violation.block,
            violation.detail
        );
    }
    state.violations = violations;
    state
}

/// Iteratively refines `state` until the rules are satisfied, a fixed point
/// is reached, or the iteration cap runs out.
pub fn solve(
    plan: &Plan,
    state: LayoutState,
    options: &LayoutOptions,
) -> Result<LayoutState, LayoutError> {
    let rules = builtin_rules();
    let ctx = RuleContext { options, plan };
    let mut state = state;
    let mut previous_keys: Option<Vec<(Severity, RuleId, BlockId, usize, String)>> = None;

    for _ in 0..options.solver.max_iterations {
        validate(&state)?;
        let violations = check(&state, &rules, &ctx);
        if violations.is_empty() {
            log::debug!("solver converged after {} iterations", state.iteration);
            state.violations.clear();
            return Ok(state);
        }

        let keys: Vec<_> = violations.iter().map(Violation::key).collect();
        if previous_keys.as_ref() == Some(&keys) {
            log::debug!(
                "solver reached a fixed point with {} residual violations",
                violations.len()
            );
            return Ok(finalize(state, violations));
        }
        previous_keys = Some(keys);

        // Address only the highest-ranked violations per pass; fixing
        // everything at once tends to oscillate.
        let selected = &violations[..violations.len().min(options.solver.top_k_violations)];

        // Gather adjustments, resolving conflicts: of two adjustments
        // targeting the same block, the one from the higher-severity
        // violation wins. Anti-thrash drops adjustments already applied.
        let mut chosen: Vec<(Severity, Adjustment)> = Vec::new();
        for violation in selected {
            for adjustment in &violation.suggestions {
                if state.already_applied(adjustment.target(), adjustment) {
                    log::trace!(
                        "skipping repeated adjustment {adjustment:?} for {}",
                        violation.rule
                    );
                    continue;
                }
                match chosen
                    .iter_mut()
                    .find(|(_, existing)| existing.target() == adjustment.target())
                {
                    Some((severity, existing)) => {
                        if violation.severity > *severity {
                            *severity = violation.severity;
                            *existing = adjustment.clone();
                        }
                    }
                    None => chosen.push((violation.severity, adjustment.clone())),
                }
            }
        }

        if chosen.is_empty() {
            log::debug!("no applicable adjustments remain; accepting residual violations");
            return Ok(finalize(state, violations));
        }

        let mut candidate = state.clone();
        for (_, adjustment) in &chosen {
            candidate = adjustment.apply(&candidate, plan, options);
        }
        candidate.iteration = state.iteration + 1;

        // Error-severity rules are monotone: once overflow is resolved, an
        // adjustment that would reintroduce it is refused.
        let had_overflow = violations.iter().any(Violation::is_overflow_error);
        if !had_overflow {
            let reintroduced = check(&candidate, &rules, &ctx)
                .iter()
                .any(Violation::is_overflow_error);
            if reintroduced {
                log::warn!(
                    "refusing {} adjustment(s) that would reintroduce overflow",
                    chosen.len()
                );
                // Record the refused adjustments so they are not retried.
                for (_, adjustment) in &chosen {
                    let meta = state.meta_mut(adjustment.target());
                    meta.applied.push(adjustment.clone());
                }
                continue;
            }
        }

        state = candidate;
    }

    validate(&state)?;
    let violations = check(&state, &rules, &ctx);
    if violations.is_empty() {
        state.violations.clear();
        return Ok(state);
    }
    log::debug!(
        "solver hit the iteration cap with {} residual violations",
        violations.len()
    );
    Ok(finalize(state, violations))
}
