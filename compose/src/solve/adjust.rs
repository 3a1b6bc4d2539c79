// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adjustments: pure transformations from one layout state to the next.
//!
//! An adjustment never edits placed geometry directly. It updates the
//! target block's placement constraints and re-places the plan, so the
//! resulting state is exactly what the generator would have produced had
//! the constraint been present from the start. Applying the same adjustment
//! to the same state always yields the same result.

use crate::config::LayoutOptions;
use crate::flow::{place_with_meta, Plan};
use crate::layout::{BlockId, LayoutState};

/// A concrete change addressing a violation.
#[derive(Clone, PartialEq, Debug)]
pub enum Adjustment {
    /// Start the block on the following page.
    MoveToNextPage(BlockId),
    /// Move the split point of a straddling block one line earlier so its
    /// trailing fragment gains a line. `first_take` is the resulting line
    /// count of the leading fragment.
    PullLineFromPrevious { block: BlockId, first_take: usize },
    /// Insert extra vertical space before the block. Negative values
    /// tighten the gap.
    AddSpacingBefore { block: BlockId, delta: f64 },
    /// Force a page break before the block.
    ForceBreakBefore(BlockId),
    /// Re-break a split block so its leading fragment keeps exactly
    /// `first_take` lines.
    RebreakParagraph { block: BlockId, first_take: usize },
}

impl Adjustment {
    /// The block the adjustment operates on.
    pub fn target(&self) -> BlockId {
        match self {
            Self::MoveToNextPage(block)
            | Self::ForceBreakBefore(block)
            | Self::PullLineFromPrevious { block, .. }
            | Self::AddSpacingBefore { block, .. }
            | Self::RebreakParagraph { block, .. } => *block,
        }
    }

    /// Produces the next state: constraints updated, plan re-placed, and
    /// the application recorded on the block for anti-thrash.
    pub fn apply(&self, state: &LayoutState, plan: &Plan, options: &LayoutOptions) -> LayoutState {
        let mut meta = state.meta.clone();
        {
            let entry = meta.entry(self.target()).or_default();
            match self {
                Self::MoveToNextPage(_) | Self::ForceBreakBefore(_) => {
                    entry.constraints.break_before = true;
                }
                Self::PullLineFromPrevious { first_take, .. }
                | Self::RebreakParagraph { first_take, .. } => {
                    entry.constraints.first_take = Some((*first_take).max(1));
                }
                Self::AddSpacingBefore { delta, .. } => {
                    entry.constraints.extra_spacing_before += delta;
                }
            }
            entry.applied.push(self.clone());
        }
        let mut next = place_with_meta(plan, meta, options);
        next.iteration = state.iteration;
        next
    }
}
