// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout and pagination engine for paginated documents.
//!
//! Compose turns a parsed document tree and a set of font metric tables
//! into a sequence of pages on which every run, rule, and figure has an
//! exact position. The pipeline is strictly one-directional:
//!
//! 1. The block layout generator ([`flow`]) walks the document, measures
//!    every block through the memoizing [`measure::Measurer`], breaks
//!    paragraphs with the optimal line breaker ([`linebreak`]), and pours
//!    the result onto pages.
//! 2. The constraint solver ([`solve`]) checks typographic rules (orphans,
//!    widows, keep-together, page fullness, spacing balance) against the
//!    state and applies targeted adjustments until it reaches a fixed
//!    point or the iteration cap.
//! 3. The final [`layout::LayoutState`] is handed to an output adapter,
//!    which only converts coordinates and emits drawing calls.
//!
//! All lengths are PDF points with a top-left origin; bottom-origin targets
//! convert at the adapter boundary. The engine holds no global state: fonts,
//! configuration, and the math engine are passed in explicitly, and a given
//! input always produces an identical state.
//!
//! ## Usage
//!
//! ```rust
//! use compose::{layout_document, LayoutOptions};
//! use compose::document::{BlockNode, Document, InlineNode, NoMath};
//! use compose_metrics::synthetic;
//!
//! let fonts = synthetic::library();
//! let document = Document::new(vec![BlockNode::Paragraph {
//!     children: vec![InlineNode::Text("Hello, page one.".to_owned())],
//! }]);
//! let state = layout_document(&document, &fonts, &NoMath, LayoutOptions::default()).unwrap();
//! assert_eq!(state.pages.len(), 1);
//! ```

#![warn(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod document;
pub mod element;
pub mod error;
pub mod flow;
pub mod geometry;
pub mod layout;
pub mod linebreak;
pub mod measure;
pub mod solve;

pub use config::{LayoutOptions, PageOptions, RuleSetting, SolverOptions, TypographyOptions};
pub use error::{LayoutError, Severity};
pub use layout::{BlockId, BlockLayout, LayoutState, LineLayout, PageLayout};
pub use measure::Measurer;
pub use solve::{Adjustment, RuleId, Violation};

use compose_metrics::{FontAttributes, FontLibrary};
use document::{Document, MathEngine};

/// Lays out a document end to end: measurement, block flow, pagination,
/// and constraint solving.
///
/// Residual violations the solver could not resolve are carried on the
/// returned state (and logged); hard failures such as unknown fonts or
/// malformed input abort with an error.
pub fn layout_document(
    document: &Document,
    fonts: &FontLibrary,
    math: &dyn MathEngine,
    options: LayoutOptions,
) -> Result<LayoutState, LayoutError> {
    for family in [
        &options.typography.body_family,
        &options.typography.mono_family,
    ] {
        if fonts.font(family, FontAttributes::normal()).is_none() {
            return Err(LayoutError::UnknownFont {
                family: family.clone(),
            });
        }
    }
    let mut measurer = Measurer::new(fonts, options.cache_capacity);
    let plan = flow::collect(document, &mut measurer, math, &options)?;
    let state = flow::place(&plan, &options);
    solve::solve(&plan, state, &options)
}
