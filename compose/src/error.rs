// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error and severity types.

use thiserror::Error;

use crate::layout::BlockId;

/// How serious a rule violation or diagnostic is.
///
/// Ordered from least to most severe so that sorting by severity is a plain
/// comparison.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Errors that abort a build.
///
/// Residual rule violations are not errors: the build completes and they are
/// carried on the final [`LayoutState`](crate::layout::LayoutState) and
/// logged.
#[derive(Clone, Debug, Error)]
pub enum LayoutError {
    /// The requested font family is not registered.
    #[error("unknown font family {family:?}")]
    UnknownFont { family: String },

    /// An image node without intrinsic dimensions reached layout.
    #[error("image {handle} has no intrinsic dimensions")]
    MissingImage { handle: u64 },

    /// The document tree violates the inbound contract.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// The math engine rejected a formula.
    #[error("math measurement failed: {0}")]
    Math(String),

    /// An internal invariant was violated. Always a bug; the diagnostic
    /// names the solver iteration and block for the report.
    #[error("internal invariant violated at iteration {iteration}, block {block:?}: {detail}")]
    Invariant {
        iteration: u32,
        block: Option<BlockId>,
        detail: String,
    },
}

impl LayoutError {
    pub(crate) fn invariant(
        iteration: u32,
        block: Option<BlockId>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Invariant {
            iteration,
            block,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_error_highest() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }
}
