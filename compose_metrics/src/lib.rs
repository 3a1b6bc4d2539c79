// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font metric tables and glyph advance lookup.
//!
//! This crate is the measurement backend of the compose layout engine. It
//! owns no font binaries: callers register a [`MetricsTable`] per font face
//! once at startup and receive a [`FontId`] handle. All lookups afterwards
//! are pure and allocation-free, which keeps the layout hot path free of
//! I/O.
//!
//! Some key types are:
//! - [`FontLibrary`] is the collection of registered faces and the sole
//!   lookup entry point.
//! - [`MetricsTable`] carries design-space metrics and per-codepoint
//!   advances for one face.
//! - [`FontAttributes`] selects a face within a family by weight and style.
//!
//! Advances and vertical metrics are stored in font units and converted to
//! PDF points (1/72 inch) at the requested size on lookup.

#![warn(clippy::print_stdout, clippy::print_stderr)]

mod attributes;
mod library;
mod metrics;

pub mod synthetic;

pub use attributes::{FontAttributes, FontStyle, FontWeight};
pub use library::{FontId, FontLibrary};
pub use metrics::{FontMetrics, MetricsTable, ScaledMetrics};
