// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Memoized text and box measurement.
//!
//! The cache is owned by a build session and re-created per document; it is
//! never invalidated mid-build. It is an optimization only: the miss path
//! and the hit path produce identical values, so layout results never
//! depend on cache state.

mod cache;

use core::hash::{Hash, Hasher};

use compose_metrics::{FontId, FontLibrary};
use hashbrown::Equivalent;
use peniko::Color;

use crate::element::{Decorations, TextRun};
use cache::LruCache;

/// Cache key for a measured run. The size is stored as raw bits so the key
/// can be `Eq`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
struct RunKey {
    text: String,
    font: FontId,
    size_bits: u64,
    style_flags: u8,
}

/// Borrowed lookup key for [`RunKey`].
#[derive(Copy, Clone)]
struct RunKeyRef<'a> {
    text: &'a str,
    font: FontId,
    size_bits: u64,
    style_flags: u8,
}

impl Hash for RunKeyRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Field order must match RunKey's derived implementation.
        self.text.hash(state);
        self.font.hash(state);
        self.size_bits.hash(state);
        self.style_flags.hash(state);
    }
}

impl Equivalent<RunKey> for RunKeyRef<'_> {
    fn equivalent(&self, key: &RunKey) -> bool {
        self.font == key.font
            && self.size_bits == key.size_bits
            && self.style_flags == key.style_flags
            && self.text == key.text
    }
}

impl From<RunKeyRef<'_>> for RunKey {
    fn from(key: RunKeyRef<'_>) -> Self {
        Self {
            text: key.text.to_owned(),
            font: key.font,
            size_bits: key.size_bits,
            style_flags: key.style_flags,
        }
    }
}

/// Cache key for a composite box: the box kind plus a digest of its content.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) struct CompositeKey {
    pub(crate) kind: CompositeKind,
    pub(crate) digest: u64,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) enum CompositeKind {
    TableCell,
}

#[derive(Copy, Clone, PartialEq, Debug)]
struct RunMeasure {
    width: f64,
    ascent: f64,
    descent: f64,
}

fn style_flags(decorations: Decorations) -> u8 {
    u8::from(decorations.underline) | (u8::from(decorations.strikethrough) << 1)
}

/// Couples the font library with the per-build measurement caches and
/// produces measured [`TextRun`]s.
pub struct Measurer<'a> {
    fonts: &'a FontLibrary,
    runs: LruCache<RunKey, RunMeasure>,
    composites: LruCache<CompositeKey, (f64, f64)>,
}

impl<'a> Measurer<'a> {
    pub fn new(fonts: &'a FontLibrary, capacity: usize) -> Self {
        Self {
            fonts,
            runs: LruCache::new(capacity),
            composites: LruCache::new(capacity),
        }
    }

    pub fn fonts(&self) -> &'a FontLibrary {
        self.fonts
    }

    /// Measures `text` and produces an immutable run.
    pub fn run(
        &mut self,
        text: &str,
        font: FontId,
        size: f64,
        color: Color,
        decorations: Decorations,
    ) -> TextRun {
        let key = RunKeyRef {
            text,
            font,
            size_bits: size.to_bits(),
            style_flags: style_flags(decorations),
        };
        let fonts = self.fonts;
        let measure = *self.runs.entry(key, || {
            let scaled = fonts.metrics(font, size);
            RunMeasure {
                width: fonts.text_advance(font, size, text),
                ascent: scaled.ascent,
                descent: scaled.descent,
            }
        });
        TextRun {
            text: text.to_owned(),
            font,
            size,
            color,
            decorations,
            width: measure.width,
            ascent: measure.ascent,
            descent: measure.descent,
        }
    }

    /// Advance width of `text` without building a run.
    pub fn advance(&mut self, text: &str, font: FontId, size: f64) -> f64 {
        let key = RunKeyRef {
            text,
            font,
            size_bits: size.to_bits(),
            style_flags: 0,
        };
        let fonts = self.fonts;
        self.runs
            .entry(key, || {
                let scaled = fonts.metrics(font, size);
                RunMeasure {
                    width: fonts.text_advance(font, size, text),
                    ascent: scaled.ascent,
                    descent: scaled.descent,
                }
            })
            .width
    }

    /// Natural width of the inter-word space for a font and size.
    pub fn space_width(&mut self, font: FontId, size: f64) -> f64 {
        self.advance(" ", font, size)
    }

    /// Cached (min, max) content widths for a composite box, if present.
    pub(crate) fn composite_widths(&mut self, kind: CompositeKind, digest: u64) -> Option<(f64, f64)> {
        self.composites.get(&CompositeKey { kind, digest }).copied()
    }

    /// Records the (min, max) content widths for a composite box.
    pub(crate) fn store_composite_widths(
        &mut self,
        kind: CompositeKind,
        digest: u64,
        widths: (f64, f64),
    ) {
        self.composites.entry(CompositeKey { kind, digest }, || widths);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compose_metrics::synthetic;

    #[test]
    fn hit_and_miss_agree() {
        let fonts = synthetic::library();
        let font = fonts
            .font(synthetic::SERIF, Default::default())
            .unwrap();
        let mut measurer = Measurer::new(&fonts, 16);

        let miss = measurer.run("hello", font, 12.0, Color::BLACK, Decorations::none());
        let hit = measurer.run("hello", font, 12.0, Color::BLACK, Decorations::none());
        assert_eq!(miss, hit);
        assert!((miss.width - fonts.text_advance(font, 12.0, "hello")).abs() < 1e-9);
    }

    #[test]
    fn run_height_is_ascent_plus_descent() {
        let fonts = synthetic::library();
        let font = fonts
            .font(synthetic::SERIF, Default::default())
            .unwrap();
        let mut measurer = Measurer::new(&fonts, 16);
        let run = measurer.run("x", font, 12.0, Color::BLACK, Decorations::none());
        assert!((run.height() - (run.ascent + run.descent)).abs() < 1e-12);
        assert!(run.width > 0.0);
        assert!(run.height() > 0.0);
    }

    #[test]
    fn distinct_sizes_are_distinct_entries() {
        let fonts = synthetic::library();
        let font = fonts
            .font(synthetic::SERIF, Default::default())
            .unwrap();
        let mut measurer = Measurer::new(&fonts, 16);
        let small = measurer.advance("hello", font, 10.0);
        let large = measurer.advance("hello", font, 20.0);
        assert!((large - small * 2.0).abs() < 1e-9);
    }
}
