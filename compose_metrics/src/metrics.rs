// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Design-space metrics for a font face.

use hashbrown::HashMap;

/// Vertical metrics of a face in font units.
///
/// All fields except `units_per_em` are distances from the baseline;
/// `descent` is stored as a positive value.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct FontMetrics {
    /// Size of the design grid. Commonly 1000 or 2048.
    pub units_per_em: u16,
    pub ascent: f64,
    pub descent: f64,
    pub x_height: f64,
    pub cap_height: f64,
    pub line_gap: f64,
}

impl FontMetrics {
    /// Converts the metrics to points at the given size.
    pub fn scale(&self, size: f64) -> ScaledMetrics {
        let k = size / f64::from(self.units_per_em);
        ScaledMetrics {
            size,
            ascent: self.ascent * k,
            descent: self.descent * k,
            x_height: self.x_height * k,
            cap_height: self.cap_height * k,
            line_gap: self.line_gap * k,
        }
    }
}

/// Vertical metrics of a face in points at a specific size.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ScaledMetrics {
    pub size: f64,
    pub ascent: f64,
    pub descent: f64,
    pub x_height: f64,
    pub cap_height: f64,
    pub line_gap: f64,
}

/// Metric table for a single face: vertical metrics plus the advance width
/// of every supported codepoint, all in font units.
#[derive(Clone, Debug)]
pub struct MetricsTable {
    pub(crate) metrics: FontMetrics,
    pub(crate) advances: HashMap<char, f64>,
    pub(crate) notdef_advance: f64,
}

impl MetricsTable {
    /// Creates a table from vertical metrics and a `.notdef` advance.
    pub fn new(metrics: FontMetrics, notdef_advance: f64) -> Self {
        Self {
            metrics,
            advances: HashMap::new(),
            notdef_advance,
        }
    }

    /// Records the advance width for a codepoint, in font units.
    pub fn set_advance(&mut self, ch: char, advance: f64) {
        self.advances.insert(ch, advance);
    }

    /// Records the same advance width for a range of codepoints.
    pub fn set_advance_range(&mut self, range: core::ops::RangeInclusive<char>, advance: f64) {
        for ch in range {
            self.advances.insert(ch, advance);
        }
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    /// Returns the advance for a codepoint in font units, or `None` if the
    /// face has no glyph for it.
    pub fn advance(&self, ch: char) -> Option<f64> {
        self.advances.get(&ch).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> FontMetrics {
        FontMetrics {
            units_per_em: 1000,
            ascent: 800.0,
            descent: 200.0,
            x_height: 500.0,
            cap_height: 700.0,
            line_gap: 0.0,
        }
    }

    #[test]
    fn scaling_is_linear_in_size() {
        let scaled = metrics().scale(12.0);
        assert_eq!(scaled.ascent, 9.6);
        assert_eq!(scaled.descent, 2.4);
        let doubled = metrics().scale(24.0);
        assert_eq!(doubled.ascent, scaled.ascent * 2.0);
    }

    #[test]
    fn advance_lookup_distinguishes_missing_glyphs() {
        let mut table = MetricsTable::new(metrics(), 600.0);
        table.set_advance('a', 500.0);
        assert_eq!(table.advance('a'), Some(500.0));
        assert_eq!(table.advance('\u{1F984}'), None);
    }
}
