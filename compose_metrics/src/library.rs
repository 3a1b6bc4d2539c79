// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collection of registered faces and the lookup entry point.

use std::sync::Mutex;

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::{FontAttributes, FontMetrics, MetricsTable, ScaledMetrics};

/// Handle for a registered face, assigned by [`FontLibrary::register`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FontId(pub(crate) u32);

impl FontId {
    /// Returns the underlying index value.
    pub fn to_raw(self) -> u32 {
        self.0
    }
}

#[derive(Clone, Debug)]
struct FamilyEntry {
    attributes: FontAttributes,
    id: FontId,
}

/// Owns the metric tables for every registered face.
///
/// Registration happens once at startup; afterwards the library is read-only
/// and lookups take `&self`. The only interior state is the set of already
/// reported missing glyphs, which serializes writers behind a mutex so that
/// each `(face, codepoint)` pair warns at most once.
#[derive(Debug)]
pub struct FontLibrary {
    fonts: Vec<MetricsTable>,
    families: HashMap<String, SmallVec<[FamilyEntry; 2]>>,
    reported_missing: Mutex<HashSet<(FontId, char)>>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self {
            fonts: Vec::new(),
            families: HashMap::new(),
            reported_missing: Mutex::new(HashSet::new()),
        }
    }

    /// Registers a face under a family name and returns its handle.
    pub fn register(
        &mut self,
        family: impl Into<String>,
        attributes: FontAttributes,
        table: MetricsTable,
    ) -> FontId {
        let id = FontId(self.fonts.len() as u32);
        self.fonts.push(table);
        self.families
            .entry(family.into())
            .or_default()
            .push(FamilyEntry { attributes, id });
        id
    }

    /// Selects a face within a family.
    ///
    /// Prefers an exact attribute match; otherwise falls back to the face
    /// with the same style and the nearest weight, then to any face in the
    /// family. Returns `None` for an unknown family.
    pub fn font(&self, family: &str, attributes: FontAttributes) -> Option<FontId> {
        let entries = self.families.get(family)?;
        if let Some(entry) = entries.iter().find(|e| e.attributes == attributes) {
            return Some(entry.id);
        }
        let same_style = entries
            .iter()
            .filter(|e| e.attributes.style == attributes.style)
            .min_by_key(|e| e.attributes.weight.0.abs_diff(attributes.weight.0));
        same_style.or_else(|| entries.first()).map(|e| e.id)
    }

    /// Returns the design-space metrics of a face.
    pub fn design_metrics(&self, font: FontId) -> &FontMetrics {
        self.fonts[font.0 as usize].metrics()
    }

    /// Returns the vertical metrics of a face in points at the given size.
    pub fn metrics(&self, font: FontId, size: f64) -> ScaledMetrics {
        self.fonts[font.0 as usize].metrics().scale(size)
    }

    /// Returns the advance width of a codepoint in points at the given size.
    ///
    /// Faces without a glyph for the codepoint fall back to their `.notdef`
    /// advance; the first such lookup per `(face, codepoint)` pair logs a
    /// warning.
    pub fn glyph_advance(&self, font: FontId, size: f64, ch: char) -> f64 {
        let table = &self.fonts[font.0 as usize];
        let units = table.advance(ch).unwrap_or_else(|| {
            let mut reported = self
                .reported_missing
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if reported.insert((font, ch)) {
                log::warn!(
                    "face #{} has no glyph for {ch:?}; using .notdef advance",
                    font.0
                );
            }
            table.notdef_advance
        });
        units * size / f64::from(table.metrics().units_per_em)
    }

    /// Returns the advance width of a string: the sum of its glyph advances.
    pub fn text_advance(&self, font: FontId, size: f64, text: &str) -> f64 {
        text.chars()
            .map(|ch| self.glyph_advance(font, size, ch))
            .sum()
    }

    /// Number of registered faces.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

impl Default for FontLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FontStyle, FontWeight};

    fn table(advance: f64) -> MetricsTable {
        let metrics = FontMetrics {
            units_per_em: 1000,
            ascent: 800.0,
            descent: 200.0,
            x_height: 500.0,
            cap_height: 700.0,
            line_gap: 0.0,
        };
        let mut table = MetricsTable::new(metrics, 600.0);
        table.set_advance_range('a'..='z', advance);
        table
    }

    #[test]
    fn exact_match_wins() {
        let mut library = FontLibrary::new();
        let regular = library.register("Serif", FontAttributes::normal(), table(500.0));
        let bold = library.register("Serif", FontAttributes::bold(), table(550.0));
        assert_eq!(library.font("Serif", FontAttributes::normal()), Some(regular));
        assert_eq!(library.font("Serif", FontAttributes::bold()), Some(bold));
    }

    #[test]
    fn nearest_weight_fallback() {
        let mut library = FontLibrary::new();
        let regular = library.register("Serif", FontAttributes::normal(), table(500.0));
        let bold = library.register("Serif", FontAttributes::bold(), table(550.0));
        let semibold = FontAttributes::new(FontWeight(600), FontStyle::Normal);
        assert_eq!(library.font("Serif", semibold), Some(bold));
        let light = FontAttributes::new(FontWeight(300), FontStyle::Normal);
        assert_eq!(library.font("Serif", light), Some(regular));
        assert_eq!(library.font("Sans", FontAttributes::normal()), None);
    }

    #[test]
    fn advances_scale_with_size() {
        let mut library = FontLibrary::new();
        let id = library.register("Serif", FontAttributes::normal(), table(500.0));
        assert_eq!(library.glyph_advance(id, 10.0, 'a'), 5.0);
        assert_eq!(library.glyph_advance(id, 20.0, 'a'), 10.0);
    }

    #[test]
    fn missing_glyph_uses_notdef() {
        let mut library = FontLibrary::new();
        let id = library.register("Serif", FontAttributes::normal(), table(500.0));
        // '?' is not in the registered range, so the .notdef advance applies.
        assert_eq!(library.glyph_advance(id, 10.0, '?'), 6.0);
    }

    #[test]
    fn text_advance_is_sum_of_glyph_advances() {
        let mut library = FontLibrary::new();
        let id = library.register("Serif", FontAttributes::normal(), table(500.0));
        let text = "abc";
        let summed: f64 = text
            .chars()
            .map(|ch| library.glyph_advance(id, 12.0, ch))
            .sum();
        assert!((library.text_advance(id, 12.0, text) - summed).abs() < 1e-9);
    }
}
