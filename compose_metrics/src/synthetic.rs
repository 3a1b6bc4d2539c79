// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic synthetic faces for tests and examples.
//!
//! The faces registered here have hand-picked metrics rather than metrics
//! derived from any real font binary, so layout results built on them are
//! stable across platforms and toolchains.

use crate::{FontAttributes, FontLibrary, FontMetrics, FontWeight, MetricsTable};

/// Family name of the proportional synthetic face.
pub const SERIF: &str = "Serif";

/// Family name of the fixed-pitch synthetic face.
pub const MONO: &str = "Mono";

fn base_metrics() -> FontMetrics {
    FontMetrics {
        units_per_em: 1000,
        ascent: 800.0,
        descent: 200.0,
        x_height: 500.0,
        cap_height: 700.0,
        line_gap: 0.0,
    }
}

fn proportional_table(weight: FontWeight) -> MetricsTable {
    // Bold faces are slightly wider, as with real families.
    let em = if weight >= FontWeight::BOLD { 540.0 } else { 500.0 };
    let mut table = MetricsTable::new(base_metrics(), 600.0);
    table.set_advance_range('a'..='z', em);
    table.set_advance_range('A'..='Z', em * 1.3);
    table.set_advance_range('0'..='9', em);
    for ch in ['m', 'w'] {
        table.set_advance(ch, em * 1.5);
    }
    for ch in ['i', 'j', 'l', 't', 'f'] {
        table.set_advance(ch, em * 0.55);
    }
    table.set_advance(' ', em * 0.5);
    for ch in ".,;:!?'\"-–—()[]{}/\\&%#*+=<>@^_~|•".chars() {
        table.set_advance(ch, em * 0.6);
    }
    table
}

fn mono_table() -> MetricsTable {
    let mut table = MetricsTable::new(base_metrics(), 600.0);
    table.set_advance_range(' '..='~', 600.0);
    table
}

/// Builds a library with a proportional family (regular, bold, italic) and a
/// fixed-pitch family.
pub fn library() -> FontLibrary {
    let mut library = FontLibrary::new();
    library.register(
        SERIF,
        FontAttributes::normal(),
        proportional_table(FontWeight::NORMAL),
    );
    library.register(
        SERIF,
        FontAttributes::bold(),
        proportional_table(FontWeight::BOLD),
    );
    library.register(
        SERIF,
        FontAttributes::italic(),
        proportional_table(FontWeight::NORMAL),
    );
    library.register(MONO, FontAttributes::normal(), mono_table());
    library
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_family_resolves() {
        let library = library();
        assert!(library.font(SERIF, FontAttributes::normal()).is_some());
        assert!(library.font(SERIF, FontAttributes::bold()).is_some());
        assert!(library.font(SERIF, FontAttributes::italic()).is_some());
        assert!(library.font(MONO, FontAttributes::normal()).is_some());
    }

    #[test]
    fn mono_is_fixed_pitch() {
        let library = library();
        let mono = library.font(MONO, FontAttributes::normal()).unwrap();
        let a = library.glyph_advance(mono, 10.0, 'i');
        let b = library.glyph_advance(mono, 10.0, 'W');
        assert_eq!(a, b);
    }
}
