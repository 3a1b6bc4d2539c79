// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout configuration, passed by value into a build.

use hashbrown::HashMap;
use peniko::Color;

use crate::error::Severity;
use crate::geometry::Insets;
use crate::solve::RuleId;

/// All options recognized by the engine. Construct with
/// `LayoutOptions::default()` and override fields as needed.
#[derive(Clone, Debug)]
pub struct LayoutOptions {
    pub page: PageOptions,
    pub typography: TypographyOptions,
    pub line_breaking: LineBreakOptions,
    pub rules: RuleOptions,
    pub solver: SolverOptions,
    /// Capacity of the per-build measurement cache, in entries.
    pub cache_capacity: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            page: PageOptions::default(),
            typography: TypographyOptions::default(),
            line_breaking: LineBreakOptions::default(),
            rules: RuleOptions::default(),
            solver: SolverOptions::default(),
            cache_capacity: 2000,
        }
    }
}

/// Page geometry in points. Defaults to US Letter with one inch margins.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct PageOptions {
    pub width: f64,
    pub height: f64,
    pub margins: Insets,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            margins: Insets::uniform(72.0),
        }
    }
}

/// Fonts, sizes, and spacing.
#[derive(Clone, Debug)]
pub struct TypographyOptions {
    /// Family used for body text and headings.
    pub body_family: String,
    /// Family used for inline code and code blocks.
    pub mono_family: String,
    pub body_size: f64,
    /// Point sizes for heading levels 1..=6.
    pub heading_sizes: [f64; 6],
    /// Line height as a multiple of the font size.
    pub line_height_factor: f64,
    /// Vertical space between consecutive paragraphs.
    pub paragraph_spacing: f64,
    pub heading_spacing_before: f64,
    pub heading_spacing_after: f64,
    /// Left indent applied per list nesting level.
    pub list_indent: f64,
    /// Distance from an item's marker to its text.
    pub list_gutter: f64,
    pub table_cell_padding: f64,
    pub text_color: Color,
    /// Color for thematic breaks, table borders, and decorations.
    pub rule_color: Color,
    /// Background fill behind code blocks.
    pub code_background: Color,
}

impl Default for TypographyOptions {
    fn default() -> Self {
        Self {
            body_family: "Serif".to_owned(),
            mono_family: "Mono".to_owned(),
            body_size: 12.0,
            heading_sizes: [24.0, 18.0, 15.0, 13.0, 12.0, 11.0],
            line_height_factor: 1.2,
            paragraph_spacing: 6.0,
            heading_spacing_before: 14.0,
            heading_spacing_after: 8.0,
            list_indent: 18.0,
            list_gutter: 18.0,
            table_cell_padding: 4.0,
            text_color: Color::BLACK,
            rule_color: Color::rgb8(0x60, 0x60, 0x60),
            code_background: Color::rgb8(0xf2, 0xf2, 0xf2),
        }
    }
}

/// Parameters of the optimal line breaker.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct LineBreakOptions {
    /// Maximum adjustment ratio accepted on the first pass.
    pub tolerance_first_pass: f64,
    /// Maximum adjustment ratio accepted on the emergency pass.
    pub tolerance_second_pass: f64,
    /// Extra demerits for two consecutive flagged breaks.
    pub flagged_demerits: f64,
    /// Extra demerits for a fitness class jump between adjacent lines.
    pub fitness_demerits: f64,
}

impl Default for LineBreakOptions {
    fn default() -> Self {
        Self {
            tolerance_first_pass: 2.0,
            tolerance_second_pass: f64::INFINITY,
            flagged_demerits: 100.0,
            fitness_demerits: 3000.0,
        }
    }
}

/// Per-rule enablement and severity override.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct RuleSetting {
    pub enabled: bool,
    pub severity_override: Option<Severity>,
}

impl Default for RuleSetting {
    fn default() -> Self {
        Self {
            enabled: true,
            severity_override: None,
        }
    }
}

/// Configuration of the built-in rule set.
#[derive(Clone, Debug)]
pub struct RuleOptions {
    settings: HashMap<RuleId, RuleSetting>,
    /// Minimum inter-block gap enforced by `min-spacing`.
    pub min_spacing: f64,
    /// Line budget per page enforced by `max-lines-per-page`.
    pub max_lines_per_page: usize,
    /// Used-height ratio below which `min-page-fullness` reports.
    pub min_page_fullness: f64,
    /// Relative gap deviation tolerated by `balanced-spacing`.
    pub balanced_spacing_tolerance: f64,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            settings: HashMap::new(),
            min_spacing: 6.0,
            max_lines_per_page: 50,
            min_page_fullness: 0.7,
            balanced_spacing_tolerance: 0.2,
        }
    }
}

impl RuleOptions {
    /// Overrides the setting for one rule.
    pub fn set(&mut self, id: RuleId, setting: RuleSetting) {
        self.settings.insert(id, setting);
    }

    /// Disables one rule.
    pub fn disable(&mut self, id: RuleId) {
        self.settings.insert(
            id,
            RuleSetting {
                enabled: false,
                severity_override: None,
            },
        );
    }

    /// Returns the effective setting for a rule.
    pub fn setting(&self, id: RuleId) -> RuleSetting {
        self.settings.get(&id).copied().unwrap_or_default()
    }
}

/// Iteration bounds of the constraint solver.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SolverOptions {
    pub max_iterations: u32,
    /// Number of top-ranked violations addressed per iteration.
    pub top_k_violations: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            top_k_violations: 3,
        }
    }
}
