// Copyright 2025 the Compose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Properties for selecting a face within a font family.

use core::fmt;

/// Visual weight class of a face, on the usual 100..=900 scale.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const NORMAL: Self = Self(400);
    pub const BOLD: Self = Self(700);
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Slope of a face.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Italic => write!(f, "italic"),
        }
    }
}

/// Primary attributes for face selection: [`FontWeight`] and [`FontStyle`].
///
/// These are used by [`FontLibrary::font`](crate::FontLibrary::font) to pick
/// a face within a family.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct FontAttributes {
    pub weight: FontWeight,
    pub style: FontStyle,
}

impl FontAttributes {
    /// Creates new attributes from the given weight and style.
    pub fn new(weight: FontWeight, style: FontStyle) -> Self {
        Self { weight, style }
    }

    /// Attributes for an upright face of normal weight.
    pub fn normal() -> Self {
        Self::default()
    }

    /// Attributes for an upright bold face.
    pub fn bold() -> Self {
        Self::new(FontWeight::BOLD, FontStyle::Normal)
    }

    /// Attributes for an italic face of normal weight.
    pub fn italic() -> Self {
        Self::new(FontWeight::NORMAL, FontStyle::Italic)
    }
}

impl fmt::Display for FontAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "weight: {}, style: {}", self.weight, self.style)
    }
}
