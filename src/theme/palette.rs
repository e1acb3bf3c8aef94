//! Static palette and variant tables
//!
//! Preferences persisted by older app versions may name palettes or variants
//! that no longer exist, so every lookup has a `resolve_with_default`
//! counterpart that falls back instead of failing.

use serde::Serialize;

use super::color::Hsl;

pub const DEFAULT_COLOR_KEY: &str = "Blue";
pub const DEFAULT_VARIANT: &str = "standard";

/// Qualitative mood of a palette, shown next to the swatch in settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Personality {
    Calm,
    Regal,
    Natural,
    Fresh,
    Passionate,
    Warm,
    Playful,
    Deep,
    Earthy,
    Neutral,
}

impl Personality {
    pub fn label(&self) -> &'static str {
        match self {
            Personality::Calm => "calm",
            Personality::Regal => "regal",
            Personality::Natural => "natural",
            Personality::Fresh => "fresh",
            Personality::Passionate => "passionate",
            Personality::Warm => "warm",
            Personality::Playful => "playful",
            Personality::Deep => "deep",
            Personality::Earthy => "earthy",
            Personality::Neutral => "neutral",
        }
    }
}

/// A named palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColorSet {
    pub name: &'static str,
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
    pub personality: Personality,
}

pub const COLOR_SETS: &[ThemeColorSet] = &[
    ThemeColorSet {
        name: "Blue",
        primary: "#2196F3",
        secondary: "#03A9F4",
        accent: "#FF9800",
        personality: Personality::Calm,
    },
    ThemeColorSet {
        name: "Purple",
        primary: "#673AB7",
        secondary: "#9C27B0",
        accent: "#FFC107",
        personality: Personality::Regal,
    },
    ThemeColorSet {
        name: "Green",
        primary: "#4CAF50",
        secondary: "#8BC34A",
        accent: "#FF5722",
        personality: Personality::Natural,
    },
    ThemeColorSet {
        name: "Teal",
        primary: "#009688",
        secondary: "#00BCD4",
        accent: "#FF4081",
        personality: Personality::Fresh,
    },
    ThemeColorSet {
        name: "Red",
        primary: "#F44336",
        secondary: "#E91E63",
        accent: "#FFEB3B",
        personality: Personality::Passionate,
    },
    ThemeColorSet {
        name: "Orange",
        primary: "#FF9800",
        secondary: "#FFC107",
        accent: "#3F51B5",
        personality: Personality::Warm,
    },
    ThemeColorSet {
        name: "Pink",
        primary: "#E91E63",
        secondary: "#F06292",
        accent: "#00BCD4",
        personality: Personality::Playful,
    },
    ThemeColorSet {
        name: "Indigo",
        primary: "#3F51B5",
        secondary: "#5C6BC0",
        accent: "#FFAB40",
        personality: Personality::Deep,
    },
    ThemeColorSet {
        name: "Brown",
        primary: "#795548",
        secondary: "#A1887F",
        accent: "#8BC34A",
        personality: Personality::Earthy,
    },
    ThemeColorSet {
        name: "Grey",
        primary: "#607D8B",
        secondary: "#9E9E9E",
        accent: "#03A9F4",
        personality: Personality::Neutral,
    },
];

impl ThemeColorSet {
    pub fn lookup(key: &str) -> Option<&'static ThemeColorSet> {
        COLOR_SETS
            .iter()
            .find(|set| set.name.eq_ignore_ascii_case(key.trim()))
    }

    pub fn resolve_with_default(key: &str) -> &'static ThemeColorSet {
        Self::lookup(key).unwrap_or(&COLOR_SETS[0])
    }

    pub fn primary_hsl(&self) -> Hsl {
        parse_table_hex(self.primary)
    }

    pub fn secondary_hsl(&self) -> Hsl {
        parse_table_hex(self.secondary)
    }

    pub fn accent_hsl(&self) -> Hsl {
        parse_table_hex(self.accent)
    }
}

// Table entries are checked by `test_every_table_color_parses`.
fn parse_table_hex(hex: &str) -> Hsl {
    Hsl::from_hex(hex).unwrap_or(Hsl::new(0.0, 0.0, 0.5))
}

/// Contrast and saturation adjustments applied on top of a palette
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeVariant {
    pub name: &'static str,
    pub contrast_multiplier: f64,
    pub saturation_multiplier: f64,
}

pub const VARIANTS: &[ThemeVariant] = &[
    ThemeVariant {
        name: "standard",
        contrast_multiplier: 1.0,
        saturation_multiplier: 1.0,
    },
    ThemeVariant {
        name: "vibrant",
        contrast_multiplier: 1.1,
        saturation_multiplier: 1.3,
    },
    ThemeVariant {
        name: "muted",
        contrast_multiplier: 0.95,
        saturation_multiplier: 0.6,
    },
    ThemeVariant {
        name: "highContrast",
        contrast_multiplier: 1.5,
        saturation_multiplier: 1.1,
    },
    ThemeVariant {
        name: "pastel",
        contrast_multiplier: 0.9,
        saturation_multiplier: 0.5,
    },
];

impl ThemeVariant {
    pub fn lookup(key: &str) -> Option<&'static ThemeVariant> {
        VARIANTS
            .iter()
            .find(|variant| variant.name.eq_ignore_ascii_case(key.trim()))
    }

    pub fn resolve_with_default(key: &str) -> &'static ThemeVariant {
        Self::lookup(key).unwrap_or(&VARIANTS[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_color_parses() {
        for set in COLOR_SETS {
            for hex in [set.primary, set.secondary, set.accent] {
                assert!(Hsl::from_hex(hex).is_some(), "{} has bad color {}", set.name, hex);
            }
        }
    }

    #[test]
    fn test_defaults_are_first() {
        assert_eq!(COLOR_SETS[0].name, DEFAULT_COLOR_KEY);
        assert_eq!(VARIANTS[0].name, DEFAULT_VARIANT);
    }

    #[test]
    fn test_lookup_ignores_case_and_whitespace() {
        assert_eq!(ThemeColorSet::lookup(" teal ").unwrap().name, "Teal");
        assert_eq!(ThemeVariant::lookup("HIGHCONTRAST").unwrap().name, "highContrast");
    }

    #[test]
    fn test_unknown_keys_fall_back() {
        assert!(ThemeColorSet::lookup("Chartreuse").is_none());
        assert_eq!(ThemeColorSet::resolve_with_default("Chartreuse").name, "Blue");
        assert_eq!(ThemeVariant::resolve_with_default("").name, "standard");
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = COLOR_SETS.iter().map(|s| s.name.to_lowercase()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), COLOR_SETS.len());
    }
}
