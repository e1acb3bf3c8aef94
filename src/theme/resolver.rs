//! Theme resolution
//!
//! [`resolve_theme`] turns a [`ThemeRequest`] into a [`ResolvedTheme`]. It is
//! a pure function, which is what makes [`ThemeResolver`]'s memoization safe.

use serde::Serialize;
use std::sync::Arc;

use super::color::Hsl;
use super::device::{DeviceClass, DeviceMetrics};
use super::motion::{AnimationProfile, PageTransition, DEFAULT_ANIMATION_PROFILE};
use super::palette::{Personality, ThemeColorSet, ThemeVariant, DEFAULT_COLOR_KEY, DEFAULT_VARIANT};
use crate::cache::FifoCache;

pub const DEFAULT_FONT_FAMILY: &str = "Roboto";

const LIGHT_ERROR: &str = "#B00020";
const DARK_ERROR: &str = "#CF6679";

/// Everything that influences a resolved theme
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThemeRequest {
    pub dark_mode: bool,
    pub color_key: String,
    pub device_class: DeviceClass,
    pub variant: String,
    pub animation_profile: String,
    pub font_family: Option<String>,
}

impl Default for ThemeRequest {
    fn default() -> Self {
        Self {
            dark_mode: false,
            color_key: DEFAULT_COLOR_KEY.to_string(),
            device_class: DeviceClass::Mobile,
            variant: DEFAULT_VARIANT.to_string(),
            animation_profile: DEFAULT_ANIMATION_PROFILE.to_string(),
            font_family: None,
        }
    }
}

impl ThemeRequest {
    pub fn new(dark_mode: bool, color_key: &str, device_class: DeviceClass) -> Self {
        Self {
            dark_mode,
            color_key: color_key.to_string(),
            device_class,
            ..Self::default()
        }
    }

    pub fn variant(mut self, variant: &str) -> Self {
        self.variant = variant.to_string();
        self
    }

    pub fn animation_profile(mut self, profile: &str) -> Self {
        self.animation_profile = profile.to_string();
        self
    }

    pub fn font_family(mut self, family: Option<&str>) -> Self {
        self.font_family = family.map(str::to_string);
        self
    }

    /// Readable label of every raw input, for logs. Not unique: a `|`
    /// inside a key can make two requests print the same label.
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.dark_mode,
            self.color_key,
            self.device_class.label(),
            self.variant,
            self.animation_profile,
            self.font_family.as_deref().unwrap_or("")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Brightness {
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScheme {
    pub primary: Hsl,
    pub on_primary: Hsl,
    pub secondary: Hsl,
    pub on_secondary: Hsl,
    pub accent: Hsl,
    pub on_accent: Hsl,
    pub background: Hsl,
    pub on_background: Hsl,
    pub surface: Hsl,
    pub on_surface: Hsl,
    pub surface_variant: Hsl,
    pub on_surface_variant: Hsl,
    pub outline: Hsl,
    pub divider: Hsl,
    pub error: Hsl,
    pub on_error: Hsl,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyleSpec {
    pub size: f64,
    pub weight: u16,
    pub line_height: f64,
    pub letter_spacing: f64,
}

impl TextStyleSpec {
    const fn base(size: f64, weight: u16, line_height: f64, letter_spacing: f64) -> Self {
        Self {
            size,
            weight,
            line_height,
            letter_spacing,
        }
    }

    fn scaled(self, scale: f64) -> Self {
        Self {
            size: self.size * scale,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    pub font_family: String,
    pub scale: f64,
    pub display_large: TextStyleSpec,
    pub headline_medium: TextStyleSpec,
    pub title_large: TextStyleSpec,
    pub title_medium: TextStyleSpec,
    pub body_large: TextStyleSpec,
    pub body_medium: TextStyleSpec,
    pub label_large: TextStyleSpec,
    pub label_small: TextStyleSpec,
    /// Hymn lyrics in the reader view
    pub verse: TextStyleSpec,
    pub hymn_number: TextStyleSpec,
}

const DISPLAY_LARGE: TextStyleSpec = TextStyleSpec::base(57.0, 400, 1.12, -0.25);
const HEADLINE_MEDIUM: TextStyleSpec = TextStyleSpec::base(28.0, 400, 1.29, 0.0);
const TITLE_LARGE: TextStyleSpec = TextStyleSpec::base(22.0, 500, 1.27, 0.0);
const TITLE_MEDIUM: TextStyleSpec = TextStyleSpec::base(16.0, 500, 1.5, 0.15);
const BODY_LARGE: TextStyleSpec = TextStyleSpec::base(16.0, 400, 1.5, 0.5);
const BODY_MEDIUM: TextStyleSpec = TextStyleSpec::base(14.0, 400, 1.43, 0.25);
const LABEL_LARGE: TextStyleSpec = TextStyleSpec::base(14.0, 500, 1.43, 0.1);
const LABEL_SMALL: TextStyleSpec = TextStyleSpec::base(11.0, 500, 1.45, 0.5);
const VERSE: TextStyleSpec = TextStyleSpec::base(18.0, 400, 1.6, 0.2);
const HYMN_NUMBER: TextStyleSpec = TextStyleSpec::base(28.0, 700, 1.2, 0.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonStyle {
    pub height: f64,
    pub border_radius: f64,
    pub horizontal_padding: f64,
    pub text_size: f64,
    pub elevation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStyle {
    pub border_radius: f64,
    pub elevation: f64,
    pub color: Hsl,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SliderStyle {
    pub track_height: f64,
    pub thumb_radius: f64,
    pub active_color: Hsl,
    pub inactive_color: Hsl,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IconStyle {
    pub size: f64,
    pub color: Hsl,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppBarStyle {
    pub height: f64,
    pub elevation: f64,
    pub background: Hsl,
    pub foreground: Hsl,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputStyle {
    pub border_radius: f64,
    pub border_width: f64,
    pub fill: Hsl,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogStyle {
    pub border_radius: f64,
    pub elevation: f64,
    pub background: Hsl,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStyles {
    pub button: ButtonStyle,
    pub card: CardStyle,
    pub slider: SliderStyle,
    pub icon: IconStyle,
    pub app_bar: AppBarStyle,
    pub input: InputStyle,
    pub dialog: DialogStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSpec {
    pub profile: &'static str,
    pub short_ms: u32,
    pub medium_ms: u32,
    pub long_ms: u32,
    pub curve: &'static str,
    pub page_transition: PageTransition,
}

/// Fully computed style object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTheme {
    pub brightness: Brightness,
    /// Names after fallback, so a stale key shows up here as the default
    pub color_key: &'static str,
    pub variant: &'static str,
    pub personality: Personality,
    pub device_class: DeviceClass,
    pub metrics: DeviceMetrics,
    pub colors: ColorScheme,
    pub typography: Typography,
    pub components: ComponentStyles,
    pub animation: AnimationSpec,
}

/// Resolve a theme without caching. Never fails: unknown keys fall back to
/// the defaults.
pub fn resolve_theme(request: &ThemeRequest) -> ResolvedTheme {
    let color_set = ThemeColorSet::resolve_with_default(&request.color_key);
    let variant = ThemeVariant::resolve_with_default(&request.variant);
    let profile = AnimationProfile::resolve_with_default(&request.animation_profile);
    let metrics = request.device_class.metrics();

    let colors = build_color_scheme(color_set, variant, request.dark_mode);
    let typography = build_typography(request.font_family.as_deref(), metrics.typography_scale);
    let components = build_components(&colors, &metrics, &typography, variant, request.dark_mode);

    ResolvedTheme {
        brightness: if request.dark_mode {
            Brightness::Dark
        } else {
            Brightness::Light
        },
        color_key: color_set.name,
        variant: variant.name,
        personality: color_set.personality,
        device_class: request.device_class,
        metrics,
        colors,
        typography,
        components,
        animation: AnimationSpec {
            profile: profile.name,
            short_ms: profile.short_ms,
            medium_ms: profile.medium_ms,
            long_ms: profile.long_ms,
            curve: profile.curve,
            page_transition: profile.page_transition,
        },
    }
}

fn build_color_scheme(set: &ThemeColorSet, variant: &ThemeVariant, dark: bool) -> ColorScheme {
    let saturation = variant.saturation_multiplier;
    let contrast = variant.contrast_multiplier;

    let primary = set.primary_hsl().with_saturation_multiplier(saturation);
    let secondary = set.secondary_hsl().with_saturation_multiplier(saturation);
    let accent = set.accent_hsl().with_saturation_multiplier(saturation);

    // Neutrals carry a hint of the primary hue
    let tint = |sat: f64, lightness: f64| {
        Hsl::new(primary.hue, 0.0, 0.0)
            .with_saturation(sat * saturation)
            .with_lightness(lightness)
    };

    let (background, surface, surface_variant) = if dark {
        (tint(0.12, 0.07), tint(0.10, 0.11), tint(0.08, 0.17))
    } else {
        (tint(0.20, 0.98), tint(0.0, 1.0), tint(0.15, 0.93))
    };

    // Contrast pushes foreground lightness away from mid-grey
    let (on_surface, on_surface_variant) = if dark {
        (tint(0.05, 0.5 + 0.43 * contrast), tint(0.05, 0.5 + 0.25 * contrast))
    } else {
        (tint(0.10, 0.5 - 0.40 * contrast), tint(0.08, 0.5 - 0.20 * contrast))
    };

    let error = Hsl::from_hex(if dark { DARK_ERROR } else { LIGHT_ERROR })
        .unwrap_or(Hsl::new(0.0, 1.0, 0.35));

    ColorScheme {
        primary,
        on_primary: primary.on_color(),
        secondary,
        on_secondary: secondary.on_color(),
        accent,
        on_accent: accent.on_color(),
        background,
        on_background: on_surface,
        surface,
        on_surface,
        surface_variant,
        on_surface_variant,
        outline: on_surface.with_alpha(0.38 * contrast),
        divider: on_surface.with_alpha(0.12 * contrast),
        error,
        on_error: error.on_color(),
    }
}

fn build_typography(font_family: Option<&str>, scale: f64) -> Typography {
    let font_family = font_family
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_FONT_FAMILY)
        .to_string();

    Typography {
        font_family,
        scale,
        display_large: DISPLAY_LARGE.scaled(scale),
        headline_medium: HEADLINE_MEDIUM.scaled(scale),
        title_large: TITLE_LARGE.scaled(scale),
        title_medium: TITLE_MEDIUM.scaled(scale),
        body_large: BODY_LARGE.scaled(scale),
        body_medium: BODY_MEDIUM.scaled(scale),
        label_large: LABEL_LARGE.scaled(scale),
        label_small: LABEL_SMALL.scaled(scale),
        verse: VERSE.scaled(scale),
        hymn_number: HYMN_NUMBER.scaled(scale),
    }
}

fn build_components(
    colors: &ColorScheme,
    metrics: &DeviceMetrics,
    typography: &Typography,
    variant: &ThemeVariant,
    dark: bool,
) -> ComponentStyles {
    let radius = metrics.border_radius;
    // Dark surfaces show elevation through tint, not shadow
    let elevation = |light: f64| if dark { 0.0 } else { light };

    ComponentStyles {
        button: ButtonStyle {
            height: metrics.button_height,
            border_radius: radius,
            horizontal_padding: metrics.button_height / 2.0,
            text_size: typography.label_large.size,
            elevation: elevation(1.0),
        },
        card: CardStyle {
            border_radius: radius,
            elevation: elevation(2.0),
            color: colors.surface,
        },
        slider: SliderStyle {
            track_height: metrics.slider_track_height,
            thumb_radius: metrics.slider_track_height * 2.5,
            active_color: colors.primary,
            inactive_color: colors.primary.with_alpha(0.24),
        },
        icon: IconStyle {
            size: metrics.icon_size,
            color: colors.on_surface_variant,
        },
        app_bar: AppBarStyle {
            height: 56.0 * metrics.typography_scale,
            elevation: elevation(0.0),
            background: if dark { colors.surface } else { colors.primary },
            foreground: if dark {
                colors.on_surface
            } else {
                colors.on_primary
            },
        },
        input: InputStyle {
            border_radius: radius * 0.75,
            border_width: variant.contrast_multiplier.max(1.0),
            fill: colors.surface_variant,
        },
        dialog: DialogStyle {
            border_radius: radius * 2.0,
            elevation: elevation(6.0),
            background: colors.surface,
        },
    }
}

/// Cache counters, mostly for the debug overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

/// Memoizing front end for [`resolve_theme`]
#[derive(Debug)]
pub struct ThemeResolver {
    /// Keyed on the raw request, so a stale key gets its own entry even
    /// though it resolves like the default.
    cache: FifoCache<ThemeRequest, Arc<ResolvedTheme>>,
    hits: u64,
    misses: u64,
}

impl Default for ThemeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeResolver {
    pub const DEFAULT_CAPACITY: usize = 20;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: FifoCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn resolve(&mut self, request: &ThemeRequest) -> Arc<ResolvedTheme> {
        if let Some(theme) = self.cache.get(request) {
            self.hits += 1;
            return Arc::clone(theme);
        }

        self.misses += 1;
        let theme = Arc::new(resolve_theme(request));
        if let Some((evicted, _)) = self.cache.insert(request.clone(), Arc::clone(&theme)) {
            tracing::debug!(evicted = %evicted.cache_key(), "theme cache full, evicted oldest entry");
        }
        tracing::debug!(key = %request.cache_key(), "resolved theme");
        theme
    }

    pub fn is_cached(&self, request: &ThemeRequest) -> bool {
        self.cache.contains_key(request)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cache.len(),
            capacity: self.cache.capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::palette::{COLOR_SETS, VARIANTS};

    fn request(color: &str) -> ThemeRequest {
        ThemeRequest::new(false, color, DeviceClass::Mobile)
    }

    #[test]
    fn test_resolve_is_deterministic() {
        for set in COLOR_SETS {
            for variant in VARIANTS {
                for device in DeviceClass::ALL {
                    for dark in [false, true] {
                        let req = ThemeRequest::new(dark, set.name, device).variant(variant.name);
                        assert_eq!(resolve_theme(&req), resolve_theme(&req));
                    }
                }
            }
        }
    }

    #[test]
    fn test_unknown_color_key_matches_blue() {
        let unknown = resolve_theme(&request("Chartreuse"));
        let blue = resolve_theme(&request("Blue"));
        assert_eq!(unknown, blue);
        assert_eq!(unknown.color_key, "Blue");
    }

    #[test]
    fn test_unknown_variant_and_profile_fall_back() {
        let req = request("Teal").variant("neon").animation_profile("warp");
        let theme = resolve_theme(&req);
        assert_eq!(theme.variant, "standard");
        assert_eq!(theme.animation.profile, "default");
        assert_eq!(theme, resolve_theme(&request("Teal")));
    }

    #[test]
    fn test_variant_scales_palette_saturation_only() {
        let set = ThemeColorSet::lookup("Red").unwrap();
        let base = set.primary_hsl();
        let theme = resolve_theme(&request("Red").variant("pastel"));
        let pastel = ThemeVariant::lookup("pastel").unwrap();

        assert_eq!(
            theme.colors.primary.saturation,
            (base.saturation * pastel.saturation_multiplier).clamp(0.0, 1.0)
        );
        assert_eq!(theme.colors.primary.hue, base.hue);
        assert_eq!(theme.colors.primary.lightness, base.lightness);
    }

    #[test]
    fn test_half_saturation_on_fully_saturated_accent() {
        // Blue's accent #FF9800 has HSL saturation 1.0
        let base = Hsl::from_hex("#FF9800").unwrap();
        assert_eq!(base.saturation, 1.0);

        let theme = resolve_theme(&request("Blue").variant("pastel"));
        assert_eq!(theme.colors.accent.saturation, 0.5);
        assert_eq!(theme.colors.accent.hue, base.hue);
        assert_eq!(theme.colors.accent.lightness, base.lightness);
    }

    #[test]
    fn test_device_class_scales_metrics() {
        let mobile = resolve_theme(&ThemeRequest::new(false, "Blue", DeviceClass::Mobile));
        let large = resolve_theme(&ThemeRequest::new(false, "Blue", DeviceClass::LargeDesktop));

        assert_eq!(mobile.typography.body_large.size, 16.0);
        assert_eq!(large.typography.body_large.size, 16.0 * 1.25);
        assert_eq!(large.components.icon.size, 32.0);
        assert_eq!(large.components.button.height, 60.0);
        assert_eq!(large.components.button.border_radius, 20.0);
        assert_eq!(large.components.slider.track_height, 6.0);
        assert_eq!(mobile.components.slider.track_height, 4.0);
    }

    #[test]
    fn test_dark_mode_flips_surfaces() {
        let light = resolve_theme(&ThemeRequest::new(false, "Green", DeviceClass::Tablet));
        let dark = resolve_theme(&ThemeRequest::new(true, "Green", DeviceClass::Tablet));
        assert_eq!(light.brightness, Brightness::Light);
        assert_eq!(dark.brightness, Brightness::Dark);
        assert!(dark.colors.background.lightness < 0.2);
        assert!(light.colors.background.lightness > 0.9);
        assert!(dark.colors.on_surface.lightness > dark.colors.surface.lightness);
        assert!(light.colors.on_surface.lightness < light.colors.surface.lightness);
        assert_eq!(dark.components.card.elevation, 0.0);
    }

    #[test]
    fn test_font_family_defaults_and_overrides() {
        assert_eq!(resolve_theme(&request("Blue")).typography.font_family, DEFAULT_FONT_FAMILY);
        let custom = request("Blue").font_family(Some("Merriweather"));
        assert_eq!(resolve_theme(&custom).typography.font_family, "Merriweather");
        let blank = request("Blue").font_family(Some("  "));
        assert_eq!(resolve_theme(&blank).typography.font_family, DEFAULT_FONT_FAMILY);
    }

    #[test]
    fn test_resolver_caches_and_counts() {
        let mut resolver = ThemeResolver::new();
        let req = request("Purple");
        let first = resolver.resolve(&req);
        let second = resolver.resolve(&req);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            resolver.stats(),
            ResolverStats {
                hits: 1,
                misses: 1,
                entries: 1,
                capacity: 20
            }
        );
    }

    #[test]
    fn test_twenty_first_request_evicts_the_first() {
        let mut resolver = ThemeResolver::with_capacity(20);
        let requests: Vec<ThemeRequest> = (0..21)
            .map(|i| request("Blue").font_family(Some(&format!("Font{}", i))))
            .collect();

        for req in &requests[..20] {
            resolver.resolve(req);
        }
        assert_eq!(resolver.len(), 20);
        // Touching the oldest entry must not save it
        resolver.resolve(&requests[0]);

        resolver.resolve(&requests[20]);
        assert_eq!(resolver.len(), 20);
        assert!(!resolver.is_cached(&requests[0]));
        assert!(resolver.is_cached(&requests[1]));
        assert!(resolver.is_cached(&requests[20]));
    }

    #[test]
    fn test_stale_key_gets_own_cache_entry() {
        let mut resolver = ThemeResolver::new();
        let stale = resolver.resolve(&request("Chartreuse"));
        let blue = resolver.resolve(&request("Blue"));
        assert_eq!(resolver.len(), 2);
        assert_eq!(*stale, *blue);
    }

    #[test]
    fn test_requests_with_matching_labels_stay_distinct() {
        let mut resolver = ThemeResolver::new();
        let first = request("Blue")
            .animation_profile("snappy")
            .font_family(Some("|x"));
        let second = request("Blue")
            .animation_profile("snappy|")
            .font_family(Some("x"));
        assert_eq!(first.cache_key(), second.cache_key());

        resolver.resolve(&first);
        let cached = resolver.resolve(&second);
        assert_eq!(*cached, resolve_theme(&second));
        assert_eq!(cached.animation.profile, "default");
        assert_eq!(cached.typography.font_family, "x");
        assert_eq!(resolver.len(), 2);
    }

    #[test]
    fn test_clear_empties_cache() {
        let mut resolver = ThemeResolver::new();
        resolver.resolve(&request("Blue"));
        resolver.clear();
        assert!(resolver.is_empty());
        assert!(!resolver.is_cached(&request("Blue")));
    }
}
