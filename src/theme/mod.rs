//! Theme resolution for the hymnal UI
//!
//! Palettes, variants and animation profiles are static tables. A
//! [`ThemeRequest`] picks one of each plus a device class and brightness,
//! and [`ThemeResolver`] turns it into a memoized [`ResolvedTheme`].

mod color;
mod device;
mod motion;
mod palette;
mod resolver;

pub use color::Hsl;
pub use device::{DeviceClass, DeviceMetrics};
pub use motion::{AnimationProfile, PageTransition, ANIMATION_PROFILES, DEFAULT_ANIMATION_PROFILE};
pub use palette::{
    Personality, ThemeColorSet, ThemeVariant, COLOR_SETS, DEFAULT_COLOR_KEY, DEFAULT_VARIANT,
    VARIANTS,
};
pub use resolver::{
    resolve_theme, AnimationSpec, AppBarStyle, Brightness, ButtonStyle, CardStyle, ColorScheme,
    ComponentStyles, DialogStyle, IconStyle, InputStyle, ResolvedTheme, ResolverStats,
    SliderStyle, TextStyleSpec, ThemeRequest, ThemeResolver, Typography, DEFAULT_FONT_FAMILY,
};
