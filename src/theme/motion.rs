//! Animation profiles

use serde::Serialize;

pub const DEFAULT_ANIMATION_PROFILE: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PageTransition {
    FadeThrough,
    SharedAxis,
    Slide,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationProfile {
    pub name: &'static str,
    pub short_ms: u32,
    pub medium_ms: u32,
    pub long_ms: u32,
    pub curve: &'static str,
    pub page_transition: PageTransition,
}

pub const ANIMATION_PROFILES: &[AnimationProfile] = &[
    AnimationProfile {
        name: "default",
        short_ms: 150,
        medium_ms: 300,
        long_ms: 500,
        curve: "easeInOut",
        page_transition: PageTransition::FadeThrough,
    },
    AnimationProfile {
        name: "smooth",
        short_ms: 250,
        medium_ms: 400,
        long_ms: 650,
        curve: "easeInOutCubic",
        page_transition: PageTransition::SharedAxis,
    },
    AnimationProfile {
        name: "snappy",
        short_ms: 100,
        medium_ms: 180,
        long_ms: 260,
        curve: "easeOut",
        page_transition: PageTransition::Slide,
    },
    // Accessibility: honour the OS "reduce motion" setting
    AnimationProfile {
        name: "reduced",
        short_ms: 0,
        medium_ms: 0,
        long_ms: 0,
        curve: "linear",
        page_transition: PageTransition::None,
    },
];

impl AnimationProfile {
    pub fn lookup(key: &str) -> Option<&'static AnimationProfile> {
        ANIMATION_PROFILES
            .iter()
            .find(|profile| profile.name.eq_ignore_ascii_case(key.trim()))
    }

    pub fn resolve_with_default(key: &str) -> &'static AnimationProfile {
        Self::lookup(key).unwrap_or(&ANIMATION_PROFILES[0])
    }

    pub fn is_motion_enabled(&self) -> bool {
        self.medium_ms > 0
    }
}
