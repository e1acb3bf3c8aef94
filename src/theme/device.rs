//! Screen-size tiers and the UI metrics each one scales to

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceClass {
    #[default]
    Mobile,
    Tablet,
    Desktop,
    LargeDesktop,
}

/// Per-tier scale factors, all sizes in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviceMetrics {
    pub typography_scale: f64,
    pub icon_size: f64,
    pub border_radius: f64,
    pub button_height: f64,
    pub slider_track_height: f64,
}

const MOBILE: DeviceMetrics = DeviceMetrics {
    typography_scale: 1.0,
    icon_size: 24.0,
    border_radius: 12.0,
    button_height: 48.0,
    slider_track_height: 4.0,
};

const TABLET: DeviceMetrics = DeviceMetrics {
    typography_scale: 1.1,
    icon_size: 28.0,
    border_radius: 14.0,
    button_height: 52.0,
    slider_track_height: 5.0,
};

const DESKTOP: DeviceMetrics = DeviceMetrics {
    typography_scale: 1.15,
    icon_size: 28.0,
    border_radius: 16.0,
    button_height: 56.0,
    slider_track_height: 6.0,
};

const LARGE_DESKTOP: DeviceMetrics = DeviceMetrics {
    typography_scale: 1.25,
    icon_size: 32.0,
    border_radius: 20.0,
    button_height: 60.0,
    slider_track_height: 6.0,
};

impl DeviceClass {
    pub const ALL: [DeviceClass; 4] = [
        DeviceClass::Mobile,
        DeviceClass::Tablet,
        DeviceClass::Desktop,
        DeviceClass::LargeDesktop,
    ];

    /// Classify a logical screen width
    pub fn from_width(width: f64) -> Self {
        match width {
            w if w < 600.0 => DeviceClass::Mobile,
            w if w < 1024.0 => DeviceClass::Tablet,
            w if w < 1440.0 => DeviceClass::Desktop,
            _ => DeviceClass::LargeDesktop,
        }
    }

    pub fn metrics(&self) -> DeviceMetrics {
        match self {
            DeviceClass::Mobile => MOBILE,
            DeviceClass::Tablet => TABLET,
            DeviceClass::Desktop => DESKTOP,
            DeviceClass::LargeDesktop => LARGE_DESKTOP,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Tablet => "tablet",
            DeviceClass::Desktop => "desktop",
            DeviceClass::LargeDesktop => "largeDesktop",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DeviceClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "mobile" | "phone" => Ok(DeviceClass::Mobile),
            "tablet" => Ok(DeviceClass::Tablet),
            "desktop" => Ok(DeviceClass::Desktop),
            "largedesktop" => Ok(DeviceClass::LargeDesktop),
            _ => Err(format!(
                "unknown device class '{}' (expected mobile, tablet, desktop or large-desktop)",
                s
            )),
        }
    }
}
