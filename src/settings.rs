use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Tunables that are policy rather than algorithm: shadow-map resolution,
/// the acne bias, the light frustum, and the window size.
///
/// A missing or unparseable `settings.json` falls back to defaults;
/// *degenerate* values are rejected outright before the frame loop starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    /// 0 means "match the physical framebuffer size", which on high-DPI
    /// displays differs from the logical window size.
    #[serde(default)]
    pub shadow_map_size: u32,
    #[serde(default = "RenderSettings::default_shadow_bias")]
    pub shadow_bias: f32,
    #[serde(default = "RenderSettings::default_light_fov_deg")]
    pub light_fov_deg: f32,
    #[serde(default = "RenderSettings::default_light_near")]
    pub light_near: f32,
    #[serde(default = "RenderSettings::default_light_far")]
    pub light_far: f32,
    #[serde(default)]
    pub resolution: Resolution,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            shadow_map_size: 0,
            shadow_bias: Self::default_shadow_bias(),
            light_fov_deg: Self::default_light_fov_deg(),
            light_near: Self::default_light_near(),
            light_far: Self::default_light_far(),
            resolution: Resolution::default(),
        }
    }
}

impl RenderSettings {
    pub fn load() -> Result<Self, Error> {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Error> {
        use std::fs;

        let path = path.as_ref();
        let settings = match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RenderSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded render settings from {:?}", path);
                    settings
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default render settings.",
                        path, err
                    );
                    RenderSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("No {:?} found. Using default render settings.", path);
                RenderSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default render settings.",
                    path, err
                );
                RenderSettings::default()
            }
        };

        settings.validate()
    }

    /// Rejects degenerate values. Unlike parse failures these do not fall
    /// back: a config that asks for a broken frustum or a zero bias is an
    /// error the user has to fix.
    pub fn validate(self) -> Result<Self, Error> {
        if self.shadow_bias <= 0.0 {
            return Err(Error::Config(format!(
                "shadow_bias must be a small positive constant, got {}",
                self.shadow_bias
            )));
        }
        if !(self.light_near > 0.0 && self.light_near < self.light_far) {
            return Err(Error::Config(format!(
                "light frustum requires 0 < near < far, got near={} far={}",
                self.light_near, self.light_far
            )));
        }
        if !(0.0..180.0).contains(&self.light_fov_deg) || self.light_fov_deg == 0.0 {
            return Err(Error::Config(format!(
                "light_fov_deg must be in (0, 180), got {}",
                self.light_fov_deg
            )));
        }
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(Error::Config(format!(
                "resolution must be non-zero, got {}x{}",
                self.resolution.width, self.resolution.height
            )));
        }
        Ok(self)
    }

    // Nonlinear depth flattens toward the far plane; with a 10..7500
    // frustum, occluders a few hundred units above the ground differ from
    // it by only a few thousandths, so the bias has to sit well below that.
    const fn default_shadow_bias() -> f32 {
        5e-4
    }

    const fn default_light_fov_deg() -> f32 {
        100.0
    }

    const fn default_light_near() -> f32 {
        10.0
    }

    const fn default_light_far() -> f32 {
        7500.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(RenderSettings::default().validate().is_ok());
    }

    #[test]
    fn inverted_light_frustum_is_a_config_error() {
        let settings = RenderSettings {
            light_near: 7500.0,
            light_far: 10.0,
            ..RenderSettings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn zero_near_plane_is_a_config_error() {
        let settings = RenderSettings {
            light_near: 0.0,
            ..RenderSettings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn non_positive_bias_is_a_config_error() {
        let settings = RenderSettings {
            shadow_bias: 0.0,
            ..RenderSettings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn zero_resolution_is_a_config_error() {
        let settings = RenderSettings {
            resolution: Resolution {
                width: 0,
                height: 768,
            },
            ..RenderSettings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn shadow_map_size_zero_means_match_framebuffer() {
        // 0 is the "follow the framebuffer" sentinel, not a degenerate size.
        assert!(RenderSettings::default().validate().is_ok());
    }
}
