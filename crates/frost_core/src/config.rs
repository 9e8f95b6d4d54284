//! Blur appearance and timing settings

use serde::{Deserialize, Serialize};

/// Default blur strength (spread multiplier of the kernel taps)
pub const DEFAULT_STRENGTH: f32 = 0.95;
/// Default corner radius of the composited image, in device pixels
pub const DEFAULT_CORNER_RADIUS: f32 = 6.0;
/// Default activation debounce, in seconds
pub const DEFAULT_ACTIVATION_DELAY: f64 = 0.15;

fn env_f32(name: &str) -> Option<f32> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f32>().ok())
}

fn env_f64(name: &str) -> Option<f64> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
}

/// Per-region blur settings
///
/// Deserializes with per-field defaults, so a host config file only needs the keys it
/// wants to change:
///
/// ```toml
/// strength = 0.6
/// activation_delay = 0.25
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurSettings {
    /// Kernel spread in [0, 1]; scales tap distance, never tap weight
    pub strength: f32,
    /// Corner radius of the composited rounded image
    pub corner_radius: f32,
    /// Seconds the intent must be held before the first capture
    pub activation_delay: f64,
}

impl Default for BlurSettings {
    fn default() -> Self {
        Self {
            strength: DEFAULT_STRENGTH,
            corner_radius: DEFAULT_CORNER_RADIUS,
            activation_delay: DEFAULT_ACTIVATION_DELAY,
        }
    }
}

impl BlurSettings {
    /// Apply environment overrides
    ///
    /// Env:
    /// - FROST_BLUR_STRENGTH=0.8
    /// - FROST_CORNER_RADIUS=12
    /// - FROST_ACTIVATION_DELAY=0.3
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_f32("FROST_BLUR_STRENGTH") {
            self.strength = v;
        }
        if let Some(v) = env_f32("FROST_CORNER_RADIUS") {
            self.corner_radius = v;
        }
        if let Some(v) = env_f64("FROST_ACTIVATION_DELAY") {
            self.activation_delay = v;
        }

        let settings = self.sanitized();
        tracing::debug!(
            "blur settings: strength={}, corner_radius={}, activation_delay={}s",
            settings.strength,
            settings.corner_radius,
            settings.activation_delay
        );
        settings
    }

    /// Clamp every field into its valid range; NaN falls back to the default
    pub fn sanitized(self) -> Self {
        let strength = if self.strength.is_nan() {
            DEFAULT_STRENGTH
        } else {
            self.strength.clamp(0.0, 1.0)
        };
        let corner_radius = if self.corner_radius.is_nan() {
            DEFAULT_CORNER_RADIUS
        } else {
            self.corner_radius.max(0.0)
        };
        let activation_delay = if self.activation_delay.is_nan() {
            DEFAULT_ACTIVATION_DELAY
        } else {
            self.activation_delay.max(0.0)
        };

        Self {
            strength,
            corner_radius,
            activation_delay,
        }
    }
}
