//! The separable Gaussian kernel shared by both blur passes
//!
//! The fragment programs evaluate this kernel on the GPU. This module is its CPU
//! statement: tap weights, per-tap sample offsets and the normalized weighted sum,
//! so the kernel's properties can be checked without a device.

/// Taps on each side of the center tap
pub const KERNEL_RADIUS: i32 = 4;

/// Total taps per axis
pub const KERNEL_TAPS: usize = (2 * KERNEL_RADIUS + 1) as usize;

/// Unnormalized weight of tap `i`: `exp(-0.5 · i² / (r² · 0.5))`
pub fn tap_weight(i: i32) -> f32 {
    let radius = KERNEL_RADIUS as f32;
    let tap = i as f32;
    (-0.5 * tap * tap / (radius * radius * 0.5)).exp()
}

/// Nine-tap Gaussian along one axis
///
/// Reference statement of what the fragment programs compute; the renderer never
/// evaluates it. The shader library tests pin the programs to [`KERNEL_RADIUS`] and
/// [`tap_weight`]'s expression, and the GPU backend's headless tests compare blurred
/// pixels against [`GaussianKernel::normalized`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaussianKernel {
    weights: [f32; KERNEL_TAPS],
    total: f32,
}

impl GaussianKernel {
    pub fn new() -> Self {
        let mut weights = [0.0; KERNEL_TAPS];
        for (slot, i) in weights.iter_mut().zip(-KERNEL_RADIUS..=KERNEL_RADIUS) {
            *slot = tap_weight(i);
        }
        let total = weights.iter().sum();
        Self { weights, total }
    }

    /// Raw weights, from tap `-r` to tap `r`
    pub fn weights(&self) -> &[f32; KERNEL_TAPS] {
        &self.weights
    }

    /// Sum of the raw weights; the divisor of the normalized output
    pub fn total_weight(&self) -> f32 {
        self.total
    }

    /// Weights divided by their sum
    pub fn normalized(&self) -> [f32; KERNEL_TAPS] {
        self.weights.map(|w| w / self.total)
    }

    /// UV offsets of each tap along the blurred axis
    ///
    /// `pixel_size` is `1 / width` for the horizontal pass and `1 / height` for the
    /// vertical one. `strength` widens the spread without touching the weights.
    pub fn offsets(&self, pixel_size: f32, strength: f32) -> [f32; KERNEL_TAPS] {
        let mut offsets = [0.0; KERNEL_TAPS];
        for (slot, i) in offsets.iter_mut().zip(-KERNEL_RADIUS..=KERNEL_RADIUS) {
            *slot = pixel_size * i as f32 * strength;
        }
        offsets
    }

    /// Sample coordinate of each tap around `uv`, clamped to [0, 1]
    pub fn sample_coords(&self, uv: f32, pixel_size: f32, strength: f32) -> [f32; KERNEL_TAPS] {
        self.offsets(pixel_size, strength)
            .map(|offset| (uv + offset).clamp(0.0, 1.0))
    }

    /// Normalized weighted sum of nine RGBA samples
    pub fn apply(&self, samples: &[[f32; 4]; KERNEL_TAPS]) -> [f32; 4] {
        let mut color = [0.0f32; 4];
        for (sample, weight) in samples.iter().zip(self.weights.iter()) {
            for (channel, value) in color.iter_mut().zip(sample.iter()) {
                *channel += value * weight;
            }
        }
        color.map(|c| c / self.total)
    }
}

impl Default for GaussianKernel {
    fn default() -> Self {
        Self::new()
    }
}
