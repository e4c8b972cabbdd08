//! Single snowflake parameters

use crate::config::SnowSettings;

/// Inner size of the host window, in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Identifies one flake within the emitter that spawned it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlakeId(pub u64);

/// Everything the host needs to draw and animate one flake.
#[derive(Clone, Debug, PartialEq)]
pub struct Flake {
    pub id: FlakeId,
    pub spawned_at: f64,
    pub font_size: f64,
    pub start_x: f64,
    /// Horizontal travel over the whole fall, in `[-wind/2, wind/2]`.
    pub drift: f64,
    /// Vertical travel: viewport height plus the flake's own size.
    pub travel: f64,
    pub start_opacity: f64,
    pub end_opacity: f64,
    pub duration_ms: u32,
}

impl Flake {
    /// Rolls a flake. `rand` yields uniform values in `[0, 1)`.
    pub fn roll(
        id: FlakeId,
        spawned_at: f64,
        settings: &SnowSettings,
        viewport: Viewport,
        mut rand: impl FnMut() -> f64,
    ) -> Self {
        let font_size = rand() * (settings.large - settings.small) + settings.small;
        let start_x = rand() * viewport.width;
        let drift = (rand() - 0.5) * settings.wind;

        Self {
            id,
            spawned_at,
            font_size,
            start_x,
            drift,
            travel: viewport.height + font_size,
            start_opacity: settings.start_opacity,
            end_opacity: settings.end_opacity,
            duration_ms: settings.speed,
        }
    }

    pub fn expires_at(&self) -> f64 {
        self.spawned_at + self.duration_ms as f64
    }

    /// CSS transform applied once the fall begins.
    pub fn end_transform(&self) -> String {
        format!("translate({}px, {}px)", self.drift, self.travel)
    }

    /// CSS transition covering the whole fall.
    pub fn transition(&self) -> String {
        format!("all {}s linear", self.duration_ms as f64 / 1000.0)
    }
}
