use whorl_fluids::config::FluidConfig;

use crate::color::ColorMode;

pub const DEFAULT_SENSITIVITY: u8 = whorl_motion::detector::DEFAULT_SENSITIVITY;

/// Slider and selector values from the control panel.
///
/// Sliders left at `None` keep whatever the config already holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlSettings {
    /// Fluid density slider, percent.
    pub density_pct: Option<u8>,
    /// Fluid velocity slider, percent.
    pub velocity_pct: Option<u8>,
    /// Motion sensitivity, `0..=100`.
    pub sensitivity: u8,
    pub color_mode: ColorMode,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            density_pct: None,
            velocity_pct: None,
            sensitivity: DEFAULT_SENSITIVITY,
            color_mode: ColorMode::default(),
        }
    }
}

impl ControlSettings {
    /// Writes the slider mappings into `config`.
    pub fn apply(&self, config: &mut FluidConfig) {
        if let Some(pct) = self.density_pct {
            config.density_dissipation = density_dissipation(pct);
        }

        if let Some(pct) = self.velocity_pct {
            config.velocity_dissipation = velocity_dissipation(pct);
        }
    }
}

fn percent(pct: u8) -> f32 {
    if pct > 100 {
        log::warn!("slider value {pct} clamped to 100");
    }

    pct.min(100) as f32 / 100.0
}

/// Density slider to dissipation: `1 - pct * 0.3`, so a fuller slider fades dye faster.
pub fn density_dissipation(pct: u8) -> f32 {
    1.0 - percent(pct) * 0.3
}

/// Velocity slider to dissipation: `0.9 + pct * 0.09`.
pub fn velocity_dissipation(pct: u8) -> f32 {
    0.9 + percent(pct) * 0.09
}
