use glam::Vec3;

/// Default e^-1 falloff distance of a splat, in normalized grid units.
///
/// The classic configuration carries `0.005` as a *squared* radius; this is its square root.
pub const SPLAT_RADIUS: f32 = 0.0707;

/// Largest time step a single tick may advance, in seconds.
pub const MAX_TIME_STEP: f32 = 0.016;

/// Tunable coefficients of the fluid solver.
///
/// Only changed between ticks; a step reads it immutably.
#[derive(Debug, Clone, PartialEq)]
pub struct FluidConfig {
    /// Grid resolution is the display resolution shifted right by this amount.
    pub texture_downsample: u32,
    /// Per-tick decay of density. `1.0` keeps dye forever.
    pub density_dissipation: f32,
    /// Per-tick decay of velocity. `1.0` keeps momentum forever.
    pub velocity_dissipation: f32,
    /// Decay applied to the previous tick's pressure before it seeds the new solve.
    pub pressure_dissipation: f32,
    pub pressure_iterations: usize,
    /// Vorticity confinement strength.
    pub curl: f32,
    pub splat_radius: f32,
    pub splat_force: f32,
    pub paused: bool,
    pub render: RenderFlags,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            texture_downsample: 1,
            density_dissipation: 0.98,
            velocity_dissipation: 0.99,
            pressure_dissipation: 0.8,
            pressure_iterations: 25,
            curl: 30.0,
            splat_radius: SPLAT_RADIUS,
            splat_force: 6000.0,
            paused: false,
            render: RenderFlags::default(),
        }
    }
}

impl FluidConfig {
    /// Returns a copy with every coefficient clamped into its valid range.
    ///
    /// Non-finite values fall back to the default. Each correction is logged at `warn`.
    pub fn sanitized(&self) -> FluidConfig {
        let defaults = FluidConfig::default();

        FluidConfig {
            texture_downsample: clamp_u32("texture_downsample", self.texture_downsample, 0, 8),
            density_dissipation: clamp_f32(
                "density_dissipation",
                self.density_dissipation,
                defaults.density_dissipation,
                0.0,
                1.0,
            ),
            velocity_dissipation: clamp_f32(
                "velocity_dissipation",
                self.velocity_dissipation,
                defaults.velocity_dissipation,
                0.0,
                1.0,
            ),
            pressure_dissipation: clamp_f32(
                "pressure_dissipation",
                self.pressure_dissipation,
                defaults.pressure_dissipation,
                0.0,
                1.0,
            ),
            pressure_iterations: if self.pressure_iterations == 0 {
                log::warn!("pressure_iterations 0 clamped to 1");
                1
            } else {
                self.pressure_iterations
            },
            curl: clamp_f32("curl", self.curl, defaults.curl, 0.0, f32::MAX),
            splat_radius: clamp_f32("splat_radius", self.splat_radius, defaults.splat_radius, 1e-4, f32::MAX),
            splat_force: clamp_f32("splat_force", self.splat_force, defaults.splat_force, 0.0, f32::MAX),
            paused: self.paused,
            render: self.render.clone(),
        }
    }
}

fn clamp_f32(name: &str, value: f32, default: f32, min: f32, max: f32) -> f32 {
    if !value.is_finite() {
        log::warn!("{name} is not finite, using default {default}");
        return default;
    }

    let clamped = value.clamp(min, max);
    if clamped != value {
        log::warn!("{name} {value} clamped to {clamped}");
    }

    clamped
}

fn clamp_u32(name: &str, value: u32, min: u32, max: u32) -> u32 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        log::warn!("{name} {value} clamped to {clamped}");
    }

    clamped
}

/// Display-only options. The solver never reads these; they are handed to the render sink.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFlags {
    pub shading: bool,
    pub colorful: bool,
    pub back_color: Vec3,
    pub transparent: bool,
    pub bloom: bool,
    pub bloom_iterations: u32,
    pub bloom_resolution: u32,
    pub bloom_intensity: f32,
    pub bloom_threshold: f32,
    pub bloom_soft_knee: f32,
}

impl Default for RenderFlags {
    fn default() -> Self {
        Self {
            shading: true,
            colorful: true,
            back_color: Vec3::ZERO,
            transparent: false,
            bloom: true,
            bloom_iterations: 8,
            bloom_resolution: 256,
            bloom_intensity: 0.8,
            bloom_threshold: 0.6,
            bloom_soft_knee: 0.7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_clamps_out_of_range_values() {
        let config = FluidConfig {
            density_dissipation: 1.4,
            velocity_dissipation: -0.2,
            pressure_iterations: 0,
            curl: f32::NAN,
            splat_radius: 0.0,
            ..Default::default()
        }
        .sanitized();

        assert_eq!(config.density_dissipation, 1.0);
        assert_eq!(config.velocity_dissipation, 0.0);
        assert_eq!(config.pressure_iterations, 1);
        assert_eq!(config.curl, 30.0);
        assert_eq!(config.splat_radius, 1e-4);
    }

    #[test]
    fn sanitized_keeps_valid_config() {
        let config = FluidConfig::default();
        assert_eq!(config.sanitized(), config);
    }
}
