//! Pressure projection tests.
//!
//! Tests cover:
//! - Divergence shrinks after a single projection
//! - Residual divergence never grows with more Jacobi sweeps
//! - Warm-started projection still lowers divergence in strong, evolving flow

use glam::{UVec2, Vec2, Vec3};
use whorl_fluids::config::FluidConfig;
use whorl_fluids::splat::Splat;
use whorl_fluids::stable::d2::StableFluid2D;

/// A grid with a few overlapping jets, far from divergence free.
fn stirred_fluid() -> StableFluid2D {
    let mut fluid = StableFluid2D::new(UVec2::new(48, 32));
    fluid.apply_splats(&[
        Splat::new(Vec2::new(0.3, 0.4), Vec2::new(600.0, 200.0), Vec3::ONE, 0.1),
        Splat::new(Vec2::new(0.6, 0.6), Vec2::new(-300.0, 500.0), Vec3::ONE, 0.08),
        Splat::new(Vec2::new(0.5, 0.2), Vec2::new(0.0, -400.0), Vec3::ONE, 0.12),
    ]);
    fluid
}

#[test]
fn test_projection_lowers_mean_divergence() {
    let mut fluid = stirred_fluid();

    let before = fluid.mean_abs_divergence();
    fluid.project(25, 0.0);
    let after = fluid.mean_abs_divergence();

    assert!(before > 1.0, "stirred fluid should diverge, got {before}");
    assert!(after < before, "divergence grew: {before} -> {after}");
}

#[test]
fn test_more_sweeps_never_increase_divergence() {
    let base = stirred_fluid();

    let mut previous = f32::INFINITY;
    for iterations in [1, 5, 25, 100] {
        let mut fluid = base.clone();
        fluid.project(iterations, 0.0);

        let rms = fluid.rms_divergence();
        assert!(
            rms <= previous * (1.0 + 1e-4),
            "{iterations} sweeps left rms divergence {rms}, fewer left {previous}"
        );
        previous = rms;
    }

    let mut raw = base.clone();
    assert!(previous < raw.rms_divergence() * 0.5, "100 sweeps barely helped");
}

#[test]
fn test_warm_started_projection_lowers_divergence_every_tick() {
    let config = FluidConfig::default();
    let dt = 0.016;

    let mut fluid = StableFluid2D::new(UVec2::new(160, 90));
    let splats: Vec<Splat> = (0..10)
        .map(|k| {
            let angle = k as f32 * 0.9;
            let position = Vec2::new(0.1 + 0.08 * k as f32, 0.5 + 0.3 * angle.sin());
            let velocity = 2500.0 * Vec2::new(angle.cos(), angle.sin());
            Splat::new(position, velocity, Vec3::ONE, 0.05)
        })
        .collect();

    for tick in 0..20 {
        fluid.compute_curl();
        fluid.apply_vorticity(dt, config.curl);
        fluid.advect_velocity(dt, config.velocity_dissipation);
        if tick == 0 {
            fluid.apply_splats(&splats);
        }

        for iterations in [1, 5, 25] {
            let mut trial = fluid.clone();
            let before = trial.mean_abs_divergence();
            trial.project(iterations, config.pressure_dissipation);
            let after = trial.mean_abs_divergence();

            assert!(
                after < before,
                "tick {tick}, {iterations} sweeps: divergence {before} -> {after}"
            );
        }

        fluid.project(config.pressure_iterations, config.pressure_dissipation);
        fluid.advect_density(dt, config.density_dissipation);
    }
}
