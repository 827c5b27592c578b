//! Dissipation and splat scenarios run through full solver steps.

use glam::{UVec2, Vec2, Vec3};
use ndarray::Array2;
use whorl_fluids::config::FluidConfig;
use whorl_fluids::splat::{apply_splat, Splat};
use whorl_fluids::stable::d2::StableFluid2D;
use whorl_fluids::Fluid;

const DT: f32 = 0.016;

/// Count 4-connected regions of cells holding any dye.
fn count_regions(density: &Array2<Vec3>) -> usize {
    let (nx, ny) = density.dim();
    let mut seen = Array2::from_elem((nx, ny), false);
    let mut regions = 0;

    for start in density.indexed_iter().filter(|(_, d)| d.max_element() > 0.0).map(|(ij, _)| ij) {
        if seen[start] {
            continue;
        }

        regions += 1;
        seen[start] = true;
        let mut stack = vec![start];

        while let Some((i, j)) = stack.pop() {
            let neighbours = [
                (i.wrapping_sub(1), j),
                (i + 1, j),
                (i, j.wrapping_sub(1)),
                (i, j + 1),
            ];

            for (a, b) in neighbours {
                if a < nx && b < ny && !seen[(a, b)] && density[(a, b)].max_element() > 0.0 {
                    seen[(a, b)] = true;
                    stack.push((a, b));
                }
            }
        }
    }

    regions
}

#[test]
fn test_density_decays_every_tick_without_splats() {
    let mut fluid = StableFluid2D::new(UVec2::new(64, 48));
    fluid.apply_splats(&[Splat::new(Vec2::splat(0.5), Vec2::new(40.0, -25.0), Vec3::new(1.0, 0.5, 0.2), 0.08)]);

    let config = FluidConfig {
        density_dissipation: 0.95,
        ..Default::default()
    };

    let mut previous = fluid.total_density();
    for tick in 0..30 {
        fluid.step(DT, &config, &[]);
        let total = fluid.total_density();

        assert!(
            total.x < previous.x && total.y < previous.y && total.z < previous.z,
            "tick {tick}: density went from {previous} to {total}"
        );
        previous = total;
    }
}

#[test]
fn test_splat_order_does_not_matter() {
    let first = Splat::new(Vec2::new(0.4, 0.5), Vec2::new(120.0, -40.0), Vec3::new(0.9, 0.2, 0.2), 0.1);
    let second = Splat::new(Vec2::new(0.55, 0.45), Vec2::new(-60.0, 90.0), Vec3::new(0.2, 0.3, 0.9), 0.07);

    let mut velocity_a = Array2::from_elem((40, 30), Vec2::ZERO);
    let mut density_a = Array2::from_elem((40, 30), Vec3::ZERO);
    apply_splat(&mut velocity_a, &mut density_a, &first);
    apply_splat(&mut velocity_a, &mut density_a, &second);

    let mut velocity_b = Array2::from_elem((40, 30), Vec2::ZERO);
    let mut density_b = Array2::from_elem((40, 30), Vec3::ZERO);
    apply_splat(&mut velocity_b, &mut density_b, &second);
    apply_splat(&mut velocity_b, &mut density_b, &first);

    for (a, b) in velocity_a.iter().zip(velocity_b.iter()) {
        assert!((*a - *b).length() < 1e-4, "velocity {a} vs {b}");
    }
    for (a, b) in density_a.iter().zip(density_b.iter()) {
        assert!((*a - *b).length() < 1e-6, "density {a} vs {b}");
    }
}

#[test]
fn test_far_apart_splats_stay_disjoint() {
    let mut fluid = StableFluid2D::new(UVec2::new(64, 64));
    let centres = [
        Vec2::new(0.2, 0.2),
        Vec2::new(0.8, 0.2),
        Vec2::new(0.5, 0.5),
        Vec2::new(0.2, 0.8),
        Vec2::new(0.8, 0.8),
    ];

    let splats: Vec<Splat> = centres
        .iter()
        .map(|&c| Splat::new(c, Vec2::ZERO, Vec3::ONE, 0.02))
        .collect();
    fluid.apply_splats(&splats);

    assert_eq!(count_regions(fluid.density()), 5);

    for c in centres {
        let cell = (c * 64.0).floor();
        let d = fluid.density()[(cell.x as usize, cell.y as usize)];
        assert!(d.x > 0.5, "centre {c} only got {d}");
    }
}

#[test]
fn test_corner_pushes_keep_walls_closed() {
    let mut fluid = StableFluid2D::new(UVec2::new(32, 32));
    let push = Splat::new(Vec2::new(0.98, 0.98), Vec2::new(800.0, 800.0), Vec3::ONE, 0.1);

    for _ in 0..10 {
        fluid.step(DT, &FluidConfig::default(), &[push]);
    }

    let velocity = fluid.velocity();
    for k in 0..32 {
        assert_eq!(velocity[(0, k)].x, 0.0);
        assert_eq!(velocity[(k, 0)].y, 0.0);
    }
    assert!(velocity.iter().all(|v| v.is_finite()));
}

#[test]
fn test_density_decays_under_strong_converging_flow() {
    let mut fluid = StableFluid2D::new(UVec2::new(96, 64));
    let config = FluidConfig::default();

    // Jets aimed at each other pile dye up where they meet.
    fluid.step(
        DT,
        &config,
        &[
            Splat::new(Vec2::new(0.3, 0.5), Vec2::new(2500.0, 300.0), Vec3::ONE, 0.1),
            Splat::new(Vec2::new(0.7, 0.5), Vec2::new(-2500.0, -300.0), Vec3::ONE, 0.1),
            Splat::new(Vec2::new(0.5, 0.2), Vec2::new(0.0, 2000.0), Vec3::ONE, 0.1),
        ],
    );

    let mut previous = fluid.total_density();
    for tick in 0..60 {
        fluid.step(DT, &config, &[]);
        let total = fluid.total_density();

        assert!(
            total.x < previous.x && total.y < previous.y && total.z < previous.z,
            "tick {tick}: density went from {previous} to {total}"
        );
        previous = total;
    }
}
