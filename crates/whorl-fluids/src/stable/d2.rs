use glam::{UVec2, Vec2, Vec3};
use ndarray::{azip, Array2};

use crate::{
    config::FluidConfig,
    field::{bilerp, clamped, DoubleField},
    splat::{apply_splat, Splat},
    Fluid,
};

/// Smallest grid the solver accepts along either axis.
pub const MIN_GRID_CELLS: u32 = 3;

/// Incompressible 2D flow on a fixed grid, advanced with the stable fluids scheme.
///
/// Velocity is staggered: `velocity[(i, j)].x` is the flow through the left face of cell
/// `(i, j)` and `.y` the flow through its bottom face, in cells per second. Faces on the domain
/// walls are held at zero. Density is cell-centred RGB dye.
#[derive(Debug, Clone)]
pub struct StableFluid2D {
    grid_size: UVec2,

    /// Face velocities.
    velocity: DoubleField<Vec2>,
    /// Dye concentration per cell.
    density: DoubleField<Vec3>,
    /// Pressure per cell, kept between ticks to warm-start the solve.
    pressure: DoubleField<f32>,
    /// Net outflow per cell.
    divergence: Array2<f32>,
    /// Scalar vorticity per cell.
    curl: Array2<f32>,
    /// Cell-centred velocity, scratch for curl.
    centred: Array2<Vec2>,
    /// Cell-centred confinement force, scratch for vorticity.
    force: Array2<Vec2>,
}

impl StableFluid2D {
    pub fn new(grid_size: UVec2) -> Self {
        let grid_size = grid_size.max(UVec2::splat(MIN_GRID_CELLS));
        let shape = (grid_size.x as usize, grid_size.y as usize);

        Self {
            grid_size,
            velocity: DoubleField::new(grid_size, Vec2::ZERO),
            density: DoubleField::new(grid_size, Vec3::ZERO),
            pressure: DoubleField::new(grid_size, 0.0),
            divergence: Array2::from_elem(shape, 0.0),
            curl: Array2::from_elem(shape, 0.0),
            centred: Array2::from_elem(shape, Vec2::ZERO),
            force: Array2::from_elem(shape, Vec2::ZERO),
        }
    }

    #[inline]
    pub fn size(&self) -> UVec2 {
        self.grid_size
    }

    /// Width over height.
    #[inline]
    pub fn aspect(&self) -> f32 {
        self.grid_size.x as f32 / self.grid_size.y as f32
    }

    pub fn velocity(&self) -> &Array2<Vec2> {
        self.velocity.read()
    }

    pub fn density(&self) -> &Array2<Vec3> {
        self.density.read()
    }

    pub fn pressure(&self) -> &Array2<f32> {
        self.pressure.read()
    }

    pub fn divergence(&self) -> &Array2<f32> {
        &self.divergence
    }

    pub fn curl(&self) -> &Array2<f32> {
        &self.curl
    }

    /// Sum of all dye over the grid, per channel.
    pub fn total_density(&self) -> Vec3 {
        self.density.read().iter().copied().sum()
    }

    /// Recomputes divergence from the current velocity and returns its mean absolute value.
    pub fn mean_abs_divergence(&mut self) -> f32 {
        self.compute_divergence();
        self.divergence.iter().map(|d| d.abs()).sum::<f32>() / self.divergence.len() as f32
    }

    /// Recomputes divergence from the current velocity and returns its root mean square.
    pub fn rms_divergence(&mut self) -> f32 {
        self.compute_divergence();
        (self.divergence.iter().map(|d| d * d).sum::<f32>() / self.divergence.len() as f32).sqrt()
    }

    pub fn clear(&mut self) {
        self.velocity.fill(Vec2::ZERO);
        self.density.fill(Vec3::ZERO);
        self.pressure.fill(0.0);
        self.divergence.fill(0.0);
        self.curl.fill(0.0);
    }

    /// Velocity at `p`, in cell units (cell `(i, j)` spans `[i, i + 1] × [j, j + 1]`).
    #[inline]
    fn sample_velocity(velocity: &Array2<Vec2>, p: Vec2) -> Vec2 {
        let u = bilerp(velocity, p - Vec2::new(0.0, 0.5)).x;
        let v = bilerp(velocity, p - Vec2::new(0.5, 0.0)).y;

        Vec2::new(u, v)
    }

    /// Zeroes the velocity through the domain walls.
    pub fn enforce_boundaries(&mut self) {
        let velocity = self.velocity.read_mut();
        let (nx, ny) = velocity.dim();

        for j in 0..ny {
            velocity[(0, j)].x = 0.0;
        }

        for i in 0..nx {
            velocity[(i, 0)].y = 0.0;
        }
    }

    pub fn compute_curl(&mut self) {
        let velocity = self.velocity.read();
        let (nx, ny) = velocity.dim();

        for i in 0..nx {
            for j in 0..ny {
                let right = if i + 1 < nx { velocity[(i + 1, j)].x } else { 0.0 };
                let top = if j + 1 < ny { velocity[(i, j + 1)].y } else { 0.0 };
                let v = velocity[(i, j)];

                self.centred[(i, j)] = Vec2::new(0.5 * (v.x + right), 0.5 * (v.y + top));
            }
        }

        for i in 0..nx {
            for j in 0..ny {
                let (ii, jj) = (i as isize, j as isize);

                let l = clamped(&self.centred, ii - 1, jj).y;
                let r = clamped(&self.centred, ii + 1, jj).y;
                let b = clamped(&self.centred, ii, jj - 1).x;
                let t = clamped(&self.centred, ii, jj + 1).x;

                self.curl[(i, j)] = 0.5 * ((r - l) - (t - b));
            }
        }
    }

    /// Pushes velocity along `∇|ω|` rotated by 90°, scaled by `strength * ω`.
    ///
    /// The force is evaluated at cell centres and averaged onto the interior faces. Expects
    /// [`StableFluid2D::compute_curl`] to have run on the current velocity.
    pub fn apply_vorticity(&mut self, dt: f32, strength: f32) {
        if strength == 0.0 {
            return;
        }

        let curl = &self.curl;
        azip!((index (i, j), force in &mut self.force) {
            let (ii, jj) = (i as isize, j as isize);

            let l = clamped(curl, ii - 1, jj).abs();
            let r = clamped(curl, ii + 1, jj).abs();
            let b = clamped(curl, ii, jj - 1).abs();
            let t = clamped(curl, ii, jj + 1).abs();

            let mut f = 0.5 * Vec2::new(t - b, r - l);
            f /= f.length() + 1e-4;
            f *= strength * curl[(i, j)];
            f.y = -f.y;

            *force = f;
        });

        let velocity = self.velocity.read_mut();
        let (nx, ny) = velocity.dim();

        for i in 0..nx {
            for j in 0..ny {
                let f = self.force[(i, j)];

                if i > 0 {
                    velocity[(i, j)].x += 0.5 * (self.force[(i - 1, j)].x + f.x) * dt;
                }

                if j > 0 {
                    velocity[(i, j)].y += 0.5 * (self.force[(i, j - 1)].y + f.y) * dt;
                }
            }
        }
    }

    /// Semi-Lagrangian self-advection of the face velocities.
    pub fn advect_velocity(&mut self, dt: f32, dissipation: f32) {
        let max = self.grid_size.as_vec2();
        let (src, dst) = self.velocity.split();

        azip!((index (i, j), out in dst) {
            let (x, y) = (i as f32, j as f32);

            let face_u = Vec2::new(x, y + 0.5);
            let back_u = (face_u - dt * Self::sample_velocity(src, face_u)).clamp(Vec2::ZERO, max);

            let face_v = Vec2::new(x + 0.5, y);
            let back_v = (face_v - dt * Self::sample_velocity(src, face_v)).clamp(Vec2::ZERO, max);

            *out = dissipation * Vec2::new(
                bilerp(src, back_u - Vec2::new(0.0, 0.5)).x,
                bilerp(src, back_v - Vec2::new(0.5, 0.0)).y,
            );
        });

        self.velocity.swap();
        self.enforce_boundaries();
    }

    /// Semi-Lagrangian advection of dye by the current velocity.
    ///
    /// Backtracing does not conserve mass, so each channel is scaled down whenever its total
    /// would exceed `dissipation` times the total before the pass.
    pub fn advect_density(&mut self, dt: f32, dissipation: f32) {
        let max = self.grid_size.as_vec2();
        let velocity = self.velocity.read();
        let (src, dst) = self.density.split();

        for ((i, j), out) in dst.indexed_iter_mut() {
            let centre = Vec2::new(i as f32 + 0.5, j as f32 + 0.5);
            let back = (centre - dt * Self::sample_velocity(velocity, centre)).clamp(Vec2::ZERO, max);

            *out = bilerp(src, back - Vec2::splat(0.5)) * dissipation;
        }

        let before = channel_totals(src);
        let after = channel_totals(dst);

        let mut scale = Vec3::ONE;
        for c in 0..3 {
            let bound = before[c] * dissipation as f64;
            if after[c] > bound && after[c] > 0.0 {
                scale[c] = (bound / after[c]) as f32;
            }
        }

        if scale != Vec3::ONE {
            dst.mapv_inplace(|d| d * scale);
        }

        self.density.swap();
    }

    /// Adds splats into the current velocity and density buffers.
    pub fn apply_splats(&mut self, splats: &[Splat]) {
        if splats.is_empty() {
            return;
        }

        let velocity = self.velocity.read_mut();
        let density = self.density.read_mut();

        for splat in splats {
            apply_splat(velocity, density, splat);
        }

        self.enforce_boundaries();
    }

    /// Forward difference of the face velocities. Wall faces count as zero.
    pub fn compute_divergence(&mut self) {
        let velocity = self.velocity.read();
        let (nx, ny) = velocity.dim();

        azip!((index (i, j), div in &mut self.divergence) {
            let v = velocity[(i, j)];
            let right = if i + 1 < nx { velocity[(i + 1, j)].x } else { 0.0 };
            let top = if j + 1 < ny { velocity[(i, j + 1)].y } else { 0.0 };

            *div = (right - v.x) + (top - v.y);
        });
    }

    /// Jacobi relaxation of `∇²p = divergence` with Neumann walls.
    ///
    /// The previous pressure is scaled by `dissipation` and used as the starting guess, unless
    /// it leaves a larger residual than starting from zero. Each sweep is a doubly stochastic
    /// map on the residual, so from an accepted guess the residual never grows.
    pub fn solve_pressure(&mut self, iterations: usize, dissipation: f32) {
        self.pressure.read_mut().mapv_inplace(|p| p * dissipation);

        if dissipation != 0.0 && !self.warm_start_helps() {
            self.pressure.fill(0.0);
        }

        for _ in 0..iterations {
            let (src, dst) = self.pressure.split();

            azip!((index (i, j), out in dst, &div in &self.divergence) {
                let (ii, jj) = (i as isize, j as isize);

                let l = clamped(src, ii - 1, jj);
                let r = clamped(src, ii + 1, jj);
                let b = clamped(src, ii, jj - 1);
                let t = clamped(src, ii, jj + 1);

                *out = 0.25 * (l + r + b + t - div);
            });

            self.pressure.swap();
        }
    }

    /// Whether the current pressure leaves no more residual, in both L1 and L2, than zero does.
    fn warm_start_helps(&self) -> bool {
        let pressure = self.pressure.read();

        let (mut warm_l1, mut warm_l2) = (0.0_f64, 0.0_f64);
        let (mut cold_l1, mut cold_l2) = (0.0_f64, 0.0_f64);

        for ((i, j), &div) in self.divergence.indexed_iter() {
            let (ii, jj) = (i as isize, j as isize);
            let p = pressure[(i, j)];

            let laplacian = clamped(pressure, ii - 1, jj)
                + clamped(pressure, ii + 1, jj)
                + clamped(pressure, ii, jj - 1)
                + clamped(pressure, ii, jj + 1)
                - 4.0 * p;

            let warm = (div - laplacian) as f64;
            let cold = div as f64;

            warm_l1 += warm.abs();
            warm_l2 += warm * warm;
            cold_l1 += cold.abs();
            cold_l2 += cold * cold;
        }

        warm_l1 <= cold_l1 && warm_l2 <= cold_l2
    }

    /// Subtracts the pressure gradient from every interior face.
    pub fn subtract_gradient(&mut self) {
        let pressure = self.pressure.read();
        let velocity = self.velocity.read_mut();
        let (nx, ny) = velocity.dim();

        for i in 0..nx {
            for j in 0..ny {
                let p = pressure[(i, j)];

                if i > 0 {
                    velocity[(i, j)].x -= p - pressure[(i - 1, j)];
                }

                if j > 0 {
                    velocity[(i, j)].y -= p - pressure[(i, j - 1)];
                }
            }
        }
    }

    /// Divergence, pressure solve and gradient subtraction.
    pub fn project(&mut self, iterations: usize, dissipation: f32) {
        self.compute_divergence();
        self.solve_pressure(iterations.max(1), dissipation);
        self.subtract_gradient();
    }
}

/// Per-channel sum of `field`, accumulated in double precision.
fn channel_totals(field: &Array2<Vec3>) -> [f64; 3] {
    field.iter().fold([0.0; 3], |[r, g, b], d| {
        [r + d.x as f64, g + d.y as f64, b + d.z as f64]
    })
}

impl Fluid for StableFluid2D {
    type Params = FluidConfig;

    fn step(&mut self, dt: f32, params: &Self::Params, splats: &[Splat]) {
        self.compute_curl();
        self.apply_vorticity(dt, params.curl);
        self.advect_velocity(dt, params.velocity_dissipation);
        self.apply_splats(splats);
        self.project(params.pressure_iterations, params.pressure_dissipation);
        self.advect_density(dt, params.density_dissipation);
    }

    fn size(&self) -> UVec2 {
        self.grid_size
    }
}
