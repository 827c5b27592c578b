use glam::{Vec2, Vec3};
use ndarray::Array2;

/// Gaussian falloff is cut off at this many radii; beyond it a splat contributes nothing.
pub const SPLAT_CUTOFF: f32 = 3.0;

/// A localized injection of momentum and dye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splat {
    /// Centre in normalized grid space, `[0, 1]²`, y up.
    pub position: Vec2,
    /// Velocity added at the centre, in cells per second.
    pub velocity: Vec2,
    /// Dye added at the centre, each channel in `[0, 1]`.
    pub color: Vec3,
    /// e^-1 falloff distance in normalized units, measured along the grid's y axis.
    pub radius: f32,
}

impl Splat {
    pub fn new(position: Vec2, velocity: Vec2, color: Vec3, radius: f32) -> Self {
        Self {
            position,
            velocity,
            color,
            radius,
        }
    }

    /// Falloff weight at `p`, given in cell units of a grid of `size` cells.
    ///
    /// The x offset is stretched by the aspect ratio so the splat stays circular in cells.
    #[inline]
    fn weight(&self, p: Vec2, size: Vec2) -> f32 {
        let mut d = p / size - self.position;
        d.x *= size.x / size.y;

        let d2 = d.length_squared();
        let r2 = self.radius * self.radius;

        if d2 > SPLAT_CUTOFF * SPLAT_CUTOFF * r2 {
            0.0
        } else {
            (-d2 / r2).exp()
        }
    }
}

/// Adds `splat` to the velocity and density channels.
///
/// The velocity grid is staggered: the x component of cell `(i, j)` lives on its left face and
/// the y component on its bottom face, so each component is weighted at its own face. Wall faces
/// are left for the solver's boundary pass to zero.
///
/// Splats add into the current buffers and commute. A non-positive or non-finite radius leaves
/// the fields untouched.
pub fn apply_splat(velocity: &mut Array2<Vec2>, density: &mut Array2<Vec3>, splat: &Splat) {
    if !(splat.radius > 0.0 && splat.radius.is_finite()) {
        return;
    }

    let (nx, ny) = density.dim();
    let size = Vec2::new(nx as f32, ny as f32);

    // Cells are square, so the cutoff disk spans the same number of cells on both axes.
    let reach = SPLAT_CUTOFF * splat.radius * size.y + 1.0;
    let centre = splat.position * size;

    let i0 = (centre.x - reach).floor().max(0.0) as usize;
    let j0 = (centre.y - reach).floor().max(0.0) as usize;
    let i1 = ((centre.x + reach).ceil().max(0.0) as usize).min(nx);
    let j1 = ((centre.y + reach).ceil().max(0.0) as usize).min(ny);

    for i in i0..i1 {
        for j in j0..j1 {
            let (x, y) = (i as f32, j as f32);

            let w = splat.weight(Vec2::new(x + 0.5, y + 0.5), size);
            if w > 0.0 {
                density[(i, j)] += splat.color * w;
            }

            let wu = splat.weight(Vec2::new(x, y + 0.5), size);
            let wv = splat.weight(Vec2::new(x + 0.5, y), size);
            velocity[(i, j)] += Vec2::new(splat.velocity.x * wu, splat.velocity.y * wv);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_sits_on_the_centre_cell() {
        let mut velocity = Array2::from_elem((32, 32), Vec2::ZERO);
        let mut density = Array2::from_elem((32, 32), Vec3::ZERO);

        let splat = Splat::new(Vec2::new(16.5 / 32.0, 8.5 / 32.0), Vec2::ZERO, Vec3::ONE, 0.05);
        apply_splat(&mut velocity, &mut density, &splat);

        let peak = density[(16, 8)];
        assert!((peak - Vec3::ONE).length() < 1e-5);
        assert!(density[(17, 8)].x < peak.x);
        assert_eq!(density[(0, 31)], Vec3::ZERO);
    }

    #[test]
    fn stays_circular_on_wide_grids() {
        let mut velocity = Array2::from_elem((64, 16), Vec2::ZERO);
        let mut density = Array2::from_elem((64, 16), Vec3::ZERO);

        let splat = Splat::new(Vec2::new(32.5 / 64.0, 8.5 / 16.0), Vec2::ZERO, Vec3::ONE, 0.2);
        apply_splat(&mut velocity, &mut density, &splat);

        let right = density[(35, 8)].x;
        let up = density[(32, 11)].x;
        assert!((right - up).abs() < 1e-5, "right {right} vs up {up}");
    }

    #[test]
    fn degenerate_radius_is_a_no_op() {
        let mut velocity = Array2::from_elem((8, 8), Vec2::ZERO);
        let mut density = Array2::from_elem((8, 8), Vec3::ZERO);

        for radius in [0.0, -1.0, f32::NAN] {
            let splat = Splat::new(Vec2::splat(0.5), Vec2::ONE, Vec3::ONE, radius);
            apply_splat(&mut velocity, &mut density, &splat);
        }

        assert!(density.iter().all(|d| *d == Vec3::ZERO));
        assert!(velocity.iter().all(|v| *v == Vec2::ZERO));
    }

    #[test]
    fn far_away_splat_touches_nothing() {
        let mut velocity = Array2::from_elem((8, 8), Vec2::ZERO);
        let mut density = Array2::from_elem((8, 8), Vec3::ZERO);

        let splat = Splat::new(Vec2::new(-40.0, 90.0), Vec2::ONE, Vec3::ONE, 0.1);
        apply_splat(&mut velocity, &mut density, &splat);

        assert!(density.iter().all(|d| *d == Vec3::ZERO));
    }
}
