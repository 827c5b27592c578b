use glam::UVec2;
use splat::Splat;

pub mod config;
pub mod field;
pub mod scene;
pub mod splat;
pub mod stable;

pub trait Fluid {
    type Params;

    /// Advances the fluid by `dt` seconds, applying `splats` as external forces.
    fn step(&mut self, dt: f32, params: &Self::Params, splats: &[Splat]);

    /// Grid size, in cells.
    fn size(&self) -> UVec2;
}
