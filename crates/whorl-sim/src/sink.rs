use glam::{UVec2, Vec2, Vec3};
use ndarray::Array2;
use whorl_fluids::config::RenderFlags;

/// Read-only view of the fluid handed to a renderer after each tick.
#[derive(Clone, Copy, Debug)]
pub struct FieldView<'a> {
    pub density: &'a Array2<Vec3>,
    /// Face velocities, see [`whorl_fluids::stable::d2::StableFluid2D`].
    pub velocity: &'a Array2<Vec2>,
    pub grid_size: UVec2,
    pub display_size: UVec2,
    pub render: &'a RenderFlags,
}

/// Consumer of simulated frames.
pub trait RenderSink {
    fn present(&mut self, view: &FieldView<'_>);
}
