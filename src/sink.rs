use glam::Vec3;
use whorl_sim::{FieldView, RenderSink};

/// Records what a renderer would have drawn, without drawing it.
#[derive(Debug, Default)]
pub struct StatsSink {
    pub frames: u64,
    pub total_density: Vec3,
    pub peak_density: f32,
}

impl RenderSink for StatsSink {
    fn present(&mut self, view: &FieldView<'_>) {
        self.frames += 1;
        self.total_density = view.density.iter().copied().sum();
        self.peak_density = view
            .density
            .iter()
            .map(|d| d.max_element())
            .fold(self.peak_density, f32::max);
    }
}
