use smallvec::SmallVec;

use super::{splat::Splat, Fluid};

pub struct Scene<F, P> {
    /// The fluid for this scene.
    pub fluid: F,
    /// The parameters for this scene's fluid.
    params: P,
    /// Splats queued for the next step.
    pending: SmallVec<[Splat; 16]>,
}

impl<F: Fluid<Params = P>, P> Scene<F, P> {
    #[inline(always)]
    pub fn new(fluid: F, params: P) -> Self {
        Self {
            fluid,
            params,
            pending: SmallVec::new(),
        }
    }

    #[inline(always)]
    pub fn params(&self) -> &P {
        &self.params
    }

    /// Replaces the parameters. Takes effect at the next step.
    pub fn set_params(&mut self, params: P) {
        self.params = params;
    }

    /// Queues a splat for the next step.
    pub fn push_splat(&mut self, splat: Splat) {
        self.pending.push(splat);
    }

    /// Drops every queued splat.
    pub fn clear_splats(&mut self) {
        self.pending.clear();
    }

    pub fn pending(&self) -> &[Splat] {
        &self.pending
    }

    /// Swaps in a new fluid, keeping params and queued splats. Splat positions are normalized,
    /// so they land in the same place on the new grid.
    pub fn replace_fluid(&mut self, fluid: F) -> F {
        std::mem::replace(&mut self.fluid, fluid)
    }

    /// Steps the fluid, consuming the queued splats. Returns how many were applied.
    pub fn step(&mut self, dt: f32) -> usize {
        let applied = self.pending.len();

        self.fluid.step(dt, &self.params, &self.pending);
        self.pending.clear();

        applied
    }
}
