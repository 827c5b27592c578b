use std::time::Instant;

use glam::{UVec2, Vec2, Vec3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use whorl_fluids::{
    config::{FluidConfig, MAX_TIME_STEP},
    scene::Scene,
    splat::Splat,
    stable::d2::{StableFluid2D, MIN_GRID_CELLS},
};
use whorl_motion::{Frame, FrameSource, MotionDetector, MotionResult, RateLimiter};

use crate::{
    color::ColorMode,
    pointer::{Pointer, PointerId, PointerTable, Touch, PRIMARY_POINTER},
    settings::ControlSettings,
    sink::{FieldView, RenderSink},
};

/// Fewest splats a plain [`Simulation::reset`] injects.
pub const RESET_MIN_SPLATS: usize = 5;
/// Extra splats a plain reset may add on top of the minimum, exclusive.
pub const RESET_EXTRA_SPLATS: usize = 20;

/// Grid resolution for a display of `display` pixels.
pub fn grid_size(display: UVec2, downsample: u32) -> UVec2 {
    (display >> downsample.min(31)).max(UVec2::splat(MIN_GRID_CELLS))
}

/// Counters over the life of a [`Simulation`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimulationStats {
    /// Ticks on which the solver advanced.
    pub steps: u64,
    pub splats_applied: u64,
    pub motion_splats: u64,
    pub pointer_splats: u64,
    pub resets: u64,
    pub resizes: u64,
}

/// The latest detection, kept so both loops can emit from it.
#[derive(Clone, Copy, Debug)]
struct MotionSample {
    result: MotionResult,
    /// Size of the working frame the centroid is measured in.
    frame_size: Vec2,
}

/// Everything one visualizer session owns: the fluid scene, input state, motion pipeline and
/// the clocks that pace them.
pub struct Simulation {
    scene: Scene<StableFluid2D, FluidConfig>,
    /// Display size in logical pixels.
    display_size: UVec2,
    /// Device pixels per logical pixel. Pointer positions are stored in device pixels.
    pixel_ratio: f32,

    pointers: PointerTable,
    detector: MotionDetector,
    limiter: RateLimiter,
    motion: Option<MotionSample>,
    capture_warned: bool,

    color_mode: ColorMode,
    rng: StdRng,

    epoch: Option<Instant>,
    last_tick: Option<Instant>,
    /// Seconds since the first tick, drives the rainbow palette.
    elapsed: f32,

    stats: SimulationStats,
}

impl Simulation {
    pub fn new(display_size: UVec2, config: FluidConfig) -> Self {
        Self::with_rng(display_size, config, StdRng::from_entropy())
    }

    /// A simulation whose random choices are reproducible from `seed`.
    pub fn with_seed(display_size: UVec2, config: FluidConfig, seed: u64) -> Self {
        Self::with_rng(display_size, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(display_size: UVec2, config: FluidConfig, rng: StdRng) -> Self {
        let config = config.sanitized();
        let grid = grid_size(display_size, config.texture_downsample);

        log::debug!("display {}x{}, grid {}x{}", display_size.x, display_size.y, grid.x, grid.y);

        Self {
            scene: Scene::new(StableFluid2D::new(grid), config),
            display_size,
            pixel_ratio: 1.0,
            pointers: PointerTable::new(),
            detector: MotionDetector::default(),
            limiter: RateLimiter::default(),
            motion: None,
            capture_warned: false,
            color_mode: ColorMode::default(),
            rng,
            epoch: None,
            last_tick: None,
            elapsed: 0.0,
            stats: SimulationStats::default(),
        }
    }

    pub fn config(&self) -> &FluidConfig {
        self.scene.params()
    }

    /// Replaces the solver config. Reallocates the grid when the downsample factor changes.
    pub fn set_config(&mut self, config: FluidConfig) {
        let config = config.sanitized();
        let regrid = config.texture_downsample != self.config().texture_downsample;

        self.scene.set_params(config);
        if regrid {
            self.reallocate();
        }
    }

    /// Applies control panel values to the config, detector and color policy.
    pub fn apply_settings(&mut self, settings: &ControlSettings) {
        let mut config = self.config().clone();
        settings.apply(&mut config);
        self.set_config(config);

        self.detector.set_sensitivity(settings.sensitivity);
        self.color_mode = settings.color_mode;
    }

    pub fn set_paused(&mut self, paused: bool) {
        let mut config = self.config().clone();
        config.paused = paused;
        self.scene.set_params(config);
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        self.color_mode = mode;
    }

    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 };
    }

    pub fn fluid(&self) -> &StableFluid2D {
        &self.scene.fluid
    }

    pub fn display_size(&self) -> UVec2 {
        self.display_size
    }

    pub fn grid_size(&self) -> UVec2 {
        self.scene.fluid.size()
    }

    pub fn pointers(&self) -> &PointerTable {
        &self.pointers
    }

    pub fn pointer(&self, id: PointerId) -> Option<&Pointer> {
        self.pointers.get(id)
    }

    /// Splats waiting for the next step.
    pub fn pending(&self) -> &[Splat] {
        self.scene.pending()
    }

    pub fn stats(&self) -> SimulationStats {
        self.stats
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Mean absolute divergence of the current velocity.
    pub fn mean_divergence(&mut self) -> f32 {
        self.scene.fluid.mean_abs_divergence()
    }

    /// Tears down every field and rebuilds the grid for a new display size.
    pub fn resize(&mut self, display_size: UVec2) {
        if display_size == self.display_size {
            return;
        }

        self.display_size = display_size;
        self.reallocate();
    }

    fn reallocate(&mut self) {
        let grid = grid_size(self.display_size, self.config().texture_downsample);

        log::debug!(
            "resized to display {}x{}, grid {}x{}",
            self.display_size.x,
            self.display_size.y,
            grid.x,
            grid.y
        );

        self.scene.replace_fluid(StableFluid2D::new(grid));
        self.stats.resizes += 1;
    }

    #[inline]
    fn scale_by_pixel_ratio(&self, v: Vec2) -> Vec2 {
        (v * self.pixel_ratio).floor()
    }

    /// Display size in device pixels, the space pointer positions live in.
    #[inline]
    fn device_size(&self) -> Vec2 {
        (self.display_size.as_vec2() * self.pixel_ratio).floor().max(Vec2::ONE)
    }

    /// Device pixels, y down, to normalized grid space, y up.
    #[inline]
    fn normalize(&self, p: Vec2) -> Vec2 {
        let size = self.device_size();
        Vec2::new(p.x / size.x, 1.0 - p.y / size.y)
    }

    /// Queues a splat at `position` in normalized grid space.
    pub fn splat(&mut self, position: Vec2, velocity: Vec2, color: Vec3) {
        let radius = self.config().splat_radius;
        self.scene.push_splat(Splat::new(position, velocity, color, radius));
    }

    fn next_color(&mut self) -> Vec3 {
        self.color_mode.pick(self.elapsed, &mut self.rng)
    }

    /// A splat at `position` pushed in a random direction with `amount` percent of the force.
    fn random_splat(&mut self, position: Vec2, amount: f32) {
        let force = self.config().splat_force * amount / 100.0;
        let velocity = Vec2::new(
            (self.rng.gen::<f32>() - 0.5) * force,
            (self.rng.gen::<f32>() - 0.5) * force,
        );
        let color = self.next_color();

        self.splat(position, velocity, color);
    }

    pub fn pointer_down(&mut self, position: Vec2) {
        self.press(PRIMARY_POINTER, position);
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        self.drag(PRIMARY_POINTER, position);
    }

    pub fn pointer_up(&mut self) {
        self.pointers.up(PRIMARY_POINTER);
    }

    pub fn touch_start(&mut self, touches: &[Touch]) {
        for touch in touches {
            self.press(PointerId(touch.id), touch.position);
        }
    }

    pub fn touch_move(&mut self, touches: &[Touch]) {
        for touch in touches {
            self.drag(PointerId(touch.id), touch.position);
        }
    }

    pub fn touch_end(&mut self, touches: &[Touch]) {
        for touch in touches {
            if !self.pointers.up(PointerId(touch.id)) {
                log::trace!("touch end for untracked id {}", touch.id);
            }
        }
    }

    fn press(&mut self, id: PointerId, position: Vec2) {
        let position = self.scale_by_pixel_ratio(position);
        let color = self.next_color();
        self.pointers.down(id, position, color);
    }

    /// Moves a pressed pointer and queues a splat along its motion.
    fn drag(&mut self, id: PointerId, position: Vec2) {
        let position = self.scale_by_pixel_ratio(position);
        let Some(pointer) = self.pointers.move_to(id, position).copied() else {
            return;
        };

        if pointer.delta == Vec2::ZERO {
            return;
        }

        let size = self.device_size();
        let velocity = Vec2::new(pointer.delta.x / size.x, -pointer.delta.y / size.y) * self.config().splat_force;

        self.splat(self.normalize(pointer.position), velocity, pointer.color);
        self.stats.pointer_splats += 1;
    }

    /// Pulls one frame from `source` and runs it through the motion pipeline.
    ///
    /// An unavailable source is reported once; after that it is skipped silently.
    pub fn poll_capture<S: FrameSource + ?Sized>(&mut self, source: &mut S, now: Instant) -> Option<MotionResult> {
        if !source.is_available() {
            if !self.capture_warned {
                log::warn!("no capture source available, fluid responds to pointer input only");
                self.capture_warned = true;
            }
            return None;
        }

        let frame = source.next_frame()?;
        self.handle_frame(&frame, now)
    }

    /// Compares `frame` with the previous capture and emits a splat if motion is found and the
    /// rate limit allows.
    pub fn handle_frame(&mut self, frame: &Frame, now: Instant) -> Option<MotionResult> {
        let result = self.detector.process(frame)?;
        let (width, height) = frame.working_size(self.detector.working_width());

        self.handle_motion(result, Vec2::new(width as f32, height as f32), now);
        Some(result)
    }

    /// Records a detection measured on a frame of `frame_size` pixels.
    pub fn handle_motion(&mut self, result: MotionResult, frame_size: Vec2, now: Instant) {
        self.motion = result.detected.then_some(MotionSample { result, frame_size });
        self.emit_motion(now);
    }

    /// Emits a splat from the latest detection if the rate limiter lets one through.
    fn emit_motion(&mut self, now: Instant) -> bool {
        let Some(sample) = self.motion else {
            return false;
        };

        if !self.limiter.try_acquire(now) {
            return false;
        }

        let centroid = sample.result.centroid / sample.frame_size.max(Vec2::ONE);
        let position = Vec2::new(centroid.x, 1.0 - centroid.y);

        self.random_splat(position, sample.result.magnitude);
        self.stats.motion_splats += 1;
        true
    }

    /// Drops pending splats and injects a burst of 5 to 24 random ones.
    pub fn reset(&mut self) -> usize {
        let amount = RESET_MIN_SPLATS + self.rng.gen_range(0..RESET_EXTRA_SPLATS);
        self.reset_with(amount)
    }

    /// Drops pending splats and injects exactly `amount` random full-force splats.
    pub fn reset_with(&mut self, amount: usize) -> usize {
        self.scene.clear_splats();

        for _ in 0..amount {
            let position = Vec2::new(self.rng.gen(), self.rng.gen());
            self.random_splat(position, 100.0);
        }

        log::info!("reset with {amount} splats");
        self.stats.resets += 1;
        amount
    }

    /// Advances the session to `now`. Returns the number of splats the solver applied.
    ///
    /// The time step is the wall time since the previous tick, capped at [`MAX_TIME_STEP`]. While
    /// paused the solver holds still and splats keep queueing.
    pub fn tick(&mut self, now: Instant) -> usize {
        let epoch = *self.epoch.get_or_insert(now);
        self.elapsed = now.saturating_duration_since(epoch).as_secs_f32();

        let dt = match self.last_tick {
            Some(last) => now.saturating_duration_since(last).as_secs_f32().min(MAX_TIME_STEP),
            None => MAX_TIME_STEP,
        };
        self.last_tick = Some(now);

        self.emit_motion(now);

        if self.config().paused {
            return 0;
        }

        self.step(dt)
    }

    /// Advances the solver by `dt` seconds, applying every pending splat.
    pub fn step(&mut self, dt: f32) -> usize {
        let applied = self.scene.step(dt.clamp(0.0, MAX_TIME_STEP));

        self.stats.steps += 1;
        self.stats.splats_applied += applied as u64;

        applied
    }

    pub fn present<R: RenderSink + ?Sized>(&self, sink: &mut R) {
        let fluid = &self.scene.fluid;

        sink.present(&FieldView {
            density: fluid.density(),
            velocity: fluid.velocity(),
            grid_size: fluid.size(),
            display_size: self.display_size,
            render: &self.config().render,
        });
    }
}
