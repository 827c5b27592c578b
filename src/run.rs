use std::{
    f32::consts::TAU,
    time::{Duration, Instant},
};

use clap::Args;
use glam::{UVec2, Vec2};
use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use whorl_fluids::config::FluidConfig;
use whorl_motion::{source::NoCapture, FrameSource, MotionDetector, RateLimiter};
use whorl_sim::{ColorMode, ControlSettings, Simulation};

use crate::{capture::SyntheticCapture, error::RunError, sink::StatsSink};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Display width, in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,
    /// Display height, in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,
    /// Number of solver frames to simulate.
    #[arg(long, default_value_t = 600)]
    frames: u64,
    /// Solver frames per second.
    #[arg(long, default_value_t = 60)]
    fps: u32,
    /// Capture frames per second, independent of the solver.
    #[arg(long, default_value_t = 30)]
    capture_fps: u32,
    /// Seed for every random choice. Random if omitted.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = ColorMode::Rainbow)]
    color_mode: ColorMode,
    /// Motion sensitivity, 0 to 100.
    #[arg(long, default_value_t = whorl_sim::settings::DEFAULT_SENSITIVITY)]
    sensitivity: u8,
    /// Fluid density slider, 0 to 100.
    #[arg(long)]
    density: Option<u8>,
    /// Fluid velocity slider, 0 to 100.
    #[arg(long)]
    velocity: Option<u8>,
    /// Vorticity confinement strength.
    #[arg(long)]
    curl: Option<f32>,
    #[arg(long)]
    pressure_iterations: Option<usize>,
    /// Run as if no capture device were present.
    #[arg(long)]
    no_capture: bool,
    /// Drag the mouse in a circle for the whole run.
    #[arg(long)]
    drag: bool,
    /// Halve the display size at this frame.
    #[arg(long)]
    resize_at: Option<u64>,
    /// Inject a reset burst at this frame.
    #[arg(long)]
    reset_at: Option<u64>,
}

#[derive(Args, Debug)]
pub struct MotionArgs {
    /// Capture width, in pixels.
    #[arg(long, default_value_t = 640)]
    width: u32,
    /// Capture height, in pixels.
    #[arg(long, default_value_t = 360)]
    height: u32,
    #[arg(long, default_value_t = 60)]
    frames: u64,
    #[arg(long, default_value_t = 30)]
    fps: u32,
    #[arg(long, default_value_t = whorl_sim::settings::DEFAULT_SENSITIVITY)]
    sensitivity: u8,
    /// Also count the pixels highlighted in the annotated frame.
    #[arg(long)]
    overlay: bool,
}

fn positive(name: &'static str, value: u32) -> Result<u32, RunError> {
    if value == 0 {
        Err(RunError::NonPositive { name })
    } else {
        Ok(value)
    }
}

fn progress_bar(len: u64) -> Result<ProgressBar, RunError> {
    let bar_template = "Running Simulation {spinner:.green} [{elapsed}] [{bar:50.white/white}] {pos}/{len} ({eta})";
    let style = ProgressStyle::with_template(bar_template)?
        .progress_chars("=> ")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    Ok(ProgressBar::new(len).with_style(style))
}

/// Offset of `frame` from the start of a loop running every `period`.
fn frame_time(period: Duration, frame: u64) -> Duration {
    period.mul_f64(frame as f64)
}

/// Point on the scripted drag circle at `t` seconds.
fn drag_position(display: UVec2, t: f32) -> Vec2 {
    let size = display.as_vec2();
    let radius = 0.25 * size.y;
    let theta = 0.5 * TAU * t;

    size / 2.0 + radius * Vec2::new(theta.cos(), theta.sin())
}

pub fn run(args: &RunArgs) -> Result<(), RunError> {
    let fps = positive("fps", args.fps)?;
    let capture_fps = positive("capture-fps", args.capture_fps)?;
    let display = UVec2::new(positive("width", args.width)?, positive("height", args.height)?);

    let mut config = FluidConfig::default();
    if let Some(curl) = args.curl {
        config.curl = curl;
    }
    if let Some(iterations) = args.pressure_iterations {
        config.pressure_iterations = iterations;
    }

    let mut sim = match args.seed {
        Some(seed) => Simulation::with_seed(display, config, seed),
        None => Simulation::new(display, config),
    };
    sim.apply_settings(&ControlSettings {
        density_pct: args.density,
        velocity_pct: args.velocity,
        sensitivity: args.sensitivity,
        color_mode: args.color_mode,
    });

    let mut source: Box<dyn FrameSource> = if args.no_capture {
        Box::new(NoCapture)
    } else {
        Box::new(SyntheticCapture::new(640, 360, capture_fps))
    };
    let mut sink = StatsSink::default();

    log::info!(
        "simulating {} frames at {}x{} (grid {}x{})",
        args.frames,
        display.x,
        display.y,
        sim.grid_size().x,
        sim.grid_size().y
    );

    // Both loops run off one virtual monotonic clock.
    let start = Instant::now();
    let tick_period = Duration::from_secs_f64(1.0 / fps as f64);
    let capture_period = Duration::from_secs_f64(1.0 / capture_fps as f64);
    let mut next_capture = Duration::ZERO;
    let mut captures = 0u64;

    for frame in (0..args.frames).progress_with(progress_bar(args.frames)?) {
        let tick_at = frame_time(tick_period, frame);

        while next_capture <= tick_at {
            sim.poll_capture(source.as_mut(), start + next_capture);
            next_capture += capture_period;
            captures += 1;
        }

        if args.resize_at == Some(frame) {
            sim.resize(sim.display_size() / 2);
        }

        if args.reset_at == Some(frame) {
            sim.reset();
        }

        if args.drag {
            let p = drag_position(sim.display_size(), tick_at.as_secs_f32());
            if frame == 0 {
                sim.pointer_down(p);
            } else {
                sim.pointer_move(p);
            }
        }

        sim.tick(start + tick_at);
        sim.present(&mut sink);
    }

    if args.drag {
        sim.pointer_up();
    }

    let stats = sim.stats();
    log::info!(
        "simulated {} frames ({} captures): {} splats applied, {} from motion, {} from pointer, {} resets",
        stats.steps,
        captures,
        stats.splats_applied,
        stats.motion_splats,
        stats.pointer_splats,
        stats.resets
    );
    log::info!(
        "final total density {:.3}, peak {:.3}, mean divergence {:.5}",
        sink.total_density.element_sum(),
        sink.peak_density,
        sim.mean_divergence()
    );

    Ok(())
}

pub fn motion(args: &MotionArgs) -> Result<(), RunError> {
    let fps = positive("fps", args.fps)?;
    let mut capture = SyntheticCapture::new(positive("width", args.width)?, positive("height", args.height)?, fps);
    let mut detector = MotionDetector::new(args.sensitivity);
    let mut limiter = RateLimiter::default();

    let start = Instant::now();
    let period = Duration::from_secs_f64(1.0 / fps as f64);

    for frame in 0..args.frames {
        let Some(image) = capture.next_frame() else {
            break;
        };
        let now = start + frame_time(period, frame);

        let (result, highlighted) = if args.overlay {
            match detector.process_with_overlay(&image) {
                Some((result, overlay)) => {
                    let red = (0..overlay.height())
                        .flat_map(|y| (0..overlay.width()).map(move |x| (x, y)))
                        .filter(|&(x, y)| overlay.rgb(x, y) == [255, 0, 0])
                        .count();
                    (result, Some(red))
                }
                None => continue,
            }
        } else {
            match detector.process(&image) {
                Some(result) => (result, None),
                None => continue,
            }
        };

        let emitted = result.detected && limiter.try_acquire(now);

        print!(
            "frame {frame:>4}: detected {:<5} centroid ({:>6.1}, {:>6.1}) magnitude {:>6.2}% emit {:<5}",
            result.detected, result.centroid.x, result.centroid.y, result.magnitude, emitted
        );
        match highlighted {
            Some(red) => println!(" highlighted {red}"),
            None => println!(),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance(a: Duration, b: Duration) -> Duration {
        if a > b { a - b } else { b - a }
    }

    #[test]
    fn frame_time_does_not_wrap_past_u32() {
        let period = Duration::from_millis(10);
        let frame = u32::MAX as u64 + 5;

        let expected = Duration::from_millis(10 * frame);
        let actual = frame_time(period, frame);

        assert!(actual > Duration::from_secs(40_000_000));
        assert!(distance(actual, expected) < Duration::from_millis(1));
    }

    #[test]
    fn frame_time_at_sixty_fps() {
        let period = Duration::from_secs_f64(1.0 / 60.0);
        assert!(distance(frame_time(period, 120), Duration::from_secs(2)) < Duration::from_micros(1));
    }
}
