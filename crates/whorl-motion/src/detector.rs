use glam::Vec2;

use crate::{error::MotionError, frame::Frame};

/// Share of moving pixels, in percent, above which a frame pair counts as motion.
pub const DETECTION_THRESHOLD: f32 = 1.0;

/// Width of the frame the detector scans. Height follows the capture aspect ratio.
pub const WORKING_WIDTH: u32 = 160;

pub const DEFAULT_SENSITIVITY: u8 = 30;

const HIGHLIGHT: [u8; 3] = [255, 0, 0];
const MARKER: [u8; 3] = [0, 255, 0];
const MARKER_RADIUS: f32 = 5.0;
const MARKER_WIDTH: f32 = 2.0;

/// Outcome of comparing two consecutive frames.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionResult {
    pub detected: bool,
    /// Mean position of the moving pixels, in frame pixels. Zero when nothing moved.
    pub centroid: Vec2,
    /// Moving pixels as a percentage of all pixels.
    pub magnitude: f32,
}

/// Mean per-channel difference a pixel must exceed to count as moving.
#[inline]
pub fn pixel_threshold(sensitivity: u8) -> f32 {
    15.0 * sensitivity.min(100) as f32 / 100.0
}

/// Compares `previous` against `current`, neither of which is modified.
pub fn detect(previous: &Frame, current: &Frame, sensitivity: u8) -> Result<MotionResult, MotionError> {
    scan(previous, current, sensitivity, |_, _| {})
}

/// Like [`detect`], also returning a copy of `current` with moving pixels painted red and a
/// lime ring around the centroid.
pub fn detect_with_overlay(
    previous: &Frame,
    current: &Frame,
    sensitivity: u8,
) -> Result<(MotionResult, Frame), MotionError> {
    let mut overlay = current.clone();
    let mut moving = 0;

    let result = scan(previous, current, sensitivity, |x, y| {
        overlay.set_rgb(x, y, HIGHLIGHT);
        moving += 1;
    })?;

    if moving > 0 {
        draw_ring(&mut overlay, result.centroid, MARKER_RADIUS, MARKER_WIDTH, MARKER);
    }

    Ok((result, overlay))
}

/// Scans both frames, calling `on_moving` for every moving pixel.
fn scan(
    previous: &Frame,
    current: &Frame,
    sensitivity: u8,
    mut on_moving: impl FnMut(u32, u32),
) -> Result<MotionResult, MotionError> {
    if previous.dimensions() != current.dimensions() {
        return Err(MotionError::DimensionMismatch {
            previous: previous.dimensions(),
            current: current.dimensions(),
        });
    }

    let threshold = pixel_threshold(sensitivity);
    let (width, height) = current.dimensions();

    let mut count = 0u64;
    let mut sum_x = 0u64;
    let mut sum_y = 0u64;

    for y in 0..height {
        for x in 0..width {
            let a = previous.rgb(x, y);
            let b = current.rgb(x, y);

            let diff = a
                .iter()
                .zip(b.iter())
                .map(|(&a, &b)| a.abs_diff(b) as f32)
                .sum::<f32>()
                / 3.0;

            if diff > threshold {
                count += 1;
                sum_x += x as u64;
                sum_y += y as u64;
                on_moving(x, y);
            }
        }
    }

    if count == 0 {
        return Ok(MotionResult::default());
    }

    let centroid = Vec2::new(sum_x as f32 / count as f32, sum_y as f32 / count as f32);
    let magnitude = 100.0 * count as f32 / (width as f32 * height as f32);

    Ok(MotionResult {
        detected: magnitude > DETECTION_THRESHOLD,
        centroid,
        magnitude,
    })
}

/// Paints every pixel whose centre lies within `width / 2` of the circle of `radius` at `centre`.
fn draw_ring(frame: &mut Frame, centre: Vec2, radius: f32, width: f32, color: [u8; 3]) {
    let outer = radius + 0.5 * width;
    let inner = radius - 0.5 * width;

    let x0 = (centre.x - outer).floor().max(0.0) as u32;
    let y0 = (centre.y - outer).floor().max(0.0) as u32;
    let x1 = ((centre.x + outer).ceil().max(0.0) as u32).min(frame.width());
    let y1 = ((centre.y + outer).ceil().max(0.0) as u32).min(frame.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(centre + 0.5);
            if d >= inner && d <= outer {
                frame.set_rgb(x, y, color);
            }
        }
    }
}

/// Keeps the previous working frame and turns each new capture into a [`MotionResult`].
#[derive(Debug, Clone)]
pub struct MotionDetector {
    working_width: u32,
    sensitivity: u8,
    previous: Option<Frame>,
}

impl Default for MotionDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY)
    }
}

impl MotionDetector {
    pub fn new(sensitivity: u8) -> Self {
        Self {
            working_width: WORKING_WIDTH,
            sensitivity: sensitivity.min(100),
            previous: None,
        }
    }

    pub fn with_working_width(mut self, width: u32) -> Self {
        self.working_width = width.max(1);
        self
    }

    #[inline]
    pub fn working_width(&self) -> u32 {
        self.working_width
    }

    #[inline]
    pub fn sensitivity(&self) -> u8 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: u8) {
        if sensitivity > 100 {
            log::warn!("sensitivity {sensitivity} clamped to 100");
        }

        self.sensitivity = sensitivity.min(100);
    }

    /// Drops the stored frame; the next capture starts a new comparison.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Downsamples `frame` and compares it with the previous capture.
    ///
    /// Returns `None` for the first frame, and for a frame whose working size differs from the
    /// previous one (the capture resolution changed). Either way `frame` becomes the new previous.
    pub fn process(&mut self, frame: &Frame) -> Option<MotionResult> {
        let current = frame.downsample_to_width(self.working_width);
        let result = self
            .previous
            .as_ref()
            .and_then(|previous| Self::compared(detect(previous, &current, self.sensitivity)));

        self.previous = Some(current);
        result
    }

    /// Like [`MotionDetector::process`], also returning the annotated working frame.
    pub fn process_with_overlay(&mut self, frame: &Frame) -> Option<(MotionResult, Frame)> {
        let current = frame.downsample_to_width(self.working_width);
        let result = self.previous.as_ref().and_then(|previous| {
            Self::compared(detect_with_overlay(previous, &current, self.sensitivity))
        });

        self.previous = Some(current);
        result
    }

    fn compared<T>(result: Result<T, MotionError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                log::debug!("skipping motion scan: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_scales_with_sensitivity() {
        assert_eq!(pixel_threshold(0), 0.0);
        assert_eq!(pixel_threshold(100), 15.0);
        assert_eq!(pixel_threshold(250), 15.0);
        assert!((pixel_threshold(30) - 4.5).abs() < 1e-6);
    }

    #[test]
    fn single_pixel_is_below_detection() {
        let previous = Frame::solid(20, 10, [0, 0, 0]);
        let mut current = previous.clone();
        current.set_rgb(3, 4, [255, 255, 255]);

        let result = detect(&previous, &current, 30).unwrap();
        assert!(!result.detected);
        assert_eq!(result.centroid, Vec2::new(3.0, 4.0));
        assert!((result.magnitude - 0.5).abs() < 1e-6);
    }

    #[test]
    fn diff_at_threshold_is_not_moving() {
        let previous = Frame::solid(4, 4, [10, 10, 10]);
        let current = Frame::solid(4, 4, [25, 25, 25]);

        assert!(!detect(&previous, &current, 100).unwrap().detected);
        assert!(detect(&previous, &current, 99).unwrap().detected);
    }

    #[test]
    fn overlay_leaves_inputs_untouched() {
        let previous = Frame::solid(32, 32, [0, 0, 0]);
        let mut current = previous.clone();
        for y in 10..20 {
            for x in 10..20 {
                current.set_rgb(x, y, [200, 200, 200]);
            }
        }
        let snapshot = current.clone();

        let (result, overlay) = detect_with_overlay(&previous, &current, 30).unwrap();

        assert_eq!(current, snapshot);
        assert!(result.detected);
        assert_eq!(overlay.rgb(12, 12), HIGHLIGHT);
        assert_eq!(overlay.rgb(0, 0), [0, 0, 0]);

        // The ring passes five pixels right of the centroid at (14.5, 14.5).
        assert_eq!(overlay.rgb(19, 14), MARKER);
    }

    #[test]
    fn first_frame_yields_nothing() {
        let mut detector = MotionDetector::default();
        assert_eq!(detector.process(&Frame::solid(320, 240, [5, 5, 5])), None);
        assert!(detector.process(&Frame::solid(320, 240, [5, 5, 5])).is_some());
    }

    #[test]
    fn resolution_change_restarts_comparison() {
        let mut detector = MotionDetector::default();
        detector.process(&Frame::solid(320, 240, [0, 0, 0]));

        assert_eq!(detector.process(&Frame::solid(320, 180, [0, 0, 0])), None);
        assert!(detector.process(&Frame::solid(320, 180, [0, 0, 0])).is_some());
    }
}
