use std::f32::consts::TAU;

use whorl_motion::{Frame, FrameSource};

/// A deterministic stand-in for a camera: a bright square circling over a gradient.
pub struct SyntheticCapture {
    width: u32,
    height: u32,
    fps: f32,
    frame: u32,
}

impl SyntheticCapture {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            fps: fps.max(1) as f32,
            frame: 0,
        }
    }

    fn render(&self) -> Frame {
        let (w, h) = (self.width, self.height);
        let t = self.frame as f32 / self.fps;

        let mut frame = Frame::solid(w, h, [0, 0, 0]);
        for y in 0..h {
            for x in 0..w {
                let r = (x * 255 / w) as u8;
                let g = (y * 255 / h) as u8;
                frame.set_rgb(x, y, [r, g, 40]);
            }
        }

        // One revolution per second around the centre.
        let side = (h / 3).max(1);
        let radius = h as f32 / 4.0;
        let cx = w as f32 / 2.0 + radius * (TAU * t).cos();
        let cy = h as f32 / 2.0 + radius * (TAU * t).sin();
        let x0 = (cx - side as f32 / 2.0).max(0.0) as u32;
        let y0 = (cy - side as f32 / 2.0).max(0.0) as u32;

        for y in y0..(y0 + side).min(h) {
            for x in x0..(x0 + side).min(w) {
                frame.set_rgb(x, y, [250, 250, 250]);
            }
        }

        frame
    }
}

impl FrameSource for SyntheticCapture {
    fn next_frame(&mut self) -> Option<Frame> {
        let frame = self.render();
        self.frame += 1;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use whorl_motion::MotionDetector;

    use super::*;

    #[test]
    fn circling_square_is_detected() {
        let mut capture = SyntheticCapture::new(320, 180, 30);
        let mut detector = MotionDetector::default();

        let detections = (0..30)
            .filter_map(|_| capture.next_frame())
            .filter_map(|frame| detector.process(&frame))
            .filter(|result| result.detected)
            .count();

        assert!(detections > 20, "only {detections} of 29 pairs detected");
    }
}
