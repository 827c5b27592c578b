use crate::frame::Frame;

/// Something that produces camera frames.
///
/// Frames arrive at whatever cadence and resolution the device picks. A source that is not
/// available (no device, permission denied) reports so once through [`FrameSource::is_available`]
/// and then simply yields nothing.
pub trait FrameSource {
    /// The next captured frame, or `None` when no new frame is ready.
    fn next_frame(&mut self) -> Option<Frame>;

    fn is_available(&self) -> bool {
        true
    }
}

/// A source with no device behind it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapture;

impl FrameSource for NoCapture {
    fn next_frame(&mut self) -> Option<Frame> {
        None
    }

    fn is_available(&self) -> bool {
        false
    }
}
