use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("unsupported channel count {0}, expected 3 or 4")]
    UnsupportedChannels(u8),
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MotionError {
    #[error("frames differ in size: previous {previous:?}, current {current:?}")]
    DimensionMismatch {
        previous: (u32, u32),
        current: (u32, u32),
    },
}
