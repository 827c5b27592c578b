pub mod detector;
pub mod error;
pub mod frame;
pub mod source;
pub mod throttle;

pub use detector::{detect, detect_with_overlay, MotionDetector, MotionResult};
pub use error::{FrameError, MotionError};
pub use frame::Frame;
pub use source::FrameSource;
pub use throttle::RateLimiter;
