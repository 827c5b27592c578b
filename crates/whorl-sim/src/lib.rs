pub mod color;
pub mod context;
pub mod pointer;
pub mod settings;
pub mod sink;

pub use color::ColorMode;
pub use context::{Simulation, SimulationStats};
pub use pointer::{Pointer, PointerId, PointerTable, Touch, PRIMARY_POINTER};
pub use settings::ControlSettings;
pub use sink::{FieldView, RenderSink};
