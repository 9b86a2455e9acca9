pub mod detection;
pub mod source;

pub use detection::{Detection, FrameInput, Point};
pub use source::{FrameSource, FrameSourceError};
