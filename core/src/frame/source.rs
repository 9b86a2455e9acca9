use crate::frame::detection::FrameInput;

/// Failure of the camera/detector pipeline feeding the tick loop.
#[derive(thiserror::Error, Debug)]
pub enum FrameSourceError {
    #[error("failed to capture frame: {0}")]
    Capture(String),
    #[error("frame source exhausted after {0} frames")]
    Exhausted(usize),
}

/// Supplies one already-detected frame per tick.
///
/// The engine never opens or configures a device; hosts wrap whatever
/// camera and detector they use behind this trait.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<FrameInput, FrameSourceError>;
}
