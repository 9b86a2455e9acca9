use anyhow::Context;
use mazecore::frame::{FrameInput, FrameSource, FrameSourceError};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

/// Replays a recorded run: a JSON array of frames with their detections.
pub struct TraceFeed {
    frames: VecDeque<FrameInput>,
    delivered: usize,
}

impl TraceFeed {
    pub fn new(frames: Vec<FrameInput>) -> Self {
        Self {
            frames: frames.into(),
            delivered: 0,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading trace {}", path_ref.display()))?;
        let frames: Vec<FrameInput> = serde_json::from_str(&contents)
            .with_context(|| format!("parsing trace {}", path_ref.display()))?;
        Ok(Self::new(frames))
    }
}

impl FrameSource for TraceFeed {
    fn next_frame(&mut self) -> Result<FrameInput, FrameSourceError> {
        let frame = self
            .frames
            .pop_front()
            .ok_or(FrameSourceError::Exhausted(self.delivered))?;
        self.delivered += 1;
        Ok(frame)
    }
}
