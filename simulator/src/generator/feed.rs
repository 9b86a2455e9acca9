use mazecore::frame::{Detection, FrameInput, FrameSource, FrameSourceError, Point};
use mazecore::scoring::{RegionOfInterest, GRID_DIM};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

/// Configuration for generating a synthetic robot run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyntheticFeedConfig {
    pub seed: u64,
    pub fps: f64,
    /// Frames the robot sits still before it starts driving.
    pub lead_in_frames: usize,
    pub speed_px_per_frame: f64,
    pub marker_size: f64,
    pub marker_id: u32,
    /// Probability that a frame comes back without any detection.
    pub dropout: f64,
    /// Sleep between frames so a viewer can follow along.
    pub realtime: bool,
    pub max_frames: Option<usize>,
}

impl Default for SyntheticFeedConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            fps: 30.0,
            lead_in_frames: 45,
            speed_px_per_frame: 2.0,
            marker_size: 24.0,
            marker_id: 0,
            dropout: 0.05,
            realtime: false,
            max_frames: None,
        }
    }
}

impl SyntheticFeedConfig {
    fn normalized_fps(&self) -> f64 {
        if self.fps.is_finite() && self.fps > 0.0 {
            self.fps
        } else {
            30.0
        }
    }
}

/// Marker that wanders from cell center to cell center inside the ROI.
pub struct SyntheticFeed {
    config: SyntheticFeedConfig,
    roi: RegionOfInterest,
    rng: StdRng,
    position: Point,
    target: Point,
    frame_index: usize,
}

impl SyntheticFeed {
    pub fn new(config: SyntheticFeedConfig, roi: RegionOfInterest) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let position = random_cell_center(&mut rng, roi);
        let target = random_cell_center(&mut rng, roi);
        Self {
            config,
            roi,
            rng,
            position,
            target,
            frame_index: 0,
        }
    }

    fn step(&mut self) {
        let dx = self.target.x - self.position.x;
        let dy = self.target.y - self.position.y;
        let distance = (dx * dx + dy * dy).sqrt();
        let speed = self.config.speed_px_per_frame.max(0.0);

        if distance <= speed {
            self.position = self.target;
            self.target = random_cell_center(&mut self.rng, self.roi);
        } else {
            self.position.x += dx / distance * speed;
            self.position.y += dy / distance * speed;
        }
    }
}

impl FrameSource for SyntheticFeed {
    fn next_frame(&mut self) -> Result<FrameInput, FrameSourceError> {
        if let Some(limit) = self.config.max_frames {
            if self.frame_index >= limit {
                return Err(FrameSourceError::Exhausted(self.frame_index));
            }
        }

        let fps = self.config.normalized_fps();
        let timestamp = self.frame_index as f64 / fps;
        if self.frame_index >= self.config.lead_in_frames {
            self.step();
        }

        let dropped = self.rng.gen_bool(self.config.dropout.clamp(0.0, 1.0));
        let detections = if dropped {
            Vec::new()
        } else {
            vec![Detection::square(
                self.config.marker_id,
                self.position,
                self.config.marker_size,
            )]
        };

        self.frame_index += 1;
        if self.config.realtime {
            thread::sleep(Duration::from_secs_f64(1.0 / fps));
        }

        Ok(FrameInput::new(timestamp, detections))
    }
}

fn random_cell_center(rng: &mut StdRng, roi: RegionOfInterest) -> Point {
    let col = rng.gen_range(0..GRID_DIM);
    let row = rng.gen_range(0..GRID_DIM);
    let cell_width = f64::from(roi.cell_width());
    let cell_height = f64::from(roi.cell_height());
    Point::new(
        f64::from(roi.x) + (f64::from(col) + 0.5) * cell_width,
        f64::from(roi.y) + (f64::from(row) + 0.5) * cell_height,
    )
}
