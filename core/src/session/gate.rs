use crate::frame::detection::Detection;

/// What the movement gate concluded from one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    /// Nothing conclusive yet; keep waiting.
    Waiting,
    /// The marker count changed, so the starting snapshot was replaced.
    Rebaselined,
    /// A marker left its starting footprint.
    Moved { marker_id: u32 },
}

/// Holds scoring until a tracked marker visibly moves.
///
/// Each marker is compared with the nearest marker of the starting snapshot.
/// Movement means the center shifted by more than half the starting marker's
/// width or height. Frames whose marker count differs from the previous frame
/// are treated as unreliable and restart the snapshot.
#[derive(Debug, Clone, Default)]
pub struct MovementGate {
    starting: Vec<Detection>,
    last: Vec<Detection>,
}

impl MovementGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, detections: &[Detection]) -> GateVerdict {
        if detections.is_empty() {
            return GateVerdict::Waiting;
        }

        if self.last.is_empty() {
            self.baseline(detections);
            return GateVerdict::Waiting;
        }

        if detections.len() != self.last.len() {
            self.baseline(detections);
            return GateVerdict::Rebaselined;
        }

        for detection in detections {
            if let Some(start) = self.nearest_start(detection) {
                if has_left_footprint(start, detection) {
                    return GateVerdict::Moved {
                        marker_id: detection.id,
                    };
                }
            }
        }

        self.last = detections.to_vec();
        GateVerdict::Waiting
    }

    pub fn reset(&mut self) {
        self.starting.clear();
        self.last.clear();
    }

    pub fn starting_snapshot(&self) -> &[Detection] {
        &self.starting
    }

    fn baseline(&mut self, detections: &[Detection]) {
        self.starting = detections.to_vec();
        self.last = detections.to_vec();
    }

    fn nearest_start(&self, detection: &Detection) -> Option<&Detection> {
        self.starting.iter().min_by(|a, b| {
            let da = a.center.distance_squared(&detection.center);
            let db = b.center.distance_squared(&detection.center);
            da.total_cmp(&db)
        })
    }
}

fn has_left_footprint(start: &Detection, current: &Detection) -> bool {
    let (width, height) = start.extent();
    let dx = (current.center.x - start.center.x).abs();
    let dy = (current.center.y - start.center.y).abs();
    dx > width / 2.0 || dy > height / 2.0
}
