use serde::{Deserialize, Serialize};

/// Pixel-space point reported by the marker detector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// One fiducial marker detected in a video frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    pub id: u32,
    pub center: Point,
    pub corners: [Point; 4],
}

impl Detection {
    pub fn new(id: u32, center: Point, corners: [Point; 4]) -> Self {
        Self {
            id,
            center,
            corners,
        }
    }

    /// Builds an axis-aligned square marker of side `size` around `center`.
    pub fn square(id: u32, center: Point, size: f64) -> Self {
        let half = size / 2.0;
        let corners = [
            Point::new(center.x - half, center.y - half),
            Point::new(center.x + half, center.y - half),
            Point::new(center.x + half, center.y + half),
            Point::new(center.x - half, center.y + half),
        ];
        Self::new(id, center, corners)
    }

    /// Width and height of the bounding box spanned by the corners.
    pub fn extent(&self) -> (f64, f64) {
        let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
        for corner in &self.corners {
            min_x = min_x.min(corner.x);
            max_x = max_x.max(corner.x);
            min_y = min_y.min(corner.y);
            max_y = max_y.max(corner.y);
        }
        (max_x - min_x, max_y - min_y)
    }
}

/// Detections for a single frame, stamped with monotonic seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FrameInput {
    pub timestamp: f64,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

impl FrameInput {
    pub fn new(timestamp: f64, detections: Vec<Detection>) -> Self {
        Self {
            timestamp,
            detections,
        }
    }

    pub fn empty(timestamp: f64) -> Self {
        Self::new(timestamp, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_detection_reports_its_extent() {
        let detection = Detection::square(3, Point::new(40.0, 40.0), 12.0);
        assert_eq!(detection.extent(), (12.0, 12.0));
    }

    #[test]
    fn rotated_corners_use_bounding_box() {
        let detection = Detection::new(
            1,
            Point::new(10.0, 10.0),
            [
                Point::new(10.0, 5.0),
                Point::new(15.0, 10.0),
                Point::new(10.0, 15.0),
                Point::new(5.0, 10.0),
            ],
        );
        assert_eq!(detection.extent(), (10.0, 10.0));
    }

    #[test]
    fn frame_without_detections_field_deserializes() {
        let frame: FrameInput = serde_json::from_str(r#"{"timestamp": 1.5}"#).unwrap();
        assert_eq!(frame.timestamp, 1.5);
        assert!(frame.detections.is_empty());
    }
}
