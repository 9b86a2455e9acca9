use crate::frame::detection::Point;
use crate::scoring::{LineSegment, PixelRect, RegionOfInterest};
use crate::session::report::SessionStatus;
use crate::session::run::RunSession;
use serde::{Deserialize, Serialize};

/// Half side of the box drawn around each marker center, in pixels.
pub const MARKER_BOX_HALF: f64 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkerBox {
    pub id: u32,
    pub top_left: Point,
    pub bottom_right: Point,
    pub label: String,
}

/// Drawable state of a session for whatever renders the video overlay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverlayModel {
    pub team_name: String,
    pub status: SessionStatus,
    pub roi: RegionOfInterest,
    pub grid_lines: Vec<LineSegment>,
    pub visited_cells: Vec<PixelRect>,
    pub markers: Vec<MarkerBox>,
    pub time_left: f64,
    pub exploration_score: u32,
    pub time_score: f64,
}

impl OverlayModel {
    pub fn from_session(session: &RunSession) -> Self {
        let mapper = session.mapper();
        let visited_cells = session
            .visited_cells()
            .into_iter()
            .map(|cell| mapper.cell_bounds(cell))
            .collect();
        let markers = session
            .last_detections()
            .iter()
            .map(|detection| MarkerBox {
                id: detection.id,
                top_left: Point::new(
                    detection.center.x - MARKER_BOX_HALF,
                    detection.center.y - MARKER_BOX_HALF,
                ),
                bottom_right: Point::new(
                    detection.center.x + MARKER_BOX_HALF,
                    detection.center.y + MARKER_BOX_HALF,
                ),
                label: format!("ID: {}", detection.id),
            })
            .collect();
        let scores = session.scores();

        Self {
            team_name: session.team_name().to_string(),
            status: session.status(),
            roi: mapper.roi(),
            grid_lines: mapper.grid_lines(),
            visited_cells,
            markers,
            time_left: session.time_left(),
            exploration_score: scores.exploration_score,
            time_score: scores.time_score,
        }
    }

    /// Text lines shown in the top-left corner of the video.
    pub fn text_lines(&self) -> Vec<String> {
        vec![
            format!("Time left: {}s", self.time_left.floor() as i64),
            format!("Exploration Score: {}", self.exploration_score),
            format!("Time Score: {}", self.time_score),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::detection::{Detection, FrameInput};
    use crate::prelude::SessionConfig;

    #[test]
    fn overlay_reflects_session_progress() {
        let mut session = RunSession::new(
            "Overlay",
            RegionOfInterest::new(10, 10, 80, 80),
            SessionConfig::default(),
        )
        .unwrap();
        session.start(0.0).unwrap();
        let detection = Detection::square(4, Point::new(25.0, 15.0), 8.0);
        session
            .tick(&FrameInput::new(65.5, vec![detection]))
            .unwrap();

        let overlay = OverlayModel::from_session(&session);
        assert_eq!(overlay.grid_lines.len(), 18);
        assert_eq!(
            overlay.visited_cells,
            vec![PixelRect {
                x: 20,
                y: 10,
                width: 10,
                height: 10
            }]
        );
        assert_eq!(overlay.markers[0].label, "ID: 4");
        assert_eq!(overlay.markers[0].top_left, Point::new(15.0, 5.0));
        assert_eq!(
            overlay.text_lines(),
            vec![
                "Time left: 234s".to_string(),
                "Exploration Score: 2".to_string(),
                "Time Score: 587.5".to_string(),
            ]
        );
    }
}
