use iced::{
    mouse, time,
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, row, scrollable, text, Column, Container,
    },
    Alignment, Color, Element, Length, Pixels, Point, Rectangle, Renderer, Size, Subscription,
    Task, Theme,
};
use mazecore::scoring::RegionOfInterest;
use mazecore::session::{FinalScore, OverlayModel};
use serde::Deserialize;
use std::time::Duration;

const BRIDGE_URL: &str = "http://127.0.0.1:9000";

fn main() -> iced::Result {
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Maze Run Overlay".into()
}

fn application_subscription(_: &Visualizer) -> Subscription<Message> {
    time::every(Duration::from_millis(250)).map(|_| Message::Tick)
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

#[derive(Debug)]
struct Visualizer {
    overlay: Option<OverlayModel>,
    scores: Vec<FinalScore>,
    host_status: String,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    OverlayFetched(Result<Option<OverlayModel>, String>),
    ScoresFetched(Result<Vec<FinalScore>, String>),
    StatusFetched(Result<String, String>),
    StopRun,
    SkipGate,
    CommandSent(Result<String, String>),
}

#[derive(Debug, Deserialize)]
struct HostStatus {
    #[serde(default)]
    status: String,
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        (
            Visualizer {
                overlay: None,
                scores: Vec::new(),
                host_status: String::new(),
                status: "Waiting for the referee bridge...".into(),
                history: Vec::new(),
            },
            Task::perform(fetch_overlay(), Message::OverlayFetched),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => Task::batch([
                Task::perform(fetch_overlay(), Message::OverlayFetched),
                Task::perform(fetch_scores(), Message::ScoresFetched),
                Task::perform(fetch_status(), Message::StatusFetched),
            ]),
            Message::OverlayFetched(Ok(overlay)) => {
                if let Some(current) = &overlay {
                    let previous = state.overlay.as_ref().map(|o| (o.team_name.as_str(), o.status));
                    if previous != Some((current.team_name.as_str(), current.status)) {
                        state.push_history(format!("{}: {}", current.team_name, current.status));
                    }
                    state.status = format!("Connected: {} ({})", current.team_name, current.status);
                } else {
                    state.status = "Connected: no run yet".into();
                }
                state.overlay = overlay;
                Task::none()
            }
            Message::OverlayFetched(Err(err)) => {
                state.status = format!("Bridge error: {err}");
                Task::none()
            }
            Message::ScoresFetched(Ok(scores)) => {
                for score in scores.iter().skip(state.scores.len()) {
                    state.push_history(format!(
                        "Scored {}: {}",
                        score.team_name, score.final_score
                    ));
                }
                state.scores = scores;
                Task::none()
            }
            Message::StatusFetched(Ok(status)) => {
                state.host_status = status;
                Task::none()
            }
            Message::ScoresFetched(Err(_)) | Message::StatusFetched(Err(_)) => Task::none(),
            Message::StopRun => Task::perform(post_command("stop"), Message::CommandSent),
            Message::SkipGate => Task::perform(post_command("skip-gate"), Message::CommandSent),
            Message::CommandSent(Ok(message)) => {
                state.push_history(message.clone());
                state.status = message;
                Task::none()
            }
            Message::CommandSent(Err(err)) => {
                state.status = format!("Command error: {err}");
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let score_lines = state
            .overlay
            .as_ref()
            .map(|overlay| overlay.text_lines())
            .unwrap_or_else(|| vec!["No run in progress".into()]);
        let score_column = score_lines
            .into_iter()
            .fold(Column::new().spacing(4), |col, line| col.push(text(line).size(18)));

        let heading = match &state.overlay {
            Some(overlay) => format!("{} - {}", overlay.team_name, overlay.status),
            None => "No team selected".into(),
        };

        let maze = Canvas::new(MazeView {
            overlay: state.overlay.clone(),
        })
        .width(Length::Fill)
        .height(Length::Fixed(480.0));

        let markers = match &state.overlay {
            Some(overlay) if !overlay.markers.is_empty() => overlay.markers.iter().fold(
                Column::new().spacing(4),
                |col, marker| {
                    let center_x = (marker.top_left.x + marker.bottom_right.x) / 2.0;
                    let center_y = (marker.top_left.y + marker.bottom_right.y) / 2.0;
                    col.push(text(format!("{} at ({center_x:.0}, {center_y:.0})", marker.label)).size(12))
                },
            ),
            _ => Column::new().push(text("No markers in view").size(12)),
        };

        let run_column = column![
            text(heading).size(26),
            score_column,
            maze,
            text("Markers").size(16),
            Container::new(markers).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fill);

        let scores_list = if state.scores.is_empty() {
            Column::new().push(text("No scores yet").size(12))
        } else {
            state
                .scores
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, score| {
                    col.push(
                        text(format!(
                            "{}: {} + {} = {}",
                            score.team_name,
                            score.exploration_score,
                            score.time_score,
                            score.final_score
                        ))
                        .size(12),
                    )
                })
        };

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let control_column = column![
            text("Referee").size(26),
            button("Stop run").on_press(Message::StopRun).padding(10),
            button("Skip movement gate")
                .on_press(Message::SkipGate)
                .padding(10),
            text(&state.status).size(14),
            text(&state.host_status).size(14),
            text("Scores").size(16),
            Container::new(scrollable(scores_list).height(Length::Fixed(160.0))).padding(6),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(160.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(320.0));

        let layout = row![control_column, run_column]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_y(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

async fn fetch_overlay() -> Result<Option<OverlayModel>, String> {
    let response = reqwest::get(format!("{BRIDGE_URL}/overlay"))
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<Option<OverlayModel>>()
        .await
        .map_err(|e| e.to_string())
}

async fn fetch_scores() -> Result<Vec<FinalScore>, String> {
    let response = reqwest::get(format!("{BRIDGE_URL}/scores"))
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<Vec<FinalScore>>()
        .await
        .map_err(|e| e.to_string())
}

async fn fetch_status() -> Result<String, String> {
    let response = reqwest::get(format!("{BRIDGE_URL}/status"))
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<HostStatus>()
        .await
        .map(|status| status.status)
        .map_err(|e| e.to_string())
}

async fn post_command(command: &'static str) -> Result<String, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{BRIDGE_URL}/{command}"))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        Ok(format!("Sent {command}"))
    } else {
        let status = response.status();
        let text = response.text().await.unwrap_or_else(|_| "".into());
        Err(format!("{}: {}", status, text))
    }
}

/// Fits the region of interest into the canvas, keeping its aspect ratio.
#[derive(Debug, Clone, Copy)]
struct Viewport {
    origin_x: f64,
    origin_y: f64,
    scale: f64,
}

impl Viewport {
    fn fit(roi: RegionOfInterest, bounds: Size) -> Self {
        let width = f64::from(roi.width.max(1));
        let height = f64::from(roi.height.max(1));
        let scale = (f64::from(bounds.width) / width).min(f64::from(bounds.height) / height);
        Self {
            origin_x: f64::from(roi.x),
            origin_y: f64::from(roi.y),
            scale,
        }
    }

    fn to_screen(&self, x: f64, y: f64) -> Point {
        Point::new(
            ((x - self.origin_x) * self.scale) as f32,
            ((y - self.origin_y) * self.scale) as f32,
        )
    }

    fn length(&self, pixels: f64) -> f32 {
        (pixels * self.scale) as f32
    }
}

#[derive(Clone)]
struct MazeView {
    overlay: Option<OverlayModel>,
}

impl canvas::Program<Message> for MazeView {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.05, 0.05),
        );

        let Some(overlay) = &self.overlay else {
            return vec![frame.into_geometry()];
        };
        let view = Viewport::fit(overlay.roi, bounds.size());

        for cell in &overlay.visited_cells {
            frame.fill_rectangle(
                view.to_screen(f64::from(cell.x), f64::from(cell.y)),
                Size::new(
                    view.length(f64::from(cell.width)),
                    view.length(f64::from(cell.height)),
                ),
                Color::from_rgba(1.0, 1.0, 1.0, 0.35),
            );
        }

        let grid = Path::new(|builder| {
            for line in &overlay.grid_lines {
                builder.move_to(view.to_screen(line.from.x, line.from.y));
                builder.line_to(view.to_screen(line.to.x, line.to.y));
            }
        });
        frame.stroke(
            &grid,
            Stroke::default()
                .with_width(1.0)
                .with_color(Color::from_rgb(0.2, 0.8, 0.2)),
        );

        for marker in &overlay.markers {
            let top_left = view.to_screen(marker.top_left.x, marker.top_left.y);
            let bottom_right = view.to_screen(marker.bottom_right.x, marker.bottom_right.y);
            let size = Size::new(bottom_right.x - top_left.x, bottom_right.y - top_left.y);
            let outline = Path::rectangle(top_left, size);
            frame.stroke(
                &outline,
                Stroke::default()
                    .with_width(2.0)
                    .with_color(Color::from_rgb(0.2, 1.0, 0.2)),
            );
            frame.fill_text(canvas::Text {
                content: marker.label.clone(),
                position: Point::new(top_left.x, top_left.y - 14.0),
                color: Color::from_rgb(0.2, 1.0, 0.2),
                size: Pixels(12.0),
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}
