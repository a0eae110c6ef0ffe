pub mod map_renderer;
pub mod panels;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::app::App;
use crate::logging;

/// Grid and status side by side, event log underneath.
pub fn render_app(frame: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(10)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(36)])
        .split(rows[0]);

    if let Some(grid) = app.grid() {
        map_renderer::render_map(frame, top[0], grid, &app.view);
    }
    panels::render_status(frame, top[1], app);
    frame.render_widget(logging::event_pane(), rows[1]);
}
