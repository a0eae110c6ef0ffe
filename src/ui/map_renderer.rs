use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::map::{CellType, Grid};
use crate::robot::RobotStatus;
use crate::simulation::Snapshot;
use crate::task::TaskStatus;

const OPEN_TASK: char = 'T';
const ACTIVE_TASK: char = 't';
const DONE_TASK: char = 'x';

pub fn render_map(frame: &mut Frame, area: Rect, grid: &Grid, snapshot: &Snapshot) {
    let lines: Vec<Line> = glyphs(grid, snapshot)
        .into_iter()
        .map(|row| Line::from(row.into_iter().map(styled).collect::<Vec<_>>()))
        .collect();
    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Grid | tick {}", snapshot.clock)),
    );
    frame.render_widget(widget, area);
}

/// One glyph per cell. Robots draw over tasks, tasks over terrain.
fn glyphs(grid: &Grid, snapshot: &Snapshot) -> Vec<Vec<(char, Color)>> {
    let mut rows: Vec<Vec<(char, Color)>> = vec![Vec::with_capacity(grid.width()); grid.height()];
    for cell in grid.cells() {
        rows[cell.coordinates.y].push(terrain(cell.cell_type));
    }

    for task in &snapshot.tasks {
        let glyph = match task.status {
            TaskStatus::Unassigned => (OPEN_TASK, Color::Magenta),
            TaskStatus::Assigned | TaskStatus::InProgress => (ACTIVE_TASK, Color::Magenta),
            TaskStatus::Completed => (DONE_TASK, Color::DarkGray),
        };
        rows[task.location.y][task.location.x] = glyph;
    }

    for robot in &snapshot.robots {
        let color = match robot.status {
            RobotStatus::Idle => Color::White,
            RobotStatus::EnRouteToTask => Color::Cyan,
            RobotStatus::PerformingTask => Color::Green,
            RobotStatus::EnRouteToCharger | RobotStatus::Charging => Color::Yellow,
        };
        rows[robot.location.y][robot.location.x] = (robot.icon.symbol(), color);
    }
    rows
}

fn terrain(cell_type: CellType) -> (char, Color) {
    let color = match cell_type {
        CellType::Wall => Color::Gray,
        CellType::ChargingStation => Color::Yellow,
        CellType::Walkable => Color::DarkGray,
    };
    (cell_type.symbol(), color)
}

fn styled((glyph, color): (char, Color)) -> Span<'static> {
    let mut style = Style::default().fg(color);
    if glyph.is_ascii_uppercase() && glyph != 'C' {
        style = style.add_modifier(Modifier::BOLD);
    }
    Span::styled(glyph.to_string(), style)
}
