use ratatui::{
    layout::Rect,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::robot::Robot;

const KEYS: &str = "space run/pause  r reset  s strategy  +/- speed  q quit";

pub fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![
        Line::from(format!("Status   {:?}", app.view.status)).bold(),
        Line::from(format!(
            "Strategy {}",
            app.engine
                .strategy()
                .map_or_else(|| "-".to_string(), |s| s.to_string())
        )),
        Line::from(format!("Speed    x{}", app.engine.speed())),
        Line::from(format!("Tick     {}", app.view.clock)),
        Line::from(""),
    ];

    let low = app.engine.config().low_battery_fraction;
    lines.extend(app.view.robots.iter().map(|robot| robot_line(robot, low)));
    lines.push(Line::from(""));

    match &app.final_metrics {
        Some(metrics) => {
            lines.push(Line::from("Finished").fg(Color::Green).bold());
            lines.push(Line::from(format!("total time  {}", metrics.total_time)));
            lines.push(Line::from(format!("recharges   {}", metrics.total_recharges)));
            lines.push(Line::from(format!("completed   {}", metrics.tasks_completed)));
            lines.push(Line::from(format!("unassignable {}", metrics.unassignable_tasks.len())));
            lines.push(Line::from(format!(
                "moves {} waits {} replans {}",
                metrics.cells_moved, metrics.collision_waits, metrics.replans
            )));
        }
        None => {
            let live = app.engine.live_metrics();
            lines.push(Line::from(format!(
                "completed {} / {}  recharges {}",
                live.tasks_completed(),
                app.view.tasks.len(),
                live.recharges()
            )));
        }
    }

    if let Some(record) = app.history.latest() {
        lines.push(Line::from(""));
        lines.push(Line::from(format!(
            "Last run {} on '{}': {} ticks ({})",
            record.strategy,
            record.grid_id,
            record.total_time,
            record.timestamp.format("%H:%M:%S")
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(KEYS).fg(Color::DarkGray));

    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Fleet"));
    frame.render_widget(widget, area);
}

fn robot_line(robot: &Robot, low: f64) -> Line<'static> {
    let battery = Style::default().fg(if robot.needs_charge(low) {
        Color::Red
    } else {
        Color::Green
    });
    Line::from(vec![
        Span::raw(format!("{}{} ", robot.icon.symbol(), robot.id)),
        Span::styled(format!("{:>3}/{:<3} ", robot.battery, robot.max_battery), battery),
        Span::raw(format!("{:?}", robot.status)),
    ])
}
