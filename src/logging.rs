use color_eyre::Result;
use log::LevelFilter;
use ratatui::style::{Color, Style, Stylize};
use ratatui::widgets::{Block, Borders};
use tui_logger::{TuiLoggerLevelOutput, TuiLoggerWidget};

/// Routes `log` records into the in-terminal event pane.
///
/// The engine logs each tick at debug and each assignment, arrival and
/// recharge at info, so the default level keeps the pane readable.
pub fn init(default_level: LevelFilter) -> Result<()> {
    tui_logger::init_logger(LevelFilter::Trace)?;
    tui_logger::set_default_level(default_level);
    log::info!("Event log ready at level {}", default_level);
    Ok(())
}

/// Event pane shown under the grid.
pub fn event_pane<'a>() -> TuiLoggerWidget<'a> {
    TuiLoggerWidget::default()
        .block(
            Block::default()
                .title("Events")
                .border_style(Style::default().fg(Color::DarkGray))
                .borders(Borders::ALL),
        )
        .output_separator(' ')
        .output_timestamp(Some("%H:%M:%S%.3f".to_string()))
        .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
        .output_target(true)
        .output_file(false)
        .output_line(false)
        .style_error(Style::default().fg(Color::Red).bold())
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Green))
        .style_debug(Style::default().fg(Color::Cyan))
        .style_trace(Style::default().fg(Color::DarkGray))
}
