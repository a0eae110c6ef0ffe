use grid_fleet::{app::App, logging, terminal::TerminalGuard, ui::render_app};

use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use log::LevelFilter;
use ratatui::{prelude::Backend, Terminal};
use std::time::Duration;

const WIDTH: usize = 60;
const HEIGHT: usize = 18;
const MAP_SEED: u32 = 34;
const PLACEMENT_SEED: u64 = 45;
const ROBOTS: usize = 4;
const TASKS: usize = 12;

const FRAME: Duration = Duration::from_millis(30);

fn main() -> Result<()> {
    color_eyre::install()?;
    logging::init(LevelFilter::Info)?;

    let mut app = App::new(WIDTH, HEIGHT, MAP_SEED, PLACEMENT_SEED, ROBOTS, TASKS)?;
    let mut guard = TerminalGuard::enter()?;
    run(&mut app, guard.terminal())
}

fn run<B: Backend>(app: &mut App, terminal: &mut Terminal<B>) -> Result<()> {
    loop {
        app.update();
        terminal.draw(|frame| render_app(frame, frame.area(), app))?;

        if !event::poll(FRAME)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Char(' ') => app.toggle_run(),
            KeyCode::Char('r') => app.reset(),
            KeyCode::Char('s') => app.cycle_strategy(),
            KeyCode::Char('+') | KeyCode::Char('=') => app.faster(),
            KeyCode::Char('-') => app.slower(),
            _ => {}
        }
    }
}
