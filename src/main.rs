use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
    KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::layout::Rect;
use ratatui::DefaultTerminal;
use std::time::Duration;
use tracing::info;

use region_map::app::ViewController;
use region_map::backdrop::Backdrop;
use region_map::config::{Args, Config};
use region_map::logging::setup_logging;
use region_map::map::Surface;
use region_map::ui;

fn main() -> Result<()> {
    let config = Config::try_from(Args::parse()).context("invalid configuration")?;
    let _log_guard = setup_logging(&config.log_dir);
    info!(?config, "starting");

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture; focus events tell us when the pointer leaves the window
    execute!(std::io::stdout(), EnableMouseCapture, EnableFocusChange)?;

    let result = run(&mut terminal, &config);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture, DisableFocusChange);
    ratatui::restore();

    info!("exiting");
    result
}

fn mount(config: &Config, size: Rect) -> ViewController {
    ViewController::mount(
        config.loader(),
        Surface::new(ui::surface_area(size)),
        Backdrop::load(&config.backdrop),
        config.max_zoom,
    )
}

/// Pointer motion drives hover, a left press is the click
fn handle_mouse(view: &mut ViewController, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => {
            view.pointer_move(mouse.column, mouse.row);
        }
        MouseEventKind::Down(MouseButton::Left) => {
            view.pointer_move(mouse.column, mouse.row);
            if let Some(code) = view.click(mouse.column, mouse.row) {
                info!(%code, selected = ?view.store().current(), "region clicked");
            }
        }
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, config: &Config) -> Result<()> {
    let size = terminal.size()?;
    let mut view = mount(config, Rect::new(0, 0, size.width, size.height));

    loop {
        view.poll();

        terminal.draw(|frame| ui::render(frame, &view))?;

        // ~60fps
        if !event::poll(Duration::from_millis(16))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Char('r') => {
                    let size = terminal.size()?;
                    view.unmount();
                    view = mount(config, Rect::new(0, 0, size.width, size.height));
                }
                _ => {}
            },
            Event::Mouse(mouse) => handle_mouse(&mut view, mouse),
            Event::FocusLost => view.pointer_exit(),
            Event::Resize(width, height) => {
                view.resize(ui::surface_area(Rect::new(0, 0, width, height)));
            }
            _ => {}
        }
    }

    view.unmount();
    Ok(())
}
