use crate::app::{ViewController, ViewState};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Split the screen into map block and status bar
fn chunks(area: Rect) -> [Rect; 2] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);
    [chunks[0], chunks[1]]
}

fn map_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Regions ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
}

/// Container surface for the map inside a terminal of size `area`
pub fn surface_area(area: Rect) -> Rect {
    map_block().inner(chunks(area)[0])
}

/// Render the UI
pub fn render(frame: &mut Frame, view: &ViewController) {
    let [map_area, status_area] = chunks(frame.area());

    let block = map_block();
    let inner = block.inner(map_area);
    frame.render_widget(block, map_area);

    match view.state() {
        ViewState::Loading => render_notice(frame, inner, "Loading regions...", Color::Gray),
        ViewState::Error(message) => render_notice(frame, inner, message, Color::Red),
        ViewState::Ready => {
            frame.render_widget(view.backdrop(), inner);
            frame.render_widget(view.renderer(), inner);
        }
    }

    render_status_bar(frame, view, status_area);
}

fn render_notice(frame: &mut Frame, area: Rect, text: &str, color: Color) {
    let [_, middle, _] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(area);
    let notice = Paragraph::new(text)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(notice, middle);
}

fn render_status_bar(frame: &mut Frame, view: &ViewController, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);

    let mut spans = vec![Span::styled(" ", dim)];
    match view.state() {
        ViewState::Loading => spans.push(Span::styled("loading", Style::default().fg(Color::Yellow))),
        ViewState::Error(_) => spans.push(Span::styled("error", Style::default().fg(Color::Red))),
        ViewState::Ready => {
            spans.push(Span::styled(
                format!("{} regions", view.region_count()),
                Style::default().fg(Color::Cyan),
            ));
            spans.push(Span::styled(" | Selected: ", dim));
            spans.push(match view.selected_region() {
                Some(region) => Span::styled(
                    format!("{} ({})", region.name, region.code),
                    Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
                ),
                None => Span::styled("none", dim),
            });
            if let Some(region) = view.hovered_region() {
                spans.push(Span::styled(" | Hover: ", dim));
                spans.push(Span::styled(region.name.clone(), Style::default().fg(Color::White)));
            }
            if let Some(viewport) = view.renderer().viewport() {
                spans.push(Span::styled(" | Zoom: ", dim));
                spans.push(Span::styled(
                    format!("{:.1}", viewport.zoom),
                    Style::default().fg(Color::Yellow),
                ));
            }
        }
    }
    spans.push(Span::styled(" | click:select r:reload q:quit", dim));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backdrop::Backdrop;
    use crate::data::tests::{StaticFetcher, TWO_REGIONS};
    use crate::data::DataLoader;
    use crate::map::Surface;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::time::Duration;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn mounted(fetcher: StaticFetcher, size: Rect) -> ViewController {
        let mut view = ViewController::mount(
            DataLoader::new(fetcher),
            Surface::new(surface_area(size)),
            Backdrop::empty(),
            12.0,
        );
        view.settle(Duration::from_secs(5));
        view
    }

    #[test]
    fn test_surface_inside_border() {
        let area = Rect::new(0, 0, 42, 23);
        assert_eq!(surface_area(area), Rect::new(1, 1, 40, 20));
    }

    #[test]
    fn test_error_panel() {
        let size = Rect::new(0, 0, 60, 12);
        let view = mounted(StaticFetcher::status(404), size);
        let mut terminal = Terminal::new(TestBackend::new(size.width, size.height)).unwrap();
        terminal.draw(|f| render(f, &view)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("404"), "{text}");
        assert!(text.contains("error"));
    }

    #[test]
    fn test_ready_map_and_status() {
        let size = Rect::new(0, 0, 42, 23);
        let mut view = mounted(StaticFetcher::ok(TWO_REGIONS), size);
        view.click(11, 16);
        let mut terminal = Terminal::new(TestBackend::new(size.width, size.height)).unwrap();
        terminal.draw(|f| render(f, &view)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("Alpha"));
        assert!(text.contains("2 regions"));
        assert!(text.contains("Selected: Alpha (A)"), "{text}");
    }
}
