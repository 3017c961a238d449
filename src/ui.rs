use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, AppMode};
use crate::components::flatten::flatten;
use crate::components::preview::PreviewWidget;
use crate::components::status_bar::{StatusBarWidget, HEADING_HEIGHT};
use crate::components::tree::TreeWidget;

/// Below this many columns or rows nothing but a notice is drawn.
const MIN_SIZE: u16 = 10;
const TOO_SMALL: &str = "too small =(";

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    if area.width < MIN_SIZE || area.height < MIN_SIZE {
        frame.render_widget(Paragraph::new(Line::from(TOO_SMALL)), area);
        return;
    }

    let [heading_area, body_area] =
        Layout::vertical([Constraint::Length(HEADING_HEIGHT), Constraint::Min(0)]).areas(area);

    render_heading(app, frame, heading_area);

    let (tree_area, preview_area) = if app.preview_enabled {
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(body_area);
        (left, Some(right))
    } else {
        (body_area, None)
    };

    let flat = flatten(&app.tree, tree_area.width as usize);
    let visible = app
        .viewport
        .scroll(flat.lines.len(), flat.selected, tree_area.height as usize);
    frame.render_widget(TreeWidget::new(&flat, visible, &app.theme), tree_area);

    if let Some(preview_area) = preview_area {
        let preview = app.selected_preview();
        let block = Block::default()
            .borders(Borders::LEFT)
            .border_style(Style::default().fg(app.theme.preview_border_fg));
        frame.render_widget(
            PreviewWidget::new(preview.as_ref(), &app.theme).block(block),
            preview_area,
        );
    }
}

fn render_heading(app: &App, frame: &mut Frame, area: Rect) {
    let marked = app.tree.marked().map(|p| p.display().to_string());
    let file_info = app.selected_file_info();

    let mut heading = StatusBarWidget::new(app.mode.label(), &app.theme)
        .marked(marked)
        .file_info(file_info.as_ref());
    if let AppMode::Input(_) = app.mode {
        heading = heading.input(&app.dialog_state.input);
    }
    if let Some(err) = &app.error_message {
        heading = heading.message(err, true);
    } else if let Some((msg, _)) = &app.status_message {
        heading = heading.message(msg, false);
    }

    if let Some(column) = heading.input_column() {
        let state = &app.dialog_state;
        let typed = state.input[..state.cursor_position].chars().count() as u16;
        let x = area.x.saturating_add(column).saturating_add(typed);
        frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
    }

    frame.render_widget(heading, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::InputKind;
    use crate::config::AppConfig;
    use ratatui::{backend::TestBackend, layout::Position, Terminal};
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn setup_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("readme.txt"), "first line\nsecond line\n").unwrap();
        File::create(dir.path().join("zeta")).unwrap();
        let app = App::new(dir.path(), &AppConfig::default()).unwrap();
        (dir, app)
    }

    fn screen(terminal: &Terminal<TestBackend>) -> Vec<String> {
        let buf = terminal.backend().buffer();
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf.cell((x, y)).unwrap().symbol().to_string())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn tiny_terminal_shows_notice() {
        let (_dir, mut app) = setup_app();
        let mut terminal = Terminal::new(TestBackend::new(9, 20)).unwrap();
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert!(screen(&terminal)[0].starts_with("too small"));
    }

    #[test]
    fn renders_heading_tree_and_preview() {
        let (_dir, mut app) = setup_app();
        app.select_next();
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|f| render(&mut app, f)).unwrap();
        let rows = screen(&terminal);

        assert!(rows[0].starts_with(": "));
        assert!(rows[1].contains("23 B"));
        assert!(rows[4].starts_with("├─ src"));
        assert!(rows[5].starts_with("├─ readme.txt"));
        assert!(rows[3].contains("first line"));
    }

    #[test]
    fn preview_can_be_hidden() {
        let (_dir, mut app) = setup_app();
        app.select_next();
        app.toggle_preview();
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert!(screen(&terminal).iter().all(|r| !r.contains("first line")));
    }

    #[test]
    fn cursor_follows_prompt_input() {
        let (_dir, mut app) = setup_app();
        app.open_input(InputKind::NewFile);
        app.dialog_input_char('a');
        app.dialog_input_char('b');
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|f| render(&mut app, f)).unwrap();
        // ": new file │ " is 13 columns wide.
        assert_eq!(terminal.get_cursor_position().unwrap(), Position::new(15, 0));
    }
}
