use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};

use crate::app::FileInfo;
use crate::theme::ThemeColors;

/// Rows taken by the heading: operation bar, file info, message.
pub const HEADING_HEIGHT: u16 = 3;

const INPUT_OPEN: &str = " │ ";
const INPUT_CLOSE: &str = " │";
const INFO_SEP: &str = " │ ";

/// Heading widget: current operation, mark, prompt, file info and the last message.
pub struct StatusBarWidget<'a> {
    mode_label: &'a str,
    theme: &'a ThemeColors,
    marked: Option<String>,
    input: Option<&'a str>,
    file_info: Option<&'a FileInfo>,
    message: Option<(&'a str, bool)>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(mode_label: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            mode_label,
            theme,
            marked: None,
            input: None,
            file_info: None,
            message: None,
        }
    }

    pub fn marked(mut self, path: Option<String>) -> Self {
        self.marked = path;
        self
    }

    pub fn input(mut self, input: &'a str) -> Self {
        self.input = Some(input);
        self
    }

    pub fn file_info(mut self, info: Option<&'a FileInfo>) -> Self {
        self.file_info = info;
        self
    }

    pub fn message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.message = Some((msg, is_error));
        self
    }

    fn operation_text(&self) -> String {
        let mut text = format!(": {}", self.mode_label);
        if let Some(marked) = &self.marked {
            text.push_str(&format!(" [{}]", marked));
        }
        text
    }

    /// Column (relative to the widget) where prompt input starts, if a prompt is shown.
    pub fn input_column(&self) -> Option<u16> {
        self.input?;
        let width = self.operation_text().chars().count() + INPUT_OPEN.chars().count();
        Some(u16::try_from(width).unwrap_or(u16::MAX))
    }
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let text_style = Style::default().fg(self.theme.status_fg);

        let mut operation = vec![Span::styled(self.operation_text(), text_style)];
        if let Some(input) = self.input {
            operation.push(Span::styled(INPUT_OPEN, text_style));
            operation.push(Span::styled(
                input,
                text_style.bg(self.theme.status_input_bg),
            ));
            operation.push(Span::styled(INPUT_CLOSE, text_style));
        }
        buf.set_line(area.x, area.y, &Line::from(operation), area.width);

        if area.height > 1 {
            if let Some(info) = self.file_info {
                let sep = Span::styled(INFO_SEP, Style::default().fg(self.theme.finfo_sep_fg));
                let value = Style::default().fg(self.theme.finfo_fg);
                let line = Line::from(vec![
                    Span::styled(
                        info.permissions.as_str(),
                        Style::default().fg(self.theme.finfo_permissions_fg),
                    ),
                    sep.clone(),
                    Span::styled(info.size.as_str(), value),
                    sep.clone(),
                    Span::styled(info.modified.as_str(), value),
                    sep,
                    Span::styled(info.path.as_str(), Style::default().fg(self.theme.path_fg)),
                ]);
                buf.set_line(area.x, area.y + 1, &line, area.width);
            }
        }

        if area.height > 2 {
            if let Some((msg, is_error)) = self.message {
                let style = if is_error {
                    Style::default().fg(self.theme.error_fg)
                } else {
                    text_style
                };
                let line = Line::from(Span::styled(msg, style));
                buf.set_line(area.x, area.y + 2, &line, area.width);
            }
        }
    }
}
