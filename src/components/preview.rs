use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::fs::preview::Preview;
use crate::theme::ThemeColors;

/// Shown instead of content that is not valid UTF-8.
pub const BINARY_PLACEHOLDER: &str = "<binary content>";

const TAB: &str = "    ";

/// Preview widget that renders the selected file's content.
pub struct PreviewWidget<'a> {
    preview: Option<&'a Preview>,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> PreviewWidget<'a> {
    pub fn new(preview: Option<&'a Preview>, theme: &'a ThemeColors) -> Self {
        Self {
            preview,
            theme,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }
}

impl<'a> Widget for PreviewWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let style = Style::default()
            .fg(self.theme.preview_fg)
            .add_modifier(Modifier::ITALIC);

        let lines: Vec<String> = match self.preview {
            None => return,
            Some(Preview::Binary) => vec![BINARY_PLACEHOLDER.to_string()],
            Some(Preview::Text(lines)) => lines
                .iter()
                .take(inner.height as usize)
                .map(|l| l.replace('\t', TAB))
                .collect(),
        };

        for (i, text) in lines.iter().enumerate() {
            let line = Line::from(Span::styled(text.as_str(), style));
            buf.set_line(inner.x, inner.y + i as u16, &line, inner.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;
    use ratatui::widgets::Borders;

    fn row(buf: &Buffer, y: u16, width: u16) -> String {
        (0..width)
            .map(|x| buf.cell((x, y)).unwrap().symbol().to_string())
            .collect()
    }

    #[test]
    fn test_text_preview_is_cut_to_height() {
        let preview = Preview::Text(vec!["line 1".into(), "line 2".into(), "line 3".into()]);
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 20, 2);
        let mut buf = Buffer::empty(area);
        PreviewWidget::new(Some(&preview), &tc).render(area, &mut buf);
        assert!(row(&buf, 0, 20).starts_with("line 1"));
        assert!(row(&buf, 1, 20).starts_with("line 2"));
        assert_eq!(buf.cell((0, 0)).unwrap().fg, tc.preview_fg);
    }

    #[test]
    fn test_binary_preview_shows_placeholder() {
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 30, 3);
        let mut buf = Buffer::empty(area);
        PreviewWidget::new(Some(&Preview::Binary), &tc)
            .block(Block::default().borders(Borders::LEFT))
            .render(area, &mut buf);
        assert!(row(&buf, 0, 30).contains(BINARY_PLACEHOLDER));
    }

    #[test]
    fn test_tabs_are_expanded() {
        let preview = Preview::Text(vec!["\tx".into()]);
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        PreviewWidget::new(Some(&preview), &tc).render(area, &mut buf);
        assert_eq!(row(&buf, 0, 10), "    x     ");
    }

    #[test]
    fn test_no_preview_and_zero_area() {
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 10, 2);
        let mut buf = Buffer::empty(area);
        PreviewWidget::new(None, &tc).render(area, &mut buf);
        assert_eq!(row(&buf, 0, 10).trim(), "");

        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        PreviewWidget::new(Some(&Preview::Binary), &tc).render(area, &mut buf);
    }
}
