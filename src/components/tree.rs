use std::ops::Range;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::components::flatten::{Flattened, LineKind, TreeLine};
use crate::fs::tree::NodeType;
use crate::theme::ThemeColors;

/// Marker drawn after the placeholder of an empty current directory.
const SELECTION_ARROW: &str = " <-";

/// Tree widget that renders a window of flattened lines.
pub struct TreeWidget<'a> {
    flat: &'a Flattened,
    visible: Range<usize>,
    theme: &'a ThemeColors,
}

impl<'a> TreeWidget<'a> {
    pub fn new(flat: &'a Flattened, visible: Range<usize>, theme: &'a ThemeColors) -> Self {
        Self {
            flat,
            visible,
            theme,
        }
    }

    fn name_style(&self, line: &TreeLine) -> Style {
        let mut style = if line.is_selected {
            Style::default()
                .fg(self.theme.tree_selected_fg)
                .bg(self.theme.tree_selected_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            match line.kind {
                LineKind::Entry {
                    node_type: NodeType::Directory,
                    ..
                } => Style::default().fg(self.theme.tree_dir_fg),
                LineKind::Entry {
                    node_type: NodeType::Symlink,
                    ..
                } => Style::default().fg(self.theme.tree_link_fg),
                LineKind::Entry {
                    node_type: NodeType::File,
                    ..
                }
                | LineKind::Placeholder => Style::default().fg(self.theme.tree_file_fg),
            }
        };
        if let LineKind::Entry {
            is_marked: true, ..
        } = line.kind
        {
            style = style.bg(self.theme.tree_marked_bg);
        }
        style
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let start = self.visible.start.min(self.flat.lines.len());
        let end = self.visible.end.min(self.flat.lines.len());
        let indent_style = Style::default().fg(self.theme.tree_indent_fg);

        for (row, line) in self.flat.lines[start..end]
            .iter()
            .take(area.height as usize)
            .enumerate()
        {
            let mut spans = vec![
                Span::styled(line.prefix.as_str(), indent_style),
                Span::styled(line.name.as_str(), self.name_style(line)),
            ];
            if line.kind == LineKind::Placeholder {
                spans.push(Span::styled(
                    SELECTION_ARROW,
                    Style::default().fg(self.theme.tree_arrow_fg),
                ));
            }
            let y = area.y + row as u16;
            buf.set_line(area.x, y, &Line::from(spans), area.width);
        }
    }
}
