use std::path::Path;
use std::time::Instant;

use crate::components::viewport::Viewport;
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::fs::preview::{self, Preview};
use crate::fs::tree::{NodeType, SortOrder, Tree};
use crate::theme::{self, ThemeColors};

/// What the text prompt is collecting a name for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Rename,
    NewFile,
    NewDirectory,
}

/// Application mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    Input(InputKind),
    ConfirmDelete,
}

impl AppMode {
    /// Label shown in the heading after `": "`.
    pub fn label(&self) -> &'static str {
        match self {
            AppMode::Normal => "",
            AppMode::Input(InputKind::Rename) => "rename",
            AppMode::Input(InputKind::NewFile) => "new file",
            AppMode::Input(InputKind::NewDirectory) => "new dir",
            AppMode::ConfirmDelete => "delete? (y/n)",
        }
    }
}

/// State for the prompt's text input.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    /// Byte offset into `input`, always on a char boundary.
    pub cursor_position: usize,
}

/// Details of the selected node shown under the operation bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: String,
    pub permissions: String,
    pub size: String,
    pub modified: String,
}

/// Main application state.
pub struct App {
    pub tree: Tree,
    pub viewport: Viewport,
    pub theme: ThemeColors,
    pub should_quit: bool,
    pub mode: AppMode,
    pub dialog_state: DialogState,
    pub status_message: Option<(String, Instant)>,
    /// Last failure, shown until the next key press.
    pub error_message: Option<String>,
    pub preview_enabled: bool,
    pub preview_max_bytes: u64,
    pub sort_order: SortOrder,
}

impl App {
    /// Create a new App rooted at the given path.
    pub fn new(path: &Path, config: &AppConfig) -> Result<Self> {
        let sort_order = config.sort_order();
        let tree = Tree::with_options(
            path,
            sort_order.comparator(),
            config.ops_backend().build(),
        )?;
        Ok(Self {
            tree,
            viewport: Viewport::new(config.edge_padding()),
            theme: theme::resolve_theme(&config.theme),
            should_quit: false,
            mode: AppMode::Normal,
            dialog_state: DialogState::default(),
            status_message: None,
            error_message: None,
            preview_enabled: config.preview_enabled(),
            preview_max_bytes: config.preview_max_bytes(),
            sort_order,
        })
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    // ── Feedback ─────────────────────────────────────────────────────────

    /// Set a status message with current timestamp.
    pub fn set_status_message(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now()));
    }

    /// Clear the status message if it has been displayed for more than 3 seconds.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, ref created)) = self.status_message {
            if created.elapsed().as_secs() > 3 {
                self.status_message = None;
            }
        }
    }

    fn set_error(&mut self, msg: String) {
        self.status_message = None;
        self.error_message = Some(msg);
    }

    fn report_error(&mut self, err: AppError) {
        tracing::warn!(error = %err, kind = ?err.io_kind(), "operation failed");
        self.set_error(err.to_string());
    }

    /// Turn an operation result into a status or error message.
    fn report(&mut self, done: &str, result: Result<()>) {
        match result {
            Ok(()) => self.set_status_message(done.to_string()),
            Err(e) => self.report_error(e),
        }
    }

    // ── Navigation ───────────────────────────────────────────────────────

    pub fn select_next(&mut self) {
        self.tree.select_next();
    }

    pub fn select_previous(&mut self) {
        self.tree.select_previous();
    }

    pub fn select_first(&mut self) {
        self.tree.select_first();
    }

    pub fn select_last(&mut self) {
        self.tree.select_last();
    }

    pub fn descend(&mut self) {
        if let Err(e) = self.tree.descend_into_selected() {
            self.report_error(e);
        }
    }

    pub fn ascend(&mut self) {
        self.tree.ascend_to_parent();
    }

    pub fn toggle_expand(&mut self) {
        if let Err(e) = self.tree.toggle_expand_selected() {
            self.report_error(e);
        }
    }

    // ── Marking and file operations ──────────────────────────────────────

    pub fn mark(&mut self) {
        if !self.tree.mark() {
            self.set_error("nothing to mark".to_string());
        }
    }

    pub fn unmark(&mut self) {
        self.tree.unmark();
    }

    /// Start a prompt. Rename needs a mark and starts from its current name.
    pub fn open_input(&mut self, kind: InputKind) {
        self.dialog_state = DialogState::default();
        if kind == InputKind::Rename {
            let Some(marked) = self.tree.marked() else {
                self.set_error("mark a node to rename first".to_string());
                return;
            };
            if let Some(name) = marked.file_name() {
                let name = name.to_string_lossy().to_string();
                self.dialog_state.cursor_position = name.len();
                self.dialog_state.input = name;
            }
        }
        self.mode = AppMode::Input(kind);
    }

    /// Leave the prompt or confirmation without doing anything.
    pub fn cancel(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
    }

    /// Run the operation the prompt was opened for with the typed name.
    pub fn submit_input(&mut self) {
        let AppMode::Input(kind) = self.mode else {
            return;
        };
        let name = std::mem::take(&mut self.dialog_state.input);
        self.cancel();
        match kind {
            InputKind::Rename => {
                let result = self.tree.rename_marked(&name);
                self.report("renamed", result);
            }
            InputKind::NewFile => {
                let result = self.tree.create_file(&name);
                self.report("file created", result);
            }
            InputKind::NewDirectory => {
                let result = self.tree.create_directory(&name);
                self.report("directory created", result);
            }
        }
    }

    pub fn request_delete(&mut self) {
        if self.tree.marked().is_some() {
            self.mode = AppMode::ConfirmDelete;
        } else {
            self.set_error("mark a node to delete first".to_string());
        }
    }

    pub fn confirm_delete(&mut self) {
        self.mode = AppMode::Normal;
        let result = self.tree.delete_marked();
        self.report("deleted", result);
    }

    pub fn copy_here(&mut self) {
        if self.tree.marked().is_none() {
            self.set_error("mark a node to copy first".to_string());
            return;
        }
        let result = self.tree.copy_marked_into_current();
        self.report("copied", result);
    }

    pub fn move_here(&mut self) {
        if self.tree.marked().is_none() {
            self.set_error("mark a node to move first".to_string());
            return;
        }
        let result = self.tree.move_marked_into_current();
        self.report("moved", result);
    }

    // ── Prompt editing ───────────────────────────────────────────────────

    /// Insert a character at the current cursor position.
    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog_state
            .input
            .insert(self.dialog_state.cursor_position, c);
        self.dialog_state.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor (backspace).
    pub fn dialog_delete_char(&mut self) {
        let state = &mut self.dialog_state;
        if let Some(prev) = state.input[..state.cursor_position].chars().next_back() {
            state.cursor_position -= prev.len_utf8();
            state.input.remove(state.cursor_position);
        }
    }

    /// Move cursor left by one character.
    pub fn dialog_move_cursor_left(&mut self) {
        let state = &mut self.dialog_state;
        if let Some(prev) = state.input[..state.cursor_position].chars().next_back() {
            state.cursor_position -= prev.len_utf8();
        }
    }

    /// Move cursor right by one character.
    pub fn dialog_move_cursor_right(&mut self) {
        let state = &mut self.dialog_state;
        if let Some(next) = state.input[state.cursor_position..].chars().next() {
            state.cursor_position += next.len_utf8();
        }
    }

    pub fn dialog_cursor_home(&mut self) {
        self.dialog_state.cursor_position = 0;
    }

    pub fn dialog_cursor_end(&mut self) {
        self.dialog_state.cursor_position = self.dialog_state.input.len();
    }

    // ── View settings ────────────────────────────────────────────────────

    /// Cycle Name -> Size -> Modified and re-sort the loaded tree.
    pub fn cycle_sort(&mut self) {
        self.sort_order.by = self.sort_order.by.next();
        self.tree.set_comparator(self.sort_order.comparator());
        self.set_status_message(format!("sort: {}", self.sort_order.by.label()));
    }

    pub fn toggle_preview(&mut self) {
        self.preview_enabled = !self.preview_enabled;
    }

    /// Permissions, size and modification time of the selected node.
    pub fn selected_file_info(&self) -> Option<FileInfo> {
        let node = self.tree.get(self.tree.selected_child()?)?;
        Some(FileInfo {
            path: node.path.display().to_string(),
            permissions: preview::format_permissions(node.meta.mode),
            size: preview::format_size(node.meta.size),
            modified: preview::format_modified(node.meta.modified),
        })
    }

    /// Preview of the selected node if it is a readable regular file.
    pub fn selected_preview(&self) -> Option<Preview> {
        let node = self.tree.get(self.tree.selected_child()?)?;
        if node.node_type != NodeType::File {
            return None;
        }
        match preview::read_preview(&node.path, self.preview_max_bytes) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::debug!(error = %e, "preview unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn setup_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::create_dir(dir.path().join("beta")).unwrap();
        fs::write(dir.path().join("file_a.txt"), "hello\nworld\n").unwrap();
        File::create(dir.path().join("file_b.rs")).unwrap();
        let app = App::new(dir.path(), &AppConfig::default()).unwrap();
        (dir, app)
    }

    fn selected_name(app: &App) -> String {
        let id = app.tree.selected_child().unwrap();
        app.tree.node(id).name.clone()
    }

    #[test]
    fn new_uses_config_defaults() {
        let (_dir, app) = setup_app();
        assert_eq!(app.viewport.edge_padding, 3);
        assert!(app.preview_enabled);
        assert_eq!(app.preview_max_bytes, 10_000);
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn quit_sets_flag() {
        let (_dir, mut app) = setup_app();
        assert!(!app.should_quit);
        app.quit();
        assert!(app.should_quit);
    }

    #[test]
    fn new_file_through_prompt() {
        let (dir, mut app) = setup_app();
        app.open_input(InputKind::NewFile);
        assert_eq!(app.mode, AppMode::Input(InputKind::NewFile));
        for c in "notes.md".chars() {
            app.dialog_input_char(c);
        }
        app.submit_input();
        assert_eq!(app.mode, AppMode::Normal);
        assert!(dir.path().join("notes.md").is_file());
        assert!(app.error_message.is_none());
        assert_eq!(app.status_message.as_ref().unwrap().0, "file created");
    }

    #[test]
    fn failed_operation_sets_error() {
        let (_dir, mut app) = setup_app();
        app.open_input(InputKind::NewDirectory);
        for c in "alpha".chars() {
            app.dialog_input_char(c);
        }
        app.submit_input();
        assert!(app.error_message.as_ref().unwrap().contains("alpha"));
    }

    #[test]
    fn rename_requires_mark_and_prefills() {
        let (dir, mut app) = setup_app();
        app.open_input(InputKind::Rename);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.error_message.is_some());

        app.select_last();
        app.mark();
        app.open_input(InputKind::Rename);
        assert_eq!(app.dialog_state.input, "file_b.rs");
        assert_eq!(app.dialog_state.cursor_position, 9);
        app.dialog_delete_char();
        app.dialog_delete_char();
        app.dialog_input_char('m');
        app.dialog_input_char('d');
        app.submit_input();
        assert!(dir.path().join("file_b.md").exists());
        assert!(app.tree.marked().is_none());
    }

    #[test]
    fn cancel_returns_to_normal() {
        let (_dir, mut app) = setup_app();
        app.open_input(InputKind::NewFile);
        app.dialog_input_char('x');
        app.cancel();
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.dialog_state.input.is_empty());
        assert_eq!(app.dialog_state.cursor_position, 0);
    }

    #[test]
    fn delete_needs_confirmation() {
        let (dir, mut app) = setup_app();
        app.request_delete();
        assert_eq!(app.mode, AppMode::Normal);

        app.mark();
        app.request_delete();
        assert_eq!(app.mode, AppMode::ConfirmDelete);
        app.confirm_delete();
        assert!(!dir.path().join("alpha").exists());
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn copy_here_into_subdirectory() {
        let (dir, mut app) = setup_app();
        app.copy_here();
        assert!(app.error_message.is_some());

        app.select_last();
        app.mark();
        app.select_first();
        app.descend();
        app.copy_here();
        assert!(dir.path().join("alpha").join("file_b.rs").exists());
        assert!(dir.path().join("file_b.rs").exists());
        assert!(app.tree.marked().is_none());
        assert_eq!(selected_name(&app), "file_b.rs");
    }

    #[test]
    fn move_here_into_subdirectory() {
        let (dir, mut app) = setup_app();
        app.select_last();
        app.mark();
        app.select_first();
        app.select_next();
        app.descend();
        app.move_here();
        assert!(dir.path().join("beta").join("file_b.rs").exists());
        assert!(!dir.path().join("file_b.rs").exists());
    }

    #[test]
    fn dialog_cursor_editing() {
        let (_dir, mut app) = setup_app();
        app.open_input(InputKind::NewFile);
        app.dialog_input_char('a');
        app.dialog_input_char('é');
        app.dialog_input_char('c');
        app.dialog_move_cursor_left();
        app.dialog_move_cursor_left();
        assert_eq!(app.dialog_state.cursor_position, 1);
        app.dialog_move_cursor_right();
        assert_eq!(app.dialog_state.cursor_position, 3);
        app.dialog_delete_char();
        assert_eq!(app.dialog_state.input, "ac");
        app.dialog_cursor_home();
        app.dialog_delete_char();
        assert_eq!(app.dialog_state.input, "ac");
        app.dialog_cursor_end();
        assert_eq!(app.dialog_state.cursor_position, 2);
    }

    #[test]
    fn cycle_sort_keeps_selection() {
        let (_dir, mut app) = setup_app();
        app.select_last();
        let before = selected_name(&app);
        app.cycle_sort();
        assert_eq!(app.sort_order.by, crate::fs::tree::SortBy::Size);
        assert_eq!(selected_name(&app), before);
    }

    #[test]
    fn selected_preview_only_for_files() {
        let (_dir, mut app) = setup_app();
        assert_eq!(app.selected_preview(), None);
        app.select_next();
        app.select_next();
        assert_eq!(selected_name(&app), "file_a.txt");
        assert_eq!(
            app.selected_preview(),
            Some(Preview::Text(vec!["hello".into(), "world".into()]))
        );
        let info = app.selected_file_info().unwrap();
        assert_eq!(info.size, "12 B");
        assert!(info.path.ends_with("file_a.txt"));
    }

    #[test]
    fn clear_expired_status_removes_old() {
        let (_dir, mut app) = setup_app();
        app.set_status_message("fresh".to_string());
        app.clear_expired_status();
        assert!(app.status_message.is_some());
        app.status_message = Some((
            "old".to_string(),
            Instant::now() - std::time::Duration::from_secs(5),
        ));
        app.clear_expired_status();
        assert!(app.status_message.is_none());
    }
}
