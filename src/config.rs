//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--no-preview`, `--edge-padding`, `--shell-ops`)
//! 2. Explicit `--config <file>`
//! 3. `$BT_CONFIG` environment variable (path to config file)
//! 4. Project-local `.bt.toml` in the current working directory
//! 5. Global `~/.config/bt/config.toml`
//! 6. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::fs::operations::OpsBackend;
use crate::fs::tree::{SortBy, SortOrder};

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Starting directory (overridden by CLI positional arg).
    pub default_path: Option<String>,
}

/// Tree panel settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Sort order: "name", "size", "modified".
    pub sort_by: Option<String>,
    /// Directories always listed first.
    pub dirs_first: Option<bool>,
    /// Lines kept visible above and below the selection.
    pub edge_padding: Option<usize>,
    /// File operation backend: "native" or "shell".
    pub file_ops: Option<String>,
}

/// Preview panel settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PreviewConfig {
    /// Whether the preview panel is shown on startup.
    pub enabled: Option<bool>,
    /// Maximum number of bytes read from the selected file.
    pub max_bytes: Option<u64>,
}

/// Custom hex color overrides, applied when `scheme = "custom"`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub file_fg: Option<String>,
    pub dir_fg: Option<String>,
    pub link_fg: Option<String>,
    pub selected_fg: Option<String>,
    pub marked_bg: Option<String>,
    pub preview_fg: Option<String>,
    pub status_fg: Option<String>,
    pub error_fg: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark", "solarized", "custom".
    pub scheme: Option<String>,
    /// Custom color overrides.
    pub custom: Option<ThemeColorsConfig>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub tree: TreeConfig,
    pub preview: PreviewConfig,
    pub theme: ThemeConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default number of lines kept between the selection and the window edge.
pub const DEFAULT_EDGE_PADDING: usize = 3;
/// Default preview read limit in bytes.
pub const DEFAULT_PREVIEW_MAX_BYTES: u64 = 10_000;

// ── Config file locator ──────────────────────────────────────────────────────

/// Candidate config file paths in priority order (highest first).
///
/// Does NOT include the CLI `--config` path.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("BT_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".bt.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("bt").join("config.toml"));
    }

    paths
}

/// Read and parse a TOML config file. Missing files are skipped silently,
/// unreadable or malformed ones with a warning.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read config file");
            return None;
        }
    };
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => {
            tracing::debug!(path = %path.display(), "config file loaded");
            Some(cfg)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to parse config file");
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                default_path: other
                    .general
                    .default_path
                    .clone()
                    .or(self.general.default_path),
            },
            tree: TreeConfig {
                sort_by: other.tree.sort_by.clone().or(self.tree.sort_by),
                dirs_first: other.tree.dirs_first.or(self.tree.dirs_first),
                edge_padding: other.tree.edge_padding.or(self.tree.edge_padding),
                file_ops: other.tree.file_ops.clone().or(self.tree.file_ops),
            },
            preview: PreviewConfig {
                enabled: other.preview.enabled.or(self.preview.enabled),
                max_bytes: other.preview.max_bytes.or(self.preview.max_bytes),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: other.theme.custom.clone().or(self.theme.custom),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Lowest priority first so higher ones overwrite.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            match load_file(cli_path) {
                Some(file_cfg) => config = config.merge(&file_cfg),
                None => tracing::warn!(path = %cli_path.display(), "--config file not used"),
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Starting directory from the config, if any.
    pub fn default_path(&self) -> Option<&str> {
        self.general.default_path.as_deref()
    }

    /// Sort order built from `sort_by` and `dirs_first`.
    pub fn sort_order(&self) -> SortOrder {
        SortOrder {
            by: SortBy::from_config(self.tree.sort_by.as_deref().unwrap_or("name")),
            dirs_first: self.tree.dirs_first.unwrap_or(true),
        }
    }

    pub fn edge_padding(&self) -> usize {
        self.tree.edge_padding.unwrap_or(DEFAULT_EDGE_PADDING)
    }

    /// File operation backend.
    pub fn ops_backend(&self) -> OpsBackend {
        OpsBackend::from_config(self.tree.file_ops.as_deref().unwrap_or("native"))
    }

    /// Whether the preview panel is enabled.
    pub fn preview_enabled(&self) -> bool {
        self.preview.enabled.unwrap_or(true)
    }

    pub fn preview_max_bytes(&self) -> u64 {
        self.preview.max_bytes.unwrap_or(DEFAULT_PREVIEW_MAX_BYTES)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
