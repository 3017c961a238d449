//! Theme data model: built-in palettes and resolution from config.
//!
//! Two palettes are built in: `dark` (true-color) and `solarized`, which
//! uses indexed terminal colors so it follows the terminal's own scheme.
//! `custom` starts from `dark` and applies hex overrides from the config.

use ratatui::style::Color;

use crate::config::{ThemeColorsConfig, ThemeConfig};

// ── Runtime theme colors ─────────────────────────────────────────────────────

/// All runtime colors used in the UI.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Tree panel
    pub tree_file_fg: Color,
    pub tree_dir_fg: Color,
    pub tree_link_fg: Color,
    pub tree_indent_fg: Color,
    pub tree_selected_fg: Color,
    pub tree_selected_bg: Color,
    pub tree_marked_bg: Color,
    pub tree_arrow_fg: Color,

    // Preview panel
    pub preview_fg: Color,
    pub preview_border_fg: Color,

    // Heading
    pub status_fg: Color,
    pub status_input_bg: Color,
    pub error_fg: Color,

    // File info
    pub path_fg: Color,
    pub finfo_permissions_fg: Color,
    pub finfo_fg: Color,
    pub finfo_sep_fg: Color,
}

// ── Built-in palettes ────────────────────────────────────────────────────────

/// Dark true-color palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        tree_file_fg: Color::Rgb(230, 230, 230), // #E6E6E6
        tree_dir_fg: Color::Rgb(109, 116, 172),  // #6D74AC
        tree_link_fg: Color::Rgb(109, 172, 164), // #6DACA4
        tree_indent_fg: Color::Rgb(54, 54, 54),  // #363636
        tree_selected_fg: Color::Rgb(172, 164, 109), // #ACA46D
        tree_selected_bg: Color::Reset,
        tree_marked_bg: Color::Rgb(54, 54, 54), // #363636
        tree_arrow_fg: Color::Rgb(172, 164, 109),

        preview_fg: Color::Rgb(168, 168, 168), // #A8A8A8
        preview_border_fg: Color::Rgb(54, 54, 54),

        status_fg: Color::Rgb(230, 230, 230),
        status_input_bg: Color::Rgb(60, 60, 60), // #3C3C3C
        error_fg: Color::Rgb(172, 109, 116),     // #AC6D74

        path_fg: Color::Rgb(116, 172, 109), // #74AC6D
        finfo_permissions_fg: Color::Rgb(172, 164, 109),
        finfo_fg: Color::Rgb(230, 230, 230),
        finfo_sep_fg: Color::Rgb(43, 43, 43), // #2B2B2B
    }
}

/// Palette built from the terminal's 16 indexed colors.
pub fn solarized_theme() -> ThemeColors {
    ThemeColors {
        tree_file_fg: Color::Indexed(11),
        tree_dir_fg: Color::Indexed(4),
        tree_link_fg: Color::Indexed(6),
        tree_indent_fg: Color::Indexed(0),
        tree_selected_fg: Color::Indexed(1),
        tree_selected_bg: Color::Indexed(7),
        tree_marked_bg: Color::Indexed(7),
        tree_arrow_fg: Color::Indexed(10),

        preview_fg: Color::Indexed(0),
        preview_border_fg: Color::Indexed(0),

        status_fg: Color::Indexed(0),
        status_input_bg: Color::Indexed(7),
        error_fg: Color::Indexed(1),

        path_fg: Color::Indexed(10),
        finfo_permissions_fg: Color::Indexed(0),
        finfo_fg: Color::Indexed(0),
        finfo_sep_fg: Color::Indexed(0),
    }
}

// ── Color parsing ────────────────────────────────────────────────────────────

/// Parse a hex color string like `"#aabbcc"` into a `ratatui::style::Color`.
/// Returns `None` for malformed input.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

// ── Theme resolution ─────────────────────────────────────────────────────────

/// Resolve the final `ThemeColors` from config.
///
/// Unknown scheme names fall back to `dark`.
pub fn resolve_theme(config: &ThemeConfig) -> ThemeColors {
    match config.scheme.as_deref().unwrap_or("dark") {
        "solarized" => solarized_theme(),
        "custom" => {
            let mut theme = dark_theme();
            if let Some(custom) = &config.custom {
                apply_custom_colors(&mut theme, custom);
            }
            theme
        }
        _ => dark_theme(),
    }
}

/// Apply custom hex color overrides on top of an existing theme.
/// Malformed values keep the existing color.
fn apply_custom_colors(theme: &mut ThemeColors, custom: &ThemeColorsConfig) {
    let overrides = [
        (&custom.file_fg, &mut theme.tree_file_fg),
        (&custom.dir_fg, &mut theme.tree_dir_fg),
        (&custom.link_fg, &mut theme.tree_link_fg),
        (&custom.selected_fg, &mut theme.tree_selected_fg),
        (&custom.marked_bg, &mut theme.tree_marked_bg),
        (&custom.preview_fg, &mut theme.preview_fg),
        (&custom.status_fg, &mut theme.status_fg),
        (&custom.error_fg, &mut theme.error_fg),
    ];
    for (hex, slot) in overrides {
        if let Some(color) = hex.as_deref().and_then(parse_hex_color) {
            *slot = color;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color_valid() {
        assert_eq!(parse_hex_color("#ff0000"), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(parse_hex_color("#6D74AC"), Some(Color::Rgb(109, 116, 172)));
        assert_eq!(parse_hex_color("00ff00"), Some(Color::Rgb(0, 255, 0)));
    }

    #[test]
    fn test_parse_hex_color_invalid() {
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color(""), None);
        assert_eq!(parse_hex_color("#ééé"), None);
    }

    #[test]
    fn test_resolve_default_is_dark() {
        let theme = resolve_theme(&ThemeConfig::default());
        assert_eq!(theme.tree_dir_fg, Color::Rgb(109, 116, 172));
    }

    #[test]
    fn test_resolve_solarized() {
        let config = ThemeConfig {
            scheme: Some("solarized".to_string()),
            custom: None,
        };
        assert_eq!(resolve_theme(&config).tree_dir_fg, Color::Indexed(4));
    }

    #[test]
    fn test_unknown_scheme_falls_back_to_dark() {
        let config = ThemeConfig {
            scheme: Some("neon".to_string()),
            custom: None,
        };
        assert_eq!(resolve_theme(&config).error_fg, Color::Rgb(172, 109, 116));
    }

    #[test]
    fn test_resolve_custom_overrides() {
        let config = ThemeConfig {
            scheme: Some("custom".to_string()),
            custom: Some(ThemeColorsConfig {
                dir_fg: Some("#1a1b26".to_string()),
                marked_bg: Some("not a color".to_string()),
                ..Default::default()
            }),
        };
        let theme = resolve_theme(&config);
        assert_eq!(theme.tree_dir_fg, Color::Rgb(26, 27, 38));
        assert_eq!(theme.tree_marked_bg, Color::Rgb(54, 54, 54));
        assert_eq!(theme.tree_file_fg, Color::Rgb(230, 230, 230));
    }
}
