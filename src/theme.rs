//! Theme data model: built-in palettes and resolution from config.
//!
//! Two built-in palettes (dark and light) for the directory tree, plus
//! custom color overrides from the config file.

use ratatui::style::Color;

use crate::config::{ThemeColorsConfig, ThemeConfig};

// ── Runtime theme colors ─────────────────────────────────────────────────────

/// All runtime colors used in the UI.
///
/// Constructed from a config-level `ThemeConfig` via `resolve_theme()`.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Tree panel
    pub tree_bg: Color,
    pub tree_fg: Color,
    pub tree_selected_bg: Color,
    pub tree_selected_fg: Color,
    /// Connections, categories and entries with children.
    pub tree_container_fg: Color,
    /// Leaf entries, search results and bookmarks.
    pub tree_leaf_fg: Color,
    /// Root DSE, schema, aliases and referrals.
    pub tree_meta_fg: Color,
    /// Folding pages.
    pub tree_page_fg: Color,

    // Status bar
    pub status_bg: Color,
    pub status_fg: Color,

    // Borders & chrome
    pub border_fg: Color,
    pub border_focused_fg: Color,

    // Semantic colors (not configurable, consistent across themes)
    pub error_fg: Color,
    pub warning_fg: Color,
    pub success_fg: Color,
    pub info_fg: Color,
    pub accent_fg: Color,
    pub dim_fg: Color,
}

// ── Built-in palettes ────────────────────────────────────────────────────────

/// Dark theme using Catppuccin Mocha palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        tree_bg: Color::Reset,
        tree_fg: Color::Rgb(205, 214, 244),          // #cdd6f4 (text)
        tree_selected_bg: Color::Rgb(69, 71, 90),    // #45475a (surface1)
        tree_selected_fg: Color::Rgb(205, 214, 244), // #cdd6f4
        tree_container_fg: Color::Rgb(137, 180, 250), // #89b4fa (blue)
        tree_leaf_fg: Color::Rgb(205, 214, 244),     // #cdd6f4
        tree_meta_fg: Color::Rgb(108, 112, 134),     // #6c7086 (overlay0)
        tree_page_fg: Color::Rgb(203, 166, 247),     // #cba6f7 (mauve)

        status_bg: Color::Rgb(30, 30, 46), // #1e1e2e (base)
        status_fg: Color::Rgb(205, 214, 244),

        border_fg: Color::Rgb(88, 91, 112),           // #585b70 (surface2)
        border_focused_fg: Color::Rgb(137, 180, 250), // #89b4fa (blue)

        error_fg: Color::Rgb(243, 139, 168),   // #f38ba8 (red)
        warning_fg: Color::Rgb(249, 226, 175), // #f9e2af (yellow)
        success_fg: Color::Rgb(166, 227, 161), // #a6e3a1 (green)
        info_fg: Color::Rgb(137, 180, 250),    // #89b4fa (blue)
        accent_fg: Color::Rgb(203, 166, 247),  // #cba6f7 (mauve)
        dim_fg: Color::Rgb(108, 112, 134),     // #6c7086
    }
}

/// Light theme using Catppuccin Latte palette.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        tree_bg: Color::Reset,
        tree_fg: Color::Rgb(76, 79, 105),            // #4c4f69 (text)
        tree_selected_bg: Color::Rgb(204, 208, 218), // #ccd0da (surface1)
        tree_selected_fg: Color::Rgb(76, 79, 105),
        tree_container_fg: Color::Rgb(30, 102, 245), // #1e66f5 (blue)
        tree_leaf_fg: Color::Rgb(76, 79, 105),
        tree_meta_fg: Color::Rgb(156, 160, 176), // #9ca0b0 (overlay0)
        tree_page_fg: Color::Rgb(136, 57, 239),  // #8839ef (mauve)

        status_bg: Color::Rgb(239, 241, 245), // #eff1f5 (base)
        status_fg: Color::Rgb(76, 79, 105),

        border_fg: Color::Rgb(172, 176, 190), // #acb0be (surface2)
        border_focused_fg: Color::Rgb(30, 102, 245),

        error_fg: Color::Rgb(210, 15, 57),    // #d20f39 (red)
        warning_fg: Color::Rgb(223, 142, 29), // #df8e1d (yellow)
        success_fg: Color::Rgb(64, 160, 43),  // #40a02b (green)
        info_fg: Color::Rgb(30, 102, 245),
        accent_fg: Color::Rgb(136, 57, 239), // #8839ef (mauve)
        dim_fg: Color::Rgb(156, 160, 176),
    }
}

// ── Color parsing ────────────────────────────────────────────────────────────

/// Parse a hex color string like `"#aabbcc"` into a `ratatui::style::Color`.
/// Returns `None` for malformed input.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

/// Parse a hex color string, falling back to the provided default on error.
fn parse_or(hex_opt: Option<&str>, fallback: Color) -> Color {
    hex_opt.and_then(parse_hex_color).unwrap_or(fallback)
}

// ── Theme resolution ─────────────────────────────────────────────────────────

/// Resolve the final `ThemeColors` from config.
///
/// - `"dark"` (default): dark Catppuccin palette
/// - `"light"`: light Catppuccin palette
/// - `"custom"`: start from dark palette, then override with custom hex values
pub fn resolve_theme(config: &ThemeConfig) -> ThemeColors {
    let scheme = config.scheme.as_deref().unwrap_or("dark");
    match scheme {
        "light" => light_theme(),
        "custom" => {
            let mut theme = dark_theme();
            if let Some(custom) = &config.custom {
                apply_custom_colors(&mut theme, custom);
            }
            theme
        }
        _ => dark_theme(), // "dark" or any unrecognized value
    }
}

/// Apply custom hex color overrides on top of an existing theme.
fn apply_custom_colors(theme: &mut ThemeColors, custom: &ThemeColorsConfig) {
    if let Some(ref c) = custom.tree_bg {
        theme.tree_bg = parse_or(Some(c), theme.tree_bg);
    }
    if let Some(ref c) = custom.tree_fg {
        theme.tree_fg = parse_or(Some(c), theme.tree_fg);
    }
    if let Some(ref c) = custom.tree_selected_bg {
        theme.tree_selected_bg = parse_or(Some(c), theme.tree_selected_bg);
    }
    if let Some(ref c) = custom.tree_selected_fg {
        theme.tree_selected_fg = parse_or(Some(c), theme.tree_selected_fg);
    }
    if let Some(ref c) = custom.tree_container_fg {
        theme.tree_container_fg = parse_or(Some(c), theme.tree_container_fg);
    }
    if let Some(ref c) = custom.tree_leaf_fg {
        theme.tree_leaf_fg = parse_or(Some(c), theme.tree_leaf_fg);
    }
    if let Some(ref c) = custom.tree_meta_fg {
        theme.tree_meta_fg = parse_or(Some(c), theme.tree_meta_fg);
    }
    if let Some(ref c) = custom.tree_page_fg {
        theme.tree_page_fg = parse_or(Some(c), theme.tree_page_fg);
    }
    if let Some(ref c) = custom.status_bg {
        theme.status_bg = parse_or(Some(c), theme.status_bg);
    }
    if let Some(ref c) = custom.status_fg {
        theme.status_fg = parse_or(Some(c), theme.status_fg);
    }
    if let Some(ref c) = custom.border_fg {
        theme.border_fg = parse_or(Some(c), theme.border_fg);
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
