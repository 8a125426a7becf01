//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--no-folding`, `--sort-by`, etc.)
//! 2. `$LDB_CONFIG` environment variable (path to config file)
//! 3. Project-local `.ldb.toml` in the current working directory
//! 4. Global `~/.config/ldb/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::browser::preferences::{
    BrowserPreferences, ListOrder, SortBy, SortOrder, DEFAULT_FOLDING_SIZE, DEFAULT_SORT_LIMIT,
};
use crate::model::directory::DEFAULT_COUNT_LIMIT;

// ── Section configs ──────────────────────────────────────────────────────────

/// Folding of large child lists into pages.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FoldingConfig {
    /// The "use folding" flag.
    pub enabled: Option<bool>,
    /// Page size at which folding begins.
    pub size: Option<usize>,
}

/// Entry, search and bookmark ordering.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SortConfig {
    /// "none", "rdn" or "rdn_value".
    pub by: Option<String>,
    /// "ascending" or "descending".
    pub order: Option<String>,
    /// Skip sorting at this many elements; zero or negative is unlimited.
    pub limit: Option<i64>,
    pub leaf_entries_first: Option<bool>,
    pub meta_entries_last: Option<bool>,
    /// Search ordering by name: "none", "ascending", "descending".
    pub searches: Option<String>,
    /// Bookmark ordering by name: "none", "ascending", "descending".
    pub bookmarks: Option<String>,
}

/// Which nodes the tree shows.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DisplayConfig {
    pub show_dit: Option<bool>,
    pub show_searches: Option<bool>,
    pub show_bookmarks: Option<bool>,
    /// Show schema and other directory metadata entries.
    pub show_directory_meta_entries: Option<bool>,
    /// Let aliases and referrals be expanded.
    pub show_alias_and_referral_objects: Option<bool>,
}

/// Background fetch settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FetchConfig {
    /// Simulated directory round-trip in milliseconds.
    pub latency_ms: Option<u64>,
    /// Default maximum number of children per directory call.
    pub count_limit: Option<usize>,
}

/// Color settings for a single theme palette.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub tree_bg: Option<String>,
    pub tree_fg: Option<String>,
    pub tree_selected_bg: Option<String>,
    pub tree_selected_fg: Option<String>,
    pub tree_container_fg: Option<String>,
    pub tree_leaf_fg: Option<String>,
    pub tree_meta_fg: Option<String>,
    pub tree_page_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark", "light", "custom".
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
    pub folding: FoldingConfig,
    pub sort: SortConfig,
    pub display: DisplayConfig,
    pub fetch: FetchConfig,
    pub theme: ThemeConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default simulated fetch latency in milliseconds.
pub const DEFAULT_LATENCY_MS: u64 = 150;

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path, which is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("LDB_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".ldb.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("ldb").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return None,
    };
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => {
            tracing::debug!(path = %path.display(), "loaded config file");
            Some(cfg)
        }
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            folding: FoldingConfig {
                enabled: other.folding.enabled.or(self.folding.enabled),
                size: other.folding.size.or(self.folding.size),
            },
            sort: SortConfig {
                by: other.sort.by.clone().or(self.sort.by),
                order: other.sort.order.clone().or(self.sort.order),
                limit: other.sort.limit.or(self.sort.limit),
                leaf_entries_first: other
                    .sort
                    .leaf_entries_first
                    .or(self.sort.leaf_entries_first),
                meta_entries_last: other
                    .sort
                    .meta_entries_last
                    .or(self.sort.meta_entries_last),
                searches: other.sort.searches.clone().or(self.sort.searches),
                bookmarks: other.sort.bookmarks.clone().or(self.sort.bookmarks),
            },
            display: DisplayConfig {
                show_dit: other.display.show_dit.or(self.display.show_dit),
                show_searches: other.display.show_searches.or(self.display.show_searches),
                show_bookmarks: other.display.show_bookmarks.or(self.display.show_bookmarks),
                show_directory_meta_entries: other
                    .display
                    .show_directory_meta_entries
                    .or(self.display.show_directory_meta_entries),
                show_alias_and_referral_objects: other
                    .display
                    .show_alias_and_referral_objects
                    .or(self.display.show_alias_and_referral_objects),
            },
            fetch: FetchConfig {
                latency_ms: other.fetch.latency_ms.or(self.fetch.latency_ms),
                count_limit: other.fetch.count_limit.or(self.fetch.count_limit),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: match (&self.theme.custom, &other.theme.custom) {
                    (_, Some(o)) => Some(o.clone()),
                    (Some(s), None) => Some(s.clone()),
                    (None, None) => None,
                },
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Walk in reverse so that highest-priority (env var) overwrites lower.
        let paths = candidate_paths();
        for path in paths.iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn folding_enabled(&self) -> bool {
        self.folding.enabled.unwrap_or(true)
    }

    pub fn folding_size(&self) -> usize {
        self.folding.size.unwrap_or(DEFAULT_FOLDING_SIZE)
    }

    pub fn sort_by(&self) -> SortBy {
        SortBy::from_str(self.sort.by.as_deref().unwrap_or("rdn_value"))
    }

    pub fn sort_order(&self) -> SortOrder {
        SortOrder::from_str(self.sort.order.as_deref().unwrap_or("ascending"))
    }

    pub fn sort_limit(&self) -> i64 {
        self.sort.limit.unwrap_or(DEFAULT_SORT_LIMIT)
    }

    pub fn leaf_entries_first(&self) -> bool {
        self.sort.leaf_entries_first.unwrap_or(true)
    }

    pub fn meta_entries_last(&self) -> bool {
        self.sort.meta_entries_last.unwrap_or(true)
    }

    pub fn searches_order(&self) -> ListOrder {
        ListOrder::from_str(self.sort.searches.as_deref().unwrap_or("none"))
    }

    pub fn bookmarks_order(&self) -> ListOrder {
        ListOrder::from_str(self.sort.bookmarks.as_deref().unwrap_or("none"))
    }

    /// Simulated directory round-trip.
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.fetch.latency_ms.unwrap_or(DEFAULT_LATENCY_MS))
    }

    pub fn count_limit(&self) -> usize {
        self.fetch.count_limit.unwrap_or(DEFAULT_COUNT_LIMIT)
    }

    /// Theme scheme: "dark", "light", or "custom".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }

    /// Snapshot the browser preferences this config describes.
    pub fn preferences(&self) -> BrowserPreferences {
        let display = &self.display;
        BrowserPreferences {
            use_folding: self.folding_enabled(),
            folding_size: self.folding_size(),
            sort_by: self.sort_by(),
            sort_order: self.sort_order(),
            leaf_entries_first: self.leaf_entries_first(),
            meta_entries_last: self.meta_entries_last(),
            sort_limit: self.sort_limit(),
            searches_order: self.searches_order(),
            bookmarks_order: self.bookmarks_order(),
            show_dit: display.show_dit.unwrap_or(true),
            show_searches: display.show_searches.unwrap_or(true),
            show_bookmarks: display.show_bookmarks.unwrap_or(true),
            show_directory_meta_entries: display.show_directory_meta_entries.unwrap_or(false),
            show_alias_and_referral_objects: display.show_alias_and_referral_objects.unwrap_or(true),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let cfg = AppConfig::default();
        assert!(cfg.folding_enabled());
        assert_eq!(cfg.folding_size(), 100);
        assert_eq!(cfg.sort_by(), SortBy::RdnValue);
        assert_eq!(cfg.sort_order(), SortOrder::Ascending);
        assert_eq!(cfg.sort_limit(), 10_000);
        assert_eq!(cfg.latency(), Duration::from_millis(150));
        assert_eq!(cfg.count_limit(), 1000);
        assert_eq!(cfg.theme_scheme(), "dark");
        assert_eq!(cfg.preferences(), BrowserPreferences::default());
    }

    #[test]
    fn test_toml_parsing_full() {
        let toml = r#"
[folding]
enabled = false
size = 25

[sort]
by = "rdn"
order = "descending"
limit = 0
leaf_entries_first = false
meta_entries_last = false
searches = "ascending"
bookmarks = "descending"

[display]
show_dit = true
show_searches = false
show_bookmarks = false
show_directory_meta_entries = true
show_alias_and_referral_objects = false

[fetch]
latency_ms = 0
count_limit = 500

[theme]
scheme = "light"
"#;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        let prefs = cfg.preferences();
        assert!(!prefs.use_folding);
        assert_eq!(prefs.folding_size, 25);
        assert_eq!(prefs.sort_by, SortBy::Rdn);
        assert_eq!(prefs.sort_order, SortOrder::Descending);
        assert_eq!(prefs.sort_limit, 0);
        assert!(!prefs.leaf_entries_first);
        assert!(!prefs.meta_entries_last);
        assert_eq!(prefs.searches_order, ListOrder::Ascending);
        assert_eq!(prefs.bookmarks_order, ListOrder::Descending);
        assert!(!prefs.show_searches);
        assert!(!prefs.show_bookmarks);
        assert!(prefs.show_directory_meta_entries);
        assert!(!prefs.show_alias_and_referral_objects);
        assert_eq!(cfg.latency(), Duration::ZERO);
        assert_eq!(cfg.count_limit(), 500);
        assert_eq!(cfg.theme_scheme(), "light");
    }

    #[test]
    fn test_toml_parsing_partial() {
        let toml = r#"
[folding]
size = 10
"#;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        assert_eq!(cfg.folding_size(), 10);
        // Everything else should be defaults
        assert!(cfg.folding_enabled());
        assert_eq!(cfg.sort_by(), SortBy::RdnValue);
    }

    #[test]
    fn test_toml_parsing_empty() {
        let cfg: AppConfig = toml::from_str("").expect("parse failed");
        assert!(cfg.folding_enabled());
        assert_eq!(cfg.count_limit(), 1000);
    }

    #[test]
    fn test_merge_overrides() {
        let base = AppConfig {
            folding: FoldingConfig {
                enabled: Some(true),
                size: Some(50),
            },
            sort: SortConfig {
                by: Some("rdn".into()),
                limit: Some(200),
                ..Default::default()
            },
            ..Default::default()
        };

        let over = AppConfig {
            folding: FoldingConfig {
                size: Some(20),
                // enabled not set, should keep base
                ..Default::default()
            },
            sort: SortConfig {
                order: Some("descending".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = base.merge(&over);
        assert!(merged.folding_enabled()); // from base
        assert_eq!(merged.folding_size(), 20); // overridden
        assert_eq!(merged.sort_by(), SortBy::Rdn); // from base
        assert_eq!(merged.sort_order(), SortOrder::Descending); // overridden
        assert_eq!(merged.sort_limit(), 200);
    }

    #[test]
    fn test_merge_none_does_not_clear_some() {
        let base = AppConfig {
            fetch: FetchConfig {
                latency_ms: Some(0),
                count_limit: Some(42),
            },
            ..Default::default()
        };
        let over = AppConfig::default(); // all None

        let merged = base.merge(&over);
        assert_eq!(merged.latency(), Duration::ZERO);
        assert_eq!(merged.count_limit(), 42);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("test-config.toml");
        let mut f = std::fs::File::create(&cfg_path).expect("create");
        writeln!(
            f,
            r#"
[folding]
size = 10

[sort]
by = "none"

[display]
show_directory_meta_entries = true
"#
        )
        .expect("write");

        let cfg = load_file(&cfg_path).expect("load");
        assert_eq!(cfg.folding_size(), 10);
        assert_eq!(cfg.sort_by(), SortBy::None);
        assert!(cfg.preferences().show_directory_meta_entries);
        // Unset fields fall through to defaults
        assert_eq!(cfg.sort_limit(), 10_000);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_file(Path::new("/nonexistent/config.toml"));
        assert!(result.is_none());
    }

    #[test]
    fn test_load_invalid_toml_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("bad.toml");
        std::fs::write(&cfg_path, "this is { not valid toml").expect("write");
        let result = load_file(&cfg_path);
        assert!(result.is_none());
    }

    #[test]
    fn test_load_with_cli_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("config.toml");
        std::fs::write(
            &cfg_path,
            r#"
[folding]
size = 10

[sort]
order = "descending"
"#,
        )
        .expect("write");

        let cli_overrides = AppConfig {
            folding: FoldingConfig {
                size: Some(30),
                ..Default::default()
            },
            ..Default::default()
        };

        let cfg = AppConfig::load(Some(&cfg_path), Some(&cli_overrides));
        // CLI override wins
        assert_eq!(cfg.folding_size(), 30);
        // File value preserved (not overridden by CLI)
        assert_eq!(cfg.sort_order(), SortOrder::Descending);
    }

    #[test]
    fn test_theme_custom_colors() {
        let toml = r##"
[theme]
scheme = "custom"

[theme.custom]
tree_bg = "#1a1b26"
tree_page_fg = "#bb9af7"
border_fg = "#565f89"
"##;
        let cfg: AppConfig = toml::from_str(toml).expect("parse");
        assert_eq!(cfg.theme_scheme(), "custom");
        let custom = cfg.theme.custom.as_ref().expect("custom present");
        assert_eq!(custom.tree_bg.as_deref(), Some("#1a1b26"));
        assert_eq!(custom.tree_page_fg.as_deref(), Some("#bb9af7"));
        assert_eq!(custom.border_fg.as_deref(), Some("#565f89"));
        // Unset custom colors are None
        assert!(custom.status_bg.is_none());
    }
}
