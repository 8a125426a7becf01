//! Display preferences consumed by the sorter and the content provider.

/// Default page size at which folding begins.
pub const DEFAULT_FOLDING_SIZE: usize = 100;
/// Default element count above which sorting is skipped.
pub const DEFAULT_SORT_LIMIT: i64 = 10_000;

/// What entries are ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    /// Keep directory order.
    None,
    /// The full RDN string, e.g. `uid=42`.
    Rdn,
    /// Only the RDN value, numeric-aware.
    RdnValue,
}

impl SortBy {
    /// Parse sort_by from config string.
    pub fn from_str(s: &str) -> Self {
        match s {
            "none" => SortBy::None,
            "rdn" => SortBy::Rdn,
            _ => SortBy::RdnValue,
        }
    }

    /// Get the display label for the current sort.
    pub fn label(&self) -> &'static str {
        match self {
            SortBy::None => "None",
            SortBy::Rdn => "RDN",
            SortBy::RdnValue => "RDN value",
        }
    }

    /// Cycle to the next sort option.
    pub fn next(&self) -> Self {
        match self {
            SortBy::None => SortBy::Rdn,
            SortBy::Rdn => SortBy::RdnValue,
            SortBy::RdnValue => SortBy::None,
        }
    }
}

/// Direction of the entry ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn from_str(s: &str) -> Self {
        match s {
            "descending" | "desc" => SortOrder::Descending,
            _ => SortOrder::Ascending,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Ordering of searches or bookmarks by name; `None` keeps manager order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    None,
    Ascending,
    Descending,
}

impl ListOrder {
    pub fn from_str(s: &str) -> Self {
        match s {
            "ascending" | "asc" => ListOrder::Ascending,
            "descending" | "desc" => ListOrder::Descending,
            _ => ListOrder::None,
        }
    }
}

/// Snapshot of the browser preferences. Read-only during a comparison or
/// partition pass; replaced wholesale when the user changes a setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserPreferences {
    pub use_folding: bool,
    /// Page size at which folding begins.
    pub folding_size: usize,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub leaf_entries_first: bool,
    pub meta_entries_last: bool,
    /// Skip sorting when the element count reaches this; `<= 0` is unlimited.
    pub sort_limit: i64,
    pub searches_order: ListOrder,
    pub bookmarks_order: ListOrder,
    pub show_dit: bool,
    pub show_searches: bool,
    pub show_bookmarks: bool,
    pub show_directory_meta_entries: bool,
    pub show_alias_and_referral_objects: bool,
}

impl Default for BrowserPreferences {
    fn default() -> Self {
        Self {
            use_folding: true,
            folding_size: DEFAULT_FOLDING_SIZE,
            sort_by: SortBy::RdnValue,
            sort_order: SortOrder::Ascending,
            leaf_entries_first: true,
            meta_entries_last: true,
            sort_limit: DEFAULT_SORT_LIMIT,
            searches_order: ListOrder::None,
            bookmarks_order: ListOrder::None,
            show_dit: true,
            show_searches: true,
            show_bookmarks: true,
            show_directory_meta_entries: false,
            show_alias_and_referral_objects: true,
        }
    }
}

impl BrowserPreferences {
    /// Folding is only meaningful with at least two items per page.
    pub fn is_folding_active(&self) -> bool {
        self.use_folding && self.folding_size >= 2
    }
}
