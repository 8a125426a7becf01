//! Ordering of sibling nodes in the browser tree.
//!
//! Entries (and search results, through their entry) are first bucketed into
//! a small category number that is an absolute primary key, then compared by
//! RDN or RDN value. Every direction-dependent result goes through
//! [`Sorter::directed`], which flips the sign for descending order instead of
//! swapping operands.

use std::cmp::Ordering;

use num_bigint::BigUint;

use crate::browser::node::DisplayNode;
use crate::browser::preferences::{BrowserPreferences, ListOrder, SortBy, SortOrder};
use crate::model::directory::{Directory, Entry, EntryId};

/// Category of nodes that are neither entries nor search results.
pub const OTHER_CATEGORY: u8 = 4;

/// Compares display nodes according to the current preferences.
pub struct Sorter<'a> {
    preferences: &'a BrowserPreferences,
    directory: &'a Directory,
}

impl<'a> Sorter<'a> {
    pub fn new(preferences: &'a BrowserPreferences, directory: &'a Directory) -> Self {
        Self {
            preferences,
            directory,
        }
    }

    /// Whether a list of `len` siblings should be sorted at all.
    pub fn should_sort(&self, len: usize) -> bool {
        let prefs = self.preferences;
        if len == 0 {
            return false;
        }
        if prefs.sort_limit > 0 && len as i64 >= prefs.sort_limit {
            return false;
        }
        !(prefs.sort_by == SortBy::None && !prefs.leaf_entries_first)
    }

    /// Sort `nodes` in place, or leave them in insertion order when
    /// [`should_sort`](Self::should_sort) says so.
    pub fn sort(&self, nodes: &mut [DisplayNode]) {
        if !self.should_sort(nodes.len()) {
            if self.preferences.sort_limit > 0 && nodes.len() as i64 >= self.preferences.sort_limit {
                tracing::debug!(count = nodes.len(), "sort limit reached, keeping directory order");
            }
            return;
        }
        merge_sort_by(nodes, &mut |a, b| self.compare(Some(a), Some(b)));
    }

    /// Sort searches or bookmarks by name, if their order is not `None`.
    pub fn sort_named(&self, nodes: &mut [DisplayNode]) {
        merge_sort_by(nodes, &mut |a, b| self.compare(Some(a), Some(b)));
    }

    /// Primary sort key: 0 subentries, 1 leaves, 2 normal, 3 meta, 4 other.
    pub fn category(&self, node: &DisplayNode) -> u8 {
        let prefs = self.preferences;
        if !prefs.leaf_entries_first && !prefs.meta_entries_last {
            return 0;
        }
        match node.entry_id() {
            Some(id) => self.entry_category(self.directory.entry(id)),
            None => OTHER_CATEGORY,
        }
    }

    fn entry_category(&self, entry: &Entry) -> u8 {
        let prefs = self.preferences;
        if entry.is_meta() && prefs.meta_entries_last {
            3
        } else if entry.is_subentry() && prefs.leaf_entries_first {
            0
        } else if !entry.has_children() && prefs.leaf_entries_first {
            1
        } else {
            2
        }
    }

    /// Total comparison of two optional nodes.
    pub fn compare(&self, a: Option<&DisplayNode>, b: Option<&DisplayNode>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => self.less_than(),
            (Some(_), None) => self.greater_than(),
            (Some(a), Some(b)) => self.compare_nodes(a, b),
        }
    }

    fn compare_nodes(&self, a: &DisplayNode, b: &DisplayNode) -> Ordering {
        use DisplayNode::*;

        match (a, b) {
            (Entry(x), Entry(y)) => self.compare_entries(a, b, *x, *y),
            (_, Entry(_)) => self.less_than(),
            (Entry(_), _) => self.greater_than(),

            (SearchResult { entry: x, .. }, SearchResult { entry: y, .. }) => self.compare_entries(a, b, *x, *y),
            (_, SearchResult { .. }) => self.less_than(),
            (SearchResult { .. }, _) => self.greater_than(),

            (Search(x), Search(y)) => {
                let dir = self.directory;
                compare_names(&dir.search(*x).name, &dir.search(*y).name, self.preferences.searches_order)
            }
            (_, Search(_)) => list_less_than(self.preferences.searches_order),
            (Search(_), _) => list_less_than(self.preferences.searches_order).reverse(),

            (Bookmark(x), Bookmark(y)) => {
                let dir = self.directory;
                compare_names(&dir.bookmark(*x).name, &dir.bookmark(*y).name, self.preferences.bookmarks_order)
            }
            (_, Bookmark(_)) => list_less_than(self.preferences.bookmarks_order),
            (Bookmark(_), _) => list_less_than(self.preferences.bookmarks_order).reverse(),

            _ => Ordering::Equal,
        }
    }

    fn compare_entries(&self, a: &DisplayNode, b: &DisplayNode, x: EntryId, y: EntryId) -> Ordering {
        let (cat_a, cat_b) = (self.category(a), self.category(b));
        if cat_a != cat_b {
            // Categories are absolute and ignore the sort direction.
            return cat_a.cmp(&cat_b);
        }
        let (x, y) = (self.directory.entry(x), self.directory.entry(y));
        match self.preferences.sort_by {
            SortBy::None => Ordering::Equal,
            SortBy::Rdn => self.compare_rdns(x, y),
            SortBy::RdnValue => self.compare_rdn_values(x, y),
        }
    }

    fn compare_rdns(&self, x: &Entry, y: &Entry) -> Ordering {
        match (x.rdn(), y.rdn()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => self.greater_than(),
            (Some(_), None) => self.less_than(),
            (Some(a), Some(b)) => self.compare_strings(a.name(), b.name()),
        }
    }

    fn compare_rdn_values(&self, x: &Entry, y: &Entry) -> Ordering {
        let a = x.rdn().map(|rdn| rdn.value()).filter(|v| !v.is_empty());
        let b = y.rdn().map(|rdn| rdn.value()).filter(|v| !v.is_empty());
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => self.greater_than(),
            (Some(_), None) => self.less_than(),
            (Some(a), Some(b)) => match (is_all_digits(&a), is_all_digits(&b)) {
                (true, true) => self.compare_numbers(&a, &b),
                // Mixed numeric and textual values compare as text.
                _ => self.compare_strings(&a, &b),
            },
        }
    }

    fn compare_strings(&self, a: &str, b: &str) -> Ordering {
        self.directed(compare_ignore_case(a, b))
    }

    fn compare_numbers(&self, a: &str, b: &str) -> Ordering {
        match (BigUint::parse_bytes(a.as_bytes(), 10), BigUint::parse_bytes(b.as_bytes(), 10)) {
            (Some(x), Some(y)) => self.directed(x.cmp(&y)),
            _ => self.compare_strings(a, b),
        }
    }

    fn directed(&self, ordering: Ordering) -> Ordering {
        match self.preferences.sort_order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }

    fn less_than(&self) -> Ordering {
        self.directed(Ordering::Less)
    }

    fn greater_than(&self) -> Ordering {
        self.directed(Ordering::Greater)
    }
}

fn list_less_than(order: ListOrder) -> Ordering {
    if order == ListOrder::Ascending {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

fn compare_names(a: &str, b: &str, order: ListOrder) -> Ordering {
    match order {
        ListOrder::None => Ordering::Equal,
        ListOrder::Ascending => compare_ignore_case(a, b),
        ListOrder::Descending => compare_ignore_case(a, b).reverse(),
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Stable merge sort. RDN-value ordering is not transitive when numeric and
/// textual values mix, and `slice::sort_by` may panic on such comparators.
fn merge_sort_by<T: Clone, F: FnMut(&T, &T) -> Ordering>(items: &mut [T], compare: &mut F) {
    let len = items.len();
    if len <= 1 {
        return;
    }
    let mid = len / 2;
    merge_sort_by(&mut items[..mid], compare);
    merge_sort_by(&mut items[mid..], compare);

    let mut merged = Vec::with_capacity(len);
    {
        let (left, right) = items.split_at(mid);
        let (mut i, mut j) = (0, 0);
        while i < left.len() && j < right.len() {
            if compare(&right[j], &left[i]) == Ordering::Less {
                merged.push(right[j].clone());
                j += 1;
            } else {
                merged.push(left[i].clone());
                i += 1;
            }
        }
        merged.extend_from_slice(&left[i..]);
        merged.extend_from_slice(&right[j..]);
    }
    items.clone_from_slice(&merged);
}
