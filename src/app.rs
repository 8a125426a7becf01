use std::time::Instant;

use crate::browser::content::ContentProvider;
use crate::browser::fetch::{FetchOutcome, FetchTrigger};
use crate::browser::node::{Category, CategoryKind, DisplayNode, NodeKey};
use crate::browser::preferences::BrowserPreferences;
use crate::model::directory::{ChildrenState, Directory, SearchState};
use crate::theme::ThemeColors;
use crate::view::TreeState;

/// Main application state.
pub struct App {
    pub directory: Directory,
    pub provider: ContentProvider,
    pub tree_state: TreeState,
    pub theme: ThemeColors,
    pub should_quit: bool,
    /// Transient message with its error flag and creation time.
    pub status_message: Option<(String, bool, Instant)>,
}

impl App {
    /// Create the app with every connection and its DIT expanded.
    pub fn new(
        directory: Directory,
        preferences: BrowserPreferences,
        fetch: FetchTrigger,
        theme: ThemeColors,
    ) -> Self {
        let mut tree_state = TreeState::new();
        for connection in directory.connection_ids() {
            tree_state.expand(NodeKey::Connection(connection));
            tree_state.expand(NodeKey::Category(Category {
                kind: CategoryKind::Dit,
                connection,
            }));
        }

        let mut app = Self {
            directory,
            provider: ContentProvider::new(preferences, fetch),
            tree_state,
            theme,
            should_quit: false,
            status_message: None,
        };
        app.reflatten();
        app
    }

    /// Rebuild the visible rows from the provider.
    pub fn reflatten(&mut self) {
        self.tree_state.flatten(&mut self.provider, &mut self.directory);
    }

    /// Set a status message with current timestamp.
    pub fn set_status_message(&mut self, msg: String, is_error: bool) {
        self.status_message = Some((msg, is_error, Instant::now()));
    }

    /// Clear the status message if it has been displayed for more than 3 seconds.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, _, ref created)) = self.status_message {
            if created.elapsed().as_secs() > 3 {
                self.status_message = None;
            }
        }
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        let len = self.tree_state.flat_items.len();
        if len > 0 && self.tree_state.selected_index < len - 1 {
            self.tree_state.selected_index += 1;
        }
    }

    /// Move selection up by one item.
    pub fn select_previous(&mut self) {
        if self.tree_state.selected_index > 0 {
            self.tree_state.selected_index -= 1;
        }
    }

    /// Jump to the first item.
    pub fn select_first(&mut self) {
        self.tree_state.selected_index = 0;
    }

    /// Jump to the last item.
    pub fn select_last(&mut self) {
        let len = self.tree_state.flat_items.len();
        if len > 0 {
            self.tree_state.selected_index = len - 1;
        }
    }

    /// Expand the selected node; unloaded children are fetched in the background.
    pub fn expand_selected(&mut self) {
        if self.tree_state.expand_selected() {
            self.reflatten();
        }
    }

    /// Collapse the selected node, or jump to its parent row.
    pub fn collapse_selected(&mut self) {
        if self.tree_state.collapse_selected(&self.provider, &self.directory) {
            self.reflatten();
        }
    }

    /// Cycle entry ordering: none, RDN, RDN value.
    pub fn cycle_sort(&mut self) {
        let mut preferences = self.provider.preferences().clone();
        preferences.sort_by = preferences.sort_by.next();
        let msg = format!("Sort: {}", preferences.sort_by.label());
        self.apply_preferences(preferences);
        self.set_status_message(msg, false);
    }

    /// Flip between ascending and descending entry order.
    pub fn toggle_sort_order(&mut self) {
        let mut preferences = self.provider.preferences().clone();
        preferences.sort_order = preferences.sort_order.toggled();
        let msg = format!("Order: {}", preferences.sort_order.label());
        self.apply_preferences(preferences);
        self.set_status_message(msg, false);
    }

    /// Turn page folding on or off.
    pub fn toggle_folding(&mut self) {
        let mut preferences = self.provider.preferences().clone();
        preferences.use_folding = !preferences.use_folding;
        let msg = if preferences.use_folding {
            format!("Folding: pages of {}", preferences.folding_size)
        } else {
            "Folding: off".to_string()
        };
        self.apply_preferences(preferences);
        self.set_status_message(msg, false);
    }

    fn apply_preferences(&mut self, preferences: BrowserPreferences) {
        tracing::debug!(?preferences, "preferences changed");
        self.provider.set_preferences(preferences);
        self.reflatten();
    }

    /// Drop the loaded children or results behind the selection so they are
    /// fetched again.
    pub fn refresh_selected(&mut self) {
        let Some(item) = self.tree_state.selected() else {
            return;
        };
        let target = match &item.node {
            DisplayNode::Entry(id) => Some(NodeKey::Entry(*id)),
            DisplayNode::SearchResult { entry, .. } => Some(NodeKey::Entry(*entry)),
            DisplayNode::EntryPage(page) => Some(NodeKey::Entry(page.owner())),
            DisplayNode::Search(id) => Some(NodeKey::Search(*id)),
            DisplayNode::SearchResultPage(page) => Some(NodeKey::Search(page.owner())),
            _ => None,
        };
        let label = item.label.clone();
        match target {
            Some(NodeKey::Entry(id)) => self.directory.invalidate_children(id),
            Some(NodeKey::Search(id)) => self.directory.invalidate_search(id),
            _ => {
                self.set_status_message("Nothing to refresh".to_string(), false);
                return;
            }
        }
        tracing::info!(node = %label, "refresh requested");
        self.reflatten();
        self.set_status_message(format!("Refreshing {label}"), false);
    }

    /// Write a background fetch result into the model and redraw the rows.
    pub fn handle_fetched(&mut self, outcome: FetchOutcome) {
        if let Err(err) = outcome.apply(&mut self.directory) {
            tracing::warn!(error = %err, "background fetch failed");
            self.set_status_message(err.to_string(), true);
        }
        self.reflatten();
    }

    /// Full DN (or label) of the selected row.
    pub fn selection_title(&self) -> String {
        let Some(item) = self.tree_state.selected() else {
            return String::new();
        };
        match item.node.entry_id() {
            Some(id) => {
                let entry = self.directory.entry(id);
                if entry.dn.is_root() {
                    entry.label()
                } else {
                    entry.dn.to_string()
                }
            }
            None => match &item.node {
                DisplayNode::Bookmark(id) => self.directory.bookmark(*id).dn.to_string(),
                DisplayNode::Search(id) => self.directory.search(*id).base.to_string(),
                _ => item.label.clone(),
            },
        }
    }

    /// Short description of what the selected row holds.
    pub fn selection_info(&self) -> String {
        let Some(item) = self.tree_state.selected() else {
            return String::new();
        };
        match &item.node {
            DisplayNode::Entry(id) | DisplayNode::SearchResult { entry: id, .. } => {
                let entry = self.directory.entry(*id);
                match entry.children_state() {
                    ChildrenState::Initialized => format!("{} children", entry.children_count()),
                    ChildrenState::Initializing => "fetching".to_string(),
                    ChildrenState::Uninitialized if entry.has_children() => "not loaded".to_string(),
                    ChildrenState::Uninitialized => "leaf".to_string(),
                }
            }
            DisplayNode::EntryPage(page) => page_info("entries", page.is_leaf(), page.first(), page.last()),
            DisplayNode::SearchResultPage(page) => page_info("results", page.is_leaf(), page.first(), page.last()),
            DisplayNode::Search(id) => {
                let search = self.directory.search(*id);
                match (search.state(), search.results()) {
                    (SearchState::Executing, _) => "searching".to_string(),
                    (_, Some(results)) => format!("{} results", results.len()),
                    (_, None) => "not executed".to_string(),
                }
            }
            _ => String::new(),
        }
    }

    /// Hint shown when the directory capped the selected entry's children.
    pub fn selection_has_more(&self) -> bool {
        self.tree_state
            .selected()
            .and_then(|item| item.node.entry_id())
            .is_some_and(|id| self.directory.entry(id).has_more_children())
    }

    /// Current ordering and folding, for the status bar.
    pub fn sort_info(&self) -> String {
        let prefs = self.provider.preferences();
        let fold = if prefs.is_folding_active() {
            format!("fold {}", prefs.folding_size)
        } else {
            "no fold".to_string()
        };
        format!("{} {} | {}", prefs.sort_by.label(), prefs.sort_order.label(), fold)
    }
}

fn page_info(what: &str, is_leaf: bool, first: usize, last: usize) -> String {
    if is_leaf {
        format!("{what} {}..{}", first + 1, last + 1)
    } else {
        format!("{what} {}..{} (nested)", first + 1, last + 1)
    }
}
