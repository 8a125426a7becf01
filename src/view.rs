use std::collections::HashSet;

use crate::browser::content::ContentProvider;
use crate::browser::node::{DisplayNode, NodeKey};
use crate::model::directory::Directory;

/// How a row is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Connection,
    Category,
    /// A DIT entry; `meta` marks aliases, referrals, subentries and schema.
    Entry { meta: bool },
    Search,
    SearchResult,
    Bookmark,
    Page,
    Placeholder,
}

impl ItemKind {
    fn of(node: &DisplayNode, directory: &Directory) -> Self {
        match node {
            DisplayNode::Connection(_) => ItemKind::Connection,
            DisplayNode::Category(_) => ItemKind::Category,
            DisplayNode::Entry(id) => ItemKind::Entry {
                meta: directory.entry(*id).is_meta(),
            },
            DisplayNode::Search(_) => ItemKind::Search,
            DisplayNode::SearchResult { .. } => ItemKind::SearchResult,
            DisplayNode::Bookmark(_) => ItemKind::Bookmark,
            DisplayNode::EntryPage(_) | DisplayNode::SearchResultPage(_) => ItemKind::Page,
            DisplayNode::Placeholder(_) => ItemKind::Placeholder,
        }
    }
}

/// A flattened representation of a tree node for rendering.
#[derive(Debug, Clone)]
pub struct FlatItem {
    pub node: DisplayNode,
    pub label: String,
    pub kind: ItemKind,
    pub depth: usize,
    pub is_expanded: bool,
    pub is_last_sibling: bool,
    pub has_children: bool,
}

/// State for the browser tree view.
///
/// Expansion is remembered by [`NodeKey`], so it survives refetches and
/// page-tree rebuilds that keep the same range.
pub struct TreeState {
    pub flat_items: Vec<FlatItem>,
    pub selected_index: usize,
    pub scroll_offset: usize,
    expanded: HashSet<NodeKey>,
}

impl TreeState {
    pub fn new() -> Self {
        Self {
            flat_items: Vec::new(),
            selected_index: 0,
            scroll_offset: 0,
            expanded: HashSet::new(),
        }
    }

    /// Rebuild the flat list by walking the provider from the connections
    /// down through every expanded node.
    ///
    /// Unloaded expanded nodes come back as placeholders and schedule a
    /// fetch. The selection follows its node when it is still visible.
    pub fn flatten(&mut self, provider: &mut ContentProvider, directory: &mut Directory) {
        let selected_key = self.selected().map(|item| item.node.key());

        let mut items = Vec::new();
        let roots = provider.elements(directory);
        let count = roots.len();
        for (i, node) in roots.into_iter().enumerate() {
            self.flatten_node(provider, directory, node, 0, i + 1 == count, &mut items);
        }
        self.flat_items = items;

        if let Some(index) = selected_key.and_then(|key| self.find_index(&key)) {
            self.selected_index = index;
        } else if !self.flat_items.is_empty() && self.selected_index >= self.flat_items.len() {
            self.selected_index = self.flat_items.len() - 1;
        }
    }

    fn flatten_node(
        &self,
        provider: &mut ContentProvider,
        directory: &mut Directory,
        node: DisplayNode,
        depth: usize,
        is_last: bool,
        items: &mut Vec<FlatItem>,
    ) {
        let has_children = provider.has_children(directory, &node);
        let is_expanded = has_children && self.expanded.contains(&node.key());
        items.push(FlatItem {
            label: node.label(directory),
            kind: ItemKind::of(&node, directory),
            node: node.clone(),
            depth,
            is_expanded,
            is_last_sibling: is_last,
            has_children,
        });

        if is_expanded {
            let children = provider.children(directory, &node);
            let count = children.len();
            for (i, child) in children.into_iter().enumerate() {
                self.flatten_node(provider, directory, child, depth + 1, i + 1 == count, items);
            }
        }
    }

    pub fn selected(&self) -> Option<&FlatItem> {
        self.flat_items.get(self.selected_index)
    }

    pub fn find_index(&self, key: &NodeKey) -> Option<usize> {
        self.flat_items.iter().position(|item| item.node.key() == *key)
    }

    /// Mark `key` expanded without touching the flat list.
    pub fn expand(&mut self, key: NodeKey) {
        self.expanded.insert(key);
    }

    /// Expand the selected node if it can have children. Returns whether
    /// the flat list needs rebuilding.
    pub fn expand_selected(&mut self) -> bool {
        let Some(item) = self.selected() else {
            return false;
        };
        if !item.has_children || item.is_expanded {
            return false;
        }
        let key = item.node.key();
        self.expanded.insert(key)
    }

    /// Collapse the selected node, or jump to its parent row.
    pub fn collapse_selected(&mut self, provider: &ContentProvider, directory: &Directory) -> bool {
        let Some(item) = self.selected() else {
            return false;
        };
        if item.is_expanded {
            let key = item.node.key();
            return self.expanded.remove(&key);
        }

        let parent = provider
            .parent(directory, &item.node)
            .and_then(|parent| self.find_index(&parent.key()));
        if let Some(index) = parent {
            self.selected_index = index;
        }
        false
    }

    /// Update the scroll offset to ensure the selected item is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected_index - visible_height + 1;
        }
    }
}

impl Default for TreeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fetch::{FetchRequest, FetchTrigger};
    use crate::browser::node::{Category, CategoryKind};
    use crate::browser::preferences::BrowserPreferences;
    use crate::model::directory::{ConnectionId, DEFAULT_COUNT_LIMIT};
    use crate::model::source::{DirectoryFixture, SourceMap};
    use tokio::sync::mpsc;

    struct Harness {
        dir: Directory,
        sources: SourceMap,
        conn: ConnectionId,
        provider: ContentProvider,
        requests: mpsc::UnboundedReceiver<FetchRequest>,
        state: TreeState,
    }

    impl Harness {
        fn new(people: usize, preferences: BrowserPreferences) -> Self {
            let mut dir = Directory::new();
            let sources = DirectoryFixture::synthetic(people)
                .install(&mut dir, DEFAULT_COUNT_LIMIT)
                .unwrap();
            let conn = dir.connection_ids().next().unwrap();
            let (tx, requests) = mpsc::unbounded_channel();
            let provider = ContentProvider::new(preferences, FetchTrigger::new(tx));
            let mut state = TreeState::new();
            state.expand(NodeKey::Connection(conn));
            state.expand(NodeKey::Category(Category {
                kind: CategoryKind::Dit,
                connection: conn,
            }));
            Self {
                dir,
                sources,
                conn,
                provider,
                requests,
                state,
            }
        }

        fn flatten(&mut self) {
            self.state.flatten(&mut self.provider, &mut self.dir);
        }

        /// Flatten and serve fetches until nothing new is requested.
        fn settle(&mut self) {
            loop {
                self.flatten();
                let mut served = false;
                while let Ok(request) = self.requests.try_recv() {
                    request.execute(&self.sources).apply(&mut self.dir).unwrap();
                    served = true;
                }
                if !served {
                    break;
                }
            }
        }

        fn labels(&self) -> Vec<String> {
            self.state.flat_items.iter().map(|i| i.label.clone()).collect()
        }

        fn select(&mut self, label: &str) {
            self.state.selected_index = self.labels().iter().position(|l| l == label).unwrap();
        }
    }

    #[test]
    fn expanded_dit_shows_placeholder_until_opened() {
        let mut h = Harness::new(3, BrowserPreferences::default());
        h.flatten();
        assert_eq!(h.labels()[2], "Opening Connection...");
        assert_eq!(h.state.flat_items[2].kind, ItemKind::Placeholder);

        h.settle();
        assert_eq!(h.labels()[2], "Root DSE");
        assert_eq!(h.state.flat_items[2].depth, 2);
    }

    #[test]
    fn flatten_walks_only_expanded_nodes() {
        let mut h = Harness::new(3, BrowserPreferences::default());
        h.settle();
        assert_eq!(h.labels(), vec!["synthetic (3 people)", "DIT", "Root DSE", "Searches", "Bookmarks"]);

        h.select("Root DSE");
        assert!(h.state.expand_selected());
        h.settle();
        assert_eq!(h.labels()[3], "dc=example");
        assert!(h.state.flat_items[3].is_last_sibling);
        assert!(h.state.flat_items[3].has_children);
    }

    #[test]
    fn leaves_cannot_expand() {
        let mut h = Harness::new(3, BrowserPreferences::default());
        h.settle();
        h.select("Bookmarks");
        h.state.expand_selected();
        h.settle();
        h.select("People");
        assert!(!h.state.expand_selected());
    }

    #[test]
    fn selection_follows_its_node_across_reflatten() {
        let mut h = Harness::new(3, BrowserPreferences::default());
        h.settle();
        h.select("Searches");
        let key = h.state.selected().unwrap().node.key();
        let before = h.state.selected_index;

        let root = h.dir.connection(h.conn).root_dse;
        h.state.expand(NodeKey::Entry(root));
        h.settle();
        assert_eq!(h.state.selected().unwrap().node.key(), key);
        assert!(h.state.selected_index > before);
    }

    #[test]
    fn collapse_then_jump_to_parent() {
        let mut h = Harness::new(3, BrowserPreferences::default());
        h.settle();
        h.select("Root DSE");
        h.state.expand_selected();
        h.settle();

        h.select("dc=example");
        assert!(!h.state.collapse_selected(&h.provider, &h.dir));
        assert_eq!(h.state.selected().unwrap().label, "Root DSE");

        assert!(h.state.collapse_selected(&h.provider, &h.dir));
        h.settle();
        assert!(!h.labels().contains(&"dc=example".to_string()));
    }

    #[test]
    fn paged_children_parent_is_the_page_row() {
        let prefs = BrowserPreferences {
            folding_size: 10,
            ..Default::default()
        };
        let mut h = Harness::new(25, prefs);
        h.settle();
        for label in ["Root DSE", "dc=example", "ou=people"] {
            h.select(label);
            h.state.expand_selected();
            h.settle();
        }
        assert!(h.labels().contains(&"[11..20]".to_string()));

        h.select("[11..20]");
        h.state.expand_selected();
        h.settle();
        h.select("uid=10");
        h.state.collapse_selected(&h.provider, &h.dir);
        assert_eq!(h.state.selected().unwrap().label, "[11..20]");
        assert_eq!(h.state.selected().unwrap().kind, ItemKind::Page);
    }

    #[test]
    fn meta_entries_are_marked() {
        let prefs = BrowserPreferences {
            show_directory_meta_entries: true,
            ..Default::default()
        };
        let mut h = Harness::new(3, prefs);
        h.settle();
        h.select("Root DSE");
        h.state.expand_selected();
        h.settle();
        let schema = h.state.flat_items.iter().find(|i| i.label == "cn=schema").unwrap();
        assert_eq!(schema.kind, ItemKind::Entry { meta: true });
        let base = h.state.flat_items.iter().find(|i| i.label == "dc=example").unwrap();
        assert_eq!(base.kind, ItemKind::Entry { meta: false });
    }

    #[test]
    fn update_scroll_keeps_selection_visible() {
        let mut state = TreeState::new();
        state.selected_index = 15;
        state.update_scroll(10);
        assert_eq!(state.scroll_offset, 6);
        state.selected_index = 2;
        state.update_scroll(10);
        assert_eq!(state.scroll_offset, 2);
        state.update_scroll(0);
        assert_eq!(state.scroll_offset, 2);
    }
}
