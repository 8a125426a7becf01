//! The lazy-tree adapter behind the browser widget.
//!
//! [`ContentProvider`] answers `children`, `parent` and `has_children` for
//! every [`DisplayNode`] variant. Unloaded data yields a placeholder and a
//! background fetch; loaded children above the folding size are grouped into
//! cached page trees; everything else is returned filtered and sorted.

use std::collections::HashMap;
use std::rc::Rc;

use crate::browser::fetch::FetchTrigger;
use crate::browser::node::{Category, CategoryKind, DisplayNode, Placeholder, PlaceholderKind, PlaceholderParent};
use crate::browser::page_cache::PageCache;
use crate::browser::pages::{PageNode, PageOwnerOrPage, PageTree};
use crate::browser::preferences::{BrowserPreferences, ListOrder};
use crate::browser::sorter::Sorter;
use crate::model::directory::{ConnectionId, ConnectionState, Directory, EntryId, SearchId};

/// Browser session state: preferences, page caches and category arrays.
/// Lives on the UI thread only.
pub struct ContentProvider {
    preferences: BrowserPreferences,
    entry_pages: PageCache<EntryId>,
    search_pages: PageCache<SearchId>,
    categories: HashMap<ConnectionId, [Category; 3]>,
    fetch: FetchTrigger,
}

impl ContentProvider {
    pub fn new(preferences: BrowserPreferences, fetch: FetchTrigger) -> Self {
        Self {
            preferences,
            entry_pages: PageCache::new(),
            search_pages: PageCache::new(),
            categories: HashMap::new(),
            fetch,
        }
    }

    pub fn preferences(&self) -> &BrowserPreferences {
        &self.preferences
    }

    /// Replace the preferences. Page trees depend on the folding size and
    /// the sort, so all cached pages are dropped.
    pub fn set_preferences(&mut self, preferences: BrowserPreferences) {
        self.preferences = preferences;
        self.entry_pages.dispose();
        self.search_pages.dispose();
    }

    /// Clear every cache owned by the session.
    pub fn dispose(&mut self) {
        self.entry_pages.dispose();
        self.search_pages.dispose();
        self.categories.clear();
    }

    /// Top-level rows: one per connection.
    pub fn elements(&self, directory: &Directory) -> Vec<DisplayNode> {
        directory.connection_ids().map(DisplayNode::Connection).collect()
    }

    pub fn children(&mut self, directory: &mut Directory, node: &DisplayNode) -> Vec<DisplayNode> {
        match node {
            DisplayNode::Connection(connection) => self.category_children(*connection),
            DisplayNode::Category(category) => self.children_of_category(directory, *category),
            DisplayNode::Entry(entry) => self.entry_children(directory, *entry),
            DisplayNode::EntryPage(page) => match page.subpages() {
                Some(subpages) => subpages.into_iter().map(DisplayNode::EntryPage).collect(),
                None => {
                    let nodes = self.sorted_entry_children(directory, page.owner());
                    slice_clamped(nodes, page.first(), page.last())
                }
            },
            DisplayNode::Search(search) => self.search_children(directory, *search),
            DisplayNode::SearchResultPage(page) => match page.subpages() {
                Some(subpages) => subpages.into_iter().map(DisplayNode::SearchResultPage).collect(),
                None => {
                    let nodes = self.sorted_search_results(directory, page.owner());
                    slice_clamped(nodes, page.first(), page.last())
                }
            },
            DisplayNode::SearchResult { .. } | DisplayNode::Bookmark(_) | DisplayNode::Placeholder(_) => Vec::new(),
        }
    }

    pub fn parent(&self, directory: &Directory, node: &DisplayNode) -> Option<DisplayNode> {
        let parent = match node {
            DisplayNode::Connection(_) => return None,
            DisplayNode::Category(category) => DisplayNode::Connection(category.connection),
            DisplayNode::Entry(entry) => self.entry_parent(directory, *entry),
            DisplayNode::Search(search) => {
                category_node(CategoryKind::Searches, directory.search(*search).connection)
            }
            DisplayNode::Bookmark(bookmark) => {
                category_node(CategoryKind::Bookmarks, directory.bookmark(*bookmark).connection)
            }
            DisplayNode::SearchResult { search, entry } => self.search_result_parent(directory, *search, *entry),
            DisplayNode::EntryPage(page) => match page.parent() {
                PageOwnerOrPage::Owner(entry) => DisplayNode::Entry(entry),
                PageOwnerOrPage::Page(parent) => DisplayNode::EntryPage(parent),
            },
            DisplayNode::SearchResultPage(page) => match page.parent() {
                PageOwnerOrPage::Owner(search) => DisplayNode::Search(search),
                PageOwnerOrPage::Page(parent) => DisplayNode::SearchResultPage(parent),
            },
            DisplayNode::Placeholder(placeholder) => match placeholder.parent {
                PlaceholderParent::Dit(connection) => category_node(CategoryKind::Dit, connection),
                PlaceholderParent::Entry(entry) => DisplayNode::Entry(entry),
                PlaceholderParent::Search(search) => DisplayNode::Search(search),
            },
        };
        Some(parent)
    }

    pub fn has_children(&self, directory: &Directory, node: &DisplayNode) -> bool {
        match node {
            DisplayNode::Entry(id) => {
                let entry = directory.entry(*id);
                entry.has_children()
                    || (self.preferences.show_alias_and_referral_objects && (entry.is_alias() || entry.is_referral()))
            }
            DisplayNode::Connection(_)
            | DisplayNode::Category(_)
            | DisplayNode::Search(_)
            | DisplayNode::EntryPage(_)
            | DisplayNode::SearchResultPage(_) => true,
            DisplayNode::SearchResult { .. } | DisplayNode::Bookmark(_) | DisplayNode::Placeholder(_) => false,
        }
    }

    // ── Per-variant children ────────────────────────────────────────────────

    fn category_children(&mut self, connection: ConnectionId) -> Vec<DisplayNode> {
        let categories = *self
            .categories
            .entry(connection)
            .or_insert_with(|| CategoryKind::ALL.map(|kind| Category { kind, connection }));
        let prefs = &self.preferences;
        categories
            .into_iter()
            .filter(|category| match category.kind {
                CategoryKind::Dit => prefs.show_dit,
                CategoryKind::Searches => prefs.show_searches,
                CategoryKind::Bookmarks => prefs.show_bookmarks,
            })
            .map(DisplayNode::Category)
            .collect()
    }

    fn children_of_category(&mut self, directory: &mut Directory, category: Category) -> Vec<DisplayNode> {
        let connection = category.connection;
        match category.kind {
            CategoryKind::Dit => {
                if directory.connection(connection).state != ConnectionState::Open {
                    self.fetch.ensure_open(directory, connection);
                    return vec![placeholder(PlaceholderKind::OpeningConnection, PlaceholderParent::Dit(connection))];
                }
                vec![DisplayNode::Entry(directory.connection(connection).root_dse)]
            }
            CategoryKind::Searches => {
                let mut nodes: Vec<DisplayNode> = directory
                    .connection(connection)
                    .searches
                    .iter()
                    .map(|&id| DisplayNode::Search(id))
                    .collect();
                if self.preferences.searches_order != ListOrder::None {
                    Sorter::new(&self.preferences, directory).sort_named(&mut nodes);
                }
                nodes
            }
            CategoryKind::Bookmarks => {
                let mut nodes: Vec<DisplayNode> = directory
                    .connection(connection)
                    .bookmarks
                    .iter()
                    .map(|&id| DisplayNode::Bookmark(id))
                    .collect();
                if self.preferences.bookmarks_order != ListOrder::None {
                    Sorter::new(&self.preferences, directory).sort_named(&mut nodes);
                }
                nodes
            }
        }
    }

    fn entry_children(&mut self, directory: &mut Directory, entry: EntryId) -> Vec<DisplayNode> {
        if !directory.entry(entry).is_children_initialized() {
            self.fetch.ensure_children(directory, entry);
            return vec![placeholder(PlaceholderKind::FetchingEntries, PlaceholderParent::Entry(entry))];
        }

        let count = self.visible_children(directory, entry).len();
        if !self.is_paged(count) {
            self.entry_pages.remove(&entry);
            return self.sorted_entry_children(directory, entry);
        }
        let tree = self
            .entry_pages
            .get_pages(entry, count, self.preferences.folding_size);
        PageNode::top_level(&tree)
            .into_iter()
            .map(DisplayNode::EntryPage)
            .collect()
    }

    fn search_children(&mut self, directory: &mut Directory, search: SearchId) -> Vec<DisplayNode> {
        let Some(results) = directory.search(search).results() else {
            self.fetch.ensure_search(directory, search);
            return vec![placeholder(PlaceholderKind::PerformingSearch, PlaceholderParent::Search(search))];
        };

        let count = results.len();
        if count == 0 {
            self.search_pages.remove(&search);
            return vec![placeholder(PlaceholderKind::NoResults, PlaceholderParent::Search(search))];
        }
        if !self.is_paged(count) {
            self.search_pages.remove(&search);
            return self.sorted_search_results(directory, search);
        }
        let tree = self
            .search_pages
            .get_pages(search, count, self.preferences.folding_size);
        PageNode::top_level(&tree)
            .into_iter()
            .map(DisplayNode::SearchResultPage)
            .collect()
    }

    // ── Parents ─────────────────────────────────────────────────────────────

    fn entry_parent(&self, directory: &Directory, entry: EntryId) -> DisplayNode {
        let e = directory.entry(entry);
        let Some(parent) = e.parent else {
            return category_node(CategoryKind::Dit, e.connection);
        };
        if let Some(tree) = self.entry_pages.get(&parent) {
            let nodes = self.sorted_entry_children(directory, parent);
            if let Some(page) = self.page_slicing(tree, &nodes, entry) {
                return DisplayNode::EntryPage(page);
            }
        }
        DisplayNode::Entry(parent)
    }

    fn search_result_parent(&self, directory: &Directory, search: SearchId, entry: EntryId) -> DisplayNode {
        if let Some(tree) = self.search_pages.get(&search) {
            let nodes = self.sorted_search_results(directory, search);
            if let Some(page) = self.page_slicing(tree, &nodes, entry) {
                return DisplayNode::SearchResultPage(page);
            }
        }
        DisplayNode::Search(search)
    }

    /// The leaf page of `tree` whose slice of `nodes` holds `entry`, if the
    /// tree is current for the live count.
    fn page_slicing<O: Copy>(&self, tree: &Rc<PageTree<O>>, nodes: &[DisplayNode], entry: EntryId) -> Option<PageNode<O>> {
        if !self.is_paged(nodes.len()) || tree.last_index() != nodes.len().checked_sub(1) {
            return None;
        }
        let index = nodes.iter().position(|node| node.entry_id() == Some(entry))?;
        let leaf = tree.leaf_containing(index)?;
        Some(PageNode::new(Rc::clone(tree), leaf))
    }

    // ── Live, filtered, sorted data ─────────────────────────────────────────

    fn is_paged(&self, count: usize) -> bool {
        self.preferences.is_folding_active() && count > self.preferences.folding_size
    }

    /// Loaded children with directory meta entries hidden per preference.
    fn visible_children(&self, directory: &Directory, entry: EntryId) -> Vec<EntryId> {
        let Some(children) = directory.entry(entry).children() else {
            return Vec::new();
        };
        children
            .iter()
            .copied()
            .filter(|&child| self.preferences.show_directory_meta_entries || !directory.entry(child).is_directory_meta())
            .collect()
    }

    fn sorted_entry_children(&self, directory: &Directory, entry: EntryId) -> Vec<DisplayNode> {
        let mut nodes: Vec<DisplayNode> = self
            .visible_children(directory, entry)
            .into_iter()
            .map(DisplayNode::Entry)
            .collect();
        Sorter::new(&self.preferences, directory).sort(&mut nodes);
        nodes
    }

    fn sorted_search_results(&self, directory: &Directory, search: SearchId) -> Vec<DisplayNode> {
        let mut nodes: Vec<DisplayNode> = directory
            .search(search)
            .results()
            .unwrap_or_default()
            .iter()
            .map(|&entry| DisplayNode::SearchResult { search, entry })
            .collect();
        Sorter::new(&self.preferences, directory).sort(&mut nodes);
        nodes
    }
}

fn placeholder(kind: PlaceholderKind, parent: PlaceholderParent) -> DisplayNode {
    DisplayNode::Placeholder(Placeholder { kind, parent })
}

fn category_node(kind: CategoryKind, connection: ConnectionId) -> DisplayNode {
    DisplayNode::Category(Category { kind, connection })
}

/// `nodes[first..=last]`, truncated to what the live list still holds.
fn slice_clamped(nodes: Vec<DisplayNode>, first: usize, last: usize) -> Vec<DisplayNode> {
    if last >= nodes.len() {
        tracing::debug!(first, last, live = nodes.len(), "page range exceeds live children, clamping");
    }
    nodes.into_iter().skip(first).take(last + 1 - first).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fetch::FetchRequest;
    use crate::browser::preferences::{SortBy, SortOrder};
    use crate::model::directory::DEFAULT_COUNT_LIMIT;
    use crate::model::dn::Dn;
    use crate::model::source::{DirectoryFixture, SourceMap};
    use tokio::sync::mpsc;

    const PEOPLE: &str = "ou=people,dc=example,dc=com";

    struct Session {
        dir: Directory,
        sources: SourceMap,
        conn: ConnectionId,
        provider: ContentProvider,
        requests: mpsc::UnboundedReceiver<FetchRequest>,
    }

    impl Session {
        fn new(people: usize, preferences: BrowserPreferences) -> Self {
            let mut dir = Directory::new();
            let sources = DirectoryFixture::synthetic(people)
                .install(&mut dir, DEFAULT_COUNT_LIMIT)
                .unwrap();
            let conn = dir.connection_ids().next().unwrap();
            let (tx, requests) = mpsc::unbounded_channel();
            let provider = ContentProvider::new(preferences, FetchTrigger::new(tx));
            Self {
                dir,
                sources,
                conn,
                provider,
                requests,
            }
        }

        /// Load the children of the (already known) entry at `dn`.
        fn materialize(&mut self, dn: &str) -> EntryId {
            let dn = Dn::parse(dn).unwrap();
            let id = self.dir.find_entry(self.conn, &dn).unwrap();
            let (records, has_more) = self.sources[&self.conn].children(&dn, DEFAULT_COUNT_LIMIT).unwrap();
            self.dir.complete_children(id, records, has_more);
            id
        }

        /// Materialize the path down to `ou=people` and return its id.
        fn people(&mut self) -> EntryId {
            self.materialize("");
            self.materialize("dc=example,dc=com");
            self.materialize(PEOPLE)
        }

        fn children(&mut self, node: &DisplayNode) -> Vec<DisplayNode> {
            self.provider.children(&mut self.dir, node)
        }

    }

    fn labels(nodes: &[DisplayNode], dir: &Directory) -> Vec<String> {
        nodes.iter().map(|n| n.label(dir)).collect()
    }

    fn folding(size: usize) -> BrowserPreferences {
        BrowserPreferences {
            folding_size: size,
            ..Default::default()
        }
    }

    fn page(node: &DisplayNode) -> &PageNode<EntryId> {
        match node {
            DisplayNode::EntryPage(page) => page,
            other => panic!("expected an entry page, got {other:?}"),
        }
    }

    #[test]
    fn connection_lists_enabled_categories() {
        let mut s = Session::new(3, BrowserPreferences::default());
        let conn = DisplayNode::Connection(s.conn);
        assert_eq!(labels(&s.children(&conn), &s.dir), vec!["DIT", "Searches", "Bookmarks"]);

        s.provider.set_preferences(BrowserPreferences {
            show_searches: false,
            ..Default::default()
        });
        assert_eq!(labels(&s.children(&conn), &s.dir), vec!["DIT", "Bookmarks"]);
        assert_eq!(s.provider.elements(&s.dir), vec![conn]);
    }

    #[test]
    fn dit_opens_connection_before_showing_root() {
        let mut s = Session::new(3, BrowserPreferences::default());
        let dit = category_node(CategoryKind::Dit, s.conn);
        let children = s.children(&dit);
        assert_eq!(labels(&children, &s.dir), vec!["Opening Connection..."]);
        assert!(matches!(s.requests.try_recv(), Ok(FetchRequest::OpenConnection { .. })));

        s.children(&dit);
        assert!(s.requests.try_recv().is_err(), "open requested twice");

        s.dir.complete_open(s.conn);
        let root = s.dir.connection(s.conn).root_dse;
        assert_eq!(s.children(&dit), vec![DisplayNode::Entry(root)]);
    }

    #[test]
    fn unloaded_entry_yields_placeholder_and_single_fetch() {
        let mut s = Session::new(3, BrowserPreferences::default());
        let root = DisplayNode::Entry(s.dir.connection(s.conn).root_dse);
        let children = s.children(&root);
        assert_eq!(labels(&children, &s.dir), vec!["Fetching Entries..."]);
        assert_eq!(s.provider.parent(&s.dir, &children[0]), Some(root.clone()));
        assert!(matches!(s.requests.try_recv(), Ok(FetchRequest::InitializeChildren { .. })));

        s.children(&root);
        assert!(s.requests.try_recv().is_err());
    }

    #[test]
    fn directory_meta_entries_hidden_by_default() {
        let mut s = Session::new(3, BrowserPreferences::default());
        let root = DisplayNode::Entry(s.materialize(""));
        assert_eq!(labels(&s.children(&root), &s.dir), vec!["dc=example"]);

        s.provider.set_preferences(BrowserPreferences {
            show_directory_meta_entries: true,
            ..Default::default()
        });
        assert_eq!(labels(&s.children(&root), &s.dir), vec!["dc=example", "cn=schema"]);
    }

    #[test]
    fn small_child_lists_are_flat_and_sorted() {
        let mut s = Session::new(5, folding(10));
        let people = s.people();
        let children = s.children(&DisplayNode::Entry(people));
        assert_eq!(labels(&children, &s.dir), vec!["uid=0", "uid=1", "uid=2", "uid=3", "uid=4"]);
        assert!(s.provider.entry_pages.get(&people).is_none());

        let base = s.dir.find_entry(s.conn, &Dn::parse("dc=example,dc=com").unwrap()).unwrap();
        let names = labels(&s.children(&DisplayNode::Entry(base)), &s.dir);
        // Subentry first, containers next, meta entries last.
        assert_eq!(names, vec!["cn=policy", "ou=groups", "ou=people", "cn=everyone", "ou=remote"]);
    }

    #[test]
    fn ninety_seven_children_fold_into_ten_leaf_pages() {
        let mut s = Session::new(97, folding(10));
        let people = s.people();
        let pages = s.children(&DisplayNode::Entry(people));
        assert_eq!(pages.len(), 10);
        for (i, node) in pages.iter().enumerate() {
            let page = page(node);
            assert_eq!(page.first(), i * 10);
            assert_eq!(page.last(), (i * 10 + 9).min(96));
            assert!(page.is_leaf());
            let slice = s.children(node);
            assert_eq!(slice.len(), page.last() - page.first() + 1);
        }

        let first = s.children(&pages[0]);
        let expected: Vec<String> = (0..10).map(|i| format!("uid={i}")).collect();
        assert_eq!(labels(&first, &s.dir), expected, "numeric RDN-value order");
        let last = s.children(&pages[9]);
        assert_eq!(labels(&last, &s.dir).first().map(String::as_str), Some("uid=90"));
        assert_eq!(last.len(), 7);
    }

    #[test]
    fn leaf_pages_follow_the_current_sort() {
        let mut s = Session::new(25, folding(10));
        let people = s.people();
        let pages = s.children(&DisplayNode::Entry(people));
        s.provider.preferences.sort_order = SortOrder::Descending;
        let first = s.children(&pages[0]);
        assert_eq!(labels(&first, &s.dir)[0], "uid=24");
    }

    #[test]
    fn page_tree_is_cached_until_count_changes() {
        let mut s = Session::new(97, folding(10));
        let people = s.people();
        let before = s.children(&DisplayNode::Entry(people));
        let again = s.children(&DisplayNode::Entry(people));
        assert!(page(&before[0]).same_page(page(&again[0])));

        let dn = Dn::parse(PEOPLE).unwrap();
        let (records, _) = s.sources[&s.conn].children(&dn, 0).unwrap();
        s.dir.complete_children(people, records.into_iter().take(42).collect(), false);

        let after = s.children(&DisplayNode::Entry(people));
        assert!(!page(&before[0]).same_page(page(&after[0])));
        assert_eq!(after.len(), 5);
        assert_eq!(page(after.last().unwrap()).last(), 41);
    }

    #[test]
    fn stale_leaf_page_clamps_to_live_children() {
        let mut s = Session::new(97, folding(10));
        let people = s.people();
        let pages = s.children(&DisplayNode::Entry(people));

        let dn = Dn::parse(PEOPLE).unwrap();
        let (records, _) = s.sources[&s.conn].children(&dn, 0).unwrap();
        s.dir.complete_children(people, records.into_iter().take(45).collect(), false);

        assert!(s.children(&pages[9]).is_empty());
        assert_eq!(s.children(&pages[4]).len(), 5);
        assert_eq!(s.children(&pages[3]).len(), 10);
    }

    #[test]
    fn large_lists_nest_pages() {
        let mut s = Session::new(1000, folding(10));
        let people = s.people();
        let top = s.children(&DisplayNode::Entry(people));
        assert_eq!(top.len(), 10);
        assert!(!page(&top[0]).is_leaf());

        let nested = s.children(&top[3]);
        assert_eq!(nested.len(), 10);
        assert_eq!((page(&nested[0]).first(), page(&nested[0]).last()), (300, 309));
        assert_eq!(s.provider.parent(&s.dir, &nested[0]), Some(top[3].clone()));
        assert_eq!(s.provider.parent(&s.dir, &top[3]), Some(DisplayNode::Entry(people)));

        let leaf = s.children(&nested[0]);
        assert_eq!(labels(&leaf, &s.dir)[0], "uid=300");
    }

    #[test]
    fn entry_parent_is_the_page_that_slices_it() {
        let mut s = Session::new(97, folding(10));
        let people = s.people();
        let pages = s.children(&DisplayNode::Entry(people));
        let slice = s.children(&pages[4]);
        assert_eq!(s.provider.parent(&s.dir, &slice[3]), Some(pages[4].clone()));

        s.provider.set_preferences(BrowserPreferences {
            use_folding: false,
            ..Default::default()
        });
        assert_eq!(s.provider.parent(&s.dir, &slice[3]), Some(DisplayNode::Entry(people)));
    }

    #[test]
    fn root_dse_parent_is_dit_category() {
        let s = Session::new(1, BrowserPreferences::default());
        let root = DisplayNode::Entry(s.dir.connection(s.conn).root_dse);
        assert_eq!(s.provider.parent(&s.dir, &root), Some(category_node(CategoryKind::Dit, s.conn)));
        let dit = category_node(CategoryKind::Dit, s.conn);
        assert_eq!(s.provider.parent(&s.dir, &dit), Some(DisplayNode::Connection(s.conn)));
        assert_eq!(s.provider.parent(&s.dir, &DisplayNode::Connection(s.conn)), None);
    }

    #[test]
    fn searches_execute_lazily() {
        let mut s = Session::new(30, folding(10));
        let searches = s.children(&category_node(CategoryKind::Searches, s.conn));
        assert_eq!(labels(&searches, &s.dir), vec!["All people", "People matching 7"]);
        assert_eq!(
            s.provider.parent(&s.dir, &searches[0]),
            Some(category_node(CategoryKind::Searches, s.conn))
        );

        let children = s.children(&searches[0]);
        assert_eq!(labels(&children, &s.dir), vec!["Performing Search..."]);
        assert!(matches!(s.requests.try_recv(), Ok(FetchRequest::ExecuteSearch { .. })));

        let DisplayNode::Search(search) = searches[0] else {
            panic!("expected a search")
        };
        s.dir.complete_search(search, Vec::new());
        assert_eq!(labels(&s.children(&searches[0]), &s.dir), vec!["No Results"]);
    }

    #[test]
    fn search_results_fold_like_entries() {
        let mut s = Session::new(30, folding(10));
        let DisplayNode::Search(search) = s.children(&category_node(CategoryKind::Searches, s.conn))[0] else {
            panic!("expected a search")
        };
        let dn = Dn::parse(PEOPLE).unwrap();
        let records = s.sources[&s.conn]
            .search(&dn, crate::model::directory::SearchScope::One, None, 0)
            .unwrap();
        s.dir.complete_search(search, records);

        let pages = s.children(&DisplayNode::Search(search));
        assert_eq!(pages.len(), 3);
        assert!(matches!(pages[0], DisplayNode::SearchResultPage(_)));
        let results = s.children(&pages[1]);
        assert_eq!(results.len(), 10);
        assert!(!s.provider.has_children(&s.dir, &results[0]));
        assert_eq!(s.provider.parent(&s.dir, &results[0]), Some(pages[1].clone()));
        assert_eq!(s.provider.parent(&s.dir, &pages[1]), Some(DisplayNode::Search(search)));
    }

    #[test]
    fn stale_search_result_page_clamps_and_small_results_are_flat() {
        let mut s = Session::new(30, folding(10));
        let DisplayNode::Search(search) = s.children(&category_node(CategoryKind::Searches, s.conn))[0] else {
            panic!("expected a search")
        };
        let dn = Dn::parse(PEOPLE).unwrap();
        let records = s.sources[&s.conn]
            .search(&dn, crate::model::directory::SearchScope::One, None, 0)
            .unwrap();
        s.dir.complete_search(search, records.clone());
        let pages = s.children(&DisplayNode::Search(search));
        assert_eq!(pages.len(), 3);

        s.dir.complete_search(search, records.iter().take(25).cloned().collect());
        assert_eq!(s.children(&pages[2]).len(), 5);
        assert_eq!(s.children(&pages[1]).len(), 10);

        s.dir.complete_search(search, records.into_iter().take(5).collect());
        let results = s.children(&DisplayNode::Search(search));
        assert_eq!(results.len(), 5);
        assert!(matches!(results[0], DisplayNode::SearchResult { .. }));
        assert_eq!(s.provider.parent(&s.dir, &results[0]), Some(DisplayNode::Search(search)));
    }

    #[test]
    fn searches_and_bookmarks_keep_manager_order_unless_configured() {
        let mut s = Session::new(1, BrowserPreferences::default());
        s.dir.add_search(s.conn, "Aardvarks", Dn::root(), Default::default(), None);
        let category = category_node(CategoryKind::Searches, s.conn);
        assert_eq!(labels(&s.children(&category), &s.dir)[0], "All people");

        s.provider.set_preferences(BrowserPreferences {
            searches_order: ListOrder::Ascending,
            ..Default::default()
        });
        assert_eq!(labels(&s.children(&category), &s.dir)[0], "Aardvarks");

        let bookmarks = s.children(&category_node(CategoryKind::Bookmarks, s.conn));
        assert_eq!(labels(&bookmarks, &s.dir), vec!["People"]);
        assert!(!s.provider.has_children(&s.dir, &bookmarks[0]));
    }

    #[test]
    fn has_children_follows_aliases_when_enabled() {
        let mut s = Session::new(1, BrowserPreferences::default());
        s.materialize("");
        s.materialize("dc=example,dc=com");
        let alias = s.dir.find_entry(s.conn, &Dn::parse("cn=everyone,dc=example,dc=com").unwrap()).unwrap();
        let alias = DisplayNode::Entry(alias);
        assert!(s.provider.has_children(&s.dir, &alias));

        s.provider.set_preferences(BrowserPreferences {
            show_alias_and_referral_objects: false,
            ..Default::default()
        });
        assert!(!s.provider.has_children(&s.dir, &alias));
        assert!(s.provider.has_children(&s.dir, &category_node(CategoryKind::Dit, s.conn)));
    }

    #[test]
    fn set_preferences_and_dispose_clear_caches() {
        let mut s = Session::new(97, folding(10));
        let people = s.people();
        s.children(&DisplayNode::Entry(people));
        s.children(&DisplayNode::Connection(s.conn));
        assert_eq!(s.provider.entry_pages.len(), 1);

        s.provider.set_preferences(BrowserPreferences {
            sort_by: SortBy::Rdn,
            ..folding(10)
        });
        assert!(s.provider.entry_pages.is_empty());

        s.children(&DisplayNode::Entry(people));
        s.provider.dispose();
        assert!(s.provider.entry_pages.is_empty());
        assert!(s.provider.categories.is_empty());
    }
}
