//! The closed set of node kinds shown in the browser tree.

use crate::browser::pages::PageNode;
use crate::model::directory::{BookmarkId, ConnectionId, Directory, EntryId, SearchId};

/// The three fixed top-level groups of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    Dit,
    Searches,
    Bookmarks,
}

impl CategoryKind {
    pub const ALL: [CategoryKind; 3] = [CategoryKind::Dit, CategoryKind::Searches, CategoryKind::Bookmarks];

    pub fn title(&self) -> &'static str {
        match self {
            CategoryKind::Dit => "DIT",
            CategoryKind::Searches => "Searches",
            CategoryKind::Bookmarks => "Bookmarks",
        }
    }
}

/// A category node, owned by a connection and immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Category {
    pub kind: CategoryKind,
    pub connection: ConnectionId,
}

/// Why a placeholder is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    OpeningConnection,
    FetchingEntries,
    PerformingSearch,
    NoResults,
}

impl PlaceholderKind {
    pub fn text(&self) -> &'static str {
        match self {
            PlaceholderKind::OpeningConnection => "Opening Connection...",
            PlaceholderKind::FetchingEntries => "Fetching Entries...",
            PlaceholderKind::PerformingSearch => "Performing Search...",
            PlaceholderKind::NoResults => "No Results",
        }
    }
}

/// The node a placeholder stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderParent {
    Dit(ConnectionId),
    Entry(EntryId),
    Search(SearchId),
}

/// A transient text node shown while data is not materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    pub parent: PlaceholderParent,
}

/// Anything that can appear as a row in the browser tree.
#[derive(Debug, Clone)]
pub enum DisplayNode {
    Connection(ConnectionId),
    Category(Category),
    Entry(EntryId),
    Search(SearchId),
    SearchResult { search: SearchId, entry: EntryId },
    Bookmark(BookmarkId),
    EntryPage(PageNode<EntryId>),
    SearchResultPage(PageNode<SearchId>),
    Placeholder(Placeholder),
}

/// Hashable identity of a [`DisplayNode`], stable across page-tree rebuilds
/// as long as the page range is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Connection(ConnectionId),
    Category(Category),
    Entry(EntryId),
    Search(SearchId),
    SearchResult(SearchId, EntryId),
    Bookmark(BookmarkId),
    EntryPage {
        owner: EntryId,
        first: usize,
        last: usize,
        depth: usize,
    },
    SearchResultPage {
        owner: SearchId,
        first: usize,
        last: usize,
        depth: usize,
    },
    Placeholder(Placeholder),
}

impl DisplayNode {
    pub fn key(&self) -> NodeKey {
        match self {
            DisplayNode::Connection(id) => NodeKey::Connection(*id),
            DisplayNode::Category(category) => NodeKey::Category(*category),
            DisplayNode::Entry(id) => NodeKey::Entry(*id),
            DisplayNode::Search(id) => NodeKey::Search(*id),
            DisplayNode::SearchResult { search, entry } => NodeKey::SearchResult(*search, *entry),
            DisplayNode::Bookmark(id) => NodeKey::Bookmark(*id),
            DisplayNode::EntryPage(page) => NodeKey::EntryPage {
                owner: page.owner(),
                first: page.first(),
                last: page.last(),
                depth: page.depth(),
            },
            DisplayNode::SearchResultPage(page) => NodeKey::SearchResultPage {
                owner: page.owner(),
                first: page.first(),
                last: page.last(),
                depth: page.depth(),
            },
            DisplayNode::Placeholder(placeholder) => NodeKey::Placeholder(*placeholder),
        }
    }

    /// The directory entry behind an entry or search-result node.
    pub fn entry_id(&self) -> Option<EntryId> {
        match self {
            DisplayNode::Entry(id) => Some(*id),
            DisplayNode::SearchResult { entry, .. } => Some(*entry),
            _ => None,
        }
    }

    /// Text shown for the node in the tree.
    pub fn label(&self, directory: &Directory) -> String {
        match self {
            DisplayNode::Connection(id) => directory.connection(*id).name.clone(),
            DisplayNode::Category(category) => category.kind.title().to_string(),
            DisplayNode::Entry(id) => directory.entry(*id).label(),
            DisplayNode::Search(id) => directory.search(*id).name.clone(),
            DisplayNode::SearchResult { entry, .. } => directory.entry(*entry).dn.to_string(),
            DisplayNode::Bookmark(id) => directory.bookmark(*id).name.clone(),
            DisplayNode::EntryPage(page) => page.to_string(),
            DisplayNode::SearchResultPage(page) => page.to_string(),
            DisplayNode::Placeholder(placeholder) => placeholder.kind.text().to_string(),
        }
    }
}

impl PartialEq for DisplayNode {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for DisplayNode {}
