//! In-memory model of the browsed directories.
//!
//! The [`Directory`] is an arena: connections, entries, searches and bookmarks
//! live in flat vectors and refer to each other through copyable ids. Parent
//! links are plain ids and never own anything; ownership flows from the arena
//! down. Only the UI thread mutates it, after consuming a fetch outcome.

use std::collections::HashMap;

use crate::model::dn::{Dn, Rdn};
use crate::model::source::EntryRecord;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub usize);
    };
}

arena_id!(
    /// Handle of a [`Connection`].
    ConnectionId
);
arena_id!(
    /// Handle of an [`Entry`].
    EntryId
);
arena_id!(
    /// Handle of a [`Search`].
    SearchId
);
arena_id!(
    /// Handle of a [`Bookmark`].
    BookmarkId
);

/// Default maximum number of children fetched per directory call.
pub const DEFAULT_COUNT_LIMIT: usize = 1000;

/// Whether a connection has been opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Opening,
    Open,
}

/// Materialization state of an entry's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildrenState {
    /// Unknown, must be fetched.
    Uninitialized,
    /// A fetch has been scheduled and has not completed yet.
    Initializing,
    /// Children are loaded into memory.
    Initialized,
}

/// Execution state of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    NotExecuted,
    Executing,
    Done,
}

/// Scope of a stored search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// Only the immediate children of the base.
    One,
    /// The whole subtree below the base.
    #[default]
    Sub,
}

/// Classification flags of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryKind {
    pub root_dse: bool,
    /// Directory metadata such as the subschema subentry.
    pub directory_meta: bool,
    pub alias: bool,
    pub referral: bool,
    /// Operational/hidden subentry class.
    pub subentry: bool,
}

/// A connection to one directory server.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub name: String,
    pub state: ConnectionState,
    pub root_dse: EntryId,
    pub searches: Vec<SearchId>,
    pub bookmarks: Vec<BookmarkId>,
    /// Maximum number of children fetched per directory call.
    pub count_limit: usize,
}

/// One directory object.
#[derive(Debug, Clone)]
pub struct Entry {
    pub connection: ConnectionId,
    pub dn: Dn,
    pub parent: Option<EntryId>,
    pub kind: EntryKind,
    children: Vec<EntryId>,
    children_state: ChildrenState,
    /// True when the directory enforced a result-size cap.
    has_more_children: bool,
    /// What the directory reported before the children were fetched.
    has_children_hint: bool,
}

impl Entry {
    pub fn rdn(&self) -> Option<&Rdn> {
        self.dn.rdn()
    }

    pub fn children_state(&self) -> ChildrenState {
        self.children_state
    }

    pub fn is_children_initialized(&self) -> bool {
        self.children_state == ChildrenState::Initialized
    }

    /// Loaded children, `None` until materialized.
    pub fn children(&self) -> Option<&[EntryId]> {
        self.is_children_initialized().then_some(self.children.as_slice())
    }

    pub fn children_count(&self) -> usize {
        if self.is_children_initialized() {
            self.children.len()
        } else {
            0
        }
    }

    pub fn has_more_children(&self) -> bool {
        self.has_more_children
    }

    pub fn has_children(&self) -> bool {
        if self.is_children_initialized() {
            !self.children.is_empty() || self.has_more_children
        } else {
            self.has_children_hint
        }
    }

    pub fn is_alias(&self) -> bool {
        self.kind.alias
    }

    pub fn is_referral(&self) -> bool {
        self.kind.referral
    }

    pub fn is_subentry(&self) -> bool {
        self.kind.subentry
    }

    pub fn is_directory_meta(&self) -> bool {
        self.kind.directory_meta
    }

    /// Root DSE, directory metadata, alias or referral.
    pub fn is_meta(&self) -> bool {
        self.kind.root_dse || self.kind.directory_meta || self.kind.alias || self.kind.referral
    }

    /// Display label: the RDN, or the fixed Root DSE title.
    pub fn label(&self) -> String {
        match self.rdn() {
            Some(rdn) => rdn.name().to_string(),
            None => "Root DSE".to_string(),
        }
    }
}

/// A stored query whose results are replaced wholesale on every execution.
#[derive(Debug, Clone)]
pub struct Search {
    pub connection: ConnectionId,
    pub name: String,
    pub base: Dn,
    pub scope: SearchScope,
    /// Case-insensitive substring the RDN value must contain.
    pub rdn_filter: Option<String>,
    results: Option<Vec<EntryId>>,
    state: SearchState,
}

impl Search {
    /// Results of the last execution, `None` if never executed.
    pub fn results(&self) -> Option<&[EntryId]> {
        self.results.as_deref()
    }

    pub fn state(&self) -> SearchState {
        self.state
    }
}

/// A named shortcut to an entry.
#[derive(Debug, Clone)]
pub struct Bookmark {
    pub connection: ConnectionId,
    pub name: String,
    pub dn: Dn,
}

/// Arena owning everything the browser displays.
#[derive(Debug, Default)]
pub struct Directory {
    connections: Vec<Connection>,
    entries: Vec<Entry>,
    searches: Vec<Search>,
    bookmarks: Vec<Bookmark>,
    /// (connection, lowercased DN) -> entry, so refetches keep entry identity.
    index: HashMap<(ConnectionId, String), EntryId>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection together with its (unmaterialized) Root DSE.
    pub fn add_connection(&mut self, name: &str, count_limit: usize) -> ConnectionId {
        let id = ConnectionId(self.connections.len());
        let root_dse = self.insert_entry(
            id,
            Dn::root(),
            EntryKind {
                root_dse: true,
                ..Default::default()
            },
            true,
            None,
        );
        self.connections.push(Connection {
            id,
            name: name.to_string(),
            state: ConnectionState::Closed,
            root_dse,
            searches: Vec::new(),
            bookmarks: Vec::new(),
            count_limit,
        });
        id
    }

    pub fn add_search(
        &mut self,
        connection: ConnectionId,
        name: &str,
        base: Dn,
        scope: SearchScope,
        rdn_filter: Option<String>,
    ) -> SearchId {
        let id = SearchId(self.searches.len());
        self.searches.push(Search {
            connection,
            name: name.to_string(),
            base,
            scope,
            rdn_filter,
            results: None,
            state: SearchState::NotExecuted,
        });
        self.connections[connection.0].searches.push(id);
        id
    }

    pub fn add_bookmark(&mut self, connection: ConnectionId, name: &str, dn: Dn) -> BookmarkId {
        let id = BookmarkId(self.bookmarks.len());
        self.bookmarks.push(Bookmark {
            connection,
            name: name.to_string(),
            dn,
        });
        self.connections[connection.0].bookmarks.push(id);
        id
    }

    pub fn connection_ids(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.connections.iter().map(|c| c.id)
    }

    pub fn connection(&self, id: ConnectionId) -> &Connection {
        &self.connections[id.0]
    }

    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id.0]
    }

    pub fn search(&self, id: SearchId) -> &Search {
        &self.searches[id.0]
    }

    pub fn bookmark(&self, id: BookmarkId) -> &Bookmark {
        &self.bookmarks[id.0]
    }

    pub fn find_entry(&self, connection: ConnectionId, dn: &Dn) -> Option<EntryId> {
        self.index.get(&(connection, index_key(dn))).copied()
    }

    // ── Materialization transitions (UI thread only) ────────────────────────

    /// Mark a connection as opening. Returns false if already opening or open.
    pub fn begin_open(&mut self, id: ConnectionId) -> bool {
        let conn = &mut self.connections[id.0];
        if conn.state != ConnectionState::Closed {
            return false;
        }
        conn.state = ConnectionState::Opening;
        true
    }

    pub fn complete_open(&mut self, id: ConnectionId) {
        self.connections[id.0].state = ConnectionState::Open;
    }

    /// Revert a failed open so a later expand can retry.
    pub fn fail_open(&mut self, id: ConnectionId) {
        self.connections[id.0].state = ConnectionState::Closed;
    }

    /// Mark an entry's children as being fetched. Returns false if a fetch is
    /// already in flight or the children are loaded.
    pub fn begin_children_fetch(&mut self, id: EntryId) -> bool {
        let entry = &mut self.entries[id.0];
        if entry.children_state != ChildrenState::Uninitialized {
            return false;
        }
        entry.children_state = ChildrenState::Initializing;
        true
    }

    /// Install fetched children and flip the entry to initialized.
    pub fn complete_children(&mut self, id: EntryId, records: Vec<EntryRecord>, has_more: bool) {
        let connection = self.entries[id.0].connection;
        let children = records
            .into_iter()
            .map(|record| {
                self.upsert_entry(connection, record.dn, record.kind, record.has_children, Some(id))
            })
            .collect();
        let entry = &mut self.entries[id.0];
        entry.children = children;
        entry.has_more_children = has_more;
        entry.children_state = ChildrenState::Initialized;
    }

    /// Forget loaded children so the next expand refetches them.
    pub fn invalidate_children(&mut self, id: EntryId) {
        let entry = &mut self.entries[id.0];
        if entry.children_state == ChildrenState::Initialized {
            entry.children_state = ChildrenState::Uninitialized;
        }
    }

    /// Mark a search as executing. Returns false if already executing or done.
    pub fn begin_search(&mut self, id: SearchId) -> bool {
        let search = &mut self.searches[id.0];
        if search.state != SearchState::NotExecuted {
            return false;
        }
        search.state = SearchState::Executing;
        true
    }

    /// Replace the search results wholesale.
    pub fn complete_search(&mut self, id: SearchId, records: Vec<EntryRecord>) {
        let connection = self.searches[id.0].connection;
        let results = records
            .into_iter()
            .map(|record| {
                let parent = record
                    .dn
                    .parent()
                    .and_then(|parent_dn| self.find_entry(connection, &parent_dn));
                self.upsert_entry(connection, record.dn, record.kind, record.has_children, parent)
            })
            .collect();
        let search = &mut self.searches[id.0];
        search.results = Some(results);
        search.state = SearchState::Done;
    }

    /// Drop the results so the next expand re-executes the search.
    pub fn invalidate_search(&mut self, id: SearchId) {
        let search = &mut self.searches[id.0];
        if search.state == SearchState::Done {
            search.results = None;
            search.state = SearchState::NotExecuted;
        }
    }

    fn upsert_entry(
        &mut self,
        connection: ConnectionId,
        dn: Dn,
        kind: EntryKind,
        has_children: bool,
        parent: Option<EntryId>,
    ) -> EntryId {
        match self.find_entry(connection, &dn) {
            Some(id) => {
                let entry = &mut self.entries[id.0];
                entry.kind = kind;
                entry.has_children_hint = has_children;
                if entry.parent.is_none() {
                    entry.parent = parent;
                }
                id
            }
            None => self.insert_entry(connection, dn, kind, has_children, parent),
        }
    }

    fn insert_entry(
        &mut self,
        connection: ConnectionId,
        dn: Dn,
        kind: EntryKind,
        has_children: bool,
        parent: Option<EntryId>,
    ) -> EntryId {
        let id = EntryId(self.entries.len());
        self.index.insert((connection, index_key(&dn)), id);
        self.entries.push(Entry {
            connection,
            dn,
            parent,
            kind,
            children: Vec::new(),
            children_state: ChildrenState::Uninitialized,
            has_more_children: false,
            has_children_hint: has_children,
        });
        id
    }
}

fn index_key(dn: &Dn) -> String {
    dn.to_string().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(dn: &str, has_children: bool) -> EntryRecord {
        EntryRecord {
            dn: Dn::parse(dn).unwrap(),
            kind: EntryKind::default(),
            has_children,
        }
    }

    #[test]
    fn new_connection_has_unmaterialized_root_dse() {
        let mut dir = Directory::new();
        let conn = dir.add_connection("local", DEFAULT_COUNT_LIMIT);
        let root = dir.entry(dir.connection(conn).root_dse);
        assert!(root.kind.root_dse);
        assert!(root.is_meta());
        assert!(root.children().is_none());
        assert!(root.has_children());
        assert_eq!(dir.connection(conn).state, ConnectionState::Closed);
    }

    #[test]
    fn begin_children_fetch_is_idempotent() {
        let mut dir = Directory::new();
        let conn = dir.add_connection("local", DEFAULT_COUNT_LIMIT);
        let root = dir.connection(conn).root_dse;
        assert!(dir.begin_children_fetch(root));
        assert!(!dir.begin_children_fetch(root));
        assert_eq!(dir.entry(root).children_state(), ChildrenState::Initializing);
    }

    #[test]
    fn complete_children_materializes_and_links_parent() {
        let mut dir = Directory::new();
        let conn = dir.add_connection("local", DEFAULT_COUNT_LIMIT);
        let root = dir.connection(conn).root_dse;
        dir.begin_children_fetch(root);
        dir.complete_children(root, vec![record("dc=example,dc=com", true)], false);

        let root_entry = dir.entry(root);
        assert!(root_entry.is_children_initialized());
        assert_eq!(root_entry.children_count(), 1);
        let child = dir.entry(root_entry.children().unwrap()[0]);
        assert_eq!(child.parent, Some(root));
        assert_eq!(child.label(), "dc=example");
    }

    #[test]
    fn refetch_keeps_entry_identity() {
        let mut dir = Directory::new();
        let conn = dir.add_connection("local", DEFAULT_COUNT_LIMIT);
        let root = dir.connection(conn).root_dse;
        dir.complete_children(root, vec![record("dc=example", true)], false);
        let first = dir.entry(root).children().unwrap()[0];

        dir.invalidate_children(root);
        assert!(dir.entry(root).children().is_none());
        assert!(dir.begin_children_fetch(root));
        dir.complete_children(root, vec![record("DC=Example", true)], false);
        assert_eq!(dir.entry(root).children().unwrap()[0], first);
    }

    #[test]
    fn has_children_uses_hint_until_loaded() {
        let mut dir = Directory::new();
        let conn = dir.add_connection("local", DEFAULT_COUNT_LIMIT);
        let root = dir.connection(conn).root_dse;
        dir.complete_children(root, vec![record("dc=leaf", false)], false);
        let leaf = dir.entry(root).children().unwrap()[0];
        assert!(!dir.entry(leaf).has_children());

        dir.complete_children(leaf, Vec::new(), true);
        assert!(dir.entry(leaf).has_children(), "capped result still has children");
    }

    #[test]
    fn search_results_replace_wholesale() {
        let mut dir = Directory::new();
        let conn = dir.add_connection("local", DEFAULT_COUNT_LIMIT);
        let search = dir.add_search(conn, "all", Dn::root(), SearchScope::Sub, None);
        assert!(dir.search(search).results().is_none());
        assert!(dir.begin_search(search));
        assert!(!dir.begin_search(search));
        dir.complete_search(search, vec![record("cn=a", false), record("cn=b", false)]);
        assert_eq!(dir.search(search).results().unwrap().len(), 2);

        dir.invalidate_search(search);
        assert!(dir.search(search).results().is_none());
        assert!(dir.begin_search(search));
        dir.complete_search(search, vec![record("cn=c", false)]);
        assert_eq!(dir.search(search).results().unwrap().len(), 1);
    }

    #[test]
    fn open_transitions() {
        let mut dir = Directory::new();
        let conn = dir.add_connection("local", DEFAULT_COUNT_LIMIT);
        assert!(dir.begin_open(conn));
        assert!(!dir.begin_open(conn));
        dir.fail_open(conn);
        assert!(dir.begin_open(conn));
        dir.complete_open(conn);
        assert_eq!(dir.connection(conn).state, ConnectionState::Open);
    }
}
