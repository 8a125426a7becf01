//! Directory sources: the collaborators that actually answer "children of N"
//! and "results of search S".
//!
//! Wire-level LDAP is out of scope for the browser; [`MemorySource`] serves a
//! directory loaded from a JSON fixture (or generated synthetically) and is
//! called from background fetch tasks only.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::model::directory::{ConnectionId, Directory, EntryKind, SearchScope};
use crate::model::dn::Dn;

/// One entry as reported by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub dn: Dn,
    pub kind: EntryKind,
    pub has_children: bool,
}

/// The operations the browser needs from a directory server.
pub trait DirectorySource: Send + Sync {
    /// Bind/connect. Called once per connection before any other call.
    fn open(&self) -> Result<()>;

    /// Immediate children of `dn`, capped at `limit`. The flag is true when
    /// the cap truncated the result.
    fn children(&self, dn: &Dn, limit: usize) -> Result<(Vec<EntryRecord>, bool)>;

    /// Entries below `base` within `scope` whose RDN value contains
    /// `rdn_filter` (case-insensitive), capped at `limit`.
    fn search(
        &self,
        base: &Dn,
        scope: SearchScope,
        rdn_filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<EntryRecord>>;
}

/// Sources keyed by the connection they serve.
pub type SourceMap = HashMap<ConnectionId, Arc<dyn DirectorySource>>;

// ── Fixture format ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct EntryFixture {
    pub dn: String,
    #[serde(default)]
    pub object_class: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchFixture {
    pub name: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub scope: SearchScope,
    #[serde(default)]
    pub rdn_filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookmarkFixture {
    pub name: String,
    pub dn: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionFixture {
    pub name: String,
    #[serde(default)]
    pub count_limit: Option<usize>,
    #[serde(default)]
    pub entries: Vec<EntryFixture>,
    #[serde(default)]
    pub searches: Vec<SearchFixture>,
    #[serde(default)]
    pub bookmarks: Vec<BookmarkFixture>,
}

/// A whole fixture file: one or more connections.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryFixture {
    pub connections: Vec<ConnectionFixture>,
}

impl DirectoryFixture {
    /// Read a JSON fixture from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let fixture: DirectoryFixture = serde_json::from_str(content)?;
        if fixture.connections.is_empty() {
            return Err(AppError::Fixture("no connections defined".into()));
        }
        Ok(fixture)
    }

    /// A generated directory with `people` users under `ou=people`, plus a
    /// handful of groups, an alias, a referral, a subentry and the schema.
    pub fn synthetic(people: usize) -> Self {
        let mut entries = vec![
            entry("dc=example,dc=com", &["domain"]),
            entry("ou=people,dc=example,dc=com", &["organizationalUnit"]),
            entry("ou=groups,dc=example,dc=com", &["organizationalUnit"]),
            entry("cn=admins,ou=groups,dc=example,dc=com", &["groupOfNames"]),
            entry("cn=staff,ou=groups,dc=example,dc=com", &["groupOfNames"]),
            entry("cn=everyone,dc=example,dc=com", &["alias", "extensibleObject"]),
            entry("ou=remote,dc=example,dc=com", &["referral", "extensibleObject"]),
            entry("cn=policy,dc=example,dc=com", &["subentry"]),
            entry("cn=schema", &["subschema"]),
        ];
        entries.extend(
            (0..people).map(|i| entry(&format!("uid={i},ou=people,dc=example,dc=com"), &["inetOrgPerson"])),
        );

        DirectoryFixture {
            connections: vec![ConnectionFixture {
                name: format!("synthetic ({people} people)"),
                count_limit: None,
                entries,
                searches: vec![
                    SearchFixture {
                        name: "All people".into(),
                        base: "ou=people,dc=example,dc=com".into(),
                        scope: SearchScope::One,
                        rdn_filter: None,
                    },
                    SearchFixture {
                        name: "People matching 7".into(),
                        base: "dc=example,dc=com".into(),
                        scope: SearchScope::Sub,
                        rdn_filter: Some("7".into()),
                    },
                ],
                bookmarks: vec![BookmarkFixture {
                    name: "People".into(),
                    dn: "ou=people,dc=example,dc=com".into(),
                }],
            }],
        }
    }

    /// Register every connection, search and bookmark in `directory` and
    /// return the sources that will serve them.
    pub fn install(self, directory: &mut Directory, default_count_limit: usize) -> Result<SourceMap> {
        let mut sources: SourceMap = HashMap::new();
        for conn in self.connections {
            let id = directory.add_connection(&conn.name, conn.count_limit.unwrap_or(default_count_limit));
            for search in &conn.searches {
                directory.add_search(
                    id,
                    &search.name,
                    Dn::parse(&search.base)?,
                    search.scope,
                    search.rdn_filter.clone(),
                );
            }
            for bookmark in &conn.bookmarks {
                directory.add_bookmark(id, &bookmark.name, Dn::parse(&bookmark.dn)?);
            }
            let source = MemorySource::from_fixtures(&conn.entries)?;
            sources.insert(id, Arc::new(source));
        }
        Ok(sources)
    }
}

fn entry(dn: &str, object_class: &[&str]) -> EntryFixture {
    EntryFixture {
        dn: dn.to_string(),
        object_class: object_class.iter().map(|s| s.to_string()).collect(),
    }
}

/// Classify an entry from its object classes.
pub fn kind_from_object_classes(object_class: &[String]) -> EntryKind {
    let has = |name: &str| object_class.iter().any(|oc| oc.eq_ignore_ascii_case(name));
    EntryKind {
        root_dse: false,
        directory_meta: has("subschema") || has("subschemaSubentry"),
        alias: has("alias"),
        referral: has("referral"),
        subentry: has("subentry") || has("ldapSubentry"),
    }
}

// ── In-memory source ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct StoredEntry {
    dn: Dn,
    kind: EntryKind,
}

/// A directory held entirely in memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    entries: Vec<StoredEntry>,
    /// Lowercased parent DN -> indices into `entries`. The root DN ("") lists
    /// naming contexts and schema entries.
    children: HashMap<String, Vec<usize>>,
}

impl MemorySource {
    pub fn from_fixtures(fixtures: &[EntryFixture]) -> Result<Self> {
        let mut entries = Vec::with_capacity(fixtures.len());
        for fixture in fixtures {
            let dn = Dn::parse(&fixture.dn)?;
            if dn.is_root() {
                return Err(AppError::Fixture("the root DN cannot be an entry".into()));
            }
            entries.push(StoredEntry {
                dn,
                kind: kind_from_object_classes(&fixture.object_class),
            });
        }

        let known: HashMap<String, usize> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (key(&e.dn), i))
            .collect();

        let mut children: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, stored) in entries.iter().enumerate() {
            // Entries whose parent is not part of the fixture are naming
            // contexts and hang off the Root DSE.
            let parent_key = stored
                .dn
                .parent()
                .map(|p| key(&p))
                .filter(|k| known.contains_key(k))
                .unwrap_or_default();
            children.entry(parent_key).or_default().push(i);
        }

        Ok(Self { entries, children })
    }

    fn record(&self, index: usize) -> EntryRecord {
        let stored = &self.entries[index];
        EntryRecord {
            dn: stored.dn.clone(),
            kind: stored.kind,
            has_children: self
                .children
                .get(&key(&stored.dn))
                .is_some_and(|c| !c.is_empty()),
        }
    }
}

impl DirectorySource for MemorySource {
    fn open(&self) -> Result<()> {
        Ok(())
    }

    fn children(&self, dn: &Dn, limit: usize) -> Result<(Vec<EntryRecord>, bool)> {
        let Some(indices) = self.children.get(&key(dn)) else {
            return Ok((Vec::new(), false));
        };
        let has_more = limit > 0 && indices.len() > limit;
        let take = if limit > 0 { limit } else { indices.len() };
        let records = indices.iter().take(take).map(|&i| self.record(i)).collect();
        Ok((records, has_more))
    }

    fn search(
        &self,
        base: &Dn,
        scope: SearchScope,
        rdn_filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<EntryRecord>> {
        let needle = rdn_filter.map(str::to_lowercase);
        let in_scope = |dn: &Dn| match scope {
            SearchScope::One => dn.parent().is_some_and(|p| p.matches(base)),
            SearchScope::Sub => base.is_root() || dn.is_descendant_of(base) || dn.matches(base),
        };
        let matching = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| in_scope(&e.dn))
            .filter(|(_, e)| match &needle {
                Some(needle) => e
                    .dn
                    .rdn()
                    .is_some_and(|rdn| rdn.value().to_lowercase().contains(needle)),
                None => true,
            })
            .map(|(i, _)| self.record(i));
        Ok(if limit > 0 {
            matching.take(limit).collect()
        } else {
            matching.collect()
        })
    }
}

fn key(dn: &Dn) -> String {
    dn.to_string().to_lowercase()
}
