//! Fire-and-forget materialization of entries, searches and connections.
//!
//! The UI side ([`FetchTrigger`]) flips the node into its in-flight state and
//! posts a [`FetchRequest`]; the [`FetchWorker`] runs the directory call on a
//! blocking task and sends the [`FetchOutcome`] back as [`Event::Fetched`].
//! Only the UI thread writes the result into the [`Directory`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use crate::event::Event;
use crate::model::directory::{ConnectionId, Directory, EntryId, SearchId, SearchScope};
use crate::model::dn::Dn;
use crate::model::source::{EntryRecord, SourceMap};

/// Work for the background worker. Carries everything the source needs so
/// the worker never reads the directory model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    OpenConnection {
        connection: ConnectionId,
    },
    InitializeChildren {
        connection: ConnectionId,
        entry: EntryId,
        dn: Dn,
        limit: usize,
    },
    ExecuteSearch {
        connection: ConnectionId,
        search: SearchId,
        base: Dn,
        scope: SearchScope,
        rdn_filter: Option<String>,
        limit: usize,
    },
}

impl FetchRequest {
    pub fn connection(&self) -> ConnectionId {
        match self {
            FetchRequest::OpenConnection { connection }
            | FetchRequest::InitializeChildren { connection, .. }
            | FetchRequest::ExecuteSearch { connection, .. } => *connection,
        }
    }

    /// Run the request against its connection's source. Blocks for as long
    /// as the source does.
    pub fn execute(self, sources: &SourceMap) -> FetchOutcome {
        let Some(source) = sources.get(&self.connection()) else {
            let error = AppError::Fetch(format!("no source for connection {}", self.connection().0));
            return self.failed(error);
        };
        match self {
            FetchRequest::OpenConnection { connection } => FetchOutcome::Opened {
                connection,
                result: source.open(),
            },
            FetchRequest::InitializeChildren { entry, dn, limit, .. } => FetchOutcome::Children {
                entry,
                result: source.children(&dn, limit),
            },
            FetchRequest::ExecuteSearch {
                search,
                base,
                scope,
                rdn_filter,
                limit,
                ..
            } => FetchOutcome::SearchResults {
                search,
                result: source.search(&base, scope, rdn_filter.as_deref(), limit),
            },
        }
    }

    /// The outcome reporting `error` for this request.
    fn failed(&self, error: AppError) -> FetchOutcome {
        match self {
            FetchRequest::OpenConnection { connection } => FetchOutcome::Opened {
                connection: *connection,
                result: Err(error),
            },
            FetchRequest::InitializeChildren { entry, .. } => FetchOutcome::Children {
                entry: *entry,
                result: Err(error),
            },
            FetchRequest::ExecuteSearch { search, .. } => FetchOutcome::SearchResults {
                search: *search,
                result: Err(error),
            },
        }
    }
}

/// Result of one background fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    Opened {
        connection: ConnectionId,
        result: Result<()>,
    },
    Children {
        entry: EntryId,
        result: Result<(Vec<EntryRecord>, bool)>,
    },
    SearchResults {
        search: SearchId,
        result: Result<Vec<EntryRecord>>,
    },
}

impl FetchOutcome {
    /// Write the outcome into the directory model.
    ///
    /// A failed children fetch or search still materializes the node (empty)
    /// so the tree does not refetch in a loop; refresh retries. A failed open
    /// reverts to closed so the next expand retries. The error is returned for
    /// the status line.
    pub fn apply(self, directory: &mut Directory) -> Result<()> {
        match self {
            FetchOutcome::Opened { connection, result } => match result {
                Ok(()) => {
                    directory.complete_open(connection);
                    tracing::info!(?connection, "connection opened");
                    Ok(())
                }
                Err(err) => {
                    directory.fail_open(connection);
                    Err(err)
                }
            },
            FetchOutcome::Children { entry, result } => match result {
                Ok((records, has_more)) => {
                    tracing::debug!(?entry, count = records.len(), has_more, "children materialized");
                    directory.complete_children(entry, records, has_more);
                    Ok(())
                }
                Err(err) => {
                    directory.complete_children(entry, Vec::new(), false);
                    Err(err)
                }
            },
            FetchOutcome::SearchResults { search, result } => match result {
                Ok(records) => {
                    tracing::debug!(?search, count = records.len(), "search executed");
                    directory.complete_search(search, records);
                    Ok(())
                }
                Err(err) => {
                    directory.complete_search(search, Vec::new());
                    Err(err)
                }
            },
        }
    }
}

/// UI-side handle that schedules fetches at most once per node.
#[derive(Debug, Clone)]
pub struct FetchTrigger {
    tx: mpsc::UnboundedSender<FetchRequest>,
}

impl FetchTrigger {
    pub fn new(tx: mpsc::UnboundedSender<FetchRequest>) -> Self {
        Self { tx }
    }

    pub fn ensure_open(&self, directory: &mut Directory, connection: ConnectionId) {
        if !directory.begin_open(connection) {
            return;
        }
        self.send(FetchRequest::OpenConnection { connection });
    }

    pub fn ensure_children(&self, directory: &mut Directory, entry: EntryId) {
        if !directory.begin_children_fetch(entry) {
            tracing::trace!(?entry, "children fetch already scheduled");
            return;
        }
        let e = directory.entry(entry);
        let limit = directory.connection(e.connection).count_limit;
        self.send(FetchRequest::InitializeChildren {
            connection: e.connection,
            entry,
            dn: e.dn.clone(),
            limit,
        });
    }

    pub fn ensure_search(&self, directory: &mut Directory, search: SearchId) {
        if !directory.begin_search(search) {
            tracing::trace!(?search, "search already scheduled");
            return;
        }
        let s = directory.search(search);
        let limit = directory.connection(s.connection).count_limit;
        self.send(FetchRequest::ExecuteSearch {
            connection: s.connection,
            search,
            base: s.base.clone(),
            scope: s.scope,
            rdn_filter: s.rdn_filter.clone(),
            limit,
        });
    }

    fn send(&self, request: FetchRequest) {
        tracing::debug!(?request, "fetch scheduled");
        if self.tx.send(request).is_err() {
            tracing::warn!("fetch worker stopped, request dropped");
        }
    }
}

/// Background executor for [`FetchRequest`]s.
pub struct FetchWorker;

impl FetchWorker {
    /// Spawn the dispatch loop. Each request runs on its own blocking task
    /// after `latency`, so slow calls do not hold up others.
    pub fn spawn(
        sources: SourceMap,
        mut rx: mpsc::UnboundedReceiver<FetchRequest>,
        events: mpsc::UnboundedSender<Event>,
        latency: Duration,
    ) -> JoinHandle<()> {
        let sources = Arc::new(sources);
        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                let sources = Arc::clone(&sources);
                let events = events.clone();
                tokio::spawn(async move {
                    if !latency.is_zero() {
                        tokio::time::sleep(latency).await;
                    }
                    let pending = request.clone();
                    let outcome = match tokio::task::spawn_blocking(move || request.execute(&sources)).await {
                        Ok(outcome) => outcome,
                        Err(err) => pending.failed(AppError::Fetch(err.to_string())),
                    };
                    // The receiver is gone only when the app is shutting down.
                    let _ = events.send(Event::Fetched(outcome));
                });
            }
        })
    }
}
