//! Per-owner cache of the last page tree built for it.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use crate::browser::pages::PageTree;

/// Maps an owner (entry or search) to its current page tree.
///
/// A cached tree is valid only while its final top-level page ends at
/// `count - 1`; any other count discards and rebuilds it. There is no
/// incremental update.
#[derive(Debug)]
pub struct PageCache<O> {
    trees: HashMap<O, Rc<PageTree<O>>>,
}

impl<O> Default for PageCache<O> {
    fn default() -> Self {
        Self {
            trees: HashMap::new(),
        }
    }
}

impl<O: Copy + Eq + Hash + Debug> PageCache<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached pages for `owner`, rebuilding them when the live
    /// `count` no longer matches.
    pub fn get_pages(&mut self, owner: O, count: usize, page_size: usize) -> Rc<PageTree<O>> {
        if let Some(tree) = self.trees.get(&owner) {
            if count > 0 && tree.last_index() == Some(count - 1) && tree.page_size() == page_size.max(2) {
                return Rc::clone(tree);
            }
            tracing::debug!(?owner, count, "page cache stale, rebuilding");
        }

        if count == 0 {
            // Nothing to page; keep no entry so a later count rebuilds.
            self.trees.remove(&owner);
            return Rc::new(PageTree::build(owner, 1, 0, page_size));
        }

        let tree = Rc::new(PageTree::build(owner, 0, count - 1, page_size));
        tracing::debug!(?owner, count, pages = tree.pages().len(), "built page tree");
        self.trees.insert(owner, Rc::clone(&tree));
        tree
    }

    /// The cached tree, without building or validating it.
    pub fn get(&self, owner: &O) -> Option<&Rc<PageTree<O>>> {
        self.trees.get(owner)
    }

    /// Drop the entry for `owner`, e.g. when its children fit on one level.
    pub fn remove(&mut self, owner: &O) {
        self.trees.remove(owner);
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Clear all owner mappings.
    pub fn dispose(&mut self) {
        if !self.is_empty() {
            tracing::debug!(trees = self.len(), "page cache disposed");
        }
        self.trees.clear();
    }
}
