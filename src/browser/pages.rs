//! Folding of large child lists into a balanced tree of index-range pages.
//!
//! A page never holds element references, only an inclusive `[first, last]`
//! index range into the owner's live, sorted children (or search results).
//! Edits below the owner are therefore visible without rebuilding pages as
//! long as the count is unchanged.

use std::fmt;
use std::rc::Rc;

/// Index of a page inside its [`PageTree`].
pub type PageId = usize;

/// Where a page hangs in the display tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageParent {
    /// A top-level page: its parent is the owning entry or search.
    Owner,
    /// A nested page.
    Page(PageId),
}

/// One synthetic grouping node spanning `[first, last]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub first: usize,
    pub last: usize,
    /// Nesting level, 0 for top-level pages.
    pub depth: usize,
    pub parent: PageParent,
    /// Empty for leaf pages; otherwise tiles `[first, last]` contiguously.
    pub subpages: Vec<PageId>,
}

impl Page {
    pub fn is_leaf(&self) -> bool {
        self.subpages.is_empty()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        self.first <= index && index <= self.last
    }
}

/// All pages built for one owner. The pages live in a flat arena; parent and
/// subpage links are arena indices.
#[derive(Debug)]
pub struct PageTree<O> {
    owner: O,
    page_size: usize,
    pages: Vec<Page>,
    top: Vec<PageId>,
}

impl<O: Copy> PageTree<O> {
    /// Partition `[first, last]` into pages of at most `page_size` items per
    /// tree level. `page_size` below 2 is treated as 2.
    pub fn build(owner: O, first: usize, last: usize, page_size: usize) -> Self {
        let mut tree = Self {
            owner,
            page_size: page_size.max(2),
            pages: Vec::new(),
            top: Vec::new(),
        };
        if first <= last {
            tree.top = tree.partition(first, last, PageParent::Owner, 0);
        }
        tree
    }

    fn partition(&mut self, first: usize, last: usize, parent: PageParent, depth: usize) -> Vec<PageId> {
        let diff = last - first;
        // Exact integer log. A float ratio of logarithms rounds down at exact
        // powers, so 1001 items at size 10 would give 11 top pages instead of 2.
        let factor = if diff > 0 { diff.ilog(self.page_size) } else { 0 };
        let span = self.page_size.pow(factor);
        let count = diff / span + 1;

        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let group_first = i * span + first;
            let group_last = ((i + 1) * span + first - 1).min(last);
            let id = self.pages.len();
            self.pages.push(Page {
                first: group_first,
                last: group_last,
                depth,
                parent,
                subpages: Vec::new(),
            });
            if factor > 1 {
                let subpages = self.partition(group_first, group_last, PageParent::Page(id), depth + 1);
                self.pages[id].subpages = subpages;
            }
            ids.push(id);
        }
        ids
    }

    pub fn owner(&self) -> O {
        self.owner
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn top_level(&self) -> &[PageId] {
        &self.top
    }

    pub fn page(&self, id: PageId) -> &Page {
        &self.pages[id]
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// `last` of the final top-level page, the value compared against the
    /// live count to detect staleness.
    pub fn last_index(&self) -> Option<usize> {
        self.top.last().map(|&id| self.pages[id].last)
    }

    /// The leaf page whose range contains `index`, walking down from the top.
    pub fn leaf_containing(&self, index: usize) -> Option<PageId> {
        let mut level = self.top.as_slice();
        loop {
            let id = *level.iter().find(|&&id| self.pages[id].contains(index))?;
            let page = &self.pages[id];
            if page.is_leaf() {
                return Some(id);
            }
            level = &page.subpages;
        }
    }
}

/// A handle on one page of a shared [`PageTree`]; this is what the display
/// tree carries around.
#[derive(Debug)]
pub struct PageNode<O> {
    tree: Rc<PageTree<O>>,
    id: PageId,
}

impl<O> Clone for PageNode<O> {
    fn clone(&self) -> Self {
        Self {
            tree: Rc::clone(&self.tree),
            id: self.id,
        }
    }
}

/// Parent of a page in the display tree.
#[derive(Debug, Clone)]
pub enum PageOwnerOrPage<O> {
    Owner(O),
    Page(PageNode<O>),
}

impl<O: Copy> PageNode<O> {
    pub fn new(tree: Rc<PageTree<O>>, id: PageId) -> Self {
        Self { tree, id }
    }

    /// Handles for the top-level pages of `tree`.
    pub fn top_level(tree: &Rc<PageTree<O>>) -> Vec<PageNode<O>> {
        tree.top_level()
            .iter()
            .map(|&id| PageNode::new(Rc::clone(tree), id))
            .collect()
    }

    fn page(&self) -> &Page {
        self.tree.page(self.id)
    }

    pub fn owner(&self) -> O {
        self.tree.owner()
    }

    pub fn first(&self) -> usize {
        self.page().first
    }

    pub fn last(&self) -> usize {
        self.page().last
    }

    pub fn depth(&self) -> usize {
        self.page().depth
    }

    pub fn is_leaf(&self) -> bool {
        self.page().is_leaf()
    }

    /// Nested pages, `None` for a leaf page.
    pub fn subpages(&self) -> Option<Vec<PageNode<O>>> {
        let page = self.page();
        if page.is_leaf() {
            return None;
        }
        Some(
            page.subpages
                .iter()
                .map(|&id| PageNode::new(Rc::clone(&self.tree), id))
                .collect(),
        )
    }

    pub fn parent(&self) -> PageOwnerOrPage<O> {
        match self.page().parent {
            PageParent::Owner => PageOwnerOrPage::Owner(self.tree.owner()),
            PageParent::Page(id) => PageOwnerOrPage::Page(PageNode::new(Rc::clone(&self.tree), id)),
        }
    }

    /// Whether both handles point at the same page of the same tree.
    #[allow(dead_code)]
    pub fn same_page(&self, other: &PageNode<O>) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree) && self.id == other.id
    }
}

impl<O: Copy> fmt::Display for PageNode<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.first() + 1, self.last() + 1)
    }
}
