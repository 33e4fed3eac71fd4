/// View organizer: filter, group and sort the children of scanned folders.
///
/// The organizer takes ownership of an aggregated [`FileTree`] and keeps a
/// per-node overlay of what is visible under each folder. The overlay never
/// touches sizes, extensions or the tree's structure; the only thing written
/// back into the tree is each node's [`ViewState`](crate::model::ViewState)
/// flags.
///
/// Per folder at most one filter, one grouping and one sort are active.
/// Changing the filter keeps the grouping and sort; changing the grouping
/// keeps the filter and sort.
pub mod filter;
pub mod group;
pub mod sort;

pub use filter::Filter;
pub use group::{Bucket, Grouping, OTHER_BUCKET};
pub use sort::{SortColumn, SortDirection, SortKey};

use crate::model::format::{format_size, format_timestamp};
use crate::model::{FileTree, NodeIndex};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};

/// Errors parsing view settings from user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseViewError {
    #[error("filter must not be empty")]
    EmptyFilter,

    #[error("unknown grouping: {0:?}")]
    UnknownGrouping(String),

    #[error("unknown sort column: {0:?}")]
    UnknownSortColumn(String),

    #[error("unknown sort direction: {0:?}")]
    UnknownSortDirection(String),
}

/// One visible entry under a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEntry {
    /// A real child node.
    Node(NodeIndex),
    /// A synthetic group of children.
    Bucket(Bucket),
}

/// A flattened, display-ready line of a folder listing.
#[derive(Debug, Clone, Serialize)]
pub struct ViewRow {
    /// 0 for direct entries and bucket headers, 1 for bucket members.
    pub depth: u8,
    pub name: String,
    pub is_bucket: bool,
    pub is_dir: bool,
    /// `None` for bucket headers.
    pub size: Option<u64>,
    pub size_display: String,
    pub percent_of_parent: Option<f32>,
    pub created: String,
    pub modified: String,
    pub extension: String,
    pub owner: String,
    /// Number of members, bucket headers only.
    pub members: Option<usize>,
}

/// Overlay state for one folder.
#[derive(Debug, Clone, Default)]
struct ChildView {
    entries: Vec<ViewEntry>,
    hidden: Vec<NodeIndex>,
    filter: Filter,
    grouping: Option<(Grouping, NaiveDate)>,
    sort: Option<SortKey>,
}

impl ChildView {
    fn canonical(tree: &FileTree, node: NodeIndex) -> Self {
        Self {
            entries: canonical_children(tree, node)
                .into_iter()
                .map(ViewEntry::Node)
                .collect(),
            ..Self::default()
        }
    }

    /// Every node currently shown, bucket members included.
    fn members(&self) -> Vec<NodeIndex> {
        let mut members = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            match entry {
                ViewEntry::Node(idx) => members.push(*idx),
                ViewEntry::Bucket(bucket) => members.extend_from_slice(&bucket.members),
            }
        }
        members
    }

    fn is_grouped(&self) -> bool {
        self.entries.iter().any(|e| matches!(e, ViewEntry::Bucket(_)))
    }

    fn dissolve_buckets(&mut self) {
        if self.is_grouped() {
            self.entries = self.members().into_iter().map(ViewEntry::Node).collect();
        }
    }

    fn undo_filter(&mut self) {
        self.entries.extend(self.hidden.drain(..).map(ViewEntry::Node));
        self.filter = Filter::None;
    }

    fn apply_filter(&mut self, tree: &FileTree, filter: Filter) {
        if filter.is_active() {
            let (shown, hidden): (Vec<NodeIndex>, Vec<NodeIndex>) = self
                .members()
                .into_iter()
                .partition(|&idx| filter.matches(tree.node(idx)));
            self.entries = shown.into_iter().map(ViewEntry::Node).collect();
            self.hidden = hidden;
        }
        self.filter = filter;
    }

    fn apply_grouping(&mut self, tree: &FileTree) {
        if let Some((grouping, today)) = self.grouping {
            let buckets = grouping.partition(tree, &self.members(), today);
            self.entries = buckets.into_iter().map(ViewEntry::Bucket).collect();
        }
    }

    /// Sort loose entries, or each bucket's members. Bucket order is fixed.
    fn apply_sort(&mut self, tree: &FileTree) {
        let Some(key) = self.sort else { return };
        if self.is_grouped() {
            for entry in &mut self.entries {
                if let ViewEntry::Bucket(bucket) = entry {
                    key.sort(tree, &mut bucket.members);
                }
            }
        } else {
            let mut members = self.members();
            key.sort(tree, &mut members);
            self.entries = members.into_iter().map(ViewEntry::Node).collect();
        }
    }
}

/// Children in listing order.
fn canonical_children(tree: &FileTree, node: NodeIndex) -> Vec<NodeIndex> {
    let mut children = tree.children(node);
    children.sort_unstable();
    children
}

/// Owns a scanned tree and the per-folder view overlay on top of it.
pub struct ViewOrganizer {
    tree: FileTree,
    views: HashMap<NodeIndex, ChildView>,
}

impl ViewOrganizer {
    pub fn new(tree: FileTree) -> Self {
        Self {
            tree,
            views: HashMap::new(),
        }
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    /// Give the tree back, dropping the overlay.
    pub fn into_tree(self) -> FileTree {
        self.tree
    }

    /// The entries currently shown under `node`.
    pub fn visible(&self, node: NodeIndex) -> Cow<'_, [ViewEntry]> {
        match self.views.get(&node) {
            Some(view) => Cow::Borrowed(&view.entries),
            None => Cow::Owned(
                canonical_children(&self.tree, node)
                    .into_iter()
                    .map(ViewEntry::Node)
                    .collect(),
            ),
        }
    }

    /// Replace the active filter of `node`.
    ///
    /// Filters do not compose: the previous filter is undone before the new
    /// one is applied. `Filter::None` just restores the hidden children.
    pub fn filter(&mut self, node: NodeIndex, filter: Filter) -> &[ViewEntry] {
        self.update(node, |tree, view| {
            view.dissolve_buckets();
            if view.filter.is_active() {
                view.undo_filter();
            }
            view.apply_filter(tree, filter);
            view.apply_grouping(tree);
            view.apply_sort(tree);
        })
    }

    /// Group the visible children of `node`, dating against the local today.
    pub fn group(&mut self, node: NodeIndex, grouping: Grouping) -> &[ViewEntry] {
        self.group_at(node, grouping, Local::now().date_naive())
    }

    /// Group the visible children of `node`, dating against `today`.
    pub fn group_at(
        &mut self,
        node: NodeIndex,
        grouping: Grouping,
        today: NaiveDate,
    ) -> &[ViewEntry] {
        self.update(node, |tree, view| {
            view.dissolve_buckets();
            view.grouping = Some((grouping, today));
            view.apply_grouping(tree);
            view.apply_sort(tree);
        })
    }

    /// Remove all buckets under `node`, keeping the filter.
    pub fn ungroup(&mut self, node: NodeIndex) -> &[ViewEntry] {
        self.update(node, |tree, view| {
            view.dissolve_buckets();
            view.grouping = None;
            view.apply_sort(tree);
        })
    }

    /// Order the visible children of `node`, or each bucket's members.
    pub fn sort(&mut self, node: NodeIndex, key: SortKey) -> &[ViewEntry] {
        self.update(node, |tree, view| {
            view.sort = Some(key);
            view.apply_sort(tree);
        })
    }

    /// Drop filter, grouping and sort of `node`, restoring its canonical
    /// children.
    pub fn reset(&mut self, node: NodeIndex) {
        self.views.remove(&node);
        self.tree.node_mut(node).view = Default::default();
    }

    /// Filters that would show something under `node`: `None`, then
    /// `Folders` when it has subfolders, then each distinct file extension.
    pub fn available_filters(&self, node: NodeIndex) -> Vec<Filter> {
        let mut has_folders = false;
        let mut extensions = BTreeSet::new();
        for child in self.tree.child_iter(node) {
            let child = self.tree.node(child);
            if child.is_dir {
                has_folders = true;
            } else if !child.extension.is_empty() {
                extensions.insert(child.extension.clone());
            }
        }

        let mut filters = vec![Filter::None];
        if has_folders {
            filters.push(Filter::Folders);
        }
        filters.extend(extensions.into_iter().map(Filter::Extension));
        filters
    }

    /// Children of `node` with a non-zero size, largest first.
    pub fn chart_slices(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut slices: Vec<NodeIndex> = self
            .tree
            .child_iter(node)
            .filter(|&c| self.tree.node(c).size > 0)
            .collect();
        SortKey::new(SortColumn::Size, SortDirection::Descending).sort(&self.tree, &mut slices);
        slices
    }

    /// Flatten the visible entries of `node` into display rows.
    pub fn rows(&self, node: NodeIndex) -> Vec<ViewRow> {
        let mut rows = Vec::new();
        for entry in self.visible(node).iter() {
            match entry {
                ViewEntry::Node(idx) => rows.push(self.node_row(*idx, 0)),
                ViewEntry::Bucket(bucket) => {
                    rows.push(ViewRow {
                        depth: 0,
                        name: bucket.label.to_string(),
                        is_bucket: true,
                        is_dir: false,
                        size: None,
                        size_display: String::new(),
                        percent_of_parent: None,
                        created: String::new(),
                        modified: String::new(),
                        extension: String::new(),
                        owner: String::new(),
                        members: Some(bucket.members.len()),
                    });
                    rows.extend(bucket.members.iter().map(|&m| self.node_row(m, 1)));
                }
            }
        }
        rows
    }

    fn node_row(&self, idx: NodeIndex, depth: u8) -> ViewRow {
        let node = self.tree.node(idx);
        ViewRow {
            depth,
            name: node.name.to_string(),
            is_bucket: false,
            is_dir: node.is_dir,
            size: Some(node.size),
            size_display: format_size(node.size),
            percent_of_parent: Some(node.percent_of_parent),
            created: format_timestamp(node.created),
            modified: format_timestamp(node.modified),
            extension: node.extension.to_string(),
            owner: node.owner.to_string(),
            members: None,
        }
    }

    /// Run `op` on the overlay of `node` and sync its view flags.
    fn update(
        &mut self,
        node: NodeIndex,
        op: impl FnOnce(&FileTree, &mut ChildView),
    ) -> &[ViewEntry] {
        let tree = &mut self.tree;
        let view = self
            .views
            .entry(node)
            .or_insert_with(|| ChildView::canonical(tree, node));
        op(tree, view);

        let flags = &mut tree.node_mut(node).view;
        flags.grouped = view.grouping.is_some();
        flags.filtered = view.filter.is_active();
        &view.entries
    }
}
