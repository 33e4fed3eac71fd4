/// Arena-backed file tree produced by one scan.
///
/// All nodes live in a single `Vec<FileNode>`. Relationships between nodes
/// use `NodeIndex` (a thin `u32` wrapper) rather than heap pointers. The root
/// is always index 0 and every child is inserted after its parent, so a
/// reverse walk over the arena visits children before parents.
use super::file_node::{FileNode, NodeIndex};
use std::path::{Path, PathBuf};

/// The complete file tree produced by a scan.
#[derive(Debug, Clone)]
pub struct FileTree {
    /// Arena: every node in a flat, cache-friendly vector.
    pub nodes: Vec<FileNode>,

    /// Absolute path of the scanned root; the base for `full_path`.
    root_path: PathBuf,

    /// Root size once aggregation has run.
    pub total_size: u64,

    /// Entries discovered by the builder, root excluded.
    pub discovered: u64,
}

impl FileTree {
    /// Create a tree holding only `root`, with pre-allocated capacity.
    ///
    /// `estimated_nodes` should be a rough upper bound (the census total is
    /// a good one). The arena grows if needed.
    pub fn with_capacity(root_path: PathBuf, root: FileNode, estimated_nodes: usize) -> Self {
        let mut nodes = Vec::with_capacity(estimated_nodes.max(1));
        nodes.push(root);
        Self {
            nodes,
            root_path,
            total_size: 0,
            discovered: 0,
        }
    }

    /// Index of the scan root.
    #[inline]
    pub fn root(&self) -> NodeIndex {
        NodeIndex(0)
    }

    /// Path the scan started from.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Allocate a new node in the arena and return its index.
    pub fn add_node(&mut self, node: FileNode) -> NodeIndex {
        let idx = NodeIndex::new(self.nodes.len());
        self.nodes.push(node);
        idx
    }

    /// Attach `child` as a child of `parent`, prepending to the sibling list.
    ///
    /// O(1). The child must have been allocated after the parent.
    pub fn add_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        debug_assert!(
            parent < child,
            "children must follow their parent in the arena"
        );
        let old_first = self.nodes[parent.idx()].first_child;
        self.nodes[child.idx()].next_sibling = old_first;
        self.nodes[child.idx()].parent = Some(parent);
        self.nodes[parent.idx()].first_child = Some(child);
    }

    /// Iterate the direct children of a node (unordered).
    pub fn child_iter(&self, parent: NodeIndex) -> Children<'_> {
        Children {
            tree: self,
            next: self.nodes[parent.idx()].first_child,
        }
    }

    /// Get direct children of a node (unsorted).
    pub fn children(&self, parent: NodeIndex) -> Vec<NodeIndex> {
        self.child_iter(parent).collect()
    }

    /// Reset every directory size to zero ahead of an aggregation pass.
    pub fn reset_directory_sizes(&mut self) {
        for node in self.nodes.iter_mut().filter(|n| n.is_dir) {
            node.size = 0;
            node.percent_of_parent = 0.0;
        }
        self.total_size = 0;
    }

    /// Reconstruct the absolute path of a node from the root path and the
    /// names on its parent chain.
    pub fn full_path(&self, index: NodeIndex) -> PathBuf {
        let mut segments = Vec::new();
        let mut current = Some(index);
        while let Some(idx) = current {
            let node = &self.nodes[idx.idx()];
            if node.parent.is_none() {
                break;
            }
            segments.push(node.name.as_str());
            current = node.parent;
        }
        let mut path = self.root_path.clone();
        path.extend(segments.iter().rev());
        path
    }

    /// Get the node at the given index.
    #[inline]
    pub fn node(&self, index: NodeIndex) -> &FileNode {
        &self.nodes[index.idx()]
    }

    /// Mutable access to the node at the given index.
    #[inline]
    pub fn node_mut(&mut self, index: NodeIndex) -> &mut FileNode {
        &mut self.nodes[index.idx()]
    }

    /// Total number of nodes in the tree, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree contains no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Iterator over a node's direct children, following the sibling list.
pub struct Children<'a> {
    tree: &'a FileTree,
    next: Option<NodeIndex>,
}

impl Iterator for Children<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        let current = self.next?;
        self.next = self.tree.nodes[current.idx()].next_sibling;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compact_str::CompactString;

    fn tree_with_root() -> FileTree {
        FileTree::with_capacity(
            PathBuf::from("/data"),
            FileNode::new_dir(CompactString::new("data"), None),
            8,
        )
    }

    #[test]
    fn test_children_linked_to_parent() {
        let mut tree = tree_with_root();
        let root = tree.root();
        let a = tree.add_node(FileNode::new_file(
            CompactString::new("a.txt"),
            1,
            Some(root),
        ));
        tree.add_child(root, a);
        let b = tree.add_node(FileNode::new_file(
            CompactString::new("b.txt"),
            2,
            Some(root),
        ));
        tree.add_child(root, b);

        let mut children = tree.children(root);
        children.sort();
        assert_eq!(children, vec![a, b]);
        assert_eq!(tree.node(a).parent, Some(root));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_full_path() {
        let mut tree = tree_with_root();
        let root = tree.root();
        let dir = tree.add_node(FileNode::new_dir(CompactString::new("sub"), Some(root)));
        tree.add_child(root, dir);
        let file = tree.add_node(FileNode::new_file(
            CompactString::new("c.txt"),
            25,
            Some(dir),
        ));
        tree.add_child(dir, file);

        assert_eq!(tree.full_path(root), PathBuf::from("/data"));
        assert_eq!(
            tree.full_path(file),
            PathBuf::from("/data").join("sub").join("c.txt")
        );
    }

    #[test]
    fn test_reset_directory_sizes_keeps_files() {
        let mut tree = tree_with_root();
        let root = tree.root();
        let file = tree.add_node(FileNode::new_file(
            CompactString::new("a.bin"),
            40,
            Some(root),
        ));
        tree.add_child(root, file);
        tree.node_mut(root).size = 40;
        tree.total_size = 40;

        tree.reset_directory_sizes();
        assert_eq!(tree.node(root).size, 0);
        assert_eq!(tree.node(file).size, 40);
        assert_eq!(tree.total_size, 0);
    }

    #[test]
    fn test_leaf_has_no_children() {
        let mut tree = tree_with_root();
        let root = tree.root();
        let file = tree.add_node(FileNode::new_file(CompactString::new("x"), 0, Some(root)));
        tree.add_child(root, file);
        assert!(tree.children(file).is_empty());
    }
}
