/// A single node in the arena-allocated file tree.
///
/// Nodes are stored in a flat `Vec<FileNode>` for cache-friendly traversal.
/// Parent-child relationships use indices rather than pointers, so a node
/// never holds a reference to another node and ownership stays with the tree.
use compact_str::CompactString;
use std::path::Path;
use std::time::SystemTime;

/// Extension given to files whose metadata could not be read.
///
/// Distinguishes unreadable files from ordinary files without a suffix.
pub const PROTECTED_EXTENSION: &str = "protected-system-file";

/// Owner given to entries whose ownership could not be resolved.
pub const UNKNOWN_OWNER: &str = "unknown (access denied)";

/// Lightweight index into the arena `Vec<FileNode>`.
///
/// Uses `u32` to keep nodes small; supports up to ~4 billion nodes,
/// which is more than enough for any real filesystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Create a new `NodeIndex` from a `usize`.
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "NodeIndex overflow");
        Self(index as u32)
    }

    /// Return the index as a `usize` for Vec indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Presentation flags owned by the view organizer.
///
/// Not part of the scan data: size and identity never depend on these.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    /// The node's visible children are currently split into buckets.
    pub grouped: bool,
    /// Part of the node's children are currently hidden by a filter.
    pub filtered: bool,
}

/// A single file or directory in the tree.
///
/// Children are linked via a `first_child` / `next_sibling` list so that
/// no separate `Vec<NodeIndex>` allocation is needed per node.
#[derive(Debug, Clone)]
pub struct FileNode {
    /// File or directory name only (NOT the full path).
    /// Full paths are reconstructed on demand by walking up via `parent`.
    pub name: CompactString,

    /// Logical size in bytes.
    /// For directories this is zero until the aggregation phase has run,
    /// then the sum of all descendant file sizes.
    pub size: u64,

    /// `true` if this node represents a directory.
    pub is_dir: bool,

    /// Index of the parent node. `None` for the scan root.
    pub parent: Option<NodeIndex>,

    /// First child (directories only).
    pub first_child: Option<NodeIndex>,

    /// Next sibling under the same parent.
    pub next_sibling: Option<NodeIndex>,

    /// Creation timestamp, if the platform reports one.
    pub created: Option<SystemTime>,

    /// Last-modified timestamp.
    pub modified: Option<SystemTime>,

    /// Lowercase suffix including the dot (`.txt`), empty for directories
    /// and suffix-less files, [`PROTECTED_EXTENSION`] for unreadable files.
    pub extension: CompactString,

    /// Resolved account name or [`UNKNOWN_OWNER`].
    pub owner: CompactString,

    /// Percentage of the parent's size (0.0–100.0), filled in by aggregation.
    pub percent_of_parent: f32,

    /// `true` if this node's metadata could not be read.
    /// The node stays in the tree so users can see where errors occurred.
    pub is_error: bool,

    pub view: ViewState,
}

impl FileNode {
    /// Create a new file node with the given name and size.
    ///
    /// The extension is derived from the name.
    pub fn new_file(name: CompactString, size: u64, parent: Option<NodeIndex>) -> Self {
        let extension = extension_of(&name);
        Self {
            name,
            size,
            is_dir: false,
            parent,
            first_child: None,
            next_sibling: None,
            created: None,
            modified: None,
            extension,
            owner: CompactString::default(),
            percent_of_parent: 0.0,
            is_error: false,
            view: ViewState::default(),
        }
    }

    /// Create a new directory node.
    pub fn new_dir(name: CompactString, parent: Option<NodeIndex>) -> Self {
        Self {
            name,
            size: 0,
            is_dir: true,
            parent,
            first_child: None,
            next_sibling: None,
            created: None,
            modified: None,
            extension: CompactString::default(),
            owner: CompactString::default(),
            percent_of_parent: 0.0,
            is_error: false,
            view: ViewState::default(),
        }
    }

    /// Create a placeholder for an entry whose metadata could not be read.
    ///
    /// Size is zero, timestamps are absent and both sentinels are set
    /// (the extension one for files only).
    pub fn new_error(name: CompactString, is_dir: bool, parent: Option<NodeIndex>) -> Self {
        let extension = if is_dir {
            CompactString::default()
        } else {
            CompactString::const_new(PROTECTED_EXTENSION)
        };
        Self {
            name,
            size: 0,
            is_dir,
            parent,
            first_child: None,
            next_sibling: None,
            created: None,
            modified: None,
            extension,
            owner: CompactString::const_new(UNKNOWN_OWNER),
            percent_of_parent: 0.0,
            is_error: true,
            view: ViewState::default(),
        }
    }

    /// `true` for placeholders whose metadata was unreadable.
    #[inline]
    pub fn is_protected(&self) -> bool {
        self.extension == PROTECTED_EXTENSION
    }
}

/// Lowercased suffix of a file name, including the leading dot.
///
/// Follows `Path::extension`: `archive.tar.GZ` → `.gz`, `.bashrc` → `""`.
pub fn extension_of(name: &str) -> CompactString {
    match Path::new(name).extension() {
        Some(ext) => {
            let mut out = CompactString::const_new(".");
            out.push_str(&ext.to_string_lossy().to_lowercase());
            out
        }
        None => CompactString::default(),
    }
}

/// Derive a display name for the scan root.
///
/// Uses the last path component when there is one. Volume roots have none,
/// so the volume identifier before `:` is used (`C:\` → `C`), falling back
/// to the path text itself (`/`).
pub fn root_display_name(path: &Path) -> CompactString {
    if let Some(name) = path.file_name() {
        return CompactString::new(name.to_string_lossy());
    }
    let text = path.to_string_lossy();
    let volume = text.split(':').next().unwrap_or_default();
    let volume = volume.trim_end_matches(['\\', '/']);
    if volume.is_empty() {
        CompactString::new(text)
    } else {
        CompactString::new(volume)
    }
}
