/// Data model for the scan tree.
///
/// Re-exports the arena-allocated tree structure and supporting types.
pub mod file_node;
pub mod file_tree;
pub mod format;

pub use file_node::{
    extension_of, root_display_name, FileNode, NodeIndex, ViewState, PROTECTED_EXTENSION,
    UNKNOWN_OWNER,
};
pub use file_tree::{Children, FileTree};
