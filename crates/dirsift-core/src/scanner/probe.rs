/// Node construction from a filesystem path.
///
/// Probing never fails: an entry whose metadata cannot be read (vanished
/// between listing and stat, or access denied) becomes an error placeholder
/// so the scan carries on and the entry stays visible.
use crate::model::{root_display_name, FileNode};
use crate::platform::OwnerResolver;
use compact_str::CompactString;
use std::fs;
use std::path::Path;
use tracing::trace;

/// Build a node for `path`, deriving its name and kind from the path itself.
///
/// Symbolic links are not followed; a link is a leaf of its own size.
pub fn probe_path(path: &Path, owners: &OwnerResolver) -> FileNode {
    let name = root_display_name(path);
    let is_dir = fs::symlink_metadata(path)
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    probe_entry(path, name, is_dir, owners)
}

/// Build a node for a listed entry whose kind is already known.
///
/// Files get their size, timestamps and extension; directories get
/// timestamps only (their size comes from aggregation).
pub fn probe_entry(
    path: &Path,
    name: CompactString,
    is_dir: bool,
    owners: &OwnerResolver,
) -> FileNode {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) => {
            trace!("metadata unavailable for {}: {err}", path.display());
            return FileNode::new_error(name, is_dir, None);
        }
    };

    let mut node = if is_dir {
        FileNode::new_dir(name, None)
    } else {
        FileNode::new_file(name, meta.len(), None)
    };
    node.created = meta.created().ok();
    node.modified = meta.modified().ok();
    node.owner = owners.resolve(path, &meta);
    node
}
