/// Phase 2: materialise the node tree, one directory listing at a time.
///
/// Depth-first with an explicit stack so deep trees cannot overflow the
/// thread stack. Each directory is listed in one `read_dir` pass, every
/// entry is probed into a node, the nodes are linked under the directory,
/// and only then are the subdirectories visited.
///
/// # Parallel probing
///
/// Listing is cheap; the per-entry `symlink_metadata` and owner lookup are
/// the expensive syscalls. Directories with at least
/// `ScanOptions::parallel_probe_threshold` entries are probed on rayon's
/// pool. Results come back in listing order and are linked sequentially, so
/// the tree is identical to a sequential probe.
///
/// Directory sizes are left at zero; aggregation is a separate phase.
use super::probe::probe_entry;
use super::progress::Cancelled;
use super::ScanOptions;
use crate::model::{FileNode, FileTree, NodeIndex};
use crate::platform::OwnerResolver;
use compact_str::CompactString;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::debug;

/// One listed entry awaiting its metadata probe.
struct ListedEntry {
    path: PathBuf,
    name: CompactString,
    is_dir: bool,
}

/// Walk `root` and build its tree.
///
/// `root_node` is the already-probed root; `estimated_nodes` (the census
/// total) pre-sizes the arena. `on_progress` receives the running number of
/// discovered entries after each directory listing. Returns
/// `Err(Cancelled)` if the flag is raised; it is polled before every
/// listing and the partial tree is dropped.
pub fn build_tree(
    root: &Path,
    root_node: FileNode,
    estimated_nodes: u64,
    options: &ScanOptions,
    cancel_flag: &AtomicBool,
    mut on_progress: impl FnMut(u64),
) -> Result<FileTree, Cancelled> {
    let start = Instant::now();
    let owners = OwnerResolver::new(options.resolve_owners);

    let capacity = usize::try_from(estimated_nodes.saturating_add(1)).unwrap_or(usize::MAX);
    let mut tree = FileTree::with_capacity(root.to_path_buf(), root_node, capacity);

    let mut stack: Vec<(NodeIndex, PathBuf)> = vec![(tree.root(), root.to_path_buf())];
    let mut discovered: u64 = 0;
    let mut unreadable_dirs: u64 = 0;

    while let Some((dir_idx, dir_path)) = stack.pop() {
        if cancel_flag.load(Ordering::Relaxed) {
            debug!("build cancelled after {discovered} entries");
            return Err(Cancelled);
        }

        let listed = match list_directory(&dir_path) {
            Some(listed) => listed,
            None => {
                unreadable_dirs += 1;
                continue;
            }
        };

        let nodes: Vec<FileNode> = if listed.len() >= options.parallel_probe_threshold {
            listed
                .par_iter()
                .map(|entry| {
                    probe_entry(&entry.path, entry.name.clone(), entry.is_dir, &owners)
                })
                .collect()
        } else {
            listed
                .iter()
                .map(|entry| {
                    probe_entry(&entry.path, entry.name.clone(), entry.is_dir, &owners)
                })
                .collect()
        };

        let mut subdirs: Vec<(NodeIndex, PathBuf)> = Vec::new();
        for (entry, mut node) in listed.into_iter().zip(nodes) {
            node.parent = Some(dir_idx);
            let idx = tree.add_node(node);
            tree.add_child(dir_idx, idx);
            if entry.is_dir {
                subdirs.push((idx, entry.path));
            }
            discovered += 1;
        }
        on_progress(discovered);

        // Reverse so the first-listed subdirectory is visited first.
        stack.extend(subdirs.into_iter().rev());
    }

    tree.discovered = discovered;
    debug!(
        "build of {} complete: {discovered} entries, {unreadable_dirs} unreadable directories in {:?}",
        root.display(),
        start.elapsed()
    );
    Ok(tree)
}

/// List a directory's immediate entries.
///
/// Returns `None` when the directory cannot be opened. An error part-way
/// through the listing keeps the entries read so far.
fn list_directory(dir: &Path) -> Option<Vec<ListedEntry>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(err) => {
            debug!("skipping unreadable directory {}: {err}", dir.display());
            return None;
        }
    };

    let mut listed = Vec::new();
    for entry in read_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!("listing of {} cut short: {err}", dir.display());
                break;
            }
        };
        // The entry's own type: symbolic links are leaves, never followed.
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        listed.push(ListedEntry {
            path: entry.path(),
            name: CompactString::new(entry.file_name().to_string_lossy()),
            is_dir,
        });
    }
    Some(listed)
}
