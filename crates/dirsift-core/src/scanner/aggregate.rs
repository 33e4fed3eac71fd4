/// Phase 3: fold file sizes into their ancestor directories.
///
/// The builder inserts every node after its parent, so iterating the arena
/// in *reverse* visits all of a directory's descendants before the directory
/// itself. By the time a directory is reached its size is final and can be
/// handed up to its parent. O(n), no recursion, no stack.
///
/// Directory sizes are reset before each pass, so re-running on an
/// unchanged tree produces the same sizes instead of doubling them.
use super::progress::Cancelled;
use crate::model::{FileTree, NodeIndex};
use std::sync::atomic::{AtomicBool, Ordering};

/// Compute directory sizes, percentages and the tree total.
///
/// Each non-empty directory advances the processed count by its child
/// count and reports it through `on_progress`; empty directories are a
/// no-op. On a complete tree the final count equals `tree.discovered`.
/// Returns `Err(Cancelled)` if the flag is raised (polled before each
/// directory), leaving sizes partially summed.
pub fn aggregate_sizes(
    tree: &mut FileTree,
    cancel_flag: &AtomicBool,
    mut on_progress: impl FnMut(u64),
) -> Result<u64, Cancelled> {
    tree.reset_directory_sizes();

    let mut processed: u64 = 0;

    // Reverse pass: children before parents.
    for i in (0..tree.len()).rev() {
        let index = NodeIndex::new(i);
        if tree.nodes[i].is_dir {
            if cancel_flag.load(Ordering::Relaxed) {
                return Err(Cancelled);
            }
            if tree.nodes[i].first_child.is_some() {
                processed += tree.child_iter(index).count() as u64;
                on_progress(processed);
            }
        }

        let size = tree.nodes[i].size;
        if let Some(parent) = tree.nodes[i].parent {
            tree.nodes[parent.idx()].size += size;
        }
    }

    // Share of the parent's size; the root uses its own size.
    for i in 0..tree.len() {
        let parent_size = tree.nodes[i]
            .parent
            .map(|p| tree.nodes[p.idx()].size)
            .unwrap_or(tree.nodes[i].size);

        tree.nodes[i].percent_of_parent = if parent_size > 0 {
            (tree.nodes[i].size as f64 / parent_size as f64 * 100.0) as f32
        } else {
            0.0
        };
    }

    tree.total_size = tree.node(tree.root()).size;
    Ok(processed)
}
