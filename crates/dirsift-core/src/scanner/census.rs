/// Phase 1: count every entry under the root to size the progress bar.
///
/// The count is advisory. Directories that cannot be listed count as a
/// single entry and the listing error is swallowed; a tree that changes
/// between census and build simply makes the estimate wrong.
///
/// Listing runs on `jwalk`'s rayon-backed parallel walker. Only the totals
/// matter here, so the nondeterministic yield order is irrelevant.
use super::progress::Cancelled;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Count all files and directories reachable from `root`, root excluded.
///
/// `on_progress` receives the running count once per directory visited and
/// once more with the final total. Returns `Err(Cancelled)` if the flag is
/// raised; it is polled between directories.
pub fn count_entries(
    root: &Path,
    threads: usize,
    cancel_flag: &AtomicBool,
    mut on_progress: impl FnMut(u64),
) -> Result<u64, Cancelled> {
    let walker = jwalk::WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .parallelism(jwalk::Parallelism::RayonNewPool(threads.max(1)));

    let mut count: u64 = 0;
    let mut unreadable: u64 = 0;

    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                // Unlistable directory: already counted when its parent was
                // listed, contributes nothing further.
                unreadable += 1;
                debug!("census skipped unreadable entry: {err}");
                continue;
            }
        };

        let is_dir = entry.file_type().is_dir();
        if entry.depth > 0 {
            count += 1;
        }
        if is_dir {
            if cancel_flag.load(Ordering::Relaxed) {
                return Err(Cancelled);
            }
            on_progress(count);
        }
    }

    debug!(
        "census of {} found {count} entries ({unreadable} unreadable)",
        root.display()
    );
    on_progress(count);
    Ok(count)
}
