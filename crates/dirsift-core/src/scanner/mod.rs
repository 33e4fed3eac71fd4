/// Scanner module: orchestrates the three scan phases.
///
/// - **Census** ([`census`]): count entries for the progress denominator.
/// - **Build** ([`builder`]): walk the root and materialise the node tree.
/// - **Aggregate** ([`aggregate`]): fold file sizes into directories.
///
/// [`ScanController`] runs the phases in order on one background thread.
/// The tree is owned by whichever phase is running and moves to the shell
/// inside [`ScanEvent::AggregateDone`]; the shell never sees it mid-scan,
/// so no lock guards it.
pub mod aggregate;
pub mod builder;
pub mod census;
pub mod probe;
pub mod progress;

pub use progress::{Cancelled, ScanEvent, ScanSnapshot, ScanState};

use crate::model::root_display_name;
use crate::platform::OwnerResolver;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info};

/// Maximum number of events that may queue up in the channel.
///
/// Progress events are dropped once the channel is nearly full, so a slow
/// or absent reader never stalls the scan. The last
/// [`MILESTONE_RESERVE`] slots are kept for phase-completion and terminal
/// events, which therefore always fit and never block.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Slots held back from progress events. A scan sends at most three
/// milestones (`CensusDone`, `BuildDone`, then `AggregateDone` or
/// `Cancelled`).
pub const MILESTONE_RESERVE: usize = 8;

/// Directories with at least this many entries are probed in parallel.
pub const DEFAULT_PARALLEL_PROBE_THRESHOLD: usize = 64;

/// Tunables for one scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Look up the owning account of every entry. When disabled owners are
    /// left empty, which is noticeably faster on Windows.
    pub resolve_owners: bool,
    /// Minimum entries in one directory before metadata probing fans out
    /// over rayon. `usize::MAX` keeps probing sequential.
    pub parallel_probe_threshold: usize,
    /// Worker threads for the census walker.
    pub census_threads: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            resolve_owners: true,
            parallel_probe_threshold: DEFAULT_PARALLEL_PROBE_THRESHOLD,
            census_threads: num_cpus::get(),
        }
    }
}

/// Reasons a scan cannot start.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("path does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("scan already started")]
    AlreadyStarted,

    #[error("failed to spawn scanner thread: {0}")]
    Spawn(#[source] io::Error),
}

/// State shared between the controller and its scan thread.
#[derive(Debug)]
struct ScanStatus {
    state: Mutex<ScanState>,
    processed: AtomicU64,
    total: AtomicU64,
    cancel_flag: AtomicBool,
}

impl ScanStatus {
    fn new() -> Self {
        Self {
            state: Mutex::new(ScanState::Idle),
            processed: AtomicU64::new(0),
            total: AtomicU64::new(0),
            cancel_flag: AtomicBool::new(false),
        }
    }

    /// Move to the next phase. Phases never re-enter or skip.
    fn advance(&self, next: ScanState) {
        let mut state = self.state.lock();
        debug_assert_eq!(
            state.next(),
            Some(next),
            "illegal transition from {:?}",
            *state
        );
        *state = next;
        if next.is_running() {
            self.processed.store(0, Ordering::Relaxed);
        }
    }

    fn finish(&self, terminal: ScanState) {
        *self.state.lock() = terminal;
    }

    fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
            state: *self.state.lock(),
        }
    }
}

/// Drives one scan of one root path.
///
/// ```ignore
/// let mut scan = ScanController::new(path, ScanOptions::default());
/// scan.start()?;
/// for event in scan.events().iter() { /* ... */ }
/// ```
pub struct ScanController {
    root_path: PathBuf,
    options: ScanOptions,
    status: Arc<ScanStatus>,
    events_tx: Option<Sender<ScanEvent>>,
    events_rx: Receiver<ScanEvent>,
    _thread: Option<thread::JoinHandle<()>>,
}

impl ScanController {
    /// Create an idle controller for `root_path`.
    pub fn new(root_path: PathBuf, options: ScanOptions) -> Self {
        let (events_tx, events_rx) =
            crossbeam_channel::bounded::<ScanEvent>(PROGRESS_CHANNEL_CAPACITY);
        Self {
            root_path,
            options,
            status: Arc::new(ScanStatus::new()),
            events_tx: Some(events_tx),
            events_rx,
            _thread: None,
        }
    }

    /// Validate the root and start the scan on a background thread.
    ///
    /// An invalid root moves the controller to [`ScanState::Failed`] and no
    /// phase runs.
    pub fn start(&mut self) -> Result<(), ScanError> {
        if self.state() != ScanState::Idle {
            return Err(ScanError::AlreadyStarted);
        }
        if let Err(err) = validate_root(&self.root_path) {
            self.status.finish(ScanState::Failed);
            return Err(err);
        }
        let Some(events_tx) = self.events_tx.take() else {
            return Err(ScanError::AlreadyStarted);
        };

        let root_path = self.root_path.clone();
        let options = self.options.clone();
        let status = self.status.clone();

        let spawned = thread::Builder::new()
            .name("dirsift-scanner".into())
            .spawn(move || run_scan(root_path, options, status, events_tx));

        match spawned {
            Ok(handle) => {
                self._thread = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.status.finish(ScanState::Failed);
                Err(ScanError::Spawn(err))
            }
        }
    }

    /// Events from the scan thread. Disconnects after the terminal event.
    pub fn events(&self) -> &Receiver<ScanEvent> {
        &self.events_rx
    }

    /// Request the scan to stop as soon as possible. Never blocks.
    pub fn cancel(&self) {
        self.status.cancel_flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.status.cancel_flag.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> ScanState {
        *self.status.state.lock()
    }

    /// Current `(processed, total, state)`.
    pub fn progress(&self) -> ScanSnapshot {
        self.status.snapshot()
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        // Nobody can receive the tree any more; stop walking.
        if !self.state().is_terminal() {
            self.cancel();
        }
    }
}

fn validate_root(root: &Path) -> Result<(), ScanError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ScanError::NotADirectory(root.to_path_buf())),
        Err(_) => Err(ScanError::RootNotFound(root.to_path_buf())),
    }
}

/// Body of the scan thread: census, build, aggregate, hand off.
fn run_scan(
    root_path: PathBuf,
    options: ScanOptions,
    status: Arc<ScanStatus>,
    events_tx: Sender<ScanEvent>,
) {
    let start = Instant::now();
    info!("Starting scan of {}", root_path.display());

    // ── Census ──────────────────────────────────────────
    status.advance(ScanState::Counting);
    let counted = census::count_entries(
        &root_path,
        options.census_threads,
        &status.cancel_flag,
        |count| {
            status.processed.store(count, Ordering::Relaxed);
            send_progress(&events_tx, ScanEvent::CensusProgress { count });
        },
    );
    let Ok(total) = counted else {
        return finish_cancelled(&status, &events_tx);
    };
    status.total.store(total, Ordering::Relaxed);
    let _ = events_tx.send(ScanEvent::CensusDone { total });
    debug!("Census complete: {total} entries in {:?}", start.elapsed());

    // ── Build ───────────────────────────────────────────
    status.advance(ScanState::Building);
    let owners = OwnerResolver::new(options.resolve_owners);
    let root_node = probe::probe_entry(&root_path, root_display_name(&root_path), true, &owners);
    let built = builder::build_tree(
        &root_path,
        root_node,
        total,
        &options,
        &status.cancel_flag,
        |count| {
            status.processed.store(count, Ordering::Relaxed);
            send_progress(&events_tx, ScanEvent::BuildProgress { count, total });
        },
    );
    let Ok(mut tree) = built else {
        return finish_cancelled(&status, &events_tx);
    };
    let _ = events_tx.send(ScanEvent::BuildDone {
        root: tree.root(),
        discovered: tree.discovered,
        total,
    });
    if tree.discovered != total {
        debug!(
            "Discovered {} entries, census expected {total}; keeping census total",
            tree.discovered
        );
    }

    // ── Aggregate ───────────────────────────────────────
    status.advance(ScanState::Aggregating);
    let aggregated = aggregate::aggregate_sizes(&mut tree, &status.cancel_flag, |count| {
        status.processed.store(count, Ordering::Relaxed);
        send_progress(&events_tx, ScanEvent::AggregateProgress { count, total });
    });
    if aggregated.is_err() {
        return finish_cancelled(&status, &events_tx);
    }

    let duration = start.elapsed();
    info!(
        "Scan of {} complete: {} entries, {} bytes in {duration:?}",
        root_path.display(),
        tree.discovered,
        tree.total_size
    );
    status.advance(ScanState::Ready);
    let _ = events_tx.send(ScanEvent::AggregateDone { tree, duration });
}

/// Queue a progress event unless it would eat into the milestone reserve.
fn send_progress(events_tx: &Sender<ScanEvent>, event: ScanEvent) {
    if events_tx.len() + MILESTONE_RESERVE < PROGRESS_CHANNEL_CAPACITY {
        let _ = events_tx.try_send(event);
    }
}

fn finish_cancelled(status: &ScanStatus, events_tx: &Sender<ScanEvent>) {
    info!("Scan cancelled");
    status.finish(ScanState::Cancelled);
    let _ = events_tx.send(ScanEvent::Cancelled);
}
