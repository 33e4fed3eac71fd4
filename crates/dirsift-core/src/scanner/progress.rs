/// Scan progress reporting: lightweight messages sent from the scan
/// thread to the shell via a crossbeam channel, plus the controller's
/// state machine.
use crate::model::{FileTree, NodeIndex};
use std::time::Duration;

/// Returned by a phase that stopped because cancellation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("scan cancelled")]
pub struct Cancelled;

/// Lifecycle of one scan.
///
/// Phases advance strictly in declaration order; `Cancelled` and `Failed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanState {
    Idle,
    Counting,
    Building,
    Aggregating,
    Ready,
    Cancelled,
    Failed,
}

impl ScanState {
    /// The phase that follows this one on the normal path.
    pub fn next(self) -> Option<ScanState> {
        match self {
            Self::Idle => Some(Self::Counting),
            Self::Counting => Some(Self::Building),
            Self::Building => Some(Self::Aggregating),
            Self::Aggregating => Some(Self::Ready),
            Self::Ready | Self::Cancelled | Self::Failed => None,
        }
    }

    /// `true` once no further transition can happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Cancelled | Self::Failed)
    }

    /// `true` while a phase owns the tree.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Counting | Self::Building | Self::Aggregating)
    }

    /// Human-readable label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Counting => "counting entries",
            Self::Building => "building tree",
            Self::Aggregating => "computing sizes",
            Self::Ready => "ready",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

/// Polling view of a scan: `(processed, total, state)`.
///
/// `total` is zero until the census finishes, then frozen at its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSnapshot {
    pub processed: u64,
    pub total: u64,
    pub state: ScanState,
}

impl ScanSnapshot {
    /// Completion percentage of the current phase, clamped to 100.
    ///
    /// The census total is an estimate, so `processed` may overshoot it.
    pub fn percent(&self) -> u8 {
        self.processed
            .saturating_mul(100)
            .checked_div(self.total)
            .map_or(0, |p| p.min(100) as u8)
    }
}

/// Events sent from the scan thread to the shell.
#[derive(Debug)]
pub enum ScanEvent {
    /// Running count of entries seen by the census.
    CensusProgress { count: u64 },
    /// Census finished; `total` becomes the denominator for later phases.
    CensusDone { total: u64 },
    /// Running count of nodes materialised by the builder.
    BuildProgress { count: u64, total: u64 },
    /// The tree structure is complete (directory sizes still zero).
    BuildDone {
        root: NodeIndex,
        discovered: u64,
        total: u64,
    },
    /// Running count of entries folded into directory sizes.
    AggregateProgress { count: u64, total: u64 },
    /// Scan finished; ownership of the tree passes to the receiver.
    AggregateDone { tree: FileTree, duration: Duration },
    /// Scan was cancelled; any partial tree has been discarded.
    Cancelled,
}

impl ScanEvent {
    /// `true` for events after which the scan thread sends nothing more.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AggregateDone { .. } | Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_advance_in_order() {
        let mut state = ScanState::Idle;
        let mut seen = vec![state];
        while let Some(next) = state.next() {
            state = next;
            seen.push(state);
        }
        assert_eq!(
            seen,
            vec![
                ScanState::Idle,
                ScanState::Counting,
                ScanState::Building,
                ScanState::Aggregating,
                ScanState::Ready,
            ]
        );
        assert!(ScanState::Ready.is_terminal());
    }

    #[test]
    fn terminal_states_have_no_successor() {
        assert_eq!(ScanState::Cancelled.next(), None);
        assert_eq!(ScanState::Failed.next(), None);
        assert!(!ScanState::Failed.is_running());
    }

    #[test]
    fn percent_is_clamped_when_census_undercounts() {
        let snapshot = ScanSnapshot {
            processed: 12,
            total: 10,
            state: ScanState::Building,
        };
        assert_eq!(snapshot.percent(), 100);
    }

    #[test]
    fn percent_before_census_is_zero() {
        let snapshot = ScanSnapshot {
            processed: 5,
            total: 0,
            state: ScanState::Counting,
        };
        assert_eq!(snapshot.percent(), 0);
    }

    #[test]
    fn running_phases_have_distinct_labels() {
        let labels = [ScanState::Building.label(), ScanState::Aggregating.label()];
        assert_eq!(labels, ["building tree", "computing sizes"]);
        assert_eq!(ScanState::Counting.label(), "counting entries");
    }
}
