//! dirsift: scan a folder, total its sizes and list its contents.
//!
//! Thin binary entry point. All logic lives in the `dirsift-core` crate.

use anyhow::{bail, Context};
use clap::Parser;
use dirsift_core::model::format::{format_count, format_size};
use dirsift_core::model::FileTree;
use dirsift_core::organizer::{
    Filter, Grouping, SortColumn, SortDirection, SortKey, ViewOrganizer, ViewRow,
};
use dirsift_core::scanner::{ScanController, ScanEvent, ScanOptions};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dirsift", version, about)]
struct Cli {
    /// Folder to scan.
    path: PathBuf,

    /// Group entries by name, size, extension, owner, created or modified.
    #[arg(long)]
    group: Option<Grouping>,

    /// Show only folders, or only files with this extension (e.g. `.txt`).
    #[arg(long)]
    filter: Option<Filter>,

    /// Sort column: name, size, created or modified.
    #[arg(long, default_value = "size")]
    sort: SortColumn,

    /// Sort ascending instead of descending.
    #[arg(long)]
    ascending: bool,

    /// Print rows as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Skip owner lookups.
    #[arg(long)]
    no_owners: bool,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for the listing.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let options = ScanOptions {
        resolve_owners: !cli.no_owners,
        ..ScanOptions::default()
    };
    let mut scan = ScanController::new(cli.path.clone(), options);
    scan.start()
        .with_context(|| format!("cannot scan {}", cli.path.display()))?;
    let tree = wait_for_tree(&scan)?;

    let mut organizer = ViewOrganizer::new(tree);
    let root = organizer.tree().root();
    if let Some(filter) = cli.filter {
        organizer.filter(root, filter);
    }
    if let Some(grouping) = cli.group {
        organizer.group(root, grouping);
    }
    let direction = if cli.ascending {
        SortDirection::Ascending
    } else {
        SortDirection::Descending
    };
    organizer.sort(root, SortKey::new(cli.sort, direction));

    let rows = organizer.rows(root);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut out, &rows).context("failed to write JSON")?;
        writeln!(out)?;
    } else {
        let tree = organizer.tree();
        writeln!(
            out,
            "{}  {}  ({} entries)",
            tree.root_path().display(),
            format_size(tree.total_size),
            format_count(tree.discovered)
        )?;
        print_table(&mut out, &rows)?;
    }
    Ok(())
}

/// Drain scan events, drawing a one-line progress indicator on stderr,
/// until the tree arrives.
fn wait_for_tree(scan: &ScanController) -> anyhow::Result<FileTree> {
    let mut err = io::stderr();
    for event in scan.events().iter() {
        match event {
            ScanEvent::CensusProgress { count } => {
                let _ = write!(err, "\rcounting... {}", format_count(count));
            }
            ScanEvent::BuildProgress { .. } | ScanEvent::AggregateProgress { .. } => {
                let snapshot = scan.progress();
                let _ = write!(
                    err,
                    "\r{}... {} / {} ({}%)      ",
                    snapshot.state.label(),
                    format_count(snapshot.processed),
                    format_count(snapshot.total),
                    snapshot.percent()
                );
            }
            ScanEvent::CensusDone { .. } | ScanEvent::BuildDone { .. } => {}
            ScanEvent::AggregateDone { tree, duration } => {
                let _ = writeln!(err);
                tracing::info!("scanned in {duration:.2?}");
                return Ok(tree);
            }
            ScanEvent::Cancelled => {
                let _ = writeln!(err);
                bail!("scan cancelled");
            }
        }
        let _ = err.flush();
    }
    bail!("scanner stopped without a result")
}

fn print_table(out: &mut impl Write, rows: &[ViewRow]) -> io::Result<()> {
    for row in rows {
        let indent = "  ".repeat(row.depth as usize);
        if row.is_bucket {
            writeln!(out, "{indent}[{}] ({})", row.name, row.members.unwrap_or(0))?;
            continue;
        }
        let name = if row.is_dir {
            format!("{}/", row.name)
        } else {
            row.name.clone()
        };
        writeln!(
            out,
            "{indent}{name:<40} {:>10} {:>6.1}%  {}  {}",
            row.size_display,
            row.percent_of_parent.unwrap_or(0.0),
            row.modified,
            row.owner
        )?;
    }
    Ok(())
}
