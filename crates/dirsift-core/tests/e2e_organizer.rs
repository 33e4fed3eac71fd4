/// Scan a real directory, then organize its listing.
use dirsift_core::model::FileTree;
use dirsift_core::organizer::{
    Filter, Grouping, SortColumn, SortDirection, SortKey, ViewEntry, ViewOrganizer,
};
use dirsift_core::scanner::{ScanController, ScanEvent, ScanOptions};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// `data/` with a.txt (100), b.txt (50) and sub/c.txt (25).
fn build_data_dir(root: &Path) {
    fs::write(root.join("a.txt"), vec![0u8; 100]).unwrap();
    fs::write(root.join("b.txt"), vec![0u8; 50]).unwrap();
    fs::create_dir(root.join("sub")).unwrap();
    fs::write(root.join("sub").join("c.txt"), vec![0u8; 25]).unwrap();
}

fn scan(root: &Path) -> FileTree {
    let mut scan = ScanController::new(
        root.to_path_buf(),
        ScanOptions {
            resolve_owners: false,
            ..ScanOptions::default()
        },
    );
    scan.start().unwrap();
    loop {
        match scan.events().recv_timeout(Duration::from_secs(30)) {
            Ok(ScanEvent::AggregateDone { tree, .. }) => return tree,
            Ok(ScanEvent::Cancelled) => panic!("scan was unexpectedly cancelled"),
            Ok(_) => continue,
            Err(err) => panic!("scanner did not finish: {err}"),
        }
    }
}

fn labels(org: &ViewOrganizer, entries: &[ViewEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| match e {
            ViewEntry::Node(idx) => org.tree().node(*idx).name.to_string(),
            ViewEntry::Bucket(b) => format!("[{}]", b.label),
        })
        .collect()
}

#[test]
fn scanned_folder_sorts_by_size() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_data_dir(tmp.path());

    let mut org = ViewOrganizer::new(scan(tmp.path()));
    let root = org.tree().root();
    assert_eq!(org.tree().total_size, 175);

    let key = SortKey::new(SortColumn::Size, SortDirection::Descending);
    let order = org.sort(root, key).to_vec();
    assert_eq!(labels(&org, &order), ["a.txt", "b.txt", "sub"]);
}

#[test]
fn scanned_folder_groups_by_extension() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_data_dir(tmp.path());

    let mut org = ViewOrganizer::new(scan(tmp.path()));
    let root = org.tree().root();
    org.group(root, Grouping::Extension);
    let key = SortKey::new(SortColumn::Name, SortDirection::Ascending);
    let entries = org.sort(root, key).to_vec();

    assert_eq!(labels(&org, &entries), ["[.txt]", "[other]"]);
    let rows = org.rows(root);
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, [".txt", "a.txt", "b.txt", "other", "sub"]);
}

#[test]
fn scanned_folder_filters_folders() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_data_dir(tmp.path());

    let mut org = ViewOrganizer::new(scan(tmp.path()));
    let root = org.tree().root();
    let shown = org.filter(root, Filter::Folders).to_vec();
    assert_eq!(labels(&org, &shown), ["sub"]);

    // Organizing a subfolder leaves the root's overlay alone.
    let sub = match shown[0] {
        ViewEntry::Node(idx) => idx,
        ViewEntry::Bucket(_) => unreachable!(),
    };
    let inside = org.filter(sub, Filter::extension(".txt")).to_vec();
    assert_eq!(labels(&org, &inside), ["c.txt"]);
    assert_eq!(labels(&org, &org.visible(root)), ["sub"]);
}
