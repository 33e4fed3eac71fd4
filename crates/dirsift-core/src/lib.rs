/// dirsift core: scanning, size aggregation and view organizing.
///
/// This crate contains all business logic with zero UI dependencies.
/// A frontend drives a [`scanner::ScanController`], receives the finished
/// tree in the final event, and hands it to an
/// [`organizer::ViewOrganizer`] to filter, group and sort folder listings.
///
/// # Modules
///
/// - [`model`]: Arena-allocated file tree and display formatting.
/// - [`scanner`]: Three-phase background scan with progress reporting.
/// - [`organizer`]: Per-folder filter, grouping and sort overlay.
/// - [`platform`]: Owner account lookup for Unix and Windows.
pub mod model;
pub mod organizer;
pub mod platform;
pub mod scanner;
