/// Bucketing of a node's visible children into labelled groups.
///
/// Fixed-range groupings (name initial, size band, date age) keep their
/// declared bucket order; value groupings (extension, owner) get one bucket
/// per distinct value in ascending order. Anything that matches no bucket
/// lands in a trailing [`OTHER_BUCKET`]. Empty buckets are never produced.
use super::ParseViewError;
use crate::model::{FileNode, FileTree, NodeIndex};
use chrono::{DateTime, Local, NaiveDate};
use compact_str::CompactString;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

/// Label of the catch-all bucket.
pub const OTHER_BUCKET: &str = "other";

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Size bands, largest first. Each is an inclusive `(label, min, max)`.
const SIZE_BANDS: [(&str, u64, u64); 7] = [
    ("huge (>10 GB)", 10 * GIB, u64::MAX),
    ("large (1-10 GB)", GIB, 10 * GIB - 1),
    ("big (257-1023 MB)", 257 * MIB, GIB - 1),
    ("medium (1-256 MB)", MIB, 257 * MIB - 1),
    ("small (16-1023 KB)", 17_404, MIB - 1),
    ("tiny (1-16 KB)", 1, 17_403),
    ("no size", 0, 0),
];

/// Name initials, inclusive character ranges over the lowercased initial.
const NAME_RANGES: [(&str, char, char); 3] =
    [("A-H", 'a', 'h'), ("I-P", 'i', 'p'), ("Q-Z", 'q', 'z')];

/// Age bands in whole days before `today`, inclusive.
const AGE_BANDS: [(&str, i64, i64); 6] = [
    ("today", 0, 0),
    ("last week", 1, 7),
    ("last month", 8, 30),
    ("this year", 31, 365),
    ("last year", 366, 730),
    ("older", 731, i64::MAX),
];

/// The attribute children are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grouping {
    Name,
    Size,
    Extension,
    Owner,
    Created,
    Modified,
}

/// A synthetic group of sibling nodes shown under one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub label: CompactString,
    pub members: Vec<NodeIndex>,
}

impl Bucket {
    fn new(label: &str, members: Vec<NodeIndex>) -> Self {
        Self {
            label: CompactString::new(label),
            members,
        }
    }

    pub fn is_other(&self) -> bool {
        self.label == OTHER_BUCKET
    }
}

impl Grouping {
    /// Partition `members` into buckets. Each member ends up in exactly one
    /// bucket; relative order within a bucket follows `members`.
    pub fn partition(
        &self,
        tree: &FileTree,
        members: &[NodeIndex],
        today: NaiveDate,
    ) -> Vec<Bucket> {
        match self {
            Self::Name => by_ranges(tree, members, &NAME_RANGES, |node| {
                node.name.chars().next().and_then(|c| c.to_lowercase().next())
            }),
            Self::Size => by_ranges(tree, members, &SIZE_BANDS, |node| Some(node.size)),
            Self::Extension => by_value(tree, members, |node| &node.extension),
            Self::Owner => by_value(tree, members, |node| &node.owner),
            Self::Created => by_ranges(tree, members, &AGE_BANDS, |node| {
                days_before(node.created, today)
            }),
            Self::Modified => by_ranges(tree, members, &AGE_BANDS, |node| {
                days_before(node.modified, today)
            }),
        }
    }
}

/// Assign each member to the first inclusive range containing its key.
/// Members with no key, or a key outside every range, go to "other".
fn by_ranges<K: PartialOrd + Copy>(
    tree: &FileTree,
    members: &[NodeIndex],
    ranges: &[(&str, K, K)],
    key: impl Fn(&FileNode) -> Option<K>,
) -> Vec<Bucket> {
    let mut slots: Vec<Vec<NodeIndex>> = vec![Vec::new(); ranges.len()];
    let mut other = Vec::new();
    let slot_of = |k: K| ranges.iter().position(|&(_, lo, hi)| lo <= k && k <= hi);

    for &idx in members {
        match key(tree.node(idx)).and_then(slot_of) {
            Some(slot) => slots[slot].push(idx),
            None => other.push(idx),
        }
    }

    let mut buckets: Vec<Bucket> = ranges
        .iter()
        .zip(slots)
        .filter(|(_, slot)| !slot.is_empty())
        .map(|(&(label, _, _), slot)| Bucket::new(label, slot))
        .collect();
    if !other.is_empty() {
        buckets.push(Bucket::new(OTHER_BUCKET, other));
    }
    buckets
}

/// One bucket per distinct non-empty value, ordered by value.
fn by_value(
    tree: &FileTree,
    members: &[NodeIndex],
    value: impl Fn(&FileNode) -> &CompactString,
) -> Vec<Bucket> {
    let mut groups: BTreeMap<CompactString, Vec<NodeIndex>> = BTreeMap::new();
    let mut other = Vec::new();

    for &idx in members {
        let v = value(tree.node(idx));
        if v.is_empty() {
            other.push(idx);
        } else {
            groups.entry(v.clone()).or_default().push(idx);
        }
    }

    let mut buckets: Vec<Bucket> = groups
        .into_iter()
        .map(|(label, members)| Bucket { label, members })
        .collect();
    if !other.is_empty() {
        buckets.push(Bucket::new(OTHER_BUCKET, other));
    }
    buckets
}

/// Whole calendar days between the local date of `time` and `today`.
/// Future dates yield a negative count, which matches no age band.
fn days_before(time: Option<SystemTime>, today: NaiveDate) -> Option<i64> {
    let date = DateTime::<Local>::from(time?).date_naive();
    Some((today - date).num_days())
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Size => "size",
            Self::Extension => "extension",
            Self::Owner => "owner",
            Self::Created => "created",
            Self::Modified => "modified",
        })
    }
}

impl FromStr for Grouping {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "size" => Ok(Self::Size),
            "extension" | "ext" => Ok(Self::Extension),
            "owner" => Ok(Self::Owner),
            "created" | "creation date" => Ok(Self::Created),
            "modified" | "change date" => Ok(Self::Modified),
            _ => Err(ParseViewError::UnknownGrouping(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as Days, TimeZone};
    use std::path::PathBuf;

    fn tree_with(nodes: Vec<FileNode>) -> (FileTree, Vec<NodeIndex>) {
        let mut tree = FileTree::with_capacity(
            PathBuf::from("/g"),
            FileNode::new_dir(CompactString::new("g"), None),
            nodes.len() + 1,
        );
        let root = tree.root();
        let mut indices = Vec::new();
        for mut node in nodes {
            node.parent = Some(root);
            let idx = tree.add_node(node);
            tree.add_child(root, idx);
            indices.push(idx);
        }
        (tree, indices)
    }

    fn file(name: &str, size: u64) -> FileNode {
        FileNode::new_file(CompactString::new(name), size, None)
    }

    fn labels(buckets: &[Bucket]) -> Vec<&str> {
        buckets.iter().map(|b| b.label.as_str()).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    /// Local noon `days` before [`today`].
    fn days_ago(days: i64) -> Option<SystemTime> {
        let date = today() - Days::days(days);
        let noon = date.and_hms_opt(12, 0, 0).unwrap();
        Local
            .from_local_datetime(&noon)
            .single()
            .map(SystemTime::from)
    }

    #[test]
    fn name_initials_and_other() {
        let (tree, idx) = tree_with(vec![
            file("apple", 0),
            file("Kiwi", 0),
            file("zebra", 0),
            file("42.log", 0),
            file("_tmp", 0),
        ]);
        let buckets = Grouping::Name.partition(&tree, &idx, today());
        assert_eq!(labels(&buckets), ["A-H", "I-P", "Q-Z", "other"]);
        assert_eq!(buckets[3].members, vec![idx[3], idx[4]]);
    }

    #[test]
    fn size_band_boundaries() {
        let (tree, idx) = tree_with(vec![
            file("zero", 0),
            file("one", 1),
            file("tiny-max", 17_403),
            file("small-min", 17_404),
            file("medium-max", 269_484_031),
            file("big-min", 269_484_032),
            file("huge", 10 * GIB),
        ]);
        let buckets = Grouping::Size.partition(&tree, &idx, today());
        assert_eq!(
            labels(&buckets),
            [
                "huge (>10 GB)",
                "big (257-1023 MB)",
                "medium (1-256 MB)",
                "small (16-1023 KB)",
                "tiny (1-16 KB)",
                "no size"
            ]
        );
        assert_eq!(buckets[4].members, vec![idx[1], idx[2]]);
    }

    #[test]
    fn extension_buckets_are_sorted_with_trailing_other() {
        let (tree, idx) = tree_with(vec![
            file("b.txt", 0),
            file("Makefile", 0),
            file("a.rs", 0),
            file("c.txt", 0),
        ]);
        let buckets = Grouping::Extension.partition(&tree, &idx, today());
        assert_eq!(labels(&buckets), [".rs", ".txt", "other"]);
        assert_eq!(buckets[1].members, vec![idx[0], idx[3]]);
        assert!(buckets[2].is_other());
    }

    #[test]
    fn age_bands_against_fixed_today() {
        let ages = [0, 3, 15, 200, 500, 1000];
        let nodes = ages
            .iter()
            .map(|&d| {
                let mut node = file(&format!("f{d}"), 1);
                node.modified = days_ago(d);
                node
            })
            .chain(std::iter::once(file("undated", 1)))
            .collect();
        let (tree, _) = tree_with(nodes);
        let members = tree.children(tree.root());
        let buckets = Grouping::Modified.partition(&tree, &members, today());
        assert_eq!(
            labels(&buckets),
            [
                "today",
                "last week",
                "last month",
                "this year",
                "last year",
                "older",
                "other"
            ]
        );
        assert!(buckets.iter().all(|b| b.members.len() == 1));
    }

    #[test]
    fn future_dates_go_to_other() {
        let mut node = file("tomorrow", 1);
        node.created = days_ago(-1);
        let (tree, idx) = tree_with(vec![node]);
        let buckets = Grouping::Created.partition(&tree, &idx, today());
        assert_eq!(labels(&buckets), ["other"]);
    }

    #[test]
    fn every_member_lands_in_exactly_one_bucket() {
        let (tree, idx) = tree_with(vec![
            file("a.txt", 5),
            file("b", 0),
            file("Ω.txt", 20_000),
        ]);
        for grouping in [
            Grouping::Name,
            Grouping::Size,
            Grouping::Extension,
            Grouping::Owner,
        ] {
            let buckets = grouping.partition(&tree, &idx, today());
            let mut seen: Vec<NodeIndex> = buckets.into_iter().flat_map(|b| b.members).collect();
            seen.sort();
            assert_eq!(seen, idx, "{grouping}");
        }
    }

    #[test]
    fn parses_groupings() {
        assert_eq!(
            "Extension".parse::<Grouping>().unwrap(),
            Grouping::Extension
        );
        assert_eq!(
            "creation date".parse::<Grouping>().unwrap(),
            Grouping::Created
        );
        assert!("colour".parse::<Grouping>().is_err());
    }
}
