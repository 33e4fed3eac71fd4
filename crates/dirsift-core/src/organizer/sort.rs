/// Column ordering for a node's visible children.
use super::ParseViewError;
use crate::model::{FileTree, NodeIndex};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Name,
    Size,
    Created,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// A column plus direction, remembered per node and re-applied after
/// filtering or grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    /// Compare two nodes under this key.
    ///
    /// Names compare case-insensitively, sizes numerically, dates
    /// chronologically with missing dates first. Ties always break
    /// ascending on the raw name and then the arena index, which among
    /// siblings is the same as ordering by path.
    pub fn compare(&self, tree: &FileTree, a: NodeIndex, b: NodeIndex) -> Ordering {
        let (x, y) = (tree.node(a), tree.node(b));
        let primary = match self.column {
            SortColumn::Name => x
                .name
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(y.name.chars().flat_map(char::to_lowercase)),
            SortColumn::Size => x.size.cmp(&y.size),
            SortColumn::Created => x.created.cmp(&y.created),
            SortColumn::Modified => x.modified.cmp(&y.modified),
        };
        let primary = match self.direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        primary.then_with(|| x.name.cmp(&y.name)).then(a.cmp(&b))
    }

    /// Sort `members` in place.
    pub(crate) fn sort(&self, tree: &FileTree, members: &mut [NodeIndex]) {
        members.sort_by(|&a, &b| self.compare(tree, a, b));
    }
}

impl FromStr for SortColumn {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "size" => Ok(Self::Size),
            "created" | "creation date" => Ok(Self::Created),
            "modified" | "change date" => Ok(Self::Modified),
            _ => Err(ParseViewError::UnknownSortColumn(s.to_string())),
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Size => "size",
            Self::Created => "created",
            Self::Modified => "modified",
        })
    }
}

impl FromStr for SortDirection {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(ParseViewError::UnknownSortDirection(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileNode;
    use compact_str::CompactString;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    fn tree_of(files: &[(&str, u64)]) -> (FileTree, Vec<NodeIndex>) {
        let mut tree = FileTree::with_capacity(
            PathBuf::from("/t"),
            FileNode::new_dir(CompactString::new("t"), None),
            files.len() + 1,
        );
        let root = tree.root();
        let indices = files
            .iter()
            .map(|&(name, size)| {
                let idx = tree.add_node(FileNode::new_file(
                    CompactString::new(name),
                    size,
                    Some(root),
                ));
                tree.add_child(root, idx);
                idx
            })
            .collect();
        (tree, indices)
    }

    fn names(tree: &FileTree, order: &[NodeIndex]) -> Vec<String> {
        order.iter().map(|&i| tree.node(i).name.to_string()).collect()
    }

    #[test]
    fn name_sort_ignores_case() {
        let (tree, mut idx) = tree_of(&[("beta", 0), ("Alpha", 0), ("gamma", 0)]);
        SortKey::new(SortColumn::Name, SortDirection::Ascending).sort(&tree, &mut idx);
        assert_eq!(names(&tree, &idx), ["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn size_sort_descending() {
        let (tree, mut idx) = tree_of(&[("b", 50), ("a", 100), ("c", 25)]);
        SortKey::new(SortColumn::Size, SortDirection::Descending).sort(&tree, &mut idx);
        assert_eq!(names(&tree, &idx), ["a", "b", "c"]);
    }

    #[test]
    fn ties_break_ascending_by_name_in_both_directions() {
        let (tree, idx) = tree_of(&[("b", 10), ("a", 10), ("c", 10)]);
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let mut order = idx.clone();
            SortKey::new(SortColumn::Size, direction).sort(&tree, &mut order);
            assert_eq!(names(&tree, &order), ["a", "b", "c"]);
        }
    }

    #[test]
    fn case_only_name_ties_are_deterministic() {
        let (tree, mut idx) = tree_of(&[("readme", 0), ("README", 0)]);
        SortKey::new(SortColumn::Name, SortDirection::Ascending).sort(&tree, &mut idx);
        assert_eq!(names(&tree, &idx), ["README", "readme"]);
    }

    #[test]
    fn missing_dates_sort_first() {
        let (mut tree, mut idx) = tree_of(&[("old", 0), ("new", 0), ("unknown", 0)]);
        let now = SystemTime::now();
        tree.node_mut(idx[0]).modified = Some(now - Duration::from_secs(3600));
        tree.node_mut(idx[1]).modified = Some(now);
        SortKey::new(SortColumn::Modified, SortDirection::Ascending).sort(&tree, &mut idx);
        assert_eq!(names(&tree, &idx), ["unknown", "old", "new"]);
    }

    #[test]
    fn parses_columns_and_directions() {
        assert_eq!("Size".parse::<SortColumn>().unwrap(), SortColumn::Size);
        assert_eq!(
            "change date".parse::<SortColumn>().unwrap(),
            SortColumn::Modified
        );
        assert!("colour".parse::<SortColumn>().is_err());
        assert_eq!(
            "asc".parse::<SortDirection>().unwrap(),
            SortDirection::Ascending
        );
    }
}
