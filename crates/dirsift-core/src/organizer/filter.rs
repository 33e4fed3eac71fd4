/// Extension filters over a node's children.
use super::ParseViewError;
use crate::model::FileNode;
use compact_str::CompactString;
use std::fmt;
use std::str::FromStr;

/// Which children stay visible. Only one filter is active per node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    /// Show every child.
    #[default]
    None,
    /// Show directories only.
    Folders,
    /// Show children whose extension matches (`.txt`, or the
    /// protected-file sentinel).
    Extension(CompactString),
}

impl Filter {
    /// Extension filter; the value is lowercased to match stored extensions.
    pub fn extension(ext: &str) -> Self {
        Self::Extension(CompactString::new(ext.to_lowercase()))
    }

    /// `true` if `node` stays visible under this filter.
    pub fn matches(&self, node: &FileNode) -> bool {
        match self {
            Self::None => true,
            Self::Folders => node.is_dir,
            Self::Extension(ext) => node.extension == *ext,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("no filter"),
            Self::Folders => f.write_str("folders"),
            Self::Extension(ext) => f.write_str(ext),
        }
    }
}

impl FromStr for Filter {
    type Err = ParseViewError;

    /// `"no filter"`, `"folders"`, or an extension.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "" => Err(ParseViewError::EmptyFilter),
            "no filter" | "none" => Ok(Self::None),
            "folders" => Ok(Self::Folders),
            _ => Ok(Self::extension(trimmed)),
        }
    }
}
