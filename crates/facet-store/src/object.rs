use serde::{Deserialize, Serialize};

use facet_types::{ObjectId, PathComponent};

/// The kind of object a tree entry points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeEntryKind {
    /// Normal file content.
    Regular,
    /// Executable file content.
    Executable,
    /// Symbolic link target.
    Symlink,
    /// A subtree.
    Tree,
}

impl TreeEntryKind {
    /// Returns `true` for subtree entries.
    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Tree)
    }
}

impl std::fmt::Display for TreeEntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Regular => write!(f, "regular"),
            Self::Executable => write!(f, "executable"),
            Self::Symlink => write!(f, "symlink"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

/// A single entry in a tree: the referenced object and its kind.
///
/// The entry's name is the key of the containing [`Tree`], not part of the
/// entry itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Id of the referenced object.
    pub id: ObjectId,
    /// Kind of the referenced object.
    pub kind: TreeEntryKind,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(id: ObjectId, kind: TreeEntryKind) -> Self {
        Self { id, kind }
    }
}

/// Whether names within a tree are matched case-sensitively.
///
/// The attribute comes from the inner repository and is preserved through
/// every transformation, including trees whose entries were all filtered out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

/// Directory listing: a sorted mapping from entry name to [`TreeEntry`].
///
/// Trees are immutable once produced. Entries are kept sorted by name for
/// deterministic iteration; lookups honor the case-sensitivity attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    case_sensitivity: CaseSensitivity,
    entries: Vec<(PathComponent, TreeEntry)>,
}

impl Tree {
    /// Create a tree with the given entries.
    ///
    /// Entries are sorted by name for deterministic iteration.
    pub fn new(mut entries: Vec<(PathComponent, TreeEntry)>, case_sensitivity: CaseSensitivity) -> Self {
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        Self {
            case_sensitivity,
            entries,
        }
    }

    /// Create an empty tree.
    pub fn empty(case_sensitivity: CaseSensitivity) -> Self {
        Self {
            case_sensitivity,
            entries: Vec::new(),
        }
    }

    /// Look up an entry by name, honoring the case-sensitivity attribute.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        match self.case_sensitivity {
            CaseSensitivity::Sensitive => self
                .entries
                .iter()
                .find(|(entry_name, _)| entry_name.as_str() == name),
            CaseSensitivity::Insensitive => self
                .entries
                .iter()
                .find(|(entry_name, _)| entry_name.as_str().eq_ignore_ascii_case(name)),
        }
        .map(|(_, entry)| entry)
    }

    /// Iterate over `(name, entry)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathComponent, &TreeEntry)> {
        self.entries.iter().map(|(name, entry)| (name, entry))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The case-sensitivity attribute of this tree.
    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case_sensitivity
    }
}

/// Raw content object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Size of the content in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Compute the metadata for this blob.
    pub fn metadata(&self) -> BlobMetadata {
        BlobMetadata {
            size: self.size(),
            content_hash: *blake3::hash(&self.data).as_bytes(),
        }
    }
}

/// Size and content hash of a blob, fetchable without the content itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    /// Content size in bytes.
    pub size: u64,
    /// BLAKE3 hash of the content.
    pub content_hash: [u8; 32],
}
