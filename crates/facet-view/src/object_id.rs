//! The composite object id carried by every object a filtered view hands out.
//!
//! A [`FilteredObjectId`] wraps an inner store's id together with everything
//! needed to re-apply the right filter on a later access. The encoded form is
//! a single tag byte followed by variant fields:
//!
//! ```text
//! blob: 0x01 <innerObjectId>
//! tree: 0x02 <pathLenVarint><path><filterLenVarint><filterId><innerObjectId>
//! ```
//!
//! Blobs carry no path or filter: blob contents are opaque bytes and are
//! never re-traversed. Trees carry the path from their containing root and
//! the filter id of the materializing view, so the same subtree can be
//! re-filtered without a side channel. Encoding is byte-deterministic: equal
//! components always produce equal bytes.

use std::fmt;

use facet_store::{StoreError, StoreResult};
use facet_types::{FilterId, ObjectId, RepoPath};

use crate::varint::{decode_varint, encode_varint};

const TYPE_BLOB: u8 = 0x01;
const TYPE_TREE: u8 = 0x02;

/// The variant of a [`FilteredObjectId`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilteredObjectType {
    Blob,
    Tree,
}

impl fmt::Display for FilteredObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

/// An object id produced by a filtered view.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FilteredObjectId {
    /// A blob reference: just the inner id.
    Blob { object: ObjectId },
    /// A tree reference: the path from the containing root, the filter the
    /// tree was materialized under, and the inner id.
    Tree {
        path: RepoPath,
        filter_id: FilterId,
        object: ObjectId,
    },
}

impl FilteredObjectId {
    /// Wrap an inner blob id.
    pub fn blob(object: ObjectId) -> Self {
        Self::Blob { object }
    }

    /// Wrap an inner tree id with its path and filter.
    pub fn tree(path: RepoPath, filter_id: FilterId, object: ObjectId) -> Self {
        Self::Tree {
            path,
            filter_id,
            object,
        }
    }

    /// The variant of this id.
    pub fn object_type(&self) -> FilteredObjectType {
        match self {
            Self::Blob { .. } => FilteredObjectType::Blob,
            Self::Tree { .. } => FilteredObjectType::Tree,
        }
    }

    /// The wrapped inner id, byte-exact as the inner store produced it.
    pub fn object(&self) -> &ObjectId {
        match self {
            Self::Blob { object } | Self::Tree { object, .. } => object,
        }
    }

    /// Consume the id, returning the wrapped inner id.
    pub fn into_object(self) -> ObjectId {
        match self {
            Self::Blob { object } | Self::Tree { object, .. } => object,
        }
    }

    /// The path from the containing root. Tree ids only.
    pub fn path(&self) -> StoreResult<&RepoPath> {
        match self {
            Self::Tree { path, .. } => Ok(path),
            Self::Blob { .. } => Err(StoreError::WrongVariant { field: "path" }),
        }
    }

    /// The filter the tree was materialized under. Tree ids only.
    pub fn filter(&self) -> StoreResult<&FilterId> {
        match self {
            Self::Tree { filter_id, .. } => Ok(filter_id),
            Self::Blob { .. } => Err(StoreError::WrongVariant { field: "filter" }),
        }
    }

    /// Encode into the opaque [`ObjectId`] handed to clients.
    pub fn to_object_id(&self) -> ObjectId {
        match self {
            Self::Blob { object } => {
                let mut buf = Vec::with_capacity(1 + object.len());
                buf.push(TYPE_BLOB);
                buf.extend_from_slice(object.as_bytes());
                ObjectId::new(buf)
            }
            Self::Tree {
                path,
                filter_id,
                object,
            } => {
                let path = path.as_str().as_bytes();
                let filter = filter_id.as_bytes();
                let mut buf =
                    Vec::with_capacity(1 + 10 + path.len() + 10 + filter.len() + object.len());
                buf.push(TYPE_TREE);
                encode_varint(&mut buf, path.len() as u64);
                buf.extend_from_slice(path);
                encode_varint(&mut buf, filter.len() as u64);
                buf.extend_from_slice(filter);
                buf.extend_from_slice(object.as_bytes());
                ObjectId::new(buf)
            }
        }
    }

    /// Decode an [`ObjectId`] previously produced by [`Self::to_object_id`].
    pub fn from_object_id(id: &ObjectId) -> StoreResult<Self> {
        let bytes = id.as_bytes();
        let (&tag, rest) = bytes
            .split_first()
            .ok_or_else(|| StoreError::MalformedObjectId("empty id".to_string()))?;
        match tag {
            TYPE_BLOB => Ok(Self::Blob {
                object: ObjectId::new(rest.to_vec()),
            }),
            TYPE_TREE => {
                let (path, rest) = read_field(rest, "path")?;
                let path = std::str::from_utf8(path)
                    .map_err(|_| {
                        StoreError::MalformedObjectId("path is not valid UTF-8".to_string())
                    })
                    .and_then(|s| {
                        RepoPath::parse(s)
                            .map_err(|e| StoreError::MalformedObjectId(e.to_string()))
                    })?;
                let (filter, rest) = read_field(rest, "filter id")?;
                Ok(Self::Tree {
                    path,
                    filter_id: FilterId::new(filter.to_vec()),
                    object: ObjectId::new(rest.to_vec()),
                })
            }
            other => Err(StoreError::UnknownObjectType { tag: other }),
        }
    }
}

/// Read one varint-length-prefixed field, returning `(field, remainder)`.
fn read_field<'a>(bytes: &'a [u8], what: &str) -> StoreResult<(&'a [u8], &'a [u8])> {
    let (len, consumed) = decode_varint(bytes)
        .ok_or_else(|| StoreError::MalformedObjectId(format!("undecodable {what} length")))?;
    let rest = &bytes[consumed..];
    let len = usize::try_from(len)
        .map_err(|_| StoreError::MalformedObjectId(format!("{what} length out of range")))?;
    if len > rest.len() {
        return Err(StoreError::MalformedObjectId(format!(
            "{what} length {len} overruns record ({} bytes left)",
            rest.len()
        )));
    }
    Ok(rest.split_at(len))
}
