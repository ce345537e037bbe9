//! The composite root id at the system boundary.
//!
//! A filtered root id packs an inner root id and a filter id into one byte
//! string:
//!
//! ```text
//! <lengthVarint><innerRootId><filterId>
//! ```
//!
//! The filter id is the remaining suffix and may be empty; the outer
//! container bounds it, so no trailing length is needed. The length prefix
//! makes the empty filter id unambiguous.

use facet_store::{StoreError, StoreResult};
use facet_types::{FilterId, RootId};
use tracing::trace;

use crate::varint::{decode_varint, encode_varint};

/// Pack an inner root id and a filter id into a filtered root id.
pub fn create_filtered_root_id(inner_root_id: &[u8], filter_id: &FilterId) -> RootId {
    let mut buf =
        Vec::with_capacity(10 + inner_root_id.len() + filter_id.as_bytes().len());
    encode_varint(&mut buf, inner_root_id.len() as u64);
    buf.extend_from_slice(inner_root_id);
    buf.extend_from_slice(filter_id.as_bytes());
    let root_id = RootId::new(buf);
    trace!(root = %root_id, filter = %filter_id, "created filtered root id");
    root_id
}

/// Split a filtered root id back into its inner root id and filter id.
///
/// Fails with [`StoreError::MalformedRootId`] when the varint length prefix
/// cannot be decoded or declares more bytes than the id holds.
pub fn parse_filter_id_from_root_id(root_id: &RootId) -> StoreResult<(RootId, FilterId)> {
    let bytes = root_id.as_bytes();
    let (inner_len, consumed) = decode_varint(bytes).ok_or_else(|| {
        StoreError::MalformedRootId(format!(
            "undecodable length prefix; expected <lengthVarint><innerRootId><filterId>, got {}",
            root_id
        ))
    })?;
    let rest = &bytes[consumed..];
    let inner_len = usize::try_from(inner_len)
        .ok()
        .filter(|len| *len <= rest.len())
        .ok_or_else(|| {
            StoreError::MalformedRootId(format!(
                "length prefix {inner_len} overruns id ({} bytes left)",
                rest.len()
            ))
        })?;
    let (inner, filter) = rest.split_at(inner_len);
    let inner = RootId::new(inner.to_vec());
    let filter = FilterId::new(filter.to_vec());
    trace!(inner = %inner, filter = %filter, "parsed filtered root id");
    Ok((inner, filter))
}
