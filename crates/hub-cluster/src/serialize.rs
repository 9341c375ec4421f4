use tracing::trace;

use crate::compose::ResourceSet;
use crate::error::SerializeError;

/// Encode every object of the set as JSON, one document after the other.
///
/// `kubectl` and `oc` read a stream of concatenated JSON objects from `-f -`,
/// so no separator or list wrapper is emitted.
pub fn serialize(set: &ResourceSet) -> Result<Vec<u8>, SerializeError> {
    let mut payload = vec![];
    for obj in set {
        let bytes = serde_json::to_vec(obj).map_err(|source| SerializeError {
            kind: obj.kind(),
            name: obj.name().to_owned(),
            source,
        })?;
        trace!(kind = obj.kind(), name = obj.name(), bytes = bytes.len(), "serialized");
        payload.extend_from_slice(&bytes);
    }
    Ok(payload)
}
