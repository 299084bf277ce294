use std::collections::BTreeMap;
use std::ops::Bound;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, Result};
use crate::core::types::{encode_i64_sortable, DocOrdinal};

/// Numeric point index: per field, `(sortable value, ordinal)` pairs sorted
/// by value then ordinal. Range lookups compare encoded bytes only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointIndex {
    fields: BTreeMap<String, Vec<([u8; 8], DocOrdinal)>>,
}

impl PointIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, value: i64, ordinal: DocOrdinal) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push((encode_i64_sortable(value), ordinal));
    }

    /// Sorted, serialized copy.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut sorted = self.clone();
        for points in sorted.fields.values_mut() {
            points.sort_unstable();
        }
        Ok(bincode::serialize(&sorted)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let index: PointIndex = bincode::deserialize(data)
            .map_err(|e| Error::corrupt_segment(format!("Invalid point index: {}", e)))?;
        for points in index.fields.values() {
            if points.windows(2).any(|w| w[0] > w[1]) {
                return Err(Error::corrupt_segment("Point index out of order"));
            }
        }
        Ok(index)
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Ordinals whose value under `field` falls within the bounds.
    pub fn range(&self, field: &str, lower: Bound<i64>, upper: Bound<i64>) -> RoaringBitmap {
        let mut hits = RoaringBitmap::new();
        let Some(points) = self.fields.get(field) else {
            return hits;
        };

        let start = match lower {
            Bound::Unbounded => 0,
            Bound::Included(v) => {
                let key = encode_i64_sortable(v);
                points.partition_point(|(k, _)| *k < key)
            }
            Bound::Excluded(v) => {
                let key = encode_i64_sortable(v);
                points.partition_point(|(k, _)| *k <= key)
            }
        };
        let end = match upper {
            Bound::Unbounded => points.len(),
            Bound::Included(v) => {
                let key = encode_i64_sortable(v);
                points.partition_point(|(k, _)| *k <= key)
            }
            Bound::Excluded(v) => {
                let key = encode_i64_sortable(v);
                points.partition_point(|(k, _)| *k < key)
            }
        };

        if start < end {
            for (_, ordinal) in &points[start..end] {
                hits.insert(*ordinal);
            }
        }
        hits
    }
}
