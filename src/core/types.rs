use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};

/// Application-chosen document identifier, stored in a `NumericPoint` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub i64);

impl DocId {
    pub fn new(id: i64) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for DocId {
    fn from(id: i64) -> Self {
        DocId(id)
    }
}

/// Segment-local document number, contiguous from 0.
pub type DocOrdinal = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Analyzed and searchable.
    TextIndexed,
    /// Indexed as one unanalyzed token.
    StringExact,
    /// Indexed for range and exact lookups.
    NumericPoint,
    /// Retrievable only.
    StoredOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    I64(i64),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::I64(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::I64(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub value: FieldValue,
}

impl Field {
    pub fn new(name: &str, kind: FieldKind, value: FieldValue) -> Self {
        Field {
            name: name.to_string(),
            kind,
            value,
        }
    }

    /// Reject kind/value combinations the index cannot represent.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.contains('\0') {
            return Err(Error::invalid_argument(format!(
                "Invalid field name {:?}",
                self.name
            )));
        }
        let ok = match (self.kind, &self.value) {
            (FieldKind::TextIndexed, FieldValue::Text(_)) => true,
            (FieldKind::StringExact, FieldValue::Text(_)) => true,
            (FieldKind::NumericPoint, FieldValue::I64(_)) => true,
            (FieldKind::StoredOnly, _) => true,
            _ => false,
        };
        if !ok {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("Field '{}' of kind {:?} cannot hold {:?}", self.name, self.kind, self.value),
            ));
        }
        Ok(())
    }
}

/// Ordered list of fields; names may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub fields: Vec<Field>,
}

impl Document {
    pub fn new() -> Self {
        Document { fields: Vec::new() }
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn add_text(&mut self, name: &str, text: &str) {
        self.add_field(Field::new(name, FieldKind::TextIndexed, FieldValue::Text(text.to_string())));
    }

    pub fn add_string(&mut self, name: &str, value: &str) {
        self.add_field(Field::new(name, FieldKind::StringExact, FieldValue::Text(value.to_string())));
    }

    pub fn add_i64(&mut self, name: &str, value: i64) {
        self.add_field(Field::new(name, FieldKind::NumericPoint, FieldValue::I64(value)));
    }

    pub fn add_stored(&mut self, name: &str, value: FieldValue) {
        self.add_field(Field::new(name, FieldKind::StoredOnly, value));
    }

    pub fn with_text(mut self, name: &str, text: &str) -> Self {
        self.add_text(name, text);
        self
    }

    pub fn with_string(mut self, name: &str, value: &str) -> Self {
        self.add_string(name, value);
        self
    }

    pub fn with_i64(mut self, name: &str, value: i64) -> Self {
        self.add_i64(name, value);
        self
    }

    pub fn with_stored(mut self, name: &str, value: FieldValue) -> Self {
        self.add_stored(name, value);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldValue> + 'a {
        self.fields.iter().filter(move |f| f.name == name).map(|f| &f.value)
    }

    /// External id: the first numeric value under `id_field`.
    pub fn id(&self, id_field: &str) -> Option<DocId> {
        self.fields
            .iter()
            .filter(|f| f.name == id_field)
            .find_map(|f| f.value.as_i64())
            .map(DocId)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_record(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_record(bytes: &[u8]) -> Result<Document> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Order-preserving encoding: byte-wise comparison of the output matches
/// signed comparison of the input.
pub fn encode_i64_sortable(value: i64) -> [u8; 8] {
    ((value as u64) ^ (1u64 << 63)).to_be_bytes()
}

pub fn decode_i64_sortable(bytes: [u8; 8]) -> i64 {
    (u64::from_be_bytes(bytes) ^ (1u64 << 63)) as i64
}
