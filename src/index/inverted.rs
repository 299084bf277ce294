use std::collections::HashMap;
use fst::MapBuilder;
use log::debug;
use crate::analysis::analyzer::Analyzer;
use crate::compression::compress::CompressionType;
use crate::core::error::{Error, Result};
use crate::core::types::{DocOrdinal, Document, FieldKind, FieldValue};
use crate::index::points::PointIndex;
use crate::index::posting::PostingList;
use crate::index::store::StoreWriter;

/// Separates field and token inside dictionary keys. It sorts below every
/// other byte, so key order equals (field, token) order.
pub const TERM_SEPARATOR: u8 = 0;

/// Term representation: (field, token)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Term {
    pub field: String,
    pub token: String,
}

impl Term {
    pub fn new(field: &str, token: &str) -> Self {
        Term {
            field: field.to_string(),
            token: token.to_string(),
        }
    }

    /// Dictionary key: `field \0 token`.
    pub fn key(&self) -> Vec<u8> {
        Self::key_for(&self.field, &self.token)
    }

    pub fn key_for(field: &str, token: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(field.len() + 1 + token.len());
        key.extend_from_slice(field.as_bytes());
        key.push(TERM_SEPARATOR);
        key.extend_from_slice(token.as_bytes());
        key
    }
}

/// Immutable byte images of one segment, produced by [`InvertedIndex::freeze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenSegment {
    pub doc_count: u32,
    pub dictionary: Vec<u8>,
    pub postings: Vec<u8>,
    pub store: Vec<u8>,
    pub points: Vec<u8>,
}

/// In-memory build structure for the next segment: term dictionary with
/// postings, numeric points and stored records.
pub struct InvertedIndex {
    pub postings: HashMap<Term, PostingList>,
    pub points: PointIndex,
    pub store: StoreWriter,
    pub doc_count: u32,
    pub total_tokens: usize,
    pub compression: CompressionType,
}

/// Everything one document contributes, gathered before any shared state is
/// touched.
struct AnalyzedDocument {
    term_freqs: HashMap<Term, u32>,
    points: Vec<(String, i64)>,
    record: Vec<u8>,
    tokens: usize,
}

impl InvertedIndex {
    pub fn new(compression: CompressionType) -> Self {
        InvertedIndex {
            postings: HashMap::new(),
            points: PointIndex::new(),
            store: StoreWriter::default(),
            doc_count: 0,
            total_tokens: 0,
            compression,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.doc_count == 0
    }

    /// Analyze and buffer one document. On error nothing is buffered.
    pub fn add_document(&mut self, doc: &Document, analyzer: &dyn Analyzer) -> Result<DocOrdinal> {
        let analyzed = self.analyze(doc, analyzer)?;
        let ordinal = self.doc_count;

        for (term, freq) in analyzed.term_freqs {
            self.postings.entry(term).or_default().push(ordinal, freq);
        }
        for (field, value) in analyzed.points {
            self.points.add(&field, value, ordinal);
        }
        self.store.push(analyzed.record);

        self.doc_count += 1;
        self.total_tokens += analyzed.tokens;
        Ok(ordinal)
    }

    fn analyze(&self, doc: &Document, analyzer: &dyn Analyzer) -> Result<AnalyzedDocument> {
        let mut term_freqs: HashMap<Term, u32> = HashMap::new();
        let mut points = Vec::new();
        let mut tokens = 0;

        for field in &doc.fields {
            field.validate()?;
            match (field.kind, &field.value) {
                (FieldKind::TextIndexed, FieldValue::Text(text)) => {
                    for token in analyzer.analyze(&field.name, text)? {
                        check_token(&field.name, &token.text)?;
                        *term_freqs.entry(Term::new(&field.name, &token.text)).or_insert(0) += 1;
                        tokens += 1;
                    }
                }
                (FieldKind::StringExact, FieldValue::Text(value)) => {
                    check_token(&field.name, value)?;
                    *term_freqs.entry(Term::new(&field.name, value)).or_insert(0) += 1;
                    tokens += 1;
                }
                (FieldKind::NumericPoint, FieldValue::I64(value)) => {
                    points.push((field.name.clone(), *value));
                }
                _ => {}
            }
        }

        let record = StoreWriter::compress(doc, self.compression)?;
        Ok(AnalyzedDocument {
            term_freqs,
            points,
            record,
            tokens,
        })
    }

    pub fn search_term(&self, term: &Term) -> Option<&PostingList> {
        self.postings.get(term)
    }

    /// Serialize the buffer. Identical documents added in identical order
    /// always produce identical bytes. The buffer itself is left untouched so
    /// a failed commit can retry.
    pub fn freeze(&self) -> Result<FrozenSegment> {
        let mut terms: Vec<(Vec<u8>, &PostingList)> = self
            .postings
            .iter()
            .map(|(term, list)| (term.key(), list))
            .collect();
        terms.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut postings = Vec::new();
        let mut builder = MapBuilder::memory();
        for (key, list) in &terms {
            builder.insert(key, postings.len() as u64)?;
            list.encode_into(&mut postings);
        }
        let dictionary = builder.into_inner()?;

        debug!(
            "froze segment buffer: {} docs, {} terms, {} tokens",
            self.doc_count,
            terms.len(),
            self.total_tokens
        );

        Ok(FrozenSegment {
            doc_count: self.doc_count,
            dictionary,
            postings,
            store: self.store.encode(),
            points: self.points.encode()?,
        })
    }

    pub fn clear(&mut self) {
        self.postings.clear();
        self.points.clear();
        self.store.clear();
        self.doc_count = 0;
        self.total_tokens = 0;
    }
}

fn check_token(field: &str, token: &str) -> Result<()> {
    if token.as_bytes().contains(&TERM_SEPARATOR) {
        return Err(Error::analysis(format!("Token in field '{}' contains NUL", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::TextAnalyzer;

    fn doc(id: i64, title: &str) -> Document {
        Document::new().with_i64("id", id).with_text("title", title).with_string("tag", "x")
    }

    #[test]
    fn term_frequencies_accumulate_per_document() {
        let analyzer = TextAnalyzer::standard();
        let mut index = InvertedIndex::new(CompressionType::None);
        index.add_document(&doc(1, "data data tutor"), &analyzer).unwrap();
        index.add_document(&doc(2, "tutor"), &analyzer).unwrap();

        let data = index.search_term(&Term::new("title", "data")).unwrap();
        assert_eq!(data.postings.len(), 1);
        assert_eq!(data.postings[0].term_freq, 2);
        let tutor = index.search_term(&Term::new("title", "tutor")).unwrap();
        assert_eq!(tutor.doc_freq(), 2);
        assert_eq!(index.search_term(&Term::new("tag", "x")).unwrap().doc_freq(), 2);
    }

    #[test]
    fn failed_analysis_buffers_nothing() {
        let analyzer = TextAnalyzer::standard();
        let mut index = InvertedIndex::new(CompressionType::None);
        index.add_document(&doc(1, "fine"), &analyzer).unwrap();
        let bad = Document::new().with_text("title", "also fine").with_text("body", "broken\0text");
        assert!(index.add_document(&bad, &analyzer).is_err());

        assert_eq!(index.doc_count, 1);
        assert!(index.search_term(&Term::new("title", "also")).is_none());
        assert_eq!(index.store.len(), 1);
    }

    #[test]
    fn freeze_is_deterministic() {
        let analyzer = TextAnalyzer::standard();
        let build = || {
            let mut index = InvertedIndex::new(CompressionType::Lz4);
            for i in 0..20 {
                index.add_document(&doc(i, &format!("word{} shared common{}", i % 7, i % 3)), &analyzer).unwrap();
            }
            index.freeze().unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn key_order_matches_field_then_token() {
        let mut terms = vec![Term::new("ab", "a"), Term::new("a", "z"), Term::new("a", "b")];
        let mut keys: Vec<Vec<u8>> = terms.iter().map(|t| t.key()).collect();
        terms.sort();
        keys.sort();
        let from_terms: Vec<Vec<u8>> = terms.iter().map(|t| t.key()).collect();
        assert_eq!(keys, from_terms);
    }
}
