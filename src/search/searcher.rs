use log::debug;
use crate::analysis::analyzer::Analyzer;
use crate::core::error::Result;
use crate::core::types::{DocId, Document};
use crate::query::ast::Query;
use crate::query::evaluator::evaluate;
use crate::query::planner::QueryPlanner;
use crate::reader::index_reader::IndexReader;
use crate::scoring::scorer::{Scorer, TfIdfScorer};
use crate::search::results::{DocAddress, ScoredDocument, TopDocs, TopKCollector};

/// Runs queries against one reader snapshot.
pub struct Searcher<'r> {
    reader: &'r IndexReader,
    analyzer: &'r dyn Analyzer,
    scorer: Box<dyn Scorer>,
    id_field: String,
}

impl<'r> Searcher<'r> {
    /// `analyzer` must be the one used at index time.
    pub fn new(reader: &'r IndexReader, analyzer: &'r dyn Analyzer) -> Self {
        Searcher {
            reader,
            analyzer,
            scorer: Box::new(TfIdfScorer::new()),
            id_field: "id".to_string(),
        }
    }

    pub fn with_id_field(mut self, id_field: &str) -> Self {
        self.id_field = id_field.to_string();
        self
    }

    pub fn with_scorer(mut self, scorer: Box<dyn Scorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn reader(&self) -> &IndexReader {
        self.reader
    }

    /// Best `k` live matches, descending score, ties in (segment, ordinal)
    /// order.
    pub fn search(&self, query: &Query, k: usize) -> Result<TopDocs> {
        let plan = QueryPlanner::new(self.analyzer).plan(query)?;
        let mut collector = TopKCollector::new(k);

        for (segment_ord, segment) in self.reader.segments().iter().enumerate() {
            for (ordinal, score) in evaluate(&plan, segment, self.scorer.as_ref())? {
                collector.collect(DocAddress::new(segment_ord as u32, ordinal), score);
            }
        }

        let total_hits = collector.total_collected();
        let hits = collector
            .into_sorted()
            .into_iter()
            .map(|(address, score)| {
                let doc_id = self.segment_doc(address)?.id(&self.id_field);
                Ok(ScoredDocument { address, doc_id, score })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("query {} matched {} docs, returning {}", query, total_hits, hits.len());
        Ok(TopDocs { total_hits, hits })
    }

    /// Number of live matches, without ranking.
    pub fn count(&self, query: &Query) -> Result<usize> {
        let plan = QueryPlanner::new(self.analyzer).plan(query)?;
        let mut total = 0;
        for segment in self.reader.segments() {
            total += evaluate(&plan, segment, self.scorer.as_ref())?.count();
        }
        Ok(total)
    }

    pub fn doc(&self, address: DocAddress) -> Result<Option<Document>> {
        self.reader.doc(address)
    }

    /// Stored record of the live document carrying `id`.
    pub fn fetch_stored(&self, id: DocId) -> Result<Option<Document>> {
        self.reader.fetch_stored(&self.id_field, id)
    }

    // Hits always come from live documents of this reader.
    fn segment_doc(&self, address: DocAddress) -> Result<Document> {
        let segment = &self.reader.segments()[address.segment_ord as usize];
        segment.segment.document(address.doc)
    }
}
