/// Per-segment statistics a term is scored against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermStats {
    pub doc_freq: u32,     // Live documents containing the term
    pub live_docs: u32,    // Live documents in the segment
}

/// Scorer trait
pub trait Scorer: Send + Sync {
    /// Contribution of one matching document. Must grow with `term_freq`
    /// and shrink as `doc_freq` grows.
    fn score(&self, term_freq: u32, stats: &TermStats) -> f32;

    fn name(&self) -> &str;

    /// Range and match-all contribution.
    fn constant(&self) -> f32 {
        1.0
    }
}

/// TF-IDF Scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfScorer;

impl TfIdfScorer {
    pub fn new() -> Self {
        TfIdfScorer
    }

    pub fn idf(stats: &TermStats) -> f32 {
        let n = stats.live_docs as f32;
        let df = stats.doc_freq as f32;
        1.0 + ((n + 1.0) / (df + 1.0)).ln()
    }
}

impl Scorer for TfIdfScorer {
    fn score(&self, term_freq: u32, stats: &TermStats) -> f32 {
        // sqrt damps repeated terms
        (term_freq as f32).sqrt() * Self::idf(stats)
    }

    fn name(&self) -> &str {
        "tfidf"
    }
}
