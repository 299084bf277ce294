use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use crate::core::types::{DocId, DocOrdinal};

/// Location of a document inside one reader: position of its segment in the
/// snapshot, then its ordinal in that segment. Only meaningful together with
/// the reader that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocAddress {
    pub segment_ord: u32,
    pub doc: DocOrdinal,
}

impl DocAddress {
    pub fn new(segment_ord: u32, doc: DocOrdinal) -> Self {
        DocAddress { segment_ord, doc }
    }
}

/// Search results container
#[derive(Debug, Clone, Default)]
pub struct TopDocs {
    pub total_hits: usize,
    pub hits: Vec<ScoredDocument>,
}

impl TopDocs {
    pub fn max_score(&self) -> f32 {
        self.hits.first().map(|hit| hit.score).unwrap_or(0.0)
    }

    pub fn doc_ids(&self) -> Vec<DocId> {
        self.hits.iter().filter_map(|hit| hit.doc_id).collect()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Document with relevance score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub address: DocAddress,
    pub doc_id: Option<DocId>,  // None when the record has no id field
    pub score: f32,
}

/// Heap entry; greater means ranked earlier.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f32,
    address: DocAddress,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher score first, then lower address
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.address.cmp(&self.address))
    }
}

/// Top-K collector: a min-heap holding the best `k` candidates seen so far,
/// the weakest on top so it can be evicted.
pub struct TopKCollector {
    heap: BinaryHeap<Reverse<Candidate>>,
    k: usize,
    total_collected: usize,  // Track total documents processed
}

impl TopKCollector {
    pub fn new(k: usize) -> Self {
        TopKCollector {
            heap: BinaryHeap::with_capacity(k.saturating_add(1).min(1024)),
            k,
            total_collected: 0,
        }
    }

    pub fn collect(&mut self, address: DocAddress, score: f32) {
        self.total_collected += 1;
        if self.k == 0 {
            return;
        }

        let candidate = Candidate { score, address };
        if self.heap.len() < self.k {
            self.heap.push(Reverse(candidate));
        } else if self.heap.peek().is_some_and(|Reverse(weakest)| candidate > *weakest) {
            self.heap.pop();
            self.heap.push(Reverse(candidate));
        }
    }

    pub fn total_collected(&self) -> usize {
        self.total_collected
    }

    /// Best first.
    pub fn into_sorted(self) -> Vec<(DocAddress, f32)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(c)| (c.address, c.score))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(segment_ord: u32, doc: u32) -> DocAddress {
        DocAddress::new(segment_ord, doc)
    }

    #[test]
    fn keeps_best_k_in_descending_order() {
        let mut collector = TopKCollector::new(3);
        for (i, score) in [0.5, 2.0, 1.0, 3.0, 0.1].iter().enumerate() {
            collector.collect(addr(0, i as u32), *score);
        }
        assert_eq!(collector.total_collected(), 5);
        let scores: Vec<f32> = collector.into_sorted().iter().map(|(_, s)| *s).collect();
        assert_eq!(scores, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn ties_prefer_lower_address() {
        let mut collector = TopKCollector::new(2);
        collector.collect(addr(1, 0), 1.0);
        collector.collect(addr(0, 5), 1.0);
        collector.collect(addr(0, 2), 1.0);
        let hits: Vec<DocAddress> = collector.into_sorted().into_iter().map(|(a, _)| a).collect();
        assert_eq!(hits, vec![addr(0, 2), addr(0, 5)]);
    }

    #[test]
    fn zero_k_counts_but_keeps_nothing() {
        let mut collector = TopKCollector::new(0);
        collector.collect(addr(0, 0), 1.0);
        assert_eq!(collector.total_collected(), 1);
        assert!(collector.into_sorted().is_empty());
    }
}
