use crate::core::error::Result;
use crate::core::types::DocOrdinal;
use crate::query::planner::Plan;
use crate::reader::snapshot_reader::SegmentSnapshot;
use crate::scoring::scorer::{Scorer, TermStats};

/// Lazy `(ordinal, score)` matches of one segment, ascending by ordinal,
/// tombstoned documents already removed.
pub type DocStream<'a> = Box<dyn Iterator<Item = (DocOrdinal, f32)> + 'a>;

pub fn evaluate<'a>(plan: &Plan, segment: &'a SegmentSnapshot, scorer: &'a dyn Scorer) -> Result<DocStream<'a>> {
    match plan {
        Plan::Term { field, token, boost } => {
            let Some(list) = segment.segment.postings(field, token)? else {
                return Ok(Box::new(std::iter::empty()));
            };
            let live: Vec<_> = list
                .postings
                .into_iter()
                .filter(|p| !segment.tombstones.contains(p.ordinal))
                .collect();
            let stats = TermStats {
                doc_freq: live.len() as u32,
                live_docs: segment.live_docs(),
            };
            let boost = *boost;
            Ok(Box::new(
                live.into_iter()
                    .map(move |p| (p.ordinal, scorer.score(p.term_freq, &stats) * boost)),
            ))
        }

        Plan::Range { field, lower, upper, boost } => {
            let mut matches = segment.segment.points_in_range(field, *lower, *upper);
            matches -= segment.tombstones.as_ref();
            let score = scorer.constant() * boost;
            Ok(Box::new(matches.into_iter().map(move |ordinal| (ordinal, score))))
        }

        Plan::MatchAll { boost } => {
            let score = scorer.constant() * boost;
            let tombstones = &segment.tombstones;
            Ok(Box::new(
                (0..segment.doc_count())
                    .filter(move |ordinal| !tombstones.contains(*ordinal))
                    .map(move |ordinal| (ordinal, score)),
            ))
        }

        Plan::Boolean { must, should, must_not, boost } => {
            let open = |plans: &[Plan]| -> Result<Vec<Cursor<'a>>> {
                plans
                    .iter()
                    .map(|p| evaluate(p, segment, scorer).map(Cursor::new))
                    .collect()
            };
            Ok(Box::new(BooleanStream {
                must: open(must.as_slice())?,
                should: open(should.as_slice())?,
                must_not: open(must_not.as_slice())?,
                boost: *boost,
            }))
        }

        Plan::Empty => Ok(Box::new(std::iter::empty())),
    }
}

/// Stream positioned on its current match.
struct Cursor<'a> {
    stream: DocStream<'a>,
    current: Option<(DocOrdinal, f32)>,
}

impl<'a> Cursor<'a> {
    fn new(mut stream: DocStream<'a>) -> Self {
        let current = stream.next();
        Cursor { stream, current }
    }

    fn doc(&self) -> Option<DocOrdinal> {
        self.current.map(|(ordinal, _)| ordinal)
    }

    fn advance(&mut self) {
        self.current = self.stream.next();
    }

    fn advance_to(&mut self, target: DocOrdinal) {
        while self.doc().is_some_and(|ordinal| ordinal < target) {
            self.advance();
        }
    }

    /// Score if positioned exactly on `target`.
    fn score_at(&self, target: DocOrdinal) -> Option<f32> {
        self.current.filter(|(ordinal, _)| *ordinal == target).map(|(_, score)| score)
    }
}

/// Merges clause streams: every MUST, no MUST_NOT, at least one SHOULD when
/// any are present. Scores of matching positive clauses add up.
struct BooleanStream<'a> {
    must: Vec<Cursor<'a>>,
    should: Vec<Cursor<'a>>,
    must_not: Vec<Cursor<'a>>,
    boost: f32,
}

impl BooleanStream<'_> {
    /// Next ordinal all MUST cursors agree on, or the smallest SHOULD ordinal
    /// when there is no MUST clause.
    fn next_candidate(&mut self) -> Option<DocOrdinal> {
        if self.must.is_empty() {
            return self.should.iter().filter_map(Cursor::doc).min();
        }

        let mut target = self.must.iter().map(Cursor::doc).max()??;
        loop {
            let mut agreed = true;
            for cursor in &mut self.must {
                cursor.advance_to(target);
                let doc = cursor.doc()?;
                if doc > target {
                    target = doc;
                    agreed = false;
                }
            }
            if agreed {
                return Some(target);
            }
        }
    }
}

impl Iterator for BooleanStream<'_> {
    type Item = (DocOrdinal, f32);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let candidate = self.next_candidate()?;
            let mut score = 0.0;

            for cursor in &mut self.must {
                if let Some(s) = cursor.score_at(candidate) {
                    score += s;
                }
                cursor.advance();
            }

            let mut should_matched = false;
            for cursor in &mut self.should {
                cursor.advance_to(candidate);
                if let Some(s) = cursor.score_at(candidate) {
                    score += s;
                    should_matched = true;
                    cursor.advance();
                }
            }

            let mut excluded = false;
            for cursor in &mut self.must_not {
                cursor.advance_to(candidate);
                excluded |= cursor.doc() == Some(candidate);
            }

            if excluded || (!self.should.is_empty() && !should_matched) {
                continue;
            }
            return Some((candidate, score * self.boost));
        }
    }
}
