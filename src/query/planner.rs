use std::ops::Bound;
use crate::analysis::analyzer::Analyzer;
use crate::core::error::Result;
use crate::query::ast::{BooleanQuery, Occur, Query};
use crate::query::parser::QueryParser;

/// Executable form of a query: text analyzed, parsed text expanded, boosts
/// resolved, clauses grouped by occurrence.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Term { field: String, token: String, boost: f32 },
    Range { field: String, lower: Bound<i64>, upper: Bound<i64>, boost: f32 },
    Boolean { must: Vec<Plan>, should: Vec<Plan>, must_not: Vec<Plan>, boost: f32 },
    MatchAll { boost: f32 },
    /// Statically known to match nothing.
    Empty,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        matches!(self, Plan::Empty)
    }
}

/// Query planner creates execution plans
pub struct QueryPlanner<'a> {
    analyzer: &'a dyn Analyzer,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(analyzer: &'a dyn Analyzer) -> Self {
        QueryPlanner { analyzer }
    }

    pub fn plan(&self, query: &Query) -> Result<Plan> {
        match query {
            Query::Term(q) => Ok(Plan::Term {
                field: q.field.clone(),
                token: q.token.clone(),
                boost: q.boost.unwrap_or(1.0),
            }),

            Query::Range(q) => Ok(Plan::Range {
                field: q.field.clone(),
                lower: q.lower,
                upper: q.upper,
                boost: q.boost.unwrap_or(1.0),
            }),

            Query::ParsedText(q) => {
                let parsed = QueryParser::new(self.analyzer, &q.default_fields)
                    .with_operator(q.default_operator)
                    .parse(&q.text)?;
                self.plan(&parsed)
            }

            Query::MultiField(q) => {
                // Analyzed once, with the first field's analyzer
                let Some(first) = q.fields.first() else {
                    return Ok(Plan::Empty);
                };
                let tokens = self.analyzer.terms(first, &q.text)?;
                let should: Vec<Plan> = q
                    .fields
                    .iter()
                    .flat_map(|field| {
                        tokens.iter().map(move |token| Plan::Term {
                            field: field.clone(),
                            token: token.clone(),
                            boost: 1.0,
                        })
                    })
                    .collect();
                if should.is_empty() {
                    return Ok(Plan::Empty);
                }
                Ok(Plan::Boolean {
                    must: Vec::new(),
                    should,
                    must_not: Vec::new(),
                    boost: q.boost.unwrap_or(1.0),
                })
            }

            Query::Boolean(q) => self.plan_boolean(q),

            Query::MatchAll => Ok(Plan::MatchAll { boost: 1.0 }),
        }
    }

    fn plan_boolean(&self, query: &BooleanQuery) -> Result<Plan> {
        let mut must = Vec::new();
        let mut should = Vec::new();
        let mut must_not = Vec::new();
        let mut has_should = false;

        for clause in &query.clauses {
            let plan = self.plan(&clause.query)?;
            match clause.occur {
                Occur::Must if plan.is_empty() => return Ok(Plan::Empty),
                Occur::Must => must.push(plan),
                Occur::Should => {
                    has_should = true;
                    if !plan.is_empty() {
                        should.push(plan);
                    }
                }
                Occur::MustNot => {
                    if !plan.is_empty() {
                        must_not.push(plan);
                    }
                }
            }
        }

        // No positive clause, or every SHOULD alternative is impossible
        if (must.is_empty() && should.is_empty()) || (has_should && should.is_empty()) {
            return Ok(Plan::Empty);
        }

        Ok(Plan::Boolean {
            must,
            should,
            must_not,
            boost: query.boost.unwrap_or(1.0),
        })
    }
}
