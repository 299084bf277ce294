use std::fmt;
use std::ops::Bound;
use serde::{Serialize, Deserialize};

/// Main query enum representing all query types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    Term(TermQuery),              // Exact postings lookup
    Range(RangeQuery),            // Numeric point range, constant score
    ParsedText(ParsedTextQuery),  // Query-syntax text, analyzed at plan time
    MultiField(MultiFieldQuery),  // Same text across several fields
    Boolean(BooleanQuery),        // MUST / MUST_NOT / SHOULD combinations
    MatchAll,                     // Every live document, score 1.0
}

/// Single term query. `token` is matched as is, without analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermQuery {
    pub field: String,
    pub token: String,
    pub boost: Option<f32>,
}

/// Range query over a `NumericPoint` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeQuery {
    pub field: String,
    pub lower: Bound<i64>,
    pub upper: Bound<i64>,
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Operator {
    #[default]
    Or,
    And,
}

/// Text in query syntax, e.g. `title:tutor AND -joke`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTextQuery {
    pub default_fields: Vec<String>,
    pub text: String,
    pub default_operator: Operator,
}

/// Plain text analyzed once and matched in any of `fields`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiFieldQuery {
    pub fields: Vec<String>,
    pub text: String,
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Occur {
    Must,
    MustNot,
    Should,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanClause {
    pub occur: Occur,
    pub query: Query,
}

/// Boolean query with must/should/must_not clauses
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BooleanQuery {
    pub clauses: Vec<BooleanClause>,
    pub boost: Option<f32>,
}

impl Query {
    pub fn term(field: &str, token: &str) -> Query {
        Query::Term(TermQuery {
            field: field.to_string(),
            token: token.to_string(),
            boost: None,
        })
    }

    pub fn range(field: &str, lower: Bound<i64>, upper: Bound<i64>) -> Query {
        Query::Range(RangeQuery {
            field: field.to_string(),
            lower,
            upper,
            boost: None,
        })
    }

    /// `lower <= value <= upper`
    pub fn range_inclusive(field: &str, lower: i64, upper: i64) -> Query {
        Self::range(field, Bound::Included(lower), Bound::Included(upper))
    }

    pub fn exact(field: &str, value: i64) -> Query {
        Self::range_inclusive(field, value, value)
    }

    pub fn parsed(default_fields: &[&str], text: &str) -> Query {
        Query::ParsedText(ParsedTextQuery {
            default_fields: default_fields.iter().map(|f| f.to_string()).collect(),
            text: text.to_string(),
            default_operator: Operator::Or,
        })
    }

    pub fn multi_field(fields: &[&str], text: &str) -> Query {
        Query::MultiField(MultiFieldQuery {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            text: text.to_string(),
            boost: None,
        })
    }

    pub fn match_all() -> Query {
        Query::MatchAll
    }

    /// Multiply this query's score contribution. Ignored for parsed text,
    /// whose clauses carry their own boosts.
    pub fn with_boost(mut self, value: f32) -> Query {
        match &mut self {
            Query::Term(q) => q.boost = Some(value),
            Query::Range(q) => q.boost = Some(value),
            Query::MultiField(q) => q.boost = Some(value),
            Query::Boolean(q) => q.boost = Some(value),
            Query::ParsedText(_) | Query::MatchAll => {}
        }
        self
    }
}

impl From<BooleanQuery> for Query {
    fn from(query: BooleanQuery) -> Self {
        Query::Boolean(query)
    }
}

impl ParsedTextQuery {
    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.default_operator = operator;
        self
    }
}

impl BooleanQuery {
    pub fn new() -> Self {
        BooleanQuery {
            clauses: Vec::new(),
            boost: None,
        }
    }

    pub fn add(&mut self, occur: Occur, query: Query) {
        self.clauses.push(BooleanClause { occur, query });
    }

    pub fn with_must(mut self, query: Query) -> Self {
        self.add(Occur::Must, query);
        self
    }

    pub fn with_should(mut self, query: Query) -> Self {
        self.add(Occur::Should, query);
        self
    }

    pub fn with_must_not(mut self, query: Query) -> Self {
        self.add(Occur::MustNot, query);
        self
    }
}

fn write_boost(f: &mut fmt::Formatter, boost: Option<f32>) -> fmt::Result {
    match boost {
        Some(b) => write!(f, "^{}", b),
        None => Ok(()),
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Query::Term(q) => {
                write!(f, "{}:{}", q.field, q.token)?;
                write_boost(f, q.boost)
            }
            Query::Range(q) => {
                write!(f, "{}:", q.field)?;
                match q.lower {
                    Bound::Included(v) => write!(f, "[{}", v)?,
                    Bound::Excluded(v) => write!(f, "{{{}", v)?,
                    Bound::Unbounded => write!(f, "[*")?,
                }
                write!(f, " TO ")?;
                match q.upper {
                    Bound::Included(v) => write!(f, "{}]", v)?,
                    Bound::Excluded(v) => write!(f, "{}}}", v)?,
                    Bound::Unbounded => write!(f, "*]")?,
                }
                write_boost(f, q.boost)
            }
            Query::ParsedText(q) => write!(f, "{}", q.text),
            Query::MultiField(q) => {
                write!(f, "({}):{:?}", q.fields.join(","), q.text)?;
                write_boost(f, q.boost)
            }
            Query::Boolean(q) => {
                write!(f, "(")?;
                for (i, clause) in q.clauses.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    match clause.occur {
                        Occur::Must => write!(f, "+")?,
                        Occur::MustNot => write!(f, "-")?,
                        Occur::Should => {}
                    }
                    write!(f, "{}", clause.query)?;
                }
                write!(f, ")")?;
                write_boost(f, q.boost)
            }
            Query::MatchAll => write!(f, "*:*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_reads_like_query_syntax() {
        let query: Query = BooleanQuery::new()
            .with_must(Query::term("title", "tutor"))
            .with_must_not(Query::term("title", "joke"))
            .with_should(Query::range("id", Bound::Excluded(1), Bound::Unbounded))
            .into();
        assert_eq!(query.to_string(), "(+title:tutor -title:joke id:{1 TO *])");
        assert_eq!(Query::exact("id", 7).with_boost(2.0).to_string(), "id:[7 TO 7]^2");
        assert_eq!(Query::match_all().to_string(), "*:*");
    }
}
