pub mod ast;
pub mod evaluator;
pub mod parser;
pub mod planner;

pub use ast::{BooleanClause, BooleanQuery, MultiFieldQuery, Occur, Operator, ParsedTextQuery, Query, RangeQuery, TermQuery};
pub use parser::QueryParser;
pub use planner::{Plan, QueryPlanner};
