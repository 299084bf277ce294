pub mod results;
pub mod searcher;

pub use results::{DocAddress, ScoredDocument, TopDocs, TopKCollector};
pub use searcher::Searcher;
