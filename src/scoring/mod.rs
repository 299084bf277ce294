pub mod scorer;

pub use scorer::{Scorer, TermStats, TfIdfScorer};
