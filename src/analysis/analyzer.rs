use std::collections::HashMap;
use std::sync::Arc;
use rust_stemmers::Algorithm;
use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::lowercase::LowercaseFilter;
use crate::analysis::filters::stemmer::StemmerFilter;
use crate::analysis::filters::stopword::StopWordFilter;
use crate::analysis::token::TokenStream;
use crate::analysis::tokenizer::{KeywordTokenizer, StandardTokenizer, Tokenizer};
use crate::core::error::{Error, Result};

/// Turns field text into normalized terms. Each call yields a fresh, finite
/// stream and has no side effects on the index.
pub trait Analyzer: Send + Sync {
    fn analyze<'a>(&'a self, field: &str, text: &'a str) -> Result<TokenStream<'a>>;

    fn name(&self) -> &str;

    /// Collect the token texts of one call.
    fn terms(&self, field: &str, text: &str) -> Result<Vec<String>> {
        Ok(self.analyze(field, text)?.map(|token| token.text).collect())
    }
}

/// Text analysis pipeline: one tokenizer followed by filters.
pub struct TextAnalyzer {
    pub tokenizer: Box<dyn Tokenizer>,
    pub filters: Vec<Box<dyn TokenFilter>>,
    pub name: String,
}

impl TextAnalyzer {
    pub fn new(name: &str, tokenizer: Box<dyn Tokenizer>) -> Self {
        TextAnalyzer {
            tokenizer,
            filters: Vec::new(),
            name: name.to_string(),
        }
    }

    pub fn add_filter(mut self, filter: Box<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Unicode words, lowercased.
    pub fn standard() -> Self {
        TextAnalyzer::new("standard", Box::new(StandardTokenizer::default()))
            .add_filter(Box::new(LowercaseFilter))
    }

    /// Standard plus English stop words and stemming.
    pub fn english() -> Self {
        TextAnalyzer::new("english", Box::new(StandardTokenizer::default()))
            .add_filter(Box::new(LowercaseFilter))
            .add_filter(Box::new(StopWordFilter::english()))
            .add_filter(Box::new(StemmerFilter::new(Algorithm::English)))
    }

    /// Whole value as one token, untouched.
    pub fn keyword() -> Self {
        TextAnalyzer::new("keyword", Box::new(KeywordTokenizer))
    }
}

impl Analyzer for TextAnalyzer {
    fn analyze<'a>(&'a self, field: &str, text: &'a str) -> Result<TokenStream<'a>> {
        if let Some(pos) = text.find('\0') {
            return Err(Error::analysis(format!(
                "NUL character at byte {} in field '{}'",
                pos, field
            )));
        }

        let mut tokens = self.tokenizer.tokenize(text);
        for filter in &self.filters {
            tokens = filter.filter(tokens);
        }
        Ok(tokens)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Routes each field to its own analyzer, falling back to a default.
pub struct PerFieldAnalyzer {
    default: Arc<dyn Analyzer>,
    fields: HashMap<String, Arc<dyn Analyzer>>,
}

impl PerFieldAnalyzer {
    pub fn new(default: Arc<dyn Analyzer>) -> Self {
        PerFieldAnalyzer {
            default,
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, field: &str, analyzer: Arc<dyn Analyzer>) -> Self {
        self.fields.insert(field.to_string(), analyzer);
        self
    }

    pub fn get(&self, field: &str) -> &Arc<dyn Analyzer> {
        self.fields.get(field).unwrap_or(&self.default)
    }
}

impl Analyzer for PerFieldAnalyzer {
    fn analyze<'a>(&'a self, field: &str, text: &'a str) -> Result<TokenStream<'a>> {
        self.get(field).analyze(field, text)
    }

    fn name(&self) -> &str {
        "per_field"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_lowercases() {
        let analyzer = TextAnalyzer::standard();
        assert_eq!(analyzer.terms("title", "Data Tutor").unwrap(), vec!["data", "tutor"]);
    }

    #[test]
    fn english_drops_stop_words_and_stems() {
        let analyzer = TextAnalyzer::english();
        assert_eq!(analyzer.terms("content", "the tutor tells jokes").unwrap(), vec!["tutor", "tell", "joke"]);
    }

    #[test]
    fn stream_is_restartable_per_call() {
        let analyzer = TextAnalyzer::standard();
        let first = analyzer.terms("f", "one two").unwrap();
        let second = analyzer.terms("f", "one two").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn nul_is_an_analysis_error() {
        let analyzer = TextAnalyzer::standard();
        let err = analyzer.terms("title", "bad\0input").unwrap_err();
        assert_eq!(err.kind, crate::core::error::ErrorKind::Analysis);
    }

    #[test]
    fn per_field_routes_overrides() {
        let analyzer = PerFieldAnalyzer::new(Arc::new(TextAnalyzer::standard()))
            .with_field("author", Arc::new(TextAnalyzer::keyword()));
        assert_eq!(analyzer.terms("author", "Old Wang").unwrap(), vec!["Old Wang"]);
        assert_eq!(analyzer.terms("title", "Old Wang").unwrap(), vec!["old", "wang"]);
    }
}
