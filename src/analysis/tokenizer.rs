use unicode_segmentation::UnicodeSegmentation;
use crate::analysis::token::{Token, TokenStream};

pub trait Tokenizer: Send + Sync {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a>;

    fn name(&self) -> &str;
}

/// Standard Unicode word tokenizer
#[derive(Debug, Clone)]
pub struct StandardTokenizer {
    pub max_token_length: usize,
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        StandardTokenizer {
            max_token_length: 255,
        }
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        let max = self.max_token_length;
        let words = text
            .unicode_word_indices()
            .enumerate()
            .filter(move |(_, (_, word))| word.len() <= max)
            .map(|(position, (offset, word))| Token::new(word.to_string(), position as u32, offset));
        Box::new(words)
    }

    fn name(&self) -> &str {
        "standard"
    }
}

/// Emits the whole input as a single token.
#[derive(Debug, Clone, Default)]
pub struct KeywordTokenizer;

impl Tokenizer for KeywordTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        if text.is_empty() {
            return Box::new(std::iter::empty());
        }
        Box::new(std::iter::once(Token::new(text.to_string(), 0, 0)))
    }

    fn name(&self) -> &str {
        "keyword"
    }
}
