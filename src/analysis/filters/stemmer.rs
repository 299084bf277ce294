use rust_stemmers::{Algorithm, Stemmer};
use crate::analysis::filter::TokenFilter;
use crate::analysis::token::TokenStream;

pub struct StemmerFilter {
    pub algorithm: Algorithm,
}

impl StemmerFilter {
    pub fn new(algorithm: Algorithm) -> Self {
        StemmerFilter { algorithm }
    }
}

impl TokenFilter for StemmerFilter {
    fn filter<'a>(&'a self, tokens: TokenStream<'a>) -> TokenStream<'a> {
        let stemmer = Stemmer::create(self.algorithm);

        Box::new(tokens.map(move |mut token| {
            token.text = stemmer.stem(&token.text).into_owned();
            token
        }))
    }

    fn name(&self) -> &str {
        "stemmer"
    }
}
