/// Token representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,      // The token text
    pub position: u32,     // Position in the field value
    pub offset: usize,     // Byte offset in original text
}

impl Token {
    pub fn new(text: String, position: u32, offset: usize) -> Self {
        Token {
            text,
            position,
            offset,
        }
    }
}

/// Lazy token sequence produced per analysis call.
pub type TokenStream<'a> = Box<dyn Iterator<Item = Token> + 'a>;
