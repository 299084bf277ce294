use crate::compression::vbyte::{VByteEncoder, VByteReader};
use crate::core::error::{Error, Result};
use crate::core::types::DocOrdinal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub ordinal: DocOrdinal,
    pub term_freq: u32,       // Term frequency in document
}

/// Posting list for a term
/// Note: Sorted by ordinal; documents are appended in ordinal order
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    pub postings: Vec<Posting>,
}

impl PostingList {
    pub fn new() -> Self {
        PostingList {
            postings: Vec::new(),
        }
    }

    pub fn push(&mut self, ordinal: DocOrdinal, term_freq: u32) {
        debug_assert!(self.postings.last().is_none_or(|p| p.ordinal < ordinal));
        self.postings.push(Posting { ordinal, term_freq });
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn doc_freq(&self) -> u32 {
        self.postings.len() as u32
    }

    // [count] ([ordinal delta] [term freq])*
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        VByteEncoder::encode_u32(out, self.postings.len() as u32);
        let mut prev = 0;
        for posting in &self.postings {
            VByteEncoder::encode_u32(out, posting.ordinal - prev);
            VByteEncoder::encode_u32(out, posting.term_freq);
            prev = posting.ordinal;
        }
    }

    /// Decode the list starting at `offset`, validating ordinals against
    /// `max_doc`.
    pub fn decode(data: &[u8], offset: usize, max_doc: u32) -> Result<PostingList> {
        let slice = data
            .get(offset..)
            .ok_or_else(|| Error::corrupt_segment(format!("Posting offset {} out of bounds", offset)))?;
        let mut reader = VByteReader::new(slice);

        let count = reader.read_u32()?;
        if count > max_doc {
            return Err(Error::corrupt_segment(format!("Posting count {} exceeds {} docs", count, max_doc)));
        }

        let mut postings = Vec::with_capacity(count as usize);
        let mut ordinal = 0u32;
        for i in 0..count {
            let delta = reader.read_u32()?;
            ordinal = ordinal
                .checked_add(delta)
                .ok_or_else(|| Error::corrupt_segment("Posting ordinal overflow"))?;
            if (i > 0 && delta == 0) || ordinal >= max_doc {
                return Err(Error::corrupt_segment(format!("Invalid posting ordinal {}", ordinal)));
            }
            let term_freq = reader.read_u32()?;
            postings.push(Posting { ordinal, term_freq });
        }

        Ok(PostingList { postings })
    }
}
