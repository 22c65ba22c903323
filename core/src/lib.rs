pub mod build;
pub mod catalog;
pub mod codec;
pub mod error;
pub mod forward;
pub mod index;
pub mod persist;
pub mod reader;
pub mod tokenizer;

pub use error::{IndexError, Missing, Result};
pub use index::{
    DocId, ForwardEntry, InvertedIndex, Position, Posting, TermId, TermInfo, TermPostings,
};
pub use reader::IndexReader;
