//! Builds elasticlunr.js-compatible search indexes for rendered books.
//!
//! Text goes through [`tokenizer::analyze`] (split, stopword filter, stem) into one
//! [`InvertedIndex`] trie per field; [`Index::to_value`] produces the JSON the client
//! runtime loads and [`persist::embed_js`] wraps it into `searchindex.js`.

pub mod book;
pub mod index;
pub mod inverted;
pub mod persist;
pub mod stemmer;
pub mod store;
pub mod tokenizer;

pub use book::{Chapter, Heading, ResultsOptions, SearchIndex, SearchIndexBuilder, SearchOptions};
pub use index::*;
pub use inverted::{IndexItem, InvertedIndex};
pub use store::{DocumentStore, StoredDoc};
