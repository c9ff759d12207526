//! Positional full-text search over a small, closed corpus.
//!
//! The offline side builds an [`InvertedIndex`] from [`Document`]s and
//! serializes it with [`persist::serialize`]. The online side restores it
//! with [`persist::deserialize`], ranks documents with
//! [`InvertedIndex::search`] and marks matches in the source HTML with
//! [`InvertedIndex::highlight`].

pub mod builder;
pub mod config;
pub mod document;
pub mod error;
pub mod highlight;
pub mod index;
pub mod persist;
pub mod query;
pub mod search;
pub mod tokenizer;

pub use builder::{build, IndexBuilder};
pub use config::{IdfMode, IndexConfig, StopWordList, TokenizerConfig};
pub use document::{DocId, Document, FieldDef, Schema, UnknownFieldPolicy};
pub use error::{Result, SearchError};
pub use highlight::{highlight, Highlighter};
pub use index::InvertedIndex;
pub use persist::{deserialize, serialize, IndexFormat};
pub use query::{Clause, Query};
pub use search::{search, sort_spans, span_order, MatchSpan, SearchHit, SearchOptions, SearchResults};
pub use tokenizer::{Token, Tokenizer};
