use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::IndexConfig;
use crate::document::DocId;
use crate::error::{Result, SearchError};
use crate::index::{document_frequencies, InvertedIndex, TermPostings};
use crate::tokenizer::Tokenizer;

/// Bumped whenever the snapshot layout or tokenization rules change.
pub const FORMAT_VERSION: u32 = 1;

/// Wire encoding of a serialized index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexFormat {
    /// UTF-8 JSON text.
    #[default]
    Json,
    /// Compact bincode bytes.
    Binary,
}

impl IndexFormat {
    /// Pick a format from a file name: `.bin` is binary, anything else JSON.
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("bin") => IndexFormat::Binary,
            _ => IndexFormat::Json,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    config: IndexConfig,
    documents: Vec<DocId>,
    postings: BTreeMap<String, TermPostings>,
    df: BTreeMap<String, BTreeMap<String, u32>>,
}

pub fn serialize(index: &InvertedIndex, format: IndexFormat) -> Result<Vec<u8>> {
    let snapshot = Snapshot {
        version: FORMAT_VERSION,
        config: index.config.clone(),
        documents: index.doc_ids.iter().cloned().collect(),
        postings: index.postings.clone(),
        df: index.df.clone(),
    };
    let bytes = match format {
        IndexFormat::Json => serde_json::to_vec(&snapshot).map_err(|e| SearchError::Encode(e.to_string()))?,
        IndexFormat::Binary => bincode::serialize(&snapshot).map_err(|e| SearchError::Encode(e.to_string()))?,
    };
    Ok(bytes)
}

/// Decode and validate a snapshot. Any schema mismatch is reported as
/// `CorruptIndex`; no index is returned unless every check passes.
pub fn deserialize(bytes: &[u8], format: IndexFormat) -> Result<InvertedIndex> {
    let snapshot: Snapshot = match format {
        IndexFormat::Json => serde_json::from_slice(bytes)?,
        IndexFormat::Binary => bincode::deserialize(bytes)?,
    };
    let index = restore(snapshot)?;
    tracing::info!(num_docs = index.num_docs(), num_terms = index.num_terms(), "index loaded");
    Ok(index)
}

pub fn to_json(index: &InvertedIndex) -> Result<String> {
    let bytes = serialize(index, IndexFormat::Json)?;
    String::from_utf8(bytes).map_err(|e| SearchError::Encode(e.to_string()))
}

pub fn from_json(text: &str) -> Result<InvertedIndex> {
    deserialize(text.as_bytes(), IndexFormat::Json)
}

fn corrupt(msg: impl Into<String>) -> SearchError {
    SearchError::CorruptIndex(msg.into())
}

fn restore(snapshot: Snapshot) -> Result<InvertedIndex> {
    if snapshot.version != FORMAT_VERSION {
        return Err(corrupt(format!(
            "unsupported format version {}, expected {}",
            snapshot.version, FORMAT_VERSION
        )));
    }
    snapshot.config.validate().map_err(|e| corrupt(e.to_string()))?;
    let tokenizer = Tokenizer::new(&snapshot.config.tokenizer).map_err(|e| corrupt(e.to_string()))?;

    let mut doc_ids = BTreeSet::new();
    for id in snapshot.documents {
        if !doc_ids.insert(id.clone()) {
            return Err(corrupt(format!("document {id:?} listed twice")));
        }
    }

    for (term, docs) in &snapshot.postings {
        if term.is_empty() || docs.is_empty() {
            return Err(corrupt(format!("term {term:?} has no postings")));
        }
        if !is_index_term(&tokenizer, term) {
            return Err(corrupt(format!("term {term:?} is not a normalized, non-stop-word token")));
        }
        for (doc, fields) in docs {
            if !doc_ids.contains(doc) {
                return Err(corrupt(format!("term {term:?} references unknown document {doc:?}")));
            }
            if fields.is_empty() {
                return Err(corrupt(format!("term {term:?} has no fields for document {doc:?}")));
            }
            for (field, positions) in fields {
                if !snapshot.config.schema.contains(field) {
                    return Err(corrupt(format!("term {term:?} references unknown field {field:?}")));
                }
                if positions.is_empty() || positions.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(corrupt(format!("positions of {term:?} in {doc:?}/{field} are not ascending")));
                }
            }
        }
    }

    if document_frequencies(&snapshot.postings) != snapshot.df {
        return Err(corrupt("document frequencies do not match postings"));
    }

    Ok(InvertedIndex::from_parts(snapshot.config, tokenizer, doc_ids, snapshot.postings))
}

/// A term the tokenizer would produce and keep: it re-tokenizes to itself.
fn is_index_term(tokenizer: &Tokenizer, term: &str) -> bool {
    let mut tokens = tokenizer.tokenize(term);
    match (tokens.next(), tokens.next()) {
        (Some(token), None) => token.term == term && !tokenizer.is_stop_word(term),
        _ => false,
    }
}
