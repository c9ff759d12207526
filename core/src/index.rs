use std::collections::{BTreeMap, BTreeSet};

use crate::config::IndexConfig;
use crate::document::{DocId, Schema};
use crate::tokenizer::Tokenizer;

/// Token positions of one term within one field, strictly ascending.
pub type Positions = Vec<u32>;
/// field -> positions
pub type FieldPostings = BTreeMap<String, Positions>;
/// document -> field -> positions
pub type TermPostings = BTreeMap<DocId, FieldPostings>;

/// Positional inverted index: term -> document -> field -> positions.
///
/// Positions are ordinals over the full token stream of a field, counted
/// before stop words are removed and restarted at 0 for every field.
///
/// There is no mutation API: an index comes out of
/// [`IndexBuilder`](crate::builder::IndexBuilder) or
/// [`deserialize`](crate::persist::deserialize) and is read-only afterwards,
/// so it can be shared between threads without locking.
#[derive(Debug, Clone)]
pub struct InvertedIndex {
    pub(crate) config: IndexConfig,
    pub(crate) tokenizer: Tokenizer,
    pub(crate) doc_ids: BTreeSet<DocId>,
    pub(crate) postings: BTreeMap<String, TermPostings>,
    /// field -> term -> number of documents containing the term in that field
    pub(crate) df: BTreeMap<String, BTreeMap<String, u32>>,
}

impl InvertedIndex {
    pub(crate) fn from_parts(
        config: IndexConfig,
        tokenizer: Tokenizer,
        doc_ids: BTreeSet<DocId>,
        postings: BTreeMap<String, TermPostings>,
    ) -> Self {
        let df = document_frequencies(&postings);
        Self { config, tokenizer, doc_ids, postings, df }
    }

    pub fn config(&self) -> &IndexConfig { &self.config }

    pub fn schema(&self) -> &Schema { &self.config.schema }

    pub fn tokenizer(&self) -> &Tokenizer { &self.tokenizer }

    pub fn num_docs(&self) -> u32 { self.doc_ids.len() as u32 }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn is_empty(&self) -> bool { self.doc_ids.is_empty() }

    pub fn doc_ids(&self) -> impl Iterator<Item = &str> {
        self.doc_ids.iter().map(String::as_str)
    }

    pub fn contains_doc(&self, id: &str) -> bool { self.doc_ids.contains(id) }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub fn contains_term(&self, term: &str) -> bool { self.postings.contains_key(term) }

    pub fn postings(&self, term: &str) -> Option<&TermPostings> { self.postings.get(term) }

    pub fn positions(&self, term: &str, doc: &str, field: &str) -> Option<&[u32]> {
        self.postings.get(term)?.get(doc)?.get(field).map(Vec::as_slice)
    }

    /// Number of documents whose `field` contains `term`.
    pub fn doc_frequency(&self, term: &str, field: &str) -> u32 {
        self.df.get(field).and_then(|terms| terms.get(term)).copied().unwrap_or(0)
    }

    /// Number of documents containing `term` in any field.
    pub fn total_doc_frequency(&self, term: &str) -> u32 {
        self.postings.get(term).map_or(0, |docs| docs.len() as u32)
    }
}

pub(crate) fn document_frequencies(
    postings: &BTreeMap<String, TermPostings>,
) -> BTreeMap<String, BTreeMap<String, u32>> {
    let mut df: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();
    for (term, docs) in postings {
        for fields in docs.values() {
            for field in fields.keys() {
                *df.entry(field.clone()).or_default().entry(term.clone()).or_insert(0) += 1;
            }
        }
    }
    df
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn df_counts_documents_per_field() {
        let mut postings: BTreeMap<String, TermPostings> = BTreeMap::new();
        let ocean = postings.entry("ocean".into()).or_default();
        ocean.entry("a".into()).or_default().insert("title".into(), vec![0]);
        ocean.entry("a".into()).or_default().insert("articles".into(), vec![5]);
        ocean.entry("b".into()).or_default().insert("articles".into(), vec![1, 3]);

        let ids = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let index = InvertedIndex::from_parts(IndexConfig::default(), Tokenizer::default(), ids, postings);
        assert_eq!(index.doc_frequency("ocean", "title"), 1);
        assert_eq!(index.doc_frequency("ocean", "articles"), 2);
        assert_eq!(index.doc_frequency("ocean", "tags"), 0);
        assert_eq!(index.total_doc_frequency("ocean"), 2);
        assert_eq!(index.positions("ocean", "b", "articles"), Some(&[1, 3][..]));
    }
}
