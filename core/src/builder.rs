use std::collections::{BTreeMap, BTreeSet};

use crate::config::IndexConfig;
use crate::document::{DocId, Document};
use crate::error::{Result, SearchError};
use crate::index::{InvertedIndex, TermPostings};
use crate::tokenizer::Tokenizer;

/// Builds an [`InvertedIndex`] from a closed corpus in one pass.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    config: IndexConfig,
    tokenizer: Tokenizer,
}

impl IndexBuilder {
    pub fn new(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        let tokenizer = Tokenizer::new(&config.tokenizer)?;
        Ok(Self { config, tokenizer })
    }

    pub fn tokenizer(&self) -> &Tokenizer { &self.tokenizer }

    /// Index every configured field of every document.
    ///
    /// All documents are validated before anything is indexed, so the call
    /// either returns a complete index or an error.
    pub fn build<'d, I>(&self, documents: I) -> Result<InvertedIndex>
    where
        I: IntoIterator<Item = &'d Document>,
    {
        let documents: Vec<&Document> = documents.into_iter().collect();
        if documents.is_empty() {
            if !self.config.allow_empty_corpus {
                return Err(SearchError::EmptyCorpus);
            }
            tracing::warn!("building index from an empty corpus");
        }

        let mut doc_ids: BTreeSet<DocId> = BTreeSet::new();
        for doc in &documents {
            if !doc_ids.insert(doc.id.clone()) {
                return Err(SearchError::DuplicateDocument(doc.id.clone()));
            }
            for field in self.config.schema.check_document(doc)? {
                tracing::warn!(doc = %doc.id, field, "ignoring field outside schema");
            }
        }

        let mut postings: BTreeMap<String, TermPostings> = BTreeMap::new();
        for doc in &documents {
            let mut indexed = 0usize;
            for field in self.config.schema.field_names() {
                let Some(text) = doc.field(field) else { continue };
                for token in self.tokenizer.index_terms(text) {
                    postings
                        .entry(token.term)
                        .or_default()
                        .entry(doc.id.clone())
                        .or_default()
                        .entry(field.to_string())
                        .or_default()
                        .push(token.position);
                    indexed += 1;
                }
            }
            tracing::debug!(doc = %doc.id, tokens = indexed, "indexed document");
        }

        let index = InvertedIndex::from_parts(self.config.clone(), self.tokenizer.clone(), doc_ids, postings);
        tracing::info!(num_docs = index.num_docs(), num_terms = index.num_terms(), "index build complete");
        Ok(index)
    }
}

/// Build an index with `config` in one call.
pub fn build(documents: &[Document], config: IndexConfig) -> Result<InvertedIndex> {
    IndexBuilder::new(config)?.build(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Schema;

    fn corpus() -> Vec<Document> {
        vec![
            Document::new("a").with_field("title", "Ocean Tales").with_field("articles", "A story about the deep ocean"),
            Document::new("b").with_field("title", "Mountain Air").with_field("articles", "Climbing tall mountains"),
        ]
    }

    #[test]
    fn positions_count_stop_words() {
        let index = build(&corpus(), IndexConfig::default()).unwrap();
        assert_eq!(index.positions("ocean", "a", "articles"), Some(&[5][..]));
        assert_eq!(index.positions("ocean", "a", "title"), Some(&[0][..]));
        assert_eq!(index.positions("mountains", "b", "articles"), Some(&[2][..]));
    }

    #[test]
    fn stop_words_are_not_keys() {
        let index = build(&corpus(), IndexConfig::default()).unwrap();
        assert!(!index.contains_term("the"));
        assert!(!index.contains_term("about"));
        assert!(index.contains_term("story"));
    }

    #[test]
    fn documents_without_fields_are_retrievable() {
        let mut docs = corpus();
        docs.push(Document::new("c"));
        let index = build(&docs, IndexConfig::default()).unwrap();
        assert!(index.contains_doc("c"));
        assert_eq!(index.num_docs(), 3);
    }

    #[test]
    fn duplicate_ids_fail() {
        let docs = vec![Document::new("a"), Document::new("a")];
        let err = build(&docs, IndexConfig::default()).unwrap_err();
        assert!(matches!(err, SearchError::DuplicateDocument(id) if id == "a"));
    }

    #[test]
    fn empty_corpus_policy() {
        let index = build(&[], IndexConfig::default()).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.num_terms(), 0);

        let strict = IndexConfig { allow_empty_corpus: false, ..Default::default() };
        assert!(matches!(build(&[], strict), Err(SearchError::EmptyCorpus)));
    }

    #[test]
    fn rejects_unknown_fields_when_configured() {
        let config = IndexConfig { schema: Schema::default().reject_unknown_fields(), ..Default::default() };
        let docs = vec![Document::new("a").with_field("author", "x")];
        assert!(matches!(build(&docs, config), Err(SearchError::UnknownField { .. })));
    }

    #[test]
    fn unlisted_fields_are_not_indexed() {
        let docs = vec![Document::new("a").with_field("author", "melville")];
        let index = build(&docs, IndexConfig::default()).unwrap();
        assert!(!index.contains_term("melville"));
    }
}
