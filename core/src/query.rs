//! Query parsing.
//!
//! Grammar: whitespace-separated clauses, each either `term` or
//! `field:term`. There are no boolean operators and no phrase quoting;
//! clauses combine disjunctively.

use crate::document::Schema;
use crate::error::{Result, SearchError};
use crate::tokenizer::Tokenizer;

/// One normalized term, optionally restricted to a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub term: String,
    pub field: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub clauses: Vec<Clause>,
}

impl Query {
    /// Parse `text` using the index-time tokenizer. Stop words drop out,
    /// duplicate clauses collapse. An empty or all-stop-word query parses
    /// to an empty `Query`.
    pub fn parse(text: &str, tokenizer: &Tokenizer, schema: &Schema) -> Result<Query> {
        let mut clauses: Vec<Clause> = Vec::new();
        for chunk in text.split_whitespace() {
            let (field, body) = match chunk.split_once(':') {
                Some((field, body)) => {
                    if field.is_empty() {
                        return Err(SearchError::InvalidQuery(format!("missing field name in {chunk:?}")));
                    }
                    if body.is_empty() {
                        return Err(SearchError::InvalidQuery(format!("missing term after {field:?}")));
                    }
                    if body.contains(':') {
                        return Err(SearchError::InvalidQuery(format!("more than one ':' in {chunk:?}")));
                    }
                    if !schema.contains(field) {
                        return Err(SearchError::FieldNotConfigured(field.to_string()));
                    }
                    (Some(field), body)
                }
                None => (None, chunk),
            };
            for token in tokenizer.index_terms(body) {
                let clause = Clause { term: token.term, field: field.map(str::to_string) };
                if !clauses.contains(&clause) {
                    clauses.push(clause);
                }
            }
        }
        Ok(Query { clauses })
    }

    pub fn is_empty(&self) -> bool { self.clauses.is_empty() }
}
