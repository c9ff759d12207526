use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::document::DocId;
use crate::error::Result;
use crate::index::InvertedIndex;
use crate::query::Query;

/// A run of `len` tokens starting at token position `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchSpan {
    pub start: u32,
    pub len: u32,
}

impl MatchSpan {
    pub fn new(start: u32, len: u32) -> Self { Self { start, len } }

    pub fn end(&self) -> u32 { self.start.saturating_add(self.len) }
}

/// Rendering order: start ascending, then longer spans first so that marks
/// opened at the same token nest correctly.
pub fn span_order(a: &MatchSpan, b: &MatchSpan) -> Ordering {
    a.start.cmp(&b.start).then(b.len.cmp(&a.len))
}

pub fn sort_spans(spans: &mut [MatchSpan]) {
    spans.sort_by(span_order);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: DocId,
    pub score: f32,
    /// field -> matched spans, sorted with [`span_order`]
    pub matches: BTreeMap<String, Vec<MatchSpan>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    /// Return at most this many hits.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub total_hits: usize,
    pub hits: Vec<SearchHit>,
}

#[derive(Default)]
struct Candidate<'i> {
    score: f32,
    matches: BTreeMap<&'i str, Vec<MatchSpan>>,
}

impl InvertedIndex {
    /// Rank documents against `query`. Hits are ordered by descending score,
    /// ties broken by document id ascending.
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        Ok(self.search_with(query, &SearchOptions::default())?.hits)
    }

    pub fn search_with(&self, query: &str, options: &SearchOptions) -> Result<SearchResults> {
        let parsed = Query::parse(query, &self.tokenizer, &self.config.schema)?;
        let mut hits = self.execute(&parsed);
        let total_hits = hits.len();
        if let Some(limit) = options.limit {
            hits.truncate(limit);
        }
        tracing::debug!(query, clauses = parsed.clauses.len(), total_hits, "search complete");
        Ok(SearchResults { query: query.to_string(), total_hits, hits })
    }

    /// Score a parsed query. Clauses whose term is absent contribute
    /// nothing; a document is a candidate if any clause matches it.
    pub fn execute(&self, query: &Query) -> Vec<SearchHit> {
        let n = self.num_docs();
        let schema = &self.config.schema;
        let mut candidates: BTreeMap<&str, Candidate<'_>> = BTreeMap::new();

        for clause in &query.clauses {
            let Some(docs) = self.postings.get(&clause.term) else { continue };
            let mut idf: BTreeMap<&str, f32> = BTreeMap::new();
            for (doc, fields) in docs {
                for (field, positions) in fields {
                    if clause.field.as_deref().is_some_and(|f| f != field) {
                        continue;
                    }
                    let field_idf = *idf
                        .entry(field.as_str())
                        .or_insert_with(|| self.config.idf.idf(n, self.doc_frequency(&clause.term, field)));
                    let tf = 1.0 + (positions.len() as f32).ln();
                    let candidate = candidates.entry(doc.as_str()).or_default();
                    candidate.score += tf * field_idf * schema.boost(field);
                    candidate
                        .matches
                        .entry(field.as_str())
                        .or_default()
                        .extend(positions.iter().map(|&p| MatchSpan::new(p, 1)));
                }
            }
        }

        let mut hits: Vec<SearchHit> = candidates
            .into_iter()
            .map(|(id, candidate)| SearchHit {
                id: id.to_string(),
                score: candidate.score,
                matches: candidate
                    .matches
                    .into_iter()
                    .map(|(field, mut spans)| {
                        sort_spans(&mut spans);
                        spans.dedup();
                        (field.to_string(), spans)
                    })
                    .collect(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits
    }
}

/// Free-function form of [`InvertedIndex::search`].
pub fn search(index: &InvertedIndex, query: &str) -> Result<Vec<SearchHit>> {
    index.search(query)
}
