//! Wraps matched token spans of an HTML fragment in `<mark>` elements.
//!
//! Token positions are resolved by re-tokenizing the fragment with the
//! index tokenizer. Markup is skipped by the tokenizer, so the first content
//! token is the anchor for position 0 and every later position is reached by
//! moving forward from the previous one. The fragment is consumed once, left
//! to right; existing tags are copied through untouched and a mark is closed
//! before and reopened after any tag it would otherwise straddle.

use crate::index::InvertedIndex;
use crate::search::MatchSpan;
use crate::tokenizer::{Tokenizer, TAG};

pub const MARK_OPEN: &str = "<mark>";
pub const MARK_CLOSE: &str = "</mark>";

pub struct Highlighter<'t> {
    tokenizer: &'t Tokenizer,
    open: &'t str,
    close: &'t str,
}

impl<'t> Highlighter<'t> {
    pub fn new(tokenizer: &'t Tokenizer) -> Self {
        Self { tokenizer, open: MARK_OPEN, close: MARK_CLOSE }
    }

    /// Use a different element pair, e.g. `<em>` / `</em>`.
    pub fn with_tags(mut self, open: &'t str, close: &'t str) -> Self {
        self.open = open;
        self.close = close;
        self
    }

    /// `spans` must be sorted with [`span_order`](crate::search::span_order).
    /// Unsorted or partially overlapping spans do not panic: a span that
    /// starts behind the cursor is opened at the cursor, and a span that
    /// outlives its enclosing span is cut at the enclosing span's end.
    pub fn highlight(&self, html: &str, spans: &[MatchSpan]) -> String {
        let mut out = MarkWriter::new(html, self.open, self.close, spans.len());
        let mut open_ends: Vec<u32> = Vec::new();
        let mut pending = spans.iter().filter(|s| s.len > 0).peekable();
        let mut prev_end = 0usize;

        for token in self.tokenizer.tokenize(html) {
            let pos = token.position;
            while open_ends.last().is_some_and(|&end| end <= pos) {
                out.copy_to(prev_end);
                out.close_mark();
                open_ends.pop();
            }
            if pending.peek().is_none() && open_ends.is_empty() {
                break;
            }
            while let Some(span) = pending.next_if(|s| s.start <= pos) {
                let mut end = span.end();
                if end <= pos {
                    continue;
                }
                if let Some(&outer) = open_ends.last() {
                    end = end.min(outer);
                }
                out.copy_to(token.offset);
                out.open_mark();
                open_ends.push(end);
            }
            prev_end = token.offset + token.len;
        }

        while open_ends.pop().is_some() {
            out.copy_to(prev_end);
            out.close_mark();
        }
        out.finish()
    }
}

impl InvertedIndex {
    /// Highlight `html` with this index's tokenizer.
    pub fn highlight(&self, html: &str, spans: &[MatchSpan]) -> String {
        Highlighter::new(&self.tokenizer).highlight(html, spans)
    }
}

/// Free-function form using the default tokenizer configuration.
pub fn highlight(html: &str, spans: &[MatchSpan]) -> String {
    Highlighter::new(&Tokenizer::default()).highlight(html, spans)
}

struct MarkWriter<'h> {
    html: &'h str,
    out: String,
    cursor: usize,
    depth: usize,
    /// Marks are logically open but closed around a tag.
    suspended: bool,
    open: &'h str,
    close: &'h str,
}

impl<'h> MarkWriter<'h> {
    fn new(html: &'h str, open: &'h str, close: &'h str, spans: usize) -> Self {
        let capacity = html.len() + spans * (open.len() + close.len());
        Self { html, out: String::with_capacity(capacity), cursor: 0, depth: 0, suspended: false, open, close }
    }

    fn copy_to(&mut self, end: usize) {
        if end <= self.cursor {
            return;
        }
        let html = self.html;
        let slice = &html[self.cursor..end];
        if self.depth == 0 {
            self.out.push_str(slice);
        } else {
            let mut last = 0;
            for tag in TAG.find_iter(slice) {
                self.text(&slice[last..tag.start()]);
                self.suspend();
                self.out.push_str(tag.as_str());
                last = tag.end();
            }
            self.text(&slice[last..]);
        }
        self.cursor = end;
    }

    fn text(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        self.resume();
        self.out.push_str(s);
    }

    fn suspend(&mut self) {
        if !self.suspended {
            for _ in 0..self.depth {
                self.out.push_str(self.close);
            }
            self.suspended = true;
        }
    }

    fn resume(&mut self) {
        if self.suspended {
            for _ in 0..self.depth {
                self.out.push_str(self.open);
            }
            self.suspended = false;
        }
    }

    fn open_mark(&mut self) {
        self.resume();
        self.out.push_str(self.open);
        self.depth += 1;
    }

    fn close_mark(&mut self) {
        if !self.suspended {
            self.out.push_str(self.close);
        }
        self.depth -= 1;
        if self.depth == 0 {
            self.suspended = false;
        }
    }

    fn finish(mut self) -> String {
        let rest = &self.html[self.cursor..];
        self.out.push_str(rest);
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(list: &[(u32, u32)]) -> Vec<MatchSpan> {
        list.iter().map(|&(s, l)| MatchSpan::new(s, l)).collect()
    }

    #[test]
    fn marks_repeated_word() {
        let out = highlight("<li>hello world hello</li>", &spans(&[(0, 1), (2, 1)]));
        assert_eq!(out, "<li><mark>hello</mark> world <mark>hello</mark></li>");
    }

    #[test]
    fn no_spans_is_identity() {
        let html = "<p>a <b>bold</b> claim</p>";
        assert_eq!(highlight(html, &[]), html);
    }

    #[test]
    fn mark_is_split_around_tags() {
        let out = highlight("deep <b>blue</b> sea", &spans(&[(0, 3)]));
        assert_eq!(out, "<mark>deep </mark><b><mark>blue</mark></b><mark> sea</mark>");
    }

    #[test]
    fn quoted_gt_does_not_end_a_tag() {
        let out = highlight(r#"<a title="x>y">word</a>"#, &spans(&[(0, 1)]));
        assert_eq!(out, r#"<a title="x>y"><mark>word</mark></a>"#);
        let out = highlight("<b data-k='1>2'>deep</b> sea", &spans(&[(0, 2)]));
        assert_eq!(out, "<b data-k='1>2'><mark>deep</mark></b><mark> sea</mark>");
    }

    #[test]
    fn custom_tags() {
        let tokenizer = Tokenizer::default();
        let out = Highlighter::new(&tokenizer)
            .with_tags("<em>", "</em>")
            .highlight("hello world", &spans(&[(1, 1)]));
        assert_eq!(out, "hello <em>world</em>");
    }
}
