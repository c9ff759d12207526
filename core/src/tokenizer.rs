use lazy_static::lazy_static;
use regex::{Matches, Regex};
use unicode_normalization::UnicodeNormalization;
use std::collections::{HashSet, VecDeque};

use crate::config::{StopWordList, TokenizerConfig, DEFAULT_SEPARATOR};
use crate::error::Result;

/// A tag, with quoted attribute values allowed to contain `>`.
const TAG_PATTERN: &str = r#"<(?:[^>"']|"[^"]*"|'[^']*')*>"#;
const ENTITY_PATTERN: &str = r"&#?[0-9A-Za-z]+;";

lazy_static! {
    static ref DEFAULT_SPLIT: Regex = Regex::new(&split_pattern(DEFAULT_SEPARATOR, true)).expect("valid regex");
    pub(crate) static ref TAG: Regex = Regex::new(TAG_PATTERN).expect("valid regex");
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","able","about","across","after","all","almost","also","am","among","an","and","any","are","as","at",
            "be","because","been","but","by",
            "can","cannot","could",
            "dear","did","do","does",
            "either","else","ever","every",
            "for","from",
            "get","got",
            "had","has","have","he","her","hers","him","his","how","however",
            "i","if","in","into","is","it","its",
            "just",
            "least","let","like","likely",
            "may","me","might","most","must","my",
            "neither","no","nor","not",
            "of","off","often","on","only","or","other","our","own",
            "rather",
            "said","say","says","she","should","since","so","some",
            "than","that","the","their","them","then","there","these","they","this","tis","to","too","twas",
            "us",
            "wants","was","we","were","what","when","where","which","while","who","whom","why","will","with","would",
            "yet","you","your"
        ];
        words.iter().copied().collect()
    };
}

fn split_pattern(separator: &str, strip_markup: bool) -> String {
    if strip_markup {
        format!("(?:{}|{}|{})+", TAG_PATTERN, ENTITY_PATTERN, separator)
    } else {
        format!("(?:{})+", separator)
    }
}

/// One token of a field, with its location in the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Normalized (NFKC, lowercased) term.
    pub term: String,
    /// Byte offset of the token in the raw text.
    pub offset: usize,
    /// Byte length of the token in the raw text.
    pub len: usize,
    /// Ordinal among all tokens of the text, stop words included.
    pub position: u32,
}

/// Splits text into normalized tokens and answers stop-word membership.
///
/// The same tokenizer instance (or one rebuilt from the same
/// [`TokenizerConfig`]) must be used at build time and at query time.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    config: TokenizerConfig,
    split: Regex,
    extra_stop_words: HashSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        let config = TokenizerConfig::default();
        let extra_stop_words = normalize_words(&config.extra_stop_words);
        Self { config, split: DEFAULT_SPLIT.clone(), extra_stop_words }
    }
}

impl Tokenizer {
    pub fn new(config: &TokenizerConfig) -> Result<Self> {
        config.validate()?;
        let split = Regex::new(&split_pattern(&config.separator, config.strip_markup))?;
        Ok(Self {
            config: config.clone(),
            split,
            extra_stop_words: normalize_words(&config.extra_stop_words),
        })
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Lazily tokenize `text`. Stop words are yielded too; they carry a
    /// position like any other token.
    pub fn tokenize<'t, 'a>(&'t self, text: &'a str) -> Tokens<'t, 'a> {
        Tokens {
            text,
            split: &self.split,
            separators: self.split.find_iter(text),
            pending: VecDeque::new(),
            cursor: 0,
            position: 0,
            done: false,
        }
    }

    /// Tokens that survive the stop-word filter, positions unchanged.
    pub fn index_terms<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Token> + 'a {
        self.tokenize(text).filter(move |t| !self.is_stop_word(&t.term))
    }

    pub fn is_stop_word(&self, term: &str) -> bool {
        let builtin = match self.config.stop_words {
            StopWordList::English => ENGLISH_STOPWORDS.contains(term),
            StopWordList::None => false,
        };
        builtin || self.extra_stop_words.contains(term)
    }
}

fn normalize(word: &str) -> String {
    word.nfkc().collect::<String>().to_lowercase()
}

fn normalize_words(words: &[String]) -> HashSet<String> {
    words.iter().map(|w| normalize(w)).collect()
}

/// Byte range of `s` between its first and last alphanumeric characters.
fn alphanumeric_core(s: &str) -> Option<(usize, usize)> {
    let lead = s.find(char::is_alphanumeric)?;
    let last = s.rfind(char::is_alphanumeric)?;
    let trail = last + s[last..].chars().next().map_or(0, char::len_utf8);
    Some((lead, trail))
}

/// Iterator returned by [`Tokenizer::tokenize`].
pub struct Tokens<'t, 'a> {
    text: &'a str,
    split: &'t Regex,
    separators: Matches<'t, 'a>,
    pending: VecDeque<Token>,
    cursor: usize,
    position: u32,
    done: bool,
}

impl<'t, 'a> Tokens<'t, 'a> {
    /// Queue the tokens of one raw segment. Normalization can turn a
    /// segment into text the separator splits again (a fullwidth colon
    /// becomes `:`), so each piece becomes its own token; all pieces point
    /// at the same raw bytes.
    fn push_segment(&mut self, start: usize, end: usize) {
        let raw = &self.text[start..end];
        let Some((lead, trail)) = alphanumeric_core(raw) else {
            return;
        };
        let normalized = normalize(&raw[lead..trail]);
        let split = self.split;
        for piece in split.split(&normalized) {
            if let Some((a, b)) = alphanumeric_core(piece) {
                self.pending.push_back(Token {
                    term: piece[a..b].to_string(),
                    offset: start + lead,
                    len: trail - lead,
                    position: self.position,
                });
                self.position += 1;
            }
        }
    }
}

impl<'t, 'a> Iterator for Tokens<'t, 'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.done {
                return None;
            }
            let (start, end) = match self.separators.next() {
                Some(m) => {
                    let span = (self.cursor, m.start());
                    self.cursor = m.end();
                    span
                }
                None => {
                    self.done = true;
                    (self.cursor, self.text.len())
                }
            };
            if start < end {
                self.push_segment(start, end);
            }
        }
    }
}
