use serde::{Deserialize, Serialize};

use crate::document::Schema;
use crate::error::{Result, SearchError};

/// Separator used when none is configured: whitespace, hyphens, slashes,
/// angle brackets, colons and the typographic apostrophe.
pub const DEFAULT_SEPARATOR: &str = r"[\s\-/<>’:]+";

/// Which built-in stop-word list the tokenizer consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopWordList {
    English,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Regex matching one run of separator characters.
    pub separator: String,
    /// Skip `<...>` tags and `&...;` entities instead of tokenizing them.
    pub strip_markup: bool,
    pub stop_words: StopWordList,
    /// Extra stop words on top of `stop_words`, e.g. tag names that leak
    /// through markup residue.
    pub extra_stop_words: Vec<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            strip_markup: true,
            stop_words: StopWordList::English,
            extra_stop_words: vec!["li".to_string()],
        }
    }
}

impl TokenizerConfig {
    /// Checks that the separator compiles and that it splits on the
    /// characters that delimit markup, so a tag never fuses with a word, and
    /// on `:`, so no indexed term reads as a `field:term` filter.
    pub fn validate(&self) -> Result<()> {
        let re = regex::Regex::new(&self.separator)?;
        for ch in ["<", ">", "/", ":"] {
            if !re.is_match(ch) {
                return Err(SearchError::InvalidConfig(format!(
                    "separator {:?} must split on {:?}",
                    self.separator, ch
                )));
            }
        }
        if re.is_match("") {
            return Err(SearchError::InvalidConfig(format!(
                "separator {:?} matches the empty string",
                self.separator
            )));
        }
        Ok(())
    }
}

/// Inverse document frequency formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdfMode {
    /// ln(N / df)
    Plain,
    /// ln(1 + N / df)
    #[default]
    Smoothed,
}

impl IdfMode {
    pub fn idf(self, num_docs: u32, df: u32) -> f32 {
        let n = num_docs.max(1) as f32;
        let df = df.max(1) as f32;
        match self {
            IdfMode::Plain => (n / df).ln(),
            IdfMode::Smoothed => (1.0 + n / df).ln(),
        }
    }
}

/// Everything needed to build an index and to tokenize queries against it.
/// Stored inside the serialized index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub schema: Schema,
    pub tokenizer: TokenizerConfig,
    pub idf: IdfMode,
    /// When false, building from zero documents fails with `EmptyCorpus`.
    pub allow_empty_corpus: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            schema: Schema::default(),
            tokenizer: TokenizerConfig::default(),
            idf: IdfMode::default(),
            allow_empty_corpus: true,
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<()> {
        self.schema.validate()?;
        self.tokenizer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(IndexConfig::default().validate().is_ok());
    }

    #[test]
    fn separator_must_split_markup() {
        let cfg = TokenizerConfig { separator: r"[\s]+".into(), ..Default::default() };
        assert!(matches!(cfg.validate(), Err(SearchError::InvalidConfig(_))));
    }

    #[test]
    fn separator_must_split_colons() {
        let cfg = TokenizerConfig { separator: r"[\s\-/<>]+".into(), ..Default::default() };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, SearchError::InvalidConfig(msg) if msg.contains(r#"":""#)));
    }

    #[test]
    fn separator_must_compile() {
        let cfg = TokenizerConfig { separator: r"[\s".into(), ..Default::default() };
        assert!(matches!(cfg.validate(), Err(SearchError::InvalidConfig(_))));
    }

    #[test]
    fn smoothed_idf_stays_positive() {
        assert_eq!(IdfMode::Plain.idf(2, 2), 0.0);
        assert!(IdfMode::Smoothed.idf(2, 2) > 0.0);
        assert!(IdfMode::Smoothed.idf(10, 1) > IdfMode::Smoothed.idf(10, 5));
    }
}
