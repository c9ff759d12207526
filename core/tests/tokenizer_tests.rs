use folio_core::{StopWordList, Tokenizer, TokenizerConfig};

#[test]
fn it_normalizes_case_and_width() {
    let tok = Tokenizer::default();
    let toks = tok.tokenize("Ｏｃｅａｎ TALES café");
    let words: Vec<String> = toks.map(|t| t.term).collect();
    assert_eq!(words, vec!["ocean", "tales", "café"]);
}

#[test]
fn it_filters_stopwords() {
    let tok = Tokenizer::default();
    let words: Vec<String> = tok.index_terms("The quick brown fox and the lazy dog").map(|t| t.term).collect();
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert!(words.contains(&"fox".to_string()));
}

#[test]
fn it_never_splits_inside_markup() {
    let tok = Tokenizer::default();
    let words: Vec<String> = tok
        .tokenize(r#"<a href="/x/y">link</a>&amp;<span class="tags">#news</span>"#)
        .map(|t| t.term)
        .collect();
    assert_eq!(words, vec!["link", "news"]);
}

#[test]
fn it_is_restartable() {
    let tok = Tokenizer::default();
    let text = "ocean tales, ocean air";
    let first: Vec<_> = tok.tokenize(text).collect();
    let second: Vec<_> = tok.tokenize(text).collect();
    assert_eq!(first, second);
}

#[test]
fn custom_configuration() {
    let config = TokenizerConfig {
        separator: r"[\s/<>:]+".into(),
        stop_words: StopWordList::None,
        extra_stop_words: vec!["Ocean".into()],
        ..Default::default()
    };
    let tok = Tokenizer::new(&config).unwrap();
    // hyphen no longer separates
    let words: Vec<String> = tok.index_terms("the deep-sea ocean").map(|t| t.term).collect();
    assert_eq!(words, vec!["the", "deep-sea"]);
}

#[test]
fn markup_can_be_tokenized_when_not_stripped() {
    let config = TokenizerConfig { strip_markup: false, ..Default::default() };
    let tok = Tokenizer::new(&config).unwrap();
    let raw: Vec<String> = tok.tokenize("<li>hello</li>").map(|t| t.term).collect();
    assert_eq!(raw, vec!["li", "hello", "li"]);
    let kept: Vec<String> = tok.index_terms("<li>hello</li>").map(|t| t.term).collect();
    assert_eq!(kept, vec!["hello"]);
}
