use criterion::{criterion_group, criterion_main, Criterion};
use folio_core::{build, Document, IndexConfig, Tokenizer};

const ARTICLES: &str = "<li>Inflation returns to the ocean shipping lanes</li>\
<li>A story about the deep ocean and the people who map it</li>\
<li>Climbing tall mountains in winter: a guide</li>\
<li>Why central banks keep rates high &amp; what comes next</li>";

fn bench_tokenize(c: &mut Criterion) {
    let tokenizer = Tokenizer::default();
    c.bench_function("tokenize_articles", |b| b.iter(|| tokenizer.tokenize(ARTICLES).count()));
}

fn bench_search(c: &mut Criterion) {
    let docs: Vec<Document> = (0..200)
        .map(|i| Document::new(format!("doc-{i:03}")).with_field("title", format!("Issue {i}")).with_field("articles", ARTICLES))
        .collect();
    let index = build(&docs, IndexConfig::default()).expect("build");
    c.bench_function("search_two_terms", |b| b.iter(|| index.search("ocean mountains").expect("search")));
}

criterion_group!(benches, bench_tokenize, bench_search);
criterion_main!(benches);
