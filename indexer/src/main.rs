use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use folio_core::persist::{deserialize, serialize, IndexFormat, FORMAT_VERSION};
use folio_core::{Document, IdfMode, IndexBuilder, IndexConfig, InvertedIndex, Schema, SearchHit, SearchOptions};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "folio-indexer")]
#[command(about = "Build and query a positional full-text index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Bin,
}

impl From<Format> for IndexFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Json => IndexFormat::Json,
            Format::Bin => IndexFormat::Binary,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a JSON/JSONL file, a directory of them, or stdin
    Build {
        /// Input path (file, directory, or "-" for stdin)
        #[arg(long, default_value = "-")]
        input: String,
        /// Output index file ("-" for stdout)
        #[arg(long, default_value = "-")]
        output: String,
        /// JSON file with an index configuration
        #[arg(long)]
        config: Option<PathBuf>,
        /// Comma-separated field list, overrides the configured schema
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
        /// Use IDF = ln(N/df) instead of the smoothed ln(1 + N/df)
        #[arg(long, default_value_t = false)]
        plain_idf: bool,
        /// Wire format; defaults to the output file extension (.bin is binary)
        #[arg(long, value_enum)]
        format: Option<Format>,
    },
    /// Run one query against a serialized index
    Search {
        /// Serialized index file
        #[arg(long)]
        index: PathBuf,
        /// Query text, e.g. "ocean title:tales"
        #[arg(long)]
        query: String,
        /// Maximum number of hits to print
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// Reject queries shorter than this many characters
        #[arg(long, default_value_t = 0)]
        min_query_len: usize,
        /// Documents to highlight hits against
        #[arg(long)]
        docs: Option<String>,
        #[arg(long, value_enum)]
        format: Option<Format>,
    },
}

#[derive(Debug, Serialize)]
struct MetaFile {
    num_docs: u32,
    num_terms: usize,
    created_at: String,
    version: u32,
}

#[derive(Serialize)]
struct HitOutput<'a> {
    #[serde(flatten)]
    hit: &'a SearchHit,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    highlighted: BTreeMap<String, String>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, config, fields, plain_idf, format } => {
            let config = load_config(config.as_deref(), fields, plain_idf)?;
            build_index(&input, &output, config, format)
        }
        Commands::Search { index, query, k, min_query_len, docs, format } => {
            run_search(&index, &query, k, min_query_len, docs.as_deref(), format)
        }
    }
}

fn load_config(path: Option<&Path>, fields: Option<Vec<String>>, plain_idf: bool) -> Result<IndexConfig> {
    let mut config = match path {
        Some(p) => {
            let text = fs::read_to_string(p).with_context(|| format!("reading config {}", p.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", p.display()))?
        }
        None => IndexConfig::default(),
    };
    if let Some(fields) = fields {
        config.schema = Schema { unknown_fields: config.schema.unknown_fields, ..Schema::new(fields) };
    }
    if plain_idf {
        config.idf = IdfMode::Plain;
    }
    Ok(config)
}

fn build_index(input: &str, output: &str, config: IndexConfig, format: Option<Format>) -> Result<()> {
    let builder = IndexBuilder::new(config)?;
    let documents = read_documents(input)?;
    tracing::info!(num_docs = documents.len(), "ingested documents");

    let index = builder.build(&documents)?;
    let format = resolve_format(format, output);
    let bytes = serialize(&index, format)?;

    if output == "-" {
        io::stdout().lock().write_all(&bytes)?;
    } else {
        let out_path = Path::new(output);
        if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(out_path, &bytes).with_context(|| format!("writing {output}"))?;
        let meta = MetaFile {
            num_docs: index.num_docs(),
            num_terms: index.num_terms(),
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "".into()),
            version: FORMAT_VERSION,
        };
        fs::write(meta_path(out_path), serde_json::to_string_pretty(&meta)?)?;
    }

    tracing::info!(output, "index build complete");
    Ok(())
}

fn run_search(
    index_path: &Path,
    query: &str,
    k: usize,
    min_query_len: usize,
    docs: Option<&str>,
    format: Option<Format>,
) -> Result<()> {
    if query.trim().chars().count() < min_query_len {
        bail!("search text too short: need at least {min_query_len} characters");
    }
    let index = load_index(index_path, format)?;
    let results = index.search_with(query, &SearchOptions { limit: Some(k) })?;

    let sources: HashMap<String, Document> = match docs {
        Some(input) => read_documents(input)?.into_iter().map(|d| (d.id.clone(), d)).collect(),
        None => HashMap::new(),
    };
    let hits: Vec<HitOutput> = results
        .hits
        .iter()
        .map(|hit| HitOutput { hit, highlighted: highlight_hit(&index, hit, sources.get(&hit.id)) })
        .collect();

    let out = serde_json::json!({
        "query": results.query,
        "total_hits": results.total_hits,
        "results": hits,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn highlight_hit(index: &InvertedIndex, hit: &SearchHit, doc: Option<&Document>) -> BTreeMap<String, String> {
    let Some(doc) = doc else { return BTreeMap::new() };
    hit.matches
        .iter()
        .filter_map(|(field, spans)| {
            let html = doc.field(field)?;
            Some((field.clone(), index.highlight(html, spans)))
        })
        .collect()
}

fn load_index(path: &Path, format: Option<Format>) -> Result<InvertedIndex> {
    let mut buf = Vec::new();
    File::open(path)
        .with_context(|| format!("opening index {}", path.display()))?
        .read_to_end(&mut buf)?;
    let format = format.map_or_else(|| IndexFormat::from_path(path), IndexFormat::from);
    Ok(deserialize(&buf, format)?)
}

fn resolve_format(format: Option<Format>, output: &str) -> IndexFormat {
    format.map_or_else(|| IndexFormat::from_path(Path::new(output)), IndexFormat::from)
}

fn meta_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".meta.json");
    output.with_file_name(name)
}

/// Read documents from a JSON array/object file, a JSONL file, a directory
/// of such files, or stdin when `input` is "-".
fn read_documents(input: &str) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    if input == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        parse_documents(&text, &mut documents)?;
        return Ok(documents);
    }

    let input_path = Path::new(input);
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        bail!("input {input} does not exist");
    }

    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut documents)?;
        } else {
            let text = fs::read_to_string(&file)?;
            parse_documents(&text, &mut documents).with_context(|| format!("parsing {}", file.display()))?;
        }
    }
    Ok(documents)
}

fn read_jsonl(file: &Path, documents: &mut Vec<Document>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: Document = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), n + 1))?;
        documents.push(doc);
    }
    Ok(())
}

fn parse_documents(text: &str, documents: &mut Vec<Document>) -> Result<()> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                documents.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => documents.push(serde_json::from_value(json)?),
        _ => bail!("expected a document or an array of documents"),
    }
    Ok(())
}
