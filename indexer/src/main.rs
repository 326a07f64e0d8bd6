use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use searchindex_core::book::FieldBoost;
use searchindex_core::persist::{load_search_index, write_search_index, OutputPaths};
use searchindex_core::tokenizer::analyze;
use searchindex_core::{Chapter, ResultsOptions, SearchIndexBuilder, SearchOptions};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build elasticlunr-compatible search indexes for rendered books", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build searchindex.js from chapter JSON/JSONL files or a directory of them
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output directory
        #[arg(long)]
        output: String,
        /// Also write searchindex.json next to searchindex.js
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Keep only placeholders in the document store
        #[arg(long, default_value_t = false)]
        no_save_docs: bool,
        #[arg(long, default_value_t = 30)]
        limit_results: u32,
        #[arg(long, default_value_t = 30)]
        teaser_word_count: u32,
        #[arg(long, default_value_t = 2)]
        title_boost: u32,
    },
    /// Look up terms in a built index
    Inspect {
        /// Path to searchindex.js or searchindex.json
        #[arg(long)]
        index: String,
        /// Restrict the lookup to one field
        #[arg(long)]
        field: Option<String>,
        /// Terms to look up; each is analyzed the same way documents are
        terms: Vec<String>,
    },
}

/// Settings for one `build` run.
#[derive(Debug, Clone)]
struct IndexConfig {
    input: PathBuf,
    output: PathBuf,
    write_json: bool,
    save_docs: bool,
    results_options: ResultsOptions,
    search_options: SearchOptions,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, json, no_save_docs, limit_results, teaser_word_count, title_boost } => {
            let mut search_options = SearchOptions::default();
            search_options.fields.insert("title".to_string(), FieldBoost { boost: title_boost });
            let config = IndexConfig {
                input: PathBuf::from(input),
                output: PathBuf::from(output),
                write_json: json,
                save_docs: !no_save_docs,
                results_options: ResultsOptions { limit_results, teaser_word_count },
                search_options,
            };
            build_index(&config)
        }
        Commands::Inspect { index, field, terms } => inspect(Path::new(&index), field.as_deref(), &terms),
    }
}

fn build_index(config: &IndexConfig) -> Result<()> {
    let files = collect_input_files(&config.input);
    tracing::info!(num_files = files.len(), input = %config.input.display(), "reading chapters");

    let mut builder = SearchIndexBuilder::with_save_docs(
        config.results_options.clone(),
        config.search_options.clone(),
        config.save_docs,
    );
    for file in files {
        let chapters = read_chapters(&file)?;
        tracing::debug!(file = %file.display(), chapters = chapters.len(), "loaded chapters");
        builder.add_chapters(&chapters);
    }
    let index = builder.finish();

    write_search_index(&OutputPaths::new(&config.output), &index, config.write_json)?;
    tracing::info!(num_docs = index.doc_urls.len(), output = %config.output.display(), "index build complete");
    Ok(())
}

/// A single file, or every `.json`/`.jsonl` file under a directory in path order.
fn collect_input_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

/// `.jsonl`: one chapter per line. `.json`: a chapter array or a single chapter.
fn read_chapters(file: &Path) -> Result<Vec<Chapter>> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        let mut chapters = Vec::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            let chapter: Chapter = serde_json::from_str(&line)
                .with_context(|| format!("{}:{}", file.display(), n + 1))?;
            chapters.push(chapter);
        }
        return Ok(chapters);
    }

    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(|v| serde_json::from_value(v).with_context(|| format!("chapter in {}", file.display())))
            .collect(),
        serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(json)?]),
        _ => {
            tracing::warn!(file = %file.display(), "ignoring file without chapters");
            Ok(Vec::new())
        }
    }
}

fn inspect(path: &Path, field: Option<&str>, terms: &[String]) -> Result<()> {
    let search_index = load_search_index(path)?;
    let index = &search_index.index;
    let fields: Vec<&str> = match field {
        Some(f) => vec![f],
        None => index.fields().iter().map(String::as_str).filter(|f| *f != index.ref_field()).collect(),
    };
    println!("{} documents, fields: {}", index.document_store().len(), fields.join(", "));

    for term in terms {
        for stemmed in analyze(term) {
            for f in &fields {
                let Some(inverted) = index.field_index(f) else {
                    tracing::warn!(field = %f, "field not in index");
                    continue;
                };
                let df = inverted.get_doc_frequency(&stemmed);
                println!("{term} -> {stemmed} [{f}] df={df}");
                let Some(docs) = inverted.get_docs(&stemmed) else { continue };
                for (doc_ref, tf) in ordered_postings(docs) {
                    let url = search_index.doc_url(doc_ref).unwrap_or("-");
                    println!("  {doc_ref}\ttf={tf:.4}\t{url}");
                }
            }
        }
    }
    Ok(())
}

/// Postings in `doc_urls` order: numeric refs by value, any others after them by text.
fn ordered_postings(docs: &HashMap<String, f64>) -> Vec<(&String, &f64)> {
    let mut postings: Vec<(&String, &f64)> = docs.iter().collect();
    postings.sort_by(|a, b| ref_order(a.0).cmp(&ref_order(b.0)));
    postings
}

fn ref_order(doc_ref: &str) -> (bool, u64, &str) {
    let pos = doc_ref.parse::<u64>().ok();
    (pos.is_none(), pos.unwrap_or(0), doc_ref)
}
