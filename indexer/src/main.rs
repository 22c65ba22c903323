use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use invert_core::build::build_index;
use invert_core::forward::tokenize_directory;
use invert_core::persist::IndexPaths;
use invert_core::reader::{DocStats, PostingLookup, TermStats};
use invert_core::tokenizer::Tokenizer;
use invert_core::IndexReader;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a positional inverted index", long_about = None)]
struct Cli {
    /// Index directory holding the catalogs and postings
    #[arg(long, global = true, default_value = "./index")]
    index: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize documents into the document catalog, term catalog and forward index
    Tokenize {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Stopword file, one word per line (defaults to the built-in English list)
        #[arg(long)]
        stopwords: Option<PathBuf>,
    },
    /// Invert the forward index into the postings file and catalog-with-offsets
    Build,
    /// Term counts for one document
    Doc {
        name: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Corpus statistics for one term
    Term {
        term: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Positions of a term within one document
    Postings {
        term: String,
        doc: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Check every catalog offset and count against the postings file
    Verify,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let paths = IndexPaths::new(&cli.index);

    match cli.command {
        Commands::Tokenize { input, stopwords } => {
            let tokenizer = match stopwords {
                Some(path) => Tokenizer::from_stopword_file(&path)
                    .with_context(|| format!("reading stopwords from {}", path.display()))?,
                None => Tokenizer::new(),
            };
            let forward = tokenize_directory(&input, &paths, tokenizer)
                .with_context(|| format!("tokenizing {}", input.display()))?;
            tracing::info!(
                docs = forward.docs.len(),
                terms = forward.terms.len(),
                index = %paths.root.display(),
                "tokenize complete"
            );
            println!("Documents: {}", forward.docs.len());
            println!("Terms: {}", forward.terms.len());
        }
        Commands::Build => {
            let report = build_index(&paths)?;
            tracing::info!(
                terms = report.num_terms,
                docs = report.num_docs,
                bytes = report.postings_bytes,
                "build complete"
            );
            println!("Terms: {}", report.num_terms);
            println!("Documents: {}", report.num_docs);
            println!("Postings bytes: {}", report.postings_bytes);
        }
        Commands::Doc { name, json } => {
            let stats = open(&paths)?.document_stats(&name)?;
            emit(&stats, json, print_doc)?;
        }
        Commands::Term { term, json } => {
            let stats = open(&paths)?.term_stats(&term)?;
            emit(&stats, json, print_term)?;
        }
        Commands::Postings { term, doc, json } => {
            let lookup = open(&paths)?.postings(&term, &doc)?;
            emit(&lookup, json, print_postings)?;
        }
        Commands::Verify => {
            let report = open(&paths)?.verify()?;
            tracing::debug!(terms = report.terms, bytes = report.bytes, "verified");
            println!("OK: {} terms, {} bytes", report.terms, report.bytes);
        }
    }
    Ok(())
}

fn open(paths: &IndexPaths) -> Result<IndexReader> {
    IndexReader::open(paths.clone())
        .with_context(|| format!("opening index at {}", paths.root.display()))
}

fn emit<T: Serialize>(value: &T, json: bool, text: fn(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text(value);
    }
    Ok(())
}

fn print_doc(s: &DocStats) {
    println!("Listing for document: {}", s.name);
    println!("DOCID: {}", s.doc_id);
    println!("Distinct terms: {}", s.distinct_terms);
    println!("Total terms: {}", s.total_terms);
}

fn print_term(s: &TermStats) {
    println!("Listing for term: {}", s.term);
    println!("TERMID: {}", s.term_id);
    println!("Number of documents containing term: {}", s.document_count);
    println!("Term frequency in corpus: {}", s.total_occurrences);
    println!("Inverted list offset: {}", s.offset);
}

fn print_postings(p: &PostingLookup) {
    println!("Inverted list for term: {}", p.term);
    println!("In document: {}", p.doc);
    println!("TERMID: {}", p.term_id);
    println!("DOCID: {}", p.doc_id);
    println!("Term frequency in document: {}", p.frequency);
    let positions: Vec<String> = p.positions.iter().map(|x| x.to_string()).collect();
    println!("Positions: {}", positions.join(", "));
}
