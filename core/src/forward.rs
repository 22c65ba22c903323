//! Default forward-index source: walks a directory of documents, strips markup and runs the
//! tokenizer, producing the document catalog, term catalog and forward index.

use crate::catalog::{write_doc_catalog, write_forward_index, write_term_catalog};
use crate::error::{IndexError, Result};
use crate::index::{DocId, ForwardEntry, Position, TermId};
use crate::persist::IndexPaths;
use crate::tokenizer::Tokenizer;
use lazy_static::lazy_static;
use scraper::{Html, Node, Selector};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

lazy_static! {
    static ref BODY: Selector = Selector::parse("body").expect("valid selector");
}

/// Visible body text of an HTML document. Plain text comes back unchanged apart from
/// whitespace between text nodes.
pub fn extract_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let Some(body) = doc.select(&BODY).next() else {
        return String::new();
    };
    let mut parts: Vec<&str> = Vec::new();
    for node in body.descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element())
                .is_some_and(|e| matches!(e.name(), "script" | "style"));
            if !hidden {
                parts.push(&text[..]);
            }
        }
    }
    parts.join(" ")
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ForwardIndex {
    pub docs: Vec<(DocId, String)>,
    pub terms: Vec<(TermId, String)>,
    pub entries: Vec<ForwardEntry>,
}

fn remove_stale(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed stale artifact");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

impl ForwardIndex {
    /// Write the three forward artifacts. Postings, catalog-with-offsets and metadata from an
    /// earlier build refer to the old term ids, so they are removed.
    pub fn save(&self, paths: &IndexPaths) -> Result<()> {
        paths.create_root()?;
        remove_stale(&paths.postings)?;
        remove_stale(&paths.term_info)?;
        remove_stale(&paths.meta)?;
        write_doc_catalog(&paths.doc_ids, &self.docs)?;
        write_term_catalog(&paths.term_ids, &self.terms)?;
        write_forward_index(&paths.forward, &self.entries)?;
        Ok(())
    }
}

/// Assigns document ids in insertion order and term ids at first sight, both from 1.
#[derive(Debug, Default)]
pub struct ForwardIndexBuilder {
    tokenizer: Tokenizer,
    dictionary: HashMap<String, TermId>,
    out: ForwardIndex,
}

impl ForwardIndexBuilder {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer, ..Self::default() }
    }

    /// Add a plain-text document.
    pub fn add_text(&mut self, name: &str, text: &str) -> DocId {
        let doc_id = self.out.docs.len() as DocId + 1;
        self.out.docs.push((doc_id, name.to_string()));

        // entries in first-occurrence order of the term within this document
        let mut slot: HashMap<TermId, usize> = HashMap::new();
        let mut rows: Vec<(TermId, Vec<Position>)> = Vec::new();
        for (term, pos) in self.tokenizer.tokenize(text) {
            let term_id = match self.dictionary.get(&term) {
                Some(&id) => id,
                None => {
                    let id = self.out.terms.len() as TermId + 1;
                    self.out.terms.push((id, term.clone()));
                    self.dictionary.insert(term, id);
                    id
                }
            };
            let i = *slot.entry(term_id).or_insert_with(|| {
                rows.push((term_id, Vec::new()));
                rows.len() - 1
            });
            rows[i].1.push(pos);
        }

        let entries = rows
            .into_iter()
            .map(|(term_id, positions)| ForwardEntry { doc_id, term_id, positions });
        self.out.entries.extend(entries);
        doc_id
    }

    pub fn add_html(&mut self, name: &str, html: &str) -> DocId {
        self.add_text(name, &extract_text(html))
    }

    pub fn num_docs(&self) -> usize {
        self.out.docs.len()
    }

    pub fn num_terms(&self) -> usize {
        self.out.terms.len()
    }

    pub fn finish(self) -> ForwardIndex {
        self.out
    }
}

fn document_files(input: &Path) -> Result<Vec<(PathBuf, String)>> {
    let meta = std::fs::metadata(input).map_err(|err| {
        IndexError::Io(io::Error::new(err.kind(), format!("input {}: {err}", input.display())))
    })?;
    if meta.is_file() {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        return Ok(vec![(input.to_path_buf(), name)]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) if err.depth() == 0 => return Err(IndexError::Io(err.into())),
            Err(err) => {
                tracing::warn!(%err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(input).unwrap_or(entry.path());
        let name = rel.to_string_lossy().replace('\\', "/");
        files.push((entry.path().to_path_buf(), name));
    }
    Ok(files)
}

/// Tokenize every file under `input` and write the three forward artifacts to `paths`.
pub fn tokenize_directory(
    input: &Path,
    paths: &IndexPaths,
    tokenizer: Tokenizer,
) -> Result<ForwardIndex> {
    let files = document_files(input)?;
    let mut builder = ForwardIndexBuilder::new(tokenizer);
    for (file, name) in files {
        if name.contains(['\t', '\n', '\r']) {
            tracing::warn!(file = %file.display(), "skipping document with unstorable name");
            continue;
        }
        let bytes = match std::fs::read(&file) {
            Ok(b) => b,
            Err(err) => {
                tracing::warn!(file = %file.display(), %err, "skipping unreadable document");
                continue;
            }
        };
        let doc_id = builder.add_html(&name, &String::from_utf8_lossy(&bytes));
        tracing::debug!(doc_id, name, "tokenized");
        if builder.num_docs() % 1000 == 0 {
            tracing::info!(docs = builder.num_docs(), terms = builder.num_terms(), "progress");
        }
    }

    let forward = builder.finish();
    forward.save(paths)?;
    tracing::info!(
        num_docs = forward.docs.len(),
        num_terms = forward.terms.len(),
        rows = forward.entries.len(),
        "wrote forward index"
    );
    Ok(forward)
}
