//! Read-only lookups against a built index.

use crate::catalog::{read_doc_catalog, read_term_catalog, read_term_info, scan_forward_index};
use crate::codec::parse_record;
use crate::error::{IndexError, Missing, Result};
use crate::index::{DocId, Position, Posting, TermId, TermInfo};
use crate::persist::IndexPaths;
use crate::tokenizer::normalize_term;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocStats {
    pub name: String,
    pub doc_id: DocId,
    pub distinct_terms: u32,
    pub total_terms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermStats {
    pub term: String,
    pub normalized: String,
    pub term_id: TermId,
    pub offset: u64,
    pub total_occurrences: u64,
    pub document_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostingLookup {
    pub term: String,
    pub doc: String,
    pub term_id: TermId,
    pub doc_id: DocId,
    pub frequency: usize,
    pub positions: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub terms: usize,
    pub bytes: u64,
}

/// Holds the three catalogs in memory. The postings file and forward index are opened per
/// call, so one reader can serve any number of independent lookups.
#[derive(Debug, Clone)]
pub struct IndexReader {
    paths: IndexPaths,
    docs: HashMap<String, DocId>,
    terms: HashMap<String, TermId>,
    term_info: HashMap<TermId, TermInfo>,
    info_order: Vec<TermInfo>,
}

impl IndexReader {
    pub fn open(paths: IndexPaths) -> Result<Self> {
        let docs = read_doc_catalog(&paths.doc_ids)?;
        let terms = read_term_catalog(&paths.term_ids)?;
        let info_order = read_term_info(&paths.term_info)?;
        let term_info = info_order.iter().map(|t| (t.term_id, *t)).collect();
        tracing::debug!(docs = docs.len(), terms = terms.len(), "loaded catalogs");
        Ok(Self { paths, docs, terms, term_info, info_order })
    }

    pub fn paths(&self) -> &IndexPaths {
        &self.paths
    }

    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn doc_id(&self, name: &str) -> Result<DocId> {
        self.docs
            .get(name)
            .copied()
            .ok_or_else(|| IndexError::not_found(Missing::Document, name))
    }

    /// Normalize `raw` the way indexed tokens were and resolve it.
    pub fn term_id(&self, raw: &str) -> Result<(String, TermId)> {
        let normalized =
            normalize_term(raw).ok_or_else(|| IndexError::not_found(Missing::Term, raw))?;
        match self.terms.get(&normalized) {
            Some(&id) => Ok((normalized, id)),
            None => Err(IndexError::not_found(Missing::Term, raw)),
        }
    }

    fn info(&self, term_id: TermId, raw: &str) -> Result<TermInfo> {
        self.term_info
            .get(&term_id)
            .copied()
            .ok_or_else(|| IndexError::not_found(Missing::TermInfo, raw))
    }

    /// Distinct and total term counts for one document.
    pub fn document_stats(&self, name: &str) -> Result<DocStats> {
        let doc_id = self.doc_id(name)?;
        let mut distinct_terms = 0u32;
        let mut total_terms = 0u64;
        scan_forward_index(&self.paths.forward, |e| {
            if e.doc_id == doc_id {
                distinct_terms += 1;
                total_terms += e.positions.len() as u64;
            }
            Ok(())
        })?;
        Ok(DocStats { name: name.to_string(), doc_id, distinct_terms, total_terms })
    }

    pub fn term_stats(&self, raw: &str) -> Result<TermStats> {
        let (normalized, term_id) = self.term_id(raw)?;
        let info = self.info(term_id, raw)?;
        Ok(TermStats {
            term: raw.to_string(),
            normalized,
            term_id,
            offset: info.offset,
            total_occurrences: info.total_occurrences,
            document_count: info.document_count,
        })
    }

    /// Positions of `raw_term` in `doc`. A document that does not contain the term yields an
    /// empty result rather than an error.
    pub fn postings(&self, raw_term: &str, doc: &str) -> Result<PostingLookup> {
        let (_, term_id) = self.term_id(raw_term)?;
        let doc_id = self.doc_id(doc)?;
        let info = self.info(term_id, raw_term)?;

        let positions = self
            .read_record(term_id, info.offset)?
            .into_iter()
            .find(|p| p.doc_id == doc_id)
            .map(|p| p.positions)
            .unwrap_or_default();

        Ok(PostingLookup {
            term: raw_term.to_string(),
            doc: doc.to_string(),
            term_id,
            doc_id,
            frequency: positions.len(),
            positions,
        })
    }

    /// Seek to `offset` in the postings file and decode the single record found there.
    pub fn read_record(&self, term_id: TermId, offset: u64) -> Result<Vec<Posting>> {
        let mut reader = BufReader::new(File::open(&self.paths.postings)?);
        reader.seek(SeekFrom::Start(offset))?;
        let line = read_line(&mut reader)?.ok_or_else(|| {
            IndexError::CorruptIndex(format!(
                "offset {offset} for term {term_id} is past end of postings"
            ))
        })?;
        let (found, postings) = parse_record(&line)?;
        if found != term_id {
            return Err(IndexError::CorruptIndex(format!(
                "expected term {term_id} at offset {offset}, found term {found}"
            )));
        }
        Ok(postings)
    }

    /// Walk the postings file front to back alongside the catalog, checking that every
    /// offset, count and ordering agrees.
    pub fn verify(&self) -> Result<VerifyReport> {
        let mut reader = BufReader::new(File::open(&self.paths.postings)?);
        let mut offset = 0u64;

        for info in &self.info_order {
            if info.offset != offset {
                return Err(IndexError::CorruptIndex(format!(
                    "term {} catalogued at offset {}, record starts at {offset}",
                    info.term_id, info.offset
                )));
            }
            let line = read_line(&mut reader)?.ok_or_else(|| {
                IndexError::CorruptIndex(format!("postings file ends before term {}", info.term_id))
            })?;
            offset += line.len() as u64;

            let (found, postings) = parse_record(&line)?;
            if found != info.term_id {
                return Err(IndexError::CorruptIndex(format!(
                    "expected term {} at offset {}, found term {found}",
                    info.term_id, info.offset
                )));
            }
            check_counts(info, &postings)?;
            check_sorted(found, &postings)?;
        }

        if read_line(&mut reader)?.is_some() {
            return Err(IndexError::CorruptIndex(
                "postings file has records missing from the catalog".into(),
            ));
        }
        tracing::info!(terms = self.info_order.len(), bytes = offset, "index verified");
        Ok(VerifyReport { terms: self.info_order.len(), bytes: offset })
    }
}

/// Next line including its terminator, or `None` at end of file.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| IndexError::CorruptIndex("postings record is not UTF-8".into()))
}

fn check_counts(info: &TermInfo, postings: &[Posting]) -> Result<()> {
    let total: u64 = postings.iter().map(|p| p.positions.len() as u64).sum();
    if total != info.total_occurrences || postings.len() as u32 != info.document_count {
        return Err(IndexError::CorruptIndex(format!(
            "term {}: catalog says {} occurrences in {} documents, record has {total} in {}",
            info.term_id,
            info.total_occurrences,
            info.document_count,
            postings.len()
        )));
    }
    Ok(())
}

fn check_sorted(term_id: TermId, postings: &[Posting]) -> Result<()> {
    let docs_sorted = postings.windows(2).all(|w| w[0].doc_id < w[1].doc_id);
    let positions_sorted = postings.iter().all(|p| {
        p.positions.first().is_some_and(|&first| first > 0)
            && p.positions.windows(2).all(|w| w[0] < w[1])
    });
    if !docs_sorted || !positions_sorted {
        return Err(IndexError::CorruptIndex(format!("term {term_id}: postings out of order")));
    }
    Ok(())
}
