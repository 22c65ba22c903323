use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type TermId = u32;
pub type DocId = u32;
/// 1-based token position within a document.
pub type Position = u32;

/// One (document, term) row of the forward index with every position of the term in that document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardEntry {
    pub doc_id: DocId,
    pub term_id: TermId,
    pub positions: Vec<Position>,
}

impl ForwardEntry {
    pub fn new(doc_id: DocId, term_id: TermId, positions: Vec<Position>) -> Self {
        Self { doc_id, term_id, positions }
    }

    /// Ids and positions must be positive, positions non-empty and strictly increasing.
    pub fn validate(&self) -> Result<()> {
        if self.doc_id == 0 {
            return Err(IndexError::Validation(format!(
                "document id must be positive (term {})",
                self.term_id
            )));
        }
        if self.term_id == 0 {
            return Err(IndexError::Validation(format!(
                "term id must be positive (document {})",
                self.doc_id
            )));
        }
        if self.positions.is_empty() {
            return Err(IndexError::Validation(format!(
                "no positions for document {} term {}",
                self.doc_id, self.term_id
            )));
        }
        let mut prev = 0;
        for &pos in &self.positions {
            if pos <= prev {
                return Err(IndexError::Validation(format!(
                    "positions for document {} term {} are not positive and strictly increasing",
                    self.doc_id, self.term_id
                )));
            }
            prev = pos;
        }
        Ok(())
    }
}

/// One document's contribution to a term's posting list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub positions: Vec<Position>, // ascending
}

impl Posting {
    pub fn new(doc_id: DocId, positions: Vec<Position>) -> Self {
        Self { doc_id, positions }
    }

    pub fn frequency(&self) -> usize {
        self.positions.len()
    }
}

/// A term together with its posting list, sorted by doc id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermPostings {
    pub term_id: TermId,
    pub postings: Vec<Posting>,
}

impl TermPostings {
    pub fn total_occurrences(&self) -> u64 {
        self.postings.iter().map(|p| p.positions.len() as u64).sum()
    }

    pub fn document_count(&self) -> u32 {
        self.postings.len() as u32
    }
}

/// Catalog row: where a term's record starts in the postings file plus its corpus statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermInfo {
    pub term_id: TermId,
    pub offset: u64,
    pub total_occurrences: u64,
    pub document_count: u32,
}

impl TermInfo {
    pub fn for_postings(list: &TermPostings, offset: u64) -> Self {
        Self {
            term_id: list.term_id,
            offset,
            total_occurrences: list.total_occurrences(),
            document_count: list.document_count(),
        }
    }
}

/// In-memory inverted lists produced by [`invert`].
#[derive(Debug, Default)]
pub struct InvertedIndex {
    lists: HashMap<TermId, Vec<Posting>>, // postings sorted by doc_id
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn num_terms(&self) -> usize {
        self.lists.len()
    }

    pub fn postings(&self, term_id: TermId) -> Option<&[Posting]> {
        self.lists.get(&term_id).map(Vec::as_slice)
    }

    /// Materialize the lists once, ordered by term id. Both the postings writer and the
    /// catalog writer consume this one sequence.
    pub fn into_sorted_lists(self) -> Vec<TermPostings> {
        let mut lists: Vec<TermPostings> = self
            .lists
            .into_iter()
            .map(|(term_id, postings)| TermPostings { term_id, postings })
            .collect();
        lists.sort_unstable_by_key(|l| l.term_id);
        lists
    }
}

/// Group forward entries by term, producing doc-sorted posting lists.
///
/// Input order does not matter. Exact duplicate rows collapse into one posting; two rows for
/// the same (document, term) pair with different positions are rejected.
pub fn invert<I>(entries: I) -> Result<InvertedIndex>
where
    I: IntoIterator<Item = ForwardEntry>,
{
    let mut lists: HashMap<TermId, Vec<Posting>> = HashMap::new();
    for entry in entries {
        entry.validate()?;
        lists
            .entry(entry.term_id)
            .or_default()
            .push(Posting::new(entry.doc_id, entry.positions));
    }

    for (term_id, postings) in lists.iter_mut() {
        postings.sort_by_key(|p| p.doc_id);
        let mut i = 1;
        while i < postings.len() {
            if postings[i].doc_id == postings[i - 1].doc_id {
                if postings[i].positions != postings[i - 1].positions {
                    return Err(IndexError::Validation(format!(
                        "conflicting rows for document {} term {}",
                        postings[i].doc_id, term_id
                    )));
                }
                postings.remove(i);
            } else {
                i += 1;
            }
        }
    }

    tracing::debug!(num_terms = lists.len(), "inverted forward index");
    Ok(InvertedIndex { lists })
}
