//! Delta-coded posting records.
//!
//! A record is one line of the postings file: the term id followed by `docDelta:posDelta`
//! pairs, tab separated. Document ids are delta coded across the whole record; positions are
//! delta coded within one document and restart from zero at each new document. A document
//! delta of `0` means "same document, next position", which is what [`DeltaPair::Continue`]
//! models.

use crate::error::{IndexError, Result};
use crate::index::{DocId, Position, Posting, TermId, TermInfo, TermPostings};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaPair {
    /// First position of a new document. `doc_delta` is never zero.
    NewDocument { doc_delta: u32, pos_delta: u32 },
    /// Next position within the current document.
    Continue { pos_delta: u32 },
}

impl DeltaPair {
    pub fn from_raw(doc_delta: u32, pos_delta: u32) -> Self {
        if doc_delta == 0 {
            DeltaPair::Continue { pos_delta }
        } else {
            DeltaPair::NewDocument { doc_delta, pos_delta }
        }
    }

    /// The `(docDelta, posDelta)` pair as stored on disk.
    pub fn to_raw(self) -> (u32, u32) {
        match self {
            DeltaPair::NewDocument { doc_delta, pos_delta } => (doc_delta, pos_delta),
            DeltaPair::Continue { pos_delta } => (0, pos_delta),
        }
    }
}

/// Encode a doc-sorted posting list. Postings must have strictly increasing doc ids starting
/// above zero and ascending positions.
pub fn encode_postings(postings: &[Posting]) -> Vec<DeltaPair> {
    let mut pairs = Vec::with_capacity(postings.iter().map(Posting::frequency).sum());
    let mut prev_doc: DocId = 0;
    for posting in postings {
        let mut prev_pos: Position = 0;
        for (i, &pos) in posting.positions.iter().enumerate() {
            let pos_delta = pos - prev_pos;
            if i == 0 {
                let doc_delta = posting.doc_id - prev_doc;
                pairs.push(DeltaPair::NewDocument { doc_delta, pos_delta });
                prev_doc = posting.doc_id;
            } else {
                pairs.push(DeltaPair::Continue { pos_delta });
            }
            prev_pos = pos;
        }
    }
    pairs
}

/// Inverse of [`encode_postings`].
pub fn decode_pairs<I>(pairs: I) -> Result<Vec<Posting>>
where
    I: IntoIterator<Item = DeltaPair>,
{
    let mut out: Vec<Posting> = Vec::new();
    let mut prev_doc: DocId = 0;
    let mut current: Option<Posting> = None;
    let mut pos: Position = 0;

    for pair in pairs {
        let pos_delta = match pair {
            DeltaPair::NewDocument { doc_delta, pos_delta } => {
                if let Some(done) = current.take() {
                    out.push(done);
                }
                let doc_id = prev_doc
                    .checked_add(doc_delta)
                    .ok_or_else(|| IndexError::CorruptIndex("document id overflow".into()))?;
                prev_doc = doc_id;
                pos = 0;
                current = Some(Posting::new(doc_id, Vec::new()));
                pos_delta
            }
            DeltaPair::Continue { pos_delta } => pos_delta,
        };
        let posting = current
            .as_mut()
            .ok_or_else(|| IndexError::CorruptIndex("position pair before any document".into()))?;
        pos = pos
            .checked_add(pos_delta)
            .ok_or_else(|| IndexError::CorruptIndex("position overflow".into()))?;
        posting.positions.push(pos);
    }

    if let Some(done) = current {
        out.push(done);
    }
    Ok(out)
}

/// Render one record line, without the trailing newline.
pub fn format_record(term_id: TermId, postings: &[Posting]) -> String {
    let mut line = term_id.to_string();
    for pair in encode_postings(postings) {
        let (d, p) = pair.to_raw();
        line.push('\t');
        line.push_str(&d.to_string());
        line.push(':');
        line.push_str(&p.to_string());
    }
    line
}

/// Parse the raw fields of one record line into its term id and pairs.
pub fn parse_pairs(line: &str) -> Result<(TermId, Vec<DeltaPair>)> {
    let line = line.trim_end_matches(['\n', '\r']);
    let mut fields = line.split('\t');
    let head = fields.next().unwrap_or_default();
    let term_id: TermId = head
        .parse()
        .map_err(|_| IndexError::CorruptIndex(format!("bad term id field {head:?}")))?;

    let mut pairs = Vec::new();
    for field in fields {
        if field.is_empty() {
            continue;
        }
        let bad = |what: &str| {
            IndexError::CorruptIndex(format!("bad {what} {field:?} in record for term {term_id}"))
        };
        let (d, p) = field.split_once(':').ok_or_else(|| bad("pair"))?;
        let d: u32 = d.parse().map_err(|_| bad("document delta"))?;
        let p: u32 = p.parse().map_err(|_| bad("position delta"))?;
        pairs.push(DeltaPair::from_raw(d, p));
    }
    Ok((term_id, pairs))
}

/// Parse and decode one record line.
pub fn parse_record(line: &str) -> Result<(TermId, Vec<Posting>)> {
    let (term_id, pairs) = parse_pairs(line)?;
    Ok((term_id, decode_pairs(pairs)?))
}

fn check_encodable(list: &TermPostings) -> Result<()> {
    if list.postings.is_empty() {
        return Err(IndexError::Validation(format!(
            "empty posting list for term {}",
            list.term_id
        )));
    }
    let mut prev_doc: DocId = 0;
    for p in &list.postings {
        let positions_ok = p.positions.first().is_some_and(|&first| first > 0)
            && p.positions.windows(2).all(|w| w[0] < w[1]);
        if p.doc_id <= prev_doc || !positions_ok {
            return Err(IndexError::Validation(format!(
                "posting for document {} of term {} is out of order",
                p.doc_id, list.term_id
            )));
        }
        prev_doc = p.doc_id;
    }
    Ok(())
}

/// Streams records to `inner`, tracking the byte offset at which each one starts.
pub struct PostingsWriter<W: Write> {
    inner: W,
    offset: u64,
}

impl<W: Write> PostingsWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, offset: 0 }
    }

    /// Bytes written so far, i.e. the offset of the next record.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn write_record(&mut self, list: &TermPostings) -> Result<TermInfo> {
        check_encodable(list)?;
        let info = TermInfo::for_postings(list, self.offset);
        let mut line = format_record(list.term_id, &list.postings);
        line.push('\n');
        self.inner.write_all(line.as_bytes())?;
        self.offset += line.len() as u64;
        Ok(info)
    }

    /// Write every list in order; the returned catalog rows follow the same order.
    pub fn write_all(&mut self, lists: &[TermPostings]) -> Result<Vec<TermInfo>> {
        lists.iter().map(|l| self.write_record(l)).collect()
    }

    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
