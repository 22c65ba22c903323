use crate::catalog::{read_doc_catalog, read_forward_index, write_term_info};
use crate::codec::PostingsWriter;
use crate::error::Result;
use crate::index::{invert, DocId, ForwardEntry, TermInfo, TermPostings};
use crate::persist::{create_file, now_rfc3339, save_meta, IndexPaths, MetaFile, FORMAT_VERSION};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub num_docs: u32,
    pub num_terms: u32,
    pub postings_bytes: u64,
}

/// Invert the forward index at `paths.forward` and write the postings file, the
/// catalog-with-offsets and the metadata file. Prior artifacts are replaced.
pub fn build_index(paths: &IndexPaths) -> Result<BuildReport> {
    let entries = read_forward_index(&paths.forward)?;
    tracing::info!(rows = entries.len(), path = %paths.forward.display(), "read forward index");
    build_from_entries(paths, entries)
}

/// Documents with no indexed terms have no forward rows, so the document catalog is the count
/// of record when it exists.
fn count_documents(paths: &IndexPaths, entries: &[ForwardEntry]) -> Result<u32> {
    let in_entries = entries.iter().map(|e| e.doc_id).collect::<HashSet<DocId>>().len();
    if !paths.doc_ids.exists() {
        return Ok(in_entries as u32);
    }
    let catalogued = read_doc_catalog(&paths.doc_ids)?.len();
    Ok(catalogued.max(in_entries) as u32)
}

pub fn build_from_entries(paths: &IndexPaths, entries: Vec<ForwardEntry>) -> Result<BuildReport> {
    let num_docs = count_documents(paths, &entries)?;
    let lists = invert(entries)?.into_sorted_lists();
    tracing::info!(num_terms = lists.len(), num_docs, "inverted");

    let (infos, postings_bytes) = write_postings(paths, &lists)?;
    write_term_info(&paths.term_info, &infos)?;
    tracing::info!(
        bytes = postings_bytes,
        path = %paths.postings.display(),
        "wrote postings and catalog"
    );

    let report = BuildReport { num_docs, num_terms: lists.len() as u32, postings_bytes };
    let meta = MetaFile {
        num_docs,
        num_terms: report.num_terms,
        created_at: now_rfc3339(),
        version: FORMAT_VERSION,
    };
    save_meta(paths, &meta)?;
    Ok(report)
}

/// Stream `lists` to the postings file. The returned catalog rows are in the order of `lists`.
fn write_postings(paths: &IndexPaths, lists: &[TermPostings]) -> Result<(Vec<TermInfo>, u64)> {
    let mut writer = PostingsWriter::new(create_file(&paths.postings)?);
    let infos = writer.write_all(lists)?;
    let bytes = writer.offset();
    writer.finish()?;
    Ok((infos, bytes))
}
