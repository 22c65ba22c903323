//! Tab-separated flat files: document catalog, term catalog, forward index and the
//! catalog-with-offsets.

use crate::error::{IndexError, Result};
use crate::index::{DocId, ForwardEntry, TermId, TermInfo};
use crate::persist::create_file;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::str::FromStr;

type FieldResult<T> = std::result::Result<T, String>;

fn parse_field<T: FromStr>(
    field: Option<&str>,
    what: &str,
    path: &Path,
    line_no: usize,
) -> FieldResult<T> {
    let raw = field.ok_or_else(|| format!("{}:{}: missing {what}", path.display(), line_no))?;
    raw.parse()
        .map_err(|_| format!("{}:{}: bad {what} {raw:?}", path.display(), line_no))
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['\t', '\n', '\r']) {
        return Err(IndexError::Validation(format!("name {name:?} cannot be stored in a catalog")));
    }
    Ok(())
}

/// Write `id \t name` rows.
fn write_names<I: std::fmt::Display>(path: &Path, rows: &[(I, String)]) -> Result<()> {
    let mut out = create_file(path)?;
    for (id, name) in rows {
        check_name(name)?;
        writeln!(out, "{id}\t{name}")?;
    }
    out.flush()?;
    Ok(())
}

/// Read `id \t name` rows into a name -> id map.
fn read_names<I: FromStr>(path: &Path) -> Result<HashMap<String, I>> {
    let reader = BufReader::new(File::open(path)?);
    let mut map = HashMap::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let (id, name) = line.split_once('\t').ok_or_else(|| {
            IndexError::CorruptIndex(format!("{}:{}: expected id and name", path.display(), i + 1))
        })?;
        let id: I = parse_field(Some(id), "id", path, i + 1).map_err(IndexError::CorruptIndex)?;
        map.insert(name.to_string(), id);
    }
    Ok(map)
}

pub fn write_doc_catalog(path: &Path, docs: &[(DocId, String)]) -> Result<()> {
    write_names(path, docs)
}

pub fn read_doc_catalog(path: &Path) -> Result<HashMap<String, DocId>> {
    read_names(path)
}

pub fn write_term_catalog(path: &Path, terms: &[(TermId, String)]) -> Result<()> {
    write_names(path, terms)
}

pub fn read_term_catalog(path: &Path) -> Result<HashMap<String, TermId>> {
    read_names(path)
}

pub fn write_forward_index(path: &Path, entries: &[ForwardEntry]) -> Result<()> {
    let mut out = create_file(path)?;
    for e in entries {
        write!(out, "{}\t{}", e.doc_id, e.term_id)?;
        for p in &e.positions {
            write!(out, "\t{p}")?;
        }
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn parse_forward_line(line: &str, path: &Path, line_no: usize) -> FieldResult<ForwardEntry> {
    let mut fields = line.split('\t');
    let doc_id = parse_field(fields.next(), "document id", path, line_no)?;
    let term_id = parse_field(fields.next(), "term id", path, line_no)?;
    let positions = fields
        .map(|f| parse_field(Some(f), "position", path, line_no))
        .collect::<FieldResult<Vec<_>>>()?;
    Ok(ForwardEntry { doc_id, term_id, positions })
}

/// Stream forward-index rows to `f` without holding the file in memory.
pub fn scan_forward_index<F>(path: &Path, mut f: F) -> Result<()>
where
    F: FnMut(ForwardEntry) -> Result<()>,
{
    let reader = BufReader::new(File::open(path)?);
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        f(parse_forward_line(&line, path, i + 1).map_err(IndexError::Validation)?)?;
    }
    Ok(())
}

pub fn read_forward_index(path: &Path) -> Result<Vec<ForwardEntry>> {
    let mut entries = Vec::new();
    scan_forward_index(path, |e| {
        entries.push(e);
        Ok(())
    })?;
    Ok(entries)
}

pub fn write_term_info(path: &Path, infos: &[TermInfo]) -> Result<()> {
    let mut out = create_file(path)?;
    for t in infos {
        let TermInfo { term_id, offset, total_occurrences, document_count } = t;
        writeln!(out, "{term_id}\t{offset}\t{total_occurrences}\t{document_count}")?;
    }
    out.flush()?;
    Ok(())
}

fn parse_term_info_line(line: &str, path: &Path, line_no: usize) -> FieldResult<TermInfo> {
    let mut fields = line.split('\t');
    Ok(TermInfo {
        term_id: parse_field(fields.next(), "term id", path, line_no)?,
        offset: parse_field(fields.next(), "offset", path, line_no)?,
        total_occurrences: parse_field(fields.next(), "occurrence count", path, line_no)?,
        document_count: parse_field(fields.next(), "document count", path, line_no)?,
    })
}

/// Rows in file order.
pub fn read_term_info(path: &Path) -> Result<Vec<TermInfo>> {
    let reader = BufReader::new(File::open(path)?);
    let mut infos = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let info = parse_term_info_line(&line, path, i + 1).map_err(IndexError::CorruptIndex)?;
        infos.push(info);
    }
    Ok(infos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn name_catalogs_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("docids.txt");
        write_doc_catalog(&path, &[(1, "a.html".into()), (2, "sub/b.html".into())]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1\ta.html\n2\tsub/b.html\n");
        let map = read_doc_catalog(&path).unwrap();
        assert_eq!(map.get("sub/b.html"), Some(&2));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn names_with_tabs_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.txt");
        let err = write_term_catalog(&path, &[(1, "a\tb".into())]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn forward_index_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc_index.txt");
        let entries = vec![
            ForwardEntry::new(1, 5, vec![1, 3]),
            ForwardEntry::new(2, 5, vec![2]),
        ];
        write_forward_index(&path, &entries).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1\t5\t1\t3\n2\t5\t2\n");
        assert_eq!(read_forward_index(&path).unwrap(), entries);
    }

    #[test]
    fn bad_forward_rows_are_validation_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc_index.txt");
        std::fs::write(&path, "1\tfive\t1\n").unwrap();
        assert!(read_forward_index(&path).unwrap_err().is_validation());
        std::fs::write(&path, "-1\t5\t1\n").unwrap();
        assert!(read_forward_index(&path).unwrap_err().is_validation());
    }

    #[test]
    fn term_info_roundtrip_and_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("term_info.txt");
        let infos = vec![
            TermInfo { term_id: 5, offset: 0, total_occurrences: 3, document_count: 2 },
            TermInfo { term_id: 2, offset: 15, total_occurrences: 1, document_count: 1 },
        ];
        write_term_info(&path, &infos).unwrap();
        assert_eq!(read_term_info(&path).unwrap(), infos);

        std::fs::write(&path, "5\t0\t3\n").unwrap();
        assert!(read_term_info(&path).unwrap_err().is_corrupt());
    }
}
