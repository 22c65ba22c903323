use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

/// Location of every artifact of one index. `new` places them under a single directory with
/// the default file names; each field can be pointed elsewhere.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
    pub doc_ids: PathBuf,
    pub term_ids: PathBuf,
    pub forward: PathBuf,
    pub postings: PathBuf,
    pub term_info: PathBuf,
    pub meta: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            doc_ids: root.join("docids.txt"),
            term_ids: root.join("termids.txt"),
            forward: root.join("doc_index.txt"),
            postings: root.join("term_index.txt"),
            term_info: root.join("term_info.txt"),
            meta: root.join("meta.json"),
            root,
        }
    }

    pub fn create_root(&self) -> Result<()> {
        create_dir_all(&self.root)?;
        Ok(())
    }
}

/// Buffered writer over a freshly truncated file, creating parent directories as needed.
pub(crate) fn create_file(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    Ok(BufWriter::new(File::create(path)?))
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    let mut f = create_file(&paths.meta)?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    f.flush()?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(&paths.meta)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}
