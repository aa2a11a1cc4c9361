use crate::error::Result;
use crate::records;
use crate::types::SCHEMA_VERSION;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the summary record written beside a corpus's tree files.
pub const INFO_FILE: &str = "info.json";

/// Tree-sequence file for one replicate, keyed by replicate index.
pub fn replicate_file(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("{index}.trees"))
}

/// Summary of one simulated corpus. `seg_sites` keeps replicate order, so
/// entry `i` describes `i.trees`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusInfo {
    pub schema: u32,
    pub seg_sites: Vec<usize>,
    pub num_replicates: usize,
}

impl CorpusInfo {
    pub fn new(seg_sites: Vec<usize>) -> Self {
        let num_replicates = seg_sites.len();
        Self {
            schema: SCHEMA_VERSION,
            seg_sites,
            num_replicates,
        }
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        records::write_json(&dir.join(INFO_FILE), self)
    }

    pub fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(INFO_FILE);
        let info: CorpusInfo = records::read_json(&path)?;
        records::check_schema(info.schema, &path)?;
        Ok(info)
    }

    pub fn max_seg_sites(&self) -> usize {
        self.seg_sites.iter().copied().max().unwrap_or(0)
    }

    pub fn min_seg_sites(&self) -> usize {
        self.seg_sites.iter().copied().min().unwrap_or(0)
    }
}
