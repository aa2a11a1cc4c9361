use crate::error::Result;
use crate::types::CorpusKind;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk project tree. Every stage writes its artifacts under one of
/// these five directories; nothing else is created at the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub train: PathBuf,
    pub vali: PathBuf,
    pub test: PathBuf,
    pub networks: PathBuf,
    pub split_vcfs: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            train: root.join("train"),
            vali: root.join("vali"),
            test: root.join("test"),
            networks: root.join("networks"),
            split_vcfs: root.join("splitVCFs"),
        }
    }

    /// Create the full tree. Pre-existing directories are not an error, so
    /// re-runs into the same project root just reuse it.
    pub fn create(&self) -> Result<()> {
        for dir in [
            &self.root,
            &self.train,
            &self.vali,
            &self.test,
            &self.networks,
            &self.split_vcfs,
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn corpus_dir(&self, kind: CorpusKind) -> &Path {
        match kind {
            CorpusKind::Train => &self.train,
            CorpusKind::Vali => &self.vali,
            CorpusKind::Test => &self.test,
        }
    }

    /// Calibrated priors, written before any simulation starts.
    pub fn sim_params_file(&self) -> PathBuf {
        self.networks.join("simPars.json")
    }

    /// Train batch configuration, written by the reconciler.
    pub fn batch_params_file(&self) -> PathBuf {
        self.networks.join("batchPars.json")
    }

    /// Per-chromosome window statistics, sixth column read back by the
    /// reconciler.
    pub fn window_report_file(&self) -> PathBuf {
        self.networks.join("windowSizes.txt")
    }

    pub fn model_file(&self) -> PathBuf {
        self.networks.join("model.json")
    }

    pub fn weights_file(&self) -> PathBuf {
        self.networks.join("weights.h5")
    }

    pub fn results_file(&self) -> PathBuf {
        self.networks.join("testResults.json")
    }

    pub fn results_figure(&self) -> PathBuf {
        self.networks.join("testResults.pdf")
    }

    /// Where a previously trained model lives when transfer training.
    pub fn pre_model_dir(&self) -> PathBuf {
        self.networks.join("pre_model")
    }
}
