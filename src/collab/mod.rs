//! Seams to the external collaborators: the variant-call windower, the
//! coalescent simulation engine, the trainer, and the plotter. The pipeline
//! only ever talks to these traits; production wires in the subprocess
//! adapters from [`process`], tests substitute deterministic doubles.

pub mod process;

use crate::error::Result;
use crate::types::{
    ChromosomeRange, MaskScan, ReplicateDraw, ReplicateResult, SimulationParameterSet,
    TrainingRequest, WindowScan, WindowStats,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use process::{ProcessPlotter, ProcessSimulator, ProcessTrainer, ProcessWindower};

/// Everything the windowing collaborator needs to split the variant-call
/// file and scan windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowingContext {
    pub vcf: PathBuf,
    pub mask: Option<PathBuf>,
    pub chromosomes: Vec<ChromosomeRange>,
    pub max_sites: usize,
    /// Non-zero forces a fixed window size instead of inferring one.
    pub force_window_size: u64,
    pub force_diploid: bool,
    pub split_dir: PathBuf,
    pub seed: Option<u64>,
}

/// Splits the input per chromosome, counts segregating sites per window,
/// and intersects windows with the accessibility mask.
pub trait Windower {
    fn split_input(&self, ctx: &WindowingContext, workers: usize) -> Result<()>;

    fn count_sites(&self, ctx: &WindowingContext, workers: usize) -> Result<WindowScan>;

    fn apply_mask(
        &self,
        ctx: &WindowingContext,
        stats: &[WindowStats],
        max_window_length: u64,
        workers: usize,
    ) -> Result<MaskScan>;
}

/// Runs one coalescent replicate against the calibrated priors and writes
/// its tree sequence to `out`. Implementations are shared across the worker
/// pool, so they must be safe to call from multiple threads at once.
pub trait SimulationEngine: Sync {
    fn run_replicate(
        &self,
        params: &SimulationParameterSet,
        draw: &ReplicateDraw,
        out: &Path,
    ) -> Result<ReplicateResult>;
}

/// Trains on the train/vali generators, evaluates on test, and leaves a
/// results record at the path named in the request.
pub trait Trainer {
    fn train(&self, request: &TrainingRequest) -> Result<PathBuf>;
}

/// Renders a static report from a results record.
pub trait Plotter {
    fn plot(&self, results: &Path, out: &Path) -> Result<()>;
}
