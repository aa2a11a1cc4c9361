use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Version stamped into every record the pipeline persists. Readers reject
/// records carrying a different version instead of guessing at their layout.
pub const SCHEMA_VERSION: u32 = 1;

/// One row of the genome range file: a chromosome span to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChromosomeRange {
    pub name: String,
    pub start: u64,
    pub end: u64,
}

impl ChromosomeRange {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Label used in operator-facing reports, e.g. `chr2:0-1200000`.
    pub fn label(&self) -> String {
        format!("{}:{}-{}", self.name, self.start, self.end)
    }
}

/// Window statistics for one chromosome, as reported by the windowing
/// collaborator: the inferred window length and the spread of per-window
/// segregating-site counts across that chromosome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Chromosome label in range form, e.g. `chr2L:0-23011544`.
    pub chromosome: String,
    pub window_length: u64,
    pub n_windows: usize,
    pub min_sites: usize,
    pub mean_sites: f64,
    pub max_sites: usize,
}

/// Aggregate output of the windowing collaborator's site scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowScan {
    /// One entry per chromosome, in genome-file order.
    pub stats: Vec<WindowStats>,
    /// Haplotypes sampled in the variant-call file.
    pub sample_count: usize,
    /// Largest per-window segregating-site count across all chromosomes.
    pub max_site_count: usize,
    /// Largest window length in bases across all chromosomes.
    pub max_window_length: u64,
}

/// Inaccessible spans for one window, in window-relative coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowMask {
    pub inaccessible_fraction: f64,
    pub spans: Vec<(u64, u64)>,
}

/// Result of intersecting retained windows with the accessibility mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskScan {
    /// Genome-wide fraction of masked sites across retained windows.
    pub mask_fraction: f64,
    /// One entry per retained window.
    pub window_masks: Vec<WindowMask>,
}

/// Per-chromosome missing-data rows left behind by the splitting stage,
/// one file per chromosome, concatenated before calibration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskFragment {
    pub schema: u32,
    pub mask: Vec<Vec<u8>>,
}

/// One piece of a piecewise-constant population history: the population
/// holds `size` from `time` generations before present until the next epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemographicEpoch {
    pub time: f64,
    pub size: f64,
}

/// How the coalescent priors encode population history. Exactly one of the
/// two shapes is ever in play; the unused fields of the other do not exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CalibrationMode {
    /// Constant-size equilibrium, calibrated from Watterson's estimator.
    Equilibrium { sample_count: usize, ne: f64 },
    /// History inferred by an external tool, converted to ordered epochs.
    Historical { epochs: Vec<DemographicEpoch> },
}

/// Calibrated prior bundle shared by the train, validation, and test corpora.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameterSet {
    pub mu_low: f64,
    pub mu_high: f64,
    pub rho_low: f64,
    pub rho_high: f64,
    /// Simulated chromosome length, the largest observed window length.
    pub chromosome_length: u64,
    /// Per-window accessibility spans, present only when a mask was supplied
    /// and the genome-wide masked fraction cleared the threshold.
    pub window_masks: Option<Vec<WindowMask>>,
    /// Per-haplotype missing-data rows concatenated from the splitting stage.
    pub missing_data_mask: Option<Vec<Vec<u8>>>,
    pub mask_threshold: f64,
    pub phased: bool,
    pub phase_error: f64,
    pub seed: Option<u64>,
    pub mode: CalibrationMode,
}

/// Per-replicate values drawn from the corpus random stream before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplicateDraw {
    pub index: usize,
    pub mu: f64,
    pub rho: f64,
    pub engine_seed: u64,
}

/// What the simulation engine reports back for one finished replicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicateResult {
    pub seg_sites: usize,
}

/// The three simulated corpora, in the order they are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorpusKind {
    Train,
    Vali,
    Test,
}

impl CorpusKind {
    pub fn all() -> [CorpusKind; 3] {
        [CorpusKind::Train, CorpusKind::Vali, CorpusKind::Test]
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            CorpusKind::Train => "train",
            CorpusKind::Vali => "vali",
            CorpusKind::Test => "test",
        }
    }

    /// Heading printed before the corpus is simulated.
    pub fn display_name(&self) -> &'static str {
        match self {
            CorpusKind::Train => "Training set",
            CorpusKind::Vali => "Validation set",
            CorpusKind::Test => "Test set",
        }
    }
}

/// Knobs for turning a tree sequence into a model input tensor. These are
/// fixed by the trained-model contract and are persisted alongside the batch
/// configuration so external tooling sees the exact values used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingOptions {
    pub target_normalization: String,
    pub frame_width: usize,
    pub shuffle_inds: bool,
    pub sort_inds: bool,
    pub center: bool,
    pub ancestral_val: i8,
    pub pad_val: i8,
    pub derived_val: i8,
    pub real_line_pos: bool,
    pub pos_pad_val: f64,
}

impl Default for EncodingOptions {
    fn default() -> Self {
        Self {
            target_normalization: "zscore".to_string(),
            frame_width: 5,
            shuffle_inds: true,
            sort_inds: false,
            center: false,
            ancestral_val: -1,
            pad_val: 0,
            derived_val: 1,
            real_line_pos: true,
            pos_pad_val: 0.0,
        }
    }
}

/// One corpus's batch-generation settings, consumed by the external trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchGenerationConfig {
    pub trees_dir: PathBuf,
    pub batch_size: usize,
    /// Fixed second dimension every example is padded or truncated to.
    pub padding: usize,
    pub encoding: EncodingOptions,
    pub shuffle_examples: bool,
    pub seed: Option<u64>,
}

/// Pretrained-model context for transfer training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferContext {
    pub architecture: PathBuf,
    pub weights: PathBuf,
    /// Indices of layers to freeze while the rest keep learning.
    pub frozen_layers: Vec<usize>,
}

/// Self-description a trained model leaves behind, read back when a later
/// run continues from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub schema: u32,
    pub name: String,
    /// Second dimension of the genotype input tensor the model was built for.
    pub input_width: usize,
}

/// Everything the external trainer needs for one training-and-evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRequest {
    pub schema: u32,
    pub model: String,
    pub train: BatchGenerationConfig,
    pub vali: BatchGenerationConfig,
    pub test: BatchGenerationConfig,
    pub epochs: usize,
    pub validation_steps: usize,
    pub workers: usize,
    pub gpu_id: u32,
    pub model_file: PathBuf,
    pub weights_file: PathBuf,
    pub results_file: PathBuf,
    pub transfer: Option<TransferContext>,
}
