use crate::calibrate::demography::{self, DemographicFormat};
use crate::error::{Result, RhonetError};
use clap::Parser;
use std::path::PathBuf;

/// Calibrate coalescent priors from an observed genome, simulate train,
/// validation, and test corpora, and dispatch recombination-rate training.
#[derive(Parser, Debug, Clone)]
#[command(name = "rhonet", version, about)]
pub struct Cli {
    /// Filtered and QC-checked variant-call file (must end in .vcf)
    #[arg(long)]
    pub vcf: PathBuf,

    /// Genome range file, one row per chromosome: name, start, end
    #[arg(long)]
    pub genome: PathBuf,

    /// Accessibility mask in the same three-field range format
    #[arg(long)]
    pub mask: Option<PathBuf>,

    /// Output root for all project artifacts
    #[arg(long = "projectDir")]
    pub project_dir: Option<PathBuf>,

    /// Raw output from stairwayplot, SMC++, or MSMC
    #[arg(long = "demographicHistory")]
    pub demographic_history: Option<PathBuf>,

    /// Assumed per-base mutation rate
    #[arg(long = "assumedMu", default_value_t = 1e-8)]
    pub assumed_mu: f64,

    /// Assumed generation time in years, required with --demographicHistory
    #[arg(long = "assumedGenTime")]
    pub assumed_gen_time: Option<f64>,

    /// Upper bound for the ratio of rho to theta
    #[arg(long = "upperRhoThetaRatio", default_value_t = 1.0)]
    pub upper_rho_theta_ratio: f64,

    /// Worker count for the simulate phase (default: all cores)
    #[arg(long = "nCPU_sim")]
    pub n_cpu_sim: Option<usize>,

    /// Worker count handed to the training collaborator
    #[arg(long = "nCPU_tr", default_value_t = 1)]
    pub n_cpu_tr: usize,

    /// Seed for reproducible calibration and simulation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Treat genotypes as phased (the default)
    #[arg(long, overrides_with = "unphased")]
    pub phased: bool,

    /// Treat genotypes as unphased
    #[arg(long, overrides_with = "phased")]
    pub unphased: bool,

    /// Treat all samples as diploids with missing data
    #[arg(long = "forceDiploid")]
    pub force_diploid: bool,

    /// Fraction of simulated bases with deliberately corrupted phasing
    #[arg(long = "phaseError", default_value_t = 0.0)]
    pub phase_error: f64,

    /// Maximum segregating sites per training window
    #[arg(long = "maxSites", default_value_t = 1750)]
    pub max_sites: usize,

    /// Force a fixed window size in bases, 0 to infer (testing only)
    #[arg(long = "forceWinSize", default_value_t = 0)]
    pub force_win_size: u64,

    /// Discard windows where at least this fraction of sites is inaccessible
    #[arg(long = "maskThresh", default_value_t = 1.0)]
    pub mask_thresh: f64,

    /// Replicates to simulate for the training corpus
    #[arg(long = "nTrain", default_value_t = 100_000)]
    pub n_train: usize,

    /// Replicates to simulate for the validation corpus
    #[arg(long = "nVali", default_value_t = 1_000)]
    pub n_vali: usize,

    /// Replicates to simulate for the test corpus
    #[arg(long = "nTest", default_value_t = 1_000)]
    pub n_test: usize,

    /// Maximum number of training epochs
    #[arg(long = "nEpochs", default_value_t = 1_000)]
    pub n_epochs: usize,

    /// Validation steps per epoch
    #[arg(long = "nValSteps", default_value_t = 20)]
    pub n_val_steps: usize,

    /// Identifier of the accelerator to train on
    #[arg(long = "gpuID", default_value_t = 0)]
    pub gpu_id: u32,

    /// Continue training from the model under networks/pre_model
    #[arg(long = "trans_flag")]
    pub trans_flag: bool,

    /// Comma-separated indices of layers to freeze during transfer training
    #[arg(long = "layer_fix_ind", value_delimiter = ',')]
    pub layer_fix_ind: Option<Vec<usize>>,

    /// Windowing collaborator executable
    #[arg(long = "windowerCmd", default_value = "rhonet-window")]
    pub windower_cmd: String,

    /// Coalescent simulation collaborator executable
    #[arg(long = "simulatorCmd", default_value = "rhonet-msp")]
    pub simulator_cmd: String,

    /// Training collaborator executable
    #[arg(long = "trainerCmd", default_value = "rhonet-train")]
    pub trainer_cmd: String,

    /// Plotting collaborator executable
    #[arg(long = "plotterCmd", default_value = "rhonet-plot")]
    pub plotter_cmd: String,
}

impl Cli {
    /// Effective phasing assumption. `--unphased` flips the default; when
    /// both flags are given the one passed last wins.
    pub fn is_phased(&self) -> bool {
        !self.unphased
    }

    /// Base name of the variant-call file, used to tag persisted priors.
    pub fn vcf_basename(&self) -> String {
        self.vcf
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string())
    }

    /// Fail fast on every flag problem before expensive work starts.
    /// Returns the detected demographic-history format when one was given.
    pub fn validate(&self) -> Result<Option<DemographicFormat>> {
        let extension = self.vcf.extension().and_then(|e| e.to_str());
        if extension != Some("vcf") {
            return Err(RhonetError::Validation(format!(
                "variant-call file {} must end in the extension .vcf",
                self.vcf.display()
            )));
        }
        if self.assumed_mu <= 0.0 {
            return Err(RhonetError::Validation(format!(
                "assumed mutation rate must be positive, got {}",
                self.assumed_mu
            )));
        }
        if self.upper_rho_theta_ratio <= 0.0 {
            return Err(RhonetError::Validation(format!(
                "upper rho/theta ratio must be positive, got {}",
                self.upper_rho_theta_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.phase_error) {
            return Err(RhonetError::Validation(format!(
                "phase error rate must lie in [0, 1], got {}",
                self.phase_error
            )));
        }
        if !(0.0..=1.0).contains(&self.mask_thresh) {
            return Err(RhonetError::Validation(format!(
                "mask threshold must lie in [0, 1], got {}",
                self.mask_thresh
            )));
        }
        if self.unphased && self.phase_error != 0.0 {
            return Err(RhonetError::Validation(
                "a non-zero --phaseError cannot be combined with --unphased; \
                 phase noise has no meaning for unphased genotypes"
                    .to_string(),
            ));
        }
        if self.n_train == 0 || self.n_vali == 0 || self.n_test == 0 {
            return Err(RhonetError::Validation(
                "replicate counts --nTrain, --nVali, and --nTest must all be positive".to_string(),
            ));
        }
        if self.trans_flag && self.layer_fix_ind.is_none() {
            return Err(RhonetError::Validation(
                "--trans_flag requires --layer_fix_ind, a comma-separated list \
                 of layer indices to freeze"
                    .to_string(),
            ));
        }
        match &self.demographic_history {
            Some(path) => {
                let format = demography::detect_format(path)?;
                if self.assumed_gen_time.is_none() {
                    return Err(RhonetError::Validation(
                        "an assumed generation time must be supplied when simulating \
                         under stairwayplot, SMC++, or MSMC"
                            .to_string(),
                    ));
                }
                Ok(Some(format))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["rhonet", "--vcf", "pop.vcf", "--genome", "ranges.bed"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn phased_is_the_default() {
        assert!(parse(&[]).is_phased());
        assert!(!parse(&["--unphased"]).is_phased());
        assert!(parse(&["--unphased", "--phased"]).is_phased());
    }

    #[test]
    fn basename_strips_the_extension() {
        let cli = parse(&[]);
        assert_eq!(cli.vcf_basename(), "pop");
    }

    #[test]
    fn layer_indices_split_on_commas() {
        let cli = parse(&["--trans_flag", "--layer_fix_ind", "0,2,3"]);
        assert_eq!(cli.layer_fix_ind, Some(vec![0, 2, 3]));
    }
}
