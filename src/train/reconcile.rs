use crate::config::ProjectLayout;
use crate::error::{Result, RhonetError};
use crate::records;
use crate::sim::corpus::CorpusInfo;
use crate::types::{
    BatchGenerationConfig, CorpusKind, EncodingOptions, ModelRecord, SCHEMA_VERSION,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Offset subtracted from a pretrained model's input width when deriving
/// the padding dimension in transfer mode. The subtracted columns hold
/// auxiliary encoded fields, but the exact value is inherited from the
/// trained-model contract and is not derived anywhere in this codebase.
/// TODO: confirm the derivation of this constant with the batch-encoder
/// owners before ever changing it.
pub const AUX_FIELD_OFFSET: usize = 10;

/// Batch size shared by the train and validation generators. The test
/// generator instead consumes its whole corpus in a single batch.
pub const TRAIN_BATCH_SIZE: usize = 64;

/// Where the padding dimension comes from. Fresh runs take the maximum
/// over everything observed; transfer runs are locked to the pretrained
/// model's fixed input shape and ignore the observed maximum entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaddingPolicy {
    FromCorpora,
    FromPretrained { input_width: usize },
}

/// Resolve the policy for this run, reading the pretrained model record
/// when transfer training was requested.
pub fn padding_policy(layout: &ProjectLayout, transfer: bool) -> Result<PaddingPolicy> {
    if !transfer {
        return Ok(PaddingPolicy::FromCorpora);
    }
    let path = layout.pre_model_dir().join("model.json");
    let record: ModelRecord = records::read_json(&path)?;
    records::check_schema(record.schema, &path)?;
    Ok(PaddingPolicy::FromPretrained {
        input_width: record.input_width,
    })
}

/// Largest max-site count recorded in the window report (sixth column).
pub fn max_reported_window_sites(path: &Path) -> Result<usize> {
    let contents = fs::read_to_string(path).map_err(|e| {
        RhonetError::Schema(format!(
            "cannot read window report {}: {} (was the simulate phase run?)",
            path.display(),
            e
        ))
    })?;
    let mut max_sites = 0;
    for (idx, line) in contents.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            return Err(RhonetError::Schema(format!(
                "window report {} row {}: expected at least 6 columns, found {}",
                path.display(),
                idx + 1,
                fields.len()
            )));
        }
        let sites = fields[5].parse::<usize>().map_err(|_| {
            RhonetError::Schema(format!(
                "window report {} row {}: sixth column {:?} is not a count",
                path.display(),
                idx + 1,
                fields[5]
            ))
        })?;
        max_sites = max_sites.max(sites);
    }
    Ok(max_sites)
}

/// The fresh-run padding rule: pad to the most diverse replicate seen
/// anywhere, bounded below by the empirical window maximum.
pub fn padding_from(corpus_maxes: &[usize], window_max: usize) -> usize {
    corpus_maxes
        .iter()
        .copied()
        .max()
        .unwrap_or(0)
        .max(window_max)
}

/// Compute the single padding dimension shared by all three datasets.
pub fn reconcile(layout: &ProjectLayout, policy: &PaddingPolicy) -> Result<usize> {
    match policy {
        PaddingPolicy::FromPretrained { input_width } => {
            Ok(input_width.saturating_sub(AUX_FIELD_OFFSET))
        }
        PaddingPolicy::FromCorpora => {
            let window_max = max_reported_window_sites(&layout.window_report_file())?;
            let mut corpus_maxes = Vec::with_capacity(3);
            for kind in CorpusKind::all() {
                let info = CorpusInfo::read(layout.corpus_dir(kind))?;
                corpus_maxes.push(info.max_seg_sites());
            }
            Ok(padding_from(&corpus_maxes, window_max))
        }
    }
}

/// The three matched batch configurations handed to the trainer.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSet {
    pub train: BatchGenerationConfig,
    pub vali: BatchGenerationConfig,
    pub test: BatchGenerationConfig,
}

/// Train batch configuration as persisted for bootstrap re-runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedBatchParams {
    pub schema: u32,
    pub created_at: String,
    pub padding: usize,
    pub train: BatchGenerationConfig,
}

/// Assemble the three configurations. They differ only in directory, batch
/// size, and shuffling: the test set is evaluated in one deterministic
/// full-corpus batch. The train configuration is persisted alongside the
/// priors before returning.
pub fn assemble_batches(
    layout: &ProjectLayout,
    padding: usize,
    seed: Option<u64>,
) -> Result<BatchSet> {
    let encoding = EncodingOptions::default();
    let train = BatchGenerationConfig {
        trees_dir: layout.train.clone(),
        batch_size: TRAIN_BATCH_SIZE,
        padding,
        encoding: encoding.clone(),
        shuffle_examples: true,
        seed,
    };
    let vali = BatchGenerationConfig {
        trees_dir: layout.vali.clone(),
        batch_size: TRAIN_BATCH_SIZE,
        padding,
        encoding: encoding.clone(),
        shuffle_examples: true,
        seed,
    };
    let test_info = CorpusInfo::read(&layout.test)?;
    let test = BatchGenerationConfig {
        trees_dir: layout.test.clone(),
        batch_size: test_info.num_replicates,
        padding,
        encoding,
        shuffle_examples: false,
        seed,
    };

    let record = PersistedBatchParams {
        schema: SCHEMA_VERSION,
        created_at: chrono::Utc::now().to_rfc3339(),
        padding,
        train: train.clone(),
    };
    records::write_json(&layout.batch_params_file(), &record)?;

    Ok(BatchSet { train, vali, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_runs_take_the_overall_maximum() {
        assert_eq!(padding_from(&[1200, 900, 1500], 1400), 1500);
        assert_eq!(padding_from(&[1200, 900, 1300], 1400), 1400);
        assert_eq!(padding_from(&[], 0), 0);
    }

    #[test]
    fn transfer_runs_ignore_the_observed_maximum() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        let policy = PaddingPolicy::FromPretrained { input_width: 1800 };
        // No corpora on disk at all, the pretrained width alone decides.
        assert_eq!(reconcile(&layout, &policy).unwrap(), 1790);
    }

    #[test]
    fn window_report_parsing_takes_the_sixth_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("windowSizes.txt");
        fs::write(
            &path,
            "chr1:0-100 2000 50 10 210.5 1400\nchr2:0-90 1800 45 12 190.0 990\n",
        )
        .unwrap();
        assert_eq!(max_reported_window_sites(&path).unwrap(), 1400);
    }

    #[test]
    fn short_report_rows_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("windowSizes.txt");
        fs::write(&path, "chr1 2000 50\n").unwrap();
        assert!(max_reported_window_sites(&path).is_err());
    }
}
