use crate::collab::{Plotter, Trainer};
use crate::config::ProjectLayout;
use crate::error::Result;
use crate::train::reconcile::BatchSet;
use crate::types::{TrainingRequest, TransferContext, SCHEMA_VERSION};
use std::path::PathBuf;

/// Architecture identifier understood by the training collaborator.
pub const DEFAULT_MODEL: &str = "GRU_TUNED84";

/// Training-loop controls taken straight from the command line.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub epochs: usize,
    pub validation_steps: usize,
    pub workers: usize,
    pub gpu_id: u32,
    pub transfer: Option<TransferContext>,
}

/// Hands the matched batch configurations to the external trainer, then
/// forwards the evaluation results to the plotter. Trainer failures are
/// fatal here; retries and checkpointing belong to the collaborator.
pub struct TrainingDispatcher<'a, T, P> {
    trainer: &'a T,
    plotter: &'a P,
    layout: &'a ProjectLayout,
}

impl<'a, T: Trainer, P: Plotter> TrainingDispatcher<'a, T, P> {
    pub fn new(trainer: &'a T, plotter: &'a P, layout: &'a ProjectLayout) -> Self {
        Self {
            trainer,
            plotter,
            layout,
        }
    }

    /// One training-and-evaluation round trip; returns the results handle.
    pub fn run(&self, batches: &BatchSet, options: &TrainOptions) -> Result<PathBuf> {
        let request = TrainingRequest {
            schema: SCHEMA_VERSION,
            model: DEFAULT_MODEL.to_string(),
            train: batches.train.clone(),
            vali: batches.vali.clone(),
            test: batches.test.clone(),
            epochs: options.epochs,
            validation_steps: options.validation_steps,
            workers: options.workers,
            gpu_id: options.gpu_id,
            model_file: self.layout.model_file(),
            weights_file: self.layout.weights_file(),
            results_file: self.layout.results_file(),
            transfer: options.transfer.clone(),
        };
        let results = self.trainer.train(&request)?;
        self.plotter.plot(&results, &self.layout.results_figure())?;
        Ok(results)
    }
}
