use crate::collab::SimulationEngine;
use crate::config::ProjectLayout;
use crate::error::Result;
use crate::records;
use crate::sim::corpus::{self, CorpusInfo};
use crate::types::{
    CorpusKind, ReplicateDraw, ReplicateResult, SimulationParameterSet, WindowStats,
    SCHEMA_VERSION,
};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Requested replicate counts per corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusCounts {
    pub train: usize,
    pub vali: usize,
    pub test: usize,
}

impl CorpusCounts {
    pub fn for_kind(&self, kind: CorpusKind) -> usize {
        match kind {
            CorpusKind::Train => self.train,
            CorpusKind::Vali => self.vali,
            CorpusKind::Test => self.test,
        }
    }
}

/// Calibrated priors as persisted for later bootstrap re-runs, tagged with
/// the empirical source they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSimParams {
    pub schema: u32,
    /// Base name of the variant-call file the priors were calibrated from.
    pub source: String,
    pub created_at: String,
    pub params: SimulationParameterSet,
}

/// Reload previously persisted priors, e.g. for a parametric bootstrap.
pub fn load_sim_params(path: &Path) -> Result<PersistedSimParams> {
    let record: PersistedSimParams = records::read_json(path)?;
    records::check_schema(record.schema, path)?;
    Ok(record)
}

/// Draw the per-replicate rate pair and engine seed from the corpus random
/// stream. Draw order is part of the reproducibility contract: replicate
/// `i`'s values depend only on the seed and `i`, never on worker timing.
pub fn draw_replicate<R: Rng>(
    params: &SimulationParameterSet,
    index: usize,
    rng: &mut R,
) -> ReplicateDraw {
    let rho = rng.gen_range(params.rho_low..=params.rho_high);
    let mu = rng.gen_range(params.mu_low..=params.mu_high);
    ReplicateDraw {
        index,
        mu,
        rho,
        engine_seed: rng.gen(),
    }
}

/// Drives the three simulation runs from one calibrated parameter set:
/// train, then vali, then test, never concurrently with each other. Within
/// a corpus, replicates fan out across the current worker pool; each worker
/// owns a disjoint output file.
pub struct SimulationOrchestrator<'a, E> {
    engine: &'a E,
    layout: &'a ProjectLayout,
}

impl<'a, E: SimulationEngine> SimulationOrchestrator<'a, E> {
    pub fn new(engine: &'a E, layout: &'a ProjectLayout) -> Self {
        Self { engine, layout }
    }

    /// Persist the priors, then simulate every corpus. The parameter file
    /// goes down first so an aborted run still records what it was asked
    /// to simulate.
    pub fn run<R: Rng>(
        &self,
        params: &SimulationParameterSet,
        counts: &CorpusCounts,
        source: &str,
        rng: &mut R,
    ) -> Result<()> {
        self.persist_params(params, source)?;
        for kind in CorpusKind::all() {
            println!("{}:", kind.display_name());
            let corpus_seed: u64 = rng.gen();
            self.simulate_corpus(params, kind, counts.for_kind(kind), corpus_seed)?;
        }
        println!("\nSimulations finished.\n");
        Ok(())
    }

    /// Simulate one corpus. All random draws happen up front on the single
    /// control thread; the pool only executes fully determined replicates,
    /// so results are reproducible for any worker count.
    pub fn simulate_corpus(
        &self,
        params: &SimulationParameterSet,
        kind: CorpusKind,
        replicates: usize,
        corpus_seed: u64,
    ) -> Result<CorpusInfo> {
        let dir = self.layout.corpus_dir(kind);
        let mut rng = StdRng::seed_from_u64(corpus_seed);
        let draws: Vec<ReplicateDraw> = (0..replicates)
            .map(|i| draw_replicate(params, i, &mut rng))
            .collect();

        let bar = ProgressBar::new(replicates as u64);
        let style = ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);

        let results: Result<Vec<ReplicateResult>> = draws
            .par_iter()
            .map(|draw| {
                let out = corpus::replicate_file(dir, draw.index);
                let result = self.engine.run_replicate(params, draw, &out);
                bar.inc(1);
                result
            })
            .collect();
        bar.finish_and_clear();

        // On failure, whatever replicates were already flushed stay on disk
        // for inspection.
        let results = results?;
        let info = CorpusInfo::new(results.iter().map(|r| r.seg_sites).collect());
        info.write(dir)?;
        Ok(info)
    }

    fn persist_params(&self, params: &SimulationParameterSet, source: &str) -> Result<()> {
        let record = PersistedSimParams {
            schema: SCHEMA_VERSION,
            source: source.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            params: params.clone(),
        };
        records::write_json(&self.layout.sim_params_file(), &record)
    }
}

/// Print simulated against empirical segregating-site spreads so an
/// operator can eyeball miscalibration. Purely informational; there is no
/// threshold and no failure path based on the comparison.
pub fn sanity_report(layout: &ProjectLayout, stats: &[WindowStats]) -> Result<()> {
    let mut all_sites: Vec<usize> = Vec::new();
    for kind in CorpusKind::all() {
        let info = CorpusInfo::read(layout.corpus_dir(kind))?;
        all_sites.extend(info.seg_sites);
    }
    if all_sites.is_empty() {
        return Ok(());
    }
    let min = all_sites.iter().copied().min().unwrap_or(0);
    let max = all_sites.iter().copied().max().unwrap_or(0);
    let mean = all_sites.iter().sum::<usize>() / all_sites.len();

    println!("SANITY CHECK");
    println!("====================");
    println!("numSegSites\t\t\tMin\tMean\tMax");
    println!("Simulated:\t\t\t{}\t{}\t{}", min, mean, max);
    for row in stats {
        println!(
            "InputVCF {}:\t\t{}\t{}\t{}",
            row.chromosome,
            row.min_sites,
            row.mean_sites.round() as u64,
            row.max_sites
        );
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CalibrationMode;

    fn params() -> SimulationParameterSet {
        SimulationParameterSet {
            mu_low: 0.66e-8,
            mu_high: 1.33e-8,
            rho_low: 0.0,
            rho_high: 1e-8,
            chromosome_length: 100_000,
            window_masks: None,
            missing_data_mask: None,
            mask_threshold: 1.0,
            phased: true,
            phase_error: 0.0,
            seed: Some(11),
            mode: CalibrationMode::Equilibrium { sample_count: 10, ne: 50_000.0 },
        }
    }

    #[test]
    fn draws_are_reproducible_and_in_bounds() {
        let p = params();
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        for i in 0..200 {
            let da = draw_replicate(&p, i, &mut a);
            let db = draw_replicate(&p, i, &mut b);
            assert_eq!(da, db);
            assert!(da.mu >= p.mu_low && da.mu <= p.mu_high);
            assert!(da.rho >= p.rho_low && da.rho <= p.rho_high);
        }
    }

    #[test]
    fn different_indices_get_different_draws() {
        let p = params();
        let mut rng = StdRng::seed_from_u64(9);
        let first = draw_replicate(&p, 0, &mut rng);
        let second = draw_replicate(&p, 1, &mut rng);
        assert_ne!(first.engine_seed, second.engine_seed);
    }
}
