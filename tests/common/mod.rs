#![allow(dead_code)]

use rhonet::cli::Cli;
use rhonet::collab::{Plotter, SimulationEngine, Trainer, Windower, WindowingContext};
use rhonet::config::ProjectLayout;
use rhonet::error::{Result, RhonetError};
use rhonet::sim::CorpusInfo;
use rhonet::types::{
    MaskScan, ReplicateDraw, ReplicateResult, SimulationParameterSet, TrainingRequest, WindowScan,
    WindowStats,
};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Windower double reporting a canned scan, no filesystem side effects.
pub struct FakeWindower {
    pub scan: WindowScan,
    pub mask: Option<MaskScan>,
}

impl FakeWindower {
    pub fn with_defaults() -> Self {
        Self {
            scan: WindowScan {
                stats: vec![
                    WindowStats {
                        chromosome: "chr2L:0-200000".to_string(),
                        window_length: 40_000,
                        n_windows: 5,
                        min_sites: 80,
                        mean_sites: 310.0,
                        max_sites: 700,
                    },
                    WindowStats {
                        chromosome: "chr2R:0-160000".to_string(),
                        window_length: 40_000,
                        n_windows: 4,
                        min_sites: 95,
                        mean_sites: 280.0,
                        max_sites: 640,
                    },
                ],
                sample_count: 16,
                max_site_count: 700,
                max_window_length: 40_000,
            },
            mask: None,
        }
    }
}

impl Windower for FakeWindower {
    fn split_input(&self, _ctx: &WindowingContext, _workers: usize) -> Result<()> {
        Ok(())
    }

    fn count_sites(&self, _ctx: &WindowingContext, _workers: usize) -> Result<WindowScan> {
        Ok(self.scan.clone())
    }

    fn apply_mask(
        &self,
        _ctx: &WindowingContext,
        _stats: &[WindowStats],
        _max_window_length: u64,
        _workers: usize,
    ) -> Result<MaskScan> {
        self.mask
            .clone()
            .ok_or_else(|| RhonetError::Collaborator("no mask scan configured".to_string()))
    }
}

/// Engine double whose segregating-site count is a pure function of the
/// draw, so identical draws always give identical corpora.
pub struct FakeEngine;

impl SimulationEngine for FakeEngine {
    fn run_replicate(
        &self,
        params: &SimulationParameterSet,
        draw: &ReplicateDraw,
        out: &Path,
    ) -> Result<ReplicateResult> {
        fs::write(out, format!("{} {:e} {:e}", draw.index, draw.mu, draw.rho))?;
        let span = params.mu_high - params.mu_low;
        let frac = if span > 0.0 {
            (draw.mu - params.mu_low) / span
        } else {
            0.0
        };
        let seg_sites = 100 + (frac * 1000.0) as usize + (draw.engine_seed % 97) as usize;
        Ok(ReplicateResult { seg_sites })
    }
}

/// Engine double that refuses one replicate index.
pub struct FailingEngine {
    pub fail_at: usize,
}

impl SimulationEngine for FailingEngine {
    fn run_replicate(
        &self,
        _params: &SimulationParameterSet,
        draw: &ReplicateDraw,
        out: &Path,
    ) -> Result<ReplicateResult> {
        if draw.index == self.fail_at {
            return Err(RhonetError::Simulation(format!(
                "replicate {} refused by the engine",
                draw.index
            )));
        }
        fs::write(out, b"trees")?;
        Ok(ReplicateResult { seg_sites: draw.index + 1 })
    }
}

/// Trainer double that records the request it saw and leaves a results file
/// where the request asked for one.
pub struct CapturingTrainer {
    pub seen: Mutex<Option<TrainingRequest>>,
}

impl CapturingTrainer {
    pub fn new() -> Self {
        Self { seen: Mutex::new(None) }
    }

    pub fn request(&self) -> TrainingRequest {
        self.seen.lock().unwrap().clone().expect("trainer was never called")
    }
}

impl Trainer for CapturingTrainer {
    fn train(&self, request: &TrainingRequest) -> Result<PathBuf> {
        *self.seen.lock().unwrap() = Some(request.clone());
        fs::write(&request.results_file, r#"{"r2": 0.91}"#)?;
        Ok(request.results_file.clone())
    }
}

pub struct FakePlotter;

impl Plotter for FakePlotter {
    fn plot(&self, _results: &Path, out: &Path) -> Result<()> {
        fs::write(out, b"%PDF")?;
        Ok(())
    }
}

/// A created project layout under a fresh temp directory.
pub fn temp_layout() -> (tempfile::TempDir, ProjectLayout) {
    let dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    layout.create().unwrap();
    (dir, layout)
}

/// Write a corpus info record with the given ordered site counts.
pub fn write_corpus(dir: &Path, seg_sites: Vec<usize>) {
    CorpusInfo::new(seg_sites).write(dir).unwrap();
}

/// Parse a Cli from the minimal required flags plus `extra`.
pub fn parse_cli(project: &Path, extra: &[&str]) -> Cli {
    let project = project.to_string_lossy().into_owned();
    let mut args = vec![
        "rhonet",
        "--vcf",
        "population.vcf",
        "--genome",
        "genome.bed",
        "--projectDir",
        &project,
    ];
    args.extend_from_slice(extra);
    Cli::try_parse_from(args).unwrap()
}
