//! End-to-end run: validate, calibrate, simulate the three corpora, then
//! reconcile dimensions and dispatch training. Each stage persists what the
//! next one (or an external re-run) needs, so the two phases can also be
//! driven separately against an existing project directory.

use crate::calibrate::demography::{self, DemographicFormat};
use crate::calibrate::{calibrate, CalibrationInputs};
use crate::cli::Cli;
use crate::collab::{
    ProcessPlotter, ProcessSimulator, ProcessTrainer, ProcessWindower, Plotter, SimulationEngine,
    Trainer, Windower, WindowingContext,
};
use crate::config::{genome, ProjectLayout};
use crate::error::{Result, RhonetError};
use crate::records;
use crate::sim::orchestrator::{self, CorpusCounts, SimulationOrchestrator};
use crate::train::dispatcher::{TrainOptions, TrainingDispatcher};
use crate::train::reconcile;
use crate::types::{ChromosomeRange, MaskFragment, TransferContext, WindowScan};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Full pipeline as invoked from the command line.
pub fn run(cli: &Cli) -> Result<()> {
    let dem_format = cli.validate()?;
    announce(cli);

    let root = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let layout = ProjectLayout::new(&root);
    layout.create()?;
    let ranges = genome::read_genome_file(&cli.genome)?;

    let windower = ProcessWindower::new(&cli.windower_cmd);
    let engine = ProcessSimulator::new(&cli.simulator_cmd);
    simulate_phase(cli, dem_format, &layout, &ranges, &windower, &engine)?;

    let trainer = ProcessTrainer::new(&cli.trainer_cmd);
    let plotter = ProcessPlotter::new(&cli.plotter_cmd);
    train_phase(cli, &layout, &trainer, &plotter)?;
    Ok(())
}

/// Warnings for every fallback the run is about to take, followed by a
/// pause long enough to quit before any files are touched.
fn announce(cli: &Cli) {
    if cli.project_dir.is_none() {
        println!("Warning: no project directory found, using the current working directory.");
    }
    if cli.mask.is_none() {
        println!(
            "Warning: no accessibility mask found. All sites in the genome are assumed to be accessible."
        );
    }
    if cli.demographic_history.is_none() {
        println!(
            "Warning: no demographic history file found. All training data will be simulated under demographic equilibrium."
        );
    }
    if cli.force_diploid {
        println!(
            "Warning: all haploid samples will be treated as diploid samples with missing data! \
             If that is not what you want, quit now and rerun without --forceDiploid."
        );
        thread::sleep(Duration::from_secs(10));
    } else {
        thread::sleep(Duration::from_secs(5));
    }
}

/// Split, scan, calibrate, and simulate. Generic over the collaborators so
/// the whole phase can run against in-process doubles.
pub fn simulate_phase<W: Windower, E: SimulationEngine>(
    cli: &Cli,
    dem_format: Option<DemographicFormat>,
    layout: &ProjectLayout,
    ranges: &[ChromosomeRange],
    windower: &W,
    engine: &E,
) -> Result<()> {
    let workers = cli.n_cpu_sim.unwrap_or_else(rayon::current_num_threads);
    let ctx = WindowingContext {
        vcf: cli.vcf.clone(),
        mask: cli.mask.clone(),
        chromosomes: ranges.to_vec(),
        max_sites: cli.max_sites,
        force_window_size: cli.force_win_size,
        force_diploid: cli.force_diploid,
        split_dir: layout.split_vcfs.clone(),
        seed: cli.seed,
    };

    windower.split_input(&ctx, workers)?;
    let scan = windower.count_sites(&ctx, workers)?;
    log::info!(
        "scanned {} chromosomes, {} haplotypes, max {} sites per window",
        scan.stats.len(),
        scan.sample_count,
        scan.max_site_count
    );
    write_window_report(&layout.window_report_file(), &scan)?;

    let mask_scan = match &cli.mask {
        Some(_) => Some(windower.apply_mask(&ctx, &scan.stats, scan.max_window_length, workers)?),
        None => None,
    };
    let md_mask = read_missing_data_mask(&layout.split_vcfs)?;

    println!("Simulating with window size = {} bp.", scan.max_window_length);

    let epochs = match (dem_format, &cli.demographic_history, cli.assumed_gen_time) {
        (Some(format), Some(path), Some(gen_time)) => Some(demography::convert(
            path,
            scan.sample_count,
            gen_time,
            format,
            cli.assumed_mu,
        )?),
        _ => None,
    };

    let inputs = CalibrationInputs {
        assumed_mu: cli.assumed_mu,
        upper_rho_theta_ratio: cli.upper_rho_theta_ratio,
        mask_threshold: cli.mask_thresh,
        phased: cli.is_phased(),
        phase_error: cli.phase_error,
        seed: cli.seed,
    };
    let params = calibrate(&scan, mask_scan.as_ref(), md_mask, &inputs, epochs)?;

    let mut master = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| RhonetError::Simulation(format!("cannot build worker pool: {}", e)))?;
    let counts = CorpusCounts {
        train: cli.n_train,
        vali: cli.n_vali,
        test: cli.n_test,
    };
    let source = cli.vcf_basename();
    let orchestrator = SimulationOrchestrator::new(engine, layout);
    pool.install(|| orchestrator.run(&params, &counts, &source, &mut master))?;

    orchestrator::sanity_report(layout, &scan.stats)
}

/// Reconcile the padding dimension, assemble matched batch configurations,
/// and drive one training-and-evaluation round trip.
pub fn train_phase<T: Trainer, P: Plotter>(
    cli: &Cli,
    layout: &ProjectLayout,
    trainer: &T,
    plotter: &P,
) -> Result<PathBuf> {
    let policy = reconcile::padding_policy(layout, cli.trans_flag)?;
    let padding = reconcile::reconcile(layout, &policy)?;
    if padding == 0 {
        return Err(RhonetError::Training(
            "reconciled padding dimension is zero; the corpora hold no segregating sites"
                .to_string(),
        ));
    }
    println!("Padding all examples to {} segregating sites.", padding);

    let batches = reconcile::assemble_batches(layout, padding, cli.seed)?;
    let transfer = if cli.trans_flag {
        let pre = layout.pre_model_dir();
        Some(TransferContext {
            architecture: pre.join("model.json"),
            weights: pre.join("weights.h5"),
            frozen_layers: cli.layer_fix_ind.clone().unwrap_or_default(),
        })
    } else {
        None
    };
    let options = TrainOptions {
        epochs: cli.n_epochs,
        validation_steps: cli.n_val_steps,
        workers: cli.n_cpu_tr,
        gpu_id: cli.gpu_id,
        transfer,
    };
    let dispatcher = TrainingDispatcher::new(trainer, plotter, layout);
    let results = dispatcher.run(&batches, &options)?;
    println!("Training finished; results at {}.", results.display());
    Ok(results)
}

/// One row per chromosome: label, window length, window count, then the
/// min/mean/max per-window site counts. The sixth column is read back by
/// the reconciler.
fn write_window_report(path: &Path, scan: &WindowScan) -> Result<()> {
    let mut out = String::new();
    for row in &scan.stats {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\n",
            row.chromosome,
            row.window_length,
            row.n_windows,
            row.min_sites,
            row.mean_sites.round() as u64,
            row.max_sites
        ));
    }
    fs::write(path, out)?;
    Ok(())
}

/// Concatenate every per-chromosome missing-data fragment the splitting
/// stage left behind, in sorted file order. None when there are no
/// fragments, which is the common fully-typed-genotype case.
fn read_missing_data_mask(split_dir: &Path) -> Result<Option<Vec<Vec<u8>>>> {
    let pattern = split_dir.join("*_md_mask.json");
    let pattern = pattern.to_string_lossy().into_owned();
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| RhonetError::Simulation(format!("bad mask pattern {}: {}", pattern, e)))?
        .filter_map(|entry| entry.ok())
        .collect();
    if files.is_empty() {
        return Ok(None);
    }
    files.sort();

    let mut rows = Vec::new();
    for file in files {
        println!("Reading missing-data mask: {}...", file.display());
        let fragment: MaskFragment = records::read_json(&file)?;
        records::check_schema(fragment.schema, &file)?;
        rows.extend(fragment.mask);
    }
    Ok(Some(rows))
}
