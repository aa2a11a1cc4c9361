//! Subprocess adapters for the collaborator traits.
//!
//! Each call writes a versioned request record, invokes the collaborator as
//! `<cmd> --request <file>`, and reads back a response record where the
//! operation produces one. Collaborators report failure through their exit
//! status; stderr is surfaced in the error.

use crate::collab::{Plotter, SimulationEngine, Trainer, Windower, WindowingContext};
use crate::error::{Result, RhonetError};
use crate::records;
use crate::types::{
    MaskScan, ReplicateDraw, ReplicateResult, SimulationParameterSet, TrainingRequest, WindowScan,
    WindowStats, SCHEMA_VERSION,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Run a collaborator to completion, mapping launch failures and non-zero
/// exits into one error shape.
fn run_tool(cmd: &str, request_file: &Path) -> Result<()> {
    let output = Command::new(cmd)
        .arg("--request")
        .arg(request_file)
        .output()
        .map_err(|e| RhonetError::Collaborator(format!("failed to launch {}: {}", cmd, e)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
        let tail: Vec<&str> = tail.into_iter().rev().collect();
        return Err(RhonetError::Collaborator(format!(
            "{} exited with {}: {}",
            cmd,
            output.status,
            tail.join(" | ")
        )));
    }
    Ok(())
}

fn expect_output(cmd: &str, path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(RhonetError::Collaborator(format!(
            "{} exited cleanly but left no output at {}",
            cmd,
            path.display()
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
struct SplitRequest {
    schema: u32,
    workers: usize,
    context: WindowingContext,
}

#[derive(Debug, Serialize, Deserialize)]
struct CountRequest {
    schema: u32,
    workers: usize,
    context: WindowingContext,
    response: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct CountResponse {
    schema: u32,
    scan: WindowScan,
}

#[derive(Debug, Serialize, Deserialize)]
struct MaskRequest {
    schema: u32,
    workers: usize,
    context: WindowingContext,
    stats: Vec<WindowStats>,
    max_window_length: u64,
    response: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct MaskResponse {
    schema: u32,
    scan: MaskScan,
}

/// Windowing collaborator driven over the filesystem.
pub struct ProcessWindower {
    cmd: String,
}

impl ProcessWindower {
    pub fn new(cmd: &str) -> Self {
        Self { cmd: cmd.to_string() }
    }
}

impl Windower for ProcessWindower {
    fn split_input(&self, ctx: &WindowingContext, workers: usize) -> Result<()> {
        let request = SplitRequest {
            schema: SCHEMA_VERSION,
            workers,
            context: ctx.clone(),
        };
        let request_file = ctx.split_dir.join("split_request.json");
        records::write_json(&request_file, &request)?;
        run_tool(&self.cmd, &request_file)
    }

    fn count_sites(&self, ctx: &WindowingContext, workers: usize) -> Result<WindowScan> {
        let response = ctx.split_dir.join("windows.json");
        let request = CountRequest {
            schema: SCHEMA_VERSION,
            workers,
            context: ctx.clone(),
            response: response.clone(),
        };
        let request_file = ctx.split_dir.join("count_request.json");
        records::write_json(&request_file, &request)?;
        run_tool(&self.cmd, &request_file)?;
        expect_output(&self.cmd, &response)?;
        let reply: CountResponse = records::read_json(&response)?;
        records::check_schema(reply.schema, &response)?;
        Ok(reply.scan)
    }

    fn apply_mask(
        &self,
        ctx: &WindowingContext,
        stats: &[WindowStats],
        max_window_length: u64,
        workers: usize,
    ) -> Result<MaskScan> {
        let response = ctx.split_dir.join("masks.json");
        let request = MaskRequest {
            schema: SCHEMA_VERSION,
            workers,
            context: ctx.clone(),
            stats: stats.to_vec(),
            max_window_length,
            response: response.clone(),
        };
        let request_file = ctx.split_dir.join("mask_request.json");
        records::write_json(&request_file, &request)?;
        run_tool(&self.cmd, &request_file)?;
        expect_output(&self.cmd, &response)?;
        let reply: MaskResponse = records::read_json(&response)?;
        records::check_schema(reply.schema, &response)?;
        Ok(reply.scan)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ReplicateRequest {
    schema: u32,
    params: SimulationParameterSet,
    draw: ReplicateDraw,
    out: PathBuf,
    response: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct ReplicateResponse {
    schema: u32,
    result: ReplicateResult,
}

/// Coalescent engine invoked once per replicate. Request and response files
/// live next to the tree file, keyed by replicate index, so concurrent
/// workers never touch the same path.
pub struct ProcessSimulator {
    cmd: String,
}

impl ProcessSimulator {
    pub fn new(cmd: &str) -> Self {
        Self { cmd: cmd.to_string() }
    }
}

impl SimulationEngine for ProcessSimulator {
    fn run_replicate(
        &self,
        params: &SimulationParameterSet,
        draw: &ReplicateDraw,
        out: &Path,
    ) -> Result<ReplicateResult> {
        let request_file = out.with_extension("request.json");
        let response_file = out.with_extension("response.json");
        let request = ReplicateRequest {
            schema: SCHEMA_VERSION,
            params: params.clone(),
            draw: *draw,
            out: out.to_path_buf(),
            response: response_file.clone(),
        };
        records::write_json(&request_file, &request)?;
        run_tool(&self.cmd, &request_file)?;
        expect_output(&self.cmd, out)?;
        expect_output(&self.cmd, &response_file)?;
        let reply: ReplicateResponse = records::read_json(&response_file)?;
        records::check_schema(reply.schema, &response_file)?;
        // The tree file is the artifact; the bookkeeping files are not.
        let _ = fs::remove_file(&request_file);
        let _ = fs::remove_file(&response_file);
        Ok(reply.result)
    }
}

/// Training collaborator. The request already names every output path, so
/// the adapter only has to hand it over and confirm the results landed.
pub struct ProcessTrainer {
    cmd: String,
}

impl ProcessTrainer {
    pub fn new(cmd: &str) -> Self {
        Self { cmd: cmd.to_string() }
    }
}

impl Trainer for ProcessTrainer {
    fn train(&self, request: &TrainingRequest) -> Result<PathBuf> {
        let dir = request
            .model_file
            .parent()
            .unwrap_or_else(|| Path::new("."));
        let request_file = dir.join("train_request.json");
        records::write_json(&request_file, request)?;
        run_tool(&self.cmd, &request_file)?;
        expect_output(&self.cmd, &request.results_file)?;
        Ok(request.results_file.clone())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PlotRequest {
    schema: u32,
    results: PathBuf,
    out: PathBuf,
}

pub struct ProcessPlotter {
    cmd: String,
}

impl ProcessPlotter {
    pub fn new(cmd: &str) -> Self {
        Self { cmd: cmd.to_string() }
    }
}

impl Plotter for ProcessPlotter {
    fn plot(&self, results: &Path, out: &Path) -> Result<()> {
        let dir = out.parent().unwrap_or_else(|| Path::new("."));
        let request_file = dir.join("plot_request.json");
        let request = PlotRequest {
            schema: SCHEMA_VERSION,
            results: results.to_path_buf(),
            out: out.to_path_buf(),
        };
        records::write_json(&request_file, &request)?;
        run_tool(&self.cmd, &request_file)?;
        expect_output(&self.cmd, out)
    }
}
