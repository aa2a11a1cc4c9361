use crate::error::{Result, RhonetError};
use crate::types::DemographicEpoch;
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

/// The three demographic-inference outputs we accept, recognized by their
/// header lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemographicFormat {
    Stairwayplot,
    SmcPlusPlus,
    Msmc,
}

impl DemographicFormat {
    pub fn name(&self) -> &'static str {
        match self {
            DemographicFormat::Stairwayplot => "stairwayplot",
            DemographicFormat::SmcPlusPlus => "SMC++",
            DemographicFormat::Msmc => "MSMC",
        }
    }
}

/// Classify a demographic-history file from its header line.
pub fn detect_format(path: &Path) -> Result<DemographicFormat> {
    let contents = fs::read_to_string(path).map_err(|e| {
        RhonetError::Validation(format!(
            "cannot read demographic-history file {}: {}",
            path.display(),
            e
        ))
    })?;
    let header = contents.lines().next().unwrap_or_default();
    if header.starts_with("mutation_per_site") {
        Ok(DemographicFormat::Stairwayplot)
    } else if header.starts_with("label,x,y") {
        Ok(DemographicFormat::SmcPlusPlus)
    } else if header.starts_with("time_index") {
        Ok(DemographicFormat::Msmc)
    } else {
        Err(RhonetError::Validation(
            "demographic-history file must be raw output from either stairwayplot, \
             SMC++, or MSMC; if using SMC++, the file must be in .csv format \
             (use option -c in SMC++)"
                .to_string(),
        ))
    }
}

/// Convert a recognized demographic-history file into epochs ordered by
/// time before present. Times come out in generations; the earliest epoch
/// is clamped to the present so the simulated history starts at time zero.
pub fn convert(
    path: &Path,
    sample_count: usize,
    generation_time: f64,
    format: DemographicFormat,
    mu: f64,
) -> Result<Vec<DemographicEpoch>> {
    let contents = fs::read_to_string(path).map_err(|e| {
        RhonetError::Calibration(format!(
            "cannot read demographic-history file {}: {}",
            path.display(),
            e
        ))
    })?;
    let mut epochs = match format {
        DemographicFormat::Stairwayplot => parse_stairwayplot(&contents, generation_time)?,
        DemographicFormat::SmcPlusPlus => parse_smc(&contents, generation_time)?,
        DemographicFormat::Msmc => parse_msmc(&contents, mu)?,
    };
    if epochs.is_empty() {
        return Err(RhonetError::Calibration(format!(
            "demographic-history file {} holds no epochs after its header",
            path.display()
        )));
    }
    for epoch in &epochs {
        if epoch.size <= 0.0 {
            return Err(RhonetError::Calibration(format!(
                "demographic-history file {} yields a non-positive population \
                 size {} at time {}",
                path.display(),
                epoch.size,
                epoch.time
            )));
        }
    }
    epochs.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));
    epochs[0].time = 0.0;
    log::debug!(
        "converted {} {} epochs for {} haplotypes",
        epochs.len(),
        format.name(),
        sample_count
    );
    Ok(epochs)
}

/// Stairwayplot summary rows: whitespace columns with `year` at index 5 and
/// `Ne_median` at index 6.
fn parse_stairwayplot(contents: &str, generation_time: f64) -> Result<Vec<DemographicEpoch>> {
    let mut epochs = Vec::new();
    for (idx, line) in contents.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 7 {
            return Err(row_error("stairwayplot", idx, "expected at least 7 columns"));
        }
        let year = parse_number(fields[5], "stairwayplot", idx)?;
        let ne_median = parse_number(fields[6], "stairwayplot", idx)?;
        epochs.push(DemographicEpoch {
            time: year / generation_time,
            size: ne_median,
        });
    }
    Ok(epochs)
}

/// SMC++ csv rows: `label,x,y,plot_type` with `x` in years and `y` a
/// population size.
fn parse_smc(contents: &str, generation_time: f64) -> Result<Vec<DemographicEpoch>> {
    let mut epochs = Vec::new();
    for (idx, line) in contents.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 3 {
            return Err(row_error("SMC++", idx, "expected at least 3 comma-separated columns"));
        }
        let x = parse_number(fields[1], "SMC++", idx)?;
        let y = parse_number(fields[2], "SMC++", idx)?;
        epochs.push(DemographicEpoch {
            time: x / generation_time,
            size: y,
        });
    }
    Ok(epochs)
}

/// MSMC rows: whitespace columns `time_index`, scaled left/right time
/// boundaries, then the coalescence rate lambda. Times are rescaled by the
/// mutation rate and sizes come from inverting lambda.
fn parse_msmc(contents: &str, mu: f64) -> Result<Vec<DemographicEpoch>> {
    let mut epochs = Vec::new();
    for (idx, line) in contents.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(row_error("MSMC", idx, "expected at least 4 columns"));
        }
        let left = parse_number(fields[1], "MSMC", idx)?;
        let lambda = parse_number(fields[3], "MSMC", idx)?;
        if lambda <= 0.0 {
            return Err(row_error("MSMC", idx, "coalescence rate must be positive"));
        }
        epochs.push(DemographicEpoch {
            time: left / mu,
            size: 1.0 / (2.0 * mu * lambda),
        });
    }
    Ok(epochs)
}

fn parse_number(field: &str, format: &str, idx: usize) -> Result<f64> {
    field
        .parse::<f64>()
        .map_err(|_| row_error(format, idx, &format!("{:?} is not a number", field)))
}

fn row_error(format: &str, idx: usize, detail: &str) -> RhonetError {
    RhonetError::Calibration(format!(
        "{} history row {}: {}",
        format,
        idx + 1,
        detail
    ))
}
