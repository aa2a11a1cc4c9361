use crate::error::{Result, RhonetError};
use crate::types::ChromosomeRange;
use std::fs;
use std::path::Path;

/// Parse the genome range file: one chromosome per row, exactly three
/// whitespace-separated fields (name, start, end). Row order is preserved,
/// it fixes the order windows are scanned and reported in.
pub fn read_genome_file(path: &Path) -> Result<Vec<ChromosomeRange>> {
    let contents = fs::read_to_string(path).map_err(|e| {
        RhonetError::Validation(format!("cannot read genome file {}: {}", path.display(), e))
    })?;

    let mut ranges = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(RhonetError::Validation(format!(
                "genome file row {}: expected exactly three whitespace-separated \
                 fields (chromosome, start, end), found {}",
                idx + 1,
                fields.len()
            )));
        }
        let start = parse_coordinate(fields[1], idx + 1, "start")?;
        let end = parse_coordinate(fields[2], idx + 1, "end")?;
        if end < start {
            return Err(RhonetError::Validation(format!(
                "genome file row {}: end {} precedes start {}",
                idx + 1,
                end,
                start
            )));
        }
        ranges.push(ChromosomeRange {
            name: fields[0].to_string(),
            start,
            end,
        });
    }
    Ok(ranges)
}

fn parse_coordinate(field: &str, row: usize, which: &str) -> Result<u64> {
    field.parse::<u64>().map_err(|_| {
        RhonetError::Validation(format!(
            "genome file row {}: {} coordinate {:?} is not a non-negative integer",
            row, which, field
        ))
    })
}
