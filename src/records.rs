//! Versioned JSON records shared across pipeline stages.
//!
//! Every artifact the pipeline writes for later stages or external tooling
//! goes through these helpers, so the schema check happens in one place.

use crate::error::{Result, RhonetError};
use crate::types::SCHEMA_VERSION;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| {
        RhonetError::Schema(format!("cannot open record {}: {}", path.display(), e))
    })?;
    let value = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        RhonetError::Schema(format!("cannot parse record {}: {}", path.display(), e))
    })?;
    Ok(value)
}

/// Reject a record written by a different build of the pipeline.
pub fn check_schema(found: u32, path: &Path) -> Result<()> {
    if found != SCHEMA_VERSION {
        return Err(RhonetError::Schema(format!(
            "{} carries schema version {}, this build expects {}",
            path.display(),
            found,
            SCHEMA_VERSION
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Probe {
        schema: u32,
        value: i64,
    }

    #[test]
    fn round_trips_a_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.json");
        let probe = Probe { schema: SCHEMA_VERSION, value: 42 };
        write_json(&path, &probe).unwrap();
        let back: Probe = read_json(&path).unwrap();
        assert_eq!(back, probe);
    }

    #[test]
    fn rejects_wrong_schema_version() {
        let path = Path::new("somewhere/record.json");
        assert!(check_schema(SCHEMA_VERSION, path).is_ok());
        let err = check_schema(SCHEMA_VERSION + 1, path).unwrap_err();
        assert!(err.to_string().contains("schema version"));
    }

    #[test]
    fn missing_record_is_a_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("not_there.json");
        let err = read_json::<Probe>(&gone).unwrap_err();
        assert!(matches!(err, crate::error::RhonetError::Schema(_)));
    }
}
