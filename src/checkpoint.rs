use std::collections::HashSet;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::Builder;

use crate::domain::AssayRow;
use crate::error::EnrichError;

/// Durable partial-progress snapshot. `save` is always a full rewrite of the
/// accumulator, never an append, so a reader sees either the previous or the
/// new snapshot and nothing in between.
pub trait CheckpointStore: Send + Sync {
    /// Rows of the existing snapshot, or an empty vector when none exists.
    /// An existing but unreadable snapshot is a fatal error.
    fn load(&self) -> Result<Vec<AssayRow>, EnrichError>;
    fn save(&self, rows: &[AssayRow]) -> Result<(), EnrichError>;
}

#[derive(Debug, Clone)]
pub struct CsvCheckpoint {
    path: Utf8PathBuf,
}

impl CsvCheckpoint {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn write_error(&self, message: String) -> EnrichError {
        EnrichError::CheckpointWrite {
            path: self.path.clone(),
            message,
        }
    }
}

impl CheckpointStore for CsvCheckpoint {
    fn load(&self) -> Result<Vec<AssayRow>, EnrichError> {
        if !self.path.as_std_path().exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(self.path.as_std_path()).map_err(|err| {
            EnrichError::CheckpointRead {
                path: self.path.clone(),
                message: err.to_string(),
            }
        })?;
        let mut rows = Vec::new();
        for record in reader.deserialize::<AssayRow>() {
            let row = record.map_err(|err| EnrichError::CheckpointRead {
                path: self.path.clone(),
                message: err.to_string(),
            })?;
            rows.push(row);
        }
        Ok(rows)
    }

    fn save(&self, rows: &[AssayRow]) -> Result<(), EnrichError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent.to_owned(),
            _ => Utf8PathBuf::from("."),
        };
        std::fs::create_dir_all(parent.as_std_path())
            .map_err(|err| self.write_error(err.to_string()))?;

        let mut temp = Builder::new()
            .prefix(".assay-enrich-checkpoint")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| self.write_error(err.to_string()))?;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut temp);
            writer
                .write_record(AssayRow::HEADERS)
                .map_err(|err| EnrichError::Csv(err.to_string()))?;
            for row in rows {
                writer
                    .serialize(row)
                    .map_err(|err| EnrichError::Csv(err.to_string()))?;
            }
            writer
                .flush()
                .map_err(|err| EnrichError::Csv(err.to_string()))?;
        }
        temp.flush().map_err(|err| self.write_error(err.to_string()))?;
        temp.persist(self.path.as_std_path())
            .map_err(|err| self.write_error(err.to_string()))?;
        Ok(())
    }
}

/// Descriptors a restarted run must skip.
pub fn processed_descriptors(rows: &[AssayRow]) -> HashSet<String> {
    rows.iter().map(|row| row.smiles.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(smiles: &str, aid: &str) -> AssayRow {
        AssayRow {
            smiles: smiles.to_string(),
            cid: "702".to_string(),
            name: "ethanol".to_string(),
            aid: aid.to_string(),
            activity: "Active".to_string(),
            title: "a title, with a comma".to_string(),
            description: "line".to_string(),
        }
    }

    #[test]
    fn missing_snapshot_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("partial.csv")).unwrap();
        let store = CsvCheckpoint::new(path);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("partial.csv")).unwrap();
        let store = CsvCheckpoint::new(path);

        let rows = vec![sample_row("CCO", "1"), sample_row("CCN", "")];
        store.save(&rows).unwrap();
        assert_eq!(store.load().unwrap(), rows);

        // A later save replaces the snapshot wholesale.
        let shorter = vec![sample_row("CCO", "1")];
        store.save(&shorter).unwrap();
        assert_eq!(store.load().unwrap(), shorter);
    }

    #[test]
    fn corrupt_snapshot_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("partial.csv")).unwrap();
        std::fs::write(path.as_std_path(), "SMILES,CID\nCCO,702\n").unwrap();
        let store = CsvCheckpoint::new(path);
        assert!(matches!(
            store.load(),
            Err(EnrichError::CheckpointRead { .. })
        ));
    }

    #[test]
    fn processed_set_collects_descriptors() {
        let rows = vec![
            sample_row("CCO", "1"),
            sample_row("CCO", "2"),
            sample_row("CCN", ""),
        ];
        let processed = processed_descriptors(&rows);
        assert_eq!(processed.len(), 2);
        assert!(processed.contains("CCO"));
        assert!(processed.contains("CCN"));
    }
}
