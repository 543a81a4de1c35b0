use std::collections::HashMap;
use std::fs;

use camino::Utf8Path;

use crate::domain::Smiles;
use crate::error::EnrichError;

/// A CSV table held fully in memory: one header row plus string cells.
/// Rows shorter than the header are padded with empty cells on load;
/// rows longer than the header are rejected as malformed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn load(path: &Utf8Path) -> Result<Self, EnrichError> {
        if !path.as_std_path().exists() {
            return Err(EnrichError::MissingInput(path.to_owned()));
        }
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path.as_std_path())
            .map_err(|err| EnrichError::InputRead {
                path: path.to_owned(),
                message: err.to_string(),
            })?;
        let headers = reader
            .headers()
            .map_err(|err| EnrichError::InputRead {
                path: path.to_owned(),
                message: err.to_string(),
            })?
            .iter()
            .map(|cell| cell.to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| EnrichError::InputRead {
                path: path.to_owned(),
                message: err.to_string(),
            })?;
            if record.len() > headers.len() {
                let line = record.position().map(|pos| pos.line()).unwrap_or_default();
                return Err(EnrichError::InputRead {
                    path: path.to_owned(),
                    message: format!(
                        "record on line {line} has {} fields, header has {}",
                        record.len(),
                        headers.len()
                    ),
                });
            }
            let mut row = record
                .iter()
                .map(|cell| cell.to_string())
                .collect::<Vec<_>>();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    pub fn write(&self, path: &Utf8Path) -> Result<(), EnrichError> {
        if let Some(parent) = path.parent() {
            if !parent.as_str().is_empty() {
                fs::create_dir_all(parent.as_std_path())
                    .map_err(|err| EnrichError::Filesystem(err.to_string()))?;
            }
        }
        let mut writer = csv::Writer::from_path(path.as_std_path())
            .map_err(|err| EnrichError::Csv(err.to_string()))?;
        writer
            .write_record(&self.headers)
            .map_err(|err| EnrichError::Csv(err.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|err| EnrichError::Csv(err.to_string()))?;
        }
        writer
            .flush()
            .map_err(|err| EnrichError::Csv(err.to_string()))?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Result<usize, EnrichError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| EnrichError::MissingColumn(name.to_string()))
    }

    /// Descriptors of rows whose label cell is empty, in table order.
    /// Rows carrying an unparseable descriptor are skipped with a warning;
    /// they cannot serve as a join key.
    pub fn working_set(
        &self,
        smiles_column: &str,
        label_column: &str,
    ) -> Result<Vec<Smiles>, EnrichError> {
        let smiles_idx = self.column_index(smiles_column)?;
        let label_idx = self.column_index(label_column)?;

        let mut selected = Vec::new();
        for row in &self.rows {
            if !row[label_idx].trim().is_empty() {
                continue;
            }
            match row[smiles_idx].parse::<Smiles>() {
                Ok(smiles) => selected.push(smiles),
                Err(_) => {
                    tracing::warn!(cell = %row[smiles_idx], "skipping row with unusable SMILES");
                }
            }
        }
        Ok(selected)
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub table: Table,
    /// Enrichment columns discarded because the master table already had a
    /// column of the same name. Master values win on collision.
    pub dropped_columns: Vec<String>,
}

/// Left-joins `enriched` onto `master` by the named key columns. Keys are
/// compared with surrounding whitespace trimmed, since enrichment rows carry
/// the trimmed descriptor. Every master row is kept; a master row with
/// several enrichment matches expands into one output row per match, and a
/// row with none gets empty enrichment cells.
pub fn merge(
    master: &Table,
    enriched: &Table,
    master_key: &str,
    enriched_key: &str,
) -> Result<MergeOutcome, EnrichError> {
    let master_key = master.column_index(master_key)?;
    let enriched_key = enriched.column_index(enriched_key)?;

    let mut kept_columns = Vec::new();
    let mut dropped_columns = Vec::new();
    for (idx, header) in enriched.headers.iter().enumerate() {
        if idx == enriched_key {
            continue;
        }
        if master.headers.contains(header) {
            dropped_columns.push(header.clone());
        } else {
            kept_columns.push(idx);
        }
    }

    let mut by_key: HashMap<&str, Vec<&Vec<String>>> = HashMap::new();
    for row in &enriched.rows {
        by_key
            .entry(row[enriched_key].trim())
            .or_default()
            .push(row);
    }

    let mut headers = master.headers.clone();
    headers.extend(
        kept_columns
            .iter()
            .map(|&idx| enriched.headers[idx].clone()),
    );

    let mut rows = Vec::new();
    for master_row in &master.rows {
        match by_key.get(master_row[master_key].trim()) {
            Some(matches) if !matches.is_empty() => {
                for enriched_row in matches {
                    let mut row = master_row.clone();
                    row.extend(kept_columns.iter().map(|&idx| enriched_row[idx].clone()));
                    rows.push(row);
                }
            }
            _ => {
                let mut row = master_row.clone();
                row.extend(kept_columns.iter().map(|_| String::new()));
                rows.push(row);
            }
        }
    }

    Ok(MergeOutcome {
        table: Table::new(headers, rows),
        dropped_columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn working_set_selects_empty_labels() {
        let master = table(
            &["SMILES", "target_seq_label_1"],
            &[&["CCO", ""], &["CCN", "kinase"], &["c1ccccc1", "  "]],
        );
        let selected = master.working_set("SMILES", "target_seq_label_1").unwrap();
        let selected: Vec<&str> = selected.iter().map(|s| s.as_str()).collect();
        assert_eq!(selected, vec!["CCO", "c1ccccc1"]);
    }

    #[test]
    fn working_set_requires_columns() {
        let master = table(&["SMILES"], &[&["CCO"]]);
        let err = master.working_set("SMILES", "missing").unwrap_err();
        assert!(matches!(err, EnrichError::MissingColumn(_)));
    }

    #[test]
    fn load_pads_short_rows_and_rejects_long_ones() {
        let temp = tempfile::tempdir().unwrap();
        let path =
            camino::Utf8PathBuf::from_path_buf(temp.path().join("master.csv")).unwrap();

        std::fs::write(path.as_std_path(), "SMILES,label\nCCO\n").unwrap();
        let table = Table::load(&path).unwrap();
        assert_eq!(table.rows()[0], vec!["CCO", ""]);

        std::fs::write(path.as_std_path(), "SMILES,label\nCCO,x,extra\n").unwrap();
        let err = Table::load(&path).unwrap_err();
        assert!(matches!(err, EnrichError::InputRead { .. }));
    }

    #[test]
    fn merge_matches_keys_with_surrounding_whitespace() {
        let master = table(&["SMILES", "label"], &[&[" CCO ", ""]]);
        let enriched = table(&["SMILES", "CID"], &[&["CCO", "702"]]);
        let outcome = merge(&master, &enriched, "SMILES", "SMILES").unwrap();
        assert_eq!(outcome.table.rows()[0], vec![" CCO ", "", "702"]);
    }

    #[test]
    fn merge_master_wins_on_collision() {
        let master = table(
            &["SMILES", "label", "extra"],
            &[&["CCO", "", "original"]],
        );
        let enriched = table(
            &["SMILES", "extra", "CID"],
            &[&["CCO", "overwritten", "702"]],
        );
        let outcome = merge(&master, &enriched, "SMILES", "SMILES").unwrap();
        assert_eq!(outcome.dropped_columns, vec!["extra"]);
        assert_eq!(
            outcome.table.headers(),
            &["SMILES", "label", "extra", "CID"]
        );
        assert_eq!(outcome.table.rows()[0], vec!["CCO", "", "original", "702"]);
    }

    #[test]
    fn merge_keeps_unmatched_master_rows() {
        let master = table(&["SMILES", "label"], &[&["CCO", ""], &["CCN", "x"]]);
        let enriched = table(&["SMILES", "CID"], &[&["CCO", "702"]]);
        let outcome = merge(&master, &enriched, "SMILES", "SMILES").unwrap();
        assert_eq!(outcome.table.rows().len(), 2);
        assert_eq!(outcome.table.rows()[1], vec!["CCN", "x", ""]);
    }

    #[test]
    fn merge_expands_multiple_matches() {
        let master = table(&["SMILES", "label"], &[&["CCO", ""]]);
        let enriched = table(
            &["SMILES", "AID"],
            &[&["CCO", "1"], &["CCO", "2"]],
        );
        let outcome = merge(&master, &enriched, "SMILES", "SMILES").unwrap();
        assert_eq!(outcome.table.rows().len(), 2);
        assert_eq!(outcome.table.rows()[0][1], "");
        assert_eq!(outcome.table.rows()[0][2], "1");
        assert_eq!(outcome.table.rows()[1][2], "2");
    }
}
