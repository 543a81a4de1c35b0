use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;

use crate::checkpoint::{CheckpointStore, processed_descriptors};
use crate::config::ResolvedConfig;
use crate::domain::{AssayRow, Cid, Smiles};
use crate::error::EnrichError;
use crate::pubchem::{AssaySummary, PubChemClient};
use crate::table::{Table, merge};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub working_set: usize,
    pub resumed: usize,
    pub pending: usize,
    pub processed: usize,
    pub rows_total: usize,
    pub rows_unique: usize,
    pub dropped_columns: Vec<String>,
    pub enriched_path: String,
    pub output_path: String,
    pub finished_at: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<C: PubChemClient, S: CheckpointStore> {
    client: C,
    checkpoint: S,
}

impl<C: PubChemClient, S: CheckpointStore> App<C, S> {
    pub fn new(client: C, checkpoint: S) -> Self {
        Self { client, checkpoint }
    }

    /// Runs the whole pipeline: working-set selection, resume, enrichment
    /// with periodic checkpoint flushes, AID dedup, and the final merge back
    /// into the master table.
    pub fn run(
        &self,
        config: &ResolvedConfig,
        options: RunOptions,
        sink: &dyn ProgressSink,
    ) -> Result<RunResult, EnrichError> {
        let master = Table::load(&config.input)?;
        let working = master.working_set(&config.smiles_column, &config.label_column)?;

        let prior = self.checkpoint.load()?;
        let processed = processed_descriptors(&prior);
        let pending: Vec<Smiles> = working
            .iter()
            .filter(|smiles| !processed.contains(smiles.as_str()))
            .cloned()
            .collect();

        sink.event(ProgressEvent {
            message: format!(
                "phase=Resume; {} checkpoint rows cover {} descriptors, {} pending",
                prior.len(),
                processed.len(),
                pending.len()
            ),
            elapsed: None,
        });
        tracing::info!(
            working = working.len(),
            resumed = prior.len(),
            pending = pending.len(),
            "working set selected"
        );

        if options.dry_run {
            return Ok(RunResult {
                working_set: working.len(),
                resumed: prior.len(),
                pending: pending.len(),
                processed: 0,
                rows_total: prior.len(),
                rows_unique: dedup_by_aid(&prior).len(),
                dropped_columns: Vec::new(),
                enriched_path: config.enriched.to_string(),
                output_path: config.output.to_string(),
                finished_at: iso_timestamp(),
                dry_run: true,
            });
        }

        let start = std::time::Instant::now();
        let cids = self.resolve_cids(&pending, sink);
        let names = self.resolve_names(&cids, sink);

        let mut accumulator = prior;
        let resumed = accumulator.len();
        for (index, smiles) in pending.iter().enumerate() {
            sink.event(ProgressEvent {
                message: format!(
                    "phase=Collect; {}/{} {}",
                    index + 1,
                    pending.len(),
                    smiles
                ),
                elapsed: None,
            });
            let rows = self.collect_rows(smiles, cids[index].as_ref(), names[index].as_deref());
            accumulator.extend(rows);

            if index % config.flush_every == 0 || index + 1 == pending.len() {
                self.checkpoint.save(&accumulator)?;
                tracing::debug!(rows = accumulator.len(), "checkpoint flushed");
            }
        }
        sink.event(ProgressEvent {
            message: "phase=Collect; done".to_string(),
            elapsed: Some(start.elapsed()),
        });

        let unique = dedup_by_aid(&accumulator);
        let enriched = rows_to_table(&unique);
        enriched.write(&config.enriched)?;

        sink.event(ProgressEvent {
            message: "phase=Merge; joining enriched subset onto master".to_string(),
            elapsed: None,
        });
        let outcome = merge(&master, &enriched, &config.smiles_column, "SMILES")?;
        outcome.table.write(&config.output)?;
        if !outcome.dropped_columns.is_empty() {
            tracing::warn!(
                columns = ?outcome.dropped_columns,
                "enrichment columns collide with master table and were dropped"
            );
        }

        Ok(RunResult {
            working_set: working.len(),
            resumed,
            pending: pending.len(),
            processed: pending.len(),
            rows_total: accumulator.len(),
            rows_unique: unique.len(),
            dropped_columns: outcome.dropped_columns,
            enriched_path: config.enriched.to_string(),
            output_path: config.output.to_string(),
            finished_at: iso_timestamp(),
            dry_run: false,
        })
    }

    /// One CID lookup per descriptor, same length and order as the input.
    /// A failed lookup becomes `None` and never aborts the stage.
    pub fn resolve_cids(&self, pending: &[Smiles], sink: &dyn ProgressSink) -> Vec<Option<Cid>> {
        pending
            .iter()
            .enumerate()
            .map(|(index, smiles)| {
                sink.event(ProgressEvent {
                    message: format!("phase=Resolve; {}/{} {}", index + 1, pending.len(), smiles),
                    elapsed: None,
                });
                match self.client.resolve_cid(smiles) {
                    Ok(cid) => Some(cid),
                    Err(err) => {
                        tracing::debug!(smiles = %smiles, error = %err, "cid lookup failed");
                        None
                    }
                }
            })
            .collect()
    }

    /// IUPAC name per CID; unresolved CIDs pass through as `None` without a
    /// request.
    pub fn resolve_names(
        &self,
        cids: &[Option<Cid>],
        sink: &dyn ProgressSink,
    ) -> Vec<Option<String>> {
        cids.iter()
            .enumerate()
            .map(|(index, cid)| {
                let cid = cid.as_ref()?;
                sink.event(ProgressEvent {
                    message: format!("phase=Name; {}/{} cid {}", index + 1, cids.len(), cid),
                    elapsed: None,
                });
                match self.client.iupac_name(cid) {
                    Ok(name) => Some(name),
                    Err(err) => {
                        tracing::debug!(cid = %cid, error = %err, "name lookup failed");
                        None
                    }
                }
            })
            .collect()
    }

    /// Assay rows for one descriptor. Always returns at least one row: a
    /// molecule with no assays (or a failed lookup at any stage) keeps its
    /// traceability row with empty assay fields.
    fn collect_rows(
        &self,
        smiles: &Smiles,
        cid: Option<&Cid>,
        name: Option<&str>,
    ) -> Vec<AssayRow> {
        let Some(cid) = cid else {
            return vec![AssayRow::without_assays(smiles, None, name)];
        };

        let summary = match self.client.assay_summary(cid) {
            Ok(summary) => summary,
            Err(err) => {
                tracing::debug!(cid = %cid, error = %err, "assay summary lookup failed");
                AssaySummary::default()
            }
        };
        if summary.is_empty() {
            return vec![AssayRow::without_assays(smiles, Some(cid), name)];
        }

        let mut rows = Vec::with_capacity(summary.len());
        for index in 0..summary.len() {
            let aid = &summary.aids[index];
            let description = match self.client.assay_description(aid) {
                Ok(text) => text,
                Err(err) => {
                    tracing::debug!(aid = %aid, error = %err, "description lookup failed");
                    String::new()
                }
            };
            rows.push(AssayRow {
                smiles: smiles.as_str().to_string(),
                cid: cid.as_str().to_string(),
                name: name.unwrap_or_default().to_string(),
                aid: aid.clone(),
                activity: summary.activities[index].clone(),
                title: summary.titles[index].clone(),
                description,
            });
        }
        rows
    }
}

/// Keeps every empty-AID traceability row and the first occurrence of each
/// non-empty AID; later duplicates across compounds are dropped.
pub fn dedup_by_aid(rows: &[AssayRow]) -> Vec<AssayRow> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| row.aid.is_empty() || seen.insert(row.aid.clone()))
        .cloned()
        .collect()
}

pub fn rows_to_table(rows: &[AssayRow]) -> Table {
    let headers = AssayRow::HEADERS.iter().map(|h| h.to_string()).collect();
    let cells = rows
        .iter()
        .map(|row| {
            vec![
                row.smiles.clone(),
                row.cid.clone(),
                row.name.clone(),
                row.aid.clone(),
                row.activity.clone(),
                row.title.clone(),
                row.description.clone(),
            ]
        })
        .collect();
    Table::new(headers, cells)
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(smiles: &str, aid: &str) -> AssayRow {
        AssayRow {
            smiles: smiles.to_string(),
            cid: String::new(),
            name: String::new(),
            aid: aid.to_string(),
            activity: String::new(),
            title: String::new(),
            description: String::new(),
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let rows = vec![row("CCO", "1"), row("CCN", "1"), row("CCC", "2")];
        let unique = dedup_by_aid(&rows);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].smiles, "CCO");
        assert_eq!(unique[1].aid, "2");
    }

    #[test]
    fn dedup_always_keeps_sentinel_rows() {
        let rows = vec![row("CCO", ""), row("CCN", ""), row("CCC", "1")];
        let unique = dedup_by_aid(&rows);
        assert_eq!(unique.len(), 3);
    }
}
