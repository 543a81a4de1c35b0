use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink, RunResult};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Console,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_run(result: &RunResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Progress lines on stderr, keeping stdout free for the run summary.
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn print_run(result: &RunResult) {
        if result.dry_run {
            eprintln!(
                "dry run: {} in working set, {} resumed from checkpoint, {} pending",
                result.working_set, result.resumed, result.pending
            );
            return;
        }
        eprintln!(
            "processed {} descriptors ({} resumed); {} rows, {} unique -> {}",
            result.processed, result.resumed, result.rows_total, result.rows_unique,
            result.enriched_path
        );
        eprintln!("merged output -> {}", result.output_path);
        if !result.dropped_columns.is_empty() {
            eprintln!(
                "note: master table kept its own values for colliding columns: {}",
                result.dropped_columns.join(", ")
            );
        }
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({:.1?})", event.message, elapsed),
            None => eprintln!("{}", event.message),
        }
    }
}
