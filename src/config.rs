use std::fs;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::EnrichError;

pub const DEFAULT_CHECKPOINT: &str = "partial_output.csv";
pub const DEFAULT_ENRICHED: &str = "out.csv";
pub const DEFAULT_OUTPUT: &str = "pubchem_scraper_out.csv";
pub const DEFAULT_SMILES_COLUMN: &str = "SMILES";
pub const DEFAULT_LABEL_COLUMN: &str = "target_seq_label_1";
pub const DEFAULT_FLUSH_EVERY: usize = 10;

/// On-disk JSON config. Every field is optional; CLI flags override it and
/// the defaults above fill whatever remains.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub input: Option<Utf8PathBuf>,
    #[serde(default)]
    pub checkpoint: Option<Utf8PathBuf>,
    #[serde(default)]
    pub enriched: Option<Utf8PathBuf>,
    #[serde(default)]
    pub output: Option<Utf8PathBuf>,
    #[serde(default)]
    pub smiles_column: Option<String>,
    #[serde(default)]
    pub label_column: Option<String>,
    #[serde(default)]
    pub flush_every: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub input: Utf8PathBuf,
    pub checkpoint: Utf8PathBuf,
    pub enriched: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub smiles_column: String,
    pub label_column: String,
    pub flush_every: usize,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub input: Option<Utf8PathBuf>,
    pub checkpoint: Option<Utf8PathBuf>,
    pub enriched: Option<Utf8PathBuf>,
    pub output: Option<Utf8PathBuf>,
    pub smiles_column: Option<String>,
    pub label_column: Option<String>,
    pub flush_every: Option<usize>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, EnrichError> {
        let config = match path {
            Some(path) => {
                let config_path = Utf8PathBuf::from(path);
                let content = fs::read_to_string(config_path.as_std_path())
                    .map_err(|_| EnrichError::ConfigRead(config_path.clone()))?;
                serde_json::from_str::<Config>(&content)
                    .map_err(|err| EnrichError::ConfigParse(err.to_string()))?
            }
            None => Config::default(),
        };

        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, EnrichError> {
        let input = overrides
            .input
            .or(config.input)
            .ok_or_else(|| EnrichError::ConfigParse("no input table given".to_string()))?;

        let flush_every = overrides
            .flush_every
            .or(config.flush_every)
            .unwrap_or(DEFAULT_FLUSH_EVERY);
        if flush_every == 0 {
            return Err(EnrichError::ConfigParse(
                "flush_every must be at least 1".to_string(),
            ));
        }

        Ok(ResolvedConfig {
            input,
            checkpoint: overrides
                .checkpoint
                .or(config.checkpoint)
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_CHECKPOINT)),
            enriched: overrides
                .enriched
                .or(config.enriched)
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_ENRICHED)),
            output: overrides
                .output
                .or(config.output)
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT)),
            smiles_column: overrides
                .smiles_column
                .or(config.smiles_column)
                .unwrap_or_else(|| DEFAULT_SMILES_COLUMN.to_string()),
            label_column: overrides
                .label_column
                .or(config.label_column)
                .unwrap_or_else(|| DEFAULT_LABEL_COLUMN.to_string()),
            flush_every,
        })
    }
}
