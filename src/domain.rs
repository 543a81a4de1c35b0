use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EnrichError;

/// Textual encoding of a molecule structure; the join key across all tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Smiles(String);

impl Smiles {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Smiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Smiles {
    type Err = EnrichError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.chars().any(|ch| ch.is_whitespace()) {
            return Err(EnrichError::InvalidSmiles(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// PubChem compound identifier. Stage outputs carry `Option<Cid>`; `None`
/// is the representable "lookup failed" value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cid(String);

impl Cid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Cid {
    type Err = EnrichError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let is_valid = !trimmed.is_empty()
            && trimmed != "0"
            && trimmed.chars().all(|ch| ch.is_ascii_digit());
        if !is_valid {
            return Err(EnrichError::InvalidCid(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// One enrichment result row. Headers match the checkpoint/output CSV layout.
/// Empty string is the sentinel in every field past `SMILES`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssayRow {
    #[serde(rename = "SMILES")]
    pub smiles: String,
    #[serde(rename = "CID")]
    pub cid: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "AID")]
    pub aid: String,
    #[serde(rename = "ACTIVITY")]
    pub activity: String,
    #[serde(rename = "TITLE")]
    pub title: String,
    #[serde(rename = "DESCRIPTION")]
    pub description: String,
}

impl AssayRow {
    pub const HEADERS: [&'static str; 7] = [
        "SMILES",
        "CID",
        "Name",
        "AID",
        "ACTIVITY",
        "TITLE",
        "DESCRIPTION",
    ];

    /// Traceability row for a molecule that was looked up but produced no
    /// assay records (or whose processing failed).
    pub fn without_assays(smiles: &Smiles, cid: Option<&Cid>, name: Option<&str>) -> Self {
        Self {
            smiles: smiles.as_str().to_string(),
            cid: cid.map(|c| c.as_str().to_string()).unwrap_or_default(),
            name: name.unwrap_or_default().to_string(),
            aid: String::new(),
            activity: String::new(),
            title: String::new(),
            description: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_smiles_valid() {
        let smiles: Smiles = " CCO ".parse().unwrap();
        assert_eq!(smiles.as_str(), "CCO");
    }

    #[test]
    fn parse_smiles_invalid() {
        let err = "C C".parse::<Smiles>().unwrap_err();
        assert_matches!(err, EnrichError::InvalidSmiles(_));
        let err = "".parse::<Smiles>().unwrap_err();
        assert_matches!(err, EnrichError::InvalidSmiles(_));
    }

    #[test]
    fn parse_cid_valid() {
        let cid: Cid = "702".parse().unwrap();
        assert_eq!(cid.as_str(), "702");
    }

    #[test]
    fn parse_cid_invalid() {
        assert_matches!("".parse::<Cid>(), Err(EnrichError::InvalidCid(_)));
        assert_matches!("0".parse::<Cid>(), Err(EnrichError::InvalidCid(_)));
        assert_matches!("12x".parse::<Cid>(), Err(EnrichError::InvalidCid(_)));
    }

    #[test]
    fn sentinel_row_has_empty_assay_fields() {
        let smiles: Smiles = "CCO".parse().unwrap();
        let cid: Cid = "702".parse().unwrap();
        let row = AssayRow::without_assays(&smiles, Some(&cid), Some("ethanol"));
        assert_eq!(row.smiles, "CCO");
        assert_eq!(row.cid, "702");
        assert_eq!(row.name, "ethanol");
        assert!(row.aid.is_empty());
        assert!(row.activity.is_empty());
        assert!(row.title.is_empty());
        assert!(row.description.is_empty());
    }
}
