use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::domain::{Cid, Smiles};
use crate::error::EnrichError;

/// Index-aligned assay summary for one compound. The three vectors always
/// have equal length; an empty summary means "compound has no assays".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssaySummary {
    pub aids: Vec<String>,
    pub activities: Vec<String>,
    pub titles: Vec<String>,
}

impl AssaySummary {
    pub fn len(&self) -> usize {
        self.aids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aids.is_empty()
    }
}

pub trait PubChemClient: Send + Sync {
    fn resolve_cid(&self, smiles: &Smiles) -> Result<Cid, EnrichError>;
    fn iupac_name(&self, cid: &Cid) -> Result<String, EnrichError>;
    fn assay_summary(&self, cid: &Cid) -> Result<AssaySummary, EnrichError>;
    fn assay_description(&self, aid: &str) -> Result<String, EnrichError>;
}

#[derive(Clone)]
pub struct PubChemHttpClient {
    client: Client,
    base_url: String,
}

impl PubChemHttpClient {
    pub fn new() -> Result<Self, EnrichError> {
        Self::with_base_url("https://pubchem.ncbi.nlm.nih.gov/rest/pug".to_string())
    }

    pub fn with_base_url(base_url: String) -> Result<Self, EnrichError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("assay-enrich/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| EnrichError::PubchemHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| EnrichError::PubchemHttp(err.to_string()))?;
        Ok(Self { client, base_url })
    }

    fn cids_url(&self) -> String {
        format!("{}/compound/smiles/cids/JSON", self.base_url)
    }

    fn property_url(&self, cid: &Cid) -> String {
        format!(
            "{}/compound/cid/{}/property/IUPACName/JSON",
            self.base_url,
            cid.as_str()
        )
    }

    fn assay_summary_url(&self, cid: &Cid) -> String {
        format!(
            "{}/compound/cid/{}/assaysummary/JSON",
            self.base_url,
            cid.as_str()
        )
    }

    fn description_url(&self, aid: &str) -> String {
        format!("{}/assay/aid/{}/description/JSON", self.base_url, aid)
    }

    fn get_json(&self, request: reqwest::blocking::RequestBuilder) -> Result<Value, EnrichError> {
        let response = request
            .send()
            .map_err(|err| EnrichError::PubchemHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "PubChem request failed".to_string());
            return Err(EnrichError::PubchemStatus { status, message });
        }
        response
            .json()
            .map_err(|err| EnrichError::PubchemParse(err.to_string()))
    }
}

impl PubChemClient for PubChemHttpClient {
    fn resolve_cid(&self, smiles: &Smiles) -> Result<Cid, EnrichError> {
        let request = self
            .client
            .get(self.cids_url())
            .query(&[("smiles", smiles.as_str())]);
        let raw = self.get_json(request)?;
        extract_first_cid(&raw)
    }

    fn iupac_name(&self, cid: &Cid) -> Result<String, EnrichError> {
        let raw = self.get_json(self.client.get(self.property_url(cid)))?;
        extract_iupac_name(&raw)
    }

    fn assay_summary(&self, cid: &Cid) -> Result<AssaySummary, EnrichError> {
        let raw = self.get_json(self.client.get(self.assay_summary_url(cid)))?;
        Ok(extract_assay_summary(&raw))
    }

    fn assay_description(&self, aid: &str) -> Result<String, EnrichError> {
        let raw = self.get_json(self.client.get(self.description_url(aid)))?;
        extract_assay_description(&raw)
    }
}

/// First CID of an `IdentifierList` response. CID 0 is PubChem's own
/// "no match" marker and counts as a failed lookup.
pub fn extract_first_cid(raw: &Value) -> Result<Cid, EnrichError> {
    let cid = raw
        .get("IdentifierList")
        .and_then(|v| v.get("CID"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| EnrichError::PubchemParse("missing IdentifierList.CID".to_string()))?;
    cell_text(cid).parse()
}

pub fn extract_iupac_name(raw: &Value) -> Result<String, EnrichError> {
    raw.get("PropertyTable")
        .and_then(|v| v.get("Properties"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|v| v.get("IUPACName"))
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| EnrichError::PubchemParse("missing PropertyTable IUPACName".to_string()))
}

/// Pulls AID (cell 0), activity outcome (cell 4) and assay title (cell 9)
/// out of a `Table.Row[].Cell` response. Rows with fewer than 10 cells are
/// skipped. Absent or malformed tables yield an empty summary.
pub fn extract_assay_summary(raw: &Value) -> AssaySummary {
    let mut summary = AssaySummary::default();
    let rows = raw
        .get("Table")
        .and_then(|v| v.get("Row"))
        .and_then(|v| v.as_array());
    let Some(rows) = rows else {
        return summary;
    };
    for row in rows {
        let Some(cells) = row.get("Cell").and_then(|v| v.as_array()) else {
            continue;
        };
        if cells.len() < 10 {
            continue;
        }
        summary.aids.push(cell_text(&cells[0]));
        summary.activities.push(cell_text(&cells[4]));
        summary.titles.push(cell_text(&cells[9]));
    }
    summary
}

/// The `descr.description` field is a list of paragraph fragments in most
/// assay records but a bare scalar in some older ones.
pub fn extract_assay_description(raw: &Value) -> Result<String, EnrichError> {
    let description = raw
        .get("PC_AssayContainer")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|v| v.get("assay"))
        .and_then(|v| v.get("descr"))
        .and_then(|v| v.get("description"))
        .ok_or_else(|| {
            EnrichError::PubchemParse("missing PC_AssayContainer description".to_string())
        })?;
    match description {
        Value::Array(fragments) => Ok(fragments
            .iter()
            .map(cell_text)
            .collect::<Vec<_>>()
            .join(" ")),
        other => Ok(cell_text(other)),
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
