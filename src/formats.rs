use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::FormatType;
use crate::error::StanzaError;

pub const ROW_ID_FIELD: &str = "__togostanza_id__";

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Dataset {
    Rows(Vec<Row>),
    Text(String),
    Raw(Value),
}

impl Dataset {
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Dataset::Rows(rows) => Some(rows.as_slice()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rows().map_or(0, |rows| rows.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stamp_row_ids(&mut self) {
        if let Dataset::Rows(rows) = self {
            for (index, row) in rows.iter_mut().enumerate() {
                row.insert(ROW_ID_FIELD.to_string(), Value::from(index));
            }
        }
    }
}

impl From<Value> for Dataset {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) if items.iter().all(Value::is_object) => Dataset::Rows(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(row) => Some(row),
                        _ => None,
                    })
                    .collect(),
            ),
            other => Dataset::Raw(other),
        }
    }
}

pub fn decode(format: FormatType, body: &str) -> Result<Dataset, StanzaError> {
    match format {
        FormatType::Text => Ok(Dataset::Text(body.to_string())),
        FormatType::Tsv => decode_delimited(body, b'\t', format),
        FormatType::Csv => decode_delimited(body, b',', format),
        FormatType::Json => decode_json(body),
        FormatType::SparqlResultsJson => decode_sparql(body),
        FormatType::Elasticsearch => decode_elasticsearch(body),
    }
}

pub fn decode_delimited(
    body: &str,
    delimiter: u8,
    format: FormatType,
) -> Result<Dataset, StanzaError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| StanzaError::parse(format, err))?
        .clone();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record
            .map_err(|err| StanzaError::parse(format, format!("record {}: {err}", index + 1)))?;
        let row = headers
            .iter()
            .enumerate()
            .map(|(column, name)| {
                let value = record.get(column).unwrap_or("");
                (name.to_string(), Value::String(value.to_string()))
            })
            .collect::<Row>();
        rows.push(row);
    }
    Ok(Dataset::Rows(rows))
}

pub fn decode_json(body: &str) -> Result<Dataset, StanzaError> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| StanzaError::parse(FormatType::Json, err))?;
    Ok(Dataset::from(value))
}

#[derive(Debug, Deserialize)]
pub struct SparqlResults {
    pub head: SparqlHead,
    pub results: SparqlBindings,
}

#[derive(Debug, Deserialize)]
pub struct SparqlHead {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SparqlBindings {
    #[serde(default)]
    pub bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
pub struct SparqlTerm {
    pub value: String,
}

pub fn decode_sparql(body: &str) -> Result<Dataset, StanzaError> {
    let results: SparqlResults = serde_json::from_str(body)
        .map_err(|err| StanzaError::parse(FormatType::SparqlResultsJson, err))?;
    Ok(Dataset::Rows(sparql_to_rows(&results)))
}

pub fn sparql_to_rows(results: &SparqlResults) -> Vec<Row> {
    results
        .results
        .bindings
        .iter()
        .map(|binding| {
            results
                .head
                .vars
                .iter()
                .map(|var| {
                    let value = binding
                        .get(var)
                        .map(|term| term.value.clone())
                        .unwrap_or_default();
                    (var.clone(), Value::String(value))
                })
                .collect()
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: Row,
}

pub fn decode_elasticsearch(body: &str) -> Result<Dataset, StanzaError> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|err| StanzaError::parse(FormatType::Elasticsearch, err))?;
    Ok(Dataset::Rows(
        response.hits.hits.into_iter().map(|hit| hit.source).collect(),
    ))
}
