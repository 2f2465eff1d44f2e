use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormatType {
    Text,
    Tsv,
    Csv,
    #[default]
    Json,
    SparqlResultsJson,
    Elasticsearch,
}

impl FormatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatType::Text => "text",
            FormatType::Tsv => "tsv",
            FormatType::Csv => "csv",
            FormatType::Json => "json",
            FormatType::SparqlResultsJson => "sparql-results-json",
            FormatType::Elasticsearch => "elasticsearch",
        }
    }

    pub fn accept(&self) -> &'static str {
        match self {
            FormatType::Text => "text/plain",
            FormatType::Tsv => "text/tab-separated-values",
            FormatType::Csv => "text/csv",
            FormatType::SparqlResultsJson => "application/sparql-results+json",
            FormatType::Json | FormatType::Elasticsearch => "application/json",
        }
    }

    pub fn pagination_params(&self) -> (&'static str, &'static str) {
        match self {
            FormatType::Elasticsearch => ("size", "from"),
            _ => ("limit", "offset"),
        }
    }
}

impl fmt::Display for FormatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Unknown names load as generic JSON.
impl FromStr for FormatType {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.trim() {
            "text" => FormatType::Text,
            "tsv" => FormatType::Tsv,
            "csv" => FormatType::Csv,
            "sparql-results-json" => FormatType::SparqlResultsJson,
            "elasticsearch" => FormatType::Elasticsearch,
            _ => FormatType::Json,
        })
    }
}

impl Serialize for FormatType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FormatType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        let Ok(format) = value.parse::<FormatType>();
        Ok(format)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Int(i64),
    Text(String),
}

impl NodeId {
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(text) => Some(NodeId::Text(text.clone())),
            serde_json::Value::Number(number) => number.as_i64().map(NodeId::Int),
            _ => None,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Int(value) => write!(f, "{value}"),
            NodeId::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId::Text(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        NodeId::Text(value)
    }
}

impl From<i64> for NodeId {
    fn from(value: i64) -> Self {
        NodeId::Int(value)
    }
}

// Command-line ids: digits become integer ids, everything else text.
impl FromStr for NodeId {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.parse::<i64>() {
            Ok(number) => NodeId::Int(number),
            Err(_) => NodeId::Text(value.to_string()),
        })
    }
}
