use serde::Serialize;
use url::Url;

use crate::domain::FormatType;
use crate::error::StanzaError;

/// Zero `limit` and `offset` values are treated as absent.
pub fn build_request_url(
    url: &str,
    format: FormatType,
    limit: Option<u64>,
    offset: Option<u64>,
) -> Result<Url, StanzaError> {
    let mut parsed = Url::parse(url).map_err(|err| StanzaError::InvalidUrl {
        url: url.to_string(),
        message: err.to_string(),
    })?;

    let (limit_param, offset_param) = format.pagination_params();
    if let Some(limit) = limit.filter(|value| *value > 0) {
        set_query_param(&mut parsed, limit_param, &limit.to_string());
    }
    if let Some(offset) = offset.filter(|value| *value > 0) {
        set_query_param(&mut parsed, offset_param, &offset.to_string());
    }
    Ok(parsed)
}

fn set_query_param(url: &mut Url, name: &str, value: &str) {
    let retained = url
        .query_pairs()
        .filter(|(key, _)| key != name)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect::<Vec<_>>();

    let mut pairs = url.query_pairs_mut();
    pairs.clear();
    for (key, value) in &retained {
        pairs.append_pair(key, value);
    }
    pairs.append_pair(name, value);
}

/// Canonical cache key for one load request.
///
/// The key holds the normalized format rather than the caller's raw type
/// string, so an unrecognized type and `json` share an entry. Both decode as
/// JSON, so the shared entry always holds the same data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

#[derive(Serialize)]
struct KeyFields<'a> {
    url: &'a str,
    #[serde(rename = "type")]
    format: FormatType,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl CacheKey {
    pub fn new(url: &str, format: FormatType, limit: Option<u64>, offset: Option<u64>) -> Self {
        let fields = KeyFields {
            url,
            format,
            limit,
            offset,
        };
        // A struct of strings and integers always serializes.
        let key = serde_json::to_string(&fields).unwrap_or_default();
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_canonical_json() {
        let key = CacheKey::new("https://example.org/data", FormatType::Csv, Some(10), None);
        assert_eq!(
            key.as_str(),
            r#"{"url":"https://example.org/data","type":"csv","limit":10,"offset":null}"#
        );
    }

    #[test]
    fn set_query_param_replaces_existing() {
        let mut url = Url::parse("https://example.org/q?limit=5&a=b").unwrap();
        set_query_param(&mut url, "limit", "20");
        assert_eq!(url.as_str(), "https://example.org/q?a=b&limit=20");
    }
}
