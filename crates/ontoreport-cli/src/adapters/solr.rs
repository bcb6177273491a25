//! Solr `select` handler as the term search index
use ontoreport_core::{SearchIndex, SearchQuery, SearchResponse, ServiceError};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize)]
struct SelectBody {
    response: SelectResponse,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectResponse {
    num_found: u64,
}

pub struct SolrSearchIndex {
    client: Client,
    select_url: String,
}

impl SolrSearchIndex {
    /// `core_url` is the core base, e.g. `http://localhost:8983/solr/term_search_core1`.
    pub fn new(core_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            select_url: format!("{}/select", core_url.trim_end_matches('/')),
        })
    }

    pub fn select_url(&self) -> &str {
        &self.select_url
    }
}

impl SearchIndex for SolrSearchIndex {
    fn search(&self, query: &SearchQuery) -> Result<SearchResponse, ServiceError> {
        let mut params: Vec<(&str, &str)> = vec![("q", query.text.as_str()), ("wt", "json")];
        params.extend(query.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let resp = self
            .client
            .get(&self.select_url)
            .query(&params)
            .send()
            .map_err(|e| ServiceError::Unavailable(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| ServiceError::Unavailable(e.to_string()))?;
        if !status.is_success() {
            return Err(ServiceError::Query(format!(
                "search index returned {}: {}",
                status, body
            )));
        }
        parse_select(&body)
    }
}

pub fn parse_select(body: &str) -> Result<SearchResponse, ServiceError> {
    let parsed: SelectBody =
        serde_json::from_str(body).map_err(|e| ServiceError::Decode(e.to_string()))?;
    Ok(SearchResponse {
        num_found: parsed.response.num_found,
    })
}
