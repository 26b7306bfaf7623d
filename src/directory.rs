//! Bird directory port and the Nuthatch HTTP adapter.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{null_as_default, BirdRecord, SearchPage, SearchQuery};

pub trait BirdDirectory: Send + Sync {
    fn search(&self, query: &SearchQuery) -> AppResult<SearchPage>;
}

/// Client for the Nuthatch `GET /birds` endpoint.
pub struct NuthatchClient {
    http: Client,
    base_url: String,
    api_key: String,
}

/// Wire shape of a `/birds` response. Only the fields we consume are listed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BirdsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    entities: Vec<BirdRecord>,
    #[serde(default)]
    total_pages: Option<u32>,
    #[serde(default)]
    total: Option<u32>,
    #[serde(default)]
    page_size: Option<u32>,
}

impl NuthatchClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AppError::from)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            &config.api_base_url,
            &config.api_key,
            config.request_timeout,
        )
    }

    fn fetch(&self, query: &SearchQuery) -> AppResult<SearchPage> {
        let body = self
            .http
            .get(format!("{}/birds", self.base_url))
            .header("API-Key", &self.api_key)
            .query(&query_params(query))
            .send()?
            .error_for_status()?
            .text()?;
        parse_page(&body, query)
    }
}

impl BirdDirectory for NuthatchClient {
    fn search(&self, query: &SearchQuery) -> AppResult<SearchPage> {
        debug!(name = %query.name, page = query.page, "searching bird directory");
        let result = self.fetch(query);
        if let Err(err) = &result {
            warn!(name = %query.name, page = query.page, error = %err, "bird search failed");
        }
        result
    }
}

pub(crate) fn query_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("page", query.page.to_string()),
        ("pageSize", query.page_size.to_string()),
        ("hasImg", "true".to_string()),
        ("operator", "AND".to_string()),
        ("name", query.name.trim().to_string()),
    ];
    if let Some(region) = &query.region {
        params.push(("region", region.clone()));
    }
    params
}

pub(crate) fn parse_page(body: &str, query: &SearchQuery) -> AppResult<SearchPage> {
    let response: BirdsResponse = serde_json::from_str(body)
        .map_err(|err| AppError::Network(format!("unexpected directory response: {err}")))?;

    let total_pages = response
        .total_pages
        .or_else(|| {
            let total = response.total?;
            let page_size = response.page_size.unwrap_or(query.page_size).max(1);
            Some(total.div_ceil(page_size))
        })
        .unwrap_or(1)
        .max(1);

    Ok(SearchPage {
        birds: response.entities,
        page: query.page,
        total_pages,
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const SAMPLE: &str = r#"{
        "entities": [
            {
                "id": 42,
                "name": "Blue Jay",
                "sciName": "Cyanocitta cristata",
                "order": "Passeriformes",
                "family": "Corvidae",
                "status": "Low Concern",
                "region": ["North America"],
                "images": ["https://img.example/jay.jpg"],
                "wingspanMin": "34",
                "wingspanMax": "43",
                "lengthMin": 25,
                "lengthMax": 30
            }
        ],
        "total": 1,
        "page": 1,
        "pageSize": 24,
        "totalPages": 1
    }"#;

    #[test]
    fn parses_entities_and_page_count() {
        let query = SearchQuery::new("jay", 24);
        let page = parse_page(SAMPLE, &query).unwrap();
        assert_eq!(page.total_pages, 1);
        let jay = &page.birds[0];
        assert_eq!(jay.id, Some(42));
        assert_eq!(jay.sci_name, "Cyanocitta cristata");
        assert_eq!(jay.wingspan_summary(), "34 - 43 cm");
        assert_eq!(jay.length_summary(), "25 - 30 cm");
    }

    #[rstest]
    #[case(r#"{"entities": [], "total": 50, "pageSize": 24}"#, 3)]
    #[case(r#"{"entities": [], "total": 0}"#, 1)]
    #[case(r#"{"entities": []}"#, 1)]
    fn derives_page_count_when_missing(#[case] body: &str, #[case] expected: u32) {
        let page = parse_page(body, &SearchQuery::new("x", 24)).unwrap();
        assert_eq!(page.total_pages, expected);
    }

    #[test]
    fn null_fields_fall_back_to_placeholders() {
        let body = r#"{
            "entities": [
                {"id": 1, "name": "Blue Jay", "status": "Low Concern", "images": ["a.jpg"]},
                {
                    "id": 2,
                    "name": "Mystery Wren",
                    "sciName": null,
                    "order": null,
                    "family": null,
                    "status": null,
                    "region": null,
                    "images": null,
                    "wingspanMin": null,
                    "lengthMax": null
                }
            ],
            "totalPages": 1
        }"#;

        let page = parse_page(body, &SearchQuery::new("w", 24)).unwrap();
        assert_eq!(page.birds.len(), 2);
        assert_eq!(page.birds[0].name, "Blue Jay");

        let wren = &page.birds[1];
        assert!(wren.status.is_empty());
        assert!(wren.images.is_empty());
        assert_eq!(wren.region_summary(), crate::models::NO_DATA);
        assert_eq!(wren.wingspan_summary(), crate::models::NO_DATA);
        assert_eq!(wren.primary_image(), None);
    }

    #[test]
    fn malformed_body_is_a_network_error() {
        let err = parse_page("<html>bad gateway</html>", &SearchQuery::new("x", 24)).unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
    }

    #[test]
    fn query_parameters_follow_the_directory_contract() {
        let query = SearchQuery::new(" heron ", 12)
            .with_region(Some("Western Europe".into()))
            .at_page(3);
        let params = query_params(&query);
        assert_eq!(
            params,
            vec![
                ("page", "3".to_string()),
                ("pageSize", "12".to_string()),
                ("hasImg", "true".to_string()),
                ("operator", "AND".to_string()),
                ("name", "heron".to_string()),
                ("region", "Western Europe".to_string()),
            ]
        );
    }

    #[test]
    fn unreachable_directory_reports_network_error() {
        let client =
            NuthatchClient::new("http://127.0.0.1:9", "key", Duration::from_millis(500)).unwrap();
        let err = client.search(&SearchQuery::new("jay", 24)).unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
    }
}
