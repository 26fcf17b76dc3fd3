use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Distributor, KeywordQuery, TransportFailure};
use crate::config::ClientConfig;
use crate::error::Error;
use crate::models::{LookupOutcome, PartRecord, RawCandidate, NOT_AVAILABLE};

pub const DEFAULT_BASE_URL: &str = "https://api.mouser.com/api/v1.0";

const USER_AGENT_VALUE: &str = concat!("bom-risk/", env!("CARGO_PKG_VERSION"));

/// Client for the Mouser Search API (v1).
pub struct MouserClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl MouserClient {
    pub fn new(api_key: String, config: &ClientConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, api_key, &config.mouser_base_url))
    }

    pub(crate) fn with_client(client: Client, api_key: String, base_url: &str) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn search<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Vec<WirePart>, TransportFailure> {
        // The API key travels in the query string, so reqwest errors are
        // stripped of their URL before they reach logs or reports.
        let url = format!("{}/search/{}", self.base_url, endpoint);
        tracing::debug!(%url, "mouser request");

        let response = self
            .client
            .post(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, USER_AGENT_VALUE)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportFailure::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportFailure::Status(status.as_u16()));
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| TransportFailure::Decode(e.without_url().to_string()))?;

        data.into_parts()
    }
}

#[async_trait]
impl Distributor for MouserClient {
    fn name(&self) -> &str {
        "Mouser"
    }

    async fn lookup_part(&self, part_number: &str) -> LookupOutcome {
        let body = PartNumberRequest {
            search_by_part_request: PartNumberQuery {
                mouser_part_number: part_number,
                part_search_options: "1",
            },
        };

        match self.search("partnumber", &body).await {
            Ok(parts) => match parts.into_iter().next() {
                Some(part) => LookupOutcome::Found(part.into_record()),
                None => LookupOutcome::NoData,
            },
            Err(failure) => {
                tracing::debug!(part_number, %failure, "lookup failed");
                LookupOutcome::TransportFailure(failure)
            }
        }
    }

    async fn search_by_keyword(
        &self,
        query: &KeywordQuery,
    ) -> Result<Vec<RawCandidate>, TransportFailure> {
        let body = KeywordRequest {
            search_by_keyword_request: KeywordSearch {
                keyword: &query.keywords,
                records: query.max_records,
                starting_record: query.starting_record,
                search_options: query.in_stock_only.then_some("InStock"),
                search_with_your_sign_up_language: "true",
            },
        };

        let parts = self.search("keyword", &body).await?;
        Ok(parts.into_iter().map(WirePart::into_candidate).collect())
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PartNumberRequest<'a> {
    #[serde(rename = "SearchByPartRequest")]
    search_by_part_request: PartNumberQuery<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PartNumberQuery<'a> {
    mouser_part_number: &'a str,
    part_search_options: &'a str,
}

#[derive(Serialize)]
struct KeywordRequest<'a> {
    #[serde(rename = "SearchByKeywordRequest")]
    search_by_keyword_request: KeywordSearch<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeywordSearch<'a> {
    keyword: &'a str,
    records: u32,
    starting_record: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_options: Option<&'a str>,
    search_with_your_sign_up_language: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResponse {
    #[serde(default)]
    errors: Option<Vec<ApiMessage>>,
    #[serde(default)]
    search_results: Option<SearchResults>,
}

impl SearchResponse {
    fn into_parts(self) -> Result<Vec<WirePart>, TransportFailure> {
        let parts = self
            .search_results
            .and_then(|r| r.parts)
            .unwrap_or_default();

        let errors = self.errors.unwrap_or_default();
        if parts.is_empty() && !errors.is_empty() {
            let message = errors
                .iter()
                .filter_map(|e| e.message.as_deref())
                .collect::<Vec<_>>()
                .join("; ");
            tracing::warn!(%message, "mouser rejected the request");
            return Err(TransportFailure::Rejected(message));
        }

        Ok(parts)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiMessage {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResults {
    #[serde(default)]
    parts: Option<Vec<WirePart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WirePart {
    #[serde(default)]
    mouser_part_number: Option<String>,
    #[serde(default)]
    manufacturer: Option<String>,
    #[serde(default)]
    availability_in_stock: Option<StockField>,
    #[serde(default)]
    lifecycle_status: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Mouser reports stock as a string ("1234"), occasionally as a number.
/// Anything else (negative, fractional, boolean) is kept as `Other` and
/// counts as no stock rather than failing the whole response.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StockField {
    Number(u64),
    Text(String),
    Other(serde_json::Value),
}

impl StockField {
    fn quantity(&self) -> u64 {
        match self {
            StockField::Number(n) => *n,
            StockField::Text(s) => s
                .chars()
                .filter(|c| !matches!(c, ',' | '.' | ' ' | '_'))
                .collect::<String>()
                .parse()
                .unwrap_or(0),
            StockField::Other(_) => 0,
        }
    }
}

impl WirePart {
    fn stock(&self) -> u64 {
        self.availability_in_stock
            .as_ref()
            .map(StockField::quantity)
            .unwrap_or(0)
    }

    fn into_record(self) -> PartRecord {
        let stock = self.stock();
        PartRecord {
            distributor_part_number: self.mouser_part_number.filter(|pn| !pn.is_empty()),
            manufacturer: self
                .manufacturer
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            stock,
            lifecycle_status: self
                .lifecycle_status
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            description: self.description.unwrap_or_default(),
        }
    }

    fn into_candidate(self) -> RawCandidate {
        let stock = self.stock();
        RawCandidate {
            part_number: self.mouser_part_number.unwrap_or_default(),
            manufacturer: self
                .manufacturer
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            stock,
            lifecycle_status: self.lifecycle_status.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
        }
    }
}
