use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    LookupError,
    model::{Address, PostalCode},
    provider::{get_body, http_client, trim_base_url},
};

use super::PostalLookup;

const SERVICE: &str = "postal lookup";

/// Client for the zipcloud postal code search API.
#[derive(Debug, Clone)]
pub struct ZipCloudClient {
    base_url: String,
    http: Client,
}

impl ZipCloudClient {
    pub fn new(base_url: String, timeout: Option<Duration>) -> Result<Self, LookupError> {
        Ok(Self { base_url: trim_base_url(base_url), http: http_client(timeout)? })
    }

    fn search_url(&self, code: &PostalCode) -> String {
        format!("{}/api/search?zipcode={}", self.base_url, code)
    }
}

#[derive(Debug, Deserialize)]
struct ZcResponse {
    status: Option<u16>,
    message: Option<String>,
    results: Option<Vec<ZcResult>>,
}

#[derive(Debug, Deserialize)]
struct ZcResult {
    address1: String,
    #[serde(default)]
    address2: String,
    #[serde(default)]
    address3: String,
    prefcode: Option<String>,
}

impl From<ZcResult> for Address {
    fn from(r: ZcResult) -> Self {
        Address {
            prefecture: r.address1,
            city: r.address2,
            town: r.address3,
            prefecture_code: r.prefcode,
        }
    }
}

#[async_trait]
impl PostalLookup for ZipCloudClient {
    #[instrument(skip(self, code), fields(postal_code = %code))]
    async fn lookup(&self, code: &PostalCode) -> Result<Option<Address>, LookupError> {
        let body = get_body(&self.http, SERVICE, &self.search_url(code)).await?;

        let parsed: ZcResponse = serde_json::from_str(&body)
            .map_err(|source| LookupError::Malformed { service: SERVICE, source })?;

        debug!(status = ?parsed.status, message = ?parsed.message, "postal lookup response");

        Ok(parsed.results.and_then(|r| r.into_iter().next()).map(Address::from))
    }
}
