use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    LookupError,
    model::ForecastResult,
    prefecture::RegionCode,
    provider::{get_body, http_client, trim_base_url},
};

use super::ForecastSource;

const SERVICE: &str = "forecast";

/// Client for the tsukumijima mirror of the JMA city forecast.
#[derive(Debug, Clone)]
pub struct TsukumijimaClient {
    base_url: String,
    http: Client,
}

impl TsukumijimaClient {
    pub fn new(base_url: String, timeout: Option<Duration>) -> Result<Self, LookupError> {
        Ok(Self { base_url: trim_base_url(base_url), http: http_client(timeout)? })
    }

    fn forecast_url(&self, region: RegionCode) -> String {
        format!("{}/api/forecast/city/{}", self.base_url, region)
    }
}

#[async_trait]
impl ForecastSource for TsukumijimaClient {
    #[instrument(skip(self, region), fields(region = %region))]
    async fn forecast(&self, region: RegionCode) -> Result<ForecastResult, LookupError> {
        let body = get_body(&self.http, SERVICE, &self.forecast_url(region)).await?;

        let parsed: ForecastResult = serde_json::from_str(&body)
            .map_err(|source| LookupError::Malformed { service: SERVICE, source })?;

        debug!(
            title = ?parsed.title,
            entries = parsed.forecasts.len(),
            today = ?parsed.today().map(|f| f.telop.as_str()),
            "forecast response"
        );

        Ok(parsed)
    }
}
