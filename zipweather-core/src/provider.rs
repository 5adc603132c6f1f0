use crate::{
    Config, LookupError,
    model::{Address, ForecastResult, PostalCode},
    prefecture::RegionCode,
    provider::{tsukumijima::TsukumijimaClient, zipcloud::ZipCloudClient},
};
use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, sync::Arc, time::Duration};

pub mod tsukumijima;
pub mod zipcloud;

/// Resolves a postal code to an address.
#[async_trait]
pub trait PostalLookup: Send + Sync + Debug {
    /// `Ok(None)` means the service answered but knows no address for the code.
    async fn lookup(&self, code: &PostalCode) -> Result<Option<Address>, LookupError>;
}

/// Fetches the forecast for a region.
#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn forecast(&self, region: RegionCode) -> Result<ForecastResult, LookupError>;
}

/// Build the HTTP-backed services described by `config`.
pub fn providers_from_config(
    config: &Config,
) -> Result<(Arc<dyn PostalLookup>, Arc<dyn ForecastSource>), LookupError> {
    let timeout = config.timeout();
    let postal = ZipCloudClient::new(config.endpoints.postal_base_url.clone(), timeout)?;
    let forecast = TsukumijimaClient::new(config.endpoints.forecast_base_url.clone(), timeout)?;
    Ok((Arc::new(postal), Arc::new(forecast)))
}

pub(crate) fn http_client(timeout: Option<Duration>) -> Result<Client, LookupError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(LookupError::Client)
}

/// Send a GET and hand back the body of a successful response.
pub(crate) async fn get_body(
    http: &Client,
    service: &'static str,
    url: &str,
) -> Result<String, LookupError> {
    let res = http
        .get(url)
        .send()
        .await
        .map_err(|source| LookupError::Transport { service, source })?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| LookupError::Transport { service, source })?;

    if !status.is_success() {
        return Err(LookupError::Status { service, status, body: truncate_body(&body) });
    }

    Ok(body)
}

pub(crate) fn trim_base_url(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
