//! Postal code input handling and the forecast chain.
//!
//! Every input change updates the displayed postal code. A complete code starts a
//! chain on the tokio runtime: postal lookup, prefecture mapping, forecast fetch.
//! Chains are never cancelled; how overlapping results are applied is governed by
//! [`Sequencing`].

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::{
    Config, LookupError,
    config::Sequencing,
    model::{ForecastResult, PostalCode, sanitize_postal_code},
    prefecture::region_code,
    provider::{ForecastSource, PostalLookup, providers_from_config},
};

/// What the weather panel currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupState {
    /// Sanitized input, kept even when incomplete.
    pub postal_code: String,
    /// Payload of the last chain that wrote, `None` after a failure.
    pub weather: Option<ForecastResult>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupOptions {
    pub sequencing: Sequencing,
    pub clear_on_empty_result: bool,
}

impl From<&Config> for LookupOptions {
    fn from(config: &Config) -> Self {
        Self {
            sequencing: config.sequencing,
            clear_on_empty_result: config.clear_on_empty_result,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherLookup {
    postal: Arc<dyn PostalLookup>,
    forecast: Arc<dyn ForecastSource>,
    options: LookupOptions,
    latest_request: Arc<AtomicU64>,
    state: Arc<watch::Sender<LookupState>>,
}

impl WeatherLookup {
    pub fn new(
        postal: Arc<dyn PostalLookup>,
        forecast: Arc<dyn ForecastSource>,
        options: LookupOptions,
    ) -> Self {
        let (state, _) = watch::channel(LookupState::default());
        Self {
            postal,
            forecast,
            options,
            latest_request: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
        }
    }

    /// Wire the lookup to the HTTP services named in `config`.
    pub fn from_config(config: &Config) -> Result<Self, LookupError> {
        let (postal, forecast) = providers_from_config(config)?;
        Ok(Self::new(postal, forecast, LookupOptions::from(config)))
    }

    pub fn subscribe(&self) -> watch::Receiver<LookupState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> LookupState {
        self.state.borrow().clone()
    }

    /// Handle one change of the postal code field.
    ///
    /// Returns the handle of the spawned chain when the sanitized input is a
    /// complete postal code. Must be called from within a tokio runtime.
    pub fn on_postal_code_input(&self, raw: &str) -> Option<JoinHandle<()>> {
        let sanitized = sanitize_postal_code(raw);
        self.state.send_if_modified(|s| {
            if s.postal_code == sanitized {
                return false;
            }
            s.postal_code.clone_from(&sanitized);
            true
        });

        let code = PostalCode::parse(&sanitized).ok()?;
        let request_id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        let span = info_span!("forecast_chain", request_id, postal_code = %code);

        let chain = ForecastChain {
            postal: Arc::clone(&self.postal),
            forecast: Arc::clone(&self.forecast),
            options: self.options,
            latest_request: Arc::clone(&self.latest_request),
            state: Arc::clone(&self.state),
            request_id,
        };

        Some(tokio::spawn(chain.run(code).instrument(span)))
    }
}

struct ForecastChain {
    postal: Arc<dyn PostalLookup>,
    forecast: Arc<dyn ForecastSource>,
    options: LookupOptions,
    latest_request: Arc<AtomicU64>,
    state: Arc<watch::Sender<LookupState>>,
    request_id: u64,
}

impl ForecastChain {
    async fn run(self, code: PostalCode) {
        match self.resolve(&code).await {
            Ok(Some(forecast)) => {
                info!(title = ?forecast.title, "forecast updated");
                self.commit(Some(forecast));
            }
            Ok(None) if self.options.clear_on_empty_result => {
                debug!("no address for postal code; clearing weather");
                self.commit(None);
            }
            Ok(None) => debug!("no address for postal code; keeping current weather"),
            Err(err) => {
                warn!(error = %err, "forecast chain failed; clearing weather");
                self.commit(None);
            }
        }
    }

    /// `Ok(None)` when the postal service knows no address for the code.
    async fn resolve(&self, code: &PostalCode) -> Result<Option<ForecastResult>, LookupError> {
        let Some(address) = self.postal.lookup(code).await? else {
            return Ok(None);
        };
        debug!(prefecture = %address.prefecture, city = %address.city, "resolved address");

        let region = region_code(&address.prefecture)
            .ok_or_else(|| LookupError::UnmappedPrefecture(address.prefecture.clone()))?;
        debug!(%region, "mapped prefecture to region");

        let forecast = self.forecast.forecast(region).await?;
        Ok(Some(forecast))
    }

    fn commit(&self, weather: Option<ForecastResult>) {
        let sequencing = self.options.sequencing;
        let request_id = self.request_id;
        let latest_request = &self.latest_request;

        self.state.send_if_modified(move |s| {
            if sequencing == Sequencing::LatestRequest {
                let latest = latest_request.load(Ordering::SeqCst);
                if latest != request_id {
                    debug!(latest, "discarding result of superseded request");
                    return false;
                }
            }
            s.weather = weather;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{Address, DailyForecast, ForecastLocation},
        prefecture::RegionCode,
    };
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicBool, AtomicUsize},
    };
    use tokio::sync::Notify;

    const TOKYO: &str = "1000001";
    const OSAKA: &str = "5300001";
    const OKINAWA: &str = "9000001";
    const UNKNOWN: &str = "0000000";

    fn fake_failure() -> LookupError {
        LookupError::Status {
            service: "fake",
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        }
    }

    #[derive(Debug)]
    struct FakePostal {
        addresses: HashMap<&'static str, &'static str>,
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl FakePostal {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                addresses: HashMap::from([
                    (TOKYO, "東京都"),
                    (OSAKA, "大阪府"),
                    (OKINAWA, "沖縄県"),
                ]),
                fail: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PostalLookup for FakePostal {
        async fn lookup(&self, code: &PostalCode) -> Result<Option<Address>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(fake_failure());
            }
            Ok(self.addresses.get(code.as_str()).map(|pref| Address {
                prefecture: pref.to_string(),
                city: String::new(),
                town: String::new(),
                prefecture_code: None,
            }))
        }
    }

    #[derive(Debug, Default)]
    struct FakeForecast {
        gates: HashMap<&'static str, Arc<Notify>>,
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl FakeForecast {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn gated(regions: &[&'static str]) -> Arc<Self> {
            Arc::new(Self {
                gates: regions.iter().map(|r| (*r, Arc::new(Notify::new()))).collect(),
                ..Default::default()
            })
        }

        fn release(&self, region: &str) {
            self.gates[region].notify_one();
        }
    }

    #[async_trait]
    impl ForecastSource for FakeForecast {
        async fn forecast(&self, region: RegionCode) -> Result<ForecastResult, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = self.gates.get(region.as_str()) {
                gate.notified().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(fake_failure());
            }
            Ok(forecast_for(region))
        }
    }

    fn forecast_for(region: RegionCode) -> ForecastResult {
        ForecastResult {
            title: Some(region.to_string()),
            location: Some(ForecastLocation { prefecture: "p".into(), city: "c".into() }),
            forecasts: vec![DailyForecast { telop: "晴".into(), ..Default::default() }],
        }
    }

    fn lookup_with(
        postal: &Arc<FakePostal>,
        forecast: &Arc<FakeForecast>,
        sequencing: Sequencing,
    ) -> WeatherLookup {
        let options = LookupOptions { sequencing, clear_on_empty_result: false };
        WeatherLookup::new(postal.clone(), forecast.clone(), options)
    }

    fn shown_region(lookup: &WeatherLookup) -> Option<String> {
        lookup.state().weather.and_then(|w| w.title)
    }

    async fn enter(lookup: &WeatherLookup, raw: &str) {
        lookup
            .on_postal_code_input(raw)
            .expect("complete postal code starts a chain")
            .await
            .expect("chain task does not panic");
    }

    #[tokio::test]
    async fn incomplete_input_issues_no_request() {
        let postal = FakePostal::new();
        let lookup = lookup_with(&postal, &FakeForecast::new(), Sequencing::LastWrite);

        for raw in ["", "1", "100000", "100-000", "10000011", "abcdefg"] {
            assert!(lookup.on_postal_code_input(raw).is_none(), "input {raw:?}");
        }

        assert_eq!(postal.calls.load(Ordering::SeqCst), 0);
        assert_eq!(lookup.state().postal_code, "");
    }

    #[tokio::test]
    async fn displayed_code_is_sanitized_regardless_of_length() {
        let lookup = lookup_with(&FakePostal::new(), &FakeForecast::new(), Sequencing::LastWrite);

        assert!(lookup.on_postal_code_input("10a0-").is_none());
        assert_eq!(lookup.state().postal_code, "100");

        enter(&lookup, "〒100-0001").await;
        assert_eq!(lookup.state().postal_code, TOKYO);
    }

    #[tokio::test]
    async fn tokyo_code_fetches_tokyo_forecast() {
        let lookup = lookup_with(&FakePostal::new(), &FakeForecast::new(), Sequencing::LastWrite);

        enter(&lookup, TOKYO).await;

        assert_eq!(shown_region(&lookup).as_deref(), Some("130010"));
    }

    #[tokio::test]
    async fn unmapped_prefecture_clears_weather_without_fetching() {
        let forecast = FakeForecast::new();
        let lookup = lookup_with(&FakePostal::new(), &forecast, Sequencing::LastWrite);

        enter(&lookup, TOKYO).await;
        assert!(lookup.state().weather.is_some());

        enter(&lookup, OKINAWA).await;

        assert_eq!(lookup.state().weather, None);
        assert_eq!(forecast.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn postal_failure_clears_weather() {
        let postal = FakePostal::new();
        let lookup = lookup_with(&postal, &FakeForecast::new(), Sequencing::LastWrite);

        enter(&lookup, TOKYO).await;
        postal.fail.store(true, Ordering::SeqCst);
        enter(&lookup, OSAKA).await;

        assert_eq!(lookup.state().weather, None);
    }

    #[tokio::test]
    async fn forecast_failure_clears_weather() {
        let forecast = FakeForecast::new();
        let lookup = lookup_with(&FakePostal::new(), &forecast, Sequencing::LastWrite);

        enter(&lookup, TOKYO).await;
        forecast.fail.store(true, Ordering::SeqCst);
        enter(&lookup, OSAKA).await;

        assert_eq!(lookup.state().weather, None);
        assert_eq!(forecast.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_postal_result_keeps_previous_weather() {
        let lookup = lookup_with(&FakePostal::new(), &FakeForecast::new(), Sequencing::LastWrite);

        enter(&lookup, TOKYO).await;
        enter(&lookup, UNKNOWN).await;

        assert_eq!(shown_region(&lookup).as_deref(), Some("130010"));
        assert_eq!(lookup.state().postal_code, UNKNOWN);
    }

    #[tokio::test]
    async fn empty_postal_result_clears_when_configured() {
        let options = LookupOptions { sequencing: Sequencing::LastWrite, clear_on_empty_result: true };
        let lookup = WeatherLookup::new(FakePostal::new(), FakeForecast::new(), options);

        enter(&lookup, TOKYO).await;
        enter(&lookup, UNKNOWN).await;

        assert_eq!(lookup.state().weather, None);
    }

    #[tokio::test]
    async fn shortening_a_complete_code_keeps_stale_weather() {
        let lookup = lookup_with(&FakePostal::new(), &FakeForecast::new(), Sequencing::LastWrite);

        enter(&lookup, TOKYO).await;
        assert!(lookup.on_postal_code_input("100000").is_none());

        assert_eq!(lookup.state().postal_code, "100000");
        assert_eq!(shown_region(&lookup).as_deref(), Some("130010"));
    }

    #[tokio::test]
    async fn later_completing_chain_wins_by_default() {
        let forecast = FakeForecast::gated(&["130010", "270000"]);
        let lookup = lookup_with(&FakePostal::new(), &forecast, Sequencing::LastWrite);

        let first = lookup.on_postal_code_input(TOKYO).expect("chain");
        let second = lookup.on_postal_code_input(OSAKA).expect("chain");

        forecast.release("270000");
        second.await.expect("second chain");
        assert_eq!(shown_region(&lookup).as_deref(), Some("270000"));

        forecast.release("130010");
        first.await.expect("first chain");
        assert_eq!(shown_region(&lookup).as_deref(), Some("130010"));
        assert_eq!(lookup.state().postal_code, OSAKA);
    }

    #[tokio::test]
    async fn latest_request_discards_superseded_result() {
        let forecast = FakeForecast::gated(&["130010", "270000"]);
        let lookup = lookup_with(&FakePostal::new(), &forecast, Sequencing::LatestRequest);

        let first = lookup.on_postal_code_input(TOKYO).expect("chain");
        let second = lookup.on_postal_code_input(OSAKA).expect("chain");

        forecast.release("270000");
        second.await.expect("second chain");
        forecast.release("130010");
        first.await.expect("first chain");

        assert_eq!(shown_region(&lookup).as_deref(), Some("270000"));
    }

    #[tokio::test]
    async fn latest_request_ignores_superseded_failure() {
        let postal = FakePostal::new();
        let forecast = FakeForecast::gated(&["130010"]);
        let lookup = lookup_with(&postal, &forecast, Sequencing::LatestRequest);

        let first = lookup.on_postal_code_input(TOKYO).expect("chain");
        enter(&lookup, OSAKA).await;

        forecast.fail.store(true, Ordering::SeqCst);
        forecast.release("130010");
        first.await.expect("first chain");

        assert_eq!(shown_region(&lookup).as_deref(), Some("270000"));
    }

    #[tokio::test]
    async fn subscribers_see_new_weather() {
        let lookup = lookup_with(&FakePostal::new(), &FakeForecast::new(), Sequencing::LastWrite);
        let mut rx = lookup.subscribe();

        enter(&lookup, TOKYO).await;

        assert!(rx.has_changed().expect("sender alive"));
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.weather.and_then(|w| w.title).as_deref(), Some("130010"));
    }
}
