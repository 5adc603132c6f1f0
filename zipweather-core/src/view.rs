use std::fmt;

use crate::{icon::WeatherIcon, lookup::LookupState, model::ForecastResult};

/// Weather area of the widget, derived from the lookup state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherPanel {
    /// No forecast to show.
    Empty,
    Forecast { location: String, icon: WeatherIcon },
}

impl WeatherPanel {
    pub fn from_state(state: &LookupState) -> Self {
        state.weather.as_ref().map_or(Self::Empty, Self::from_forecast)
    }

    pub fn from_forecast(forecast: &ForecastResult) -> Self {
        let location = forecast
            .location
            .as_ref()
            .map(|l| format!("{} {}", l.prefecture, l.city).trim().to_string())
            .unwrap_or_default();

        let icon = match forecast.today() {
            Some(today) => WeatherIcon::new(&today.telop, today.max_celsius(), today.min_celsius()),
            None => WeatherIcon::new("", None, None),
        };

        Self::Forecast { location, icon }
    }
}

impl fmt::Display for WeatherPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherPanel::Empty => f.write_str("(no weather)"),
            WeatherPanel::Forecast { location, icon } if location.is_empty() => write!(f, "{icon}"),
            WeatherPanel::Forecast { location, icon } => write!(f, "{location}  {icon}"),
        }
    }
}
