use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LookupError;

/// Length of a Japanese postal code once separators are removed.
pub const POSTAL_CODE_LEN: usize = 7;

/// Drop every character that is not an ASCII digit, keeping digit order.
pub fn sanitize_postal_code(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// A complete seven-digit postal code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalCode(String);

impl PostalCode {
    pub fn parse(value: &str) -> Result<Self, LookupError> {
        if value.len() == POSTAL_CODE_LEN && value.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(value.to_owned()))
        } else {
            Err(LookupError::InvalidPostalCode(value.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First address the postal service returns for a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub prefecture: String,
    pub city: String,
    pub town: String,
    /// Numeric prefecture code as reported by the postal service.
    pub prefecture_code: Option<String>,
}

/// Forecast payload for one region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<ForecastLocation>,
    #[serde(default)]
    pub forecasts: Vec<DailyForecast>,
}

impl ForecastResult {
    /// The soonest forecast entry, normally today.
    pub fn today(&self) -> Option<&DailyForecast> {
        self.forecasts.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastLocation {
    #[serde(default)]
    pub prefecture: String,
    #[serde(default)]
    pub city: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub date_label: Option<String>,
    /// Condition description, e.g. "晴時々曇".
    #[serde(default)]
    pub telop: String,
    #[serde(default)]
    pub temperature: Temperature,
}

impl DailyForecast {
    pub fn max_celsius(&self) -> Option<&str> {
        self.temperature.max.as_ref().and_then(|t| t.celsius.as_deref())
    }

    pub fn min_celsius(&self) -> Option<&str> {
        self.temperature.min.as_ref().and_then(|t| t.celsius.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Temperature {
    #[serde(default)]
    pub max: Option<TemperatureValue>,
    #[serde(default)]
    pub min: Option<TemperatureValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureValue {
    #[serde(default)]
    pub celsius: Option<String>,
    #[serde(default)]
    pub fahrenheit: Option<String>,
}
