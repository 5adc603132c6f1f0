//! Glyph selection for a forecast condition.

use std::fmt;

/// Shown in place of any missing temperature.
pub const TEMPERATURE_PLACEHOLDER: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Glyph {
    PartlyCloudy,
    Sunny,
    Sleet,
    Rain,
    Snow,
    Cloudy,
    Lightning,
}

impl Glyph {
    pub fn symbol(&self) -> &'static str {
        match self {
            Glyph::PartlyCloudy => "⛅",
            Glyph::Sunny => "☀️",
            Glyph::Sleet => "🌨️",
            Glyph::Rain => "🌧️",
            Glyph::Snow => "❄️",
            Glyph::Cloudy => "☁️",
            Glyph::Lightning => "⚡",
        }
    }
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Weather words found in a condition string, either as forecast kanji or English.
#[derive(Debug, Default, Clone, Copy)]
struct Tokens {
    sunny: bool,
    cloudy: bool,
    rain: bool,
    snow: bool,
    thunder: bool,
}

impl Tokens {
    fn scan(condition: &str) -> Self {
        let lower = condition.to_lowercase();
        let has = |kanji: char, word: &str| condition.contains(kanji) || lower.contains(word);
        Self {
            sunny: has('晴', "sunny"),
            cloudy: has('曇', "cloudy"),
            rain: has('雨', "rain"),
            snow: has('雪', "snow"),
            thunder: has('雷', "thunder"),
        }
    }

    fn base(&self) -> Option<Glyph> {
        match *self {
            Tokens { sunny: true, cloudy: true, .. } => Some(Glyph::PartlyCloudy),
            Tokens { sunny: true, .. } => Some(Glyph::Sunny),
            Tokens { rain: true, snow: true, .. } => Some(Glyph::Sleet),
            Tokens { rain: true, .. } => Some(Glyph::Rain),
            Tokens { snow: true, .. } => Some(Glyph::Snow),
            Tokens { cloudy: true, .. } => Some(Glyph::Cloudy),
            _ => None,
        }
    }
}

/// At most one base glyph, followed by the lightning overlay when thunder is mentioned.
///
/// The browser widget tested each condition independently and could show two base
/// glyphs for telops like 晴のち雨; here the first match by priority wins.
pub fn select_glyphs(condition: &str) -> Vec<Glyph> {
    let tokens = Tokens::scan(condition);
    tokens
        .base()
        .into_iter()
        .chain(tokens.thunder.then_some(Glyph::Lightning))
        .collect()
}

fn label(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => TEMPERATURE_PLACEHOLDER.to_string(),
    }
}

/// Rendered icon block for one forecast day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherIcon {
    pub glyphs: Vec<Glyph>,
    /// Headline temperature; the daily max, as the widget has always shown it.
    pub temperature: String,
    pub max: String,
    pub min: String,
}

impl WeatherIcon {
    pub fn new(condition: &str, max: Option<&str>, min: Option<&str>) -> Self {
        Self {
            glyphs: select_glyphs(condition),
            temperature: label(max),
            max: label(max),
            min: label(min),
        }
    }
}

impl fmt::Display for WeatherIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for glyph in &self.glyphs {
            write!(f, "{glyph}")?;
        }
        if !self.glyphs.is_empty() {
            f.write_str(" ")?;
        }
        write!(f, "{}℃ ({} / {})", self.temperature, self.max, self.min)
    }
}
