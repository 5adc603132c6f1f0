//! Core library for the `zipweather` CLI.
//!
//! This crate defines:
//! - The postal code → prefecture → region → forecast lookup chain
//! - Clock formatting and the periodic clock refresh
//! - Glyph selection and the weather panel
//! - Configuration handling
//!
//! It is used by `zipweather-cli`, but can also drive other front-ends.

pub mod clock;
pub mod config;
pub mod error;
pub mod icon;
pub mod lookup;
pub mod model;
pub mod prefecture;
pub mod provider;
pub mod view;

pub use clock::{Clock, ClockTicker, SystemClock, TimeDisplay};
pub use config::{Config, Sequencing};
pub use error::LookupError;
pub use icon::{Glyph, WeatherIcon};
pub use lookup::{LookupOptions, LookupState, WeatherLookup};
pub use model::{Address, ForecastResult, PostalCode};
pub use prefecture::RegionCode;
pub use provider::{ForecastSource, PostalLookup};
pub use view::WeatherPanel;
