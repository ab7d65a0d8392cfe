use std::{fmt, str::FromStr};

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Root response object for one coordinate pair.
///
/// Field names follow the upstream JSON exactly. Blocks the upstream leaves
/// out (for example with `?exclude=`) decode as `None`, a missing `alerts`
/// key as an empty list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Forecast {
    #[serde(deserialize_with = "null_as_default")]
    pub latitude: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub longitude: f64,
    /// IANA timezone name, e.g. "America/Los_Angeles".
    #[serde(deserialize_with = "null_as_default")]
    pub timezone: String,
    /// UTC offset in hours. Some zones use fractional offsets.
    #[serde(deserialize_with = "null_as_default")]
    pub offset: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currently: Option<DataPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutely: Option<DataBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly: Option<DataBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily: Option<DataBlock>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub alerts: Vec<Alert>,
}

impl Forecast {
    /// The location's UTC offset as a chrono offset.
    ///
    /// Returns `None` if the upstream value is not a representable offset.
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        if !self.offset.is_finite() {
            return None;
        }
        let secs = (self.offset * 3600.0).round();
        if secs.abs() >= 86_400.0 {
            return None;
        }
        FixedOffset::east_opt(secs as i32)
    }
}

/// A collection of data points over a period (minute-by-minute, hourly, daily).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// See [`Icon`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Ordered by time, as delivered by the upstream.
    #[serde(deserialize_with = "null_as_default")]
    pub data: Vec<DataPoint>,
}

impl DataBlock {
    pub fn icon_kind(&self) -> Option<Icon> {
        self.icon.as_deref().and_then(|s| s.parse().ok())
    }
}

/// A single weather snapshot.
///
/// The same shape is used for `currently`, `minutely`, `hourly` and `daily`;
/// each context fills a different subset of the fields. Units are the
/// upstream defaults (ºF, miles, inches, millibars).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataPoint {
    /// UNIX seconds. Daily points are aligned to local midnight.
    #[serde(deserialize_with = "null_as_default")]
    pub time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// See [`Icon`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// "Feels like" temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apparent_temperature: Option<f64>,
    /// Fraction of sky covered, 0 to 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dew_point: Option<f64>,
    /// Relative humidity, 0 to 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    /// Columnar density in Dobson units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ozone: Option<f64>,
    /// Liquid water per hour. Roughly: 0.002 very light, 0.017 light,
    /// 0.1 moderate, 0.4 heavy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precip_intensity: Option<f64>,
    /// See [`PrecipType`]. Absent when there is no precipitation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precip_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precip_probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    /// Not reported in daily points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Capped at 10 miles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
    /// Direction the wind is coming from, clockwise from true north.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_bearing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,

    // daily only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apparent_temperature_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apparent_temperature_min_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apparent_temperature_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apparent_temperature_max_time: Option<i64>,
    /// 0.0 is a new moon, 0.5 a full moon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moon_phase: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precip_intensity_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precip_intensity_max_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunrise_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunset_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_min_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_max_time: Option<i64>,

    /// Snowfall in inches. Hourly and daily only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precip_accumulation: Option<f64>,

    // currently only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_storm_bearing: Option<f64>,
    /// In miles, and not very accurate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_storm_distance: Option<f64>,
}

impl DataPoint {
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.time)
    }

    pub fn icon_kind(&self) -> Option<Icon> {
        self.icon.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn precip_kind(&self) -> Option<PrecipType> {
        self.precip_type.as_deref().and_then(|s| s.parse().ok())
    }
}

/// A severe weather advisory for the requested location.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Alert {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    /// UNIX seconds.
    #[serde(deserialize_with = "null_as_default")]
    pub expires: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub uri: String,
}

impl Alert {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.expires)
    }
}

/// A string outside one of the documented vocabularies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVocabulary {
    pub kind: &'static str,
    pub value: String,
}

/// Documented values of [`DataPoint::precip_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrecipType {
    Rain,
    Snow,
    /// Freezing rain, ice pellets, wintery mix.
    Sleet,
    Hail,
}

pub const PRECIP_TYPES: [PrecipType; 4] =
    [PrecipType::Rain, PrecipType::Snow, PrecipType::Sleet, PrecipType::Hail];

impl PrecipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrecipType::Rain => "rain",
            PrecipType::Snow => "snow",
            PrecipType::Sleet => "sleet",
            PrecipType::Hail => "hail",
        }
    }
}

impl fmt::Display for PrecipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrecipType {
    type Err = UnknownVocabulary;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PRECIP_TYPES
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownVocabulary { kind: "precipitation type", value: s.to_string() })
    }
}

/// Documented values of the `icon` fields.
///
/// The upstream reserves the right to add more (hail, thunderstorm, tornado),
/// so callers should keep a fallback for strings that do not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    ClearDay,
    ClearNight,
    Rain,
    Snow,
    Sleet,
    Wind,
    Fog,
    Cloudy,
    PartlyCloudyDay,
    PartlyCloudyNight,
}

pub const ICONS: [Icon; 10] = [
    Icon::ClearDay,
    Icon::ClearNight,
    Icon::Rain,
    Icon::Snow,
    Icon::Sleet,
    Icon::Wind,
    Icon::Fog,
    Icon::Cloudy,
    Icon::PartlyCloudyDay,
    Icon::PartlyCloudyNight,
];

impl Icon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Icon::ClearDay => "clear-day",
            Icon::ClearNight => "clear-night",
            Icon::Rain => "rain",
            Icon::Snow => "snow",
            Icon::Sleet => "sleet",
            Icon::Wind => "wind",
            Icon::Fog => "fog",
            Icon::Cloudy => "cloudy",
            Icon::PartlyCloudyDay => "partly-cloudy-day",
            Icon::PartlyCloudyNight => "partly-cloudy-night",
        }
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Icon {
    type Err = UnknownVocabulary;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ICONS
            .iter()
            .copied()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| UnknownVocabulary { kind: "icon", value: s.to_string() })
    }
}

/// An explicit `null` decodes like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}
