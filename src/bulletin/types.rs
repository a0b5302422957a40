// src/bulletin/types.rs
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DATE_FORMAT: &str = "%Y.%m.%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// One magnitude reading. `None` means the bulletin printed `-.-` (not reported).
///
/// On the wire an absent reading is written as `0`, and a `0` read back is
/// treated as absent again, since the bulletin never reports a true zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Magnitude(Option<f64>);

impl Magnitude {
    pub const ABSENT: Magnitude = Magnitude(None);

    pub fn reported(v: f64) -> Self {
        Self(Some(v))
    }

    /// Numeric value, `0.0` when not reported.
    pub fn value(self) -> f64 {
        self.0.unwrap_or(0.0)
    }

    pub fn is_reported(self) -> bool {
        self.0.is_some()
    }

    pub fn get(self) -> Option<f64> {
        self.0
    }
}

impl From<f64> for Magnitude {
    fn from(v: f64) -> Self {
        if v == 0.0 {
            Self::ABSENT
        } else {
            Self::reported(v)
        }
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v:.1}"),
            None => f.write_str("-.-"),
        }
    }
}

impl Serialize for Magnitude {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(self.value())
    }
}

impl<'de> Deserialize<'de> for Magnitude {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        f64::deserialize(d).map(Magnitude::from)
    }
}

/// A single event from the bulletin, serialized with the field names the map client expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthquakeRecord {
    #[serde(rename = "tarih")]
    pub date: String,
    #[serde(rename = "saat")]
    pub time: String,
    #[serde(rename = "enlem")]
    pub latitude: f64,
    #[serde(rename = "boylam")]
    pub longitude: f64,
    #[serde(rename = "derinlik_km")]
    pub depth_km: f64,
    #[serde(rename = "buyukluk_md")]
    pub magnitude_md: Magnitude,
    #[serde(rename = "buyukluk_ml")]
    pub magnitude_ml: Magnitude,
    #[serde(rename = "buyukluk_mw")]
    pub magnitude_mw: Magnitude,
    #[serde(rename = "konum")]
    pub location: String,
}

impl EarthquakeRecord {
    pub fn id(&self) -> QuakeId {
        QuakeId {
            date: self.date.clone(),
            time: self.time.clone(),
            location: self.location.clone(),
        }
    }

    pub fn occurred_at(&self) -> Option<NaiveDateTime> {
        let d = NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()?;
        let t = NaiveTime::parse_from_str(&self.time, TIME_FORMAT).ok()?;
        Some(d.and_time(t))
    }

    pub fn severity(&self) -> Severity {
        Severity::from_ml(self.magnitude_ml.value())
    }
}

/// Identity of an event. Magnitude revisions keep the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuakeId {
    pub date: String,
    pub time: String,
    pub location: String,
}

impl QuakeId {
    pub fn key(&self) -> String {
        format!("{}-{}-{}", self.date, self.time, self.location)
    }
}

impl fmt::Display for QuakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Coarse ML bands used for alert wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Strong,
}

impl Severity {
    pub fn from_ml(ml: f64) -> Self {
        if ml >= 4.5 {
            Severity::Strong
        } else if ml >= 3.0 {
            Severity::Moderate
        } else {
            Severity::Minor
        }
    }
}
