//! Sensor modalities, device identifiers and the sensor-file naming scheme.
//!
//! Log files are named `<tag>_<date>_…_<prefix>-<device>_<startMs>_.csv`,
//! for example `Affdex_2016-11-08_16-12_Leeps-02_1478650349944_.csv`.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// One of the two sensor data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Facial-expression log (primary)
    Afdx,
    /// Skin-conductance log (secondary)
    Leda,
}

impl Modality {
    /// Subdirectory of the data root holding this modality's logs.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Modality::Afdx => "Afdx",
            Modality::Leda => "Leda",
        }
    }

    /// Prefix every log file of this modality starts with.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Modality::Afdx => "Affd",
            Modality::Leda => "Leda",
        }
    }

    /// Column holding elapsed seconds since the file's start timestamp.
    pub fn index_column(&self) -> &'static str {
        match self {
            Modality::Afdx => "delta_secs",
            Modality::Leda => "data.time.data",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Modality {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "afdx" | "affdex" | "facial" => Ok(Modality::Afdx),
            "leda" | "gsr" | "skin" => Ok(Modality::Leda),
            _ => Err(ParseError::Modality(s.to_string())),
        }
    }
}

/// Lab computer identifier as it appears in file names (`02`, `11`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Zero-pad single digit numbers: 2 -> "02".
    pub fn from_number(n: u32) -> Self {
        Self(format!("{n:02}"))
    }

    /// Derive the device from a participant label such as `LEEPS_2`.
    ///
    /// A bare number is accepted as well.
    pub fn from_label(label: &str) -> Result<Self, ParseError> {
        let label = label.trim();
        let part = match label.split('_').nth(1) {
            Some(part) => part,
            None => label,
        };
        let n = part
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| {
                n.is_finite() && *n >= 0.0 && *n <= f64::from(u32::MAX) && n.fract() == 0.0
            })
            .ok_or_else(|| ParseError::DeviceLabel(label.to_string()))?;
        Ok(Self::from_number(n as u32))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A located sensor log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorFile {
    pub modality: Modality,
    pub device: DeviceId,
    /// Recording start, epoch milliseconds
    pub start_ms: i64,
    pub path: PathBuf,
}

/// Extract `(device, start_ms)` from a sensor file name.
pub fn parse_file_name(name: &str) -> Result<(DeviceId, i64), ParseError> {
    let invalid = |reason: &str| ParseError::FileName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let fields: Vec<&str> = name.split('_').collect();
    if fields.len() < 3 {
        return Err(invalid("expected at least three '_' separated fields"));
    }

    let start_ms = fields[fields.len() - 2]
        .parse::<i64>()
        .map_err(|_| invalid("start timestamp is not an integer"))?;

    let device = fields[fields.len() - 3]
        .split('-')
        .nth(1)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| invalid("device field has no '-' separated id"))?;

    Ok((DeviceId::new(device), start_ms))
}
