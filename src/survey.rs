//! Survey data, as handed over by the acquisition layer
use hifitime::Epoch;
use itertools::Itertools;
use nalgebra::Vector2;

use crate::{
    averager::Averager,
    constants::{DEFAULT_NOISE_DBM, MAX_SIGNAL_DBM, MAX_SNR_DB, MIN_SIGNAL_DBM},
    error::Error,
};

/// Emitter (access point) hardware identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmitterId(String);

impl EmitterId {
    /// Builds a new [EmitterId] from a hardware identifier (typically a BSSID).
    /// Identifiers are case insensitive.
    pub fn new(id: &str) -> Result<Self, Error> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidEmitterId(id.to_string()));
        }
        Ok(Self(id.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmitterId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EmitterId {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Frequency band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// 2.4 GHz
    B2G4,
    /// 5 GHz
    B5G,
    /// 6 GHz
    B6G,
}

impl Band {
    /// Band of this carrier frequency [MHz]
    pub fn from_frequency_mhz(frequency_mhz: f64) -> Self {
        if frequency_mhz >= 5925.0 {
            Self::B6G
        } else if frequency_mhz >= 5000.0 {
            Self::B5G
        } else {
            Self::B2G4
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::B2G4 => write!(f, "2.4GHz"),
            Self::B5G => write!(f, "5GHz"),
            Self::B6G => write!(f, "6GHz"),
        }
    }
}

/// Qualitative signal level category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignalCategory {
    Poor,
    Fair,
    Good,
    VeryGood,
    Excellent,
}

impl SignalCategory {
    pub fn from_signal_dbm(signal_dbm: f64) -> Self {
        if signal_dbm >= -50.0 {
            Self::Excellent
        } else if signal_dbm >= -60.0 {
            Self::VeryGood
        } else if signal_dbm >= -70.0 {
            Self::Good
        } else if signal_dbm >= -80.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// One emitter, as observed from one survey location.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// [EmitterId]
    pub emitter: EmitterId,
    /// Display label (typically the SSID)
    pub label: String,
    /// Received signal level [dBm]
    pub signal_dbm: f64,
    /// Carrier frequency [MHz]
    pub frequency_mhz: f64,
    /// Channel number
    pub channel: u16,
    /// Noise floor [dBm]
    pub noise_dbm: f64,
    /// Signal to noise ratio [dB]
    pub snr_db: f64,
}

impl Observation {
    /// Builds a new [Observation]. Signal level is clamped to a physically
    /// meaningful range, SNR is derived from the default noise floor.
    /// Use [Self::with_noise] or [Self::with_snr] to customize.
    pub fn new(
        emitter: EmitterId,
        label: &str,
        signal_dbm: f64,
        frequency_mhz: f64,
        channel: u16,
    ) -> Result<Self, Error> {
        if !signal_dbm.is_finite() {
            return Err(Error::InvalidSignal);
        }
        let signal_dbm = signal_dbm.clamp(MIN_SIGNAL_DBM, MAX_SIGNAL_DBM);
        let noise_dbm = DEFAULT_NOISE_DBM;
        Ok(Self {
            emitter,
            label: label.to_string(),
            signal_dbm,
            frequency_mhz,
            channel,
            noise_dbm,
            snr_db: Self::derived_snr(signal_dbm, noise_dbm),
        })
    }

    /// Copies and returns [Observation] with updated noise floor [dBm].
    /// SNR is derived again.
    pub fn with_noise(&self, noise_dbm: f64) -> Result<Self, Error> {
        if !noise_dbm.is_finite() {
            return Err(Error::InvalidSignal);
        }
        let mut s = self.clone();
        s.noise_dbm = noise_dbm;
        s.snr_db = Self::derived_snr(s.signal_dbm, noise_dbm);
        Ok(s)
    }

    /// Copies and returns [Observation] with measured SNR [dB].
    pub fn with_snr(&self, snr_db: f64) -> Result<Self, Error> {
        if !snr_db.is_finite() {
            return Err(Error::InvalidSignal);
        }
        let mut s = self.clone();
        s.snr_db = snr_db.clamp(0.0, MAX_SNR_DB);
        Ok(s)
    }

    fn derived_snr(signal_dbm: f64, noise_dbm: f64) -> f64 {
        (signal_dbm - noise_dbm).clamp(0.0, MAX_SNR_DB)
    }

    /// Frequency [Band]
    pub fn band(&self) -> Band {
        Band::from_frequency_mhz(self.frequency_mhz)
    }

    /// Link quality, in percent
    pub fn quality(&self) -> u8 {
        ((self.signal_dbm + 100.0) * 2.0).clamp(0.0, 100.0) as u8
    }

    /// [SignalCategory]
    pub fn category(&self) -> SignalCategory {
        SignalCategory::from_signal_dbm(self.signal_dbm)
    }
}

/// Throughput grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PerformanceGrade {
    NoData,
    Poor,
    Fair,
    Good,
    VeryGood,
    Excellent,
}

/// Throughput and latency probe results, attached to a [SurveyPoint].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThroughputProbe {
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub latency_ms: f64,
    pub jitter_ms: f64,
    /// Packet loss, in percent
    pub packet_loss: f64,
}

impl ThroughputProbe {
    /// True if this probe completed with plausible results
    pub fn is_valid(&self) -> bool {
        self.download_mbps >= 0.0 && self.latency_ms > 0.0 && self.latency_ms < 10_000.0
    }

    /// [PerformanceGrade] of this probe
    pub fn grade(&self) -> PerformanceGrade {
        if !self.is_valid() {
            return PerformanceGrade::NoData;
        }
        let (down, lat) = (self.download_mbps, self.latency_ms);
        if down >= 100.0 && lat <= 20.0 {
            PerformanceGrade::Excellent
        } else if down >= 50.0 && lat <= 50.0 {
            PerformanceGrade::VeryGood
        } else if down >= 25.0 && lat <= 100.0 {
            PerformanceGrade::Good
        } else if down >= 10.0 && lat <= 200.0 {
            PerformanceGrade::Fair
        } else {
            PerformanceGrade::Poor
        }
    }
}

/// One survey location
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyPoint {
    /// Position, in raster units
    pub position: Vector2<f64>,
    /// Sampling [Epoch]
    pub epoch: Epoch,
    /// Raster units per length unit (from calibration)
    pub scale: f64,
    /// Observed emitters
    pub observations: Vec<Observation>,
    /// Possible [ThroughputProbe]
    pub throughput: Option<ThroughputProbe>,
}

impl SurveyPoint {
    pub fn new(
        position: (f64, f64),
        epoch: Epoch,
        scale: f64,
        observations: Vec<Observation>,
    ) -> Result<Self, Error> {
        if !position.0.is_finite() || !position.1.is_finite() {
            return Err(Error::InvalidPosition);
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::InvalidScale(scale));
        }
        Ok(Self {
            position: Vector2::new(position.0, position.1),
            epoch,
            scale,
            observations,
            throughput: None,
        })
    }

    /// Copies and returns [SurveyPoint] with attached [ThroughputProbe].
    pub fn with_throughput(&self, probe: ThroughputProbe) -> Self {
        let mut s = self.clone();
        s.throughput = Some(probe);
        s
    }

    /// Strongest [Observation] at this location
    pub fn strongest(&self) -> Option<&Observation> {
        self.observations
            .iter()
            .max_by(|a, b| a.signal_dbm.total_cmp(&b.signal_dbm))
    }

    /// [Observation] of this emitter, if any
    pub fn observation(&self, emitter: &EmitterId) -> Option<&Observation> {
        self.observations.iter().find(|obs| &obs.emitter == emitter)
    }

    pub fn average_signal(&self) -> Option<f64> {
        if self.observations.is_empty() {
            return None;
        }
        let avg: Averager = self.observations.iter().map(|obs| obs.signal_dbm).collect();
        Some(avg.mean)
    }

    /// Average SNR, over observations that report one
    pub fn average_snr(&self) -> Option<f64> {
        let avg: Averager = self
            .observations
            .iter()
            .filter_map(|obs| if obs.snr_db > 0.0 { Some(obs.snr_db) } else { None })
            .collect();
        if avg.count > 0 {
            Some(avg.mean)
        } else {
            None
        }
    }
}

/// Immutable snapshot of a survey session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Survey {
    points: Vec<SurveyPoint>,
}

impl Survey {
    pub fn new(points: Vec<SurveyPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[SurveyPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Session scale (raster units per length unit)
    pub fn scale(&self) -> Option<f64> {
        self.points.first().map(|pt| pt.scale)
    }

    /// Distinct [EmitterId]s, in order of first appearance
    pub fn emitters(&self) -> Vec<EmitterId> {
        self.points
            .iter()
            .flat_map(|pt| pt.observations.iter().map(|obs| obs.emitter.clone()))
            .unique()
            .collect()
    }
}
