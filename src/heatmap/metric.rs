//! Heatmap metrics and value ranges
use itertools::{Itertools, MinMaxResult};
use log::warn;
use nalgebra::Vector2;

use crate::{
    constants::LATENCY_TIMEOUT_MS,
    error::Error,
    survey::{EmitterId, Survey, SurveyPoint},
};

/// Metric family, which defines the [ColorRamp](crate::prelude::ColorRamp).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricFamily {
    /// Signal strength like: higher is better
    Signal,
    /// Throughput like: higher is better
    Throughput,
    /// Latency like: lower is better
    Latency,
}

/// Metric a heatmap can be rendered for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    /// Received signal level [dBm]
    Rssi,
    /// Signal to noise ratio [dB]
    Snr,
    /// Download throughput [Mbps]
    Download,
    /// Upload throughput [Mbps]
    Upload,
    /// Round trip latency [ms]
    Ping,
    /// Latency jitter [ms]
    Jitter,
    /// Caller defined metric, only usable with
    /// caller defined scatter samples.
    Custom {
        name: &'static str,
        unit: &'static str,
        family: MetricFamily,
    },
}

impl Metric {
    pub fn family(&self) -> MetricFamily {
        match self {
            Self::Rssi | Self::Snr => MetricFamily::Signal,
            Self::Download | Self::Upload => MetricFamily::Throughput,
            Self::Ping | Self::Jitter => MetricFamily::Latency,
            Self::Custom { family, .. } => *family,
        }
    }

    /// True if lower values are better
    pub fn is_inverted(&self) -> bool {
        self.family() == MetricFamily::Latency
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rssi => "Signal strength",
            Self::Snr => "Signal to noise ratio",
            Self::Download => "Download throughput",
            Self::Upload => "Upload throughput",
            Self::Ping => "Latency",
            Self::Jitter => "Jitter",
            Self::Custom { name, .. } => *name,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::Rssi => "dBm",
            Self::Snr => "dB",
            Self::Download | Self::Upload => "Mbps",
            Self::Ping | Self::Jitter => "ms",
            Self::Custom { unit, .. } => *unit,
        }
    }

    /// Typical value range of this metric
    pub fn default_range(&self) -> Option<(f64, f64)> {
        match self {
            Self::Rssi => Some((-90.0, -40.0)),
            Self::Snr => Some((0.0, 50.0)),
            Self::Download | Self::Upload => Some((0.0, 100.0)),
            Self::Ping | Self::Jitter => Some((0.0, 200.0)),
            Self::Custom { .. } => None,
        }
    }

    /// Extracts this metric from a [SurveyPoint].
    /// Signal metrics are read from the targeted emitter,
    /// or the strongest emitter at this location.
    pub fn extract(&self, point: &SurveyPoint, target: Option<&EmitterId>) -> Option<f64> {
        match self {
            Self::Rssi | Self::Snr => {
                let obs = match target {
                    Some(id) => point.observation(id),
                    None => point.strongest(),
                }?;
                if *self == Self::Rssi {
                    Some(obs.signal_dbm)
                } else {
                    Some(obs.snr_db)
                }
            },
            Self::Custom { .. } => None,
            _ => {
                let probe = point.throughput.filter(|probe| probe.is_valid())?;
                match self {
                    Self::Download => Some(probe.download_mbps),
                    Self::Upload => Some(probe.upload_mbps),
                    Self::Ping if probe.latency_ms < LATENCY_TIMEOUT_MS => Some(probe.latency_ms),
                    Self::Jitter => Some(probe.jitter_ms),
                    _ => None,
                }
            },
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.unit())
    }
}

/// One (position, value) observation, to interpolate from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterSample {
    /// Position, in raster units
    pub position: Vector2<f64>,
    pub value: f64,
}

impl ScatterSample {
    pub fn new(position: (f64, f64), value: f64) -> Result<Self, Error> {
        if !position.0.is_finite() || !position.1.is_finite() {
            return Err(Error::InvalidPosition);
        }
        if !value.is_finite() {
            return Err(Error::InvalidSignal);
        }
        Ok(Self {
            position: Vector2::new(position.0, position.1),
            value,
        })
    }

    /// Gathers [ScatterSample]s of this [Metric] from a [Survey].
    /// Survey locations that do not provide the metric are skipped.
    pub fn collect(survey: &Survey, metric: &Metric, target: Option<&EmitterId>) -> Vec<Self> {
        survey
            .points()
            .iter()
            .filter_map(|pt| {
                let value = metric.extract(pt, target)?;
                if value.is_finite() {
                    Some(Self {
                        position: pt.position,
                        value,
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Value range a heatmap is normalized against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Builds a new [ValueRange], fails if `max` is not strictly above `min`.
    pub fn new(min: f64, max: f64) -> Result<Self, Error> {
        if !min.is_finite() || !max.is_finite() || max <= min {
            return Err(Error::DegenerateRange);
        }
        Ok(Self { min, max })
    }

    /// Determines the [ValueRange] of this [Metric]: default range,
    /// widened by observed values (with `padding`, a fraction of the
    /// observed span). Degenerate ranges are widened to one unit.
    pub fn determine(metric: &Metric, samples: &[ScatterSample], padding: f64) -> Self {
        let observed = match samples.iter().map(|s| s.value).minmax_by(f64::total_cmp) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(v) => Some((v, v)),
            MinMaxResult::MinMax(min, max) => Some((min, max)),
        };

        let (min, max) = match (metric.default_range(), observed) {
            (Some((min, max)), None) => (min, max),
            (None, None) => (0.0, 1.0),
            (Some((mut min, mut max)), Some((obs_min, obs_max))) => {
                let pad = padding * (obs_max - obs_min);
                if obs_min < min {
                    min = obs_min - pad;
                }
                if obs_max > max {
                    max = obs_max + pad;
                }
                (min, max)
            },
            (None, Some((obs_min, obs_max))) => {
                let pad = padding * (obs_max - obs_min);
                (obs_min - pad, obs_max + pad)
            },
        };

        match Self::new(min, max) {
            Ok(range) => range,
            Err(e) => {
                warn!("{}: {} [{}, {}]: widening", metric, e, min, max);
                Self {
                    min: min - 0.5,
                    max: max + 0.5,
                }
            },
        }
    }

    /// True if this value lies within [Self]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clips and scales this value to [0, 1].
    pub fn normalize(&self, value: f64) -> f64 {
        (value.clamp(self.min, self.max) - self.min) / (self.max - self.min)
    }
}

#[cfg(test)]
mod test {
    use super::{Metric, MetricFamily, ScatterSample, ValueRange};
    use crate::error::Error;

    fn samples(values: &[f64]) -> Vec<ScatterSample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| ScatterSample::new((i as f64, 0.0), *v).unwrap())
            .collect()
    }

    #[test]
    fn default_ranges() {
        let range = ValueRange::determine(&Metric::Rssi, &samples(&[-70.0, -60.0]), 0.05);
        assert_eq!(range, ValueRange::new(-90.0, -40.0).unwrap());

        let range = ValueRange::determine(&Metric::Rssi, &[], 0.05);
        assert_eq!(range, ValueRange::new(-90.0, -40.0).unwrap());
    }

    #[test]
    fn widened_ranges() {
        let range = ValueRange::determine(&Metric::Download, &samples(&[20.0, 420.0]), 0.05);
        assert_eq!(range.min, 0.0);
        assert_eq!(range.max, 440.0);

        let range = ValueRange::determine(&Metric::Rssi, &samples(&[-95.0, -35.0]), 0.0);
        assert_eq!(range, ValueRange::new(-95.0, -35.0).unwrap());
        assert!(range.contains(-95.0) && range.contains(-35.0));
    }

    #[test]
    fn degenerate_range() {
        assert_eq!(ValueRange::new(3.0, 3.0), Err(Error::DegenerateRange));

        let metric = Metric::Custom {
            name: "Retries",
            unit: "%",
            family: MetricFamily::Latency,
        };
        let range = ValueRange::determine(&metric, &samples(&[3.0, 3.0, 3.0]), 0.05);
        assert!(range.max - range.min >= 1.0);
        assert!(range.contains(3.0));
        assert_eq!(range.normalize(3.0), 0.5);
    }

    #[test]
    fn normalization() {
        let range = ValueRange::new(-90.0, -40.0).unwrap();
        assert_eq!(range.normalize(-90.0), 0.0);
        assert_eq!(range.normalize(-40.0), 1.0);
        assert_eq!(range.normalize(-30.0), 1.0);
        assert_eq!(range.normalize(-65.0), 0.5);
    }

    #[test]
    fn invalid_samples() {
        assert_eq!(ScatterSample::new((0.0, f64::NAN), 1.0), Err(Error::InvalidPosition));
        assert_eq!(ScatterSample::new((0.0, 0.0), f64::INFINITY), Err(Error::InvalidSignal));
    }
}
