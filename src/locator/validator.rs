use thiserror::Error;

use crate::constants::{MAX_VALIDATION_DISTANCE, MAX_VALIDATION_ERROR_DB};

#[derive(Clone, Debug, PartialEq, Error)]
/// Reason why this position has been invalidated
pub enum InvalidationCause {
    /// No survey location observed this emitter
    #[error("no measurements to validate against")]
    NoMeasurements,
    #[error("high signal error: {0:.1} dB")]
    SignalError(f64),
    #[error("excessive distance: {0:.1} length units")]
    ExcessiveDistance(f64),
}

/// Post-hoc comparison of a position against the signal levels
/// the path loss model predicts at each survey location.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionReport {
    /// Mean absolute error [dB] between expected and observed signal levels
    pub mean_abs_error_db: f64,
    /// Maximal distance (length units) to a survey location
    pub max_distance: f64,
    /// Number of survey locations that observed this emitter
    pub samples: usize,
    /// [InvalidationCause], if the position was rejected
    pub cause: Option<InvalidationCause>,
}

impl PositionReport {
    /// Builds a [PositionReport] from (distance, expected, observed) triplets
    pub(crate) fn new(residuals: &[(f64, f64, f64)]) -> Self {
        if residuals.is_empty() {
            return Self {
                mean_abs_error_db: 0.0,
                max_distance: 0.0,
                samples: 0,
                cause: Some(InvalidationCause::NoMeasurements),
            };
        }

        let samples = residuals.len();
        let mean_abs_error_db = residuals
            .iter()
            .map(|(_, expected, observed)| (expected - observed).abs())
            .sum::<f64>()
            / samples as f64;

        let max_distance = residuals
            .iter()
            .map(|(distance, _, _)| *distance)
            .fold(0.0_f64, f64::max);

        let cause = if mean_abs_error_db > MAX_VALIDATION_ERROR_DB {
            Some(InvalidationCause::SignalError(mean_abs_error_db))
        } else if max_distance > MAX_VALIDATION_DISTANCE {
            Some(InvalidationCause::ExcessiveDistance(max_distance))
        } else {
            None
        };

        Self {
            mean_abs_error_db,
            max_distance,
            samples,
            cause,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.cause.is_none()
    }
}

impl std::fmt::Display for PositionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "invalid position: {}", cause),
            None => write!(f, "valid position (error: {:.1} dB)", self.mean_abs_error_db),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{InvalidationCause, PositionReport};

    #[test]
    fn report() {
        let report = PositionReport::new(&[]);
        assert_eq!(report.cause, Some(InvalidationCause::NoMeasurements));

        let report = PositionReport::new(&[(10.0, -70.0, -72.0), (20.0, -79.0, -75.0)]);
        assert!(report.is_valid());
        assert_eq!(report.mean_abs_error_db, 3.0);
        assert_eq!(report.max_distance, 20.0);
        assert_eq!(report.to_string(), "valid position (error: 3.0 dB)");

        let report = PositionReport::new(&[(10.0, -50.0, -80.0), (20.0, -60.0, -85.0)]);
        assert_eq!(report.cause, Some(InvalidationCause::SignalError(27.5)));

        let report = PositionReport::new(&[(10.0, -50.0, -50.0), (120.0, -60.0, -60.0)]);
        assert_eq!(report.cause, Some(InvalidationCause::ExcessiveDistance(120.0)));
    }
}
