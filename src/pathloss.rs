//! Log distance path loss model
use crate::cfg::PathLoss;

/// [SignalDistanceModel] converts signal levels to distances (and back)
/// following the log distance path loss model:
/// `P(d) = P(d0) - 10 * n * log10(d / d0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalDistanceModel {
    params: PathLoss,
}

impl SignalDistanceModel {
    /// Builds a new [SignalDistanceModel] from [PathLoss] parameters.
    pub fn new(params: PathLoss) -> Self {
        Self { params }
    }

    /// Estimated distance (length units) to an emitter received at `signal_dbm`.
    /// The result is clamped to the [PathLoss] distance bounds.
    pub fn distance_from(&self, signal_dbm: f64) -> f64 {
        let p = &self.params;
        if signal_dbm >= p.reference_dbm {
            return p.reference_distance;
        }
        let d = p.reference_distance
            * 10.0_f64.powf((p.reference_dbm - signal_dbm) / (10.0 * p.exponent));
        d.clamp(p.min_distance, p.max_distance)
    }

    /// Expected signal level [dBm] at this distance (length units).
    /// Distance should be strictly positive.
    pub fn expected_signal_at(&self, distance: f64) -> f64 {
        let p = &self.params;
        p.reference_dbm - 10.0 * p.exponent * (distance / p.reference_distance).log10()
    }
}

#[cfg(test)]
mod test {
    use super::SignalDistanceModel;
    use crate::cfg::PathLoss;

    fn model(exponent: f64) -> SignalDistanceModel {
        SignalDistanceModel::new(PathLoss {
            exponent,
            ..Default::default()
        })
    }

    #[test]
    fn distances() {
        let model = model(2.0);
        assert_eq!(model.distance_from(-30.0), 1.0);
        assert_eq!(model.distance_from(-40.0), 1.0);
        assert!((model.distance_from(-60.0) - 10.0).abs() < 1.0E-9);
        assert!((model.distance_from(-80.0) - 100.0).abs() < 1.0E-9);
        // clamped
        assert_eq!(model.distance_from(-120.0), 150.0);
    }

    #[test]
    fn monotonic() {
        for exponent in [2.0, 2.5, 3.0, 3.5] {
            let model = model(exponent);
            let mut prev = f64::INFINITY;
            for signal in -120..=-10 {
                let d = model.distance_from(signal as f64);
                assert!(d <= prev, "n={} {}dBm: {} > {}", exponent, signal, d, prev);
                prev = d;
            }
        }
    }

    #[test]
    fn inverse() {
        let model = model(3.0);
        for distance in [1.0, 2.0, 7.5, 20.0, 100.0] {
            let signal = model.expected_signal_at(distance);
            assert!((model.distance_from(signal) - distance).abs() < 1.0E-9);
        }
    }
}
