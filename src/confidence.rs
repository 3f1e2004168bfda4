//! Emitter position confidence
use itertools::{Itertools, MinMaxResult};
use log::trace;

use crate::{
    averager::Averager, cfg::ScoringOpts, constants::MIN_MEASUREMENTS, measurements::Measurement,
};

/// [ConfidenceScorer] rates how much a position estimate can be trusted,
/// from the [Measurement]s that were used to form it.
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    opts: ScoringOpts,
}

impl ConfidenceScorer {
    pub fn new(opts: &ScoringOpts) -> Self {
        Self { opts: opts.clone() }
    }

    /// Returns confidence within [0, 1].
    /// ## Inputs
    /// - measurements: [Measurement]s of a single emitter
    /// - scale: raster units per length unit
    pub fn score(&self, measurements: &[Measurement], scale: f64) -> f64 {
        if measurements.len() < MIN_MEASUREMENTS {
            return 0.0;
        }

        let stats: Averager = measurements.iter().map(|m| m.signal_dbm).collect();

        let count = self.count_factor(measurements.len());
        let consistency = self.consistency_factor(stats.std_dev());
        let spread = self.spread_factor(measurements, scale);
        let quality = self.quality_factor(stats.mean);

        let (w_count, w_consistency, w_spread, w_quality) = self.opts.weights;

        let score = w_count * count
            + w_consistency * consistency
            + w_spread * spread
            + w_quality * quality;

        trace!(
            "confidence: count={:.2} consistency={:.2} spread={:.2} quality={:.2} => {:.3}",
            count,
            consistency,
            spread,
            quality,
            score
        );

        if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    fn count_factor(&self, count: usize) -> f64 {
        (count as f64 / self.opts.count_saturation).min(1.0)
    }

    fn consistency_factor(&self, std_dev: f64) -> f64 {
        (1.0 - std_dev / self.opts.consistency_k).max(0.0)
    }

    fn spread_factor(&self, measurements: &[Measurement], scale: f64) -> f64 {
        if measurements.len() < 4 {
            return self.opts.neutral_spread;
        }

        let extent = |values: MinMaxResult<f64>| match values {
            MinMaxResult::MinMax(min, max) => max - min,
            _ => 0.0,
        };

        let dx = extent(measurements.iter().map(|m| m.position.x).minmax_by(f64::total_cmp));
        let dy = extent(measurements.iter().map(|m| m.position.y).minmax_by(f64::total_cmp));

        let spread = (dx + dy) / 2.0 / scale;
        (spread / self.opts.spread_saturation).min(1.0)
    }

    fn quality_factor(&self, mean_dbm: f64) -> f64 {
        let (weak, strong) = (self.opts.weak_dbm, self.opts.strong_dbm);
        ((mean_dbm - weak) / (strong - weak)).clamp(0.0, 1.0)
    }
}
