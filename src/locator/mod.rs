//! Emitter multilateration
use std::collections::BTreeMap;

use log::{debug, info, warn};
use nalgebra::Vector2;
use rand::{rngs::SmallRng, SeedableRng};
use rand_distr::{Distribution, Normal};

mod estimate;
mod optimizer;
mod validator;

pub use estimate::{EmitterEstimate, Status};
pub use validator::{InvalidationCause, PositionReport};

use optimizer::{minimize, Minimum, Problem, WorkingArea};

use crate::{
    averager::Averager,
    cfg::Config,
    confidence::ConfidenceScorer,
    constants::{
        DEFAULT_COVERAGE_RADIUS, MAX_COVERAGE_RADIUS, MIN_COVERAGE_RADIUS, MIN_MEASUREMENTS,
        MIN_VALIDATION_DISTANCE,
    },
    error::Error,
    measurements::{group_by_emitter, Measurement},
    pathloss::SignalDistanceModel,
    survey::{EmitterId, Survey},
};

/// [Locator] estimates emitter positions from signal level surveys.
/// Each emitter is solved independently: failing to locate one emitter
/// never prevents locating the others.
#[derive(Debug, Clone)]
pub struct Locator {
    /// Locator parametrization
    pub cfg: Config,
    /// [SignalDistanceModel]
    model: SignalDistanceModel,
    /// [ConfidenceScorer]
    scorer: ConfidenceScorer,
}

impl Locator {
    /// Creates a new [Locator]
    pub fn new(cfg: &Config) -> Self {
        Self {
            cfg: cfg.clone(),
            model: SignalDistanceModel::new(cfg.path_loss),
            scorer: ConfidenceScorer::new(&cfg.scoring),
        }
    }

    /// Attempts to locate every emitter observed in this [Survey].
    /// Returns one result per emitter: [EmitterEstimate] or the reason
    /// we could not locate it.
    pub fn solve_all(&self, survey: &Survey) -> BTreeMap<EmitterId, Result<EmitterEstimate, Error>> {
        let scale = match survey.scale() {
            Some(scale) => scale,
            None => return BTreeMap::new(),
        };

        group_by_emitter(survey)
            .into_iter()
            .map(|(id, group)| {
                let result = self.solve(&id, &group.label, &group.measurements, scale);
                match &result {
                    Ok(estimate) => info!("{}", estimate),
                    Err(e) => warn!("{} (\"{}\"): {}", id, group.label, e),
                }
                (id, result)
            })
            .collect()
    }

    /// Locates every emitter in this [Survey], only retaining
    /// the successful [EmitterEstimate]s.
    pub fn estimates(&self, survey: &Survey) -> BTreeMap<EmitterId, EmitterEstimate> {
        self.solve_all(survey)
            .into_iter()
            .filter_map(|(id, result)| result.ok().map(|estimate| (id, estimate)))
            .collect()
    }

    /// Locates a single emitter.
    /// ## Inputs
    /// - id: [EmitterId]
    /// - label: display label
    /// - measurements: all [Measurement]s of this emitter
    /// - scale: raster units per length unit
    pub fn solve(
        &self,
        id: &EmitterId,
        label: &str,
        measurements: &[Measurement],
        scale: f64,
    ) -> Result<EmitterEstimate, Error> {
        if measurements.len() < MIN_MEASUREMENTS {
            return Err(Error::InsufficientData(measurements.len()));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::InvalidScale(scale));
        }
        for m in measurements {
            m.validate()?;
        }

        let retained = self.reject_outliers(id, measurements);
        let problem = self.problem(&retained, scale);

        let mut best = Option::<Minimum>::None;

        for (nth, seed) in self.seeds(id, &retained, scale).into_iter().enumerate() {
            match minimize(
                &problem,
                seed,
                self.cfg.solver.max_iterations,
                self.cfg.solver.tolerance,
            ) {
                Some(min) => {
                    debug!(
                        "{} seed #{} ({:.1}, {:.1}): converged to ({:.1}, {:.1}) cost={:.3E} in {} iter",
                        id, nth, seed.x, seed.y, min.position.x, min.position.y, min.cost, min.iterations
                    );
                    if best.map_or(true, |best| min.cost < best.cost) {
                        best = Some(min);
                    }
                },
                None => {
                    debug!("{} seed #{} ({:.1}, {:.1}): did not converge", id, nth, seed.x, seed.y);
                },
            }
        }

        let best = best.ok_or(Error::ConvergenceFailure)?;

        // dropped outliers still bound the solution
        let max_distance = measurements
            .iter()
            .map(|m| (best.position - m.position).norm() / scale)
            .fold(0.0_f64, f64::max);

        if max_distance > self.cfg.solver.max_solution_distance {
            return Err(Error::ValidationFailure(max_distance));
        }

        let stats: Averager = measurements.iter().map(|m| m.signal_dbm).collect();

        Ok(EmitterEstimate {
            id: id.clone(),
            label: label.to_string(),
            position: best.position,
            confidence: self.scorer.score(&retained, scale),
            measurement_count: measurements.len(),
            average_signal_dbm: stats.mean,
            status: Status::Estimated,
        })
    }

    /// Drops signal outliers, when dispersion is excessive.
    /// The complete set is preserved if that would leave us with
    /// not enough measurements.
    fn reject_outliers(&self, id: &EmitterId, measurements: &[Measurement]) -> Vec<Measurement> {
        let stats: Averager = measurements.iter().map(|m| m.signal_dbm).collect();
        let std_dev = stats.std_dev();

        if std_dev <= self.cfg.solver.outlier_std_threshold {
            return measurements.to_vec();
        }

        let max_dev = self.cfg.solver.outlier_sigma * std_dev;

        let retained = measurements
            .iter()
            .filter(|m| (m.signal_dbm - stats.mean).abs() <= max_dev)
            .copied()
            .collect::<Vec<_>>();

        if retained.len() < MIN_MEASUREMENTS {
            debug!("{}: outlier rejection would leave {} measurements", id, retained.len());
            measurements.to_vec()
        } else {
            debug!(
                "{}: rejected {} outliers (sigma={:.1}dB)",
                id,
                measurements.len() - retained.len(),
                std_dev
            );
            retained
        }
    }

    fn problem(&self, measurements: &[Measurement], scale: f64) -> Problem {
        let opts = &self.cfg.solver;

        let points = measurements.iter().map(|m| m.position).collect::<Vec<_>>();

        let distances = measurements
            .iter()
            .map(|m| {
                (self.model.distance_from(m.signal_dbm) * scale)
                    .clamp(opts.min_raster_distance, opts.max_raster_distance)
            })
            .collect::<Vec<_>>();

        let weights = distances.iter().map(|d| 1.0 / (1.0 + d / scale)).collect();

        Problem {
            area: WorkingArea::around(&points, opts.working_margin * scale),
            points,
            distances,
            weights,
            penalty: opts.penalty,
        }
    }

    /// Starting points: signal weighted centroid, plain centroid
    /// and perturbations of the weighted centroid.
    fn seeds(&self, id: &EmitterId, measurements: &[Measurement], scale: f64) -> Vec<Vector2<f64>> {
        let reference = self.cfg.path_loss.reference_dbm;

        let (mut weighted, mut total) = (Vector2::zeros(), 0.0);
        for m in measurements {
            let w = ((m.signal_dbm - reference) / 10.0).exp().max(0.1);
            weighted += m.position * w;
            total += w;
        }

        let centroid = measurements
            .iter()
            .fold(Vector2::zeros(), |acc, m| acc + m.position)
            / measurements.len() as f64;

        let weighted = if total > 0.0 { weighted / total } else { centroid };

        let mut seeds = vec![weighted, centroid];

        let sigma = self.cfg.solver.jitter_sigma * scale;
        match Normal::new(0.0, sigma) {
            Ok(normal) => {
                let mut rng = SmallRng::seed_from_u64(self.emitter_seed(id));
                for _ in 0..self.cfg.solver.perturbed_seeds {
                    let jitter = Vector2::new(normal.sample(&mut rng), normal.sample(&mut rng));
                    seeds.push(weighted + jitter);
                }
            },
            Err(e) => {
                warn!("{}: invalid jitter ({}), no perturbed restarts", id, e);
            },
        }

        seeds
    }

    /// Per emitter random seed, so estimates do not depend
    /// on the order emitters are processed in.
    fn emitter_seed(&self, id: &EmitterId) -> u64 {
        id.as_str()
            .bytes()
            .fold(0xcbf29ce484222325_u64 ^ self.cfg.solver.seed, |hash, byte| {
                (hash ^ byte as u64).wrapping_mul(0x100000001b3)
            })
    }

    /// Compares a position to every observation of this emitter in the [Survey]:
    /// the signal level the path loss model expects at each survey location
    /// versus the observed signal level.
    pub fn validate_position(
        &self,
        position: Vector2<f64>,
        survey: &Survey,
        emitter: &EmitterId,
    ) -> PositionReport {
        let residuals = survey
            .points()
            .iter()
            .filter_map(|pt| {
                let obs = pt.observation(emitter)?;
                let distance = (pt.position - position).norm() / pt.scale;
                let expected = self
                    .model
                    .expected_signal_at(distance.max(MIN_VALIDATION_DISTANCE));
                Some((distance, expected, obs.signal_dbm))
            })
            .collect::<Vec<_>>();

        let report = PositionReport::new(&residuals);
        debug!("{}: {}", emitter, report);
        report
    }

    /// Coverage radius (raster units) of this emitter: 90th percentile of
    /// the distances to survey locations that received it with usable signal.
    pub fn coverage_radius(&self, position: Vector2<f64>, survey: &Survey, emitter: &EmitterId) -> f64 {
        let floor = self.cfg.heatmap.usable_signal_dbm;

        let mut distances = survey
            .points()
            .iter()
            .filter_map(|pt| {
                let obs = pt.observation(emitter)?;
                if obs.signal_dbm >= floor {
                    Some((pt.position - position).norm())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();

        if distances.is_empty() {
            return DEFAULT_COVERAGE_RADIUS;
        }

        distances.sort_by(f64::total_cmp);

        percentile(&distances, 0.9).clamp(MIN_COVERAGE_RADIUS, MAX_COVERAGE_RADIUS)
    }
}

/// Percentile of sorted values, with linear interpolation
/// between the closest ranks.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let (lo, hi) = (rank.floor() as usize, rank.ceil() as usize);
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
