#[cfg(feature = "serde")]
use serde::Deserialize;

/// Propagation [Environment], to select the
/// appropriate path loss exponent. Failing to select
/// the appropriate [Environment] will degrade the estimates.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum Environment {
    /// Line of sight, few obstacles (warehouse, hall).
    OpenSpace,
    /// Typical office floor with light partitions.
    #[default]
    Office,
    /// Concrete walls, many obstacles.
    DenseIndoor,
}

impl Environment {
    /// Path loss exponent typically observed in this [Environment].
    pub fn path_loss_exponent(&self) -> f64 {
        match self {
            Self::OpenSpace => 2.0,
            Self::Office => 3.0,
            Self::DenseIndoor => 3.5,
        }
    }
}

fn default_reference_dbm() -> f64 {
    -40.0
}

fn default_reference_distance() -> f64 {
    1.0
}

fn default_exponent() -> f64 {
    3.0
}

fn default_min_distance() -> f64 {
    0.5
}

fn default_max_distance() -> f64 {
    150.0
}

fn default_outlier_std_threshold() -> f64 {
    15.0
}

fn default_outlier_sigma() -> f64 {
    2.0
}

fn default_min_raster_distance() -> f64 {
    10.0
}

fn default_max_raster_distance() -> f64 {
    1000.0
}

fn default_perturbed_seeds() -> usize {
    3
}

fn default_jitter_sigma() -> f64 {
    2.0
}

fn default_seed() -> u64 {
    0
}

fn default_max_iterations() -> usize {
    1000
}

fn default_tolerance() -> f64 {
    1.0E-9
}

fn default_working_margin() -> f64 {
    100.0
}

fn default_penalty() -> f64 {
    1.0E6
}

fn default_max_solution_distance() -> f64 {
    200.0
}

fn default_count_saturation() -> f64 {
    8.0
}

fn default_consistency_k() -> f64 {
    25.0
}

fn default_spread_saturation() -> f64 {
    20.0
}

fn default_neutral_spread() -> f64 {
    0.5
}

fn default_weak_dbm() -> f64 {
    -90.0
}

fn default_strong_dbm() -> f64 {
    -40.0
}

fn default_weights() -> (f64, f64, f64, f64) {
    (0.3, 0.3, 0.2, 0.2)
}

fn default_max_grid() -> usize {
    200
}

fn default_grid_divider() -> usize {
    4
}

fn default_influence_ratio() -> f64 {
    0.25
}

fn default_alpha_ceiling() -> f64 {
    0.85
}

fn default_alpha_floor() -> f64 {
    0.24
}

fn default_alpha_background() -> f64 {
    0.12
}

fn default_range_padding() -> f64 {
    0.05
}

fn default_splat_divider() -> usize {
    8
}

fn default_splat_opacity() -> f64 {
    0.6
}

fn default_rbf_smoothing() -> f64 {
    0.1
}

fn default_usable_signal_dbm() -> f64 {
    -85.0
}

/// Log distance path loss model parametrization
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct PathLoss {
    /// Signal level [dBm] measured at reference distance
    #[cfg_attr(feature = "serde", serde(default = "default_reference_dbm"))]
    pub reference_dbm: f64,
    /// Reference distance (length units)
    #[cfg_attr(feature = "serde", serde(default = "default_reference_distance"))]
    pub reference_distance: f64,
    /// Path loss exponent, 2 in free space, 2..3.5 indoors.
    #[cfg_attr(feature = "serde", serde(default = "default_exponent"))]
    pub exponent: f64,
    /// Smallest distance (length units) we will ever report
    #[cfg_attr(feature = "serde", serde(default = "default_min_distance"))]
    pub min_distance: f64,
    /// Largest distance (length units) we will ever report
    #[cfg_attr(feature = "serde", serde(default = "default_max_distance"))]
    pub max_distance: f64,
}

impl Default for PathLoss {
    fn default() -> Self {
        Self {
            reference_dbm: default_reference_dbm(),
            reference_distance: default_reference_distance(),
            exponent: default_exponent(),
            min_distance: default_min_distance(),
            max_distance: default_max_distance(),
        }
    }
}

impl PathLoss {
    /// Copies and returns [PathLoss] with updated path loss exponent.
    pub fn with_exponent(&self, exponent: f64) -> Self {
        let mut s = *self;
        s.exponent = exponent;
        s
    }
}

/// Multilateration solver options
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct SolverOpts {
    /// Outlier rejection only applies when signal dispersion [dB]
    /// exceeds this value.
    #[cfg_attr(feature = "serde", serde(default = "default_outlier_std_threshold"))]
    pub outlier_std_threshold: f64,
    /// Measurements further than this many standard deviations
    /// from the mean signal are rejected.
    #[cfg_attr(feature = "serde", serde(default = "default_outlier_sigma"))]
    pub outlier_sigma: f64,
    /// Smallest expected distance (raster units)
    #[cfg_attr(feature = "serde", serde(default = "default_min_raster_distance"))]
    pub min_raster_distance: f64,
    /// Largest expected distance (raster units)
    #[cfg_attr(feature = "serde", serde(default = "default_max_raster_distance"))]
    pub max_raster_distance: f64,
    /// Number of randomly perturbed starting points, on top
    /// of the weighted and plain centroids.
    #[cfg_attr(feature = "serde", serde(default = "default_perturbed_seeds"))]
    pub perturbed_seeds: usize,
    /// Gaussian jitter standard deviation (length units)
    #[cfg_attr(feature = "serde", serde(default = "default_jitter_sigma"))]
    pub jitter_sigma: f64,
    /// Random seed, for reproducible restarts.
    #[cfg_attr(feature = "serde", serde(default = "default_seed"))]
    pub seed: u64,
    /// Iteration budget of each local minimization
    #[cfg_attr(feature = "serde", serde(default = "default_max_iterations"))]
    pub max_iterations: usize,
    /// Relative objective decrease (or step length, in raster units)
    /// under which a minimization has converged.
    #[cfg_attr(feature = "serde", serde(default = "default_tolerance"))]
    pub tolerance: f64,
    /// Margin (length units) around the measurements that
    /// defines the working area.
    #[cfg_attr(feature = "serde", serde(default = "default_working_margin"))]
    pub working_margin: f64,
    /// Penalty added to the objective, outside the working area
    #[cfg_attr(feature = "serde", serde(default = "default_penalty"))]
    pub penalty: f64,
    /// Solutions further than this (length units) from any measurement
    /// are rejected.
    #[cfg_attr(feature = "serde", serde(default = "default_max_solution_distance"))]
    pub max_solution_distance: f64,
}

impl Default for SolverOpts {
    fn default() -> Self {
        Self {
            outlier_std_threshold: default_outlier_std_threshold(),
            outlier_sigma: default_outlier_sigma(),
            min_raster_distance: default_min_raster_distance(),
            max_raster_distance: default_max_raster_distance(),
            perturbed_seeds: default_perturbed_seeds(),
            jitter_sigma: default_jitter_sigma(),
            seed: default_seed(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            working_margin: default_working_margin(),
            penalty: default_penalty(),
            max_solution_distance: default_max_solution_distance(),
        }
    }
}

/// Confidence scoring options
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct ScoringOpts {
    /// Measurement count that saturates the count factor
    #[cfg_attr(feature = "serde", serde(default = "default_count_saturation"))]
    pub count_saturation: f64,
    /// Signal dispersion [dB] that cancels the consistency factor
    #[cfg_attr(feature = "serde", serde(default = "default_consistency_k"))]
    pub consistency_k: f64,
    /// Spread (length units) that saturates the spatial factor
    #[cfg_attr(feature = "serde", serde(default = "default_spread_saturation"))]
    pub spread_saturation: f64,
    /// Spatial factor used with less than 4 positions
    #[cfg_attr(feature = "serde", serde(default = "default_neutral_spread"))]
    pub neutral_spread: f64,
    /// Signal level [dBm] mapped to a null quality factor
    #[cfg_attr(feature = "serde", serde(default = "default_weak_dbm"))]
    pub weak_dbm: f64,
    /// Signal level [dBm] mapped to a unitary quality factor
    #[cfg_attr(feature = "serde", serde(default = "default_strong_dbm"))]
    pub strong_dbm: f64,
    /// (count, consistency, spread, quality) weights
    #[cfg_attr(feature = "serde", serde(default = "default_weights"))]
    pub weights: (f64, f64, f64, f64),
}

impl Default for ScoringOpts {
    fn default() -> Self {
        Self {
            count_saturation: default_count_saturation(),
            consistency_k: default_consistency_k(),
            spread_saturation: default_spread_saturation(),
            neutral_spread: default_neutral_spread(),
            weak_dbm: default_weak_dbm(),
            strong_dbm: default_strong_dbm(),
            weights: default_weights(),
        }
    }
}

/// Heatmap rendering options
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct HeatmapOpts {
    /// Maximal intermediate grid resolution, on each axis
    #[cfg_attr(feature = "serde", serde(default = "default_max_grid"))]
    pub max_grid: usize,
    /// Intermediate grid is the raster size divided by this value
    #[cfg_attr(feature = "serde", serde(default = "default_grid_divider"))]
    pub grid_divider: usize,
    /// Influence radius, as a fraction of the smaller raster dimension
    #[cfg_attr(feature = "serde", serde(default = "default_influence_ratio"))]
    pub influence_ratio: f64,
    /// Opacity right on top of a sample (fraction of max. opacity)
    #[cfg_attr(feature = "serde", serde(default = "default_alpha_ceiling"))]
    pub alpha_ceiling: f64,
    /// Opacity at the edge of the influence radius
    #[cfg_attr(feature = "serde", serde(default = "default_alpha_floor"))]
    pub alpha_floor: f64,
    /// Opacity outside the influence radius
    #[cfg_attr(feature = "serde", serde(default = "default_alpha_background"))]
    pub alpha_background: f64,
    /// Padding applied when observations widen the default range,
    /// as a fraction of the observed span.
    #[cfg_attr(feature = "serde", serde(default = "default_range_padding"))]
    pub range_padding: f64,
    /// Splat radius is the smaller raster dimension divided by this value
    #[cfg_attr(feature = "serde", serde(default = "default_splat_divider"))]
    pub splat_divider: usize,
    /// Opacity of a splat at its center
    #[cfg_attr(feature = "serde", serde(default = "default_splat_opacity"))]
    pub splat_opacity: f64,
    /// Radial basis smoothing term
    #[cfg_attr(feature = "serde", serde(default = "default_rbf_smoothing"))]
    pub rbf_smoothing: f64,
    /// Signal level [dBm] above which a sample contributes
    /// to the coverage radius.
    #[cfg_attr(feature = "serde", serde(default = "default_usable_signal_dbm"))]
    pub usable_signal_dbm: f64,
}

impl Default for HeatmapOpts {
    fn default() -> Self {
        Self {
            max_grid: default_max_grid(),
            grid_divider: default_grid_divider(),
            influence_ratio: default_influence_ratio(),
            alpha_ceiling: default_alpha_ceiling(),
            alpha_floor: default_alpha_floor(),
            alpha_background: default_alpha_background(),
            range_padding: default_range_padding(),
            splat_divider: default_splat_divider(),
            splat_opacity: default_splat_opacity(),
            rbf_smoothing: default_rbf_smoothing(),
            usable_signal_dbm: default_usable_signal_dbm(),
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Config {
    /// [PathLoss] model used to convert signal levels to distances.
    #[cfg_attr(feature = "serde", serde(default))]
    pub path_loss: PathLoss,
    /// Multilateration solver customization
    #[cfg_attr(feature = "serde", serde(default))]
    pub solver: SolverOpts,
    /// Confidence scoring customization
    #[cfg_attr(feature = "serde", serde(default))]
    pub scoring: ScoringOpts,
    /// Heatmap rendering customization
    #[cfg_attr(feature = "serde", serde(default))]
    pub heatmap: HeatmapOpts,
}

impl Config {
    /// Returns [Config] suited for this propagation [Environment].
    /// You can then customize [Self] as you will.
    pub fn preset(environment: Environment) -> Self {
        let mut s = Self::default();
        s.path_loss.exponent = environment.path_loss_exponent();
        s
    }
    /// Copies and returns [Config] with updated [PathLoss] model.
    pub fn with_path_loss(&self, path_loss: PathLoss) -> Self {
        let mut s = self.clone();
        s.path_loss = path_loss;
        s
    }
    /// Copies and returns [Config] with updated random seed.
    pub fn with_seed(&self, seed: u64) -> Self {
        let mut s = self.clone();
        s.solver.seed = seed;
        s
    }
    /// Copies and returns [Config] with updated [SolverOpts].
    pub fn with_solver(&self, solver: SolverOpts) -> Self {
        let mut s = self.clone();
        s.solver = solver;
        s
    }
    /// Copies and returns [Config] with updated [HeatmapOpts].
    pub fn with_heatmap(&self, heatmap: HeatmapOpts) -> Self {
        let mut s = self.clone();
        s.heatmap = heatmap;
        s
    }
}
