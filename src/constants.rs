/// Weakest signal level we consider physically meaningful [dBm]
pub const MIN_SIGNAL_DBM: f64 = -120.0;

/// Strongest signal level we consider physically meaningful [dBm]
pub const MAX_SIGNAL_DBM: f64 = -10.0;

/// Noise floor assumed when the receiver does not report one [dBm]
pub const DEFAULT_NOISE_DBM: f64 = -96.0;

/// Maximal signal to noise ratio [dB]
pub const MAX_SNR_DB: f64 = 60.0;

/// Minimal number of measurements (or samples) to attempt anything
pub const MIN_MEASUREMENTS: usize = 3;

/// Latencies at or above this value [ms] are probe timeouts
pub const LATENCY_TIMEOUT_MS: f64 = 999.0;

/// Mean absolute signal error [dB] above which a position is invalidated
pub const MAX_VALIDATION_ERROR_DB: f64 = 20.0;

/// Distance (length units) above which a position is invalidated
pub const MAX_VALIDATION_DISTANCE: f64 = 100.0;

/// Distance floor (length units) of the inverse path loss model,
/// when validating positions.
pub const MIN_VALIDATION_DISTANCE: f64 = 0.1;

/// Coverage radius [raster units] reported without usable samples
pub const DEFAULT_COVERAGE_RADIUS: f64 = 50.0;

/// Coverage radius display range [raster units]
pub const MIN_COVERAGE_RADIUS: f64 = 20.0;
pub const MAX_COVERAGE_RADIUS: f64 = 300.0;
