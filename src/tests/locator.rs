use crate::{
    prelude::{
        Config, EmitterId, Error, InvalidationCause, Locator, Measurement, PathLoss,
        SignalDistanceModel, SolverOpts, Status, Survey, Vector2,
    },
    tests::{init_logger, single_emitter_survey, survey_point},
};

use rand::{rngs::SmallRng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rstest::*;

/// Raster units per length unit
const SCALE: f64 = 10.0;

#[fixture]
fn corner_survey() -> Survey {
    single_emitter_survey(
        "aa:bb:cc:00:00:01",
        SCALE,
        &[
            (0.0, 0.0, -50.0),
            (100.0, 0.0, -60.0),
            (0.0, 100.0, -65.0),
            (100.0, 100.0, -70.0),
        ],
    )
}

/// Synthesizes a 4x4 survey grid around an emitter located at (x, y),
/// noise free when `sigma` is null.
fn synthetic_survey(id: &str, cfg: &Config, emitter: (f64, f64), sigma: f64, seed: u64) -> Survey {
    let model = SignalDistanceModel::new(cfg.path_loss);
    let emitter = Vector2::new(emitter.0, emitter.1);

    let mut rng = SmallRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, sigma).unwrap();

    let mut points = Vec::new();
    for i in 0..4 {
        for j in 0..4 {
            let (x, y) = (40.0 + 140.0 * i as f64, 30.0 + 110.0 * j as f64);
            let distance = (Vector2::new(x, y) - emitter).norm() / SCALE;
            let signal = model.expected_signal_at(distance) + noise.sample(&mut rng);
            points.push(survey_point(x, y, SCALE, &[(id, signal)]));
        }
    }

    Survey::new(points)
}

#[rstest]
fn corner_scenario(corner_survey: Survey) {
    init_logger();

    let path_loss = PathLoss::default().with_exponent(2.5);
    let cfg = Config::default().with_path_loss(path_loss);
    let locator = Locator::new(&cfg);

    let results = locator.solve_all(&corner_survey);
    assert_eq!(results.len(), 1);

    let id = EmitterId::new("AA:BB:CC:00:00:01").unwrap();
    let estimate = results.get(&id).unwrap().as_ref().unwrap();

    assert_eq!(estimate.measurement_count, 4);
    assert_eq!(estimate.status, Status::Estimated);
    assert!((estimate.average_signal_dbm + 61.25).abs() < 1.0E-9);
    assert!(estimate.confidence >= 0.0 && estimate.confidence <= 1.0);

    // within 10% of the surveyed square
    let (x, y) = (estimate.position.x, estimate.position.y);
    assert!((-10.0..=110.0).contains(&x), "x={}", x);
    assert!((-10.0..=110.0).contains(&y), "y={}", y);

    // strongest measurement pulls the estimate
    let strongest = Vector2::new(0.0, 0.0);
    let weakest = Vector2::new(100.0, 100.0);
    assert!((estimate.position - strongest).norm() < (estimate.position - weakest).norm());
}

/// Noise free survey of an emitter located at [EMITTER], with one more
/// location at (x, y) reporting `signal` [dBm].
fn survey_with_reading(id: &str, cfg: &Config, x: f64, y: f64, signal: f64) -> Survey {
    let mut points = synthetic_survey(id, cfg, EMITTER, 0.0, 0).points().to_vec();
    points.push(survey_point(x, y, SCALE, &[(id, signal)]));
    Survey::new(points)
}

/// Emitter location in the noise free scenarios
const EMITTER: (f64, f64) = (260.0, 170.0);

/// Disables outlier rejection
fn accept_outliers(cfg: &Config) -> Config {
    cfg.with_solver(SolverOpts {
        outlier_std_threshold: f64::INFINITY,
        ..cfg.solver.clone()
    })
}

#[rstest]
#[case(250.0, 180.0, 0)]
#[case(120.0, 300.0, 1)]
#[case(400.0, 90.0, 2)]
fn synthetic_accuracy(#[case] x: f64, #[case] y: f64, #[case] seed: u64) {
    init_logger();

    let cfg = Config::default();
    let locator = Locator::new(&cfg);

    let survey = synthetic_survey("00:11:22:33:44:55", &cfg, (x, y), 1.0, seed);
    let estimates = locator.estimates(&survey);

    let estimate = estimates.values().next().unwrap();
    let error = (estimate.position - Vector2::new(x, y)).norm();

    // 10% of the survey extent
    assert!(error < 50.0, "({}, {}): error={}", x, y, error);
    assert!(estimate.confidence > 0.5, "confidence={}", estimate.confidence);
}

#[test]
fn noise_free_convergence() {
    let cfg = Config::default();
    let locator = Locator::new(&cfg);

    let survey = synthetic_survey("00:11:22:33:44:55", &cfg, (260.0, 170.0), 0.0, 0);
    let estimates = locator.estimates(&survey);

    let estimate = estimates.values().next().unwrap();
    assert!((estimate.position - Vector2::new(260.0, 170.0)).norm() < 1.0);

    let report = locator.validate_position(estimate.position, &survey, &estimate.id);
    assert!(report.is_valid(), "{}", report);
    assert_eq!(report.samples, 16);
    assert!(report.mean_abs_error_db < 0.5);

    let checked = estimate.checked(&report);
    assert_eq!(checked.status, Status::Estimated);
}

#[test]
fn insufficient_data() {
    let locator = Locator::new(&Config::default());

    let survey = Survey::new(vec![
        survey_point(0.0, 0.0, SCALE, &[("a", -50.0), ("b", -60.0)]),
        survey_point(100.0, 0.0, SCALE, &[("a", -55.0), ("b", -62.0)]),
        survey_point(0.0, 100.0, SCALE, &[("a", -58.0)]),
    ]);

    let results = locator.solve_all(&survey);
    assert_eq!(results.len(), 2);

    let a = EmitterId::new("a").unwrap();
    let b = EmitterId::new("b").unwrap();

    assert!(results[&a].is_ok());
    assert_eq!(results[&b], Err(Error::InsufficientData(2)));

    // only successful estimates are retained
    let estimates = locator.estimates(&survey);
    assert_eq!(estimates.len(), 1);
    assert!(estimates.contains_key(&a));

    let measurements = [
        Measurement::new((0.0, 0.0), -50.0, 2437.0).unwrap(),
        Measurement::new((10.0, 0.0), -55.0, 2437.0).unwrap(),
    ];
    assert_eq!(
        locator.solve(&a, "a", &measurements, SCALE),
        Err(Error::InsufficientData(2))
    );
}

#[test]
fn invalid_scale() {
    let locator = Locator::new(&Config::default());
    let id = EmitterId::new("a").unwrap();
    let measurements = [
        Measurement::new((0.0, 0.0), -50.0, 2437.0).unwrap(),
        Measurement::new((10.0, 0.0), -55.0, 2437.0).unwrap(),
        Measurement::new((0.0, 10.0), -55.0, 2437.0).unwrap(),
    ];
    assert_eq!(
        locator.solve(&id, "a", &measurements, 0.0),
        Err(Error::InvalidScale(0.0))
    );
}

#[test]
fn empty_survey() {
    let locator = Locator::new(&Config::default());
    assert!(locator.solve_all(&Survey::default()).is_empty());
}

#[test]
fn determinism() {
    let cfg = Config::default().with_seed(42);
    let survey = synthetic_survey("de:ad:be:ef:00:01", &cfg, (200.0, 200.0), 2.0, 7);

    let first = Locator::new(&cfg).solve_all(&survey);
    let second = Locator::new(&cfg).solve_all(&survey);
    assert_eq!(first, second);
}

#[test]
fn per_emitter_independence() {
    let cfg = Config::default();
    let locator = Locator::new(&cfg);

    let alone = synthetic_survey("aa:00:00:00:00:01", &cfg, (200.0, 150.0), 1.5, 3);

    // same survey, with a second emitter observed at every location
    let shared = Survey::new(
        alone
            .points()
            .iter()
            .enumerate()
            .map(|(i, pt)| {
                let signal = pt.observations[0].signal_dbm;
                survey_point(
                    pt.position.x,
                    pt.position.y,
                    SCALE,
                    &[("bb:00:00:00:00:02", -45.0 - i as f64), ("aa:00:00:00:00:01", signal)],
                )
            })
            .collect(),
    );

    let id = EmitterId::new("aa:00:00:00:00:01").unwrap();

    let alone = locator.estimates(&alone);
    let shared = locator.estimates(&shared);

    assert!(shared.contains_key(&id));
    assert_eq!(alone[&id].position, shared[&id].position);
    assert_eq!(alone[&id].confidence, shared[&id].confidence);
}

#[rstest]
fn position_validation(corner_survey: Survey) {
    let locator = Locator::new(&Config::default());
    let id = EmitterId::new("aa:bb:cc:00:00:01").unwrap();

    let report = locator.validate_position(Vector2::new(5000.0, 5000.0), &corner_survey, &id);
    assert!(!report.is_valid());
    assert!(matches!(report.cause, Some(InvalidationCause::SignalError(_))));

    let unknown = EmitterId::new("ff:ff:ff:ff:ff:ff").unwrap();
    let report = locator.validate_position(Vector2::new(0.0, 0.0), &corner_survey, &unknown);
    assert_eq!(report.cause, Some(InvalidationCause::NoMeasurements));

    let estimate = locator.estimates(&corner_survey).remove(&id).unwrap();
    let far = locator.validate_position(Vector2::new(5000.0, 5000.0), &corner_survey, &id);
    let rejected = estimate.checked(&far);
    assert_eq!(rejected.status, Status::Rejected);
    assert_eq!(estimate.status, Status::Estimated);
}

#[rstest]
fn coverage(corner_survey: Survey) {
    let locator = Locator::new(&Config::default());
    let id = EmitterId::new("aa:bb:cc:00:00:01").unwrap();

    // all four locations are usable: 90th percentile of (0, 100, 100, 141.4)
    let radius = locator.coverage_radius(Vector2::new(0.0, 0.0), &corner_survey, &id);
    let expected = 100.0 + (100.0 * 2.0_f64.sqrt() - 100.0) * 0.7;
    assert!((radius - expected).abs() < 1.0E-9, "radius={}", radius);

    let unknown = EmitterId::new("ff:ff:ff:ff:ff:ff").unwrap();
    assert_eq!(
        locator.coverage_radius(Vector2::new(0.0, 0.0), &corner_survey, &unknown),
        50.0
    );

    // clamped
    let radius = locator.coverage_radius(Vector2::new(5000.0, 5000.0), &corner_survey, &id);
    assert_eq!(radius, 300.0);
}

#[test]
fn outlier_rejection() {
    init_logger();

    let cfg = Config::default();
    let id = EmitterId::new("00:11:22:33:44:55").unwrap();

    // unrealistically strong reading next to a regular location
    let survey = survey_with_reading(id.as_str(), &cfg, 45.0, 35.0, -10.0);
    let outlier = Vector2::new(45.0, 35.0);

    let rejecting = Locator::new(&cfg).solve_all(&survey).remove(&id).unwrap().unwrap();
    let accepting = Locator::new(&accept_outliers(&cfg))
        .solve_all(&survey)
        .remove(&id)
        .unwrap()
        .unwrap();

    // every location is still accounted for
    assert_eq!(rejecting.measurement_count, 17);
    assert_eq!(accepting.measurement_count, 17);

    let truth = Vector2::new(EMITTER.0, EMITTER.1);
    let error = (rejecting.position - truth).norm();
    assert!(error < 2.0, "error={}", error);

    // the strong reading drags the estimate towards its location
    assert!((accepting.position - rejecting.position).norm() > 10.0);
    assert!((accepting.position - outlier).norm() < (rejecting.position - outlier).norm());
    assert!(rejecting.confidence > accepting.confidence);
}

#[test]
fn outlier_rejection_fallback() {
    init_logger();

    // dispersed enough to trigger the rejection, which would only retain
    // the median reading: the complete set is preserved instead.
    let survey = single_emitter_survey(
        "a",
        SCALE,
        &[(0.0, 0.0, -30.0), (100.0, 0.0, -60.0), (0.0, 100.0, -90.0)],
    );

    let cfg = Config::default();
    let strict = cfg.with_solver(SolverOpts {
        outlier_sigma: 0.5,
        ..cfg.solver.clone()
    });

    let id = EmitterId::new("a").unwrap();
    let strict = Locator::new(&strict).solve_all(&survey).remove(&id).unwrap();
    let accepting = Locator::new(&accept_outliers(&cfg))
        .solve_all(&survey)
        .remove(&id)
        .unwrap();

    let estimate = strict.as_ref().unwrap();
    assert_eq!(estimate.measurement_count, 3);
    assert!(estimate.confidence > 0.0);
    assert_eq!(strict, accepting);
}

#[test]
fn validation_failure() {
    let cfg = Config::default();
    let survey = synthetic_survey("00:11:22:33:44:55", &cfg, EMITTER, 0.0, 0);

    let tight = cfg.with_solver(SolverOpts {
        max_solution_distance: 1.0,
        ..cfg.solver.clone()
    });

    let results = Locator::new(&tight).solve_all(&survey);
    let result = results.values().next().unwrap();

    match result {
        Err(Error::ValidationFailure(distance)) => assert!(*distance > 1.0),
        other => panic!("unexpected result: {:?}", other),
    }

    assert!(Locator::new(&tight).estimates(&survey).is_empty());
}

#[test]
fn rejected_locations_bound_the_solution() {
    init_logger();

    let cfg = Config::default();
    let id = EmitterId::new("00:11:22:33:44:55").unwrap();

    // strong reading, far away from every other location
    let survey = survey_with_reading(id.as_str(), &cfg, 4000.0, 4000.0, -10.0);

    let result = Locator::new(&cfg).solve_all(&survey).remove(&id).unwrap();
    match result {
        Err(Error::ValidationFailure(distance)) => {
            assert!(distance > cfg.solver.max_solution_distance, "distance={}", distance)
        },
        other => panic!("unexpected result: {:?}", other),
    }

    // tolerant validation: the outlier did not contribute to the fit
    let tolerant = cfg.with_solver(SolverOpts {
        max_solution_distance: 1000.0,
        ..cfg.solver.clone()
    });

    let estimate = Locator::new(&tolerant).solve_all(&survey).remove(&id).unwrap().unwrap();
    assert_eq!(estimate.measurement_count, 17);

    let truth = Vector2::new(EMITTER.0, EMITTER.1);
    assert!((estimate.position - truth).norm() < 2.0);
}

#[test]
fn convergence_failure() {
    let cfg = Config::default();
    let survey = synthetic_survey("00:11:22:33:44:55", &cfg, EMITTER, 0.0, 0);

    let exhausted = cfg.with_solver(SolverOpts {
        max_iterations: 0,
        ..cfg.solver.clone()
    });

    let results = Locator::new(&exhausted).solve_all(&survey);
    assert_eq!(results.len(), 1);
    assert_eq!(results.values().next(), Some(&Err(Error::ConvergenceFailure)));
}

#[test]
fn invalid_measurements() {
    let locator = Locator::new(&Config::default());
    let id = EmitterId::new("a").unwrap();

    let valid = Measurement::new((0.0, 10.0), -55.0, 2437.0).unwrap();
    let measurements = [
        Measurement::new((0.0, 0.0), -50.0, 2437.0).unwrap(),
        Measurement::new((10.0, 0.0), -55.0, 2437.0).unwrap(),
        Measurement {
            signal_dbm: f64::NAN,
            ..valid
        },
    ];

    assert_eq!(
        locator.solve(&id, "a", &measurements, SCALE),
        Err(Error::InvalidSignal)
    );
}
