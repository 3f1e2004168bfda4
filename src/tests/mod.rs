mod locator;

use log::LevelFilter;
use std::sync::Once;

use crate::prelude::{EmitterId, Epoch, Observation, Survey, SurveyPoint};

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::builder()
            .is_test(true)
            .filter_level(LevelFilter::Debug)
            .init();
    });
}

/// Survey session start
pub fn session_start() -> Epoch {
    Epoch::from_gregorian_utc_hms(2025, 3, 14, 10, 0, 0)
}

/// Builds a [SurveyPoint] at (x, y), observing (emitter, signal) pairs
pub fn survey_point(x: f64, y: f64, scale: f64, observed: &[(&str, f64)]) -> SurveyPoint {
    let observations = observed
        .iter()
        .map(|(id, signal)| {
            let emitter = EmitterId::new(id).unwrap();
            Observation::new(emitter, &format!("ssid-{}", id), *signal, 2437.0, 6).unwrap()
        })
        .collect();

    SurveyPoint::new((x, y), session_start(), scale, observations).unwrap()
}

/// Builds a single emitter [Survey] from (x, y, signal) triplets
pub fn single_emitter_survey(id: &str, scale: f64, samples: &[(f64, f64, f64)]) -> Survey {
    Survey::new(
        samples
            .iter()
            .map(|(x, y, signal)| survey_point(*x, *y, scale, &[(id, *signal)]))
            .collect(),
    )
}
