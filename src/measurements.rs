use std::collections::BTreeMap;

use itertools::Itertools;
use nalgebra::Vector2;

use crate::{
    constants::{MAX_SIGNAL_DBM, MIN_SIGNAL_DBM},
    error::Error,
    survey::{EmitterId, Survey},
};

/// Signal level [Measurement], of one emitter at one survey location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Receiver position, in raster units
    pub position: Vector2<f64>,
    /// Received signal level [dBm]
    pub signal_dbm: f64,
    /// Carrier frequency [MHz]
    pub frequency_mhz: f64,
}

impl Measurement {
    /// Builds a new [Measurement]. Signal level is clamped
    /// to a physically meaningful range.
    pub fn new(position: (f64, f64), signal_dbm: f64, frequency_mhz: f64) -> Result<Self, Error> {
        let m = Self {
            position: Vector2::new(position.0, position.1),
            signal_dbm,
            frequency_mhz,
        };
        m.validate()?;
        Ok(Self {
            signal_dbm: signal_dbm.clamp(MIN_SIGNAL_DBM, MAX_SIGNAL_DBM),
            ..m
        })
    }

    /// Verifies this [Measurement] is usable: finite position and signal level.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.position.x.is_finite() || !self.position.y.is_finite() {
            return Err(Error::InvalidPosition);
        }
        if !self.signal_dbm.is_finite() {
            return Err(Error::InvalidSignal);
        }
        Ok(())
    }
}

/// All [Measurement]s of one emitter, within one [Survey].
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterMeasurements {
    /// Display label (first one encountered)
    pub label: String,
    /// [Measurement]s, in survey order
    pub measurements: Vec<Measurement>,
}

/// Groups the [Survey] observations per [EmitterId].
pub(crate) fn group_by_emitter(survey: &Survey) -> BTreeMap<EmitterId, EmitterMeasurements> {
    survey
        .points()
        .iter()
        .flat_map(|pt| {
            pt.observations.iter().map(move |obs| {
                (
                    obs.emitter.clone(),
                    (
                        obs.label.clone(),
                        Measurement {
                            position: pt.position,
                            signal_dbm: obs.signal_dbm,
                            frequency_mhz: obs.frequency_mhz,
                        },
                    ),
                )
            })
        })
        .into_group_map()
        .into_iter()
        .map(|(id, entries)| {
            let label = entries
                .first()
                .map(|(label, _)| label.clone())
                .unwrap_or_default();
            let measurements = entries.into_iter().map(|(_, m)| m).collect();
            (
                id,
                EmitterMeasurements {
                    label,
                    measurements,
                },
            )
        })
        .collect()
}
