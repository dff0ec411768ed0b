//! Single difference records
use std::collections::{BTreeMap, BTreeSet};

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    align::AlignedObservation,
    prelude::{SatelliteState, SV},
};

/// [SingleDiffRecord] gathers everything a single difference observable
/// needs, for one trusted [SV] at one epoch.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SingleDiffRecord {
    /// Single differenced pseudo range [m]
    pub pseudorange: f64,
    /// Single differenced carrier phase [cycles]
    pub phase: f64,
    /// Always `NaN`: Doppler shifts are only estimated per receiver,
    /// for the position fix.
    pub doppler: f64,
    /// Satellite ECEF position [m]
    pub sv_position: Vector3<f64>,
    /// Satellite ECEF velocity [m/s]
    pub sv_velocity: Vector3<f64>,
    /// SNR [dB.Hz]
    pub snr: f64,
    /// [SV]
    pub sv: SV,
}

impl SingleDiffRecord {
    pub fn new(sv: SV, observation: &AlignedObservation, state: &SatelliteState) -> Self {
        Self {
            sv,
            pseudorange: observation.pseudorange,
            phase: observation.phase,
            doppler: f64::NAN,
            sv_position: state.position,
            sv_velocity: state.velocity,
            snr: observation.snr,
        }
    }

    /// A record without differenced pseudo range cannot
    /// be turned into a single difference observable.
    pub fn is_usable(&self) -> bool {
        !self.pseudorange.is_nan()
    }
}

/// [SingleDiffRecord]s of one epoch
pub type SingleDiffs = BTreeMap<SV, SingleDiffRecord>;

/// Builds this epoch's [SingleDiffs]: one record per trusted [SV].
/// [SV]s that are not trusted, or whose state is unknown, contribute nothing.
pub fn build(
    observations: &BTreeMap<SV, AlignedObservation>,
    states: &BTreeMap<SV, SatelliteState>,
    trusted: &BTreeSet<SV>,
) -> SingleDiffs {
    observations
        .iter()
        .filter(|(sv, _)| trusted.contains(sv))
        .filter_map(|(sv, observation)| {
            let state = states.get(sv)?;
            Some((*sv, SingleDiffRecord::new(*sv, observation, state)))
        })
        .collect()
}
