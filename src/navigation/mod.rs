//! Absolute position resolution
use std::collections::BTreeMap;

use log::debug;
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    cfg::Config,
    constants::{MIN_SV_FIX, SPEED_OF_LIGHT_M_S},
    error::Error,
    prelude::{Epoch, SatelliteState, SV},
};

mod lsq;

pub use lsq::LeastSquares;

/// [NavigationMeasurement] submitted to the [PvtSolver], for one [SV].
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavigationMeasurement {
    /// Raw pseudo range [m]
    pub raw_pseudorange: f64,
    /// Corrected pseudo range [m]
    pub pseudorange: f64,
    /// Raw Doppler shift [cycles/s], see [Self::doppler]
    pub raw_doppler: f64,
    /// Corrected Doppler shift [cycles/s], expressed as the carrier phase
    /// rate dφ/dt: positive when the range to the satellite increases,
    /// so range rate [m/s] = λ.doppler.
    pub doppler: f64,
    /// Satellite ECEF position [m]
    pub sv_position: Vector3<f64>,
    /// Satellite ECEF velocity [m/s]
    pub sv_velocity: Vector3<f64>,
    /// Time of week [s]
    pub tow: f64,
    /// Week number
    pub week: u32,
    /// [SV]
    pub sv: SV,
}

/// [PVTSolution] as resolved by a [PvtSolver]
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PVTSolution {
    /// ECEF position [m]
    pub position: Vector3<f64>,
    /// ECEF velocity [m/s]
    pub velocity: Vector3<f64>,
    /// Receiver clock bias [s]
    pub clock_bias: f64,
    /// Receiver clock drift [s/s]
    pub clock_drift: f64,
    /// [SV]s that contributed
    pub sv: Vec<SV>,
}

/// Any position solver should implement [PvtSolver] to contribute.
/// [LeastSquares] is the built-in implementation.
///
/// [NavigationMeasurement::doppler] follows the carrier phase sign: it is
/// the phase rate and not the receiver Doppler (which has opposite sign).
pub trait PvtSolver {
    /// Resolve a [PVTSolution] from this set of [NavigationMeasurement]s.
    /// Any error is forwarded as is to the caller.
    fn solve(&self, measurements: &[NavigationMeasurement]) -> Result<PVTSolution, Error>;
}

/// Applies the satellite clock error to raw pseudo ranges [m].
/// `NaN` pseudo ranges and [SV]s without state are dropped.
pub fn corrected_pseudoranges<I>(
    pseudoranges: I,
    states: &BTreeMap<SV, SatelliteState>,
) -> BTreeMap<SV, f64>
where
    I: IntoIterator<Item = (SV, f64)>,
{
    pseudoranges
        .into_iter()
        .filter_map(|(sv, pr)| {
            let state = states.get(&sv)?;
            let corrected = pr + state.clock_error * SPEED_OF_LIGHT_M_S;
            if corrected.is_nan() {
                None
            } else {
                Some((sv, corrected))
            }
        })
        .collect()
}

/// [PositionResolver] forms the [NavigationMeasurement]s of one receiver
/// at one epoch and invokes the [PvtSolver], when enough
/// satellites are available.
pub struct PositionResolver<'a, S: PvtSolver> {
    cfg: &'a Config,
    solver: &'a S,
}

impl<'a, S: PvtSolver> PositionResolver<'a, S> {
    pub fn new(cfg: &'a Config, solver: &'a S) -> Self {
        Self { cfg, solver }
    }

    /// Resolves the ECEF position [m] at `t`, from clock corrected `pseudoranges`
    /// and `dopplers`. One measurement is formed per Doppler bearing [SV]
    /// that also has a pseudo range. Returns a `NaN` vector when fewer than
    /// 4 measurements remain, without invoking the solver.
    pub fn resolve(
        &self,
        t: Epoch,
        pseudoranges: &BTreeMap<SV, f64>,
        dopplers: &BTreeMap<SV, f64>,
        states: &BTreeMap<SV, SatelliteState>,
    ) -> Result<Vector3<f64>, Error> {
        let (week, nanos) = t.to_time_scale(self.cfg.timescale).to_time_of_week();
        let tow = nanos as f64 / 1.0E9;

        // the same value is used for raw and corrected observables:
        // no atmospheric correction is modeled at this stage
        let measurements = dopplers
            .iter()
            .filter_map(|(sv, doppler)| {
                let pseudorange = *pseudoranges.get(sv)?;
                let state = states.get(sv)?;
                Some(NavigationMeasurement {
                    raw_pseudorange: pseudorange,
                    pseudorange,
                    raw_doppler: *doppler,
                    doppler: *doppler,
                    sv_position: state.position,
                    sv_velocity: state.velocity,
                    tow,
                    week,
                    sv: *sv,
                })
            })
            .collect::<Vec<_>>();

        if measurements.len() < MIN_SV_FIX {
            debug!(
                "{} - underdetermined fix: {} measurements",
                t,
                measurements.len()
            );
            return Ok(Vector3::from_element(f64::NAN));
        }

        let solution = self.solver.solve(&measurements)?;
        Ok(solution.position)
    }
}
