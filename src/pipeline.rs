//! Single differences and absolute positions, over a complete time frame
use std::collections::BTreeMap;

use log::{debug, info};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    align::{align, AlignedObservation},
    cfg::Config,
    cycle_slip::LockState,
    doppler::PhaseState,
    error::Error,
    navigation::{corrected_pseudoranges, LeastSquares, PositionResolver, PvtSolver},
    observation::{ObservationTable, Receiver},
    prelude::{
        Ephemeris, EphemerisTimeline, Epoch, Kepler, SatelliteState, SatelliteStateProvider, SV,
    },
    sdiff::{self, SingleDiffs},
};

/// State carried from one epoch to the next. Each epoch
/// replaces it entirely, it is never partially updated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpochState {
    /// Lock counters
    pub locks: LockState,
    /// Local carrier phases
    pub local: PhaseState,
    /// Remote carrier phases
    pub remote: PhaseState,
}

/// Products of one epoch
#[derive(Debug, Clone, PartialEq)]
pub struct EpochOutput {
    /// Trusted [SingleDiffs]
    pub sdiffs: SingleDiffs,
    /// Local ECEF position [m], `NaN` when underdetermined
    pub local_ecef: Vector3<f64>,
    /// Remote ECEF position [m], `NaN` when underdetermined
    pub remote_ecef: Vector3<f64>,
}

/// Complete time series produced by the [Pipeline]
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Output {
    /// [SingleDiffs] per epoch
    pub sdiffs: BTreeMap<Epoch, SingleDiffs>,
    /// Local ECEF position [m] per epoch
    pub local_ecef: BTreeMap<Epoch, Vector3<f64>>,
    /// Remote ECEF position [m] per epoch
    pub remote_ecef: BTreeMap<Epoch, Vector3<f64>>,
}

impl Output {
    fn push(&mut self, t: Epoch, epoch: EpochOutput) {
        self.sdiffs.insert(t, epoch.sdiffs);
        self.local_ecef.insert(t, epoch.local_ecef);
        self.remote_ecef.insert(t, epoch.remote_ecef);
    }

    /// Number of epochs
    pub fn len(&self) -> usize {
        self.sdiffs.len()
    }

    /// True when no epoch was produced
    pub fn is_empty(&self) -> bool {
        self.sdiffs.is_empty()
    }
}

/// [Pipeline] turns a local and a remote observation stream, along with
/// broadcast ephemerides, into single differences and absolute positions.
/// Orbit propagation and position solving are delegated to the
/// [SatelliteStateProvider] and [PvtSolver] capabilities.
pub struct Pipeline<P: SatelliteStateProvider, S: PvtSolver> {
    cfg: Config,
    provider: P,
    solver: S,
}

impl Pipeline<Kepler, LeastSquares> {
    /// Builds a [Pipeline] using the built-in [Kepler] propagator
    /// and [LeastSquares] solver.
    pub fn new(cfg: &Config) -> Self {
        Self::with_capabilities(
            cfg,
            Kepler::new(cfg.modeling),
            LeastSquares::new(cfg.solver),
        )
    }
}

impl<P: SatelliteStateProvider, S: PvtSolver> Pipeline<P, S> {
    /// Builds a [Pipeline] with custom capabilities
    pub fn with_capabilities(cfg: &Config, provider: P, solver: S) -> Self {
        Self {
            cfg: cfg.clone(),
            provider,
            solver,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Resolves every observed [SV] state at `t`
    fn satellite_states(
        &self,
        t: Epoch,
        observations: &BTreeMap<SV, AlignedObservation>,
        ephemerides: &BTreeMap<SV, Ephemeris>,
    ) -> Result<BTreeMap<SV, SatelliteState>, Error> {
        let mut states = BTreeMap::new();
        for sv in observations.keys() {
            let eph = ephemerides.get(sv).ok_or(Error::MissingEphemeris(*sv))?;
            let state = self.provider.satellite_state(eph, t)?;
            states.insert(*sv, state);
        }
        Ok(states)
    }

    /// Processes one epoch. `state` is the snapshot left by the previous
    /// epoch, the returned [EpochState] is to be handed to the next one.
    pub fn step(
        &self,
        t: Epoch,
        observations: &BTreeMap<SV, AlignedObservation>,
        ephemerides: &BTreeMap<SV, Ephemeris>,
        state: &EpochState,
    ) -> Result<(EpochOutput, EpochState), Error> {
        let states = self.satellite_states(t, observations, ephemerides)?;

        let (trusted, locks) = state.locks.step(
            t,
            observations
                .iter()
                .map(|(sv, obs)| (*sv, obs.lock1, obs.lock2)),
        );

        let (local_dopplers, local) = state.local.step(
            t,
            observations.iter().map(|(sv, obs)| (*sv, obs.local.phase)),
        );

        let (remote_dopplers, remote) = state.remote.step(
            t,
            observations.iter().map(|(sv, obs)| (*sv, obs.remote.phase)),
        );

        let sdiffs = sdiff::build(observations, &states, &trusted);

        debug!(
            "{} - {}/{} trusted single differences",
            t,
            sdiffs.len(),
            observations.len()
        );

        let resolver = PositionResolver::new(&self.cfg, &self.solver);

        let local_pr = corrected_pseudoranges(
            observations
                .iter()
                .map(|(sv, obs)| (*sv, obs.local.pseudorange)),
            &states,
        );

        let remote_pr = corrected_pseudoranges(
            observations
                .iter()
                .map(|(sv, obs)| (*sv, obs.remote.pseudorange)),
            &states,
        );

        let local_ecef = resolver.resolve(t, &local_pr, &local_dopplers, &states)?;
        let remote_ecef = resolver.resolve(t, &remote_pr, &remote_dopplers, &states)?;

        for (receiver, ecef) in [(Receiver::Local, &local_ecef), (Receiver::Remote, &remote_ecef)] {
            if !ecef[0].is_nan() {
                debug!(
                    "{} ({}) - x={:.3}m y={:.3}m z={:.3}m",
                    t, receiver, ecef[0], ecef[1], ecef[2]
                );
            }
        }

        Ok((
            EpochOutput {
                sdiffs,
                local_ecef,
                remote_ecef,
            },
            EpochState {
                locks,
                local,
                remote,
            },
        ))
    }

    /// Processes the complete time frame, in chronological order.
    /// Either returns complete (possibly `NaN` padded) time series,
    /// or the first [Error] encountered.
    pub fn run(
        &self,
        ephemerides: EphemerisTimeline,
        local: &ObservationTable,
        remote: &ObservationTable,
    ) -> Result<Output, Error> {
        let first_good = ephemerides.first_good();
        let timeline = ephemerides.fill_gaps(&first_good);

        let aligned = align(local, remote, &first_good)?;

        info!(
            "{} aligned epochs, {} satellites with ephemeris",
            aligned.len(),
            first_good.len()
        );

        let (output, _) = aligned.iter().try_fold(
            (Output::default(), EpochState::default()),
            |(mut output, state), (t, observations)| {
                let ephemerides = timeline.as_of(*t)?;
                let (epoch, next) = self.step(*t, observations, ephemerides, &state)?;
                output.push(*t, epoch);
                Ok::<_, Error>((output, next))
            },
        )?;

        Ok(output)
    }
}
