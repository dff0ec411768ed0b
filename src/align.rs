//! Local / remote observations alignment
use std::collections::BTreeMap;

use itertools::{EitherOrBoth, Itertools};
use log::{error, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    observation::{ObservationTable, RawObservation},
    prelude::{Ephemeris, Epoch, SV},
};

/// [AlignedObservation] joins the observations of one [SV]
/// by both receivers at one [Epoch].
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlignedObservation {
    /// Single differenced pseudo range (remote - local) [m]
    pub pseudorange: f64,
    /// Single differenced carrier phase (remote - local) [cycles]
    pub phase: f64,
    /// Weakest SNR of both legs [dB.Hz]
    pub snr: f64,
    /// Local lock counter
    pub lock1: f64,
    /// Remote lock counter
    pub lock2: f64,
    /// Local [RawObservation]
    pub local: RawObservation,
    /// Remote [RawObservation]
    pub remote: RawObservation,
}

impl AlignedObservation {
    /// Forms the single difference precursor from both legs. A leg that
    /// was not observed is `NaN` and propagates to the differenced fields.
    pub fn new(local: RawObservation, remote: RawObservation) -> Self {
        Self {
            pseudorange: remote.pseudorange - local.pseudorange,
            phase: remote.phase - local.phase,
            snr: if local.snr.is_nan() || remote.snr.is_nan() {
                f64::NAN
            } else {
                local.snr.min(remote.snr)
            },
            lock1: local.lock,
            lock2: remote.lock,
            local,
            remote,
        }
    }
}

/// Time indexed [AlignedObservation]s
pub type AlignedTable = BTreeMap<Epoch, BTreeMap<SV, AlignedObservation>>;

/// Aligns one epoch. Also returns whether at least one [SV]
/// was observed by both receivers.
fn align_epoch(
    t: &Epoch,
    local: &BTreeMap<SV, RawObservation>,
    remote: &BTreeMap<SV, RawObservation>,
    ephemerides: &BTreeMap<SV, Ephemeris>,
) -> Result<(BTreeMap<SV, AlignedObservation>, bool), Error> {
    let mut aligned = BTreeMap::new();
    let mut common = false;

    for pair in local
        .iter()
        .merge_join_by(remote.iter(), |(sv_a, _), (sv_b, _)| sv_a.cmp(sv_b))
    {
        let (sv, local, remote) = match pair {
            EitherOrBoth::Both((sv, local), (_, remote)) => (*sv, *local, *remote),
            EitherOrBoth::Left((sv, local)) => (*sv, *local, RawObservation::default()),
            EitherOrBoth::Right((sv, remote)) => (*sv, RawObservation::default(), *remote),
        };

        if !local.has_data() && !remote.has_data() {
            continue;
        }

        if !ephemerides.contains_key(&sv) {
            error!("{} ({}) - observed but never broadcast", t, sv);
            return Err(Error::MissingEphemeris(sv));
        }

        common |= local.has_data() && remote.has_data();
        aligned.insert(sv, AlignedObservation::new(local, remote));
    }

    Ok((aligned, common))
}

/// Outer joins `local` and `remote` observations on ([Epoch], [SV]).
/// `ephemerides` is the set of first valid frames per [SV]: observing an
/// [SV] that is not part of it is a fatal [Error::MissingEphemeris].
/// Epochs without any [SV] observed by both receivers are dropped.
pub fn align(
    local: &ObservationTable,
    remote: &ObservationTable,
    ephemerides: &BTreeMap<SV, Ephemeris>,
) -> Result<AlignedTable, Error> {
    let empty = BTreeMap::<SV, RawObservation>::new();
    let mut table = AlignedTable::new();

    for pair in local
        .iter()
        .merge_join_by(remote.iter(), |(t_a, _), (t_b, _)| t_a.cmp(t_b))
    {
        let (t, local, remote) = match pair {
            EitherOrBoth::Both((t, local), (_, remote)) => (t, local, remote),
            EitherOrBoth::Left((t, local)) => (t, local, &empty),
            EitherOrBoth::Right((t, remote)) => (t, &empty, remote),
        };

        let (aligned, common) = align_epoch(t, local, remote, ephemerides)?;

        if !common {
            warn!("{} - no satellite in common: epoch dropped", t);
            continue;
        }

        table.insert(*t, aligned);
    }

    Ok(table)
}
