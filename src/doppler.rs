//! Doppler estimation from carrier phase rate
use std::collections::BTreeMap;

use crate::prelude::{Epoch, SV};

/// [PhaseState] is the immutable snapshot of carrier phases
/// observed by one receiver at the previous epoch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseState {
    /// Previous [Epoch], `None` prior the first epoch
    epoch: Option<Epoch>,
    /// Previous carrier phases [cycles]
    phases: BTreeMap<SV, f64>,
}

impl PhaseState {
    /// Previous [Epoch]
    pub fn epoch(&self) -> Option<Epoch> {
        self.epoch
    }

    /// Previous carrier phase of this [SV]
    pub fn phase(&self, sv: &SV) -> Option<f64> {
        self.phases.get(sv).copied()
    }

    /// Differentiates this epoch's carrier phases [cycles] against Self.
    /// Returns the Doppler shifts [cycles/s] of the [SV]s that were observed at
    /// both epochs, along with the next [PhaseState]. `NaN` phases are not
    /// carried to the next state.
    pub fn step<I>(&self, t: Epoch, phases: I) -> (BTreeMap<SV, f64>, Self)
    where
        I: IntoIterator<Item = (SV, f64)>,
    {
        let mut dopplers = BTreeMap::new();
        let mut next = BTreeMap::new();

        let dt = self.epoch.map(|prev| (t - prev).to_seconds());

        for (sv, phase) in phases {
            if phase.is_nan() {
                continue;
            }

            next.insert(sv, phase);

            if let (Some(dt), Some(prev)) = (dt, self.phases.get(&sv)) {
                dopplers.insert(sv, (phase - prev) / dt);
            }
        }

        (
            dopplers,
            Self {
                epoch: Some(t),
                phases: next,
            },
        )
    }
}
