use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::prelude::{Epoch, SV};

/// One of the two receivers being differenced
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Receiver {
    /// Local (rover) receiver
    Local,
    /// Remote (base) receiver
    Remote,
}

impl std::fmt::Display for Receiver {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// [RawObservation] of one [SV] by one [Receiver] at one [Epoch].
/// Fields that were not reported are `NaN`.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawObservation {
    /// L1 pseudo range (C1) [m]
    pub pseudorange: f64,
    /// L1 carrier phase (L1) [cycles]
    pub phase: f64,
    /// Signal to noise ratio [dB.Hz]
    pub snr: f64,
    /// Phase lock counter of the tracking loop
    pub lock: f64,
}

impl Default for RawObservation {
    fn default() -> Self {
        Self {
            pseudorange: f64::NAN,
            phase: f64::NAN,
            snr: f64::NAN,
            lock: f64::NAN,
        }
    }
}

impl RawObservation {
    /// Builds a complete [RawObservation]
    pub fn new(pseudorange: f64, phase: f64, snr: f64, lock: f64) -> Self {
        Self {
            pseudorange,
            phase,
            snr,
            lock,
        }
    }

    /// True when at least one field was reported
    pub fn has_data(&self) -> bool {
        !(self.pseudorange.is_nan()
            && self.phase.is_nan()
            && self.snr.is_nan()
            && self.lock.is_nan())
    }
}

/// Time indexed observations of one [Receiver]
pub type ObservationTable = BTreeMap<Epoch, BTreeMap<SV, RawObservation>>;
