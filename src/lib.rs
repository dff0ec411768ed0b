#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

extern crate gnss_rs as gnss;

// private modules
mod align;
mod cfg;
mod constants;
mod cycle_slip;
mod doppler;
mod ephemeris;
mod error;
mod inspection;
mod navigation;
mod observation;
mod pipeline;
mod sdiff;
mod store;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::align::{align, AlignedObservation, AlignedTable};
    pub use crate::cfg::{Config, Modeling, SolverOpts};
    pub use crate::constants::SPEED_OF_LIGHT_M_S;
    pub use crate::cycle_slip::{LockRecord, LockState};
    pub use crate::doppler::PhaseState;
    pub use crate::ephemeris::{
        Ephemeris, EphemerisTimeline, Kepler, SatelliteState, SatelliteStateProvider,
    };
    pub use crate::error::Error;
    pub use crate::inspection::{AmbiguityFilter, FilterReport, FilterSnapshot};
    pub use crate::navigation::{
        corrected_pseudoranges, LeastSquares, NavigationMeasurement, PVTSolution,
        PositionResolver, PvtSolver,
    };
    pub use crate::observation::{ObservationTable, RawObservation, Receiver};
    pub use crate::pipeline::{EpochOutput, EpochState, Output, Pipeline};
    pub use crate::sdiff::{SingleDiffRecord, SingleDiffs};
    pub use crate::store::{load_or_compute, Artifact, MemoryStore, Store, StoreKeys};
    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
    pub use nalgebra::Vector3;
}

// pub export
pub use error::Error;
