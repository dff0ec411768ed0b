use thiserror::Error;

use crate::prelude::{Epoch, SV};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A satellite was observed but no [Ephemeris](crate::prelude::Ephemeris)
    /// was ever broadcast for it, not even after gap filling.
    /// The dataset is inconsistent and processing is aborted.
    #[error("{0} is observed but has no ephemeris")]
    MissingEphemeris(SV),

    /// The ephemeris timeline does not contain a single epoch.
    #[error("empty ephemeris timeline")]
    EmptyEphemerisTimeline,

    /// Kepler's equation did not converge, usually due to a corrupt
    /// or degenerate ephemeris frame.
    #[error("{0} ({1}) - kepler solver in failure")]
    KeplerSolver(Epoch, SV),

    /// The PVT solver was handed fewer measurements than unknowns.
    #[error("not enough measurements ({0}) to resolve")]
    NotEnoughMeasurements(usize),

    /// Invalid orbital states or bad signal data may cause the algebric
    /// calculations to wind up here.
    #[error("failed to invert matrix")]
    MatrixInversion,

    /// Iterative solver did not converge within the iteration limit.
    #[error("pvt solver did not converge")]
    PvtDivergence,

    /// Solver converged to a non finite state.
    #[error("converged to physically invalid state")]
    InvalidSolution,

    /// Requested key does not exist in the store.
    #[error("missing \"{0}\" in store")]
    MissingArtifact(String),

    /// Stored artifact does not have the expected kind.
    #[error("\"{0}\" has unexpected content")]
    InvalidArtifact(String),
}
