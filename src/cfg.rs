#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::prelude::TimeScale;

fn default_timescale() -> TimeScale {
    TimeScale::GPST
}

fn default_max_iterations() -> usize {
    20
}

fn default_convergence_m() -> f64 {
    1.0E-4
}

fn default_earth_rotation() -> bool {
    true
}

fn default_sv_clock() -> bool {
    true
}

fn default_sv_tgd() -> bool {
    true
}

fn default_relativistic_clock_bias() -> bool {
    true
}

/// Options of the built-in least squares [PvtSolver](crate::prelude::PvtSolver).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverOpts {
    /// Maximal number of Gauss-Newton iterations
    #[cfg_attr(feature = "serde", serde(default = "default_max_iterations"))]
    pub max_iterations: usize,
    /// Iteration stops once the state correction norm falls below this value [m]
    #[cfg_attr(feature = "serde", serde(default = "default_convergence_m"))]
    pub convergence_m: f64,
    /// Compensate Earth rotation during signal propagation (Sagnac effect)
    #[cfg_attr(feature = "serde", serde(default = "default_earth_rotation"))]
    pub earth_rotation: bool,
}

impl Default for SolverOpts {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            convergence_m: default_convergence_m(),
            earth_rotation: default_earth_rotation(),
        }
    }
}

/// Physical effects modeled by the built-in satellite state provider.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Modeling {
    /// Satellite clock polynomial (af0, af1, af2)
    #[cfg_attr(feature = "serde", serde(default = "default_sv_clock"))]
    pub sv_clock_bias: bool,
    /// Satellite total group delay
    #[cfg_attr(feature = "serde", serde(default = "default_sv_tgd"))]
    pub sv_total_group_delay: bool,
    /// Relativistic clock correction due to orbit eccentricity
    #[cfg_attr(feature = "serde", serde(default = "default_relativistic_clock_bias"))]
    pub relativistic_clock_bias: bool,
}

impl Default for Modeling {
    fn default() -> Self {
        Self {
            sv_clock_bias: default_sv_clock(),
            sv_total_group_delay: default_sv_tgd(),
            relativistic_clock_bias: default_relativistic_clock_bias(),
        }
    }
}

/// Processing [Config]uration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Time scale in which week number and time of week
    /// are expressed when forming measurements.
    #[cfg_attr(feature = "serde", serde(default = "default_timescale"))]
    pub timescale: TimeScale,
    /// Least squares solver options
    #[cfg_attr(feature = "serde", serde(default))]
    pub solver: SolverOpts,
    /// Satellite state modeling
    #[cfg_attr(feature = "serde", serde(default))]
    pub modeling: Modeling,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timescale: default_timescale(),
            solver: SolverOpts::default(),
            modeling: Modeling::default(),
        }
    }
}

impl Config {
    /// Copies and returns [Config] with updated [SolverOpts]
    pub fn with_solver_opts(&self, solver: SolverOpts) -> Self {
        let mut s = self.clone();
        s.solver = solver;
        s
    }

    /// Copies and returns [Config] with updated [Modeling]
    pub fn with_modeling(&self, modeling: Modeling) -> Self {
        let mut s = self.clone();
        s.modeling = modeling;
        s
    }
}
