mod pipeline;

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use log::LevelFilter;
use std::sync::Once;

use crate::prelude::{
    Constellation, Ephemeris, Epoch, Error, NavigationMeasurement, ObservationTable, PVTSolution,
    PvtSolver, RawObservation, SatelliteState, SatelliteStateProvider, Vector3, SV,
};

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::builder()
            .is_test(true)
            .filter_level(LevelFilter::Debug)
            .init();
    });
}

pub const G01: SV = SV {
    constellation: Constellation::GPS,
    prn: 1,
};
pub const G02: SV = SV {
    constellation: Constellation::GPS,
    prn: 2,
};
pub const G03: SV = SV {
    constellation: Constellation::GPS,
    prn: 3,
};
pub const G04: SV = SV {
    constellation: Constellation::GPS,
    prn: 4,
};
pub const G05: SV = SV {
    constellation: Constellation::GPS,
    prn: 5,
};
pub const G06: SV = SV {
    constellation: Constellation::GPS,
    prn: 6,
};

/// Realistic GPS [Ephemeris] frame published at `toe`,
/// orbital plane and phase depend on the PRN.
pub fn gps_ephemeris(sv: SV, toe: Epoch) -> Ephemeris {
    let k = sv.prn as f64;
    Ephemeris {
        sv,
        tgd: -1.1E-8,
        crs: -1.5E1,
        crc: 2.3E2,
        cuc: -8.0E-7,
        cus: 6.5E-6,
        cic: 1.2E-7,
        cis: -5.0E-8,
        dn: 4.5E-9,
        m0: 0.9 * k,
        ecc: 1.0E-2,
        sqrta: 5153.6,
        omega0: 1.2 * k,
        omegadot: -8.0E-9,
        w: 0.7,
        inc: 0.96,
        inc_dot: 1.0E-10,
        af0: 1.0E-5 * k,
        af1: 1.0E-12,
        af2: 0.0,
        toe,
        toc: toe,
        valid: true,
        healthy: true,
    }
}

/// [SatelliteStateProvider] returning a fixed state per [SV]:
/// no orbit propagation, no clock error.
#[derive(Debug, Default)]
pub struct StaticStates {}

impl SatelliteStateProvider for StaticStates {
    fn satellite_state(&self, eph: &Ephemeris, _: Epoch) -> Result<SatelliteState, Error> {
        let k = eph.sv.prn as f64;
        Ok(SatelliteState {
            position: Vector3::new(2.0E7 + k, 1.0E7 * k.cos(), 1.0E7 * k.sin()),
            velocity: Vector3::new(0.0, 3.0E3, 0.0),
            clock_error: 0.0,
            clock_rate_error: 0.0,
        })
    }
}

/// [PvtSolver] that returns a fixed position and
/// records the measurements it was handed.
#[derive(Debug, Default)]
pub struct FixedSolver {
    pub position: Vector3<f64>,
    pub calls: Cell<usize>,
    pub last_size: Cell<usize>,
    /// Every measurement handed over, shared with the test body
    pub history: Rc<RefCell<Vec<NavigationMeasurement>>>,
}

impl FixedSolver {
    pub fn new(position: Vector3<f64>) -> Self {
        Self {
            position,
            calls: Cell::new(0),
            last_size: Cell::new(0),
            history: Default::default(),
        }
    }
}

impl PvtSolver for FixedSolver {
    fn solve(&self, measurements: &[NavigationMeasurement]) -> Result<PVTSolution, Error> {
        self.calls.set(self.calls.get() + 1);
        self.last_size.set(measurements.len());
        self.history.borrow_mut().extend_from_slice(measurements);
        Ok(PVTSolution {
            position: self.position,
            sv: measurements.iter().map(|m| m.sv).collect(),
            ..Default::default()
        })
    }
}

/// [PvtSolver] that always fails
#[derive(Debug, Default)]
pub struct FailingSolver {}

impl PvtSolver for FailingSolver {
    fn solve(&self, _: &[NavigationMeasurement]) -> Result<PVTSolution, Error> {
        Err(Error::PvtDivergence)
    }
}

/// Builds an [ObservationTable] from (epoch, sv, observation) tuples
pub fn observation_table<I>(content: I) -> ObservationTable
where
    I: IntoIterator<Item = (Epoch, SV, RawObservation)>,
{
    let mut table = ObservationTable::new();
    for (t, sv, obs) in content {
        table
            .entry(t)
            .or_insert_with(BTreeMap::new)
            .insert(sv, obs);
    }
    table
}
