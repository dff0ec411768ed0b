use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    prelude::{Epoch, SV},
};

mod kepler;
mod timeline;

pub use kepler::Kepler;
pub use timeline::EphemerisTimeline;

/// Broadcast [Ephemeris] frame, describing one satellite
/// orbit and clock over its validity window.
///
/// A frame that was not broadcast (yet) is marked by a `NaN` `af0`,
/// see [Ephemeris::is_missing].
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ephemeris {
    /// [SV]
    pub sv: SV,

    /// Total group delay [s]
    pub tgd: f64,

    /// Radius harmonic correction terms (sine, cosine) [m]
    pub crs: f64,
    pub crc: f64,

    /// Argument of latitude harmonic correction terms (cosine, sine) [rad]
    pub cuc: f64,
    pub cus: f64,

    /// Inclination harmonic correction terms (cosine, sine) [rad]
    pub cic: f64,
    pub cis: f64,

    /// Mean motion difference [rad/s]
    pub dn: f64,

    /// Mean anomaly at reference time [rad]
    pub m0: f64,

    /// Eccentricity
    pub ecc: f64,

    /// Square root of the semi-major axis [sqrt(m)]
    pub sqrta: f64,

    /// Longitude of ascending node at weekly epoch [rad]
    pub omega0: f64,

    /// Rate of right ascension [rad/s]
    pub omegadot: f64,

    /// Argument of perigee [rad]
    pub w: f64,

    /// Inclination at reference time [rad]
    pub inc: f64,

    /// Rate of inclination [rad/s]
    pub inc_dot: f64,

    /// Clock bias [s]
    pub af0: f64,

    /// Clock drift [s/s]
    pub af1: f64,

    /// Clock drift rate [s/s²]
    pub af2: f64,

    /// Time of Ephemeris, expressed in GPST
    pub toe: Epoch,

    /// Time of Clock, expressed in GPST
    pub toc: Epoch,

    /// Frame passed its parity checks
    pub valid: bool,

    /// Satellite declared itself healthy
    pub healthy: bool,
}

impl Ephemeris {
    /// Builds an [Ephemeris] placeholder for a frame that
    /// was not broadcast at this point in time.
    pub fn missing(sv: SV) -> Self {
        Self {
            sv,
            tgd: f64::NAN,
            crs: f64::NAN,
            crc: f64::NAN,
            cuc: f64::NAN,
            cus: f64::NAN,
            cic: f64::NAN,
            cis: f64::NAN,
            dn: f64::NAN,
            m0: f64::NAN,
            ecc: f64::NAN,
            sqrta: f64::NAN,
            omega0: f64::NAN,
            omegadot: f64::NAN,
            w: f64::NAN,
            inc: f64::NAN,
            inc_dot: f64::NAN,
            af0: f64::NAN,
            af1: f64::NAN,
            af2: f64::NAN,
            toe: Epoch::default(),
            toc: Epoch::default(),
            valid: false,
            healthy: false,
        }
    }

    /// True when this frame was not broadcast (`af0` is `NaN`)
    pub fn is_missing(&self) -> bool {
        self.af0.is_nan()
    }

    /// Returns Time of Ephemeris as (week number, seconds of week)
    pub fn time_of_ephemeris(&self) -> (u32, f64) {
        let (week, nanos) = self.toe.to_time_of_week();
        (week, nanos as f64 / 1.0E9)
    }

    /// Returns Time of Clock as (week number, seconds of week)
    pub fn time_of_clock(&self) -> (u32, f64) {
        let (week, nanos) = self.toc.to_time_of_week();
        (week, nanos as f64 / 1.0E9)
    }
}

/// [SatelliteState] as resolved from one [Ephemeris] at a given [Epoch].
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteState {
    /// ECEF position [m]
    pub position: Vector3<f64>,
    /// ECEF velocity [m/s]
    pub velocity: Vector3<f64>,
    /// Clock error [s]
    pub clock_error: f64,
    /// Clock rate error [s/s]
    pub clock_rate_error: f64,
}

/// Any orbit propagator should implement [SatelliteStateProvider]
/// to turn broadcast [Ephemeris] frames into [SatelliteState]s.
///
/// The pipeline is fully synchronous and requests states in chronological order.
/// [Kepler] is the built-in implementation.
pub trait SatelliteStateProvider {
    /// Resolve the [SatelliteState] described by this [Ephemeris] at `epoch`.
    fn satellite_state(&self, ephemeris: &Ephemeris, epoch: Epoch)
        -> Result<SatelliteState, Error>;
}
