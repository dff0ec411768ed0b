//! Broadcast orbit propagation
use log::{debug, error};
use nalgebra::{Rotation3, Vector3};

use crate::{
    cfg::Modeling,
    constants::{EARTH_ANGULAR_VEL_RAD, EARTH_GRAVITATION_MU_M3_S2, RELATIVISTIC_F},
    error::Error,
    prelude::{Duration, Epoch, Ephemeris, SatelliteState, SatelliteStateProvider, TimeScale},
};

/// Kepler's equation iteration limit
const MAX_KEPLER_ITER: usize = 30;

/// Kepler's equation convergence criteria [rad]
const KEPLER_TOLERANCE_RAD: f64 = 1.0E-12;

/// Half width of the position differentiation window [s]
const VELOCITY_HALF_WINDOW_S: f64 = 0.5;

/// [Kepler] resolves [SatelliteState]s from the broadcast
/// orbital elements, following IS-GPS-200 (table 20-IV).
#[derive(Debug, Clone, Copy, Default)]
pub struct Kepler {
    modeling: Modeling,
}

impl Kepler {
    /// Builds a new [Kepler] propagator with desired [Modeling]
    pub fn new(modeling: Modeling) -> Self {
        Self { modeling }
    }

    /// Solves Kepler's equation and returns ECEF position [m] along
    /// with the eccentric anomaly [rad].
    fn position(&self, eph: &Ephemeris, epoch: Epoch) -> Result<(Vector3<f64>, f64), Error> {
        let e = eph.ecc;
        let a = eph.sqrta.powi(2);
        let t_k = (epoch - eph.toe).to_seconds();

        let n0 = (EARTH_GRAVITATION_MU_M3_S2 / a.powi(3)).sqrt();
        let n = n0 + eph.dn;
        let m_k = eph.m0 + n * t_k;

        let mut e_k = m_k;
        let mut converged = false;

        for _ in 0..MAX_KEPLER_ITER {
            let e_k_next = e_k - (e_k - e * e_k.sin() - m_k) / (1.0 - e * e_k.cos());
            let delta = (e_k_next - e_k).abs();
            e_k = e_k_next;
            if delta < KEPLER_TOLERANCE_RAD {
                converged = true;
                break;
            }
        }

        if !converged {
            error!("{} ({}) - kepler solver in failure", epoch, eph.sv);
            return Err(Error::KeplerSolver(epoch, eph.sv));
        }

        let (sin_e_k, cos_e_k) = e_k.sin_cos();
        let v_k = ((1.0 - e.powi(2)).sqrt() * sin_e_k).atan2(cos_e_k - e);

        let phi_k = v_k + eph.w;
        let (sin_2phi, cos_2phi) = (2.0 * phi_k).sin_cos();

        let u_k = phi_k + eph.cuc * cos_2phi + eph.cus * sin_2phi;
        let r_k = a * (1.0 - e * cos_e_k) + eph.crc * cos_2phi + eph.crs * sin_2phi;
        let i_k = eph.inc + eph.inc_dot * t_k + eph.cic * cos_2phi + eph.cis * sin_2phi;

        let (_, toe_sow) = eph.time_of_ephemeris();
        let omega_k = eph.omega0 + (eph.omegadot - EARTH_ANGULAR_VEL_RAD) * t_k
            - EARTH_ANGULAR_VEL_RAD * toe_sow;

        let orbital_plane = Vector3::new(r_k * u_k.cos(), r_k * u_k.sin(), 0.0);

        // orbital plane to ECEF
        let rot_x3 = Rotation3::from_axis_angle(&Vector3::x_axis(), i_k);
        let rot_z3 = Rotation3::from_axis_angle(&Vector3::z_axis(), omega_k);
        let ecef = rot_z3 * rot_x3 * orbital_plane;

        Ok((ecef, e_k))
    }
}

impl SatelliteStateProvider for Kepler {
    fn satellite_state(&self, eph: &Ephemeris, epoch: Epoch) -> Result<SatelliteState, Error> {
        let epoch = epoch.to_time_scale(TimeScale::GPST);
        let half_window = Duration::from_seconds(VELOCITY_HALF_WINDOW_S);

        let (position, e_k) = self.position(eph, epoch)?;
        let (before, _) = self.position(eph, epoch - half_window)?;
        let (after, _) = self.position(eph, epoch + half_window)?;

        let velocity = (after - before) / (2.0 * VELOCITY_HALF_WINDOW_S);

        let dt = (epoch - eph.toc).to_seconds();

        let mut clock_error = 0.0_f64;
        let mut clock_rate_error = 0.0_f64;

        if self.modeling.sv_clock_bias {
            clock_error += eph.af0 + eph.af1 * dt + eph.af2 * dt.powi(2);
            clock_rate_error += eph.af1 + 2.0 * eph.af2 * dt;
        }

        if self.modeling.sv_total_group_delay && !eph.tgd.is_nan() {
            clock_error -= eph.tgd;
        }

        if self.modeling.relativistic_clock_bias {
            clock_error += RELATIVISTIC_F * eph.ecc * eph.sqrta * e_k.sin();
        }

        debug!(
            "{} ({}) - x={:.3}m y={:.3}m z={:.3}m clock_error={:.3E}s",
            epoch, eph.sv, position[0], position[1], position[2], clock_error
        );

        Ok(SatelliteState {
            position,
            velocity,
            clock_error,
            clock_rate_error,
        })
    }
}
