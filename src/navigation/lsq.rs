//! Iterative least squares PVT solver
use log::{debug, error};
use nalgebra::{DMatrix, DVector, Rotation3, Vector3};

use crate::{
    cfg::SolverOpts,
    constants::{EARTH_ANGULAR_VEL_RAD, GPS_L1_LAMBDA_M, MIN_SV_FIX, SPEED_OF_LIGHT_M_S},
    error::Error,
    navigation::{NavigationMeasurement, PVTSolution, PvtSolver},
};

/// [LeastSquares] Gauss-Newton solver. Resolves the receiver position and
/// clock bias from pseudo ranges, then velocity and clock drift from
/// Doppler shifts, using the converged geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastSquares {
    opts: SolverOpts,
}

impl LeastSquares {
    pub fn new(opts: SolverOpts) -> Self {
        Self { opts }
    }

    /// Satellite position rotated by the Earth rotation during signal propagation
    fn sagnac(&self, sv_position: Vector3<f64>, rx_position: &Vector3<f64>) -> Vector3<f64> {
        if !self.opts.earth_rotation {
            return sv_position;
        }
        let tau = (sv_position - rx_position).norm() / SPEED_OF_LIGHT_M_S;
        let rot = Rotation3::from_axis_angle(&Vector3::z_axis(), -EARTH_ANGULAR_VEL_RAD * tau);
        rot * sv_position
    }

    /// Forms the design matrix and the pseudo range residuals
    /// around current state `x` (x, y, z, c.dt).
    fn linearize(
        &self,
        measurements: &[NavigationMeasurement],
        x: &DVector<f64>,
    ) -> (DMatrix<f64>, DVector<f64>, Vec<Vector3<f64>>) {
        let n = measurements.len();
        let rx = Vector3::new(x[0], x[1], x[2]);

        let mut g = DMatrix::<f64>::zeros(n, 4);
        let mut y = DVector::<f64>::zeros(n);
        let mut los = Vec::with_capacity(n);

        for (i, m) in measurements.iter().enumerate() {
            let sv_position = self.sagnac(m.sv_position, &rx);
            let delta = sv_position - rx;
            let rho = delta.norm();
            let unit = delta / rho;

            g[(i, 0)] = -unit[0];
            g[(i, 1)] = -unit[1];
            g[(i, 2)] = -unit[2];
            g[(i, 3)] = 1.0_f64;

            y[i] = m.pseudorange - rho - x[3];
            los.push(unit);
        }

        (g, y, los)
    }
}

impl PvtSolver for LeastSquares {
    fn solve(&self, measurements: &[NavigationMeasurement]) -> Result<PVTSolution, Error> {
        let n = measurements.len();
        if n < MIN_SV_FIX {
            return Err(Error::NotEnoughMeasurements(n));
        }

        let mut x = DVector::<f64>::zeros(4);

        for iter in 0..self.opts.max_iterations {
            let (g, y, los) = self.linearize(measurements, &x);

            let q = g
                .tr_mul(&g)
                .try_inverse()
                .ok_or(Error::MatrixInversion)?;

            let dx = &q * g.tr_mul(&y);
            x += &dx;

            if dx.norm() > self.opts.convergence_m {
                continue;
            }

            if !x.iter().all(|v| v.is_finite()) {
                error!("pvt solver converged to non finite state");
                return Err(Error::InvalidSolution);
            }

            debug!(
                "pvt solver converged after {} iterations, residual norm={:.3}m",
                iter + 1,
                y.norm()
            );

            // range rate: LOS projection of the relative velocity + c.drift,
            // observed as the carrier phase rate
            let mut y_dot = DVector::<f64>::zeros(n);
            for (i, m) in measurements.iter().enumerate() {
                let range_rate = GPS_L1_LAMBDA_M * m.doppler;
                y_dot[i] = range_rate - los[i].dot(&m.sv_velocity);
            }

            let v = &q * g.tr_mul(&y_dot);

            return Ok(PVTSolution {
                position: Vector3::new(x[0], x[1], x[2]),
                velocity: Vector3::new(v[0], v[1], v[2]),
                clock_bias: x[3] / SPEED_OF_LIGHT_M_S,
                clock_drift: v[3] / SPEED_OF_LIGHT_M_S,
                sv: measurements.iter().map(|m| m.sv).collect(),
            });
        }

        error!("pvt solver did not converge");
        Err(Error::PvtDivergence)
    }
}
