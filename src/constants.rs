/// Speed of light in m.s⁻¹
pub const SPEED_OF_LIGHT_M_S: f64 = 299792458.0;

/// Earth angular velocity, in WGS84 frame rad/s
pub const EARTH_ANGULAR_VEL_RAD: f64 = 7.2921151467E-5;

/// WGS84 Earth gravitational constant (m^3 s-2)
pub const EARTH_GRAVITATION_MU_M3_S2: f64 = 3.986005E14;

/// Relativistic clock correction constant [s/sqrt(m)]
pub const RELATIVISTIC_F: f64 = -4.442807633E-10;

/// GPS L1 carrier frequency [Hz]
pub const GPS_L1_FREQUENCY_HZ: f64 = 1575.42E6;

/// GPS L1 carrier wavelength [m]
pub const GPS_L1_LAMBDA_M: f64 = SPEED_OF_LIGHT_M_S / GPS_L1_FREQUENCY_HZ;

/// Minimal number of simultaneous range + rate observations
/// for a position fix.
pub const MIN_SV_FIX: usize = 4;
