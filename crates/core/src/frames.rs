//! Frame transformations: ECI/ECEF, WGS-84 geodetic, ecliptic, and RIC.

use serde::Serialize;

use crate::state::StateVector;
use crate::time;
use crate::vector::{self, Vector3};

/// Earth sidereal rotation rate [rad/s].
pub const EARTH_ROTATION_RATE: f64 = 7.292_115_9e-5;

/// WGS-84 semi-major axis [m].
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS-84 first eccentricity squared.
pub const WGS84_E2: f64 = 6.694_379_990_14e-3;

/// Obliquity of the ecliptic at J2000 [rad].
pub const OBLIQUITY_J2000_RAD: f64 = 23.439_291_1 * std::f64::consts::PI / 180.0;

const TWO_PI: f64 = 2.0 * std::f64::consts::PI;

/// Rotate an ECI position into ECEF at the given Julian Date.
///
/// Rotation about z by GMST; ECEF co-rotates with the Earth.
pub fn eci_to_ecef(pos_eci: &Vector3, jd: f64) -> Vector3 {
    let gmst = time::gmst(jd);
    let (sin_g, cos_g) = gmst.sin_cos();
    [
        cos_g * pos_eci[0] + sin_g * pos_eci[1],
        -sin_g * pos_eci[0] + cos_g * pos_eci[1],
        pos_eci[2],
    ]
}

/// Rotate an ECEF position back into ECI at the given Julian Date.
pub fn ecef_to_eci(pos_ecef: &Vector3, jd: f64) -> Vector3 {
    let gmst = time::gmst(jd);
    let (sin_g, cos_g) = gmst.sin_cos();
    [
        cos_g * pos_ecef[0] - sin_g * pos_ecef[1],
        sin_g * pos_ecef[0] + cos_g * pos_ecef[1],
        pos_ecef[2],
    ]
}

/// Velocity relative to the rotating Earth, evaluated in ECI axes.
///
/// v_rel = v − ω⊕ × r with ω⊕ along +z. This is the airspeed seen by drag
/// models and launch vehicles.
pub fn earth_relative_velocity(pos_eci: &Vector3, vel_eci: &Vector3) -> Vector3 {
    [
        vel_eci[0] + EARTH_ROTATION_RATE * pos_eci[1],
        vel_eci[1] - EARTH_ROTATION_RATE * pos_eci[0],
        vel_eci[2],
    ]
}

/// Rotate heliocentric ecliptic coordinates into J2000 equatorial.
pub fn ecliptic_to_equatorial(v_ecl: &Vector3) -> Vector3 {
    let (sin_e, cos_e) = OBLIQUITY_J2000_RAD.sin_cos();
    [
        v_ecl[0],
        v_ecl[1] * cos_e - v_ecl[2] * sin_e,
        v_ecl[1] * sin_e + v_ecl[2] * cos_e,
    ]
}

/// Rotate J2000 equatorial coordinates into the ecliptic frame.
pub fn equatorial_to_ecliptic(v_eq: &Vector3) -> Vector3 {
    let (sin_e, cos_e) = OBLIQUITY_J2000_RAD.sin_cos();
    [
        v_eq[0],
        v_eq[1] * cos_e + v_eq[2] * sin_e,
        -v_eq[1] * sin_e + v_eq[2] * cos_e,
    ]
}

/// Geodetic coordinates on the WGS-84 ellipsoid.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GeodeticCoord {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

/// Closed-form geodetic → ECEF conversion.
pub fn geodetic_to_ecef(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Vector3 {
    let lat = latitude_deg.to_radians();
    let lon = longitude_deg.to_radians();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();

    // Radius of curvature in the prime vertical.
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    [
        (n + altitude_m) * cos_lat * cos_lon,
        (n + altitude_m) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + altitude_m) * sin_lat,
    ]
}

/// ECEF → geodetic conversion by Bowring's iteration.
pub fn ecef_to_geodetic(pos_ecef: &Vector3) -> GeodeticCoord {
    let x = pos_ecef[0];
    let y = pos_ecef[1];
    let z = pos_ecef[2];

    let lon = y.atan2(x);
    let p = (x * x + y * y).sqrt();

    // Spherical first guess, then iterate; converges in 2-3 passes.
    let mut lat = z.atan2(p * (1.0 - WGS84_E2));
    for _ in 0..10 {
        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let lat_new = (z + WGS84_E2 * n * sin_lat).atan2(p);
        if (lat_new - lat).abs() < 1.0e-12 {
            lat = lat_new;
            break;
        }
        lat = lat_new;
    }

    let (sin_lat, cos_lat) = lat.sin_cos();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let alt = if cos_lat.abs() > 1.0e-10 {
        p / cos_lat - n
    } else {
        // Near the poles p/cos(lat) is ill-conditioned; use the z component.
        z.abs() / sin_lat.abs() - n * (1.0 - WGS84_E2)
    };

    GeodeticCoord {
        latitude_deg: lat.to_degrees(),
        longitude_deg: lon.to_degrees(),
        altitude_m: alt,
    }
}

/// ECI position → geodetic coordinates at the given Julian Date.
pub fn eci_to_geodetic(pos_eci: &Vector3, jd: f64) -> GeodeticCoord {
    ecef_to_geodetic(&eci_to_ecef(pos_eci, jd))
}

/// Radial / In-track / Cross-track axes of a reference orbit state.
#[derive(Debug, Clone, Copy)]
pub struct RicFrame {
    pub r_hat: Vector3,
    pub i_hat: Vector3,
    pub c_hat: Vector3,
}

impl RicFrame {
    /// Build the RIC frame of a reference state.
    ///
    /// Returns `None` for degenerate geometry (zero radius or zero angular
    /// momentum), where the frame axes are undefined.
    pub fn from_state(reference: &StateVector) -> Option<Self> {
        let r_hat = vector::normalize(&reference.position_m)?;
        let h = vector::cross(&reference.position_m, &reference.velocity_m_s);
        let c_hat = vector::normalize(&h)?;
        let i_hat = vector::cross(&c_hat, &r_hat);
        Some(Self { r_hat, i_hat, c_hat })
    }

    /// Rotate an ECI vector into this RIC frame.
    pub fn to_ric(&self, v_eci: &Vector3) -> Vector3 {
        [
            vector::dot(v_eci, &self.r_hat),
            vector::dot(v_eci, &self.i_hat),
            vector::dot(v_eci, &self.c_hat),
        ]
    }

    /// Rotate a RIC vector back into ECI.
    pub fn to_eci(&self, v_ric: &Vector3) -> Vector3 {
        [
            v_ric[0] * self.r_hat[0] + v_ric[1] * self.i_hat[0] + v_ric[2] * self.c_hat[0],
            v_ric[0] * self.r_hat[1] + v_ric[1] * self.i_hat[1] + v_ric[2] * self.c_hat[1],
            v_ric[0] * self.r_hat[2] + v_ric[1] * self.i_hat[2] + v_ric[2] * self.c_hat[2],
        ]
    }
}

/// Chase position relative to the target, expressed in the target's RIC frame.
pub fn relative_position_ric(chase: &StateVector, target: &StateVector) -> Option<Vector3> {
    let frame = RicFrame::from_state(target)?;
    let rel = vector::sub(&chase.position_m, &target.position_m);
    Some(frame.to_ric(&rel))
}

/// Chase velocity relative to the target in the target's rotating RIC frame.
///
/// v_rotating = v_inertial − ω × r with ω = n ĉ, n the target mean motion.
pub fn relative_velocity_ric(
    chase: &StateVector,
    target: &StateVector,
    mean_motion_rad_s: f64,
) -> Option<Vector3> {
    let frame = RicFrame::from_state(target)?;
    let rel_v = vector::sub(&chase.velocity_m_s, &target.velocity_m_s);
    let v_inertial = frame.to_ric(&rel_v);
    let r_ric = relative_position_ric(chase, target)?;

    // ω = (0, 0, n) in RIC axes, so ω × r = (−n·I, n·R, 0).
    Some([
        v_inertial[0] + mean_motion_rad_s * r_ric[1],
        v_inertial[1] - mean_motion_rad_s * r_ric[0],
        v_inertial[2],
    ])
}

/// Straight-line range between two states [m].
pub fn range(chase: &StateVector, target: &StateVector) -> f64 {
    vector::norm(&vector::sub(&chase.position_m, &target.position_m))
}

/// Range rate (r̂ · Δv) between two states [m/s].
pub fn range_rate(chase: &StateVector, target: &StateVector) -> f64 {
    let rel_pos = vector::sub(&chase.position_m, &target.position_m);
    let rel_vel = vector::sub(&chase.velocity_m_s, &target.velocity_m_s);
    let r = vector::norm(&rel_pos);
    if r < 1.0e-10 {
        return 0.0;
    }
    vector::dot(&rel_pos, &rel_vel) / r
}

/// Normalize an angle to [0, 2π).
#[inline]
pub fn wrap_two_pi(angle_rad: f64) -> f64 {
    angle_rad.rem_euclid(TWO_PI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CoordinateFrame;

    #[test]
    fn eci_ecef_round_trip_is_identity() {
        let jd = time::J2000_JD + 1234.567;
        let pos = [6_778_137.0, -2_100_000.0, 1_500_000.0];
        let back = ecef_to_eci(&eci_to_ecef(&pos, jd), jd);
        for i in 0..3 {
            assert!((back[i] - pos[i]).abs() < 1.0e-6);
        }
    }

    #[test]
    fn geodetic_round_trip() {
        let ecef = geodetic_to_ecef(28.5, -80.6, 12.0);
        let geo = ecef_to_geodetic(&ecef);
        assert!((geo.latitude_deg - 28.5).abs() < 1.0e-9);
        assert!((geo.longitude_deg + 80.6).abs() < 1.0e-9);
        assert!((geo.altitude_m - 12.0).abs() < 1.0e-6);
    }

    #[test]
    fn ric_frame_is_orthonormal() {
        let state = StateVector::from_rv(
            [7.0e6, 0.0, 0.0],
            [0.0, 7500.0, 100.0],
            0.0,
            CoordinateFrame::J2000Eci,
        );
        let frame = RicFrame::from_state(&state).unwrap();
        assert!((vector::norm(&frame.r_hat) - 1.0).abs() < 1.0e-12);
        assert!((vector::norm(&frame.i_hat) - 1.0).abs() < 1.0e-12);
        assert!(vector::dot(&frame.r_hat, &frame.c_hat).abs() < 1.0e-12);
        assert!(vector::dot(&frame.r_hat, &frame.i_hat).abs() < 1.0e-12);
    }

    #[test]
    fn ric_frame_rejects_degenerate_states() {
        let state = StateVector::default();
        assert!(RicFrame::from_state(&state).is_none());
    }
}
