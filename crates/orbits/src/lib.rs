//! Keplerian orbital mechanics: element/state conversions and anomalies.

use serde::Serialize;

use traj_core::state::{CoordinateFrame, StateVector};
use traj_core::vector::{self, Vector3};

const PI: f64 = std::f64::consts::PI;
const TWO_PI: f64 = 2.0 * PI;

/// Threshold below which the node or eccentricity vector is treated as
/// degenerate and the fallback angle conventions apply. Near this value the
/// returned angles migrate smoothly into the fallback parameterization; the
/// element set stays a valid description of the orbit either way.
const DEGENERACY_THRESHOLD: f64 = 1.0e-10;

/// Classical Keplerian element set, with the mean anomaly stored redundantly.
///
/// Elliptic orbits have a > 0 and 0 ≤ e < 1; hyperbolic orbits a < 0 and
/// e > 1. Angles in radians.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OrbitalElements {
    pub semi_major_axis_m: f64,
    pub eccentricity: f64,
    pub inclination_rad: f64,
    pub raan_rad: f64,
    pub arg_periapsis_rad: f64,
    pub true_anomaly_rad: f64,
    pub mean_anomaly_rad: f64,
}

impl OrbitalElements {
    /// Periapsis radius a(1 − e) [m].
    pub fn periapsis_m(&self) -> f64 {
        self.semi_major_axis_m * (1.0 - self.eccentricity)
    }

    /// Apoapsis radius a(1 + e) [m].
    pub fn apoapsis_m(&self) -> f64 {
        self.semi_major_axis_m * (1.0 + self.eccentricity)
    }

    /// Orbital period 2π√(a³/μ) [s].
    pub fn period_s(&self, mu_m3_s2: f64) -> f64 {
        TWO_PI * (self.semi_major_axis_m.powi(3) / mu_m3_s2).sqrt()
    }

    /// Mean motion √(μ/a³) [rad/s].
    pub fn mean_motion_rad_s(&self, mu_m3_s2: f64) -> f64 {
        (mu_m3_s2 / self.semi_major_axis_m.powi(3)).sqrt()
    }
}

/// Circular orbit speed √(μ/r) [m/s].
#[inline]
pub fn circular_velocity(radius_m: f64, mu_m3_s2: f64) -> f64 {
    (mu_m3_s2 / radius_m).sqrt()
}

/// Escape speed √(2μ/r) [m/s].
#[inline]
pub fn escape_velocity(radius_m: f64, mu_m3_s2: f64) -> f64 {
    (2.0 * mu_m3_s2 / radius_m).sqrt()
}

/// Compose an ECI state from orbital elements.
///
/// Builds (r, v) in the perifocal frame from (a, e, ν) and rotates through
/// R3(−Ω) R1(−i) R3(−ω).
pub fn state_from_elements(elem: &OrbitalElements, mu_m3_s2: f64) -> StateVector {
    let a = elem.semi_major_axis_m;
    let e = elem.eccentricity;
    let nu = elem.true_anomaly_rad;

    // Semi-latus rectum and perifocal position.
    let p = a * (1.0 - e * e);
    let r = p / (1.0 + e * nu.cos());

    let x_pf = r * nu.cos();
    let y_pf = r * nu.sin();

    // Perifocal velocity from the specific angular momentum h = √(μp).
    let h = (mu_m3_s2 * p).sqrt();
    let vx_pf = -mu_m3_s2 / h * nu.sin();
    let vy_pf = mu_m3_s2 / h * (e + nu.cos());

    let (sin_raan, cos_raan) = elem.raan_rad.sin_cos();
    let (sin_i, cos_i) = elem.inclination_rad.sin_cos();
    let (sin_w, cos_w) = elem.arg_periapsis_rad.sin_cos();

    let r11 = cos_raan * cos_w - sin_raan * sin_w * cos_i;
    let r12 = -cos_raan * sin_w - sin_raan * cos_w * cos_i;
    let r21 = sin_raan * cos_w + cos_raan * sin_w * cos_i;
    let r22 = -sin_raan * sin_w + cos_raan * cos_w * cos_i;
    let r31 = sin_w * sin_i;
    let r32 = cos_w * sin_i;

    StateVector::from_rv(
        [
            r11 * x_pf + r12 * y_pf,
            r21 * x_pf + r22 * y_pf,
            r31 * x_pf + r32 * y_pf,
        ],
        [
            r11 * vx_pf + r12 * vy_pf,
            r21 * vx_pf + r22 * vy_pf,
            r31 * vx_pf + r32 * vy_pf,
        ],
        0.0,
        CoordinateFrame::J2000Eci,
    )
}

/// Extract orbital elements from an ECI state.
///
/// Degenerate geometries never error: equatorial orbits take the node from
/// the x-axis, circular orbits take periapsis at the current radius
/// direction, and circular-equatorial orbits measure the anomaly from x.
pub fn elements_from_state(state: &StateVector, mu_m3_s2: f64) -> OrbitalElements {
    let r = state.position_m;
    let v = state.velocity_m_s;
    let r_mag = vector::norm(&r);
    let v_mag = vector::norm(&v);

    let h = vector::cross(&r, &v);
    let h_mag = vector::norm(&h);

    // Node vector n = ẑ × h.
    let n = [-h[1], h[0], 0.0];
    let n_mag = vector::norm(&n);

    let rv_dot = vector::dot(&r, &v);

    // Eccentricity vector (v²−μ/r)r/μ − (r·v)v/μ.
    let coeff = v_mag * v_mag - mu_m3_s2 / r_mag;
    let e_vec = [
        (coeff * r[0] - rv_dot * v[0]) / mu_m3_s2,
        (coeff * r[1] - rv_dot * v[1]) / mu_m3_s2,
        (coeff * r[2] - rv_dot * v[2]) / mu_m3_s2,
    ];
    let e = vector::norm(&e_vec);

    let energy = v_mag * v_mag / 2.0 - mu_m3_s2 / r_mag;
    let a = if (e - 1.0).abs() > DEGENERACY_THRESHOLD {
        -mu_m3_s2 / (2.0 * energy)
    } else {
        f64::INFINITY // parabolic
    };

    let inc = (h[2] / h_mag).acos();

    let raan = if n_mag > DEGENERACY_THRESHOLD {
        let mut raan = (n[0] / n_mag).acos();
        if n[1] < 0.0 {
            raan = TWO_PI - raan;
        }
        raan
    } else {
        0.0 // equatorial: node undefined, measured from x
    };

    let arg_pe = if n_mag > DEGENERACY_THRESHOLD && e > DEGENERACY_THRESHOLD {
        let mut w = (vector::dot(&n, &e_vec) / (n_mag * e)).clamp(-1.0, 1.0).acos();
        if e_vec[2] < 0.0 {
            w = TWO_PI - w;
        }
        w
    } else if e > DEGENERACY_THRESHOLD {
        // Equatorial: measure periapsis from the x-axis.
        let mut w = e_vec[1].atan2(e_vec[0]);
        if w < 0.0 {
            w += TWO_PI;
        }
        w
    } else {
        0.0 // circular: periapsis undefined
    };

    let nu = if e > DEGENERACY_THRESHOLD {
        let mut nu = (vector::dot(&e_vec, &r) / (e * r_mag)).clamp(-1.0, 1.0).acos();
        if rv_dot < 0.0 {
            nu = TWO_PI - nu;
        }
        nu
    } else if n_mag > DEGENERACY_THRESHOLD {
        // Circular inclined: argument of latitude from the node.
        let mut nu = (vector::dot(&n, &r) / (n_mag * r_mag)).clamp(-1.0, 1.0).acos();
        if r[2] < 0.0 {
            nu = TWO_PI - nu;
        }
        nu
    } else {
        // Circular equatorial: true longitude from x.
        let mut nu = r[1].atan2(r[0]);
        if nu < 0.0 {
            nu += TWO_PI;
        }
        nu
    };

    OrbitalElements {
        semi_major_axis_m: a,
        eccentricity: e,
        inclination_rad: inc,
        raan_rad: raan,
        arg_periapsis_rad: arg_pe,
        true_anomaly_rad: nu,
        mean_anomaly_rad: true_to_mean_anomaly(nu, e),
    }
}

/// Solve Kepler's equation M = E − e sin E by Newton iteration.
pub fn solve_kepler(mean_anomaly_rad: f64, eccentricity: f64, tol: f64) -> f64 {
    let m = mean_anomaly_rad;
    let mut e_anom = if eccentricity < 0.8 { m } else { PI };

    for _ in 0..50 {
        let f = e_anom - eccentricity * e_anom.sin() - m;
        let fp = 1.0 - eccentricity * e_anom.cos();
        let delta = f / fp;
        e_anom -= delta;
        if delta.abs() < tol {
            break;
        }
    }
    e_anom
}

/// True anomaly → eccentric anomaly.
pub fn true_to_eccentric_anomaly(nu: f64, e: f64) -> f64 {
    2.0 * ((1.0 - e).sqrt() * (nu / 2.0).sin()).atan2((1.0 + e).sqrt() * (nu / 2.0).cos())
}

/// Eccentric anomaly → true anomaly.
pub fn eccentric_to_true_anomaly(e_anom: f64, e: f64) -> f64 {
    2.0 * ((1.0 + e).sqrt() * (e_anom / 2.0).sin()).atan2((1.0 - e).sqrt() * (e_anom / 2.0).cos())
}

/// True anomaly → mean anomaly, normalized to [0, 2π).
pub fn true_to_mean_anomaly(nu: f64, e: f64) -> f64 {
    let e_anom = true_to_eccentric_anomaly(nu, e);
    (e_anom - e * e_anom.sin()).rem_euclid(TWO_PI)
}

/// Mean anomaly → true anomaly via the Kepler solve.
pub fn mean_to_true_anomaly(m: f64, e: f64) -> f64 {
    let e_anom = solve_kepler(m, e, 1.0e-12);
    eccentric_to_true_anomaly(e_anom, e)
}

/// Advance a mean anomaly by n·dt, normalized to [0, 2π).
pub fn propagate_mean_anomaly(m0: f64, mean_motion_rad_s: f64, dt_s: f64) -> f64 {
    (m0 + mean_motion_rad_s * dt_s).rem_euclid(TWO_PI)
}
