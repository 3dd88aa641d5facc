//! Lambert boundary-value solver.
//!
//! Single-revolution elliptic transfers only: multi-revolution and
//! hyperbolic branches are not implemented, and callers must branch on the
//! `valid` flag. The semi-major axis is found by bisection of the Lagrange
//! time-of-flight equation; velocities come from the f and g functions.

use log::debug;

use traj_core::vector::{self, Vector3};

const PI: f64 = std::f64::consts::PI;
const TWO_PI: f64 = 2.0 * PI;

/// Bisection exits once the time of flight matches within this tolerance [s].
const TOF_TOLERANCE_S: f64 = 1.0;

/// Result of a Lambert solve. `valid` is false for degenerate geometry,
/// non-positive inputs, or a time of flight outside the elliptic domain.
#[derive(Debug, Clone, Copy)]
pub struct LambertSolution {
    pub valid: bool,
    /// Departure velocity [m/s].
    pub v1_m_s: Vector3,
    /// Arrival velocity [m/s].
    pub v2_m_s: Vector3,
    /// Time of flight the solution was built for [s].
    pub tof_s: f64,
    /// Transfer angle swept [rad].
    pub transfer_angle_rad: f64,
    /// Semi-major axis of the transfer arc [m].
    pub semi_major_axis_m: f64,
    /// Bisection iterations consumed.
    pub iterations: usize,
}

impl LambertSolution {
    fn invalid() -> Self {
        Self {
            valid: false,
            v1_m_s: vector::zero(),
            v2_m_s: vector::zero(),
            tof_s: 0.0,
            transfer_angle_rad: 0.0,
            semi_major_axis_m: 0.0,
            iterations: 0,
        }
    }
}

/// Lagrange TOF for a candidate semi-major axis.
///
/// `slow_branch` selects the 2π − α solution that sweeps past apoapsis.
fn time_of_flight(a: f64, s: f64, c: f64, mu: f64, theta: f64, slow_branch: bool) -> f64 {
    let mut alpha = 2.0 * (s / (2.0 * a)).sqrt().clamp(-1.0, 1.0).asin();
    if slow_branch {
        alpha = TWO_PI - alpha;
    }
    let mut beta = 2.0 * ((s - c) / (2.0 * a)).sqrt().clamp(-1.0, 1.0).asin();
    if theta > PI {
        beta = -beta;
    }
    (a * a * a / mu).sqrt() * (alpha - beta - (alpha.sin() - beta.sin()))
}

/// Solve Lambert's problem for the arc from `r1` to `r2` in `tof_s` seconds.
///
/// The prograde flag selects whether the transfer angle is taken in [0, π]
/// or (π, 2π] from the z-component of r₁ × r₂.
pub fn lambert(
    r1_m: &Vector3,
    r2_m: &Vector3,
    tof_s: f64,
    mu_m3_s2: f64,
    prograde: bool,
) -> LambertSolution {
    if tof_s <= 0.0 || mu_m3_s2 <= 0.0 {
        return LambertSolution::invalid();
    }

    let r1_mag = vector::norm(r1_m);
    let r2_mag = vector::norm(r2_m);
    if r1_mag < 1.0 || r2_mag < 1.0 {
        return LambertSolution::invalid();
    }

    // Transfer angle from the chord geometry and the orbit normal.
    let cross = vector::cross(r1_m, r2_m);
    let cos_theta = (vector::dot(r1_m, r2_m) / (r1_mag * r2_mag)).clamp(-1.0, 1.0);
    let principal = cos_theta.acos();
    let theta = if prograde == (cross[2] >= 0.0) {
        principal
    } else {
        TWO_PI - principal
    };

    if theta.sin().abs() < 1.0e-12 {
        // Collinear endpoints: the transfer plane is undefined.
        return LambertSolution::invalid();
    }

    // Chord, semi-perimeter, minimum-energy ellipse.
    let c = (r1_mag * r1_mag + r2_mag * r2_mag - 2.0 * r1_mag * r2_mag * theta.cos()).sqrt();
    let s = (r1_mag + r2_mag + c) / 2.0;
    let a_min = s / 2.0;

    // Minimum-energy time of flight (α = π).
    let mut beta_min = 2.0 * ((s - c) / s).sqrt().asin();
    if theta > PI {
        beta_min = -beta_min;
    }
    let tof_min_energy =
        (a_min * a_min * a_min / mu_m3_s2).sqrt() * (PI - beta_min + beta_min.sin());

    if tof_s < tof_min_energy * 0.5 {
        // Too fast for any elliptic arc through these points.
        return LambertSolution::invalid();
    }

    // Transfers slower than the minimum-energy arc sweep past apoapsis
    // (α on the 2π − α branch), where TOF grows with a; faster transfers
    // stay on the principal branch, where TOF shrinks with a.
    let slow_branch = tof_s > tof_min_energy;

    let mut a_low = a_min;
    let mut a_high = s * 10.0;
    let mut a = (a_low + a_high) / 2.0;
    let mut iterations = 0;

    for iter in 0..100 {
        iterations = iter + 1;
        a = (a_low + a_high) / 2.0;
        let tof_calc = time_of_flight(a, s, c, mu_m3_s2, theta, slow_branch);

        if (tof_calc - tof_s).abs() < TOF_TOLERANCE_S {
            break;
        }

        let move_up = if slow_branch {
            tof_calc < tof_s
        } else {
            tof_calc > tof_s
        };
        if move_up {
            a_low = a;
        } else {
            a_high = a;
        }
    }

    debug!(
        "lambert: theta = {:.4} rad, a = {:.1} m after {} iterations ({} branch)",
        theta,
        a,
        iterations,
        if slow_branch { "slow" } else { "fast" }
    );

    // Semi-latus rectum from a and the α/β angles (Battin form).
    let mut alpha = 2.0 * (s / (2.0 * a)).sqrt().clamp(-1.0, 1.0).asin();
    if slow_branch {
        alpha = TWO_PI - alpha;
    }
    let mut beta = 2.0 * ((s - c) / (2.0 * a)).sqrt().clamp(-1.0, 1.0).asin();
    if theta > PI {
        beta = -beta;
    }
    let p = 4.0 * a * (s - r1_mag) * (s - r2_mag) / (c * c)
        * ((alpha + beta) / 2.0).sin().powi(2);
    if !p.is_finite() || p <= 0.0 {
        return LambertSolution::invalid();
    }

    // Lagrange coefficients.
    let f = 1.0 - r2_mag / p * (1.0 - theta.cos());
    let g = r1_mag * r2_mag * theta.sin() / (mu_m3_s2 * p).sqrt();
    let g_dot = 1.0 - r1_mag / p * (1.0 - theta.cos());
    let f_dot = (mu_m3_s2 / p).sqrt()
        * (theta / 2.0).tan()
        * ((1.0 - theta.cos()) / p - 1.0 / r1_mag - 1.0 / r2_mag);

    if g.abs() < 1.0e-12 {
        return LambertSolution::invalid();
    }

    let v1 = [
        (r2_m[0] - f * r1_m[0]) / g,
        (r2_m[1] - f * r1_m[1]) / g,
        (r2_m[2] - f * r1_m[2]) / g,
    ];
    let v2 = [
        f_dot * r1_m[0] + g_dot * v1[0],
        f_dot * r1_m[1] + g_dot * v1[1],
        f_dot * r1_m[2] + g_dot * v1[2],
    ];

    LambertSolution {
        valid: true,
        v1_m_s: v1,
        v2_m_s: v2,
        tof_s,
        transfer_angle_rad: theta,
        semi_major_axis_m: a,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MU_EARTH: f64 = 3.986_004_418e14;
    const MU_SUN: f64 = 1.327_124_400_18e20;
    const AU: f64 = 1.495_978_707e11;

    #[test]
    fn quarter_orbit_recovers_circular_velocity() {
        let r = AU;
        let r1 = [r, 0.0, 0.0];
        let r2 = [0.0, r, 0.0];
        let tof = (PI / 2.0) * (r * r * r / MU_SUN).sqrt();

        let sol = lambert(&r1, &r2, tof, MU_SUN, true);
        assert!(sol.valid);

        let v_circ = (MU_SUN / r).sqrt();
        let v1_mag = vector::norm(&sol.v1_m_s);
        let v2_mag = vector::norm(&sol.v2_m_s);
        assert!((v1_mag - v_circ).abs() < 1.0, "v1 = {v1_mag}, circ = {v_circ}");
        assert!((v2_mag - v_circ).abs() < 1.0);
        // Departure velocity is tangential (+y).
        assert!(sol.v1_m_s[1] / v1_mag > 0.999);
    }

    #[test]
    fn negative_tof_is_invalid() {
        let sol = lambert(&[7.0e6, 0.0, 0.0], &[0.0, 7.0e6, 0.0], -10.0, MU_EARTH, true);
        assert!(!sol.valid);
    }

    #[test]
    fn impossibly_short_tof_is_invalid() {
        let r1 = [AU, 0.0, 0.0];
        let r2 = [0.0, AU, 0.0];
        // A one-hour heliocentric quarter orbit is unreachable on any ellipse.
        let sol = lambert(&r1, &r2, 3600.0, MU_SUN, true);
        assert!(!sol.valid);
    }

    #[test]
    fn retrograde_flag_flips_the_transfer_angle() {
        let r1 = [AU, 0.0, 0.0];
        let r2 = [0.0, AU, 0.0];
        let tof = 0.3 * TWO_PI * (AU * AU * AU / MU_SUN).sqrt();
        let pro = lambert(&r1, &r2, tof, MU_SUN, true);
        let retro = lambert(&r1, &r2, tof, MU_SUN, false);
        assert!(pro.valid && retro.valid);
        assert!((pro.transfer_angle_rad - PI / 2.0).abs() < 1.0e-9);
        assert!((retro.transfer_angle_rad - 3.0 * PI / 2.0).abs() < 1.0e-9);
    }

    #[test]
    fn slow_transfers_use_the_high_arc() {
        // Same geometry, TOF well beyond the minimum-energy time: the
        // solver must still produce an elliptic arc with larger energy.
        let r = 42_164_000.0;
        let r1 = [r, 0.0, 0.0];
        let theta: f64 = 1.0_f64.to_radians();
        let r2 = [r * theta.cos(), r * theta.sin(), 0.0];
        let sol = lambert(&r1, &r2, 43_200.0, MU_EARTH, true);
        assert!(sol.valid);
        assert!(sol.semi_major_axis_m > r / 2.0);
    }
}
