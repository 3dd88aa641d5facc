//! Unpowered gravity assists and B-plane targeting.

use serde::Serialize;

use traj_core::vector::{self, Vector3};

const PI: f64 = std::f64::consts::PI;

/// Minimum safe flyby altitude above the body surface [m].
pub const MIN_FLYBY_ALTITUDE_M: f64 = 200.0e3;

/// B-plane resolution of a flyby: a right-handed (S, T, R) frame with S
/// along the incoming asymptote and T in the ecliptic plane.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BPlane {
    /// Incoming hyperbolic excess speed [m/s].
    pub v_inf_in_m_s: f64,
    /// Outgoing hyperbolic excess speed [m/s].
    pub v_inf_out_m_s: f64,
    /// Impact parameter magnitude [m].
    pub b_mag_m: f64,
    /// B·T̂ component [m].
    pub b_dot_t_m: f64,
    /// B·R̂ component [m].
    pub b_dot_r_m: f64,
    /// Asymptote turn angle [rad].
    pub turn_angle_rad: f64,
}

/// Result of an unpowered flyby computation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FlybyResult {
    pub valid: bool,
    /// Outgoing hyperbolic excess vector, planet-centred [m/s].
    pub v_inf_out: Vector3,
    /// Periapsis radius of the hyperbola [m].
    pub periapsis_radius_m: f64,
    /// Turn angle δ = 2 asin(1/e) [rad].
    pub turn_angle_rad: f64,
    /// ‖v∞_out − v∞_in‖, the heliocentric velocity change gained [m/s].
    pub delta_v_gained_m_s: f64,
    pub b_plane: BPlane,
}

impl FlybyResult {
    /// A degenerate (zero-effect) result with `valid = false`.
    pub fn invalid() -> Self {
        Self {
            valid: false,
            v_inf_out: vector::zero(),
            periapsis_radius_m: 0.0,
            turn_angle_rad: 0.0,
            delta_v_gained_m_s: 0.0,
            b_plane: BPlane {
                v_inf_in_m_s: 0.0,
                v_inf_out_m_s: 0.0,
                b_mag_m: 0.0,
                b_dot_t_m: 0.0,
                b_dot_r_m: 0.0,
                turn_angle_rad: 0.0,
            },
        }
    }
}

/// B-plane T̂ axis: ecliptic component perpendicular to the asymptote, with
/// an x-axis fallback when the asymptote runs along the pole.
fn t_hat_for(s_hat: &Vector3) -> Vector3 {
    let ecliptic_north = [0.0, 0.0, 1.0];
    match vector::normalize(&vector::cross(s_hat, &ecliptic_north)) {
        Some(t) => t,
        None => vector::normalize(&vector::cross(s_hat, &[1.0, 0.0, 0.0]))
            .unwrap_or([0.0, 1.0, 0.0]),
    }
}

/// Compute an unpowered flyby of a planet.
///
/// The outgoing v∞ keeps the incoming magnitude and is rotated by the turn
/// angle about an axis perpendicular to v∞_in (chosen in the flyby plane
/// via a cross product with a reference axis), using Rodrigues' formula.
pub fn compute_flyby(v_inf_in: &Vector3, periapsis_radius_m: f64, mu_planet: f64) -> FlybyResult {
    let v_inf = vector::norm(v_inf_in);
    if v_inf < 1.0e-6 || periapsis_radius_m <= 0.0 || mu_planet <= 0.0 {
        return FlybyResult::invalid();
    }

    let v_inf_sq = v_inf * v_inf;
    let e_hyp = 1.0 + periapsis_radius_m * v_inf_sq / mu_planet;
    if e_hyp < 1.0 {
        return FlybyResult::invalid();
    }
    let turn_angle = 2.0 * (1.0 / e_hyp).asin();

    let Some(v_hat) = vector::normalize(v_inf_in) else {
        return FlybyResult::invalid();
    };

    // Rotation axis perpendicular to the asymptote, from a reference axis
    // that is guaranteed non-parallel.
    let reference = if v_hat[0].abs() < 0.9 {
        [1.0, 0.0, 0.0]
    } else {
        [0.0, 1.0, 0.0]
    };
    let Some(k) = vector::normalize(&vector::cross(&v_hat, &reference)) else {
        return FlybyResult::invalid();
    };

    // Rodrigues: v' = v cos δ + (k × v) sin δ + k (k·v)(1 − cos δ).
    let (sin_d, cos_d) = turn_angle.sin_cos();
    let k_cross_v = vector::cross(&k, v_inf_in);
    let k_dot_v = vector::dot(&k, v_inf_in);
    let v_inf_out = [
        v_inf_in[0] * cos_d + k_cross_v[0] * sin_d + k[0] * k_dot_v * (1.0 - cos_d),
        v_inf_in[1] * cos_d + k_cross_v[1] * sin_d + k[1] * k_dot_v * (1.0 - cos_d),
        v_inf_in[2] * cos_d + k_cross_v[2] * sin_d + k[2] * k_dot_v * (1.0 - cos_d),
    ];

    // Impact parameter b = rp √(1 + 2μ/(rp v∞²)).
    let b_mag = periapsis_radius_m
        * (1.0 + 2.0 * mu_planet / (periapsis_radius_m * v_inf_sq)).sqrt();

    let t_hat = t_hat_for(&v_hat);
    let r_hat = vector::cross(&v_hat, &t_hat);
    let b_vec = vector::scale(&k, b_mag);

    FlybyResult {
        valid: true,
        v_inf_out,
        periapsis_radius_m,
        turn_angle_rad: turn_angle,
        delta_v_gained_m_s: vector::norm(&vector::sub(&v_inf_out, v_inf_in)),
        b_plane: BPlane {
            v_inf_in_m_s: v_inf,
            v_inf_out_m_s: vector::norm(&v_inf_out),
            b_mag_m: b_mag,
            b_dot_t_m: vector::dot(&b_vec, &t_hat),
            b_dot_r_m: vector::dot(&b_vec, &r_hat),
            turn_angle_rad: turn_angle,
        },
    }
}

/// Periapsis radius that produces a desired turn angle:
/// r_p = (1/sin(δ/2) − 1) μ / v∞².
pub fn periapsis_for_turn_angle(
    v_inf_m_s: f64,
    turn_angle_rad: f64,
    mu_planet: f64,
) -> Option<f64> {
    if v_inf_m_s < 1.0e-6
        || turn_angle_rad <= 0.0
        || turn_angle_rad >= PI
        || mu_planet <= 0.0
    {
        return None;
    }
    let e_hyp = 1.0 / (turn_angle_rad / 2.0).sin();
    Some((e_hyp - 1.0) * mu_planet / (v_inf_m_s * v_inf_m_s))
}

/// B-plane target connecting a desired pair of asymptote directions.
pub fn b_plane_for_asymptotes(
    v_inf_in: &Vector3,
    v_inf_out_desired: &Vector3,
    mu_planet: f64,
) -> BPlane {
    let v_in_mag = vector::norm(v_inf_in);
    let v_out_mag = vector::norm(v_inf_out_desired);

    let mut result = BPlane {
        v_inf_in_m_s: v_in_mag,
        v_inf_out_m_s: v_out_mag,
        b_mag_m: 0.0,
        b_dot_t_m: 0.0,
        b_dot_r_m: 0.0,
        turn_angle_rad: 0.0,
    };

    if v_in_mag < 1.0e-6 || v_out_mag < 1.0e-6 {
        return result;
    }

    let s_in = vector::scale(v_inf_in, 1.0 / v_in_mag);
    let s_out = vector::scale(v_inf_out_desired, 1.0 / v_out_mag);

    let cos_turn = vector::dot(&s_in, &s_out).clamp(-1.0, 1.0);
    let turn_angle = cos_turn.acos();
    result.turn_angle_rad = turn_angle;
    if turn_angle < 1.0e-12 {
        return result;
    }

    // Unpowered flybys keep the magnitude; average the two for robustness.
    let v_inf = (v_in_mag + v_out_mag) / 2.0;
    let Some(rp) = periapsis_for_turn_angle(v_inf, turn_angle, mu_planet) else {
        return result;
    };

    let b_mag = rp * (1.0 + 2.0 * mu_planet / (rp * v_inf * v_inf)).sqrt();
    result.b_mag_m = b_mag;

    let t_hat = t_hat_for(&s_in);
    let r_hat = vector::cross(&s_in, &t_hat);

    // B̂ is the component of the outgoing asymptote perpendicular to S.
    let b_dir = vector::sub(&s_out, &vector::scale(&s_in, cos_turn));
    let Some(b_hat) = vector::normalize(&b_dir) else {
        return result;
    };
    let b_vec = vector::scale(&b_hat, b_mag);

    result.b_dot_t_m = vector::dot(&b_vec, &t_hat);
    result.b_dot_r_m = vector::dot(&b_vec, &r_hat);
    result
}

/// Whether a turn between two asymptotes is achievable without a burn.
pub fn flyby_feasible(
    v_inf_in_m_s: f64,
    v_inf_out_m_s: f64,
    min_periapsis_m: f64,
    mu_planet: f64,
) -> bool {
    if v_inf_in_m_s < 1.0e-6
        || v_inf_out_m_s < 1.0e-6
        || min_periapsis_m <= 0.0
        || mu_planet <= 0.0
    {
        return false;
    }

    let v_inf = (v_inf_in_m_s + v_inf_out_m_s) / 2.0;
    let e_max = 1.0 + min_periapsis_m * v_inf * v_inf / mu_planet;
    let max_turn = 2.0 * (1.0 / e_max).asin();
    max_turn > 0.0
}

/// Delta-v to close a turn-angle deficit with a powered flyby:
/// 2 v∞ sin(δ_residual / 2).
pub fn powered_flyby_delta_v(v_inf_m_s: f64, residual_turn_rad: f64) -> f64 {
    2.0 * v_inf_m_s * (residual_turn_rad / 2.0).sin()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MU_EARTH: f64 = 3.986_004_418e14;
    const RE: f64 = 6_378_137.0;

    #[test]
    fn unpowered_flyby_conserves_v_infinity() {
        let v_in = [5_000.0, 0.0, 0.0];
        let rp = RE + 500.0e3;
        let result = compute_flyby(&v_in, rp, MU_EARTH);
        assert!(result.valid);

        let v_out_mag = vector::norm(&result.v_inf_out);
        assert!(
            ((v_out_mag - 5_000.0) / 5_000.0).abs() < 1.0e-12,
            "v_out = {v_out_mag}"
        );

        // δ = 2 asin(1/(1 + rp v²/μ)).
        let e_hyp = 1.0 + rp * 5_000.0_f64.powi(2) / MU_EARTH;
        let expected = 2.0 * (1.0 / e_hyp).asin();
        assert!((result.turn_angle_rad - expected).abs() < 1.0e-12);
    }

    #[test]
    fn deeper_flybys_turn_harder() {
        let v_in = [7_000.0, 0.0, 0.0];
        let shallow = compute_flyby(&v_in, RE + 10_000.0e3, MU_EARTH);
        let deep = compute_flyby(&v_in, RE + 300.0e3, MU_EARTH);
        assert!(deep.turn_angle_rad > shallow.turn_angle_rad);
    }

    #[test]
    fn periapsis_inversion_round_trips() {
        let v_inf = 6_000.0;
        let rp = RE + 800.0e3;
        let flyby = compute_flyby(&[v_inf, 0.0, 0.0], rp, MU_EARTH);
        let rp_back =
            periapsis_for_turn_angle(v_inf, flyby.turn_angle_rad, MU_EARTH).unwrap();
        assert!((rp_back - rp).abs() < 1.0e-3, "rp = {rp_back}");
    }

    #[test]
    fn zero_v_infinity_is_invalid() {
        assert!(!compute_flyby(&[0.0, 0.0, 0.0], RE, MU_EARTH).valid);
        assert!(periapsis_for_turn_angle(5_000.0, 0.0, MU_EARTH).is_none());
    }

    #[test]
    fn b_plane_magnitude_exceeds_periapsis() {
        let result = compute_flyby(&[5_000.0, 0.0, 0.0], RE + 500.0e3, MU_EARTH);
        // Gravitational focusing always pulls the asymptote inward.
        assert!(result.b_plane.b_mag_m > result.periapsis_radius_m);
    }

    #[test]
    fn powered_flyby_cost_matches_the_chord() {
        let dv = powered_flyby_delta_v(5_000.0, 0.2);
        assert!((dv - 2.0 * 5_000.0 * 0.1_f64.sin()).abs() < 1.0e-9);
    }
}
