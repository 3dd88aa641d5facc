//! Clohessy–Wiltshire relative motion about a circular reference orbit.
//!
//! States are in the target's RIC frame (R radial, I in-track, C
//! cross-track). Out-of-plane motion is simple harmonic and decouples from
//! the in-plane 2×2 system.

use traj_core::vector::{self, Vector3};

const PI: f64 = std::f64::consts::PI;

/// Determinant below which the in-plane solve is treated as singular
/// (resonant transfer times nΔt = 2πk).
const SINGULAR_DET: f64 = 1.0e-12;

/// The four 3×3 blocks of the 6×6 CW state transition matrix.
#[derive(Debug, Clone, Copy)]
pub struct CwStateMatrix {
    pub phi_rr: [[f64; 3]; 3],
    pub phi_rv: [[f64; 3]; 3],
    pub phi_vr: [[f64; 3]; 3],
    pub phi_vv: [[f64; 3]; 3],
}

/// Closed-form CW state transition matrix Φ(n, Δt).
pub fn cw_state_matrix(mean_motion_rad_s: f64, dt_s: f64) -> CwStateMatrix {
    let n = mean_motion_rad_s;
    let nt = n * dt_s;
    let c = nt.cos();
    let s = nt.sin();

    CwStateMatrix {
        phi_rr: [
            [4.0 - 3.0 * c, 0.0, 0.0],
            [6.0 * (s - nt), 1.0, 0.0],
            [0.0, 0.0, c],
        ],
        phi_rv: [
            [s / n, 2.0 * (1.0 - c) / n, 0.0],
            [2.0 * (c - 1.0) / n, (4.0 * s - 3.0 * nt) / n, 0.0],
            [0.0, 0.0, s / n],
        ],
        phi_vr: [
            [3.0 * n * s, 0.0, 0.0],
            [6.0 * n * (c - 1.0), 0.0, 0.0],
            [0.0, 0.0, -n * s],
        ],
        phi_vv: [
            [c, 2.0 * s, 0.0],
            [-2.0 * s, 4.0 * c - 3.0, 0.0],
            [0.0, 0.0, c],
        ],
    }
}

fn mat_vec(m: &[[f64; 3]; 3], v: &Vector3) -> Vector3 {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Propagate a relative state through the CW dynamics.
pub fn cw_propagate(
    r0_ric: &Vector3,
    v0_ric: &Vector3,
    mean_motion_rad_s: f64,
    dt_s: f64,
) -> (Vector3, Vector3) {
    let m = cw_state_matrix(mean_motion_rad_s, dt_s);
    let r = vector::add(&mat_vec(&m.phi_rr, r0_ric), &mat_vec(&m.phi_rv, v0_ric));
    let v = vector::add(&mat_vec(&m.phi_vr, r0_ric), &mat_vec(&m.phi_vv, v0_ric));
    (r, v)
}

/// A closed-form CW burn solution.
#[derive(Debug, Clone)]
pub struct CwManeuver {
    pub valid: bool,
    pub dv1_ric_m_s: Vector3,
    pub dv2_ric_m_s: Vector3,
    pub dv1_mag_m_s: f64,
    pub dv2_mag_m_s: f64,
    pub total_dv_m_s: f64,
    pub transfer_time_s: f64,
    pub method: &'static str,
}

impl CwManeuver {
    fn invalid(method: &'static str, transfer_time_s: f64) -> Self {
        Self {
            valid: false,
            dv1_ric_m_s: vector::zero(),
            dv2_ric_m_s: vector::zero(),
            dv1_mag_m_s: 0.0,
            dv2_mag_m_s: 0.0,
            total_dv_m_s: 0.0,
            transfer_time_s,
            method,
        }
    }
}

/// Solve Φ_rv · Δv₁ = rhs for the in-plane 2×2 with decoupled cross-track.
///
/// The determinant is scaled by n² to make the singularity test
/// dimensionless; it vanishes at the resonant times nΔt = 2πk.
fn solve_rv(m: &CwStateMatrix, rhs: &Vector3, n: f64) -> Option<Vector3> {
    let det_ri = m.phi_rv[0][0] * m.phi_rv[1][1] - m.phi_rv[0][1] * m.phi_rv[1][0];
    if (det_ri * n * n).abs() < SINGULAR_DET {
        return None;
    }

    let dv_r = (m.phi_rv[1][1] * rhs[0] - m.phi_rv[0][1] * rhs[1]) / det_ri;
    let dv_i = (-m.phi_rv[1][0] * rhs[0] + m.phi_rv[0][0] * rhs[1]) / det_ri;

    let dv_c = if (m.phi_rv[2][2] * n).abs() > SINGULAR_DET {
        rhs[2] / m.phi_rv[2][2]
    } else {
        0.0
    };

    Some([dv_r, dv_i, dv_c])
}

/// Two-burn rendezvous: first burn nulls the arrival position, second burn
/// cancels the arrival velocity.
pub fn cw_two_burn_rendezvous(
    r0_ric: &Vector3,
    v0_ric: &Vector3,
    transfer_time_s: f64,
    mean_motion_rad_s: f64,
) -> CwManeuver {
    let m = cw_state_matrix(mean_motion_rad_s, transfer_time_s);

    // Φ_rv Δv₁ = −Φ_rr r₀ − Φ_rv v₀.
    let rhs = vector::scale(
        &vector::add(&mat_vec(&m.phi_rr, r0_ric), &mat_vec(&m.phi_rv, v0_ric)),
        -1.0,
    );

    let Some(dv1) = solve_rv(&m, &rhs, mean_motion_rad_s) else {
        return CwManeuver::invalid("two_burn_rendezvous", transfer_time_s);
    };

    // Arrival velocity before the second burn.
    let v0_plus = vector::add(v0_ric, &dv1);
    let v_arrive = vector::add(&mat_vec(&m.phi_vr, r0_ric), &mat_vec(&m.phi_vv, &v0_plus));
    let dv2 = vector::scale(&v_arrive, -1.0);

    let dv1_mag = vector::norm(&dv1);
    let dv2_mag = vector::norm(&dv2);
    CwManeuver {
        valid: true,
        dv1_ric_m_s: dv1,
        dv2_ric_m_s: dv2,
        dv1_mag_m_s: dv1_mag,
        dv2_mag_m_s: dv2_mag,
        total_dv_m_s: dv1_mag + dv2_mag,
        transfer_time_s,
        method: "two_burn_rendezvous",
    }
}

/// Single-burn intercept from rest: null the arrival position only.
pub fn cw_single_burn_intercept(
    r0_ric: &Vector3,
    transfer_time_s: f64,
    mean_motion_rad_s: f64,
) -> CwManeuver {
    let m = cw_state_matrix(mean_motion_rad_s, transfer_time_s);
    let rhs = vector::scale(&mat_vec(&m.phi_rr, r0_ric), -1.0);

    let Some(dv1) = solve_rv(&m, &rhs, mean_motion_rad_s) else {
        return CwManeuver::invalid("single_burn_intercept", transfer_time_s);
    };

    let dv1_mag = vector::norm(&dv1);
    CwManeuver {
        valid: true,
        dv1_ric_m_s: dv1,
        dv2_ric_m_s: vector::zero(),
        dv1_mag_m_s: dv1_mag,
        dv2_mag_m_s: 0.0,
        total_dv_m_s: dv1_mag,
        transfer_time_s,
        method: "single_burn_intercept",
    }
}

/// Half-period rule of thumb: a radial burn Δv_R = I₀ n / 4 closes a pure
/// in-track offset over Δt = π/n, with an equal-magnitude return burn.
pub fn cw_half_period_radial(r0_ric: &Vector3, mean_motion_rad_s: f64) -> CwManeuver {
    let n = mean_motion_rad_s;
    let i0 = r0_ric[1];
    let dv_r = i0 * n / 4.0;

    CwManeuver {
        valid: true,
        dv1_ric_m_s: [dv_r, 0.0, 0.0],
        dv2_ric_m_s: [-dv_r, 0.0, 0.0],
        dv1_mag_m_s: dv_r.abs(),
        dv2_mag_m_s: dv_r.abs(),
        total_dv_m_s: 2.0 * dv_r.abs(),
        transfer_time_s: PI / n,
        method: "half_period_radial",
    }
}

/// In-track phasing rule of thumb: Δv = v_circ |Δθ| / (3 Δt n), symmetric
/// burn pair; behind the target raises the orbit to slow down.
pub fn cw_phasing(
    r0_ric: &Vector3,
    transfer_time_s: f64,
    mean_motion_rad_s: f64,
    v_circ_m_s: f64,
) -> CwManeuver {
    let n = mean_motion_rad_s;
    let i0 = r0_ric[1];

    // Symmetric in-track pair: dv = v_circ |dtheta| / (3 dt n), with the
    // offset read as a phase angle on the reference orbit.
    let r_ref = v_circ_m_s / n;
    let delta_theta = i0 / r_ref;
    let dv = v_circ_m_s * delta_theta.abs() / (3.0 * transfer_time_s * n);

    // Behind the target: raise the orbit to slow down.
    let dv_i = if i0 > 0.0 { -dv } else { dv };

    CwManeuver {
        valid: true,
        dv1_ric_m_s: [0.0, dv_i, 0.0],
        dv2_ric_m_s: [0.0, -dv_i, 0.0],
        dv1_mag_m_s: dv,
        dv2_mag_m_s: dv,
        total_dv_m_s: 2.0 * dv,
        transfer_time_s,
        method: "phasing",
    }
}

/// Try the applicable closed-form methods and keep the cheapest.
pub fn cw_best_maneuver(
    r0_ric: &Vector3,
    v0_ric: &Vector3,
    transfer_time_s: f64,
    mean_motion_rad_s: f64,
    v_circ_m_s: f64,
) -> CwManeuver {
    let n = mean_motion_rad_s;
    let two_burn = cw_two_burn_rendezvous(r0_ric, v0_ric, transfer_time_s, n);

    let mut best = two_burn.clone();

    let half_period = PI / n;
    if (transfer_time_s - half_period).abs() / half_period < 0.1 {
        let radial = cw_half_period_radial(r0_ric, n);
        if radial.valid && (!best.valid || radial.total_dv_m_s < best.total_dv_m_s) {
            best = radial;
        }
    }

    let r_mag = r0_ric[0].abs();
    let i_mag = r0_ric[1].abs();
    if i_mag > 5.0 * r_mag && transfer_time_s > half_period {
        let phasing = cw_phasing(r0_ric, transfer_time_s, n, v_circ_m_s);
        if phasing.valid && (!best.valid || phasing.total_dv_m_s < best.total_dv_m_s) {
            best = phasing;
        }
    }

    if !best.valid {
        return two_burn;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const N_GEO: f64 = 7.292_115_9e-5;

    fn mat6(m: &CwStateMatrix) -> [[f64; 6]; 6] {
        let mut out = [[0.0; 6]; 6];
        for i in 0..3 {
            for j in 0..3 {
                out[i][j] = m.phi_rr[i][j];
                out[i][j + 3] = m.phi_rv[i][j];
                out[i + 3][j] = m.phi_vr[i][j];
                out[i + 3][j + 3] = m.phi_vv[i][j];
            }
        }
        out
    }

    #[test]
    fn stm_at_zero_is_identity() {
        let m = mat6(&cw_state_matrix(N_GEO, 0.0));
        for i in 0..6 {
            for j in 0..6 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((m[i][j] - expected).abs() < 1.0e-12, "({i},{j})");
            }
        }
    }

    #[test]
    fn stm_satisfies_the_semigroup_property() {
        let t1 = 1_800.0;
        let t2 = 4_000.0;
        let a = mat6(&cw_state_matrix(N_GEO, t1));
        let b = mat6(&cw_state_matrix(N_GEO, t2));
        let ab_expected = mat6(&cw_state_matrix(N_GEO, t1 + t2));

        // Φ(t1) Φ(t2) = Φ(t1 + t2).
        for i in 0..6 {
            for j in 0..6 {
                let mut sum = 0.0;
                for k in 0..6 {
                    sum += a[i][k] * b[k][j];
                }
                assert!(
                    (sum - ab_expected[i][j]).abs() < 1.0e-10,
                    "({i},{j}): {sum} vs {}",
                    ab_expected[i][j]
                );
            }
        }
    }

    #[test]
    fn two_burn_rendezvous_closes_the_gap() {
        let r0 = [500.0, -20_000.0, 300.0];
        let v0 = [0.1, 0.5, -0.05];
        let tof = 5_000.0;

        let sol = cw_two_burn_rendezvous(&r0, &v0, tof, N_GEO);
        assert!(sol.valid);

        // Fly the solved burn through the CW dynamics: arrival at origin
        // with the second burn cancelling all velocity.
        let v0_plus = vector::add(&v0, &sol.dv1_ric_m_s);
        let (r_f, v_f) = cw_propagate(&r0, &v0_plus, N_GEO, tof);
        assert!(vector::norm(&r_f) < 1.0e-6, "miss = {}", vector::norm(&r_f));
        let residual = vector::add(&v_f, &sol.dv2_ric_m_s);
        assert!(vector::norm(&residual) < 1.0e-9);
    }

    #[test]
    fn resonant_transfer_times_are_singular() {
        let period = 2.0 * PI / N_GEO;
        let sol = cw_two_burn_rendezvous(&[0.0, -10_000.0, 0.0], &[0.0, 0.0, 0.0], period, N_GEO);
        assert!(!sol.valid);
    }

    #[test]
    fn half_period_radial_rule_matches_the_formula() {
        let i0 = 8_000.0;
        let sol = cw_half_period_radial(&[0.0, i0, 0.0], N_GEO);
        assert!((sol.dv1_mag_m_s - i0 * N_GEO / 4.0).abs() < 1.0e-12);
        assert!((sol.transfer_time_s - PI / N_GEO).abs() < 1.0e-9);
    }
}
