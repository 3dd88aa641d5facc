//! Gravitational accelerations: two-body, zonal harmonics, third bodies.
//!
//! These are the canonical implementations; every gravity evaluation in the
//! workspace flows through them.

use traj_core::vector::{self, Vector3};

/// Two-body gravitational acceleration a = −μ r/‖r‖³.
///
/// Returns zero inside a 1 m radius to guard the singularity at the origin.
pub fn two_body(position_m: &Vector3, mu_m3_s2: f64) -> Vector3 {
    let r = vector::norm(position_m);
    if r < 1.0 {
        return vector::zero();
    }
    let coeff = -mu_m3_s2 / (r * r * r);
    vector::scale(position_m, coeff)
}

/// J2 oblateness perturbation.
///
/// Dominant zonal term, ~1e-3 of two-body at Earth LEO. Zero inside the
/// body radius.
pub fn j2_perturbation(position_m: &Vector3, mu: f64, j2: f64, radius_m: f64) -> Vector3 {
    let r = vector::norm(position_m);
    if r < radius_m {
        return vector::zero();
    }

    let r2 = r * r;
    let r5 = r2 * r2 * r;
    let z2 = position_m[2] * position_m[2];

    let coeff = 1.5 * j2 * mu * radius_m * radius_m / r5;
    let z_factor = 5.0 * z2 / r2;

    [
        coeff * position_m[0] * (z_factor - 1.0),
        coeff * position_m[1] * (z_factor - 1.0),
        coeff * position_m[2] * (z_factor - 3.0),
    ]
}

/// J3 pear-shape perturbation, ~1000× smaller than J2.
pub fn j3_perturbation(position_m: &Vector3, mu: f64, j3: f64, radius_m: f64) -> Vector3 {
    let r = vector::norm(position_m);
    if r < radius_m {
        return vector::zero();
    }

    let r2 = r * r;
    let r7 = r2 * r2 * r2 * r;
    let z = position_m[2];
    let z2 = z * z;
    let radius3 = radius_m * radius_m * radius_m;

    let coeff = -2.5 * j3 * mu * radius3 / r7;
    let z3_over_r2 = z * z2 / r2;

    [
        coeff * position_m[0] * (3.0 * z - 7.0 * z3_over_r2),
        coeff * position_m[1] * (3.0 * z - 7.0 * z3_over_r2),
        coeff * (6.0 * z2 - 7.0 * z2 * z2 / r2 - 0.6 * r2),
    ]
}

/// J4 higher-order oblateness perturbation, similar magnitude to J3.
pub fn j4_perturbation(position_m: &Vector3, mu: f64, j4: f64, radius_m: f64) -> Vector3 {
    let r = vector::norm(position_m);
    if r < radius_m {
        return vector::zero();
    }

    let r2 = r * r;
    let r4 = r2 * r2;
    let r7 = r4 * r2 * r;
    let z2 = position_m[2] * position_m[2];
    let z4 = z2 * z2;
    let radius4 = radius_m * radius_m * radius_m * radius_m;

    let coeff = (15.0 / 8.0) * j4 * mu * radius4 / r7;
    let z2r2 = z2 / r2;
    let z4r4 = z4 / r4;

    [
        coeff * position_m[0] * (1.0 - 14.0 * z2r2 + 21.0 * z4r4),
        coeff * position_m[1] * (1.0 - 14.0 * z2r2 + 21.0 * z4r4),
        coeff * position_m[2] * (5.0 - (70.0 / 3.0) * z2r2 + 21.0 * z4r4),
    ]
}

/// Third-body perturbation in Cowell form.
///
/// a = μ₃ [(r₃ − r)/‖r₃ − r‖³ − r₃/‖r₃‖³], with the difference evaluated
/// before division so distant bodies do not cancel catastrophically. Both
/// positions are relative to the primary.
pub fn third_body(
    pos_rel_primary_m: &Vector3,
    third_body_pos_m: &Vector3,
    mu_third: f64,
) -> Vector3 {
    let r_s3 = vector::sub(third_body_pos_m, pos_rel_primary_m);

    let d_s3 = vector::norm(&r_s3);
    let d_p3 = vector::norm(third_body_pos_m);
    if d_s3 < 1.0 || d_p3 < 1.0 {
        return vector::zero();
    }

    let d_s3_3 = d_s3 * d_s3 * d_s3;
    let d_p3_3 = d_p3 * d_p3 * d_p3;

    [
        mu_third * (r_s3[0] / d_s3_3 - third_body_pos_m[0] / d_p3_3),
        mu_third * (r_s3[1] / d_s3_3 - third_body_pos_m[1] / d_p3_3),
        mu_third * (r_s3[2] / d_s3_3 - third_body_pos_m[2] / d_p3_3),
    ]
}

/// Gradient of two-body gravity with respect to position.
///
/// G_ij = −μ/r³ (δ_ij − 3 r_i r_j / r²), used for STM propagation.
pub fn gravity_gradient(position_m: &Vector3, mu: f64) -> [[f64; 3]; 3] {
    let r = vector::norm(position_m);
    let r2 = r * r;
    let r3 = r2 * r;

    let mut g = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            let delta = if i == j { 1.0 } else { 0.0 };
            g[i][j] = -mu / r3 * (delta - 3.0 * position_m[i] * position_m[j] / r2);
        }
    }
    g
}
