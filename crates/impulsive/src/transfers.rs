//! Analytic impulsive transfer planning: Hohmann, plane change, phasing.

use traj_core::state::StateVector;
use traj_core::vector;
use traj_orbits::{self as orbits, OrbitalElements};

const PI: f64 = std::f64::consts::PI;
const TWO_PI: f64 = 2.0 * PI;

/// A two-burn Hohmann transfer between circular orbits.
#[derive(Debug, Clone, Copy)]
pub struct HohmannTransfer {
    /// Semi-major axis of the transfer ellipse [m].
    pub transfer_sma_m: f64,
    /// First burn, signed: positive prograde [m/s].
    pub delta_v1_m_s: f64,
    /// Second burn, signed [m/s].
    pub delta_v2_m_s: f64,
    /// |Δv₁| + |Δv₂| [m/s].
    pub total_delta_v_m_s: f64,
    /// Half the transfer-ellipse period [s].
    pub transfer_time_s: f64,
}

/// Hohmann transfer between circular orbits of radius `r1` and `r2`.
pub fn hohmann(r1_m: f64, r2_m: f64, mu_m3_s2: f64) -> HohmannTransfer {
    let a_t = (r1_m + r2_m) / 2.0;

    let v_circ1 = (mu_m3_s2 / r1_m).sqrt();
    let v_circ2 = (mu_m3_s2 / r2_m).sqrt();
    let v_peri = (mu_m3_s2 * (2.0 / r1_m - 1.0 / a_t)).sqrt();
    let v_apo = (mu_m3_s2 * (2.0 / r2_m - 1.0 / a_t)).sqrt();

    // Signed burns: raising gives two prograde (positive) burns, lowering
    // two retrograde (negative) ones.
    let dv1 = v_peri - v_circ1;
    let dv2 = v_circ2 - v_apo;

    HohmannTransfer {
        transfer_sma_m: a_t,
        delta_v1_m_s: dv1,
        delta_v2_m_s: dv2,
        total_delta_v_m_s: dv1.abs() + dv2.abs(),
        transfer_time_s: PI * (a_t * a_t * a_t / mu_m3_s2).sqrt(),
    }
}

/// Hohmann transfer from an elliptic orbit's periapsis to a target SMA.
pub fn hohmann_from_elements(
    initial: &OrbitalElements,
    target: &OrbitalElements,
    mu_m3_s2: f64,
) -> HohmannTransfer {
    hohmann(initial.periapsis_m(), target.semi_major_axis_m, mu_m3_s2)
}

/// Delta-v for a pure plane rotation of Δi at speed v: 2 v sin(Δi/2).
pub fn plane_change_delta_v(speed_m_s: f64, delta_inclination_rad: f64) -> f64 {
    2.0 * speed_m_s * (delta_inclination_rad / 2.0).sin()
}

/// In-plane phase angle from chaser to target, in [0, 2π).
///
/// Positive when the target leads the chaser along the direction of motion.
pub fn phase_angle(chaser: &StateVector, target: &StateVector) -> f64 {
    let r1 = &chaser.position_m;
    let r2 = &target.position_m;

    let cos_angle = (vector::dot(r1, r2) / (vector::norm(r1) * vector::norm(r2))).clamp(-1.0, 1.0);
    let mut angle = cos_angle.acos();

    // Sign from the chaser's angular momentum direction.
    let cross = vector::cross(r1, r2);
    let h = chaser.angular_momentum();
    if vector::dot(&h, &cross) < 0.0 {
        angle = TWO_PI - angle;
    }
    angle
}

/// Wait time until a Hohmann departure reaches the target at arrival.
///
/// Classical coplanar circular phasing: the required departure phase is
/// π − n₂·t_transfer; the wait divides the phase deficit by the differential
/// rate. Co-orbital targets (equal rates) return zero.
pub fn hohmann_rendezvous_wait_time(
    current_phase_rad: f64,
    r1_m: f64,
    r2_m: f64,
    mu_m3_s2: f64,
) -> f64 {
    let n1 = (mu_m3_s2 / (r1_m * r1_m * r1_m)).sqrt();
    let n2 = (mu_m3_s2 / (r2_m * r2_m * r2_m)).sqrt();

    let a_t = (r1_m + r2_m) / 2.0;
    let tof = PI * (a_t * a_t * a_t / mu_m3_s2).sqrt();

    let phase_required = (PI - n2 * tof).rem_euclid(TWO_PI);
    let phase_rate = n1 - n2;

    let phase_diff = (phase_required - current_phase_rad).rem_euclid(TWO_PI);
    if phase_rate.abs() > 1.0e-10 {
        phase_diff / phase_rate.abs()
    } else {
        0.0
    }
}

/// A full coplanar rendezvous plan: wait, then Hohmann across.
#[derive(Debug, Clone, Copy)]
pub struct RendezvousPlan {
    pub phase_angle_rad: f64,
    pub wait_time_s: f64,
    pub transfer: HohmannTransfer,
    pub burn1_time_s: f64,
    pub burn2_time_s: f64,
}

/// Plan a Hohmann rendezvous between two near-circular orbits.
pub fn plan_rendezvous(
    chaser: &StateVector,
    target: &StateVector,
    current_time_s: f64,
    mu_m3_s2: f64,
) -> RendezvousPlan {
    let chaser_elem = orbits::elements_from_state(chaser, mu_m3_s2);
    let target_elem = orbits::elements_from_state(target, mu_m3_s2);

    let r1 = chaser_elem.semi_major_axis_m;
    let r2 = target_elem.semi_major_axis_m;

    let phase = phase_angle(chaser, target);
    let wait = hohmann_rendezvous_wait_time(phase, r1, r2, mu_m3_s2);
    let transfer = hohmann(r1, r2, mu_m3_s2);

    RendezvousPlan {
        phase_angle_rad: phase,
        wait_time_s: wait,
        transfer,
        burn1_time_s: current_time_s + wait,
        burn2_time_s: current_time_s + wait + transfer.transfer_time_s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use traj_core::state::CoordinateFrame;

    const MU_EARTH: f64 = 3.986_004_418e14;

    #[test]
    fn leo_to_geo_hohmann_matches_textbook_values() {
        let r_leo = 6_678_137.0;
        let r_geo = 42_164_000.0;
        let t = hohmann(r_leo, r_geo, MU_EARTH);

        // Classic LEO→GEO figures: ~2.42 + ~1.47 km/s, ~5.25 h transfer.
        assert!((t.delta_v1_m_s - 2_420.0).abs() < 30.0, "dv1 = {}", t.delta_v1_m_s);
        assert!((t.delta_v2_m_s - 1_466.0).abs() < 30.0, "dv2 = {}", t.delta_v2_m_s);
        assert!((t.transfer_time_s - 5.25 * 3600.0).abs() < 120.0);
    }

    #[test]
    fn lowering_transfer_burns_retrograde() {
        let t = hohmann(42_164_000.0, 6_678_137.0, MU_EARTH);
        assert!(t.delta_v1_m_s < 0.0);
        assert!(t.delta_v2_m_s < 0.0);
        assert!(t.total_delta_v_m_s > 0.0);
    }

    #[test]
    fn plane_change_at_right_angle_costs_sqrt_two() {
        let v = 7_500.0;
        let dv = plane_change_delta_v(v, PI / 2.0);
        assert!((dv - v * std::f64::consts::SQRT_2).abs() < 1.0e-6);
    }

    #[test]
    fn phase_angle_detects_a_leading_target() {
        let r = 7.0e6;
        let v = (MU_EARTH / r).sqrt();
        let chaser = StateVector::from_rv(
            [r, 0.0, 0.0],
            [0.0, v, 0.0],
            0.0,
            CoordinateFrame::J2000Eci,
        );
        let lead = 0.2_f64;
        let target = StateVector::from_rv(
            [r * lead.cos(), r * lead.sin(), 0.0],
            [-v * lead.sin(), v * lead.cos(), 0.0],
            0.0,
            CoordinateFrame::J2000Eci,
        );
        let phase = phase_angle(&chaser, &target);
        assert!((phase - lead).abs() < 1.0e-9);

        // Swap the roles: target now trails by the same angle.
        let reverse = phase_angle(&target, &chaser);
        assert!((reverse - (TWO_PI - lead)).abs() < 1.0e-9);
    }
}
