use trajectory_lab::core::constants::{AU_M, SUN_MU};
use trajectory_lab::core::state::{CoordinateFrame, StateVector};
use trajectory_lab::core::vector;
use trajectory_lab::impulsive::lambert;
use trajectory_lab::propagators::{AdaptiveConfig, propagate};

const MU_EARTH: f64 = 3.986_004_418e14;

fn two_body_deriv(mu: f64) -> impl Fn(&StateVector) -> trajectory_lab::core::state::StateDerivative {
    move |s: &StateVector| {
        let r = s.radius_m();
        let coeff = -mu / (r * r * r);
        trajectory_lab::core::state::StateDerivative::new(
            s.velocity_m_s,
            vector::scale(&s.position_m, coeff),
        )
    }
}

#[test]
fn heliocentric_transfer_round_trips_through_propagation() {
    // Earth-like to Mars-like geometry, 210-day transfer.
    let r1 = [AU_M, 0.0, 0.0];
    let theta: f64 = 135.0_f64.to_radians();
    let r2 = [
        1.524 * AU_M * theta.cos(),
        1.524 * AU_M * theta.sin(),
        0.0,
    ];
    let tof = 210.0 * 86_400.0;

    let sol = lambert::lambert(&r1, &r2, tof, SUN_MU, true);
    assert!(sol.valid);

    let initial = StateVector::from_rv(r1, sol.v1_m_s, 0.0, CoordinateFrame::HeliocentricJ2000);
    let config = AdaptiveConfig {
        rel_tolerance: 1.0e-11,
        ..AdaptiveConfig::interplanetary()
    };
    let result = propagate(&initial, tof, &two_body_deriv(SUN_MU), &config, 0.0);
    let final_state = &result.final_state;

    // Position closes to the bisection tolerance (1 s of arc motion).
    let miss = vector::norm(&vector::sub(&final_state.position_m, &r2));
    assert!(miss < 100.0e3, "arrival miss = {} km", miss / 1000.0);

    // Arrival velocity agrees with the f-g solution.
    let dv = vector::norm(&vector::sub(&final_state.velocity_m_s, &sol.v2_m_s));
    assert!(dv < 0.05, "arrival velocity error = {dv} m/s");
}

#[test]
fn geo_intercept_reaches_the_leading_target() {
    // Target 1° ahead on the same GEO orbit, 12-hour transfer.
    let r_geo = 42_164_000.0;
    let r1 = [r_geo, 0.0, 0.0];
    let lead: f64 = 1.0_f64.to_radians();
    let r2 = [r_geo * lead.cos(), r_geo * lead.sin(), 0.0];
    let tof = 12.0 * 3600.0;

    let sol = lambert::lambert(&r1, &r2, tof, MU_EARTH, true);
    assert!(sol.valid);

    let initial = StateVector::from_rv(r1, sol.v1_m_s, 0.0, CoordinateFrame::J2000Eci);
    let config = AdaptiveConfig {
        rel_tolerance: 1.0e-12,
        ..AdaptiveConfig::earth_orbit()
    };
    let result = propagate(&initial, tof, &two_body_deriv(MU_EARTH), &config, 0.0);
    let miss = vector::norm(&vector::sub(&result.final_state.position_m, &r2));
    assert!(miss < 20.0e3, "intercept miss = {} km", miss / 1000.0);

    // The single-revolution arc spanning 1° in half a day is a steep
    // near-radial ellipse; the burn off the circular orbit is large but
    // finite. (Cheap phasing solutions are multi-revolution, which this
    // solver does not model.)
    let v_circ = (MU_EARTH / r_geo).sqrt();
    let dv1 = vector::norm(&vector::sub(&sol.v1_m_s, &[0.0, v_circ, 0.0]));
    assert!(dv1 > 100.0 && dv1 < 10_000.0, "departure dv = {dv1} m/s");
}

#[test]
fn lambert_velocities_satisfy_the_vis_viva_energy() {
    let r1 = [AU_M, 0.0, 0.0];
    let r2 = [0.0, 1.3 * AU_M, 0.0];
    let tof = 250.0 * 86_400.0;

    let sol = lambert::lambert(&r1, &r2, tof, SUN_MU, true);
    assert!(sol.valid);

    // Both endpoint speeds must agree with vis-viva for the returned SMA.
    for (r_vec, v_vec) in [(&r1, &sol.v1_m_s), (&r2, &sol.v2_m_s)] {
        let r = vector::norm(r_vec);
        let v = vector::norm(v_vec);
        let v_expected = (SUN_MU * (2.0 / r - 1.0 / sol.semi_major_axis_m)).sqrt();
        assert!(
            ((v - v_expected) / v_expected).abs() < 1.0e-6,
            "speed {v} vs vis-viva {v_expected}"
        );
    }
}

#[test]
fn degenerate_and_out_of_domain_inputs_are_flagged() {
    // Zero mu.
    assert!(!lambert::lambert(&[AU_M, 0.0, 0.0], &[0.0, AU_M, 0.0], 1.0e6, 0.0, true).valid);
    // Collinear geometry (180° transfer has an undefined plane).
    assert!(
        !lambert::lambert(&[AU_M, 0.0, 0.0], &[-AU_M, 0.0, 0.0], 1.0e7, SUN_MU, true).valid
    );
}
