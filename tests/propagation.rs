use approx::assert_relative_eq;

use trajectory_lab::bodies::Body;
use trajectory_lab::core::state::{CoordinateFrame, StateVector};
use trajectory_lab::core::time::J2000_JD;
use trajectory_lab::core::vector;
use trajectory_lab::forces::{ForceModel, ForceModelConfig};
use trajectory_lab::orbits::{self, OrbitalElements};
use trajectory_lab::propagators::{self, AdaptiveConfig};

const MU_EARTH: f64 = 3.986_004_418e14;

fn leo_elements() -> OrbitalElements {
    OrbitalElements {
        semi_major_axis_m: 6_778_137.0,
        eccentricity: 0.001,
        inclination_rad: 51.6_f64.to_radians(),
        raan_rad: 0.0,
        arg_periapsis_rad: 0.0,
        true_anomaly_rad: 0.0,
        mean_anomaly_rad: 0.0,
    }
}

#[test]
fn rk4_energy_and_momentum_hold_over_one_period() {
    let elements = leo_elements();
    let state = orbits::state_from_elements(&elements, MU_EARTH);
    let period = elements.period_s(MU_EARTH);

    let model = ForceModel::new(ForceModelConfig::for_body(Body::Earth), J2000_JD);
    let deriv = |s: &StateVector| model.derivative(s);
    let final_state = propagators::propagate_rk4(&state, period, 60.0, &deriv);

    let e0 = state.specific_energy(MU_EARTH);
    let e1 = final_state.specific_energy(MU_EARTH);
    assert!(((e1 - e0) / e0).abs() < 1.0e-6);

    let h0 = vector::norm(&state.angular_momentum());
    let h1 = vector::norm(&final_state.angular_momentum());
    assert!(((h1 - h0) / h0).abs() < 1.0e-8);
}

#[test]
fn j2_regresses_the_node_at_the_secular_rate() {
    // ISS-like orbit; expected dΩ/dt = −1.5 n J2 (R/p)² cos i ≈ −1.03e-6
    // rad/s, about −5.6e-3 rad over one orbit.
    let elements = leo_elements();
    let state = orbits::state_from_elements(&elements, MU_EARTH);

    let mut config = ForceModelConfig::for_body(Body::Earth);
    config.include_j2 = true;
    let model = ForceModel::new(config, J2000_JD);
    let deriv = |s: &StateVector| model.derivative(s);

    let final_state = propagators::propagate_rk4(&state, 5_400.0, 10.0, &deriv);
    let final_elements = orbits::elements_from_state(&final_state, MU_EARTH);

    // Signed RAAN change, wrapped to (−π, π].
    let mut d_raan = final_elements.raan_rad - elements.raan_rad;
    if d_raan > std::f64::consts::PI {
        d_raan -= 2.0 * std::f64::consts::PI;
    }

    assert!(
        d_raan < -3.5e-3 && d_raan > -8.0e-3,
        "nodal drift over one orbit: {d_raan} rad"
    );
}

#[test]
fn adaptive_propagation_matches_rk4_on_two_body() {
    let elements = leo_elements();
    let state = orbits::state_from_elements(&elements, MU_EARTH);

    let model = ForceModel::new(ForceModelConfig::for_body(Body::Earth), J2000_JD);
    let deriv = |s: &StateVector| model.derivative(s);

    let duration = 3.0 * 3_600.0;
    let fixed = propagators::propagate_rk4(&state, duration, 5.0, &deriv);
    let config = AdaptiveConfig {
        abs_tolerance: 1.0e-3,
        rel_tolerance: 1.0e-12,
        ..AdaptiveConfig::earth_orbit()
    };
    let adaptive = propagators::propagate(&state, duration, &deriv, &config, 0.0);

    let miss = vector::norm(&vector::sub(
        &adaptive.final_state.position_m,
        &fixed.position_m,
    ));
    assert!(miss < 20.0, "integrator disagreement = {miss} m");
}

#[test]
fn sampled_trajectories_are_time_ordered() {
    let elements = leo_elements();
    let state = orbits::state_from_elements(&elements, MU_EARTH);
    let model = ForceModel::new(ForceModelConfig::for_body(Body::Earth), J2000_JD);
    let deriv = |s: &StateVector| model.derivative(s);

    let result = propagators::propagate(
        &state,
        7_200.0,
        &deriv,
        &AdaptiveConfig::earth_orbit(),
        30.0,
    );

    assert!(result.samples.len() > 100);
    for pair in result.samples.windows(2) {
        assert!(pair[1].time_s >= pair[0].time_s, "samples out of order");
    }
    assert_relative_eq!(result.final_state.time_s, 7_200.0, epsilon = 1.0e-6);
}

#[test]
fn propagate_until_finds_an_altitude_crossing() {
    // Eccentric orbit: start at perigee, stop when altitude first exceeds
    // 2000 km on the way out.
    let elements = OrbitalElements {
        semi_major_axis_m: 9_378_137.0,
        eccentricity: 0.2,
        ..leo_elements()
    };
    let state = orbits::state_from_elements(&elements, MU_EARTH);
    let model = ForceModel::new(ForceModelConfig::for_body(Body::Earth), J2000_JD);
    let deriv = |s: &StateVector| model.derivative(s);

    let radius_limit = Body::Earth.constants().radius_m + 2_000.0e3;
    let crossed = propagators::propagate_until(
        &state,
        &deriv,
        |s| s.radius_m() > radius_limit,
        &AdaptiveConfig::earth_orbit(),
        2.0 * elements.period_s(MU_EARTH),
    );

    assert!(crossed.radius_m() > radius_limit);
    assert!(crossed.time_s < elements.period_s(MU_EARTH));
}

#[test]
fn state_element_round_trip_across_the_elliptic_domain() {
    for &a in &[7.0e6, 2.0e7, 2.0e8] {
        for &e in &[0.0, 0.1, 0.45, 0.89] {
            for &nu_deg in &[0.0, 90.0, 215.0] {
                let elements = OrbitalElements {
                    semi_major_axis_m: a,
                    eccentricity: e,
                    inclination_rad: 0.7,
                    raan_rad: 2.1,
                    arg_periapsis_rad: 1.3,
                    true_anomaly_rad: nu_deg * std::f64::consts::PI / 180.0,
                    mean_anomaly_rad: 0.0,
                };
                let state = orbits::state_from_elements(&elements, MU_EARTH);
                let back = orbits::elements_from_state(&state, MU_EARTH);

                assert_relative_eq!(
                    back.semi_major_axis_m,
                    elements.semi_major_axis_m,
                    max_relative = 1.0e-10
                );
                assert!((back.eccentricity - e).abs() < 1.0e-10, "a={a} e={e}");
                if e > 1.0e-10 {
                    let d_nu = (back.true_anomaly_rad - elements.true_anomaly_rad)
                        .rem_euclid(2.0 * std::f64::consts::PI);
                    let d_nu = d_nu.min(2.0 * std::f64::consts::PI - d_nu);
                    assert!(d_nu < 1.0e-9, "anomaly mismatch {d_nu}");
                }
            }
        }
    }
}

#[test]
fn kepler_solver_meets_the_residual_budget() {
    for &e in &[0.0, 0.1, 0.5, 0.9, 0.99] {
        for k in 0..1000 {
            let m = 2.0 * std::f64::consts::PI * (k as f64) / 1000.0;
            let e_anom = orbits::solve_kepler(m, e, 1.0e-12);
            let residual = (e_anom - e * e_anom.sin() - m).abs();
            assert!(residual < 1.0e-10, "e={e} M={m}: residual {residual}");
        }
    }
}

#[test]
fn forced_min_step_is_reported_not_hidden() {
    // An absurdly tight tolerance with a coarse minimum step forces the
    // controller below dt_min immediately.
    let elements = leo_elements();
    let state = orbits::state_from_elements(&elements, MU_EARTH);
    let model = ForceModel::new(ForceModelConfig::for_body(Body::Earth), J2000_JD);
    let deriv = |s: &StateVector| model.derivative(s);

    let config = AdaptiveConfig {
        dt_min: 50.0,
        dt_max: 600.0,
        abs_tolerance: 1.0e-12,
        rel_tolerance: 1.0e-16,
        safety_factor: 0.9,
        max_steps: 200,
    };
    let result = propagators::propagate(&state, 1_000.0, &deriv, &config, 0.0);
    assert!(result.forced_min_steps > 0);
}
