//! Aerobraking pass simulation.
//!
//! One atmospheric pass is integrated under two-body + J2 gravity plus
//! drag, reporting the heating and load peaks and the resulting orbit.

use thiserror::Error;

use traj_bodies::Body;
use traj_core::frames;
use traj_core::state::{StateDerivative, StateVector};
use traj_core::vector;
use traj_forces::{atmosphere, gravity};
use traj_orbits as orbits;
use traj_propagators::rk4_step;

/// Atmospheric entry interface altitude [m].
pub const ENTRY_INTERFACE_M: f64 = 120_000.0;

/// A pass is cut off after this wall time of simulated flight [s].
const MAX_PASS_DURATION_S: f64 = 600.0;

/// Vehicle aerodynamic properties for an aerobraking pass.
#[derive(Debug, Clone, Copy)]
pub struct AerobrakeVehicle {
    pub mass_kg: f64,
    pub drag_coefficient: f64,
    pub cross_section_m2: f64,
    /// Stagnation nose radius for the Sutton–Graves heating estimate [m].
    pub nose_radius_m: f64,
}

/// Outcome of a single aerobraking pass.
#[derive(Debug, Clone, Copy)]
pub struct AerobrakePassResult {
    pub entry_altitude_m: f64,
    pub entry_velocity_m_s: f64,
    /// Flight-path angle at entry, negative descending [rad].
    pub entry_flight_path_rad: f64,
    pub min_altitude_m: f64,
    /// Peak deceleration in g₀ multiples.
    pub max_g_load: f64,
    /// Peak stagnation heat flux [W/m²].
    pub max_heat_flux_w_m2: f64,
    /// Peak dynamic pressure [Pa].
    pub max_dynamic_pressure_pa: f64,
    /// Time-integrated heat load [J/m²].
    pub total_heat_load_j_m2: f64,
    pub pass_duration_s: f64,
    pub exit_velocity_m_s: f64,
    /// Speed lost to drag across the pass [m/s].
    pub delta_v_loss_m_s: f64,
    /// Post-pass apoapsis altitude [m].
    pub new_apoapsis_alt_m: f64,
    /// Post-pass periapsis altitude [m].
    pub new_periapsis_alt_m: f64,
    pub new_eccentricity: f64,
    /// The vehicle reached the surface during the pass.
    pub impacted: bool,
}

#[derive(Debug, Error)]
pub enum AerobrakeError {
    #[error("vehicle mass must be positive")]
    InvalidMass,
    #[error("drag reference area must be positive")]
    InvalidArea,
}

/// Whether an orbit dips below the entry interface.
pub fn will_enter_atmosphere(state: &StateVector, mu_m3_s2: f64) -> bool {
    let earth_radius = Body::Earth.constants().radius_m;
    let elements = orbits::elements_from_state(state, mu_m3_s2);
    elements.periapsis_m() - earth_radius < ENTRY_INTERFACE_M
}

/// Simulate one pass through the atmosphere from an entry state.
///
/// Drag acts on the Earth-relative velocity with the extended density
/// profile (no Kármán cutoff), gravity is two-body + J2. The pass ends
/// when the vehicle climbs back through the entry interface, impacts, or
/// exceeds the pass time cap.
pub fn simulate_pass(
    entry_state: &StateVector,
    vehicle: &AerobrakeVehicle,
    dt_s: f64,
) -> Result<AerobrakePassResult, AerobrakeError> {
    if vehicle.mass_kg <= 0.0 {
        return Err(AerobrakeError::InvalidMass);
    }
    if vehicle.cross_section_m2 <= 0.0 {
        return Err(AerobrakeError::InvalidArea);
    }

    let earth = Body::Earth.constants();
    let earth_radius = earth.radius_m;

    let entry_altitude = entry_state.radius_m() - earth_radius;
    let entry_velocity = entry_state.speed_m_s();

    // Flight-path angle from the radial velocity component.
    let r_dot_v = vector::dot(&entry_state.position_m, &entry_state.velocity_m_s);
    let entry_flight_path = (r_dot_v / (entry_state.radius_m() * entry_velocity)).asin();

    let deriv = |s: &StateVector| {
        let mut acc = gravity::two_body(&s.position_m, earth.mu_m3_s2);
        acc = vector::add(
            &acc,
            &gravity::j2_perturbation(&s.position_m, earth.mu_m3_s2, earth.j2, earth_radius),
        );

        let alt = s.radius_m() - earth_radius;
        let rho = atmosphere::earth::density_extended(alt.max(0.0));
        if rho > 1.0e-15 {
            let v_rel = frames::earth_relative_velocity(&s.position_m, &s.velocity_m_s);
            let force = atmosphere::drag_force(
                &v_rel,
                rho,
                vehicle.drag_coefficient,
                vehicle.cross_section_m2,
            );
            acc = vector::add(&acc, &vector::scale(&force, 1.0 / vehicle.mass_kg));
        }

        StateDerivative::new(s.velocity_m_s, acc)
    };

    let mut state = *entry_state;
    let mut result = AerobrakePassResult {
        entry_altitude_m: entry_altitude,
        entry_velocity_m_s: entry_velocity,
        entry_flight_path_rad: entry_flight_path,
        min_altitude_m: entry_altitude,
        max_g_load: 0.0,
        max_heat_flux_w_m2: 0.0,
        max_dynamic_pressure_pa: 0.0,
        total_heat_load_j_m2: 0.0,
        pass_duration_s: 0.0,
        exit_velocity_m_s: entry_velocity,
        delta_v_loss_m_s: 0.0,
        new_apoapsis_alt_m: 0.0,
        new_periapsis_alt_m: 0.0,
        new_eccentricity: 0.0,
        impacted: false,
    };

    let mut time = 0.0;
    let mut prev_altitude = entry_altitude;
    let mut descending = true;

    loop {
        let altitude = state.radius_m() - earth_radius;
        let velocity = state.speed_m_s();

        if altitude < result.min_altitude_m {
            result.min_altitude_m = altitude;
        }

        if altitude > prev_altitude {
            descending = false;
        } else if altitude < prev_altitude {
            descending = true;
        }
        if !descending && altitude > ENTRY_INTERFACE_M {
            break;
        }

        // Aerothermal environment at this sample.
        let rho = atmosphere::earth::density_extended(altitude.max(0.0));
        let q = atmosphere::dynamic_pressure(velocity, rho);
        let heat_flux = atmosphere::heat_flux(velocity, rho, vehicle.nose_radius_m);
        let drag_mag =
            q * vehicle.drag_coefficient * vehicle.cross_section_m2;
        let g_load = atmosphere::g_load(drag_mag, vehicle.mass_kg);

        result.max_dynamic_pressure_pa = result.max_dynamic_pressure_pa.max(q);
        result.max_heat_flux_w_m2 = result.max_heat_flux_w_m2.max(heat_flux);
        result.max_g_load = result.max_g_load.max(g_load);
        result.total_heat_load_j_m2 += heat_flux * dt_s;

        state = rk4_step(&state, dt_s, &deriv);
        time += dt_s;
        prev_altitude = altitude;

        if time > MAX_PASS_DURATION_S {
            break;
        }
        if altitude < 0.0 {
            result.min_altitude_m = 0.0;
            result.impacted = true;
            break;
        }
    }

    result.exit_velocity_m_s = state.speed_m_s();
    result.delta_v_loss_m_s = entry_velocity - result.exit_velocity_m_s;
    result.pass_duration_s = time;

    let elements = orbits::elements_from_state(&state, earth.mu_m3_s2);
    result.new_eccentricity = elements.eccentricity;
    result.new_apoapsis_alt_m = elements.apoapsis_m() - earth_radius;
    result.new_periapsis_alt_m = elements.periapsis_m() - earth_radius;

    Ok(result)
}

/// Estimate the remaining passes to lower apoapsis to a target.
///
/// Empirical heuristic, not a law: each pass is assumed to remove
/// Δv ≈ 50 + 2·(interface − perigee)/1000 m/s, compared against the
/// vis-viva Δv between the current and target apoapsis at constant
/// perigee. `None` when the orbit does not reach the atmosphere.
pub fn estimate_passes_needed(
    initial_apogee_alt_m: f64,
    initial_perigee_alt_m: f64,
    target_apogee_alt_m: f64,
) -> Option<usize> {
    if initial_perigee_alt_m > ENTRY_INTERFACE_M {
        return None;
    }

    let earth = Body::Earth.constants();
    let perigee_depth = ENTRY_INTERFACE_M - initial_perigee_alt_m;
    let dv_per_pass = 50.0 + 2.0 * perigee_depth / 1000.0;

    let r_a_initial = earth.radius_m + initial_apogee_alt_m;
    let r_a_target = earth.radius_m + target_apogee_alt_m;
    let r_p = earth.radius_m + initial_perigee_alt_m;

    let v_p_initial =
        (earth.mu_m3_s2 * (2.0 / r_p - 1.0 / ((r_a_initial + r_p) / 2.0))).sqrt();
    let v_p_target =
        (earth.mu_m3_s2 * (2.0 / r_p - 1.0 / ((r_a_target + r_p) / 2.0))).sqrt();

    let total_dv = v_p_initial - v_p_target;
    Some(((total_dv / dv_per_pass).ceil() as usize).max(1))
}
