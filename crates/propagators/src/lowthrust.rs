//! Two-level low-thrust propagation loop with mass tracking.
//!
//! The adaptive integrator advances the trajectory while this loop owns
//! propellant depletion: after each accepted step the consumed mass
//! T_actual · Δt / (Isp · g₀) is removed and the force model receives the
//! updated snapshot. A 1 % initial-mass floor zeroes thrust when reached.
//! No mass is mutated inside a derivative evaluation, so the integrator's
//! repeated stage calls cannot double-count.

use log::debug;

use traj_core::constants::G0;
use traj_core::state::StateVector;
use traj_core::vector;
use traj_forces::ForceModel;

use crate::adaptive::{AdaptiveConfig, adaptive_step};

/// Result of a mass-tracked low-thrust propagation.
#[derive(Debug, Clone)]
pub struct LowThrustPropagation {
    /// Sampled states (initial and final included when sampling).
    pub samples: Vec<StateVector>,
    /// Spacecraft mass after the propagation [kg].
    pub final_mass_kg: f64,
    /// Accepted adaptive steps.
    pub steps: usize,
    /// True when the dry-mass floor was reached and thrust shut down.
    pub propellant_exhausted: bool,
}

/// Propagate under a low-thrust force model, tracking propellant mass.
///
/// The model must carry a `LowThrustConfig`; its `mass_kg` is taken as the
/// initial mass. Returns the trajectory samples and the final mass; the
/// caller re-supplies the mass to continue a later segment.
pub fn propagate_low_thrust(
    initial: &StateVector,
    duration_s: f64,
    mut model: ForceModel,
    config: &AdaptiveConfig,
    sample_interval_s: f64,
) -> LowThrustPropagation {
    let initial_mass = model
        .config()
        .low_thrust
        .map(|lt| lt.mass_kg)
        .unwrap_or(0.0);
    let dry_mass_floor = initial_mass * 0.01;

    let mut mass = initial_mass;
    let mut propellant_exhausted = false;

    let mut samples = Vec::new();
    let mut current = *initial;
    let mut t_elapsed = 0.0;
    let mut next_sample = sample_interval_s;
    let mut dt_try = config.dt_min * 10.0;

    if sample_interval_s > 0.0 {
        samples.push(current);
    }

    let mut steps = 0;
    while t_elapsed < duration_s && steps < config.max_steps {
        let dt_attempt = dt_try.min(duration_s - t_elapsed);
        if dt_attempt < 1.0e-10 {
            break;
        }

        let result = adaptive_step(&current, dt_attempt, &|s| model.derivative(s), config);
        let dt_used = result.dt_used;
        t_elapsed += dt_used;

        // Deplete propellant from the thrust actually delivered over the
        // step, evaluated at the midpoint radius.
        if let Some(lt) = model.config().low_thrust {
            if mass > dry_mass_floor {
                let midpoint = StateVector {
                    position_m: vector::scale(
                        &vector::add(&current.position_m, &result.state.position_m),
                        0.5,
                    ),
                    time_s: 0.5 * (current.time_s + result.state.time_s),
                    ..current
                };
                let solar_distance = model.solar_distance_m(&midpoint);
                let thrust = lt.actual_thrust_n(solar_distance);
                let dm = thrust / (lt.isp_s * G0) * dt_used;
                mass = (mass - dm).max(dry_mass_floor);

                if mass <= dry_mass_floor {
                    debug!(
                        "propellant exhausted at t = {:.0} s; thrust disabled",
                        result.state.time_s
                    );
                    propellant_exhausted = true;
                    model.disable_low_thrust();
                } else {
                    model.set_low_thrust_mass(mass);
                }
            }
        }

        current = result.state;
        dt_try = result.dt_next;
        steps += 1;

        if sample_interval_s > 0.0 && t_elapsed >= next_sample {
            samples.push(current);
            next_sample += sample_interval_s;
        }
    }

    // Always include the final state.
    match samples.last() {
        Some(last) if last.time_s == current.time_s => {}
        _ => samples.push(current),
    }

    LowThrustPropagation {
        samples,
        final_mass_kg: mass,
        steps,
        propellant_exhausted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use traj_core::constants::{AU_M, SUN_MU};
    use traj_core::state::CoordinateFrame;
    use traj_core::time::J2000_JD;
    use traj_forces::{ForceModelConfig, LowThrustConfig, ThrustPointing};

    fn cruise_state() -> StateVector {
        let v_circ = (SUN_MU / AU_M).sqrt();
        StateVector::from_rv(
            [AU_M, 0.0, 0.0],
            [0.0, v_circ, 0.0],
            0.0,
            CoordinateFrame::HeliocentricJ2000,
        )
    }

    fn thrusting_model(mass_kg: f64) -> ForceModel {
        let config = ForceModelConfig::heliocentric().with_low_thrust(LowThrustConfig {
            thrust_n: 0.2,
            isp_s: 3_000.0,
            pointing: ThrustPointing::Prograde,
            solar_scaling: false,
            mass_kg,
        });
        ForceModel::new(config, J2000_JD)
    }

    #[test]
    fn mass_decreases_at_the_rocket_equation_rate() {
        let duration = 10.0 * 86_400.0;
        let result = propagate_low_thrust(
            &cruise_state(),
            duration,
            thrusting_model(1_000.0),
            &AdaptiveConfig::interplanetary(),
            0.0,
        );

        // Constant thrust: dm = T/(Isp g0) * t.
        let expected = 1_000.0 - 0.2 / (3_000.0 * G0) * duration;
        assert!(
            (result.final_mass_kg - expected).abs() < 0.05,
            "final mass {} vs expected {expected}",
            result.final_mass_kg
        );
        assert!(!result.propellant_exhausted);
    }

    #[test]
    fn thrust_raises_orbital_energy() {
        let initial = cruise_state();
        let result = propagate_low_thrust(
            &initial,
            30.0 * 86_400.0,
            thrusting_model(500.0),
            &AdaptiveConfig::interplanetary(),
            0.0,
        );
        let final_state = result.samples.last().unwrap();
        assert!(final_state.specific_energy(SUN_MU) > initial.specific_energy(SUN_MU));
    }

    #[test]
    fn dry_mass_floor_stops_depletion() {
        // Tiny craft with huge thrust burns to the floor quickly.
        let mut model = thrusting_model(1.0);
        model.set_low_thrust_mass(1.0);
        let result = propagate_low_thrust(
            &cruise_state(),
            30.0 * 86_400.0,
            model,
            &AdaptiveConfig::interplanetary(),
            0.0,
        );
        assert!(result.propellant_exhausted);
        assert!((result.final_mass_kg - 0.01).abs() < 1.0e-9);
    }
}
