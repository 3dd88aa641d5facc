//! Staged ascent propagation in ECI.

use log::debug;

use traj_bodies::Body;
use traj_core::frames;
use traj_core::state::StateVector;
use traj_core::vector::{self, Vector3};
use traj_forces::atmosphere;
use traj_forces::gravity;

use crate::{AscentProfile, LaunchSite, RocketStage};

/// Drag is evaluated below this altitude [m].
const DRAG_CEILING_M: f64 = 200_000.0;

/// Altitude of the initial vertical rise before steering engages [m].
const VERTICAL_RISE_M: f64 = 200.0;

/// Vehicle definition for an ascent.
#[derive(Debug, Clone)]
pub struct AscentVehicle {
    pub stages: Vec<RocketStage>,
    pub payload_mass_kg: f64,
    pub drag_coefficient: f64,
    pub reference_area_m2: f64,
}

impl AscentVehicle {
    /// Gross liftoff mass [kg].
    pub fn liftoff_mass_kg(&self) -> f64 {
        self.payload_mass_kg
            + self
                .stages
                .iter()
                .map(|s| s.dry_mass_kg + s.propellant_mass_kg)
                .sum::<f64>()
    }

    /// Stack mass with stages below `stage` jettisoned and the given
    /// propellant remaining in the active stage.
    fn stack_mass_kg(&self, stage: usize, propellant_remaining_kg: f64) -> f64 {
        let mut mass = self.payload_mass_kg + propellant_remaining_kg;
        for (i, s) in self.stages.iter().enumerate() {
            if i == stage {
                mass += s.dry_mass_kg;
            } else if i > stage {
                mass += s.dry_mass_kg + s.propellant_mass_kg;
            }
        }
        mass
    }
}

/// A named event along the ascent (ignition, staging, burnout).
#[derive(Debug, Clone)]
pub struct AscentEvent {
    pub time_s: f64,
    pub name: String,
    pub altitude_m: f64,
    pub speed_m_s: f64,
}

/// Ascent propagation output.
#[derive(Debug, Clone)]
pub struct AscentResult {
    /// Recorded trajectory (one sample per `record_interval_s`).
    pub trajectory: Vec<StateVector>,
    pub final_state: StateVector,
    pub final_mass_kg: f64,
    pub events: Vec<AscentEvent>,
    /// Time of final-stage burnout [s].
    pub burnout_time_s: f64,
}

const R_POLAR_M: f64 = 6_356_752.314;

/// Ellipsoidal Earth radius beneath a position, from the geocentric
/// latitude. A spherical radius would put a mid-latitude pad kilometres
/// underground.
fn local_earth_radius_m(position: &Vector3) -> f64 {
    let r = vector::norm(position);
    let equatorial = Body::Earth.constants().radius_m;
    if r < 1.0 {
        return equatorial;
    }
    let sin_lat = position[2] / r;
    let cos_lat = (1.0 - sin_lat * sin_lat).sqrt();
    let a2 = equatorial * equatorial;
    let b2 = R_POLAR_M * R_POLAR_M;
    let num = (a2 * cos_lat).powi(2) + (b2 * sin_lat).powi(2);
    let den = (equatorial * cos_lat).powi(2) + (R_POLAR_M * sin_lat).powi(2);
    (num / den).sqrt()
}

/// Altitude above the local ellipsoid surface.
fn altitude_m(position: &Vector3) -> f64 {
    vector::norm(position) - local_earth_radius_m(position)
}

/// Thrust direction for the current steering law.
///
/// Below the vertical-rise altitude the vehicle flies radially; afterwards
/// the pitch polynomial blends radial and azimuth-horizontal components,
/// with yaw rotating the horizontal direction in the local plane.
fn thrust_direction(
    position: &Vector3,
    profile: &AscentProfile,
    stage: usize,
    t_since_ignition_s: f64,
) -> Vector3 {
    let Some(r_hat) = vector::normalize(position) else {
        return [0.0, 0.0, 1.0];
    };

    if altitude_m(position) < VERTICAL_RISE_M {
        return r_hat;
    }

    // Local horizontal basis: east = ẑ × r̂, north completes it.
    let east_raw = [-r_hat[1], r_hat[0], 0.0];
    let east = match vector::normalize(&east_raw) {
        Some(e) => e,
        None => return r_hat, // polar singularity: keep flying radially
    };
    let north = vector::cross(&r_hat, &east);

    let pitch = profile.pitch_at(stage, t_since_ignition_s);
    let heading = profile.azimuth_rad + profile.yaw_at(stage, t_since_ignition_s);

    let horizontal = vector::add(
        &vector::scale(&north, heading.cos()),
        &vector::scale(&east, heading.sin()),
    );

    vector::add(
        &vector::scale(&r_hat, pitch.cos()),
        &vector::scale(&horizontal, pitch.sin()),
    )
}

struct AscentDerivs {
    acceleration: Vector3,
    mass_flow: f64,
}

fn ascent_derivs(
    position: &Vector3,
    velocity: &Vector3,
    mass: f64,
    thrust_dir: Option<&Vector3>,
    stage: Option<&RocketStage>,
    vehicle: &AscentVehicle,
) -> AscentDerivs {
    let earth = Body::Earth.constants();

    let mut acc = gravity::two_body(position, earth.mu_m3_s2);
    acc = vector::add(
        &acc,
        &gravity::j2_perturbation(position, earth.mu_m3_s2, earth.j2, earth.radius_m),
    );

    let mut mass_flow = 0.0;
    if let (Some(dir), Some(stg)) = (thrust_dir, stage) {
        let alt = altitude_m(position).max(0.0);
        acc = vector::add(&acc, &vector::scale(dir, stg.thrust_n / mass));
        mass_flow = stg.mass_flow_kg_s(alt);
    }

    let alt = altitude_m(position);
    if (0.0..DRAG_CEILING_M).contains(&alt) {
        let v_rel = frames::earth_relative_velocity(position, velocity);
        let rho = atmosphere::earth::density_extended(alt);
        if rho > 1.0e-15 {
            let force = atmosphere::drag_force(
                &v_rel,
                rho,
                vehicle.drag_coefficient,
                vehicle.reference_area_m2,
            );
            acc = vector::add(&acc, &vector::scale(&force, 1.0 / mass));
        }
    }

    AscentDerivs {
        acceleration: acc,
        mass_flow,
    }
}

/// Fly an ascent profile with fixed-step RK4, staging as propellant runs
/// out, then coasting for the profile's terminal coast.
pub fn fly_ascent(
    vehicle: &AscentVehicle,
    site: &LaunchSite,
    profile: &AscentProfile,
    dt_s: f64,
    record_interval_s: f64,
) -> AscentResult {
    let mut state = site.initial_state();
    let mut stage = 0usize;
    let mut propellant: Vec<f64> = vehicle.stages.iter().map(|s| s.propellant_mass_kg).collect();
    let mut stage_ignition_time = 0.0;

    let mut trajectory = vec![state];
    let mut events = vec![AscentEvent {
        time_s: 0.0,
        name: "ignition".to_string(),
        altitude_m: altitude_m(&state.position_m),
        speed_m_s: state.speed_m_s(),
    }];
    let mut next_record = record_interval_s;
    let mut burnout_time_s = 0.0;

    // Powered flight through all stages.
    while stage < vehicle.stages.len() {
        let stg = vehicle.stages[stage];
        let mass = vehicle.stack_mass_kg(stage, propellant[stage]);

        let t_ignition = stage_ignition_time;
        let dir = thrust_direction(
            &state.position_m,
            profile,
            stage,
            state.time_s - t_ignition,
        );

        // RK4 on position and velocity, with mass frozen over the step.
        let deriv = |pos: &Vector3, vel: &Vector3| {
            ascent_derivs(pos, vel, mass, Some(&dir), Some(&stg), vehicle)
        };

        let p0 = state.position_m;
        let v0 = state.velocity_m_s;

        let d1 = deriv(&p0, &v0);
        let p2 = vector::add_scaled(&p0, &v0, 0.5 * dt_s);
        let v2 = vector::add_scaled(&v0, &d1.acceleration, 0.5 * dt_s);
        let d2 = deriv(&p2, &v2);
        let p3 = vector::add_scaled(&p0, &v2, 0.5 * dt_s);
        let v3 = vector::add_scaled(&v0, &d2.acceleration, 0.5 * dt_s);
        let d3 = deriv(&p3, &v3);
        let p4 = vector::add_scaled(&p0, &v3, dt_s);
        let v4 = vector::add_scaled(&v0, &d3.acceleration, dt_s);
        let d4 = deriv(&p4, &v4);

        for i in 0..3 {
            state.position_m[i] +=
                dt_s * (v0[i] + 2.0 * v2[i] + 2.0 * v3[i] + v4[i]) / 6.0;
            state.velocity_m_s[i] += dt_s
                * (d1.acceleration[i]
                    + 2.0 * d2.acceleration[i]
                    + 2.0 * d3.acceleration[i]
                    + d4.acceleration[i])
                / 6.0;
        }
        state.time_s += dt_s;

        // Propellant burned over the step.
        propellant[stage] -= d1.mass_flow * dt_s;

        if propellant[stage] <= 0.0 {
            propellant[stage] = 0.0;
            debug!(
                "stage {} separation at t = {:.1} s, alt = {:.1} km",
                stage + 1,
                state.time_s,
                altitude_m(&state.position_m) / 1000.0
            );
            events.push(AscentEvent {
                time_s: state.time_s,
                name: format!("stage {} separation", stage + 1),
                altitude_m: altitude_m(&state.position_m),
                speed_m_s: state.speed_m_s(),
            });
            stage += 1;
            stage_ignition_time = state.time_s;
            if stage >= vehicle.stages.len() {
                burnout_time_s = state.time_s;
            }
        }

        if record_interval_s > 0.0 && state.time_s >= next_record {
            trajectory.push(state);
            next_record += record_interval_s;
        }

        // Terminate a failed ascent that falls back below the pad.
        if altitude_m(&state.position_m) < -100.0 {
            events.push(AscentEvent {
                time_s: state.time_s,
                name: "impact".to_string(),
                altitude_m: 0.0,
                speed_m_s: state.speed_m_s(),
            });
            let final_mass = vehicle.payload_mass_kg;
            return AscentResult {
                trajectory,
                final_state: state,
                final_mass_kg: final_mass,
                events,
                burnout_time_s: state.time_s,
            };
        }
    }

    // Unpowered terminal coast: only the payload remains.
    let final_mass = vehicle.payload_mass_kg;
    let mut coast_elapsed = 0.0;
    while coast_elapsed < profile.coast_s {
        let step = dt_s.min(profile.coast_s - coast_elapsed);
        let deriv = |pos: &Vector3, vel: &Vector3| {
            ascent_derivs(pos, vel, final_mass, None, None, vehicle)
        };

        let p0 = state.position_m;
        let v0 = state.velocity_m_s;
        let d1 = deriv(&p0, &v0);
        let p2 = vector::add_scaled(&p0, &v0, 0.5 * step);
        let v2 = vector::add_scaled(&v0, &d1.acceleration, 0.5 * step);
        let d2 = deriv(&p2, &v2);
        let p3 = vector::add_scaled(&p0, &v2, 0.5 * step);
        let v3 = vector::add_scaled(&v0, &d2.acceleration, 0.5 * step);
        let d3 = deriv(&p3, &v3);
        let p4 = vector::add_scaled(&p0, &v3, step);
        let v4 = vector::add_scaled(&v0, &d3.acceleration, step);
        let d4 = deriv(&p4, &v4);

        for i in 0..3 {
            state.position_m[i] += step * (v0[i] + 2.0 * v2[i] + 2.0 * v3[i] + v4[i]) / 6.0;
            state.velocity_m_s[i] += step
                * (d1.acceleration[i]
                    + 2.0 * d2.acceleration[i]
                    + 2.0 * d3.acceleration[i]
                    + d4.acceleration[i])
                / 6.0;
        }
        state.time_s += step;
        coast_elapsed += step;

        if record_interval_s > 0.0 && state.time_s >= next_record {
            trajectory.push(state);
            next_record += record_interval_s;
        }
    }

    events.push(AscentEvent {
        time_s: state.time_s,
        name: "final state".to_string(),
        altitude_m: altitude_m(&state.position_m),
        speed_m_s: state.speed_m_s(),
    });
    trajectory.push(state);

    AscentResult {
        trajectory,
        final_state: state,
        final_mass_kg: final_mass,
        events,
        burnout_time_s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use traj_core::constants::G0;

    fn test_vehicle() -> AscentVehicle {
        AscentVehicle {
            stages: vec![
                RocketStage {
                    dry_mass_kg: 8_000.0,
                    propellant_mass_kg: 120_000.0,
                    thrust_n: 2.2e6,
                    isp_sl_s: 282.0,
                    isp_vac_s: 311.0,
                },
                RocketStage {
                    dry_mass_kg: 2_000.0,
                    propellant_mass_kg: 30_000.0,
                    thrust_n: 4.0e5,
                    isp_sl_s: 340.0,
                    isp_vac_s: 348.0,
                },
            ],
            payload_mass_kg: 4_500.0,
            drag_coefficient: 0.3,
            reference_area_m2: 10.0,
        }
    }

    fn test_site() -> LaunchSite {
        LaunchSite {
            latitude_deg: 28.5,
            longitude_deg: -80.6,
            altitude_m: 0.0,
        }
    }

    fn test_profile() -> AscentProfile {
        AscentProfile {
            azimuth_rad: std::f64::consts::FRAC_PI_2,
            // Stage 1 pitches over linearly; stage 2 flies near-horizontal.
            pitch_polys: vec![vec![0.0, 0.006], vec![1.2]],
            yaw_polys: vec![vec![], vec![]],
            coast_s: 60.0,
        }
    }

    #[test]
    fn ascent_gains_altitude_and_speed() {
        let result = fly_ascent(&test_vehicle(), &test_site(), &test_profile(), 0.5, 10.0);

        let alt = vector::norm(&result.final_state.position_m)
            - Body::Earth.constants().radius_m;
        assert!(alt > 80_000.0, "final altitude = {} km", alt / 1000.0);
        assert!(
            result.final_state.speed_m_s() > 4_000.0,
            "final speed = {}",
            result.final_state.speed_m_s()
        );
    }

    #[test]
    fn both_stages_separate() {
        let result = fly_ascent(&test_vehicle(), &test_site(), &test_profile(), 0.5, 0.0);
        let separations = result
            .events
            .iter()
            .filter(|e| e.name.contains("separation"))
            .count();
        assert_eq!(separations, 2);
        assert!(result.burnout_time_s > 0.0);
    }

    #[test]
    fn burn_time_matches_the_propellant_budget() {
        let vehicle = test_vehicle();
        let result = fly_ascent(&vehicle, &test_site(), &test_profile(), 0.5, 0.0);

        // Stage 1 burn time from its average mass flow: T / (Isp g0).
        let s1 = &vehicle.stages[0];
        let mdot_vac = s1.thrust_n / (s1.isp_vac_s * G0);
        let mdot_sl = s1.thrust_n / (s1.isp_sl_s * G0);
        let t_max = s1.propellant_mass_kg / mdot_vac;
        let t_min = s1.propellant_mass_kg / mdot_sl;

        let sep1 = result
            .events
            .iter()
            .find(|e| e.name == "stage 1 separation")
            .expect("stage 1 separation event");
        assert!(
            sep1.time_s > t_min - 5.0 && sep1.time_s < t_max + 5.0,
            "stage 1 burnout at {} s, expected within [{t_min}, {t_max}]",
            sep1.time_s
        );
    }
}
