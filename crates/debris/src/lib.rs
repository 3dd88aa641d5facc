//! Debris fragmentation and field propagation.
//!
//! Fragmentation events scatter fragments around the momentum-weighted
//! centre-of-mass velocity; each fragment is then an independent state for
//! the propagators. Generation is deterministic for a given PRNG seed.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use traj_bodies::Body;
use traj_core::state::{StateDerivative, StateVector};
use traj_core::vector::{self, Vector3};
use traj_orbits::{self as orbits, OrbitalElements};
use traj_propagators::rk4_step;

const TWO_PI: f64 = 2.0 * std::f64::consts::PI;

/// Perigee altitude below which a fragment is considered reentered [m].
pub const REENTRY_ALTITUDE_M: f64 = 100_000.0;

/// One tracked debris fragment.
#[derive(Debug, Clone)]
pub struct DebrisFragment {
    pub id: usize,
    /// Which parent object the fragment came from (1 or 2; 0 for explosions).
    pub source: usize,
    pub state: StateVector,
    pub mass_kg: f64,
    pub size_m: f64,
    /// Cleared once the fragment's perigee drops into the atmosphere.
    pub active: bool,
    /// Seconds since the fragmentation event.
    pub elapsed_s: f64,
}

impl DebrisFragment {
    /// Orbital elements of the fragment about the Earth.
    pub fn elements(&self) -> OrbitalElements {
        orbits::elements_from_state(&self.state, Body::Earth.constants().mu_m3_s2)
    }

    /// Orbital period [s]; zero for hyperbolic fragments.
    pub fn period_s(&self) -> f64 {
        let elements = self.elements();
        if elements.semi_major_axis_m <= 0.0 {
            return 0.0;
        }
        elements.period_s(Body::Earth.constants().mu_m3_s2)
    }

    /// Whether the fragment's perigee has dropped into the atmosphere.
    pub fn has_reentered(&self) -> bool {
        let earth = Body::Earth.constants();
        self.elements().periapsis_m() < earth.radius_m + REENTRY_ALTITUDE_M
    }

    /// Advance the fragment one RK4 step under two-body (± J2) gravity.
    pub fn propagate(&mut self, dt_s: f64, use_j2: bool) {
        if !self.active {
            return;
        }

        let earth = Body::Earth.constants();
        let deriv = |s: &StateVector| {
            let mut acc = traj_forces::gravity::two_body(&s.position_m, earth.mu_m3_s2);
            if use_j2 {
                acc = vector::add(
                    &acc,
                    &traj_forces::gravity::j2_perturbation(
                        &s.position_m,
                        earth.mu_m3_s2,
                        earth.j2,
                        earth.radius_m,
                    ),
                );
            }
            StateDerivative::new(s.velocity_m_s, acc)
        };

        self.state = rk4_step(&self.state, dt_s, &deriv);
        self.elapsed_s += dt_s;

        if self.has_reentered() {
            self.active = false;
        }
    }
}

/// A direction uniformly distributed on the unit sphere:
/// θ ~ U[0, 2π), cos φ ~ U[−1, 1].
fn random_unit_vector(rng: &mut StdRng) -> Vector3 {
    let theta = rng.gen_range(0.0..TWO_PI);
    let cos_phi: f64 = rng.gen_range(-1.0..1.0);
    let sin_phi = (1.0 - cos_phi * cos_phi).sqrt();
    [sin_phi * theta.cos(), sin_phi * theta.sin(), cos_phi]
}

/// Generate fragments from a two-body collision.
///
/// Fragments appear at the midpoint position with the momentum-weighted
/// centre-of-mass velocity plus a scatter of ξ·‖v_rel‖, ξ ~ U[0.1, 0.5],
/// along uniformly random directions. `mass_ratio` is the second object's
/// mass relative to the first. Deterministic per seed.
pub fn collision_fragments(
    sat1: &StateVector,
    sat2: &StateVector,
    num_pieces: usize,
    collision_time_s: f64,
    mass_ratio: f64,
    seed: u64,
) -> Vec<DebrisFragment> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut fragments = Vec::with_capacity(num_pieces);

    let collision_pos = vector::scale(&vector::add(&sat1.position_m, &sat2.position_m), 0.5);

    // Momentum-weighted centre-of-mass velocity.
    let total_mass = 1.0 + mass_ratio;
    let combined_vel = vector::scale(
        &vector::add(
            &sat1.velocity_m_s,
            &vector::scale(&sat2.velocity_m_s, mass_ratio),
        ),
        1.0 / total_mass,
    );

    let rel_speed = vector::norm(&vector::sub(&sat1.velocity_m_s, &sat2.velocity_m_s));

    // Split the pieces between the parents by mass.
    let from_sat1 = (num_pieces as f64 / (1.0 + 1.0 / mass_ratio)) as usize;

    for i in 0..num_pieces {
        let source = if i < from_sat1 { 1 } else { 2 };

        let scatter_fraction: f64 = rng.gen_range(0.1..0.5);
        let scatter_dir = random_unit_vector(&mut rng);
        let scatter = vector::scale(&scatter_dir, scatter_fraction * rel_speed);

        let mut state = *sat1;
        state.position_m = collision_pos;
        state.velocity_m_s = vector::add(&combined_vel, &scatter);
        state.time_s = collision_time_s;

        fragments.push(DebrisFragment {
            id: i,
            source,
            state,
            mass_kg: 0.01 + 9.99 * rng.gen_range(0.0..1.0),
            size_m: 0.01 + 0.49 * rng.gen_range(0.0..1.0),
            active: true,
            elapsed_s: 0.0,
        });
    }

    fragments
}

/// Generate fragments from an on-orbit explosion.
///
/// Each fragment receives a random delta-v up to `max_delta_v_m_s` on a
/// uniformly random direction.
pub fn explosion_fragments(
    satellite: &StateVector,
    num_pieces: usize,
    max_delta_v_m_s: f64,
    explosion_time_s: f64,
    seed: u64,
) -> Vec<DebrisFragment> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut fragments = Vec::with_capacity(num_pieces);

    for i in 0..num_pieces {
        let dv_mag = rng.gen_range(0.0..max_delta_v_m_s);
        let dv_dir = random_unit_vector(&mut rng);

        let mut state = *satellite;
        state.velocity_m_s = vector::add_scaled(&satellite.velocity_m_s, &dv_dir, dv_mag);
        state.time_s = explosion_time_s;

        fragments.push(DebrisFragment {
            id: i,
            source: 0,
            state,
            mass_kg: 0.01 + 4.99 * rng.gen_range(0.0..1.0),
            size_m: 0.01 + 0.29 * rng.gen_range(0.0..1.0),
            active: true,
            elapsed_s: 0.0,
        });
    }

    fragments
}

/// Recorded trajectory of one fragment during a field propagation.
#[derive(Debug, Clone, Default)]
pub struct DebrisTrajectory {
    pub fragment_id: usize,
    pub times_s: Vec<f64>,
    pub states: Vec<StateVector>,
}

/// Propagate every active fragment of a field for a duration.
///
/// Fragments are fully independent, so the loop order never changes the
/// result. With `record_interval_s > 0` each fragment's trajectory is
/// sampled on the shared clock.
pub fn propagate_field(
    fragments: &mut [DebrisFragment],
    duration_s: f64,
    dt_s: f64,
    use_j2: bool,
    record_interval_s: f64,
) -> Vec<DebrisTrajectory> {
    let recording = record_interval_s > 0.0;
    let mut trajectories: Vec<DebrisTrajectory> = if recording {
        fragments
            .iter()
            .map(|f| DebrisTrajectory {
                fragment_id: f.id,
                ..DebrisTrajectory::default()
            })
            .collect()
    } else {
        Vec::new()
    };

    let mut elapsed = 0.0;
    let mut next_record = 0.0;

    while elapsed < duration_s {
        if recording && elapsed >= next_record {
            for (fragment, trajectory) in fragments.iter().zip(trajectories.iter_mut()) {
                if fragment.active {
                    trajectory.times_s.push(elapsed);
                    trajectory.states.push(fragment.state);
                }
            }
            next_record += record_interval_s;
        }

        for fragment in fragments.iter_mut() {
            fragment.propagate(dt_s, use_j2);
        }
        elapsed += dt_s;
    }

    trajectories
}

/// Aggregate statistics of a debris field.
#[derive(Debug, Clone, Copy)]
pub struct DebrisFieldStats {
    pub total_count: usize,
    pub active_count: usize,
    pub reentered_count: usize,
    pub min_sma_km: f64,
    pub max_sma_km: f64,
    pub mean_sma_km: f64,
    pub min_perigee_km: f64,
    pub max_apogee_km: f64,
    /// SMA spread across the field [km].
    pub spread_km: f64,
}

/// Compute field statistics over the elliptic fragments.
pub fn field_stats(fragments: &[DebrisFragment]) -> DebrisFieldStats {
    let mut stats = DebrisFieldStats {
        total_count: fragments.len(),
        active_count: 0,
        reentered_count: 0,
        min_sma_km: f64::INFINITY,
        max_sma_km: 0.0,
        mean_sma_km: 0.0,
        min_perigee_km: f64::INFINITY,
        max_apogee_km: 0.0,
        spread_km: 0.0,
    };

    let mut sum_sma = 0.0;
    let mut count = 0;

    for fragment in fragments {
        if !fragment.active {
            stats.reentered_count += 1;
            continue;
        }
        stats.active_count += 1;

        let elements = fragment.elements();
        let sma_km = elements.semi_major_axis_m / 1000.0;
        if sma_km <= 0.0 {
            continue; // hyperbolic ejecta
        }

        stats.min_sma_km = stats.min_sma_km.min(sma_km);
        stats.max_sma_km = stats.max_sma_km.max(sma_km);
        stats.min_perigee_km = stats.min_perigee_km.min(elements.periapsis_m() / 1000.0);
        stats.max_apogee_km = stats.max_apogee_km.max(elements.apoapsis_m() / 1000.0);
        sum_sma += sma_km;
        count += 1;
    }

    if count > 0 {
        stats.mean_sma_km = sum_sma / count as f64;
        stats.spread_km = stats.max_sma_km - stats.min_sma_km;
    }

    stats
}
