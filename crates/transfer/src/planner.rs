//! Single-transfer computation, porkchop grids, and sampled mission legs.

use serde::Serialize;

use traj_bodies::{Body, ephemeris};
use traj_core::constants::{SECONDS_PER_DAY, SUN_MU};
use traj_core::state::{CoordinateFrame, StateVector};
use traj_core::units;
use traj_core::vector::{self, Vector3};
use traj_impulsive::lambert;
use traj_orbits as orbits;

/// Default circular parking orbit altitude at either end [m].
pub const DEFAULT_PARKING_ALT_M: f64 = 200.0e3;

/// Hard cap on sampled states per leg.
pub const MAX_LEG_SAMPLES: usize = 500;

/// Result of a single interplanetary transfer computation.
#[derive(Debug, Clone, Serialize)]
pub struct TransferSolution {
    pub valid: bool,
    /// Characteristic energy at departure [km²/s²].
    pub c3_departure_km2_s2: f64,
    /// Characteristic energy at arrival [km²/s²].
    pub c3_arrival_km2_s2: f64,
    /// Hyperbolic excess speed at departure [m/s].
    pub v_inf_departure_m_s: f64,
    /// Hyperbolic excess speed at arrival [m/s].
    pub v_inf_arrival_m_s: f64,
    /// Hyperbolic excess vector at departure, HCI [m/s].
    pub v_inf_departure_vec: Vector3,
    /// Hyperbolic excess vector at arrival, HCI [m/s].
    pub v_inf_arrival_vec: Vector3,
    /// Heliocentric departure velocity [m/s].
    pub v_departure_hci: Vector3,
    /// Heliocentric arrival velocity [m/s].
    pub v_arrival_hci: Vector3,
    /// Parking-orbit departure burn [m/s].
    pub delta_v_departure_m_s: f64,
    /// Capture burn into the arrival parking orbit [m/s].
    pub delta_v_capture_m_s: f64,
    /// Departure + capture [m/s].
    pub total_delta_v_m_s: f64,
    /// Time of flight [s].
    pub tof_s: f64,
}

impl TransferSolution {
    fn invalid() -> Self {
        Self {
            valid: false,
            c3_departure_km2_s2: 0.0,
            c3_arrival_km2_s2: 0.0,
            v_inf_departure_m_s: 0.0,
            v_inf_arrival_m_s: 0.0,
            v_inf_departure_vec: vector::zero(),
            v_inf_arrival_vec: vector::zero(),
            v_departure_hci: vector::zero(),
            v_arrival_hci: vector::zero(),
            delta_v_departure_m_s: 0.0,
            delta_v_capture_m_s: 0.0,
            total_delta_v_m_s: 0.0,
            tof_s: 0.0,
        }
    }
}

/// Departure burn from a circular parking orbit onto a hyperbola of the
/// given C3: √(C3·10⁶ + 2μ/r) − √(μ/r).
pub fn departure_delta_v(c3_km2_s2: f64, parking_radius_m: f64, mu_body: f64) -> f64 {
    let v_park = (mu_body / parking_radius_m).sqrt();
    let v_hyp = (c3_km2_s2 * 1.0e6 + 2.0 * mu_body / parking_radius_m).sqrt();
    v_hyp - v_park
}

/// Capture burn from an arrival hyperbola into a circular orbit.
pub fn capture_delta_v(v_inf_m_s: f64, capture_radius_m: f64, mu_body: f64) -> f64 {
    let v_hyp = (v_inf_m_s * v_inf_m_s + 2.0 * mu_body / capture_radius_m).sqrt();
    let v_circ = (mu_body / capture_radius_m).sqrt();
    v_hyp - v_circ
}

/// Compute one interplanetary transfer between two planets.
///
/// Planet states come from the ephemeris; the heliocentric arc from the
/// prograde Lambert solution. Invalid when arrival does not follow launch
/// or no Lambert arc exists.
pub fn compute_transfer(
    departure: Body,
    arrival: Body,
    launch_jd: f64,
    arrival_jd: f64,
    departure_parking_alt_m: f64,
    arrival_parking_alt_m: f64,
) -> TransferSolution {
    if arrival_jd <= launch_jd {
        return TransferSolution::invalid();
    }
    let tof_s = (arrival_jd - launch_jd) * SECONDS_PER_DAY;

    let (Ok(dep_state), Ok(arr_state)) = (
        ephemeris::state_hci(departure, launch_jd),
        ephemeris::state_hci(arrival, arrival_jd),
    ) else {
        return TransferSolution::invalid();
    };

    let sol = lambert::lambert(
        &dep_state.position_m,
        &arr_state.position_m,
        tof_s,
        SUN_MU,
        true,
    );
    if !sol.valid {
        return TransferSolution::invalid();
    }

    let v_inf_dep = vector::sub(&sol.v1_m_s, &dep_state.velocity_m_s);
    let v_inf_arr = vector::sub(&sol.v2_m_s, &arr_state.velocity_m_s);
    let v_inf_dep_mag = vector::norm(&v_inf_dep);
    let v_inf_arr_mag = vector::norm(&v_inf_arr);

    let c3_dep = units::m2s2_to_km2s2(v_inf_dep_mag * v_inf_dep_mag);
    let c3_arr = units::m2s2_to_km2s2(v_inf_arr_mag * v_inf_arr_mag);

    let dep_const = departure.constants();
    let arr_const = arrival.constants();
    let dv_dep = departure_delta_v(
        c3_dep,
        dep_const.radius_m + departure_parking_alt_m,
        dep_const.mu_m3_s2,
    );
    let dv_cap = capture_delta_v(
        v_inf_arr_mag,
        arr_const.radius_m + arrival_parking_alt_m,
        arr_const.mu_m3_s2,
    );

    TransferSolution {
        valid: true,
        c3_departure_km2_s2: c3_dep,
        c3_arrival_km2_s2: c3_arr,
        v_inf_departure_m_s: v_inf_dep_mag,
        v_inf_arrival_m_s: v_inf_arr_mag,
        v_inf_departure_vec: v_inf_dep,
        v_inf_arrival_vec: v_inf_arr,
        v_departure_hci: sol.v1_m_s,
        v_arrival_hci: sol.v2_m_s,
        delta_v_departure_m_s: dv_dep,
        delta_v_capture_m_s: dv_cap,
        total_delta_v_m_s: dv_dep + dv_cap,
        tof_s,
    }
}

/// One grid point in a porkchop plot.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PorkchopPoint {
    pub launch_jd: f64,
    pub arrival_jd: f64,
    pub c3_departure_km2_s2: f64,
    pub c3_arrival_km2_s2: f64,
    pub total_delta_v_m_s: f64,
    pub valid: bool,
}

/// Sweep a launch/arrival date grid.
///
/// Points are row-major with the launch date varying fastest; pairs with
/// arrival at or before launch are flagged invalid, not skipped.
#[allow(clippy::too_many_arguments)]
pub fn generate_porkchop(
    departure: Body,
    arrival: Body,
    launch_jd_start: f64,
    launch_jd_end: f64,
    launch_steps: usize,
    arrival_jd_start: f64,
    arrival_jd_end: f64,
    arrival_steps: usize,
) -> Vec<PorkchopPoint> {
    let mut points = Vec::with_capacity(launch_steps * arrival_steps);

    let launch_dt = if launch_steps > 1 {
        (launch_jd_end - launch_jd_start) / (launch_steps - 1) as f64
    } else {
        0.0
    };
    let arrival_dt = if arrival_steps > 1 {
        (arrival_jd_end - arrival_jd_start) / (arrival_steps - 1) as f64
    } else {
        0.0
    };

    for ai in 0..arrival_steps {
        let arrival_jd = arrival_jd_start + arrival_dt * ai as f64;
        for li in 0..launch_steps {
            let launch_jd = launch_jd_start + launch_dt * li as f64;

            let transfer = compute_transfer(
                departure,
                arrival,
                launch_jd,
                arrival_jd,
                DEFAULT_PARKING_ALT_M,
                DEFAULT_PARKING_ALT_M,
            );

            points.push(PorkchopPoint {
                launch_jd,
                arrival_jd,
                c3_departure_km2_s2: transfer.c3_departure_km2_s2,
                c3_arrival_km2_s2: transfer.c3_arrival_km2_s2,
                total_delta_v_m_s: transfer.total_delta_v_m_s,
                valid: transfer.valid,
            });
        }
    }

    points
}

/// A single leg of an interplanetary mission.
#[derive(Debug, Clone, Serialize)]
pub struct MissionLeg {
    pub name: String,
    pub departure_body: Body,
    pub arrival_body: Body,
    pub departure_jd: f64,
    pub arrival_jd: f64,
    /// Hyperbolic excess vector leaving the departure body [m/s].
    pub v_inf_departure: Vector3,
    /// Hyperbolic excess vector reaching the arrival body [m/s].
    pub v_inf_arrival: Vector3,
    /// Parking-orbit delta-v budget for this leg alone [m/s].
    pub delta_v_m_s: f64,
    /// Sampled heliocentric states along the arc.
    pub trajectory: Vec<StateVector>,
}

/// Build a mission leg with its trajectory sampled along the Lambert arc.
///
/// The arc is sampled by propagating the transfer orbit's mean anomaly
/// uniformly over the time of flight, with no numerical re-integration.
pub fn build_leg(
    departure: Body,
    arrival: Body,
    launch_jd: f64,
    arrival_jd: f64,
    num_samples: usize,
) -> MissionLeg {
    let name = format!("{} → {}", departure.name(), arrival.name());
    let mut leg = MissionLeg {
        name,
        departure_body: departure,
        arrival_body: arrival,
        departure_jd: launch_jd,
        arrival_jd,
        v_inf_departure: vector::zero(),
        v_inf_arrival: vector::zero(),
        delta_v_m_s: 0.0,
        trajectory: Vec::new(),
    };

    let transfer = compute_transfer(
        departure,
        arrival,
        launch_jd,
        arrival_jd,
        DEFAULT_PARKING_ALT_M,
        DEFAULT_PARKING_ALT_M,
    );
    if !transfer.valid {
        return leg;
    }

    leg.v_inf_departure = transfer.v_inf_departure_vec;
    leg.v_inf_arrival = transfer.v_inf_arrival_vec;
    leg.delta_v_m_s = transfer.total_delta_v_m_s;

    let Ok(dep_state) = ephemeris::state_hci(departure, launch_jd) else {
        return leg;
    };

    // Transfer orbit elements about the Sun at departure.
    let depart_sv = StateVector::from_rv(
        dep_state.position_m,
        transfer.v_departure_hci,
        0.0,
        CoordinateFrame::HeliocentricJ2000,
    );
    let elements = orbits::elements_from_state(&depart_sv, SUN_MU);
    let n = elements.mean_motion_rad_s(SUN_MU);
    let m0 = elements.mean_anomaly_rad;

    let samples = num_samples.clamp(2, MAX_LEG_SAMPLES);
    leg.trajectory.reserve(samples);
    for i in 0..samples {
        let t = transfer.tof_s * i as f64 / (samples - 1) as f64;
        let m = orbits::propagate_mean_anomaly(m0, n, t);
        let nu = orbits::mean_to_true_anomaly(m, elements.eccentricity);

        let sample_elements = orbits::OrbitalElements {
            true_anomaly_rad: nu,
            mean_anomaly_rad: m,
            ..elements
        };
        let mut sv = orbits::state_from_elements(&sample_elements, SUN_MU);
        sv.time_s = t;
        sv.frame = CoordinateFrame::HeliocentricJ2000;
        leg.trajectory.push(sv);
    }

    leg
}
