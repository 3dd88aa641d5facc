//! Multi-leg mission assembly and launch-date optimization.

use log::{debug, warn};
use serde::Serialize;

use traj_bodies::{Body, ephemeris};
use traj_core::units;
use traj_core::vector;

use crate::flyby::{self, FlybyResult, MIN_FLYBY_ALTITUDE_M};
use crate::planner::{self, MissionLeg};

/// Golden ratio constant (3 − √5)/2 for the 1-D line search.
const GOLDEN: f64 = 0.381_966_011_250_105;

/// Sweep improvement below which the optimizer terminates [m/s].
const SWEEP_TOLERANCE_M_S: f64 = 0.1;

/// Interior dates keep at least this margin from their neighbors [days].
const DATE_MARGIN_DAYS: f64 = 10.0;

/// An assembled multi-leg interplanetary mission.
#[derive(Debug, Clone, Serialize)]
pub struct MissionSequence {
    pub name: String,
    pub body_sequence: Vec<Body>,
    pub epoch_jd: Vec<f64>,
    pub legs: Vec<MissionLeg>,
    pub flybys: Vec<FlybyResult>,
    /// Departure + powered flybys + capture [m/s].
    pub total_delta_v_m_s: f64,
    /// Characteristic energy of the first departure [km²/s²].
    pub departure_c3_km2_s2: f64,
    pub valid: bool,
}

impl MissionSequence {
    fn invalid(bodies: &[Body], dates_jd: &[f64]) -> Self {
        Self {
            name: mission_name(bodies),
            body_sequence: bodies.to_vec(),
            epoch_jd: dates_jd.to_vec(),
            legs: Vec::new(),
            flybys: Vec::new(),
            total_delta_v_m_s: 0.0,
            departure_c3_km2_s2: 0.0,
            valid: false,
        }
    }

    /// Total mission duration [days].
    pub fn total_tof_days(&self) -> f64 {
        match (self.epoch_jd.first(), self.epoch_jd.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

fn mission_name(bodies: &[Body]) -> String {
    bodies
        .iter()
        .map(|b| b.name())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Per-encounter summary of a mission.
#[derive(Debug, Clone, Serialize)]
pub struct EncounterSummary {
    pub body: Body,
    pub jd: f64,
    pub delta_v_m_s: f64,
    pub turn_angle_rad: f64,
    pub periapsis_radius_m: f64,
    pub v_inf_in_m_s: f64,
    pub v_inf_out_m_s: f64,
}

/// Assemble a mission from a body sequence and matching encounter dates.
///
/// One Lambert leg per consecutive body pair; flybys connect the incoming
/// and outgoing v∞ at each intermediate body, charging a powered-flyby
/// delta-v when the required turn exceeds the minimum-altitude limit.
pub fn build_mission(
    bodies: &[Body],
    dates_jd: &[f64],
    departure_parking_alt_m: f64,
    arrival_parking_alt_m: f64,
) -> MissionSequence {
    if bodies.len() < 2 || bodies.len() != dates_jd.len() {
        return MissionSequence::invalid(bodies, dates_jd);
    }
    // Dates must strictly increase.
    if dates_jd.windows(2).any(|w| w[1] <= w[0]) {
        return MissionSequence::invalid(bodies, dates_jd);
    }

    let num_legs = bodies.len() - 1;
    let mut mission = MissionSequence {
        name: mission_name(bodies),
        body_sequence: bodies.to_vec(),
        epoch_jd: dates_jd.to_vec(),
        legs: Vec::with_capacity(num_legs),
        flybys: Vec::with_capacity(num_legs.saturating_sub(1)),
        total_delta_v_m_s: 0.0,
        departure_c3_km2_s2: 0.0,
        valid: false,
    };

    for leg_idx in 0..num_legs {
        let leg = planner::build_leg(
            bodies[leg_idx],
            bodies[leg_idx + 1],
            dates_jd[leg_idx],
            dates_jd[leg_idx + 1],
            planner::MAX_LEG_SAMPLES,
        );
        if leg.trajectory.is_empty() {
            mission.legs.push(leg);
            return mission;
        }
        mission.legs.push(leg);
    }

    // Gravity assists at the intermediate bodies.
    for i in 1..num_legs {
        let v_inf_in = mission.legs[i - 1].v_inf_arrival;
        let v_inf_out = mission.legs[i].v_inf_departure;

        let v_in_mag = vector::norm(&v_inf_in);
        let v_out_mag = vector::norm(&v_inf_out);
        if v_in_mag < 1.0e-3 || v_out_mag < 1.0e-3 {
            mission.flybys.push(FlybyResult::invalid());
            continue;
        }

        let body = bodies[i];
        let constants = body.constants();
        let min_rp = constants.radius_m + MIN_FLYBY_ALTITUDE_M;

        let cos_turn =
            (vector::dot(&v_inf_in, &v_inf_out) / (v_in_mag * v_out_mag)).clamp(-1.0, 1.0);
        let turn_angle = cos_turn.acos();
        let v_inf_avg = 0.5 * (v_in_mag + v_out_mag);

        let rp = flyby::periapsis_for_turn_angle(v_inf_avg, turn_angle, constants.mu_m3_s2);
        let result = match rp {
            Some(rp) if rp >= min_rp => flyby::compute_flyby(&v_inf_in, rp, constants.mu_m3_s2),
            _ => {
                // Unachievable unpowered: fly at the floor and burn for the
                // remaining turn.
                let at_floor = flyby::compute_flyby(&v_inf_in, min_rp, constants.mu_m3_s2);
                let residual = turn_angle - at_floor.turn_angle_rad;
                if residual > 0.0 {
                    let dv = flyby::powered_flyby_delta_v(v_inf_avg, residual);
                    warn!(
                        "powered flyby at {}: residual turn {:.3} rad costs {:.1} m/s",
                        body.name(),
                        residual,
                        dv
                    );
                    mission.total_delta_v_m_s += dv;
                }
                at_floor
            }
        };
        mission.flybys.push(result);
    }

    // Departure burn at the first body.
    let dep_body = bodies[0].constants();
    let v_inf_dep = vector::norm(&mission.legs[0].v_inf_departure);
    let c3_dep = units::m2s2_to_km2s2(v_inf_dep * v_inf_dep);
    mission.departure_c3_km2_s2 = c3_dep;
    mission.total_delta_v_m_s += planner::departure_delta_v(
        c3_dep,
        dep_body.radius_m + departure_parking_alt_m,
        dep_body.mu_m3_s2,
    );

    // Capture burn at the final body.
    let arr_body = bodies[bodies.len() - 1].constants();
    let v_inf_arr = vector::norm(&mission.legs[num_legs - 1].v_inf_arrival);
    mission.total_delta_v_m_s += planner::capture_delta_v(
        v_inf_arr,
        arr_body.radius_m + arrival_parking_alt_m,
        arr_body.mu_m3_s2,
    );

    mission.valid = true;
    mission
}

/// Total mission delta-v for a candidate date vector; infinity when any
/// leg is infeasible. This is the optimizer's objective.
pub fn compute_total_dv(
    bodies: &[Body],
    dates_jd: &[f64],
    departure_parking_alt_m: f64,
    arrival_parking_alt_m: f64,
) -> f64 {
    if bodies.len() < 2 || bodies.len() != dates_jd.len() {
        return f64::INFINITY;
    }
    if dates_jd.windows(2).any(|w| w[1] <= w[0]) {
        return f64::INFINITY;
    }

    let mut transfers = Vec::with_capacity(bodies.len() - 1);
    for i in 0..bodies.len() - 1 {
        let t = planner::compute_transfer(
            bodies[i],
            bodies[i + 1],
            dates_jd[i],
            dates_jd[i + 1],
            departure_parking_alt_m,
            arrival_parking_alt_m,
        );
        if !t.valid {
            return f64::INFINITY;
        }
        transfers.push(t);
    }

    let mut total = 0.0;

    // Departure burn.
    {
        let c = bodies[0].constants();
        total += planner::departure_delta_v(
            transfers[0].c3_departure_km2_s2,
            c.radius_m + departure_parking_alt_m,
            c.mu_m3_s2,
        );
    }

    // Flyby costs at the intermediate bodies.
    for i in 1..bodies.len() - 1 {
        let v_inf_in_vec = transfers[i - 1].v_inf_arrival_vec;
        let v_inf_out_vec = transfers[i].v_inf_departure_vec;
        let v_in_mag = vector::norm(&v_inf_in_vec);
        let v_out_mag = vector::norm(&v_inf_out_vec);

        // Magnitude mismatch must be made up with propellant regardless of
        // the achievable turn.
        total += (v_out_mag - v_in_mag).abs();

        if v_in_mag > 1.0 && v_out_mag > 1.0 {
            let cos_turn = (vector::dot(&v_inf_in_vec, &v_inf_out_vec)
                / (v_in_mag * v_out_mag))
                .clamp(-1.0, 1.0);
            let turn_angle = cos_turn.acos();

            let c = bodies[i].constants();
            let v_inf_avg = 0.5 * (v_in_mag + v_out_mag);
            let min_rp = c.radius_m + MIN_FLYBY_ALTITUDE_M;

            let achievable = flyby::periapsis_for_turn_angle(v_inf_avg, turn_angle, c.mu_m3_s2)
                .map(|rp| rp >= min_rp)
                .unwrap_or(turn_angle <= 0.0);
            if !achievable {
                let e_max = 1.0 + min_rp * v_inf_avg * v_inf_avg / c.mu_m3_s2;
                let max_turn = 2.0 * (1.0 / e_max).asin();
                let residual = turn_angle - max_turn;
                if residual > 0.0 {
                    total += flyby::powered_flyby_delta_v(v_inf_avg, residual);
                }
            }
        }
    }

    // Capture burn.
    {
        let c = bodies[bodies.len() - 1].constants();
        total += planner::capture_delta_v(
            transfers[transfers.len() - 1].v_inf_arrival_m_s,
            c.radius_m + arrival_parking_alt_m,
            c.mu_m3_s2,
        );
    }

    total
}

/// Coordinate-descent date optimization with golden-section line search.
///
/// The first and last dates stay fixed; each interior date is searched
/// within ±10 days of its neighbors. A candidate is accepted only when it
/// improves the total delta-v, so the result never regresses below the
/// input guess. Terminates when a full sweep improves by less than 0.1 m/s
/// or after `max_iterations` sweeps.
pub fn optimize_dates(
    bodies: &[Body],
    initial_dates_jd: &[f64],
    max_iterations: usize,
    departure_parking_alt_m: f64,
    arrival_parking_alt_m: f64,
) -> MissionSequence {
    if bodies.len() < 3 {
        // No interior dates to adjust.
        return build_mission(
            bodies,
            initial_dates_jd,
            departure_parking_alt_m,
            arrival_parking_alt_m,
        );
    }

    let objective = |dates: &[f64]| {
        compute_total_dv(
            bodies,
            dates,
            departure_parking_alt_m,
            arrival_parking_alt_m,
        )
    };

    let mut dates = initial_dates_jd.to_vec();
    let mut best_dv = objective(&dates);

    for sweep in 0..max_iterations {
        let sweep_start_dv = best_dv;

        for i in 1..dates.len() - 1 {
            let lower = dates[i - 1] + DATE_MARGIN_DAYS;
            let upper = dates[i + 1] - DATE_MARGIN_DAYS;
            if lower >= upper {
                continue;
            }

            let saved = dates[i];

            // Golden-section search over this date alone.
            let mut a = lower;
            let mut b = upper;
            let mut x1 = a + GOLDEN * (b - a);
            let mut x2 = b - GOLDEN * (b - a);

            dates[i] = x1;
            let mut f1 = objective(&dates);
            dates[i] = x2;
            let mut f2 = objective(&dates);

            for _ in 0..30 {
                if f1 < f2 {
                    b = x2;
                    x2 = x1;
                    f2 = f1;
                    x1 = a + GOLDEN * (b - a);
                    dates[i] = x1;
                    f1 = objective(&dates);
                } else {
                    a = x1;
                    x1 = x2;
                    f1 = f2;
                    x2 = b - GOLDEN * (b - a);
                    dates[i] = x2;
                    f2 = objective(&dates);
                }
                if b - a < 0.1 {
                    break;
                }
            }

            let candidate = if f1 < f2 { x1 } else { x2 };
            dates[i] = candidate;
            let candidate_dv = objective(&dates);

            if candidate_dv < best_dv {
                best_dv = candidate_dv;
                debug!(
                    "optimize_dates sweep {sweep}: date {i} → JD {:.2}, dv = {:.1} m/s",
                    candidate, candidate_dv
                );
            } else {
                dates[i] = saved;
            }
        }

        if sweep_start_dv - best_dv < SWEEP_TOLERANCE_M_S {
            break;
        }
    }

    build_mission(
        bodies,
        &dates,
        departure_parking_alt_m,
        arrival_parking_alt_m,
    )
}

/// Summarize each encounter of an assembled mission.
pub fn summarize_encounters(mission: &MissionSequence) -> Vec<EncounterSummary> {
    let mut summaries = Vec::with_capacity(mission.body_sequence.len());

    for (i, &body) in mission.body_sequence.iter().enumerate() {
        let constants = body.constants();
        let mut summary = EncounterSummary {
            body,
            jd: mission.epoch_jd.get(i).copied().unwrap_or(0.0),
            delta_v_m_s: 0.0,
            turn_angle_rad: 0.0,
            periapsis_radius_m: 0.0,
            v_inf_in_m_s: 0.0,
            v_inf_out_m_s: 0.0,
        };

        if i == 0 {
            if let Some(first) = mission.legs.first() {
                summary.v_inf_out_m_s = vector::norm(&first.v_inf_departure);
            }
            let c3 = units::m2s2_to_km2s2(summary.v_inf_out_m_s * summary.v_inf_out_m_s);
            summary.delta_v_m_s = planner::departure_delta_v(
                c3,
                constants.radius_m + planner::DEFAULT_PARKING_ALT_M,
                constants.mu_m3_s2,
            );
        } else if i == mission.body_sequence.len() - 1 {
            if let Some(last) = mission.legs.last() {
                summary.v_inf_in_m_s = vector::norm(&last.v_inf_arrival);
            }
            summary.delta_v_m_s = planner::capture_delta_v(
                summary.v_inf_in_m_s,
                constants.radius_m + planner::DEFAULT_PARKING_ALT_M,
                constants.mu_m3_s2,
            );
        } else {
            if let Some(result) = mission.flybys.get(i - 1) {
                summary.turn_angle_rad = result.turn_angle_rad;
                summary.periapsis_radius_m = result.periapsis_radius_m;
            }
            summary.v_inf_in_m_s = vector::norm(&mission.legs[i - 1].v_inf_arrival);
            summary.v_inf_out_m_s = vector::norm(&mission.legs[i].v_inf_departure);
        }

        summaries.push(summary);
    }

    summaries
}

/// Ephemeris positions of the mission's bodies at their encounter dates.
pub fn encounter_positions(mission: &MissionSequence) -> Vec<(Body, [f64; 3])> {
    mission
        .body_sequence
        .iter()
        .zip(&mission.epoch_jd)
        .filter_map(|(&body, &jd)| ephemeris::position_hci(body, jd).ok().map(|p| (body, p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use traj_core::time;

    #[test]
    fn mismatched_inputs_are_invalid() {
        let mission = build_mission(
            &[Body::Earth, Body::Mars],
            &[time::J2000_JD],
            planner::DEFAULT_PARKING_ALT_M,
            planner::DEFAULT_PARKING_ALT_M,
        );
        assert!(!mission.valid);

        // Dates out of order.
        let mission = build_mission(
            &[Body::Earth, Body::Mars],
            &[time::J2000_JD + 100.0, time::J2000_JD],
            planner::DEFAULT_PARKING_ALT_M,
            planner::DEFAULT_PARKING_ALT_M,
        );
        assert!(!mission.valid);
    }

    #[test]
    fn direct_earth_mars_mission_assembles() {
        // Mid-November 2026: the Earth-Mars phase-angle window.
        let launch = time::calendar_to_jd(2026, 11, 15.0);
        let arrival = time::calendar_to_jd(2027, 9, 1.0);
        let mission = build_mission(
            &[Body::Earth, Body::Mars],
            &[launch, arrival],
            planner::DEFAULT_PARKING_ALT_M,
            planner::DEFAULT_PARKING_ALT_M,
        );

        assert!(mission.valid);
        assert_eq!(mission.legs.len(), 1);
        assert!(mission.flybys.is_empty());
        assert!(
            mission.total_delta_v_m_s > 3_500.0 && mission.total_delta_v_m_s < 10_000.0,
            "total dv = {}",
            mission.total_delta_v_m_s
        );
        assert!(mission.departure_c3_km2_s2 > 3.0 && mission.departure_c3_km2_s2 < 40.0);
        assert_eq!(mission.name, "Earth → Mars");
    }

    #[test]
    fn encounter_summaries_cover_every_body() {
        let launch = time::calendar_to_jd(2026, 8, 1.0);
        let flyby_date = time::calendar_to_jd(2026, 12, 20.0);
        let arrival = time::calendar_to_jd(2027, 9, 1.0);
        let mission = build_mission(
            &[Body::Earth, Body::Venus, Body::Mars],
            &[launch, flyby_date, arrival],
            planner::DEFAULT_PARKING_ALT_M,
            planner::DEFAULT_PARKING_ALT_M,
        );
        assert!(mission.valid);
        assert_eq!(mission.legs.len(), 2);
        assert_eq!(mission.flybys.len(), 1);

        let summaries = summarize_encounters(&mission);
        assert_eq!(summaries.len(), 3);
        assert!(summaries[0].delta_v_m_s > 0.0);
        assert!(summaries[1].v_inf_in_m_s > 0.0);
        assert!(summaries[2].delta_v_m_s > 0.0);
    }

    #[test]
    fn optimizer_never_regresses_and_improves_a_poor_guess() {
        let launch = time::calendar_to_jd(2026, 8, 1.0);
        // Deliberately poor interior date.
        let flyby_date = time::calendar_to_jd(2026, 10, 1.0);
        let arrival = time::calendar_to_jd(2027, 9, 1.0);
        let bodies = [Body::Earth, Body::Venus, Body::Mars];
        let guess = [launch, flyby_date, arrival];

        let initial_dv = compute_total_dv(
            &bodies,
            &guess,
            planner::DEFAULT_PARKING_ALT_M,
            planner::DEFAULT_PARKING_ALT_M,
        );
        let optimized = optimize_dates(
            &bodies,
            &guess,
            20,
            planner::DEFAULT_PARKING_ALT_M,
            planner::DEFAULT_PARKING_ALT_M,
        );

        assert!(optimized.valid);
        let final_dv = compute_total_dv(
            &bodies,
            &optimized.epoch_jd,
            planner::DEFAULT_PARKING_ALT_M,
            planner::DEFAULT_PARKING_ALT_M,
        );
        assert!(
            final_dv < initial_dv,
            "optimizer failed to improve: {final_dv} vs {initial_dv}"
        );
        // Endpoints pinned.
        assert_eq!(optimized.epoch_jd[0], launch);
        assert_eq!(optimized.epoch_jd[2], arrival);
    }
}
