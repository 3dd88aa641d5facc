//! Interplanetary transfer design: Lambert-based transfers, porkchop
//! grids, gravity assists, and multi-leg mission sequencing.

pub mod flyby;
pub mod planner;
pub mod sequence;

pub use flyby::{
    BPlane, FlybyResult, MIN_FLYBY_ALTITUDE_M, b_plane_for_asymptotes, compute_flyby,
    flyby_feasible, periapsis_for_turn_angle, powered_flyby_delta_v,
};
pub use planner::{
    DEFAULT_PARKING_ALT_M, MissionLeg, PorkchopPoint, TransferSolution, build_leg,
    capture_delta_v, compute_transfer, departure_delta_v, generate_porkchop,
};
pub use sequence::{
    EncounterSummary, MissionSequence, build_mission, compute_total_dv, encounter_positions,
    optimize_dates, summarize_encounters,
};
