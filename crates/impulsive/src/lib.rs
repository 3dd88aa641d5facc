//! Impulsive maneuver solvers: Lambert's problem and analytic transfers.

pub mod lambert;
pub mod transfers;

pub use lambert::{LambertSolution, lambert};
pub use transfers::{
    HohmannTransfer, RendezvousPlan, hohmann, hohmann_from_elements, hohmann_rendezvous_wait_time,
    phase_angle, plan_rendezvous, plane_change_delta_v,
};
