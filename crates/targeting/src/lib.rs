//! Relative-motion targeting: Clohessy–Wiltshire closed forms, STM
//! co-propagation, and Newton–Raphson rendezvous on the full dynamics.

pub mod cw;
pub mod rendezvous;
pub mod stm;

pub use cw::{
    CwManeuver, CwStateMatrix, cw_best_maneuver, cw_half_period_radial, cw_phasing, cw_propagate,
    cw_single_burn_intercept, cw_state_matrix, cw_two_burn_rendezvous,
};
pub use rendezvous::{RendezvousSolution, RendezvousSolver, ShootingConfig};
pub use stm::{ExtendedState, GravityField, Stm, propagate_state, propagate_with_stm};
