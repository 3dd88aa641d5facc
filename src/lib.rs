//! Spaceflight trajectory analysis engine.
//!
//! Composable numerical routines that propagate spacecraft state, design
//! impulsive and continuous-thrust maneuvers, and assemble multi-leg
//! interplanetary missions. The member crates hold the mechanics; this
//! facade re-exports them so callers depend on a single crate.

pub use traj_aerobrake as aerobrake;
pub use traj_bodies as bodies;
pub use traj_config as config;
pub use traj_core as core;
pub use traj_debris as debris;
pub use traj_forces as forces;
pub use traj_impulsive as impulsive;
pub use traj_launch as launch;
pub use traj_orbits as orbits;
pub use traj_propagators as propagators;
pub use traj_targeting as targeting;
pub use traj_transfer as transfer;

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
