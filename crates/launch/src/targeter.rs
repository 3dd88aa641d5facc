//! Newton–Raphson shooting over ascent profile parameters.
//!
//! Control variables are the launch azimuth, the pitch/yaw polynomial
//! coefficients, and the terminal coast duration. The Jacobian comes from
//! forward finite differences with per-variable-class step sizes; the
//! update is clamped per class and accepted only when it improves the
//! residual norm, so the returned profile never scores worse than the
//! initial guess.

use log::debug;

use traj_core::linalg;
use traj_core::state::StateVector;
use traj_core::vector;
use traj_orbits as orbits;

use crate::ascent::{AscentVehicle, fly_ascent};
use crate::{AscentProfile, LaunchSite};

/// Terminal constraint for the launch shooter.
#[derive(Debug, Clone)]
pub enum LaunchTarget {
    /// Hit a target (a, e, i) element set at the end of the profile.
    Orbit {
        semi_major_axis_m: f64,
        eccentricity: f64,
        inclination_rad: f64,
    },
    /// Hit a position (and optionally velocity) at the final time.
    Intercept {
        state: StateVector,
        match_velocity: bool,
    },
}

/// Shooting configuration.
///
/// The finite-difference and update step magnitudes are empirically tuned
/// per control-variable class and deliberately exposed rather than
/// hard-coded; retune them per vehicle if the solver stalls.
#[derive(Debug, Clone, Copy)]
pub struct LaunchSolverConfig {
    pub max_iterations: usize,
    /// Fixed RK4 step for each ascent evaluation [s].
    pub ascent_dt_s: f64,
    pub sma_tol_m: f64,
    pub ecc_tol: f64,
    pub inc_tol_rad: f64,
    pub position_tol_m: f64,
    pub velocity_tol_m_s: f64,
    /// Finite-difference step for the azimuth [rad].
    pub fd_step_azimuth_rad: f64,
    /// Finite-difference step for polynomial coefficients.
    pub fd_step_coefficient: f64,
    /// Finite-difference step for the coast duration [s].
    pub fd_step_coast_s: f64,
    pub max_update_azimuth_rad: f64,
    pub max_update_coefficient: f64,
    pub max_update_coast_s: f64,
}

impl Default for LaunchSolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            ascent_dt_s: 0.5,
            sma_tol_m: 10_000.0,
            ecc_tol: 0.005,
            inc_tol_rad: 0.002,
            position_tol_m: 10_000.0,
            velocity_tol_m_s: 10.0,
            fd_step_azimuth_rad: 1.0e-3,
            fd_step_coefficient: 1.0e-3,
            fd_step_coast_s: 1.0,
            max_update_azimuth_rad: 0.05,
            max_update_coefficient: 0.05,
            max_update_coast_s: 120.0,
        }
    }
}

/// Result of a launch shooting solve.
#[derive(Debug, Clone)]
pub struct LaunchSolution {
    pub converged: bool,
    pub iterations: usize,
    /// The corrected ascent profile.
    pub profile: AscentProfile,
    /// Scaled residual vector at the returned profile.
    pub residuals: Vec<f64>,
    /// Norm of the scaled residual.
    pub residual_norm: f64,
    pub final_state: StateVector,
    pub status: String,
}

#[derive(Debug, Clone, Copy)]
enum ControlClass {
    Azimuth,
    Coefficient,
    Coast,
}

impl ControlClass {
    fn fd_step(self, config: &LaunchSolverConfig) -> f64 {
        match self {
            ControlClass::Azimuth => config.fd_step_azimuth_rad,
            ControlClass::Coefficient => config.fd_step_coefficient,
            ControlClass::Coast => config.fd_step_coast_s,
        }
    }

    fn max_update(self, config: &LaunchSolverConfig) -> f64 {
        match self {
            ControlClass::Azimuth => config.max_update_azimuth_rad,
            ControlClass::Coefficient => config.max_update_coefficient,
            ControlClass::Coast => config.max_update_coast_s,
        }
    }
}

fn pack_controls(profile: &AscentProfile) -> (Vec<f64>, Vec<ControlClass>) {
    let mut values = vec![profile.azimuth_rad];
    let mut classes = vec![ControlClass::Azimuth];

    for poly in profile.pitch_polys.iter().chain(profile.yaw_polys.iter()) {
        for &c in poly {
            values.push(c);
            classes.push(ControlClass::Coefficient);
        }
    }

    values.push(profile.coast_s);
    classes.push(ControlClass::Coast);
    (values, classes)
}

fn unpack_controls(template: &AscentProfile, values: &[f64]) -> AscentProfile {
    let mut profile = template.clone();
    let mut idx = 0;

    profile.azimuth_rad = values[idx];
    idx += 1;

    for poly in profile
        .pitch_polys
        .iter_mut()
        .chain(profile.yaw_polys.iter_mut())
    {
        for c in poly.iter_mut() {
            *c = values[idx];
            idx += 1;
        }
    }

    profile.coast_s = values[idx].max(0.0);
    profile
}

fn residuals_for(
    final_state: &StateVector,
    target: &LaunchTarget,
    config: &LaunchSolverConfig,
) -> (Vec<f64>, bool) {
    match target {
        LaunchTarget::Orbit {
            semi_major_axis_m,
            eccentricity,
            inclination_rad,
        } => {
            let mu = traj_bodies::Body::Earth.constants().mu_m3_s2;
            let elements = orbits::elements_from_state(final_state, mu);

            let d_sma = elements.semi_major_axis_m - semi_major_axis_m;
            let d_ecc = elements.eccentricity - eccentricity;
            let d_inc = elements.inclination_rad - inclination_rad;

            let converged = d_sma.abs() < config.sma_tol_m
                && d_ecc.abs() < config.ecc_tol
                && d_inc.abs() < config.inc_tol_rad;

            // Scale the SMA error to the target so the Newton system mixes
            // comparable magnitudes.
            (vec![d_sma / semi_major_axis_m, d_ecc, d_inc], converged)
        }
        LaunchTarget::Intercept {
            state,
            match_velocity,
        } => {
            let d_pos = vector::sub(&final_state.position_m, &state.position_m);
            let mut residuals: Vec<f64> = d_pos.iter().map(|x| x / 1000.0).collect();
            let pos_err = vector::norm(&d_pos);

            let mut converged = pos_err < config.position_tol_m;
            if *match_velocity {
                let d_vel = vector::sub(&final_state.velocity_m_s, &state.velocity_m_s);
                residuals.extend(d_vel.iter());
                converged = converged && vector::norm(&d_vel) < config.velocity_tol_m_s;
            }
            (residuals, converged)
        }
    }
}

fn norm(values: &[f64]) -> f64 {
    values.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Solve for an ascent profile hitting the target.
pub fn solve_launch(
    vehicle: &AscentVehicle,
    site: &LaunchSite,
    initial_profile: &AscentProfile,
    target: &LaunchTarget,
    config: &LaunchSolverConfig,
) -> LaunchSolution {
    let (mut controls, classes) = pack_controls(initial_profile);

    let evaluate = |controls: &[f64]| {
        let profile = unpack_controls(initial_profile, controls);
        let result = fly_ascent(vehicle, site, &profile, config.ascent_dt_s, 0.0);
        let (residuals, converged) = residuals_for(&result.final_state, target, config);
        (profile, result.final_state, residuals, converged)
    };

    let (mut profile, mut final_state, mut residuals, mut converged) = evaluate(&controls);
    let mut iterations = 0;
    let mut status = String::from("Max iterations reached");

    for iter in 0..config.max_iterations {
        if converged {
            status = "Converged".to_string();
            break;
        }
        iterations = iter + 1;

        // Forward-difference Jacobian, one ascent per control variable.
        let base_norm = norm(&residuals);
        let mut jacobian = vec![vec![0.0; controls.len()]; residuals.len()];
        for (col, class) in classes.iter().enumerate() {
            let step = class.fd_step(config);
            let mut perturbed = controls.clone();
            perturbed[col] += step;
            let (_, _, res_pert, _) = evaluate(&perturbed);
            for (row, jac_row) in jacobian.iter_mut().enumerate() {
                jac_row[col] = (res_pert[row] - residuals[row]) / step;
            }
        }

        let Some(correction) = linalg::solve_linear_system(&jacobian, &residuals) else {
            status = "Singular Jacobian".to_string();
            break;
        };

        // Clamp the update per control class, then backtrack until the
        // residual norm improves.
        let mut improved = false;
        let mut alpha = 1.0;
        for _ in 0..5 {
            let mut trial = controls.clone();
            for (i, class) in classes.iter().enumerate() {
                let clamp = class.max_update(config);
                let delta = (alpha * correction[i]).clamp(-clamp, clamp);
                trial[i] -= delta;
            }

            let (trial_profile, trial_state, trial_res, trial_conv) = evaluate(&trial);
            if norm(&trial_res) < base_norm {
                controls = trial;
                profile = trial_profile;
                final_state = trial_state;
                residuals = trial_res;
                converged = trial_conv;
                improved = true;
                break;
            }
            alpha *= 0.5;
        }

        debug!(
            "launch iter {iter}: residual norm {:.6} (improved: {improved})",
            norm(&residuals)
        );

        if !improved {
            status = "Stalled".to_string();
            break;
        }
    }

    if converged {
        status = "Converged".to_string();
    }

    LaunchSolution {
        converged,
        iterations,
        profile,
        residual_norm: norm(&residuals),
        residuals,
        final_state,
        status,
    }
}
