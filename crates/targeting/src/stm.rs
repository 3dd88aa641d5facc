//! State transition matrix co-propagation.
//!
//! The 6-vector state and its 6×6 STM are carried as a product type and
//! integrated together with RK4. The STM evolves as Φ̇ = A Φ with
//! A = [[0, I], [G, 0]] and G the two-body gravity gradient. The J2
//! contribution to G is omitted; Newton iterations over J2-dominated orbits
//! converge more slowly but still converge on the full nonlinear residual.

use traj_core::state::StateVector;
use traj_core::vector::{self, Vector3};
use traj_forces::gravity;

/// 6×6 matrix alias for the STM.
pub type Stm = [[f64; 6]; 6];

/// The 6×6 identity.
pub fn identity_stm() -> Stm {
    let mut phi = [[0.0; 6]; 6];
    for (i, row) in phi.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    phi
}

/// A propagated state together with its state transition matrix.
#[derive(Debug, Clone, Copy)]
pub struct ExtendedState {
    pub state: StateVector,
    pub stm: Stm,
}

impl ExtendedState {
    /// Start a propagation: Φ(t₀, t₀) = I.
    pub fn new(state: StateVector) -> Self {
        Self {
            state,
            stm: identity_stm(),
        }
    }
}

/// Point-mass gravity field (optionally with J2) for the shooting solvers.
#[derive(Debug, Clone, Copy)]
pub struct GravityField {
    pub mu_m3_s2: f64,
    pub include_j2: bool,
    pub j2: f64,
    pub body_radius_m: f64,
}

impl GravityField {
    /// Two-body field.
    pub fn point_mass(mu_m3_s2: f64) -> Self {
        Self {
            mu_m3_s2,
            include_j2: false,
            j2: 0.0,
            body_radius_m: 0.0,
        }
    }

    /// Acceleration at a position [m/s²].
    pub fn acceleration(&self, position_m: &Vector3) -> Vector3 {
        let mut acc = gravity::two_body(position_m, self.mu_m3_s2);
        if self.include_j2 {
            acc = vector::add(
                &acc,
                &gravity::j2_perturbation(position_m, self.mu_m3_s2, self.j2, self.body_radius_m),
            );
        }
        acc
    }
}

struct ExtendedDerivative {
    velocity: Vector3,
    acceleration: Vector3,
    stm_dot: Stm,
}

fn extended_derivative(es: &ExtendedState, field: &GravityField) -> ExtendedDerivative {
    let acceleration = field.acceleration(&es.state.position_m);
    let g = gravity::gravity_gradient(&es.state.position_m, field.mu_m3_s2);

    // Φ̇ = A Φ, exploiting the block structure of A: the top three rows of
    // the product are the bottom three rows of Φ, and the bottom rows are
    // G times the top rows.
    let mut stm_dot = [[0.0; 6]; 6];
    for j in 0..6 {
        for i in 0..3 {
            stm_dot[i][j] = es.stm[i + 3][j];
        }
        for i in 0..3 {
            let mut sum = 0.0;
            for k in 0..3 {
                sum += g[i][k] * es.stm[k][j];
            }
            stm_dot[i + 3][j] = sum;
        }
    }

    ExtendedDerivative {
        velocity: es.state.velocity_m_s,
        acceleration,
        stm_dot,
    }
}

fn add_scaled(base: &ExtendedState, d: &ExtendedDerivative, h: f64) -> ExtendedState {
    let mut out = *base;
    out.state.position_m = vector::add_scaled(&base.state.position_m, &d.velocity, h);
    out.state.velocity_m_s = vector::add_scaled(&base.state.velocity_m_s, &d.acceleration, h);
    for i in 0..6 {
        for j in 0..6 {
            out.stm[i][j] = base.stm[i][j] + h * d.stm_dot[i][j];
        }
    }
    out
}

/// One RK4 step of the extended (state, STM) system.
pub fn rk4_step_extended(es: &ExtendedState, dt: f64, field: &GravityField) -> ExtendedState {
    let k1 = extended_derivative(es, field);
    let k2 = extended_derivative(&add_scaled(es, &k1, 0.5 * dt), field);
    let k3 = extended_derivative(&add_scaled(es, &k2, 0.5 * dt), field);
    let k4 = extended_derivative(&add_scaled(es, &k3, dt), field);

    let mut out = *es;
    for i in 0..3 {
        out.state.position_m[i] += dt / 6.0
            * (k1.velocity[i] + 2.0 * k2.velocity[i] + 2.0 * k3.velocity[i] + k4.velocity[i]);
        out.state.velocity_m_s[i] += dt / 6.0
            * (k1.acceleration[i]
                + 2.0 * k2.acceleration[i]
                + 2.0 * k3.acceleration[i]
                + k4.acceleration[i]);
    }
    for i in 0..6 {
        for j in 0..6 {
            out.stm[i][j] += dt / 6.0
                * (k1.stm_dot[i][j]
                    + 2.0 * k2.stm_dot[i][j]
                    + 2.0 * k3.stm_dot[i][j]
                    + k4.stm_dot[i][j]);
        }
    }
    out.state.time_s += dt;
    out
}

/// Propagate a state and its STM for `total_dt` seconds at a fixed step.
pub fn propagate_with_stm(
    state: &StateVector,
    total_dt_s: f64,
    step_s: f64,
    field: &GravityField,
) -> ExtendedState {
    let mut es = ExtendedState::new(*state);
    let mut t = 0.0;
    while t < total_dt_s {
        let step = step_s.min(total_dt_s - t);
        es = rk4_step_extended(&es, step, field);
        t += step;
    }
    es
}

/// Propagate the state alone (no STM) with fixed-step RK4.
pub fn propagate_state(
    state: &StateVector,
    total_dt_s: f64,
    step_s: f64,
    field: &GravityField,
) -> StateVector {
    let mut current = *state;
    let mut t = 0.0;
    while t < total_dt_s {
        let step = step_s.min(total_dt_s - t);

        let deriv = |s: &StateVector| {
            traj_core::state::StateDerivative::new(s.velocity_m_s, field.acceleration(&s.position_m))
        };
        let k1 = deriv(&current);
        let apply = |h: f64, k: &traj_core::state::StateDerivative| {
            let mut s = current;
            s.position_m = vector::add_scaled(&current.position_m, &k.velocity_m_s, h);
            s.velocity_m_s = vector::add_scaled(&current.velocity_m_s, &k.acceleration_m_s2, h);
            s
        };
        let k2 = deriv(&apply(0.5 * step, &k1));
        let k3 = deriv(&apply(0.5 * step, &k2));
        let k4 = deriv(&apply(step, &k3));

        for i in 0..3 {
            current.position_m[i] += step / 6.0
                * (k1.velocity_m_s[i]
                    + 2.0 * k2.velocity_m_s[i]
                    + 2.0 * k3.velocity_m_s[i]
                    + k4.velocity_m_s[i]);
            current.velocity_m_s[i] += step / 6.0
                * (k1.acceleration_m_s2[i]
                    + 2.0 * k2.acceleration_m_s2[i]
                    + 2.0 * k3.acceleration_m_s2[i]
                    + k4.acceleration_m_s2[i]);
        }
        current.time_s += step;
        t += step;
    }
    current
}
