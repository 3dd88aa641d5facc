//! Numerical propagation: classical RK4 and adaptive Dormand–Prince 4(5).

pub mod adaptive;
pub mod lowthrust;

pub use adaptive::{AdaptiveConfig, IntegrationStep, Propagation, adaptive_step, propagate, propagate_until};
pub use lowthrust::{LowThrustPropagation, propagate_low_thrust};

use traj_core::state::{StateDerivative, StateVector};
use traj_core::vector;

/// Advance a state by the derivative over a time `h`.
pub(crate) fn apply_derivative(base: &StateVector, deriv: &StateDerivative, h: f64) -> StateVector {
    let mut out = *base;
    out.position_m = vector::add_scaled(&base.position_m, &deriv.velocity_m_s, h);
    out.velocity_m_s = vector::add_scaled(&base.velocity_m_s, &deriv.acceleration_m_s2, h);
    out.time_s = base.time_s + h * deriv.d_time;
    out
}

/// One classical fourth-order Runge–Kutta step.
pub fn rk4_step<F>(state: &StateVector, dt: f64, deriv: &F) -> StateVector
where
    F: Fn(&StateVector) -> StateDerivative,
{
    let k1 = deriv(state);
    let k2 = deriv(&apply_derivative(state, &k1, dt / 2.0));
    let k3 = deriv(&apply_derivative(state, &k2, dt / 2.0));
    let k4 = deriv(&apply_derivative(state, &k3, dt));

    let mut out = *state;
    for i in 0..3 {
        out.position_m[i] += dt
            * (k1.velocity_m_s[i]
                + 2.0 * k2.velocity_m_s[i]
                + 2.0 * k3.velocity_m_s[i]
                + k4.velocity_m_s[i])
            / 6.0;
        out.velocity_m_s[i] += dt
            * (k1.acceleration_m_s2[i]
                + 2.0 * k2.acceleration_m_s2[i]
                + 2.0 * k3.acceleration_m_s2[i]
                + k4.acceleration_m_s2[i])
            / 6.0;
    }
    out.time_s += dt;
    out
}

/// Propagate with fixed RK4 steps, landing exactly on `duration`.
pub fn propagate_rk4<F>(state: &StateVector, duration_s: f64, dt_s: f64, deriv: &F) -> StateVector
where
    F: Fn(&StateVector) -> StateDerivative,
{
    let mut current = *state;
    let mut elapsed = 0.0;
    while elapsed < duration_s {
        let step = dt_s.min(duration_s - elapsed);
        current = rk4_step(&current, step, deriv);
        elapsed += step;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use traj_core::state::CoordinateFrame;
    use traj_core::vector;

    const MU_EARTH: f64 = 3.986_004_418e14;

    fn two_body(state: &StateVector) -> StateDerivative {
        let r = state.radius_m();
        let coeff = -MU_EARTH / (r * r * r);
        StateDerivative::new(state.velocity_m_s, vector::scale(&state.position_m, coeff))
    }

    #[test]
    fn rk4_conserves_two_body_energy_over_one_orbit() {
        let r0 = 6_778_137.0;
        let v0 = (MU_EARTH / r0).sqrt();
        let state = StateVector::from_rv(
            [r0, 0.0, 0.0],
            [0.0, v0, 0.0],
            0.0,
            CoordinateFrame::J2000Eci,
        );
        let period = 2.0 * std::f64::consts::PI * (r0 * r0 * r0 / MU_EARTH).sqrt();

        let final_state = propagate_rk4(&state, period, 60.0, &two_body);

        let e0 = state.specific_energy(MU_EARTH);
        let e1 = final_state.specific_energy(MU_EARTH);
        assert!(((e1 - e0) / e0).abs() < 1.0e-6);

        let h0 = vector::norm(&state.angular_momentum());
        let h1 = vector::norm(&final_state.angular_momentum());
        assert!(((h1 - h0) / h0).abs() < 1.0e-8);
    }

    #[test]
    fn rk4_lands_exactly_on_the_requested_duration() {
        let state = StateVector::from_rv(
            [7.0e6, 0.0, 0.0],
            [0.0, 7500.0, 0.0],
            0.0,
            CoordinateFrame::J2000Eci,
        );
        let out = propagate_rk4(&state, 100.5, 60.0, &two_body);
        assert!((out.time_s - 100.5).abs() < 1.0e-9);
    }
}
