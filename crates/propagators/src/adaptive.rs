//! Adaptive Dormand–Prince 4(5) integration with PI step control.
//!
//! Seven-stage embedded pair with the FSAL property: the seventh stage is
//! the first stage of the accepted next step. The error estimate is the
//! difference between the 4th- and 5th-order solutions over the six
//! position/velocity components.

use log::warn;

use traj_core::state::{StateDerivative, StateVector};

use crate::apply_derivative;

// Dormand-Prince Butcher tableau.
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th-order weights (b2 = b7 = 0).
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// 4th-order weights for the error estimate (bs2 = 0).
const BS1: f64 = 5179.0 / 57600.0;
const BS3: f64 = 7571.0 / 16695.0;
const BS4: f64 = 393.0 / 640.0;
const BS5: f64 = -92097.0 / 339200.0;
const BS6: f64 = 187.0 / 2100.0;
const BS7: f64 = 1.0 / 40.0;

/// Configuration for adaptive integration.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveConfig {
    /// Minimum step size [s].
    pub dt_min: f64,
    /// Maximum step size [s].
    pub dt_max: f64,
    /// Absolute tolerance [m] on position components.
    pub abs_tolerance: f64,
    /// Relative tolerance.
    pub rel_tolerance: f64,
    /// Step-size safety factor.
    pub safety_factor: f64,
    /// Step budget before the propagation returns with a flag.
    pub max_steps: usize,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self::earth_orbit()
    }
}

impl AdaptiveConfig {
    /// Earth-orbit preset: dt ∈ [0.1 s, 600 s].
    pub fn earth_orbit() -> Self {
        Self {
            dt_min: 0.1,
            dt_max: 600.0,
            abs_tolerance: 1.0,
            rel_tolerance: 1.0e-10,
            safety_factor: 0.9,
            max_steps: 1_000_000,
        }
    }

    /// Interplanetary preset: dt ∈ [1 s, 7 days].
    pub fn interplanetary() -> Self {
        Self {
            dt_min: 1.0,
            dt_max: 86_400.0 * 7.0,
            abs_tolerance: 100.0,
            rel_tolerance: 1.0e-8,
            safety_factor: 0.9,
            max_steps: 2_000_000,
        }
    }

    /// Flyby preset: dt ∈ [0.01 s, 1 h].
    pub fn flyby() -> Self {
        Self {
            dt_min: 0.01,
            dt_max: 3_600.0,
            abs_tolerance: 0.1,
            rel_tolerance: 1.0e-12,
            safety_factor: 0.9,
            max_steps: 5_000_000,
        }
    }
}

/// Result of a single adaptive step.
#[derive(Debug, Clone, Copy)]
pub struct IntegrationStep {
    pub state: StateVector,
    /// Step actually taken [s].
    pub dt_used: f64,
    /// Suggested next step [s].
    pub dt_next: f64,
    /// Scaled RMS error of the accepted step.
    pub error_estimate: f64,
    /// The step-size controller underflowed and a dt_min step was forced.
    pub forced_min_step: bool,
}

/// Result of an adaptive propagation.
#[derive(Debug, Clone)]
pub struct Propagation {
    /// Uniformly sampled states (nearest post-step), final state last.
    pub samples: Vec<StateVector>,
    /// The state at the end of the propagation.
    pub final_state: StateVector,
    /// Last step size used [s].
    pub dt_last: f64,
    /// Accepted step count.
    pub steps: usize,
    /// Count of forced minimum-size steps (error above tolerance).
    pub forced_min_steps: usize,
    /// True when the step budget ran out before the end time.
    pub step_budget_exhausted: bool,
}

/// Scaled RMS error between the embedded 4th and 5th order solutions.
fn compute_error(y4: &StateVector, y5: &StateVector, config: &AdaptiveConfig) -> f64 {
    let mut sum = 0.0;
    for i in 0..3 {
        let scale = config.abs_tolerance
            + config.rel_tolerance * y4.position_m[i].abs().max(y5.position_m[i].abs());
        let e = (y5.position_m[i] - y4.position_m[i]) / scale;
        sum += e * e;

        let vscale = config.abs_tolerance
            + config.rel_tolerance * y4.velocity_m_s[i].abs().max(y5.velocity_m_s[i].abs());
        let ev = (y5.velocity_m_s[i] - y4.velocity_m_s[i]) / vscale;
        sum += ev * ev;
    }
    (sum / 6.0).sqrt()
}

/// One adaptive step: attempts `dt_try`, shrinking on rejection.
pub fn adaptive_step<F>(
    state: &StateVector,
    dt_try: f64,
    deriv: &F,
    config: &AdaptiveConfig,
) -> IntegrationStep
where
    F: Fn(&StateVector) -> StateDerivative,
{
    let mut h = dt_try;
    let y = *state;

    for _ in 0..100 {
        h = h.clamp(config.dt_min, config.dt_max);

        let k1 = deriv(&y);

        let mut y2 = apply_derivative(&y, &k1, h * A21);
        y2.time_s = y.time_s + h * C2;
        let k2 = deriv(&y2);

        let y3 = stage(&y, h, &[(A31, &k1), (A32, &k2)], C3);
        let k3 = deriv(&y3);

        let y4s = stage(&y, h, &[(A41, &k1), (A42, &k2), (A43, &k3)], C4);
        let k4 = deriv(&y4s);

        let y5s = stage(&y, h, &[(A51, &k1), (A52, &k2), (A53, &k3), (A54, &k4)], C5);
        let k5 = deriv(&y5s);

        let y6s = stage(
            &y,
            h,
            &[(A61, &k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)],
            1.0,
        );
        let k6 = deriv(&y6s);

        // 5th-order solution.
        let y5_result = stage(
            &y,
            h,
            &[(B1, &k1), (B3, &k3), (B4, &k4), (B5, &k5), (B6, &k6)],
            1.0,
        );

        // FSAL stage: derivative at the candidate solution.
        let k7 = deriv(&y5_result);

        // 4th-order solution for the error estimate.
        let y4_result = stage(
            &y,
            h,
            &[
                (BS1, &k1),
                (BS3, &k3),
                (BS4, &k4),
                (BS5, &k5),
                (BS6, &k6),
                (BS7, &k7),
            ],
            1.0,
        );

        let error = compute_error(&y4_result, &y5_result, config);

        if error <= 1.0 {
            // Accepted. PI growth law, capped at 5x and dt_max.
            let dt_next = if error < 1.0e-30 {
                h * 5.0
            } else {
                h * config.safety_factor * (1.0 / error).powf(0.2)
            };
            let dt_next = dt_next.min(h * 5.0).clamp(config.dt_min, config.dt_max);

            return IntegrationStep {
                state: y5_result,
                dt_used: h,
                dt_next,
                error_estimate: error,
                forced_min_step: false,
            };
        }

        // Rejected: shrink, floored at 0.1x.
        let factor = (config.safety_factor * (1.0 / error).powf(0.25)).max(0.1);
        h *= factor;

        if h < config.dt_min {
            // Underflow: one forced step at dt_min; the error of that step
            // is recorded but does not abort the propagation.
            warn!(
                "step size underflow at t = {:.3} s, forcing dt_min = {} (err = {:.3e})",
                y.time_s, config.dt_min, error
            );
            let mut forced = y5_result;
            forced.time_s = y.time_s + config.dt_min;
            return IntegrationStep {
                state: forced,
                dt_used: config.dt_min,
                dt_next: config.dt_min,
                error_estimate: error,
                forced_min_step: true,
            };
        }
    }

    // The retry budget only runs out for pathological derivatives; surface
    // the attempt with a huge error estimate rather than aborting.
    IntegrationStep {
        state: y,
        dt_used: dt_try,
        dt_next: dt_try,
        error_estimate: 1.0e10,
        forced_min_step: false,
    }
}

fn stage(y: &StateVector, h: f64, terms: &[(f64, &StateDerivative)], c: f64) -> StateVector {
    let mut out = *y;
    for &(a, k) in terms {
        for i in 0..3 {
            out.position_m[i] += h * a * k.velocity_m_s[i];
            out.velocity_m_s[i] += h * a * k.acceleration_m_s2[i];
        }
    }
    out.time_s = y.time_s + h * c;
    out
}

/// Propagate for a duration, sampling at uniform intervals.
///
/// The integrator never steps past the end time: the final step is
/// shortened to land exactly. With `sample_interval_s > 0` the returned
/// samples are the nearest post-step states at each interval plus a
/// guaranteed final sample; otherwise only the final state is returned.
pub fn propagate<F>(
    initial: &StateVector,
    duration_s: f64,
    deriv: &F,
    config: &AdaptiveConfig,
    sample_interval_s: f64,
) -> Propagation
where
    F: Fn(&StateVector) -> StateDerivative,
{
    let mut samples = Vec::new();
    let mut current = *initial;
    let t_end = initial.time_s + duration_s;
    let mut dt = (duration_s * 0.001).min(config.dt_max).max(config.dt_min);

    let mut next_sample = initial.time_s;
    if sample_interval_s > 0.0 {
        samples.push(*initial);
        next_sample += sample_interval_s;
    }

    let mut steps = 0;
    let mut forced_min_steps = 0;
    while current.time_s < t_end && steps < config.max_steps {
        let dt_try = dt.min(t_end - current.time_s);
        if dt_try < 1.0e-10 {
            break;
        }

        let result = adaptive_step(&current, dt_try, deriv, config);
        current = result.state;
        dt = result.dt_next;
        steps += 1;
        if result.forced_min_step {
            forced_min_steps += 1;
        }

        if sample_interval_s > 0.0 {
            while next_sample <= current.time_s && next_sample <= t_end {
                samples.push(current);
                next_sample += sample_interval_s;
            }
        }
    }

    let step_budget_exhausted = current.time_s < t_end && steps >= config.max_steps;

    // Always include the final state.
    match samples.last() {
        Some(last) if last.time_s >= current.time_s => {}
        _ => samples.push(current),
    }

    Propagation {
        samples,
        final_state: current,
        dt_last: dt,
        steps,
        forced_min_steps,
        step_budget_exhausted,
    }
}

/// Propagate until a predicate is satisfied, or `max_duration_s` elapses.
pub fn propagate_until<F, P>(
    initial: &StateVector,
    deriv: &F,
    stop_condition: P,
    config: &AdaptiveConfig,
    max_duration_s: f64,
) -> StateVector
where
    F: Fn(&StateVector) -> StateDerivative,
    P: Fn(&StateVector) -> bool,
{
    let mut current = *initial;
    let t_end = initial.time_s + max_duration_s;
    let mut dt = (max_duration_s * 0.001).min(config.dt_max).max(config.dt_min);

    let mut steps = 0;
    while current.time_s < t_end && steps < config.max_steps {
        let dt_try = dt.min(t_end - current.time_s);
        if dt_try < 1.0e-10 {
            break;
        }

        let result = adaptive_step(&current, dt_try, deriv, config);
        current = result.state;
        dt = result.dt_next;
        steps += 1;

        if stop_condition(&current) {
            return current;
        }
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

    fn leo() -> StateVector {
        let r0 = 6_778_137.0;
        let v0 = (MU_EARTH / r0).sqrt();
        StateVector::from_rv(
            [r0, 0.0, 0.0],
            [0.0, v0, 0.0],
            0.0,
            CoordinateFrame::J2000Eci,
        )
    }

    #[test]
    fn adaptive_conserves_energy_over_a_month() {
        let initial = leo();
        // The error norm applies the absolute tolerance to velocity
        // components too, so a metre-level atol admits metre-per-second
        // slack; tighten both for a conservation run.
        let config = AdaptiveConfig {
            abs_tolerance: 1.0e-3,
            rel_tolerance: 1.0e-12,
            ..AdaptiveConfig::earth_orbit()
        };
        let result = propagate(&initial, 30.0 * 86_400.0, &two_body, &config, 0.0);
        let final_state = &result.final_state;

        let e0 = initial.specific_energy(MU_EARTH);
        let e1 = final_state.specific_energy(MU_EARTH);
        assert!(
            ((e1 - e0) / e0).abs() < 1.0e-5,
            "relative drift {}",
            ((e1 - e0) / e0).abs()
        );
        assert!(!result.step_budget_exhausted);
    }

    #[test]
    fn propagation_lands_exactly_on_the_end_time() {
        let initial = leo();
        let config = AdaptiveConfig::earth_orbit();
        let duration = 12_345.6;
        let result = propagate(&initial, duration, &two_body, &config, 0.0);
        assert!((result.final_state.time_s - duration).abs() < 1.0e-6);
    }

    #[test]
    fn sampling_includes_endpoints() {
        let initial = leo();
        let config = AdaptiveConfig::earth_orbit();
        let result = propagate(&initial, 3_000.0, &two_body, &config, 60.0);
        assert!(result.samples.len() >= 2);
        assert!((result.samples[0].time_s - 0.0).abs() < 1.0e-9);
        assert!((result.samples.last().unwrap().time_s - 3_000.0).abs() < 1.0e-6);
        // Time must be monotone across samples.
        for pair in result.samples.windows(2) {
            assert!(pair[1].time_s >= pair[0].time_s);
        }
    }

    #[test]
    fn propagate_until_stops_at_the_predicate() {
        let initial = leo();
        let config = AdaptiveConfig::earth_orbit();
        let quarter = initial.time_s + 1_388.0;
        let state = propagate_until(
            &initial,
            &two_body,
            |s| s.time_s >= quarter,
            &config,
            86_400.0,
        );
        assert!(state.time_s >= quarter);
        assert!(state.time_s < 86_400.0);
    }
}
