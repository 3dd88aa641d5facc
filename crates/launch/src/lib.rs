//! Launch-to-orbit ascent modeling and targeting.
//!
//! A multi-stage rocket is propagated in ECI from a rotating-Earth launch
//! site under two-body + J2 gravity, altitude-dependent thrust, and drag on
//! the Earth-relative velocity. The ascent profile is parameterized by a
//! launch azimuth and per-stage pitch/yaw control polynomials, which the
//! shooting solver adjusts to hit an orbit-insertion or intercept target.

pub mod ascent;
pub mod targeter;

pub use ascent::{AscentEvent, AscentResult, AscentVehicle, fly_ascent};
pub use targeter::{
    LaunchSolution, LaunchSolverConfig, LaunchTarget, solve_launch,
};

use traj_core::frames;
use traj_core::state::{CoordinateFrame, StateVector};

/// One rocket stage.
#[derive(Debug, Clone, Copy)]
pub struct RocketStage {
    pub dry_mass_kg: f64,
    pub propellant_mass_kg: f64,
    pub thrust_n: f64,
    /// Sea-level specific impulse [s].
    pub isp_sl_s: f64,
    /// Vacuum specific impulse [s].
    pub isp_vac_s: f64,
}

impl RocketStage {
    /// Effective Isp: linear from sea level to full vacuum at 40 km.
    pub fn effective_isp_s(&self, altitude_m: f64) -> f64 {
        let f = (altitude_m / 40_000.0).clamp(0.0, 1.0);
        self.isp_sl_s + f * (self.isp_vac_s - self.isp_sl_s)
    }

    /// Mass flow ṁ = T / (Isp g₀) at an altitude [kg/s].
    pub fn mass_flow_kg_s(&self, altitude_m: f64) -> f64 {
        self.thrust_n / (self.effective_isp_s(altitude_m) * traj_core::constants::G0)
    }
}

/// A geodetic launch site.
#[derive(Debug, Clone, Copy)]
pub struct LaunchSite {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl LaunchSite {
    /// Pad state in ECI at the launch epoch.
    ///
    /// ECI and ECEF are aligned at ignition (GMST folded into the launch
    /// epoch); the initial velocity is the Earth-rotation term ω⊕ × r.
    pub fn initial_state(&self) -> StateVector {
        let pos = frames::geodetic_to_ecef(self.latitude_deg, self.longitude_deg, self.altitude_m);
        let vel = [
            -frames::EARTH_ROTATION_RATE * pos[1],
            frames::EARTH_ROTATION_RATE * pos[0],
            0.0,
        ];
        StateVector::from_rv(pos, vel, 0.0, CoordinateFrame::J2000Eci)
    }
}

/// Ascent steering: azimuth plus per-stage pitch and yaw polynomials.
///
/// Polynomial coefficients are evaluated in seconds since the stage's
/// ignition; the resulting pitch angle (0 vertical, π/2 horizontal) blends
/// the radial and azimuth-horizontal thrust components and is clamped to
/// [0, π/2]. Yaw rotates the horizontal component within the local
/// horizontal plane.
#[derive(Debug, Clone)]
pub struct AscentProfile {
    /// Launch azimuth from north toward east [rad].
    pub azimuth_rad: f64,
    /// Pitch polynomial per stage (constant, linear, ... coefficients).
    pub pitch_polys: Vec<Vec<f64>>,
    /// Yaw polynomial per stage.
    pub yaw_polys: Vec<Vec<f64>>,
    /// Unpowered coast after final burnout [s].
    pub coast_s: f64,
}

impl AscentProfile {
    /// Azimuth for a target inclination from a site latitude:
    /// sin A = cos i / cos φ. Falls back to due east when unreachable.
    pub fn azimuth_for_inclination(target_inclination_rad: f64, latitude_deg: f64) -> f64 {
        let cos_inc = target_inclination_rad.cos();
        let cos_lat = latitude_deg.to_radians().cos();
        if cos_lat.abs() > 1.0e-6 && (cos_inc / cos_lat).abs() <= 1.0 {
            (cos_inc / cos_lat).asin()
        } else {
            std::f64::consts::FRAC_PI_2
        }
    }

    /// Evaluate a stage's pitch polynomial at a time since ignition.
    pub fn pitch_at(&self, stage: usize, t_since_ignition_s: f64) -> f64 {
        poly_eval(
            self.pitch_polys.get(stage).map(Vec::as_slice).unwrap_or(&[]),
            t_since_ignition_s,
        )
        .clamp(0.0, std::f64::consts::FRAC_PI_2)
    }

    /// Evaluate a stage's yaw polynomial at a time since ignition.
    pub fn yaw_at(&self, stage: usize, t_since_ignition_s: f64) -> f64 {
        poly_eval(
            self.yaw_polys.get(stage).map(Vec::as_slice).unwrap_or(&[]),
            t_since_ignition_s,
        )
    }
}

fn poly_eval(coeffs: &[f64], t: f64) -> f64 {
    let mut value = 0.0;
    for &c in coeffs.iter().rev() {
        value = value * t + c;
    }
    value
}
