//! State vector, state derivative, and maneuver records shared across crates.

use serde::Serialize;

use crate::vector::{self, Vector3};

/// Coordinate frame tag carried by every state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoordinateFrame {
    /// True Equator Mean Equinox (TLE convention).
    Teme,
    /// J2000 Earth-Centred Inertial.
    J2000Eci,
    /// Earth-Centred Earth-Fixed (WGS-84).
    Ecef,
    /// Generic body-fixed frame.
    BodyFixed,
    /// Heliocentric J2000 Equatorial.
    HeliocentricJ2000,
}

/// Universal state vector for propagated objects.
///
/// Position and velocity are the fields the engine integrates; attitude and
/// angular velocity are carried for callers but unused by the core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateVector {
    /// Position [m].
    pub position_m: Vector3,
    /// Velocity [m/s].
    pub velocity_m_s: Vector3,
    /// Attitude quaternion (w, x, y, z).
    pub attitude: [f64; 4],
    /// Angular velocity [rad/s].
    pub angular_velocity_rad_s: Vector3,
    /// Simulation time, seconds since epoch.
    pub time_s: f64,
    /// Coordinate frame of position and velocity.
    pub frame: CoordinateFrame,
}

impl Default for StateVector {
    fn default() -> Self {
        Self {
            position_m: vector::zero(),
            velocity_m_s: vector::zero(),
            attitude: [1.0, 0.0, 0.0, 0.0],
            angular_velocity_rad_s: vector::zero(),
            time_s: 0.0,
            frame: CoordinateFrame::J2000Eci,
        }
    }
}

impl StateVector {
    /// Build a state from position and velocity, zero attitude rates.
    pub fn from_rv(
        position_m: Vector3,
        velocity_m_s: Vector3,
        time_s: f64,
        frame: CoordinateFrame,
    ) -> Self {
        Self {
            position_m,
            velocity_m_s,
            time_s,
            frame,
            ..Self::default()
        }
    }

    /// Distance from the frame origin [m].
    #[inline]
    pub fn radius_m(&self) -> f64 {
        vector::norm(&self.position_m)
    }

    /// Speed relative to the frame [m/s].
    #[inline]
    pub fn speed_m_s(&self) -> f64 {
        vector::norm(&self.velocity_m_s)
    }

    /// Specific orbital energy v²/2 − μ/r [m²/s²].
    #[inline]
    pub fn specific_energy(&self, mu_m3_s2: f64) -> f64 {
        let r = self.radius_m();
        0.5 * vector::norm_sq(&self.velocity_m_s) - mu_m3_s2 / r
    }

    /// Specific angular momentum r × v [m²/s].
    #[inline]
    pub fn angular_momentum(&self) -> Vector3 {
        vector::cross(&self.position_m, &self.velocity_m_s)
    }

    /// Copy of this state with a delta-v added to the velocity.
    pub fn with_delta_v(&self, delta_v_m_s: &Vector3) -> Self {
        let mut out = *self;
        out.velocity_m_s = vector::add(&self.velocity_m_s, delta_v_m_s);
        out
    }
}

/// Time derivative of a state vector.
///
/// Carried as a named type so integrator stages never alias position as
/// acceleration.
#[derive(Debug, Clone, Copy)]
pub struct StateDerivative {
    /// d(position)/dt [m/s].
    pub velocity_m_s: Vector3,
    /// d(velocity)/dt [m/s²].
    pub acceleration_m_s2: Vector3,
    /// d(time)/dt, always 1.
    pub d_time: f64,
}

impl StateDerivative {
    /// Derivative from velocity and acceleration; d_time fixed at 1.
    pub fn new(velocity_m_s: Vector3, acceleration_m_s2: Vector3) -> Self {
        Self {
            velocity_m_s,
            acceleration_m_s2,
            d_time: 1.0,
        }
    }
}

/// An impulsive maneuver: epoch and delta-v, with solver free-variable flags.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Maneuver {
    /// Seconds since the reference epoch.
    pub epoch_s: f64,
    /// Delta-v in the inertial frame [m/s].
    pub delta_v_m_s: Vector3,
    /// Whether a solver may adjust the epoch.
    pub free_epoch: bool,
    /// Whether a solver may adjust the delta-v components.
    pub free_delta_v: bool,
}

impl Maneuver {
    /// Fixed-epoch maneuver with free delta-v components.
    pub fn at(epoch_s: f64, delta_v_m_s: Vector3) -> Self {
        Self {
            epoch_s,
            delta_v_m_s,
            free_epoch: false,
            free_delta_v: true,
        }
    }

    /// Magnitude of the delta-v [m/s].
    pub fn magnitude_m_s(&self) -> f64 {
        vector::norm(&self.delta_v_m_s)
    }
}
