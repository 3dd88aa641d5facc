//! Force-model configuration and evaluation.
//!
//! A [`ForceModel`] closes over a configuration and an epoch and produces
//! state derivatives for the integrators: the total acceleration is the
//! direct sum of the active perturbation terms.

pub mod atmosphere;
pub mod gravity;

pub use atmosphere::{AtmosphereKind, AtmosphereState};
pub use gravity::gravity_gradient;

use log::debug;

use traj_bodies::{Body, ephemeris};
use traj_core::constants::{AU_M, G0, SECONDS_PER_DAY, SUN_MU};
use traj_core::frames;
use traj_core::state::{StateDerivative, StateVector};
use traj_core::vector::{self, Vector3};

/// Solar radiation pressure at 1 AU [N/m²].
pub const SOLAR_PRESSURE_1AU: f64 = 4.56e-6;

/// Which body sits at the origin of the propagation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CentralBody {
    Sun,
    Planet(Body),
}

/// Atmospheric drag configuration.
#[derive(Debug, Clone, Copy)]
pub struct DragConfig {
    pub mass_kg: f64,
    pub area_m2: f64,
    pub cd: f64,
    pub atmosphere: AtmosphereKind,
}

/// Cannonball solar-radiation-pressure configuration. Eclipses are ignored.
#[derive(Debug, Clone, Copy)]
pub struct SrpConfig {
    pub area_m2: f64,
    pub mass_kg: f64,
    pub reflectivity: f64,
}

/// Thrust pointing strategies for continuous low thrust.
#[derive(Debug, Clone, Copy)]
pub enum ThrustPointing {
    /// Along the velocity vector.
    Prograde,
    /// Against the velocity vector.
    AntiVelocity,
    /// Along the Sun-to-spacecraft direction (outbound).
    SunPointing,
    /// Toward the Sun.
    AntiSun,
    /// A caller-supplied inertial unit vector.
    FixedInertial(Vector3),
}

/// Continuous-thrust configuration.
///
/// `mass_kg` is the running-mass snapshot used for this evaluation; the
/// propagator's mass-tracking loop owns depletion and re-supplies the value
/// each accepted step.
#[derive(Debug, Clone, Copy)]
pub struct LowThrustConfig {
    /// Thrust at 1 AU [N].
    pub thrust_n: f64,
    /// Specific impulse [s].
    pub isp_s: f64,
    pub pointing: ThrustPointing,
    /// Scale thrust by (1 AU / r_sun)² when set (solar-electric arrays).
    pub solar_scaling: bool,
    /// Current spacecraft mass [kg].
    pub mass_kg: f64,
}

impl LowThrustConfig {
    /// Deliverable thrust at a heliocentric distance [N].
    ///
    /// Solar distance is clamped below 0.1 AU to keep the inverse-square
    /// scaling finite near the Sun.
    pub fn actual_thrust_n(&self, solar_distance_m: f64) -> f64 {
        if !self.solar_scaling {
            return self.thrust_n;
        }
        let r_au = (solar_distance_m / AU_M).max(0.1);
        self.thrust_n / (r_au * r_au)
    }

    /// Mass flow ṁ = T/(Isp g₀) at a heliocentric distance [kg/s].
    pub fn mass_flow_kg_s(&self, solar_distance_m: f64) -> f64 {
        self.actual_thrust_n(solar_distance_m) / (self.isp_s * G0)
    }
}

/// Which perturbations are active, and their parameters.
#[derive(Debug, Clone)]
pub struct ForceModelConfig {
    pub central_body: CentralBody,
    pub central_body_mu: f64,
    pub central_body_radius_m: f64,
    pub include_j2: bool,
    pub include_j3: bool,
    pub include_j4: bool,
    pub j2: f64,
    pub j3: f64,
    pub j4: f64,
    /// Perturbing planets; positions queried from the ephemeris per
    /// derivative evaluation.
    pub third_bodies: Vec<Body>,
    pub drag: Option<DragConfig>,
    pub srp: Option<SrpConfig>,
    pub low_thrust: Option<LowThrustConfig>,
}

impl ForceModelConfig {
    /// Pure two-body model about an arbitrary μ.
    pub fn two_body(mu_m3_s2: f64) -> Self {
        Self {
            central_body: CentralBody::Planet(Body::Earth),
            central_body_mu: mu_m3_s2,
            central_body_radius_m: 0.0,
            include_j2: false,
            include_j3: false,
            include_j4: false,
            j2: 0.0,
            j3: 0.0,
            j4: 0.0,
            third_bodies: Vec::new(),
            drag: None,
            srp: None,
            low_thrust: None,
        }
    }

    /// Two-body model centred on a planet, zonals off.
    pub fn for_body(body: Body) -> Self {
        let c = body.constants();
        Self {
            central_body: CentralBody::Planet(body),
            central_body_mu: c.mu_m3_s2,
            central_body_radius_m: c.radius_m,
            j2: c.j2,
            j3: c.j3,
            j4: c.j4,
            ..Self::two_body(c.mu_m3_s2)
        }
    }

    /// Earth-centred model with the full J2–J4 zonal set active.
    pub fn earth_with_zonals() -> Self {
        Self {
            include_j2: true,
            include_j3: true,
            include_j4: true,
            ..Self::for_body(Body::Earth)
        }
    }

    /// Heliocentric model (Sun gravity at the origin).
    pub fn heliocentric() -> Self {
        Self {
            central_body: CentralBody::Sun,
            central_body_mu: SUN_MU,
            central_body_radius_m: 0.0,
            ..Self::two_body(SUN_MU)
        }
    }

    /// Add perturbing planets.
    pub fn with_third_bodies(mut self, bodies: &[Body]) -> Self {
        self.third_bodies.extend_from_slice(bodies);
        self
    }

    pub fn with_drag(mut self, drag: DragConfig) -> Self {
        self.drag = Some(drag);
        self
    }

    pub fn with_srp(mut self, srp: SrpConfig) -> Self {
        self.srp = Some(srp);
        self
    }

    pub fn with_low_thrust(mut self, low_thrust: LowThrustConfig) -> Self {
        self.low_thrust = Some(low_thrust);
        self
    }
}

/// Evaluates state derivatives for a configuration and epoch.
pub struct ForceModel {
    config: ForceModelConfig,
    epoch_jd: f64,
}

impl ForceModel {
    /// Build a model; `epoch_jd` is the Julian Date at state time zero.
    pub fn new(config: ForceModelConfig, epoch_jd: f64) -> Self {
        Self { config, epoch_jd }
    }

    pub fn config(&self) -> &ForceModelConfig {
        &self.config
    }

    /// Replace the low-thrust running mass snapshot (mass-tracking loop).
    pub fn set_low_thrust_mass(&mut self, mass_kg: f64) {
        if let Some(lt) = self.config.low_thrust.as_mut() {
            lt.mass_kg = mass_kg;
        }
    }

    /// Julian Date at a state's simulation time.
    #[inline]
    pub fn jd_at(&self, time_s: f64) -> f64 {
        self.epoch_jd + time_s / SECONDS_PER_DAY
    }

    /// Total acceleration at a state [m/s²].
    pub fn acceleration(&self, state: &StateVector) -> Vector3 {
        let cfg = &self.config;
        let pos = &state.position_m;

        let mut acc = gravity::two_body(pos, cfg.central_body_mu);

        if cfg.include_j2 {
            acc = vector::add(
                &acc,
                &gravity::j2_perturbation(pos, cfg.central_body_mu, cfg.j2, cfg.central_body_radius_m),
            );
        }
        if cfg.include_j3 {
            acc = vector::add(
                &acc,
                &gravity::j3_perturbation(pos, cfg.central_body_mu, cfg.j3, cfg.central_body_radius_m),
            );
        }
        if cfg.include_j4 {
            acc = vector::add(
                &acc,
                &gravity::j4_perturbation(pos, cfg.central_body_mu, cfg.j4, cfg.central_body_radius_m),
            );
        }

        let jd = self.jd_at(state.time_s);

        for &body in &cfg.third_bodies {
            match self.third_body_position(body, jd) {
                Some(p3) => {
                    acc = vector::add(
                        &acc,
                        &gravity::third_body(pos, &p3, body.constants().mu_m3_s2),
                    );
                }
                None => {
                    debug!("no ephemeris for third body {}, skipping", body.name());
                }
            }
        }

        if let Some(drag) = &cfg.drag {
            acc = vector::add(&acc, &self.drag_acceleration(state, drag));
        }

        if let Some(srp) = &cfg.srp {
            if let Some(a_srp) = self.srp_acceleration(state, srp, jd) {
                acc = vector::add(&acc, &a_srp);
            }
        }

        if let Some(lt) = &cfg.low_thrust {
            acc = vector::add(&acc, &self.thrust_acceleration(state, lt, jd));
        }

        acc
    }

    /// State derivative (velocity, acceleration, dt = 1).
    pub fn derivative(&self, state: &StateVector) -> StateDerivative {
        StateDerivative::new(state.velocity_m_s, self.acceleration(state))
    }

    /// Consume the model into a derivative closure for the integrators.
    pub fn into_fn(self) -> impl Fn(&StateVector) -> StateDerivative {
        move |state| self.derivative(state)
    }

    /// Heliocentric distance of a state [m]; 1 AU when the ephemeris cannot
    /// resolve the central body.
    pub fn solar_distance_m(&self, state: &StateVector) -> f64 {
        let jd = self.jd_at(state.time_s);
        self.sun_relative_position(state, jd)
            .map(|r| vector::norm(&r))
            .unwrap_or(AU_M)
    }

    /// Remove the low-thrust term (propellant exhausted).
    pub fn disable_low_thrust(&mut self) {
        self.config.low_thrust = None;
    }

    /// Third-body position relative to the central body, from the ephemeris.
    fn third_body_position(&self, body: Body, jd: f64) -> Option<Vector3> {
        let body_hci = ephemeris::position_hci(body, jd).ok()?;
        match self.config.central_body {
            CentralBody::Sun => Some(body_hci),
            CentralBody::Planet(central) => {
                if central == body {
                    return None;
                }
                let central_hci = ephemeris::position_hci(central, jd).ok()?;
                Some(vector::sub(&body_hci, &central_hci))
            }
        }
    }

    /// Spacecraft position relative to the Sun.
    fn sun_relative_position(&self, state: &StateVector, jd: f64) -> Option<Vector3> {
        match self.config.central_body {
            CentralBody::Sun => Some(state.position_m),
            CentralBody::Planet(central) => {
                let central_hci = ephemeris::position_hci(central, jd).ok()?;
                Some(vector::add(&state.position_m, &central_hci))
            }
        }
    }

    fn drag_acceleration(&self, state: &StateVector, drag: &DragConfig) -> Vector3 {
        let altitude = state.radius_m() - self.config.central_body_radius_m;
        if altitude > atmosphere::karman_line_m(drag.atmosphere) {
            return vector::zero();
        }

        // Airspeed: Earth's rotation is modeled; Mars is treated as
        // non-rotating at these fidelities.
        let v_rel = match drag.atmosphere {
            AtmosphereKind::Earth => {
                frames::earth_relative_velocity(&state.position_m, &state.velocity_m_s)
            }
            AtmosphereKind::Mars => state.velocity_m_s,
        };

        let rho = atmosphere::density(drag.atmosphere, altitude);
        let force = atmosphere::drag_force(&v_rel, rho, drag.cd, drag.area_m2);
        vector::scale(&force, 1.0 / drag.mass_kg)
    }

    fn srp_acceleration(&self, state: &StateVector, srp: &SrpConfig, jd: f64) -> Option<Vector3> {
        let r_sun = self.sun_relative_position(state, jd)?;
        let dist = vector::norm(&r_sun);
        let r_hat = vector::normalize(&r_sun)?;

        let au_ratio = AU_M / dist;
        let accel = srp.reflectivity * SOLAR_PRESSURE_1AU * au_ratio * au_ratio * srp.area_m2
            / srp.mass_kg;
        Some(vector::scale(&r_hat, accel))
    }

    fn thrust_acceleration(&self, state: &StateVector, lt: &LowThrustConfig, jd: f64) -> Vector3 {
        if lt.mass_kg <= 0.0 {
            return vector::zero();
        }

        let solar_distance = self
            .sun_relative_position(state, jd)
            .map(|r| vector::norm(&r))
            .unwrap_or(AU_M);

        let thrust = lt.actual_thrust_n(solar_distance);
        let accel_mag = thrust / lt.mass_kg;

        let dir = match lt.pointing {
            ThrustPointing::Prograde => vector::normalize(&state.velocity_m_s),
            ThrustPointing::AntiVelocity => {
                vector::normalize(&state.velocity_m_s).map(|v| vector::scale(&v, -1.0))
            }
            ThrustPointing::SunPointing => self
                .sun_relative_position(state, jd)
                .and_then(|r| vector::normalize(&r)),
            ThrustPointing::AntiSun => self
                .sun_relative_position(state, jd)
                .and_then(|r| vector::normalize(&r))
                .map(|r| vector::scale(&r, -1.0)),
            ThrustPointing::FixedInertial(dir) => vector::normalize(&dir),
        };

        match dir {
            Some(d) => vector::scale(&d, accel_mag),
            None => vector::zero(),
        }
    }
}
