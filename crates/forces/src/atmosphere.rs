//! Layered atmosphere models and aerodynamic helpers.
//!
//! Earth follows the US Standard Atmosphere layer structure up to the
//! mesopause with an exponential tail; Mars uses a two-layer CO₂ model from
//! simplified Mars-GRAM data.

use traj_core::constants::G0;
use traj_core::vector::{self, Vector3};

/// Which atmosphere model a drag configuration selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtmosphereKind {
    Earth,
    Mars,
}

/// Thermodynamic state at an altitude.
#[derive(Debug, Clone, Copy)]
pub struct AtmosphereState {
    pub temperature_k: f64,
    pub pressure_pa: f64,
    pub density_kg_m3: f64,
    pub speed_of_sound_m_s: f64,
}

/// Sutton–Graves constant for Earth entry, SI units.
pub const SUTTON_GRAVES_EARTH: f64 = 1.7415e-4;

/// Earth atmosphere (US Standard 1976 layers).
pub mod earth {
    use super::AtmosphereState;
    use traj_core::constants::G0;

    pub const SEA_LEVEL_DENSITY: f64 = 1.225; // kg/m³
    pub const SEA_LEVEL_PRESSURE: f64 = 101_325.0; // Pa
    pub const SEA_LEVEL_TEMPERATURE: f64 = 288.15; // K
    pub const GAS_CONSTANT: f64 = 287.053; // J/(kg·K)
    pub const GAMMA: f64 = 1.4;
    /// Kármán line: drag is disabled above this altitude.
    pub const KARMAN_LINE_M: f64 = 100_000.0;

    const H_TROPOPAUSE: f64 = 11_000.0;
    const H_STRATOPAUSE: f64 = 47_000.0;
    const H_MESOPAUSE: f64 = 85_000.0;

    /// Full atmospheric state from the layered model.
    pub fn atmosphere(altitude_m: f64) -> AtmosphereState {
        let altitude = altitude_m.max(0.0);

        let (temperature, pressure) = if altitude > H_MESOPAUSE {
            // Above the mesopause: isothermal exponential decay.
            let h = altitude - H_MESOPAUSE;
            let scale_height = 6_500.0;
            let t = 186.87;
            (t, 0.37 * (-h / scale_height).exp())
        } else if altitude > H_STRATOPAUSE {
            // Mesosphere, temperature falling.
            let h = altitude - H_STRATOPAUSE;
            let lapse = -0.0028;
            let t0 = 270.65;
            let p0 = 110.91;
            let t = (t0 + lapse * h).max(186.87);
            (t, p0 * (t / t0).powf(-G0 / (lapse * GAS_CONSTANT)))
        } else if altitude > 32_000.0 {
            // Upper stratosphere, warming.
            let h = altitude - 32_000.0;
            let lapse = 0.0028;
            let t0 = 228.65;
            let p0 = 868.02;
            let t = t0 + lapse * h;
            (t, p0 * (t / t0).powf(-G0 / (lapse * GAS_CONSTANT)))
        } else if altitude > 20_000.0 {
            // Middle stratosphere, slow warming.
            let h = altitude - 20_000.0;
            let lapse = 0.001;
            let t0 = 216.65;
            let p0 = 5_474.89;
            let t = t0 + lapse * h;
            (t, p0 * (t / t0).powf(-G0 / (lapse * GAS_CONSTANT)))
        } else if altitude > H_TROPOPAUSE {
            // Lower stratosphere, isothermal.
            let h = altitude - H_TROPOPAUSE;
            let t = 216.65;
            let p0 = 22_632.1;
            (t, p0 * (-G0 * h / (GAS_CONSTANT * t)).exp())
        } else {
            // Troposphere.
            let lapse = -0.0065;
            let t = SEA_LEVEL_TEMPERATURE + lapse * altitude;
            (
                t,
                SEA_LEVEL_PRESSURE
                    * (t / SEA_LEVEL_TEMPERATURE).powf(-G0 / (lapse * GAS_CONSTANT)),
            )
        };

        let density = pressure / (GAS_CONSTANT * temperature);
        AtmosphereState {
            temperature_k: temperature,
            pressure_pa: pressure,
            density_kg_m3: density,
            speed_of_sound_m_s: (GAMMA * GAS_CONSTANT * temperature).sqrt(),
        }
    }

    /// Density with the Kármán-line cutoff; the fast path for drag.
    pub fn density(altitude_m: f64) -> f64 {
        if altitude_m > KARMAN_LINE_M {
            return 0.0;
        }
        density_extended(altitude_m)
    }

    /// Density without the Kármán cutoff, for entry-interface integrations.
    pub fn density_extended(altitude_m: f64) -> f64 {
        if altitude_m > 50_000.0 {
            // Single-exponential tail.
            let scale_height = 7_400.0;
            return SEA_LEVEL_DENSITY * (-altitude_m / scale_height).exp();
        }
        atmosphere(altitude_m).density_kg_m3
    }
}

/// Mars atmosphere: two-layer CO₂ exponential model to 200 km.
pub mod mars {
    use super::AtmosphereState;

    pub const SURFACE_DENSITY: f64 = 0.020; // kg/m³
    pub const SURFACE_PRESSURE: f64 = 610.0; // Pa
    pub const SURFACE_TEMPERATURE: f64 = 210.0; // K
    pub const SCALE_HEIGHT_M: f64 = 11_100.0;
    pub const GAS_CONSTANT_CO2: f64 = 188.92; // J/(kg·K)
    pub const GAMMA_CO2: f64 = 1.29;
    pub const MARS_G0: f64 = 3.72076; // m/s²
    /// Approximate edge of the Martian atmosphere.
    pub const KARMAN_LINE_M: f64 = 80_000.0;

    /// Full atmospheric state.
    pub fn atmosphere(altitude_m: f64) -> AtmosphereState {
        let altitude = altitude_m.max(0.0);

        if altitude > 200_000.0 {
            return AtmosphereState {
                temperature_k: 130.0,
                pressure_pa: 0.0,
                density_kg_m3: 0.0,
                speed_of_sound_m_s: 0.0,
            };
        }

        let (temperature, density) = if altitude <= 7_000.0 {
            // Lower troposphere with a 2.5 K/km lapse.
            let t = SURFACE_TEMPERATURE - 0.0025 * altitude;
            let p = SURFACE_PRESSURE
                * (t / SURFACE_TEMPERATURE).powf(MARS_G0 / (GAS_CONSTANT_CO2 * 0.0025));
            (t, p / (GAS_CONSTANT_CO2 * t))
        } else if altitude <= 80_000.0 {
            // Mid atmosphere: exponential decay toward a ~150 K mesosphere.
            let t_ref = SURFACE_TEMPERATURE - 0.0025 * 7_000.0;
            let p_ref = SURFACE_PRESSURE
                * (t_ref / SURFACE_TEMPERATURE).powf(MARS_G0 / (GAS_CONSTANT_CO2 * 0.0025));
            let rho_ref = p_ref / (GAS_CONSTANT_CO2 * t_ref);

            let t = 150.0 + (t_ref - 150.0) * (-(altitude - 7_000.0) / 45_000.0).exp();
            let rho = rho_ref * (-(altitude - 7_000.0) / SCALE_HEIGHT_M).exp();
            (t, rho)
        } else {
            // Thermosphere: near-isothermal with a larger scale height.
            let rho_80 = SURFACE_DENSITY * (-80_000.0 / SCALE_HEIGHT_M).exp();
            let t = 130.0;
            let rho = rho_80 * (-(altitude - 80_000.0) / 20_000.0).exp();
            (t, rho)
        };

        AtmosphereState {
            temperature_k: temperature,
            pressure_pa: density * GAS_CONSTANT_CO2 * temperature,
            density_kg_m3: density,
            speed_of_sound_m_s: (GAMMA_CO2 * GAS_CONSTANT_CO2 * temperature).sqrt(),
        }
    }

    /// Density fast path.
    pub fn density(altitude_m: f64) -> f64 {
        let altitude = altitude_m.max(0.0);
        if altitude > 200_000.0 {
            return 0.0;
        }
        if altitude <= 80_000.0 {
            SURFACE_DENSITY * (-altitude / SCALE_HEIGHT_M).exp()
        } else {
            let rho_80 = SURFACE_DENSITY * (-80_000.0 / SCALE_HEIGHT_M).exp();
            rho_80 * (-(altitude - 80_000.0) / 20_000.0).exp()
        }
    }
}

/// Density for a selected atmosphere, with each body's Kármán cutoff.
pub fn density(kind: AtmosphereKind, altitude_m: f64) -> f64 {
    match kind {
        AtmosphereKind::Earth => earth::density(altitude_m),
        AtmosphereKind::Mars => {
            if altitude_m > mars::KARMAN_LINE_M {
                0.0
            } else {
                mars::density(altitude_m)
            }
        }
    }
}

/// Kármán line for a selected atmosphere [m].
pub fn karman_line_m(kind: AtmosphereKind) -> f64 {
    match kind {
        AtmosphereKind::Earth => earth::KARMAN_LINE_M,
        AtmosphereKind::Mars => mars::KARMAN_LINE_M,
    }
}

/// Drag force F = −½ ρ C_d A ‖v‖ v for a given density [N].
pub fn drag_force(velocity_m_s: &Vector3, density_kg_m3: f64, cd: f64, area_m2: f64) -> Vector3 {
    if density_kg_m3 < 1.0e-15 {
        return vector::zero();
    }
    let v_mag = vector::norm(velocity_m_s);
    if v_mag < 1.0e-6 {
        return vector::zero();
    }
    let drag_mag = 0.5 * density_kg_m3 * v_mag * v_mag * cd * area_m2;
    vector::scale(velocity_m_s, -drag_mag / v_mag)
}

/// Dynamic pressure q = ½ ρ v² [Pa].
pub fn dynamic_pressure(speed_m_s: f64, density_kg_m3: f64) -> f64 {
    0.5 * density_kg_m3 * speed_m_s * speed_m_s
}

/// Sutton–Graves stagnation-point heat flux q = K √(ρ/rₙ) v³ [W/m²].
pub fn heat_flux(speed_m_s: f64, density_kg_m3: f64, nose_radius_m: f64) -> f64 {
    if nose_radius_m <= 0.0 {
        return 0.0;
    }
    SUTTON_GRAVES_EARTH * (density_kg_m3 / nose_radius_m).sqrt() * speed_m_s.powi(3)
}

/// Deceleration load in multiples of g₀.
pub fn g_load(drag_force_n: f64, mass_kg: f64) -> f64 {
    drag_force_n / (mass_kg * G0)
}
