//! Celestial body constants and planetary ephemeris.
//!
//! Bodies are a closed enumeration backed by one immutable registry; the Sun
//! sits implicitly at the heliocentric origin with its own μ
//! (`traj_core::constants::SUN_MU`).

pub mod ephemeris;

pub use ephemeris::{EphemerisError, position_eci, position_hci, state_hci, velocity_hci};

use serde::Serialize;

use traj_core::state::StateVector;
use traj_core::vector::{self, Vector3};

/// The solar system bodies the engine models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Body {
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    Moon,
}

/// Physical constants of a body, SI units.
#[derive(Debug, Clone, Copy)]
pub struct BodyConstants {
    pub name: &'static str,
    /// Gravitational parameter GM [m³/s²].
    pub mu_m3_s2: f64,
    /// Mean equatorial radius [m].
    pub radius_m: f64,
    /// Sphere-of-influence radius [m].
    pub soi_radius_m: f64,
    /// Second zonal harmonic (0 when not modeled).
    pub j2: f64,
    /// Third zonal harmonic.
    pub j3: f64,
    /// Fourth zonal harmonic.
    pub j4: f64,
}

// Earth zonals are EGM96; other bodies carry J2 only.
static REGISTRY: [BodyConstants; 10] = [
    BodyConstants {
        name: "Mercury",
        mu_m3_s2: 2.2032e13,
        radius_m: 2_439_700.0,
        soi_radius_m: 1.124e8,
        j2: 6.0e-5,
        j3: 0.0,
        j4: 0.0,
    },
    BodyConstants {
        name: "Venus",
        mu_m3_s2: 3.24859e14,
        radius_m: 6_051_800.0,
        soi_radius_m: 6.162e8,
        j2: 4.458e-6,
        j3: 0.0,
        j4: 0.0,
    },
    BodyConstants {
        name: "Earth",
        mu_m3_s2: 3.986_004_418e14,
        radius_m: 6_378_137.0,
        soi_radius_m: 9.29e8,
        j2: 1.082_626_68e-3,
        j3: -2.532_656_48e-6,
        j4: -1.610_987_61e-6,
    },
    BodyConstants {
        name: "Mars",
        mu_m3_s2: 4.282_837e13,
        radius_m: 3_396_200.0,
        soi_radius_m: 5.774e8,
        j2: 1.960_45e-3,
        j3: 0.0,
        j4: 0.0,
    },
    BodyConstants {
        name: "Jupiter",
        mu_m3_s2: 1.266_865_34e17,
        radius_m: 71_492_000.0,
        soi_radius_m: 4.82e10,
        j2: 1.4736e-2,
        j3: 0.0,
        j4: 0.0,
    },
    BodyConstants {
        name: "Saturn",
        mu_m3_s2: 3.793_118_7e16,
        radius_m: 60_268_000.0,
        soi_radius_m: 5.468e10,
        j2: 1.6298e-2,
        j3: 0.0,
        j4: 0.0,
    },
    BodyConstants {
        name: "Uranus",
        mu_m3_s2: 5.793_939e15,
        radius_m: 25_559_000.0,
        soi_radius_m: 5.178e10,
        j2: 3.343e-3,
        j3: 0.0,
        j4: 0.0,
    },
    BodyConstants {
        name: "Neptune",
        mu_m3_s2: 6.836_529e15,
        radius_m: 24_764_000.0,
        soi_radius_m: 8.678e10,
        j2: 3.411e-3,
        j3: 0.0,
        j4: 0.0,
    },
    BodyConstants {
        name: "Pluto",
        mu_m3_s2: 8.71e11,
        radius_m: 1_188_300.0,
        soi_radius_m: 3.13e9,
        j2: 0.0,
        j3: 0.0,
        j4: 0.0,
    },
    BodyConstants {
        name: "Moon",
        mu_m3_s2: 4.904_869_5e12,
        radius_m: 1_737_400.0,
        soi_radius_m: 6.61e7,
        j2: 2.027e-4,
        j3: 0.0,
        j4: 0.0,
    },
];

impl Body {
    /// The nine planets, ordered outward from the Sun.
    pub const PLANETS: [Body; 9] = [
        Body::Mercury,
        Body::Venus,
        Body::Earth,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
    ];

    /// Immutable physical constants for this body.
    pub fn constants(self) -> &'static BodyConstants {
        &REGISTRY[self as usize]
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        self.constants().name
    }

    /// Look a body up by (case-insensitive) name, for config catalogs.
    pub fn from_name(name: &str) -> Option<Body> {
        let upper = name.to_ascii_uppercase();
        [
            Body::Mercury,
            Body::Venus,
            Body::Earth,
            Body::Mars,
            Body::Jupiter,
            Body::Saturn,
            Body::Uranus,
            Body::Neptune,
            Body::Pluto,
            Body::Moon,
        ]
        .into_iter()
        .find(|b| b.name().to_ascii_uppercase() == upper)
    }
}

/// First candidate whose sphere of influence contains the HCI position.
///
/// Used for patched-conic primary switching: returns `Some(body)` when the
/// spacecraft sits inside a candidate's SOI, `None` when the Sun dominates.
pub fn dominant_body(
    pos_hci_m: &Vector3,
    jd: f64,
    candidates: &[Body],
) -> Result<Option<Body>, EphemerisError> {
    for &body in candidates {
        let body_pos = position_hci(body, jd)?;
        let dist = vector::norm(&vector::sub(pos_hci_m, &body_pos));
        if dist < body.constants().soi_radius_m {
            return Ok(Some(body));
        }
    }
    Ok(None)
}

/// Convert an HCI state to body-centred coordinates (axes parallel to J2000).
pub fn hci_to_body_centered(
    state_hci: &StateVector,
    body: Body,
    jd: f64,
) -> Result<StateVector, EphemerisError> {
    let body_state = state_hci_of(body, jd)?;
    let mut out = *state_hci;
    out.position_m = vector::sub(&state_hci.position_m, &body_state.position_m);
    out.velocity_m_s = vector::sub(&state_hci.velocity_m_s, &body_state.velocity_m_s);
    out.frame = traj_core::state::CoordinateFrame::J2000Eci;
    Ok(out)
}

/// Convert a body-centred state (axes parallel to J2000) back to HCI.
pub fn body_centered_to_hci(
    state_bc: &StateVector,
    body: Body,
    jd: f64,
) -> Result<StateVector, EphemerisError> {
    let body_state = state_hci_of(body, jd)?;
    let mut out = *state_bc;
    out.position_m = vector::add(&state_bc.position_m, &body_state.position_m);
    out.velocity_m_s = vector::add(&state_bc.velocity_m_s, &body_state.velocity_m_s);
    out.frame = traj_core::state::CoordinateFrame::HeliocentricJ2000;
    Ok(out)
}

fn state_hci_of(body: Body, jd: f64) -> Result<StateVector, EphemerisError> {
    ephemeris::state_hci(body, jd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_matches_enum_order() {
        assert_eq!(Body::Earth.name(), "Earth");
        assert_eq!(Body::Moon.name(), "Moon");
        assert!((Body::Earth.constants().mu_m3_s2 - 3.986_004_418e14).abs() < 1.0);
    }

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(Body::from_name("MARS"), Some(Body::Mars));
        assert_eq!(Body::from_name("europa"), None);
    }

    #[test]
    fn earth_carries_full_zonal_set() {
        let earth = Body::Earth.constants();
        assert!(earth.j2 > 1.0e-3);
        assert!(earth.j3 < 0.0);
        assert!(earth.j4 < 0.0);
        // Other bodies stop at J2.
        assert_eq!(Body::Mars.constants().j3, 0.0);
    }
}
