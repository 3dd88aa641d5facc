//! Planetary positions from Standish (1992) mean orbital elements.
//!
//! Mean elements at J2000 with linear secular rates per Julian century,
//! referenced to the J2000 ecliptic and equinox (Meeus Table 31.A / JPL).
//! Accuracy is mission-design grade, roughly an arcminute over ±3 centuries
//! of J2000; out-of-range dates are extrapolated as requested and degrade
//! smoothly.

use thiserror::Error;

use traj_core::constants::{AU_M, SECONDS_PER_DAY};
use traj_core::frames;
use traj_core::state::{CoordinateFrame, StateVector};
use traj_core::time::{J2000_JD, JULIAN_CENTURY_DAYS};
use traj_core::vector::Vector3;

use crate::Body;

const PI: f64 = std::f64::consts::PI;
const TWO_PI: f64 = 2.0 * PI;

/// Errors from ephemeris queries.
#[derive(Debug, Error)]
pub enum EphemerisError {
    #[error("no mean-element ephemeris for {0}")]
    Unsupported(&'static str),
}

/// Mean orbital elements at J2000 and secular rates per Julian century.
///
/// a in AU, e dimensionless, angles in degrees.
#[derive(Debug, Clone, Copy)]
struct MeanElementSet {
    a0: f64,
    da: f64,
    e0: f64,
    de: f64,
    i0: f64,
    di: f64,
    l0: f64,
    dl: f64,
    long_peri0: f64,
    dlong_peri: f64,
    long_node0: f64,
    dlong_node: f64,
}

static ELEMENTS: [MeanElementSet; 9] = [
    // Mercury
    MeanElementSet {
        a0: 0.387_099_27,
        da: 0.000_000_37,
        e0: 0.205_635_93,
        de: 0.000_019_06,
        i0: 7.004_979_02,
        di: -0.005_947_49,
        l0: 252.250_323_50,
        dl: 149_472.674_111_75,
        long_peri0: 77.457_796_28,
        dlong_peri: 0.160_476_89,
        long_node0: 48.330_765_93,
        dlong_node: -0.125_340_81,
    },
    // Venus
    MeanElementSet {
        a0: 0.723_335_66,
        da: 0.000_003_90,
        e0: 0.006_776_72,
        de: -0.000_041_07,
        i0: 3.394_676_05,
        di: -0.000_788_90,
        l0: 181.979_099_50,
        dl: 58_517.815_387_29,
        long_peri0: 131.602_467_18,
        dlong_peri: 0.002_683_29,
        long_node0: 76.679_842_55,
        dlong_node: -0.277_694_18,
    },
    // Earth-Moon barycenter
    MeanElementSet {
        a0: 1.000_002_61,
        da: 0.000_005_62,
        e0: 0.016_711_23,
        de: -0.000_043_92,
        i0: -0.000_015_31,
        di: -0.012_946_68,
        l0: 100.464_571_66,
        dl: 35_999.372_449_81,
        long_peri0: 102.937_681_93,
        dlong_peri: 0.323_273_64,
        long_node0: 0.0,
        dlong_node: 0.0,
    },
    // Mars
    MeanElementSet {
        a0: 1.523_710_34,
        da: 0.000_018_47,
        e0: 0.093_394_10,
        de: 0.000_078_82,
        i0: 1.849_691_42,
        di: -0.008_131_31,
        l0: -4.553_432_05,
        dl: 19_140.302_684_99,
        long_peri0: -23.943_629_59,
        dlong_peri: 0.444_410_88,
        long_node0: 49.559_538_91,
        dlong_node: -0.292_573_43,
    },
    // Jupiter
    MeanElementSet {
        a0: 5.202_887_00,
        da: -0.000_116_07,
        e0: 0.048_386_24,
        de: -0.000_132_53,
        i0: 1.304_396_95,
        di: -0.001_837_14,
        l0: 34.396_440_51,
        dl: 3_034.746_127_75,
        long_peri0: 14.728_479_83,
        dlong_peri: 0.212_526_68,
        long_node0: 100.473_909_09,
        dlong_node: 0.204_691_06,
    },
    // Saturn
    MeanElementSet {
        a0: 9.536_675_94,
        da: -0.001_250_60,
        e0: 0.053_861_79,
        de: -0.000_509_91,
        i0: 2.485_991_87,
        di: 0.001_936_09,
        l0: 49.954_244_23,
        dl: 1_222.493_622_01,
        long_peri0: 92.598_878_31,
        dlong_peri: -0.418_972_16,
        long_node0: 113.662_424_48,
        dlong_node: -0.288_677_94,
    },
    // Uranus
    MeanElementSet {
        a0: 19.189_164_64,
        da: -0.001_961_76,
        e0: 0.047_257_44,
        de: -0.000_043_97,
        i0: 0.772_637_83,
        di: -0.002_429_39,
        l0: 313.238_104_51,
        dl: 428.482_027_85,
        long_peri0: 170.954_276_30,
        dlong_peri: 0.408_052_81,
        long_node0: 74.016_925_03,
        dlong_node: 0.042_405_89,
    },
    // Neptune
    MeanElementSet {
        a0: 30.069_922_76,
        da: 0.000_262_91,
        e0: 0.008_590_48,
        de: 0.000_051_05,
        i0: 1.770_043_47,
        di: 0.000_353_72,
        l0: -55.120_029_69,
        dl: 218.459_453_25,
        long_peri0: 44.964_762_27,
        dlong_peri: -0.322_414_64,
        long_node0: 131.784_225_74,
        dlong_node: -0.005_086_64,
    },
    // Pluto
    MeanElementSet {
        a0: 39.482_116_75,
        da: -0.000_315_96,
        e0: 0.248_827_30,
        de: 0.000_051_70,
        i0: 17.140_012_06,
        di: 0.000_048_18,
        l0: 238.929_038_33,
        dl: 145.207_805_15,
        long_peri0: 224.068_916_29,
        dlong_peri: -0.040_629_42,
        long_node0: 110.303_936_84,
        dlong_node: -0.011_834_82,
    },
];

fn elements_for(body: Body) -> Result<&'static MeanElementSet, EphemerisError> {
    match body {
        Body::Moon => Err(EphemerisError::Unsupported(body.name())),
        _ => Ok(&ELEMENTS[body as usize]),
    }
}

/// Solve Kepler's equation M = E − e sin E by Newton iteration.
///
/// M is normalized to [0, 2π) first; the initial guess switches to π above
/// e = 0.8. Terminates on |ΔE| < `tol` or after 50 iterations.
pub fn solve_kepler(mean_anomaly_rad: f64, eccentricity: f64, tol: f64) -> f64 {
    let m = mean_anomaly_rad.rem_euclid(TWO_PI);
    let mut e_anom = if eccentricity < 0.8 { m } else { PI };

    for _ in 0..50 {
        let delta =
            (e_anom - eccentricity * e_anom.sin() - m) / (1.0 - eccentricity * e_anom.cos());
        e_anom -= delta;
        if delta.abs() < tol {
            break;
        }
    }
    e_anom
}

fn ecliptic_position(body: Body, jd: f64) -> Result<Vector3, EphemerisError> {
    let el = elements_for(body)?;

    // Julian centuries since J2000.
    let t = (jd - J2000_JD) / JULIAN_CENTURY_DAYS;

    let a = el.a0 + el.da * t;
    let e = el.e0 + el.de * t;
    let i = (el.i0 + el.di * t).to_radians();
    let l = (el.l0 + el.dl * t).to_radians();
    let long_peri = (el.long_peri0 + el.dlong_peri * t).to_radians();
    let long_node = (el.long_node0 + el.dlong_node * t).to_radians();

    let arg_peri = long_peri - long_node;
    let mean_anom = l - long_peri;

    let e_anom = solve_kepler(mean_anom, e, 1.0e-12);

    let sin_nu = (1.0 - e * e).sqrt() * e_anom.sin() / (1.0 - e * e_anom.cos());
    let cos_nu = (e_anom.cos() - e) / (1.0 - e * e_anom.cos());
    let nu = sin_nu.atan2(cos_nu);

    // Heliocentric distance [m].
    let r = a * (1.0 - e * e_anom.cos()) * AU_M;

    // Argument of latitude.
    let u = arg_peri + nu;
    let (sin_u, cos_u) = u.sin_cos();
    let (sin_node, cos_node) = long_node.sin_cos();
    let (sin_i, cos_i) = i.sin_cos();

    Ok([
        r * (cos_node * cos_u - sin_node * sin_u * cos_i),
        r * (sin_node * cos_u + cos_node * sin_u * cos_i),
        r * (sin_u * sin_i),
    ])
}

/// Heliocentric J2000 equatorial position of a planet [m].
pub fn position_hci(body: Body, jd: f64) -> Result<Vector3, EphemerisError> {
    let ecl = ecliptic_position(body, jd)?;
    Ok(frames::ecliptic_to_equatorial(&ecl))
}

/// Heliocentric velocity by central difference over ±10 s [m/s].
pub fn velocity_hci(body: Body, jd: f64) -> Result<Vector3, EphemerisError> {
    const H_S: f64 = 10.0;
    let h_jd = H_S / SECONDS_PER_DAY;

    let plus = position_hci(body, jd + h_jd)?;
    let minus = position_hci(body, jd - h_jd)?;

    Ok([
        (plus[0] - minus[0]) / (2.0 * H_S),
        (plus[1] - minus[1]) / (2.0 * H_S),
        (plus[2] - minus[2]) / (2.0 * H_S),
    ])
}

/// Full heliocentric state of a planet at a Julian Date.
pub fn state_hci(body: Body, jd: f64) -> Result<StateVector, EphemerisError> {
    Ok(StateVector::from_rv(
        position_hci(body, jd)?,
        velocity_hci(body, jd)?,
        (jd - J2000_JD) * SECONDS_PER_DAY,
        CoordinateFrame::HeliocentricJ2000,
    ))
}

/// Planet position relative to the Earth, axes parallel to J2000 [m].
pub fn position_eci(body: Body, jd: f64) -> Result<Vector3, EphemerisError> {
    let planet = position_hci(body, jd)?;
    let earth = position_hci(Body::Earth, jd)?;
    Ok([
        planet[0] - earth[0],
        planet[1] - earth[1],
        planet[2] - earth[2],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use traj_core::vector;

    #[test]
    fn kepler_residual_is_tiny() {
        for &e in &[0.0, 0.1, 0.5, 0.9, 0.99] {
            for k in 0..100 {
                let m = TWO_PI * (k as f64) / 100.0;
                let e_anom = solve_kepler(m, e, 1.0e-12);
                let residual = (e_anom - e * e_anom.sin() - m).rem_euclid(TWO_PI);
                let residual = residual.min(TWO_PI - residual);
                assert!(residual < 1.0e-10, "e={e} m={m} residual={residual}");
            }
        }
    }

    #[test]
    fn earth_at_j2000_is_near_one_au() {
        let pos = position_hci(Body::Earth, J2000_JD).unwrap();
        let r_au = vector::norm(&pos) / AU_M;
        // Early January: near perihelion.
        assert!((r_au - 0.9833).abs() < 0.005, "r = {r_au} AU");
    }

    #[test]
    fn earth_velocity_is_about_thirty_km_s() {
        let vel = velocity_hci(Body::Earth, J2000_JD).unwrap();
        let speed = vector::norm(&vel);
        assert!((speed - 29_800.0).abs() < 1_000.0, "speed = {speed}");
    }

    #[test]
    fn moon_has_no_mean_element_row() {
        assert!(position_hci(Body::Moon, J2000_JD).is_err());
    }

    #[test]
    fn planet_distances_follow_semi_major_axes() {
        for (body, a_au) in [
            (Body::Mars, 1.524),
            (Body::Jupiter, 5.203),
            (Body::Saturn, 9.537),
        ] {
            let pos = position_hci(body, J2000_JD).unwrap();
            let r_au = vector::norm(&pos) / AU_M;
            assert!(
                (r_au - a_au).abs() < a_au * 0.12,
                "{}: {r_au} AU",
                body.name()
            );
        }
    }
}
