use trajectory_lab::bodies::{Body, ephemeris};
use trajectory_lab::core::constants::AU_M;
use trajectory_lab::core::time::{J2000_JD, calendar_to_jd};
use trajectory_lab::core::vector;

/// Earth's heliocentric J2000 position from JPL, metres.
const EARTH_J2000_M: [f64; 3] = [-2.6499e10, 1.32757e11, 5.75566e10];

#[test]
fn earth_position_at_j2000_matches_the_published_state() {
    let pos = ephemeris::position_hci(Body::Earth, J2000_JD).expect("earth ephemeris");

    // The mean-element table carries the Earth-Moon barycenter, so the
    // agreement budget includes the ~4700 km EMB offset.
    for i in 0..3 {
        assert!(
            (pos[i] - EARTH_J2000_M[i]).abs() < 2.0e7,
            "component {i}: {} vs {}",
            pos[i],
            EARTH_J2000_M[i]
        );
    }
}

#[test]
fn planets_complete_their_orbital_periods() {
    for (body, period_days, tol_deg) in [
        (Body::Earth, 365.25, 2.0),
        (Body::Mars, 686.97, 3.0),
        (Body::Jupiter, 4332.59, 5.0),
    ] {
        let p0 = ephemeris::position_hci(body, J2000_JD).unwrap();
        let p1 = ephemeris::position_hci(body, J2000_JD + period_days).unwrap();

        let cos_angle = vector::dot(&p0, &p1) / (vector::norm(&p0) * vector::norm(&p1));
        let angle_deg = cos_angle.clamp(-1.0, 1.0).acos().to_degrees();
        assert!(
            angle_deg < tol_deg,
            "{} drifted {angle_deg}° over one period",
            body.name()
        );
    }
}

#[test]
fn velocity_is_consistent_with_finite_differenced_position() {
    let jd = calendar_to_jd(2026, 8, 1.0);
    let vel = ephemeris::velocity_hci(Body::Mars, jd).unwrap();

    // One-hour displacement predicted from the velocity.
    let p0 = ephemeris::position_hci(Body::Mars, jd).unwrap();
    let p1 = ephemeris::position_hci(Body::Mars, jd + 3600.0 / 86400.0).unwrap();
    let moved = vector::norm(&vector::sub(&p1, &p0));
    let predicted = vector::norm(&vel) * 3600.0;
    assert!(
        ((moved - predicted) / predicted).abs() < 1.0e-3,
        "moved {moved}, predicted {predicted}"
    );
}

#[test]
fn extrapolation_outside_the_fit_interval_stays_finite() {
    // Three centuries out: accuracy degrades smoothly, values stay sane.
    for offset_years in [-300.0, 300.0] {
        let jd = J2000_JD + offset_years * 365.25;
        let pos = ephemeris::position_hci(Body::Saturn, jd).unwrap();
        let r_au = vector::norm(&pos) / AU_M;
        assert!(r_au > 8.0 && r_au < 11.0, "Saturn at {r_au} AU");
    }
}

#[test]
fn geocentric_positions_subtract_the_earth() {
    let jd = calendar_to_jd(2026, 8, 1.0);
    let mars_hci = ephemeris::position_hci(Body::Mars, jd).unwrap();
    let earth_hci = ephemeris::position_hci(Body::Earth, jd).unwrap();
    let mars_eci = ephemeris::position_eci(Body::Mars, jd).unwrap();

    for i in 0..3 {
        assert!((mars_eci[i] - (mars_hci[i] - earth_hci[i])).abs() < 1.0);
    }
}
