use trajectory_lab::bodies::Body;
use trajectory_lab::config::LaunchVehicleConfig;
use trajectory_lab::launch::{
    AscentProfile, AscentVehicle, LaunchSite, LaunchSolverConfig, LaunchTarget, RocketStage,
    fly_ascent, solve_launch,
};
use trajectory_lab::orbits;

fn catalog_vehicle() -> AscentVehicle {
    // Exercise the catalog path end to end: TOML in, ascent vehicle out.
    let toml_src = r#"
name = "TestBooster"
payload_mass_kg = 4500.0
drag_coefficient = 0.3
reference_area_m2 = 10.0

[[stages]]
dry_mass_kg = 8000.0
propellant_mass_kg = 120000.0
thrust_n = 2.2e6
isp_sl_s = 282.0
isp_vac_s = 311.0

[[stages]]
dry_mass_kg = 2000.0
propellant_mass_kg = 30000.0
thrust_n = 4.0e5
isp_sl_s = 340.0
isp_vac_s = 348.0
"#;
    let config: LaunchVehicleConfig = toml::from_str(toml_src).expect("vehicle toml");
    AscentVehicle {
        stages: config
            .stages
            .iter()
            .map(|s| RocketStage {
                dry_mass_kg: s.dry_mass_kg,
                propellant_mass_kg: s.propellant_mass_kg,
                thrust_n: s.thrust_n,
                isp_sl_s: s.isp_sl_s,
                isp_vac_s: s.isp_vac_s,
            })
            .collect(),
        payload_mass_kg: config.payload_mass_kg,
        drag_coefficient: config.drag_coefficient,
        reference_area_m2: config.reference_area_m2,
    }
}

fn cape() -> LaunchSite {
    LaunchSite {
        latitude_deg: 28.5,
        longitude_deg: -80.6,
        altitude_m: 0.0,
    }
}

fn eastward_profile() -> AscentProfile {
    AscentProfile {
        azimuth_rad: std::f64::consts::FRAC_PI_2,
        pitch_polys: vec![vec![0.0, 0.006], vec![1.2]],
        yaw_polys: vec![vec![0.0], vec![0.0]],
        coast_s: 60.0,
    }
}

#[test]
fn ascent_reaches_space_with_a_prograde_orbit_plane() {
    let result = fly_ascent(&catalog_vehicle(), &cape(), &eastward_profile(), 0.5, 5.0);

    let earth = Body::Earth.constants();
    let alt = result.final_state.radius_m() - earth.radius_m;
    assert!(alt > 100.0e3, "final altitude = {} km", alt / 1000.0);
    assert!(
        result.final_state.speed_m_s() > 5_000.0,
        "final speed = {}",
        result.final_state.speed_m_s()
    );

    // A due-east launch from 28.5° N produces a ~28.5° inclination.
    let elements = orbits::elements_from_state(&result.final_state, earth.mu_m3_s2);
    let inc_deg = elements.inclination_rad.to_degrees();
    assert!(
        (inc_deg - 28.5).abs() < 3.0,
        "inclination = {inc_deg}°"
    );

    // Staging events recorded in order.
    let separations: Vec<_> = result
        .events
        .iter()
        .filter(|e| e.name.contains("separation"))
        .collect();
    assert_eq!(separations.len(), 2);
    assert!(separations[0].time_s < separations[1].time_s);
    assert!(!result.trajectory.is_empty());
}

#[test]
fn launch_shooter_improves_toward_a_nearby_orbit_target() {
    let vehicle = catalog_vehicle();
    let site = cape();
    let profile = eastward_profile();

    let baseline = fly_ascent(&vehicle, &site, &profile, 1.0, 0.0);
    let mu = Body::Earth.constants().mu_m3_s2;
    let achieved = orbits::elements_from_state(&baseline.final_state, mu);

    // Ask for a slightly different orbit than the baseline produces.
    let target = LaunchTarget::Orbit {
        semi_major_axis_m: achieved.semi_major_axis_m + 100.0e3,
        eccentricity: (achieved.eccentricity - 0.01).max(0.0),
        inclination_rad: achieved.inclination_rad,
    };

    let config = LaunchSolverConfig {
        max_iterations: 3,
        ascent_dt_s: 1.0,
        ..LaunchSolverConfig::default()
    };
    let solution = solve_launch(&vehicle, &site, &profile, &target, &config);

    assert!(solution.residual_norm.is_finite());
    assert!(
        solution.status == "Converged"
            || solution.status == "Stalled"
            || solution.status == "Max iterations reached",
        "unexpected status {}",
        solution.status
    );
    // The solver only ever accepts improving steps.
    let initial = fly_ascent(&vehicle, &site, &profile, 1.0, 0.0);
    let initial_elements = orbits::elements_from_state(&initial.final_state, mu);
    let initial_res = match &target {
        LaunchTarget::Orbit {
            semi_major_axis_m,
            eccentricity,
            inclination_rad,
        } => {
            let d_sma = (initial_elements.semi_major_axis_m - semi_major_axis_m)
                / semi_major_axis_m;
            let d_ecc = initial_elements.eccentricity - eccentricity;
            let d_inc = initial_elements.inclination_rad - inclination_rad;
            (d_sma * d_sma + d_ecc * d_ecc + d_inc * d_inc).sqrt()
        }
        _ => unreachable!(),
    };
    assert!(
        solution.residual_norm <= initial_res + 1.0e-12,
        "{} vs {}",
        solution.residual_norm,
        initial_res
    );
}
