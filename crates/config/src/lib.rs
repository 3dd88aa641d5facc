//! Scenario catalog models and loaders.
//!
//! The numerical engine reads no files at runtime; these catalogs exist for
//! test fixtures and callers that define spacecraft, launch vehicles, and
//! mission plans in YAML or TOML.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Spacecraft physical properties for force-model configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct SpacecraftConfig {
    pub name: String,
    pub mass_kg: f64,
    #[serde(default)]
    pub drag: Option<DragProperties>,
    #[serde(default)]
    pub srp: Option<SrpProperties>,
    #[serde(default)]
    pub propulsion: Option<PropulsionConfig>,
}

/// Drag properties of a spacecraft.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct DragProperties {
    pub area_m2: f64,
    pub cd: f64,
}

/// Solar-radiation-pressure properties.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct SrpProperties {
    pub area_m2: f64,
    pub reflectivity: f64,
}

/// Propulsion selections available in catalogs.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum PropulsionConfig {
    #[serde(rename = "low_thrust")]
    LowThrust {
        thrust_n: f64,
        isp_s: f64,
        #[serde(default)]
        solar_scaling: bool,
    },
    #[serde(rename = "impulsive")]
    Impulsive { isp_s: f64 },
    #[serde(other)]
    Unsupported,
}

/// One launch-vehicle stage as read from a catalog.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct StageConfig {
    pub dry_mass_kg: f64,
    pub propellant_mass_kg: f64,
    pub thrust_n: f64,
    pub isp_sl_s: f64,
    pub isp_vac_s: f64,
}

/// A multi-stage launch vehicle.
#[derive(Debug, Deserialize, Clone)]
pub struct LaunchVehicleConfig {
    pub name: String,
    pub stages: Vec<StageConfig>,
    pub payload_mass_kg: f64,
    pub drag_coefficient: f64,
    pub reference_area_m2: f64,
}

/// A mission plan: body names, encounter dates, parking altitudes.
#[derive(Debug, Deserialize, Clone)]
pub struct MissionPlanConfig {
    pub name: String,
    /// Body names in encounter order (resolved by the caller).
    pub bodies: Vec<String>,
    /// Encounter Julian Dates, one per body.
    pub dates_jd: Vec<f64>,
    #[serde(default = "default_parking_alt_km")]
    pub departure_parking_alt_km: f64,
    #[serde(default = "default_parking_alt_km")]
    pub arrival_parking_alt_km: f64,
}

fn default_parking_alt_km() -> f64 {
    200.0
}

/// Errors that can occur while loading catalog files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Load spacecraft definitions from a YAML file or a directory of TOML files.
pub fn load_spacecraft<P: AsRef<Path>>(path: P) -> Result<Vec<SpacecraftConfig>, ConfigError> {
    load_records(path)
}

/// Load launch vehicle definitions.
pub fn load_launch_vehicles<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<LaunchVehicleConfig>, ConfigError> {
    load_records(path)
}

/// Load mission plans.
pub fn load_mission_plans<P: AsRef<Path>>(path: P) -> Result<Vec<MissionPlanConfig>, ConfigError> {
    load_records(path)
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if path.extension().map(|ext| ext == "toml").unwrap_or(false) {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|ext| ext == "toml").unwrap_or(false))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}
