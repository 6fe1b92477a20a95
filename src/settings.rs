use anyhow::{anyhow, ensure, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::catalog::LayerSpec;
use crate::error::ValidationError;
use crate::sweep::{Axis, Polarization, SweepSpec};


/// Runtime configuration for the application.
///
/// Wavelengths are given in nanometers and angles of incidence in degrees.
/// [`Settings::sweep`] converts them to meters and radians.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    /// Path to the JSON material catalog.
    pub catalog: PathBuf,
    /// Materials from the incidence side to the substrate.
    pub layers: Vec<LayerSpec>,
    pub polarization: Polarization,
    pub wavelength: Axis,
    pub angle: Axis,
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
}

fn default_directory() -> PathBuf {
    PathBuf::from("output")
}

impl Settings {
    /// Validated sweep in SI units.
    pub fn sweep(&self) -> Result<SweepSpec, ValidationError> {
        SweepSpec::new(
            self.wavelength.map(|nm| nm * 1e-9),
            self.angle.map(f64::to_radians),
            self.polarization,
        )
    }

    /// The catalog path, resolved against the project root when it does not
    /// exist relative to the working directory.
    pub fn catalog_path(&self) -> PathBuf {
        if self.catalog.is_absolute() || self.catalog.exists() {
            return self.catalog.clone();
        }
        match retrieve_project_root() {
            Ok(root) if root.join(&self.catalog).exists() => root.join(&self.catalog),
            _ => self.catalog.clone(),
        }
    }
}

pub fn load_default_config() -> Result<Settings> {
    let root = retrieve_project_root()?;
    let default_config_file = root.join("config/default.toml");

    let settings = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()
        .context("failed to load default configuration")?;

    let config: Settings = settings
        .try_deserialize()
        .context("failed to deserialize default configuration")?;

    validate_config(&config)?;

    Ok(config)
}

pub fn load_config() -> Result<Settings> {
    load_config_with(CliArgs::parse())
}

/// Loads the configuration file and environment, then applies `args`.
pub fn load_config_with(args: CliArgs) -> Result<Settings> {
    let root = retrieve_project_root()?;

    let default_config_file = root.join("config/default.toml");
    let local_config = root.join("config/local.toml");

    let config_file = if local_config.exists() {
        info!("using local configuration: {}", local_config.display());
        local_config
    } else {
        info!("using default configuration: {}", default_config_file.display());
        default_config_file
    };

    let settings = Config::builder()
        .add_source(File::from(config_file).required(true))
        .add_source(Environment::with_prefix("thinfilm"))
        .build()
        .context("failed to load configuration")?;

    let mut config: Settings = settings
        .try_deserialize()
        .context("failed to deserialize configuration")?;

    apply_overrides(&mut config, args)?;
    validate_config(&config)?;

    debug!("{:#?}", config);

    Ok(config)
}

/// Replaces configured values with those given on the command line.
pub fn apply_overrides(config: &mut Settings, args: CliArgs) -> Result<()> {
    if let Some(catalog) = args.catalog {
        config.catalog = catalog;
    }
    if let Some(polarization) = args.pol {
        config.polarization = polarization;
    }
    if let Some(wavelength) = args.wavelength {
        config.wavelength = Axis::Single(wavelength);
    } else if let Some(values) = args.wavelengths {
        config.wavelength = parse_range(&values).context("invalid --wavelengths")?;
    }
    if let Some(angle) = args.angle {
        config.angle = Axis::Single(angle);
    } else if let Some(values) = args.angles {
        config.angle = parse_range(&values).context("invalid --angles")?;
    }
    if let Some(layers) = args.layers {
        config.layers = layers;
    }
    if let Some(dir) = args.dir {
        config.directory = dir;
    }
    Ok(())
}

/// Retrieve the project root directory.
/// This function tries to find the project root directory in different ways:
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the THINFILM_ROOT_DIR environment variable is set, use it.
/// 3. If the "config" subdirectory is found in the executable directory or any of its parents, use it.
fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        // When running through cargo (e.g. cargo run, cargo test)
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("THINFILM_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }

    // Walk upward from the executable directory
    let exe_path = env::current_exe().context("failed to get current executable path")?;
    exe_path
        .ancestors()
        .skip(1)
        .find(|dir| dir.join("config").is_dir())
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("could not find project root directory"))
}

fn validate_config(config: &Settings) -> Result<()> {
    ensure!(!config.layers.is_empty(), "at least one layer must be given");
    ensure!(
        config.layers.iter().all(|layer| !layer.material.is_empty()),
        "layer material names must not be empty"
    );
    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about = "thinfilm - reflectance of multilayer thin-film stacks")]
pub struct CliArgs {
    /// Path to the JSON material catalog.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Polarization of the incident wave: TE (s) or TM (p).
    #[arg(short, long)]
    pol: Option<Polarization>,

    /// Single wavelength in nanometers.
    #[arg(short, long, group = "wavelength_axis")]
    wavelength: Option<f64>,

    /// Wavelength range in nanometers.
    /// Format: start end num_points
    #[arg(long, num_args = 3, value_delimiter = ' ', group = "wavelength_axis")]
    wavelengths: Option<Vec<f64>>,

    /// Single angle of incidence in degrees.
    #[arg(short, long, group = "angle_axis")]
    angle: Option<f64>,

    /// Angle of incidence range in degrees.
    /// Format: start end num_points
    #[arg(long, num_args = 3, value_delimiter = ' ', group = "angle_axis")]
    angles: Option<Vec<f64>>,

    /// Materials from the incidence side to the substrate, each optionally with
    /// a thickness in nanometers overriding the catalog value.
    /// Format: name[:thickness_nm] ...
    #[arg(short, long, value_parser = parse_layer, num_args = 1.., value_delimiter = ' ')]
    layers: Option<Vec<LayerSpec>>,

    /// Output directory.
    #[arg(long)]
    dir: Option<PathBuf>,
}

/// Parse a layer in the format "name" or "name:thickness_nm"
pub fn parse_layer(s: &str) -> Result<LayerSpec, String> {
    let (name, thickness) = match s.split_once(':') {
        Some((name, thickness)) => {
            let thickness = thickness
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("Failed to parse layer thickness: '{}'", thickness))?;
            (name.trim(), Some(thickness))
        }
        None => (s.trim(), None),
    };
    if name.is_empty() {
        return Err(format!("Missing material name in layer '{}'", s));
    }
    Ok(LayerSpec::new(name, thickness))
}

/// Parse a range specification in the format: start end num_points
fn parse_range(values: &[f64]) -> Result<Axis> {
    let [start, end, num_points] = values else {
        return Err(anyhow!(
            "range needs exactly 3 values (start end num_points), got {}",
            values.len()
        ));
    };
    ensure!(
        *num_points >= 1.0 && num_points.fract() == 0.0,
        "number of points must be a positive whole number, got {}",
        num_points
    );
    Ok(Axis::Range {
        start: *start,
        end: *end,
        num_points: *num_points as usize,
    })
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layers: Vec<String> = self
            .layers
            .iter()
            .map(|layer| match layer.thickness_nm {
                Some(d) => format!("{}:{}", layer.material, d),
                None => layer.material.clone(),
            })
            .collect();
        write!(
            f,
            "Settings:
  - Catalog: {}
  - Layers: {}
  - Polarization: {}
  - Wavelength (nm): {:?}
  - Angle (deg): {:?}
  - Output Directory: {}
  ",
            self.catalog.display(),
            layers.join(" / "),
            self.polarization,
            self.wavelength,
            self.angle,
            self.directory.display(),
        )
    }
}
