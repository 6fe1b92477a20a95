use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::result::Spectrum;
use crate::settings::Settings;
use crate::sweep::{Polarization, SweepAxis};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn spectrum() -> Spectrum {
        Spectrum {
            axis: SweepAxis::Wavelength,
            abscissa: vec![500e-9, 600e-9],
            reflectance: vec![0.0125, 0.25],
            polarization: Polarization::TM,
        }
    }

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("thinfilm-{}-{}", name, std::process::id()))
    }

    #[test]
    fn spectrum_columns() {
        let dir = scratch("dat");
        write_spectrum(&spectrum(), &dir).unwrap();
        let text = fs::read_to_string(dir.join(SPECTRUM_FILE)).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with('#'));
        assert_eq!(lines.len(), 3);
        let columns: Vec<f64> = lines[2]
            .split_whitespace()
            .map(|v| v.parse().unwrap())
            .collect();
        assert!((columns[0] - 600.0).abs() < 1e-9);
        assert!((columns[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn spectrum_json() {
        let dir = scratch("json");
        write_json(&spectrum(), &dir).unwrap();
        let text = fs::read_to_string(dir.join(JSON_FILE)).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["axis"], "wavelength");
        assert_eq!(value["unit"], "nm");
        assert_eq!(value["polarization"], "TM");
        assert_eq!(value["reflectance"][1], 0.25);
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
    }
}

/// Two-column text output: abscissa and reflectance.
pub const SPECTRUM_FILE: &str = "reflectance.dat";
/// Self-describing JSON output.
pub const JSON_FILE: &str = "spectrum.json";
/// The effective settings of a run.
pub const SETTINGS_FILE: &str = "settings.toml";

#[derive(Serialize)]
struct SpectrumRecord<'a> {
    timestamp: String,
    axis: SweepAxis,
    unit: &'static str,
    polarization: Polarization,
    abscissa: Vec<f64>,
    reflectance: &'a [f64],
}

fn create(directory: &Path, name: &str) -> Result<BufWriter<File>> {
    fs::create_dir_all(directory)
        .with_context(|| format!("failed to create output directory {}", directory.display()))?;
    let path = directory.join(name);
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Write the reflectance against nanometers or degrees
pub fn write_spectrum(spectrum: &Spectrum, directory: &Path) -> Result<()> {
    let mut writer = create(directory, SPECTRUM_FILE)?;

    writeln!(writer, "# {} [{}] R", spectrum.axis, spectrum.unit())?;
    for (x, r) in spectrum
        .abscissa_display()
        .iter()
        .zip(spectrum.reflectance.iter())
    {
        writeln!(writer, "{:.6} {:.10}", x, r)?;
    }
    writer.flush()?;

    Ok(())
}

pub fn write_json(spectrum: &Spectrum, directory: &Path) -> Result<()> {
    let record = SpectrumRecord {
        timestamp: Utc::now().to_rfc3339(),
        axis: spectrum.axis,
        unit: spectrum.unit(),
        polarization: spectrum.polarization,
        abscissa: spectrum.abscissa_display(),
        reflectance: &spectrum.reflectance,
    };
    let mut writer = create(directory, JSON_FILE)?;
    serde_json::to_writer_pretty(&mut writer, &record)?;
    writer.flush()?;

    Ok(())
}

pub fn write_settings(settings: &Settings, directory: &Path) -> Result<()> {
    let text = toml::to_string_pretty(settings).context("failed to serialize settings")?;
    let mut writer = create(directory, SETTINGS_FILE)?;
    writer.write_all(text.as_bytes())?;
    writer.flush()?;

    Ok(())
}
