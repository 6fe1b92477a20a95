use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::{
    catalog::Catalog,
    material::LayerStack,
    output,
    reflectance,
    result::Spectrum,
    settings::{load_config, Settings},
    sweep::SweepSpec,
};


/// A single reflectance run: a resolved stack, a sweep, and its result.
#[derive(Debug, Clone)]
pub struct Problem {
    pub settings: Settings,
    pub stack: LayerStack,
    pub sweep: SweepSpec,
    pub result: Option<Spectrum>,
}

impl Problem {
    /// Creates a problem from settings, loading the catalog they point to.
    /// Falls back to the layered configuration when no settings are given.
    pub fn new(settings: Option<Settings>) -> Result<Self> {
        let settings = match settings {
            Some(settings) => settings,
            None => load_config()?,
        };
        let catalog = Catalog::load(settings.catalog_path())?;
        Self::with_catalog(settings, &catalog)
    }

    /// Creates a problem resolving the layers against `catalog`.
    pub fn with_catalog(settings: Settings, catalog: &Catalog) -> Result<Self> {
        let stack = catalog
            .stack(&settings.layers)
            .context("failed to build the layer stack")?;
        let sweep = settings.sweep().context("invalid sweep")?;

        Ok(Self {
            settings,
            stack,
            sweep,
            result: None,
        })
    }

    /// Logs the stack from the incidence medium to the substrate.
    pub fn describe(&self) {
        let materials = self.stack.materials();
        let last = materials.len() - 1;
        for (i, material) in materials.iter().enumerate() {
            let role = match i {
                0 => "incidence medium".to_string(),
                i if i == last => "substrate".to_string(),
                _ => format!("d = {}", material.thickness),
            };
            info!("{:2}: {} ({}, {})", i + 1, material.name, material.model.kind(), role);
        }
    }

    /// Runs the sweep with a progress bar.
    pub fn solve(&mut self) -> Result<&Spectrum> {
        let start = Instant::now();
        self.describe();

        let n = self.sweep.samples().len();
        let pb = ProgressBar::new(n as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {bar:40.green/blue} {pos:>5}/{len:5} {msg} ETA: {eta_precise}",
            )?
            .progress_chars("█▇▆▅▄▃▂▁"),
        );
        pb.set_message(self.sweep.axis().to_string());

        let result = reflectance::reflectance_with(&self.stack, &self.sweep, |_| pb.inc(1));
        pb.finish_and_clear();
        let spectrum = result.context("reflectance sweep failed")?;

        let duration = start.elapsed();
        info!(
            "Time taken: {:.2?}, Time per sample: {:.2?}",
            duration,
            duration / n.max(1) as u32
        );
        spectrum.print();

        Ok(&*self.result.insert(spectrum))
    }

    /// Writes the spectrum and the effective settings to the output directory.
    pub fn writeup(&self) -> Result<()> {
        let spectrum = self
            .result
            .as_ref()
            .context("nothing to write, the problem has not been solved")?;
        let directory = &self.settings.directory;

        output::write_spectrum(spectrum, directory)?;
        output::write_json(spectrum, directory)?;
        output::write_settings(&self.settings, directory)?;
        info!("results written to {}", directory.display());

        Ok(())
    }
}
