//! Reflectance of a layer stack over a wavelength or angle sweep.
//!
//! Every sample reduces the stack matrix `M` to the amplitude reflection
//! coefficient `r = M[1,0] / M[0,0]` and reports `R = |r|^2`. A sweep either
//! succeeds for every sample or fails as a whole, naming the lowest failing
//! sample.

use rayon::prelude::*;
use tracing::debug;

use crate::error::{Error, NumericError, Result};
use crate::material::LayerStack;
use crate::result::Spectrum;
use crate::sweep::{Polarization, SweepSpec};
use crate::transfer;


/// Sweeps with at least this many samples are evaluated on the rayon pool.
pub const PARALLEL_THRESHOLD: usize = 256;

/// Tolerance on the `[0, 1]` bound of a computed reflectance.
pub const REFLECTANCE_TOLERANCE: f64 = 1e-9;

/// Reflectance of `stack` at a single wavelength (meters) and angle of
/// incidence (radians).
pub fn sample_reflectance(
    stack: &LayerStack,
    wavelength: f64,
    theta0: f64,
    polarization: Polarization,
) -> std::result::Result<f64, NumericError> {
    let m = transfer::build_matrix(stack, wavelength, polarization, theta0)?;
    if m[(0, 0)].norm() == 0.0 {
        return Err(NumericError::DegenerateMatrix);
    }
    let r = m[(1, 0)] / m[(0, 0)];
    let reflectance = r.norm_sqr();

    if !reflectance.is_finite()
        || reflectance < -REFLECTANCE_TOLERANCE
        || reflectance > 1.0 + REFLECTANCE_TOLERANCE
    {
        return Err(NumericError::ReflectanceOutOfRange(reflectance));
    }
    Ok(reflectance)
}

/// Computes the reflectance spectrum of `stack` over `sweep`.
///
/// The result is aligned one-to-one with the sweep samples. If any sample
/// fails, the sweep returns [`Error::Sample`] for the lowest failing index and
/// no partial spectrum.
pub fn reflectance(stack: &LayerStack, sweep: &SweepSpec) -> Result<Spectrum> {
    reflectance_with(stack, sweep, |_| {})
}

/// Like [`reflectance`], calling `on_sample` once per evaluated sample.
///
/// `on_sample` may run concurrently on several threads.
pub fn reflectance_with<F>(stack: &LayerStack, sweep: &SweepSpec, on_sample: F) -> Result<Spectrum>
where
    F: Fn(usize) + Sync,
{
    let samples = sweep.samples();
    let polarization = sweep.polarization();
    let parallel = samples.len() >= PARALLEL_THRESHOLD;
    debug!(
        "sweeping {} samples over {} ({} materials, {}, {})",
        samples.len(),
        samples.axis,
        stack.len(),
        polarization,
        if parallel { "parallel" } else { "serial" }
    );

    let evaluate = |(index, &(wavelength, theta0)): (usize, &(f64, f64))| {
        let result = sample_reflectance(stack, wavelength, theta0, polarization);
        on_sample(index);
        result
    };

    let results: Vec<std::result::Result<f64, NumericError>> = if parallel {
        samples.points.par_iter().enumerate().map(evaluate).collect()
    } else {
        samples.points.iter().enumerate().map(evaluate).collect()
    };

    let reflectance = results
        .into_iter()
        .enumerate()
        .map(|(index, result)| result.map_err(|source| Error::Sample { index, source }))
        .collect::<Result<Vec<f64>>>()?;

    Ok(Spectrum {
        axis: samples.axis,
        abscissa: samples.abscissa,
        reflectance,
        polarization,
    })
}
