use std::path::PathBuf;

use num_complex::Complex;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use thinfilm::{
    catalog::Catalog,
    dispersion::DispersionModel,
    material::{LayerStack, Material, Thickness},
    reflectance as engine,
    settings::parse_layer,
    sweep::{Axis, Polarization, SweepSpec},
};

fn value_error(err: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Builds a stack of fixed-index materials. The first and last indices are the
/// semi-infinite ambient and substrate, every other one needs a thickness.
fn fixed_stack(indices: Vec<Complex<f64>>, thicknesses_nm: Vec<f64>) -> PyResult<LayerStack> {
    if indices.len() < 2 || thicknesses_nm.len() + 2 != indices.len() {
        return Err(value_error(format!(
            "expected {} thicknesses for {} indices",
            indices.len().saturating_sub(2),
            indices.len()
        )));
    }
    let last = indices.len() - 1;
    let materials = indices
        .into_iter()
        .enumerate()
        .map(|(i, n)| {
            let thickness = if i == 0 || i == last {
                Thickness::Infinite
            } else {
                Thickness::Finite(thicknesses_nm[i - 1] * 1e-9)
            };
            Material::new(format!("layer {}", i), thickness, DispersionModel::Fixed(n))
        })
        .collect();
    LayerStack::new(materials).map_err(value_error)
}

fn sweep(
    stack: &LayerStack,
    wavelength: Axis,
    angle: Axis,
    polarization: &str,
) -> PyResult<Vec<f64>> {
    let polarization: Polarization = polarization.parse().map_err(value_error)?;
    let wavelength = wavelength.map(|nm| nm * 1e-9);
    let angle = angle.map(f64::to_radians);
    let sweep = SweepSpec::new(wavelength, angle, polarization).map_err(value_error)?;
    let spectrum = engine::reflectance(stack, &sweep).map_err(value_error)?;
    Ok(spectrum.reflectance)
}

/// Reflectance of a stack of constant complex indices against wavelength.
#[pyfunction]
#[pyo3(signature = (indices, thicknesses_nm, wavelengths_nm, angle_deg = 0.0, polarization = "s"))]
fn reflectance(
    indices: Vec<Complex<f64>>,
    thicknesses_nm: Vec<f64>,
    wavelengths_nm: Vec<f64>,
    angle_deg: f64,
    polarization: &str,
) -> PyResult<Vec<f64>> {
    let stack = fixed_stack(indices, thicknesses_nm)?;
    sweep(
        &stack,
        Axis::Values(wavelengths_nm),
        Axis::Single(angle_deg),
        polarization,
    )
}

/// Reflectance of a stack of constant complex indices against angle of incidence.
#[pyfunction]
#[pyo3(signature = (indices, thicknesses_nm, wavelength_nm, angles_deg, polarization = "s"))]
fn angle_reflectance(
    indices: Vec<Complex<f64>>,
    thicknesses_nm: Vec<f64>,
    wavelength_nm: f64,
    angles_deg: Vec<f64>,
    polarization: &str,
) -> PyResult<Vec<f64>> {
    let stack = fixed_stack(indices, thicknesses_nm)?;
    sweep(
        &stack,
        Axis::Single(wavelength_nm),
        Axis::Values(angles_deg),
        polarization,
    )
}

/// Reflectance of a stack of catalog materials against wavelength.
/// Layers are given as "name" or "name:thickness_nm".
#[pyfunction]
#[pyo3(signature = (catalog_path, layers, wavelengths_nm, angle_deg = 0.0, polarization = "s"))]
fn catalog_reflectance(
    catalog_path: PathBuf,
    layers: Vec<String>,
    wavelengths_nm: Vec<f64>,
    angle_deg: f64,
    polarization: &str,
) -> PyResult<Vec<f64>> {
    let catalog = Catalog::load(&catalog_path).map_err(|err| value_error(format!("{:#}", err)))?;
    let layers = layers
        .iter()
        .map(|layer| parse_layer(layer))
        .collect::<Result<Vec<_>, _>>()
        .map_err(value_error)?;
    let stack = catalog.stack(&layers).map_err(value_error)?;
    sweep(
        &stack,
        Axis::Values(wavelengths_nm),
        Axis::Single(angle_deg),
        polarization,
    )
}

/// A Python module implemented in Rust.
#[pymodule]
fn _thinfilm_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(reflectance, m)?)?;
    m.add_function(wrap_pyfunction!(angle_reflectance, m)?)?;
    m.add_function(wrap_pyfunction!(catalog_reflectance, m)?)?;
    Ok(())
}
